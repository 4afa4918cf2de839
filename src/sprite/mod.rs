//! Sprites and frame animation
//!
//! ┌──────────────────────────── Sprite Layers ──────────────────────────────┐
//! │  AtlasSheet (json)  →  Frames (Rc<[Sprite]>)  →  Animation (per entity) │
//! │  imagePath             shared, immutable          frame clock + cursor  │
//! │  frameBounds           one Sprite per frame       listener, repeat      │
//! │  frameInsets?          optional hit box insets                          │
//! └─────────────────────────────────────────────────────────────────────────┘
use crate::engine::{ImageHandle, Rect};
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;

pub mod animation;

pub use self::animation::{Animation, AnimationListener, AnimationStatus};

/// A rectangular region of a shared image
/// - `insets` shrink the drawn bounds down to the hit box, so the art can be
///   larger and softer than what actually collides
#[derive(Clone)]
pub struct Sprite {
    pub image: ImageHandle,
    pub bounds: Rect,
    pub insets: Option<Rect>,
}

impl Sprite {
    pub fn new(image: ImageHandle, bounds: Rect) -> Self {
        Sprite {
            image,
            bounds,
            insets: None,
        }
    }

    pub fn with_insets(image: ImageHandle, bounds: Rect, insets: Rect) -> Self {
        Sprite {
            image,
            bounds,
            insets: Some(insets),
        }
    }

    /// Hit box for this sprite when it is drawn into `destination`
    pub fn collision_bounds(&self, destination: &Rect) -> Rect {
        match self.insets {
            Some(insets) => destination.inset_by(insets),
            None => *destination,
        }
    }
}

impl fmt::Debug for Sprite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sprite")
            .field("bounds", &self.bounds)
            .field("insets", &self.insets)
            .finish_non_exhaustive()
    }
}

/// Ordered frames of one atlas, shared by every entity that animates with it
pub type Frames = Rc<[Sprite]>;

/// On-disk animation atlas
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AtlasSheet {
    pub image_path: String,
    pub frame_bounds: Vec<[f32; 4]>,
    #[serde(default)]
    pub frame_insets: Option<Vec<[f32; 4]>>,
}

impl AtlasSheet {
    /// Cut `image` into one sprite per frame
    pub fn into_frames(self, image: ImageHandle) -> Result<Frames> {
        if self.frame_bounds.is_empty() {
            return Err(anyhow!("atlas for {} has no frames", self.image_path));
        }
        let sprites = match self.frame_insets {
            None => self
                .frame_bounds
                .into_iter()
                .map(|bounds| Sprite::new(image.clone(), bounds.into()))
                .collect::<Vec<_>>(),
            Some(insets) if insets.len() == self.frame_bounds.len() => self
                .frame_bounds
                .into_iter()
                .zip(insets)
                .map(|(bounds, insets)| {
                    Sprite::with_insets(image.clone(), bounds.into(), insets.into())
                })
                .collect(),
            Some(insets) => {
                return Err(anyhow!(
                    "atlas for {} has {} frames but {} insets",
                    self.image_path,
                    self.frame_bounds.len(),
                    insets.len()
                ))
            }
        };
        Ok(sprites.into())
    }
}
