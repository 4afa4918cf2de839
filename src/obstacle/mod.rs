//! Entities living in the scene
//!
//! ┌──────────────────────────── Obstacle Lifecycle ─────────────────────────┐
//! │ new()       : inert, no sprite, not in any scene                        │
//! │ prepare()   : await every asset at once, fail as a whole                │
//! │ Insert      : queued on the scene, joins at the next frame boundary     │
//! │ update()    : scroll + gravity by the scene, then own motion/animation  │
//! │ kill()      : inactive, evicted on the next eviction pass               │
//! └─────────────────────────────────────────────────────────────────────────┘
use crate::engine::assets::AssetStore;
use crate::engine::{InputEvent, Rect, Renderer};
use crate::hero::Hero;
use crate::scene::SceneConfig;
use crate::sprite::{Animation, AnimationStatus, Sprite};
use anyhow::Result;
use async_trait::async_trait;

pub mod lion;
pub mod pillar;
pub mod tortoise;

pub use self::lion::Lion;
pub use self::pillar::Pillar;
pub use self::tortoise::Tortoise;

/// How often an overlap with the hero is resolved
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CollisionPolicy {
    /// resolve once, then stop colliding
    OneShot,
    /// resolve on every tick of overlap
    Continuous,
}

/// State every obstacle shares : position, current sprite and flags
pub struct Body {
    pub bounds: Rect,
    sprite: Option<Sprite>,
    animation: Option<Animation>,
    active: bool,
    collidable: bool,
    priority: u8,
}

impl Body {
    pub fn new(priority: u8) -> Self {
        Body {
            bounds: Rect::default(),
            sprite: None,
            animation: None,
            active: true,
            collidable: true,
            priority,
        }
    }

    pub fn priority(&self) -> u8 {
        self.priority
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn kill(&mut self) {
        self.active = false;
    }

    /// Dead bodies never collide, whatever their collidable flag says
    pub fn can_collide(&self) -> bool {
        self.active && self.collidable
    }

    pub fn set_collidable(&mut self, collidable: bool) {
        self.collidable = collidable;
    }

    pub fn sprite(&self) -> Option<&Sprite> {
        self.sprite.as_ref()
    }

    pub fn animation(&self) -> Option<&Animation> {
        self.animation.as_ref()
    }

    pub fn collision_bounds(&self) -> Rect {
        match &self.sprite {
            Some(sprite) => sprite.collision_bounds(&self.bounds),
            None => self.bounds,
        }
    }

    /// Show `sprite`, resizing the bounds around their bottom-left corner so
    /// grounded entities keep their feet planted when frame sizes differ
    pub fn update_sprite(&mut self, sprite: Sprite) {
        self.bounds.right = self.bounds.left + sprite.bounds.width();
        self.bounds.top = self.bounds.bottom - sprite.bounds.height();
        self.sprite = Some(sprite);
    }

    pub fn start_animation(&mut self, mut animation: Animation) {
        animation.start();
        self.update_sprite(animation.current_frame().clone());
        self.animation = Some(animation);
    }

    /// Rewind the current animation to its first frame
    pub fn restart_animation(&mut self) {
        if let Some(animation) = self.animation.take() {
            self.start_animation(animation);
        }
    }

    /// Tick the animation and show its current frame
    pub fn advance_animation(&mut self) -> AnimationStatus {
        let Some(animation) = self.animation.as_mut() else {
            return AnimationStatus::Playing;
        };
        let status = animation.update();
        let frame = animation.current_frame().clone();
        self.update_sprite(frame);
        status
    }

    pub fn draw(&self, renderer: &dyn Renderer) {
        if let Some(sprite) = &self.sprite {
            renderer.draw_image(sprite.image.as_ref(), &sprite.bounds, &self.bounds);
        }
    }
}

/// Capability set of everything the scene simulates, the hero included
///
/// Only `prepare` and the body accessors are required, every hook has a
/// default matching a plain animated obstacle.
#[async_trait(?Send)]
pub trait Obstacle {
    fn name(&self) -> &'static str;
    fn body(&self) -> &Body;
    fn body_mut(&mut self) -> &mut Body;

    /// Load every asset the entity needs and set up its first sprite.
    /// An entity whose preparation fails never joins a scene.
    async fn prepare(&mut self, assets: &AssetStore) -> Result<()>;

    fn on_add_to_scene(&mut self, _config: &SceneConfig) {}

    fn on_remove_from_scene(&mut self) {}

    /// Per tick motion and animation, after the scene applied scroll + gravity
    fn update(&mut self, _config: &SceneConfig) {
        self.body_mut().advance_animation();
    }

    fn draw(&self, renderer: &dyn Renderer) {
        self.body().draw(renderer);
    }

    /// Move a freshly spawned entity to the right edge of the viewport
    fn place_at_frontier(&mut self, config: &SceneConfig) {
        let bounds = &mut self.body_mut().bounds;
        let height = bounds.height();
        bounds.offset_to(config.width, config.ground_y - height);
    }

    fn collision_policy(&self) -> CollisionPolicy {
        CollisionPolicy::OneShot
    }

    /// React to overlapping the hero
    fn on_collision(&mut self, _hero: &mut Hero) {}

    /// Returns true when the event was consumed
    fn handle_input(&mut self, _event: InputEvent, _config: &SceneConfig) -> bool {
        false
    }

    fn as_hero(&self) -> Option<&Hero> {
        None
    }

    fn as_hero_mut(&mut self) -> Option<&mut Hero> {
        None
    }
}
