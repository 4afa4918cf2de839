use super::{Body, CollisionPolicy, Obstacle};
use crate::engine::assets::{res, AssetStore};
use crate::hero::Hero;
use crate::scene::SceneConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;

pub const PRIORITY: u8 = 0;

/// Column spawned at the top of the screen that falls with the world until
/// it stands on the ground, one still frame of the pillar atlas. Blocks the
/// hero without hurting it.
pub struct Pillar {
    body: Body,
    variant: usize,
}

impl Pillar {
    /// `variant` picks the atlas frame, wrapped to the frame count
    pub fn new(variant: usize) -> Self {
        Pillar {
            body: Body::new(PRIORITY),
            variant,
        }
    }
}

#[async_trait(?Send)]
impl Obstacle for Pillar {
    fn name(&self) -> &'static str {
        "pillar"
    }

    fn body(&self) -> &Body {
        &self.body
    }

    fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    async fn prepare(&mut self, assets: &AssetStore) -> Result<()> {
        let styles = assets
            .load_animation(res::PILLAR_STYLE)
            .await
            .context("Pillar: could not load styles")?;
        let sprite = styles[self.variant % styles.len()].clone();
        self.body.update_sprite(sprite);
        Ok(())
    }

    // still frame, no motion of its own
    fn update(&mut self, _config: &SceneConfig) {}

    fn place_at_frontier(&mut self, config: &SceneConfig) {
        self.body.bounds.offset_to(config.width, 0.0);
    }

    fn collision_policy(&self) -> CollisionPolicy {
        CollisionPolicy::Continuous
    }

    fn on_collision(&mut self, hero: &mut Hero) {
        let speed = hero.x_speed();
        hero.knock_back(speed);
    }
}
