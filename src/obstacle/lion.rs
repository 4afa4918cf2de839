use super::{Body, Obstacle};
use crate::engine::assets::{res, AssetStore};
use crate::hero::Hero;
use crate::scene::SceneConfig;
use crate::sprite::Animation;
use anyhow::{Context, Result};
use async_trait::async_trait;

pub const PRIORITY: u8 = 128;
pub const SPEED: f32 = 1.0;
pub const ATTACK: i32 = 1;
// knock back distance per unit of lion speed
const KNOCK_BACK: f32 = 10.0;

/// Runs toward the hero on top of the world scroll
pub struct Lion {
    body: Body,
    speed: f32,
    attack: i32,
}

impl Lion {
    pub fn new() -> Self {
        Lion {
            body: Body::new(PRIORITY),
            speed: SPEED,
            attack: ATTACK,
        }
    }
}

impl Default for Lion {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait(?Send)]
impl Obstacle for Lion {
    fn name(&self) -> &'static str {
        "lion"
    }

    fn body(&self) -> &Body {
        &self.body
    }

    fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    async fn prepare(&mut self, assets: &AssetStore) -> Result<()> {
        let run = assets
            .load_animation(res::LION_RUN)
            .await
            .context("Lion: could not load run animation")?;
        self.body.start_animation(Animation::new(run).repeating());
        Ok(())
    }

    fn update(&mut self, _config: &SceneConfig) {
        self.body.advance_animation();
        self.body.bounds.offset(-self.speed, 0.0);
    }

    fn on_collision(&mut self, hero: &mut Hero) {
        hero.hurt(self.attack);
        hero.knock_back(self.speed * KNOCK_BACK);
    }
}
