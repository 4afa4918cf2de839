use super::{Body, Obstacle};
use crate::engine::assets::{res, AssetStore};
use crate::hero::{Hero, HeroPose};
use crate::scene::SceneConfig;
use crate::sprite::{Animation, AnimationStatus};
use anyhow::{Context, Result};
use async_trait::async_trait;

pub const PRIORITY: u8 = 127;
pub const ATTACK: i32 = 1;
pub const STOMP_BONUS: u64 = 5000;
// the shell breaking plays slower than the default animation speed
const FRAME_DURATION: u32 = 20;

/// Sits still until the hero lands on it, then breaks apart and disappears
///
/// ┌──────────────────────── stomp tolerance band ───────────────────────────┐
/// │          left - w/4  ┌────────── tortoise ──────────┐  right + w/4      │
/// │   ─────────[─────────┴──────────────────────────────┴─────────]──────── │
/// │   hero center inside [ ] while falling in a jump → broken, +bonus       │
/// │   anything else (unless ducking)                 → hero gets hurt       │
/// └─────────────────────────────────────────────────────────────────────────┘
/// `w` is the hero's bounds width.
pub struct Tortoise {
    body: Body,
    attack: i32,
    broken: bool,
}

impl Tortoise {
    pub fn new() -> Self {
        Tortoise {
            body: Body::new(PRIORITY),
            attack: ATTACK,
            broken: false,
        }
    }

    pub fn is_broken(&self) -> bool {
        self.broken
    }

    pub fn is_stomped_by(&self, hero: &Hero) -> bool {
        if hero.pose() != HeroPose::Jump || hero.vertical_speed() < 0.0 {
            return false;
        }
        let hero_bounds = hero.body().bounds;
        let center = hero_bounds.center_x();
        let tolerance = hero_bounds.width() / 4.0;
        center >= self.body.bounds.left - tolerance && center <= self.body.bounds.right + tolerance
    }

    fn break_shell(&mut self) {
        self.broken = true;
        self.body.restart_animation();
    }
}

impl Default for Tortoise {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait(?Send)]
impl Obstacle for Tortoise {
    fn name(&self) -> &'static str {
        "tortoise"
    }

    fn body(&self) -> &Body {
        &self.body
    }

    fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    async fn prepare(&mut self, assets: &AssetStore) -> Result<()> {
        let breaking = assets
            .load_animation(res::TORTOISE_DEAD)
            .await
            .context("Tortoise: could not load animation")?;
        self.body
            .start_animation(Animation::new(breaking).with_frame_duration(FRAME_DURATION));
        Ok(())
    }

    fn update(&mut self, _config: &SceneConfig) {
        if self.broken && self.body.advance_animation() == AnimationStatus::Ended {
            self.body.kill();
        }
    }

    fn on_collision(&mut self, hero: &mut Hero) {
        if self.is_stomped_by(hero) {
            log::debug!("tortoise stomped");
            self.break_shell();
            hero.add_bonus(STOMP_BONUS);
        } else if hero.pose() != HeroPose::Duck {
            hero.hurt(self.attack);
        }
    }
}
