//! The player controlled runner
//!
//! ┌──────────────────────────── Hero Layers ────────────────────────────────┐
//! │  Hero              : Obstacle impl, animations, health, bonus score     │
//! │  HeroStateMachine  : enum over every HeroState<S>, routes Events        │
//! │  HeroState<S>      : typestate, only legal transitions exist            │
//! └─────────────────────────────────────────────────────────────────────────┘
//!
//! RUN → JUMP → RUN and RUN → DUCK → RUN, both entered from RUN only and left
//! when their animation ends.
use crate::engine::assets::{res, AssetStore};
use crate::engine::{InputEvent, SoundHandle};
use crate::obstacle::{Body, Obstacle};
use crate::scene::SceneConfig;
use crate::sprite::{Animation, AnimationStatus, Frames};
use anyhow::{Context, Result};
use async_trait::async_trait;

pub mod state;

use self::state::{Ducking, HeroContext, HeroState, IsDucking, IsJumping, Jumping, Running};

// ==================== Constants ====================
pub const PRIORITY: u8 = 255;
pub const MAX_HEALTH: i32 = 10;
// the duck animation holds its last frame for this many ticks in total
pub const DUCK_DURATION: u32 = 60;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum HeroPose {
    Run,
    Jump,
    Duck,
}

pub enum Event {
    Jump { gravity: f32, ground: f32 },
    Duck,
    Update { bottom: f32, animation_ended: bool },
}

#[derive(Debug, Copy, Clone)]
pub enum HeroStateMachine {
    Running(HeroState<Running>),
    Jumping(HeroState<Jumping>),
    Ducking(HeroState<Ducking>),
}

impl HeroStateMachine {
    pub fn transition(self, event: Event) -> Self {
        match (self, event) {
            (HeroStateMachine::Running(state), Event::Jump { gravity, ground }) => {
                state.jump(gravity, ground).into()
            }
            (HeroStateMachine::Running(state), Event::Duck) => state.duck().into(),
            (
                HeroStateMachine::Jumping(state),
                Event::Update {
                    bottom,
                    animation_ended,
                },
            ) => state.update(bottom, animation_ended).into(),
            (HeroStateMachine::Ducking(state), Event::Update { animation_ended, .. }) => {
                state.update(animation_ended).into()
            }
            // jumps and ducks are never chained
            _ => self,
        }
    }

    pub fn pose(&self) -> HeroPose {
        match self {
            HeroStateMachine::Running(_) => HeroPose::Run,
            HeroStateMachine::Jumping(_) => HeroPose::Jump,
            HeroStateMachine::Ducking(_) => HeroPose::Duck,
        }
    }

    pub fn context(&self) -> &HeroContext {
        match self {
            HeroStateMachine::Running(state) => state.context(),
            HeroStateMachine::Jumping(state) => state.context(),
            HeroStateMachine::Ducking(state) => state.context(),
        }
    }
}

impl From<HeroState<Running>> for HeroStateMachine {
    fn from(state: HeroState<Running>) -> Self {
        HeroStateMachine::Running(state)
    }
}

impl From<HeroState<Jumping>> for HeroStateMachine {
    fn from(state: HeroState<Jumping>) -> Self {
        HeroStateMachine::Jumping(state)
    }
}

impl From<HeroState<Ducking>> for HeroStateMachine {
    fn from(state: HeroState<Ducking>) -> Self {
        HeroStateMachine::Ducking(state)
    }
}

impl From<IsJumping> for HeroStateMachine {
    fn from(state: IsJumping) -> Self {
        match state {
            IsJumping::Done(running) => running.into(),
            IsJumping::InProgress(jumping) => jumping.into(),
        }
    }
}

impl From<IsDucking> for HeroStateMachine {
    fn from(state: IsDucking) -> Self {
        match state {
            IsDucking::Done(running) => running.into(),
            IsDucking::InProgress(ducking) => ducking.into(),
        }
    }
}

struct HeroAnimations {
    run: Animation,
    jump: Animation,
    duck: Animation,
}

impl HeroAnimations {
    fn new(run: Frames, jump: Frames, duck: Frames) -> Self {
        HeroAnimations {
            run: Animation::new(run).repeating(),
            jump: Animation::new(jump),
            duck: Animation::new(duck).with_animation_duration(DUCK_DURATION),
        }
    }

    fn for_pose(&mut self, pose: HeroPose) -> &mut Animation {
        match pose {
            HeroPose::Run => &mut self.run,
            HeroPose::Jump => &mut self.jump,
            HeroPose::Duck => &mut self.duck,
        }
    }
}

pub struct Hero {
    body: Body,
    state_machine: HeroStateMachine,
    animations: Option<HeroAnimations>,
    hit_sound: Option<SoundHandle>,
    health: i32,
    bonus_score: u64,
}

impl Hero {
    pub fn new() -> Self {
        Hero {
            body: Body::new(PRIORITY),
            state_machine: HeroState::new().into(),
            animations: None,
            hit_sound: None,
            health: MAX_HEALTH,
            bonus_score: 0,
        }
    }

    pub fn pose(&self) -> HeroPose {
        self.state_machine.pose()
    }

    pub fn health(&self) -> i32 {
        self.health
    }

    pub fn bonus_score(&self) -> u64 {
        self.bonus_score
    }

    pub fn add_bonus(&mut self, bonus: u64) {
        self.bonus_score += bonus;
    }

    pub fn x_speed(&self) -> f32 {
        self.state_machine.context().velocity.x
    }

    /// Negative while climbing, zero from the apex on
    pub fn vertical_speed(&self) -> f32 {
        self.state_machine.context().velocity.y
    }

    /// Lose `amount` health. Dying is decided by the game manager.
    pub fn hurt(&mut self, amount: i32) {
        self.health -= amount;
        log::debug!("hero hurt by {}, health {}", amount, self.health);
        if let Some(sound) = &self.hit_sound {
            sound.play();
        }
    }

    /// Push the hero `distance` to the left
    pub fn knock_back(&mut self, distance: f32) {
        self.body.bounds.offset(-distance, 0.0);
    }

    pub fn jump(&mut self, gravity: f32) {
        let ground = self.body.bounds.bottom;
        self.transition(Event::Jump { gravity, ground });
    }

    pub fn duck(&mut self) {
        self.transition(Event::Duck);
    }

    fn transition(&mut self, event: Event) {
        let before = self.state_machine.pose();
        self.state_machine = self.state_machine.transition(event);
        if self.state_machine.pose() != before {
            self.show_pose();
        }
    }

    /// Restart the animation of the current pose and show its first frame
    fn show_pose(&mut self) {
        let pose = self.state_machine.pose();
        if let Some(animations) = self.animations.as_mut() {
            let animation = animations.for_pose(pose);
            animation.start();
            self.body.update_sprite(animation.current_frame().clone());
        }
    }

    fn advance_animation(&mut self) -> AnimationStatus {
        let pose = self.state_machine.pose();
        let Some(animations) = self.animations.as_mut() else {
            return AnimationStatus::Playing;
        };
        let animation = animations.for_pose(pose);
        let status = animation.update();
        self.body.update_sprite(animation.current_frame().clone());
        status
    }
}

impl Default for Hero {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait(?Send)]
impl Obstacle for Hero {
    fn name(&self) -> &'static str {
        "hero"
    }

    fn body(&self) -> &Body {
        &self.body
    }

    fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    async fn prepare(&mut self, assets: &AssetStore) -> Result<()> {
        let (run, jump, duck, hit) = futures::try_join!(
            assets.load_animation(res::HERO_RUN),
            assets.load_animation(res::HERO_JUMP),
            assets.load_animation(res::HERO_DOWN),
            assets.load_sound(res::HIT),
        )
        .context("Hero: could not load assets")?;
        self.animations = Some(HeroAnimations::new(run, jump, duck));
        self.hit_sound = Some(hit);
        self.show_pose();
        Ok(())
    }

    fn update(&mut self, _config: &SceneConfig) {
        let animation_ended = self.advance_animation() == AnimationStatus::Ended;
        self.transition(Event::Update {
            bottom: self.body.bounds.bottom,
            animation_ended,
        });
        let velocity = self.state_machine.context().velocity;
        self.body.bounds.offset(velocity.x, velocity.y);
    }

    fn handle_input(&mut self, event: InputEvent, config: &SceneConfig) -> bool {
        let before = self.pose();
        match event {
            InputEvent::Primary => self.jump(config.gravity),
            InputEvent::Secondary => self.duck(),
        }
        self.pose() != before
    }

    fn as_hero(&self) -> Option<&Hero> {
        Some(self)
    }

    fn as_hero_mut(&mut self) -> Option<&mut Hero> {
        Some(self)
    }
}
