/// All code relating to individual hero states lives here and keeps invalid
/// states unrepresentable : a transition only exists as a method on the state
/// it may start from
/// - PUBLIC  : HeroState and HeroContext are public
/// - PRIVATE : their members are private, changed only through transitions

// rise above the jump origin at which the hero stops climbing
pub const JUMP_HEIGHT: f32 = 150.0;
pub const RUNNING_SPEED: f32 = 5.0;

#[derive(Debug, Copy, Clone)]
pub struct Running;

#[derive(Debug, Copy, Clone)]
pub struct Jumping;

#[derive(Debug, Copy, Clone)]
pub struct Ducking;

pub enum IsJumping {
    Done(HeroState<Running>),
    InProgress(HeroState<Jumping>),
}

pub enum IsDucking {
    Done(HeroState<Running>),
    InProgress(HeroState<Ducking>),
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Velocity {
    pub x: f32,
    pub y: f32,
}

/// Shared physics data for every state
/// - velocity   : horizontal run speed + vertical speed (negative is up)
/// - jump_start : bounds bottom when the current jump began
#[derive(Debug, Copy, Clone)]
pub struct HeroContext {
    pub velocity: Velocity,
    pub jump_start: f32,
}

#[derive(Debug, Copy, Clone)]
pub struct HeroState<S> {
    context: HeroContext,
    // phantom marker, only differentiates states at compile time
    _state: S,
}

impl<S> HeroState<S> {
    pub fn context(&self) -> &HeroContext {
        &self.context
    }
}

impl HeroState<Running> {
    pub fn new() -> Self {
        HeroState {
            context: HeroContext {
                velocity: Velocity {
                    x: RUNNING_SPEED,
                    y: 0.0,
                },
                jump_start: 0.0,
            },
            _state: Running,
        }
    }

    /// Launch at twice the gravity : the scene pulls everything down by
    /// `gravity` each tick, so the net climb is `gravity` per tick
    pub fn jump(self, gravity: f32, ground: f32) -> HeroState<Jumping> {
        HeroState {
            context: self
                .context
                .set_vertical_velocity(-2.0 * gravity)
                .with_jump_start(ground),
            _state: Jumping,
        }
    }

    pub fn duck(self) -> HeroState<Ducking> {
        HeroState {
            context: self.context,
            _state: Ducking,
        }
    }
}

impl Default for HeroState<Running> {
    fn default() -> Self {
        Self::new()
    }
}

impl HeroState<Jumping> {
    /// Returns an enum because a jump can :
    /// - End      (Done) once its animation has played out
    /// - Continue (InProgress)
    pub fn update(mut self, bottom: f32, animation_ended: bool) -> IsJumping {
        if self.context.jump_start - bottom >= JUMP_HEIGHT {
            // apex, gravity takes over from here
            self.context = self.context.set_vertical_velocity(0.0);
        }
        if animation_ended {
            IsJumping::Done(self.land())
        } else {
            IsJumping::InProgress(self)
        }
    }

    /// The animation decides when a jump is over, not the ground. Dropping
    /// the vertical speed lets gravity finish the descent.
    pub fn land(self) -> HeroState<Running> {
        HeroState {
            context: self.context.set_vertical_velocity(0.0),
            _state: Running,
        }
    }
}

impl HeroState<Ducking> {
    pub fn update(self, animation_ended: bool) -> IsDucking {
        if animation_ended {
            IsDucking::Done(self.stand())
        } else {
            IsDucking::InProgress(self)
        }
    }

    pub fn stand(self) -> HeroState<Running> {
        HeroState {
            context: self.context,
            _state: Running,
        }
    }
}

impl HeroContext {
    fn set_vertical_velocity(mut self, y: f32) -> Self {
        self.velocity.y = y;
        self
    }

    fn with_jump_start(mut self, ground: f32) -> Self {
        self.jump_start = ground;
        self
    }
}
