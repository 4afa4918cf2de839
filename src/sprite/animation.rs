use super::{Frames, Sprite};

/// Ticks each frame stays on screen unless configured otherwise
pub const DEFAULT_FRAME_DURATION: u32 = 10;

/// Observer for animation progress
/// - on_update fires only when the frame index actually changes
/// - on_end fires once, on the tick elapsed reaches the animation duration
pub trait AnimationListener {
    fn on_start(&mut self) {}
    fn on_update(&mut self, _index: usize) {}
    fn on_end(&mut self) {}
}

/// What a single `update()` did, so owners can react without a listener
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AnimationStatus {
    /// still on the same frame (or holding the last one after the end)
    Playing,
    FrameChanged(usize),
    /// reached the end on this tick, repeating animations are already restarted
    Ended,
}

/// Frame clock over a shared atlas
///
/// ┌───────────────── ticks vs frames (4 frames, frame duration 5) ──────────┐
/// │ elapsed : 0....4 5....9 10..14 15..19 20                                │
/// │ index   :   0      1      2      3    3 + end                           │
/// └─────────────────────────────────────────────────────────────────────────┘
/// `animation_duration` defaults to frame_duration * frame_count but can be
/// overridden to cut the animation short or hold the last frame longer.
pub struct Animation {
    frames: Frames,
    frame_duration: u32,
    duration_override: Option<u32>,
    elapsed: u32,
    current: usize,
    repeat: bool,
    listener: Option<Box<dyn AnimationListener>>,
}

impl Animation {
    pub fn new(frames: Frames) -> Self {
        assert!(!frames.is_empty(), "an animation needs at least one frame");
        Animation {
            frames,
            frame_duration: DEFAULT_FRAME_DURATION,
            duration_override: None,
            elapsed: 0,
            current: 0,
            repeat: false,
            listener: None,
        }
    }

    /// Restart from the first frame every time the end is reached
    pub fn repeating(mut self) -> Self {
        self.repeat = true;
        self
    }

    pub fn with_frame_duration(mut self, ticks: u32) -> Self {
        self.set_frame_duration(ticks);
        self
    }

    pub fn with_animation_duration(mut self, ticks: u32) -> Self {
        self.set_animation_duration(ticks);
        self
    }

    pub fn set_frame_duration(&mut self, ticks: u32) {
        assert!(ticks > 0, "frame duration must be at least one tick");
        self.frame_duration = ticks;
    }

    pub fn set_animation_duration(&mut self, ticks: u32) {
        self.duration_override = Some(ticks);
    }

    pub fn set_listener(&mut self, listener: Box<dyn AnimationListener>) {
        self.listener = Some(listener);
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn frame_duration(&self) -> u32 {
        self.frame_duration
    }

    pub fn animation_duration(&self) -> u32 {
        self.duration_override
            .unwrap_or(self.frame_duration * self.frames.len() as u32)
    }

    pub fn elapsed(&self) -> u32 {
        self.elapsed
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_frame(&self) -> &Sprite {
        &self.frames[self.current]
    }

    pub fn is_finished(&self) -> bool {
        !self.repeat && self.elapsed >= self.animation_duration()
    }

    pub fn start(&mut self) {
        self.elapsed = 0;
        self.current = 0;
        if let Some(listener) = self.listener.as_mut() {
            listener.on_start();
        }
    }

    /// Advance one simulation tick
    pub fn update(&mut self) -> AnimationStatus {
        let duration = self.animation_duration();
        if self.elapsed >= duration {
            return AnimationStatus::Playing;
        }

        self.elapsed += 1;
        let index = ((self.elapsed / self.frame_duration) as usize).min(self.frames.len() - 1);

        let mut status = AnimationStatus::Playing;
        if index != self.current {
            self.current = index;
            if let Some(listener) = self.listener.as_mut() {
                listener.on_update(index);
            }
            status = AnimationStatus::FrameChanged(index);
        }

        if self.elapsed >= duration {
            if let Some(listener) = self.listener.as_mut() {
                listener.on_end();
            }
            if self.repeat {
                self.start();
            }
            status = AnimationStatus::Ended;
        }
        status
    }
}
