//! Step cursor state machine.
//!
//! The cursor moves within `[0, max_step]`. While playing, every tick whose
//! time since the last recorded step change reaches the step duration
//! advances the cursor by one. Running past the last step pauses playback
//! at `max_step`; playback never loops.

use std::time::{Duration, Instant};

use serde::Serialize;
use utoipa::ToSchema;

use crate::observer::{ObserverRegistry, Subscription};

pub const DEFAULT_STEP_DURATION: Duration = Duration::from_millis(500);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    Playing,
    Paused,
}

impl PlaybackState {
    pub fn is_playing(self) -> bool {
        self == PlaybackState::Playing
    }
}

pub struct StepAnimationController {
    current_step: u32,
    max_step: u32,
    playing: bool,
    step_duration: Duration,
    last_change: Instant,
    step_changed: ObserverRegistry<u32>,
    play_state_changed: ObserverRegistry<PlaybackState>,
    disposed: bool,
}

impl StepAnimationController {
    pub fn new(step_duration: Duration) -> Self {
        Self {
            current_step: 0,
            max_step: 0,
            playing: false,
            step_duration,
            last_change: Instant::now(),
            step_changed: ObserverRegistry::new(),
            play_state_changed: ObserverRegistry::new(),
            disposed: false,
        }
    }

    pub fn current_step(&self) -> u32 {
        self.current_step
    }

    pub fn max_step(&self) -> u32 {
        self.max_step
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn step_duration(&self) -> Duration {
        self.step_duration
    }

    pub fn playback_state(&self) -> PlaybackState {
        if self.playing {
            PlaybackState::Playing
        } else {
            PlaybackState::Paused
        }
    }

    pub fn on_step_change(&self, callback: impl Fn(&u32) + Send + Sync + 'static) -> Subscription {
        self.step_changed.subscribe(callback)
    }

    pub fn on_play_state_change(
        &self,
        callback: impl Fn(&PlaybackState) + Send + Sync + 'static,
    ) -> Subscription {
        self.play_state_changed.subscribe(callback)
    }

    /// Sets a new upper bound, clamping the cursor into range.
    pub fn set_max_step(&mut self, max_step: u32) {
        if self.disposed {
            return;
        }
        self.max_step = max_step;
        if self.current_step > max_step {
            self.set_current_step(max_step);
        }
    }

    /// Moves the cursor, clamped to `[0, max_step]`.
    ///
    /// Returns `false` and notifies nobody when the clamped value equals
    /// the current step.
    pub fn set_current_step(&mut self, step: u32) -> bool {
        self.set_current_step_at(step, Instant::now())
    }

    fn set_current_step_at(&mut self, step: u32, now: Instant) -> bool {
        if self.disposed {
            return false;
        }
        let clamped = step.min(self.max_step);
        if clamped == self.current_step {
            return false;
        }
        self.current_step = clamped;
        self.last_change = now;
        log::debug!("🎞️ Step {} / {}", clamped, self.max_step);
        self.step_changed.notify(&clamped);
        true
    }

    pub fn play(&mut self) {
        self.play_at(Instant::now());
    }

    /// Starts playback; rewinds to step 0 first when already at the end.
    pub fn play_at(&mut self, now: Instant) {
        if self.disposed || self.playing {
            return;
        }
        if self.current_step >= self.max_step {
            self.set_current_step_at(0, now);
        }
        self.last_change = now;
        self.set_playing(true);
    }

    /// Stops playback. Idempotent.
    pub fn pause(&mut self) {
        if self.disposed || !self.playing {
            return;
        }
        self.set_playing(false);
    }

    pub fn toggle(&mut self) {
        self.toggle_at(Instant::now());
    }

    pub fn toggle_at(&mut self, now: Instant) {
        if self.playing {
            self.pause();
        } else {
            self.play_at(now);
        }
    }

    /// Pauses, then jumps to step 0.
    pub fn reset(&mut self) {
        self.pause();
        self.set_current_step(0);
    }

    pub fn tick(&mut self) -> bool {
        self.tick_at(Instant::now())
    }

    /// Advances at most one step.
    ///
    /// Returns `true` when the cursor moved.
    pub fn tick_at(&mut self, now: Instant) -> bool {
        if self.disposed || !self.playing {
            return false;
        }
        if now.saturating_duration_since(self.last_change) < self.step_duration {
            return false;
        }
        let next = self.current_step.saturating_add(1);
        if next > self.max_step {
            self.pause();
            self.set_current_step_at(self.max_step, now);
            return false;
        }
        self.set_current_step_at(next, now)
    }

    fn set_playing(&mut self, playing: bool) {
        self.playing = playing;
        let state = self.playback_state();
        log::debug!("⏯️ Playback {:?}", state);
        self.play_state_changed.notify(&state);
    }

    /// Stops playback and drops every subscriber. Later calls are no-ops.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.playing = false;
        self.step_changed.clear();
        self.play_state_changed.clear();
        self.disposed = true;
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

impl Default for StepAnimationController {
    fn default() -> Self {
        Self::new(DEFAULT_STEP_DURATION)
    }
}
