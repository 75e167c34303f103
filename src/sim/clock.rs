//! Frame clock
//!
//! Two timelines advance every frame: real time, and game time scaled by
//! `time_scale`. A time scale of 0 freezes game time (questionnaire pause)
//! while real-time waits keep running.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameClock {
    /// Seconds since session start, unscaled
    pub real_time: f64,
    /// Seconds since session start, scaled
    pub game_time: f64,
    pub time_scale: f32,
    /// Frames advanced so far
    pub frame: u64,
    /// Scaled delta of the last frame
    pub game_dt: f32,
    /// Unscaled delta of the last frame
    pub real_dt: f32,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self {
            real_time: 0.0,
            game_time: 0.0,
            time_scale: 1.0,
            frame: 0,
            game_dt: 0.0,
            real_dt: 0.0,
        }
    }
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance one frame by `real_dt` seconds
    pub fn advance(&mut self, real_dt: f32) {
        let real_dt = real_dt.max(0.0);
        self.real_dt = real_dt;
        self.game_dt = real_dt * self.time_scale;
        self.real_time += real_dt as f64;
        self.game_time += self.game_dt as f64;
        self.frame += 1;
    }

    pub fn pause(&mut self) {
        self.time_scale = 0.0;
    }

    pub fn resume(&mut self) {
        self.time_scale = 1.0;
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.time_scale == 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pause_freezes_game_time_only() {
        let mut clock = FrameClock::new();
        clock.advance(0.5);
        clock.pause();
        clock.advance(2.0);
        assert!((clock.game_time - 0.5).abs() < 1e-9);
        assert!((clock.real_time - 2.5).abs() < 1e-9);
        assert_eq!(clock.game_dt, 0.0);

        clock.resume();
        clock.advance(1.0);
        assert!((clock.game_time - 1.5).abs() < 1e-9);
        assert_eq!(clock.frame, 3);
    }

    #[test]
    fn test_negative_delta_is_ignored() {
        let mut clock = FrameClock::new();
        clock.advance(-1.0);
        assert_eq!(clock.real_time, 0.0);
        assert_eq!(clock.frame, 1);
    }
}
