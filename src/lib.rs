//! Treasure Hunt - interaction and game-progression core for an AR treasure hunt
//!
//! Core modules:
//! - `sim`: Tick-driven game core (taps, questionnaires, score, end arbiter, easter eggs)
//! - `platform`: Collaborator interfaces (raycast, audio, scenes) and a headless host
//! - `persistence`: Key-value storage for settings and scene handoff
//! - `config`: Data-driven game configuration
//! - `results`: Persistent keys shared with the menu and end scenes

pub mod config;
pub mod persistence;
pub mod platform;
pub mod results;
pub mod sim;

pub use config::GameConfig;
pub use results::{GameResult, Outcome};

use glam::Vec3;

/// Game configuration constants
pub mod consts {
    /// Surface placement attempts before falling back to camera-relative placement
    pub const SPAWN_PLACEMENT_ATTEMPTS: u32 = 5;
    /// Pause between surface placement attempts (game seconds)
    pub const SPAWN_RETRY_PAUSE: f32 = 0.2;
    /// Random screen rays cast per surface lookup before the center ray
    pub const SURFACE_PROBE_RAYS: u32 = 5;
    /// Screen-fraction band the surface probes are drawn from
    pub const SURFACE_PROBE_MIN: f32 = 0.3;
    pub const SURFACE_PROBE_MAX: f32 = 0.7;
    /// Max distance for surface probes (meters)
    pub const SURFACE_RAY_DISTANCE: f32 = 10.0;
    /// Lift above a detected surface to avoid z-fighting
    pub const SURFACE_LIFT: f32 = 0.05;

    /// Fallback view cone (fraction of right/up vectors added to forward)
    pub const FALLBACK_HORIZONTAL_SPREAD: f32 = 0.3;
    pub const FALLBACK_VERTICAL_SPREAD: f32 = 0.2;

    /// Max tap raycast distance (meters)
    pub const TAP_RAY_DISTANCE: f32 = 100.0;
    /// Minimum shrink-out duration for a collected easter egg (game seconds)
    pub const MIN_COLLECT_DURATION: f32 = 0.5;

    /// Real-time settle delay after a questionnaire before a deferred win
    pub const QUESTIONNAIRE_SETTLE_DELAY: f32 = 0.5;
}

/// Yaw (radians about +Y) that turns an object at `from` to face `to`.
///
/// Height difference is ignored so the object stays upright. Returns `None`
/// when the two points coincide on the ground plane.
#[inline]
pub fn yaw_towards(from: Vec3, to: Vec3) -> Option<f32> {
    let dir = to - from;
    if dir.x == 0.0 && dir.z == 0.0 {
        return None;
    }
    Some(dir.x.atan2(dir.z))
}

/// Wrap an angle to [0, 2π)
#[inline]
pub fn wrap_yaw(angle: f32) -> f32 {
    angle.rem_euclid(std::f32::consts::TAU)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_yaw_towards_axes() {
        let yaw = yaw_towards(Vec3::ZERO, Vec3::new(0.0, 5.0, 1.0)).unwrap();
        assert!(yaw.abs() < 0.0001);

        let yaw = yaw_towards(Vec3::ZERO, Vec3::new(2.0, -1.0, 0.0)).unwrap();
        assert!((yaw - FRAC_PI_2).abs() < 0.0001);

        let yaw = yaw_towards(Vec3::ZERO, Vec3::new(0.0, 0.0, -3.0)).unwrap();
        assert!((yaw.abs() - PI).abs() < 0.0001);
    }

    #[test]
    fn test_yaw_towards_directly_above() {
        assert!(yaw_towards(Vec3::ZERO, Vec3::new(0.0, 2.0, 0.0)).is_none());
    }

    #[test]
    fn test_wrap_yaw() {
        assert!((wrap_yaw(-FRAC_PI_2) - 3.0 * FRAC_PI_2).abs() < 0.0001);
        assert!(wrap_yaw(7.0) < std::f32::consts::TAU);
    }
}
