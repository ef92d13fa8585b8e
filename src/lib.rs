//! Marble Chain - path-chain marble shooter simulation
//!
//! Core modules:
//! - `sim`: Deterministic simulation (path, chain, projectiles, matching, session)
//! - `level`: Data-driven level configuration
//! - `error`: Config and invariant error types

pub mod error;
pub mod level;
pub mod sim;

pub use error::{ConfigError, InvariantViolation, SimError};
pub use level::{LevelConfig, SeedPattern};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (one tick per rendered frame at 60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 4;

    /// Marble and projectile radius (pixels)
    pub const MARBLE_RADIUS: f32 = 14.0;
    /// Centre distance below which a projectile hits a marble
    pub const COLLISION_RADIUS: f32 = MARBLE_RADIUS * 2.0;

    /// Points per removed marble before combo multiplier
    pub const BASE_POINTS: u64 = 10;
    /// Largest `base_points` a level may ask for
    pub const MAX_BASE_POINTS: u64 = 1_000_000;
    /// Seconds after a removal during which the next removal extends the combo
    pub const COMBO_WINDOW: f32 = 2.0;

    /// Minimum run length that gets removed
    pub const MIN_RUN: usize = 3;
}

/// Linear interpolation between two points
#[inline]
pub fn lerp(a: Vec2, b: Vec2, t: f32) -> Vec2 {
    a + (b - a) * t
}

/// Convert a timestep to whole nanoseconds (negative and NaN become 0)
#[inline]
pub fn seconds_to_nanos(seconds: f32) -> u64 {
    (seconds as f64 * 1e9).round() as u64
}

/// Axis-aligned playfield rectangle
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Bounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl Bounds {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// True if `pos` lies inside the rectangle (edges inclusive)
    #[inline]
    pub fn contains(&self, pos: Vec2) -> bool {
        pos.x >= self.min.x && pos.x <= self.max.x && pos.y >= self.min.y && pos.y <= self.max.y
    }

    /// A rectangle with positive width and height
    pub fn is_valid(&self) -> bool {
        self.max.x > self.min.x && self.max.y > self.min.y
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_contains_edges() {
        let b = Bounds::new(Vec2::ZERO, Vec2::new(100.0, 50.0));
        assert!(b.contains(Vec2::new(0.0, 0.0)));
        assert!(b.contains(Vec2::new(100.0, 50.0)));
        assert!(!b.contains(Vec2::new(100.1, 10.0)));
        assert!(!b.contains(Vec2::new(10.0, -0.1)));
        assert_eq!(b.center(), Vec2::new(50.0, 25.0));
    }

    #[test]
    fn test_seconds_to_nanos() {
        assert_eq!(seconds_to_nanos(2.0), 2_000_000_000);
        assert_eq!(seconds_to_nanos(0.25), 250_000_000);
        assert_eq!(seconds_to_nanos(-1.0), 0);
        assert_eq!(seconds_to_nanos(f32::NAN), 0);
    }

    #[test]
    fn test_lerp() {
        let p = lerp(Vec2::ZERO, Vec2::new(10.0, 20.0), 0.25);
        assert!((p - Vec2::new(2.5, 5.0)).length() < 1e-6);
    }
}
