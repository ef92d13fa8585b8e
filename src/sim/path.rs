//! Polyline track geometry
//!
//! A path maps scalar progress in [0, 1] onto a fixed polyline:
//! - progress 0: first control point (where the chain enters)
//! - progress 1: last control point (the goal)
//!
//! Control points are spaced evenly in progress, not by arc length.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::lerp;

/// Immutable track the chain travels along
///
/// Serialized as the bare list of control points; deserializing goes through
/// `Path::new`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec2>", into = "Vec<Vec2>")]
pub struct Path {
    points: Vec<Vec2>,
}

impl Path {
    pub fn new(points: Vec<Vec2>) -> Result<Self, ConfigError> {
        if points.len() < 2 {
            return Err(ConfigError::TooFewControlPoints(points.len()));
        }
        Ok(Self { points })
    }

    /// Number of straight segments
    #[inline]
    pub fn segment_count(&self) -> usize {
        self.points.len() - 1
    }

    /// World position for a progress value (clamped to [0, 1])
    pub fn position(&self, progress: f32) -> Vec2 {
        let progress = if progress.is_nan() { 0.0 } else { progress.clamp(0.0, 1.0) };
        let last = self.points.len() - 1;
        if progress >= 1.0 {
            return self.points[last];
        }

        let scaled = progress * self.segment_count() as f32;
        // Rounding can push floor() onto the last point for progress just below 1
        let segment = (scaled.floor() as usize).min(last - 1);
        let local_t = scaled - segment as f32;

        lerp(self.points[segment], self.points[segment + 1], local_t)
    }

    pub fn start(&self) -> Vec2 {
        self.points[0]
    }

    pub fn goal(&self) -> Vec2 {
        self.points[self.points.len() - 1]
    }
}

impl TryFrom<Vec<Vec2>> for Path {
    type Error = ConfigError;

    fn try_from(points: Vec<Vec2>) -> Result<Self, Self::Error> {
        Self::new(points)
    }
}

impl From<Path> for Vec<Vec2> {
    fn from(path: Path) -> Self {
        path.points
    }
}
