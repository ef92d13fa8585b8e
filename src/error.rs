//! Error taxonomy
//!
//! Only configuration mistakes and broken simulation invariants are errors.
//! Misses, quiet ticks and Won/Lost are ordinary session state.

use thiserror::Error;

/// Level configuration rejected at session creation
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("path needs at least 2 control points, got {0}")]
    TooFewControlPoints(usize),
    #[error("palette size must be in 1..={max}, got {size}")]
    PaletteSize { size: usize, max: usize },
    #[error("{field} must be positive and finite, got {value}")]
    NonPositive { field: &'static str, value: f32 },
    #[error("chain of {count} marbles spaced {spacing} does not fit on the path")]
    ChainTooLong { count: usize, spacing: f32 },
    #[error("base_points must be at most {max}, got {value}")]
    BasePointsTooLarge { value: u64, max: u64 },
    #[error("playfield bounds are empty")]
    EmptyBounds,
    #[error("invalid level json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Internal coordination defect between simulation components
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvariantViolation {
    #[error("hit marble {id} is not in the chain")]
    HitMarbleMissing { id: u32 },
    #[error("chain unsorted at index {index}: {before} > {after}")]
    ChainUnsorted { index: usize, before: f32, after: f32 },
}

/// Anything that aborts a session
#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Invariant(#[from] InvariantViolation),
    #[error("session was aborted and cannot be ticked")]
    SessionAborted,
}
