//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Caller-supplied timestep only
//! - Injected RNG only
//! - Stable iteration order (chain order, then projectile order)
//! - No rendering or platform dependencies

pub mod chain;
pub mod matching;
pub mod path;
pub mod projectile;
pub mod state;
pub mod tick;

pub use chain::{Chain, Marble, MarbleColor};
pub use matching::{Combo, MatchRules, RemovedRun, Resolution, find_run, resolve};
pub use path::Path;
pub use projectile::{Projectile, advance_projectiles, circles_touch, find_hit};
pub use state::{GameSession, Outcome, SessionState, Shooter, Snapshot};
pub use tick::{TickReport, tick};
