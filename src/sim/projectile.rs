//! Player shots and shot-vs-chain collision
//!
//! Projectiles fly in straight lines until they touch a chain marble or
//! leave the playfield. Leaving the playfield is an ordinary miss.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::chain::{Chain, MarbleColor};
use crate::Bounds;
use crate::consts::COLLISION_RADIUS;

/// A shot in flight
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub id: u32,
    pub color: MarbleColor,
    pub pos: Vec2,
    pub vel: Vec2,
}

impl Projectile {
    /// Launch from `origin` along `direction` (need not be normalized).
    ///
    /// Returns `None` for a zero or non-finite direction.
    pub fn spawn(id: u32, origin: Vec2, direction: Vec2, color: MarbleColor, speed: f32) -> Option<Self> {
        let dir = direction.try_normalize()?;
        Some(Self {
            id,
            color,
            pos: origin,
            vel: dir * speed,
        })
    }

    #[inline]
    pub fn step(&mut self, dt: f32) {
        self.pos += self.vel * dt;
    }
}

/// Move every projectile and drop the ones that left the playfield.
///
/// Returns how many were dropped.
pub fn advance_projectiles(projectiles: &mut Vec<Projectile>, dt: f32, bounds: &Bounds) -> usize {
    let before = projectiles.len();
    for shot in projectiles.iter_mut() {
        shot.step(dt);
    }
    projectiles.retain(|shot| {
        let inside = bounds.contains(shot.pos);
        if !inside {
            log::debug!("Projectile {} left the playfield", shot.id);
        }
        inside
    });
    before - projectiles.len()
}

/// True if two marble-sized circles centred at `a` and `b` overlap
#[inline]
pub fn circles_touch(a: Vec2, b: Vec2) -> bool {
    a.distance_squared(b) < COLLISION_RADIUS * COLLISION_RADIUS
}

/// First chain marble (in chain order) the projectile touches.
///
/// Marbles listed in `spent` were already hit this tick and are skipped.
pub fn find_hit(shot: &Projectile, chain: &Chain, spent: &[u32]) -> Option<u32> {
    chain
        .marbles()
        .iter()
        .filter(|m| !spent.contains(&m.id))
        .find(|m| circles_touch(shot.pos, m.pos))
        .map(|m| m.id)
}
