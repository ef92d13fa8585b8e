//! The marble chain
//!
//! Marbles travel along the path in ascending progress order. Index 0 is the
//! tail (least progress), the last index is the head nearest the goal.
//! Positions are a cache derived from progress and refreshed every tick.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::path::Path;
use crate::error::InvariantViolation;

/// Fixed marble palette; levels use the first `palette_size` entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarbleColor {
    Red,
    Green,
    Blue,
    Yellow,
    Purple,
    Orange,
}

impl MarbleColor {
    pub const ALL: [MarbleColor; 6] = [
        MarbleColor::Red,
        MarbleColor::Green,
        MarbleColor::Blue,
        MarbleColor::Yellow,
        MarbleColor::Purple,
        MarbleColor::Orange,
    ];

    /// The first `size` palette colors
    pub fn palette(size: usize) -> &'static [MarbleColor] {
        &Self::ALL[..size.min(Self::ALL.len())]
    }
}

/// A marble in the chain
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Marble {
    pub id: u32,
    pub color: MarbleColor,
    /// Scalar position along the path (1.0 = goal)
    pub progress: f32,
    /// Derived from `progress` via the path
    pub pos: Vec2,
}

impl Marble {
    pub fn new(id: u32, color: MarbleColor, progress: f32) -> Self {
        Self {
            id,
            color,
            progress,
            pos: Vec2::ZERO,
        }
    }
}

/// Ordered marble sequence, sorted by ascending progress
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Chain {
    marbles: Vec<Marble>,
}

impl Chain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap marbles as given; callers are expected to supply them in order
    pub fn from_marbles(marbles: Vec<Marble>) -> Self {
        Self { marbles }
    }

    pub fn marbles(&self) -> &[Marble] {
        &self.marbles
    }

    pub fn len(&self) -> usize {
        self.marbles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marbles.is_empty()
    }

    pub fn colors(&self) -> Vec<MarbleColor> {
        self.marbles.iter().map(|m| m.color).collect()
    }

    pub fn index_of(&self, id: u32) -> Option<usize> {
        self.marbles.iter().position(|m| m.id == id)
    }

    /// Marble nearest the goal
    pub fn head(&self) -> Option<&Marble> {
        self.marbles.last()
    }

    /// Move every marble forward by `speed * dt` and refresh positions.
    ///
    /// Returns the id of a marble that reached the goal, if any. Nothing is
    /// removed here; reaching the goal ends the session.
    pub fn advance(&mut self, path: &Path, speed: f32, dt: f32) -> Option<u32> {
        let delta = speed * dt;
        for marble in &mut self.marbles {
            marble.progress += delta;
        }
        self.refresh_positions(path);

        self.marbles
            .iter()
            .rev()
            .find(|m| m.progress >= 1.0)
            .map(|m| m.id)
    }

    /// Recompute every cached position from progress
    pub fn refresh_positions(&mut self, path: &Path) {
        for marble in &mut self.marbles {
            marble.pos = path.position(marble.progress);
        }
    }

    /// Verify ascending progress order (ties allowed)
    pub fn check_sorted(&self) -> Result<(), InvariantViolation> {
        for (index, pair) in self.marbles.windows(2).enumerate() {
            if pair[0].progress > pair[1].progress {
                return Err(InvariantViolation::ChainUnsorted {
                    index: index + 1,
                    before: pair[0].progress,
                    after: pair[1].progress,
                });
            }
        }
        Ok(())
    }

    /// Splice a new marble immediately behind the hit marble.
    ///
    /// The new marble sits `offset` progress behind the hit marble. If that
    /// would reach the predecessor, it is placed halfway between the two
    /// instead; if they already share progress it ties with the predecessor
    /// and sorts after it. Returns the index of the new marble.
    pub fn insert_behind(
        &mut self,
        path: &Path,
        hit_id: u32,
        id: u32,
        color: MarbleColor,
        offset: f32,
    ) -> Result<usize, InvariantViolation> {
        let index = self
            .index_of(hit_id)
            .ok_or(InvariantViolation::HitMarbleMissing { id: hit_id })?;
        let hit_progress = self.marbles[index].progress;

        let wanted = hit_progress - offset;
        let progress = match index.checked_sub(1).map(|i| self.marbles[i].progress) {
            Some(prev) if wanted <= prev => prev + (hit_progress - prev) * 0.5,
            _ => wanted,
        };

        let mut marble = Marble::new(id, color, progress);
        marble.pos = path.position(progress);
        self.marbles.insert(index, marble);

        log::debug!(
            "Inserted marble {} ({:?}) at index {} behind {} (progress {:.4})",
            id,
            color,
            index,
            hit_id,
            progress
        );
        Ok(index)
    }

    /// Remove a contiguous run of marbles, returning them in order
    pub(crate) fn remove_run(&mut self, start: usize, len: usize) -> Vec<Marble> {
        self.marbles.drain(start..start + len).collect()
    }
}
