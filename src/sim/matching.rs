//! Same-color run detection and chain reactions
//!
//! A resolution pass removes the leftmost run of `MIN_RUN` or more
//! same-colored marbles, scores it, and rescans the shortened chain until no
//! run qualifies. The pass is synchronous; presentation layers replay the
//! returned `RemovedRun` log at whatever pace they like.

use serde::{Deserialize, Serialize};

use super::chain::{Chain, MarbleColor};
use crate::consts::MIN_RUN;

/// Combo multiplier state shared across resolution passes
///
/// Times are whole nanoseconds of session clock, so windows compare exactly
/// however long the session has been running.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Combo {
    /// Consecutive removals inside the combo window
    pub count: u32,
    /// Session clock at which the current combo lapses
    pub deadline: Option<u64>,
}

impl Combo {
    /// Update the combo for a removal happening at `now` and return the
    /// multiplier to score it with.
    pub fn register(&mut self, now: u64, window: u64) -> u64 {
        match self.deadline {
            Some(deadline) if now < deadline => self.count = self.count.saturating_add(1),
            _ => self.count = 0,
        }
        self.deadline = Some(now.saturating_add(window));
        1 + self.count as u64
    }

    /// True while a removal at `now` would extend the combo
    pub fn is_active(&self, now: u64) -> bool {
        self.deadline.is_some_and(|d| now < d)
    }
}

/// Record of one removed run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemovedRun {
    pub color: MarbleColor,
    pub marble_ids: Vec<u32>,
    /// Progress of the rearmost removed marble
    pub start_progress: f32,
    pub score: u64,
    /// Combo count used to score this run
    pub combo: u32,
}

/// Result of one resolution pass
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub total_score: u64,
    pub match_count: u32,
    pub removed: Vec<RemovedRun>,
}

/// Scoring parameters for a pass
#[derive(Debug, Clone, Copy)]
pub struct MatchRules {
    pub base_points: u64,
    /// Combo window in nanoseconds
    pub combo_window: u64,
}

/// Leftmost maximal run of at least `MIN_RUN` marbles, as (start, len)
pub fn find_run(chain: &Chain) -> Option<(usize, usize)> {
    let marbles = chain.marbles();
    let mut start = 0;
    while start < marbles.len() {
        let color = marbles[start].color;
        let len = marbles[start..].iter().take_while(|m| m.color == color).count();
        if len >= MIN_RUN {
            return Some((start, len));
        }
        start += len;
    }
    None
}

/// Remove runs until the chain reaches its fixed point.
///
/// Terminates because every iteration removes at least `MIN_RUN` marbles.
/// Scores saturate at `u64::MAX` instead of wrapping.
pub fn resolve(chain: &mut Chain, combo: &mut Combo, now: u64, rules: MatchRules) -> Resolution {
    let mut resolution = Resolution::default();

    while let Some((start, len)) = find_run(chain) {
        let removed = chain.remove_run(start, len);
        let multiplier = combo.register(now, rules.combo_window);
        let score = (len as u64)
            .saturating_mul(rules.base_points)
            .saturating_mul(multiplier);

        let run = RemovedRun {
            color: removed[0].color,
            start_progress: removed[0].progress,
            marble_ids: removed.iter().map(|m| m.id).collect(),
            score,
            combo: combo.count,
        };
        log::debug!(
            "Removed {} {:?} marbles at index {} for {} points (combo {})",
            len,
            run.color,
            start,
            score,
            combo.count
        );

        resolution.total_score = resolution.total_score.saturating_add(score);
        resolution.match_count += 1;
        resolution.removed.push(run);
    }

    if resolution.match_count > 1 {
        log::info!(
            "Chain reaction: {} runs for {} points",
            resolution.match_count,
            resolution.total_score
        );
    }
    resolution
}
