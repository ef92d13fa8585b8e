//! Session state and core simulation types
//!
//! A `GameSession` is owned by the tick loop. Hosts mutate it only through
//! `tick`, `queue_shot` and `swap_shot_colors`, and read it through
//! `snapshot`.

use std::collections::VecDeque;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::chain::{Chain, Marble, MarbleColor};
use super::matching::{Combo, MatchRules, RemovedRun};
use super::path::Path;
use super::projectile::Projectile;
use crate::consts::MIN_RUN;
use crate::seconds_to_nanos;
use crate::error::ConfigError;
use crate::level::{LevelConfig, SeedPattern};

/// Current phase of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// Active gameplay
    Playing,
    /// Chain cleared
    Won,
    /// A marble reached the goal
    Lost,
    /// An internal invariant broke; the host should discard the session
    Aborted,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SessionState::Playing)
    }
}

/// Terminal event for the progression system, delivered once
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Won { score: u64 },
    Lost { score: u64 },
}

/// Shooter colors; the projectile fires `current`, `next` is on deck
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Shooter {
    pub origin: Vec2,
    pub current: MarbleColor,
    pub next: MarbleColor,
}

/// Owned, read-only view of a session after a tick
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub state: SessionState,
    pub score: u64,
    pub combo: u32,
    /// Whether a removal right now would extend the combo
    pub combo_active: bool,
    /// Session time in seconds
    pub elapsed: f64,
    pub chain: Vec<Marble>,
    pub projectiles: Vec<Projectile>,
    pub shooter: Shooter,
    /// Runs removed during the last tick, in removal order
    pub removed: Vec<RemovedRun>,
}

/// A running level
#[derive(Debug, Clone)]
pub struct GameSession<R = Pcg32> {
    pub(crate) level: LevelConfig,
    pub(crate) path: Path,
    pub(crate) rng: R,
    pub(crate) state: SessionState,
    pub(crate) chain: Chain,
    pub(crate) projectiles: Vec<Projectile>,
    /// Aim directions waiting for the next tick
    pub(crate) shot_queue: VecDeque<Vec2>,
    pub(crate) shooter: Shooter,
    pub(crate) score: u64,
    pub(crate) combo: Combo,
    /// Session clock in nanoseconds (sum of tick timesteps)
    pub(crate) clock_ns: u64,
    pub(crate) time_ticks: u64,
    pub(crate) last_removed: Vec<RemovedRun>,
    outcome_taken: bool,
    next_id: u32,
}

impl GameSession<Pcg32> {
    /// Session with the default deterministic RNG
    pub fn seeded(level: LevelConfig, seed: u64) -> Result<Self, ConfigError> {
        Self::new(level, Pcg32::seed_from_u64(seed))
    }
}

impl<R: Rng> GameSession<R> {
    /// Validate the level, seed the chain and load the shooter
    pub fn new(level: LevelConfig, rng: R) -> Result<Self, ConfigError> {
        level.validate()?;
        let path = Path::new(level.path.clone())?;
        let palette = level.palette();

        let mut session = Self {
            shooter: Shooter {
                origin: level.shooter,
                current: palette[0],
                next: palette[0],
            },
            level,
            path,
            rng,
            state: SessionState::Playing,
            chain: Chain::new(),
            projectiles: Vec::new(),
            shot_queue: VecDeque::new(),
            score: 0,
            combo: Combo::default(),
            clock_ns: 0,
            time_ticks: 0,
            last_removed: Vec::new(),
            outcome_taken: false,
            next_id: 1,
        };

        session.seed_chain();
        session.shooter.current = session.draw_shot_color();
        session.shooter.next = session.draw_shot_color();

        log::info!(
            "Level start: {} marbles, {} colors, pattern {}",
            session.chain.len(),
            session.level.palette_size,
            session.level.seed_pattern.as_str()
        );
        Ok(session)
    }

    /// Allocate a new entity ID
    pub(crate) fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Lay out the initial chain, tail at progress 0
    fn seed_chain(&mut self) {
        let palette = self.level.palette();
        let avoid_triples =
            self.level.seed_pattern == SeedPattern::NoTriples && palette.len() >= 2;
        let mut marbles: Vec<Marble> = Vec::with_capacity(self.level.marble_count);

        for i in 0..self.level.marble_count {
            let blocked = if avoid_triples && i + 1 >= MIN_RUN {
                let prev = &marbles[i + 1 - MIN_RUN..i];
                prev.iter()
                    .all(|m| m.color == prev[0].color)
                    .then_some(prev[0].color)
            } else {
                None
            };

            let color = loop {
                let c = palette[self.rng.random_range(0..palette.len())];
                if Some(c) != blocked {
                    break c;
                }
            };

            let id = self.next_entity_id();
            marbles.push(Marble::new(id, color, i as f32 * self.level.marble_spacing));
        }

        self.chain = Chain::from_marbles(marbles);
        self.chain.refresh_positions(&self.path);
    }

    /// Random color among those still on the chain (or the palette if empty)
    pub(crate) fn draw_shot_color(&mut self) -> MarbleColor {
        let mut present: Vec<MarbleColor> = Vec::new();
        for &color in self.level.palette() {
            if self.chain.marbles().iter().any(|m| m.color == color) {
                present.push(color);
            }
        }
        let choices: &[MarbleColor] = if present.is_empty() {
            self.level.palette()
        } else {
            &present
        };
        choices[self.rng.random_range(0..choices.len())]
    }

    /// Request a shot toward `target`; fired at the start of the next tick.
    ///
    /// Ignored once the session has ended.
    pub fn queue_shot(&mut self, target: Vec2) {
        if self.state != SessionState::Playing {
            return;
        }
        self.shot_queue.push_back(target - self.shooter.origin);
    }

    /// Exchange the current and on-deck shot colors
    pub fn swap_shot_colors(&mut self) {
        if self.state == SessionState::Playing {
            std::mem::swap(&mut self.shooter.current, &mut self.shooter.next);
        }
    }

    pub(crate) fn match_rules(&self) -> MatchRules {
        MatchRules {
            base_points: self.level.base_points,
            combo_window: seconds_to_nanos(self.level.combo_window),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn level(&self) -> &LevelConfig {
        &self.level
    }

    pub fn shooter(&self) -> &Shooter {
        &self.shooter
    }

    pub fn time_ticks(&self) -> u64 {
        self.time_ticks
    }

    /// Session clock in nanoseconds
    pub fn clock_ns(&self) -> u64 {
        self.clock_ns
    }

    /// Copy of everything a renderer needs
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            state: self.state,
            score: self.score,
            combo: self.combo.count,
            combo_active: self.combo.is_active(self.clock_ns),
            elapsed: self.clock_ns as f64 * 1e-9,
            chain: self.chain.marbles().to_vec(),
            projectiles: self.projectiles.clone(),
            shooter: self.shooter,
            removed: self.last_removed.clone(),
        }
    }

    /// The Won/Lost event, returned at most once per session
    pub fn take_outcome(&mut self) -> Option<Outcome> {
        if self.outcome_taken {
            return None;
        }
        let outcome = match self.state {
            SessionState::Won => Outcome::Won { score: self.score },
            SessionState::Lost => Outcome::Lost { score: self.score },
            SessionState::Playing | SessionState::Aborted => return None,
        };
        self.outcome_taken = true;
        Some(outcome)
    }
}
