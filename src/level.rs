//! Level configuration
//!
//! Read once when a session is created. Hosts usually load it from JSON;
//! missing fields fall back to the defaults below.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::Bounds;
use crate::consts::{BASE_POINTS, COMBO_WINDOW, MAX_BASE_POINTS};
use crate::error::ConfigError;
use crate::sim::MarbleColor;

/// How initial chain colors are drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SeedPattern {
    /// Uniform over the palette
    Random,
    /// Uniform, but never three in a row (needs palette size >= 2)
    #[default]
    NoTriples,
}

impl SeedPattern {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeedPattern::Random => "Random",
            SeedPattern::NoTriples => "NoTriples",
        }
    }
}

/// Everything a session needs to know about a level
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
    /// Track control points, start to goal
    pub path: Vec<Vec2>,
    /// Projectiles outside this rectangle are discarded
    pub bounds: Bounds,
    /// Where shots are fired from
    pub shooter: Vec2,

    // === Chain ===
    /// Marbles seeded at level start
    pub marble_count: usize,
    /// How many palette colors are in play
    pub palette_size: usize,
    /// Progress between seeded marbles
    pub marble_spacing: f32,
    /// Chain travel speed (progress per second)
    pub chain_speed: f32,
    /// Initial color pattern
    pub seed_pattern: SeedPattern,

    // === Shots ===
    /// Projectile speed (pixels per second)
    pub projectile_speed: f32,
    /// Progress behind the hit marble where a shot is inserted
    pub insert_offset: f32,

    // === Scoring ===
    pub base_points: u64,
    /// Seconds a combo stays alive after a removal
    pub combo_window: f32,
}

impl Default for LevelConfig {
    fn default() -> Self {
        let bounds = Bounds::new(Vec2::ZERO, Vec2::new(800.0, 600.0));
        Self {
            // Serpentine across an 800x600 playfield
            path: vec![
                Vec2::new(40.0, 60.0),
                Vec2::new(760.0, 60.0),
                Vec2::new(760.0, 200.0),
                Vec2::new(40.0, 200.0),
                Vec2::new(40.0, 400.0),
                Vec2::new(760.0, 400.0),
                Vec2::new(760.0, 540.0),
                Vec2::new(300.0, 540.0),
            ],
            bounds,
            shooter: bounds.center(),

            marble_count: 30,
            palette_size: 4,
            marble_spacing: 0.012,
            chain_speed: 0.008,
            seed_pattern: SeedPattern::NoTriples,

            projectile_speed: 720.0,
            insert_offset: 0.012,

            base_points: BASE_POINTS,
            combo_window: COMBO_WINDOW,
        }
    }
}

impl LevelConfig {
    /// Parse and validate a JSON level description
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let level: LevelConfig = serde_json::from_str(json)?;
        level.validate()?;
        Ok(level)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Colors in play for this level
    pub fn palette(&self) -> &'static [MarbleColor] {
        MarbleColor::palette(self.palette_size)
    }

    /// Progress of the head marble at level start
    pub fn seeded_head_progress(&self) -> f32 {
        self.marble_count.saturating_sub(1) as f32 * self.marble_spacing
    }

    /// Reject configurations the simulation cannot run
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.path.len() < 2 {
            return Err(ConfigError::TooFewControlPoints(self.path.len()));
        }
        let max = MarbleColor::ALL.len();
        if self.palette_size == 0 || self.palette_size > max {
            return Err(ConfigError::PaletteSize {
                size: self.palette_size,
                max,
            });
        }
        if !self.bounds.is_valid() {
            return Err(ConfigError::EmptyBounds);
        }

        let positive = [
            ("marble_spacing", self.marble_spacing),
            ("chain_speed", self.chain_speed),
            ("projectile_speed", self.projectile_speed),
            ("insert_offset", self.insert_offset),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::NonPositive { field, value });
            }
        }
        if self.base_points > MAX_BASE_POINTS {
            return Err(ConfigError::BasePointsTooLarge {
                value: self.base_points,
                max: MAX_BASE_POINTS,
            });
        }
        if !(self.combo_window.is_finite() && self.combo_window >= 0.0) {
            return Err(ConfigError::NonPositive {
                field: "combo_window",
                value: self.combo_window,
            });
        }

        if self.seeded_head_progress() >= 1.0 {
            return Err(ConfigError::ChainTooLong {
                count: self.marble_count,
                spacing: self.marble_spacing,
            });
        }
        Ok(())
    }
}
