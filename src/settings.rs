//! Session settings
//!
//! Loaded once at startup and shared immutably with every level session.

use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Game settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Rules ===
    /// Lives at the start of each level (1..=3)
    pub starting_lives: u8,

    // === Arena ===
    pub arena_width: f32,
    pub paddle_width: f32,
    /// Paddle center at level start
    pub paddle_start_x: f32,
    /// Impulse handed to the shell when the ball launches
    pub launch_impulse: Vec2,

    // === Effects ===
    /// Emit sound cues
    pub sounds: bool,
    /// Emit particle bursts on block destruction
    pub particles: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            starting_lives: MAX_LIVES,
            arena_width: ARENA_WIDTH,
            paddle_width: PADDLE_WIDTH,
            paddle_start_x: 0.0,
            launch_impulse: Vec2::new(LAUNCH_IMPULSE.0, LAUNCH_IMPULSE.1),
            sounds: true,
            particles: true,
        }
    }
}

impl Settings {
    /// Parse settings from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let settings: Settings = serde_json::from_str(json)?;
        Ok(settings.validated())
    }

    /// Load settings from a JSON file, falling back to defaults
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(json) => match Self::from_json(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings from {}", path.display());
                    settings
                }
                Err(err) => {
                    log::warn!("Invalid settings in {}: {}; using defaults", path.display(), err);
                    Self::default()
                }
            },
            Err(err) => {
                log::info!("No settings at {} ({}); using defaults", path.display(), err);
                Self::default()
            }
        }
    }

    /// Clamp values into playable ranges
    pub fn validated(mut self) -> Self {
        let lives = self.starting_lives.clamp(1, MAX_LIVES);
        if lives != self.starting_lives {
            log::warn!("starting_lives {} out of range, using {}", self.starting_lives, lives);
            self.starting_lives = lives;
        }
        if self.arena_width.is_nan() || self.arena_width <= 0.0 {
            log::warn!("arena_width {} invalid, using {}", self.arena_width, ARENA_WIDTH);
            self.arena_width = ARENA_WIDTH;
        }
        if self.paddle_width.is_nan() || self.paddle_width <= 0.0 || self.paddle_width > self.arena_width {
            log::warn!("paddle_width {} invalid, using {}", self.paddle_width, PADDLE_WIDTH.min(self.arena_width));
            self.paddle_width = PADDLE_WIDTH.min(self.arena_width);
        }
        self.paddle_start_x = crate::clamp_paddle_x(self.paddle_start_x, self.arena_width, self.paddle_width);
        self
    }
}
