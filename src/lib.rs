//! Brick Breaker - a Breakout/Arkanoid game core
//!
//! Core modules:
//! - `sim`: Deterministic game logic (state machine, collision rules, entity registry)
//! - `levels`: Level identifiers, layouts and progression
//! - `settings`: Data-driven session configuration
//!
//! Rendering, audio and rigid-body simulation belong to the host shell. The core
//! consumes input and contact events and answers with [`sim::Effect`]s.

pub mod levels;
pub mod settings;
pub mod sim;

pub use levels::{Campaign, LevelId, LevelLayout, LevelProgression, NextLevel};
pub use settings::Settings;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep used by the demo shell (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;

    /// Lives are capped at three
    pub const MAX_LIVES: u8 = 3;

    /// Arena defaults (points)
    pub const ARENA_WIDTH: f32 = 750.0;
    pub const ARENA_HEIGHT: f32 = 1334.0;

    /// Paddle defaults
    pub const PADDLE_WIDTH: f32 = 150.0;
    pub const PADDLE_Y: f32 = -600.0;

    /// Impulse applied to the ball on launch
    pub const LAUNCH_IMPULSE: (f32, f32) = (1.0, -12.0);

    /// Default hits a block withstands
    pub const DEFAULT_BLOCK_HITS: u8 = 1;

    /// Physics world parameters shared with the physics adapter
    pub mod physics {
        /// Border edge loop is frictionless
        pub const BORDER_FRICTION: f32 = 0.0;
        /// Border edge loop is perfectly elastic
        pub const BORDER_RESTITUTION: f32 = 1.0;
        /// No gravity in the arena
        pub const GRAVITY: (f32, f32) = (0.0, 0.0);
    }
}

/// Clamp a paddle center so the paddle stays inside the arena
#[inline]
pub fn clamp_paddle_x(x: f32, arena_width: f32, paddle_width: f32) -> f32 {
    let limit = ((arena_width - paddle_width) / 2.0).max(0.0);
    x.clamp(-limit, limit)
}
