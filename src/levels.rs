//! Level identifiers, layouts and progression
//!
//! Level order is a fixed lookup table built from the campaign's level list,
//! so identifiers may have gaps or arbitrary names.

use std::collections::HashSet;
use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::DEFAULT_BLOCK_HITS;
use crate::sim::Outcome;

/// Level identifier token ("Level1", "Level2", ...)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LevelId(pub String);

impl LevelId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LevelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where to go after a level ends
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextLevel {
    /// Level won, continue with the successor
    Advance(LevelId),
    /// Level lost, play the same level again
    Retry(LevelId),
    /// Last level won, nothing follows
    Finished,
}

/// Linear successor table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LevelProgression {
    order: Vec<LevelId>,
}

impl LevelProgression {
    pub fn new(order: Vec<LevelId>) -> Self {
        Self { order }
    }

    pub fn first(&self) -> Option<&LevelId> {
        self.order.first()
    }

    pub fn levels(&self) -> &[LevelId] {
        &self.order
    }

    /// Level after `current`, or `None` past the last (or an unknown) level
    pub fn successor(&self, current: &LevelId) -> Option<&LevelId> {
        let Some(index) = self.order.iter().position(|id| id == current) else {
            log::warn!("Level {} is not part of the progression", current);
            return None;
        };
        self.order.get(index + 1)
    }

    /// Target after `current` ended with `outcome`
    pub fn next_target(&self, current: &LevelId, outcome: Outcome) -> NextLevel {
        match outcome {
            Outcome::Lost => NextLevel::Retry(current.clone()),
            Outcome::Won => match self.successor(current) {
                Some(next) => NextLevel::Advance(next.clone()),
                None => NextLevel::Finished,
            },
        }
    }
}

fn default_hits() -> u8 {
    DEFAULT_BLOCK_HITS
}

/// One block of a level layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockSpec {
    pub pos: Vec2,
    /// Hits the block withstands before it breaks
    #[serde(default = "default_hits")]
    pub hits: u8,
}

/// Static block layout of a level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelLayout {
    pub id: LevelId,
    pub blocks: Vec<BlockSpec>,
}

impl LevelLayout {
    /// Rectangular grid of blocks centered horizontally, top row at `top`
    pub fn grid(id: &str, rows: u32, cols: u32, top: f32, hits: impl Fn(u32, u32) -> u8) -> Self {
        const SPACING_X: f32 = 130.0;
        const SPACING_Y: f32 = 60.0;

        let left = -(cols.saturating_sub(1) as f32) * SPACING_X / 2.0;
        let mut blocks = Vec::with_capacity((rows * cols) as usize);
        for row in 0..rows {
            for col in 0..cols {
                blocks.push(BlockSpec {
                    pos: Vec2::new(left + col as f32 * SPACING_X, top - row as f32 * SPACING_Y),
                    hits: hits(row, col),
                });
            }
        }
        Self {
            id: LevelId::new(id),
            blocks,
        }
    }
}

/// Ordered set of levels
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub levels: Vec<LevelLayout>,
}

impl Default for Campaign {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Campaign {
    /// Built-in five level campaign
    pub fn builtin() -> Self {
        let levels = vec![
            LevelLayout::grid("Level1", 2, 5, 450.0, |_, _| 1),
            LevelLayout::grid("Level2", 3, 5, 450.0, |row, _| if row == 0 { 2 } else { 1 }),
            LevelLayout::grid("Level3", 4, 5, 500.0, |row, col| 1 + ((row + col) % 2) as u8),
            LevelLayout::grid("Level4", 4, 5, 500.0, |row, _| if row < 2 { 2 } else { 1 }),
            LevelLayout::grid("Level5", 5, 5, 550.0, |_, _| 2),
        ];
        Self { levels }
    }

    /// Parse a campaign from JSON, repairing questionable content
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let campaign: Campaign = serde_json::from_str(json)?;
        Ok(campaign.sanitized())
    }

    /// Drop duplicate or empty levels and lift zero hit thresholds to one
    fn sanitized(self) -> Self {
        let mut seen = HashSet::new();
        let mut levels = Vec::with_capacity(self.levels.len());
        for mut level in self.levels {
            if !seen.insert(level.id.clone()) {
                log::warn!("Duplicate level {} dropped", level.id);
                continue;
            }
            if level.blocks.is_empty() {
                log::warn!("Level {} has no blocks and can never be won; dropped", level.id);
                continue;
            }
            for block in level.blocks.iter_mut().filter(|b| b.hits == 0) {
                log::warn!("Level {}: block at {} has zero hits, using 1", level.id, block.pos);
                block.hits = 1;
            }
            levels.push(level);
        }
        Self { levels }
    }

    pub fn layout(&self, id: &LevelId) -> Option<&LevelLayout> {
        self.levels.iter().find(|l| &l.id == id)
    }

    pub fn progression(&self) -> LevelProgression {
        LevelProgression::new(self.levels.iter().map(|l| l.id.clone()).collect())
    }
}
