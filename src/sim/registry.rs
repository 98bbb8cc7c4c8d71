//! Entity registry
//!
//! Authoritative membership of active blocks, plus the ball, paddle and
//! lives. Blocks are kept sorted by id for deterministic iteration.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::category::BodyRef;
use crate::consts::*;

/// Visible damage of a block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DamageState {
    #[default]
    Undamaged,
    Cracked,
    Destroyed,
}

/// Result of applying one hit to a block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockDamage {
    /// Block survived and now shows cracks
    Cracked,
    /// Block reached its hit threshold
    Destroyed,
}

/// A breakable block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: BodyRef,
    pub pos: Vec2,
    /// Hits needed to destroy this block (at least 1)
    pub hits_to_destroy: u8,
    pub hits_taken: u8,
    pub damage: DamageState,
}

impl Block {
    /// Apply one hit
    fn hit(&mut self) -> BlockDamage {
        self.hits_taken = self.hits_taken.saturating_add(1);
        if self.hits_taken >= self.hits_to_destroy {
            self.damage = DamageState::Destroyed;
            BlockDamage::Destroyed
        } else {
            self.damage = DamageState::Cracked;
            BlockDamage::Cracked
        }
    }

    pub fn is_active(&self) -> bool {
        self.damage != DamageState::Destroyed
    }
}

/// The player's paddle (horizontal position only)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paddle {
    pub id: BodyRef,
    pub x: f32,
    pub width: f32,
}

/// The ball
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ball {
    pub id: BodyRef,
    /// Launched and moving under physics
    pub in_play: bool,
}

/// Registry of everything a level session tracks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRegistry {
    pub ball: Ball,
    pub paddle: Paddle,
    blocks: Vec<Block>,
    lives: u8,
    next_id: u32,
}

impl EntityRegistry {
    /// Create a registry with a ball, a centered paddle and `lives` lives
    /// (clamped to [`MAX_LIVES`]).
    pub fn new(lives: u8, paddle_x: f32, paddle_width: f32) -> Self {
        let mut registry = Self {
            ball: Ball {
                id: BodyRef(0),
                in_play: false,
            },
            paddle: Paddle {
                id: BodyRef(0),
                x: paddle_x,
                width: paddle_width,
            },
            blocks: Vec::new(),
            lives: lives.min(MAX_LIVES),
            next_id: 1,
        };
        registry.ball.id = registry.next_entity_id();
        registry.paddle.id = registry.next_entity_id();
        registry
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> BodyRef {
        let id = self.next_id;
        self.next_id += 1;
        BodyRef(id)
    }

    /// Register a block. A zero threshold is treated as one hit.
    pub fn register_block(&mut self, pos: Vec2, hits_to_destroy: u8) -> BodyRef {
        let id = self.next_entity_id();
        self.blocks.push(Block {
            id,
            pos,
            hits_to_destroy: hits_to_destroy.max(1),
            hits_taken: 0,
            damage: DamageState::Undamaged,
        });
        id
    }

    pub fn block(&self, id: BodyRef) -> Option<&Block> {
        self.blocks.iter().find(|b| b.id == id)
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Apply one hit to a block. Unknown or already destroyed blocks yield
    /// `None`.
    pub fn damage_block(&mut self, id: BodyRef) -> Option<BlockDamage> {
        self.blocks
            .iter_mut()
            .find(|b| b.id == id && b.is_active())
            .map(Block::hit)
    }

    /// Remove a block, returning it if it was registered
    pub fn remove_block(&mut self, id: BodyRef) -> Option<Block> {
        let index = self.blocks.iter().position(|b| b.id == id)?;
        Some(self.blocks.remove(index))
    }

    pub fn active_block_count(&self) -> usize {
        self.blocks.iter().filter(|b| b.is_active()).count()
    }

    pub fn lives(&self) -> u8 {
        self.lives
    }

    /// Lose one life, never going below zero. Returns lives remaining.
    pub fn decrement_life(&mut self) -> u8 {
        self.lives = self.lives.saturating_sub(1);
        self.lives
    }
}
