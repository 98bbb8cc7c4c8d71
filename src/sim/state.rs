//! Game state machine
//!
//! Gates what input and contact events mean at any moment. Transitions are
//! checked against a fixed edge table; anything else is refused.

use serde::{Deserialize, Serialize};

/// How a level ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Won,
    Lost,
}

/// Current phase of a level session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Ball idle, waiting for the activation input
    WaitingForTap,
    /// Active gameplay
    Playing,
    /// Level ended
    GameOver(Outcome),
}

impl GamePhase {
    /// Whether `self -> next` is an edge of the transition table
    pub fn can_transition_to(self, next: GamePhase) -> bool {
        matches!(
            (self, next),
            (GamePhase::WaitingForTap, GamePhase::Playing)
                | (GamePhase::Playing, GamePhase::GameOver(_))
                | (GamePhase::Playing, GamePhase::WaitingForTap)
        )
    }

    pub fn is_playing(self) -> bool {
        self == GamePhase::Playing
    }

    /// Outcome, only present once the level is over
    pub fn outcome(self) -> Option<Outcome> {
        match self {
            GamePhase::GameOver(outcome) => Some(outcome),
            _ => None,
        }
    }
}

/// Owner of the current phase. Only this type mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameStateMachine {
    phase: GamePhase,
    transitions: u32,
}

impl Default for GameStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl GameStateMachine {
    /// A new machine starts in `WaitingForTap`
    pub fn new() -> Self {
        Self {
            phase: GamePhase::WaitingForTap,
            transitions: 0,
        }
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    /// Number of transitions taken since level load
    pub fn transitions(&self) -> u32 {
        self.transitions
    }

    /// Move to `next` if the edge table allows it. Refused transitions are
    /// not errors; they leave the phase untouched and return `false`.
    pub fn enter(&mut self, next: GamePhase) -> bool {
        if !self.phase.can_transition_to(next) {
            log::debug!("Ignoring transition {:?} -> {:?}", self.phase, next);
            return false;
        }
        log::info!("Phase {:?} -> {:?}", self.phase, next);
        self.phase = next;
        self.transitions += 1;
        true
    }
}
