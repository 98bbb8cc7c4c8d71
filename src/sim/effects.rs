//! Effects emitted by the core for the presentation shell

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::category::BodyRef;
use super::registry::DamageState;
use crate::levels::LevelId;

/// Sound effect cues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SoundEffect {
    /// Ball hits paddle
    PaddleBounce,
    /// Ball hits a border wall
    WallBounce,
    /// Ball cracks a block
    BlockCrack,
    /// Block breaks
    BlockDestroyed,
    /// Ball fell past the paddle
    BallLost,
    /// Last block cleared
    GameWon,
    /// Last life lost
    GameLost,
}

/// Something the shell should render, play or do
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Effect {
    PlaySound(SoundEffect),
    SpawnParticles { at: Vec2 },
    SetBlockTexture { block: BodyRef, damage: DamageState },
    RemoveBlock(BodyRef),
    UpdateLivesDisplay(u8),
    ShowEndBanner { won: bool },
    /// Ball left the arena; the shell resets it to its idle position
    BallLost,
    /// Session is waiting for the activation input again
    BeginWaiting,
    /// Launch the idle ball
    LaunchBall { impulse: Vec2 },
    PaddleMoved { x: f32 },
    RequestSceneReload(LevelId),
    RequestSceneAdvance(LevelId),
    /// Won the last level of the campaign
    AllLevelsCleared,
}

/// Receiver of effects. Injected into the resolver and session instead of a
/// scene reference.
pub trait EffectSink {
    fn emit(&mut self, effect: Effect);
}

impl EffectSink for Vec<Effect> {
    fn emit(&mut self, effect: Effect) {
        self.push(effect);
    }
}

/// Drops sounds and/or particles according to settings before forwarding
pub struct FilteredSink<'a, S: EffectSink + ?Sized> {
    inner: &'a mut S,
    sounds: bool,
    particles: bool,
}

impl<'a, S: EffectSink + ?Sized> FilteredSink<'a, S> {
    pub fn new(inner: &'a mut S, sounds: bool, particles: bool) -> Self {
        Self {
            inner,
            sounds,
            particles,
        }
    }
}

impl<S: EffectSink + ?Sized> EffectSink for FilteredSink<'_, S> {
    fn emit(&mut self, effect: Effect) {
        match effect {
            Effect::PlaySound(_) if !self.sounds => {}
            Effect::SpawnParticles { .. } if !self.particles => {}
            effect => self.inner.emit(effect),
        }
    }
}
