//! Collision resolution
//!
//! Turns contact notifications from the physics provider into game-logic
//! effects: life loss, bounce sounds, block damage and the win check. Only
//! contacts that arrive while the session is `Playing` do anything.

use super::category::{BodyRef, Contact, ContactKind};
use super::effects::{Effect, EffectSink, SoundEffect};
use super::registry::{BlockDamage, DamageState, EntityRegistry};
use super::state::{GamePhase, GameStateMachine, Outcome};

/// What a single contact did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactOutcome {
    /// Wrong phase, unknown pair or stale block: no side effects
    Ignored,
    /// Ball bounced off the paddle or a border
    Bounced,
    BlockCracked(BodyRef),
    BlockDestroyed(BodyRef),
    /// Ball fell out with lives remaining
    BallLost { lives_left: u8 },
    GameWon,
    GameLost,
}

impl ContactOutcome {
    /// Whether this contact ended the level
    pub fn ends_level(&self) -> bool {
        matches!(self, ContactOutcome::GameWon | ContactOutcome::GameLost)
    }
}

/// Resolve one contact against the state machine and registry
pub fn resolve_contact<S: EffectSink + ?Sized>(
    contact: &Contact,
    machine: &mut GameStateMachine,
    registry: &mut EntityRegistry,
    sink: &mut S,
) -> ContactOutcome {
    if !machine.phase().is_playing() {
        log::debug!("Ignoring {:?} contact in {:?}", contact.kind(), machine.phase());
        return ContactOutcome::Ignored;
    }

    match contact.kind() {
        ContactKind::BallBottom => ball_lost(machine, registry, sink),
        ContactKind::BallBorder => {
            sink.emit(Effect::PlaySound(SoundEffect::WallBounce));
            ContactOutcome::Bounced
        }
        ContactKind::BallPaddle => {
            sink.emit(Effect::PlaySound(SoundEffect::PaddleBounce));
            ContactOutcome::Bounced
        }
        ContactKind::BallBlock(block) => block_hit(block, machine, registry, sink),
        ContactKind::Unknown => {
            log::debug!(
                "Ignoring contact between {:?} and {:?}",
                contact.category_a,
                contact.category_b
            );
            ContactOutcome::Ignored
        }
    }
}

/// Resolve every contact from one physics step.
///
/// Contacts are applied in fixed rule priority (block hits, then bounces,
/// then ball loss) with delivery order kept within a priority. Once a
/// contact ends the level the rest of the step is ignored by the phase gate.
pub fn resolve_step<S: EffectSink + ?Sized>(
    contacts: &[Contact],
    machine: &mut GameStateMachine,
    registry: &mut EntityRegistry,
    sink: &mut S,
) -> Vec<ContactOutcome> {
    let mut ordered: Vec<&Contact> = contacts.iter().collect();
    ordered.sort_by_key(|c| c.kind().priority());
    ordered
        .into_iter()
        .map(|contact| resolve_contact(contact, machine, registry, sink))
        .collect()
}

fn ball_lost<S: EffectSink + ?Sized>(
    machine: &mut GameStateMachine,
    registry: &mut EntityRegistry,
    sink: &mut S,
) -> ContactOutcome {
    let lives_left = registry.decrement_life();
    registry.ball.in_play = false;
    sink.emit(Effect::UpdateLivesDisplay(lives_left));

    if lives_left == 0 {
        let entered = machine.enter(GamePhase::GameOver(Outcome::Lost));
        debug_assert!(entered, "Playing -> GameOver(Lost) refused");
        log::info!("Out of lives");
        sink.emit(Effect::PlaySound(SoundEffect::GameLost));
        sink.emit(Effect::ShowEndBanner { won: false });
        ContactOutcome::GameLost
    } else {
        let entered = machine.enter(GamePhase::WaitingForTap);
        debug_assert!(entered, "Playing -> WaitingForTap refused");
        log::info!("Ball lost, {} lives left", lives_left);
        sink.emit(Effect::PlaySound(SoundEffect::BallLost));
        sink.emit(Effect::BallLost);
        sink.emit(Effect::BeginWaiting);
        ContactOutcome::BallLost { lives_left }
    }
}

fn block_hit<S: EffectSink + ?Sized>(
    block: BodyRef,
    machine: &mut GameStateMachine,
    registry: &mut EntityRegistry,
    sink: &mut S,
) -> ContactOutcome {
    match registry.damage_block(block) {
        None => {
            log::debug!("Ignoring contact with removed block {:?}", block);
            ContactOutcome::Ignored
        }
        Some(BlockDamage::Cracked) => {
            sink.emit(Effect::SetBlockTexture {
                block,
                damage: DamageState::Cracked,
            });
            sink.emit(Effect::PlaySound(SoundEffect::BlockCrack));
            ContactOutcome::BlockCracked(block)
        }
        Some(BlockDamage::Destroyed) => {
            if let Some(removed) = registry.remove_block(block) {
                sink.emit(Effect::RemoveBlock(block));
                sink.emit(Effect::SpawnParticles { at: removed.pos });
                sink.emit(Effect::PlaySound(SoundEffect::BlockDestroyed));
            }

            let remaining = registry.active_block_count();
            log::debug!("Block {:?} destroyed, {} remaining", block, remaining);
            if remaining > 0 {
                return ContactOutcome::BlockDestroyed(block);
            }

            let entered = machine.enter(GamePhase::GameOver(Outcome::Won));
            debug_assert!(entered, "Playing -> GameOver(Won) refused");
            registry.ball.in_play = false;
            log::info!("All blocks cleared");
            sink.emit(Effect::PlaySound(SoundEffect::GameWon));
            sink.emit(Effect::ShowEndBanner { won: true });
            ContactOutcome::GameWon
        }
    }
}
