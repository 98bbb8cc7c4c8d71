//! Level session
//!
//! One play-through of a single level: state machine, entity registry,
//! lives and level id. The shell drives it with input, contact and frame
//! events; the session answers through an [`EffectSink`]. A session is
//! discarded on scene transition and a fresh one built for the next level.

use serde::{Deserialize, Serialize};

use super::category::Contact;
use super::collision::{self, ContactOutcome};
use super::effects::{Effect, EffectSink, FilteredSink, SoundEffect};
use super::registry::EntityRegistry;
use super::state::{GamePhase, GameStateMachine, Outcome};
use crate::levels::{LevelId, LevelLayout, LevelProgression, NextLevel};
use crate::settings::Settings;

/// Input commands for a single frame
#[derive(Debug, Clone, Default)]
pub struct FrameInput {
    /// Tap/click this frame
    pub activate: bool,
    /// Horizontal paddle drag since last frame
    pub drag_dx: Option<f32>,
}

/// Per-session counters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    /// Frames advanced while playing
    pub ticks: u64,
    /// Seconds spent playing
    pub play_time: f32,
    pub blocks_cracked: u32,
    pub blocks_destroyed: u32,
    pub bounces: u32,
    pub balls_lost: u32,
}

impl SessionStats {
    fn record(&mut self, outcome: ContactOutcome) {
        match outcome {
            ContactOutcome::Bounced => self.bounces += 1,
            ContactOutcome::BlockCracked(_) => self.blocks_cracked += 1,
            ContactOutcome::BlockDestroyed(_) => self.blocks_destroyed += 1,
            ContactOutcome::BallLost { .. } | ContactOutcome::GameLost => self.balls_lost += 1,
            // The winning contact destroyed the last block
            ContactOutcome::GameWon => self.blocks_destroyed += 1,
            ContactOutcome::Ignored => {}
        }
    }
}

/// A running level
#[derive(Debug, Clone)]
pub struct Session {
    level: LevelId,
    machine: GameStateMachine,
    registry: EntityRegistry,
    progression: LevelProgression,
    settings: Settings,
    stats: SessionStats,
    /// GameOver acknowledged; the shell is building the next session
    ended: bool,
}

impl Session {
    /// Load a level: register its blocks and start in `WaitingForTap`.
    /// Settings are clamped into playable ranges first.
    pub fn new(layout: &LevelLayout, progression: LevelProgression, settings: &Settings) -> Self {
        let settings = settings.clone().validated();
        if layout.blocks.is_empty() {
            log::warn!("Level {} has no blocks; it is won on the first tap", layout.id);
        }
        let mut registry = EntityRegistry::new(
            settings.starting_lives,
            settings.paddle_start_x,
            settings.paddle_width,
        );
        for block in &layout.blocks {
            registry.register_block(block.pos, block.hits);
        }
        log::info!(
            "Loaded {} with {} blocks, {} lives",
            layout.id,
            registry.active_block_count(),
            registry.lives()
        );

        Self {
            level: layout.id.clone(),
            machine: GameStateMachine::new(),
            registry,
            progression,
            settings,
            stats: SessionStats::default(),
            ended: false,
        }
    }

    /// Emit the effects that set up the level's display
    pub fn begin<S: EffectSink + ?Sized>(&self, sink: &mut S) {
        sink.emit(Effect::UpdateLivesDisplay(self.registry.lives()));
        sink.emit(Effect::PaddleMoved {
            x: self.registry.paddle.x,
        });
        sink.emit(Effect::BeginWaiting);
    }

    pub fn level(&self) -> &LevelId {
        &self.level
    }

    pub fn phase(&self) -> GamePhase {
        self.machine.phase()
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    pub fn lives(&self) -> u8 {
        self.registry.lives()
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn has_ended(&self) -> bool {
        self.ended
    }

    /// Where the shell should go once this level is over
    pub fn next_level(&self) -> Option<NextLevel> {
        let outcome = self.machine.phase().outcome()?;
        Some(self.progression.next_target(&self.level, outcome))
    }

    /// Tap/click. Launches from `WaitingForTap`, requests the next scene
    /// from `GameOver`, and is ignored while playing.
    pub fn on_activation_input<S: EffectSink + ?Sized>(&mut self, sink: &mut S) -> bool {
        match self.machine.phase() {
            GamePhase::WaitingForTap => {
                if !self.machine.enter(GamePhase::Playing) {
                    return false;
                }
                if self.registry.active_block_count() == 0 {
                    // Nothing to break: the level is already cleared
                    let entered = self.machine.enter(GamePhase::GameOver(Outcome::Won));
                    debug_assert!(entered, "Playing -> GameOver(Won) refused");
                    sink.emit(Effect::PlaySound(SoundEffect::GameWon));
                    sink.emit(Effect::ShowEndBanner { won: true });
                    return true;
                }
                self.registry.ball.in_play = true;
                sink.emit(Effect::LaunchBall {
                    impulse: self.settings.launch_impulse,
                });
                true
            }
            GamePhase::Playing => {
                log::debug!("Activation ignored while playing");
                false
            }
            GamePhase::GameOver(_) => {
                if self.ended {
                    return false;
                }
                let Some(next) = self.next_level() else {
                    return false;
                };
                self.ended = true;
                match next {
                    NextLevel::Advance(id) => {
                        log::info!("Advancing from {} to {}", self.level, id);
                        sink.emit(Effect::RequestSceneAdvance(id));
                    }
                    NextLevel::Retry(id) => {
                        log::info!("Retrying {}", id);
                        sink.emit(Effect::RequestSceneReload(id));
                    }
                    NextLevel::Finished => {
                        log::info!("Campaign complete after {}", self.level);
                        sink.emit(Effect::AllLevelsCleared);
                    }
                }
                true
            }
        }
    }

    /// Paddle drag, honoured only while playing. The paddle stays inside
    /// the arena.
    pub fn on_drag_input<S: EffectSink + ?Sized>(&mut self, dx: f32, sink: &mut S) -> bool {
        if !self.machine.phase().is_playing() || !dx.is_finite() {
            return false;
        }
        let paddle = &mut self.registry.paddle;
        let x = crate::clamp_paddle_x(paddle.x + dx, self.settings.arena_width, paddle.width);
        if x == paddle.x {
            return false;
        }
        paddle.x = x;
        sink.emit(Effect::PaddleMoved { x });
        true
    }

    /// Advance one frame. Only play time is tracked; everything else is
    /// event driven.
    pub fn on_frame_tick(&mut self, dt: f32) {
        if self.machine.phase().is_playing() {
            self.stats.ticks += 1;
            self.stats.play_time += dt;
        }
    }

    /// Resolve a single contact notification
    pub fn on_contact<S: EffectSink + ?Sized>(&mut self, contact: &Contact, sink: &mut S) -> ContactOutcome {
        let mut sink = FilteredSink::new(sink, self.settings.sounds, self.settings.particles);
        let outcome = collision::resolve_contact(contact, &mut self.machine, &mut self.registry, &mut sink);
        self.stats.record(outcome);
        outcome
    }

    /// Resolve all contacts from one physics step in rule priority order
    pub fn resolve_step<S: EffectSink + ?Sized>(&mut self, contacts: &[Contact], sink: &mut S) -> Vec<ContactOutcome> {
        let mut sink = FilteredSink::new(sink, self.settings.sounds, self.settings.particles);
        let outcomes = collision::resolve_step(contacts, &mut self.machine, &mut self.registry, &mut sink);
        for &outcome in &outcomes {
            self.stats.record(outcome);
        }
        outcomes
    }

    /// One full frame: resolve the last physics step's contacts, then apply
    /// input, then advance time.
    pub fn tick<S: EffectSink + ?Sized>(&mut self, input: &FrameInput, contacts: &[Contact], dt: f32, sink: &mut S) {
        self.resolve_step(contacts, sink);
        if let Some(dx) = input.drag_dx {
            self.on_drag_input(dx, sink);
        }
        if input.activate {
            self.on_activation_input(sink);
        }
        self.on_frame_tick(dt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use crate::levels::{BlockSpec, Campaign};
    use crate::sim::{BodyRef, Category};
    use glam::Vec2;
    use proptest::prelude::*;

    fn layout(hits: &[u8]) -> LevelLayout {
        LevelLayout {
            id: LevelId::new("Level1"),
            blocks: hits
                .iter()
                .enumerate()
                .map(|(i, &hits)| BlockSpec {
                    pos: Vec2::new(i as f32 * 20.0, 300.0),
                    hits,
                })
                .collect(),
        }
    }

    fn session_with(hits: &[u8], lives: u8) -> Session {
        let settings = Settings {
            starting_lives: lives,
            ..Settings::default()
        };
        Session::new(&layout(hits), Campaign::builtin().progression(), &settings)
    }

    fn block_ids(session: &Session) -> Vec<BodyRef> {
        session.registry().blocks().iter().map(|b| b.id).collect()
    }

    fn hit(block: BodyRef) -> Contact {
        Contact::new(Category::Block, block, Category::Ball, BodyRef(1))
    }

    fn bottom() -> Contact {
        Contact::new(Category::Ball, BodyRef(1), Category::Bottom, BodyRef(500))
    }

    fn launch(session: &mut Session) {
        let mut fx: Vec<Effect> = Vec::new();
        assert!(session.on_activation_input(&mut fx));
        assert_eq!(session.phase(), GamePhase::Playing);
    }

    #[test]
    fn test_begin_effects() {
        let session = session_with(&[1], 3);
        let mut fx: Vec<Effect> = Vec::new();
        session.begin(&mut fx);
        assert_eq!(
            fx,
            vec![
                Effect::UpdateLivesDisplay(3),
                Effect::PaddleMoved { x: 0.0 },
                Effect::BeginWaiting
            ]
        );
        assert_eq!(session.phase(), GamePhase::WaitingForTap);
    }

    #[test]
    fn test_activation_launches_ball() {
        let mut session = session_with(&[1], 3);
        let mut fx: Vec<Effect> = Vec::new();
        assert!(session.on_activation_input(&mut fx));
        assert_eq!(
            fx,
            vec![Effect::LaunchBall {
                impulse: Vec2::new(1.0, -12.0)
            }]
        );
        assert!(session.registry().ball.in_play);

        // A second tap while playing does nothing
        assert!(!session.on_activation_input(&mut fx));
        assert_eq!(fx.len(), 1);
    }

    #[test]
    fn test_scenario_clear_five_blocks() {
        let mut session = session_with(&[1; 5], 3);
        launch(&mut session);
        let mut fx: Vec<Effect> = Vec::new();

        let ids = block_ids(&session);
        for (i, id) in ids.iter().enumerate() {
            let outcome = session.on_contact(&hit(*id), &mut fx);
            if i + 1 < ids.len() {
                assert_eq!(outcome, ContactOutcome::BlockDestroyed(*id));
            } else {
                assert_eq!(outcome, ContactOutcome::GameWon);
            }
        }
        assert_eq!(session.phase(), GamePhase::GameOver(Outcome::Won));
        assert!(session.registry().blocks().is_empty());
        assert_eq!(session.stats().blocks_destroyed, 5);
    }

    #[test]
    fn test_scenario_lose_three_balls() {
        let mut session = session_with(&[1; 5], 3);
        let mut fx: Vec<Effect> = Vec::new();

        for remaining in [2, 1] {
            launch(&mut session);
            assert_eq!(
                session.on_contact(&bottom(), &mut fx),
                ContactOutcome::BallLost { lives_left: remaining }
            );
            assert_eq!(session.phase(), GamePhase::WaitingForTap);
        }
        launch(&mut session);
        assert_eq!(session.on_contact(&bottom(), &mut fx), ContactOutcome::GameLost);
        assert_eq!(session.phase(), GamePhase::GameOver(Outcome::Lost));
        assert_eq!(session.lives(), 0);
        assert_eq!(session.stats().balls_lost, 3);
    }

    #[test]
    fn test_zero_starting_lives_clamped_to_one() {
        let mut session = session_with(&[1, 1], 0);
        assert_eq!(session.lives(), 1);

        launch(&mut session);
        let mut fx: Vec<Effect> = Vec::new();
        assert_eq!(session.on_contact(&bottom(), &mut fx), ContactOutcome::GameLost);
        assert_eq!(session.lives(), 0);
        assert!(fx.contains(&Effect::UpdateLivesDisplay(0)));
    }

    #[test]
    fn test_empty_layout_wins_on_first_tap() {
        let mut session = session_with(&[], 3);
        let mut fx: Vec<Effect> = Vec::new();

        assert!(session.on_activation_input(&mut fx));
        assert_eq!(session.phase(), GamePhase::GameOver(Outcome::Won));
        assert_eq!(
            fx,
            vec![
                Effect::PlaySound(SoundEffect::GameWon),
                Effect::ShowEndBanner { won: true }
            ]
        );
        assert!(!session.registry().ball.in_play);

        // Next tap moves on like any other win
        fx.clear();
        assert!(session.on_activation_input(&mut fx));
        assert_eq!(fx, vec![Effect::RequestSceneAdvance(LevelId::new("Level2"))]);
    }

    #[test]
    fn test_scenario_block_contact_while_waiting() {
        let mut session = session_with(&[1; 5], 3);
        let before = session.registry().clone();
        let mut fx: Vec<Effect> = Vec::new();

        let id = block_ids(&session)[0];
        assert_eq!(session.on_contact(&hit(id), &mut fx), ContactOutcome::Ignored);
        assert_eq!(session.registry(), &before);
        assert_eq!(session.phase(), GamePhase::WaitingForTap);
        assert!(fx.is_empty());
    }

    #[test]
    fn test_game_over_activation_advances_once() {
        let mut session = session_with(&[1], 3);
        launch(&mut session);
        let mut fx: Vec<Effect> = Vec::new();
        let id = block_ids(&session)[0];
        session.on_contact(&hit(id), &mut fx);
        fx.clear();

        assert!(session.on_activation_input(&mut fx));
        assert_eq!(fx, vec![Effect::RequestSceneAdvance(LevelId::new("Level2"))]);
        assert!(session.has_ended());

        assert!(!session.on_activation_input(&mut fx));
        assert_eq!(fx.len(), 1);
    }

    #[test]
    fn test_game_over_activation_retries_after_loss() {
        let mut session = session_with(&[1], 1);
        launch(&mut session);
        let mut fx: Vec<Effect> = Vec::new();
        session.on_contact(&bottom(), &mut fx);
        fx.clear();

        assert_eq!(session.next_level(), Some(NextLevel::Retry(LevelId::new("Level1"))));
        assert!(session.on_activation_input(&mut fx));
        assert_eq!(fx, vec![Effect::RequestSceneReload(LevelId::new("Level1"))]);
    }

    #[test]
    fn test_winning_last_level_clears_campaign() {
        let campaign = Campaign::builtin();
        let last = campaign.levels.last().cloned().unwrap();
        let mut session = Session::new(&last, campaign.progression(), &Settings::default());
        launch(&mut session);
        let mut fx: Vec<Effect> = Vec::new();

        for id in block_ids(&session) {
            for _ in 0..2 {
                session.on_contact(&hit(id), &mut fx);
            }
        }
        assert_eq!(session.phase(), GamePhase::GameOver(Outcome::Won));
        assert_eq!(session.next_level(), Some(NextLevel::Finished));
        fx.clear();
        assert!(session.on_activation_input(&mut fx));
        assert_eq!(fx, vec![Effect::AllLevelsCleared]);
    }

    #[test]
    fn test_drag_only_while_playing() {
        let mut session = session_with(&[1], 3);
        let mut fx: Vec<Effect> = Vec::new();
        assert!(!session.on_drag_input(50.0, &mut fx));
        assert_eq!(session.registry().paddle.x, 0.0);

        launch(&mut session);
        assert!(session.on_drag_input(50.0, &mut fx));
        assert_eq!(fx, vec![Effect::PaddleMoved { x: 50.0 }]);

        // Clamped at the right wall
        session.on_drag_input(10_000.0, &mut fx);
        let limit = (ARENA_WIDTH - PADDLE_WIDTH) / 2.0;
        assert_eq!(session.registry().paddle.x, limit);
        // Already against the wall: no movement, no effect
        let emitted = fx.len();
        assert!(!session.on_drag_input(5.0, &mut fx));
        assert_eq!(fx.len(), emitted);
    }

    #[test]
    fn test_frame_tick_counts_play_time_only() {
        let mut session = session_with(&[1], 3);
        session.on_frame_tick(SIM_DT);
        assert_eq!(session.stats().ticks, 0);

        launch(&mut session);
        session.on_frame_tick(0.5);
        session.on_frame_tick(0.25);
        assert_eq!(session.stats().ticks, 2);
        assert_eq!(session.stats().play_time, 0.75);
    }

    #[test]
    fn test_disabled_sounds_and_particles_are_filtered() {
        let settings = Settings {
            sounds: false,
            particles: false,
            ..Settings::default()
        };
        let mut session = Session::new(&layout(&[1, 1]), Campaign::builtin().progression(), &settings);
        launch(&mut session);
        let mut fx: Vec<Effect> = Vec::new();
        let id = block_ids(&session)[0];
        session.on_contact(&hit(id), &mut fx);
        assert_eq!(fx, vec![Effect::RemoveBlock(id)]);
    }

    #[test]
    fn test_tick_resolves_contacts_before_input() {
        let mut session = session_with(&[1, 1], 3);
        launch(&mut session);
        let mut fx: Vec<Effect> = Vec::new();

        // Ball lost, then the player taps in the same frame: relaunch
        let input = FrameInput {
            activate: true,
            drag_dx: None,
        };
        session.tick(&input, &[bottom()], SIM_DT, &mut fx);
        assert_eq!(session.lives(), 2);
        assert_eq!(session.phase(), GamePhase::Playing);
        assert!(matches!(fx.last(), Some(Effect::LaunchBall { .. })));
        assert_eq!(session.stats().ticks, 1);
    }

    fn any_category() -> impl Strategy<Value = Category> {
        prop::sample::select(Category::ALL.to_vec())
    }

    fn any_contact() -> impl Strategy<Value = Contact> {
        (any_category(), 0u32..20, any_category(), 0u32..20)
            .prop_map(|(a, ba, b, bb)| Contact::new(a, BodyRef(ba), b, BodyRef(bb)))
    }

    proptest! {
        #[test]
        fn prop_ball_loss_decrements_once_per_contact(lives in 1u8..=3, losses in 1usize..8) {
            let mut session = session_with(&[1, 1], lives);
            let mut fx: Vec<Effect> = Vec::new();

            for _ in 0..losses {
                if session.phase() == GamePhase::WaitingForTap {
                    session.on_activation_input(&mut fx);
                }
                let before = session.lives();
                session.on_contact(&bottom(), &mut fx);
                if before > 0 {
                    prop_assert_eq!(session.lives(), before - 1);
                } else {
                    prop_assert_eq!(session.lives(), before);
                }
                if session.lives() == 0 {
                    prop_assert_eq!(session.phase(), GamePhase::GameOver(Outcome::Lost));
                }
            }
            prop_assert_eq!(session.lives() as usize, (lives as usize).saturating_sub(losses));
        }

        #[test]
        fn prop_contacts_outside_playing_are_ignored(contacts in prop::collection::vec(any_contact(), 0..30)) {
            let mut session = session_with(&[1, 2, 1], 3);
            let registry = session.registry().clone();
            let mut fx: Vec<Effect> = Vec::new();

            let outcomes = session.resolve_step(&contacts, &mut fx);
            prop_assert!(outcomes.iter().all(|o| *o == ContactOutcome::Ignored));
            prop_assert_eq!(session.registry(), &registry);
            prop_assert_eq!(session.phase(), GamePhase::WaitingForTap);
            prop_assert!(fx.is_empty());
        }

        #[test]
        fn prop_last_block_wins_over_pending_loss(lives in 1u8..=3, bottom_first in any::<bool>()) {
            let mut session = session_with(&[1], lives);
            launch(&mut session);
            let mut fx: Vec<Effect> = Vec::new();
            let last = hit(block_ids(&session)[0]);

            let step = if bottom_first { [bottom(), last] } else { [last, bottom()] };
            session.resolve_step(&step, &mut fx);
            prop_assert_eq!(session.phase(), GamePhase::GameOver(Outcome::Won));
            prop_assert_eq!(session.lives(), lives);
            let lost_banner = fx.contains(&Effect::ShowEndBanner { won: false });
            prop_assert!(!lost_banner);
        }

        #[test]
        fn prop_block_needs_exactly_threshold_hits(threshold in 1u8..=5) {
            let mut session = session_with(&[threshold, 1], 3);
            launch(&mut session);
            let mut fx: Vec<Effect> = Vec::new();
            let id = block_ids(&session)[0];

            for _ in 1..threshold {
                prop_assert_eq!(session.on_contact(&hit(id), &mut fx), ContactOutcome::BlockCracked(id));
                prop_assert!(session.registry().block(id).is_some());
            }
            prop_assert_eq!(session.on_contact(&hit(id), &mut fx), ContactOutcome::BlockDestroyed(id));
            prop_assert!(session.registry().block(id).is_none());
            prop_assert_eq!(session.registry().active_block_count(), 1);
        }
    }
}
