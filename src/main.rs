//! Brick Breaker headless shell
//!
//! Plays the campaign without a renderer or physics engine: a seeded script
//! stands in for the physics provider and every effect is logged.
//!
//! Usage: `brick-breaker [seed] [settings.json] [campaign.json]`

use std::path::Path;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use brick_breaker::consts::{ARENA_HEIGHT, PADDLE_Y, SIM_DT, physics};
use brick_breaker::sim::{BodyRef, Category, Contact, Effect, FrameInput, Session};
use brick_breaker::{Campaign, LevelId, Settings};

/// Give up after this many frames
const MAX_FRAMES: u64 = 200_000;

/// Body references for the static arena bodies
const BORDER_BODY: BodyRef = BodyRef(10_000);
const BOTTOM_BODY: BodyRef = BodyRef(10_001);

/// Stand-in physics provider: while the ball is in play, each step may
/// report one contact, delivered as raw category masks like a real engine.
struct ScriptedPhysics {
    rng: Pcg32,
}

impl ScriptedPhysics {
    fn new(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    fn step(&mut self, session: &Session) -> Vec<Contact> {
        let registry = session.registry();
        if !registry.ball.in_play || !self.rng.random_bool(0.1) {
            return Vec::new();
        }
        let ball = (Category::Ball, registry.ball.id);
        let roll = self.rng.random_range(0..100);
        let (a, b) = match roll {
            0..=39 => {
                let blocks = registry.blocks();
                if blocks.is_empty() {
                    return Vec::new();
                }
                let block = blocks[self.rng.random_range(0..blocks.len())].id;
                ((Category::Block, block), ball)
            }
            40..=69 => (ball, (Category::Border, BORDER_BODY)),
            70..=96 => ((Category::Paddle, registry.paddle.id), ball),
            _ => (ball, (Category::Bottom, BOTTOM_BODY)),
        };
        Contact::from_bits(a.0.bits(), a.1, b.0.bits(), b.1)
            .into_iter()
            .collect()
    }

    /// Random paddle wiggle
    fn drag(&mut self) -> Option<f32> {
        self.rng.random_bool(0.2).then(|| self.rng.random_range(-20.0..20.0))
    }
}

/// Shell state: the running session plus what it needs to build the next one
struct Game {
    campaign: Campaign,
    settings: Settings,
    session: Session,
    physics: ScriptedPhysics,
    effects: Vec<Effect>,
    frames: u64,
    levels_played: u32,
    finished: bool,
}

impl Game {
    fn new(campaign: Campaign, settings: Settings, seed: u64) -> Option<Self> {
        let first = campaign.progression().first()?.clone();
        let session = Self::load(&campaign, &settings, &first)?;
        let mut effects = Vec::new();
        session.begin(&mut effects);
        Some(Self {
            campaign,
            settings,
            session,
            physics: ScriptedPhysics::new(seed),
            effects,
            frames: 0,
            levels_played: 1,
            finished: false,
        })
    }

    fn load(campaign: &Campaign, settings: &Settings, id: &LevelId) -> Option<Session> {
        let Some(layout) = campaign.layout(id) else {
            log::error!("Level {} has no layout", id);
            return None;
        };
        Some(Session::new(layout, campaign.progression(), settings))
    }

    /// Run one frame
    fn update(&mut self) {
        let contacts = self.physics.step(&self.session);
        let input = FrameInput {
            // The player taps as soon as the game waits for it
            activate: !self.session.phase().is_playing(),
            drag_dx: self.physics.drag(),
        };
        self.session.tick(&input, &contacts, SIM_DT, &mut self.effects);
        self.frames += 1;
        self.apply_effects();
    }

    /// Log effects and follow scene requests
    fn apply_effects(&mut self) {
        let mut next_scene = None;
        for effect in self.effects.drain(..) {
            match &effect {
                Effect::ShowEndBanner { won } => {
                    let stats = self.session.stats();
                    log::info!(
                        "{} {} after {:.1}s: {} destroyed, {} cracked, {} bounces, {} balls lost",
                        self.session.level(),
                        if *won { "won" } else { "lost" },
                        stats.play_time,
                        stats.blocks_destroyed,
                        stats.blocks_cracked,
                        stats.bounces,
                        stats.balls_lost
                    );
                }
                Effect::RequestSceneAdvance(id) | Effect::RequestSceneReload(id) => {
                    next_scene = Some(id.clone());
                }
                Effect::AllLevelsCleared => self.finished = true,
                _ => log::debug!("{:?}", effect),
            }
        }

        if let Some(id) = next_scene {
            match Self::load(&self.campaign, &self.settings, &id) {
                Some(session) => {
                    self.session = session;
                    self.session.begin(&mut self.effects);
                    self.levels_played += 1;
                }
                None => self.finished = true,
            }
        }
    }
}

/// Log the world a physics adapter would build for these settings
fn log_world(settings: &Settings) {
    log::info!(
        "Arena {}x{}, gravity {:?}, border friction {} restitution {}",
        settings.arena_width,
        ARENA_HEIGHT,
        physics::GRAVITY,
        physics::BORDER_FRICTION,
        physics::BORDER_RESTITUTION
    );
    log::info!("Paddle width {} at y {}", settings.paddle_width, PADDLE_Y);
    for category in Category::ALL {
        log::debug!(
            "Body '{}': category {:#06b}, contact test {:#06b}",
            category.node_name(),
            category.bits(),
            category.contact_test_mask()
        );
    }
}

fn load_campaign(path: Option<&str>) -> Campaign {
    let Some(path) = path else {
        return Campaign::builtin();
    };
    let parsed = std::fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|json| Campaign::from_json(&json).map_err(|e| e.to_string()));
    match parsed {
        Ok(campaign) => {
            log::info!("Loaded {} levels from {}", campaign.levels.len(), path);
            campaign
        }
        Err(err) => {
            log::warn!("Could not load campaign {}: {}; using built-in levels", path, err);
            Campaign::builtin()
        }
    }
}

fn main() {
    env_logger::init();
    log::info!("Brick Breaker (headless) starting...");

    let args: Vec<String> = std::env::args().collect();
    let seed = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(12345);
    let settings = args
        .get(2)
        .map(|p| Settings::load(Path::new(p)))
        .unwrap_or_default();
    let campaign = load_campaign(args.get(3).map(String::as_str));
    log_world(&settings);

    let Some(mut game) = Game::new(campaign, settings, seed) else {
        log::error!("Campaign has no playable levels");
        std::process::exit(1);
    };

    while !game.finished && game.frames < MAX_FRAMES {
        game.update();
    }

    if game.finished {
        log::info!(
            "Campaign cleared in {} frames over {} level sessions",
            game.frames,
            game.levels_played
        );
    } else {
        log::warn!(
            "Stopped after {} frames in {} ({:?})",
            game.frames,
            game.session.level(),
            game.session.phase()
        );
    }
}
