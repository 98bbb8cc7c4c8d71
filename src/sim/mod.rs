//! Game simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Event driven: input, contact and frame events only
//! - Stable iteration order (by entity ID)
//! - No rendering, audio or physics engine dependencies

pub mod category;
pub mod collision;
pub mod effects;
pub mod registry;
pub mod session;
pub mod state;

pub use category::{BodyRef, Category, Contact, ContactKind};
pub use collision::{ContactOutcome, resolve_contact, resolve_step};
pub use effects::{Effect, EffectSink, FilteredSink, SoundEffect};
pub use registry::{Ball, Block, BlockDamage, DamageState, EntityRegistry, Paddle};
pub use session::{FrameInput, Session, SessionStats};
pub use state::{GamePhase, GameStateMachine, Outcome};
