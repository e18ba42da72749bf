//! Skill resolution for a multiplayer text adventure.
//!
//! This crate provides:
//! - Passive combat modifiers: shield block and second attack
//! - Stealth: sneaking, tracked as a timed affect
//! - Combat maneuvers: bash and backstab
//!
//! The engine owns no world state. Characters and rooms are borrowed for the
//! duration of one call, and dice, messaging, room lookup, affects and combat
//! are injected collaborators.
//!
//! # Quick Start
//!
//! ```ignore
//! use mud_skills::{Command, MailboxBus, Room, SkillEngine, SkillKind};
//! use mud_skills::world::{create_sample_monster, create_sample_warrior};
//!
//! let mut engine = SkillEngine::standard(MailboxBus::new());
//! let mut player = create_sample_warrior("Brakka");
//! let mut room = Room::new("Muddy Crossroads").with_monster(create_sample_monster("goblin"));
//!
//! let outcome = engine.perform(
//!     SkillKind::Bash,
//!     &mut player,
//!     &mut room,
//!     &Command::new("bash").with_arg("goblin"),
//! );
//! println!("{outcome:?}, wait is now {}", player.wait);
//! ```

pub mod config;
pub mod dice;
pub mod modifiers;
pub mod ports;
pub mod skills;
pub mod testing;
pub mod world;

// Primary public API
pub use config::{ConfigError, EngineConfig};
pub use dice::{RandomSource, RngDice};
pub use modifiers::{AttributeModifiers, DefaultCurve, TableCurve};
pub use ports::{
    AffectStore, CharacterAffects, CombatResolver, KeywordLookup, MailboxBus, Message, MessageBus,
    RoomLookup, StanceCombat,
};
pub use skills::{Outcome, SkillEngine, SneakOutcome, StrikeOutcome};
pub use testing::{Engagement, RecordingBus, RecordingCombat, ScriptedDice, SkillHarness};
pub use world::{
    Ability, Affect, Character, CharacterId, Command, Item, Position, Room, RoomId, Size,
    SkillKind, SkillRecord, SneakHook, UnknownSkill,
};
