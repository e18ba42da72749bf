//! Collaborators the skill engine is wired with.
//!
//! The engine owns none of the world. It talks to messaging, room lookup,
//! the affect store and the combat resolver through these traits; the
//! structs here are the in-memory implementations used by single-process
//! games and tests.

use crate::world::{Affect, Character, CharacterId, Command, Position, Room, RoomId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// =============================================================================
// Messaging
// =============================================================================

/// A line of narrative text for one character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub text: String,
    /// Skip redrawing the prompt after this line.
    pub suppress_prompt: bool,
}

impl Message {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            suppress_prompt: false,
        }
    }

    /// A message that does not redraw the prompt.
    pub fn quiet(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            suppress_prompt: true,
        }
    }
}

/// Delivers narrative text to characters.
pub trait MessageBus: Send {
    fn send_to_character(&mut self, character: &Character, message: Message);
}

/// Queues messages per character until the session layer drains them.
#[derive(Debug, Default)]
pub struct MailboxBus {
    mailboxes: HashMap<CharacterId, Vec<Message>>,
}

impl MailboxBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self, id: CharacterId) -> &[Message] {
        self.mailboxes.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn drain(&mut self, id: CharacterId) -> Vec<Message> {
        self.mailboxes.remove(&id).unwrap_or_default()
    }
}

impl MessageBus for MailboxBus {
    fn send_to_character(&mut self, character: &Character, message: Message) {
        self.mailboxes.entry(character.id).or_default().push(message);
    }
}

// =============================================================================
// Room lookup
// =============================================================================

/// Finds a monster in a room from a command argument.
pub trait RoomLookup: Send {
    fn find_monster(&self, room: &Room, command: &Command) -> Option<CharacterId>;
}

/// Matches the argument against monster names and keywords.
///
/// A word prefix is enough (`gob` finds a goblin). An `N.` prefix picks the
/// Nth match in room order (`2.rat`).
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordLookup;

impl KeywordLookup {
    fn split_ordinal(target: &str) -> (usize, &str) {
        match target.split_once('.') {
            Some((n, rest)) => match n.parse::<usize>() {
                Ok(n) if n > 0 => (n, rest),
                _ => (1, target),
            },
            None => (1, target),
        }
    }
}

impl RoomLookup for KeywordLookup {
    fn find_monster(&self, room: &Room, command: &Command) -> Option<CharacterId> {
        let target = command.target()?;
        let (nth, word) = Self::split_ordinal(target);
        if word.is_empty() {
            return None;
        }

        room.monsters
            .iter()
            .filter(|m| m.matches_keyword(word))
            .nth(nth - 1)
            .map(|m| m.id)
    }
}

// =============================================================================
// Affects
// =============================================================================

/// Reads and attaches status effects.
pub trait AffectStore: Send {
    fn get<'a>(&self, character: &'a Character, name: &str) -> Option<&'a Affect>;
    fn add(&mut self, character: &mut Character, affect: Affect);
}

/// Keeps affects on the character itself. Adding an affect with the name of
/// one already present replaces it.
#[derive(Debug, Clone, Copy, Default)]
pub struct CharacterAffects;

impl AffectStore for CharacterAffects {
    fn get<'a>(&self, character: &'a Character, name: &str) -> Option<&'a Affect> {
        character.affect(name)
    }

    fn add(&mut self, character: &mut Character, affect: Affect) {
        match character.affects.iter_mut().find(|a| a.id == affect.id) {
            Some(existing) => *existing = affect,
            None => character.affects.push(affect),
        }
    }
}

// =============================================================================
// Combat
// =============================================================================

/// Runs a combat exchange between two characters.
pub trait CombatResolver: Send {
    fn engage(&mut self, attacker: &mut Character, defender: &mut Character, room: RoomId);
}

/// Locks the two characters into a fight and nothing more. Damage rounds
/// belong to the game's own combat loop.
#[derive(Debug, Clone, Copy, Default)]
pub struct StanceCombat;

impl CombatResolver for StanceCombat {
    fn engage(&mut self, attacker: &mut Character, defender: &mut Character, _room: RoomId) {
        attacker.opponent = Some(defender.id);
        attacker.position = Position::Fighting;

        if defender.opponent.is_none() {
            defender.opponent = Some(attacker.id);
        }
        defender.position = Position::Fighting;
    }
}
