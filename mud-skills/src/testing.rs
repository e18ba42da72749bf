//! Testing utilities for skill resolution.
//!
//! This module provides deterministic stand-ins for the engine's
//! collaborators:
//! - `ScriptedDice` returns scripted draws and records every draw
//! - `RecordingBus` and `RecordingCombat` record what the engine sent
//! - `SkillHarness` wires them into a `SkillEngine`
//!
//! The recorders share their logs through `Arc<Mutex<_>>`, so a clone kept by
//! the test sees everything the engine's copy records.

use crate::config::EngineConfig;
use crate::dice::RandomSource;
use crate::ports::{CharacterAffects, CombatResolver, KeywordLookup, Message, MessageBus};
use crate::skills::SkillEngine;
use crate::world::{Character, CharacterId, RoomId};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Dice that return scripted draws in order.
///
/// Each draw is clamped into `[1, faces]`. Once the script runs out every
/// draw is 1.
#[derive(Debug, Clone, Default)]
pub struct ScriptedDice {
    script: Arc<Mutex<VecDeque<u32>>>,
    /// Face count of every draw made, in order.
    faces: Arc<Mutex<Vec<u32>>>,
}

impl ScriptedDice {
    pub fn new(draws: impl IntoIterator<Item = u32>) -> Self {
        Self {
            script: Arc::new(Mutex::new(draws.into_iter().collect())),
            faces: Arc::default(),
        }
    }

    pub fn draw_count(&self) -> usize {
        lock(&self.faces).len()
    }

    pub fn draw_faces(&self) -> Vec<u32> {
        lock(&self.faces).clone()
    }

    pub fn remaining(&self) -> usize {
        lock(&self.script).len()
    }
}

impl RandomSource for ScriptedDice {
    fn draw(&mut self, faces: u32) -> u32 {
        lock(&self.faces).push(faces);
        let next = lock(&self.script).pop_front().unwrap_or(1);
        next.clamp(1, faces.max(1))
    }
}

/// Records every message with its recipient.
#[derive(Debug, Clone, Default)]
pub struct RecordingBus {
    sent: Arc<Mutex<Vec<(CharacterId, Message)>>>,
}

impl RecordingBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<(CharacterId, Message)> {
        lock(&self.sent).clone()
    }

    /// Texts sent to one character, in order.
    pub fn texts_for(&self, id: CharacterId) -> Vec<String> {
        lock(&self.sent)
            .iter()
            .filter(|(to, _)| *to == id)
            .map(|(_, m)| m.text.clone())
            .collect()
    }
}

impl MessageBus for RecordingBus {
    fn send_to_character(&mut self, character: &Character, message: Message) {
        lock(&self.sent).push((character.id, message));
    }
}

/// One recorded call to the combat resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Engagement {
    pub attacker: CharacterId,
    pub defender: CharacterId,
    pub room: RoomId,
}

/// Records engagements and leaves both characters untouched.
#[derive(Debug, Clone, Default)]
pub struct RecordingCombat {
    engagements: Arc<Mutex<Vec<Engagement>>>,
}

impl RecordingCombat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn engagements(&self) -> Vec<Engagement> {
        lock(&self.engagements).clone()
    }
}

impl CombatResolver for RecordingCombat {
    fn engage(&mut self, attacker: &mut Character, defender: &mut Character, room: RoomId) {
        lock(&self.engagements).push(Engagement {
            attacker: attacker.id,
            defender: defender.id,
            room,
        });
    }
}

/// A `SkillEngine` over scripted dice and recording collaborators.
pub struct SkillHarness {
    pub engine: SkillEngine,
    pub dice: ScriptedDice,
    pub bus: RecordingBus,
    pub combat: RecordingCombat,
}

impl SkillHarness {
    /// Harness with default config and the given draw script.
    pub fn new(draws: impl IntoIterator<Item = u32>) -> Self {
        Self::with_config(draws, EngineConfig::default())
    }

    pub fn with_config(draws: impl IntoIterator<Item = u32>, config: EngineConfig) -> Self {
        let dice = ScriptedDice::new(draws);
        let bus = RecordingBus::new();
        let combat = RecordingCombat::new();
        let engine = SkillEngine::new(
            dice.clone(),
            bus.clone(),
            KeywordLookup,
            CharacterAffects,
            combat.clone(),
        )
        .with_config(config);

        Self {
            engine,
            dice,
            bus,
            combat,
        }
    }

    pub fn draw_count(&self) -> usize {
        self.dice.draw_count()
    }

    pub fn draw_faces(&self) -> Vec<u32> {
        self.dice.draw_faces()
    }

    pub fn messages(&self) -> Vec<(CharacterId, Message)> {
        self.bus.sent()
    }

    pub fn texts_for(&self, id: CharacterId) -> Vec<String> {
        self.bus.texts_for(id)
    }

    pub fn engagements(&self) -> Vec<Engagement> {
        self.combat.engagements()
    }
}
