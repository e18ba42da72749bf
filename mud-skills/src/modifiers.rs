//! Attribute-to-modifier derivation.
//!
//! The curve that maps a raw score to a modifier is content, not engine logic,
//! so it is a strategy the engine is constructed with.

use crate::world::{Ability, Character};
use serde::{Deserialize, Serialize};

/// Derives roll modifiers from a character's raw attributes.
pub trait AttributeModifiers: Send + Sync {
    /// Modifier for a single raw score.
    fn score_modifier(&self, score: i32) -> i32;

    fn modifier(&self, character: &Character, ability: Ability) -> i32 {
        self.score_modifier(character.attributes.get(ability))
    }

    fn strength_mod(&self, character: &Character) -> i32 {
        self.modifier(character, Ability::Strength)
    }

    fn dexterity_mod(&self, character: &Character) -> i32 {
        self.modifier(character, Ability::Dexterity)
    }

    fn intelligence_mod(&self, character: &Character) -> i32 {
        self.modifier(character, Ability::Intelligence)
    }
}

/// Linear curve: every two points above or below 10 move the modifier by one.
///
/// Scores 8-9 give -1, 10-11 give 0, 12-13 give +1.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultCurve;

impl AttributeModifiers for DefaultCurve {
    fn score_modifier(&self, score: i32) -> i32 {
        // Floor division so odd scores below 10 round down
        (score - 10).div_euclid(2)
    }
}

/// Threshold table: the modifier of the highest step whose score the
/// attribute reaches. Scores below every step get `floor`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableCurve {
    pub floor: i32,
    /// `(minimum score, modifier)` pairs.
    pub steps: Vec<(i32, i32)>,
}

impl TableCurve {
    pub fn new(floor: i32, steps: impl IntoIterator<Item = (i32, i32)>) -> Self {
        let mut steps: Vec<(i32, i32)> = steps.into_iter().collect();
        steps.sort_by_key(|&(score, _)| score);
        Self { floor, steps }
    }
}

impl AttributeModifiers for TableCurve {
    fn score_modifier(&self, score: i32) -> i32 {
        self.steps
            .iter()
            .rev()
            .find(|&&(min, _)| score >= min)
            .map(|&(_, modifier)| modifier)
            .unwrap_or(self.floor)
    }
}
