//! Game world types touched by skill resolution.
//!
//! Characters, their skill records and status effects, equipped items, rooms
//! and the parsed command a skill was invoked with.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// ID Types
// ============================================================================

/// Unique identifier for characters (players and monsters alike).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CharacterId(pub Uuid);

impl CharacterId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CharacterId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CharacterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for rooms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoomId(pub Uuid);

impl RoomId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RoomId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Attributes
// ============================================================================

/// Primary attributes. A character's main stat is one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ability {
    Strength,
    Dexterity,
    Constitution,
    Intelligence,
    Wisdom,
}

impl Ability {
    pub fn abbreviation(&self) -> &'static str {
        match self {
            Ability::Strength => "str",
            Ability::Dexterity => "dex",
            Ability::Constitution => "con",
            Ability::Intelligence => "int",
            Ability::Wisdom => "wis",
        }
    }
}

impl fmt::Display for Ability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.abbreviation())
    }
}

/// Raw attribute scores.
///
/// `knowledge` and `detection` are secondary stats: they never produce a
/// modifier and are added to rolls as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attributes {
    pub strength: i32,
    pub dexterity: i32,
    pub constitution: i32,
    pub intelligence: i32,
    pub wisdom: i32,
    pub knowledge: i32,
    pub detection: i32,
}

impl Attributes {
    pub fn get(&self, ability: Ability) -> i32 {
        match ability {
            Ability::Strength => self.strength,
            Ability::Dexterity => self.dexterity,
            Ability::Constitution => self.constitution,
            Ability::Intelligence => self.intelligence,
            Ability::Wisdom => self.wisdom,
        }
    }
}

impl Default for Attributes {
    fn default() -> Self {
        Self {
            strength: 10,
            dexterity: 10,
            constitution: 10,
            intelligence: 10,
            wisdom: 10,
            knowledge: 0,
            detection: 0,
        }
    }
}

/// Body size. The ordinal value feeds damage formulas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Size {
    Tiny,
    Small,
    Medium,
    Large,
    Huge,
    Giant,
}

impl Size {
    pub fn value(&self) -> i32 {
        match self {
            Size::Tiny => 1,
            Size::Small => 2,
            Size::Medium => 3,
            Size::Large => 4,
            Size::Huge => 5,
            Size::Giant => 6,
        }
    }
}

impl Default for Size {
    fn default() -> Self {
        Size::Medium
    }
}

/// Combat stance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Position {
    #[default]
    Standing,
    Fighting,
    Prone,
    Resting,
    Sleeping,
}

impl Position {
    /// Stances a melee skill can be launched from.
    pub fn can_strike(&self) -> bool {
        matches!(self, Position::Standing | Position::Fighting)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Position::Standing => "standing",
            Position::Fighting => "fighting",
            Position::Prone => "prone",
            Position::Resting => "resting",
            Position::Sleeping => "sleeping",
        };
        write!(f, "{name}")
    }
}

// ============================================================================
// Skills
// ============================================================================

/// The trainable skills the engine knows how to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SkillKind {
    ShieldBlock,
    SecondAttack,
    Sneak,
    Bash,
    Backstab,
}

impl SkillKind {
    /// Stable identifier, also used as the affect name a skill creates.
    pub fn id(&self) -> &'static str {
        match self {
            SkillKind::ShieldBlock => "shield block",
            SkillKind::SecondAttack => "second attack",
            SkillKind::Sneak => "sneak",
            SkillKind::Bash => "bash",
            SkillKind::Backstab => "backstab",
        }
    }

    /// Passive skills are consulted by other commands rather than invoked.
    pub fn is_passive(&self) -> bool {
        matches!(self, SkillKind::ShieldBlock | SkillKind::SecondAttack)
    }

    pub fn all() -> [SkillKind; 5] {
        [
            SkillKind::ShieldBlock,
            SkillKind::SecondAttack,
            SkillKind::Sneak,
            SkillKind::Bash,
            SkillKind::Backstab,
        ]
    }
}

impl fmt::Display for SkillKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// A skill name that matches none of the known skills.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown skill: {0}")]
pub struct UnknownSkill(pub String);

impl FromStr for SkillKind {
    type Err = UnknownSkill;

    /// Accepts the stable id in any case, with spaces, `_` or `-` between
    /// words, or run together (`shieldBlock`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let folded: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .flat_map(char::to_lowercase)
            .collect();

        SkillKind::all()
            .into_iter()
            .find(|kind| kind.id().replace(' ', "") == folded)
            .ok_or_else(|| UnknownSkill(s.to_string()))
    }
}

/// One character's proficiency in one skill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillRecord {
    pub id: SkillKind,
    /// Display label.
    pub name: String,
    /// Proficiency percentage, 0-100. Only ever increases.
    pub train_level: i32,
    /// Flat bonus applied to outcomes.
    pub modifier: i32,
    /// Overrides the skill's default action delay.
    pub wait_cost: Option<u32>,
}

impl SkillRecord {
    pub fn new(id: SkillKind, train_level: i32) -> Self {
        Self {
            id,
            name: id.id().to_string(),
            train_level,
            modifier: 0,
            wait_cost: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_modifier(mut self, modifier: i32) -> Self {
        self.modifier = modifier;
        self
    }

    pub fn with_wait_cost(mut self, wait: u32) -> Self {
        self.wait_cost = Some(wait);
        self
    }
}

/// The skills a character has trained.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillBook {
    records: Vec<SkillRecord>,
}

impl SkillBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, kind: SkillKind) -> Option<&SkillRecord> {
        self.records.iter().find(|r| r.id == kind)
    }

    pub fn get_mut(&mut self, kind: SkillKind) -> Option<&mut SkillRecord> {
        self.records.iter_mut().find(|r| r.id == kind)
    }

    /// Add or replace the record for a skill.
    pub fn learn(&mut self, record: SkillRecord) {
        match self.get_mut(record.id) {
            Some(existing) => *existing = record,
            None => self.records.push(record),
        }
    }

    pub fn forget(&mut self, kind: SkillKind) -> Option<SkillRecord> {
        let idx = self.records.iter().position(|r| r.id == kind)?;
        Some(self.records.remove(idx))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ============================================================================
// Affects
// ============================================================================

/// A timed status effect attached to a character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Affect {
    /// Affect name; lookups go through this.
    pub id: String,
    pub display: String,
    /// Ticks remaining. Decremented by the world loop, not by skills.
    pub decay: i32,
    pub modifiers: Option<BTreeMap<String, i32>>,
    /// Room the affect started in, if it is tied to a place.
    pub origin_room: Option<RoomId>,
}

impl Affect {
    pub fn new(id: impl Into<String>, display: impl Into<String>, decay: i32) -> Self {
        Self {
            id: id.into(),
            display: display.into(),
            decay,
            modifiers: None,
            origin_room: None,
        }
    }

    pub fn started_in(mut self, room: RoomId) -> Self {
        self.origin_room = Some(room);
        self
    }
}

// ============================================================================
// Equipment
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemType {
    Weapon,
    Armor,
    Shield,
    Other,
}

/// An item that can occupy an equipment slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    pub display_name: String,
    pub item_type: ItemType,
    /// Armor class contribution; zero for items that give none.
    pub ac: i32,
}

impl Item {
    pub fn shield(display_name: impl Into<String>, ac: i32) -> Self {
        let display_name = display_name.into();
        Self {
            name: display_name.to_lowercase(),
            display_name,
            item_type: ItemType::Shield,
            ac,
        }
    }

    pub fn weapon(display_name: impl Into<String>) -> Self {
        let display_name = display_name.into();
        Self {
            name: display_name.to_lowercase(),
            display_name,
            item_type: ItemType::Weapon,
            ac: 0,
        }
    }

    pub fn is_shield(&self) -> bool {
        self.item_type == ItemType::Shield
    }
}

/// A named wear location, possibly holding an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipSlot {
    pub name: String,
    pub item: Option<Item>,
}

/// Ordered wear slots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Equipment {
    pub slots: Vec<EquipSlot>,
}

impl Equipment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Standard humanoid hands.
    pub fn hands() -> Self {
        Self {
            slots: vec![
                EquipSlot {
                    name: "main hand".to_string(),
                    item: None,
                },
                EquipSlot {
                    name: "off hand".to_string(),
                    item: None,
                },
            ],
        }
    }

    /// Put an item in the named slot, creating the slot if needed.
    /// Returns whatever the slot held before.
    pub fn equip(&mut self, slot: &str, item: Item) -> Option<Item> {
        match self.slots.iter_mut().find(|s| s.name == slot) {
            Some(existing) => existing.item.replace(item),
            None => {
                self.slots.push(EquipSlot {
                    name: slot.to_string(),
                    item: Some(item),
                });
                None
            }
        }
    }

    pub fn slots_with_shields(&self) -> impl Iterator<Item = &EquipSlot> {
        self.slots
            .iter()
            .filter(|s| s.item.as_ref().is_some_and(Item::is_shield))
    }

    /// The first equipped shield, in slot order.
    pub fn first_shield(&self) -> Option<&Item> {
        self.slots_with_shields().find_map(|s| s.item.as_ref())
    }
}

// ============================================================================
// Commands
// ============================================================================

/// The parsed command a skill was invoked with. Parsing happens upstream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    pub verb: String,
    pub arg: Option<String>,
}

impl Command {
    pub fn new(verb: impl Into<String>) -> Self {
        Self {
            verb: verb.into(),
            arg: None,
        }
    }

    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.arg = Some(arg.into());
        self
    }

    /// The argument, if present and not blank.
    pub fn target(&self) -> Option<&str> {
        self.arg.as_deref().map(str::trim).filter(|a| !a.is_empty())
    }
}

// ============================================================================
// Characters
// ============================================================================

/// Reaction run when a character starts sneaking.
///
/// Only some characters carry one (scripted monsters, quest NPCs); the engine
/// invokes it after the sneak affect has been applied.
#[derive(Clone)]
pub struct SneakHook(Arc<dyn Fn(&mut Character, &Room) + Send + Sync>);

impl SneakHook {
    pub fn new(f: impl Fn(&mut Character, &Room) + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn call(&self, character: &mut Character, room: &Room) {
        (self.0)(character, room)
    }
}

impl fmt::Debug for SneakHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SneakHook(..)")
    }
}

/// A player or monster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Character {
    pub id: CharacterId,
    /// Short name used in lookups and third-person text ("goblin").
    pub name: String,
    /// Name shown to others ("grizzled dwarf").
    pub display_name: String,
    /// Extra words a room lookup matches on.
    #[serde(default)]
    pub keywords: Vec<String>,

    pub level: i32,
    pub attributes: Attributes,
    pub size: Size,
    pub main_stat: Ability,

    pub position: Position,
    pub opponent: Option<CharacterId>,
    /// Ticks before the character may act again. Skills only add to it.
    pub wait: u32,

    pub affects: Vec<Affect>,
    pub equipment: Equipment,
    pub skills: SkillBook,

    #[serde(skip)]
    pub on_sneak: Option<SneakHook>,
}

impl Character {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: CharacterId::new(),
            display_name: name.clone(),
            name,
            keywords: Vec::new(),
            level: 1,
            attributes: Attributes::default(),
            size: Size::Medium,
            main_stat: Ability::Strength,
            position: Position::Standing,
            opponent: None,
            wait: 0,
            affects: Vec::new(),
            equipment: Equipment::hands(),
            skills: SkillBook::new(),
            on_sneak: None,
        }
    }

    pub fn with_display_name(mut self, display: impl Into<String>) -> Self {
        self.display_name = display.into();
        self
    }

    pub fn with_level(mut self, level: i32) -> Self {
        self.level = level;
        self
    }

    pub fn with_size(mut self, size: Size) -> Self {
        self.size = size;
        self
    }

    pub fn with_main_stat(mut self, ability: Ability) -> Self {
        self.main_stat = ability;
        self
    }

    pub fn with_skill(mut self, record: SkillRecord) -> Self {
        self.skills.learn(record);
        self
    }

    pub fn with_on_sneak(mut self, hook: SneakHook) -> Self {
        self.on_sneak = Some(hook);
        self
    }

    pub fn affect(&self, name: &str) -> Option<&Affect> {
        self.affects.iter().find(|a| a.id == name)
    }

    pub fn is_sneaking(&self) -> bool {
        self.affect(SkillKind::Sneak.id()).is_some()
    }

    pub fn is_fighting(&self) -> bool {
        self.position == Position::Fighting
    }

    /// Every word a room lookup may match this character by.
    pub fn matches_keyword(&self, word: &str) -> bool {
        let word = word.to_lowercase();
        std::iter::once(&self.name)
            .chain(self.keywords.iter())
            .chain(std::iter::once(&self.display_name))
            .flat_map(|s| s.split_whitespace())
            .any(|w| w.to_lowercase().starts_with(&word))
    }
}

// ============================================================================
// Rooms
// ============================================================================

/// A location and the monsters standing in it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub title: String,
    pub monsters: Vec<Character>,
}

impl Room {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: RoomId::new(),
            title: title.into(),
            monsters: Vec::new(),
        }
    }

    pub fn with_monster(mut self, monster: Character) -> Self {
        self.monsters.push(monster);
        self
    }

    pub fn monster(&self, id: CharacterId) -> Option<&Character> {
        self.monsters.iter().find(|m| m.id == id)
    }

    pub fn monster_mut(&mut self, id: CharacterId) -> Option<&mut Character> {
        self.monsters.iter_mut().find(|m| m.id == id)
    }
}

// ============================================================================
// Sample characters
// ============================================================================

/// A strength-based fighter with bash and shield block, carrying a shield.
pub fn create_sample_warrior(name: &str) -> Character {
    let mut warrior = Character::new(name)
        .with_level(5)
        .with_main_stat(Ability::Strength)
        .with_skill(SkillRecord::new(SkillKind::Bash, 60).with_name("Bash"))
        .with_skill(
            SkillRecord::new(SkillKind::ShieldBlock, 50)
                .with_name("Shield Block")
                .with_modifier(1),
        )
        .with_skill(SkillRecord::new(SkillKind::SecondAttack, 40).with_name("Second Attack"));
    warrior.attributes = Attributes {
        strength: 16,
        dexterity: 12,
        constitution: 14,
        intelligence: 10,
        wisdom: 10,
        knowledge: 4,
        detection: 2,
    };
    warrior.equipment.equip("main hand", Item::weapon("Long Sword"));
    warrior.equipment.equip("off hand", Item::shield("Buckler", 2));
    warrior
}

/// A dexterity-based rogue with sneak and backstab.
pub fn create_sample_thief(name: &str) -> Character {
    let mut thief = Character::new(name)
        .with_level(5)
        .with_size(Size::Small)
        .with_main_stat(Ability::Dexterity)
        .with_skill(SkillRecord::new(SkillKind::Sneak, 70).with_name("Sneak"))
        .with_skill(SkillRecord::new(SkillKind::Backstab, 65).with_name("Backstab"));
    thief.attributes = Attributes {
        strength: 10,
        dexterity: 17,
        constitution: 12,
        intelligence: 13,
        wisdom: 11,
        knowledge: 6,
        detection: 8,
    };
    thief.equipment.equip("main hand", Item::weapon("Dagger"));
    thief
}

/// An untrained room monster.
pub fn create_sample_monster(name: &str) -> Character {
    Character::new(name)
        .with_display_name(format!("snarling {name}"))
        .with_level(2)
        .with_size(Size::Small)
}
