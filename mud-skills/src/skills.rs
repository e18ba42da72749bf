//! Skill resolution.
//!
//! Passive skills (shield block, second attack) are consulted by other
//! commands and return a number. Sneak, bash and backstab are invoked by a
//! character and act on the world: they roll against the character's train
//! level, add to action delays, apply affects, hand off to combat and narrate.
//!
//! Every entry point starts by resolving the character's record for its skill;
//! a character without the record gets the untrained outcome and nothing else
//! happens.

use crate::config::EngineConfig;
use crate::dice::{RandomSource, RngDice};
use crate::modifiers::{AttributeModifiers, DefaultCurve};
use crate::ports::{
    AffectStore, CharacterAffects, CombatResolver, KeywordLookup, Message, MessageBus, RoomLookup,
    StanceCombat,
};
use crate::world::{
    Ability, Affect, Character, Command, Item, Position, Room, SkillKind, SkillRecord,
};
use tracing::{debug, info};

/// Result of a sneak attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SneakOutcome {
    Untrained,
    AlreadySneaking,
    /// The attempt failed; the sneaker is not told.
    Failed,
    Sneaking { decay: i32 },
}

/// Result of a melee skill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrikeOutcome {
    Untrained,
    /// Nobody to strike.
    NoTarget,
    /// The attacker's stance does not allow the skill.
    NotReady,
    /// The target is already fighting and cannot be surprised.
    Blocked,
    Hit { damage: i32, critical: bool },
    Missed,
}

impl StrikeOutcome {
    pub fn damage(&self) -> Option<i32> {
        match self {
            StrikeOutcome::Hit { damage, .. } => Some(*damage),
            _ => None,
        }
    }
}

/// Result of [`SkillEngine::perform`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Passive skills are not invoked directly.
    Passive,
    Sneak(SneakOutcome),
    Strike(StrikeOutcome),
}

/// Resolves skills against injected collaborators. Holds no game state.
pub struct SkillEngine {
    dice: Box<dyn RandomSource>,
    modifiers: Box<dyn AttributeModifiers>,
    messages: Box<dyn MessageBus>,
    rooms: Box<dyn RoomLookup>,
    affects: Box<dyn AffectStore>,
    combat: Box<dyn CombatResolver>,
    config: EngineConfig,
}

impl SkillEngine {
    pub fn new(
        dice: impl RandomSource + 'static,
        messages: impl MessageBus + 'static,
        rooms: impl RoomLookup + 'static,
        affects: impl AffectStore + 'static,
        combat: impl CombatResolver + 'static,
    ) -> Self {
        Self {
            dice: Box::new(dice),
            modifiers: Box::new(DefaultCurve),
            messages: Box::new(messages),
            rooms: Box::new(rooms),
            affects: Box::new(affects),
            combat: Box::new(combat),
            config: EngineConfig::default(),
        }
    }

    /// An engine using entropy-seeded dice and the in-memory collaborators,
    /// delivering narration to `messages`.
    pub fn standard(messages: impl MessageBus + 'static) -> Self {
        Self::new(
            RngDice::from_entropy(),
            messages,
            KeywordLookup,
            CharacterAffects,
            StanceCombat,
        )
    }

    pub fn with_modifiers(mut self, modifiers: impl AttributeModifiers + 'static) -> Self {
        self.modifiers = Box::new(modifiers);
        self
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Invoke a skill by kind, the way a command handler would.
    pub fn perform(
        &mut self,
        kind: SkillKind,
        player: &mut Character,
        room: &mut Room,
        command: &Command,
    ) -> Outcome {
        match kind {
            SkillKind::Sneak => Outcome::Sneak(self.sneak(player, room)),
            SkillKind::Bash => Outcome::Strike(self.bash(player, room, command)),
            SkillKind::Backstab => Outcome::Strike(self.backstab(player, room, command)),
            SkillKind::ShieldBlock | SkillKind::SecondAttack => Outcome::Passive,
        }
    }

    // ========================================================================
    // Passive skills
    // ========================================================================

    /// Armor class a shield provides its bearer this round.
    ///
    /// A successful check rolls one die of `train_level / 10` faces on top of
    /// the shield's armor class and the skill modifier.
    pub fn shield_block(&mut self, player: &Character, shield: &Item) -> i32 {
        let Some(skill) = trained(player, SkillKind::ShieldBlock) else {
            return shield.ac;
        };

        if self.dice.percentile() > skill.train_level {
            return shield.ac;
        }

        let ac = self.dice.roll(
            1,
            skill.train_level as f64 / 10.0,
            shield.ac + skill.modifier,
        );
        debug!(skill = %skill.id, actor = %player.name, shield = %shield.name, ac, "shield block");
        ac
    }

    /// Extra attacks granted this round, with a chance to practice the skill.
    pub fn second_attack(&mut self, player: &mut Character) -> i32 {
        let int_mod = self.modifiers.intelligence_mod(player);
        let Some(skill) = player.skills.get_mut(SkillKind::SecondAttack) else {
            return 0;
        };

        if self.dice.roll(1, 100.0, int_mod) >= self.config.practice_threshold {
            let grown = self.config.grow_train(skill.train_level);
            if grown != skill.train_level {
                info!(
                    actor = %player.name,
                    from = skill.train_level,
                    to = grown,
                    "second attack improved"
                );
                skill.train_level = grown;
            }
        }

        if self.dice.percentile() <= skill.train_level {
            1 + skill.modifier
        } else {
            0
        }
    }

    // ========================================================================
    // Non-combat skills
    // ========================================================================

    /// Start sneaking. Failure is silent: the sneaker cannot tell whether
    /// they are hidden.
    pub fn sneak(&mut self, player: &mut Character, room: &Room) -> SneakOutcome {
        let Some(skill) = trained(player, SkillKind::Sneak) else {
            return SneakOutcome::Untrained;
        };

        if self.affects.get(player, SkillKind::Sneak.id()).is_some() {
            return SneakOutcome::AlreadySneaking;
        }

        // A six always fails, however well trained
        if skill.train_level <= 0 || self.dice.roll(1, 6.0, 0) >= 6 {
            debug!(actor = %player.name, "sneak failed");
            return SneakOutcome::Failed;
        }

        let attrs = &player.attributes;
        let decay = self.dice.roll(
            1 + player.level / 2,
            20.0,
            attrs.detection + attrs.knowledge / 2,
        );
        let affect =
            Affect::new(SkillKind::Sneak.id(), skill.name.clone(), decay).started_in(room.id);
        self.affects.add(player, affect);

        player.wait += skill.wait_cost.unwrap_or(self.config.default_sneak_wait);

        if let Some(hook) = player.on_sneak.clone() {
            hook.call(player, room);
        }

        debug!(actor = %player.name, decay, wait = player.wait, "sneaking");
        SneakOutcome::Sneaking { decay }
    }

    // ========================================================================
    // Melee skills
    // ========================================================================

    /// Charge an opponent, with a shield if one is equipped.
    ///
    /// A standing player with no opponent bashes the monster the command
    /// names; a fighting player bashes their current opponent. A player
    /// holding an opponent from any other stance does nothing.
    pub fn bash(
        &mut self,
        player: &mut Character,
        room: &mut Room,
        command: &Command,
    ) -> StrikeOutcome {
        let Some(skill) = trained(player, SkillKind::Bash) else {
            return StrikeOutcome::Untrained;
        };

        let target = match (player.opponent, player.position) {
            (None, Position::Standing) if command.target().is_some() => {
                self.rooms.find_monster(room, command)
            }
            (Some(id), Position::Fighting) => Some(id),
            (Some(id), position) if !position.can_strike() && room.monster(id).is_some() => {
                debug!(actor = %player.name, %position, "bash from invalid position");
                return StrikeOutcome::NotReady;
            }
            _ => None,
        };
        let room_id = room.id;
        let opponent = match target {
            Some(id) => room.monster_mut(id),
            None => None,
        };
        let Some(opponent) = opponent else {
            self.messages
                .send_to_character(player, Message::new("Bash what?"));
            return StrikeOutcome::NoTarget;
        };

        let shield = player.equipment.first_shield().cloned();
        let str_mod = self.modifiers.strength_mod(player);

        if self.dice.percentile() <= skill.train_level {
            let damage = self.bash_damage(player, str_mod, shield.is_some());
            self.narrate_bash(player, opponent, shield.as_ref(), damage);

            self.combat.engage(player, opponent, room_id);

            player.wait += if player.main_stat == Ability::Strength { 3 } else { 4 };
            opponent.wait += 3;

            debug!(
                actor = %player.name,
                target = %opponent.name,
                damage,
                wait = player.wait,
                "bash hit"
            );
            StrikeOutcome::Hit {
                damage,
                critical: false,
            }
        } else {
            self.messages.send_to_character(
                player,
                Message::quiet("You lunge and mistime your bash, but keep your footing!"),
            );

            self.combat.engage(player, opponent, room_id);

            let delay = self.recovery(player, 2, 3);
            player.wait += delay;

            debug!(
                actor = %player.name,
                target = %opponent.name,
                wait = player.wait,
                "bash missed"
            );
            StrikeOutcome::Missed
        }
    }

    /// Layered damage: a size-scaled base roll, a strength bonus for
    /// strength-built characters, and a shield bonus.
    fn bash_damage(&mut self, player: &Character, str_mod: i32, has_shield: bool) -> i32 {
        let size = player.size.value();
        let mut damage = self.dice.roll(1, (10 + size) as f64, str_mod + size);

        if player.main_stat == Ability::Strength {
            damage += self.dice.roll(1, (2 + player.level) as f64, str_mod);
        }

        if has_shield {
            damage += self.dice.roll(1, (2 + player.level) as f64, 0);
        }

        damage.max(1)
    }

    fn narrate_bash(
        &mut self,
        player: &Character,
        opponent: &Character,
        shield: Option<&Item>,
        damage: i32,
    ) {
        let (to_player, to_opponent) = match shield {
            Some(shield) => (
                format!(
                    "You drive a {} into a {} and knock them back! ({damage})",
                    shield.display_name, opponent.display_name
                ),
                format!(
                    "A {} slams into you with a {}! ({damage})",
                    player.display_name, shield.display_name
                ),
            ),
            None => (
                format!(
                    "You throw your weight into a {}! ({damage})",
                    opponent.display_name
                ),
                format!("A {} slams into you!", player.display_name),
            ),
        };

        self.messages.send_to_character(player, Message::quiet(to_player));
        self.messages
            .send_to_character(opponent, Message::quiet(to_opponent));
    }

    /// Stab an unsuspecting monster named by the command.
    ///
    /// Only works from a standing start against a target that is not already
    /// fighting. Sneaking attackers crit harder.
    pub fn backstab(
        &mut self,
        player: &mut Character,
        room: &mut Room,
        command: &Command,
    ) -> StrikeOutcome {
        let Some(skill) = trained(player, SkillKind::Backstab) else {
            return StrikeOutcome::Untrained;
        };

        let opponent = match self.rooms.find_monster(room, command) {
            Some(id) => room.monster_mut(id),
            None => None,
        };
        let Some(opponent) = opponent else {
            self.messages
                .send_to_character(player, Message::new("Backstab what?"));
            return StrikeOutcome::NoTarget;
        };

        if player.position != Position::Standing {
            return StrikeOutcome::NotReady;
        }
        if opponent.is_fighting() {
            debug!(actor = %player.name, target = %opponent.name, "backstab target is alert");
            return StrikeOutcome::Blocked;
        }

        let dex_mod = self.modifiers.dexterity_mod(player);

        if self.dice.percentile() <= skill.train_level {
            let mut damage = self.dice.roll(1, 20.0, dex_mod);

            let level = player.level;
            let critical = self.dice.roll(1, (20 + level) as f64, dex_mod) > 17 + level + 1;
            if critical {
                if self.affects.get(player, SkillKind::Sneak.id()).is_some() {
                    damage = damage * 2 + dex_mod;
                } else {
                    damage = (damage * 3).div_euclid(2);
                }
            }

            if player.main_stat == Ability::Dexterity {
                damage += self.dice.roll(1, (20 + level) as f64, 0);
            }

            player.wait += 3;
            opponent.wait += 3;

            if self.config.narrate_backstab {
                let lead = if critical { "Critical! " } else { "" };
                self.messages.send_to_character(
                    player,
                    Message::quiet(format!(
                        "{lead}You sink your blade into the back of a {}! ({damage})",
                        opponent.display_name
                    )),
                );
                self.messages.send_to_character(
                    opponent,
                    Message::quiet(format!("A {} stabs you in the back!", player.display_name)),
                );
            }

            debug!(actor = %player.name, target = %opponent.name, damage, critical, "backstab hit");
            StrikeOutcome::Hit { damage, critical }
        } else {
            let delay = self.recovery(player, 3, 6);
            player.wait += delay;

            if self.config.narrate_backstab {
                self.messages.send_to_character(
                    player,
                    Message::quiet(format!(
                        "Your backstab at a {} finds only air.",
                        opponent.display_name
                    )),
                );
            }

            debug!(
                actor = %player.name,
                target = %opponent.name,
                wait = player.wait,
                "backstab missed"
            );
            StrikeOutcome::Missed
        }
    }

    /// Delay after a missed strike: knowledgeable characters recover faster.
    fn recovery(&mut self, player: &Character, quick: u32, slow: u32) -> u32 {
        let check = self.dice.roll(1, 20.0, player.attributes.knowledge);
        if check >= 10 + player.level {
            quick
        } else {
            slow
        }
    }
}

/// The character's record for a skill, if trained.
fn trained(player: &Character, kind: SkillKind) -> Option<SkillRecord> {
    player.skills.get(kind).cloned()
}
