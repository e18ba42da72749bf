//! Scenario tests for skill resolution.
//!
//! Dice are scripted, so every expected number below can be worked out by
//! hand from the draw list. Run with: `cargo test -p mud-skills --test skill_scenarios`

use mud_skills::world::{create_sample_monster, create_sample_thief, create_sample_warrior};
use mud_skills::{
    Affect, CharacterAffects, Command, Engagement, EngineConfig, Item, KeywordLookup, Outcome,
    Position, RecordingBus, RngDice, Room, SkillEngine, SkillHarness, SkillKind, SkillRecord,
    SneakHook, SneakOutcome, StanceCombat, StrikeOutcome,
};
use mud_skills::{Ability, Character, Size};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn goblin_room() -> Room {
    Room::new("Muddy Crossroads").with_monster(create_sample_monster("goblin"))
}

fn bash_goblin() -> Command {
    Command::new("bash").with_arg("goblin")
}

// =============================================================================
// Proficiency extremes
// =============================================================================

#[test]
fn test_zero_train_never_passes() {
    for draw in [1, 2, 50, 100] {
        let mut harness = SkillHarness::new(vec![draw, 10]);
        let mut warrior = create_sample_warrior("Brakka");
        warrior.skills.learn(SkillRecord::new(SkillKind::Bash, 0));
        let mut room = goblin_room();

        let outcome = harness.engine.bash(&mut warrior, &mut room, &bash_goblin());
        assert_eq!(outcome, StrikeOutcome::Missed, "draw {draw} should miss");
    }
}

#[test]
fn test_full_train_always_passes() {
    for draw in [1, 57, 100] {
        let mut harness = SkillHarness::new(vec![draw]);
        let mut warrior = create_sample_warrior("Brakka");
        warrior.skills.learn(SkillRecord::new(SkillKind::Bash, 100));
        let mut room = goblin_room();

        let outcome = harness.engine.bash(&mut warrior, &mut room, &bash_goblin());
        assert!(
            matches!(outcome, StrikeOutcome::Hit { .. }),
            "draw {draw} should hit, got {outcome:?}"
        );
    }
}

// =============================================================================
// Passive skills
// =============================================================================

#[test]
fn test_shield_block_without_record_is_base_ac() {
    let mut harness = SkillHarness::new(vec![1, 10]);
    let thief = create_sample_thief("Nim");
    let shield = Item::shield("Tower Shield", 5);

    assert_eq!(harness.engine.shield_block(&thief, &shield), 5);
    assert_eq!(harness.draw_count(), 0);
}

#[test]
fn test_shield_block_scenario() {
    // train 100 -> one d10; check 37 passes, draw 6; 6 + ac 5 + modifier 2
    let mut harness = SkillHarness::new(vec![37, 6]);
    let mut warrior = create_sample_warrior("Brakka");
    warrior.skills.learn(
        SkillRecord::new(SkillKind::ShieldBlock, 100).with_modifier(2),
    );
    let shield = Item::shield("Tower Shield", 5);

    assert_eq!(harness.engine.shield_block(&warrior, &shield), 13);
    assert_eq!(harness.draw_faces(), vec![100, 10]);
}

#[test]
fn test_second_attack_without_record() {
    let mut harness = SkillHarness::new(vec![100, 1]);
    let mut thief = create_sample_thief("Nim");
    let before = thief.skills.clone();

    assert_eq!(harness.engine.second_attack(&mut thief), 0);
    assert_eq!(thief.skills, before);
    assert_eq!(harness.draw_count(), 0);
}

#[test]
fn test_second_attack_intelligence_helps_practice() {
    // int 16 -> +3, so a 92 reaches the threshold of 95
    let mut harness = SkillHarness::new(vec![92, 100]);
    let mut warrior = create_sample_warrior("Brakka");
    warrior.attributes.intelligence = 16;

    harness.engine.second_attack(&mut warrior);
    assert_eq!(
        warrior.skills.get(SkillKind::SecondAttack).map(|r| r.train_level),
        Some(41)
    );
}

// =============================================================================
// Sneak
// =============================================================================

#[test]
fn test_sneak_is_idempotent_while_active() {
    init_tracing();
    let mut harness = SkillHarness::new(vec![1, 5, 5, 5, 1, 5, 5, 5]);
    let mut thief = create_sample_thief("Nim");
    let room = Room::new("Alley");

    let first = harness.engine.sneak(&mut thief, &room);
    assert!(matches!(first, SneakOutcome::Sneaking { .. }));
    let wait_after_first = thief.wait;

    let second = harness.engine.sneak(&mut thief, &room);
    assert_eq!(second, SneakOutcome::AlreadySneaking);
    assert_eq!(thief.affects.len(), 1);
    assert_eq!(thief.wait, wait_after_first);
    // Only the first attempt rolled
    assert_eq!(harness.draw_count(), 4);
}

#[test]
fn test_sneak_uses_skill_wait_cost() {
    let mut harness = SkillHarness::new(vec![2]);
    let mut thief = create_sample_thief("Nim");
    thief
        .skills
        .learn(SkillRecord::new(SkillKind::Sneak, 70).with_wait_cost(4));

    harness.engine.sneak(&mut thief, &Room::new("Alley"));
    assert_eq!(thief.wait, 4);
}

#[test]
fn test_sneak_runs_hook_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = calls.clone();
    let mut thief = create_sample_thief("Nim").with_on_sneak(SneakHook::new(move |who, room| {
        assert!(who.is_sneaking());
        assert_eq!(room.title, "Alley");
        seen.fetch_add(1, Ordering::SeqCst);
    }));

    let mut harness = SkillHarness::new(vec![3]);
    let room = Room::new("Alley");
    harness.engine.sneak(&mut thief, &room);
    harness.engine.sneak(&mut thief, &room);

    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_failed_sneak_skips_hook() {
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = calls.clone();
    let mut thief = create_sample_thief("Nim").with_on_sneak(SneakHook::new(move |_, _| {
        seen.fetch_add(1, Ordering::SeqCst);
    }));

    let mut harness = SkillHarness::new(vec![6]);
    harness.engine.sneak(&mut thief, &Room::new("Alley"));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

// =============================================================================
// Bash
// =============================================================================

#[test]
fn test_bash_with_shield_scenario() {
    // check 20; base d13 draws 7 (+3 str +3 size); str d7 draws 4 (+3); shield d7 draws 2
    let mut harness = SkillHarness::new(vec![20, 7, 4, 2]);
    let mut warrior = create_sample_warrior("Brakka");
    let mut room = goblin_room();
    let goblin_id = room.monsters[0].id;

    let outcome = harness.engine.bash(&mut warrior, &mut room, &bash_goblin());
    assert_eq!(
        outcome,
        StrikeOutcome::Hit {
            damage: 22,
            critical: false
        }
    );
    assert_eq!(harness.draw_faces(), vec![100, 13, 7, 7]);

    assert_eq!(warrior.wait, 3);
    assert_eq!(room.monster(goblin_id).map(|g| g.wait), Some(3));

    let to_player = harness.texts_for(warrior.id);
    assert_eq!(to_player.len(), 1);
    assert!(to_player[0].contains("Buckler"));
    assert!(to_player[0].contains("snarling goblin"));
    assert!(to_player[0].contains("(22)"));

    let to_goblin = harness.texts_for(goblin_id);
    assert!(to_goblin[0].contains("Buckler"));
    assert!(harness.messages().iter().all(|(_, m)| m.suppress_prompt));

    assert_eq!(
        harness.engagements(),
        vec![Engagement {
            attacker: warrior.id,
            defender: goblin_id,
            room: room.id,
        }]
    );
}

#[test]
fn test_bash_without_shield_dexterity_build() {
    // check 1; base d13 draws 5 (+3 str +3 size); no str bonus, no shield
    let mut harness = SkillHarness::new(vec![1, 5]);
    let mut warrior = create_sample_warrior("Brakka").with_main_stat(Ability::Dexterity);
    warrior.equipment = mud_skills::world::Equipment::hands();
    let mut room = goblin_room();

    let outcome = harness.engine.bash(&mut warrior, &mut room, &bash_goblin());
    assert_eq!(outcome.damage(), Some(11));
    // Non-strength builds recover slower
    assert_eq!(warrior.wait, 4);
    assert_eq!(room.monsters[0].wait, 3);

    let to_goblin = harness.texts_for(room.monsters[0].id);
    assert!(!to_goblin[0].contains("(11)"));
}

#[test]
fn test_bash_what() {
    init_tracing();
    let mut harness = SkillHarness::new(vec![]);
    let mut warrior = create_sample_warrior("Brakka");
    let mut room = goblin_room();

    let outcome = harness.engine.bash(&mut warrior, &mut room, &Command::new("bash"));
    assert_eq!(outcome, StrikeOutcome::NoTarget);
    assert_eq!(harness.texts_for(warrior.id), vec!["Bash what?".to_string()]);
    assert!(!harness.messages()[0].1.suppress_prompt);

    let outcome = harness
        .engine
        .bash(&mut warrior, &mut room, &Command::new("bash").with_arg("dragon"));
    assert_eq!(outcome, StrikeOutcome::NoTarget);
    assert_eq!(harness.draw_count(), 0);
}

#[test]
fn test_bash_targets_current_opponent() {
    let mut harness = SkillHarness::new(vec![1]);
    let mut warrior = create_sample_warrior("Brakka");
    let mut room = goblin_room().with_monster(create_sample_monster("orc"));
    let orc_id = room.monsters[1].id;
    warrior.opponent = Some(orc_id);
    warrior.position = Position::Fighting;

    // The argument is ignored while already fighting
    harness.engine.bash(&mut warrior, &mut room, &bash_goblin());
    assert_eq!(harness.engagements()[0].defender, orc_id);
    assert_eq!(room.monsters[1].wait, 3);
    assert_eq!(room.monsters[0].wait, 0);
}

#[test]
fn test_bash_while_prone_does_nothing() {
    let mut harness = SkillHarness::new(vec![1, 1, 1, 1]);
    let mut warrior = create_sample_warrior("Brakka");
    let mut room = goblin_room();
    warrior.opponent = Some(room.monsters[0].id);
    warrior.position = Position::Prone;

    let outcome = harness.engine.bash(&mut warrior, &mut room, &bash_goblin());
    assert_eq!(outcome, StrikeOutcome::NotReady);
    assert!(harness.messages().is_empty());
    assert!(harness.engagements().is_empty());
    assert_eq!(warrior.wait, 0);
}

#[test]
fn test_bash_ignores_leftover_opponent_when_standing() {
    let mut harness = SkillHarness::new(vec![1, 1, 1, 1]);
    let mut warrior = create_sample_warrior("Brakka");
    let mut room = goblin_room();
    warrior.opponent = Some(room.monsters[0].id);

    let outcome = harness.engine.bash(&mut warrior, &mut room, &Command::new("bash"));
    assert_eq!(outcome, StrikeOutcome::NoTarget);
    assert_eq!(harness.texts_for(warrior.id), vec!["Bash what?".to_string()]);
    assert_eq!(harness.draw_count(), 0);
    assert_eq!(room.monsters[0].wait, 0);
}

#[test]
fn test_bash_while_fighting_needs_an_opponent() {
    let mut harness = SkillHarness::new(vec![1, 1, 1, 1]);
    let mut warrior = create_sample_warrior("Brakka");
    warrior.position = Position::Fighting;
    let mut room = goblin_room();

    let outcome = harness.engine.bash(&mut warrior, &mut room, &bash_goblin());
    assert_eq!(outcome, StrikeOutcome::NoTarget);
    assert_eq!(harness.texts_for(warrior.id), vec!["Bash what?".to_string()]);
    assert!(harness.engagements().is_empty());
}

#[test]
fn test_bash_named_target_while_prone() {
    let mut harness = SkillHarness::new(vec![1, 1, 1, 1]);
    let mut warrior = create_sample_warrior("Brakka");
    warrior.position = Position::Prone;
    let mut room = goblin_room();

    let outcome = harness.engine.bash(&mut warrior, &mut room, &bash_goblin());
    assert_eq!(outcome, StrikeOutcome::NoTarget);
    assert_eq!(harness.texts_for(warrior.id), vec!["Bash what?".to_string()]);
    assert_eq!(harness.draw_count(), 0);
    assert!(harness.engagements().is_empty());
}

#[test]
fn test_bash_miss_still_engages() {
    // miss with 90; recovery 11 + knowledge 4 = 15 meets 10 + level 5
    let mut harness = SkillHarness::new(vec![90, 11]);
    let mut warrior = create_sample_warrior("Brakka");
    let mut room = goblin_room();

    let outcome = harness.engine.bash(&mut warrior, &mut room, &bash_goblin());
    assert_eq!(outcome, StrikeOutcome::Missed);
    assert_eq!(warrior.wait, 2);
    assert_eq!(room.monsters[0].wait, 0);
    assert_eq!(harness.engagements().len(), 1);

    let texts = harness.texts_for(warrior.id);
    assert!(texts[0].contains("keep your footing"));
}

#[test]
fn test_bash_miss_slow_recovery() {
    let mut harness = SkillHarness::new(vec![90, 10]);
    let mut warrior = create_sample_warrior("Brakka");
    let mut room = goblin_room();

    harness.engine.bash(&mut warrior, &mut room, &bash_goblin());
    assert_eq!(warrior.wait, 3);
}

fn bash_damage(player: Character) -> i32 {
    // Same draw for every die
    let mut harness = SkillHarness::new(vec![1, 6, 6, 6]);
    let mut player = player;
    let mut room = goblin_room();
    harness
        .engine
        .bash(&mut player, &mut room, &bash_goblin())
        .damage()
        .unwrap_or_default()
}

#[test]
fn test_bash_damage_scales_with_size_and_level() {
    let sizes = [Size::Tiny, Size::Small, Size::Medium, Size::Large, Size::Huge, Size::Giant];
    let by_size: Vec<i32> = sizes
        .iter()
        .map(|&size| bash_damage(create_sample_warrior("Brakka").with_size(size)))
        .collect();
    assert!(by_size.windows(2).all(|w| w[0] <= w[1]), "{by_size:?}");
    assert!(by_size[0] < by_size[5]);

    let by_level: Vec<i32> = (1..=10)
        .map(|level| bash_damage(create_sample_warrior("Brakka").with_level(level)))
        .collect();
    assert!(by_level.windows(2).all(|w| w[0] <= w[1]), "{by_level:?}");
}

#[test]
fn test_bash_damage_at_least_one() {
    let mut weakling = create_sample_warrior("Twig").with_size(Size::Tiny);
    weakling.attributes.strength = 1;
    weakling.equipment = mud_skills::world::Equipment::hands();

    let mut harness = SkillHarness::new(vec![1, 1, 1]);
    let mut room = goblin_room();
    let outcome = harness.engine.bash(&mut weakling, &mut room, &bash_goblin());
    assert_eq!(outcome.damage(), Some(1));
}

// =============================================================================
// Backstab
// =============================================================================

fn stab_goblin() -> Command {
    Command::new("backstab").with_arg("goblin")
}

#[test]
fn test_backstab_alert_target_never_rolls() {
    let mut harness = SkillHarness::new(vec![1, 20, 25, 25]);
    let mut thief = create_sample_thief("Nim");
    let mut room = goblin_room();
    room.monsters[0].position = Position::Fighting;

    let outcome = harness.engine.backstab(&mut thief, &mut room, &stab_goblin());
    assert_eq!(outcome, StrikeOutcome::Blocked);
    assert_eq!(harness.draw_count(), 0);
    assert_eq!(thief.wait, 0);
}

#[test]
fn test_backstab_requires_standing() {
    let mut harness = SkillHarness::new(vec![1]);
    let mut thief = create_sample_thief("Nim");
    thief.position = Position::Resting;
    let mut room = goblin_room();

    let outcome = harness.engine.backstab(&mut thief, &mut room, &stab_goblin());
    assert_eq!(outcome, StrikeOutcome::NotReady);
    assert_eq!(harness.draw_count(), 0);
}

#[test]
fn test_backstab_what() {
    let mut harness = SkillHarness::new(vec![]);
    let mut thief = create_sample_thief("Nim");
    let mut room = Room::new("Empty Cellar");

    let outcome = harness.engine.backstab(&mut thief, &mut room, &stab_goblin());
    assert_eq!(outcome, StrikeOutcome::NoTarget);
    assert_eq!(harness.texts_for(thief.id), vec!["Backstab what?".to_string()]);
}

#[test]
fn test_backstab_sneaking_critical() {
    // check 10; d20 12 + dex 3 = 15; crit d25 22 + 3 = 25 > 23; 15 * 2 + 3 = 33; dex build d25 5
    let mut harness = SkillHarness::new(vec![10, 12, 22, 5]);
    let mut thief = create_sample_thief("Nim");
    thief.affects.push(Affect::new("sneak", "Sneak", 10));
    let mut room = goblin_room();

    let outcome = harness.engine.backstab(&mut thief, &mut room, &stab_goblin());
    assert_eq!(
        outcome,
        StrikeOutcome::Hit {
            damage: 38,
            critical: true
        }
    );
    assert_eq!(harness.draw_faces(), vec![100, 20, 25, 25]);
    assert_eq!(thief.wait, 3);
    assert_eq!(room.monsters[0].wait, 3);

    let texts = harness.texts_for(thief.id);
    assert!(texts[0].starts_with("Critical!"));
    assert!(texts[0].contains("(38)"));
    assert_eq!(harness.texts_for(room.monsters[0].id).len(), 1);
    // Backstab does not start a fight on its own
    assert!(harness.engagements().is_empty());
}

#[test]
fn test_backstab_open_critical() {
    // 15 * 1.5 floors to 22, plus 5
    let mut harness = SkillHarness::new(vec![10, 12, 22, 5]);
    let mut thief = create_sample_thief("Nim");
    let mut room = goblin_room();

    let outcome = harness.engine.backstab(&mut thief, &mut room, &stab_goblin());
    assert_eq!(outcome.damage(), Some(27));
}

#[test]
fn test_backstab_crit_threshold_is_strict() {
    // 20 + 3 = 23 is not above 17 + 5 + 1
    let mut harness = SkillHarness::new(vec![10, 12, 20, 5]);
    let mut thief = create_sample_thief("Nim");
    let mut room = goblin_room();

    let outcome = harness.engine.backstab(&mut thief, &mut room, &stab_goblin());
    assert_eq!(
        outcome,
        StrikeOutcome::Hit {
            damage: 20,
            critical: false
        }
    );
}

#[test]
fn test_backstab_miss_recovery() {
    // 9 + knowledge 6 = 15 meets 10 + level 5
    let mut harness = SkillHarness::new(vec![99, 9]);
    let mut thief = create_sample_thief("Nim");
    let mut room = goblin_room();
    assert_eq!(
        harness.engine.backstab(&mut thief, &mut room, &stab_goblin()),
        StrikeOutcome::Missed
    );
    assert_eq!(thief.wait, 3);
    assert_eq!(room.monsters[0].wait, 0);

    let mut harness = SkillHarness::new(vec![99, 8]);
    let mut thief = create_sample_thief("Nim");
    harness.engine.backstab(&mut thief, &mut room, &stab_goblin());
    assert_eq!(thief.wait, 6);
}

#[test]
fn test_backstab_can_be_silent() {
    let mut harness = SkillHarness::with_config(
        vec![10, 12, 1, 5],
        EngineConfig::new().with_backstab_narration(false),
    );
    let mut thief = create_sample_thief("Nim");
    let mut room = goblin_room();

    let outcome = harness.engine.backstab(&mut thief, &mut room, &stab_goblin());
    assert!(matches!(outcome, StrikeOutcome::Hit { .. }));
    assert!(harness.messages().is_empty());
}

// =============================================================================
// Dispatch with the in-memory collaborators
// =============================================================================

#[test]
fn test_perform_bash_end_to_end() {
    init_tracing();
    let bus = RecordingBus::new();
    let mut engine = SkillEngine::new(
        RngDice::seeded(2024),
        bus.clone(),
        KeywordLookup,
        CharacterAffects,
        StanceCombat,
    );
    let mut warrior = create_sample_warrior("Brakka");
    let mut room = goblin_room();
    let goblin_id = room.monsters[0].id;

    let outcome = engine.perform(SkillKind::Bash, &mut warrior, &mut room, &bash_goblin());
    assert!(matches!(
        outcome,
        Outcome::Strike(StrikeOutcome::Hit { .. } | StrikeOutcome::Missed)
    ));
    assert_eq!(warrior.opponent, Some(goblin_id));
    assert_eq!(warrior.position, Position::Fighting);
    assert!(room.monsters[0].is_fighting());
    assert!(warrior.wait >= 2);
    assert!(!bus.texts_for(warrior.id).is_empty());

    // Once fighting, a backstab can no longer surprise
    let mut thief = create_sample_thief("Nim");
    let outcome = engine.perform(SkillKind::Backstab, &mut thief, &mut room, &stab_goblin());
    assert_eq!(outcome, Outcome::Strike(StrikeOutcome::Blocked));
}

#[test]
fn test_perform_sneak_by_name() {
    let mut harness = SkillHarness::new(vec![1]);
    let mut thief = create_sample_thief("Nim");
    let mut room = Room::new("Alley");
    let kind: SkillKind = "Sneak".parse().unwrap();

    let outcome = harness
        .engine
        .perform(kind, &mut thief, &mut room, &Command::new("sneak"));
    assert!(matches!(outcome, Outcome::Sneak(SneakOutcome::Sneaking { .. })));
    assert!(thief.is_sneaking());
}
