use chrono::{NaiveDate, NaiveDateTime, TimeDelta};

use super::*;
use crate::game_data::SpellTable;

const START: &str = "[FL] fight created | 42";
const END: &str = "[FL] End fight";

fn t0() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}

fn t(secs: i64) -> NaiveDateTime {
    t0() + TimeDelta::seconds(secs)
}

fn parser() -> LogParser {
    LogParser::new(SpellTable::bundled().unwrap())
}

fn join(name: &str, breed: i32, id: i64) -> String {
    format!("[_FL_] fightId=42 {name} breed:{breed} [{id}] isControlledByAI=false")
}

fn summon_join(name: &str, id: i64) -> String {
    format!("[_FL_] fightId=42 {name} breed:0 [{id}] isControlledByAI=true")
}

fn cast(caster: &str, spell: &str) -> String {
    format!("[Information (combat)] {caster} lance le sort {spell}")
}

fn feed_at(parser: &mut LogParser, lines: &[&str], at: NaiveDateTime) -> Vec<GameSignal> {
    lines
        .iter()
        .flat_map(|line| parser.process_line_at(line, at))
        .collect()
}

#[test]
fn join_registers_player_once() {
    let mut p = parser();
    let signals = feed_at(&mut p, &[START, &join("Alice", 1, 101), &join("Alice", 1, 101)], t(0));
    let added = signals
        .iter()
        .filter(|s| matches!(s, GameSignal::PlayerAdded { name } if name == "Alice"))
        .count();
    assert_eq!(added, 1);
    assert_eq!(p.roster().len(), 1);
    let record = p.roster().get("alice").unwrap();
    assert_eq!(record.breed, 1);
    assert_eq!(record.player_id, 101);
    assert_eq!(record.class_name.as_deref(), Some("Féca"));
}

#[test]
fn spell_cast_backfills_class() {
    let mut p = parser();
    feed_at(&mut p, &[START, &join("Alice", 0, 101)], t(0));
    assert!(p.roster().get("Alice").unwrap().class_name.is_none());
    feed_at(&mut p, &[&cast("Alice", "Pression")], t(1));
    assert_eq!(
        p.roster().get("Alice").unwrap().class_name.as_deref(),
        Some("Iop")
    );
}

#[test]
fn full_combat_attributes_plain_damage() {
    let mut p = parser();
    feed_at(
        &mut p,
        &[START, &join("Alice", 1, 101), &join("Bob", 2, 102)],
        t(0),
    );
    assert_eq!(p.state(), CombatState::Active);
    feed_at(&mut p, &[&cast("Alice", "Flamme")], t(0));
    feed_at(&mut p, &["Bob: -300 PV (Feu)"], t(1));
    let signals = feed_at(&mut p, &[END], t(2));

    assert_eq!(p.roster().get("Alice").unwrap().damage_dealt, 300);
    assert_eq!(p.roster().get("Bob").unwrap().damage_taken, 300);
    assert_eq!(p.state(), CombatState::Terminated);
    assert_eq!(signals, vec![GameSignal::CombatEnded]);
}

#[test]
fn fight_start_is_idempotent_and_resets_counters() {
    let mut p = parser();
    feed_at(&mut p, &[START, &join("Alice", 1, 101)], t(0));
    feed_at(&mut p, &[&cast("Alice", "Flamme"), "Alice: -50 PV"], t(0));
    assert_eq!(p.roster().get("Alice").unwrap().damage_dealt, 50);

    feed_at(&mut p, &[START, START], t(5));
    assert_eq!(p.state(), CombatState::Active);
    // record survives until finalization, counters are zeroed
    let record = p.roster().get("Alice").unwrap();
    assert_eq!(record.damage_dealt, 0);
    assert_eq!(record.number_of_turns, 0);
    assert!(p.context().current_caster.is_none());
    assert_eq!(p.context().claim_count(), 0);
}

#[test]
fn summon_damage_credits_owner_directly() {
    let mut p = parser();
    feed_at(
        &mut p,
        &[
            START,
            &join("Alice", 3, 101),
            &join("Bob", 2, 102),
            "Alice: Invoque un(e) Bouftou",
            &summon_join("Bouftou", -3),
        ],
        t(0),
    );
    // the summon acts on its own turn
    feed_at(&mut p, &[&cast("Bouftou", "Ronflement")], t(1));
    feed_at(&mut p, &["Bob: -100 PV"], t(1));

    let alice = p.roster().get("Alice").unwrap();
    assert_eq!(alice.damage_dealt, 100);
    assert_eq!(alice.damage_by_summon, 100);
    assert_eq!(p.roster().get("Bob").unwrap().damage_taken, 100);
    // the summon itself never enters the roster
    assert!(p.roster().get("Bouftou").is_none());
}

#[test]
fn summon_instantiation_binds_pending_owner() {
    let mut p = parser();
    feed_at(
        &mut p,
        &[
            START,
            &join("Alice", 3, 101),
            "Alice: Invoque un(e) Tofu",
            "Instanciation d'une nouvelle invocation avec un id de -7",
        ],
        t(0),
    );
    assert_eq!(p.context().summon_owner(-7), Some("Alice"));
}

#[test]
fn non_negative_summon_id_is_rejected() {
    let mut p = parser();
    feed_at(
        &mut p,
        &[START, &join("Alice", 3, 101), "Alice: Invoque un(e) Tofu", &summon_join("Tofu", 7)],
        t(0),
    );
    assert!(!p.context().is_known_summon("Tofu"));
}

#[test]
fn effect_claim_outlives_attribution_window() {
    let mut p = parser();
    feed_at(
        &mut p,
        &[
            START,
            &join("Alice", 1, 101),
            &join("Bob", 2, 102),
            &join("Carol", 4, 103),
        ],
        t(0),
    );
    feed_at(&mut p, &[&cast("Alice", "Tremblement")], t(0));
    // delayed effect announced on Alice's turn
    feed_at(&mut p, &["Bob: Poison (-50 PV par tour)"], t(0));
    // ten seconds later, on Carol's turn, the tick fires
    feed_at(&mut p, &[&cast("Carol", "Mot Curatif")], t(10));
    feed_at(&mut p, &["Bob: -50 PV (Poison)"], t(10));

    assert_eq!(p.roster().get("Alice").unwrap().damage_dealt, 50);
    assert_eq!(p.roster().get("Carol").unwrap().damage_dealt, 0);
}

#[test]
fn expired_claim_falls_back_to_recent_cast() {
    let mut p = parser();
    feed_at(
        &mut p,
        &[
            START,
            &join("Alice", 1, 101),
            &join("Bob", 2, 102),
            &join("Carol", 4, 103),
        ],
        t(0),
    );
    feed_at(&mut p, &[&cast("Alice", "Tremblement")], t(0));
    feed_at(&mut p, &["Bob: Poison (-50 PV par tour)"], t(0));
    feed_at(&mut p, &[&cast("Carol", "Mot Curatif")], t(16));
    // claim registered at t=0 is past its lifetime here
    feed_at(&mut p, &["Bob: -50 PV (Poison)"], t(19));

    assert_eq!(p.roster().get("Alice").unwrap().damage_dealt, 0);
    assert_eq!(p.roster().get("Carol").unwrap().damage_dealt, 50);
}

#[test]
fn turn_counting_follows_caster_changes() {
    let mut p = parser();
    feed_at(
        &mut p,
        &[START, &join("Alice", 1, 101), &join("Bob", 2, 102)],
        t(0),
    );
    let signals = feed_at(&mut p, &[&cast("Alice", "Flamme")], t(0));
    assert!(signals.contains(&GameSignal::TurnDetected {
        name: "Alice".to_string()
    }));
    feed_at(&mut p, &["Bob: -100 PV"], t(0));
    // same caster again: still her first turn
    feed_at(&mut p, &[&cast("Alice", "Flamme")], t(1));
    feed_at(&mut p, &[&cast("Bob", "Pression")], t(2));
    feed_at(&mut p, &[&cast("Alice", "Flamme")], t(3));

    let alice = p.roster().get("Alice").unwrap();
    assert_eq!(alice.number_of_turns, 2);
    assert_eq!(p.roster().get("Bob").unwrap().number_of_turns, 1);
    // per-turn damage was reset when her second turn began
    assert_eq!(alice.damage_this_turn, 0);
    assert_eq!(alice.damage_dealt, 100);
    assert_eq!(p.context().turn_order, vec!["Alice", "Bob"]);
}

#[test]
fn roster_finalization_is_deferred_to_next_game_event() {
    let mut p = parser();
    feed_at(
        &mut p,
        &[START, &join("Alice", 1, 101), &join("Bob", 2, 102)],
        t(0),
    );
    // new combat: only Alice rejoins
    feed_at(&mut p, &[START, &join("Alice", 1, 101)], t(60));
    // Bob is still around until an attribution-sensitive line arrives
    assert!(p.roster().contains("Bob"));

    let signals = feed_at(&mut p, &[&cast("Alice", "Flamme")], t(61));
    assert!(signals.contains(&GameSignal::PlayerRemoved {
        name: "Bob".to_string()
    }));
    assert!(!p.roster().contains("Bob"));
    assert!(p.roster().contains("Alice"));
}

#[test]
fn grouped_digits_parse_as_one_magnitude() {
    let mut p = parser();
    feed_at(
        &mut p,
        &[START, &join("Alice", 1, 101), &join("Bob", 2, 102)],
        t(0),
    );
    feed_at(&mut p, &[&cast("Alice", "Flamme")], t(0));
    feed_at(&mut p, &["Bob: -12\u{202F}345 PV (Feu)"], t(1));
    assert_eq!(p.roster().get("Alice").unwrap().damage_dealt, 12_345);
    assert_eq!(p.roster().get("Bob").unwrap().damage_taken, 12_345);
}

#[test]
fn directed_heal_credits_the_caster() {
    let mut p = parser();
    feed_at(
        &mut p,
        &[START, &join("Alice", 4, 101), &join("Bob", 2, 102)],
        t(0),
    );
    feed_at(&mut p, &[&cast("Alice", "Mot Curatif")], t(0));
    feed_at(&mut p, &["Bob: +200 PV"], t(1));
    assert_eq!(p.roster().get("Alice").unwrap().healing_done, 200);
    assert_eq!(p.roster().get("Bob").unwrap().healing_done, 0);
}

#[test]
fn shield_lines_credit_the_caster_with_or_without_sign() {
    let mut p = parser();
    feed_at(
        &mut p,
        &[START, &join("Alice", 1, 101), &join("Bob", 2, 102)],
        t(0),
    );
    feed_at(&mut p, &[&cast("Alice", "Immunité")], t(0));
    feed_at(&mut p, &["Bob: +120 Armure", "Bob: 80 Armure"], t(1));
    assert_eq!(p.roster().get("Alice").unwrap().shield_given, 200);
}

#[test]
fn noise_effect_labels_do_not_claim() {
    let mut p = parser();
    feed_at(&mut p, &[START, &join("Alice", 1, 101)], t(0));
    feed_at(&mut p, &[&cast("Alice", "Flamme")], t(0));
    feed_at(
        &mut p,
        &["Bob: 12 (+5 PV)", "Bob: Critique (-50 PV)", "Bob: Ab (-10 PV)"],
        t(0),
    );
    assert_eq!(p.context().claim_count(), 0);
}

#[test]
fn effect_application_lines_carry_no_immediate_damage() {
    let mut p = parser();
    feed_at(
        &mut p,
        &[START, &join("Alice", 1, 101), &join("Bob", 2, 102)],
        t(0),
    );
    feed_at(&mut p, &[&cast("Alice", "Tremblement")], t(0));
    feed_at(&mut p, &["Bob: Poison (-50 PV par tour)"], t(0));
    assert_eq!(p.roster().get("Bob").unwrap().damage_taken, 0);
    assert_eq!(p.context().claim_count(), 1);
}

#[test]
fn lines_outside_active_combat_are_ignored() {
    let mut p = parser();
    let signals = feed_at(&mut p, &["Bob: -300 PV (Feu)", &join("Alice", 1, 101)], t(0));
    assert!(signals.is_empty());
    assert!(p.roster().is_empty());
    assert_eq!(p.state(), CombatState::Waiting);
}

#[test]
fn noise_qualifiers_never_become_claims() {
    let mut p = parser();
    feed_at(
        &mut p,
        &[
            START,
            &join("Alice", 1, 101),
            &join("Bob", 2, 102),
            &join("Carol", 4, 103),
        ],
        t(0),
    );
    feed_at(&mut p, &[&cast("Alice", "Flamme")], t(0));
    feed_at(&mut p, &["Bob: -100 PV (Critique)"], t(0));
    // the mechanic label must not turn into an ownership claim
    assert_eq!(p.context().claim_count(), 0);

    feed_at(&mut p, &[&cast("Carol", "Pression")], t(3));
    feed_at(&mut p, &["Bob: -50 PV (Critique)"], t(3));
    assert_eq!(p.roster().get("Alice").unwrap().damage_dealt, 100);
    assert_eq!(p.roster().get("Carol").unwrap().damage_dealt, 50);
}

#[test]
fn fully_unresolvable_damage_is_noted_once() {
    let mut p = parser();
    feed_at(&mut p, &[START], t(0));
    // neither the target nor any owner is known
    feed_at(&mut p, &["Ghost: -300 PV"], t(0));
    assert_eq!(p.context().unaccounted_lines.len(), 1);
}

#[test]
fn signals_dispatch_through_handler() {
    use crate::signal::SignalHandler;

    #[derive(Default)]
    struct SignalCounter {
        added: u32,
        turns: u32,
    }

    impl SignalHandler for SignalCounter {
        fn handle_signal(&mut self, signal: &GameSignal) {
            match signal {
                GameSignal::PlayerAdded { .. } => self.added += 1,
                GameSignal::TurnDetected { .. } => self.turns += 1,
                _ => {}
            }
        }
    }

    let mut p = parser();
    let mut counter = SignalCounter::default();
    let lines = [
        START.to_string(),
        join("Alice", 1, 101),
        join("Bob", 2, 102),
        cast("Alice", "Flamme"),
    ];
    for line in &lines {
        for signal in p.process_line_at(line, t(0)) {
            counter.handle_signal(&signal);
        }
    }
    assert_eq!(counter.added, 2);
    assert_eq!(counter.turns, 1);
}

#[test]
fn ownerless_damage_is_noted_as_unaccounted() {
    let mut p = parser();
    feed_at(&mut p, &[START, &join("Bob", 2, 102)], t(0));
    feed_at(&mut p, &["Bob: -300 PV"], t(0));
    // target credit still lands, owner credit does not
    assert_eq!(p.roster().get("Bob").unwrap().damage_taken, 300);
    assert_eq!(p.context().unaccounted_lines.len(), 1);
}

#[test]
fn stack_trace_noise_is_dropped() {
    let mut p = parser();
    feed_at(&mut p, &[START, &join("Bob", 2, 102)], t(0));
    feed_at(
        &mut p,
        &["at Game.Fight.Process(Object o)", "--- End of stack trace ---"],
        t(0),
    );
    assert!(p.context().unaccounted_lines.is_empty());
    assert_eq!(p.roster().get("Bob").unwrap().damage_taken, 0);
}
