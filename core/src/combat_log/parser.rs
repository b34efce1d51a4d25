use chrono::{Local, NaiveDateTime};
use memchr::{memchr, memmem};

use super::error::UnattributedReason;
use super::line::{self, normalize_line, normalize_name};
use crate::context::CombatContext;
use crate::diag::DiagnosticSink;
use crate::encounter::{CombatState, Roster};
use crate::game_data::{SpellTable, class_name_for_breed, is_denylisted_effect, is_summon_spell};
use crate::signal::GameSignal;

#[cfg(test)]
mod tests;

macro_rules! parse_i32 {
    ($s:expr) => {
        $s.trim().parse::<i32>().unwrap_or_default()
    };
}
macro_rules! parse_i64 {
    ($s:expr) => {
        $s.trim().parse::<i64>().unwrap_or_default()
    };
}

const FIGHT_CREATED_TOKEN: &str = "fight created";
const FIGHT_END_TOKENS: [&str; 3] = ["End fight", "Fin du combat", "GameFightEnd"];
const JOIN_TOKEN: &str = "fightId=";
const BREED_TOKEN: &str = " breed:";
const AI_FLAG_TOKEN: &str = "isControlledByAI=";
const CAST_TOKEN: &str = " lance le sort ";
const SUMMON_DECLARE_TOKENS: [&str; 2] = [": Invoque un(e) ", ": Invoque une "];
const SUMMON_DECLARE_GATE: &str = ": Invoque ";
const SUMMON_INSTANCE_TOKEN: &str = "Instanciation d'une nouvelle invocation avec un id de ";
const COMBAT_INFO_TAG: &str = "[Information (combat)]";
const LIFE_POINT_TOKEN: &str = " PV";
const ARMOR_TOKEN: &str = " Armure";

/// How a damage line was attributed to its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OwnerVia {
    EffectClaim,
    Summon,
    RecentCast,
    CurrentCaster,
    TargetResolution,
}

struct Attribution {
    owner: String,
    via: OwnerVia,
}

/// Classifies combat-log lines and reconstructs effect causality.
///
/// One instance per log stream. Single-writer: the owning line source
/// must serialize `process_line` calls; readers of the roster must copy
/// or go through the same serialization point.
pub struct LogParser {
    state: CombatState,
    roster: Roster,
    context: CombatContext,
    spells: SpellTable,
    sink: Option<DiagnosticSink>,
}

impl LogParser {
    pub fn new(spells: SpellTable) -> Self {
        Self {
            state: CombatState::Waiting,
            roster: Roster::new(),
            context: CombatContext::new(),
            spells,
            sink: None,
        }
    }

    pub fn with_sink(spells: SpellTable, sink: DiagnosticSink) -> Self {
        let mut parser = Self::new(spells);
        parser.sink = Some(sink);
        parser
    }

    pub fn state(&self) -> CombatState {
        self.state
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn roster_mut(&mut self) -> &mut Roster {
        &mut self.roster
    }

    pub fn context(&self) -> &CombatContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut CombatContext {
        &mut self.context
    }

    /// Zeroes all counters, clears the combat context, and marks the
    /// whole roster pending removal. Called implicitly at every combat
    /// start; callable on demand.
    pub fn reset(&mut self) {
        self.roster.reset_counters();
        self.roster.mark_all_pending();
        self.context.reset();
    }

    /// Classifies one raw log line. Returns the notifications the line
    /// raised. Never panics past this boundary: a line that fails to
    /// decompose is skipped, the stream continues.
    pub fn process_line(&mut self, raw: &str) -> Vec<GameSignal> {
        self.process_line_at(raw, Local::now().naive_local())
    }

    /// Same as [`process_line`](Self::process_line) with an explicit
    /// clock, for replay and tests.
    pub fn process_line_at(&mut self, raw: &str, now: NaiveDateTime) -> Vec<GameSignal> {
        let mut signals = Vec::new();
        if line::is_noise(raw) {
            return signals;
        }
        let text = normalize_line(raw);

        // Classification order matters: first match wins.
        if contains(&text, FIGHT_CREATED_TOKEN) {
            self.handle_combat_start(&mut signals);
            return signals;
        }
        if self.state != CombatState::Active {
            return signals;
        }
        if self.try_effect_application(&text, now) {
            return signals;
        }
        if FIGHT_END_TOKENS.iter().any(|token| contains(&text, token)) {
            self.handle_combat_end(&mut signals);
            return signals;
        }
        if contains(&text, JOIN_TOKEN) {
            self.parse_join(&text, &mut signals);
            return signals;
        }
        if contains(&text, CAST_TOKEN) {
            self.parse_spell_cast(&text, now, &mut signals);
            return signals;
        }
        if contains(&text, SUMMON_DECLARE_GATE) {
            self.parse_summon_declaration(&text);
            return signals;
        }
        if contains(&text, SUMMON_INSTANCE_TOKEN) {
            self.parse_summon_instantiation(&text);
            return signals;
        }
        if contains(&text, LIFE_POINT_TOKEN) || contains(&text, ARMOR_TOKEN) {
            self.parse_combat_effect(&text, raw, now, &mut signals);
            return signals;
        }
        // fails every classifier: silently dropped
        signals
    }

    // ─── Combat lifecycle ───────────────────────────────────────────────────

    fn handle_combat_start(&mut self, signals: &mut Vec<GameSignal>) {
        self.reset();
        self.state = CombatState::Active;
        signals.push(GameSignal::CombatStarted);
    }

    fn handle_combat_end(&mut self, signals: &mut Vec<GameSignal>) {
        self.state = CombatState::Terminated;
        signals.push(GameSignal::CombatEnded);
    }

    /// Purges participants from the previous combat who did not rejoin.
    /// Called at the top of every attribution-sensitive handler, not
    /// eagerly, so a late rejoin is not dropped.
    fn finalize_roster(&mut self, signals: &mut Vec<GameSignal>) {
        if !self.roster.has_pending() {
            return;
        }
        for name in self.roster.finalize_pending() {
            signals.push(GameSignal::PlayerRemoved { name });
        }
    }

    // ─── Joins ──────────────────────────────────────────────────────────────

    // ...[_FL_]...fightId=<int> <Name> breed:<int> [<id>] isControlledByAI=<bool>
    fn parse_join(&mut self, text: &str, signals: &mut Vec<GameSignal>) {
        let Some(pos) = memmem::find(text.as_bytes(), JOIN_TOKEN.as_bytes()) else {
            return;
        };
        let after = &text[pos + JOIN_TOKEN.len()..];
        let Some(space) = memchr(b' ', after.as_bytes()) else {
            return;
        };
        let after_id = &after[space + 1..];
        let Some(breed_pos) = memmem::find(after_id.as_bytes(), BREED_TOKEN.as_bytes()) else {
            return;
        };
        let name = normalize_name(&after_id[..breed_pos]);
        if name.is_empty() {
            return;
        }
        let rest = &after_id[breed_pos + BREED_TOKEN.len()..];
        let Some(bracket) = memmem::find(rest.as_bytes(), b" [") else {
            return;
        };
        let breed = parse_i32!(&rest[..bracket]);
        let rest = &rest[bracket + 2..];
        let Some(bracket_end) = memchr(b']', rest.as_bytes()) else {
            return;
        };
        let id = parse_i64!(&rest[..bracket_end]);
        let Some(ai_pos) = memmem::find(rest.as_bytes(), AI_FLAG_TOKEN.as_bytes()) else {
            return;
        };
        let is_ai = rest[ai_pos + AI_FLAG_TOKEN.len()..]
            .trim_start()
            .starts_with("true");

        if is_ai {
            self.parse_summon_join(&name, id);
        } else {
            self.parse_player_join(&name, breed, id, signals);
        }
    }

    fn parse_player_join(
        &mut self,
        name: &str,
        breed: i32,
        id: i64,
        signals: &mut Vec<GameSignal>,
    ) {
        let created = {
            let (record, created) = self.roster.upsert(name);
            record.breed = breed;
            record.player_id = id;
            if record.class_name.is_none() {
                record.class_name = class_name_for_breed(breed).map(str::to_string);
            }
            created
        };
        if created {
            signals.push(GameSignal::PlayerAdded {
                name: name.to_string(),
            });
        }
        self.roster.clear_pending(name);
    }

    fn parse_summon_join(&mut self, name: &str, id: i64) {
        // a non-negative id denotes a plain AI entity, not a summon
        if id >= 0 {
            return;
        }
        if let Some(owner) = self.context.pending_summon_owner.take() {
            self.context.bind_summon(id, owner);
        }
        // keep the name binding even when unowned; the instantiation
        // fallback may supply the owner later
        self.context.bind_summon_name(name, id);
    }

    // ─── Casts & turns ──────────────────────────────────────────────────────

    fn parse_spell_cast(&mut self, text: &str, now: NaiveDateTime, signals: &mut Vec<GameSignal>) {
        self.finalize_roster(signals);
        let body = line_body(text);
        let Some(pos) = memmem::find(body.as_bytes(), CAST_TOKEN.as_bytes()) else {
            return;
        };
        let caster = normalize_name(&body[..pos]);
        if caster.is_empty() {
            return;
        }
        let spell = body[pos + CAST_TOKEN.len()..]
            .trim()
            .trim_end_matches('.')
            .to_string();

        self.context.push_recent_cast(&caster, &spell, now);
        self.context.current_spell = Some(spell.clone());
        self.context.is_summon_spell = is_summon_spell(&spell);

        let previous = self.context.previous_caster.clone();
        if let Some(record) = self.roster.get_mut(&caster) {
            if record.class_name.is_none() {
                if let Some(info) = self.spells.lookup(&spell) {
                    record.class_name = Some(info.class.clone());
                }
            }
            if self.context.record_turn_order(&caster) {
                // very first sighting counts as the first turn
                record.begin_turn();
                signals.push(GameSignal::TurnDetected {
                    name: record.name.clone(),
                });
            } else if previous
                .as_deref()
                .is_some_and(|prev| !prev.is_empty() && prev.to_lowercase() != caster.to_lowercase())
            {
                record.begin_turn();
            }
        }

        self.context.previous_caster = Some(caster.clone());
        self.context.current_caster = Some(caster);
    }

    // ─── Summons ────────────────────────────────────────────────────────────

    fn parse_summon_declaration(&mut self, text: &str) {
        let body = line_body(text);
        let declared = SUMMON_DECLARE_TOKENS.iter().find_map(|token| {
            memmem::find(body.as_bytes(), token.as_bytes()).map(|pos| normalize_name(&body[..pos]))
        });
        let owner = match declared {
            Some(caster) if !caster.is_empty() => Some(caster),
            // declaration text did not decompose: last known caster
            _ => self.context.current_caster.clone(),
        };
        if let Some(owner) = owner {
            self.context.pending_summon_owner = Some(owner.clone());
            self.context.last_summon_owner = Some(owner);
        }
    }

    // Fallback path for summons whose declaration line was missed.
    fn parse_summon_instantiation(&mut self, text: &str) {
        let Some(pos) = memmem::find(text.as_bytes(), SUMMON_INSTANCE_TOKEN.as_bytes()) else {
            return;
        };
        let id = parse_i64!(text[pos + SUMMON_INSTANCE_TOKEN.len()..].trim_end_matches('.'));
        if id >= 0 {
            return;
        }
        let owner = self
            .context
            .pending_summon_owner
            .take()
            .or_else(|| self.context.last_summon_owner.clone());
        if let Some(owner) = owner {
            self.context.bind_summon(id, owner);
        }
    }

    // ─── Generic effect application ─────────────────────────────────────────

    // `Target: EffectText (+N…` / `(-N…` lines carry no immediate damage
    // but announce delayed effects (poisons, glyphs). Register a claim so
    // the later raw `-N PV` tick can be attributed after the caster's
    // turn has passed.
    fn try_effect_application(&mut self, text: &str, now: NaiveDateTime) -> bool {
        let body = line_body(text);
        let Some((target_raw, rest)) = body.split_once(": ") else {
            return false;
        };
        let rest = rest.trim_start();
        // a magnitude right after the colon is a damage/heal/shield line
        if rest.starts_with(['-', '+']) {
            return false;
        }
        let Some(paren) = find_signed_magnitude_paren(rest) else {
            return false;
        };
        let effect = rest[..paren].trim().trim_end_matches(':').trim();
        if !is_valid_effect_name(effect) {
            // matched the shape but carries a noise label; consume it
            return true;
        }
        let target = normalize_name(target_raw);
        let owner = self
            .context
            .current_caster
            .clone()
            .or_else(|| {
                self.context
                    .recent_caster_within_window(now)
                    .map(|cast| cast.caster.clone())
            })
            .unwrap_or_else(|| target.clone());
        self.context
            .register_effect_claim(effect, Some(&target), &owner, now);
        true
    }

    // ─── Damage / healing / shields ─────────────────────────────────────────

    fn parse_combat_effect(
        &mut self,
        text: &str,
        raw: &str,
        now: NaiveDateTime,
        signals: &mut Vec<GameSignal>,
    ) {
        self.finalize_roster(signals);
        let body = line_body(text);
        let Some((target_raw, rest)) = body.split_once(": ") else {
            let reason = if contains(body, ARMOR_TOKEN) {
                UnattributedReason::ShieldShape
            } else {
                UnattributedReason::DamageShape
            };
            self.note_unaccounted(raw, reason, now);
            return;
        };
        let target = normalize_name(target_raw);
        let rest = rest.trim_start();
        if contains(rest, ARMOR_TOKEN) {
            self.parse_shield(rest, raw, now);
        } else if let Some(magnitude_text) = rest.strip_prefix('-') {
            self.parse_damage(&target, magnitude_text, raw, now);
        } else if let Some(magnitude_text) = rest.strip_prefix('+') {
            self.parse_healing(&target, magnitude_text, raw, now);
        } else {
            self.note_unaccounted(raw, UnattributedReason::DamageShape, now);
        }
    }

    fn parse_damage(&mut self, target: &str, rest: &str, raw: &str, now: NaiveDateTime) {
        let Some((magnitude, digits)) = leading_magnitude(rest) else {
            self.note_unaccounted(raw, UnattributedReason::DamageShape, now);
            return;
        };
        let after = &rest[digits..];
        if !after.starts_with(LIFE_POINT_TOKEN) {
            self.note_unaccounted(raw, UnattributedReason::DamageShape, now);
            return;
        }
        let qualifiers = parse_qualifiers(&after[LIFE_POINT_TOKEN.len()..]);
        let qualifier = qualifiers.first().cloned();

        // a line is recorded as unaccounted at most once, with the first
        // applicable reason
        let target_known = if let Some(record) = self.roster.get_mut(target) {
            record.damage_taken += magnitude;
            true
        } else {
            self.note_unaccounted(raw, UnattributedReason::DamageTargetUnknown, now);
            false
        };

        let Some(attribution) = self.resolve_damage_owner(target, qualifier.as_deref(), now) else {
            if target_known {
                self.note_unaccounted(raw, UnattributedReason::DamageOwnerUnknown, now);
            }
            return;
        };
        let Some(owner_record) = self.roster.get_mut(&attribution.owner) else {
            if target_known {
                self.note_unaccounted(raw, UnattributedReason::DamageOwnerUnknown, now);
            }
            return;
        };
        owner_record.credit_damage_dealt(magnitude);
        if matches!(
            attribution.via,
            OwnerVia::Summon | OwnerVia::TargetResolution
        ) {
            owner_record.damage_by_summon += magnitude;
        }
        let owner = owner_record.name.clone();
        // extend delayed attribution for subsequent ticks of this effect;
        // mechanic labels go through the same noise filter as
        // effect-application lines
        if matches!(attribution.via, OwnerVia::RecentCast | OwnerVia::CurrentCaster) {
            if let Some(qualifier) = qualifier.as_deref().filter(|q| is_valid_effect_name(q)) {
                self.context
                    .register_effect_claim(qualifier, Some(target), &owner, now);
            }
        }
    }

    /// Damage ownership, strict priority order. The summon check runs
    /// before the recent-cast scan and short-circuits; persistent summon
    /// damage ticks every line and this is its fast path.
    fn resolve_damage_owner(
        &mut self,
        target: &str,
        qualifier: Option<&str>,
        now: NaiveDateTime,
    ) -> Option<Attribution> {
        // 1. live effect-ownership claim, target-scoped then generic
        if let Some(qualifier) = qualifier {
            if let Some(owner) = self.context.claim_owner(qualifier, Some(target), now) {
                return Some(Attribution {
                    owner,
                    via: OwnerVia::EffectClaim,
                });
            }
        }
        // 2. the current caster is itself a summon: credit its owner
        if let Some(caster) = self.context.current_caster.clone() {
            if !self.roster.contains(&caster) {
                if let Some(owner) = self.context.summon_owner_by_name(&caster) {
                    return Some(Attribution {
                        owner: owner.to_string(),
                        via: OwnerVia::Summon,
                    });
                }
            }
        }
        // 3. newest cast within the attribution window
        if let Some(cast) = self.context.recent_caster_within_window(now) {
            return Some(Attribution {
                owner: cast.caster.clone(),
                via: OwnerVia::RecentCast,
            });
        }
        // 4. the current caster directly, unless an unresolved summon
        if let Some(caster) = self.context.current_caster.clone() {
            let unresolved_summon =
                self.context.is_known_summon(&caster) && !self.roster.contains(&caster);
            if !unresolved_summon {
                return Some(Attribution {
                    owner: caster,
                    via: OwnerVia::CurrentCaster,
                });
            }
        }
        // 5. summon resolution on the target name, last resort
        if let Some(owner) = self.context.summon_owner_by_name(target) {
            return Some(Attribution {
                owner: owner.to_string(),
                via: OwnerVia::TargetResolution,
            });
        }
        None
    }

    fn parse_healing(&mut self, target: &str, rest: &str, raw: &str, now: NaiveDateTime) {
        let Some((magnitude, digits)) = leading_magnitude(rest) else {
            self.note_unaccounted(raw, UnattributedReason::HealingShape, now);
            return;
        };
        if !rest[digits..].starts_with(LIFE_POINT_TOKEN) {
            self.note_unaccounted(raw, UnattributedReason::HealingShape, now);
            return;
        }
        let Some(caster) = self.context.current_caster.clone() else {
            self.note_unaccounted(raw, UnattributedReason::HealingTargetUnknown, now);
            return;
        };
        // self-heal credits the target, directed heal credits the caster
        let credited = if caster.to_lowercase() == target.to_lowercase() {
            target
        } else {
            caster.as_str()
        };
        match self.roster.get_mut(credited) {
            Some(record) => record.healing_done += magnitude,
            None => self.note_unaccounted(raw, UnattributedReason::HealingTargetUnknown, now),
        }
    }

    fn parse_shield(&mut self, rest: &str, raw: &str, now: NaiveDateTime) {
        let unsigned = rest.strip_prefix('+').unwrap_or(rest);
        let Some((magnitude, digits)) = leading_magnitude(unsigned) else {
            self.note_unaccounted(raw, UnattributedReason::ShieldShape, now);
            return;
        };
        if !unsigned[digits..].starts_with(ARMOR_TOKEN) {
            self.note_unaccounted(raw, UnattributedReason::ShieldShape, now);
            return;
        }
        let Some(caster) = self.context.current_caster.clone() else {
            self.note_unaccounted(raw, UnattributedReason::ShieldOwnerUnknown, now);
            return;
        };
        match self.roster.get_mut(&caster) {
            Some(record) => record.shield_given += magnitude,
            None => self.note_unaccounted(raw, UnattributedReason::ShieldOwnerUnknown, now),
        }
    }

    fn note_unaccounted(&mut self, raw: &str, reason: UnattributedReason, now: NaiveDateTime) {
        self.context.note_unaccounted(raw);
        if let Some(sink) = &self.sink {
            sink.record(now, reason, raw);
        }
    }
}

// ─── Free helpers ───────────────────────────────────────────────────────────

fn contains(text: &str, token: &str) -> bool {
    memmem::find(text.as_bytes(), token.as_bytes()).is_some()
}

/// Text after the combat-information tag, when present.
fn line_body(text: &str) -> &str {
    match memmem::find(text.as_bytes(), COMBAT_INFO_TAG.as_bytes()) {
        Some(pos) => text[pos + COMBAT_INFO_TAG.len()..].trim_start(),
        None => text,
    }
}

/// Leading digit run as a magnitude. Returns the value and the run
/// length; `None` when the text does not open with a digit.
fn leading_magnitude(text: &str) -> Option<(i64, usize)> {
    let end = text
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(text.len());
    if end == 0 {
        return None;
    }
    text[..end].parse::<i64>().ok().map(|value| (value, end))
}

/// Opening paren directly followed by a signed digit, e.g. `(-50`.
fn find_signed_magnitude_paren(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    memchr::memchr_iter(b'(', bytes).find(|&pos| {
        pos + 2 < bytes.len()
            && (bytes[pos + 1] == b'-' || bytes[pos + 1] == b'+')
            && bytes[pos + 2].is_ascii_digit()
    })
}

/// Parenthetical qualifiers trailing the magnitude, in order.
fn parse_qualifiers(text: &str) -> Vec<String> {
    let bytes = text.as_bytes();
    let mut qualifiers = Vec::new();
    let mut i = 0;
    while let Some(open) = memchr(b'(', &bytes[i..]) {
        let start = i + open + 1;
        let Some(close) = memchr(b')', &bytes[start..]) else {
            break;
        };
        let qualifier = text[start..start + close].trim();
        if !qualifier.is_empty() {
            qualifiers.push(qualifier.to_string());
        }
        i = start + close + 1;
    }
    qualifiers
}

/// Too-short, purely numeric, or denylisted labels are mechanic noise,
/// not effects worth claiming.
fn is_valid_effect_name(name: &str) -> bool {
    if name.chars().count() < 3 {
        return false;
    }
    if name.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    !is_denylisted_effect(name)
}
