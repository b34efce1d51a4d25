//! Working memory for one combat.
//!
//! `CombatContext` holds everything the attribution chain consults:
//! current/previous caster, summon ownership maps, the bounded
//! recent-cast ring, and the live effect-ownership claims. It is reset
//! at the start of every combat.

mod ownership;

pub use ownership::{EFFECT_LIFETIME_MS, EffectOwnership, OwnershipKey};

use std::collections::VecDeque;

use chrono::NaiveDateTime;
use hashbrown::HashMap;

/// Lookback over recent casts when resolving ambiguous damage, in
/// milliseconds. Covers multi-target and rebound damage where several
/// effect lines trail one cast.
pub const ATTRIBUTION_WINDOW_MS: i64 = 5_000;

/// Bound on the recent-cast ring; oldest entries are evicted first.
pub const RECENT_CASTS_MAX: usize = 3;

/// One spell cast, as seen in the log.
#[derive(Debug, Clone)]
pub struct RecentCast {
    pub caster: String,
    pub spell: String,
    pub at: NaiveDateTime,
}

#[derive(Debug, Clone, Default)]
pub struct CombatContext {
    pub current_caster: Option<String>,
    pub previous_caster: Option<String>,
    pub current_spell: Option<String>,
    pub is_summon_spell: bool,
    pub pending_summon_owner: Option<String>,
    pub last_summon_owner: Option<String>,
    /// Summon id -> owning participant. Summon ids are always negative;
    /// non-negative ids are rejected at the join boundary.
    summon_ownership: HashMap<i64, String>,
    /// Case-folded summon name -> summon id.
    summon_name_to_id: HashMap<String, i64>,
    /// Recent casts, newest last.
    pub recent_casts: VecDeque<RecentCast>,
    effect_ownerships: HashMap<OwnershipKey, EffectOwnership>,
    /// Participant names in first-cast order.
    pub turn_order: Vec<String>,
    /// Raw lines that failed attribution, retained for display.
    pub unaccounted_lines: Vec<String>,
}

impl CombatContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = CombatContext::default();
    }

    // ─── Recent casts ───────────────────────────────────────────────────────

    pub fn push_recent_cast(&mut self, caster: &str, spell: &str, at: NaiveDateTime) {
        if self.recent_casts.len() == RECENT_CASTS_MAX {
            self.recent_casts.pop_front();
        }
        self.recent_casts.push_back(RecentCast {
            caster: caster.to_string(),
            spell: spell.to_string(),
            at,
        });
    }

    /// Newest cast whose timestamp is within the attribution window.
    pub fn recent_caster_within_window(&self, now: NaiveDateTime) -> Option<&RecentCast> {
        self.recent_casts.iter().rev().find(|cast| {
            let age_ms = now.signed_duration_since(cast.at).num_milliseconds();
            (0..=ATTRIBUTION_WINDOW_MS).contains(&age_ms)
        })
    }

    // ─── Summon ownership ───────────────────────────────────────────────────

    pub fn bind_summon(&mut self, id: i64, owner: String) {
        self.summon_ownership.insert(id, owner);
    }

    pub fn bind_summon_name(&mut self, name: &str, id: i64) {
        self.summon_name_to_id.insert(name.to_lowercase(), id);
    }

    pub fn summon_id(&self, name: &str) -> Option<i64> {
        self.summon_name_to_id.get(&name.to_lowercase()).copied()
    }

    pub fn summon_owner(&self, id: i64) -> Option<&str> {
        self.summon_ownership.get(&id).map(String::as_str)
    }

    /// Owner of the summon known by `name`, when both the name and the
    /// ownership bindings exist.
    pub fn summon_owner_by_name(&self, name: &str) -> Option<&str> {
        self.summon_id(name).and_then(|id| self.summon_owner(id))
    }

    pub fn is_known_summon(&self, name: &str) -> bool {
        self.summon_name_to_id.contains_key(&name.to_lowercase())
    }

    // ─── Effect-ownership claims ────────────────────────────────────────────

    pub fn register_effect_claim(
        &mut self,
        effect: &str,
        target: Option<&str>,
        owner: &str,
        now: NaiveDateTime,
    ) {
        let key = match target {
            Some(target) => OwnershipKey::targeted(effect, target),
            None => OwnershipKey::generic(effect),
        };
        self.effect_ownerships
            .insert(key, EffectOwnership::new(owner.to_string(), now));
    }

    /// Owner of a live claim for `effect`, trying the target-scoped key
    /// before the generic one. Expired claims consulted on the way are
    /// evicted.
    pub fn claim_owner(
        &mut self,
        effect: &str,
        target: Option<&str>,
        now: NaiveDateTime,
    ) -> Option<String> {
        let keys = [
            target.map(|t| OwnershipKey::targeted(effect, t)),
            Some(OwnershipKey::generic(effect)),
        ];
        for key in keys.into_iter().flatten() {
            match self.effect_ownerships.get(&key) {
                Some(claim) if claim.is_live(now) => return Some(claim.owner.clone()),
                Some(_) => {
                    self.effect_ownerships.remove(&key);
                }
                None => {}
            }
        }
        None
    }

    pub fn claim_count(&self) -> usize {
        self.effect_ownerships.len()
    }

    // ─── Turn order ─────────────────────────────────────────────────────────

    /// Appends `name` to the turn order if it is not recorded yet.
    /// Returns true when this was the first sighting.
    pub fn record_turn_order(&mut self, name: &str) -> bool {
        let folded = name.to_lowercase();
        if self
            .turn_order
            .iter()
            .any(|known| known.to_lowercase() == folded)
        {
            return false;
        }
        self.turn_order.push(name.to_string());
        true
    }

    pub fn note_unaccounted(&mut self, raw_line: &str) {
        self.unaccounted_lines.push(raw_line.to_string());
    }
}
