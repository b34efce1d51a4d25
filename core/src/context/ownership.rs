//! Effect-ownership claims for delayed and indirect damage.
//!
//! A claim asserts that a named effect (a poison, a glyph, a rebound
//! element) was put in play by a given owner. Claims expire: a poison
//! ticking two combats later must not be credited to a long-gone caster.

use chrono::NaiveDateTime;

/// Default claim lifetime in milliseconds.
pub const EFFECT_LIFETIME_MS: i64 = 18_000;

/// Lookup key for a claim. Targeted claims are scoped to a single victim
/// (the usual case for damage-over-time); generic claims apply to any
/// target of the effect. Modeled as a tagged key rather than a
/// `effect::target` string so names containing the delimiter cannot
/// collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OwnershipKey {
    Generic(String),
    Targeted(String, String),
}

impl OwnershipKey {
    pub fn generic(effect: &str) -> Self {
        OwnershipKey::Generic(effect.to_lowercase())
    }

    pub fn targeted(effect: &str, target: &str) -> Self {
        OwnershipKey::Targeted(effect.to_lowercase(), target.to_lowercase())
    }
}

/// A timestamped claim that a named effect belongs to `owner`.
#[derive(Debug, Clone)]
pub struct EffectOwnership {
    pub owner: String,
    pub last_seen_at: NaiveDateTime,
    pub lifetime_ms: i64,
}

impl EffectOwnership {
    pub fn new(owner: String, now: NaiveDateTime) -> Self {
        Self {
            owner,
            last_seen_at: now,
            lifetime_ms: EFFECT_LIFETIME_MS,
        }
    }

    /// A claim is live while `now - last_seen_at <= lifetime`.
    pub fn is_live(&self, now: NaiveDateTime) -> bool {
        now.signed_duration_since(self.last_seen_at)
            .num_milliseconds()
            <= self.lifetime_ms
    }
}
