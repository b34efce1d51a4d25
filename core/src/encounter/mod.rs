//! Combat lifecycle state and the participant roster.

mod player;

pub use player::PlayerRecord;

use hashbrown::{HashMap, HashSet};

/// Combat lifecycle. Only `Active` allows effect attribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CombatState {
    #[default]
    Waiting,
    Active,
    Terminated,
}

/// Participant records keyed by case-folded name, plus the
/// pending-removal set driving deferred roster finalization.
///
/// On reset the whole roster is marked pending; join lines for the new
/// combat clear their name. Names still pending when the next
/// attribution-sensitive line arrives are purged then, not eagerly, so a
/// participant who rejoins slightly after the first post-reset game
/// event is not dropped.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    records: HashMap<String, PlayerRecord>,
    pending_removal: HashSet<String>,
}

fn fold(name: &str) -> String {
    name.to_lowercase()
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&PlayerRecord> {
        self.records.get(&fold(name))
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut PlayerRecord> {
        self.records.get_mut(&fold(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.records.contains_key(&fold(name))
    }

    /// Fetches or creates the record for `name`. Returns the record and
    /// whether it was just created.
    pub fn upsert(&mut self, name: &str) -> (&mut PlayerRecord, bool) {
        let mut created = false;
        let record = self.records.entry(fold(name)).or_insert_with(|| {
            created = true;
            PlayerRecord::new(name)
        });
        (record, created)
    }

    // ─── Deferred removal ───────────────────────────────────────────────────

    pub fn mark_all_pending(&mut self) {
        self.pending_removal = self.records.keys().cloned().collect();
    }

    pub fn clear_pending(&mut self, name: &str) {
        self.pending_removal.remove(&fold(name));
    }

    pub fn has_pending(&self) -> bool {
        !self.pending_removal.is_empty()
    }

    /// Purges every record still pending removal. Returns the display
    /// names of the purged participants.
    pub fn finalize_pending(&mut self) -> Vec<String> {
        let mut removed = Vec::new();
        for key in self.pending_removal.drain() {
            if let Some(record) = self.records.remove(&key) {
                removed.push(record.name);
            }
        }
        removed
    }

    pub fn reset_counters(&mut self) {
        for record in self.records.values_mut() {
            record.reset_counters();
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlayerRecord> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
