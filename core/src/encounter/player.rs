//! Per-participant statistics record.

/// Counters and identity for one tracked participant.
///
/// The case-insensitive name is the identity key; counters are
/// non-negative and only ever grow within one combat. They are zeroed
/// exclusively by an explicit combat reset.
#[derive(Debug, Clone, Default)]
pub struct PlayerRecord {
    pub name: String,
    /// Raw class code from the join line.
    pub breed: i32,
    /// Resolved display class, from the breed table or the first known
    /// spell the participant is seen casting.
    pub class_name: Option<String>,
    /// Numeric id assigned by the game client.
    pub player_id: i64,

    pub damage_dealt: i64,
    pub damage_taken: i64,
    pub healing_done: i64,
    pub shield_given: i64,
    pub damage_by_summon: i64,
    pub number_of_turns: u32,
    /// Resets to zero at every new turn.
    pub damage_this_turn: i64,

    // Presentation hints, never written by classification.
    pub manual_order: Option<u32>,
    pub is_first: bool,
}

impl PlayerRecord {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Damage credited to this participant's own action.
    pub fn credit_damage_dealt(&mut self, amount: i64) {
        self.damage_dealt += amount;
        self.damage_this_turn += amount;
    }

    /// Starts a new turn: bumps the turn count and clears the per-turn
    /// damage tally.
    pub fn begin_turn(&mut self) {
        self.number_of_turns += 1;
        self.damage_this_turn = 0;
    }

    pub fn reset_counters(&mut self) {
        self.damage_dealt = 0;
        self.damage_taken = 0;
        self.healing_done = 0;
        self.shield_given = 0;
        self.damage_by_summon = 0;
        self.number_of_turns = 0;
        self.damage_this_turn = 0;
    }
}
