//! Notifications raised by the parser for external collaborators.

/// Fire-and-forget notifications. `process_line` returns the signals the
/// line raised; consumers react without owning parser state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameSignal {
    CombatStarted,
    CombatEnded,
    /// A new participant was first seen joining the fight.
    PlayerAdded { name: String },
    /// A participant from a previous combat was purged during roster
    /// finalization.
    PlayerRemoved { name: String },
    /// First time a participant is recorded as having taken a turn in
    /// the current combat. Drives auto-ordering downstream.
    TurnDetected { name: String },
}

/// Consumer-side hook for routing signals to UI or persistence layers.
pub trait SignalHandler {
    fn handle_signal(&mut self, signal: &GameSignal);
}
