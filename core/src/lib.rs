pub mod combat_log;
pub mod context;
pub mod diag;
pub mod encounter;
pub mod game_data;
pub mod signal;

// Re-exports for convenience
pub use combat_log::{LogParser, UnattributedReason};
pub use context::{
    ATTRIBUTION_WINDOW_MS, CombatContext, EFFECT_LIFETIME_MS, EffectOwnership, OwnershipKey,
    RECENT_CASTS_MAX, RecentCast,
};
pub use diag::DiagnosticSink;
pub use encounter::{CombatState, PlayerRecord, Roster};
pub use game_data::{SpellDataError, SpellInfo, SpellTable, class_name_for_breed};
pub use signal::{GameSignal, SignalHandler};
