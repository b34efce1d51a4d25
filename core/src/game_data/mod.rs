mod breeds;
mod effects;
mod spells;

pub use breeds::class_name_for_breed;
pub use effects::is_denylisted_effect;
pub use spells::{SpellDataError, SpellInfo, SpellTable, is_summon_spell};
