//! UI and mechanic labels that look like effect names but are noise for
//! ownership tracking.

use phf::{Set, phf_set};

static EFFECT_NAME_DENYLIST: Set<&'static str> = phf_set! {
    "Critique",
    "Coup critique",
    "Échec critique",
    "Parade",
    "Esquive",
    "Résiste",
    "Renvoi",
    "Renvoi de sort",
    "Dommages",
    "Soins",
};

pub fn is_denylisted_effect(name: &str) -> bool {
    EFFECT_NAME_DENYLIST.contains(name)
}
