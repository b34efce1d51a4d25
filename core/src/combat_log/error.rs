//! Attribution failure taxonomy.

/// Why a line that matched a combat-effect shape could not be credited.
/// The `*Shape` variants mean the line itself failed to decompose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnattributedReason {
    DamageTargetUnknown,
    DamageOwnerUnknown,
    DamageShape,
    HealingTargetUnknown,
    HealingShape,
    ShieldOwnerUnknown,
    ShieldShape,
}

impl UnattributedReason {
    pub fn as_str(self) -> &'static str {
        match self {
            UnattributedReason::DamageTargetUnknown => "Damage-TargetUnknown",
            UnattributedReason::DamageOwnerUnknown => "Damage-OwnerUnknown",
            UnattributedReason::DamageShape => "Damage-Regex",
            UnattributedReason::HealingTargetUnknown => "Healing-TargetUnknown",
            UnattributedReason::HealingShape => "Healing-Regex",
            UnattributedReason::ShieldOwnerUnknown => "Shield-OwnerUnknown",
            UnattributedReason::ShieldShape => "Shield-Regex",
        }
    }
}

impl std::fmt::Display for UnattributedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
