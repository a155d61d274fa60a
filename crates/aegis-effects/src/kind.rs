//! Effect kinds and their categories.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::catalog::{EffectCatalog, EffectConfig};

/// Broad grouping of effect kinds.
///
/// Purely descriptive; mechanics are driven by the catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectCategory {
    /// Periodic damage (poison, burn, bleed)
    DamageOverTime,
    /// Prevents or impairs action (freeze, stun, slow)
    CrowdControl,
    /// Beneficial effect
    Buff,
    /// Harmful non-damaging effect
    Debuff,
}

impl EffectCategory {
    /// Whether effects in this category hurt their owner.
    #[must_use]
    pub const fn is_harmful(self) -> bool {
        !matches!(self, Self::Buff)
    }
}

/// Every status effect the engine knows about.
///
/// The declaration order is the ordinal used to index per-entity storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    /// Stacking damage over time
    Poison,
    /// Short, heavy damage over time
    Burn,
    /// Fast-ticking, deeply stacking damage over time
    Bleed,
    /// Complete stop
    Freeze,
    /// Complete stop, short
    Stun,
    /// Movement speed reduction
    Slow,
    /// Healing over time
    Regen,
    /// Movement speed increase
    Haste,
    /// Damage absorption pool
    Shield,
    /// Outgoing damage increase
    DamageBoost,
    /// Outgoing damage reduction
    Weakness,
    /// Incoming damage increase
    Vulnerability,
}

impl EffectKind {
    /// Number of effect kinds.
    pub const COUNT: usize = 12;

    /// All kinds in ordinal order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Poison,
        Self::Burn,
        Self::Bleed,
        Self::Freeze,
        Self::Stun,
        Self::Slow,
        Self::Regen,
        Self::Haste,
        Self::Shield,
        Self::DamageBoost,
        Self::Weakness,
        Self::Vulnerability,
    ];

    /// Stable ordinal, `0..COUNT`.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Snake-case identifier, as used in scenario files and JSON.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Poison => "poison",
            Self::Burn => "burn",
            Self::Bleed => "bleed",
            Self::Freeze => "freeze",
            Self::Stun => "stun",
            Self::Slow => "slow",
            Self::Regen => "regen",
            Self::Haste => "haste",
            Self::Shield => "shield",
            Self::DamageBoost => "damage_boost",
            Self::Weakness => "weakness",
            Self::Vulnerability => "vulnerability",
        }
    }

    /// Category this kind belongs to.
    #[must_use]
    pub const fn category(self) -> EffectCategory {
        match self {
            Self::Poison | Self::Burn | Self::Bleed => EffectCategory::DamageOverTime,
            Self::Freeze | Self::Stun | Self::Slow => EffectCategory::CrowdControl,
            Self::Regen | Self::Haste | Self::Shield | Self::DamageBoost => EffectCategory::Buff,
            Self::Weakness | Self::Vulnerability => EffectCategory::Debuff,
        }
    }

    /// Whether this kind fully stops its owner.
    #[must_use]
    pub const fn prevents_action(self) -> bool {
        matches!(self, Self::Freeze | Self::Stun)
    }

    /// Catalog entry for this kind.
    #[must_use]
    pub fn config(self) -> &'static EffectConfig {
        EffectCatalog::config(self)
    }
}

impl fmt::Display for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when parsing an unknown effect name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown effect kind: {0:?}")]
pub struct UnknownEffectKind(pub String);

impl FromStr for EffectKind {
    type Err = UnknownEffectKind;

    /// Accepts the snake-case name, case-insensitively, with `-` or `_`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == normalized)
            .ok_or_else(|| UnknownEffectKind(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordinals_match_all() {
        for (i, kind) in EffectKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), i);
        }
    }

    #[test]
    fn test_categories() {
        assert_eq!(EffectKind::Bleed.category(), EffectCategory::DamageOverTime);
        assert_eq!(EffectKind::Slow.category(), EffectCategory::CrowdControl);
        assert_eq!(EffectKind::Shield.category(), EffectCategory::Buff);
        assert_eq!(EffectKind::Vulnerability.category(), EffectCategory::Debuff);
        assert!(!EffectCategory::Buff.is_harmful());
        assert!(EffectCategory::Debuff.is_harmful());
    }

    #[test]
    fn test_only_freeze_and_stun_prevent_action() {
        let stoppers: Vec<_> = EffectKind::ALL
            .into_iter()
            .filter(|k| k.prevents_action())
            .collect();
        assert_eq!(stoppers, vec![EffectKind::Freeze, EffectKind::Stun]);
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("poison".parse::<EffectKind>(), Ok(EffectKind::Poison));
        assert_eq!("Damage-Boost".parse::<EffectKind>(), Ok(EffectKind::DamageBoost));
        assert_eq!(" vulnerability ".parse::<EffectKind>(), Ok(EffectKind::Vulnerability));
        assert!("confusion".parse::<EffectKind>().is_err());
    }

    #[test]
    fn test_serde_names_match_display() {
        for kind in EffectKind::ALL {
            let json = serde_json::to_string(&kind).expect("serialize kind");
            assert_eq!(json, format!("\"{kind}\""));
        }
    }
}
