//! Fixed per-kind effect configuration.
//!
//! The catalog is a compile-time table indexed by [`EffectKind::index`].
//! Its numbers are a balance contract shared with every other consumer of
//! the engine, so they are pinned by tests below.

use aegis_common::Millis;
use serde::Serialize;

use crate::kind::{EffectCategory, EffectKind};

/// Presentation data for an effect, consumed by UI layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EffectDisplay {
    /// Human-readable name
    pub name: &'static str,
    /// Icon key for the renderer's atlas
    pub icon: &'static str,
    /// Tint color (RGB)
    pub color: [u8; 3],
    /// One-line tooltip
    pub description: &'static str,
}

/// Immutable configuration for one effect kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EffectConfig {
    /// Kind this entry describes
    pub kind: EffectKind,
    /// Lifetime in milliseconds from (re)application
    pub duration: Millis,
    /// Per-stack magnitude: damage or heal per tick, fractional speed or
    /// damage change, or absorption amount
    pub intensity: f32,
    /// Upper bound on simultaneous stacks
    pub max_stacks: u32,
    /// Milliseconds between ticks; 0 for effects that never tick
    pub tick_interval: Millis,
    /// Presentation data
    pub display: EffectDisplay,
}

impl EffectConfig {
    /// Whether this effect fires periodic ticks.
    #[must_use]
    pub const fn ticks(&self) -> bool {
        self.tick_interval > 0
    }

    /// Total magnitude at the given stack count.
    #[must_use]
    pub fn magnitude(&self, stacks: u32) -> f32 {
        self.intensity * stacks as f32
    }

    /// Category of the configured kind.
    #[must_use]
    pub const fn category(&self) -> EffectCategory {
        self.kind.category()
    }
}

const fn entry(
    kind: EffectKind,
    duration: Millis,
    intensity: f32,
    max_stacks: u32,
    tick_interval: Millis,
    display: EffectDisplay,
) -> EffectConfig {
    EffectConfig {
        kind,
        duration,
        intensity,
        max_stacks,
        tick_interval,
        display,
    }
}

const fn display(
    name: &'static str,
    icon: &'static str,
    color: [u8; 3],
    description: &'static str,
) -> EffectDisplay {
    EffectDisplay {
        name,
        icon,
        color,
        description,
    }
}

static CATALOG: [EffectConfig; EffectKind::COUNT] = [
    entry(
        EffectKind::Poison,
        5000,
        3.0,
        5,
        500,
        display("Poison", "effect_poison", [0x7c, 0xd6, 0x3a], "Takes damage over time"),
    ),
    entry(
        EffectKind::Burn,
        3000,
        5.0,
        3,
        500,
        display("Burn", "effect_burn", [0xff, 0x6a, 0x1a], "Takes heavy fire damage over time"),
    ),
    entry(
        EffectKind::Bleed,
        4000,
        2.0,
        10,
        300,
        display("Bleed", "effect_bleed", [0xb0, 0x10, 0x20], "Takes rapid damage over time"),
    ),
    entry(
        EffectKind::Freeze,
        2000,
        1.0,
        1,
        0,
        display("Frozen", "effect_freeze", [0x8f, 0xd8, 0xff], "Cannot move or act"),
    ),
    entry(
        EffectKind::Stun,
        1000,
        1.0,
        1,
        0,
        display("Stunned", "effect_stun", [0xff, 0xe0, 0x40], "Cannot move or act"),
    ),
    entry(
        EffectKind::Slow,
        3000,
        0.5,
        3,
        0,
        display("Slowed", "effect_slow", [0x60, 0x80, 0xc0], "Moves slower"),
    ),
    entry(
        EffectKind::Regen,
        5000,
        2.0,
        3,
        500,
        display("Regeneration", "effect_regen", [0x40, 0xe0, 0x80], "Recovers health over time"),
    ),
    entry(
        EffectKind::Haste,
        5000,
        0.5,
        2,
        0,
        display("Haste", "effect_haste", [0xf0, 0xf0, 0x90], "Moves faster"),
    ),
    entry(
        EffectKind::Shield,
        8000,
        50.0,
        5,
        0,
        display("Shield", "effect_shield", [0x70, 0xb0, 0xff], "Absorbs incoming damage"),
    ),
    entry(
        EffectKind::DamageBoost,
        5000,
        0.25,
        4,
        0,
        display("Empowered", "effect_damage_boost", [0xff, 0x90, 0x30], "Deals more damage"),
    ),
    entry(
        EffectKind::Weakness,
        4000,
        0.25,
        3,
        0,
        display("Weakened", "effect_weakness", [0x90, 0x70, 0xa0], "Deals less damage"),
    ),
    entry(
        EffectKind::Vulnerability,
        4000,
        0.25,
        3,
        0,
        display("Vulnerable", "effect_vulnerability", [0xe0, 0x40, 0xa0], "Takes more damage"),
    ),
];

/// Read-only lookup into the process-wide effect table.
#[derive(Debug, Clone, Copy, Default)]
pub struct EffectCatalog;

impl EffectCatalog {
    /// Configuration for `kind`.
    #[must_use]
    pub fn config(kind: EffectKind) -> &'static EffectConfig {
        &CATALOG[kind.index()]
    }

    /// Every entry, in ordinal order.
    pub fn all() -> impl Iterator<Item = &'static EffectConfig> {
        CATALOG.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries_are_indexed_by_kind() {
        for kind in EffectKind::ALL {
            assert_eq!(EffectCatalog::config(kind).kind, kind);
        }
        assert_eq!(EffectCatalog::all().count(), EffectKind::COUNT);
    }

    #[test]
    fn test_table_values() {
        let expected: [(EffectKind, Millis, f32, u32, Millis); EffectKind::COUNT] = [
            (EffectKind::Poison, 5000, 3.0, 5, 500),
            (EffectKind::Burn, 3000, 5.0, 3, 500),
            (EffectKind::Bleed, 4000, 2.0, 10, 300),
            (EffectKind::Freeze, 2000, 1.0, 1, 0),
            (EffectKind::Stun, 1000, 1.0, 1, 0),
            (EffectKind::Slow, 3000, 0.5, 3, 0),
            (EffectKind::Regen, 5000, 2.0, 3, 500),
            (EffectKind::Haste, 5000, 0.5, 2, 0),
            (EffectKind::Shield, 8000, 50.0, 5, 0),
            (EffectKind::DamageBoost, 5000, 0.25, 4, 0),
            (EffectKind::Weakness, 4000, 0.25, 3, 0),
            (EffectKind::Vulnerability, 4000, 0.25, 3, 0),
        ];

        for (kind, duration, intensity, max_stacks, tick_interval) in expected {
            let config = kind.config();
            assert_eq!(config.duration, duration, "{kind} duration");
            assert_eq!(config.intensity, intensity, "{kind} intensity");
            assert_eq!(config.max_stacks, max_stacks, "{kind} max stacks");
            assert_eq!(config.tick_interval, tick_interval, "{kind} tick interval");
        }
    }

    #[test]
    fn test_only_dots_and_regen_tick() {
        let ticking: Vec<_> = EffectCatalog::all()
            .filter(|c| c.ticks())
            .map(|c| c.kind)
            .collect();
        assert_eq!(
            ticking,
            vec![
                EffectKind::Poison,
                EffectKind::Burn,
                EffectKind::Bleed,
                EffectKind::Regen
            ]
        );
    }

    #[test]
    fn test_magnitude_scales_with_stacks() {
        let bleed = EffectKind::Bleed.config();
        assert_eq!(bleed.magnitude(1), 2.0);
        assert_eq!(bleed.magnitude(10), 20.0);
        assert_eq!(EffectKind::Shield.config().magnitude(3), 150.0);
    }
}
