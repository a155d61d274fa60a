//! Minimal combat entity that owns a status-effect manager.
//!
//! A [`Combatant`] is the owning side of the event queue: each step it
//! delivers mailbox commands, updates its effects, then drains the queued
//! events and applies damage and heal ticks to its own health.

use aegis_common::{EntityId, Millis};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::events::EffectEvent;
use crate::instance::ApplyOutcome;
use crate::kind::EffectKind;
use crate::mailbox::{EffectMailbox, MailboxSender, DEFAULT_MAILBOX_CAPACITY};
use crate::manager::{StatusEffectManager, UpdateSummary};

/// Base attributes of a combatant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatantStats {
    /// Maximum (and starting) health
    pub max_health: f32,
    /// Movement speed before modifiers
    pub base_speed: f32,
}

impl Default for CombatantStats {
    fn default() -> Self {
        Self {
            max_health: 100.0,
            base_speed: 1.0,
        }
    }
}

/// What happened to a combatant during one [`Combatant::tick`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// Mailbox commands applied before the update
    pub commands: usize,
    /// Result of the effect update
    pub update: UpdateSummary,
    /// Damage taken from damage-over-time ticks
    pub damage_taken: f32,
    /// Health actually restored by heal ticks
    pub healed: f32,
    /// Whether the combatant died during this tick
    pub died: bool,
    /// Every effect event drained this tick, in emission order
    pub events: Vec<EffectEvent>,
}

/// A combat entity: health, speed and its status effects.
#[derive(Debug)]
pub struct Combatant {
    id: EntityId,
    health: f32,
    stats: CombatantStats,
    effects: StatusEffectManager,
    mailbox: EffectMailbox,
}

impl Combatant {
    /// Creates a combatant at full health.
    #[must_use]
    pub fn new(id: EntityId, stats: CombatantStats) -> Self {
        Self {
            id,
            health: stats.max_health,
            stats,
            effects: StatusEffectManager::new(id),
            mailbox: EffectMailbox::new(id, DEFAULT_MAILBOX_CAPACITY),
        }
    }

    /// Entity identifier.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Current health.
    #[must_use]
    pub const fn health(&self) -> f32 {
        self.health
    }

    /// Base attributes.
    #[must_use]
    pub const fn stats(&self) -> &CombatantStats {
        &self.stats
    }

    /// Whether health has reached 0.
    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.health <= 0.0
    }

    /// Health as a fraction of maximum (0.0 to 1.0).
    #[must_use]
    pub fn health_percent(&self) -> f32 {
        if self.stats.max_health <= 0.0 {
            0.0
        } else {
            (self.health / self.stats.max_health).clamp(0.0, 1.0)
        }
    }

    /// Status effects, read-only.
    #[must_use]
    pub const fn effects(&self) -> &StatusEffectManager {
        &self.effects
    }

    /// Status effects, for direct application by this entity's own code.
    pub fn effects_mut(&mut self) -> &mut StatusEffectManager {
        &mut self.effects
    }

    /// Handle other entities use to post effect commands here.
    #[must_use]
    pub fn mailbox(&self) -> MailboxSender {
        self.mailbox.sender()
    }

    /// Applies an effect directly. Dead combatants take no new effects.
    pub fn apply_effect(
        &mut self,
        kind: EffectKind,
        source: Option<EntityId>,
        now: Millis,
    ) -> Option<ApplyOutcome> {
        if self.is_dead() {
            return None;
        }
        Some(self.effects.apply(kind, source, now))
    }

    /// Advances this combatant to `now`.
    pub fn tick(&mut self, now: Millis) -> TickReport {
        let mut report = TickReport::default();
        if self.is_dead() {
            self.mailbox.discard();
            report.events = self.effects.drain_events();
            return report;
        }

        report.commands = self.mailbox.deliver(&mut self.effects, now);
        report.update = self.effects.update(now);

        for event in self.effects.drain_events() {
            match event {
                EffectEvent::DamageTick { amount, .. } => {
                    self.health -= amount;
                    report.damage_taken += amount;
                },
                EffectEvent::HealTick { amount, .. } => {
                    let before = self.health;
                    if before > 0.0 {
                        self.health = (self.health + amount).min(self.stats.max_health);
                        report.healed += self.health - before;
                    }
                },
                EffectEvent::StatusAdded { .. } | EffectEvent::StatusRemoved { .. } => {},
            }
            report.events.push(event);
        }

        if self.check_death() {
            report.died = true;
            report.events.extend(self.effects.drain_events());
        }
        report
    }

    /// Resolves an incoming hit through shields and vulnerability.
    ///
    /// Returns the damage actually subtracted from health.
    pub fn take_hit(&mut self, amount: f32) -> f32 {
        if self.is_dead() {
            return 0.0;
        }
        let dealt = self.effects.process_incoming_damage(amount);
        self.health -= dealt;
        self.check_death();
        dealt
    }

    /// Scales outgoing damage by this combatant's damage modifier.
    #[must_use]
    pub fn outgoing_damage(&self, base: f32) -> f32 {
        base * self.effects.damage_dealt_modifier()
    }

    /// Current movement speed.
    #[must_use]
    pub fn move_speed(&self) -> f32 {
        self.stats.base_speed * self.effects.speed_modifier()
    }

    /// Whether the combatant is alive and not frozen or stunned.
    #[must_use]
    pub fn can_act(&self) -> bool {
        !self.is_dead() && self.effects.can_act()
    }

    /// Takes effect events queued outside of [`Self::tick`] (shield breaks,
    /// direct applications).
    pub fn drain_events(&mut self) -> Vec<EffectEvent> {
        self.effects.drain_events()
    }

    fn check_death(&mut self) -> bool {
        if self.health > 0.0 {
            return false;
        }
        self.health = 0.0;
        let cleared = self.effects.clear_all();
        debug!("{} died, cleared {} effects", self.id, cleared);
        true
    }
}
