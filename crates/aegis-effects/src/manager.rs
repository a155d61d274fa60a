//! Per-entity status-effect manager.
//!
//! This module provides:
//! - Applying, refreshing, stacking and removing effects
//! - The per-step update: ticking and expiry
//! - Derived speed and damage modifiers
//! - Shield absorption of incoming damage
//! - Read-only snapshots for UI consumers

use aegis_common::{EntityId, Millis, SchemaVersion};
use serde::Serialize;
use tracing::{debug, trace};

use crate::catalog::EffectConfig;
use crate::events::{EffectEvent, EffectSink, RemovalReason};
use crate::instance::{Absorption, ApplyOutcome, EffectInstance};
use crate::kind::{EffectCategory, EffectKind};

/// Lower bound of the speed modifier when the entity is not frozen or stunned.
pub const MIN_SPEED_MODIFIER: f32 = 0.1;

/// Lower bound of the outgoing damage modifier.
pub const MIN_DAMAGE_DEALT_MODIFIER: f32 = 0.1;

/// What one call to [`StatusEffectManager::update`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateSummary {
    /// Damage and heal ticks fired
    pub ticks: u32,
    /// Effects that expired, in ordinal order
    pub expired: Vec<EffectKind>,
}

impl UpdateSummary {
    /// Whether the update changed nothing observable.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.ticks == 0 && self.expired.is_empty()
    }
}

/// Read-only view of one active effect.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActiveEffect {
    /// Effect kind
    pub kind: EffectKind,
    /// Current stack count
    pub stacks: u32,
    /// Milliseconds until expiry
    pub remaining_ms: Millis,
    /// Who applied the effect
    pub source: Option<EntityId>,
    /// Remaining absorption, for shields
    pub absorb_remaining: Option<f32>,
    /// Catalog entry
    pub config: EffectConfig,
}

impl ActiveEffect {
    /// Fraction of the full duration still remaining, `0.0..=1.0`.
    #[must_use]
    pub fn remaining_fraction(&self) -> f32 {
        if self.config.duration == 0 {
            0.0
        } else {
            (self.remaining_ms as f32 / self.config.duration as f32).clamp(0.0, 1.0)
        }
    }
}

/// Everything a UI layer needs to draw one entity's effect icons.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EffectSnapshot {
    /// Layout version of this snapshot
    pub format: SchemaVersion,
    /// Entity the effects belong to
    pub entity: EntityId,
    /// Clock value the snapshot was taken at
    pub taken_at: Millis,
    /// Active effects in ordinal order
    pub effects: Vec<ActiveEffect>,
}

impl EffectSnapshot {
    /// Serializes the snapshot as JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Status effects of one combat entity.
///
/// Storage is a fixed array indexed by [`EffectKind::index`], so there is at
/// most one instance per kind by construction. Events go to the sink `S`;
/// the default is a `Vec` the owner drains after each update.
///
/// A manager belongs to exactly one entity and is driven from the thread that
/// owns that entity. Other entities reach it through
/// [`crate::EffectMailbox`], never directly.
#[derive(Debug)]
pub struct StatusEffectManager<S: EffectSink = Vec<EffectEvent>> {
    owner: EntityId,
    slots: [Option<EffectInstance>; EffectKind::COUNT],
    sink: S,
}

impl StatusEffectManager {
    /// Creates a manager that queues its events for [`Self::drain_events`].
    #[must_use]
    pub fn new(owner: EntityId) -> Self {
        Self::with_sink(owner, Vec::new())
    }

    /// Takes all queued events.
    pub fn drain_events(&mut self) -> Vec<EffectEvent> {
        std::mem::take(&mut self.sink)
    }

    /// Queued events not yet drained.
    #[must_use]
    pub fn pending_events(&self) -> &[EffectEvent] {
        &self.sink
    }
}

impl<S: EffectSink> StatusEffectManager<S> {
    /// Creates a manager that emits events into `sink`.
    pub fn with_sink(owner: EntityId, sink: S) -> Self {
        Self {
            owner,
            slots: std::array::from_fn(|_| None),
            sink,
        }
    }

    /// Entity this manager belongs to.
    #[must_use]
    pub const fn owner(&self) -> EntityId {
        self.owner
    }

    /// The event sink.
    #[must_use]
    pub const fn sink(&self) -> &S {
        &self.sink
    }

    /// The event sink, mutably.
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Consumes the manager, returning its sink.
    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Applies one stack of `kind` at `now`.
    ///
    /// A new effect starts with one stack and emits
    /// [`EffectEvent::StatusAdded`]. An existing effect always restarts its
    /// duration and gains a stack unless already at `max_stacks`.
    pub fn apply(&mut self, kind: EffectKind, source: Option<EntityId>, now: Millis) -> ApplyOutcome {
        let slot = &mut self.slots[kind.index()];

        if let Some(instance) = slot.as_mut() {
            let outcome = instance.refresh(now);
            debug!(
                "{} {:?} on {} ({} stacks)",
                kind,
                outcome,
                self.owner,
                instance.stack_count()
            );
            return outcome;
        }

        *slot = Some(EffectInstance::new(kind, source, now));
        debug!("{} applied to {} at {}", kind, self.owner, now);
        self.sink.emit(EffectEvent::StatusAdded {
            entity: self.owner,
            kind,
            source,
        });
        ApplyOutcome::Applied
    }

    /// Removes `kind` if active. Returns whether anything was removed.
    pub fn remove(&mut self, kind: EffectKind) -> bool {
        self.take(kind, RemovalReason::Removed)
    }

    /// Removes every active effect. Returns how many were removed.
    pub fn clear_all(&mut self) -> usize {
        EffectKind::ALL
            .into_iter()
            .filter(|&kind| self.take(kind, RemovalReason::Cleared))
            .count()
    }

    /// Removes every active effect of `category`. Returns how many were removed.
    pub fn remove_category(&mut self, category: EffectCategory) -> usize {
        EffectKind::ALL
            .into_iter()
            .filter(|kind| kind.category() == category)
            .filter(|&kind| self.take(kind, RemovalReason::Removed))
            .count()
    }

    /// Removes every harmful effect, keeping buffs. Returns how many were
    /// removed.
    pub fn cleanse(&mut self) -> usize {
        EffectKind::ALL
            .into_iter()
            .filter(|kind| kind.category().is_harmful())
            .filter(|&kind| self.take(kind, RemovalReason::Removed))
            .count()
    }

    /// Whether `kind` is active.
    #[must_use]
    pub fn has(&self, kind: EffectKind) -> bool {
        self.slots[kind.index()].is_some()
    }

    /// Stack count of `kind`, 0 when inactive.
    #[must_use]
    pub fn stacks(&self, kind: EffectKind) -> u32 {
        self.slots[kind.index()]
            .as_ref()
            .map_or(0, EffectInstance::stack_count)
    }

    /// Number of active effects.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    /// Whether no effect is active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Remaining shield absorption, 0 without a shield.
    #[must_use]
    pub fn shield_remaining(&self) -> f32 {
        self.slots[EffectKind::Shield.index()]
            .as_ref()
            .map_or(0.0, EffectInstance::absorb_remaining)
    }

    /// Advances every effect to `now`.
    ///
    /// Per effect, expiry is checked first; otherwise at most one tick fires
    /// if a full interval has passed since the last one. Missed intervals are
    /// not made up. Expired effects are removed after the pass.
    ///
    /// `now` should not decrease between calls. If it does, effects simply
    /// don't tick or expire until the clock catches up.
    pub fn update(&mut self, now: Millis) -> UpdateSummary {
        let mut summary = UpdateSummary::default();

        for instance in self.slots.iter_mut().flatten() {
            if instance.is_expired(now) {
                summary.expired.push(instance.kind());
                continue;
            }
            if !instance.tick_due(now) {
                continue;
            }

            let kind = instance.kind();
            let source = instance.source();
            let amount = instance.fire_tick(now);
            let event = match kind.category() {
                EffectCategory::DamageOverTime => EffectEvent::DamageTick {
                    entity: self.owner,
                    kind,
                    amount,
                    source,
                },
                _ if kind == EffectKind::Regen => EffectEvent::HealTick {
                    entity: self.owner,
                    kind,
                    amount,
                    source,
                },
                _ => continue,
            };
            trace!("{} ticked on {} for {}", kind, self.owner, amount);
            self.sink.emit(event);
            summary.ticks += 1;
        }

        for &kind in &summary.expired {
            self.take(kind, RemovalReason::Expired);
        }

        summary
    }

    /// Movement speed multiplier.
    ///
    /// Exactly 0 while frozen or stunned. Otherwise slow and haste compose
    /// multiplicatively and the result never drops below
    /// [`MIN_SPEED_MODIFIER`].
    #[must_use]
    pub fn speed_modifier(&self) -> f32 {
        if !self.can_act() {
            return 0.0;
        }

        let mut modifier = 1.0;
        if let Some(slow) = self.magnitude(EffectKind::Slow) {
            modifier *= 1.0 - slow;
        }
        if let Some(haste) = self.magnitude(EffectKind::Haste) {
            modifier *= 1.0 + haste;
        }
        f32::max(modifier, MIN_SPEED_MODIFIER)
    }

    /// Outgoing damage multiplier, never below [`MIN_DAMAGE_DEALT_MODIFIER`].
    #[must_use]
    pub fn damage_dealt_modifier(&self) -> f32 {
        let mut modifier = 1.0;
        if let Some(boost) = self.magnitude(EffectKind::DamageBoost) {
            modifier *= 1.0 + boost;
        }
        if let Some(weakness) = self.magnitude(EffectKind::Weakness) {
            modifier *= 1.0 - weakness;
        }
        f32::max(modifier, MIN_DAMAGE_DEALT_MODIFIER)
    }

    /// Incoming damage multiplier. Unbounded above.
    #[must_use]
    pub fn damage_taken_modifier(&self) -> f32 {
        match self.magnitude(EffectKind::Vulnerability) {
            Some(vulnerability) => 1.0 + vulnerability,
            None => 1.0,
        }
    }

    /// Resolves an incoming hit and returns the damage that gets through.
    ///
    /// Without a shield, the hit is scaled by
    /// [`Self::damage_taken_modifier`]. With a shield, the pool absorbs as
    /// much as it can; if the hit exceeds the pool the shield breaks and the
    /// unscaled remainder is returned. Negative or NaN amounts count as 0.
    pub fn process_incoming_damage(&mut self, amount: f32) -> f32 {
        let amount = amount.max(0.0);

        let Some(shield) = self.slots[EffectKind::Shield.index()].as_mut() else {
            return amount * self.damage_taken_modifier();
        };

        match shield.absorb(amount) {
            Absorption::Held => 0.0,
            Absorption::Depleted => {
                self.take(EffectKind::Shield, RemovalReason::ShieldDepleted);
                0.0
            },
            Absorption::Broken { overflow } => {
                self.take(EffectKind::Shield, RemovalReason::ShieldBroken);
                overflow
            },
        }
    }

    /// Whether the entity may act, i.e. no action-preventing effect is active.
    #[must_use]
    pub fn can_act(&self) -> bool {
        !EffectKind::ALL
            .into_iter()
            .filter(|kind| kind.prevents_action())
            .any(|kind| self.has(kind))
    }

    /// Read-only copies of every active effect, in ordinal order.
    #[must_use]
    pub fn active_effects(&self, now: Millis) -> Vec<ActiveEffect> {
        self.slots
            .iter()
            .flatten()
            .map(|instance| ActiveEffect {
                kind: instance.kind(),
                stacks: instance.stack_count(),
                remaining_ms: instance.remaining(now),
                source: instance.source(),
                absorb_remaining: (instance.kind() == EffectKind::Shield)
                    .then(|| instance.absorb_remaining()),
                config: *instance.config(),
            })
            .collect()
    }

    /// Snapshot of all active effects for UI consumers.
    #[must_use]
    pub fn snapshot(&self, now: Millis) -> EffectSnapshot {
        EffectSnapshot {
            format: SchemaVersion::EFFECT_SNAPSHOT,
            entity: self.owner,
            taken_at: now,
            effects: self.active_effects(now),
        }
    }

    fn magnitude(&self, kind: EffectKind) -> Option<f32> {
        self.slots[kind.index()]
            .as_ref()
            .map(EffectInstance::magnitude)
    }

    fn take(&mut self, kind: EffectKind, reason: RemovalReason) -> bool {
        if self.slots[kind.index()].take().is_none() {
            return false;
        }

        debug!("{} removed from {} ({:?})", kind, self.owner, reason);
        self.sink.emit(EffectEvent::StatusRemoved {
            entity: self.owner,
            kind,
            reason,
        });
        true
    }
}
