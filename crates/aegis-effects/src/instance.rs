//! Per-entity state of one active effect.

use aegis_common::{time, EntityId, Millis};

use crate::catalog::EffectConfig;
use crate::kind::EffectKind;

/// Result of applying an effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApplyOutcome {
    /// The effect was not active and now is, with one stack
    Applied,
    /// The effect gained a stack and its duration restarted
    Refreshed,
    /// The effect was already at max stacks; only its duration restarted
    CappedRefresh,
}

/// Outcome of routing damage through a shield.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Absorption {
    /// Fully absorbed, pool still has capacity
    Held,
    /// Fully absorbed, pool is now empty
    Depleted,
    /// Pool exhausted; the remainder passes through
    Broken {
        /// Damage left over after the pool
        overflow: f32,
    },
}

/// One active effect on one entity.
///
/// Only the owning manager creates and mutates instances; outside code sees
/// them through [`crate::ActiveEffect`] snapshots.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct EffectInstance {
    kind: EffectKind,
    start_time: Millis,
    duration: Millis,
    stack_count: u32,
    last_tick: Millis,
    source: Option<EntityId>,
    absorb_remaining: f32,
}

impl EffectInstance {
    /// New single-stack instance starting at `now`.
    pub(crate) fn new(kind: EffectKind, source: Option<EntityId>, now: Millis) -> Self {
        let config = kind.config();
        Self {
            kind,
            start_time: now,
            duration: config.duration,
            stack_count: 1,
            last_tick: now,
            source,
            absorb_remaining: if kind == EffectKind::Shield {
                config.intensity
            } else {
                0.0
            },
        }
    }

    pub(crate) const fn kind(&self) -> EffectKind {
        self.kind
    }

    pub(crate) fn config(&self) -> &'static EffectConfig {
        self.kind.config()
    }

    pub(crate) const fn stack_count(&self) -> u32 {
        self.stack_count
    }

    pub(crate) const fn source(&self) -> Option<EntityId> {
        self.source
    }

    pub(crate) const fn absorb_remaining(&self) -> f32 {
        self.absorb_remaining
    }

    /// Restarts the duration and adds a stack if below the cap.
    ///
    /// The original source is kept for attribution.
    pub(crate) fn refresh(&mut self, now: Millis) -> ApplyOutcome {
        let config = self.config();
        self.start_time = now;
        self.duration = config.duration;

        if self.stack_count < config.max_stacks {
            self.stack_count += 1;
            if self.kind == EffectKind::Shield {
                self.absorb_remaining += config.intensity;
            }
            ApplyOutcome::Refreshed
        } else {
            ApplyOutcome::CappedRefresh
        }
    }

    pub(crate) const fn is_expired(&self, now: Millis) -> bool {
        time::elapsed(now, self.start_time) >= self.duration
    }

    pub(crate) const fn remaining(&self, now: Millis) -> Millis {
        time::remaining(now, self.start_time, self.duration)
    }

    /// Whether a periodic tick is owed at `now`.
    pub(crate) fn tick_due(&self, now: Millis) -> bool {
        let interval = self.config().tick_interval;
        interval > 0 && time::elapsed(now, self.last_tick) >= interval
    }

    /// Records a tick at `now` and returns its magnitude.
    pub(crate) fn fire_tick(&mut self, now: Millis) -> f32 {
        self.last_tick = now;
        self.magnitude()
    }

    /// `intensity * stacks`.
    pub(crate) fn magnitude(&self) -> f32 {
        self.config().magnitude(self.stack_count)
    }

    /// Drains `amount` from the absorption pool.
    ///
    /// `amount` must be non-negative. Stacks follow the pool,
    /// `ceil(pool / intensity)`.
    pub(crate) fn absorb(&mut self, amount: f32) -> Absorption {
        let cap = self.absorb_remaining;
        if amount > cap {
            self.absorb_remaining = 0.0;
            return Absorption::Broken {
                overflow: amount - cap,
            };
        }

        self.absorb_remaining = cap - amount;
        let stacks = (self.absorb_remaining / self.config().intensity).ceil() as u32;
        if stacks == 0 {
            Absorption::Depleted
        } else {
            self.stack_count = stacks;
            Absorption::Held
        }
    }
}
