//! Effect events and the sinks that receive them.
//!
//! A manager is handed its sink at construction and emits owned
//! [`EffectEvent`]s into it synchronously. Sinks never see the manager, so a
//! consumer cannot re-enter it from inside an event.

use aegis_common::EntityId;
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

use crate::kind::EffectKind;

/// Why an effect left an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalReason {
    /// Duration ran out during `update`
    Expired,
    /// Removed explicitly (dispel, cleanse)
    Removed,
    /// Removed by `clear_all` (death, despawn)
    Cleared,
    /// Shield pool absorbed exactly its remaining capacity
    ShieldDepleted,
    /// Shield pool was exceeded and the remainder passed through
    ShieldBroken,
}

/// Something observable that happened to an entity's effects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EffectEvent {
    /// A damage-over-time effect ticked
    DamageTick {
        /// Entity taking the damage
        entity: EntityId,
        /// Effect that ticked
        kind: EffectKind,
        /// `intensity * stacks`
        amount: f32,
        /// Who applied the effect
        source: Option<EntityId>,
    },
    /// A healing effect ticked
    HealTick {
        /// Entity being healed
        entity: EntityId,
        /// Effect that ticked
        kind: EffectKind,
        /// `intensity * stacks`
        amount: f32,
        /// Who applied the effect
        source: Option<EntityId>,
    },
    /// An effect became active
    StatusAdded {
        /// Owner of the effect
        entity: EntityId,
        /// Effect that was added
        kind: EffectKind,
        /// Who applied the effect
        source: Option<EntityId>,
    },
    /// An effect stopped being active
    StatusRemoved {
        /// Owner of the effect
        entity: EntityId,
        /// Effect that was removed
        kind: EffectKind,
        /// Why it was removed
        reason: RemovalReason,
    },
}

impl EffectEvent {
    /// Entity the event concerns.
    #[must_use]
    pub const fn entity(&self) -> EntityId {
        match self {
            Self::DamageTick { entity, .. }
            | Self::HealTick { entity, .. }
            | Self::StatusAdded { entity, .. }
            | Self::StatusRemoved { entity, .. } => *entity,
        }
    }

    /// Effect the event concerns.
    #[must_use]
    pub const fn kind(&self) -> EffectKind {
        match self {
            Self::DamageTick { kind, .. }
            | Self::HealTick { kind, .. }
            | Self::StatusAdded { kind, .. }
            | Self::StatusRemoved { kind, .. } => *kind,
        }
    }
}

/// Receiver of effect events.
pub trait EffectSink {
    /// Accepts one event.
    fn emit(&mut self, event: EffectEvent);
}

/// Queue drained by the owning entity after each update.
impl EffectSink for Vec<EffectEvent> {
    fn emit(&mut self, event: EffectEvent) {
        self.push(event);
    }
}

impl<S: EffectSink + ?Sized> EffectSink for &mut S {
    fn emit(&mut self, event: EffectEvent) {
        (**self).emit(event);
    }
}

impl<S: EffectSink + ?Sized> EffectSink for Box<S> {
    fn emit(&mut self, event: EffectEvent) {
        (**self).emit(event);
    }
}

/// Sink that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardEvents;

impl EffectSink for DiscardEvents {
    fn emit(&mut self, _event: EffectEvent) {}
}

/// Change reported to the status callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusChange {
    /// Effect became active
    Added,
    /// Effect stopped being active
    Removed(RemovalReason),
}

type AmountCallback = Box<dyn FnMut(EffectKind, f32) + Send>;
type StatusCallback = Box<dyn FnMut(EffectKind, StatusChange) + Send>;

/// Sink that fans events out to up to three callbacks.
///
/// The callbacks are fixed when the sink is built and the sink is moved into
/// the manager, so they cannot reach back into it.
#[derive(Default)]
pub struct EffectCallbacks {
    on_damage: Option<AmountCallback>,
    on_heal: Option<AmountCallback>,
    on_status_change: Option<StatusCallback>,
}

impl EffectCallbacks {
    /// Creates a sink with no callbacks.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Called for every damage tick with the effect kind and amount.
    #[must_use]
    pub fn on_damage(mut self, f: impl FnMut(EffectKind, f32) + Send + 'static) -> Self {
        self.on_damage = Some(Box::new(f));
        self
    }

    /// Called for every heal tick with the effect kind and amount.
    #[must_use]
    pub fn on_heal(mut self, f: impl FnMut(EffectKind, f32) + Send + 'static) -> Self {
        self.on_heal = Some(Box::new(f));
        self
    }

    /// Called whenever an effect is added or removed.
    #[must_use]
    pub fn on_status_change(
        mut self,
        f: impl FnMut(EffectKind, StatusChange) + Send + 'static,
    ) -> Self {
        self.on_status_change = Some(Box::new(f));
        self
    }
}

impl fmt::Debug for EffectCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectCallbacks")
            .field("on_damage", &self.on_damage.is_some())
            .field("on_heal", &self.on_heal.is_some())
            .field("on_status_change", &self.on_status_change.is_some())
            .finish()
    }
}

impl EffectSink for EffectCallbacks {
    fn emit(&mut self, event: EffectEvent) {
        match event {
            EffectEvent::DamageTick { kind, amount, .. } => {
                if let Some(cb) = self.on_damage.as_mut() {
                    cb(kind, amount);
                }
            },
            EffectEvent::HealTick { kind, amount, .. } => {
                if let Some(cb) = self.on_heal.as_mut() {
                    cb(kind, amount);
                }
            },
            EffectEvent::StatusAdded { kind, .. } => {
                if let Some(cb) = self.on_status_change.as_mut() {
                    cb(kind, StatusChange::Added);
                }
            },
            EffectEvent::StatusRemoved { kind, reason, .. } => {
                if let Some(cb) = self.on_status_change.as_mut() {
                    cb(kind, StatusChange::Removed(reason));
                }
            },
        }
    }
}

/// Bounded channel for collecting effect events from many entities.
///
/// Publishing never blocks; when the channel is full the event is dropped.
#[derive(Debug)]
pub struct EffectEventBus {
    sender: Sender<EffectEvent>,
    receiver: Receiver<EffectEvent>,
    capacity: usize,
}

impl Default for EffectEventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl EffectEventBus {
    /// Creates a bus with the given capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self {
            sender,
            receiver,
            capacity,
        }
    }

    /// Publishes an event, dropping it if the bus is full.
    pub fn publish(&self, event: EffectEvent) {
        try_publish(&self.sender, event);
    }

    /// Drains all pending events.
    pub fn drain(&self) -> Vec<EffectEvent> {
        self.receiver.try_iter().collect()
    }

    /// Number of pending events.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    /// Channel capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Creates a sink that publishes into this bus.
    ///
    /// The sender is `Send`, so it can be handed to a manager living on a
    /// worker thread.
    #[must_use]
    pub fn sender(&self) -> EffectEventSender {
        EffectEventSender {
            sender: self.sender.clone(),
        }
    }
}

impl EffectSink for EffectEventBus {
    fn emit(&mut self, event: EffectEvent) {
        self.publish(event);
    }
}

/// Publishing handle for an [`EffectEventBus`].
#[derive(Debug, Clone)]
pub struct EffectEventSender {
    sender: Sender<EffectEvent>,
}

impl EffectSink for EffectEventSender {
    fn emit(&mut self, event: EffectEvent) {
        try_publish(&self.sender, event);
    }
}

fn try_publish(sender: &Sender<EffectEvent>, event: EffectEvent) {
    match sender.try_send(event) {
        Ok(()) => {},
        Err(TrySendError::Full(event)) => {
            warn!("Effect event bus full, dropping {:?} for {}", event.kind(), event.entity());
        },
        // Bus dropped; nobody is listening.
        Err(TrySendError::Disconnected(_)) => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn added(kind: EffectKind) -> EffectEvent {
        EffectEvent::StatusAdded {
            entity: EntityId::from_raw(1),
            kind,
            source: None,
        }
    }

    #[test]
    fn test_event_accessors() {
        let event = EffectEvent::DamageTick {
            entity: EntityId::from_raw(3),
            kind: EffectKind::Burn,
            amount: 5.0,
            source: None,
        };
        assert_eq!(event.entity(), EntityId::from_raw(3));
        assert_eq!(event.kind(), EffectKind::Burn);
    }

    #[test]
    fn test_vec_sink_collects() {
        let mut sink: Vec<EffectEvent> = Vec::new();
        sink.emit(added(EffectKind::Poison));
        (&mut sink).emit(added(EffectKind::Burn));
        assert_eq!(sink.len(), 2);
    }

    #[test]
    fn test_bus_drops_when_full() {
        let bus = EffectEventBus::new(2);
        let mut sender = bus.sender();
        sender.emit(added(EffectKind::Poison));
        sender.emit(added(EffectKind::Burn));
        sender.emit(added(EffectKind::Bleed));

        assert_eq!(bus.pending_count(), 2);
        let drained = bus.drain();
        assert_eq!(drained, vec![added(EffectKind::Poison), added(EffectKind::Burn)]);
        assert_eq!(bus.pending_count(), 0);
    }

    #[test]
    fn test_callbacks_receive_typed_events() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let damage_log = Arc::clone(&log);
        let status_log = Arc::clone(&log);

        let mut sink = EffectCallbacks::new()
            .on_damage(move |kind, amount| {
                damage_log
                    .lock()
                    .expect("lock")
                    .push(format!("damage {kind} {amount}"));
            })
            .on_status_change(move |kind, change| {
                status_log
                    .lock()
                    .expect("lock")
                    .push(format!("status {kind} {change:?}"));
            });

        sink.emit(added(EffectKind::Poison));
        sink.emit(EffectEvent::DamageTick {
            entity: EntityId::from_raw(1),
            kind: EffectKind::Poison,
            amount: 3.0,
            source: None,
        });
        // No heal callback registered; ignored.
        sink.emit(EffectEvent::HealTick {
            entity: EntityId::from_raw(1),
            kind: EffectKind::Regen,
            amount: 2.0,
            source: None,
        });
        sink.emit(EffectEvent::StatusRemoved {
            entity: EntityId::from_raw(1),
            kind: EffectKind::Poison,
            reason: RemovalReason::Expired,
        });

        let log = log.lock().expect("lock");
        assert_eq!(
            *log,
            vec![
                "status poison Added".to_string(),
                "damage poison 3".to_string(),
                "status poison Removed(Expired)".to_string(),
            ]
        );
    }

    #[test]
    fn test_event_json_shape() {
        let event = EffectEvent::StatusRemoved {
            entity: EntityId::from_raw(9),
            kind: EffectKind::DamageBoost,
            reason: RemovalReason::ShieldBroken,
        };
        let json = serde_json::to_value(&event).expect("serialize event");
        assert_eq!(json["type"], "status_removed");
        assert_eq!(json["entity"], 9);
        assert_eq!(json["kind"], "damage_boost");
        assert_eq!(json["reason"], "shield_broken");
    }
}
