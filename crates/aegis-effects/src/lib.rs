//! # Aegis Effects
//!
//! Status-effect engine for combat entities.
//!
//! This crate provides the per-entity effect layer:
//! - Effect kinds and the fixed effect catalog
//! - The status-effect manager (apply, stack, tick, expire)
//! - Speed and damage modifiers derived from active effects
//! - Shield absorption of incoming damage
//! - Event sinks for damage, heal and status-change events
//! - Mailboxes for cross-entity effect commands
//! - A minimal combatant that owns a manager and applies its ticks

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod catalog;
pub mod combatant;
pub mod events;
mod instance;
pub mod kind;
pub mod mailbox;
pub mod manager;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::catalog::*;
    pub use crate::combatant::*;
    pub use crate::events::*;
    pub use crate::instance::ApplyOutcome;
    pub use crate::kind::*;
    pub use crate::mailbox::*;
    pub use crate::manager::*;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;
    use aegis_common::EntityIdAllocator;

    #[test]
    fn test_manager_per_entity() {
        let mut ids = EntityIdAllocator::new();
        let mut a = StatusEffectManager::new(ids.allocate());
        let b = StatusEffectManager::new(ids.allocate());

        a.apply(EffectKind::Poison, Some(b.owner()), 0);
        assert!(a.has(EffectKind::Poison));
        assert!(!b.has(EffectKind::Poison));
    }

    #[test]
    fn test_manager_is_send_with_send_sink() {
        fn assert_send<T: Send>() {}
        assert_send::<StatusEffectManager>();
        assert_send::<StatusEffectManager<EffectEventSender>>();
        assert_send::<StatusEffectManager<EffectCallbacks>>();
        assert_send::<MailboxSender>();
    }

    #[test]
    fn test_bus_collects_from_many_managers() {
        let bus = EffectEventBus::default();
        let mut ids = EntityIdAllocator::new();
        let mut managers: Vec<_> = (0..3)
            .map(|_| StatusEffectManager::with_sink(ids.allocate(), bus.sender()))
            .collect();

        for m in &mut managers {
            m.apply(EffectKind::Burn, None, 0);
            m.update(500);
        }

        let events = bus.drain();
        assert_eq!(events.len(), 6);
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, EffectEvent::DamageTick { .. }))
                .count(),
            3
        );
    }
}
