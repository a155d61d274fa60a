//! Cross-entity effect commands.
//!
//! One entity never touches another entity's manager. It sends an
//! [`EffectCommand`] through the target's [`MailboxSender`], and the target
//! applies pending commands on its own thread via [`EffectMailbox::deliver`].

use aegis_common::{EntityId, Millis};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::events::EffectSink;
use crate::kind::EffectKind;
use crate::manager::StatusEffectManager;

/// Default number of commands a mailbox can hold.
pub const DEFAULT_MAILBOX_CAPACITY: usize = 64;

/// A request to change another entity's effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum EffectCommand {
    /// Apply one stack of an effect
    Apply {
        /// Effect to apply
        kind: EffectKind,
        /// Entity applying it
        source: Option<EntityId>,
    },
    /// Remove an effect
    Remove {
        /// Effect to remove
        kind: EffectKind,
    },
    /// Remove every effect
    ClearAll,
    /// Remove every harmful effect
    Cleanse,
}

/// Mailbox delivery errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MailboxError {
    /// The target's mailbox is at capacity
    #[error("mailbox of {0} is full")]
    Full(EntityId),
    /// The target entity no longer exists
    #[error("mailbox of {0} is closed")]
    Disconnected(EntityId),
}

/// Result type for mailbox operations.
pub type MailboxResult<T> = Result<T, MailboxError>;

/// Inbound command queue of one entity.
#[derive(Debug)]
pub struct EffectMailbox {
    owner: EntityId,
    sender: Sender<EffectCommand>,
    receiver: Receiver<EffectCommand>,
    capacity: usize,
}

impl EffectMailbox {
    /// Creates a mailbox for `owner` holding at most `capacity` commands.
    #[must_use]
    pub fn new(owner: EntityId, capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self {
            owner,
            sender,
            receiver,
            capacity,
        }
    }

    /// Entity this mailbox delivers to.
    #[must_use]
    pub const fn owner(&self) -> EntityId {
        self.owner
    }

    /// Maximum number of pending commands.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of commands waiting for delivery.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    /// Creates a handle other entities (and threads) can send through.
    #[must_use]
    pub fn sender(&self) -> MailboxSender {
        MailboxSender {
            target: self.owner,
            sender: self.sender.clone(),
        }
    }

    /// Applies every pending command to `manager` at `now`, in arrival
    /// order. Returns the number of commands applied.
    ///
    /// Must be called from the thread that owns `manager`.
    pub fn deliver<S: EffectSink>(&self, manager: &mut StatusEffectManager<S>, now: Millis) -> usize {
        if manager.owner() != self.owner {
            warn!(
                "Mailbox of {} delivering to manager of {}",
                self.owner,
                manager.owner()
            );
        }

        let mut delivered = 0;
        for command in self.receiver.try_iter() {
            match command {
                EffectCommand::Apply { kind, source } => {
                    manager.apply(kind, source, now);
                },
                EffectCommand::Remove { kind } => {
                    manager.remove(kind);
                },
                EffectCommand::ClearAll => {
                    manager.clear_all();
                },
                EffectCommand::Cleanse => {
                    manager.cleanse();
                },
            }
            delivered += 1;
        }

        if delivered > 0 {
            debug!("Delivered {} effect commands to {}", delivered, self.owner);
        }
        delivered
    }

    /// Drops every pending command. Returns how many were dropped.
    pub fn discard(&self) -> usize {
        let dropped = self.receiver.try_iter().count();
        if dropped > 0 {
            debug!("Discarded {} effect commands for {}", dropped, self.owner);
        }
        dropped
    }
}

/// Cloneable, `Send` handle for posting commands to one entity.
#[derive(Debug, Clone)]
pub struct MailboxSender {
    target: EntityId,
    sender: Sender<EffectCommand>,
}

impl MailboxSender {
    /// Entity the commands go to.
    #[must_use]
    pub const fn target(&self) -> EntityId {
        self.target
    }

    /// Posts a command without blocking.
    pub fn send(&self, command: EffectCommand) -> MailboxResult<()> {
        self.sender.try_send(command).map_err(|e| match e {
            TrySendError::Full(_) => MailboxError::Full(self.target),
            TrySendError::Disconnected(_) => MailboxError::Disconnected(self.target),
        })
    }

    /// Posts an [`EffectCommand::Apply`].
    pub fn apply(&self, kind: EffectKind, source: Option<EntityId>) -> MailboxResult<()> {
        self.send(EffectCommand::Apply { kind, source })
    }

    /// Posts an [`EffectCommand::Remove`].
    pub fn remove(&self, kind: EffectKind) -> MailboxResult<()> {
        self.send(EffectCommand::Remove { kind })
    }
}
