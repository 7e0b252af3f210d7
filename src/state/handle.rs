use crate::diff::{self, ChangeList};
use crate::model::{DeviceCapability, Entity, EntityAddress};
use crate::subscription::{ChangeFilter, Observers, SubscriptionId};
use parking_lot::{Mutex, RwLock, RwLockReadGuard};
use std::sync::OnceLock;

/// One canonical entity plus everything attached to it.
///
/// Handles are created on the first successful push for an address and are
/// never replaced, so subscribers may hold an `Arc` for the process lifetime.
pub struct EntityHandle<T: Entity> {
    address: EntityAddress,

    /// Canonical snapshot, mutated in place by the differ
    state: RwLock<T>,

    /// Serializes ingestion (diff + notify) for this entity
    ingest: Mutex<()>,

    /// Shadow of fields touched since the open write batch started
    pub(crate) pending: Mutex<Option<T>>,

    observers: Observers,

    capability: OnceLock<DeviceCapability>,
}

impl<T: Entity> EntityHandle<T> {
    pub(crate) fn new(address: EntityAddress) -> Self {
        Self {
            address,
            state: RwLock::new(T::default()),
            ingest: Mutex::new(()),
            pending: Mutex::new(None),
            observers: Observers::new(),
            capability: OnceLock::new(),
        }
    }

    pub fn address(&self) -> EntityAddress {
        self.address
    }

    pub fn id(&self) -> i64 {
        self.address.id
    }

    /// Borrow the canonical state. Do not hold the guard across calls that
    /// may ingest into this entity.
    pub fn read(&self) -> RwLockReadGuard<'_, T> {
        self.state.read()
    }

    pub fn snapshot(&self) -> T {
        self.state.read().clone()
    }

    /// Capability chosen from the first snapshot, if the kind has one.
    pub fn capability(&self) -> Option<DeviceCapability> {
        self.capability.get().copied()
    }

    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&ChangeList) + Send + Sync + 'static,
    {
        self.observers.subscribe(callback)
    }

    pub fn subscribe_filtered<F>(&self, filters: Vec<ChangeFilter>, callback: F) -> SubscriptionId
    where
        F: Fn(&ChangeList) + Send + Sync + 'static,
    {
        self.observers.subscribe_filtered(filters, callback)
    }

    /// Deliver changes that did not come from a snapshot (derived state).
    pub fn notify(&self, changes: &ChangeList) {
        self.observers.notify(changes);
    }

    /// Whether a write batch is currently open.
    pub fn has_pending(&self) -> bool {
        self.pending.lock().is_some()
    }

    /// Diff `snapshot` into the canonical state and notify subscribers.
    pub(crate) fn apply(&self, snapshot: &T) -> ChangeList {
        let _serial = self.ingest.lock();

        let changes = {
            let mut state = self.state.write();
            let changes = diff::diff(&mut *state, snapshot);

            if self.capability.get().is_none() {
                if let Some(capability) = state.capability() {
                    let _ = self.capability.set(capability);
                }
            }
            changes
        };

        // Subscribers run without the state lock so they can read the entity
        self.observers.notify(&changes);
        changes
    }
}
