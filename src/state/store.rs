use crate::diff::ChangeList;
use crate::model::{
    AddressError, Device, Entity, EntityAddress, EntityKind, Gateway, Group, Notifications, Scene,
};
use crate::state::handle::EntityHandle;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Address(#[from] AddressError),

    #[error("failed to decode payload for {address}: {source}")]
    Decode {
        address: EntityAddress,
        source: serde_json::Error,
    },
}

/// Result of one successful ingestion.
#[derive(Debug)]
pub struct IngestOutcome {
    pub address: EntityAddress,
    /// True when this push created the entity
    pub created: bool,
    pub changes: ChangeList,
}

/// Announcement of an entity seen for the first time.
#[derive(Clone)]
pub enum NewEntity {
    Device(Arc<EntityHandle<Device>>),
    Group(Arc<EntityHandle<Group>>),
    Scene(Arc<EntityHandle<Scene>>),
    Notifications(Arc<EntityHandle<Notifications>>),
    Gateway(Arc<EntityHandle<Gateway>>),
}

impl NewEntity {
    pub fn kind(&self) -> EntityKind {
        self.address().kind
    }

    pub fn address(&self) -> EntityAddress {
        match self {
            NewEntity::Device(h) => h.address(),
            NewEntity::Group(h) => h.address(),
            NewEntity::Scene(h) => h.address(),
            NewEntity::Notifications(h) => h.address(),
            NewEntity::Gateway(h) => h.address(),
        }
    }
}

/// Receives each new entity once, after its first successful ingestion.
pub trait DiscoveryHandler: Send + Sync {
    fn on_new_entity(&self, entity: &NewEntity);
}

impl<F> DiscoveryHandler for F
where
    F: Fn(&NewEntity) + Send + Sync,
{
    fn on_new_entity(&self, entity: &NewEntity) {
        self(entity)
    }
}

/// Entities of one kind keyed by address.
pub struct Table<T: Entity> {
    entries: DashMap<EntityAddress, Arc<EntityHandle<T>>>,
}

impl<T: Entity> Default for Table<T> {
    fn default() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }
}

impl<T: Entity> Table<T> {
    pub fn get(&self, address: &EntityAddress) -> Option<Arc<EntityHandle<T>>> {
        self.entries.get(address).map(|entry| entry.value().clone())
    }

    /// Existing handle, or a zero-valued one. The flag is true if created.
    fn get_or_create(&self, address: EntityAddress) -> (Arc<EntityHandle<T>>, bool) {
        match self.entries.entry(address) {
            Entry::Occupied(entry) => (entry.get().clone(), false),
            Entry::Vacant(entry) => {
                let handle = Arc::new(EntityHandle::new(address));
                entry.insert(handle.clone());
                (handle, true)
            }
        }
    }

    /// All handles ordered by address.
    pub fn all(&self) -> Vec<Arc<EntityHandle<T>>> {
        let mut handles: Vec<_> = self.entries.iter().map(|e| e.value().clone()).collect();
        handles.sort_by_key(|h| h.address());
        handles
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Canonical mirror of every gateway entity.
#[derive(Default)]
pub struct EntityStore {
    devices: Table<Device>,
    groups: Table<Group>,
    scenes: Table<Scene>,
    notifications: Table<Notifications>,
    gateway: Table<Gateway>,
    discovery: RwLock<Vec<Arc<dyn DiscoveryHandler>>>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_discovery_handler<H>(&self, handler: H)
    where
        H: DiscoveryHandler + 'static,
    {
        self.discovery.write().push(Arc::new(handler));
    }

    /// Ingest a push received on a split topic path.
    ///
    /// Collection listings are accepted and yield `Ok(None)`.
    pub fn ingest_path<S: AsRef<str>>(
        &self,
        path: &[S],
        raw: &[u8],
    ) -> Result<Option<IngestOutcome>, IngestError> {
        match EntityAddress::parse(path)? {
            Some(address) => self.ingest(address, raw).map(Some),
            None => Ok(None),
        }
    }

    /// Decode `raw` as the address's entity type and diff it into the mirror.
    pub fn ingest(&self, address: EntityAddress, raw: &[u8]) -> Result<IngestOutcome, IngestError> {
        match address.kind {
            EntityKind::Device => self.ingest_into(&self.devices, address, raw, NewEntity::Device),
            EntityKind::Group => self.ingest_into(&self.groups, address, raw, NewEntity::Group),
            EntityKind::Scene => self.ingest_into(&self.scenes, address, raw, NewEntity::Scene),
            EntityKind::Notification => {
                self.ingest_into(&self.notifications, address, raw, NewEntity::Notifications)
            }
            EntityKind::Gateway => self.ingest_into(&self.gateway, address, raw, NewEntity::Gateway),
        }
    }

    fn ingest_into<T: Entity>(
        &self,
        table: &Table<T>,
        address: EntityAddress,
        raw: &[u8],
        announce: fn(Arc<EntityHandle<T>>) -> NewEntity,
    ) -> Result<IngestOutcome, IngestError> {
        // Decode before touching the table so a bad payload never creates an entity
        let snapshot: T = serde_json::from_slice(raw)
            .map_err(|source| IngestError::Decode { address, source })?;

        let (entity, created) = table.get_or_create(address);
        let changes = entity.apply(&snapshot);

        debug!(
            address = %address,
            changes = changes.len(),
            "Ingested entity snapshot"
        );

        if created {
            info!(address = %address, kind = %address.kind, "Discovered new entity");
            self.announce(&announce(entity));
        }

        Ok(IngestOutcome {
            address,
            created,
            changes,
        })
    }

    fn announce(&self, entity: &NewEntity) {
        let handlers: Vec<Arc<dyn DiscoveryHandler>> = self.discovery.read().clone();
        for handler in handlers {
            handler.on_new_entity(entity);
        }
    }

    pub fn device(&self, id: i64) -> Option<Arc<EntityHandle<Device>>> {
        self.devices.get(&EntityAddress::device(id))
    }

    pub fn group(&self, id: i64) -> Option<Arc<EntityHandle<Group>>> {
        self.groups.get(&EntityAddress::group(id))
    }

    pub fn scene(&self, group: i64, scene: i64) -> Option<Arc<EntityHandle<Scene>>> {
        self.scenes.get(&EntityAddress::scene(group, scene))
    }

    pub fn gateway(&self) -> Option<Arc<EntityHandle<Gateway>>> {
        self.gateway.get(&EntityAddress::gateway())
    }

    pub fn notifications(&self) -> Option<Arc<EntityHandle<Notifications>>> {
        self.notifications.get(&EntityAddress::notifications())
    }

    pub fn devices(&self) -> Vec<Arc<EntityHandle<Device>>> {
        self.devices.all()
    }

    pub fn groups(&self) -> Vec<Arc<EntityHandle<Group>>> {
        self.groups.all()
    }

    pub fn scenes(&self) -> Vec<Arc<EntityHandle<Scene>>> {
        self.scenes.all()
    }

    /// Scenes stored under one group.
    pub fn scenes_of(&self, group: i64) -> Vec<Arc<EntityHandle<Scene>>> {
        self.scenes
            .all()
            .into_iter()
            .filter(|scene| scene.id() == group)
            .collect()
    }

    /// Total number of mirrored entities.
    pub fn len(&self) -> usize {
        self.devices.len()
            + self.groups.len()
            + self.scenes.len()
            + self.notifications.len()
            + self.gateway.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
