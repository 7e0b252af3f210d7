// Bridge: owns the mirror, correlator, batcher and blind tracker and routes
// inbound frames between them.

use crate::batch::{BatchStats, Batcher};
use crate::blind::BlindTracker;
use crate::command::{CommandError, Correlator, CorrelatorConfig, Method, Publisher};
use crate::config::BridgeConfig;
use crate::diff::ChangeList;
use crate::dispatch::{Frame, FrameHandler};
use crate::model::{DeviceCapability, Entity, EntityAddress, EntityKind};
use crate::state::{DiscoveryHandler, EntityHandle, EntityStore, NewEntity};
use crate::subscription::SubscriptionId;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Counters exposed by the status API.
#[derive(Clone, Debug, Serialize)]
pub struct BridgeStats {
    pub bridge_id: String,
    pub started_at: DateTime<Utc>,
    pub entities: usize,
    pub devices: usize,
    pub groups: usize,
    pub scenes: usize,
    pub blinds: usize,
    pub pending_requests: usize,
    pub unmatched_replies: u64,
    pub batches: BatchStats,
}

/// Outcome of a full state refresh.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RefreshSummary {
    pub ingested: usize,
    pub failed: usize,
}

impl RefreshSummary {
    fn record(&mut self, ok: bool) {
        if ok {
            self.ingested += 1;
        } else {
            self.failed += 1;
        }
    }
}

pub struct Bridge {
    id: String,
    store: Arc<EntityStore>,
    correlator: Arc<Correlator>,
    batcher: Arc<Batcher>,
    blinds: Arc<BlindTracker>,
    started_at: DateTime<Utc>,
}

impl Bridge {
    pub fn new(publisher: Arc<dyn Publisher>, bridge_id: &str, config: &BridgeConfig) -> Arc<Self> {
        let correlator = Arc::new(Correlator::new(
            publisher,
            CorrelatorConfig {
                command_subject: config.bridge.command_subject.clone(),
                reply_subject: config.bridge.reply_subject(bridge_id),
                timeout: config.timing.request_timeout(),
            },
        ));
        let batcher = Arc::new(Batcher::new(Arc::clone(&correlator), config.timing.batch_window()));
        let blinds = Arc::new(BlindTracker::new(config.timing.blind_timings()));
        let store = Arc::new(EntityStore::new());

        // Window coverings get motion tracking as soon as they appear
        let tracker = Arc::clone(&blinds);
        store.add_discovery_handler(move |entity: &NewEntity| {
            if let NewEntity::Device(device) = entity {
                if device.capability() == Some(DeviceCapability::WindowCovering) {
                    tracker.attach(device);
                }
            }
        });

        info!(
            bridge_id = %bridge_id,
            reply_subject = %correlator.reply_subject(),
            "Bridge initialized"
        );

        Arc::new(Self {
            id: bridge_id.to_string(),
            store,
            correlator,
            batcher,
            blinds,
            started_at: Utc::now(),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn store(&self) -> &Arc<EntityStore> {
        &self.store
    }

    pub fn correlator(&self) -> &Arc<Correlator> {
        &self.correlator
    }

    pub fn batcher(&self) -> &Arc<Batcher> {
        &self.batcher
    }

    pub fn blinds(&self) -> &Arc<BlindTracker> {
        &self.blinds
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Register for new-entity announcements.
    pub fn on_new_entity<H>(&self, handler: H)
    where
        H: DiscoveryHandler + 'static,
    {
        self.store.add_discovery_handler(handler);
    }

    /// Subscribe to a device's changes. Returns None if the device is unknown.
    pub fn subscribe_device<F>(&self, id: i64, callback: F) -> Option<SubscriptionId>
    where
        F: Fn(&ChangeList) + Send + Sync + 'static,
    {
        self.store.device(id).map(|device| device.subscribe(callback))
    }

    /// Subscribe to a group's changes. Returns None if the group is unknown.
    pub fn subscribe_group<F>(&self, id: i64, callback: F) -> Option<SubscriptionId>
    where
        F: Fn(&ChangeList) + Send + Sync + 'static,
    {
        self.store.group(id).map(|group| group.subscribe(callback))
    }

    /// Queue a debounced write against an entity.
    pub fn mutate<T, F>(&self, entity: &Arc<EntityHandle<T>>, setter: F)
    where
        T: Entity,
        F: FnOnce(&mut T),
    {
        self.batcher.mutate(entity, setter);
    }

    /// Send an immediate correlated request.
    pub async fn send(
        &self,
        method: Method,
        url: impl Into<String>,
        payload: Option<Value>,
    ) -> Result<Value, CommandError> {
        self.correlator.send(method, url, payload).await
    }

    fn ingest_push(&self, path: &[String], payload: &[u8]) {
        if payload.is_empty() {
            debug!(path = %path.join("/"), "Skipping empty push");
            return;
        }

        match self.store.ingest_path(path, payload) {
            Ok(Some(outcome)) => {
                debug!(
                    address = %outcome.address,
                    created = outcome.created,
                    changes = outcome.changes.len(),
                    "Applied push"
                );
            }
            Ok(None) => {
                debug!(path = %path.join("/"), "Ignoring collection listing");
            }
            Err(e) => {
                warn!(
                    path = %path.join("/"),
                    error = %e,
                    payload = %String::from_utf8_lossy(payload),
                    "Failed to ingest push"
                );
            }
        }
    }

    /// Fetch the gateway, every device, group, scene and the notification
    /// list, and ingest each as if it had been pushed.
    pub async fn refresh(&self) -> RefreshSummary {
        let mut summary = RefreshSummary::default();

        summary.record(self.fetch(EntityAddress::gateway()).await);

        let devices = self.list(EntityKind::Device.endpoint()).await;
        for ok in join_all(devices.into_iter().map(|id| self.fetch(EntityAddress::device(id)))).await {
            summary.record(ok);
        }

        let groups = self.list(EntityKind::Group.endpoint()).await;
        for ok in join_all(groups.iter().map(|&id| self.fetch(EntityAddress::group(id)))).await {
            summary.record(ok);
        }

        for group in groups {
            let url = format!("{}/{}", EntityKind::Scene.endpoint(), group);
            let scenes = self.list(&url).await;
            let fetches = scenes
                .into_iter()
                .map(|scene| self.fetch(EntityAddress::scene(group, scene)));
            for ok in join_all(fetches).await {
                summary.record(ok);
            }
        }

        summary.record(self.fetch(EntityAddress::notifications()).await);

        info!(
            ingested = summary.ingested,
            failed = summary.failed,
            entities = self.store.len(),
            "State refresh complete"
        );
        summary
    }

    /// GET a collection endpoint and return the listed ids.
    async fn list(&self, url: &str) -> Vec<i64> {
        let payload = match self.correlator.get(url).await {
            Ok(payload) => payload,
            Err(e) => {
                warn!(url = %url, error = %e, "Failed to list collection");
                return Vec::new();
            }
        };

        match serde_json::from_value::<Vec<i64>>(payload) {
            Ok(ids) => ids,
            Err(e) => {
                warn!(url = %url, error = %e, "Unexpected collection listing");
                Vec::new()
            }
        }
    }

    /// GET one entity and ingest the reply. Returns whether it succeeded.
    async fn fetch(&self, address: EntityAddress) -> bool {
        let payload = match self.correlator.get(address.to_string()).await {
            Ok(payload) => payload,
            Err(e) => {
                warn!(address = %address, error = %e, "Failed to fetch entity");
                return false;
            }
        };

        let raw = match serde_json::to_vec(&payload) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(address = %address, error = %e, "Failed to re-encode entity");
                return false;
            }
        };

        match self.store.ingest(address, &raw) {
            Ok(_) => true,
            Err(e) => {
                warn!(address = %address, error = %e, "Failed to ingest fetched entity");
                false
            }
        }
    }

    pub fn stats(&self) -> BridgeStats {
        BridgeStats {
            bridge_id: self.id.clone(),
            started_at: self.started_at,
            entities: self.store.len(),
            devices: self.store.devices().len(),
            groups: self.store.groups().len(),
            scenes: self.store.scenes().len(),
            blinds: self.blinds.len(),
            pending_requests: self.correlator.pending(),
            unmatched_replies: self.correlator.unmatched_replies(),
            batches: self.batcher.stats(),
        }
    }
}

impl FrameHandler for Bridge {
    fn handle_frame(&self, frame: Frame) {
        match frame {
            Frame::Reply { payload } => self.correlator.on_reply(&payload),
            Frame::Push { path, payload } => self.ingest_push(&path, &payload),
        }
    }
}
