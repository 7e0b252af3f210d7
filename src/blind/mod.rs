// Motion inference for window coverings
//
// Blinds report only their position (0 = fully open, 100 = fully closed).
// Direction and target are derived from consecutive reports and published
// to the device's subscribers as synthetic `direction` and `target` changes.

use crate::diff::{Change, ChangeList};
use crate::model::{Device, EntityAddress};
use crate::state::EntityHandle;
use crate::subscription::field_in;
use crate::timer::TimerSlot;
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::debug;

pub const POSITION_OPEN: i64 = 0;
pub const POSITION_CLOSED: i64 = 100;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Stopped,
    Opening,
    Closing,
}

/// Observable motion state of one blind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct BlindStatus {
    pub position: i64,
    /// Explicit target, if one was requested
    pub target: Option<i64>,
    pub direction: Direction,
}

impl BlindStatus {
    /// Where the blind is heading: the explicit target, else the end stop
    /// implied by the direction. None when stopped without a target.
    pub fn effective_target(&self) -> Option<i64> {
        self.target.or(match self.direction {
            Direction::Opening => Some(POSITION_OPEN),
            Direction::Closing => Some(POSITION_CLOSED),
            Direction::Stopped => None,
        })
    }
}

#[derive(Clone, Copy, Debug)]
pub struct BlindTimings {
    /// Watchdog armed after the first report or a requested move
    pub warmup: Duration,
    /// Watchdog re-armed on every report while moving
    pub watchdog: Duration,
}

impl Default for BlindTimings {
    fn default() -> Self {
        Self {
            warmup: Duration::from_millis(3000),
            watchdog: Duration::from_millis(1500),
        }
    }
}

#[derive(Default)]
struct BlindState {
    /// Last reported position; None until the first report
    position: Option<i64>,
    target: Option<i64>,
    direction: Direction,
    watchdog: TimerSlot,
    /// Bumped on every arm so a superseded watchdog can tell it is stale
    generation: u64,
}

impl BlindState {
    fn status(&self) -> BlindStatus {
        BlindStatus {
            position: self.position.unwrap_or(POSITION_OPEN),
            target: self.target,
            direction: self.direction,
        }
    }
}

fn push_transition(changes: &mut ChangeList, old: Option<BlindStatus>, new: BlindStatus) {
    let direction = |status: BlindStatus| json!(status.direction);
    let target = |status: BlindStatus| json!(status.effective_target());

    changes.push(Change::synthetic(
        "direction",
        old.map(direction).unwrap_or(Value::Null),
        direction(new),
    ));
    changes.push(Change::synthetic(
        "target",
        old.map(target).unwrap_or(Value::Null),
        target(new),
    ));
}

/// Tracks every blind-capable device.
pub struct BlindTracker {
    blinds: DashMap<EntityAddress, Arc<Mutex<BlindState>>>,
    timings: BlindTimings,
}

impl BlindTracker {
    pub fn new(timings: BlindTimings) -> Self {
        Self {
            blinds: DashMap::new(),
            timings,
        }
    }

    /// Follow a device's position changes.
    ///
    /// If the device already carries a blind entry, its current position is
    /// reported immediately.
    pub fn attach(self: &Arc<Self>, device: &Arc<EntityHandle<Device>>) {
        let tracker = Arc::downgrade(self);
        let handle = Arc::downgrade(device);

        device.subscribe_filtered(vec![field_in(&["position", "blinds"])], move |_| {
            let (Some(tracker), Some(device)) = (tracker.upgrade(), handle.upgrade()) else {
                return;
            };
            let position = device.read().blind_position();
            tracker.report(&device, position);
        });

        let seeded = {
            let state = device.read();
            (!state.blinds.is_empty()).then(|| state.blind_position())
        };
        if let Some(position) = seeded {
            self.report(device, position);
        }

        debug!(address = %device.address(), "Tracking blind motion");
    }

    /// Feed one position report.
    pub fn report(self: &Arc<Self>, device: &Arc<EntityHandle<Device>>, position: i64) {
        let cell = self.cell(device.address());

        let changes = {
            let mut state = cell.lock();
            self.advance(&mut state, device, position)
        };

        device.notify(&changes);
    }

    /// Record a requested destination, e.g. from a set-position command.
    pub fn set_target(self: &Arc<Self>, device: &Arc<EntityHandle<Device>>, position: i64) {
        let cell = self.cell(device.address());

        let changes = {
            let mut state = cell.lock();
            let old = state.status();
            state.target = Some(position.clamp(POSITION_OPEN, POSITION_CLOSED));

            // A blind that never starts moving must not keep the target forever
            if state.direction == Direction::Stopped {
                self.arm(&mut state, device, self.timings.warmup);
            }

            let mut changes = ChangeList::new();
            if old.effective_target() != state.status().effective_target() {
                let new = state.status();
                changes.push(Change::synthetic(
                    "target",
                    json!(old.effective_target()),
                    json!(new.effective_target()),
                ));
            }
            changes
        };

        device.notify(&changes);
    }

    pub fn status(&self, address: &EntityAddress) -> Option<BlindStatus> {
        let cell = self.blinds.get(address).map(|entry| entry.value().clone())?;
        let state = cell.lock();
        Some(state.status())
    }

    pub fn len(&self) -> usize {
        self.blinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blinds.is_empty()
    }

    fn cell(&self, address: EntityAddress) -> Arc<Mutex<BlindState>> {
        self.blinds
            .entry(address)
            .or_insert_with(|| Arc::new(Mutex::new(BlindState::default())))
            .value()
            .clone()
    }

    fn advance(
        self: &Arc<Self>,
        state: &mut BlindState,
        device: &Arc<EntityHandle<Device>>,
        position: i64,
    ) -> ChangeList {
        let mut changes = ChangeList::new();

        // First report only sets the baseline
        let Some(baseline) = state.position else {
            state.position = Some(position);
            state.direction = Direction::Stopped;
            push_transition(&mut changes, None, state.status());
            self.arm(state, device, self.timings.warmup);
            return changes;
        };

        let inferred = if position > baseline {
            Direction::Closing
        } else if position < baseline {
            Direction::Opening
        } else {
            state.direction
        };
        state.position = Some(position);

        if inferred != state.direction {
            // Reversals pass through Stopped
            if state.direction != Direction::Stopped {
                let old = state.status();
                state.direction = Direction::Stopped;
                state.target = None;
                push_transition(&mut changes, Some(old), state.status());
            }

            let old = state.status();
            state.direction = inferred;
            push_transition(&mut changes, Some(old), state.status());
        }

        let reached = state.target == Some(position);
        let at_end_stop = match state.direction {
            Direction::Closing => position >= POSITION_CLOSED,
            Direction::Opening => position <= POSITION_OPEN,
            Direction::Stopped => false,
        };

        if reached || at_end_stop {
            let old = state.status();
            state.direction = Direction::Stopped;
            state.target = None;
            state.watchdog.cancel();
            if old != state.status() {
                push_transition(&mut changes, Some(old), state.status());
            }
            return changes;
        }

        if state.direction != Direction::Stopped {
            self.arm(state, device, self.timings.watchdog);
        }

        changes
    }

    fn arm(self: &Arc<Self>, state: &mut BlindState, device: &Arc<EntityHandle<Device>>, delay: Duration) {
        state.generation += 1;
        let generation = state.generation;
        let tracker: Weak<Self> = Arc::downgrade(self);
        let device = Arc::downgrade(device);

        state.watchdog.reset(delay, async move {
            if let (Some(tracker), Some(device)) = (tracker.upgrade(), device.upgrade()) {
                tracker.expire(&device, generation);
            }
        });
    }

    /// Watchdog fired: no report arrived in time, so the blind has stopped.
    fn expire(&self, device: &EntityHandle<Device>, generation: u64) {
        let Some(cell) = self.blinds.get(&device.address()).map(|entry| entry.value().clone()) else {
            return;
        };

        let changes = {
            let mut state = cell.lock();
            if state.generation != generation {
                return;
            }
            state.watchdog.clear();

            let old = state.status();
            state.direction = Direction::Stopped;
            state.target = None;

            let mut changes = ChangeList::new();
            if old != state.status() {
                debug!(address = %device.address(), position = old.position, "Blind stopped reporting");
                push_transition(&mut changes, Some(old), state.status());
            }
            changes
        };

        device.notify(&changes);
    }
}
