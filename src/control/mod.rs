// Domain setters built on the write batcher
//
// Each setter checks the entity's capability, then queues the mutation. It
// returns whether anything was queued; unsupported operations are logged and
// ignored.

use crate::batch::Batcher;
use crate::blind::BlindTracker;
use crate::model::{calc_dim, ColorTemperature, Device, DeviceCapability, Group, YesNo};
use crate::state::EntityHandle;
use std::sync::Arc;
use tracing::{debug, warn};

fn unsupported(device: &EntityHandle<Device>, operation: &str) -> bool {
    warn!(
        address = %device.address(),
        capability = ?device.capability(),
        operation,
        "Operation not supported by device"
    );
    false
}

/// Switch a light or plug.
pub fn set_on(batcher: &Arc<Batcher>, device: &Arc<EntityHandle<Device>>, on: bool) -> bool {
    match device.capability() {
        Some(DeviceCapability::Light) => {
            batcher.mutate(device, |d| d.light_mut().setting.dimmable.set_on(on));
            true
        }
        Some(DeviceCapability::Plug) => {
            batcher.mutate(device, |d| d.plug_mut().on = Some(YesNo::from(on)));
            true
        }
        _ => unsupported(device, "set_on"),
    }
}

/// Set light brightness in percent.
pub fn set_dim(batcher: &Arc<Batcher>, device: &Arc<EntityHandle<Device>>, percent: u8) -> bool {
    if device.capability() != Some(DeviceCapability::Light) {
        return unsupported(device, "set_dim");
    }

    let dim = calc_dim(percent);
    debug!(address = %device.address(), percent, dim, "Dimming light");
    batcher.mutate(device, |d| d.light_mut().setting.dimmable.dim = Some(dim));
    true
}

pub fn set_name(batcher: &Arc<Batcher>, device: &Arc<EntityHandle<Device>>, name: &str) -> bool {
    let name = name.to_string();
    batcher.mutate(device, move |d| d.base.name = name);
    true
}

/// Select one of the white-spectrum presets.
pub fn set_color_temperature(
    batcher: &Arc<Batcher>,
    device: &Arc<EntityHandle<Device>>,
    preset: ColorTemperature,
) -> bool {
    if device.capability() != Some(DeviceCapability::Light) {
        return unsupported(device, "set_color_temperature");
    }

    batcher.mutate(device, |d| d.light_mut().setting.set_color_temperature(preset));
    true
}

/// Move a blind to `position` (0 open, 100 closed) and remember the target.
pub fn set_blind_position(
    batcher: &Arc<Batcher>,
    blinds: &Arc<BlindTracker>,
    device: &Arc<EntityHandle<Device>>,
    position: i64,
) -> bool {
    if device.capability() != Some(DeviceCapability::WindowCovering) {
        return unsupported(device, "set_blind_position");
    }

    let position = position.clamp(0, 100);
    blinds.set_target(device, position);
    batcher.mutate(device, |d| d.blind_mut().position = Some(position));
    true
}

pub fn set_group_on(batcher: &Arc<Batcher>, group: &Arc<EntityHandle<Group>>, on: bool) -> bool {
    batcher.mutate(group, |g| g.dimmable.set_on(on));
    true
}

pub fn set_group_dim(batcher: &Arc<Batcher>, group: &Arc<EntityHandle<Group>>, percent: u8) -> bool {
    let dim = calc_dim(percent);
    batcher.mutate(group, |g| g.dimmable.dim = Some(dim));
    true
}

pub fn set_group_name(batcher: &Arc<Batcher>, group: &Arc<EntityHandle<Group>>, name: &str) -> bool {
    let name = name.to_string();
    batcher.mutate(group, move |g| g.base.name = name);
    true
}

/// Activate a scene of the group.
pub fn activate_scene(batcher: &Arc<Batcher>, group: &Arc<EntityHandle<Group>>, scene: i64) -> bool {
    batcher.mutate(group, |g| {
        g.dimmable.set_on(true);
        g.scene = Some(scene);
    });
    true
}
