use super::address::EntityKind;
use super::light::{Dimmable, Light};
use super::{is_zero, nullable_elements, BaseInfo, DeviceType, Entity, YesNo};
use crate::diff::diff_schema;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Wall socket entry of a device (key 3312).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Plug {
    #[serde(flatten)]
    pub base: BaseInfo,

    #[serde(rename = "5850", default, skip_serializing_if = "Option::is_none")]
    pub on: Option<YesNo>,
}

diff_schema!(Plug {
    flatten base => "base",
    scalar on => "on",
});

impl Plug {
    pub fn is_on(&self) -> bool {
        self.on.is_some_and(|on| on.is_yes())
    }
}

/// Window covering entry of a device (key 15015).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Blind {
    #[serde(flatten)]
    pub base: BaseInfo,

    /// 0 is fully open, 100 fully closed. Reported as a float on the wire.
    #[serde(
        rename = "5536",
        default,
        deserialize_with = "position_from_float",
        skip_serializing_if = "Option::is_none"
    )]
    pub position: Option<i64>,
}

diff_schema!(Blind {
    flatten base => "base",
    scalar position => "position",
});

fn position_from_float<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<f64> = Option::deserialize(deserializer)?;
    Ok(raw.map(|p| p as i64))
}

/// Sensor or switch entry (keys 3300 and 15009).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Control {
    #[serde(flatten)]
    pub base: BaseInfo,
}

diff_schema!(Control {
    flatten base => "base",
});

/// Static device information (key 3).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceInfo {
    #[serde(rename = "0", default, skip_serializing_if = "is_zero")]
    pub manufacturer: String,

    #[serde(rename = "1", default, skip_serializing_if = "is_zero")]
    pub model: String,

    #[serde(rename = "2", default, skip_serializing_if = "is_zero")]
    pub serial_number: String,

    #[serde(rename = "3", default, skip_serializing_if = "is_zero")]
    pub firmware: String,

    #[serde(rename = "6", default, skip_serializing_if = "is_zero")]
    pub power_source: i64,

    #[serde(rename = "9", default, skip_serializing_if = "is_zero")]
    pub battery: i64,
}

diff_schema!(DeviceInfo {
    scalar manufacturer => "manufacturer",
    scalar model => "model",
    scalar serial_number => "serial_number",
    scalar firmware => "firmware",
    scalar power_source => "power_source",
    scalar battery => "battery",
});

impl DeviceInfo {
    /// Full-colour bulbs carry " CWS " in their model string.
    pub fn is_rgb_model(&self) -> bool {
        self.model.contains(" CWS ")
    }
}

/// Closed set of behaviours a device exposes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceCapability {
    Light,
    Plug,
    WindowCovering,
    Remote,
    Unknown,
}

/// A paired accessory (endpoint 15001).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Device {
    #[serde(flatten)]
    pub base: BaseInfo,

    #[serde(rename = "5750", default, skip_serializing_if = "is_zero")]
    pub device_type: DeviceType,

    #[serde(rename = "3", default, skip_serializing_if = "Option::is_none")]
    pub device_info: Option<DeviceInfo>,

    #[serde(rename = "9019", default, skip_serializing_if = "is_zero")]
    pub alive: YesNo,

    #[serde(rename = "9020", default, skip_serializing_if = "is_zero")]
    pub last_seen: i64,

    #[serde(
        rename = "3311",
        default,
        deserialize_with = "nullable_elements",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub lights: Vec<Light>,

    #[serde(
        rename = "3312",
        default,
        deserialize_with = "nullable_elements",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub plugs: Vec<Plug>,

    #[serde(
        rename = "3300",
        default,
        deserialize_with = "nullable_elements",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub sensors: Vec<Control>,

    #[serde(
        rename = "15009",
        default,
        deserialize_with = "nullable_elements",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub switches: Vec<Control>,

    #[serde(
        rename = "15015",
        default,
        deserialize_with = "nullable_elements",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub blinds: Vec<Blind>,

    #[serde(rename = "9054", default, skip_serializing_if = "is_zero")]
    pub ota_update: YesNo,
}

diff_schema!(Device {
    flatten base => "base",
    scalar device_type => "device_type",
    nested device_info => "device_info",
    scalar alive => "alive",
    scalar last_seen => "last_seen",
    sequence lights => "lights",
    sequence plugs => "plugs",
    sequence sensors => "sensors",
    sequence switches => "switches",
    sequence blinds => "blinds",
    scalar ota_update => "ota_update",
});

impl Entity for Device {
    const KIND: EntityKind = EntityKind::Device;

    fn capability(&self) -> Option<DeviceCapability> {
        Some(self.classify())
    }
}

impl Device {
    pub fn classify(&self) -> DeviceCapability {
        match self.device_type {
            DeviceType::LIGHT if !self.lights.is_empty() => DeviceCapability::Light,
            DeviceType::PLUG => DeviceCapability::Plug,
            DeviceType::BLIND => DeviceCapability::WindowCovering,
            DeviceType::REMOTE | DeviceType::SLAVE_REMOTE => DeviceCapability::Remote,
            _ if !self.blinds.is_empty() => DeviceCapability::WindowCovering,
            _ => DeviceCapability::Unknown,
        }
    }

    pub fn light(&self) -> Option<&Light> {
        self.lights.first()
    }

    /// First light entry, created if the device has none.
    pub fn light_mut(&mut self) -> &mut Light {
        if self.lights.is_empty() {
            self.lights.push(Light::default());
        }
        &mut self.lights[0]
    }

    pub fn plug(&self) -> Option<&Plug> {
        self.plugs.first()
    }

    pub fn plug_mut(&mut self) -> &mut Plug {
        if self.plugs.is_empty() {
            self.plugs.push(Plug::default());
        }
        &mut self.plugs[0]
    }

    pub fn blind(&self) -> Option<&Blind> {
        self.blinds.first()
    }

    pub fn blind_mut(&mut self) -> &mut Blind {
        if self.blinds.is_empty() {
            self.blinds.push(Blind::default());
        }
        &mut self.blinds[0]
    }

    pub fn dimmable(&self) -> Option<&Dimmable> {
        self.light().map(|light| &light.setting.dimmable)
    }

    /// Current blind position; missing position reads as fully open.
    pub fn blind_position(&self) -> i64 {
        self.blind().and_then(|blind| blind.position).unwrap_or(0)
    }

    pub fn is_alive(&self) -> bool {
        self.alive.is_yes()
    }

    pub fn last_seen_time(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.last_seen, 0)
    }
}
