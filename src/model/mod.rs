// Typed gateway entities and their wire codec
//
// Wire keys are the gateway's numeric JSON keys. Change records use the
// snake_case field names declared in each `diff_schema!`.

pub mod address;
pub mod device;
pub mod gateway;
pub mod group;
pub mod light;
pub mod notification;
pub mod scene;

#[cfg(test)]
mod tests;

pub use address::{AddressError, EntityAddress, EntityKind};
pub use device::{Blind, Control, Device, DeviceCapability, DeviceInfo, Plug};
pub use gateway::{Gateway, UpdatePriority};
pub use group::Group;
pub use light::{calc_dim, ColorTemperature, Dimmable, Light, LightSetting};
pub use notification::{Notification, Notifications};
pub use scene::Scene;

use crate::diff::{diff_schema, Diff};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// A canonical entity type that can be decoded from a push and diffed.
pub trait Entity:
    Diff + Default + Clone + Serialize + DeserializeOwned + Send + Sync + 'static
{
    const KIND: EntityKind;

    /// Closed capability chosen once when the entity is created.
    fn capability(&self) -> Option<DeviceCapability> {
        None
    }
}

/// Fields shared by every gateway object.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BaseInfo {
    #[serde(rename = "9001", default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    #[serde(rename = "9002", default, skip_serializing_if = "is_zero")]
    pub created_at: i64,

    #[serde(rename = "9003", default, skip_serializing_if = "is_zero")]
    pub instance_id: i64,
}

diff_schema!(BaseInfo {
    scalar name => "name",
    scalar created_at => "created_at",
    scalar instance_id => "instance_id",
});

impl BaseInfo {
    pub fn created_time(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.created_at, 0)
    }
}

/// The gateway's integer boolean (0 = no, 1 = yes).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct YesNo(pub u8);

impl YesNo {
    pub const NO: YesNo = YesNo(0);
    pub const YES: YesNo = YesNo(1);

    pub fn is_yes(&self) -> bool {
        *self == Self::YES
    }
}

impl From<bool> for YesNo {
    fn from(value: bool) -> Self {
        if value {
            Self::YES
        } else {
            Self::NO
        }
    }
}

impl fmt::Display for YesNo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.is_yes() { "yes" } else { "no" })
    }
}

/// Device type code as reported in key 5750.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceType(pub u8);

impl DeviceType {
    pub const REMOTE: DeviceType = DeviceType(0);
    pub const SLAVE_REMOTE: DeviceType = DeviceType(1);
    pub const LIGHT: DeviceType = DeviceType(2);
    pub const PLUG: DeviceType = DeviceType(3);
    pub const MOTION_SENSOR: DeviceType = DeviceType(4);
    pub const REPEATER: DeviceType = DeviceType(6);
    pub const BLIND: DeviceType = DeviceType(7);
}

pub(crate) fn is_zero<T: Default + PartialEq>(value: &T) -> bool {
    *value == T::default()
}

/// Sequence whose elements may be `null` on the wire; those decode as the
/// zero value so positions stay aligned.
pub(crate) fn nullable_elements<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    let raw: Option<Vec<Option<T>>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(Option::unwrap_or_default)
        .collect())
}
