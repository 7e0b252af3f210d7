use super::address::EntityKind;
use super::{is_zero, BaseInfo, Entity};
use crate::diff::diff_schema;
use serde::{Deserialize, Serialize};

pub const EVENT_NEW_FIRMWARE_AVAILABLE: i64 = 1001;
pub const EVENT_GATEWAY_REBOOT: i64 = 1003;
pub const EVENT_INTERNET_UNREACHABLE: i64 = 5001;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(flatten)]
    pub base: BaseInfo,

    #[serde(rename = "9015", default, skip_serializing_if = "is_zero")]
    pub event: i64,

    #[serde(rename = "9017", default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,

    #[serde(rename = "9014", default, skip_serializing_if = "is_zero")]
    pub state: i64,
}

diff_schema!(Notification {
    flatten base => "base",
    scalar event => "event",
    scalar details => "details",
    scalar state => "state",
});

impl Notification {
    pub fn event_description(&self) -> &'static str {
        match self.event {
            EVENT_NEW_FIRMWARE_AVAILABLE => "New firmware available",
            EVENT_GATEWAY_REBOOT => "Gateway rebooting",
            EVENT_INTERNET_UNREACHABLE => "Internet unreachable",
            _ => "Unknown event",
        }
    }
}

/// The gateway's notification list (endpoint 15006), mirrored as one entity.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Notifications {
    pub items: Vec<Notification>,
}

diff_schema!(Notifications {
    sequence items => "items",
});

impl Entity for Notifications {
    const KIND: EntityKind = EntityKind::Notification;
}
