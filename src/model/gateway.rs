use super::address::EntityKind;
use super::{is_zero, Entity};
use crate::diff::diff_schema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Firmware update urgency (key 9066).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UpdatePriority(pub u8);

impl UpdatePriority {
    pub const NORMAL: UpdatePriority = UpdatePriority(0);
    pub const CRITICAL: UpdatePriority = UpdatePriority(1);
    pub const REQUIRED: UpdatePriority = UpdatePriority(2);
    pub const FORCED: UpdatePriority = UpdatePriority(5);
}

impl fmt::Display for UpdatePriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match *self {
            UpdatePriority::NORMAL => "normal",
            UpdatePriority::CRITICAL => "critical",
            UpdatePriority::REQUIRED => "required",
            UpdatePriority::FORCED => "forced",
            _ => "",
        };
        f.write_str(name)
    }
}

/// Gateway details (endpoint `15011/15012`).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Gateway {
    #[serde(rename = "9023", default, skip_serializing_if = "is_zero")]
    pub ntp_server: String,

    #[serde(rename = "9029", default, skip_serializing_if = "is_zero")]
    pub version: String,

    #[serde(rename = "9054", default, skip_serializing_if = "is_zero")]
    pub update_state: i64,

    /// Percentage
    #[serde(rename = "9055", default, skip_serializing_if = "is_zero")]
    pub update_progress: i64,

    #[serde(rename = "9056", default, skip_serializing_if = "is_zero")]
    pub update_url: String,

    /// Gateway clock, unix seconds
    #[serde(rename = "9059", default, skip_serializing_if = "is_zero")]
    pub timestamp: i64,

    #[serde(rename = "9060", default, skip_serializing_if = "is_zero")]
    pub timestamp_utc: String,

    #[serde(rename = "9061", default, skip_serializing_if = "is_zero")]
    pub commissioning_mode: i64,

    #[serde(rename = "9066", default, skip_serializing_if = "is_zero")]
    pub update_priority: UpdatePriority,

    #[serde(rename = "9069", default, skip_serializing_if = "is_zero")]
    pub update_accepted_timestamp: i64,

    #[serde(rename = "9071", default, skip_serializing_if = "is_zero")]
    pub time_source: i64,

    #[serde(rename = "9032", default, skip_serializing_if = "is_zero")]
    pub force_check_ota_update: String,

    #[serde(rename = "9035", default, skip_serializing_if = "is_zero")]
    pub name: String,
}

// The clock fields tick on every push and are not observable state.
diff_schema!(Gateway {
    scalar ntp_server => "ntp_server",
    scalar version => "version",
    scalar update_state => "update_state",
    scalar update_progress => "update_progress",
    scalar update_url => "update_url",
    transient timestamp => "timestamp",
    transient timestamp_utc => "timestamp_utc",
    scalar commissioning_mode => "commissioning_mode",
    scalar update_priority => "update_priority",
    scalar update_accepted_timestamp => "update_accepted_timestamp",
    scalar time_source => "time_source",
    scalar force_check_ota_update => "force_check_ota_update",
    scalar name => "name",
});

impl Entity for Gateway {
    const KIND: EntityKind = EntityKind::Gateway;
}
