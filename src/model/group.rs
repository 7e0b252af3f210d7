use super::address::EntityKind;
use super::light::Dimmable;
use super::{BaseInfo, Entity};
use crate::diff::diff_schema;
use serde::{Deserialize, Serialize};

/// A room or zone of devices (endpoint 15004).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Group {
    #[serde(flatten)]
    pub base: BaseInfo,

    #[serde(flatten)]
    pub dimmable: Dimmable,

    /// Active scene id
    #[serde(rename = "9039", default, skip_serializing_if = "Option::is_none")]
    pub scene: Option<i64>,

    /// Member device ids
    #[serde(rename = "9018", default, with = "members", skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<i64>,
}

diff_schema!(Group {
    flatten base => "base",
    flatten dimmable => "dimmable",
    scalar scene => "scene",
    scalar members => "members",
});

impl Entity for Group {
    const KIND: EntityKind = EntityKind::Group;
}

/// Member ids travel as `{"15002": {"9003": [ids]}}`.
mod members {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Default, Serialize, Deserialize)]
    struct DeviceRef {
        #[serde(rename = "9003", default)]
        ids: Vec<i64>,
    }

    #[derive(Default, Serialize, Deserialize)]
    struct MemberRef {
        #[serde(rename = "15002", default)]
        devices: Option<DeviceRef>,
    }

    pub fn serialize<S: Serializer>(ids: &[i64], serializer: S) -> Result<S::Ok, S::Error> {
        MemberRef {
            devices: Some(DeviceRef { ids: ids.to_vec() }),
        }
        .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<i64>, D::Error> {
        let members = Option::<MemberRef>::deserialize(deserializer)?;
        Ok(members
            .and_then(|m| m.devices)
            .map(|d| d.ids)
            .unwrap_or_default())
    }
}
