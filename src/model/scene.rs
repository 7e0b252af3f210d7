use super::address::EntityKind;
use super::light::LightSetting;
use super::{is_zero, nullable_elements, BaseInfo, Entity, YesNo};
use crate::diff::diff_schema;
use serde::{Deserialize, Serialize};

/// A stored scene of a group (endpoint `15005/<group>/<scene>`).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    #[serde(flatten)]
    pub base: BaseInfo,

    #[serde(rename = "9057", default, skip_serializing_if = "is_zero")]
    pub index: i64,

    #[serde(rename = "9068", default, skip_serializing_if = "is_zero")]
    pub is_predefined: YesNo,

    #[serde(rename = "9058", default, skip_serializing_if = "is_zero")]
    pub is_active: YesNo,

    #[serde(
        rename = "15013",
        default,
        deserialize_with = "nullable_elements",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub light_settings: Vec<LightSetting>,

    #[serde(rename = "9070", default, skip_serializing_if = "is_zero")]
    pub use_current_light_settings: YesNo,
}

diff_schema!(Scene {
    flatten base => "base",
    scalar index => "index",
    scalar is_predefined => "is_predefined",
    scalar is_active => "is_active",
    sequence light_settings => "light_settings",
    scalar use_current_light_settings => "use_current_light_settings",
});

impl Entity for Scene {
    const KIND: EntityKind = EntityKind::Scene;
}
