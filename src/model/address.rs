use serde::Serialize;
use std::fmt;
use thiserror::Error;

const DEVICES: &str = "15001";
const GROUPS: &str = "15004";
const SCENES: &str = "15005";
const NOTIFICATIONS: &str = "15006";
const GATEWAY: &str = "15011";
const GATEWAY_DETAILS: &str = "15012";

/// Entity kinds known to the gateway protocol.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Device,
    Group,
    Scene,
    Notification,
    Gateway,
}

impl EntityKind {
    /// Numeric root endpoint of the kind.
    pub fn endpoint(&self) -> &'static str {
        match self {
            EntityKind::Device => DEVICES,
            EntityKind::Group => GROUPS,
            EntityKind::Scene => SCENES,
            EntityKind::Notification => NOTIFICATIONS,
            EntityKind::Gateway => GATEWAY,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            EntityKind::Device => "device",
            EntityKind::Group => "group",
            EntityKind::Scene => "scene",
            EntityKind::Notification => "notification",
            EntityKind::Gateway => "gateway",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressError {
    #[error("empty entity path")]
    Empty,

    #[error("unknown endpoint '{0}'")]
    UnknownEndpoint(String),

    #[error("invalid entity id '{0}'")]
    InvalidId(String),
}

/// Identity of one canonical entity: kind, id and optional sub-id.
///
/// Scenes are the only kind with a sub-id (`15005/<group>/<scene>`).
/// Singletons (gateway, notifications) use id 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct EntityAddress {
    pub kind: EntityKind,
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_id: Option<i64>,
}

impl EntityAddress {
    pub fn device(id: i64) -> Self {
        Self { kind: EntityKind::Device, id, sub_id: None }
    }

    pub fn group(id: i64) -> Self {
        Self { kind: EntityKind::Group, id, sub_id: None }
    }

    pub fn scene(group: i64, scene: i64) -> Self {
        Self { kind: EntityKind::Scene, id: group, sub_id: Some(scene) }
    }

    pub fn notifications() -> Self {
        Self { kind: EntityKind::Notification, id: 0, sub_id: None }
    }

    pub fn gateway() -> Self {
        Self { kind: EntityKind::Gateway, id: 0, sub_id: None }
    }

    /// Parse a split topic path such as `["15001", "65537"]`.
    ///
    /// Bare collection listings (`15001`, `15004`, `15005/<group>`) are
    /// valid paths that address no single entity and yield `Ok(None)`.
    pub fn parse<S: AsRef<str>>(segments: &[S]) -> Result<Option<Self>, AddressError> {
        let parts: Vec<&str> = segments.iter().map(AsRef::as_ref).collect();

        match parts.as_slice() {
            [] => Err(AddressError::Empty),
            [DEVICES] | [GROUPS] | [SCENES] => Ok(None),
            [DEVICES, id] => Ok(Some(Self::device(parse_id(id)?))),
            [GROUPS, id] => Ok(Some(Self::group(parse_id(id)?))),
            [SCENES, group] => {
                parse_id(group)?;
                Ok(None)
            }
            [SCENES, group, scene] => Ok(Some(Self::scene(parse_id(group)?, parse_id(scene)?))),
            [NOTIFICATIONS] => Ok(Some(Self::notifications())),
            [GATEWAY, GATEWAY_DETAILS] => Ok(Some(Self::gateway())),
            [DEVICES | GROUPS | NOTIFICATIONS | GATEWAY, rest @ ..]
            | [SCENES, _, _, rest @ ..] => Err(AddressError::InvalidId(rest.join("/"))),
            [other, ..] => Err(AddressError::UnknownEndpoint((*other).to_string())),
        }
    }

    /// Parse a slash-joined path such as `15005/131073/196608`.
    pub fn parse_str(path: &str) -> Result<Option<Self>, AddressError> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        Self::parse(&segments)
    }
}

fn parse_id(raw: &str) -> Result<i64, AddressError> {
    raw.parse::<i64>()
        .map_err(|_| AddressError::InvalidId(raw.to_string()))
}

impl fmt::Display for EntityAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            EntityKind::Gateway => write!(f, "{}/{}", GATEWAY, GATEWAY_DETAILS),
            EntityKind::Notification => f.write_str(NOTIFICATIONS),
            kind => match self.sub_id {
                Some(sub) => write!(f, "{}/{}/{}", kind.endpoint(), self.id, sub),
                None => write!(f, "{}/{}", kind.endpoint(), self.id),
            },
        }
    }
}
