use super::*;
use crate::diff::diff;
use serde_json::json;

#[test]
fn test_parse_entity_addresses() {
    assert_eq!(
        EntityAddress::parse(&["15001", "65537"]).unwrap(),
        Some(EntityAddress::device(65537))
    );
    assert_eq!(
        EntityAddress::parse(&["15004", "131073"]).unwrap(),
        Some(EntityAddress::group(131073))
    );
    assert_eq!(
        EntityAddress::parse(&["15005", "131073", "196608"]).unwrap(),
        Some(EntityAddress::scene(131073, 196608))
    );
    assert_eq!(
        EntityAddress::parse(&["15006"]).unwrap(),
        Some(EntityAddress::notifications())
    );
    assert_eq!(
        EntityAddress::parse(&["15011", "15012"]).unwrap(),
        Some(EntityAddress::gateway())
    );
}

#[test]
fn test_parse_collection_listings_address_nothing() {
    assert_eq!(EntityAddress::parse(&["15001"]).unwrap(), None);
    assert_eq!(EntityAddress::parse(&["15004"]).unwrap(), None);
    assert_eq!(EntityAddress::parse(&["15005", "131073"]).unwrap(), None);
}

#[test]
fn test_parse_rejects_bad_paths() {
    let empty: [&str; 0] = [];
    assert_eq!(EntityAddress::parse(&empty), Err(AddressError::Empty));
    assert_eq!(
        EntityAddress::parse(&["99999", "1"]),
        Err(AddressError::UnknownEndpoint("99999".to_string()))
    );
    assert_eq!(
        EntityAddress::parse(&["15001", "lamp"]),
        Err(AddressError::InvalidId("lamp".to_string()))
    );
    assert!(EntityAddress::parse(&["15001", "1", "2"]).is_err());
}

#[test]
fn test_address_display_matches_wire_url() {
    assert_eq!(EntityAddress::device(65537).to_string(), "15001/65537");
    assert_eq!(EntityAddress::scene(131073, 196608).to_string(), "15005/131073/196608");
    assert_eq!(EntityAddress::gateway().to_string(), "15011/15012");
    assert_eq!(EntityAddress::notifications().to_string(), "15006");

    let parsed = EntityAddress::parse_str("15004/131073").unwrap();
    assert_eq!(parsed, Some(EntityAddress::group(131073)));
}

#[test]
fn test_decode_light_device() {
    let raw = json!({
        "9001": "Kitchen bulb",
        "9002": 1500000000,
        "9003": 65537,
        "5750": 2,
        "9019": 1,
        "9020": 1600000000,
        "3": {"0": "IKEA of Sweden", "1": "TRADFRI bulb E27 CWS opal 600lm", "3": "1.3.002", "6": 1},
        "3311": [{"5850": 1, "5851": 254, "5706": "f1e0b5", "9003": 0}]
    });

    let device: Device = serde_json::from_value(raw).unwrap();

    assert_eq!(device.base.name, "Kitchen bulb");
    assert_eq!(device.base.instance_id, 65537);
    assert_eq!(device.classify(), DeviceCapability::Light);
    assert!(device.is_alive());
    assert!(device.device_info.as_ref().unwrap().is_rgb_model());
    assert_eq!(device.last_seen_time().unwrap().timestamp(), 1600000000);

    let light = device.light().unwrap();
    assert!(light.setting.dimmable.is_on());
    assert_eq!(light.setting.dimmable.dim_percent(), 100);
    assert_eq!(
        light.setting.color_temperature_preset(),
        Some(ColorTemperature::Normal)
    );
}

#[test]
fn test_decode_blind_position_from_float() {
    let raw = json!({"9003": 65550, "5750": 7, "15015": [{"5536": 42.7}]});

    let device: Device = serde_json::from_value(raw).unwrap();

    assert_eq!(device.classify(), DeviceCapability::WindowCovering);
    assert_eq!(device.blind_position(), 42);
}

#[test]
fn test_missing_blind_position_reads_open() {
    let device: Device = serde_json::from_value(json!({"5750": 7, "15015": [{}]})).unwrap();
    assert_eq!(device.blind_position(), 0);
}

#[test]
fn test_device_classification() {
    let plug: Device = serde_json::from_value(json!({"5750": 3, "3312": [{"5850": 0}]})).unwrap();
    let remote: Device = serde_json::from_value(json!({"5750": 0, "15009": [{}]})).unwrap();
    let bare_light: Device = serde_json::from_value(json!({"5750": 2})).unwrap();

    assert_eq!(plug.classify(), DeviceCapability::Plug);
    assert_eq!(remote.classify(), DeviceCapability::Remote);
    assert_eq!(bare_light.classify(), DeviceCapability::Unknown);
}

#[test]
fn test_shadow_device_serializes_only_touched_fields() {
    let mut shadow = Device::default();
    shadow.light_mut().setting.dimmable.set_on(true);

    let value = serde_json::to_value(&shadow).unwrap();

    assert_eq!(value, json!({"3311": [{"5850": 1}]}));
}

#[test]
fn test_zero_valued_entities_serialize_empty() {
    assert_eq!(serde_json::to_value(Device::default()).unwrap(), json!({}));
    assert_eq!(serde_json::to_value(Group::default()).unwrap(), json!({}));
    assert_eq!(serde_json::to_value(Scene::default()).unwrap(), json!({}));
    assert_eq!(serde_json::to_value(Gateway::default()).unwrap(), json!({}));
    assert_eq!(serde_json::to_value(Notification::default()).unwrap(), json!({}));
    assert_eq!(serde_json::to_value(Notifications::default()).unwrap(), json!([]));
    assert_eq!(serde_json::to_value(DeviceInfo::default()).unwrap(), json!({}));
}

#[test]
fn test_shadow_gateway_serializes_only_touched_fields() {
    let mut shadow = Gateway::default();
    shadow.name = "Hub".to_string();
    shadow.ntp_server = "pool.ntp.org".to_string();

    let value = serde_json::to_value(&shadow).unwrap();

    assert_eq!(value, json!({"9035": "Hub", "9023": "pool.ntp.org"}));
}

#[test]
fn test_shadow_scene_serializes_only_touched_fields() {
    let mut shadow = Scene::default();
    shadow.base.name = "Evening".to_string();

    let value = serde_json::to_value(&shadow).unwrap();

    assert_eq!(value, json!({"9001": "Evening"}));
}

#[test]
fn test_shadow_notification_serializes_only_touched_fields() {
    let shadow = Notifications {
        items: vec![Notification {
            state: 1,
            ..Default::default()
        }],
    };

    let value = serde_json::to_value(&shadow).unwrap();

    assert_eq!(value, json!([{"9014": 1}]));
}

#[test]
fn test_null_sequence_elements_decode_as_zero_value() {
    let device: Device =
        serde_json::from_value(json!({"5750": 2, "3311": [null, {"5850": 1}]})).unwrap();

    assert_eq!(device.lights.len(), 2);
    assert_eq!(device.lights[0], Light::default());
    assert!(device.lights[1].setting.dimmable.is_on());

    let device: Device = serde_json::from_value(json!({"5750": 7, "15015": null})).unwrap();
    assert!(device.blinds.is_empty());
}

#[test]
fn test_created_time() {
    let base = BaseInfo {
        created_at: 1500000000,
        ..Default::default()
    };
    assert_eq!(base.created_time().unwrap().timestamp(), 1500000000);
}

#[test]
fn test_group_members_wire_shape() {
    let raw = json!({
        "9001": "Living room",
        "9003": 131073,
        "5850": 1,
        "9039": 196608,
        "9018": {"15002": {"9003": [65537, 65538]}}
    });

    let group: Group = serde_json::from_value(raw).unwrap();
    assert_eq!(group.members, vec![65537, 65538]);
    assert_eq!(group.scene, Some(196608));

    let encoded = serde_json::to_value(&group).unwrap();
    assert_eq!(encoded["9018"], json!({"15002": {"9003": [65537, 65538]}}));
}

#[test]
fn test_group_without_members_omits_key() {
    let mut shadow = Group::default();
    shadow.dimmable.set_dim_percent(50);

    let value = serde_json::to_value(&shadow).unwrap();

    assert_eq!(value, json!({"5851": calc_dim(50)}));
}

#[test]
fn test_gateway_clock_fields_are_not_observed() {
    let mut canonical: Gateway = serde_json::from_value(json!({
        "9029": "1.15.0",
        "9059": 1000,
        "9060": "2024-01-01T00:00:00.000000Z"
    }))
    .unwrap();
    let next: Gateway = serde_json::from_value(json!({
        "9029": "1.15.0",
        "9059": 1060,
        "9060": "2024-01-01T00:01:00.000000Z"
    }))
    .unwrap();

    assert!(diff(&mut canonical, &next).is_empty());
}

#[test]
fn test_notifications_decode_as_list() {
    let raw = json!([
        {"9015": 1003, "9014": 0, "9017": ["reason=1"]},
        {"9015": 5001, "9014": 1}
    ]);

    let notifications: Notifications = serde_json::from_value(raw).unwrap();

    assert_eq!(notifications.items.len(), 2);
    assert_eq!(notifications.items[0].event_description(), "Gateway rebooting");
    assert_eq!(notifications.items[1].event_description(), "Internet unreachable");
}

#[test]
fn test_dim_scale_round_trips_key_points() {
    assert_eq!(calc_dim(0), 0);
    assert_eq!(calc_dim(10), 10);
    assert_eq!(calc_dim(40), 69);
    assert_eq!(calc_dim(100), 254);

    for percent in [0u8, 5, 10, 25, 40, 60, 100] {
        assert_eq!(light::dim_percent(calc_dim(percent)), percent);
    }
}

#[test]
fn test_color_temperature_presets() {
    assert_eq!(ColorTemperature::from_mireds(120), ColorTemperature::Cold);
    assert_eq!(ColorTemperature::from_mireds(200), ColorTemperature::Normal);
    assert_eq!(ColorTemperature::from_mireds(370), ColorTemperature::Warm);
    assert_eq!(ColorTemperature::Warm.xy(), (33135, 27211));
    assert_eq!(ColorTemperature::from_hex("EFD275"), Some(ColorTemperature::Warm));
}

#[test]
fn test_update_priority_names() {
    assert_eq!(UpdatePriority::FORCED.to_string(), "forced");
    assert_eq!(UpdatePriority(9).to_string(), "");
}
