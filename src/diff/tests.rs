use super::*;
use crate::diff::diff_schema;
use serde_json::json;

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
struct Info {
    vendor: String,
    battery: Option<u8>,
}

diff_schema!(Info {
    scalar vendor => "vendor",
    scalar battery => "battery",
});

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
struct Bulb {
    on: bool,
    dim: u8,
}

diff_schema!(Bulb {
    scalar on => "on",
    scalar dim => "dim",
});

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
struct Label {
    name: String,
}

diff_schema!(Label {
    scalar name => "name",
});

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
struct Thing {
    label: Label,
    alive: bool,
    info: Option<Info>,
    bulbs: Vec<Bulb>,
    clock: u64,
}

diff_schema!(Thing {
    flatten label => "label",
    scalar alive => "alive",
    nested info => "info",
    sequence bulbs => "bulbs",
    transient clock => "clock",
});

fn sample() -> Thing {
    Thing {
        label: Label { name: "kitchen".to_string() },
        alive: true,
        info: Some(Info {
            vendor: "acme".to_string(),
            battery: Some(80),
        }),
        bulbs: vec![Bulb { on: true, dim: 100 }, Bulb { on: false, dim: 0 }],
        clock: 1,
    }
}

#[test]
fn test_identical_copy_yields_no_changes() {
    let mut old = sample();
    let new = sample();

    assert!(diff(&mut old, &new).is_empty());
    assert_eq!(old, new);
}

#[test]
fn test_scalar_change_is_committed() {
    let mut old = sample();
    let mut new = sample();
    new.alive = false;

    let changes = diff(&mut old, &new);

    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].field, "alive");
    assert!(changes[0].path.is_empty());
    assert_eq!(changes[0].old_value, json!(true));
    assert_eq!(changes[0].new_value, json!(false));
    assert!(!old.alive);
}

#[test]
fn test_flattened_fields_stay_at_parent_path() {
    let mut old = sample();
    let mut new = sample();
    new.label.name = "hallway".to_string();

    let changes = diff(&mut old, &new);

    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].key(), "name");
    assert_eq!(old.label.name, "hallway");
}

#[test]
fn test_absent_to_present_emits_leaf_changes() {
    let mut old = sample();
    old.info = None;
    let new = sample();

    let changes = diff(&mut old, &new);

    let keys: Vec<String> = changes.iter().map(Change::key).collect();
    assert_eq!(keys, vec!["info/vendor", "info/battery"]);
    assert_eq!(changes[0].old_value, json!(""));
    assert_eq!(changes[1].old_value, json!(null));
    assert_eq!(changes[1].new_value, json!(80));
    assert_eq!(old.info, new.info);
}

#[test]
fn test_absent_to_present_skips_zero_leaves() {
    let mut old = Thing::default();
    let mut new = Thing::default();
    new.info = Some(Info {
        vendor: String::new(),
        battery: Some(5),
    });

    let changes = diff(&mut old, &new);

    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].key(), "info/battery");
    assert!(old.info.is_some());
}

#[test]
fn test_present_to_absent_emits_single_null_change() {
    let mut old = sample();
    let mut new = sample();
    new.info = None;

    let changes = diff(&mut old, &new);

    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].field, "info");
    assert_eq!(changes[0].new_value, json!(null));
    assert_eq!(changes[0].old_value["vendor"], json!("acme"));
    assert!(old.info.is_none());
}

#[test]
fn test_sequence_length_change_replaces_whole_sequence() {
    let mut old = sample();
    let mut new = sample();
    new.bulbs.push(Bulb { on: true, dim: 1 });

    let changes = diff(&mut old, &new);

    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].field, "bulbs");
    assert_eq!(changes[0].old_value.as_array().map(Vec::len), Some(2));
    assert_eq!(changes[0].new_value.as_array().map(Vec::len), Some(3));
    assert_eq!(old.bulbs.len(), 3);
}

#[test]
fn test_sequence_same_length_diffs_element_wise() {
    let mut old = sample();
    let mut new = sample();
    new.bulbs[1].dim = 42;

    let changes = diff(&mut old, &new);

    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].path, vec!["bulbs".to_string(), "1".to_string()]);
    assert_eq!(changes[0].field, "dim");
    assert_eq!(changes[0].new_value, json!(42));
    assert_eq!(old.bulbs[1].dim, 42);
}

#[test]
fn test_transient_field_is_neither_compared_nor_committed() {
    let mut old = sample();
    let mut new = sample();
    new.clock = 99;

    assert!(diff(&mut old, &new).is_empty());
    assert_eq!(old.clock, 1);
}

#[test]
fn test_round_trip_restores_every_leaf() {
    let a = sample();
    let mut b = sample();
    b.alive = false;
    b.label.name = "porch".to_string();
    b.info = None;
    b.bulbs[0].dim = 7;

    let mut canonical = a.clone();
    let forward = diff(&mut canonical, &b);
    let backward = diff(&mut canonical, &a);

    assert!(!forward.is_empty());
    assert!(!backward.is_empty());
    assert_eq!(canonical.label, a.label);
    assert_eq!(canonical.alive, a.alive);
    assert_eq!(canonical.info, a.info);
    assert_eq!(canonical.bulbs, a.bulbs);
}

#[test]
fn test_changes_follow_declared_order() {
    let mut old = Thing::default();
    let new = sample();

    let keys: Vec<String> = diff(&mut old, &new).iter().map(Change::key).collect();

    assert_eq!(
        keys,
        vec!["name", "alive", "info/vendor", "info/battery", "bulbs"]
    );
}

#[test]
fn test_change_serializes_camel_case_values() {
    let change = Change::synthetic("direction", json!("stopped"), json!("opening"));
    let value = serde_json::to_value(&change).unwrap();

    assert_eq!(value["field"], json!("direction"));
    assert_eq!(value["oldValue"], json!("stopped"));
    assert_eq!(value["newValue"], json!("opening"));
    assert_eq!(value["path"], json!([]));
}
