// Structural diffing of typed snapshots
//
// Every entity type declares its observable fields once through
// `diff_schema!`. The generated `Diff` impl walks both values field by field
// in declared order, records a `Change` for every difference and commits the
// new value into the old one in place.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[cfg(test)]
mod tests;

/// A single field-level difference.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Change {
    /// Ancestor field names, outermost first. Sequence elements appear as
    /// their positional index.
    pub path: Vec<String>,

    /// Leaf field name
    pub field: String,

    #[serde(rename = "oldValue")]
    pub old_value: Value,

    #[serde(rename = "newValue")]
    pub new_value: Value,
}

/// Ordered changes produced by one diff (or one synthetic transition).
pub type ChangeList = Vec<Change>;

impl Change {
    pub fn new(path: &[String], field: impl Into<String>, old_value: Value, new_value: Value) -> Self {
        Self {
            path: path.to_vec(),
            field: field.into(),
            old_value,
            new_value,
        }
    }

    /// Change at the entity root, used for derived state that no snapshot carries.
    pub fn synthetic(field: impl Into<String>, old_value: Value, new_value: Value) -> Self {
        Self::new(&[], field, old_value, new_value)
    }

    /// Slash-joined path including the leaf field, e.g. `lights/0/dim`.
    pub fn key(&self) -> String {
        let mut parts = self.path.clone();
        parts.push(self.field.clone());
        parts.join("/")
    }
}

/// Schema-aware comparison that commits `new` into `self`.
pub trait Diff {
    fn diff_into(&mut self, new: &Self, path: &[String], changes: &mut ChangeList);
}

/// Diff `new` against `old`, commit it into `old` and return what changed.
pub fn diff<T: Diff>(old: &mut T, new: &T) -> ChangeList {
    let mut changes = ChangeList::new();
    old.diff_into(new, &[], &mut changes);
    changes
}

fn to_value<T: Serialize + ?Sized>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

fn child_path(path: &[String], field: &str) -> Vec<String> {
    let mut child = path.to_vec();
    child.push(field.to_string());
    child
}

/// Plain value compared with `==`.
pub fn scalar<T>(old: &mut T, new: &T, path: &[String], field: &'static str, changes: &mut ChangeList)
where
    T: PartialEq + Clone + Serialize,
{
    if old != new {
        changes.push(Change::new(path, field, to_value(old), to_value(new)));
        old.clone_from(new);
    }
}

/// Optional nested structure.
///
/// Appearing substructures are recursed into from a zero value, so the
/// caller sees one change per populated leaf rather than one coarse change.
pub fn nested<T>(old: &mut Option<T>, new: &Option<T>, path: &[String], field: &'static str, changes: &mut ChangeList)
where
    T: Diff + Default + Serialize,
{
    let Some(incoming) = new else {
        if let Some(current) = old.take() {
            changes.push(Change::new(path, field, to_value(&current), Value::Null));
        }
        return;
    };

    let current = old.get_or_insert_with(T::default);
    current.diff_into(incoming, &child_path(path, field), changes);
}

/// Ordered sequence of nested structures.
///
/// A length mismatch replaces the whole sequence with a single change.
pub fn sequence<T>(old: &mut Vec<T>, new: &[T], path: &[String], field: &'static str, changes: &mut ChangeList)
where
    T: Diff + Clone + Serialize,
{
    if old.len() != new.len() {
        changes.push(Change::new(path, field, to_value(old.as_slice()), to_value(new)));
        *old = new.to_vec();
        return;
    }

    let base = child_path(path, field);
    for (index, (current, incoming)) in old.iter_mut().zip(new).enumerate() {
        let element = child_path(&base, &index.to_string());
        current.diff_into(incoming, &element, changes);
    }
}

/// Embedded structure whose fields belong to the parent's path.
pub fn flatten<T: Diff>(old: &mut T, new: &T, path: &[String], _field: &'static str, changes: &mut ChangeList) {
    old.diff_into(new, path, changes);
}

/// Non-observable field: never compared, never committed.
pub fn transient<T>(_old: &mut T, _new: &T, _path: &[String], _field: &'static str, _changes: &mut ChangeList) {}

/// Declares the observable schema of a type and derives its `Diff` impl.
///
/// Each entry is `<kind> <rust_field> => "<change name>"` where kind is one
/// of `scalar`, `nested`, `sequence`, `flatten` or `transient`.
macro_rules! diff_schema {
    ($ty:ty { $($kind:ident $field:ident => $name:literal),* $(,)? }) => {
        impl $crate::diff::Diff for $ty {
            fn diff_into(
                &mut self,
                new: &Self,
                path: &[String],
                changes: &mut $crate::diff::ChangeList,
            ) {
                $( $crate::diff::$kind(&mut self.$field, &new.$field, path, $name, changes); )*
            }
        }
    };
}

pub(crate) use diff_schema;
