use crate::diff::{Change, ChangeList};
use parking_lot::RwLock;
use std::sync::Arc;

/// Predicate a change must pass to reach a filtered subscriber.
pub type ChangeFilter = Arc<dyn Fn(&Change) -> bool + Send + Sync>;

type Callback = Box<dyn Fn(&ChangeList) + Send + Sync>;

/// Registration index, in subscription order.
pub type SubscriptionId = usize;

struct Subscriber {
    filters: Vec<ChangeFilter>,
    callback: Callback,
}

impl Subscriber {
    fn deliver(&self, changes: &ChangeList) {
        if self.filters.is_empty() {
            (self.callback)(changes);
            return;
        }

        let accepted: ChangeList = changes
            .iter()
            .filter(|change| self.filters.iter().all(|filter| filter(*change)))
            .cloned()
            .collect();

        if !accepted.is_empty() {
            (self.callback)(&accepted);
        }
    }
}

/// Subscriber list of one entity.
///
/// Subscribers are never removed; they live as long as the entity.
#[derive(Default)]
pub struct Observers {
    subscribers: RwLock<Vec<Arc<Subscriber>>>,
}

impl Observers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Receive every non-empty change list.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&ChangeList) + Send + Sync + 'static,
    {
        self.subscribe_filtered(Vec::new(), callback)
    }

    /// Receive only changes passing every filter, and only when at least one does.
    pub fn subscribe_filtered<F>(&self, filters: Vec<ChangeFilter>, callback: F) -> SubscriptionId
    where
        F: Fn(&ChangeList) + Send + Sync + 'static,
    {
        let mut subscribers = self.subscribers.write();
        subscribers.push(Arc::new(Subscriber {
            filters,
            callback: Box::new(callback),
        }));
        subscribers.len() - 1
    }

    /// Invoke subscribers in registration order.
    ///
    /// The list is snapshotted first so callbacks may subscribe further
    /// observers without deadlocking.
    pub fn notify(&self, changes: &ChangeList) {
        if changes.is_empty() {
            return;
        }

        let subscribers: Vec<Arc<Subscriber>> = self.subscribers.read().clone();
        for subscriber in subscribers {
            subscriber.deliver(changes);
        }
    }

    pub fn len(&self) -> usize {
        self.subscribers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Accept changes whose leaf field is `name`.
pub fn field_is(name: &'static str) -> ChangeFilter {
    Arc::new(move |change: &Change| change.field == name)
}

/// Accept changes whose leaf field is any of `names`.
pub fn field_in(names: &'static [&'static str]) -> ChangeFilter {
    Arc::new(move |change: &Change| names.iter().any(|name| *name == change.field))
}

/// Accept changes nested under the given ancestor path.
pub fn path_starts_with(prefix: &'static [&'static str]) -> ChangeFilter {
    Arc::new(move |change: &Change| {
        change.path.len() >= prefix.len()
            && change.path.iter().zip(prefix).all(|(segment, expected)| segment == expected)
    })
}
