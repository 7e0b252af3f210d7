// Change fan-out to per-entity subscribers

pub mod observers;


pub use observers::{field_in, field_is, path_starts_with, ChangeFilter, Observers, SubscriptionId};
