// Canonical entity mirror

mod handle;
mod store;

pub use handle::EntityHandle;
pub use store::{DiscoveryHandler, EntityStore, IngestError, IngestOutcome, NewEntity, Table};
