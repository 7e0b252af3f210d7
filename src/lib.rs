// Snapshot diffing and the entity model
pub mod diff;
pub mod model;

// Entity mirror and change subscriptions
pub mod state;
pub mod subscription;

// Gateway requests: correlation, write batching and control helpers
pub mod batch;
pub mod command;
pub mod control;

// Derived blind motion state
pub mod blind;
pub mod timer;

// Inbound frame routing
pub mod bridge;
pub mod dispatch;

// HTTP status API
pub mod api;

// NATS transport
pub mod nats;

// Configuration loading
pub mod config;

#[cfg(test)]
pub(crate) mod testing;
