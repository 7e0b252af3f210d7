// NATS transport

mod client;
mod publisher;

pub use client::{subject_path, NatsClient, NatsConfig};
pub use publisher::NatsPublisher;
