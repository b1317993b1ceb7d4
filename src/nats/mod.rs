pub mod client;
pub mod messages;

pub use client::{inserted_subject, NatsRealtimeStore};
pub use messages::ActionInsertedMessage;
