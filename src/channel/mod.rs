//! Exclusive access to a single broker channel.
//!
//! An AMQP channel is not safe to use from multiple tasks at once. This module
//! provides [`ChannelRef`], a shared reference that serializes every operation
//! against the underlying channel, and [`BrokerChannel`], the contract the
//! connection layer (or a test stub) implements to plug a channel in.
mod broker;
mod error;
mod reference;

pub use broker::{BrokerChannel, HealthStatus};
pub use error::ChannelError;
pub use reference::ChannelRef;
