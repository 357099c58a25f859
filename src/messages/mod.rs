//! Typed messages and the per-type publishing profile that drives how they are
//! put on the wire. Check out [`Message`] as a starting point.
mod message;
mod profile;

pub use message::Message;
pub use profile::{MessageBody, MessageProfile};
