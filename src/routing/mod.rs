//! Routing key derivation for outgoing messages.
use crate::messages::{Message, MessageBody};

/// Derives the routing key (and optional reply-to address) for outgoing
/// messages.
///
/// Routing must be deterministic: within one process, the same message type
/// always yields the same routing key. Implementations are side-effect free.
pub trait Router: Send + Sync {
    /// The routing key used by exchange bindings to decide which queues
    /// receive the message.
    ///
    /// An empty string routes through the default exchange straight to the
    /// queue named like the key.
    fn route<T: MessageBody>(&self, message: &Message<T>) -> String;

    /// The address replies should be sent to, if this router expects any.
    fn reply_to(&self) -> Option<String> {
        None
    }
}

/// Routes every message type to a key derived from its (unqualified) type
/// name, e.g. `OrderPlaced` publishes under the routing key `OrderPlaced`.
#[derive(Debug, Clone, Default)]
pub struct TypeRouter {
    reply_to: Option<String>,
}

impl TypeRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advertise `queue` as the reply-to address on every published message.
    #[must_use]
    pub fn with_reply_to(mut self, queue: impl Into<String>) -> Self {
        self.reply_to = Some(queue.into());
        self
    }
}

impl Router for TypeRouter {
    fn route<T: MessageBody>(&self, _message: &Message<T>) -> String {
        short_type_name::<T>().to_string()
    }

    fn reply_to(&self) -> Option<String> {
        self.reply_to.clone()
    }
}

/// Routes every message to one fixed key, regardless of its type.
#[derive(Debug, Clone)]
pub struct StaticRouter {
    routing_key: String,
    reply_to: Option<String>,
}

impl StaticRouter {
    pub fn new(routing_key: impl Into<String>) -> Self {
        Self {
            routing_key: routing_key.into(),
            reply_to: None,
        }
    }

    /// Advertise `queue` as the reply-to address on every published message.
    #[must_use]
    pub fn with_reply_to(mut self, queue: impl Into<String>) -> Self {
        self.reply_to = Some(queue.into());
        self
    }
}

impl Router for StaticRouter {
    fn route<T: MessageBody>(&self, _message: &Message<T>) -> String {
        self.routing_key.clone()
    }

    fn reply_to(&self) -> Option<String> {
        self.reply_to.clone()
    }
}

/// Last segment of the fully-qualified type name.
fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}
