use std::time::Duration;

/// How a message type behaves when published.
///
/// A profile is resolved once per publish, from the type itself, and drives the
/// AMQP properties attached to the outgoing message: delivery mode, correlation
/// id and per-message TTL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageProfile {
    /// Persistent messages (delivery mode 2) survive a broker restart when
    /// routed to a durable queue. Non-persistent messages are kept in memory
    /// only.
    pub persistent: bool,
    /// Request/response message types get a fresh correlation id on every
    /// publish, so that a reply can be matched back to its request.
    pub request_response: bool,
    /// How long the broker should keep the message around before discarding
    /// it, if the type declares a timeout.
    pub timeout: Option<Duration>,
}

impl Default for MessageProfile {
    fn default() -> Self {
        // A plain event: durable, no reply expected, never expires.
        Self {
            persistent: true,
            request_response: false,
            timeout: None,
        }
    }
}

impl MessageProfile {
    /// Mark the message type as non-persistent (delivery mode 1).
    #[must_use]
    pub fn transient(mut self) -> Self {
        self.persistent = false;
        self
    }

    /// Mark the message type as a request expecting a response: every publish
    /// carries a fresh correlation id.
    #[must_use]
    pub fn request_response(mut self) -> Self {
        self.request_response = true;
        self
    }

    /// Ask the broker to discard the message if it has not been consumed
    /// within `timeout`.
    #[must_use]
    pub fn expires_after(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// A type that can travel as the body of a [`Message`](super::Message).
///
/// The default profile is a plain persistent event; override [`profile`] to
/// declare request/response semantics, a TTL, or transient delivery.
///
/// ```rust
/// use std::time::Duration;
/// use nutmeg::messages::{MessageBody, MessageProfile};
///
/// struct BalanceQuery {
///     account: String,
/// }
///
/// impl MessageBody for BalanceQuery {
///     fn profile() -> MessageProfile {
///         MessageProfile::default()
///             .request_response()
///             .expires_after(Duration::from_secs(60))
///     }
/// }
/// ```
///
/// [`profile`]: MessageBody::profile
pub trait MessageBody {
    /// Publishing profile for this message type.
    fn profile() -> MessageProfile {
        MessageProfile::default()
    }
}
