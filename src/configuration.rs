//! Configuration types for constructing publishers.
use serde::Deserialize;

/// Construction settings shared by [`Publisher`](crate::publishers::Publisher)
/// and [`ConfirmingPublisher`](crate::publishers::ConfirmingPublisher).
///
/// You can use `PublisherSettings::default()` to get the out-of-the-box
/// behavior: publishing through the default exchange with lenient payload
/// validation.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PublisherSettings {
    /// The exchange messages are published to.
    ///
    /// E.g. `""` (the default exchange) routes straight to the queue named
    /// like the routing key.
    pub exchange: String,
    /// Reject incoming payload fields that the target message type does not
    /// declare, instead of ignoring them.
    pub strict_payloads: bool,
}

impl Default for PublisherSettings {
    fn default() -> Self {
        Self {
            exchange: String::new(),
            strict_payloads: false,
        }
    }
}
