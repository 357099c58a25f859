use async_trait::async_trait;
use lapin::BasicProperties;

use super::ChannelError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

/// One AMQP channel, as seen by the publish pipeline.
///
/// Implementations do not need to be thread-safe: all access goes through
/// [`ChannelRef`](super::ChannelRef), which runs at most one operation at a
/// time. Connection establishment, recovery and topology declaration live
/// behind this trait and are out of scope for this crate.
#[async_trait]
pub trait BrokerChannel: Send {
    /// The sequence number the broker will use to confirm the next
    /// submission on this channel.
    ///
    /// Sequence numbers increase monotonically with every submission, the way
    /// AMQP delivery tags do.
    fn next_sequence_number(&self) -> u64;

    /// Hand an envelope to the broker.
    async fn submit(
        &mut self,
        exchange: &str,
        routing_key: &str,
        properties: BasicProperties,
        payload: &[u8],
    ) -> Result<(), ChannelError>;

    fn status(&self) -> HealthStatus;

    /// Release the underlying channel.
    ///
    /// [`ChannelRef`](super::ChannelRef) guarantees this is called at most
    /// once over the channel's lifetime.
    async fn dispose(&mut self);
}
