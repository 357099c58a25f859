use serde::Serialize;

use crate::channel::{BrokerChannel, ChannelError, ChannelRef};
use crate::configuration::PublisherSettings;
use crate::messages::{Message, MessageBody};
use crate::routing::{Router, TypeRouter};
use crate::serialization::{JsonMessageSerializer, MessageSerializer, SerializationError};

use super::properties::build_properties;

/// A high-level interface to publish typed messages.
///
/// `publish` wraps the body into a [`Message`], serializes it, derives the
/// routing key, and then — under exclusive access to the channel — assembles
/// the AMQP properties and hands the envelope over. Any number of publishers
/// can share one [`ChannelRef`]; operations on the channel never interleave.
///
/// # How do I build a `Publisher`?
///
/// `Publisher` provides a fluent API to add configuration step-by-step, known
/// as "builder pattern" in Rust.
/// The starting point is [`Publisher::builder`].
///
/// ```rust
/// use nutmeg::channel::{BrokerChannel, ChannelRef};
/// use nutmeg::publishers::Publisher;
/// use nutmeg::routing::StaticRouter;
/// use nutmeg::serialization::JsonMessageSerializer;
///
/// fn get_publisher<C: BrokerChannel>(
///     channel: ChannelRef<C>,
/// ) -> Publisher<JsonMessageSerializer, StaticRouter, C> {
///     Publisher::builder(channel)
///         .exchange("orders")
///         .router(StaticRouter::new("orders.placed"))
///         .build()
/// }
/// ```
pub struct Publisher<S, R, C> {
    pub(super) serializer: S,
    pub(super) router: R,
    pub(super) channel: ChannelRef<C>,
    /// The exchange messages are published to. The empty string is the
    /// default exchange, which routes straight to the queue named like the
    /// routing key.
    pub(super) exchange: String,
}

impl<C: BrokerChannel> Publisher<JsonMessageSerializer, TypeRouter, C> {
    /// Start building a [`Publisher`] on top of `channel`, with the JSON
    /// serializer, type-name routing and the default exchange.
    pub fn builder(
        channel: ChannelRef<C>,
    ) -> PublisherBuilder<JsonMessageSerializer, TypeRouter, C> {
        PublisherBuilder::new(channel)
    }

    /// Start building a [`Publisher`] configured from `settings`.
    pub fn from_settings(
        channel: ChannelRef<C>,
        settings: &PublisherSettings,
    ) -> PublisherBuilder<JsonMessageSerializer, TypeRouter, C> {
        let serializer = if settings.strict_payloads {
            JsonMessageSerializer::new().strict()
        } else {
            JsonMessageSerializer::new()
        };
        PublisherBuilder::new(channel)
            .serializer(serializer)
            .exchange(settings.exchange.clone())
    }
}

impl<S, R, C> Publisher<S, R, C>
where
    S: MessageSerializer,
    R: Router,
    C: BrokerChannel,
{
    /// Publish a message to the broker.
    ///
    /// Returns as soon as the envelope has been handed to the channel; it does
    /// not wait for a delivery confirmation. Use
    /// [`ConfirmingPublisher`](super::ConfirmingPublisher) to track confirms.
    #[tracing::instrument(level = "debug", skip(self, body))]
    pub async fn publish<T>(&self, body: T) -> Result<(), PublishError>
    where
        T: MessageBody + Serialize,
    {
        self.publish_message(Message::create(body)).await
    }

    /// Publish an already-wrapped message.
    ///
    /// Useful when the caller needs the message metadata — e.g. the generated
    /// correlation id of a request — before the publish happens.
    pub async fn publish_message<T>(&self, message: Message<T>) -> Result<(), PublishError>
    where
        T: MessageBody + Serialize,
    {
        let payload = self.serializer.serialize(&message)?;
        let routing_key = self.router.route(&message);
        let exchange = self.exchange.clone();
        self.channel
            .execute(|channel| {
                let properties = build_properties(&message, &self.serializer, &self.router);
                Box::pin(async move {
                    channel
                        .submit(&exchange, &routing_key, properties, &payload)
                        .await
                })
            })
            .await?;
        Ok(())
    }

    /// Dispose the underlying channel reference.
    ///
    /// Idempotent, also under concurrent callers: the channel itself is
    /// disposed exactly once. Publishing afterwards fails with
    /// [`ChannelError::Disposed`].
    pub async fn dispose(&self) {
        self.channel.dispose().await;
    }
}

/// Error returned when trying to publish a message.
///
/// Failures are surfaced directly to the caller; this crate performs no
/// retries. A failed publish leaves no partial state behind.
#[derive(thiserror::Error, Debug)]
pub enum PublishError {
    #[error("failed to serialize the outgoing message")]
    Serialization(#[from] SerializationError),
    #[error("failed to hand the message to the broker channel")]
    Channel(#[from] ChannelError),
}

/// A builder for [`Publisher`].
///
/// Use [`Publisher::builder`] as entrypoint.
pub struct PublisherBuilder<S, R, C> {
    serializer: S,
    router: R,
    channel: ChannelRef<C>,
    exchange: String,
}

impl<C: BrokerChannel> PublisherBuilder<JsonMessageSerializer, TypeRouter, C> {
    fn new(channel: ChannelRef<C>) -> Self {
        Self {
            serializer: JsonMessageSerializer::new(),
            router: TypeRouter::new(),
            channel,
            exchange: String::new(),
        }
    }
}

impl<S, R, C> PublisherBuilder<S, R, C>
where
    S: MessageSerializer,
    R: Router,
    C: BrokerChannel,
{
    /// The exchange messages are published to.
    /// Defaults to the default exchange (`""`) if left unspecified.
    #[must_use]
    pub fn exchange(mut self, exchange: impl Into<String>) -> Self {
        self.exchange = exchange.into();
        self
    }

    /// Replace the payload serializer.
    #[must_use]
    pub fn serializer<S2: MessageSerializer>(self, serializer: S2) -> PublisherBuilder<S2, R, C> {
        PublisherBuilder {
            serializer,
            router: self.router,
            channel: self.channel,
            exchange: self.exchange,
        }
    }

    /// Replace the router.
    #[must_use]
    pub fn router<R2: Router>(self, router: R2) -> PublisherBuilder<S, R2, C> {
        PublisherBuilder {
            serializer: self.serializer,
            router,
            channel: self.channel,
            exchange: self.exchange,
        }
    }

    /// Finalise the builder and get an instance of [`Publisher`].
    pub fn build(self) -> Publisher<S, R, C> {
        Publisher {
            serializer: self.serializer,
            router: self.router,
            channel: self.channel,
            exchange: self.exchange,
        }
    }
}
