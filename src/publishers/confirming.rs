use std::collections::BTreeMap;
use std::sync::Weak;

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::channel::{BrokerChannel, ChannelError, ChannelRef};
use crate::configuration::PublisherSettings;
use crate::messages::{Message, MessageBody};
use crate::routing::{Router, TypeRouter};
use crate::serialization::{JsonMessageSerializer, MessageSerializer};

use super::properties::build_properties;
use super::publisher::{PublishError, Publisher, PublisherBuilder};
use super::receipt::{PublishReceipt, PublishStatus, ReceiptState};

/// A [`Publisher`] that tracks broker delivery confirmations.
///
/// [`publish_with_receipt`](ConfirmingPublisher::publish_with_receipt) hands
/// back a [`PublishReceipt`] immediately; the receipt resolves to
/// [`Ack`](PublishStatus::Ack) or [`Nack`](PublishStatus::Nack) when the
/// broker's confirm signal arrives. The underlying channel must have publisher
/// confirms enabled, and the connection layer is expected to forward the
/// broker's ack/nack notifications into the
/// [`ConfirmHandle`](ConfirmingPublisher::confirm_handle) of this publisher.
///
/// Receipts never stay pending forever: when the channel faults or is
/// disposed, every unconfirmed receipt resolves to `Nack`.
pub struct ConfirmingPublisher<S, R, C> {
    publisher: Publisher<S, R, C>,
    events: mpsc::UnboundedSender<ConfirmEvent>,
}

enum ConfirmEvent {
    Register {
        sequence_number: u64,
        state: Weak<ReceiptState>,
    },
    Settle {
        outcome: PublishStatus,
        sequence_number: u64,
        multiple: bool,
    },
    Discard {
        sequence_number: u64,
    },
    Invalidate,
}

/// The surface broker confirm signals are fed into.
///
/// Cloneable and cheap to pass around; the connection layer registers the
/// broker's confirm listener against one of these. Signals arriving after the
/// publisher is gone are silently dropped.
#[derive(Clone)]
pub struct ConfirmHandle {
    events: mpsc::UnboundedSender<ConfirmEvent>,
}

impl ConfirmHandle {
    /// The broker positively confirmed `sequence_number`. With `multiple`,
    /// every outstanding sequence number up to and including it is covered.
    pub fn ack(&self, sequence_number: u64, multiple: bool) {
        let _ = self.events.send(ConfirmEvent::Settle {
            outcome: PublishStatus::Ack,
            sequence_number,
            multiple,
        });
    }

    /// The broker rejected `sequence_number`. With `multiple`, every
    /// outstanding sequence number up to and including it is covered.
    pub fn nack(&self, sequence_number: u64, multiple: bool) {
        let _ = self.events.send(ConfirmEvent::Settle {
            outcome: PublishStatus::Nack,
            sequence_number,
            multiple,
        });
    }

    /// The channel is gone (closed or faulted): resolve every pending receipt
    /// to [`Nack`](PublishStatus::Nack) so no caller waits forever.
    pub fn invalidate(&self) {
        let _ = self.events.send(ConfirmEvent::Invalidate);
    }
}

impl<C: BrokerChannel> ConfirmingPublisher<JsonMessageSerializer, TypeRouter, C> {
    /// Start building a [`ConfirmingPublisher`] on top of `channel`, with the
    /// JSON serializer, type-name routing and the default exchange.
    pub fn builder(
        channel: ChannelRef<C>,
    ) -> ConfirmingPublisherBuilder<JsonMessageSerializer, TypeRouter, C> {
        ConfirmingPublisherBuilder {
            inner: Publisher::builder(channel),
        }
    }

    /// Start building a [`ConfirmingPublisher`] configured from `settings`.
    pub fn from_settings(
        channel: ChannelRef<C>,
        settings: &PublisherSettings,
    ) -> ConfirmingPublisherBuilder<JsonMessageSerializer, TypeRouter, C> {
        ConfirmingPublisherBuilder {
            inner: Publisher::from_settings(channel, settings),
        }
    }
}

impl<S, R, C> ConfirmingPublisher<S, R, C>
where
    S: MessageSerializer,
    R: Router,
    C: BrokerChannel,
{
    /// Publish without tracking the confirmation.
    pub async fn publish<T>(&self, body: T) -> Result<(), PublishError>
    where
        T: MessageBody + Serialize,
    {
        self.publisher.publish(body).await
    }

    /// The handle the connection layer feeds broker confirm signals into.
    pub fn confirm_handle(&self) -> ConfirmHandle {
        ConfirmHandle {
            events: self.events.clone(),
        }
    }

    /// Publish a message and get a [`PublishReceipt`] tracking its
    /// confirmation.
    ///
    /// The receipt is returned with status [`Pending`](PublishStatus::Pending)
    /// as soon as the envelope has been handed to the channel; it resolves out
    /// of band when the broker confirms.
    #[tracing::instrument(level = "debug", skip(self, body))]
    pub async fn publish_with_receipt<T>(&self, body: T) -> Result<PublishReceipt, PublishError>
    where
        T: MessageBody + Serialize,
    {
        let message = Message::create(body);
        let payload = self.publisher.serializer.serialize(&message)?;
        let routing_key = self.publisher.router.route(&message);
        let exchange = self.publisher.exchange.clone();
        let events = self.events.clone();
        let receipt = self
            .publisher
            .channel
            .execute(|channel| {
                // Sequence number, registration and submission all happen
                // under the channel lock: a publish racing in between would
                // steal the sequence number and misattribute the broker's
                // confirms.
                let sequence_number = channel.next_sequence_number();
                let (receipt, state) = PublishReceipt::pending(sequence_number);
                let _ = self.events.send(ConfirmEvent::Register {
                    sequence_number,
                    state,
                });
                let properties =
                    build_properties(&message, &self.publisher.serializer, &self.publisher.router);
                Box::pin(async move {
                    match channel
                        .submit(&exchange, &routing_key, properties, &payload)
                        .await
                    {
                        Ok(()) => Ok(receipt),
                        Err(error) => {
                            // The receipt is already registered but nothing
                            // reached the broker: settle it instead of leaving
                            // it pending. A faulted channel orphans every
                            // other pending receipt too.
                            match &error {
                                ChannelError::Fault(_) => {
                                    let _ = events.send(ConfirmEvent::Invalidate);
                                }
                                _ => {
                                    let _ = events.send(ConfirmEvent::Discard { sequence_number });
                                }
                            }
                            Err(error)
                        }
                    }
                })
            })
            .await?;
        Ok(receipt)
    }

    /// Dispose the underlying channel reference and resolve every pending
    /// receipt to [`Nack`](PublishStatus::Nack).
    ///
    /// Idempotent, also under concurrent callers.
    pub async fn dispose(&self) {
        self.publisher.dispose().await;
        let _ = self.events.send(ConfirmEvent::Invalidate);
    }
}

/// A builder for [`ConfirmingPublisher`].
///
/// Use [`ConfirmingPublisher::builder`] as entrypoint.
pub struct ConfirmingPublisherBuilder<S, R, C> {
    inner: PublisherBuilder<S, R, C>,
}

impl<S, R, C> ConfirmingPublisherBuilder<S, R, C>
where
    S: MessageSerializer,
    R: Router,
    C: BrokerChannel,
{
    /// The exchange messages are published to.
    /// Defaults to the default exchange (`""`) if left unspecified.
    #[must_use]
    pub fn exchange(self, exchange: impl Into<String>) -> Self {
        Self {
            inner: self.inner.exchange(exchange),
        }
    }

    /// Replace the payload serializer.
    #[must_use]
    pub fn serializer<S2: MessageSerializer>(
        self,
        serializer: S2,
    ) -> ConfirmingPublisherBuilder<S2, R, C> {
        ConfirmingPublisherBuilder {
            inner: self.inner.serializer(serializer),
        }
    }

    /// Replace the router.
    #[must_use]
    pub fn router<R2: Router>(self, router: R2) -> ConfirmingPublisherBuilder<S, R2, C> {
        ConfirmingPublisherBuilder {
            inner: self.inner.router(router),
        }
    }

    /// Finalise the builder and get an instance of [`ConfirmingPublisher`].
    ///
    /// Spawns the confirm resolver task, so this must be called from within a
    /// tokio runtime.
    pub fn build(self) -> ConfirmingPublisher<S, R, C> {
        let (events, receiver) = mpsc::unbounded_channel();
        tokio::spawn(run_resolver(receiver));
        ConfirmingPublisher {
            publisher: self.inner.build(),
            events,
        }
    }
}

/// Consumes confirm events and resolves pending receipts.
///
/// The resolver task is the only owner of the pending table: the publish path
/// and the broker's confirm path both talk to it through the event queue, so
/// no lock is ever shared between them. Registrations are enqueued while the
/// channel lock is still held, which means they always precede the confirm
/// events the broker can emit for them.
async fn run_resolver(mut events: mpsc::UnboundedReceiver<ConfirmEvent>) {
    let mut pending: BTreeMap<u64, Weak<ReceiptState>> = BTreeMap::new();
    while let Some(event) = events.recv().await {
        match event {
            ConfirmEvent::Register {
                sequence_number,
                state,
            } => {
                pending.insert(sequence_number, state);
            }
            ConfirmEvent::Settle {
                outcome,
                sequence_number,
                multiple,
            } => {
                if multiple {
                    // Everything up to and including `sequence_number` is
                    // covered by this confirm.
                    let still_pending = pending.split_off(&(sequence_number + 1));
                    let settled = std::mem::replace(&mut pending, still_pending);
                    debug!(
                        sequence_number,
                        count = settled.len(),
                        ?outcome,
                        "settling confirmed publishes"
                    );
                    for state in settled.into_values() {
                        resolve(state, outcome);
                    }
                } else if let Some(state) = pending.remove(&sequence_number) {
                    resolve(state, outcome);
                } else {
                    warn!(sequence_number, "confirm for an unknown sequence number");
                }
            }
            ConfirmEvent::Discard { sequence_number } => {
                if let Some(state) = pending.remove(&sequence_number) {
                    resolve(state, PublishStatus::Nack);
                }
            }
            ConfirmEvent::Invalidate => {
                let orphaned = std::mem::take(&mut pending);
                if !orphaned.is_empty() {
                    warn!(
                        count = orphaned.len(),
                        "channel invalidated with unconfirmed publishes, resolving them to nack"
                    );
                }
                for state in orphaned.into_values() {
                    resolve(state, PublishStatus::Nack);
                }
            }
        }
    }
    // The publisher and every confirm handle are gone: no confirm can arrive
    // anymore, so receipts still pending can only resolve negatively.
    for state in std::mem::take(&mut pending).into_values() {
        resolve(state, PublishStatus::Nack);
    }
    debug!("confirm resolver stopped");
}

fn resolve(state: Weak<ReceiptState>, outcome: PublishStatus) {
    // The caller may have dropped its receipt; nothing to resolve then.
    if let Some(state) = state.upgrade() {
        state.resolve(outcome);
    }
}
