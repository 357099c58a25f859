use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use lapin::BasicProperties;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use nutmeg::channel::{BrokerChannel, ChannelError, ChannelRef, HealthStatus};
use nutmeg::messages::{Message, MessageBody, MessageProfile};
use nutmeg::publishers::{ConfirmingPublisher, Publisher};
use nutmeg::routing::{Router, TypeRouter};
use nutmeg::serialization::{JsonMessageSerializer, MessageSerializer, SerializationError};

/// How long a test is willing to wait for the confirm resolver to catch up.
pub const RESOLVE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderPlaced {
    pub order_id: String,
    pub amount_cents: u64,
}

impl MessageBody for OrderPlaced {}

#[derive(Debug, Serialize, Deserialize)]
pub struct BalanceQuery {
    pub account: String,
}

impl MessageBody for BalanceQuery {
    fn profile() -> MessageProfile {
        MessageProfile::default()
            .request_response()
            .expires_after(Duration::from_secs(60))
    }
}

pub fn an_order() -> OrderPlaced {
    OrderPlaced {
        order_id: "ord-1337".into(),
        amount_cents: 4200,
    }
}

/// One captured `submit` call.
pub struct Submission {
    pub exchange: String,
    pub routing_key: String,
    pub properties: BasicProperties,
    pub payload: Vec<u8>,
}

/// Observable record shared between a [`StubChannel`] and the test body.
#[derive(Default)]
pub struct ChannelLog {
    pub submissions: Mutex<Vec<Submission>>,
    pub dispose_calls: AtomicUsize,
}

impl ChannelLog {
    pub fn submission_count(&self) -> usize {
        self.submissions.lock().unwrap().len()
    }

    pub fn dispose_count(&self) -> usize {
        self.dispose_calls.load(Ordering::SeqCst)
    }
}

/// In-memory broker channel: records every submission and allocates sequence
/// numbers the way an AMQP channel allocates delivery tags, starting at 1.
pub struct StubChannel {
    log: Arc<ChannelLog>,
    next_sequence: u64,
    broken: Arc<AtomicBool>,
}

impl StubChannel {
    pub fn new() -> (Self, Arc<ChannelLog>) {
        let log = Arc::new(ChannelLog::default());
        (
            Self {
                log: Arc::clone(&log),
                next_sequence: 1,
                broken: Arc::new(AtomicBool::new(false)),
            },
            log,
        )
    }

    /// Flip to `true` to make every subsequent submission fail with a channel
    /// fault.
    pub fn breaker(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.broken)
    }
}

#[async_trait]
impl BrokerChannel for StubChannel {
    fn next_sequence_number(&self) -> u64 {
        self.next_sequence
    }

    async fn submit(
        &mut self,
        exchange: &str,
        routing_key: &str,
        properties: BasicProperties,
        payload: &[u8],
    ) -> Result<(), ChannelError> {
        if self.broken.load(Ordering::SeqCst) {
            return Err(ChannelError::Fault(anyhow::anyhow!(
                "simulated connection drop"
            )));
        }
        self.log.submissions.lock().unwrap().push(Submission {
            exchange: exchange.to_string(),
            routing_key: routing_key.to_string(),
            properties,
            payload: payload.to_vec(),
        });
        self.next_sequence += 1;
        Ok(())
    }

    fn status(&self) -> HealthStatus {
        if self.broken.load(Ordering::SeqCst) {
            HealthStatus::Unhealthy
        } else {
            HealthStatus::Healthy
        }
    }

    async fn dispose(&mut self) {
        self.log.dispose_calls.fetch_add(1, Ordering::SeqCst);
    }
}

/// Serializer decorator counting `serialize` calls.
pub struct CountingSerializer {
    inner: JsonMessageSerializer,
    calls: Arc<AtomicUsize>,
}

impl CountingSerializer {
    pub fn new() -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Self {
                inner: JsonMessageSerializer::new(),
                calls: Arc::clone(&calls),
            },
            calls,
        )
    }
}

impl MessageSerializer for CountingSerializer {
    fn content_type(&self) -> &'static str {
        self.inner.content_type()
    }

    fn serialize<T>(&self, message: &Message<T>) -> Result<Vec<u8>, SerializationError>
    where
        T: MessageBody + Serialize,
    {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.serialize(message)
    }

    fn deserialize<T>(&self, payload: &[u8]) -> Result<Message<T>, SerializationError>
    where
        T: MessageBody + DeserializeOwned,
    {
        self.inner.deserialize(payload)
    }
}

/// Router with a fixed key, counting `route` calls.
pub struct CountingRouter {
    routing_key: String,
    calls: Arc<AtomicUsize>,
}

impl CountingRouter {
    pub fn new(routing_key: &str) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Self {
                routing_key: routing_key.to_string(),
                calls: Arc::clone(&calls),
            },
            calls,
        )
    }
}

impl Router for CountingRouter {
    fn route<T: MessageBody>(&self, _message: &Message<T>) -> String {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.routing_key.clone()
    }
}

pub fn get_publisher(
    channel: StubChannel,
) -> Publisher<JsonMessageSerializer, TypeRouter, StubChannel> {
    Publisher::builder(ChannelRef::new(channel)).build()
}

pub fn get_confirming_publisher(
    channel: StubChannel,
) -> ConfirmingPublisher<JsonMessageSerializer, TypeRouter, StubChannel> {
    ConfirmingPublisher::builder(ChannelRef::new(channel)).build()
}
