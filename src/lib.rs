//! `nutmeg` is the publish side of a RabbitMQ client: it turns typed messages
//! into wire-ready envelopes, routes them, and optionally tracks the broker's
//! delivery confirmations — all while keeping a single, non-thread-safe AMQP
//! channel safe to share between concurrent publishers.
//!
//! [`Publisher`](crate::publishers::Publisher) and
//! [`ConfirmingPublisher`](crate::publishers::ConfirmingPublisher) are the
//! best starting points to learn more about what `nutmeg` provides and how to
//! leverage it.
//!
//! Connection establishment, topology declaration and message consumption are
//! deliberately out of scope: the
//! [`BrokerChannel`](crate::channel::BrokerChannel) trait is the boundary a
//! connection layer plugs into.

pub mod messages;
pub mod publishers;
pub mod routing;
pub mod serialization;

pub mod channel;
pub mod configuration;
