use amq_protocol_types::ShortString;
use lapin::BasicProperties;

use crate::messages::{Message, MessageBody};
use crate::routing::Router;
use crate::serialization::MessageSerializer;

/// Assemble the AMQP properties for one outgoing message.
///
/// Only the fields this crate owns are set: content type, delivery mode and,
/// when applicable, reply-to, correlation id and expiration. Everything else
/// is left absent, and absence is observable through the `Option` getters on
/// [`BasicProperties`].
///
/// Invoked while the channel lock is held, so property construction cannot
/// interleave with another task's publish on the same channel.
pub(super) fn build_properties<T, S, R>(
    message: &Message<T>,
    serializer: &S,
    router: &R,
) -> BasicProperties
where
    T: MessageBody,
    S: MessageSerializer,
    R: Router,
{
    let mut properties = BasicProperties::default()
        .with_content_type(ShortString::from(serializer.content_type()))
        // Delivery mode: non-persistent (1) or persistent (2).
        .with_delivery_mode(if message.is_persistent() { 2 } else { 1 });

    if let Some(reply_to) = router.reply_to() {
        properties = properties.with_reply_to(reply_to.into());
    }
    if let Some(correlation_id) = message.correlation_id() {
        properties = properties.with_correlation_id(correlation_id.to_string().into());
    }
    if let Some(expiration) = message.expiration() {
        // The broker expects the per-message TTL as stringified milliseconds.
        properties = properties.with_expiration(expiration.as_millis().to_string().into());
    }

    properties
}
