use std::time::Duration;

use uuid::Uuid;

use super::MessageBody;

/// A typed message body together with the publish metadata resolved from its
/// [`MessageProfile`].
///
/// `Message` is created through [`Message::create`] and immutable afterwards:
/// the correlation id (for request/response types), expiration and persistence
/// flag are fixed at construction time and read back by the property builder
/// when the message is put on the wire.
#[derive(Clone, Debug, PartialEq)]
pub struct Message<T> {
    body: T,
    correlation_id: Option<Uuid>,
    expiration: Option<Duration>,
    persistent: bool,
}

impl<T: MessageBody> Message<T> {
    /// Wrap a body into a message, resolving the publish metadata from the
    /// type's profile.
    ///
    /// Request/response types are assigned a fresh correlation id here, so two
    /// messages created from the same body are distinguishable.
    pub fn create(body: T) -> Self {
        let profile = T::profile();
        Self {
            body,
            correlation_id: profile.request_response.then(Uuid::new_v4),
            expiration: profile.timeout,
            persistent: profile.persistent,
        }
    }
}

impl<T> Message<T> {
    pub fn body(&self) -> &T {
        &self.body
    }

    /// Release the wrapped body.
    pub fn into_body(self) -> T {
        self.body
    }

    /// The correlation id minted for this message, if the type declares
    /// request/response semantics.
    pub fn correlation_id(&self) -> Option<&Uuid> {
        self.correlation_id.as_ref()
    }

    /// How long the broker should keep this message around, if the type
    /// declares a timeout.
    pub fn expiration(&self) -> Option<Duration> {
        self.expiration
    }

    pub fn is_persistent(&self) -> bool {
        self.persistent
    }
}
