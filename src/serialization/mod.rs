//! Message payload serialization. [`JsonMessageSerializer`] is the default
//! implementation; bring your own by implementing [`MessageSerializer`].
mod json;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::messages::{Message, MessageBody};

pub use json::JsonMessageSerializer;

/// Converts typed message bodies to wire payloads and back.
///
/// The advertised [`content_type`](MessageSerializer::content_type) ends up in
/// the AMQP properties of every published message, so consumers can pick the
/// matching decoder.
pub trait MessageSerializer: Send + Sync {
    /// MIME-type tag advertised in the message properties.
    fn content_type(&self) -> &'static str;

    /// Encode a message body into a wire payload.
    fn serialize<T>(&self, message: &Message<T>) -> Result<Vec<u8>, SerializationError>
    where
        T: MessageBody + Serialize;

    /// Decode a wire payload back into a message.
    ///
    /// Payloads that do not match the shape of `T` fail with
    /// [`SerializationError::Deserialize`]; a partially-populated message is
    /// never produced.
    fn deserialize<T>(&self, payload: &[u8]) -> Result<Message<T>, SerializationError>
    where
        T: MessageBody + DeserializeOwned;
}

/// Error returned when encoding or decoding a message payload.
#[derive(thiserror::Error, Debug)]
pub enum SerializationError {
    #[error("failed to serialize the message body")]
    Serialize(#[source] anyhow::Error),
    #[error("the message payload does not match the expected shape")]
    Deserialize(#[source] anyhow::Error),
}
