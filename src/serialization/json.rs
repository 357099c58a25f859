use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::messages::{Message, MessageBody};

use super::{MessageSerializer, SerializationError};

/// JSON payload serializer.
///
/// By default unknown fields in an incoming payload are ignored, which keeps
/// consumers compatible with producers that add fields over time. Use
/// [`strict`](JsonMessageSerializer::strict) to reject them instead.
#[derive(Debug, Clone, Default)]
pub struct JsonMessageSerializer {
    deny_unknown_fields: bool,
}

impl JsonMessageSerializer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail deserialization when the payload carries fields the target type
    /// does not declare. Serialization is unaffected.
    #[must_use]
    pub fn strict(mut self) -> Self {
        self.deny_unknown_fields = true;
        self
    }
}

impl MessageSerializer for JsonMessageSerializer {
    fn content_type(&self) -> &'static str {
        "application/json"
    }

    fn serialize<T>(&self, message: &Message<T>) -> Result<Vec<u8>, SerializationError>
    where
        T: MessageBody + Serialize,
    {
        serde_json::to_vec(message.body()).map_err(|e| SerializationError::Serialize(e.into()))
    }

    fn deserialize<T>(&self, payload: &[u8]) -> Result<Message<T>, SerializationError>
    where
        T: MessageBody + DeserializeOwned,
    {
        let mut deserializer = serde_json::Deserializer::from_slice(payload);
        // `serde_json` has no runtime switch for `deny_unknown_fields`, so we
        // record the first ignored path and turn it into an error ourselves.
        let mut unknown_field = None;
        let body: T = serde_ignored::deserialize(&mut deserializer, |path| {
            unknown_field.get_or_insert_with(|| path.to_string());
        })
        .map_err(|e| SerializationError::Deserialize(e.into()))?;
        deserializer
            .end()
            .map_err(|e| SerializationError::Deserialize(e.into()))?;

        if self.deny_unknown_fields {
            if let Some(field) = unknown_field {
                return Err(SerializationError::Deserialize(anyhow::anyhow!(
                    "unknown field `{field}`"
                )));
            }
        }

        Ok(Message::create(body))
    }
}
