use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::DocumentMetadata;

/// Identifier wrapper for message records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl MessageId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

/// Stored message text. Unlike leads and admins this collection uses
/// hard deletes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageRecord {
    pub text_id: MessageId,
    pub message: String,
    pub metadata: DocumentMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMessage {
    pub message: String,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessagePatch {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}
