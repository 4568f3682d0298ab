use std::sync::Arc;

use chrono::Utc;

use crate::store::{DocumentMetadata, StoreError};

use super::domain::{MessageId, MessagePatch, MessageRecord, NewMessage};
use super::repository::MessageRepository;

/// CRUD service over the messages collection.
pub struct MessageService<S> {
    repository: Arc<S>,
}

#[derive(Debug, thiserror::Error)]
pub enum MessageServiceError {
    #[error("message not found")]
    NotFound,
    #[error(transparent)]
    Storage(StoreError),
}

impl From<StoreError> for MessageServiceError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound => MessageServiceError::NotFound,
            other => MessageServiceError::Storage(other),
        }
    }
}

impl<S: MessageRepository + 'static> MessageService<S> {
    pub fn new(repository: Arc<S>) -> Self {
        Self { repository }
    }

    pub async fn create(&self, new: NewMessage) -> Result<MessageRecord, MessageServiceError> {
        let mut metadata = DocumentMetadata::seed(Utc::now());
        if let Some(tags) = new.tags {
            metadata.tags = tags;
        }
        let record = MessageRecord {
            text_id: MessageId::generate(),
            message: new.message,
            metadata,
        };
        Ok(self.repository.insert(record).await?)
    }

    pub async fn get(&self, id: &MessageId) -> Result<MessageRecord, MessageServiceError> {
        self.repository
            .fetch(id)
            .await?
            .ok_or(MessageServiceError::NotFound)
    }

    pub async fn list(
        &self,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<MessageRecord>, MessageServiceError> {
        Ok(self.repository.list(limit, offset).await?)
    }

    pub async fn update(
        &self,
        id: &MessageId,
        patch: MessagePatch,
    ) -> Result<MessageRecord, MessageServiceError> {
        let mut record = self.get(id).await?;
        if let Some(message) = patch.message {
            record.message = message;
        }
        if let Some(tags) = patch.tags {
            record.metadata.tags = tags;
        }
        record.metadata.updated_at = Utc::now();
        record.metadata.version += 1;
        Ok(self.repository.update(record).await?)
    }

    pub async fn delete(&self, id: &MessageId) -> Result<(), MessageServiceError> {
        Ok(self.repository.delete(id).await?)
    }
}
