use async_trait::async_trait;

use crate::store::StoreError;

use super::domain::{MessageId, MessageRecord};

/// Storage seam for the messages collection.
#[async_trait]
pub trait MessageRepository: Send + Sync {
    async fn insert(&self, record: MessageRecord) -> Result<MessageRecord, StoreError>;

    async fn fetch(&self, id: &MessageId) -> Result<Option<MessageRecord>, StoreError>;

    async fn update(&self, record: MessageRecord) -> Result<MessageRecord, StoreError>;

    /// Newest-first listing.
    async fn list(&self, limit: usize, offset: usize) -> Result<Vec<MessageRecord>, StoreError>;

    /// Hard delete; fails with [`StoreError::NotFound`] when absent.
    async fn delete(&self, id: &MessageId) -> Result<(), StoreError>;
}
