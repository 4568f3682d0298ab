use async_trait::async_trait;

use crate::store::StoreError;

use super::domain::{AdminId, AdminRecord};

/// Storage seam for the admins collection.
#[async_trait]
pub trait AdminRepository: Send + Sync {
    /// Create-only write; fails with [`StoreError::Conflict`] when the id
    /// is already taken.
    async fn insert(&self, record: AdminRecord) -> Result<AdminRecord, StoreError>;

    async fn fetch(&self, id: &AdminId) -> Result<Option<AdminRecord>, StoreError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<AdminRecord>, StoreError>;

    /// Replace an existing record; fails with [`StoreError::NotFound`]
    /// when the id is absent.
    async fn update(&self, record: AdminRecord) -> Result<AdminRecord, StoreError>;

    /// Newest-first listing of records that are not soft-deleted.
    async fn list(&self, limit: usize, offset: usize) -> Result<Vec<AdminRecord>, StoreError>;
}
