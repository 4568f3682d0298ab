use std::sync::Arc;

use chrono::Utc;

use crate::auth;
use crate::store::{DocumentMetadata, StoreError};

use super::domain::{AdminId, AdminPatch, AdminRecord, NewAdmin};
use super::repository::AdminRepository;

/// CRUD service over the admins collection.
pub struct AdminService<S> {
    repository: Arc<S>,
}

#[derive(Debug, thiserror::Error)]
pub enum AdminServiceError {
    #[error("admin not found")]
    NotFound,
    #[error("username already taken")]
    UsernameTaken,
    #[error(transparent)]
    Storage(StoreError),
}

impl From<StoreError> for AdminServiceError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound => AdminServiceError::NotFound,
            other => AdminServiceError::Storage(other),
        }
    }
}

impl<S: AdminRepository + 'static> AdminService<S> {
    pub fn new(repository: Arc<S>) -> Self {
        Self { repository }
    }

    pub async fn create(&self, new: NewAdmin) -> Result<AdminRecord, AdminServiceError> {
        if self
            .repository
            .find_by_username(&new.username)
            .await?
            .is_some()
        {
            return Err(AdminServiceError::UsernameTaken);
        }

        let record = AdminRecord {
            admin_id: AdminId::generate(),
            username: new.username,
            password_hash: auth::hash_password(&new.password),
            first_name: new.first_name.trim().to_string(),
            last_name: new.last_name.trim().to_string(),
            email: new.email.trim().to_lowercase(),
            role: new.role.unwrap_or_else(|| "admin".to_string()),
            metadata: DocumentMetadata::seed(Utc::now()),
        };
        Ok(self.repository.insert(record).await?)
    }

    pub async fn get(&self, id: &AdminId) -> Result<AdminRecord, AdminServiceError> {
        self.repository
            .fetch(id)
            .await?
            .ok_or(AdminServiceError::NotFound)
    }

    pub async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<AdminRecord>, AdminServiceError> {
        Ok(self.repository.find_by_username(username).await?)
    }

    pub async fn list(
        &self,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<AdminRecord>, AdminServiceError> {
        Ok(self.repository.list(limit, offset).await?)
    }

    pub async fn update(
        &self,
        id: &AdminId,
        patch: AdminPatch,
    ) -> Result<AdminRecord, AdminServiceError> {
        let mut record = self.get(id).await?;

        if let Some(first_name) = patch.first_name {
            record.first_name = first_name.trim().to_string();
        }
        if let Some(last_name) = patch.last_name {
            record.last_name = last_name.trim().to_string();
        }
        if let Some(email) = patch.email {
            record.email = email.trim().to_lowercase();
        }
        if let Some(role) = patch.role {
            record.role = role;
        }
        if let Some(password) = patch.password {
            record.password_hash = auth::hash_password(&password);
        }

        record.metadata.updated_at = Utc::now();
        record.metadata.version += 1;
        Ok(self.repository.update(record).await?)
    }

    /// Idempotent soft delete: a repeat call keeps the first timestamp.
    pub async fn soft_delete(&self, id: &AdminId) -> Result<AdminRecord, AdminServiceError> {
        let mut record = self.get(id).await?;
        if record.metadata.deleted_at.is_some() {
            return Ok(record);
        }
        let now = Utc::now();
        record.metadata.deleted_at = Some(now);
        record.metadata.updated_at = now;
        record.metadata.version += 1;
        Ok(self.repository.update(record).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn service() -> AdminService<MemoryStore> {
        AdminService::new(Arc::new(MemoryStore::default()))
    }

    fn new_admin(username: &str) -> NewAdmin {
        NewAdmin {
            username: username.to_string(),
            password: "hunter22".to_string(),
            first_name: "Jordan".to_string(),
            last_name: "Smith".to_string(),
            email: "  Jordan@Example.com ".to_string(),
            role: None,
        }
    }

    #[tokio::test]
    async fn create_digests_password_and_normalizes_email() {
        let service = service();
        let record = service.create(new_admin("jsmith")).await.expect("creates");
        assert_ne!(record.password_hash, "hunter22");
        assert!(crate::auth::verify_password("hunter22", &record.password_hash));
        assert_eq!(record.email, "jordan@example.com");
        assert_eq!(record.role, "admin");
    }

    #[tokio::test]
    async fn duplicate_username_is_rejected() {
        let service = service();
        service.create(new_admin("jsmith")).await.expect("creates");
        match service.create(new_admin("jsmith")).await {
            Err(AdminServiceError::UsernameTaken) => {}
            other => panic!("expected username conflict, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn list_excludes_soft_deleted_records() {
        let service = service();
        let keep = service.create(new_admin("keep")).await.expect("creates");
        let drop = service.create(new_admin("drop")).await.expect("creates");
        service
            .soft_delete(&drop.admin_id)
            .await
            .expect("soft delete");

        let listed = service.list(20, 0).await.expect("lists");
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].admin_id, keep.admin_id);
    }

    #[tokio::test]
    async fn soft_delete_is_idempotent() {
        let service = service();
        let record = service.create(new_admin("jsmith")).await.expect("creates");
        let first = service
            .soft_delete(&record.admin_id)
            .await
            .expect("first delete");
        let second = service
            .soft_delete(&record.admin_id)
            .await
            .expect("second delete");
        assert_eq!(first.metadata.deleted_at, second.metadata.deleted_at);
        assert_eq!(first.metadata.version, second.metadata.version);
    }

    #[tokio::test]
    async fn update_rehashes_password() {
        let service = service();
        let record = service.create(new_admin("jsmith")).await.expect("creates");
        let updated = service
            .update(
                &record.admin_id,
                AdminPatch {
                    password: Some("new-secret".to_string()),
                    ..AdminPatch::default()
                },
            )
            .await
            .expect("updates");
        assert!(crate::auth::verify_password(
            "new-secret",
            &updated.password_hash
        ));
        assert!(!crate::auth::verify_password(
            "hunter22",
            &updated.password_hash
        ));
    }
}
