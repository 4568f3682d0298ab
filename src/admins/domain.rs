use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::DocumentMetadata;

/// Identifier wrapper for admin records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AdminId(pub String);

impl AdminId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

/// Stored admin credential and profile record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminRecord {
    pub admin_id: AdminId,
    pub username: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: String,
    pub metadata: DocumentMetadata,
}

impl AdminRecord {
    /// Response view without the credential digest.
    pub fn view(&self) -> AdminView {
        AdminView {
            admin_id: self.admin_id.clone(),
            username: self.username.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
            role: self.role.clone(),
            created_at: self.metadata.created_at,
            deleted_at: self.metadata.deleted_at,
        }
    }
}

/// Sanitized admin representation returned by the API.
#[derive(Debug, Clone, Serialize)]
pub struct AdminView {
    pub admin_id: AdminId,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Create payload; the password arrives plain and is digested before
/// storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAdmin {
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub role: Option<String>,
}

/// Partial update to an admin record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdminPatch {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}
