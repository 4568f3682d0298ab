//! Admin records: credentials, profile CRUD, soft delete.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

pub use domain::{AdminId, AdminPatch, AdminRecord, AdminView, NewAdmin};
pub use repository::AdminRepository;
pub use router::admin_router;
pub use service::{AdminService, AdminServiceError};
