//! Stored message templates used by the admin dashboard.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

pub use domain::{MessageId, MessagePatch, MessageRecord, NewMessage};
pub use repository::MessageRepository;
pub use router::message_router;
pub use service::{MessageService, MessageServiceError};
