//! Lead ingestion pipeline: deduplication, scoring, record assembly,
//! and transactional status-history mutation, exposed over HTTP.

pub mod builder;
pub mod dedupe;
pub mod domain;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod service;

#[cfg(test)]
mod tests;

pub use dedupe::{fingerprint, Reservation};
pub use domain::{
    ContactInfo, DedupeRecord, LeadDocument, LeadId, LeadPatch, LeadStatus, PublicLeadForm,
    RequestMeta, StatusChange, StatusEntry, Timeframe,
};
pub use repository::{DedupeStore, LeadFilter, LeadRepository};
pub use router::lead_router;
pub use scoring::{compute_score, LeadCategory, ScoreFactors, ScoringResult, SCORE_VERSION};
pub use service::{LeadService, LeadServiceError, SubmissionOutcome};
