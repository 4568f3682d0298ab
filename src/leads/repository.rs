use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::store::StoreError;

use super::dedupe::Reservation;
use super::domain::{LeadDocument, LeadId};
use super::scoring::LeadCategory;

/// Query filter for admin lead listings.
#[derive(Debug, Clone)]
pub struct LeadFilter {
    pub status: Option<String>,
    pub suburb: Option<String>,
    pub category: Option<LeadCategory>,
    pub limit: usize,
    pub offset: usize,
}

impl Default for LeadFilter {
    fn default() -> Self {
        Self {
            status: None,
            suburb: None,
            category: None,
            limit: 20,
            offset: 0,
        }
    }
}

impl LeadFilter {
    pub fn constrained_fields(&self) -> usize {
        [
            self.status.is_some(),
            self.suburb.is_some(),
            self.category.is_some(),
        ]
        .iter()
        .filter(|constrained| **constrained)
        .count()
    }

    pub fn matches(&self, lead: &LeadDocument) -> bool {
        if let Some(status) = &self.status {
            if lead.status.current != *status {
                return false;
            }
        }
        if let Some(suburb) = &self.suburb {
            if lead.contact.suburb != *suburb {
                return false;
            }
        }
        if let Some(category) = self.category {
            if lead.scoring.result.category != category {
                return false;
            }
        }
        true
    }
}

/// Durable storage seam for lead documents, so the service module can be
/// exercised against doubles.
#[async_trait]
pub trait LeadRepository: Send + Sync {
    /// Create-only write; fails with [`StoreError::Conflict`] when the id
    /// is already taken.
    async fn insert(&self, lead: LeadDocument) -> Result<LeadDocument, StoreError>;

    async fn fetch(&self, id: &LeadId) -> Result<Option<LeadDocument>, StoreError>;

    /// Replace the stored document if its version still equals
    /// `expected_version`; fails with [`StoreError::Contention`]
    /// otherwise. This is the transactional read-modify-write primitive.
    async fn commit(
        &self,
        lead: LeadDocument,
        expected_version: u64,
    ) -> Result<LeadDocument, StoreError>;

    /// Filtered newest-first listing. May fail with
    /// [`StoreError::IndexUnavailable`] when the backing store has no
    /// index covering the filter combination.
    async fn query(&self, filter: &LeadFilter) -> Result<Vec<LeadDocument>, StoreError>;

    /// Unfiltered newest-first fetch bounded by `cap`, for the
    /// fallback-on-missing-index path.
    async fn scan(&self, cap: usize) -> Result<Vec<LeadDocument>, StoreError>;
}

/// Create-only reservation store for dedupe fingerprints. Reservations
/// are never updated or deleted.
#[async_trait]
pub trait DedupeStore: Send + Sync {
    /// Reserve `fingerprint` for `lead_id`. An existing reservation
    /// wins: the stored lead id comes back instead of being overwritten.
    async fn reserve(
        &self,
        fingerprint: &str,
        lead_id: &LeadId,
        at: DateTime<Utc>,
    ) -> Result<Reservation, StoreError>;
}
