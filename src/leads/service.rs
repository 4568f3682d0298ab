use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use crate::notify::{self, DeliveryMode, Notice, Notifier};
use crate::store::StoreError;

use super::builder::{self, IntakeError};
use super::dedupe::{self, Reservation};
use super::domain::{
    LeadDocument, LeadId, LeadPatch, PublicLeadForm, RequestMeta, ScoringSnapshot, StatusChange,
    StatusEntry, StatusPatch, Timeframe,
};
use super::repository::{DedupeStore, LeadFilter, LeadRepository};
use super::scoring::{compute_score, LeadCategory};

/// Optimistic-transaction attempts before contention surfaces to the
/// caller.
const TXN_RETRIES: usize = 3;
/// Fetch cap for the unindexed fallback listing.
const LIST_SCAN_CAP: usize = 500;

/// Service composing the dedupe gate, scoring engine, record builder,
/// and status-history mutator over the repository seam.
pub struct LeadService<R, D, N> {
    repository: Arc<R>,
    dedupe: Arc<D>,
    notifier: Arc<N>,
    delivery_mode: DeliveryMode,
}

/// Result of a public form submission.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionOutcome {
    pub is_new: bool,
    pub lead_id: LeadId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<LeadCategory>,
}

/// Error raised by the lead service.
#[derive(Debug, thiserror::Error)]
pub enum LeadServiceError {
    #[error(transparent)]
    Intake(#[from] IntakeError),
    #[error("lead not found")]
    NotFound,
    #[error(transparent)]
    Storage(StoreError),
}

impl From<StoreError> for LeadServiceError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound => LeadServiceError::NotFound,
            other => LeadServiceError::Storage(other),
        }
    }
}

impl<R, D, N> LeadService<R, D, N>
where
    R: LeadRepository + 'static,
    D: DedupeStore + 'static,
    N: Notifier + 'static,
{
    pub fn new(
        repository: Arc<R>,
        dedupe: Arc<D>,
        notifier: Arc<N>,
        delivery_mode: DeliveryMode,
    ) -> Self {
        Self {
            repository,
            dedupe,
            notifier,
            delivery_mode,
        }
    }

    /// Run the intake pipeline for a public form submission: fingerprint,
    /// reserve, score, build, persist, notify.
    pub async fn submit(
        &self,
        form: PublicLeadForm,
        meta: RequestMeta,
    ) -> Result<SubmissionOutcome, LeadServiceError> {
        builder::validate_form(&form)?;

        let now = Utc::now();
        let fingerprint = dedupe::fingerprint(&form.email, &form.phone, now.date_naive());

        // The candidate id goes into the reservation before the lead is
        // written, so a lost race creates no orphan document.
        let candidate = LeadId::generate();
        match self.dedupe.reserve(&fingerprint, &candidate, now).await? {
            Reservation::Existing(lead_id) => {
                return Ok(SubmissionOutcome {
                    is_new: false,
                    lead_id,
                    score: None,
                    category: None,
                });
            }
            Reservation::Created => {}
        }

        let timeframe = form
            .timeframe
            .as_deref()
            .map(Timeframe::parse)
            .unwrap_or_default();
        let scoring = compute_score(form.selling_interest, form.buying_interest, timeframe);
        let lead = builder::build_lead(candidate, &form, &meta, scoring, now);
        let stored = self.repository.insert(lead).await?;

        self.announce(&stored).await;

        Ok(SubmissionOutcome {
            is_new: true,
            lead_id: stored.id.clone(),
            score: Some(stored.scoring.result.total_score),
            category: Some(stored.scoring.result.category),
        })
    }

    pub async fn get(&self, id: &LeadId) -> Result<LeadDocument, LeadServiceError> {
        self.repository
            .fetch(id)
            .await?
            .ok_or(LeadServiceError::NotFound)
    }

    /// Filtered listing. When the store reports a missing index the
    /// service degrades to a capped scan filtered in process.
    pub async fn list(&self, filter: LeadFilter) -> Result<Vec<LeadDocument>, LeadServiceError> {
        match self.repository.query(&filter).await {
            Ok(leads) => Ok(leads),
            Err(StoreError::IndexUnavailable(detail)) => {
                warn!(%detail, "lead query lacks an index, falling back to capped scan");
                let scanned = self.repository.scan(LIST_SCAN_CAP).await?;
                Ok(scanned
                    .into_iter()
                    .filter(|lead| filter.matches(lead))
                    .skip(filter.offset)
                    .take(filter.limit)
                    .collect())
            }
            Err(err) => Err(err.into()),
        }
    }

    pub async fn change_status(
        &self,
        id: &LeadId,
        change: StatusChange,
    ) -> Result<LeadDocument, LeadServiceError> {
        let patch = LeadPatch {
            status: Some(StatusPatch {
                current: Some(change.status),
                notes: change.notes,
                changed_by: Some(change.changed_by),
            }),
            ..LeadPatch::default()
        };
        self.apply_patch(id, patch).await
    }

    /// Apply a partial update inside one optimistic transaction,
    /// retrying a bounded number of times on contention.
    pub async fn apply_patch(
        &self,
        id: &LeadId,
        patch: LeadPatch,
    ) -> Result<LeadDocument, LeadServiceError> {
        let mut attempt = 0;
        loop {
            let current = self.get(id).await?;
            let expected = current.metadata.version;
            let next = apply_patch_to(current, &patch, Utc::now());
            match self.repository.commit(next, expected).await {
                Ok(stored) => return Ok(stored),
                Err(StoreError::Contention) if attempt + 1 < TXN_RETRIES => {
                    attempt += 1;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Terminal, idempotent soft delete: the first deletion timestamp
    /// sticks and repeat calls are read-only successes.
    pub async fn soft_delete(&self, id: &LeadId) -> Result<LeadDocument, LeadServiceError> {
        let mut attempt = 0;
        loop {
            let mut current = self.get(id).await?;
            if current.metadata.deleted_at.is_some() {
                return Ok(current);
            }
            let expected = current.metadata.version;
            let now = Utc::now();
            current.metadata.deleted_at = Some(now);
            current.metadata.updated_at = now;
            current.metadata.version = expected + 1;
            match self.repository.commit(current, expected).await {
                Ok(stored) => return Ok(stored),
                Err(StoreError::Contention) if attempt + 1 < TXN_RETRIES => {
                    attempt += 1;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    async fn announce(&self, lead: &LeadDocument) {
        notify::dispatch(
            self.notifier.clone(),
            self.delivery_mode,
            Notice::submitter_confirmation(lead),
        )
        .await;
        if lead.scoring.result.category == LeadCategory::Hot {
            notify::dispatch(
                self.notifier.clone(),
                self.delivery_mode,
                Notice::admin_alert(lead),
            )
            .await;
        }
    }
}

/// Pure patch application. History stays append-only, a repeated status
/// appends nothing, and a change to any scoring input triggers a
/// rescore whose factors land in `custom_fields` without touching
/// unrelated keys.
fn apply_patch_to(mut lead: LeadDocument, patch: &LeadPatch, now: DateTime<Utc>) -> LeadDocument {
    let mut rescore = false;

    if let Some(contact) = &patch.contact {
        if let Some(first_name) = &contact.first_name {
            lead.contact.first_name = first_name.trim().to_string();
        }
        if let Some(last_name) = &contact.last_name {
            lead.contact.last_name = last_name.trim().to_string();
        }
        if let Some(email) = &contact.email {
            lead.contact.email = email.trim().to_lowercase();
        }
        if let Some(phone) = &contact.phone {
            lead.contact.phone = phone.trim().to_string();
        }
        if let Some(preferred) = contact.preferred_contact {
            lead.contact.preferred_contact = preferred;
        }
        if let Some(suburb) = &contact.suburb {
            lead.contact.suburb = suburb.clone();
        }
        if let Some(raw) = &contact.timeframe {
            let parsed = Timeframe::parse(raw);
            if parsed != lead.contact.timeframe {
                lead.contact.timeframe = parsed;
                rescore = true;
            }
        }
        if let Some(selling) = contact.selling_interest {
            if selling != lead.contact.selling_interest {
                lead.contact.selling_interest = selling;
                rescore = true;
            }
        }
        if let Some(buying) = contact.buying_interest {
            if buying != lead.contact.buying_interest {
                lead.contact.buying_interest = buying;
                rescore = true;
            }
        }
    }

    if rescore {
        let scoring = compute_score(
            lead.contact.selling_interest,
            lead.contact.buying_interest,
            lead.contact.timeframe,
        );
        lead.metadata.custom_fields.insert(
            "scoring_factors".to_string(),
            builder::scoring_custom_fields(&scoring.factors),
        );
        lead.scoring = ScoringSnapshot {
            result: scoring,
            scored_at: now,
        };
    }

    if let Some(status) = &patch.status {
        if let Some(next) = &status.current {
            if *next != lead.status.current {
                let changed_by = status
                    .changed_by
                    .clone()
                    .unwrap_or_else(|| "system".to_string());
                lead.status.history.push(StatusEntry {
                    status: next.clone(),
                    changed_at: now,
                    changed_by,
                    notes: status.notes.clone().unwrap_or_default(),
                });
                lead.status.current = next.clone();
            }
        }
    }

    if let Some(metadata) = &patch.metadata {
        if let Some(tags) = &metadata.tags {
            lead.metadata.tags = tags.clone();
        }
        if let Some(fields) = &metadata.custom_fields {
            for (key, value) in fields {
                lead.metadata
                    .custom_fields
                    .insert(key.clone(), value.clone());
            }
        }
    }

    lead.metadata.updated_at = now;
    lead.metadata.version += 1;
    lead
}
