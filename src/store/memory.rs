use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::admins::domain::{AdminId, AdminRecord};
use crate::admins::repository::AdminRepository;
use crate::leads::dedupe::Reservation;
use crate::leads::domain::{DedupeRecord, LeadDocument, LeadId};
use crate::leads::repository::{DedupeStore, LeadFilter, LeadRepository};
use crate::messages::domain::{MessageId, MessageRecord};
use crate::messages::repository::MessageRepository;

use super::StoreError;

/// In-memory document store standing in for the hosted backend.
///
/// Collections mirror the production store. Lead queries only carry
/// single-field indexes, so compound filters surface
/// [`StoreError::IndexUnavailable`] exactly as the hosted store would
/// without a composite index.
#[derive(Default)]
pub struct MemoryStore {
    leads: Mutex<HashMap<LeadId, LeadDocument>>,
    dedupe: Mutex<HashMap<String, DedupeRecord>>,
    admins: Mutex<HashMap<AdminId, AdminRecord>>,
    messages: Mutex<HashMap<MessageId, MessageRecord>>,
}

fn newest_first_leads(mut leads: Vec<LeadDocument>) -> Vec<LeadDocument> {
    leads.sort_by(|a, b| b.metadata.created_at.cmp(&a.metadata.created_at));
    leads
}

#[async_trait]
impl LeadRepository for MemoryStore {
    async fn insert(&self, lead: LeadDocument) -> Result<LeadDocument, StoreError> {
        let mut guard = self.leads.lock().expect("lead collection mutex poisoned");
        if guard.contains_key(&lead.id) {
            return Err(StoreError::Conflict);
        }
        guard.insert(lead.id.clone(), lead.clone());
        Ok(lead)
    }

    async fn fetch(&self, id: &LeadId) -> Result<Option<LeadDocument>, StoreError> {
        let guard = self.leads.lock().expect("lead collection mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    async fn commit(
        &self,
        lead: LeadDocument,
        expected_version: u64,
    ) -> Result<LeadDocument, StoreError> {
        let mut guard = self.leads.lock().expect("lead collection mutex poisoned");
        let Some(stored) = guard.get(&lead.id) else {
            return Err(StoreError::NotFound);
        };
        if stored.metadata.version != expected_version {
            return Err(StoreError::Contention);
        }
        guard.insert(lead.id.clone(), lead.clone());
        Ok(lead)
    }

    async fn query(&self, filter: &LeadFilter) -> Result<Vec<LeadDocument>, StoreError> {
        let constrained = filter.constrained_fields();
        if constrained > 1 {
            return Err(StoreError::IndexUnavailable(format!(
                "lead filter constrains {constrained} fields, composite index required"
            )));
        }
        let guard = self.leads.lock().expect("lead collection mutex poisoned");
        let matching: Vec<LeadDocument> = guard
            .values()
            .filter(|lead| filter.matches(lead))
            .cloned()
            .collect();
        Ok(newest_first_leads(matching)
            .into_iter()
            .skip(filter.offset)
            .take(filter.limit)
            .collect())
    }

    async fn scan(&self, cap: usize) -> Result<Vec<LeadDocument>, StoreError> {
        let guard = self.leads.lock().expect("lead collection mutex poisoned");
        let all: Vec<LeadDocument> = guard.values().cloned().collect();
        let mut sorted = newest_first_leads(all);
        sorted.truncate(cap);
        Ok(sorted)
    }
}

#[async_trait]
impl DedupeStore for MemoryStore {
    async fn reserve(
        &self,
        fingerprint: &str,
        lead_id: &LeadId,
        at: DateTime<Utc>,
    ) -> Result<Reservation, StoreError> {
        let mut guard = self.dedupe.lock().expect("dedupe collection mutex poisoned");
        match guard.entry(fingerprint.to_string()) {
            Entry::Occupied(entry) => Ok(Reservation::Existing(entry.get().lead_id.clone())),
            Entry::Vacant(slot) => {
                slot.insert(DedupeRecord {
                    lead_id: lead_id.clone(),
                    created_at: at,
                });
                Ok(Reservation::Created)
            }
        }
    }
}

#[async_trait]
impl AdminRepository for MemoryStore {
    async fn insert(&self, record: AdminRecord) -> Result<AdminRecord, StoreError> {
        let mut guard = self.admins.lock().expect("admin collection mutex poisoned");
        if guard.contains_key(&record.admin_id) {
            return Err(StoreError::Conflict);
        }
        guard.insert(record.admin_id.clone(), record.clone());
        Ok(record)
    }

    async fn fetch(&self, id: &AdminId) -> Result<Option<AdminRecord>, StoreError> {
        let guard = self.admins.lock().expect("admin collection mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<AdminRecord>, StoreError> {
        let guard = self.admins.lock().expect("admin collection mutex poisoned");
        Ok(guard
            .values()
            .find(|record| record.username == username)
            .cloned())
    }

    async fn update(&self, record: AdminRecord) -> Result<AdminRecord, StoreError> {
        let mut guard = self.admins.lock().expect("admin collection mutex poisoned");
        if !guard.contains_key(&record.admin_id) {
            return Err(StoreError::NotFound);
        }
        guard.insert(record.admin_id.clone(), record.clone());
        Ok(record)
    }

    async fn list(&self, limit: usize, offset: usize) -> Result<Vec<AdminRecord>, StoreError> {
        let guard = self.admins.lock().expect("admin collection mutex poisoned");
        let mut records: Vec<AdminRecord> = guard
            .values()
            .filter(|record| record.metadata.deleted_at.is_none())
            .cloned()
            .collect();
        records.sort_by(|a, b| b.metadata.created_at.cmp(&a.metadata.created_at));
        Ok(records.into_iter().skip(offset).take(limit).collect())
    }
}

#[async_trait]
impl MessageRepository for MemoryStore {
    async fn insert(&self, record: MessageRecord) -> Result<MessageRecord, StoreError> {
        let mut guard = self
            .messages
            .lock()
            .expect("message collection mutex poisoned");
        if guard.contains_key(&record.text_id) {
            return Err(StoreError::Conflict);
        }
        guard.insert(record.text_id.clone(), record.clone());
        Ok(record)
    }

    async fn fetch(&self, id: &MessageId) -> Result<Option<MessageRecord>, StoreError> {
        let guard = self
            .messages
            .lock()
            .expect("message collection mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    async fn update(&self, record: MessageRecord) -> Result<MessageRecord, StoreError> {
        let mut guard = self
            .messages
            .lock()
            .expect("message collection mutex poisoned");
        if !guard.contains_key(&record.text_id) {
            return Err(StoreError::NotFound);
        }
        guard.insert(record.text_id.clone(), record.clone());
        Ok(record)
    }

    async fn list(&self, limit: usize, offset: usize) -> Result<Vec<MessageRecord>, StoreError> {
        let guard = self
            .messages
            .lock()
            .expect("message collection mutex poisoned");
        let mut records: Vec<MessageRecord> = guard.values().cloned().collect();
        records.sort_by(|a, b| b.metadata.created_at.cmp(&a.metadata.created_at));
        Ok(records.into_iter().skip(offset).take(limit).collect())
    }

    async fn delete(&self, id: &MessageId) -> Result<(), StoreError> {
        let mut guard = self
            .messages
            .lock()
            .expect("message collection mutex poisoned");
        match guard.remove(id) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leads::builder;
    use crate::leads::domain::{PublicLeadForm, RequestMeta, Timeframe};
    use crate::leads::scoring::compute_score;

    fn sample_lead(id: &str) -> LeadDocument {
        let form = PublicLeadForm {
            first_name: "Alex".to_string(),
            last_name: "Nguyen".to_string(),
            email: "alex@example.com".to_string(),
            phone: "0412345678".to_string(),
            preferred_contact: None,
            suburb: Some("Hornsby".to_string()),
            timeframe: Some("1-3 months".to_string()),
            selling_interest: true,
            buying_interest: false,
            utm_source: None,
            utm_medium: None,
            utm_campaign: None,
        };
        let scoring = compute_score(true, false, Timeframe::OneToThreeMonths);
        builder::build_lead(
            LeadId(id.to_string()),
            &form,
            &RequestMeta::default(),
            scoring,
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn duplicate_lead_insert_conflicts() {
        let store = MemoryStore::default();
        LeadRepository::insert(&store, sample_lead("lead-1"))
            .await
            .expect("first insert");
        match LeadRepository::insert(&store, sample_lead("lead-1")).await {
            Err(StoreError::Conflict) => {}
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn commit_enforces_version_check() {
        let store = MemoryStore::default();
        let lead = LeadRepository::insert(&store, sample_lead("lead-1"))
            .await
            .expect("insert");

        let mut updated = lead.clone();
        updated.metadata.version = 2;
        LeadRepository::commit(&store, updated.clone(), 1)
            .await
            .expect("matching version commits");

        match LeadRepository::commit(&store, updated, 1).await {
            Err(StoreError::Contention) => {}
            other => panic!("expected contention, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn composite_filter_reports_missing_index() {
        let store = MemoryStore::default();
        let filter = LeadFilter {
            status: Some("new".to_string()),
            suburb: Some("Hornsby".to_string()),
            ..LeadFilter::default()
        };
        match store.query(&filter).await {
            Err(StoreError::IndexUnavailable(_)) => {}
            other => panic!("expected index unavailable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn reservation_is_create_only() {
        let store = MemoryStore::default();
        let now = Utc::now();
        let first = store
            .reserve("fp-1", &LeadId("lead-a".to_string()), now)
            .await
            .expect("first reservation");
        assert_eq!(first, Reservation::Created);

        let second = store
            .reserve("fp-1", &LeadId("lead-b".to_string()), now)
            .await
            .expect("second reservation");
        assert_eq!(second, Reservation::Existing(LeadId("lead-a".to_string())));
    }
}
