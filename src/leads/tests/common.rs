use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::response::Response;
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::admins::domain::{AdminId, AdminRecord};
use crate::auth::{hash_password, AuthGuard, JwtService};
use crate::leads::dedupe::Reservation;
use crate::leads::domain::{LeadDocument, LeadId, PublicLeadForm, RequestMeta};
use crate::leads::repository::{DedupeStore, LeadFilter, LeadRepository};
use crate::leads::service::LeadService;
use crate::notify::{DeliveryMode, Notice, Notifier, NotifyError};
use crate::store::{DocumentMetadata, MemoryStore, StoreError};

/// Selling lead with a 1-3 month horizon; scores 90 (HOT).
pub(super) fn form() -> PublicLeadForm {
    PublicLeadForm {
        first_name: "Alex".to_string(),
        last_name: "Nguyen".to_string(),
        email: "alex.nguyen@example.com".to_string(),
        phone: "0412 345 678".to_string(),
        preferred_contact: None,
        suburb: Some("Hornsby".to_string()),
        timeframe: Some("1-3 months".to_string()),
        selling_interest: true,
        buying_interest: false,
        utm_source: Some("Facebook".to_string()),
        utm_medium: Some("cpc".to_string()),
        utm_campaign: Some("spring-appraisals".to_string()),
    }
}

/// No interest and no timeframe; scores 40 (WARM), no admin alert.
pub(super) fn lukewarm_form() -> PublicLeadForm {
    PublicLeadForm {
        selling_interest: false,
        buying_interest: false,
        timeframe: Some("not sure".to_string()),
        email: "casual.browser@example.com".to_string(),
        phone: "0499 000 111".to_string(),
        ..form()
    }
}

pub(super) fn meta() -> RequestMeta {
    RequestMeta {
        acting_user_id: None,
        ip: "203.0.113.7, 10.0.0.1".to_string(),
        user_agent: "Mozilla/5.0".to_string(),
        referrer: "https://example.com/".to_string(),
    }
}

pub(super) fn build_service() -> (
    LeadService<MemoryStore, MemoryStore, MemoryNotifier>,
    Arc<MemoryStore>,
    Arc<MemoryNotifier>,
) {
    let store = Arc::new(MemoryStore::default());
    let notifier = Arc::new(MemoryNotifier::default());
    // Awaited delivery keeps notice capture deterministic in tests.
    let service = LeadService::new(
        store.clone(),
        store.clone(),
        notifier.clone(),
        DeliveryMode::Awaited,
    );
    (service, store, notifier)
}

/// Capturing notifier double with a switchable failure mode.
#[derive(Default)]
pub(super) struct MemoryNotifier {
    notices: Mutex<Vec<Notice>>,
    fail: AtomicBool,
}

impl MemoryNotifier {
    pub(super) fn notices(&self) -> Vec<Notice> {
        self.notices.lock().expect("notice mutex poisoned").clone()
    }

    pub(super) fn fail_deliveries(&self) {
        self.fail.store(true, Ordering::Relaxed);
    }
}

#[async_trait]
impl Notifier for MemoryNotifier {
    async fn deliver(&self, notice: &Notice) -> Result<(), NotifyError> {
        if self.fail.load(Ordering::Relaxed) {
            return Err(NotifyError::Transport("smtp offline".to_string()));
        }
        self.notices
            .lock()
            .expect("notice mutex poisoned")
            .push(notice.clone());
        Ok(())
    }
}

/// Repository double whose every call reports an outage.
pub(super) struct UnavailableStore;

#[async_trait]
impl LeadRepository for UnavailableStore {
    async fn insert(&self, _lead: LeadDocument) -> Result<LeadDocument, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    async fn fetch(&self, _id: &LeadId) -> Result<Option<LeadDocument>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    async fn commit(
        &self,
        _lead: LeadDocument,
        _expected_version: u64,
    ) -> Result<LeadDocument, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    async fn query(&self, _filter: &LeadFilter) -> Result<Vec<LeadDocument>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    async fn scan(&self, _cap: usize) -> Result<Vec<LeadDocument>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }
}

#[async_trait]
impl DedupeStore for UnavailableStore {
    async fn reserve(
        &self,
        _fingerprint: &str,
        _lead_id: &LeadId,
        _at: DateTime<Utc>,
    ) -> Result<Reservation, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }
}

/// Wrapper forcing a fixed number of commit contentions before
/// delegating to the inner store.
pub(super) struct FlakyCommitRepository {
    inner: Arc<MemoryStore>,
    contentions: AtomicUsize,
}

impl FlakyCommitRepository {
    pub(super) fn new(inner: Arc<MemoryStore>, contentions: usize) -> Self {
        Self {
            inner,
            contentions: AtomicUsize::new(contentions),
        }
    }
}

#[async_trait]
impl LeadRepository for FlakyCommitRepository {
    async fn insert(&self, lead: LeadDocument) -> Result<LeadDocument, StoreError> {
        self.inner.insert(lead).await
    }

    async fn fetch(&self, id: &LeadId) -> Result<Option<LeadDocument>, StoreError> {
        self.inner.fetch(id).await
    }

    async fn commit(
        &self,
        lead: LeadDocument,
        expected_version: u64,
    ) -> Result<LeadDocument, StoreError> {
        let remaining = self.contentions.load(Ordering::Relaxed);
        if remaining > 0 {
            self.contentions.store(remaining - 1, Ordering::Relaxed);
            return Err(StoreError::Contention);
        }
        self.inner.commit(lead, expected_version).await
    }

    async fn query(&self, filter: &LeadFilter) -> Result<Vec<LeadDocument>, StoreError> {
        self.inner.query(filter).await
    }

    async fn scan(&self, cap: usize) -> Result<Vec<LeadDocument>, StoreError> {
        self.inner.scan(cap).await
    }
}

pub(super) fn test_jwt() -> JwtService {
    JwtService::new("test-secret", "leadflow".to_string(), 24)
}

pub(super) fn sample_admin() -> AdminRecord {
    AdminRecord {
        admin_id: AdminId("admin-1".to_string()),
        username: "jsmith".to_string(),
        password_hash: hash_password("hunter22"),
        first_name: "Jordan".to_string(),
        last_name: "Smith".to_string(),
        email: "jordan@example.com".to_string(),
        role: "admin".to_string(),
        metadata: DocumentMetadata::seed(Utc::now()),
    }
}

/// Guard with authentication bypassed.
pub(super) fn open_guard() -> Arc<AuthGuard> {
    Arc::new(AuthGuard {
        jwt: test_jwt(),
        disabled: true,
    })
}

/// Enforcing guard plus a token it accepts.
pub(super) fn locked_guard() -> (Arc<AuthGuard>, String) {
    let jwt = test_jwt();
    let token = jwt.issue(&sample_admin()).expect("token issues");
    (
        Arc::new(AuthGuard {
            jwt,
            disabled: false,
        }),
        token,
    )
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
