//! Best-effort outbound notifications.
//!
//! Deliveries run outside the transactional boundary: a failure is
//! logged and never surfaces as a failure of the operation that
//! triggered it.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, warn};

use crate::leads::domain::LeadDocument;

/// Notification template selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    SubmitterConfirmation,
    AdminAlert,
}

/// Outbound notification payload handed to the delivery adapter.
#[derive(Debug, Clone, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub lead_id: String,
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

impl Notice {
    pub fn submitter_confirmation(lead: &LeadDocument) -> Self {
        Self {
            kind: NoticeKind::SubmitterConfirmation,
            lead_id: lead.id.0.clone(),
            recipient: lead.contact.email.clone(),
            subject: "Thanks for your enquiry".to_string(),
            body: format!(
                "Hi {}, we received your enquiry and an agent will be in touch shortly.",
                lead.contact.first_name
            ),
        }
    }

    pub fn admin_alert(lead: &LeadDocument) -> Self {
        Self {
            kind: NoticeKind::AdminAlert,
            lead_id: lead.id.0.clone(),
            recipient: "sales-desk".to_string(),
            subject: "New HOT lead".to_string(),
            body: format!(
                "{} {} ({}) scored {} in {}.",
                lead.contact.first_name,
                lead.contact.last_name,
                lead.contact.email,
                lead.scoring.result.total_score,
                if lead.contact.suburb.is_empty() {
                    "an unlisted suburb"
                } else {
                    &lead.contact.suburb
                },
            ),
        }
    }
}

/// Delivery failure; recorded in the log stream, never propagated.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}

/// Delivery adapter seam (e-mail, in-app, SMS).
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver(&self, notice: &Notice) -> Result<(), NotifyError>;
}

/// Whether deliveries detach from the request or are awaited in line.
///
/// Detached is the default; awaited exists for deployments that freeze
/// background work after the response is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeliveryMode {
    #[default]
    Detached,
    Awaited,
}

impl DeliveryMode {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "awaited" | "await" | "inline" => DeliveryMode::Awaited,
            _ => DeliveryMode::Detached,
        }
    }
}

/// Fire a notice without letting delivery failures reach the caller.
pub async fn dispatch<N: Notifier + 'static>(notifier: Arc<N>, mode: DeliveryMode, notice: Notice) {
    match mode {
        DeliveryMode::Detached => {
            tokio::spawn(async move {
                deliver_and_sink(notifier.as_ref(), &notice).await;
            });
        }
        DeliveryMode::Awaited => deliver_and_sink(notifier.as_ref(), &notice).await,
    }
}

async fn deliver_and_sink<N: Notifier + ?Sized>(notifier: &N, notice: &Notice) {
    if let Err(err) = notifier.deliver(notice).await {
        warn!(
            kind = ?notice.kind,
            lead_id = %notice.lead_id,
            error = %err,
            "notification delivery failed",
        );
    }
}

/// Default production notifier: records deliveries in the log stream.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn deliver(&self, notice: &Notice) -> Result<(), NotifyError> {
        info!(
            kind = ?notice.kind,
            lead_id = %notice.lead_id,
            recipient = %notice.recipient,
            subject = %notice.subject,
            "notification dispatched",
        );
        Ok(())
    }
}
