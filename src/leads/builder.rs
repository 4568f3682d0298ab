//! Validation and assembly of the canonical lead document from a public
//! form submission.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use crate::store::DocumentMetadata;

use super::domain::{
    ContactInfo, LeadDocument, LeadId, LeadStatus, PublicLeadForm, RequestMeta, ScoringSnapshot,
    StatusEntry, Timeframe, TrackingInfo,
};
use super::scoring::{ScoreFactors, ScoringResult};

/// Form defects reported before any document is written.
#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error("first and last name must each be 2-50 characters")]
    InvalidName,
    #[error("email address is malformed")]
    InvalidEmail,
    #[error("phone number needs at least four digits")]
    InvalidPhone,
}

pub fn validate_form(form: &PublicLeadForm) -> Result<(), IntakeError> {
    for name in [&form.first_name, &form.last_name] {
        let length = name.trim().chars().count();
        if !(2..=50).contains(&length) {
            return Err(IntakeError::InvalidName);
        }
    }

    let email = form.email.trim();
    if !email.contains('@') || email.starts_with('@') || email.ends_with('@') {
        return Err(IntakeError::InvalidEmail);
    }

    if form.phone.chars().filter(|c| c.is_ascii_digit()).count() < 4 {
        return Err(IntakeError::InvalidPhone);
    }

    Ok(())
}

/// Assemble the lead document for a validated form.
///
/// Normalization: names and phone trimmed, email lowercased, preferred
/// contact defaults to "both", timeframe defaults to "not sure". The
/// status trail is seeded with a single `new` entry and the scoring
/// factors are mirrored into `metadata.custom_fields` for auditability.
pub fn build_lead(
    id: LeadId,
    form: &PublicLeadForm,
    meta: &RequestMeta,
    scoring: ScoringResult,
    now: DateTime<Utc>,
) -> LeadDocument {
    let suburb = form.suburb.clone().unwrap_or_default();

    let contact = ContactInfo {
        first_name: form.first_name.trim().to_string(),
        last_name: form.last_name.trim().to_string(),
        email: form.email.trim().to_lowercase(),
        phone: form.phone.trim().to_string(),
        preferred_contact: form.preferred_contact.unwrap_or_default(),
        suburb: suburb.clone(),
        timeframe: form
            .timeframe
            .as_deref()
            .map(Timeframe::parse)
            .unwrap_or_default(),
        selling_interest: form.selling_interest,
        buying_interest: form.buying_interest,
    };

    let tracking = TrackingInfo {
        source: form
            .utm_source
            .as_deref()
            .map(str::trim)
            .filter(|source| !source.is_empty())
            .map(str::to_lowercase)
            .unwrap_or_else(|| "direct".to_string()),
        utm_source: form.utm_source.clone().unwrap_or_default(),
        utm_medium: form.utm_medium.clone().unwrap_or_default(),
        utm_campaign: form.utm_campaign.clone().unwrap_or_default(),
        ip_hash: hash_ip(&meta.ip),
        user_agent: meta.user_agent.clone(),
        referrer: meta.referrer.clone(),
    };

    let changed_by = meta
        .acting_user_id
        .clone()
        .unwrap_or_else(|| "system".to_string());
    let status = LeadStatus {
        current: "new".to_string(),
        history: vec![StatusEntry {
            status: "new".to_string(),
            changed_at: now,
            changed_by,
            notes: "Lead from homepage form".to_string(),
        }],
    };

    let mut metadata = DocumentMetadata::seed(now);
    if !suburb.is_empty() {
        metadata.tags.push(suburb);
    }
    metadata.custom_fields.insert(
        "scoring_factors".to_string(),
        scoring_custom_fields(&scoring.factors),
    );

    LeadDocument {
        id,
        contact,
        tracking,
        scoring: ScoringSnapshot {
            result: scoring,
            scored_at: now,
        },
        status,
        metadata,
    }
}

/// Factor breakdown mirrored into `metadata.custom_fields` at creation
/// and on every rescore.
pub fn scoring_custom_fields(factors: &ScoreFactors) -> serde_json::Value {
    serde_json::json!({
        "intent_selling": factors.intent_selling,
        "intent_buying": factors.intent_buying,
        "timeframe_score": factors.timeframe_score,
        "quality_score": factors.quality_score,
        "base_value": factors.base_value,
    })
}

/// `hash:` + SHA-256 of the first address in a forwarded-for chain; an
/// absent address hashes to the empty string.
fn hash_ip(raw: &str) -> String {
    let first = raw.split(',').next().unwrap_or("").trim();
    if first.is_empty() {
        return String::new();
    }
    let mut hasher = Sha256::new();
    hasher.update(first.as_bytes());
    format!("hash:{}", hex::encode(hasher.finalize()))
}
