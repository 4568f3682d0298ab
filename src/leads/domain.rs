use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::DocumentMetadata;

use super::scoring::ScoringResult;

/// Identifier wrapper for lead documents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LeadId(pub String);

impl LeadId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

/// Horizon the contact gave for selling or buying.
///
/// Unrecognized or missing values land in the lowest-weight bucket
/// instead of erroring, so deserialization never fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Timeframe {
    OneToThreeMonths,
    ThreeToSixMonths,
    SixPlusMonths,
    #[default]
    NotSure,
}

impl Timeframe {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "1-3 months" => Timeframe::OneToThreeMonths,
            "3-6 months" => Timeframe::ThreeToSixMonths,
            "6+ months" => Timeframe::SixPlusMonths,
            _ => Timeframe::NotSure,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Timeframe::OneToThreeMonths => "1-3 months",
            Timeframe::ThreeToSixMonths => "3-6 months",
            Timeframe::SixPlusMonths => "6+ months",
            Timeframe::NotSure => "not sure",
        }
    }
}

impl Serialize for Timeframe {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for Timeframe {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(Timeframe::parse(&raw))
    }
}

/// Channel the contact asked to be reached on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreferredContact {
    Email,
    Phone,
    #[default]
    Both,
}

/// Contact block of the lead document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub preferred_contact: PreferredContact,
    pub suburb: String,
    pub timeframe: Timeframe,
    pub selling_interest: bool,
    pub buying_interest: bool,
}

/// Attribution captured alongside a public submission.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackingInfo {
    pub source: String,
    pub utm_source: String,
    pub utm_medium: String,
    pub utm_campaign: String,
    pub ip_hash: String,
    pub user_agent: String,
    pub referrer: String,
}

/// One entry of the append-only status trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusEntry {
    pub status: String,
    pub changed_at: DateTime<Utc>,
    pub changed_by: String,
    pub notes: String,
}

/// Workflow state: `current` always equals the last history entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadStatus {
    pub current: String,
    pub history: Vec<StatusEntry>,
}

/// Scoring output plus the instant it was computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringSnapshot {
    #[serde(flatten)]
    pub result: ScoringResult,
    pub scored_at: DateTime<Utc>,
}

/// The canonical lead document, one per accepted submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadDocument {
    pub id: LeadId,
    pub contact: ContactInfo,
    pub tracking: TrackingInfo,
    pub scoring: ScoringSnapshot,
    pub status: LeadStatus,
    pub metadata: DocumentMetadata,
}

/// Dedupe reservation value: which lead won the fingerprint, and when.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DedupeRecord {
    pub lead_id: LeadId,
    pub created_at: DateTime<Utc>,
}

/// Raw homepage form payload. Validation happens before any document is
/// built; see [`super::builder::validate_form`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicLeadForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub preferred_contact: Option<PreferredContact>,
    #[serde(default)]
    pub suburb: Option<String>,
    #[serde(default)]
    pub timeframe: Option<String>,
    pub selling_interest: bool,
    pub buying_interest: bool,
    #[serde(default)]
    pub utm_source: Option<String>,
    #[serde(default)]
    pub utm_medium: Option<String>,
    #[serde(default)]
    pub utm_campaign: Option<String>,
}

/// Request-scoped metadata captured at the HTTP boundary.
#[derive(Debug, Clone, Default)]
pub struct RequestMeta {
    pub acting_user_id: Option<String>,
    pub ip: String,
    pub user_agent: String,
    pub referrer: String,
}

/// Body of the dedicated status-change endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusChange {
    pub status: String,
    #[serde(default)]
    pub notes: Option<String>,
    pub changed_by: String,
}

/// Generic partial update applied inside one transaction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeadPatch {
    #[serde(default)]
    pub contact: Option<ContactPatch>,
    #[serde(default)]
    pub status: Option<StatusPatch>,
    #[serde(default)]
    pub metadata: Option<MetadataPatch>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContactPatch {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub preferred_contact: Option<PreferredContact>,
    #[serde(default)]
    pub suburb: Option<String>,
    #[serde(default)]
    pub timeframe: Option<String>,
    #[serde(default)]
    pub selling_interest: Option<bool>,
    #[serde(default)]
    pub buying_interest: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusPatch {
    #[serde(default)]
    pub current: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub changed_by: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetadataPatch {
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub custom_fields: Option<std::collections::BTreeMap<String, serde_json::Value>>,
}
