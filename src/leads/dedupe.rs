//! Per-contact-per-day duplicate detection.
//!
//! The fingerprint keys on lowercased email, the last four phone digits,
//! and the submission date, so an accidental double submit collapses to
//! one lead while a genuine repeat inquiry on a later day does not.

use chrono::NaiveDate;
use sha2::{Digest, Sha256};

use super::domain::LeadId;

/// Outcome of a create-only fingerprint reservation.
#[derive(Debug, Clone, PartialEq)]
pub enum Reservation {
    /// The fingerprint was free and now maps to the candidate lead.
    Created,
    /// A prior submission holds the fingerprint; its lead id wins.
    Existing(LeadId),
}

/// Derive the dedupe key: `sha256(lower(email) | last4(phone) | date)`.
pub fn fingerprint(email: &str, phone: &str, day: NaiveDate) -> String {
    let seed = format!(
        "{}|{}|{}",
        email.trim().to_lowercase(),
        last_digits(phone, 4),
        day.format("%Y-%m-%d"),
    );
    let mut hasher = Sha256::new();
    hasher.update(seed.as_bytes());
    hex::encode(hasher.finalize())
}

fn last_digits(phone: &str, count: usize) -> String {
    let digits: Vec<char> = phone.chars().filter(|c| c.is_ascii_digit()).collect();
    let start = digits.len().saturating_sub(count);
    digits[start..].iter().collect()
}
