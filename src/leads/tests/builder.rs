use chrono::Utc;

use super::common::*;
use crate::leads::builder::{build_lead, validate_form, IntakeError};
use crate::leads::domain::{LeadId, PreferredContact, RequestMeta, Timeframe};
use crate::leads::scoring::compute_score;

fn built() -> crate::leads::domain::LeadDocument {
    let form = form();
    let scoring = compute_score(
        form.selling_interest,
        form.buying_interest,
        Timeframe::parse(form.timeframe.as_deref().unwrap_or_default()),
    );
    build_lead(
        LeadId("lead-1".to_string()),
        &form,
        &meta(),
        scoring,
        Utc::now(),
    )
}

#[test]
fn contact_fields_are_normalized() {
    let mut raw = form();
    raw.first_name = "  Alex ".to_string();
    raw.email = " Alex.Nguyen@Example.COM ".to_string();
    raw.phone = " 0412 345 678 ".to_string();
    let scoring = compute_score(true, false, Timeframe::OneToThreeMonths);
    let lead = build_lead(
        LeadId("lead-1".to_string()),
        &raw,
        &meta(),
        scoring,
        Utc::now(),
    );

    assert_eq!(lead.contact.first_name, "Alex");
    assert_eq!(lead.contact.email, "alex.nguyen@example.com");
    assert_eq!(lead.contact.phone, "0412 345 678");
    assert_eq!(lead.contact.preferred_contact, PreferredContact::Both);
}

#[test]
fn missing_timeframe_defaults_to_not_sure() {
    let mut raw = form();
    raw.timeframe = None;
    let scoring = compute_score(true, false, Timeframe::NotSure);
    let lead = build_lead(
        LeadId("lead-1".to_string()),
        &raw,
        &meta(),
        scoring,
        Utc::now(),
    );
    assert_eq!(lead.contact.timeframe, Timeframe::NotSure);
}

#[test]
fn status_trail_is_seeded_with_a_single_new_entry() {
    let lead = built();
    assert_eq!(lead.status.current, "new");
    assert_eq!(lead.status.history.len(), 1);
    let entry = &lead.status.history[0];
    assert_eq!(entry.status, "new");
    assert_eq!(entry.changed_by, "system");
    assert_eq!(entry.notes, "Lead from homepage form");
}

#[test]
fn acting_user_attributes_the_seed_entry() {
    let form = form();
    let meta = RequestMeta {
        acting_user_id: Some("admin-7".to_string()),
        ..meta()
    };
    let scoring = compute_score(true, false, Timeframe::OneToThreeMonths);
    let lead = build_lead(LeadId("lead-1".to_string()), &form, &meta, scoring, Utc::now());
    assert_eq!(lead.status.history[0].changed_by, "admin-7");
}

#[test]
fn metadata_seed_and_scoring_factors_embedded() {
    let lead = built();
    assert_eq!(lead.metadata.created_at, lead.metadata.updated_at);
    assert_eq!(lead.metadata.version, 1);
    assert!(lead.metadata.deleted_at.is_none());
    assert_eq!(lead.metadata.tags, vec!["Hornsby".to_string()]);

    let factors = lead
        .metadata
        .custom_fields
        .get("scoring_factors")
        .expect("factors embedded");
    assert_eq!(factors.get("intent_selling").and_then(|v| v.as_u64()), Some(25));
    assert_eq!(factors.get("timeframe_score").and_then(|v| v.as_u64()), Some(40));
}

#[test]
fn tracking_lowercases_source_and_hashes_first_forwarded_ip() {
    let lead = built();
    assert_eq!(lead.tracking.source, "facebook");
    assert_eq!(lead.tracking.utm_source, "Facebook");
    assert!(lead.tracking.ip_hash.starts_with("hash:"));

    // Only the first address of the forwarded chain feeds the hash.
    let solo = RequestMeta {
        ip: "203.0.113.7".to_string(),
        ..meta()
    };
    let form = form();
    let scoring = compute_score(true, false, Timeframe::OneToThreeMonths);
    let lead_solo = build_lead(LeadId("lead-2".to_string()), &form, &solo, scoring, Utc::now());
    assert_eq!(lead_solo.tracking.ip_hash, lead.tracking.ip_hash);
}

#[test]
fn absent_utm_source_falls_back_to_direct() {
    let mut raw = form();
    raw.utm_source = None;
    let scoring = compute_score(true, false, Timeframe::OneToThreeMonths);
    let lead = build_lead(
        LeadId("lead-1".to_string()),
        &raw,
        &meta(),
        scoring,
        Utc::now(),
    );
    assert_eq!(lead.tracking.source, "direct");
}

#[test]
fn validation_rejects_malformed_fields() {
    let mut short_name = form();
    short_name.first_name = "A".to_string();
    assert!(matches!(
        validate_form(&short_name),
        Err(IntakeError::InvalidName)
    ));

    let mut bad_email = form();
    bad_email.email = "not-an-email".to_string();
    assert!(matches!(
        validate_form(&bad_email),
        Err(IntakeError::InvalidEmail)
    ));

    let mut bad_phone = form();
    bad_phone.phone = "12".to_string();
    assert!(matches!(
        validate_form(&bad_phone),
        Err(IntakeError::InvalidPhone)
    ));

    assert!(validate_form(&form()).is_ok());
}
