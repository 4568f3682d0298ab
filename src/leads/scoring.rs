//! Normalized lead scoring on a 0-100 scale.
//!
//! Weighting scheme v1.1.0: selling intent 10/25, buying intent 5/15,
//! timeframe 5/15/28/40, quality baseline 10, base value 10. Category
//! thresholds: HOT >= 70, WARM >= 40, else COLD. Changing any weight
//! requires bumping [`SCORE_VERSION`] so historical scores stay
//! distinguishable.

use serde::{Deserialize, Serialize};

use super::domain::Timeframe;

/// Tag carried on every scored lead identifying the weight table used.
pub const SCORE_VERSION: &str = "v1.1.0";

const INTENT_SELLING_YES: u32 = 25;
const INTENT_SELLING_NO: u32 = 10;
const INTENT_BUYING_YES: u32 = 15;
const INTENT_BUYING_NO: u32 = 5;
// Reserved for future input-completeness deductions.
const QUALITY_BASELINE: u32 = 10;
const BASE_VALUE: u32 = 10;

const HOT_THRESHOLD: u8 = 70;
const WARM_THRESHOLD: u8 = 40;

/// HOT/WARM/COLD classification derived from the total score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LeadCategory {
    Hot,
    Warm,
    Cold,
}

impl LeadCategory {
    pub const fn label(self) -> &'static str {
        match self {
            LeadCategory::Hot => "HOT",
            LeadCategory::Warm => "WARM",
            LeadCategory::Cold => "COLD",
        }
    }
}

/// Named weighted components summed into the total score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreFactors {
    pub intent_selling: u32,
    pub intent_buying: u32,
    pub timeframe_score: u32,
    pub quality_score: u32,
    pub base_value: u32,
}

/// Scoring value object embedded into the lead at creation and on any
/// rescore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringResult {
    pub total_score: u8,
    pub category: LeadCategory,
    pub factors: ScoreFactors,
    pub score_version: String,
}

/// Pure scoring function. Never fails: unrecognized timeframes already
/// degraded to [`Timeframe::NotSure`] during parsing.
pub fn compute_score(
    selling_interest: bool,
    buying_interest: bool,
    timeframe: Timeframe,
) -> ScoringResult {
    let factors = ScoreFactors {
        intent_selling: if selling_interest {
            INTENT_SELLING_YES
        } else {
            INTENT_SELLING_NO
        },
        intent_buying: if buying_interest {
            INTENT_BUYING_YES
        } else {
            INTENT_BUYING_NO
        },
        timeframe_score: timeframe_weight(timeframe),
        quality_score: QUALITY_BASELINE,
        base_value: BASE_VALUE,
    };

    let raw = factors.intent_selling
        + factors.intent_buying
        + factors.timeframe_score
        + factors.quality_score
        + factors.base_value;
    // Max achievable is exactly 100 under the current table.
    let total_score = raw.min(100) as u8;

    let category = if total_score >= HOT_THRESHOLD {
        LeadCategory::Hot
    } else if total_score >= WARM_THRESHOLD {
        LeadCategory::Warm
    } else {
        LeadCategory::Cold
    };

    ScoringResult {
        total_score,
        category,
        factors,
        score_version: SCORE_VERSION.to_string(),
    }
}

const fn timeframe_weight(timeframe: Timeframe) -> u32 {
    match timeframe {
        Timeframe::OneToThreeMonths => 40,
        Timeframe::ThreeToSixMonths => 28,
        Timeframe::SixPlusMonths => 15,
        Timeframe::NotSure => 5,
    }
}
