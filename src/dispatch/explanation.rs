use serde::{Deserialize, Serialize};

use super::scoring::{RiskAssessment, RiskBucket, ScoringConfig};
use super::weights::RiskFactor;

/// One ranked, human-readable reason behind an assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedReason {
    pub factor: RiskFactor,
    pub points: i32,
    pub phrase: String,
}

/// What a dispatcher could change to move the shipment down one bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImprovementHint {
    pub factor: RiskFactor,
    pub points_needed: i32,
    pub target_bucket: RiskBucket,
    pub phrase: String,
}

/// Rendered explanation of a risk assessment. Carries no decision authority.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelayExplanation {
    pub bucket: RiskBucket,
    pub summary: String,
    pub reasons: Vec<RankedReason>,
    pub hints: Vec<ImprovementHint>,
}

/// Render an assessment into ranked reasons and improvement hints.
///
/// Reasons rank by contribution descending; ties break on a fixed factor
/// order so explanations are reproducible run to run.
pub fn explain(assessment: &RiskAssessment, config: &ScoringConfig) -> DelayExplanation {
    let mut reasons: Vec<RankedReason> = assessment
        .contributions
        .iter()
        .filter(|entry| entry.points > 0)
        .map(|entry| RankedReason {
            factor: entry.factor,
            points: entry.points,
            phrase: entry.note.clone(),
        })
        .collect();

    reasons.sort_by(|a, b| {
        b.points
            .cmp(&a.points)
            .then_with(|| tie_break_rank(a.factor).cmp(&tie_break_rank(b.factor)))
    });

    let summary = match assessment.bucket {
        RiskBucket::High => "high delay risk due to multiple compounding factors".to_string(),
        RiskBucket::Medium => "moderate delay risk due to some operational constraints".to_string(),
        RiskBucket::Low => "low delay risk with no major operational issues".to_string(),
    };

    DelayExplanation {
        bucket: assessment.bucket,
        summary,
        hints: improvement_hints(assessment, config, &reasons),
        reasons,
    }
}

/// Fixed factor-priority order used to break contribution ties.
fn tie_break_rank(factor: RiskFactor) -> u8 {
    match factor {
        RiskFactor::AddressConfidence => 0,
        RiskFactor::WeatherSeverity => 1,
        RiskFactor::AreaType => 2,
        RiskFactor::RoadAccess => 3,
        RiskFactor::CodPayment => 4,
        RiskFactor::WeightClass => 5,
        RiskFactor::PriorityDampening => 6,
    }
}

fn improvement_hints(
    assessment: &RiskAssessment,
    config: &ScoringConfig,
    reasons: &[RankedReason],
) -> Vec<ImprovementHint> {
    let (boundary, target_bucket) = match assessment.bucket {
        RiskBucket::Low => return Vec::new(),
        RiskBucket::Medium => (config.low_ceiling, RiskBucket::Low),
        RiskBucket::High => (config.high_floor, RiskBucket::Medium),
    };

    // Points that must come off the score to land strictly below the boundary.
    let points_needed = i32::from(assessment.score) - i32::from(boundary) + 1;
    if points_needed <= 0 {
        return Vec::new();
    }

    reasons
        .iter()
        .filter(|reason| reason.points >= points_needed)
        .map(|reason| ImprovementHint {
            factor: reason.factor,
            points_needed,
            target_bucket,
            phrase: format!(
                "resolving {} would shed {} point(s) and move the shipment to {} risk",
                reason.factor.label(),
                points_needed,
                target_bucket.label()
            ),
        })
        .collect()
}
