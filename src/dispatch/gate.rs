use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{DecisionSource, DispatchDecision, ShipmentId};
use super::scorers::{AreaFeasibility, ScorerVerdicts, VehicleFeasibility};
use super::scoring::{RiskAssessment, RiskBucket};

/// A rule that forces RESCHEDULE regardless of the numeric score. Weight
/// tuning can never weaken these.
pub struct HardBlockRule {
    pub name: &'static str,
    pub applies: fn(&ScorerVerdicts) -> bool,
}

/// Policy table of hard stops, checked before any threshold comparison.
pub const HARD_BLOCK_RULES: &[HardBlockRule] = &[
    HardBlockRule {
        name: "area access blocked",
        applies: |verdicts| verdicts.area.status == AreaFeasibility::Block,
    },
    HardBlockRule {
        name: "no feasible vehicle",
        applies: |verdicts| verdicts.vehicle.status == VehicleFeasibility::Reject,
    },
];

/// The standing decision for a shipment cycle.
///
/// `version` increases on every write so racing overrides serialize through
/// an optimistic check instead of overwriting each other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub shipment_id: ShipmentId,
    pub decision: DispatchDecision,
    pub source: DecisionSource,
    pub risk_score: u8,
    pub risk_bucket: RiskBucket,
    pub reasons: Vec<String>,
    pub locked: bool,
    pub version: u64,
    pub decided_at: DateTime<Utc>,
}

/// Attempted automatic re-evaluation of a shipment a human has locked.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("shipment {} is locked by a human override", shipment_id.0)]
pub struct LockedShipmentError {
    pub shipment_id: ShipmentId,
}

/// Outcome of one gate pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GateOutcome {
    pub decision: DispatchDecision,
    /// Name of the hard-block rule that forced the decision, if any.
    pub forced_by: Option<&'static str>,
}

/// Map an assessment plus scorer verdicts to a dispatch decision.
///
/// Hard blocks win over the score; otherwise the bucket thresholds decide.
pub fn decide(assessment: &RiskAssessment, verdicts: &ScorerVerdicts) -> GateOutcome {
    if let Some(rule) = HARD_BLOCK_RULES.iter().find(|rule| (rule.applies)(verdicts)) {
        return GateOutcome {
            decision: DispatchDecision::Reschedule,
            forced_by: Some(rule.name),
        };
    }

    let decision = match assessment.bucket {
        RiskBucket::Low => DispatchDecision::Dispatch,
        RiskBucket::Medium => DispatchDecision::Delay,
        RiskBucket::High => DispatchDecision::Reschedule,
    };

    GateOutcome {
        decision,
        forced_by: None,
    }
}
