use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{AuthorityLevel, DecisionSource, DispatchDecision, ShipmentId};
use super::gate::DecisionRecord;
use super::scoring::RiskBucket;

/// Shortest justification accepted on an override.
pub const MIN_REASON_LEN: usize = 10;

/// A manager action proposing to replace the standing decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverrideRequest {
    pub shipment_id: ShipmentId,
    pub proposed: DispatchDecision,
    pub actor: String,
    pub authority: AuthorityLevel,
    pub reason: String,
}

/// Immutable, append-only record of a human override. Never edited; a later
/// override supersedes an earlier one but both stay in the log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverrideRecord {
    pub shipment_id: ShipmentId,
    pub prior_decision: DispatchDecision,
    pub new_decision: DispatchDecision,
    pub actor: String,
    pub authority: AuthorityLevel,
    pub reason: String,
    pub recorded_at: DateTime<Utc>,
}

/// Override validation failures, surfaced to the caller verbatim.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OverrideError {
    #[error("{} authority cannot override a {} risk decision", authority.label(), bucket.label())]
    InsufficientAuthority {
        authority: AuthorityLevel,
        bucket: RiskBucket,
    },
    #[error("override reason must be at least {minimum} characters")]
    MissingJustification { minimum: usize },
    #[error("proposed decision matches the current decision; nothing to override")]
    NoOpOverride,
    #[error("another override landed first; re-read the decision and retry")]
    Conflict,
}

/// Authority matrix: who may replace a decision in which risk bucket.
///
/// Kept as one exhaustive table so the policy stays auditable in a single
/// place.
pub fn authority_permits(authority: AuthorityLevel, bucket: RiskBucket) -> bool {
    match (authority, bucket) {
        (AuthorityLevel::Manager, _) => true,
        (AuthorityLevel::Supervisor, RiskBucket::Low | RiskBucket::Medium) => true,
        (AuthorityLevel::Supervisor, RiskBucket::High) => false,
        (AuthorityLevel::Operator, _) => false,
    }
}

/// Validate an override request against the standing decision.
///
/// Checks run in a fixed order: authority, justification, then no-op.
pub fn validate(request: &OverrideRequest, current: &DecisionRecord) -> Result<(), OverrideError> {
    if !authority_permits(request.authority, current.risk_bucket) {
        return Err(OverrideError::InsufficientAuthority {
            authority: request.authority,
            bucket: current.risk_bucket,
        });
    }

    if request.reason.trim().len() < MIN_REASON_LEN {
        return Err(OverrideError::MissingJustification {
            minimum: MIN_REASON_LEN,
        });
    }

    if request.proposed == current.decision {
        return Err(OverrideError::NoOpOverride);
    }

    Ok(())
}

/// Build the override record and the locked replacement decision. The caller
/// persists both; the decision write must use the prior version as its
/// optimistic check.
pub fn apply(
    request: &OverrideRequest,
    current: &DecisionRecord,
    at: DateTime<Utc>,
) -> (OverrideRecord, DecisionRecord) {
    let record = OverrideRecord {
        shipment_id: request.shipment_id.clone(),
        prior_decision: current.decision,
        new_decision: request.proposed,
        actor: request.actor.clone(),
        authority: request.authority,
        reason: request.reason.trim().to_string(),
        recorded_at: at,
    };

    let decision = DecisionRecord {
        shipment_id: current.shipment_id.clone(),
        decision: request.proposed,
        source: DecisionSource::Human,
        risk_score: current.risk_score,
        risk_bucket: current.risk_bucket,
        reasons: vec![record.reason.clone()],
        locked: true,
        version: current.version + 1,
        decided_at: at,
    };

    (record, decision)
}
