use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{DeliveryResult, DispatchDecision, ShipmentId};
use super::scoring::RiskBucket;

/// End-of-lifecycle record pairing the prediction with what actually
/// happened. One per completed shipment; the learning loop's raw material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeRecord {
    pub shipment_id: ShipmentId,
    pub predicted_decision: DispatchDecision,
    pub predicted_bucket: RiskBucket,
    pub actual: DeliveryResult,
    pub overridden: bool,
    pub mismatch: bool,
    pub recorded_at: DateTime<Utc>,
}

impl OutcomeRecord {
    pub fn new(
        shipment_id: ShipmentId,
        predicted_decision: DispatchDecision,
        predicted_bucket: RiskBucket,
        actual: DeliveryResult,
        overridden: bool,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            shipment_id,
            predicted_decision,
            predicted_bucket,
            actual,
            overridden,
            mismatch: prediction_mismatch(predicted_decision, actual),
            recorded_at,
        }
    }

    pub fn failed(&self) -> bool {
        self.actual != DeliveryResult::Delivered
    }
}

/// Whether the prediction and the observed result disagree. A buffered DELAY
/// that still delivers counts as the prediction working, not a miss.
pub fn prediction_mismatch(predicted: DispatchDecision, actual: DeliveryResult) -> bool {
    match (predicted, actual) {
        (DispatchDecision::Dispatch, DeliveryResult::Delivered) => false,
        (DispatchDecision::Dispatch, _) => true,
        (DispatchDecision::Reschedule, DeliveryResult::Delivered) => true,
        (DispatchDecision::Reschedule, _) => false,
        (DispatchDecision::Delay, _) => false,
    }
}
