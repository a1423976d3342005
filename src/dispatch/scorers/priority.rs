use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::ScorerFailure;
use crate::dispatch::domain::Shipment;
use crate::dispatch::reference::PriorityBands;

/// Operational priority tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriorityTier {
    High,
    Medium,
    Low,
}

impl PriorityTier {
    pub const fn label(self) -> &'static str {
        match self {
            PriorityTier::High => "high",
            PriorityTier::Medium => "medium",
            PriorityTier::Low => "low",
        }
    }
}

/// Priority scorer verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityVerdict {
    pub tier: PriorityTier,
    pub reason: String,
}

/// Classify shipment priority from the declared flag, value bands, and time
/// remaining until the promised delivery date.
pub(crate) fn evaluate(
    shipment: &Shipment,
    bands: &PriorityBands,
    as_of: NaiveDate,
) -> Result<PriorityVerdict, ScorerFailure> {
    let days_until_delivery = (shipment.delivery_date - as_of).num_days();

    let (tier, reason) = if shipment.priority_flag {
        (
            PriorityTier::High,
            "seller flagged shipment as priority".to_string(),
        )
    } else if shipment.declared_value >= bands.high_value_floor {
        (
            PriorityTier::High,
            format!(
                "declared value {} meets the high-value band",
                shipment.declared_value
            ),
        )
    } else if days_until_delivery <= bands.urgent_window_days {
        (
            PriorityTier::High,
            format!("delivery promised within {days_until_delivery} day(s)"),
        )
    } else if shipment.declared_value >= bands.medium_value_floor {
        (
            PriorityTier::Medium,
            format!(
                "declared value {} meets the medium-value band",
                shipment.declared_value
            ),
        )
    } else if days_until_delivery <= bands.soon_window_days {
        (
            PriorityTier::Medium,
            format!("delivery promised within {days_until_delivery} day(s)"),
        )
    } else {
        (
            PriorityTier::Low,
            "non-urgent, operationally flexible shipment".to_string(),
        )
    };

    Ok(PriorityVerdict { tier, reason })
}
