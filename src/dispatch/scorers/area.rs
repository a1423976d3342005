use serde::{Deserialize, Serialize};

use super::ScorerFailure;
use crate::dispatch::domain::{AreaType, RoadAccessibility, Shipment, VehicleClass};
use crate::dispatch::reference::{AreaProfiles, CongestionLevel};

const BLOCK_DELTA: i32 = 25;
const WARN_DELTA: i32 = 15;
const DIFFICULTY_DELTA_STEP: i32 = 5;
const FALLBACK_DIFFICULTY: u8 = 3;

/// Last-mile feasibility of the destination area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AreaFeasibility {
    Allow,
    Warn,
    Block,
}

/// Area scorer verdict: feasibility status plus a numeric risk delta used in
/// explanations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaVerdict {
    pub status: AreaFeasibility,
    pub difficulty: u8,
    pub risk_delta: i32,
    pub reason: String,
}

/// Evaluate area feasibility from the locality master.
///
/// Unknown localities degrade to WARN with a mid-scale difficulty rather than
/// blocking, matching how dispatchers treat unmapped neighborhoods.
pub(crate) fn evaluate(
    shipment: &Shipment,
    profiles: &AreaProfiles,
) -> Result<AreaVerdict, ScorerFailure> {
    let planned_vehicle = shipment.planned_vehicle();

    if shipment.road_accessibility == RoadAccessibility::Narrow
        && matches!(planned_vehicle, VehicleClass::Van | VehicleClass::Truck)
    {
        let difficulty = profiles
            .lookup(&shipment.destination_city, shipment.area_type)
            .map(|profile| profile.difficulty)
            .unwrap_or(FALLBACK_DIFFICULTY);
        return Ok(verdict(
            AreaFeasibility::Block,
            difficulty,
            format!(
                "narrow road access cannot take a {} delivery",
                planned_vehicle.label()
            ),
        ));
    }

    let Some(profile) = profiles.lookup(&shipment.destination_city, shipment.area_type) else {
        return Ok(verdict(
            AreaFeasibility::Warn,
            FALLBACK_DIFFICULTY,
            "no locality data found, manual review advised".to_string(),
        ));
    };

    if profile.difficulty >= 4 && profile.congestion == CongestionLevel::High {
        return Ok(verdict(
            AreaFeasibility::Block,
            profile.difficulty,
            "high congestion and difficult last-mile access".to_string(),
        ));
    }

    if profile.difficulty >= 3 || shipment.area_type == AreaType::OldCity {
        return Ok(verdict(
            AreaFeasibility::Warn,
            profile.difficulty,
            "moderate last-mile difficulty".to_string(),
        ));
    }

    Ok(verdict(
        AreaFeasibility::Allow,
        profile.difficulty,
        "area suitable for delivery".to_string(),
    ))
}

fn verdict(status: AreaFeasibility, difficulty: u8, reason: String) -> AreaVerdict {
    let status_delta = match status {
        AreaFeasibility::Block => BLOCK_DELTA,
        AreaFeasibility::Warn => WARN_DELTA,
        AreaFeasibility::Allow => 0,
    };

    AreaVerdict {
        status,
        difficulty,
        risk_delta: i32::from(difficulty) * DIFFICULTY_DELTA_STEP + status_delta,
        reason,
    }
}
