use serde::{Deserialize, Serialize};

use super::{ScorerFailure, ScorerKind};
use crate::dispatch::domain::{AreaType, RoadAccessibility, Shipment, VehicleClass};
use crate::dispatch::reference::VehicleSpecs;

/// Whether the planned vehicle can complete the delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VehicleFeasibility {
    Accept,
    Warn,
    Reject,
}

/// Alternative the dispatcher should consider when the planned class falls
/// short.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VehicleSuggestion {
    Keep,
    Use(VehicleClass),
    SplitDelivery,
}

/// Vehicle scorer verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleVerdict {
    pub status: VehicleFeasibility,
    pub planned: VehicleClass,
    pub suggestion: VehicleSuggestion,
    pub reason: String,
}

/// Evaluate whether the weight-derived vehicle class can physically reach the
/// delivery point and carry the load.
pub(crate) fn evaluate(
    shipment: &Shipment,
    specs: &VehicleSpecs,
) -> Result<VehicleVerdict, ScorerFailure> {
    let planned = shipment.planned_vehicle();

    let spec = specs.lookup(planned).ok_or_else(|| ScorerFailure {
        kind: ScorerKind::Vehicle,
        detail: format!("no capacity data for vehicle class '{}'", planned.label()),
    })?;

    if shipment.area_type == AreaType::OldCity && planned != VehicleClass::Bike {
        return Ok(VehicleVerdict {
            status: VehicleFeasibility::Reject,
            planned,
            suggestion: VehicleSuggestion::Use(VehicleClass::Bike),
            reason: format!(
                "{}s are not allowed in old city lanes",
                planned.label()
            ),
        });
    }

    if shipment.road_accessibility == RoadAccessibility::Narrow
        && matches!(planned, VehicleClass::Van | VehicleClass::Truck)
    {
        return Ok(VehicleVerdict {
            status: VehicleFeasibility::Reject,
            planned,
            suggestion: VehicleSuggestion::Use(VehicleClass::Bike),
            reason: format!("narrow roads cannot take a {}", planned.label()),
        });
    }

    if shipment.weight_kg > spec.max_weight_kg {
        let (suggestion, reason) = match planned {
            VehicleClass::Bike => (
                VehicleSuggestion::Use(VehicleClass::Van),
                "shipment exceeds bike load capacity".to_string(),
            ),
            VehicleClass::Van => (
                VehicleSuggestion::Use(VehicleClass::Truck),
                "shipment exceeds van load capacity".to_string(),
            ),
            VehicleClass::Truck => (
                VehicleSuggestion::SplitDelivery,
                "shipment exceeds truck load capacity, split delivery advised".to_string(),
            ),
        };
        return Ok(VehicleVerdict {
            status: VehicleFeasibility::Reject,
            planned,
            suggestion,
            reason,
        });
    }

    if shipment.volumetric_weight_kg > spec.max_volumetric_kg {
        return Ok(VehicleVerdict {
            status: VehicleFeasibility::Warn,
            planned,
            suggestion: VehicleSuggestion::SplitDelivery,
            reason: "shipment volume exceeds vehicle capacity, split delivery advised".to_string(),
        });
    }

    if shipment.road_accessibility == RoadAccessibility::Medium && planned == VehicleClass::Truck {
        return Ok(VehicleVerdict {
            status: VehicleFeasibility::Warn,
            planned,
            suggestion: VehicleSuggestion::Use(VehicleClass::Van),
            reason: "trucks face access issues on medium roads".to_string(),
        });
    }

    Ok(VehicleVerdict {
        status: VehicleFeasibility::Accept,
        planned,
        suggestion: VehicleSuggestion::Keep,
        reason: "vehicle is suitable for this delivery".to_string(),
    })
}
