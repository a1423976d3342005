//! Independent feasibility and classification scorers.
//!
//! Each scorer is a pure function of the shipment plus one reference input.
//! None of them reads the weight store, another scorer's output, or any
//! external state, which keeps the pipeline deterministic and lets each be
//! unit tested in isolation.

pub(crate) mod area;
pub(crate) mod priority;
pub(crate) mod vehicle;
pub(crate) mod weather;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::domain::Shipment;
use super::reference::ReferenceData;
use super::weather::Forecast;

pub use area::{AreaFeasibility, AreaVerdict};
pub use priority::{PriorityTier, PriorityVerdict};
pub use vehicle::{VehicleFeasibility, VehicleSuggestion, VehicleVerdict};
pub use weather::WeatherVerdict;

/// Which stage of the fan-out failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScorerKind {
    Area,
    Weather,
    Vehicle,
    Priority,
}

impl ScorerKind {
    pub const fn label(self) -> &'static str {
        match self {
            ScorerKind::Area => "area",
            ScorerKind::Weather => "weather",
            ScorerKind::Vehicle => "vehicle",
            ScorerKind::Priority => "priority",
        }
    }
}

/// A scorer could not produce a verdict. The service retries once, then
/// fail-safes the shipment to RESCHEDULE rather than dispatching blind.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("{} scorer failed: {detail}", kind.label())]
pub struct ScorerFailure {
    pub kind: ScorerKind,
    pub detail: String,
}

/// Collected output of all four scorers for one shipment cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScorerVerdicts {
    pub area: AreaVerdict,
    pub weather: WeatherVerdict,
    pub vehicle: VehicleVerdict,
    pub priority: PriorityVerdict,
}

impl ScorerVerdicts {
    /// True when any scorer raised a hard stop the gate must honor.
    pub fn has_hard_block(&self) -> bool {
        self.area.status == AreaFeasibility::Block
            || self.vehicle.status == VehicleFeasibility::Reject
    }
}

/// Fan out to all four scorers and join their verdicts.
///
/// The scorers have no data dependency on one another; any single failure
/// aborts the cycle with a `ScorerFailure` naming the stage, never a silent
/// default.
pub fn evaluate_all(
    shipment: &Shipment,
    reference: &ReferenceData,
    forecast: &Forecast,
    as_of: NaiveDate,
) -> Result<ScorerVerdicts, ScorerFailure> {
    let area = area::evaluate(shipment, &reference.area_profiles)?;
    let weather = weather::evaluate(forecast)?;
    let vehicle = vehicle::evaluate(shipment, &reference.vehicle_specs)?;
    let priority = priority::evaluate(shipment, &reference.priority_bands, as_of)?;

    Ok(ScorerVerdicts {
        area,
        weather,
        vehicle,
        priority,
    })
}
