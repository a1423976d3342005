use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{AreaType, PaymentType, RoadAccessibility, Shipment, ShipmentId};
use super::scorers::ScorerVerdicts;
use super::weights::{RiskFactor, WeightSnapshot};
use crate::dispatch::weather::WeatherSeverity;

/// Confidence below this adds the full address weight; below the upper bound
/// adds half.
const LOW_CONFIDENCE_CEILING: u8 = 60;
const FAIR_CONFIDENCE_CEILING: u8 = 80;
const HEAVY_SHIPMENT_KG: f64 = 10.0;
const BULKY_VOLUMETRIC_KG: f64 = 15.0;
const PRIORITY_DAMPENING: i32 = 5;

/// Coarse risk tier derived from the score via fixed cut points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskBucket {
    Low,
    Medium,
    High,
}

impl RiskBucket {
    pub const fn label(self) -> &'static str {
        match self {
            RiskBucket::Low => "low",
            RiskBucket::Medium => "medium",
            RiskBucket::High => "high",
        }
    }
}

/// Bucket cut points and decision thresholds, named so they can be tuned
/// alongside the weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Scores below this are Low risk and dispatchable.
    pub low_ceiling: u8,
    /// Scores at or above this are High risk and rescheduled.
    pub high_floor: u8,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            low_ceiling: 40,
            high_floor: 60,
        }
    }
}

impl ScoringConfig {
    pub fn bucket(&self, score: u8) -> RiskBucket {
        if score < self.low_ceiling {
            RiskBucket::Low
        } else if score < self.high_floor {
            RiskBucket::Medium
        } else {
            RiskBucket::High
        }
    }
}

/// Discrete contribution to an assessment, allowing transparent audits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorContribution {
    pub factor: RiskFactor,
    pub points: i32,
    pub note: String,
}

/// Composite risk assessment for one shipment against one weight snapshot.
///
/// Contributions sum to `raw_score`; `score` is the [0,100] clamp of it.
/// Re-assessing an unchanged shipment with the same snapshot and timestamp
/// yields an identical value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub shipment_id: ShipmentId,
    pub score: u8,
    pub raw_score: i32,
    pub bucket: RiskBucket,
    pub contributions: Vec<FactorContribution>,
    pub weight_version: u64,
    pub generated_at: DateTime<Utc>,
}

impl RiskAssessment {
    pub fn contribution(&self, factor: RiskFactor) -> i32 {
        self.contributions
            .iter()
            .filter(|entry| entry.factor == factor)
            .map(|entry| entry.points)
            .sum()
    }
}

/// Stateless engine combining scorer verdicts with a weight snapshot.
#[derive(Debug, Clone)]
pub struct RiskEngine {
    config: ScoringConfig,
}

impl RiskEngine {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Score a shipment. Pure given the snapshot; the caller supplies the
    /// generation timestamp so identical inputs produce identical output.
    pub fn assess(
        &self,
        shipment: &Shipment,
        verdicts: &ScorerVerdicts,
        weights: &WeightSnapshot,
        generated_at: DateTime<Utc>,
    ) -> RiskAssessment {
        let mut contributions = Vec::new();

        if shipment.payment_type == PaymentType::Cod {
            push(
                &mut contributions,
                RiskFactor::CodPayment,
                weights.weight(RiskFactor::CodPayment),
                "cash on delivery raises refusal risk".to_string(),
            );
        }

        let area_weight = weights.weight(RiskFactor::AreaType);
        match shipment.area_type {
            AreaType::OldCity => push(
                &mut contributions,
                RiskFactor::AreaType,
                area_weight,
                "old city access is the hardest last mile".to_string(),
            ),
            AreaType::Rural => push(
                &mut contributions,
                RiskFactor::AreaType,
                area_weight * 4 / 5,
                "rural delivery distances stretch the route".to_string(),
            ),
            AreaType::SemiUrban => push(
                &mut contributions,
                RiskFactor::AreaType,
                area_weight / 2,
                "semi-urban coverage is thinner than urban".to_string(),
            ),
            AreaType::Urban => {}
        }

        let road_weight = weights.weight(RiskFactor::RoadAccess);
        match shipment.road_accessibility {
            RoadAccessibility::Narrow => push(
                &mut contributions,
                RiskFactor::RoadAccess,
                road_weight,
                "narrow road limits vehicle access".to_string(),
            ),
            RoadAccessibility::Medium => push(
                &mut contributions,
                RiskFactor::RoadAccess,
                road_weight / 2,
                "medium road restricts larger vehicles".to_string(),
            ),
            RoadAccessibility::Wide => {}
        }

        let address_weight = weights.weight(RiskFactor::AddressConfidence);
        if shipment.address_confidence < LOW_CONFIDENCE_CEILING {
            push(
                &mut contributions,
                RiskFactor::AddressConfidence,
                address_weight,
                format!(
                    "address confidence {} needs clarification",
                    shipment.address_confidence
                ),
            );
        } else if shipment.address_confidence < FAIR_CONFIDENCE_CEILING {
            push(
                &mut contributions,
                RiskFactor::AddressConfidence,
                address_weight / 2,
                format!(
                    "address confidence {} is only fair",
                    shipment.address_confidence
                ),
            );
        }

        let weather_weight = weights.weight(RiskFactor::WeatherSeverity);
        match verdicts.weather.severity {
            WeatherSeverity::High => push(
                &mut contributions,
                RiskFactor::WeatherSeverity,
                weather_weight,
                "severe weather forecast for the delivery window".to_string(),
            ),
            WeatherSeverity::Medium => push(
                &mut contributions,
                RiskFactor::WeatherSeverity,
                weather_weight / 2,
                "unsettled weather forecast for the delivery window".to_string(),
            ),
            WeatherSeverity::Low => {}
        }

        let weight_weight = weights.weight(RiskFactor::WeightClass);
        if shipment.weight_kg > HEAVY_SHIPMENT_KG {
            push(
                &mut contributions,
                RiskFactor::WeightClass,
                weight_weight,
                format!("{}kg load slows handling", shipment.weight_kg),
            );
        }
        if shipment.volumetric_weight_kg > BULKY_VOLUMETRIC_KG {
            push(
                &mut contributions,
                RiskFactor::WeightClass,
                weight_weight / 2,
                "bulky parcel complicates loading".to_string(),
            );
        }

        if shipment.priority_flag {
            push(
                &mut contributions,
                RiskFactor::PriorityDampening,
                -PRIORITY_DAMPENING,
                "priority shipments get extra operational care".to_string(),
            );
        }

        let raw_score: i32 = contributions.iter().map(|entry| entry.points).sum();
        let score = raw_score.clamp(0, 100) as u8;

        RiskAssessment {
            shipment_id: shipment.id.clone(),
            score,
            raw_score,
            bucket: self.config.bucket(score),
            contributions,
            weight_version: weights.version,
            generated_at,
        }
    }
}

fn push(contributions: &mut Vec<FactorContribution>, factor: RiskFactor, points: i32, note: String) {
    contributions.push(FactorContribution {
        factor,
        points,
        note,
    });
}
