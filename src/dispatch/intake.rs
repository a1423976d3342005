use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

use super::domain::{
    AreaType, PaymentType, RawShipmentSubmission, RoadAccessibility, Shipment, ShipmentId,
};

/// Landmark vocabulary recognized in address text. A hit materially raises
/// confidence that a rider can locate the drop point.
const LANDMARK_VOCABULARY: &[&str] = &[
    "temple", "mandir", "masjid", "church", "school", "college", "hospital", "metro", "station",
    "bus stand", "market", "bazaar", "mall", "bank", "atm", "park",
];

/// Vague phrasing that forces riders to call the customer.
const VAGUE_PHRASES: &[&str] = &["near", "behind", "opposite", "beside"];

const BASE_CONFIDENCE: i32 = 50;
const SINGLE_LANDMARK_BONUS: i32 = 20;
const MULTI_LANDMARK_BONUS: i32 = 30;
const OLD_CITY_PENALTY: i32 = 15;
const RURAL_PENALTY: i32 = 10;
const NARROW_ROAD_PENALTY: i32 = 20;
const VAGUE_PHRASE_PENALTY: i32 = 10;

/// A single field-level problem found during intake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: &'static str,
    pub problem: String,
}

/// Validation failure carrying every violated field, not just the first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub violations: Vec<FieldViolation>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "submission rejected: ")?;
        for (index, violation) in self.violations.iter().enumerate() {
            if index > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", violation.field, violation.problem)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Guard converting raw seller submissions into canonical shipments.
///
/// Validation is deterministic: the same submission against the same `as_of`
/// date always produces the same shipment.
#[derive(Debug, Clone)]
pub struct IntakeGuard {
    as_of: NaiveDate,
}

impl IntakeGuard {
    pub fn new(as_of: NaiveDate) -> Self {
        Self { as_of }
    }

    /// Validate a submission, collecting every violation before failing.
    pub fn shipment_from_submission(
        &self,
        id: ShipmentId,
        submission: RawShipmentSubmission,
    ) -> Result<Shipment, ValidationError> {
        let mut violations = Vec::new();

        let weight_kg = require_positive(&mut violations, "weight_kg", submission.weight_kg);
        let volumetric_weight_kg = require_positive(
            &mut violations,
            "volumetric_weight_kg",
            submission.volumetric_weight_kg,
        );

        let payment_type = match submission.payment_type.as_deref() {
            None => {
                missing(&mut violations, "payment_type");
                None
            }
            Some(raw) => match PaymentType::parse(raw) {
                Some(parsed) => Some(parsed),
                None => {
                    unrecognized(&mut violations, "payment_type", raw, "COD or Prepaid");
                    None
                }
            },
        };

        let area_type = match submission.area_type.as_deref() {
            None => {
                missing(&mut violations, "area_type");
                None
            }
            Some(raw) => match AreaType::parse(raw) {
                Some(parsed) => Some(parsed),
                None => {
                    unrecognized(
                        &mut violations,
                        "area_type",
                        raw,
                        "Urban, OldCity, SemiUrban, or Rural",
                    );
                    None
                }
            },
        };

        let road_accessibility = match submission.road_accessibility.as_deref() {
            None => {
                missing(&mut violations, "road_accessibility");
                None
            }
            Some(raw) => match RoadAccessibility::parse(raw) {
                Some(parsed) => Some(parsed),
                None => {
                    unrecognized(
                        &mut violations,
                        "road_accessibility",
                        raw,
                        "Wide, Medium, or Narrow",
                    );
                    None
                }
            },
        };

        let address_text = match submission.address_text {
            Some(text) if !text.trim().is_empty() => Some(text),
            _ => {
                missing(&mut violations, "address_text");
                None
            }
        };

        let destination_city = match submission.destination_city {
            Some(city) if !city.trim().is_empty() => Some(city.trim().to_string()),
            _ => {
                missing(&mut violations, "destination_city");
                None
            }
        };

        let delivery_date = match submission.delivery_date {
            None => {
                missing(&mut violations, "delivery_date");
                None
            }
            Some(date) if date < self.as_of => {
                violations.push(FieldViolation {
                    field: "delivery_date",
                    problem: format!("cannot be in the past (received {date})"),
                });
                None
            }
            Some(date) => Some(date),
        };

        let declared_value = match submission.declared_value {
            None => {
                missing(&mut violations, "declared_value");
                None
            }
            Some(value) => Some(value),
        };

        if !violations.is_empty() {
            return Err(ValidationError { violations });
        }

        let area_type = area_type.expect("validated");
        let road_accessibility = road_accessibility.expect("validated");
        let address_text = address_text.expect("validated");

        let address_confidence = address_confidence(&address_text, area_type, road_accessibility);

        Ok(Shipment {
            id,
            weight_kg: weight_kg.expect("validated"),
            volumetric_weight_kg: volumetric_weight_kg.expect("validated"),
            payment_type: payment_type.expect("validated"),
            priority_flag: submission.priority_flag.unwrap_or(false),
            declared_value: declared_value.expect("validated"),
            area_type,
            road_accessibility,
            address_text,
            address_confidence,
            destination_city: destination_city.expect("validated"),
            delivery_date: delivery_date.expect("validated"),
        })
    }
}

/// Score how confidently a rider can locate the address, 0-100.
///
/// Pure function of the address text, a fixed landmark vocabulary, and the
/// physical area/road classification.
pub fn address_confidence(
    address_text: &str,
    area_type: AreaType,
    road_accessibility: RoadAccessibility,
) -> u8 {
    let cleaned = clean_address(address_text);
    let landmark_count = LANDMARK_VOCABULARY
        .iter()
        .filter(|keyword| cleaned.contains(*keyword))
        .count();

    let mut score = BASE_CONFIDENCE;

    if landmark_count == 1 {
        score += SINGLE_LANDMARK_BONUS;
    } else if landmark_count >= 2 {
        score += MULTI_LANDMARK_BONUS;
    }

    match area_type {
        AreaType::OldCity => score -= OLD_CITY_PENALTY,
        AreaType::Rural => score -= RURAL_PENALTY,
        AreaType::Urban | AreaType::SemiUrban => {}
    }

    if road_accessibility == RoadAccessibility::Narrow {
        score -= NARROW_ROAD_PENALTY;
    }

    if VAGUE_PHRASES
        .iter()
        .any(|phrase| cleaned.contains(*phrase))
    {
        score -= VAGUE_PHRASE_PENALTY;
    }

    score.clamp(0, 100) as u8
}

fn clean_address(text: &str) -> String {
    let mut cleaned = String::with_capacity(text.len());
    for ch in text.chars() {
        if ch.is_ascii_alphanumeric() {
            cleaned.push(ch.to_ascii_lowercase());
        } else {
            cleaned.push(' ');
        }
    }
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn require_positive(
    violations: &mut Vec<FieldViolation>,
    field: &'static str,
    value: Option<f64>,
) -> Option<f64> {
    match value {
        None => {
            missing(violations, field);
            None
        }
        Some(value) if !value.is_finite() || value <= 0.0 => {
            violations.push(FieldViolation {
                field,
                problem: format!("must be greater than zero (received {value})"),
            });
            None
        }
        Some(value) => Some(value),
    }
}

fn missing(violations: &mut Vec<FieldViolation>, field: &'static str) {
    violations.push(FieldViolation {
        field,
        problem: "is required".to_string(),
    });
}

fn unrecognized(
    violations: &mut Vec<FieldViolation>,
    field: &'static str,
    received: &str,
    expected: &'static str,
) {
    violations.push(FieldViolation {
        field,
        problem: format!("unrecognized value '{received}' (expected {expected})"),
    });
}
