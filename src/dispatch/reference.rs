use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::domain::{AreaType, VehicleClass};

/// Congestion tier recorded for a locality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CongestionLevel {
    Low,
    Medium,
    High,
}

impl CongestionLevel {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" | "moderate" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

/// Locality profile consumed by the area feasibility scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaProfile {
    /// Last-mile difficulty on a 1-5 scale.
    pub difficulty: u8,
    pub congestion: CongestionLevel,
    pub heavy_vehicle_allowed: bool,
}

/// Per-(city, area type) feasibility master data.
#[derive(Debug, Clone, Default)]
pub struct AreaProfiles {
    profiles: BTreeMap<(String, AreaType), AreaProfile>,
}

impl AreaProfiles {
    pub fn insert(&mut self, city: &str, area_type: AreaType, profile: AreaProfile) {
        self.profiles
            .insert((city.trim().to_ascii_lowercase(), area_type), profile);
    }

    pub fn lookup(&self, city: &str, area_type: AreaType) -> Option<&AreaProfile> {
        self.profiles
            .get(&(city.trim().to_ascii_lowercase(), area_type))
    }

    /// Load the feasibility master from CSV with columns
    /// `city,area_type,last_mile_difficulty,congestion_level,heavy_vehicle_allowed`.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ReferenceDataError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut profiles = Self::default();

        for (index, record) in csv_reader.deserialize::<AreaProfileRow>().enumerate() {
            let row = record?;
            let area_type = AreaType::parse(&row.area_type).ok_or_else(|| {
                ReferenceDataError::InvalidRow {
                    row: index + 1,
                    detail: format!("unknown area type '{}'", row.area_type),
                }
            })?;
            let congestion = CongestionLevel::parse(&row.congestion_level).ok_or_else(|| {
                ReferenceDataError::InvalidRow {
                    row: index + 1,
                    detail: format!("unknown congestion level '{}'", row.congestion_level),
                }
            })?;
            if !(1..=5).contains(&row.last_mile_difficulty) {
                return Err(ReferenceDataError::InvalidRow {
                    row: index + 1,
                    detail: format!(
                        "last_mile_difficulty must be 1-5 (received {})",
                        row.last_mile_difficulty
                    ),
                });
            }

            profiles.insert(
                &row.city,
                area_type,
                AreaProfile {
                    difficulty: row.last_mile_difficulty,
                    congestion,
                    heavy_vehicle_allowed: row.heavy_vehicle_allowed,
                },
            );
        }

        Ok(profiles)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ReferenceDataError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }
}

#[derive(Debug, Deserialize)]
struct AreaProfileRow {
    city: String,
    area_type: String,
    last_mile_difficulty: u8,
    congestion_level: String,
    heavy_vehicle_allowed: bool,
}

/// Capacity envelope for one vehicle class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleSpec {
    pub max_weight_kg: f64,
    pub max_volumetric_kg: f64,
}

/// Fleet capacity master consumed by the vehicle feasibility scorer.
#[derive(Debug, Clone)]
pub struct VehicleSpecs {
    specs: BTreeMap<&'static str, VehicleSpec>,
}

impl VehicleSpecs {
    pub fn lookup(&self, class: VehicleClass) -> Option<&VehicleSpec> {
        self.specs.get(class.label())
    }

    /// Load the fleet master from CSV with columns
    /// `vehicle_class,max_weight_kg,max_volumetric_kg`.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ReferenceDataError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut specs = BTreeMap::new();

        for (index, record) in csv_reader.deserialize::<VehicleSpecRow>().enumerate() {
            let row = record?;
            let class = match row.vehicle_class.trim().to_ascii_lowercase().as_str() {
                "bike" => VehicleClass::Bike,
                "van" => VehicleClass::Van,
                "truck" => VehicleClass::Truck,
                other => {
                    return Err(ReferenceDataError::InvalidRow {
                        row: index + 1,
                        detail: format!("unknown vehicle class '{other}'"),
                    })
                }
            };
            if row.max_weight_kg <= 0.0 || row.max_volumetric_kg <= 0.0 {
                return Err(ReferenceDataError::InvalidRow {
                    row: index + 1,
                    detail: "capacity limits must be positive".to_string(),
                });
            }
            specs.insert(
                class.label(),
                VehicleSpec {
                    max_weight_kg: row.max_weight_kg,
                    max_volumetric_kg: row.max_volumetric_kg,
                },
            );
        }

        Ok(Self { specs })
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ReferenceDataError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }
}

impl Default for VehicleSpecs {
    fn default() -> Self {
        let mut specs = BTreeMap::new();
        specs.insert(
            VehicleClass::Bike.label(),
            VehicleSpec {
                max_weight_kg: 5.0,
                max_volumetric_kg: 8.0,
            },
        );
        specs.insert(
            VehicleClass::Van.label(),
            VehicleSpec {
                max_weight_kg: 50.0,
                max_volumetric_kg: 80.0,
            },
        );
        specs.insert(
            VehicleClass::Truck.label(),
            VehicleSpec {
                max_weight_kg: 800.0,
                max_volumetric_kg: 1200.0,
            },
        );
        Self { specs }
    }
}

#[derive(Debug, Deserialize)]
struct VehicleSpecRow {
    vehicle_class: String,
    max_weight_kg: f64,
    max_volumetric_kg: f64,
}

/// Declared-value bands and delivery-window cutoffs for priority tiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityBands {
    pub high_value_floor: u32,
    pub medium_value_floor: u32,
    /// Deliveries due within this many days classify HIGH.
    pub urgent_window_days: i64,
    /// Deliveries due within this many days classify at least MEDIUM.
    pub soon_window_days: i64,
}

impl Default for PriorityBands {
    fn default() -> Self {
        Self {
            high_value_floor: 10_000,
            medium_value_floor: 2_500,
            urgent_window_days: 1,
            soon_window_days: 3,
        }
    }
}

/// Reference datasets the scorers consume, bundled for the service.
#[derive(Debug, Clone, Default)]
pub struct ReferenceData {
    pub area_profiles: AreaProfiles,
    pub vehicle_specs: VehicleSpecs,
    pub priority_bands: PriorityBands,
}

/// Failure reading or interpreting a reference dataset.
#[derive(Debug, thiserror::Error)]
pub enum ReferenceDataError {
    #[error("failed to read reference data: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse reference data: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid reference row {row}: {detail}")]
    InvalidRow { row: usize, detail: String },
}
