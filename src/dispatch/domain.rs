use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Identifier wrapper for shipments flowing through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ShipmentId(pub String);

/// Payment arrangement for the shipment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentType {
    Cod,
    Prepaid,
}

impl PaymentType {
    pub(crate) fn parse(raw: &str) -> Option<Self> {
        match normalize_token(raw).as_str() {
            "cod" | "cashondelivery" => Some(Self::Cod),
            "prepaid" => Some(Self::Prepaid),
            _ => None,
        }
    }
}

/// Destination area classification used by feasibility and risk scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AreaType {
    Urban,
    OldCity,
    SemiUrban,
    Rural,
}

impl AreaType {
    pub(crate) fn parse(raw: &str) -> Option<Self> {
        match normalize_token(raw).as_str() {
            "urban" | "planned" => Some(Self::Urban),
            "oldcity" => Some(Self::OldCity),
            "semiurban" => Some(Self::SemiUrban),
            "rural" => Some(Self::Rural),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            AreaType::Urban => "urban",
            AreaType::OldCity => "old_city",
            AreaType::SemiUrban => "semi_urban",
            AreaType::Rural => "rural",
        }
    }
}

/// Physical road access at the delivery point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RoadAccessibility {
    Wide,
    Medium,
    Narrow,
}

impl RoadAccessibility {
    pub(crate) fn parse(raw: &str) -> Option<Self> {
        match normalize_token(raw).as_str() {
            "wide" => Some(Self::Wide),
            "medium" => Some(Self::Medium),
            "narrow" => Some(Self::Narrow),
            _ => None,
        }
    }
}

/// Delivery vehicle classes the fleet operates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VehicleClass {
    Bike,
    Van,
    Truck,
}

impl VehicleClass {
    /// Default class assignment by shipment weight.
    pub fn for_weight(weight_kg: f64) -> Self {
        if weight_kg <= 5.0 {
            VehicleClass::Bike
        } else if weight_kg <= 50.0 {
            VehicleClass::Van
        } else {
            VehicleClass::Truck
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            VehicleClass::Bike => "bike",
            VehicleClass::Van => "van",
            VehicleClass::Truck => "truck",
        }
    }
}

/// Final pipeline decision for a shipment cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DispatchDecision {
    Dispatch,
    Delay,
    Reschedule,
}

impl DispatchDecision {
    pub const fn label(self) -> &'static str {
        match self {
            DispatchDecision::Dispatch => "dispatch",
            DispatchDecision::Delay => "delay",
            DispatchDecision::Reschedule => "reschedule",
        }
    }
}

/// Who produced the currently standing decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecisionSource {
    Ai,
    Human,
}

/// Override authority, ordered from least to most empowered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AuthorityLevel {
    Operator,
    Supervisor,
    Manager,
}

impl AuthorityLevel {
    pub const fn label(self) -> &'static str {
        match self {
            AuthorityLevel::Operator => "operator",
            AuthorityLevel::Supervisor => "supervisor",
            AuthorityLevel::Manager => "manager",
        }
    }
}

/// Terminal delivery result reported back by field operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryResult {
    Delivered,
    Failed,
    Returned,
}

/// High level status tracked for each shipment through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DispatchStatus {
    Pending,
    Dispatch,
    Delay,
    Reschedule,
    Overridden,
}

impl DispatchStatus {
    pub const fn label(self) -> &'static str {
        match self {
            DispatchStatus::Pending => "pending",
            DispatchStatus::Dispatch => "dispatch",
            DispatchStatus::Delay => "delay",
            DispatchStatus::Reschedule => "reschedule",
            DispatchStatus::Overridden => "overridden",
        }
    }

    pub const fn from_decision(decision: DispatchDecision) -> Self {
        match decision {
            DispatchDecision::Dispatch => DispatchStatus::Dispatch,
            DispatchDecision::Delay => DispatchStatus::Delay,
            DispatchDecision::Reschedule => DispatchStatus::Reschedule,
        }
    }
}

/// Raw seller submission before validation. Every field is optional so the
/// intake guard can report all violations in one pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawShipmentSubmission {
    #[serde(default)]
    pub weight_kg: Option<f64>,
    #[serde(default)]
    pub volumetric_weight_kg: Option<f64>,
    #[serde(default)]
    pub payment_type: Option<String>,
    #[serde(default)]
    pub priority_flag: Option<bool>,
    #[serde(default)]
    pub declared_value: Option<u32>,
    #[serde(default)]
    pub area_type: Option<String>,
    #[serde(default)]
    pub road_accessibility: Option<String>,
    #[serde(default)]
    pub address_text: Option<String>,
    #[serde(default)]
    pub destination_city: Option<String>,
    #[serde(default)]
    pub delivery_date: Option<NaiveDate>,
}

/// Canonical shipment record produced by intake validation. Immutable once
/// accepted; status and the latest risk score live on the repository record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shipment {
    pub id: ShipmentId,
    pub weight_kg: f64,
    pub volumetric_weight_kg: f64,
    pub payment_type: PaymentType,
    pub priority_flag: bool,
    pub declared_value: u32,
    pub area_type: AreaType,
    pub road_accessibility: RoadAccessibility,
    pub address_text: String,
    pub address_confidence: u8,
    pub destination_city: String,
    pub delivery_date: NaiveDate,
}

impl Shipment {
    /// Vehicle class the dispatch plan starts from.
    pub fn planned_vehicle(&self) -> VehicleClass {
        VehicleClass::for_weight(self.weight_kg)
    }
}

fn normalize_token(raw: &str) -> String {
    raw.chars()
        .filter(|ch| ch.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase()
}
