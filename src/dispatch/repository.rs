use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{DispatchDecision, DispatchStatus, Shipment, ShipmentId};
use super::gate::DecisionRecord;
use super::outcomes::OutcomeRecord;
use super::overrides::OverrideRecord;
use super::scoring::RiskAssessment;

/// Repository record pairing the immutable shipment with its mutable
/// pipeline status and last computed risk score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipmentRecord {
    pub shipment: Shipment,
    pub status: DispatchStatus,
    pub current_risk_score: Option<u8>,
}

impl ShipmentRecord {
    pub fn new(shipment: Shipment) -> Self {
        Self {
            shipment,
            status: DispatchStatus::Pending,
            current_risk_score: None,
        }
    }
}

/// Sanitized status representation exposed through the API.
#[derive(Debug, Clone, Serialize)]
pub struct ShipmentStatusView {
    pub shipment_id: ShipmentId,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_score: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision: Option<&'static str>,
    pub locked: bool,
}

/// Error enumeration for record store failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("stale write: expected version {expected}, found {found}")]
    VersionConflict { expected: u64, found: u64 },
    #[error("record store unavailable: {0}")]
    Unavailable(String),
}

/// Storage abstraction over the five pipeline collections, keyed by shipment
/// id. The technology behind it is an external concern; decisions carry an
/// optimistic version so racing writers serialize.
pub trait DispatchRepository: Send + Sync {
    fn insert_shipment(&self, record: ShipmentRecord) -> Result<ShipmentRecord, RepositoryError>;
    fn update_shipment(&self, record: ShipmentRecord) -> Result<(), RepositoryError>;
    fn fetch_shipment(&self, id: &ShipmentId) -> Result<Option<ShipmentRecord>, RepositoryError>;

    fn store_assessment(&self, assessment: RiskAssessment) -> Result<(), RepositoryError>;
    fn fetch_assessment(&self, id: &ShipmentId)
        -> Result<Option<RiskAssessment>, RepositoryError>;

    fn insert_decision(&self, decision: DecisionRecord) -> Result<(), RepositoryError>;
    fn fetch_decision(&self, id: &ShipmentId) -> Result<Option<DecisionRecord>, RepositoryError>;
    /// Replace the standing decision only when the stored version matches.
    fn update_decision(
        &self,
        decision: DecisionRecord,
        expected_version: u64,
    ) -> Result<(), RepositoryError>;

    fn append_override(&self, record: OverrideRecord) -> Result<(), RepositoryError>;
    fn overrides_for(&self, id: &ShipmentId) -> Result<Vec<OverrideRecord>, RepositoryError>;

    fn append_outcome(&self, outcome: OutcomeRecord) -> Result<(), RepositoryError>;
    fn outcomes_since(
        &self,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<OutcomeRecord>, RepositoryError>;
}

/// Event emitted when a shipment is held back, so customer messaging can go
/// out. Delivery channel and format are out of scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchAlert {
    pub shipment_id: ShipmentId,
    pub decision: DispatchDecision,
    pub reasons: Vec<String>,
    pub recommended_eta_multiplier: f64,
}

/// Trait describing outbound notification hooks (SMS/WhatsApp/email
/// adapters); the core only does send-and-log.
pub trait AlertPublisher: Send + Sync {
    fn publish(&self, alert: DispatchAlert) -> Result<(), AlertError>;
}

/// Alert dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum AlertError {
    #[error("alert transport unavailable: {0}")]
    Transport(String),
}
