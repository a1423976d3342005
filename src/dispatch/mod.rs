//! The dispatch decision pipeline.
//!
//! Flow per shipment: intake validation, four independent scorers (area,
//! weather, vehicle, priority), composite risk scoring against a versioned
//! weight snapshot, explanation, then the decision gate. A human override
//! locks the decision against further automatic cycles; observed outcomes
//! feed the daily learning loop, which is the only writer of the weight
//! store.

pub mod domain;
pub mod explanation;
pub mod gate;
pub mod intake;
pub mod learning;
pub mod memory;
pub mod outcomes;
pub mod overrides;
pub mod reference;
pub mod repository;
pub mod router;
pub mod scorers;
pub mod scoring;
pub mod service;
pub mod weather;
pub mod weights;

#[cfg(test)]
mod tests;

pub use domain::{
    AreaType, AuthorityLevel, DecisionSource, DeliveryResult, DispatchDecision, DispatchStatus,
    PaymentType, RawShipmentSubmission, RoadAccessibility, Shipment, ShipmentId, VehicleClass,
};
pub use explanation::{explain, DelayExplanation, ImprovementHint, RankedReason};
pub use gate::{decide, DecisionRecord, GateOutcome, LockedShipmentError, HARD_BLOCK_RULES};
pub use intake::{address_confidence, FieldViolation, IntakeGuard, ValidationError};
pub use learning::{run_cycle, CycleReport, FactorCycleStats, LearningConfig};
pub use outcomes::{prediction_mismatch, OutcomeRecord};
pub use overrides::{
    authority_permits, OverrideError, OverrideRecord, OverrideRequest, MIN_REASON_LEN,
};
pub use reference::{
    AreaProfile, AreaProfiles, CongestionLevel, PriorityBands, ReferenceData, ReferenceDataError,
    VehicleSpec, VehicleSpecs,
};
pub use repository::{
    AlertError, AlertPublisher, DispatchAlert, DispatchRepository, RepositoryError,
    ShipmentRecord, ShipmentStatusView,
};
pub use router::dispatch_router;
pub use scorers::{
    evaluate_all, AreaFeasibility, AreaVerdict, PriorityTier, PriorityVerdict, ScorerFailure,
    ScorerKind, ScorerVerdicts, VehicleFeasibility, VehicleSuggestion, VehicleVerdict,
    WeatherVerdict,
};
pub use scoring::{
    FactorContribution, RiskAssessment, RiskBucket, RiskEngine, ScoringConfig,
};
pub use service::{DispatchService, DispatchServiceError, EvaluationView};
pub use weather::{
    DegradingForecasts, Forecast, WeatherError, WeatherProvider, WeatherSeverity,
};
pub use weights::{
    RiskFactor, WeightAdjustment, WeightConfig, WeightSnapshot, WeightStore, WeightStoreError,
    HISTORY_LIMIT, MAX_STEP_PER_CYCLE, MAX_WEIGHT, MIN_WEIGHT,
};
