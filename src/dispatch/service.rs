use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::{info, warn};

use super::domain::{
    DecisionSource, DeliveryResult, DispatchDecision, DispatchStatus, RawShipmentSubmission,
    ShipmentId,
};
use super::explanation::{explain, DelayExplanation};
use super::gate::{decide, DecisionRecord, LockedShipmentError};
use super::intake::{IntakeGuard, ValidationError};
use super::learning::{run_cycle, CycleReport, LearningConfig};
use super::outcomes::OutcomeRecord;
use super::overrides::{self, OverrideError, OverrideRecord, OverrideRequest};
use super::reference::ReferenceData;
use super::repository::{
    AlertError, AlertPublisher, DispatchAlert, DispatchRepository, RepositoryError,
    ShipmentRecord, ShipmentStatusView,
};
use super::scorers::evaluate_all;
use super::scoring::{RiskAssessment, RiskBucket, RiskEngine, ScoringConfig};
use super::weather::{DegradingForecasts, WeatherProvider};
use super::weights::{WeightSnapshot, WeightStore, WeightStoreError};

static SHIPMENT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_shipment_id() -> ShipmentId {
    let id = SHIPMENT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ShipmentId(format!("shp-{id:06}"))
}

/// Full result of one automatic decision cycle.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationView {
    pub shipment_id: ShipmentId,
    pub decision: DecisionRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assessment: Option<RiskAssessment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<DelayExplanation>,
    pub eta_multiplier: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forced_by: Option<String>,
}

/// Error raised by the dispatch service.
#[derive(Debug, thiserror::Error)]
pub enum DispatchServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Locked(#[from] LockedShipmentError),
    #[error(transparent)]
    Weights(#[from] WeightStoreError),
    #[error(transparent)]
    Override(#[from] OverrideError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Alert(#[from] AlertError),
}

/// Service composing intake, the scorer fan-out, risk scoring, the decision
/// gate, overrides, outcome logging, and the learning loop over the external
/// collaborator traits.
pub struct DispatchService<R, A, W> {
    repository: Arc<R>,
    alerts: Arc<A>,
    weather: DegradingForecasts<W>,
    reference: Arc<ReferenceData>,
    weights: Arc<WeightStore>,
    engine: RiskEngine,
    learning: LearningConfig,
}

impl<R, A, W> DispatchService<R, A, W>
where
    R: DispatchRepository + 'static,
    A: AlertPublisher + 'static,
    W: WeatherProvider + 'static,
{
    pub fn new(repository: Arc<R>, alerts: Arc<A>, weather: W, reference: ReferenceData) -> Self {
        Self::with_configs(
            repository,
            alerts,
            weather,
            reference,
            WeightStore::default(),
            ScoringConfig::default(),
            LearningConfig::default(),
        )
    }

    pub fn with_configs(
        repository: Arc<R>,
        alerts: Arc<A>,
        weather: W,
        reference: ReferenceData,
        weights: WeightStore,
        scoring: ScoringConfig,
        learning: LearningConfig,
    ) -> Self {
        Self {
            repository,
            alerts,
            weather: DegradingForecasts::new(weather),
            reference: Arc::new(reference),
            weights: Arc::new(weights),
            engine: RiskEngine::new(scoring),
            learning,
        }
    }

    /// Validate and register a new shipment, returning the pending record.
    pub fn submit(
        &self,
        submission: RawShipmentSubmission,
        as_of: NaiveDate,
    ) -> Result<ShipmentRecord, DispatchServiceError> {
        let guard = IntakeGuard::new(as_of);
        let shipment = guard.shipment_from_submission(next_shipment_id(), submission)?;
        let record = self.repository.insert_shipment(ShipmentRecord::new(shipment))?;
        info!(shipment_id = %record.shipment.id.0, "shipment accepted");
        Ok(record)
    }

    /// Re-entry after clarification: re-validate the replacement submission,
    /// reset the shipment to pending, and clear any override lock so exactly
    /// one new automatic cycle can run.
    pub fn resubmit(
        &self,
        id: &ShipmentId,
        submission: RawShipmentSubmission,
        as_of: NaiveDate,
    ) -> Result<ShipmentRecord, DispatchServiceError> {
        self.repository
            .fetch_shipment(id)?
            .ok_or(RepositoryError::NotFound)?;

        let guard = IntakeGuard::new(as_of);
        let shipment = guard.shipment_from_submission(id.clone(), submission)?;

        if let Some(decision) = self.repository.fetch_decision(id)? {
            if decision.locked {
                let expected = decision.version;
                let unlocked = DecisionRecord {
                    locked: false,
                    version: expected + 1,
                    ..decision
                };
                self.repository.update_decision(unlocked, expected)?;
            }
        }

        let record = ShipmentRecord::new(shipment);
        self.repository.update_shipment(record.clone())?;
        info!(shipment_id = %id.0, "shipment resubmitted for a fresh cycle");
        Ok(record)
    }

    /// Run one automatic decision cycle: scorer fan-out, risk scoring against
    /// a weight snapshot, explanation, and the decision gate.
    pub fn evaluate(
        &self,
        id: &ShipmentId,
        as_of: NaiveDate,
        at: DateTime<Utc>,
    ) -> Result<EvaluationView, DispatchServiceError> {
        let mut record = self
            .repository
            .fetch_shipment(id)?
            .ok_or(RepositoryError::NotFound)?;

        let prior = self.repository.fetch_decision(id)?;
        if prior.as_ref().is_some_and(|decision| decision.locked) {
            return Err(LockedShipmentError {
                shipment_id: id.clone(),
            }
            .into());
        }

        // Weights must be readable before any scoring happens; an unreadable
        // store aborts the cycle instead of scoring with undefined weights.
        let snapshot = self.weights.snapshot()?;

        let forecast = self
            .weather
            .forecast_or_default(&record.shipment.destination_city, record.shipment.delivery_date);

        let verdicts = match evaluate_all(&record.shipment, &self.reference, &forecast, as_of) {
            Ok(verdicts) => verdicts,
            Err(first_failure) => {
                warn!(shipment_id = %id.0, %first_failure, "scorer failed, retrying once");
                match evaluate_all(&record.shipment, &self.reference, &forecast, as_of) {
                    Ok(verdicts) => verdicts,
                    Err(failure) => {
                        return self.fail_safe_reschedule(record, prior, failure.to_string(), at);
                    }
                }
            }
        };

        let assessment = self
            .engine
            .assess(&record.shipment, &verdicts, &snapshot, at);
        self.repository.store_assessment(assessment.clone())?;

        let explanation = explain(&assessment, self.engine.config());
        let outcome = decide(&assessment, &verdicts);

        let mut reasons: Vec<String> = Vec::new();
        if let Some(rule) = outcome.forced_by {
            reasons.push(format!("forced reschedule: {rule}"));
        }
        reasons.extend(
            explanation
                .reasons
                .iter()
                .take(3)
                .map(|reason| reason.phrase.clone()),
        );

        let decision = DecisionRecord {
            shipment_id: id.clone(),
            decision: outcome.decision,
            source: DecisionSource::Ai,
            risk_score: assessment.score,
            risk_bucket: assessment.bucket,
            reasons: reasons.clone(),
            locked: false,
            version: prior.as_ref().map_or(1, |prior| prior.version + 1),
            decided_at: at,
        };
        self.persist_decision(&decision, prior.as_ref())?;

        record.status = DispatchStatus::from_decision(outcome.decision);
        record.current_risk_score = Some(assessment.score);
        self.repository.update_shipment(record)?;

        self.notify_if_held(&decision, &reasons, verdicts.weather.eta_multiplier)?;

        info!(
            shipment_id = %id.0,
            score = assessment.score,
            decision = decision.decision.label(),
            "decision cycle complete"
        );

        Ok(EvaluationView {
            shipment_id: id.clone(),
            eta_multiplier: verdicts.weather.eta_multiplier,
            forced_by: outcome.forced_by.map(str::to_string),
            decision,
            assessment: Some(assessment),
            explanation: Some(explanation),
        })
    }

    /// Apply a human override to the standing decision. The decision write is
    /// a compare-and-swap, so of two racing managers exactly one wins.
    pub fn override_decision(
        &self,
        request: OverrideRequest,
        at: DateTime<Utc>,
    ) -> Result<OverrideRecord, DispatchServiceError> {
        let current = self
            .repository
            .fetch_decision(&request.shipment_id)?
            .ok_or(RepositoryError::NotFound)?;

        overrides::validate(&request, &current)?;

        let (record, decision) = overrides::apply(&request, &current, at);
        match self.repository.update_decision(decision, current.version) {
            Ok(()) => {}
            Err(RepositoryError::VersionConflict { .. }) => {
                return Err(OverrideError::Conflict.into())
            }
            Err(other) => return Err(other.into()),
        }
        self.repository.append_override(record.clone())?;

        if let Some(mut shipment) = self.repository.fetch_shipment(&request.shipment_id)? {
            shipment.status = DispatchStatus::Overridden;
            self.repository.update_shipment(shipment)?;
        }

        info!(
            shipment_id = %request.shipment_id.0,
            actor = %record.actor,
            from = record.prior_decision.label(),
            to = record.new_decision.label(),
            "decision overridden and locked"
        );

        Ok(record)
    }

    /// Record the observed delivery result for a completed shipment.
    pub fn record_outcome(
        &self,
        id: &ShipmentId,
        actual: DeliveryResult,
        at: DateTime<Utc>,
    ) -> Result<OutcomeRecord, DispatchServiceError> {
        let decision = self
            .repository
            .fetch_decision(id)?
            .ok_or(RepositoryError::NotFound)?;
        let overridden = !self.repository.overrides_for(id)?.is_empty();

        let outcome = OutcomeRecord::new(
            id.clone(),
            decision.decision,
            decision.risk_bucket,
            actual,
            overridden,
            at,
        );
        self.repository.append_outcome(outcome.clone())?;
        Ok(outcome)
    }

    /// Run one learning cycle over outcomes recorded since the previous one.
    pub fn run_learning_cycle(
        &self,
        at: DateTime<Utc>,
    ) -> Result<CycleReport, DispatchServiceError> {
        let since = self.weights.snapshot()?.config().last_updated;
        let outcomes = self.repository.outcomes_since(since)?;

        let mut evidence = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            if let Some(assessment) = self.repository.fetch_assessment(&outcome.shipment_id)? {
                evidence.push((outcome, assessment));
            }
        }

        Ok(run_cycle(&evidence, &self.weights, &self.learning, at)?)
    }

    /// Operator-facing read of the weights and their adjustment history.
    pub fn weights_view(&self) -> Result<WeightSnapshot, DispatchServiceError> {
        Ok(self.weights.snapshot()?)
    }

    /// Fetch a shipment's exposed status for API responses.
    pub fn get(&self, id: &ShipmentId) -> Result<ShipmentStatusView, DispatchServiceError> {
        let record = self
            .repository
            .fetch_shipment(id)?
            .ok_or(RepositoryError::NotFound)?;
        let decision = self.repository.fetch_decision(id)?;

        Ok(ShipmentStatusView {
            shipment_id: record.shipment.id,
            status: record.status.label(),
            risk_score: record.current_risk_score,
            decision: decision.as_ref().map(|decision| decision.decision.label()),
            locked: decision.is_some_and(|decision| decision.locked),
        })
    }

    fn fail_safe_reschedule(
        &self,
        mut record: ShipmentRecord,
        prior: Option<DecisionRecord>,
        failure: String,
        at: DateTime<Utc>,
    ) -> Result<EvaluationView, DispatchServiceError> {
        warn!(
            shipment_id = %record.shipment.id.0,
            %failure,
            "scorer failed twice, forcing reschedule"
        );

        let reasons = vec![format!("fail-safe reschedule: {failure}")];
        let decision = DecisionRecord {
            shipment_id: record.shipment.id.clone(),
            decision: DispatchDecision::Reschedule,
            source: DecisionSource::Ai,
            risk_score: record.current_risk_score.unwrap_or(0),
            // Conservative bucket so only managers can override a fail-safe.
            risk_bucket: RiskBucket::High,
            reasons: reasons.clone(),
            locked: false,
            version: prior.as_ref().map_or(1, |prior| prior.version + 1),
            decided_at: at,
        };
        self.persist_decision(&decision, prior.as_ref())?;

        record.status = DispatchStatus::Reschedule;
        self.repository.update_shipment(record)?;

        self.notify_if_held(&decision, &reasons, 1.0)?;

        Ok(EvaluationView {
            shipment_id: decision.shipment_id.clone(),
            decision,
            assessment: None,
            explanation: None,
            eta_multiplier: 1.0,
            forced_by: Some("scorer failure".to_string()),
        })
    }

    fn persist_decision(
        &self,
        decision: &DecisionRecord,
        prior: Option<&DecisionRecord>,
    ) -> Result<(), DispatchServiceError> {
        match prior {
            None => self.repository.insert_decision(decision.clone())?,
            Some(prior) => self
                .repository
                .update_decision(decision.clone(), prior.version)?,
        }
        Ok(())
    }

    fn notify_if_held(
        &self,
        decision: &DecisionRecord,
        reasons: &[String],
        eta_multiplier: f64,
    ) -> Result<(), DispatchServiceError> {
        if matches!(
            decision.decision,
            DispatchDecision::Delay | DispatchDecision::Reschedule
        ) {
            self.alerts.publish(DispatchAlert {
                shipment_id: decision.shipment_id.clone(),
                decision: decision.decision,
                reasons: reasons.to_vec(),
                recommended_eta_multiplier: eta_multiplier,
            })?;
        }
        Ok(())
    }
}
