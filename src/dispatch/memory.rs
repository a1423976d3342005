//! In-memory collaborator implementations backing the binary and the test
//! suite. Production deployments swap these for real adapters behind the same
//! traits.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, NaiveDate, Utc};

use super::gate::DecisionRecord;
use super::outcomes::OutcomeRecord;
use super::overrides::OverrideRecord;
use super::repository::{
    AlertError, AlertPublisher, DispatchAlert, DispatchRepository, RepositoryError, ShipmentRecord,
};
use super::scoring::RiskAssessment;
use super::domain::ShipmentId;
use super::weather::{Forecast, WeatherError, WeatherProvider};

#[derive(Default)]
struct Collections {
    shipments: HashMap<ShipmentId, ShipmentRecord>,
    assessments: HashMap<ShipmentId, RiskAssessment>,
    decisions: HashMap<ShipmentId, DecisionRecord>,
    overrides: Vec<OverrideRecord>,
    outcomes: Vec<OutcomeRecord>,
}

/// Mutex-guarded map store implementing all five collections.
#[derive(Default, Clone)]
pub struct MemoryRepository {
    inner: Arc<Mutex<Collections>>,
}

impl MemoryRepository {
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Collections>, RepositoryError> {
        self.inner
            .lock()
            .map_err(|_| RepositoryError::Unavailable("store mutex poisoned".to_string()))
    }
}

impl DispatchRepository for MemoryRepository {
    fn insert_shipment(&self, record: ShipmentRecord) -> Result<ShipmentRecord, RepositoryError> {
        let mut guard = self.lock()?;
        if guard.shipments.contains_key(&record.shipment.id) {
            return Err(RepositoryError::Conflict);
        }
        guard
            .shipments
            .insert(record.shipment.id.clone(), record.clone());
        Ok(record)
    }

    fn update_shipment(&self, record: ShipmentRecord) -> Result<(), RepositoryError> {
        let mut guard = self.lock()?;
        if !guard.shipments.contains_key(&record.shipment.id) {
            return Err(RepositoryError::NotFound);
        }
        guard.shipments.insert(record.shipment.id.clone(), record);
        Ok(())
    }

    fn fetch_shipment(&self, id: &ShipmentId) -> Result<Option<ShipmentRecord>, RepositoryError> {
        Ok(self.lock()?.shipments.get(id).cloned())
    }

    fn store_assessment(&self, assessment: RiskAssessment) -> Result<(), RepositoryError> {
        let mut guard = self.lock()?;
        guard
            .assessments
            .insert(assessment.shipment_id.clone(), assessment);
        Ok(())
    }

    fn fetch_assessment(
        &self,
        id: &ShipmentId,
    ) -> Result<Option<RiskAssessment>, RepositoryError> {
        Ok(self.lock()?.assessments.get(id).cloned())
    }

    fn insert_decision(&self, decision: DecisionRecord) -> Result<(), RepositoryError> {
        let mut guard = self.lock()?;
        if guard.decisions.contains_key(&decision.shipment_id) {
            return Err(RepositoryError::Conflict);
        }
        guard
            .decisions
            .insert(decision.shipment_id.clone(), decision);
        Ok(())
    }

    fn fetch_decision(&self, id: &ShipmentId) -> Result<Option<DecisionRecord>, RepositoryError> {
        Ok(self.lock()?.decisions.get(id).cloned())
    }

    fn update_decision(
        &self,
        decision: DecisionRecord,
        expected_version: u64,
    ) -> Result<(), RepositoryError> {
        let mut guard = self.lock()?;
        let current = guard
            .decisions
            .get(&decision.shipment_id)
            .ok_or(RepositoryError::NotFound)?;
        if current.version != expected_version {
            return Err(RepositoryError::VersionConflict {
                expected: expected_version,
                found: current.version,
            });
        }
        guard
            .decisions
            .insert(decision.shipment_id.clone(), decision);
        Ok(())
    }

    fn append_override(&self, record: OverrideRecord) -> Result<(), RepositoryError> {
        self.lock()?.overrides.push(record);
        Ok(())
    }

    fn overrides_for(&self, id: &ShipmentId) -> Result<Vec<OverrideRecord>, RepositoryError> {
        Ok(self
            .lock()?
            .overrides
            .iter()
            .filter(|record| &record.shipment_id == id)
            .cloned()
            .collect())
    }

    fn append_outcome(&self, outcome: OutcomeRecord) -> Result<(), RepositoryError> {
        let mut guard = self.lock()?;
        if guard
            .outcomes
            .iter()
            .any(|existing| existing.shipment_id == outcome.shipment_id)
        {
            return Err(RepositoryError::Conflict);
        }
        guard.outcomes.push(outcome);
        Ok(())
    }

    fn outcomes_since(
        &self,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<OutcomeRecord>, RepositoryError> {
        Ok(self
            .lock()?
            .outcomes
            .iter()
            .filter(|outcome| since.map_or(true, |cutoff| outcome.recorded_at > cutoff))
            .cloned()
            .collect())
    }
}

/// Collects alerts instead of sending them, so routes and tests can assert
/// the integration boundary.
#[derive(Default, Clone)]
pub struct MemoryAlerts {
    events: Arc<Mutex<Vec<DispatchAlert>>>,
}

impl MemoryAlerts {
    pub fn events(&self) -> Vec<DispatchAlert> {
        self.events.lock().expect("alert mutex poisoned").clone()
    }
}

impl AlertPublisher for MemoryAlerts {
    fn publish(&self, alert: DispatchAlert) -> Result<(), AlertError> {
        self.events
            .lock()
            .map_err(|_| AlertError::Transport("alert mutex poisoned".to_string()))?
            .push(alert);
        Ok(())
    }
}

/// Weather provider that always returns the same forecast. The binary runs
/// with clear skies until a live adapter is plugged in.
#[derive(Clone)]
pub struct StaticWeather {
    forecast: Forecast,
}

impl StaticWeather {
    pub fn new(forecast: Forecast) -> Self {
        Self { forecast }
    }

    pub fn clear() -> Self {
        Self::new(Forecast::clear_sky())
    }
}

impl WeatherProvider for StaticWeather {
    fn forecast(&self, _city: &str, _date: NaiveDate) -> Result<Forecast, WeatherError> {
        Ok(self.forecast.clone())
    }
}
