use std::collections::BTreeMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Hard bounds every weight honors, regardless of what the learning loop asks
/// for.
pub const MIN_WEIGHT: i32 = 5;
pub const MAX_WEIGHT: i32 = 30;
/// Largest move any single factor may make in one learning cycle.
pub const MAX_STEP_PER_CYCLE: i32 = 5;
/// Adjustment history entries retained on the config.
pub const HISTORY_LIMIT: usize = 30;

/// Risk factors carrying a tunable weight.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum RiskFactor {
    CodPayment,
    AddressConfidence,
    WeatherSeverity,
    AreaType,
    RoadAccess,
    WeightClass,
    /// Fixed dampening applied for priority shipments; not weight-tuned but
    /// present so contribution maps can attribute every point.
    PriorityDampening,
}

impl RiskFactor {
    /// Factors the learning loop is allowed to tune.
    pub const TUNABLE: [RiskFactor; 6] = [
        RiskFactor::CodPayment,
        RiskFactor::AddressConfidence,
        RiskFactor::WeatherSeverity,
        RiskFactor::AreaType,
        RiskFactor::RoadAccess,
        RiskFactor::WeightClass,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            RiskFactor::CodPayment => "cod_risk",
            RiskFactor::AddressConfidence => "address_risk",
            RiskFactor::WeatherSeverity => "weather_risk",
            RiskFactor::AreaType => "area_risk",
            RiskFactor::RoadAccess => "road_risk",
            RiskFactor::WeightClass => "weight_risk",
            RiskFactor::PriorityDampening => "priority_dampening",
        }
    }
}

/// One audited weight change made by the learning loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightAdjustment {
    pub factor: RiskFactor,
    pub old_value: i32,
    pub new_value: i32,
    /// Observed failure rate that triggered the change.
    pub failure_rate: f64,
    pub sample_size: usize,
    pub recorded_at: DateTime<Utc>,
}

/// Current per-factor weights plus their audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightConfig {
    weights: BTreeMap<RiskFactor, i32>,
    pub last_updated: Option<DateTime<Utc>>,
    pub update_count: u32,
    pub history: Vec<WeightAdjustment>,
}

impl Default for WeightConfig {
    fn default() -> Self {
        let mut weights = BTreeMap::new();
        weights.insert(RiskFactor::CodPayment, 15);
        weights.insert(RiskFactor::AddressConfidence, 15);
        weights.insert(RiskFactor::WeatherSeverity, 20);
        weights.insert(RiskFactor::AreaType, 15);
        weights.insert(RiskFactor::RoadAccess, 15);
        weights.insert(RiskFactor::WeightClass, 10);
        Self {
            weights,
            last_updated: None,
            update_count: 0,
            history: Vec::new(),
        }
    }
}

impl WeightConfig {
    pub fn weight(&self, factor: RiskFactor) -> i32 {
        self.weights.get(&factor).copied().unwrap_or(MIN_WEIGHT)
    }

    /// Builder-style weight override, clamped to the global bounds.
    pub fn with_weight(mut self, factor: RiskFactor, value: i32) -> Self {
        self.weights
            .insert(factor, value.clamp(MIN_WEIGHT, MAX_WEIGHT));
        self
    }

    pub fn weights(&self) -> &BTreeMap<RiskFactor, i32> {
        &self.weights
    }

    /// Apply one audited adjustment, clamping to the global bounds. Returns
    /// the entry actually recorded, or `None` when the clamp leaves the value
    /// unchanged.
    pub(crate) fn apply_adjustment(
        &mut self,
        factor: RiskFactor,
        delta: i32,
        failure_rate: f64,
        sample_size: usize,
        at: DateTime<Utc>,
    ) -> Option<WeightAdjustment> {
        let old_value = self.weight(factor);
        let bounded_delta = delta.clamp(-MAX_STEP_PER_CYCLE, MAX_STEP_PER_CYCLE);
        let new_value = (old_value + bounded_delta).clamp(MIN_WEIGHT, MAX_WEIGHT);
        if new_value == old_value {
            return None;
        }

        self.weights.insert(factor, new_value);
        let adjustment = WeightAdjustment {
            factor,
            old_value,
            new_value,
            failure_rate,
            sample_size,
            recorded_at: at,
        };
        self.history.push(adjustment.clone());
        if self.history.len() > HISTORY_LIMIT {
            let excess = self.history.len() - HISTORY_LIMIT;
            self.history.drain(..excess);
        }
        Some(adjustment)
    }

    pub(crate) fn mark_cycle(&mut self, at: DateTime<Utc>) {
        self.last_updated = Some(at);
        self.update_count += 1;
    }
}

/// Atomic, versioned view of the weights handed to each scoring call. A
/// snapshot never reflects a half-applied learning cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightSnapshot {
    pub version: u64,
    config: WeightConfig,
}

impl WeightSnapshot {
    pub fn weight(&self, factor: RiskFactor) -> i32 {
        self.config.weight(factor)
    }

    pub fn config(&self) -> &WeightConfig {
        &self.config
    }
}

/// The store is unreadable; scoring must abort rather than proceed with
/// undefined weights.
#[derive(Debug, thiserror::Error)]
#[error("weight store unreadable: {0}")]
pub struct WeightStoreError(pub String);

/// Owner of the mutable weight state. Scoring reads versioned snapshots;
/// only the learning loop writes, holding the lock for the whole cycle.
#[derive(Debug)]
pub struct WeightStore {
    inner: RwLock<(u64, WeightConfig)>,
}

impl WeightStore {
    pub fn new(config: WeightConfig) -> Self {
        Self {
            inner: RwLock::new((1, config)),
        }
    }

    pub fn snapshot(&self) -> Result<WeightSnapshot, WeightStoreError> {
        let guard = self
            .inner
            .read()
            .map_err(|_| WeightStoreError("lock poisoned".to_string()))?;
        Ok(WeightSnapshot {
            version: guard.0,
            config: guard.1.clone(),
        })
    }

    /// Run one exclusive mutation of the config, bumping the version so
    /// subsequent snapshots are distinguishable.
    pub(crate) fn with_exclusive<T>(
        &self,
        mutate: impl FnOnce(&mut WeightConfig) -> T,
    ) -> Result<T, WeightStoreError> {
        let mut guard = self
            .inner
            .write()
            .map_err(|_| WeightStoreError("lock poisoned".to_string()))?;
        let result = mutate(&mut guard.1);
        guard.0 += 1;
        Ok(result)
    }
}

impl Default for WeightStore {
    fn default() -> Self {
        Self::new(WeightConfig::default())
    }
}
