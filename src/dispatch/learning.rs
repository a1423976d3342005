use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::outcomes::OutcomeRecord;
use super::scoring::RiskAssessment;
use super::weights::{
    RiskFactor, WeightAdjustment, WeightStore, WeightStoreError, MAX_WEIGHT, MIN_WEIGHT,
};

/// Tunable learning parameters. Defaults mirror the operating rule of thumb:
/// move slowly, only on real evidence, never past the global bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LearningConfig {
    /// Minimum outcomes in which a factor contributed before it may move.
    pub min_evidence: usize,
    /// Failure rate above which a factor's weight increases.
    pub failure_rate_floor: f64,
    /// Failure rate below which a factor's weight decreases.
    pub success_rate_ceiling: f64,
    /// Step applied per qualifying factor per cycle.
    pub step: i32,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            min_evidence: 10,
            failure_rate_floor: 0.40,
            success_rate_ceiling: 0.10,
            step: 5,
        }
    }
}

/// Per-factor evidence gathered in one cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorCycleStats {
    pub factor: RiskFactor,
    pub sample_size: usize,
    pub failures: usize,
    pub failure_rate: f64,
}

/// Result of one learning cycle; the adjustments also land in the weight
/// config's history for replayable audits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleReport {
    pub ran_at: DateTime<Utc>,
    pub outcomes_considered: usize,
    pub stats: Vec<FactorCycleStats>,
    pub adjustments: Vec<WeightAdjustment>,
}

/// Run one learning cycle over outcomes joined to the assessments that
/// predicted them.
///
/// For each tunable factor: among the outcomes where the factor contributed
/// positive points, the failure rate decides the direction. Each factor moves
/// at most once per cycle, clamped to the global bounds; a clamped request is
/// logged and the cycle continues. The store's write lock is held for the
/// whole batch so readers only ever see pre- or post-cycle weights.
pub fn run_cycle(
    evidence: &[(OutcomeRecord, RiskAssessment)],
    store: &WeightStore,
    config: &LearningConfig,
    at: DateTime<Utc>,
) -> Result<CycleReport, WeightStoreError> {
    let mut stats = Vec::new();
    let mut planned: Vec<(RiskFactor, i32, f64, usize)> = Vec::new();

    for factor in RiskFactor::TUNABLE {
        let samples: Vec<&(OutcomeRecord, RiskAssessment)> = evidence
            .iter()
            .filter(|(_, assessment)| assessment.contribution(factor) > 0)
            .collect();
        let sample_size = samples.len();
        let failures = samples
            .iter()
            .filter(|(outcome, _)| outcome.failed())
            .count();
        let failure_rate = if sample_size == 0 {
            0.0
        } else {
            failures as f64 / sample_size as f64
        };

        stats.push(FactorCycleStats {
            factor,
            sample_size,
            failures,
            failure_rate,
        });

        if sample_size < config.min_evidence {
            continue;
        }

        if failure_rate > config.failure_rate_floor {
            planned.push((factor, config.step, failure_rate, sample_size));
        } else if failure_rate < config.success_rate_ceiling {
            planned.push((factor, -config.step, failure_rate, sample_size));
        }
    }

    let adjustments = store.with_exclusive(|weights| {
        let mut applied = Vec::new();
        for (factor, delta, failure_rate, sample_size) in planned {
            let requested = weights.weight(factor) + delta;
            match weights.apply_adjustment(factor, delta, failure_rate, sample_size, at) {
                Some(adjustment) => {
                    if requested != adjustment.new_value {
                        warn!(
                            factor = factor.label(),
                            requested,
                            clamped = adjustment.new_value,
                            "weight adjustment clamped to [{MIN_WEIGHT},{MAX_WEIGHT}]"
                        );
                    }
                    applied.push(adjustment);
                }
                None => warn!(
                    factor = factor.label(),
                    requested,
                    "weight adjustment discarded, already at bound"
                ),
            }
        }
        weights.mark_cycle(at);
        applied
    })?;

    info!(
        outcomes = evidence.len(),
        adjustments = adjustments.len(),
        "learning cycle complete"
    );

    Ok(CycleReport {
        ran_at: at,
        outcomes_considered: evidence.len(),
        stats,
        adjustments,
    })
}
