use serde::{Deserialize, Serialize};

use super::ScorerFailure;
use crate::dispatch::weather::{Forecast, WeatherSeverity};

const HIGH_RAINFALL_MM: f64 = 20.0;
const MEDIUM_RAINFALL_MM: f64 = 7.6;
const LIGHT_RAINFALL_MM: f64 = 2.5;
const HEAT_STRESS_C: f64 = 42.0;
const FLOOD_COMPOUND_RAINFALL_MM: f64 = 10.0;

const HIGH_MULTIPLIER: f64 = 1.6;
const MEDIUM_MULTIPLIER: f64 = 1.3;
const LIGHT_RAIN_MULTIPLIER: f64 = 1.1;
const FLOOD_PENALTY_FACTOR: f64 = 1.25;
const MIN_MULTIPLIER: f64 = 1.0;
const MAX_MULTIPLIER: f64 = 2.0;

/// Weather scorer verdict: severity tier plus the ETA buffer multiplier
/// applied downstream when a delayed shipment is re-promised to the customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherVerdict {
    pub severity: WeatherSeverity,
    pub eta_multiplier: f64,
    pub reason: String,
}

/// Score the normalized forecast.
///
/// Thresholds are monotonic: more rainfall or a stronger provider hint can
/// only raise the tier, and High severity always carries a multiplier of at
/// least 1.6.
pub(crate) fn evaluate(forecast: &Forecast) -> Result<WeatherVerdict, ScorerFailure> {
    let mut severity = if forecast.rainfall_mm > HIGH_RAINFALL_MM {
        WeatherSeverity::High
    } else if forecast.rainfall_mm > MEDIUM_RAINFALL_MM {
        WeatherSeverity::Medium
    } else {
        WeatherSeverity::Low
    };

    if forecast.temperature_c >= HEAT_STRESS_C {
        severity = severity.max(WeatherSeverity::Medium);
    }

    if let Some(hint) = forecast.severity_hint {
        severity = severity.max(hint);
    }

    let mut multiplier = match severity {
        WeatherSeverity::High => HIGH_MULTIPLIER,
        WeatherSeverity::Medium => MEDIUM_MULTIPLIER,
        WeatherSeverity::Low if forecast.rainfall_mm > LIGHT_RAINFALL_MM => LIGHT_RAIN_MULTIPLIER,
        WeatherSeverity::Low => MIN_MULTIPLIER,
    };

    if forecast.flood_prone && forecast.rainfall_mm > FLOOD_COMPOUND_RAINFALL_MM {
        multiplier *= FLOOD_PENALTY_FACTOR;
    }

    let multiplier = multiplier.clamp(MIN_MULTIPLIER, MAX_MULTIPLIER);

    let reason = match severity {
        WeatherSeverity::High => "severe weather conditions affecting delivery".to_string(),
        WeatherSeverity::Medium => "adverse weather may slow down delivery".to_string(),
        WeatherSeverity::Low if multiplier > MIN_MULTIPLIER => {
            "light rain, minor delivery buffer applied".to_string()
        }
        WeatherSeverity::Low => "weather conditions are normal".to_string(),
    };

    Ok(WeatherVerdict {
        severity,
        eta_multiplier: multiplier,
        reason,
    })
}
