use std::collections::HashMap;
use std::sync::Mutex;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Weather severity tier shared by forecasts and the weather scorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WeatherSeverity {
    Low,
    Medium,
    High,
}

impl WeatherSeverity {
    pub const fn label(self) -> &'static str {
        match self {
            WeatherSeverity::Low => "low",
            WeatherSeverity::Medium => "medium",
            WeatherSeverity::High => "high",
        }
    }
}

/// Normalized forecast the core consumes; the provider's wire format is an
/// external concern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub rainfall_mm: f64,
    pub temperature_c: f64,
    pub flood_prone: bool,
    #[serde(default)]
    pub severity_hint: Option<WeatherSeverity>,
}

impl Forecast {
    /// Clear-sky default applied when the provider is unreachable and no
    /// cached forecast exists.
    pub fn clear_sky() -> Self {
        Self {
            rainfall_mm: 0.0,
            temperature_c: 25.0,
            flood_prone: false,
            severity_hint: None,
        }
    }
}

/// Forecast retrieval failure. Providers own their timeout/retry policy; the
/// core only distinguishes "unavailable" from "bad payload".
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("weather provider unavailable: {0}")]
    Unavailable(String),
    #[error("weather provider returned an unusable payload: {0}")]
    Malformed(String),
}

/// Best-effort forecast source. Implementations are expected to fail
/// sometimes; callers degrade to cached or clear-sky data.
pub trait WeatherProvider: Send + Sync {
    fn forecast(&self, city: &str, date: NaiveDate) -> Result<Forecast, WeatherError>;
}

/// Caching wrapper that keeps the pipeline moving when the provider fails:
/// last good forecast for the (city, date) first, clear-sky default second.
pub struct DegradingForecasts<W> {
    provider: W,
    cache: Mutex<HashMap<(String, NaiveDate), Forecast>>,
}

impl<W: WeatherProvider> DegradingForecasts<W> {
    pub fn new(provider: W) -> Self {
        Self {
            provider,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Fetch a forecast, never failing the shipment cycle.
    pub fn forecast_or_default(&self, city: &str, date: NaiveDate) -> Forecast {
        let key = (city.trim().to_ascii_lowercase(), date);
        match self.provider.forecast(city, date) {
            Ok(forecast) => {
                if let Ok(mut cache) = self.cache.lock() {
                    cache.insert(key, forecast.clone());
                }
                forecast
            }
            Err(error) => {
                warn!(%city, %date, %error, "weather provider failed, degrading");
                self.cache
                    .lock()
                    .ok()
                    .and_then(|cache| cache.get(&key).cloned())
                    .unwrap_or_else(Forecast::clear_sky)
            }
        }
    }
}
