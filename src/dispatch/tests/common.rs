use std::sync::{Arc, Mutex};

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use crate::dispatch::domain::{
    AreaType, PaymentType, RawShipmentSubmission, RoadAccessibility, Shipment, ShipmentId,
};
use crate::dispatch::memory::{MemoryAlerts, MemoryRepository, StaticWeather};
use crate::dispatch::reference::{
    AreaProfile, AreaProfiles, CongestionLevel, PriorityBands, ReferenceData, VehicleSpecs,
};
use crate::dispatch::scorers::{
    AreaFeasibility, AreaVerdict, PriorityTier, PriorityVerdict, ScorerVerdicts,
    VehicleFeasibility, VehicleSuggestion, VehicleVerdict, WeatherVerdict,
};
use crate::dispatch::service::DispatchService;
use crate::dispatch::weather::{Forecast, WeatherError, WeatherProvider, WeatherSeverity};
use crate::dispatch::weights::{WeightSnapshot, WeightStore};

pub(super) fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 7, 1).expect("valid date")
}

pub(super) fn at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 7, 1, 6, 30, 0).single().expect("valid timestamp")
}

pub(super) fn delivery_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 7, 8).expect("valid date")
}

/// Clean prepaid urban submission that should sail through every stage.
pub(super) fn submission() -> RawShipmentSubmission {
    RawShipmentSubmission {
        weight_kg: Some(2.5),
        volumetric_weight_kg: Some(3.0),
        payment_type: Some("Prepaid".to_string()),
        priority_flag: Some(false),
        declared_value: Some(1_200),
        area_type: Some("Urban".to_string()),
        road_accessibility: Some("Wide".to_string()),
        address_text: Some("14 MG Road, opposite nothing, near City Mall and Axis Bank".to_string()),
        destination_city: Some("Pune".to_string()),
        delivery_date: Some(delivery_date()),
    }
}

/// Directly constructed shipment for scorer/engine tests.
pub(super) fn shipment(suffix: &str) -> Shipment {
    Shipment {
        id: ShipmentId(format!("shp-{suffix}")),
        weight_kg: 2.5,
        volumetric_weight_kg: 3.0,
        payment_type: PaymentType::Prepaid,
        priority_flag: false,
        declared_value: 1_200,
        area_type: AreaType::Urban,
        road_accessibility: RoadAccessibility::Wide,
        address_text: "14 MG Road near City Mall".to_string(),
        address_confidence: 90,
        destination_city: "Pune".to_string(),
        delivery_date: delivery_date(),
    }
}

pub(super) fn reference() -> ReferenceData {
    let mut area_profiles = AreaProfiles::default();
    area_profiles.insert(
        "Pune",
        AreaType::Urban,
        AreaProfile {
            difficulty: 1,
            congestion: CongestionLevel::Low,
            heavy_vehicle_allowed: true,
        },
    );
    area_profiles.insert(
        "Hyderabad",
        AreaType::OldCity,
        AreaProfile {
            difficulty: 4,
            congestion: CongestionLevel::High,
            heavy_vehicle_allowed: false,
        },
    );
    area_profiles.insert(
        "Nagpur",
        AreaType::SemiUrban,
        AreaProfile {
            difficulty: 3,
            congestion: CongestionLevel::Medium,
            heavy_vehicle_allowed: true,
        },
    );

    ReferenceData {
        area_profiles,
        vehicle_specs: VehicleSpecs::default(),
        priority_bands: PriorityBands::default(),
    }
}

pub(super) fn clear_forecast() -> Forecast {
    Forecast::clear_sky()
}

pub(super) fn monsoon_forecast() -> Forecast {
    Forecast {
        rainfall_mm: 24.0,
        temperature_c: 27.0,
        flood_prone: true,
        severity_hint: None,
    }
}

/// Verdict set with nothing notable, for engine-only tests.
pub(super) fn clear_verdicts() -> ScorerVerdicts {
    ScorerVerdicts {
        area: AreaVerdict {
            status: AreaFeasibility::Allow,
            difficulty: 1,
            risk_delta: 5,
            reason: "area suitable for delivery".to_string(),
        },
        weather: WeatherVerdict {
            severity: WeatherSeverity::Low,
            eta_multiplier: 1.0,
            reason: "weather conditions are normal".to_string(),
        },
        vehicle: VehicleVerdict {
            status: VehicleFeasibility::Accept,
            planned: crate::dispatch::domain::VehicleClass::Bike,
            suggestion: VehicleSuggestion::Keep,
            reason: "vehicle is suitable for this delivery".to_string(),
        },
        priority: PriorityVerdict {
            tier: PriorityTier::Low,
            reason: "non-urgent, operationally flexible shipment".to_string(),
        },
    }
}

pub(super) fn default_snapshot() -> WeightSnapshot {
    WeightStore::default().snapshot().expect("fresh store readable")
}

pub(super) type TestService = DispatchService<MemoryRepository, MemoryAlerts, StaticWeather>;

pub(super) fn build_service() -> (Arc<TestService>, Arc<MemoryRepository>, Arc<MemoryAlerts>) {
    build_service_full(StaticWeather::clear(), reference())
}

pub(super) fn build_service_full<W: WeatherProvider + 'static>(
    weather: W,
    reference: ReferenceData,
) -> (
    Arc<DispatchService<MemoryRepository, MemoryAlerts, W>>,
    Arc<MemoryRepository>,
    Arc<MemoryAlerts>,
) {
    let repository = Arc::new(MemoryRepository::default());
    let alerts = Arc::new(MemoryAlerts::default());
    let service = Arc::new(DispatchService::new(
        repository.clone(),
        alerts.clone(),
        weather,
        reference,
    ));
    (service, repository, alerts)
}

/// Provider that fails after handing out one good forecast, for cache tests.
pub(super) struct FlakyWeather {
    forecast: Forecast,
    remaining: Mutex<u32>,
}

impl FlakyWeather {
    pub(super) fn new(forecast: Forecast, good_calls: u32) -> Self {
        Self {
            forecast,
            remaining: Mutex::new(good_calls),
        }
    }
}

impl WeatherProvider for FlakyWeather {
    fn forecast(&self, _city: &str, _date: NaiveDate) -> Result<Forecast, WeatherError> {
        let mut remaining = self.remaining.lock().expect("flaky weather mutex poisoned");
        if *remaining == 0 {
            return Err(WeatherError::Unavailable("provider timed out".to_string()));
        }
        *remaining -= 1;
        Ok(self.forecast.clone())
    }
}
