use super::common::*;
use crate::dispatch::domain::{
    AuthorityLevel, DeliveryResult, DispatchDecision, DispatchStatus, ShipmentId,
};
use crate::dispatch::memory::StaticWeather;
use crate::dispatch::outcomes::prediction_mismatch;
use crate::dispatch::overrides::OverrideRequest;
use crate::dispatch::reference::VehicleSpecs;
use crate::dispatch::repository::{DispatchRepository, RepositoryError};
use crate::dispatch::scoring::RiskBucket;
use crate::dispatch::service::DispatchServiceError;
use crate::dispatch::weights::RiskFactor;

fn clean_urban_submission() -> crate::dispatch::domain::RawShipmentSubmission {
    let mut raw = submission();
    // Two landmarks, no vague wording: confidence 80, no address contribution.
    raw.address_text = Some("14 MG Road, City Mall junction, Axis Bank corner".to_string());
    raw
}

fn delay_submission() -> crate::dispatch::domain::RawShipmentSubmission {
    let mut raw = submission();
    raw.payment_type = Some("COD".to_string());
    raw.area_type = Some("SemiUrban".to_string());
    raw.road_accessibility = Some("Medium".to_string());
    raw.address_text = Some("plot 9, near the water tank".to_string());
    raw.destination_city = Some("Nagpur".to_string());
    raw
}

fn reschedule_submission() -> crate::dispatch::domain::RawShipmentSubmission {
    let mut raw = submission();
    raw.payment_type = Some("COD".to_string());
    raw.weight_kg = Some(12.0);
    raw.volumetric_weight_kg = Some(12.0);
    raw.area_type = Some("OldCity".to_string());
    raw.road_accessibility = Some("Narrow".to_string());
    raw.address_text = Some("shop 3, Charminar bazaar gali, temple side".to_string());
    raw.destination_city = Some("Hyderabad".to_string());
    raw
}

#[test]
fn clean_shipment_dispatches_with_score_zero() {
    let (service, _, alerts) = build_service();

    let record = service
        .submit(clean_urban_submission(), as_of())
        .expect("submission accepted");
    assert_eq!(record.shipment.address_confidence, 80);

    let view = service
        .evaluate(&record.shipment.id, as_of(), at())
        .expect("evaluation runs");

    let assessment = view.assessment.expect("assessment present");
    assert_eq!(assessment.score, 0);
    assert_eq!(assessment.bucket, RiskBucket::Low);
    assert_eq!(view.decision.decision, DispatchDecision::Dispatch);
    assert!(alerts.events().is_empty(), "dispatch emits no hold alert");
}

#[test]
fn cod_old_city_narrow_reschedules_at_seventy() {
    let (service, repository, alerts) = build_service();

    let record = service
        .submit(reschedule_submission(), as_of())
        .expect("submission accepted");
    // Two landmarks minus old-city and narrow penalties.
    assert_eq!(record.shipment.address_confidence, 45);

    let view = service
        .evaluate(&record.shipment.id, as_of(), at())
        .expect("evaluation runs");

    let assessment = view.assessment.expect("assessment present");
    assert_eq!(assessment.score, 70);
    assert_eq!(assessment.bucket, RiskBucket::High);
    assert_eq!(view.decision.decision, DispatchDecision::Reschedule);
    assert!(view.forced_by.is_some(), "hard block forces the decision");

    let stored = repository
        .fetch_shipment(&record.shipment.id)
        .expect("fetch succeeds")
        .expect("record present");
    assert_eq!(stored.status, DispatchStatus::Reschedule);
    assert_eq!(stored.current_risk_score, Some(70));

    let events = alerts.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].decision, DispatchDecision::Reschedule);
}

#[test]
fn severe_weather_buffers_eta_but_still_dispatches() {
    let (service, _, _) = build_service_full(
        StaticWeather::new(monsoon_forecast()),
        reference(),
    );

    let record = service
        .submit(clean_urban_submission(), as_of())
        .expect("submission accepted");
    let view = service
        .evaluate(&record.shipment.id, as_of(), at())
        .expect("evaluation runs");

    let assessment = view.assessment.expect("assessment present");
    assert_eq!(assessment.contribution(RiskFactor::WeatherSeverity), 20);
    assert_eq!(assessment.score, 20);
    assert_eq!(view.decision.decision, DispatchDecision::Dispatch);
    assert!((1.6..=2.0).contains(&view.eta_multiplier));
}

#[test]
fn manager_override_locks_and_blocks_further_automatic_cycles() {
    let (service, repository, _) = build_service();

    let record = service
        .submit(delay_submission(), as_of())
        .expect("submission accepted");
    let view = service
        .evaluate(&record.shipment.id, as_of(), at())
        .expect("evaluation runs");
    assert_eq!(view.decision.decision, DispatchDecision::Delay);

    let override_record = service
        .override_decision(
            OverrideRequest {
                shipment_id: record.shipment.id.clone(),
                proposed: DispatchDecision::Dispatch,
                actor: "meera.rao".to_string(),
                authority: AuthorityLevel::Manager,
                reason: "VIP customer, confirmed address".to_string(),
            },
            at(),
        )
        .expect("manager override succeeds");

    assert_eq!(override_record.prior_decision, DispatchDecision::Delay);
    assert_eq!(override_record.new_decision, DispatchDecision::Dispatch);

    let decision = repository
        .fetch_decision(&record.shipment.id)
        .expect("fetch succeeds")
        .expect("decision present");
    assert!(decision.locked);

    let stored = repository
        .fetch_shipment(&record.shipment.id)
        .expect("fetch succeeds")
        .expect("record present");
    assert_eq!(stored.status, DispatchStatus::Overridden);

    match service.evaluate(&record.shipment.id, as_of(), at()) {
        Err(DispatchServiceError::Locked(error)) => {
            assert_eq!(error.shipment_id, record.shipment.id);
        }
        other => panic!("expected locked error, got {other:?}"),
    }
}

#[test]
fn later_overrides_supersede_but_the_log_keeps_both() {
    let (service, repository, _) = build_service();

    let record = service
        .submit(delay_submission(), as_of())
        .expect("submission accepted");
    service
        .evaluate(&record.shipment.id, as_of(), at())
        .expect("evaluation runs");

    service
        .override_decision(
            OverrideRequest {
                shipment_id: record.shipment.id.clone(),
                proposed: DispatchDecision::Dispatch,
                actor: "meera.rao".to_string(),
                authority: AuthorityLevel::Manager,
                reason: "VIP customer, confirmed address".to_string(),
            },
            at(),
        )
        .expect("first override succeeds");

    service
        .override_decision(
            OverrideRequest {
                shipment_id: record.shipment.id.clone(),
                proposed: DispatchDecision::Reschedule,
                actor: "vikram.shah".to_string(),
                authority: AuthorityLevel::Manager,
                reason: "road washed out near the hub".to_string(),
            },
            at(),
        )
        .expect("second override supersedes");

    let log = repository
        .overrides_for(&record.shipment.id)
        .expect("override log readable");
    assert_eq!(log.len(), 2);

    let decision = repository
        .fetch_decision(&record.shipment.id)
        .expect("fetch succeeds")
        .expect("decision present");
    assert_eq!(decision.decision, DispatchDecision::Reschedule);
    assert!(decision.locked);
}

#[test]
fn supervisor_cannot_touch_high_risk_decisions() {
    let (service, _, _) = build_service();

    let record = service
        .submit(reschedule_submission(), as_of())
        .expect("submission accepted");
    service
        .evaluate(&record.shipment.id, as_of(), at())
        .expect("evaluation runs");

    match service.override_decision(
        OverrideRequest {
            shipment_id: record.shipment.id.clone(),
            proposed: DispatchDecision::Dispatch,
            actor: "sunil.k".to_string(),
            authority: AuthorityLevel::Supervisor,
            reason: "route looks clear to me today".to_string(),
        },
        at(),
    ) {
        Err(DispatchServiceError::Override(error)) => {
            assert!(error.to_string().contains("supervisor"));
        }
        other => panic!("expected authority error, got {other:?}"),
    }
}

#[test]
fn resubmission_clears_the_lock_for_one_fresh_cycle() {
    let (service, repository, _) = build_service();

    let record = service
        .submit(delay_submission(), as_of())
        .expect("submission accepted");
    service
        .evaluate(&record.shipment.id, as_of(), at())
        .expect("evaluation runs");
    service
        .override_decision(
            OverrideRequest {
                shipment_id: record.shipment.id.clone(),
                proposed: DispatchDecision::Reschedule,
                actor: "meera.rao".to_string(),
                authority: AuthorityLevel::Manager,
                reason: "customer asked to confirm address first".to_string(),
            },
            at(),
        )
        .expect("override succeeds");

    // Customer clarified the address; the replacement passes validation.
    let clarified = service
        .resubmit(&record.shipment.id, clean_urban_submission(), as_of())
        .expect("resubmission accepted");
    assert_eq!(clarified.status, DispatchStatus::Pending);
    assert_eq!(clarified.shipment.id, record.shipment.id);

    let view = service
        .evaluate(&record.shipment.id, as_of(), at())
        .expect("fresh cycle allowed after resubmission");
    assert_eq!(view.decision.decision, DispatchDecision::Dispatch);

    let decision = repository
        .fetch_decision(&record.shipment.id)
        .expect("fetch succeeds")
        .expect("decision present");
    assert!(!decision.locked);
}

#[test]
fn scorer_failure_fails_safe_to_reschedule_after_one_retry() {
    let mut reference = reference();
    reference.vehicle_specs = VehicleSpecs::from_reader(
        "vehicle_class,max_weight_kg,max_volumetric_kg\nbike,5,8\n".as_bytes(),
    )
    .expect("partial specs load");
    let (service, repository, alerts) = build_service_full(StaticWeather::clear(), reference);

    let mut raw = submission();
    raw.weight_kg = Some(12.0);
    let record = service.submit(raw, as_of()).expect("submission accepted");

    let view = service
        .evaluate(&record.shipment.id, as_of(), at())
        .expect("fail-safe cycle completes");

    assert_eq!(view.decision.decision, DispatchDecision::Reschedule);
    assert!(view.assessment.is_none());
    assert_eq!(view.forced_by.as_deref(), Some("scorer failure"));
    assert_eq!(view.decision.risk_bucket, RiskBucket::High);

    let stored = repository
        .fetch_shipment(&record.shipment.id)
        .expect("fetch succeeds")
        .expect("record present");
    assert_eq!(stored.status, DispatchStatus::Reschedule);
    assert_eq!(alerts.events().len(), 1);
}

#[test]
fn weather_outages_degrade_to_the_cached_forecast() {
    let (service, _, _) = build_service_full(
        FlakyWeather::new(monsoon_forecast(), 1),
        reference(),
    );

    let record = service
        .submit(clean_urban_submission(), as_of())
        .expect("submission accepted");

    let first = service
        .evaluate(&record.shipment.id, as_of(), at())
        .expect("first evaluation uses the live forecast");
    let first_assessment = first.assessment.expect("assessment present");
    assert_eq!(first_assessment.contribution(RiskFactor::WeatherSeverity), 20);

    // Provider is now down; the cached monsoon forecast keeps applying.
    let second = service
        .evaluate(&record.shipment.id, as_of(), at())
        .expect("second evaluation degrades to cache");
    let second_assessment = second.assessment.expect("assessment present");
    assert_eq!(second_assessment.contribution(RiskFactor::WeatherSeverity), 20);
}

#[test]
fn outcome_recording_joins_decision_and_override_log() {
    let (service, _, _) = build_service();

    let record = service
        .submit(delay_submission(), as_of())
        .expect("submission accepted");
    service
        .evaluate(&record.shipment.id, as_of(), at())
        .expect("evaluation runs");

    let outcome = service
        .record_outcome(&record.shipment.id, DeliveryResult::Delivered, at())
        .expect("outcome recorded");

    assert_eq!(outcome.predicted_decision, DispatchDecision::Delay);
    assert_eq!(outcome.predicted_bucket, RiskBucket::Medium);
    assert!(!outcome.overridden);
    assert!(!outcome.mismatch);

    match service.record_outcome(&record.shipment.id, DeliveryResult::Failed, at()) {
        Err(DispatchServiceError::Repository(RepositoryError::Conflict)) => {}
        other => panic!("expected one outcome per shipment, got {other:?}"),
    }
}

#[test]
fn outcomes_for_unknown_shipments_are_rejected() {
    let (service, _, _) = build_service();
    match service.record_outcome(&ShipmentId("shp-ghost".to_string()), DeliveryResult::Failed, at())
    {
        Err(DispatchServiceError::Repository(RepositoryError::NotFound)) => {}
        other => panic!("expected not found, got {other:?}"),
    }
}

#[test]
fn repeated_cod_failures_raise_the_cod_weight_through_the_service() {
    let (service, _, _) = build_service();

    for _ in 0..12 {
        let record = service
            .submit(delay_submission(), as_of())
            .expect("submission accepted");
        service
            .evaluate(&record.shipment.id, as_of(), at())
            .expect("evaluation runs");
        service
            .record_outcome(&record.shipment.id, DeliveryResult::Failed, at())
            .expect("outcome recorded");
    }

    let report = service.run_learning_cycle(at()).expect("cycle runs");
    assert!(!report.adjustments.is_empty());

    let snapshot = service.weights_view().expect("weights readable");
    assert_eq!(snapshot.weight(RiskFactor::CodPayment), 20);
    assert!(!snapshot.config().history.is_empty());

    // Nothing new since the cycle; a second run adjusts nothing.
    let quiet = service.run_learning_cycle(at()).expect("cycle runs");
    assert!(quiet.adjustments.is_empty());
    assert_eq!(quiet.outcomes_considered, 0);
}

#[test]
fn status_view_reflects_the_latest_decision() {
    let (service, _, _) = build_service();

    let record = service
        .submit(delay_submission(), as_of())
        .expect("submission accepted");
    let pending = service.get(&record.shipment.id).expect("view available");
    assert_eq!(pending.status, "pending");
    assert!(pending.decision.is_none());
    assert!(!pending.locked);

    service
        .evaluate(&record.shipment.id, as_of(), at())
        .expect("evaluation runs");
    let decided = service.get(&record.shipment.id).expect("view available");
    assert_eq!(decided.status, "delay");
    assert_eq!(decided.decision, Some("delay"));
    assert_eq!(decided.risk_score, Some(44));
}

mod mismatch {
    use super::*;

    #[test]
    fn dispatch_that_fails_is_a_mismatch() {
        assert!(prediction_mismatch(
            DispatchDecision::Dispatch,
            DeliveryResult::Failed
        ));
        assert!(prediction_mismatch(
            DispatchDecision::Dispatch,
            DeliveryResult::Returned
        ));
        assert!(!prediction_mismatch(
            DispatchDecision::Dispatch,
            DeliveryResult::Delivered
        ));
    }

    #[test]
    fn reschedule_that_delivers_cleanly_is_a_mismatch() {
        assert!(prediction_mismatch(
            DispatchDecision::Reschedule,
            DeliveryResult::Delivered
        ));
        assert!(!prediction_mismatch(
            DispatchDecision::Reschedule,
            DeliveryResult::Failed
        ));
    }

    #[test]
    fn buffered_delays_are_never_mismatches() {
        for result in [
            DeliveryResult::Delivered,
            DeliveryResult::Failed,
            DeliveryResult::Returned,
        ] {
            assert!(!prediction_mismatch(DispatchDecision::Delay, result));
        }
    }
}

#[test]
fn racing_decision_writes_serialize_through_the_version_check() {
    let (service, repository, _) = build_service();

    let record = service
        .submit(delay_submission(), as_of())
        .expect("submission accepted");
    service
        .evaluate(&record.shipment.id, as_of(), at())
        .expect("evaluation runs");

    let decision = repository
        .fetch_decision(&record.shipment.id)
        .expect("fetch succeeds")
        .expect("decision present");

    // A writer holding a stale version loses.
    let mut stale = decision.clone();
    stale.version += 1;
    match repository.update_decision(stale, decision.version.wrapping_sub(1)) {
        Err(RepositoryError::VersionConflict { .. }) => {}
        other => panic!("expected version conflict, got {other:?}"),
    }
}

#[test]
fn submissions_generate_unique_sequential_ids() {
    let (service, _, _) = build_service();
    let first = service
        .submit(clean_urban_submission(), as_of())
        .expect("first accepted");
    let second = service
        .submit(clean_urban_submission(), as_of())
        .expect("second accepted");
    assert_ne!(first.shipment.id, second.shipment.id);
    assert!(first.shipment.id.0.starts_with("shp-"));
}
