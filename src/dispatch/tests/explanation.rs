use super::common::*;
use crate::dispatch::domain::{AreaType, PaymentType, RoadAccessibility};
use crate::dispatch::explanation::explain;
use crate::dispatch::scoring::{RiskBucket, RiskEngine, ScoringConfig};
use crate::dispatch::weights::RiskFactor;

fn engine() -> RiskEngine {
    RiskEngine::new(ScoringConfig::default())
}

#[test]
fn reasons_rank_by_contribution_descending() {
    let mut shipment = shipment("exp-rank");
    shipment.payment_type = PaymentType::Cod;
    shipment.weight_kg = 12.0;
    shipment.address_confidence = 70;

    let assessment = engine().assess(&shipment, &clear_verdicts(), &default_snapshot(), at());
    let explanation = explain(&assessment, engine().config());

    // cod 15 > weight 10 > address 7
    let factors: Vec<RiskFactor> = explanation.reasons.iter().map(|r| r.factor).collect();
    assert_eq!(
        factors,
        vec![
            RiskFactor::CodPayment,
            RiskFactor::WeightClass,
            RiskFactor::AddressConfidence
        ]
    );
}

#[test]
fn ties_break_on_the_fixed_factor_order() {
    let mut shipment = shipment("exp-tie");
    shipment.payment_type = PaymentType::Cod;
    shipment.area_type = AreaType::OldCity;
    shipment.road_accessibility = RoadAccessibility::Narrow;
    shipment.address_confidence = 55;

    let assessment = engine().assess(&shipment, &clear_verdicts(), &default_snapshot(), at());
    let explanation = explain(&assessment, engine().config());

    // All four contribute 15; the fixed order decides.
    let factors: Vec<RiskFactor> = explanation.reasons.iter().map(|r| r.factor).collect();
    assert_eq!(
        factors,
        vec![
            RiskFactor::AddressConfidence,
            RiskFactor::AreaType,
            RiskFactor::RoadAccess,
            RiskFactor::CodPayment
        ]
    );
}

#[test]
fn explanations_are_reproducible() {
    let mut shipment = shipment("exp-repro");
    shipment.payment_type = PaymentType::Cod;
    shipment.address_confidence = 55;

    let assessment = engine().assess(&shipment, &clear_verdicts(), &default_snapshot(), at());
    assert_eq!(
        explain(&assessment, engine().config()),
        explain(&assessment, engine().config())
    );
}

#[test]
fn low_bucket_needs_no_hints() {
    let assessment = engine().assess(&shipment("exp-low"), &clear_verdicts(), &default_snapshot(), at());
    let explanation = explain(&assessment, engine().config());
    assert_eq!(explanation.bucket, RiskBucket::Low);
    assert!(explanation.hints.is_empty());
}

#[test]
fn hints_name_the_factors_that_cross_the_boundary() {
    let mut shipment = shipment("exp-hints");
    shipment.payment_type = PaymentType::Cod;
    shipment.area_type = AreaType::SemiUrban;
    shipment.road_accessibility = RoadAccessibility::Medium;
    shipment.address_confidence = 55;

    let assessment = engine().assess(&shipment, &clear_verdicts(), &default_snapshot(), at());
    assert_eq!(assessment.score, 44);
    let explanation = explain(&assessment, engine().config());

    // Five points must come off to reach Low; cod (15) and address (15)
    // qualify alone, the 7-point contributions do too.
    assert!(!explanation.hints.is_empty());
    for hint in &explanation.hints {
        assert_eq!(hint.points_needed, 5);
        assert_eq!(hint.target_bucket, RiskBucket::Low);
        assert!(assessment.contribution(hint.factor) >= 5);
    }
    assert!(explanation
        .hints
        .iter()
        .any(|hint| hint.factor == RiskFactor::CodPayment));
}

#[test]
fn high_bucket_hints_target_medium() {
    let mut shipment = shipment("exp-high");
    shipment.payment_type = PaymentType::Cod;
    shipment.weight_kg = 12.0;
    shipment.area_type = AreaType::OldCity;
    shipment.road_accessibility = RoadAccessibility::Narrow;
    shipment.address_confidence = 55;

    let assessment = engine().assess(&shipment, &clear_verdicts(), &default_snapshot(), at());
    assert_eq!(assessment.score, 70);
    let explanation = explain(&assessment, engine().config());

    // Eleven points off reaches 59, Medium; only the 15-point factors qualify.
    for hint in &explanation.hints {
        assert_eq!(hint.points_needed, 11);
        assert_eq!(hint.target_bucket, RiskBucket::Medium);
    }
    assert!(!explanation
        .hints
        .iter()
        .any(|hint| hint.factor == RiskFactor::WeightClass));
}
