// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Body-fat estimation across measurement sets

use nutrition_engine::intelligence::body_fat::{
    estimate_body_fat_percentage, get_body_fat_percentage, BodyFatSource, BodyMeasurements,
};
use nutrition_engine::intelligence::{BodyFatMethod, Confidence};
use nutrition_engine::models::{ActivityLevel, Gender, PersonalMetrics, TrainingLevel};
use serde_json::json;

fn male_athlete() -> PersonalMetrics {
    PersonalMetrics {
        height: 180.0,
        weight: 80.0,
        age: 30,
        gender: Gender::Male,
        activity_level: ActivityLevel::VeryActive,
        fitness_goals: vec![],
    }
}

#[test]
fn test_measurements_from_json_with_activity_adjustment() {
    let measurements: BodyMeasurements = serde_json::from_value(json!({
        "circumference": { "neck_cm": 38.0, "waist_cm": 85.0 },
        "skinfolds": { "chest_mm": 10.0, "abdomen_mm": 20.0, "thigh_mm": 15.0 }
    }))
    .unwrap();

    let analysis =
        estimate_body_fat_percentage(&male_athlete(), &measurements, Some(TrainingLevel::Advanced))
            .unwrap();

    // Very active (-2) plus advanced training (-1) on every estimate
    assert_eq!(analysis.recommended.method, BodyFatMethod::Navy);
    assert_eq!(analysis.recommended.percentage, 13.1);
    assert_eq!(analysis.recommended.confidence, Confidence::High);
    assert_eq!(analysis.range.min, 10.6);
    assert_eq!(analysis.range.max, 17.3);

    let methods: Vec<BodyFatMethod> = analysis.alternatives.iter().map(|e| e.method).collect();
    assert_eq!(
        methods,
        vec![
            BodyFatMethod::JacksonPollock3,
            BodyFatMethod::Deurenberg,
            BodyFatMethod::BmiBased
        ]
    );
}

#[test]
fn test_invalid_tape_measurement_is_skipped() {
    let measurements: BodyMeasurements = serde_json::from_value(json!({
        "circumference": { "neck_cm": 40.0, "waist_cm": 35.0 },
        "skinfolds": { "chest_mm": 10.0, "abdomen_mm": 20.0, "thigh_mm": 15.0 }
    }))
    .unwrap();

    let metrics = PersonalMetrics {
        activity_level: ActivityLevel::Moderate,
        ..male_athlete()
    };
    let analysis = estimate_body_fat_percentage(&metrics, &measurements, None).unwrap();

    assert_eq!(analysis.recommended.method, BodyFatMethod::JacksonPollock3);
    assert_eq!(analysis.recommended.percentage, 13.6);
    assert_eq!(analysis.alternatives.len(), 2);
}

#[test]
fn test_female_without_hip_falls_back_to_deurenberg() {
    let metrics = PersonalMetrics {
        height: 165.0,
        weight: 60.0,
        age: 30,
        gender: Gender::Female,
        activity_level: ActivityLevel::Moderate,
        fitness_goals: vec![],
    };
    let measurements: BodyMeasurements = serde_json::from_value(json!({
        "circumference": { "neck_cm": 33.0, "waist_cm": 75.0 }
    }))
    .unwrap();

    let reading = get_body_fat_percentage(None, &metrics, &measurements, None).unwrap();

    assert_eq!(reading.source, BodyFatSource::Estimated);
    assert_eq!(reading.percentage, 27.9);
    let estimate = reading.estimate.unwrap();
    assert_eq!(estimate.method, BodyFatMethod::Deurenberg);
    assert!(estimate.can_override);
    assert!(!estimate.disclaimer.is_empty());
}

#[test]
fn test_estimate_serialization() {
    let measurements: BodyMeasurements = serde_json::from_value(json!({
        "skinfolds": { "chest_mm": 10.0, "abdomen_mm": 20.0, "thigh_mm": 15.0 }
    }))
    .unwrap();
    let metrics = PersonalMetrics {
        activity_level: ActivityLevel::Moderate,
        ..male_athlete()
    };

    let analysis = estimate_body_fat_percentage(&metrics, &measurements, None).unwrap();
    let value = serde_json::to_value(&analysis).unwrap();

    assert_eq!(value["recommended"]["method"], "jackson_pollock_3");
    assert_eq!(value["recommended"]["confidence"], "high");
    assert_eq!(value["alternatives"][0]["method"], "deurenberg");
}
