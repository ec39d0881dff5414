// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Exercise ranking tests

use nutrition_engine::intelligence::recommendation_engine::{
    default_catalog, ExerciseRecommender, ScoreWeights,
};
use nutrition_engine::intelligence::{
    Exercise, ExerciseRecommendationEngine, RecommendationCriteria,
};
use nutrition_engine::models::TrainingLevel;
use serde_json::json;

fn small_catalog() -> Vec<Exercise> {
    serde_json::from_value(json!([
        {
            "id": "push_up",
            "name": "Push-up",
            "category": "strength",
            "target_muscles": ["chest", "triceps"],
            "equipment": ["none"],
            "difficulty": "beginner"
        },
        {
            "id": "bench_press",
            "name": "Bench press",
            "category": "strength",
            "target_muscles": ["Chest", "triceps", "shoulders"],
            "equipment": ["barbell", "bench"],
            "difficulty": "intermediate"
        },
        {
            "id": "running",
            "name": "Running",
            "category": "cardio",
            "target_muscles": ["legs"],
            "difficulty": "beginner",
            "calories_per_minute": 10.0
        }
    ]))
    .unwrap()
}

fn criteria(level: TrainingLevel) -> RecommendationCriteria {
    RecommendationCriteria {
        target_muscles: vec!["chest".to_string()],
        available_equipment: vec!["Barbell".to_string()],
        goals: vec!["build muscle".to_string(), "lose weight".to_string()],
        user_level: level,
    }
}

#[test]
fn test_weighted_ranking() {
    let engine = ExerciseRecommendationEngine::new();
    let ranked = engine.recommend(&small_catalog(), &criteria(TrainingLevel::Intermediate), 10);

    let ids: Vec<&str> = ranked.iter().map(|r| r.exercise.id.as_str()).collect();
    assert_eq!(ids, vec!["push_up", "bench_press", "running"]);

    assert!((ranked[0].score - 0.85).abs() < 1e-9);
    assert!((ranked[1].score - 0.70).abs() < 1e-9);
    assert!((ranked[2].score - 0.45).abs() < 1e-9);

    assert_eq!(ranked[1].equipment_match, 0.5);
    assert_eq!(ranked[1].goal_match, 0.5);
    assert!(ranked[0].reasons.iter().any(|r| r == "No equipment needed"));
    assert!(ranked[1]
        .reasons
        .iter()
        .any(|r| r == "Matches your intermediate level"));
}

#[test]
fn test_difficulty_filter_and_limit() {
    let engine = ExerciseRecommendationEngine::new();

    let beginner = engine.recommend(&small_catalog(), &criteria(TrainingLevel::Beginner), 10);
    assert!(beginner.iter().all(|r| r.exercise.id != "bench_press"));

    let top_one = engine.recommend(&small_catalog(), &criteria(TrainingLevel::Advanced), 1);
    assert_eq!(top_one.len(), 1);
    assert_eq!(top_one[0].exercise.id, "push_up");
}

#[test]
fn test_custom_weights_change_order() {
    let equipment_only = ExerciseRecommendationEngine::with_weights(ScoreWeights {
        muscle: 0.0,
        goal: 0.0,
        equipment: 1.0,
    });

    let ranked = equipment_only.recommend(&small_catalog(), &criteria(TrainingLevel::Advanced), 10);
    // Bodyweight exercises tie at 1.0 and are ordered by name
    assert_eq!(ranked[0].exercise.id, "push_up");
    assert_eq!(ranked[1].exercise.id, "running");
    assert_eq!(ranked[2].exercise.id, "bench_press");
}

#[test]
fn test_default_catalog_properties() {
    let catalog = default_catalog();
    assert!(!catalog.is_empty());

    let criteria: RecommendationCriteria = serde_json::from_value(json!({
        "target_muscles": ["legs", "glutes"],
        "goals": ["improve endurance"],
        "user_level": "beginner"
    }))
    .unwrap();

    let ranked = ExerciseRecommendationEngine::new().recommend(&catalog, &criteria, 5);
    assert!(ranked.len() <= 5);
    assert!(!ranked.is_empty());
    for pair in ranked.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
    for recommendation in &ranked {
        assert_eq!(recommendation.exercise.difficulty, TrainingLevel::Beginner);
        assert!((0.0..=1.0).contains(&recommendation.score));
        assert!(!recommendation.reasons.is_empty());
    }
}
