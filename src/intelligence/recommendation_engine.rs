//! Exercise recommendation engine
//!
//! Scores exercises against a user's target muscles, equipment, goals and
//! training level. Every component score lies in `[0, 1]`.

use crate::models::TrainingLevel;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseCategory {
    Strength,
    Cardio,
    Flexibility,
    Balance,
}

impl ExerciseCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Strength => "strength",
            Self::Cardio => "cardio",
            Self::Flexibility => "flexibility",
            Self::Balance => "balance",
        }
    }
}

impl fmt::Display for ExerciseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Exercise {
    pub id: String,
    pub name: String,
    pub category: ExerciseCategory,
    pub target_muscles: Vec<String>,
    /// `["none"]` or empty for bodyweight exercises
    #[serde(default)]
    pub equipment: Vec<String>,
    pub difficulty: TrainingLevel,
    #[serde(default)]
    pub calories_per_minute: Option<f64>,
}

/// What the user is looking for
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendationCriteria {
    #[serde(default)]
    pub target_muscles: Vec<String>,
    #[serde(default)]
    pub available_equipment: Vec<String>,
    /// Free-text goals, classified with [`classify_goal`]
    #[serde(default)]
    pub goals: Vec<String>,
    pub user_level: TrainingLevel,
}

/// Training focus a free-text goal maps to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum GoalFocus {
    WeightLoss,
    MuscleGain,
    Strength,
    Cardio,
    Flexibility,
    Balance,
}

impl GoalFocus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WeightLoss => "weight loss",
            Self::MuscleGain => "muscle gain",
            Self::Strength => "strength",
            Self::Cardio => "cardio",
            Self::Flexibility => "flexibility",
            Self::Balance => "balance",
        }
    }
}

/// Keyword rules in evaluation order; the first rule with a keyword
/// contained in the goal wins
const GOAL_RULES: &[(GoalFocus, &[&str])] = &[
    (GoalFocus::WeightLoss, &["weight loss", "lose", "fat"]),
    (GoalFocus::MuscleGain, &["muscle", "hypertrophy", "bulk", "gain"]),
    (GoalFocus::Strength, &["strength", "strong", "power"]),
    (GoalFocus::Cardio, &["cardio", "endurance", "stamina", "running"]),
    (GoalFocus::Flexibility, &["flexibility", "mobility", "stretch"]),
    (GoalFocus::Balance, &["balance", "stability", "posture"]),
];

pub fn classify_goal(goal: &str) -> Option<GoalFocus> {
    let goal = goal.to_lowercase();
    GOAL_RULES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| goal.contains(k)))
        .map(|(focus, _)| *focus)
}

/// Relative weight of each component in the total score
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ScoreWeights {
    pub muscle: f64,
    pub goal: f64,
    pub equipment: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            muscle: 0.4,
            goal: 0.3,
            equipment: 0.3,
        }
    }
}

/// One scored exercise
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExerciseRecommendation {
    pub exercise: Exercise,
    pub score: f64,
    pub muscle_match: f64,
    pub equipment_match: f64,
    pub goal_match: f64,
    pub reasons: Vec<String>,
}

/// Trait for ranking exercises
pub trait ExerciseRecommender {
    /// Top `limit` exercises the user's level allows, best first
    fn recommend(
        &self,
        exercises: &[Exercise],
        criteria: &RecommendationCriteria,
        limit: usize,
    ) -> Vec<ExerciseRecommendation>;
}

/// Weighted-score recommendation engine
#[derive(Debug, Clone, Default)]
pub struct ExerciseRecommendationEngine {
    weights: ScoreWeights,
}

impl ExerciseRecommendationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_weights(weights: ScoreWeights) -> Self {
        Self { weights }
    }

    /// Score a single exercise; `None` when its difficulty is above the
    /// user's level
    pub fn score(
        &self,
        exercise: &Exercise,
        criteria: &RecommendationCriteria,
    ) -> Option<ExerciseRecommendation> {
        if !is_difficulty_appropriate(exercise.difficulty, criteria.user_level) {
            return None;
        }

        let muscle_match = muscle_match_score(exercise, &criteria.target_muscles);
        let equipment_match = equipment_match_score(exercise, &criteria.available_equipment);
        let goal_match = goal_match_score(exercise, &criteria.goals);

        let score = self.weights.muscle * muscle_match
            + self.weights.goal * goal_match
            + self.weights.equipment * equipment_match;

        Some(ExerciseRecommendation {
            reasons: build_reasons(exercise, criteria, muscle_match, equipment_match, goal_match),
            exercise: exercise.clone(),
            score,
            muscle_match,
            equipment_match,
            goal_match,
        })
    }
}

impl ExerciseRecommender for ExerciseRecommendationEngine {
    fn recommend(
        &self,
        exercises: &[Exercise],
        criteria: &RecommendationCriteria,
        limit: usize,
    ) -> Vec<ExerciseRecommendation> {
        let mut scored: Vec<ExerciseRecommendation> = exercises
            .iter()
            .filter_map(|exercise| self.score(exercise, criteria))
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.exercise.name.cmp(&b.exercise.name))
        });
        scored.truncate(limit);
        scored
    }
}

/// Share of the requested muscles the exercise trains
pub fn muscle_match_score(exercise: &Exercise, target_muscles: &[String]) -> f64 {
    let targets = normalized_set(target_muscles);
    if targets.is_empty() {
        return 0.0;
    }
    let trained = normalized_set(&exercise.target_muscles);
    targets.intersection(&trained).count() as f64 / targets.len() as f64
}

/// 1 for bodyweight exercises, otherwise the share of required equipment
/// the user has
pub fn equipment_match_score(exercise: &Exercise, available: &[String]) -> f64 {
    if is_bodyweight(exercise) {
        return 1.0;
    }
    let required = normalized_set(&exercise.equipment);
    let available = normalized_set(available);
    required.intersection(&available).count() as f64 / required.len() as f64
}

/// Share of the user's classified goals this exercise's category serves
pub fn goal_match_score(exercise: &Exercise, goals: &[String]) -> f64 {
    let focuses: BTreeSet<GoalFocus> = goals.iter().filter_map(|g| classify_goal(g)).collect();
    if focuses.is_empty() {
        return 0.0;
    }
    let served = focuses.iter().filter(|f| serves_goal(exercise, **f)).count();
    served as f64 / focuses.len() as f64
}

/// Beginner exercises suit everyone; harder ones need at least that level
pub fn is_difficulty_appropriate(exercise: TrainingLevel, user: TrainingLevel) -> bool {
    exercise <= user
}

fn serves_goal(exercise: &Exercise, focus: GoalFocus) -> bool {
    match (exercise.category, focus) {
        (ExerciseCategory::Strength, GoalFocus::Strength | GoalFocus::MuscleGain) => true,
        (ExerciseCategory::Cardio, GoalFocus::Cardio) => true,
        (ExerciseCategory::Cardio, GoalFocus::WeightLoss) => exercise.calories_per_minute.is_some(),
        (ExerciseCategory::Flexibility, GoalFocus::Flexibility) => true,
        (ExerciseCategory::Balance, GoalFocus::Balance) => true,
        _ => false,
    }
}

fn is_bodyweight(exercise: &Exercise) -> bool {
    exercise
        .equipment
        .iter()
        .all(|item| item.trim().eq_ignore_ascii_case("none"))
}

fn normalized_set(items: &[String]) -> BTreeSet<String> {
    items.iter().map(|item| item.trim().to_lowercase()).collect()
}

fn build_reasons(
    exercise: &Exercise,
    criteria: &RecommendationCriteria,
    muscle_match: f64,
    equipment_match: f64,
    goal_match: f64,
) -> Vec<String> {
    let mut reasons = Vec::new();

    if muscle_match > 0.0 {
        let targets = normalized_set(&criteria.target_muscles);
        let matched: Vec<String> = normalized_set(&exercise.target_muscles)
            .intersection(&targets)
            .cloned()
            .collect();
        reasons.push(format!("Targets {}", matched.join(", ")));
    }
    if exercise.difficulty == criteria.user_level {
        reasons.push(format!("Matches your {} level", criteria.user_level));
    }
    if equipment_match >= 1.0 {
        if is_bodyweight(exercise) {
            reasons.push("No equipment needed".to_string());
        } else {
            reasons.push("Uses equipment you have".to_string());
        }
    }
    if goal_match > 0.0 {
        let served: Vec<&str> = criteria
            .goals
            .iter()
            .filter_map(|g| classify_goal(g))
            .filter(|f| serves_goal(exercise, *f))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(|f| f.as_str())
            .collect();
        reasons.push(format!("Supports your {} goal", served.join(" and ")));
    }

    if reasons.is_empty() {
        reasons.push(format!("Popular {} exercise", exercise.category));
    }
    reasons
}

/// Built-in exercise list used when a request brings none
pub fn default_catalog() -> Vec<Exercise> {
    fn exercise(
        id: &str,
        name: &str,
        category: ExerciseCategory,
        muscles: &[&str],
        equipment: &[&str],
        difficulty: TrainingLevel,
        calories_per_minute: Option<f64>,
    ) -> Exercise {
        Exercise {
            id: id.to_string(),
            name: name.to_string(),
            category,
            target_muscles: muscles.iter().map(|m| m.to_string()).collect(),
            equipment: equipment.iter().map(|e| e.to_string()).collect(),
            difficulty,
            calories_per_minute,
        }
    }

    use ExerciseCategory::*;
    use TrainingLevel::*;
    vec![
        exercise("push-up", "Push-up", Strength, &["chest", "triceps", "shoulders"], &["none"], Beginner, Some(7.0)),
        exercise("squat", "Bodyweight Squat", Strength, &["quadriceps", "glutes", "hamstrings"], &["none"], Beginner, Some(8.0)),
        exercise("plank", "Plank", Strength, &["core", "shoulders"], &["none"], Beginner, None),
        exercise("lunge", "Walking Lunge", Strength, &["quadriceps", "glutes"], &["none"], Beginner, Some(6.0)),
        exercise("db-row", "Dumbbell Row", Strength, &["back", "biceps"], &["dumbbells", "bench"], Beginner, None),
        exercise("bench-press", "Barbell Bench Press", Strength, &["chest", "triceps", "shoulders"], &["barbell", "bench"], Intermediate, None),
        exercise("deadlift", "Barbell Deadlift", Strength, &["back", "glutes", "hamstrings"], &["barbell"], Intermediate, None),
        exercise("pull-up", "Pull-up", Strength, &["back", "biceps"], &["pull-up bar"], Intermediate, None),
        exercise("pistol-squat", "Pistol Squat", Strength, &["quadriceps", "glutes", "core"], &["none"], Advanced, None),
        exercise("burpee", "Burpee", Cardio, &["full body"], &["none"], Intermediate, Some(10.0)),
        exercise("jump-rope", "Jump Rope", Cardio, &["calves", "shoulders"], &["jump rope"], Beginner, Some(12.0)),
        exercise("jogging", "Jogging", Cardio, &["legs"], &["none"], Beginner, Some(9.0)),
        exercise("hamstring-stretch", "Standing Hamstring Stretch", Flexibility, &["hamstrings"], &["none"], Beginner, None),
        exercise("single-leg-stand", "Single-leg Stand", Balance, &["core", "ankles"], &["none"], Beginner, None),
    ]
}
