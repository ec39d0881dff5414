//! Body-fat percentage estimation
//!
//! Four interchangeable formulas, each producing a [`BodyFatEstimate`]:
//!
//! | Method | Inputs | Confidence |
//! |---|---|---|
//! | BMI-based | BMI, age, gender | low |
//! | Deurenberg (1991) | BMI, age, gender | medium |
//! | US Navy | neck, waist (+ hip for women), height | high |
//! | Jackson-Pollock 3-site | three skinfolds, age | high |
//!
//! Every result is clamped to 3-50 % and rounded to one decimal.

use super::nutrition::{calculate_bmi, CalculationError};
use super::{round1, Confidence};
use crate::constants::body_fat;
use crate::models::{ActivityLevel, Gender, PersonalMetrics, TrainingLevel};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Estimation formula
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BodyFatMethod {
    BmiBased,
    Deurenberg,
    Navy,
    #[serde(rename = "jackson_pollock_3")]
    JacksonPollock3,
}

impl BodyFatMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BmiBased => "bmi_based",
            Self::Deurenberg => "deurenberg",
            Self::Navy => "navy",
            Self::JacksonPollock3 => "jackson_pollock_3",
        }
    }

    pub fn confidence(&self) -> Confidence {
        match self {
            Self::BmiBased => Confidence::Low,
            Self::Deurenberg => Confidence::Medium,
            Self::Navy | Self::JacksonPollock3 => Confidence::High,
        }
    }

    fn disclaimer(&self) -> &'static str {
        match self {
            Self::BmiBased => "Rough estimate from BMI and age. It cannot tell muscle from fat and may be off by 5% or more for athletic builds.",
            Self::Deurenberg => "Population-based estimate from BMI, age and sex. Individual error is typically 3-5%.",
            Self::Navy => "Circumference estimate. Accuracy depends on consistent tape placement; typical error is 3-4%.",
            Self::JacksonPollock3 => "Skinfold estimate. Accuracy depends on caliper technique; typical error is 3-4%.",
        }
    }
}

impl fmt::Display for BodyFatMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One body-fat estimate
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BodyFatEstimate {
    pub percentage: f64,
    pub method: BodyFatMethod,
    pub confidence: Confidence,
    pub disclaimer: String,
    /// Whether the user may replace the estimate with a measured value
    pub can_override: bool,
}

impl BodyFatEstimate {
    fn new(method: BodyFatMethod, raw_percentage: f64) -> Self {
        Self {
            percentage: clamp_percentage(raw_percentage),
            method,
            confidence: method.confidence(),
            disclaimer: method.disclaimer().to_string(),
            can_override: true,
        }
    }
}

/// Tape measurements in centimeters
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CircumferenceMeasurements {
    pub neck_cm: f64,
    pub waist_cm: f64,
    /// Required for women
    pub hip_cm: Option<f64>,
}

/// Caliper measurements in millimeters
///
/// Men use chest, abdomen and thigh; women use tricep, suprailiac and thigh.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct SkinfoldMeasurements {
    pub chest_mm: Option<f64>,
    pub abdomen_mm: Option<f64>,
    pub thigh_mm: Option<f64>,
    pub tricep_mm: Option<f64>,
    pub suprailiac_mm: Option<f64>,
}

/// Optional measurement sets available for one estimate
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BodyMeasurements {
    pub circumference: Option<CircumferenceMeasurements>,
    pub skinfolds: Option<SkinfoldMeasurements>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BodyFatError {
    #[error("Missing measurement: {0}")]
    MissingMeasurement(&'static str),

    #[error("The {0} method requires male or female gender")]
    UnsupportedGender(BodyFatMethod),

    #[error("Invalid measurement: {0}")]
    InvalidMeasurement(String),

    #[error(transparent)]
    Calculation(#[from] CalculationError),
}

/// Min/max over a set of estimates
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BodyFatRange {
    pub min: f64,
    pub max: f64,
}

/// Result of running every applicable method
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BodyFatAnalysis {
    pub recommended: BodyFatEstimate,
    pub alternatives: Vec<BodyFatEstimate>,
    pub average: f64,
    pub range: BodyFatRange,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BodyFatSource {
    Measured,
    Estimated,
}

/// Body-fat value to use for a user, measured or estimated
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BodyFatReading {
    pub percentage: f64,
    pub source: BodyFatSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimate: Option<BodyFatEstimate>,
}

impl BodyFatReading {
    pub fn measured(percentage: f64) -> Self {
        Self {
            percentage,
            source: BodyFatSource::Measured,
            estimate: None,
        }
    }

    pub fn estimated(estimate: BodyFatEstimate) -> Self {
        Self {
            percentage: estimate.percentage,
            source: BodyFatSource::Estimated,
            estimate: Some(estimate),
        }
    }
}

/// `1.20·BMI + 0.23·age + offset`, offset −16.2 (male), −5.4 (female), their
/// mean otherwise
pub fn estimate_bmi_based(metrics: &PersonalMetrics) -> Result<BodyFatEstimate, BodyFatError> {
    let bmi = calculate_bmi(metrics.height, metrics.weight)?;
    let offset = match metrics.gender {
        Gender::Male => body_fat::MALE_OFFSET,
        Gender::Female => body_fat::FEMALE_OFFSET,
        Gender::Other => (body_fat::MALE_OFFSET + body_fat::FEMALE_OFFSET) / 2.0,
    };

    let raw = body_fat::BMI_COEF * bmi + body_fat::AGE_COEF * f64::from(metrics.age) + offset;
    Ok(BodyFatEstimate::new(BodyFatMethod::BmiBased, raw))
}

/// Deurenberg: `1.20·BMI + 0.23·age − 10.8·sex − 5.4`
pub fn estimate_deurenberg(metrics: &PersonalMetrics) -> Result<BodyFatEstimate, BodyFatError> {
    let bmi = calculate_bmi(metrics.height, metrics.weight)?;
    let sex_factor = match metrics.gender {
        Gender::Male => 1.0,
        Gender::Female => 0.0,
        Gender::Other => 0.5,
    };

    let raw = body_fat::BMI_COEF * bmi + body_fat::AGE_COEF * f64::from(metrics.age)
        - body_fat::DEURENBERG_SEX_COEF * sex_factor
        - body_fat::DEURENBERG_CONSTANT;
    Ok(BodyFatEstimate::new(BodyFatMethod::Deurenberg, raw))
}

/// US Navy circumference method (metric form)
pub fn estimate_navy(
    metrics: &PersonalMetrics,
    measurements: &CircumferenceMeasurements,
) -> Result<BodyFatEstimate, BodyFatError> {
    if metrics.height <= 0.0 {
        return Err(CalculationError::NonPositiveInput {
            field: "height",
            value: metrics.height,
        }
        .into());
    }
    let height_log = metrics.height.log10();

    let tapes = [
        ("neck_cm", Some(measurements.neck_cm)),
        ("waist_cm", Some(measurements.waist_cm)),
        ("hip_cm", measurements.hip_cm),
    ];
    for (name, value) in tapes {
        if let Some(value) = value.filter(|v| *v <= 0.0) {
            return Err(BodyFatError::InvalidMeasurement(format!(
                "{} must be positive, got {}",
                name, value
            )));
        }
    }

    let density = match metrics.gender {
        Gender::Male => {
            let girth = measurements.waist_cm - measurements.neck_cm;
            if girth <= 0.0 {
                return Err(BodyFatError::InvalidMeasurement(
                    "waist must be larger than neck".to_string(),
                ));
            }
            1.0324 - 0.19077 * girth.log10() + 0.15456 * height_log
        }
        Gender::Female => {
            let hip = measurements
                .hip_cm
                .ok_or(BodyFatError::MissingMeasurement("hip_cm"))?;
            let girth = measurements.waist_cm + hip - measurements.neck_cm;
            if girth <= 0.0 {
                return Err(BodyFatError::InvalidMeasurement(
                    "waist plus hip must be larger than neck".to_string(),
                ));
            }
            1.29579 - 0.35004 * girth.log10() + 0.22100 * height_log
        }
        Gender::Other => return Err(BodyFatError::UnsupportedGender(BodyFatMethod::Navy)),
    };

    Ok(BodyFatEstimate::new(BodyFatMethod::Navy, siri(density)))
}

/// Jackson-Pollock 3-site skinfold method converted with the Siri equation
pub fn estimate_jackson_pollock(
    metrics: &PersonalMetrics,
    skinfolds: &SkinfoldMeasurements,
) -> Result<BodyFatEstimate, BodyFatError> {
    let age = f64::from(metrics.age);

    let density = match metrics.gender {
        Gender::Male => {
            let sum = skinfold_sum([
                ("chest_mm", skinfolds.chest_mm),
                ("abdomen_mm", skinfolds.abdomen_mm),
                ("thigh_mm", skinfolds.thigh_mm),
            ])?;
            1.10938 - 0.000_826_7 * sum + 0.000_001_6 * sum * sum - 0.000_257_4 * age
        }
        Gender::Female => {
            let sum = skinfold_sum([
                ("tricep_mm", skinfolds.tricep_mm),
                ("suprailiac_mm", skinfolds.suprailiac_mm),
                ("thigh_mm", skinfolds.thigh_mm),
            ])?;
            1.099_492_1 - 0.000_992_9 * sum + 0.000_002_3 * sum * sum - 0.000_139_2 * age
        }
        Gender::Other => {
            return Err(BodyFatError::UnsupportedGender(
                BodyFatMethod::JacksonPollock3,
            ))
        }
    };

    Ok(BodyFatEstimate::new(
        BodyFatMethod::JacksonPollock3,
        siri(density),
    ))
}

/// Nudge an estimate for activity and training experience
///
/// Very active −2, active −1, sedentary +1; advanced training another −1.
/// The result is clamped again.
pub fn adjust_for_activity(
    percentage: f64,
    activity_level: ActivityLevel,
    training_level: Option<TrainingLevel>,
) -> f64 {
    let activity_delta = match activity_level {
        ActivityLevel::VeryActive => -2.0,
        ActivityLevel::Active => -1.0,
        ActivityLevel::Sedentary => 1.0,
        ActivityLevel::Light | ActivityLevel::Moderate => 0.0,
    };
    let training_delta = match training_level {
        Some(TrainingLevel::Advanced) => -1.0,
        _ => 0.0,
    };

    clamp_percentage(percentage + activity_delta + training_delta)
}

/// Run every method whose inputs are present and pick the most confident
///
/// Methods are tried in the order Navy, Jackson-Pollock, Deurenberg,
/// BMI-based; on equal confidence the earlier one is recommended. Navy and
/// Jackson-Pollock are skipped when their measurements are incomplete or
/// the gender is not male/female.
pub fn estimate_body_fat_percentage(
    metrics: &PersonalMetrics,
    measurements: &BodyMeasurements,
    training_level: Option<TrainingLevel>,
) -> Result<BodyFatAnalysis, BodyFatError> {
    let mut estimates = Vec::with_capacity(4);

    if let Some(circumference) = &measurements.circumference {
        match estimate_navy(metrics, circumference) {
            Ok(estimate) => estimates.push(estimate),
            Err(e) => debug!(error = %e, "Skipping navy estimate"),
        }
    }
    if let Some(skinfolds) = &measurements.skinfolds {
        match estimate_jackson_pollock(metrics, skinfolds) {
            Ok(estimate) => estimates.push(estimate),
            Err(e) => debug!(error = %e, "Skipping skinfold estimate"),
        }
    }
    estimates.push(estimate_deurenberg(metrics)?);
    estimates.push(estimate_bmi_based(metrics)?);

    for estimate in &mut estimates {
        estimate.percentage =
            adjust_for_activity(estimate.percentage, metrics.activity_level, training_level);
    }

    let mut recommended_index = 0;
    for (index, estimate) in estimates.iter().enumerate() {
        if estimate.confidence > estimates[recommended_index].confidence {
            recommended_index = index;
        }
    }

    let count = estimates.len() as f64;
    let average = round1(estimates.iter().map(|e| e.percentage).sum::<f64>() / count);
    let range = estimates.iter().fold(
        BodyFatRange {
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        },
        |range, e| BodyFatRange {
            min: range.min.min(e.percentage),
            max: range.max.max(e.percentage),
        },
    );

    let recommended = estimates.remove(recommended_index);
    debug!(
        method = %recommended.method,
        percentage = recommended.percentage,
        alternatives = estimates.len(),
        "Body fat estimated"
    );

    Ok(BodyFatAnalysis {
        recommended,
        alternatives: estimates,
        average,
        range,
    })
}

/// Body-fat percentage for a user: the measured value when given, otherwise
/// the recommended estimate
pub fn get_body_fat_percentage(
    actual: Option<f64>,
    metrics: &PersonalMetrics,
    measurements: &BodyMeasurements,
    training_level: Option<TrainingLevel>,
) -> Result<BodyFatReading, BodyFatError> {
    if let Some(percentage) = actual {
        if !(body_fat::MEASURED_MIN_PERCENT..=body_fat::MEASURED_MAX_PERCENT).contains(&percentage)
        {
            return Err(BodyFatError::InvalidMeasurement(format!(
                "measured body fat must be between {} and {} percent",
                body_fat::MEASURED_MIN_PERCENT,
                body_fat::MEASURED_MAX_PERCENT
            )));
        }
        return Ok(BodyFatReading::measured(percentage));
    }

    let analysis = estimate_body_fat_percentage(metrics, measurements, training_level)?;
    Ok(BodyFatReading::estimated(analysis.recommended))
}

fn skinfold_sum(sites: [(&'static str, Option<f64>); 3]) -> Result<f64, BodyFatError> {
    let mut sum = 0.0;
    for (name, value) in sites {
        let value = value.ok_or(BodyFatError::MissingMeasurement(name))?;
        if value <= 0.0 {
            return Err(BodyFatError::InvalidMeasurement(format!(
                "{} must be positive",
                name
            )));
        }
        sum += value;
    }
    Ok(sum)
}

fn siri(density: f64) -> f64 {
    body_fat::SIRI_NUMERATOR / density - body_fat::SIRI_OFFSET
}

fn clamp_percentage(value: f64) -> f64 {
    round1(value.clamp(body_fat::MIN_PERCENT, body_fat::MAX_PERCENT))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(gender: Gender) -> PersonalMetrics {
        PersonalMetrics {
            height: 175.0,
            weight: 70.0,
            age: 30,
            gender,
            activity_level: ActivityLevel::Moderate,
            fitness_goals: vec![],
        }
    }

    #[test]
    fn test_bmi_based_offsets() {
        // BMI 22.9: 27.48 + 6.9 + offset
        let male = estimate_bmi_based(&metrics(Gender::Male)).unwrap();
        let female = estimate_bmi_based(&metrics(Gender::Female)).unwrap();
        let other = estimate_bmi_based(&metrics(Gender::Other)).unwrap();

        assert_eq!(male.percentage, 18.2);
        assert_eq!(female.percentage, 29.0);
        assert_eq!(other.percentage, 23.6);
        assert_eq!(male.confidence, Confidence::Low);
        assert!(male.can_override);
    }

    #[test]
    fn test_deurenberg_matches_bmi_based_for_binary_genders() {
        let male = estimate_deurenberg(&metrics(Gender::Male)).unwrap();
        assert_eq!(male.percentage, 18.2);
        assert_eq!(male.confidence, Confidence::Medium);

        let other = estimate_deurenberg(&metrics(Gender::Other)).unwrap();
        assert_eq!(other.percentage, 23.6);
    }

    #[test]
    fn test_navy_male() {
        let m = PersonalMetrics { height: 180.0, ..metrics(Gender::Male) };
        let tape = CircumferenceMeasurements { neck_cm: 38.0, waist_cm: 85.0, hip_cm: None };

        let estimate = estimate_navy(&m, &tape).unwrap();
        assert_eq!(estimate.percentage, 16.1);
        assert_eq!(estimate.confidence, Confidence::High);
    }

    #[test]
    fn test_navy_female_requires_hip() {
        let m = PersonalMetrics { height: 165.0, ..metrics(Gender::Female) };
        let mut tape = CircumferenceMeasurements { neck_cm: 33.0, waist_cm: 75.0, hip_cm: None };

        assert_eq!(
            estimate_navy(&m, &tape),
            Err(BodyFatError::MissingMeasurement("hip_cm"))
        );

        tape.hip_cm = Some(100.0);
        assert_eq!(estimate_navy(&m, &tape).unwrap().percentage, 29.4);
    }

    #[test]
    fn test_navy_rejects_non_positive_tape() {
        let m = metrics(Gender::Male);
        let negative_neck = CircumferenceMeasurements { neck_cm: -50.0, waist_cm: 10.0, hip_cm: None };
        assert!(matches!(
            estimate_navy(&m, &negative_neck),
            Err(BodyFatError::InvalidMeasurement(msg)) if msg.starts_with("neck_cm")
        ));

        let f = PersonalMetrics { height: 165.0, ..metrics(Gender::Female) };
        let zero_hip = CircumferenceMeasurements { neck_cm: 33.0, waist_cm: 75.0, hip_cm: Some(0.0) };
        assert!(matches!(
            estimate_navy(&f, &zero_hip),
            Err(BodyFatError::InvalidMeasurement(msg)) if msg.starts_with("hip_cm")
        ));
    }

    #[test]
    fn test_navy_rejects_other_gender() {
        let tape = CircumferenceMeasurements { neck_cm: 38.0, waist_cm: 85.0, hip_cm: Some(95.0) };
        assert_eq!(
            estimate_navy(&metrics(Gender::Other), &tape),
            Err(BodyFatError::UnsupportedGender(BodyFatMethod::Navy))
        );
    }

    #[test]
    fn test_jackson_pollock() {
        let male_folds = SkinfoldMeasurements {
            chest_mm: Some(10.0),
            abdomen_mm: Some(20.0),
            thigh_mm: Some(15.0),
            ..Default::default()
        };
        assert_eq!(
            estimate_jackson_pollock(&metrics(Gender::Male), &male_folds).unwrap().percentage,
            13.6
        );

        let female = PersonalMetrics { age: 28, ..metrics(Gender::Female) };
        let female_folds = SkinfoldMeasurements {
            tricep_mm: Some(15.0),
            suprailiac_mm: Some(12.0),
            thigh_mm: Some(20.0),
            ..Default::default()
        };
        assert_eq!(
            estimate_jackson_pollock(&female, &female_folds).unwrap().percentage,
            19.6
        );

        // Male sites are not enough for a female estimate
        assert_eq!(
            estimate_jackson_pollock(&female, &male_folds),
            Err(BodyFatError::MissingMeasurement("tricep_mm"))
        );
    }

    #[test]
    fn test_results_are_clamped() {
        let lean = PersonalMetrics { height: 200.0, weight: 45.0, age: 13, ..metrics(Gender::Male) };
        assert_eq!(estimate_bmi_based(&lean).unwrap().percentage, 3.0);

        let heavy = PersonalMetrics { height: 150.0, weight: 200.0, age: 90, ..metrics(Gender::Female) };
        assert_eq!(estimate_bmi_based(&heavy).unwrap().percentage, 50.0);
    }

    #[test]
    fn test_activity_adjustment() {
        assert_eq!(adjust_for_activity(20.0, ActivityLevel::VeryActive, None), 18.0);
        assert_eq!(adjust_for_activity(20.0, ActivityLevel::Active, Some(TrainingLevel::Advanced)), 18.0);
        assert_eq!(adjust_for_activity(20.0, ActivityLevel::Sedentary, None), 21.0);
        assert_eq!(adjust_for_activity(20.0, ActivityLevel::Moderate, Some(TrainingLevel::Beginner)), 20.0);
        assert_eq!(adjust_for_activity(3.5, ActivityLevel::VeryActive, None), 3.0);
    }

    #[test]
    fn test_aggregate_prefers_highest_confidence() {
        let m = PersonalMetrics { height: 180.0, weight: 80.0, ..metrics(Gender::Male) };
        let measurements = BodyMeasurements {
            circumference: Some(CircumferenceMeasurements { neck_cm: 38.0, waist_cm: 85.0, hip_cm: None }),
            skinfolds: Some(SkinfoldMeasurements {
                chest_mm: Some(10.0),
                abdomen_mm: Some(20.0),
                thigh_mm: Some(15.0),
                ..Default::default()
            }),
        };

        let analysis = estimate_body_fat_percentage(&m, &measurements, None).unwrap();
        // Navy and skinfold tie on confidence; navy is evaluated first
        assert_eq!(analysis.recommended.method, BodyFatMethod::Navy);
        assert_eq!(analysis.alternatives.len(), 3);
        assert_eq!(analysis.range.min, 13.6);
        assert_eq!(analysis.range.max, 20.3);
        assert!((analysis.average - 17.6).abs() < 0.11);
    }

    #[test]
    fn test_aggregate_without_measurements() {
        let analysis =
            estimate_body_fat_percentage(&metrics(Gender::Other), &BodyMeasurements::default(), None)
                .unwrap();
        assert_eq!(analysis.recommended.method, BodyFatMethod::Deurenberg);
        assert_eq!(analysis.alternatives[0].method, BodyFatMethod::BmiBased);
    }

    #[test]
    fn test_measured_value_wins() {
        let reading = get_body_fat_percentage(
            Some(14.5),
            &metrics(Gender::Male),
            &BodyMeasurements::default(),
            None,
        )
        .unwrap();
        assert_eq!(reading.percentage, 14.5);
        assert_eq!(reading.source, BodyFatSource::Measured);
        assert!(reading.estimate.is_none());

        let estimated =
            get_body_fat_percentage(None, &metrics(Gender::Male), &BodyMeasurements::default(), None)
                .unwrap();
        assert_eq!(estimated.source, BodyFatSource::Estimated);
        assert_eq!(estimated.percentage, 18.2);
    }

    #[test]
    fn test_measured_value_out_of_range() {
        for actual in [-40.0, 1.9, 70.5] {
            let result = get_body_fat_percentage(
                Some(actual),
                &metrics(Gender::Male),
                &BodyMeasurements::default(),
                None,
            );
            assert!(
                matches!(result, Err(BodyFatError::InvalidMeasurement(_))),
                "{actual} accepted"
            );
        }

        for actual in [2.0, 70.0] {
            let reading = get_body_fat_percentage(
                Some(actual),
                &metrics(Gender::Male),
                &BodyMeasurements::default(),
                None,
            )
            .unwrap();
            assert_eq!(reading.percentage, actual);
        }
    }
}
