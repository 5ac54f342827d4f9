use crate::analytics::stats::HistorySummary;
use crate::domain::checkin::definition_for;
use crate::domain::models::{DayClassification, Metric, MetricValues, Persona, Prediction};
use crate::services::coach;
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringRequest {
    pub metrics: MetricValues,
    pub user_id: Option<i64>,
}

/// Turns a completed check-in into a prediction.
#[async_trait]
pub trait ScoringService: Send + Sync {
    async fn score(&self, request: &ScoringRequest) -> Result<Prediction>;
}

#[async_trait]
impl<T: ScoringService + ?Sized> ScoringService for Arc<T> {
    async fn score(&self, request: &ScoringRequest) -> Result<Prediction> {
        (**self).score(request).await
    }
}

/// In-process scorer without history, used by the terminal chat in offline mode.
#[derive(Debug, Clone, Default)]
pub struct LocalScoring;

#[async_trait]
impl ScoringService for LocalScoring {
    async fn score(&self, request: &ScoringRequest) -> Result<Prediction> {
        Ok(predict(&clamp_metrics(&request.metrics), None))
    }
}

/// Clamp every metric into its step's declared range.
pub fn clamp_metrics(metrics: &MetricValues) -> MetricValues {
    let clamp = |metric: Metric| definition_for(metric).clamp(metrics.get(metric));
    MetricValues {
        sleep_hours: clamp(Metric::SleepHours),
        work_intensity: clamp(Metric::WorkIntensity),
        stress_level: clamp(Metric::StressLevel),
        mood_score: clamp(Metric::MoodScore),
        screen_time: clamp(Metric::ScreenTime),
        hydration: clamp(Metric::Hydration),
    }
}

/// Weighted 0-100 performance index over all six metrics.
pub fn heuristic_score(m: &MetricValues) -> f64 {
    let sleep = m.sleep_hours;
    let score_sleep = if (7.0..=9.0).contains(&sleep) {
        25.0
    } else if (6.0..7.0).contains(&sleep) || (sleep > 9.0 && sleep <= 10.0) {
        20.0
    } else if (5.0..6.0).contains(&sleep) {
        12.0
    } else {
        (sleep / 9.0 * 15.0).max(0.0)
    };

    let work = m.work_intensity;
    let score_work = if (4.0..=7.0).contains(&work) {
        15.0
    } else if (3.0..4.0).contains(&work) || (work > 7.0 && work <= 8.0) {
        12.0
    } else {
        8.0
    };

    let score_stress = ((10.0 - m.stress_level) / 10.0 * 20.0).max(0.0);
    let score_mood = m.mood_score / 10.0 * 20.0;

    let score_screen = match m.screen_time {
        s if s <= 3.0 => 10.0,
        s if s <= 6.0 => 7.0,
        s if s <= 10.0 => 4.0,
        _ => 1.0,
    };

    let score_hydration = m.hydration.min(8.0) / 8.0 * 10.0;

    let total =
        score_sleep + score_work + score_stress + score_mood + score_screen + score_hydration;
    round2(total.clamp(0.0, 100.0))
}

pub fn classify_day(score: f64, m: &MetricValues) -> DayClassification {
    if score >= 60.0 && m.stress_level <= 6.0 {
        DayClassification::AttackMode
    } else {
        DayClassification::RecoveryMode
    }
}

pub fn assign_persona(m: &MetricValues) -> Persona {
    if m.sleep_hours < 6.0 && m.screen_time > 6.0 {
        Persona::NightOwl
    } else if m.work_intensity >= 8.0 {
        Persona::Workaholic
    } else {
        Persona::BalancedAchiever
    }
}

/// Full prediction for a check-in. `history` personalises the recommendations.
pub fn predict(m: &MetricValues, history: Option<&HistorySummary>) -> Prediction {
    let daily_score = heuristic_score(m);
    Prediction {
        daily_score,
        day_classification: classify_day(daily_score, m).label().to_string(),
        persona: assign_persona(m).label().to_string(),
        recommendations: coach::generate_recommendations(m, history),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictInput {
    pub sleep_hours: f64,
    pub work_intensity: f64,
    pub stress_level: f64,
    pub mood_score: f64,
}

impl PredictInput {
    /// Returns the name of the first field outside its allowed range.
    pub fn validate(&self) -> Result<(), &'static str> {
        if !(0.0..=24.0).contains(&self.sleep_hours) {
            return Err("sleep_hours");
        }
        if !(1.0..=10.0).contains(&self.work_intensity) {
            return Err("work_intensity");
        }
        if !(1.0..=10.0).contains(&self.stress_level) {
            return Err("stress_level");
        }
        if !(1.0..=10.0).contains(&self.mood_score) {
            return Err("mood_score");
        }
        Ok(())
    }
}

/// Four-metric scoring used by `/api/predict`.
pub fn direct_prediction(input: &PredictInput) -> Prediction {
    let score = input.sleep_hours.min(9.0) / 9.0 * 30.0
        + input.work_intensity / 10.0 * 20.0
        + (10.0 - input.stress_level) / 10.0 * 20.0
        + input.mood_score / 10.0 * 30.0;
    let daily_score = round2(score.clamp(0.0, 100.0));

    let metrics = MetricValues {
        sleep_hours: input.sleep_hours,
        work_intensity: input.work_intensity,
        stress_level: input.stress_level,
        mood_score: input.mood_score,
        screen_time: 0.0,
        hydration: 0.0,
    };

    Prediction {
        daily_score,
        day_classification: classify_day(daily_score, &metrics).label().to_string(),
        persona: assign_persona(&metrics).label().to_string(),
        recommendations: coach::directives(input),
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(sleep: f64, work: f64, stress: f64, mood: f64, screen: f64, water: f64) -> MetricValues {
        MetricValues {
            sleep_hours: sleep,
            work_intensity: work,
            stress_level: stress,
            mood_score: mood,
            screen_time: screen,
            hydration: water,
        }
    }

    #[test]
    fn test_ideal_day_scores_full_marks() {
        // 25 + 15 + 18 + 20 + 10 + 10
        let m = metrics(8.0, 5.0, 1.0, 10.0, 2.0, 8.0);
        assert_eq!(heuristic_score(&m), 98.0);
    }

    #[test]
    fn test_poor_day_score() {
        // sleep 4h -> 4/9*15, work 10 -> 8, stress 9 -> 2, mood 2 -> 4, screen 12 -> 1, water 2 -> 2.5
        let m = metrics(4.0, 10.0, 9.0, 2.0, 12.0, 2.0);
        let expected = ((4.0 / 9.0 * 15.0 + 8.0 + 2.0 + 4.0 + 1.0 + 2.5) * 100.0_f64).round() / 100.0;
        assert_eq!(heuristic_score(&m), expected);
    }

    #[test]
    fn test_score_stays_in_bounds() {
        let extremes = [
            metrics(0.0, 1.0, 10.0, 1.0, 24.0, 0.0),
            metrics(24.0, 10.0, 1.0, 10.0, 0.0, 20.0),
            metrics(-5.0, 0.0, 15.0, -2.0, 30.0, -1.0),
        ];
        for m in extremes {
            let score = heuristic_score(&m);
            assert!((0.0..=100.0).contains(&score), "score {score} out of range");
        }
    }

    #[test]
    fn test_clamp_metrics_uses_step_ranges() {
        let clamped = clamp_metrics(&metrics(30.0, 0.0, 11.0, 12.0, -1.0, 25.0));
        assert_eq!(clamped, metrics(24.0, 1.0, 10.0, 10.0, 0.0, 20.0));
    }

    #[test]
    fn test_classification_and_persona() {
        let good = metrics(8.0, 5.0, 3.0, 8.0, 3.0, 8.0);
        let score = heuristic_score(&good);
        assert_eq!(classify_day(score, &good), DayClassification::AttackMode);
        assert_eq!(assign_persona(&good), Persona::BalancedAchiever);

        let stressed = metrics(8.0, 5.0, 8.0, 8.0, 3.0, 8.0);
        assert_eq!(
            classify_day(heuristic_score(&stressed), &stressed),
            DayClassification::RecoveryMode
        );

        assert_eq!(assign_persona(&metrics(5.0, 9.0, 5.0, 5.0, 8.0, 4.0)), Persona::NightOwl);
        assert_eq!(assign_persona(&metrics(7.0, 9.0, 5.0, 5.0, 3.0, 4.0)), Persona::Workaholic);
    }

    #[test]
    fn test_direct_prediction() {
        let input = PredictInput {
            sleep_hours: 9.0,
            work_intensity: 10.0,
            stress_level: 1.0,
            mood_score: 10.0,
        };
        assert!(input.validate().is_ok());
        let prediction = direct_prediction(&input);
        assert_eq!(prediction.daily_score, 98.0);
        assert!(!prediction.recommendations.is_empty());

        let bad = PredictInput { stress_level: 0.0, ..input };
        assert_eq!(bad.validate(), Err("stress_level"));
    }

    #[tokio::test]
    async fn test_local_scoring_clamps_before_scoring() {
        let request = ScoringRequest {
            metrics: metrics(8.0, 5.0, 1.0, 10.0, 2.0, 40.0),
            user_id: None,
        };
        let prediction = LocalScoring.score(&request).await.unwrap();
        assert_eq!(prediction.daily_score, 98.0);
        assert_eq!(prediction.day_classification, "🚀 Attack Mode");
    }
}
