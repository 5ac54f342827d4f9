use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::BTreeMap;

/// One of the six tracked daily inputs. The serde name is the wire key used
/// in `temp_data` and the column name in `habit_sessions`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    SleepHours,
    WorkIntensity,
    StressLevel,
    MoodScore,
    ScreenTime,
    Hydration,
}

impl Metric {
    pub const ALL: [Metric; 6] = [
        Metric::SleepHours,
        Metric::WorkIntensity,
        Metric::StressLevel,
        Metric::MoodScore,
        Metric::ScreenTime,
        Metric::Hydration,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Metric::SleepHours => "sleep_hours",
            Metric::WorkIntensity => "work_intensity",
            Metric::StressLevel => "stress_level",
            Metric::MoodScore => "mood_score",
            Metric::ScreenTime => "screen_time",
            Metric::Hydration => "hydration",
        }
    }
}

/// Answers collected so far in one check-in pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartialSubmission(BTreeMap<Metric, f64>);

impl PartialSubmission {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, metric: Metric) -> Option<f64> {
        self.0.get(&metric).copied()
    }

    pub fn insert(&mut self, metric: Metric, value: f64) {
        self.0.insert(metric, value);
    }

    pub fn remove(&mut self, metric: Metric) -> Option<f64> {
        self.0.remove(&metric)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        Metric::ALL.iter().all(|m| self.0.contains_key(m))
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (Metric, f64)> + '_ {
        self.0.iter().map(|(m, v)| (*m, *v))
    }
}

impl From<&MetricValues> for PartialSubmission {
    fn from(values: &MetricValues) -> Self {
        let mut partial = PartialSubmission::new();
        for metric in Metric::ALL {
            partial.insert(metric, values.get(metric));
        }
        partial
    }
}

/// A complete set of the six metrics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricValues {
    pub sleep_hours: f64,
    pub work_intensity: f64,
    pub stress_level: f64,
    pub mood_score: f64,
    pub screen_time: f64,
    pub hydration: f64,
}

impl MetricValues {
    /// Returns `None` until every metric key is present.
    pub fn from_partial(partial: &PartialSubmission) -> Option<Self> {
        Some(Self {
            sleep_hours: partial.get(Metric::SleepHours)?,
            work_intensity: partial.get(Metric::WorkIntensity)?,
            stress_level: partial.get(Metric::StressLevel)?,
            mood_score: partial.get(Metric::MoodScore)?,
            screen_time: partial.get(Metric::ScreenTime)?,
            hydration: partial.get(Metric::Hydration)?,
        })
    }

    pub fn get(&self, metric: Metric) -> f64 {
        match metric {
            Metric::SleepHours => self.sleep_hours,
            Metric::WorkIntensity => self.work_intensity,
            Metric::StressLevel => self.stress_level,
            Metric::MoodScore => self.mood_score,
            Metric::ScreenTime => self.screen_time,
            Metric::Hydration => self.hydration,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DayClassification {
    AttackMode,
    RecoveryMode,
}

impl DayClassification {
    pub fn label(&self) -> &'static str {
        match self {
            DayClassification::AttackMode => "🚀 Attack Mode",
            DayClassification::RecoveryMode => "🔋 Recovery Mode",
        }
    }

    pub fn explanation(&self) -> &'static str {
        match self {
            DayClassification::AttackMode => "You're primed for deep work today.",
            DayClassification::RecoveryMode => "Focus on rest and recovery.",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Persona {
    NightOwl,
    BalancedAchiever,
    Workaholic,
}

impl Persona {
    pub fn label(&self) -> &'static str {
        match self {
            Persona::NightOwl => "The Night Owl 🦉",
            Persona::BalancedAchiever => "The Balanced Achiever 🧘",
            Persona::Workaholic => "The Workaholic 💼",
        }
    }
}

/// Output of the scoring service for one completed check-in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub daily_score: f64,
    pub day_classification: String,
    pub persona: String,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Submission {
    pub id: i64,
    pub user_id: i64,
    pub sleep_hours: f64,
    pub work_intensity: f64,
    pub stress_level: f64,
    pub mood_score: f64,
    pub screen_time: f64,
    pub hydration: f64,
    pub daily_score: f64,
    pub day_classification: String,
    pub persona: String,
    pub recommendations: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Submission {
    pub fn metrics(&self) -> MetricValues {
        MetricValues {
            sleep_hours: self.sleep_hours,
            work_intensity: self.work_intensity,
            stress_level: self.stress_level,
            mood_score: self.mood_score,
            screen_time: self.screen_time,
            hydration: self.hydration,
        }
    }

    pub fn metric(&self, metric: Metric) -> f64 {
        self.metrics().get(metric)
    }
}

#[derive(Debug, Clone)]
pub struct NewSubmission {
    pub user_id: i64,
    pub metrics: MetricValues,
    pub prediction: Prediction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TalkRequest {
    pub user_message: String,
    pub current_step: u8,
    #[serde(default)]
    pub temp_data: PartialSubmission,
    #[serde(default)]
    pub user_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TalkResponse {
    pub bot_message: String,
    pub next_step: u8,
    pub updated_data: PartialSubmission,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prediction: Option<Prediction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acknowledgment: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionList {
    pub total: i64,
    pub sessions: Vec<Submission>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> MetricValues {
        MetricValues {
            sleep_hours: 7.5,
            work_intensity: 6.0,
            stress_level: 3.0,
            mood_score: 8.0,
            screen_time: 4.5,
            hydration: 9.0,
        }
    }

    #[test]
    fn test_partial_completes_only_with_all_keys() {
        let mut partial = PartialSubmission::new();
        for metric in &Metric::ALL[..5] {
            partial.insert(*metric, 5.0);
        }
        assert!(!partial.is_complete());
        assert!(MetricValues::from_partial(&partial).is_none());

        partial.insert(Metric::Hydration, 8.0);
        assert!(partial.is_complete());
        assert!(MetricValues::from_partial(&partial).is_some());
    }

    #[test]
    fn test_metric_values_read_back_unchanged() {
        let values = sample();
        let partial = PartialSubmission::from(&values);
        let rebuilt = MetricValues::from_partial(&partial).unwrap();
        for metric in Metric::ALL {
            assert_eq!(rebuilt.get(metric), values.get(metric));
        }
    }

    #[test]
    fn test_partial_uses_metric_keys_on_the_wire() {
        let mut partial = PartialSubmission::new();
        partial.insert(Metric::ScreenTime, 3.5);
        partial.insert(Metric::SleepHours, 7.0);

        let json = serde_json::to_value(&partial).unwrap();
        assert_eq!(json["screen_time"], 3.5);
        assert_eq!(json["sleep_hours"], 7.0);

        let back: PartialSubmission = serde_json::from_value(json).unwrap();
        assert_eq!(back, partial);
    }

    #[test]
    fn test_talk_request_defaults() {
        let req: TalkRequest =
            serde_json::from_str(r#"{"user_message":"start","current_step":0}"#).unwrap();
        assert!(req.temp_data.is_empty());
        assert!(req.user_id.is_none());
    }
}
