use crate::domain::models::{Metric, Submission};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

pub const RECENT_WINDOW_DAYS: i64 = 7;

pub const TREND_IMPROVING: &str = "↑ improving";
pub const TREND_DECLINING: &str = "↓ declining";
pub const TREND_STABLE: &str = "↔ stable";

/// Averages and trends over a user's full session history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAggregateStats {
    pub user_id: i64,
    pub total_sessions: i64,

    pub avg_sleep: f64,
    pub avg_work_intensity: f64,
    pub avg_stress: f64,
    pub avg_mood: f64,
    pub avg_screen_time: f64,
    pub avg_hydration: f64,
    pub avg_daily_score: f64,

    #[serde(default)]
    pub recent_avg_sleep: Option<f64>,
    #[serde(default)]
    pub recent_avg_work_intensity: Option<f64>,
    #[serde(default)]
    pub recent_avg_stress: Option<f64>,
    #[serde(default)]
    pub recent_avg_mood: Option<f64>,
    #[serde(default)]
    pub recent_avg_screen_time: Option<f64>,
    #[serde(default)]
    pub recent_avg_hydration: Option<f64>,
    #[serde(default)]
    pub recent_avg_daily_score: Option<f64>,

    #[serde(default)]
    pub sleep_trend: Option<String>,
    #[serde(default)]
    pub stress_trend: Option<String>,
    #[serde(default)]
    pub mood_trend: Option<String>,
    #[serde(default)]
    pub score_trend: Option<String>,
}

impl UserAggregateStats {
    pub fn empty(user_id: i64) -> Self {
        Self {
            user_id,
            total_sessions: 0,
            avg_sleep: 0.0,
            avg_work_intensity: 0.0,
            avg_stress: 0.0,
            avg_mood: 0.0,
            avg_screen_time: 0.0,
            avg_hydration: 0.0,
            avg_daily_score: 0.0,
            recent_avg_sleep: None,
            recent_avg_work_intensity: None,
            recent_avg_stress: None,
            recent_avg_mood: None,
            recent_avg_screen_time: None,
            recent_avg_hydration: None,
            recent_avg_daily_score: None,
            sleep_trend: None,
            stress_trend: None,
            mood_trend: None,
            score_trend: None,
        }
    }
}

/// Short-window averages used to personalise a check-in (1 decimal place).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistorySummary {
    pub avg_sleep: f64,
    pub avg_work: f64,
    pub avg_stress: f64,
    pub avg_mood: f64,
    pub avg_screen: f64,
    pub avg_hydration: f64,
    pub avg_score: f64,
    pub session_count: i64,
}

fn mean<'a>(sessions: impl IntoIterator<Item = &'a Submission>, f: impl Fn(&Submission) -> f64) -> Option<f64> {
    let mut sum = 0.0;
    let mut count = 0usize;
    for s in sessions {
        sum += f(s);
        count += 1;
    }
    (count > 0).then(|| sum / count as f64)
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

pub fn summarize(sessions: &[Submission]) -> Option<HistorySummary> {
    if sessions.is_empty() {
        return None;
    }
    let avg = |metric: Metric| mean(sessions, |s| s.metric(metric)).map(|v| round_to(v, 1)).unwrap_or(0.0);

    Some(HistorySummary {
        avg_sleep: avg(Metric::SleepHours),
        avg_work: avg(Metric::WorkIntensity),
        avg_stress: avg(Metric::StressLevel),
        avg_mood: avg(Metric::MoodScore),
        avg_screen: avg(Metric::ScreenTime),
        avg_hydration: avg(Metric::Hydration),
        avg_score: mean(sessions, |s| s.daily_score).map(|v| round_to(v, 1)).unwrap_or(0.0),
        session_count: sessions.len() as i64,
    })
}

/// Recent vs overall average, ±5 % band.
pub fn calculate_trend(recent_avg: Option<f64>, overall_avg: f64) -> &'static str {
    let Some(recent) = recent_avg else {
        return TREND_STABLE;
    };
    if overall_avg == 0.0 {
        return TREND_STABLE;
    }
    let diff_percent = (recent - overall_avg) / overall_avg * 100.0;
    if diff_percent > 5.0 {
        TREND_IMPROVING
    } else if diff_percent < -5.0 {
        TREND_DECLINING
    } else {
        TREND_STABLE
    }
}

/// Rising stress is bad news, so the arrows are relabelled.
pub fn stress_trend(recent_avg: Option<f64>, overall_avg: f64) -> &'static str {
    match calculate_trend(recent_avg, overall_avg) {
        TREND_IMPROVING => "↓ increasing",
        TREND_DECLINING => "↑ decreasing",
        _ => TREND_STABLE,
    }
}

pub fn aggregate_stats(user_id: i64, sessions: &[Submission], now: DateTime<Utc>) -> UserAggregateStats {
    if sessions.is_empty() {
        return UserAggregateStats::empty(user_id);
    }

    let cutoff = now - Duration::days(RECENT_WINDOW_DAYS);
    let recent: Vec<&Submission> = sessions.iter().filter(|s| s.created_at >= cutoff).collect();

    let overall = |f: fn(&Submission) -> f64| mean(sessions, f).unwrap_or(0.0);
    let recent_avg = |f: fn(&Submission) -> f64| mean(recent.iter().copied(), f);

    let avg_sleep = overall(|s| s.sleep_hours);
    let avg_stress = overall(|s| s.stress_level);
    let avg_mood = overall(|s| s.mood_score);
    let avg_score = overall(|s| s.daily_score);

    let recent_sleep = recent_avg(|s| s.sleep_hours);
    let recent_stress = recent_avg(|s| s.stress_level);
    let recent_mood = recent_avg(|s| s.mood_score);
    let recent_score = recent_avg(|s| s.daily_score);

    UserAggregateStats {
        user_id,
        total_sessions: sessions.len() as i64,
        avg_sleep: round_to(avg_sleep, 2),
        avg_work_intensity: round_to(overall(|s| s.work_intensity), 2),
        avg_stress: round_to(avg_stress, 2),
        avg_mood: round_to(avg_mood, 2),
        avg_screen_time: round_to(overall(|s| s.screen_time), 2),
        avg_hydration: round_to(overall(|s| s.hydration), 2),
        avg_daily_score: round_to(avg_score, 2),

        recent_avg_sleep: recent_sleep.map(|v| round_to(v, 2)),
        recent_avg_work_intensity: recent_avg(|s| s.work_intensity).map(|v| round_to(v, 2)),
        recent_avg_stress: recent_stress.map(|v| round_to(v, 2)),
        recent_avg_mood: recent_mood.map(|v| round_to(v, 2)),
        recent_avg_screen_time: recent_avg(|s| s.screen_time).map(|v| round_to(v, 2)),
        recent_avg_hydration: recent_avg(|s| s.hydration).map(|v| round_to(v, 2)),
        recent_avg_daily_score: recent_score.map(|v| round_to(v, 2)),

        sleep_trend: Some(calculate_trend(recent_sleep, avg_sleep).to_string()),
        stress_trend: Some(stress_trend(recent_stress, avg_stress).to_string()),
        mood_trend: Some(calculate_trend(recent_mood, avg_mood).to_string()),
        score_trend: Some(calculate_trend(recent_score, avg_score).to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(days_ago: i64, sleep: f64, stress: f64, score: f64, now: DateTime<Utc>) -> Submission {
        Submission {
            id: days_ago,
            user_id: 1,
            sleep_hours: sleep,
            work_intensity: 5.0,
            stress_level: stress,
            mood_score: 6.0,
            screen_time: 4.0,
            hydration: 7.0,
            daily_score: score,
            day_classification: "🔋 Recovery Mode".to_string(),
            persona: "The Balanced Achiever 🧘".to_string(),
            recommendations: vec![],
            created_at: now - Duration::days(days_ago),
        }
    }

    #[test]
    fn test_calculate_trend_bands() {
        assert_eq!(calculate_trend(Some(8.0), 7.0), TREND_IMPROVING);
        assert_eq!(calculate_trend(Some(6.0), 7.0), TREND_DECLINING);
        assert_eq!(calculate_trend(Some(7.2), 7.0), TREND_STABLE);
        assert_eq!(calculate_trend(None, 7.0), TREND_STABLE);
        assert_eq!(calculate_trend(Some(3.0), 0.0), TREND_STABLE);
    }

    #[test]
    fn test_stress_trend_is_inverted() {
        assert_eq!(stress_trend(Some(8.0), 5.0), "↓ increasing");
        assert_eq!(stress_trend(Some(3.0), 5.0), "↑ decreasing");
        assert_eq!(stress_trend(Some(5.0), 5.0), TREND_STABLE);
    }

    #[test]
    fn test_empty_history_gives_zeroed_stats() {
        let stats = aggregate_stats(4, &[], Utc::now());
        assert_eq!(stats, UserAggregateStats::empty(4));
        assert_eq!(stats.total_sessions, 0);
        assert!(stats.score_trend.is_none());
    }

    #[test]
    fn test_aggregate_counts_and_trends() {
        let now = Utc::now();
        let sessions = vec![
            session(1, 5.0, 8.0, 40.0, now),
            session(2, 5.0, 8.0, 40.0, now),
            session(20, 8.0, 4.0, 80.0, now),
            session(30, 8.0, 4.0, 80.0, now),
        ];
        let stats = aggregate_stats(1, &sessions, now);

        assert_eq!(stats.total_sessions, sessions.len() as i64);
        assert_eq!(stats.avg_sleep, 6.5);
        assert_eq!(stats.avg_daily_score, 60.0);
        assert_eq!(stats.recent_avg_sleep, Some(5.0));
        assert_eq!(stats.recent_avg_daily_score, Some(40.0));
        assert_eq!(stats.sleep_trend.as_deref(), Some(TREND_DECLINING));
        assert_eq!(stats.stress_trend.as_deref(), Some("↓ increasing"));
        assert_eq!(stats.score_trend.as_deref(), Some(TREND_DECLINING));
        assert_eq!(stats.mood_trend.as_deref(), Some(TREND_STABLE));
    }

    #[test]
    fn test_no_recent_sessions_is_stable() {
        let now = Utc::now();
        let sessions = vec![session(15, 7.0, 5.0, 70.0, now)];
        let stats = aggregate_stats(1, &sessions, now);
        assert!(stats.recent_avg_sleep.is_none());
        assert_eq!(stats.score_trend.as_deref(), Some(TREND_STABLE));
    }

    #[test]
    fn test_summarize_rounds_to_one_place() {
        let now = Utc::now();
        let sessions = vec![
            session(0, 7.0, 5.0, 70.0, now),
            session(1, 6.0, 6.0, 65.0, now),
            session(2, 6.0, 6.0, 60.0, now),
        ];
        let summary = summarize(&sessions).unwrap();
        assert_eq!(summary.avg_sleep, 6.3);
        assert_eq!(summary.avg_score, 65.0);
        assert_eq!(summary.session_count, 3);
        assert!(summarize(&[]).is_none());
    }
}
