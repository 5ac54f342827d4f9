use crate::analytics::stats::UserAggregateStats;
use serde::{Deserialize, Serialize};

/// Fewer sessions than this are not enough to say anything useful.
pub const MIN_SESSIONS_FOR_INSIGHTS: i64 = 3;
pub const CONSISTENT_TRACKING_SESSIONS: i64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Warning,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub icon: String,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    pub suggested_action: String,
}

impl Insight {
    fn new(icon: &str, severity: Severity, title: &str, description: String, suggested_action: &str) -> Self {
        Self {
            icon: icon.to_string(),
            severity,
            title: title.to_string(),
            description,
            suggested_action: suggested_action.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightReport {
    pub user_id: i64,
    pub total_sessions: i64,
    pub insights: Vec<Insight>,
}

impl InsightReport {
    pub fn from_stats(stats: &UserAggregateStats) -> Self {
        Self {
            user_id: stats.user_id,
            total_sessions: stats.total_sessions,
            insights: derive_insights(&InsightInput::from(stats), stats.total_sessions),
        }
    }
}

/// Averages the rules look at. `None` means "unknown" and never fires a rule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InsightInput {
    pub avg_sleep: Option<f64>,
    pub avg_stress: Option<f64>,
    pub avg_hydration: Option<f64>,
    pub avg_screen_time: Option<f64>,
    pub avg_mood: Option<f64>,
    pub score_trend: Option<String>,
}

impl From<&UserAggregateStats> for InsightInput {
    fn from(stats: &UserAggregateStats) -> Self {
        Self {
            avg_sleep: Some(stats.avg_sleep),
            avg_stress: Some(stats.avg_stress),
            avg_hydration: Some(stats.avg_hydration),
            avg_screen_time: Some(stats.avg_screen_time),
            avg_mood: Some(stats.avg_mood),
            score_trend: stats.score_trend.clone(),
        }
    }
}

fn is_upward(trend: &str) -> bool {
    trend.contains('↑') || trend.contains("improving")
}

fn is_downward(trend: &str) -> bool {
    trend.contains('↓') || trend.contains("declining")
}

/// Evaluate every rule in a fixed order; several may fire at once.
pub fn derive_insights(stats: &InsightInput, total_sessions: i64) -> Vec<Insight> {
    let mut insights = Vec::new();
    if total_sessions < MIN_SESSIONS_FOR_INSIGHTS {
        return insights;
    }

    match stats.avg_sleep {
        Some(sleep) if sleep < 6.0 => insights.push(Insight::new(
            "😴",
            Severity::Warning,
            "Sleep Deficit",
            format!("You're averaging {sleep:.1} hours of sleep, below the 7-9 hour range."),
            "Move your bedtime 30 minutes earlier this week.",
        )),
        Some(sleep) if sleep >= 7.0 => insights.push(Insight::new(
            "🌙",
            Severity::Success,
            "Great Sleep Habits",
            format!("You're averaging {sleep:.1} hours of sleep. Recovery is on track."),
            "Keep a consistent wake-up time, weekends included.",
        )),
        _ => {}
    }

    match stats.avg_stress {
        Some(stress) if stress >= 7.0 => insights.push(Insight::new(
            "🚨",
            Severity::Critical,
            "High Stress Alert",
            format!("Your average stress is {stress:.1}/10. Sustained load like this leads to burnout."),
            "Schedule two short breathing breaks every day.",
        )),
        Some(stress) if stress <= 4.0 => insights.push(Insight::new(
            "🧘",
            Severity::Success,
            "Stress Under Control",
            format!("Your average stress is {stress:.1}/10."),
            "Note what's working and keep it in your routine.",
        )),
        _ => {}
    }

    if let Some(hydration) = stats.avg_hydration.filter(|h| *h < 6.0) {
        insights.push(Insight::new(
            "💧",
            Severity::Warning,
            "Hydration Needs Attention",
            format!("You're averaging {hydration:.1} glasses of water a day."),
            "Keep a bottle on your desk and aim for 8 glasses.",
        ));
    }

    if let Some(screen) = stats.avg_screen_time.filter(|s| *s > 8.0) {
        insights.push(Insight::new(
            "📱",
            Severity::Warning,
            "High Screen Time",
            format!("You're averaging {screen:.1} hours on screens a day."),
            "Try the 20-20-20 rule and a screen-free hour before bed.",
        ));
    }

    if let Some(trend) = stats.score_trend.as_deref() {
        if is_upward(trend) {
            insights.push(Insight::new(
                "📈",
                Severity::Success,
                "Performance Improving",
                "Your recent scores are above your overall average.".to_string(),
                "Keep the habits that got you here.",
            ));
        } else if is_downward(trend) {
            insights.push(Insight::new(
                "📉",
                Severity::Warning,
                "Performance Declining",
                "Your recent scores are below your overall average.".to_string(),
                "Look at sleep and stress first; they move the score the most.",
            ));
        }
    }

    if let Some(mood) = stats.avg_mood.filter(|m| *m <= 4.0) {
        insights.push(Insight::new(
            "🌤️",
            Severity::Warning,
            "Mood Optimization Needed",
            format!("Your average mood is {mood:.1}/10."),
            "Plan one small rewarding activity and get outside daily.",
        ));
    }

    if total_sessions >= CONSISTENT_TRACKING_SESSIONS {
        insights.push(Insight::new(
            "🏆",
            Severity::Success,
            "Consistent Tracking",
            format!("You've logged {total_sessions} check-ins."),
            "Keep checking in daily to sharpen your trends.",
        ));
    }

    insights
}
