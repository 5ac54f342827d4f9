///! Conversational copy for the check-in: prompts, acknowledgments,
///! recommendations and the final text report.
use crate::analytics::stats::HistorySummary;
use crate::domain::models::{DayClassification, Metric, MetricValues, Prediction};
use crate::services::scoring::PredictInput;
use rand::seq::SliceRandom;

pub const WELCOME_MESSAGE: &str = "Ready for your daily check-in. Let's start with sleep.";

pub fn prompt_for(step: u8) -> String {
    let variants: &[&str] = match step {
        1 => &[
            "How many hours did you sleep last night?",
            "Let's start with recovery. Sleep duration in hours?",
            "First metric: How much sleep did you get?",
        ],
        2 => &[
            "Rate your work/study intensity today (1-10).",
            "How demanding was your cognitive load today? (1-10)",
            "On a scale of 1-10, how intense was your output?",
        ],
        3 => &[
            "What's your stress level right now? (1-10)",
            "Rate your current stress on a 1-10 scale.",
            "Quantify your stress load (1-10).",
        ],
        4 => &[
            "How's your mood? (1-10)",
            "Rate your psychological state (1-10).",
            "Mood score for today (1-10)?",
        ],
        5 => &[
            "How many hours of screen time today?",
            "Digital exposure - hours on screens?",
            "Screen time in hours (0-24)?",
        ],
        6 => &[
            "Final metric: Glasses of water/hydration today?",
            "Last one - how many glasses of water?",
            "Hydration check: glasses consumed today (0-20)?",
        ],
        _ => &["Please provide the next value."],
    };
    pick(variants)
}

pub fn acknowledgment(metric: Metric, value: f64) -> String {
    let variants = match metric {
        Metric::SleepHours => vec![
            format!("Logged {value} hours of recovery time."),
            format!("Sleep data captured: {value}h."),
            format!("Recovery metric recorded: {value} hours."),
        ],
        Metric::WorkIntensity => vec![
            format!("Strain level {value}/10 recorded."),
            format!("Work intensity captured: {value}/10."),
            format!("Cognitive load registered at {value}."),
        ],
        Metric::StressLevel => vec![
            format!("Stress parameter: {value}/10."),
            format!("Load factor recorded: {value}."),
            format!("Anxiety index logged: {value}/10."),
        ],
        Metric::MoodScore => vec![
            format!("Psychological state: {value}/10."),
            format!("Affect score captured: {value}."),
            format!("Mood baseline: {value}/10."),
        ],
        Metric::ScreenTime => vec![
            format!("Screen time logged: {value} hours."),
            format!("Digital exposure recorded: {value}h."),
            format!("Display time tracked: {value} hours."),
        ],
        Metric::Hydration => vec![
            format!("Hydration level: {value} glasses."),
            format!("Water intake recorded: {value}."),
            format!("Fluid consumption logged: {value} glasses."),
        ],
    };
    variants
        .choose(&mut rand::thread_rng())
        .cloned()
        .unwrap_or_else(|| format!("Value {value} recorded."))
}

fn pick(variants: &[&str]) -> String {
    variants
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or("Please provide the next value.")
        .to_string()
}

/// History-aware tips for a completed check-in. Never empty.
pub fn generate_recommendations(m: &MetricValues, history: Option<&HistorySummary>) -> Vec<String> {
    let mut tips: Vec<String> = Vec::new();
    let mut tip = |text: &str| tips.push(text.to_string());

    let sleep = m.sleep_hours;
    let work = m.work_intensity;
    let stress = m.stress_level;
    let mood = m.mood_score;

    if sleep < 5.0 {
        tip("You're running on fumes. Try to get to bed 30 minutes earlier tonight.");
    } else if sleep < 6.0 {
        tip("A bit short on sleep. Consider a 20-minute power nap if you can.");
    } else if sleep > 9.0 {
        tip("Sleeping over 9 hours can sometimes mean poor sleep quality. How do you feel?");
    }

    if stress >= 8.0 {
        tip("Stress is high today. A quick walk or some deep breaths can help reset.");
        if history.is_some_and(|h| h.avg_stress >= 7.0) {
            tip("You've been stressed for a few days now. Worth checking what's driving it.");
        }
    } else if stress >= 6.0 {
        tip("Moderate stress detected. Take short breaks to stay sharp.");
    }

    if work >= 8.0 && mood < 5.0 {
        tip("Pushing hard but feeling low? That's a sign to step back and recharge.");
    }

    if mood <= 3.0 {
        tip("Tough day? Even 10 minutes outside or a chat with someone can help.");
    } else if mood < 5.0 {
        tip("Mood's a bit low. Small wins and fresh air work wonders.");
        if history.is_some_and(|h| h.avg_mood >= 7.0) {
            tip("This is lower than your usual. Something on your mind?");
        }
    }

    if sleep < 7.0 && work >= 7.0 {
        tip("Low sleep plus high output isn't sustainable. Prioritize rest tonight.");
    }

    if m.screen_time > 10.0 {
        tip("That's a lot of screen time. Give your eyes a break every 30 minutes.");
    } else if m.screen_time > 6.0 {
        tip("Screen time is adding up. Try the 20-20-20 rule: every 20 min, look 20 feet away for 20 sec.");
    }

    if m.hydration < 3.0 {
        tip("You're quite dehydrated. Keep a water bottle nearby as a reminder.");
    } else if m.hydration < 5.0 {
        tip("Could use more water. Aim for 8 glasses throughout the day.");
    } else if m.hydration >= 8.0 {
        tip("Great hydration today!");
    }

    if let Some(h) = history.filter(|h| h.session_count >= 3) {
        if h.avg_score >= 75.0 {
            tips.push(format!(
                "You've been consistent lately. 7-day average is {:.0}/100. Keep it up!",
                h.avg_score
            ));
        } else if h.avg_score >= 60.0 {
            tips.push("Solid week so far. Small improvements add up.".to_string());
        }
    }

    if sleep >= 7.0 && stress <= 4.0 && mood >= 7.0 {
        tips.push("You're in a good spot today. Make the most of it!".to_string());
    }

    if tips.is_empty() {
        tips.push("Looking balanced today. Keep doing what you're doing.".to_string());
    }

    tips
}

/// Directives for the four-metric `/api/predict` endpoint.
pub fn directives(input: &PredictInput) -> Vec<String> {
    let mut tips = Vec::new();

    if input.sleep_hours < 6.0 {
        tips.push("CRITICAL: Recovery deficit detected. Circadian realignment protocol recommended.");
    } else if input.sleep_hours > 9.0 {
        tips.push("NOTE: Hypersomnia indicators present. Evaluate sleep quality vs quantity.");
    }
    if input.stress_level >= 8.0 {
        tips.push("ALERT: Cortisol load elevated. Parasympathetic activation required (Box Breathing, NSDR).");
    }
    if input.work_intensity >= 8.0 && input.mood_score < 5.0 {
        tips.push("WARNING: High output/Low affect state. Burnout trajectory detected.");
    }
    if input.mood_score < 5.0 {
        tips.push("OPTIMIZATION: Dopaminergic baseline low. Recommend sunlight exposure or rewarding micro-tasks.");
    }
    if input.sleep_hours < 7.0 && input.work_intensity >= 7.0 {
        tips.push("FAILSAFE: Cognitive endurance compromised. Prioritize recovery tonight.");
    }
    if tips.is_empty() {
        tips.push("STATUS: All metrics within optimal bands. Maintain current routine.");
    }

    tips.into_iter().map(String::from).collect()
}

/// Compare today's value to the 7-day average (±10 %).
pub fn trend_indicator(current: f64, average: f64, lower_is_better: bool) -> &'static str {
    if average == 0.0 {
        return "";
    }
    let diff_percent = (current - average) / average * 100.0;
    match (lower_is_better, diff_percent) {
        (true, d) if d < -10.0 => "↓ better than your average",
        (true, d) if d > 10.0 => "↑ higher than your average",
        (false, d) if d > 10.0 => "↑ above your average",
        (false, d) if d < -10.0 => "↓ below your average",
        _ => "↔ consistent",
    }
}

pub fn trend_analysis(m: &MetricValues, history: &HistorySummary) -> String {
    if history.session_count == 0 {
        return String::new();
    }

    let mut lines = vec!["\n📈 TREND ANALYSIS (vs 7-day avg):".to_string()];

    let sleep_trend = trend_indicator(m.sleep_hours, history.avg_sleep, false);
    if !sleep_trend.is_empty() {
        lines.push(format!("   • Sleep: {}h {}", m.sleep_hours, sleep_trend));
    }
    let stress_trend = trend_indicator(m.stress_level, history.avg_stress, true);
    if !stress_trend.is_empty() {
        lines.push(format!("   • Stress: {}/10 {}", m.stress_level, stress_trend));
    }
    let mood_trend = trend_indicator(m.mood_score, history.avg_mood, false);
    if !mood_trend.is_empty() {
        lines.push(format!("   • Mood: {}/10 {}", m.mood_score, mood_trend));
    }
    lines.push(format!("   • Sessions this week: {}", history.session_count));

    lines.join("\n")
}

pub fn score_comparison(score: f64, history: Option<&HistorySummary>) -> String {
    let Some(avg) = history.map(|h| h.avg_score).filter(|avg| *avg != 0.0) else {
        return String::new();
    };
    let diff = score - avg;
    if diff > 0.0 {
        format!("   ↑ {:.1} points above your 7-day average", diff)
    } else if diff < 0.0 {
        format!("   ↓ {:.1} points below your 7-day average", diff.abs())
    } else {
        "   ↔ Consistent with your average".to_string()
    }
}

pub fn render_report(
    prediction: &Prediction,
    classification: DayClassification,
    comparison: &str,
    trend_text: &str,
) -> String {
    let rule = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";
    let recs = prediction
        .recommendations
        .iter()
        .map(|rec| format!("  • {rec}"))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "{rule}\n  HABITOS PERFORMANCE REPORT\n{rule}\n\n\
         📊 PERFORMANCE INDEX: {:.1}/100\n{comparison}\n\n\
         ⚡ CLASSIFICATION: {}\n   {}\n\n\
         🧬 PERSONA: {}\n{trend_text}\n\n\
         📋 PERSONALIZED DIRECTIVES:\n{recs}\n\n\
         {rule}\nSession complete. Say 'start' for new analysis.",
        prediction.daily_score,
        prediction.day_classification,
        classification.explanation(),
        prediction.persona,
    )
}
