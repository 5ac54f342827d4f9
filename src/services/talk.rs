///! Server side of the conversational check-in. Each request carries the
///! client's step and accumulated answers; the response says where to go next.
use crate::analytics::stats::HistorySummary;
use crate::domain::checkin::{extract_number, step_definition, CheckInError, STEPS};
use crate::domain::models::{MetricValues, PartialSubmission, Prediction, TalkRequest, TalkResponse};
use crate::services::coach;
use crate::services::scoring::{self, clamp_metrics};

#[derive(Debug, Clone)]
pub struct TalkOutcome {
    pub response: TalkResponse,
    /// Set on the request that completes the check-in.
    pub completed: Option<(MetricValues, Prediction)>,
}

impl TalkOutcome {
    fn reply(bot_message: String, next_step: u8, data: PartialSubmission) -> Self {
        Self {
            response: TalkResponse {
                bot_message,
                next_step,
                updated_data: data,
                prediction: None,
                acknowledgment: None,
            },
            completed: None,
        }
    }

    fn with_acknowledgment(mut self, acknowledgment: String) -> Self {
        self.response.acknowledgment = Some(acknowledgment);
        self
    }
}

pub fn respond(req: &TalkRequest, history: Option<&HistorySummary>) -> Result<TalkOutcome, CheckInError> {
    let step = req.current_step;
    let message = req.user_message.trim().to_lowercase();
    let mut data = req.temp_data.clone();

    if step == 0 {
        return Ok(TalkOutcome::reply(coach::WELCOME_MESSAGE.to_string(), 1, data));
    }

    let definition = step_definition(step).ok_or(CheckInError::InvalidStep(step))?;

    let Some(value) = extract_number(&message) else {
        return Ok(TalkOutcome::reply(definition.reprompt.to_string(), step, data));
    };

    if step == 1 {
        if !definition.in_range(value) {
            return Ok(TalkOutcome::reply(
                "Please enter hours between 0-24.".to_string(),
                step,
                data,
            ));
        }
        data.insert(definition.metric, value);
        return Ok(TalkOutcome::reply(coach::prompt_for(2), 2, data)
            .with_acknowledgment(format!("✓ {value} hours logged")));
    }

    let value = definition.clamp(value);
    data.insert(definition.metric, value);
    let ack = coach::acknowledgment(definition.metric, value);

    if step < 6 {
        let bot_message = format!("{ack}\n\n{}", coach::prompt_for(step + 1));
        return Ok(TalkOutcome::reply(bot_message, step + 1, data).with_acknowledgment(ack));
    }

    let Some(raw) = MetricValues::from_partial(&data) else {
        // Earlier answers were lost client-side; resume at the first gap.
        let missing = STEPS
            .iter()
            .find(|def| data.get(def.metric).is_none())
            .map(|def| def.step)
            .unwrap_or(1);
        tracing::debug!("Check-in incomplete at final step, resuming at step {}", missing);
        return Ok(TalkOutcome::reply(coach::prompt_for(missing), missing, data));
    };

    let metrics = clamp_metrics(&raw);
    let prediction = scoring::predict(&metrics, history);
    let classification = scoring::classify_day(prediction.daily_score, &metrics);
    let trend_text = history
        .map(|h| coach::trend_analysis(&metrics, h))
        .unwrap_or_default();
    let comparison = coach::score_comparison(prediction.daily_score, history);
    let report = coach::render_report(&prediction, classification, &comparison, &trend_text);

    Ok(TalkOutcome {
        response: TalkResponse {
            bot_message: report,
            next_step: 0,
            updated_data: PartialSubmission::new(),
            prediction: Some(prediction.clone()),
            acknowledgment: Some(ack),
        },
        completed: Some((metrics, prediction)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::Metric;

    fn request(step: u8, message: &str, data: PartialSubmission) -> TalkRequest {
        TalkRequest {
            user_message: message.to_string(),
            current_step: step,
            temp_data: data,
            user_id: None,
        }
    }

    fn first_five() -> PartialSubmission {
        let mut data = PartialSubmission::new();
        data.insert(Metric::SleepHours, 8.0);
        data.insert(Metric::WorkIntensity, 5.0);
        data.insert(Metric::StressLevel, 1.0);
        data.insert(Metric::MoodScore, 10.0);
        data.insert(Metric::ScreenTime, 2.0);
        data
    }

    #[test]
    fn test_welcome_moves_to_first_question() {
        let outcome = respond(&request(0, "hi", PartialSubmission::new()), None).unwrap();
        assert_eq!(outcome.response.next_step, 1);
        assert_eq!(outcome.response.bot_message, coach::WELCOME_MESSAGE);
        assert!(outcome.completed.is_none());
    }

    #[test]
    fn test_missing_number_reprompts_same_step() {
        let outcome = respond(&request(4, "pretty good", PartialSubmission::new()), None).unwrap();
        assert_eq!(outcome.response.next_step, 4);
        assert_eq!(outcome.response.bot_message, "I need a number (1-10) for mood.");
    }

    #[test]
    fn test_overlong_number_is_reprompted() {
        let answer = format!("1{}", "0".repeat(400));
        let outcome = respond(&request(5, &answer, PartialSubmission::new()), None).unwrap();
        assert_eq!(outcome.response.next_step, 5);
        assert!(outcome.response.updated_data.is_empty());
        assert_eq!(outcome.response.bot_message, "I need a number (0-24) for screen time hours.");
    }

    #[test]
    fn test_sleep_out_of_range_is_reprompted() {
        let outcome = respond(&request(1, "30 hours", PartialSubmission::new()), None).unwrap();
        assert_eq!(outcome.response.next_step, 1);
        assert!(outcome.response.updated_data.is_empty());
    }

    #[test]
    fn test_sleep_answer_is_acknowledged() {
        let outcome = respond(&request(1, "I slept 7.5 hours", PartialSubmission::new()), None).unwrap();
        assert_eq!(outcome.response.next_step, 2);
        assert_eq!(outcome.response.updated_data.get(Metric::SleepHours), Some(7.5));
        assert_eq!(outcome.response.acknowledgment.as_deref(), Some("✓ 7.5 hours logged"));
    }

    #[test]
    fn test_scale_answers_are_clamped() {
        let outcome = respond(&request(3, "15", PartialSubmission::new()), None).unwrap();
        assert_eq!(outcome.response.next_step, 4);
        assert_eq!(outcome.response.updated_data.get(Metric::StressLevel), Some(10.0));
    }

    #[test]
    fn test_final_step_produces_prediction() {
        let outcome = respond(&request(6, "8 glasses", first_five()), None).unwrap();
        assert_eq!(outcome.response.next_step, 0);
        assert!(outcome.response.updated_data.is_empty());

        let prediction = outcome.response.prediction.clone().unwrap();
        assert_eq!(prediction.daily_score, 98.0);
        assert!(outcome.response.bot_message.contains("HABITOS PERFORMANCE REPORT"));

        let (metrics, stored) = outcome.completed.unwrap();
        assert_eq!(metrics.hydration, 8.0);
        assert_eq!(stored, prediction);
    }

    #[test]
    fn test_final_step_with_gap_resumes() {
        let mut data = first_five();
        data.remove(Metric::StressLevel);
        let outcome = respond(&request(6, "8", data), None).unwrap();
        assert_eq!(outcome.response.next_step, 3);
        assert!(outcome.completed.is_none());
        assert_eq!(outcome.response.updated_data.get(Metric::Hydration), Some(8.0));
    }

    #[test]
    fn test_history_adds_trend_section() {
        let history = HistorySummary {
            avg_sleep: 6.0,
            avg_work: 5.0,
            avg_stress: 5.0,
            avg_mood: 6.0,
            avg_screen: 4.0,
            avg_hydration: 6.0,
            avg_score: 60.0,
            session_count: 4,
        };
        let outcome = respond(&request(6, "8", first_five()), Some(&history)).unwrap();
        let report = outcome.response.bot_message;
        assert!(report.contains("TREND ANALYSIS"));
        assert!(report.contains("Sessions this week: 4"));
        assert!(report.contains("38.0 points above your 7-day average"));
    }

    #[test]
    fn test_invalid_step_is_rejected() {
        let err = respond(&request(9, "5", PartialSubmission::new()), None).unwrap_err();
        assert_eq!(err, CheckInError::InvalidStep(9));
    }
}
