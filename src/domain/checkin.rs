///! Six-step daily check-in: step table, pure transition function and the
///! engine that submits a completed record to the scoring service.
use crate::domain::models::{Metric, MetricValues, PartialSubmission, Prediction};
use crate::services::scoring::{ScoringRequest, ScoringService};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepDefinition {
    pub step: u8,
    pub metric: Metric,
    pub question: &'static str,
    pub min: f64,
    pub max: f64,
    pub unit: &'static str,
    pub quick_options: &'static [f64],
    pub reprompt: &'static str,
}

impl StepDefinition {
    pub fn in_range(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }
}

pub const STEPS: [StepDefinition; 6] = [
    StepDefinition {
        step: 1,
        metric: Metric::SleepHours,
        question: "How many hours did you sleep last night?",
        min: 0.0,
        max: 24.0,
        unit: "hours",
        quick_options: &[5.0, 6.0, 7.0, 8.0, 9.0],
        reprompt: "How many hours did you sleep?",
    },
    StepDefinition {
        step: 2,
        metric: Metric::WorkIntensity,
        question: "Rate your work/study intensity today (1-10).",
        min: 1.0,
        max: 10.0,
        unit: "/10",
        quick_options: &[2.0, 4.0, 6.0, 8.0, 10.0],
        reprompt: "I need a number (1-10) for work intensity.",
    },
    StepDefinition {
        step: 3,
        metric: Metric::StressLevel,
        question: "What's your stress level right now? (1-10)",
        min: 1.0,
        max: 10.0,
        unit: "/10",
        quick_options: &[2.0, 4.0, 6.0, 8.0, 10.0],
        reprompt: "I need a number (1-10) for stress level.",
    },
    StepDefinition {
        step: 4,
        metric: Metric::MoodScore,
        question: "How's your mood? (1-10)",
        min: 1.0,
        max: 10.0,
        unit: "/10",
        quick_options: &[2.0, 4.0, 6.0, 8.0, 10.0],
        reprompt: "I need a number (1-10) for mood.",
    },
    StepDefinition {
        step: 5,
        metric: Metric::ScreenTime,
        question: "How many hours of screen time today?",
        min: 0.0,
        max: 24.0,
        unit: "hours",
        quick_options: &[2.0, 4.0, 6.0, 8.0, 12.0],
        reprompt: "I need a number (0-24) for screen time hours.",
    },
    StepDefinition {
        step: 6,
        metric: Metric::Hydration,
        question: "Final metric: Glasses of water/hydration today?",
        min: 0.0,
        max: 20.0,
        unit: "glasses",
        quick_options: &[2.0, 4.0, 6.0, 8.0, 10.0],
        reprompt: "I need a number (0-20) for glasses of water.",
    },
];

pub fn step_definition(step: u8) -> Option<&'static StepDefinition> {
    STEPS.iter().find(|def| def.step == step)
}

pub fn definition_for(metric: Metric) -> &'static StepDefinition {
    match metric {
        Metric::SleepHours => &STEPS[0],
        Metric::WorkIntensity => &STEPS[1],
        Metric::StressLevel => &STEPS[2],
        Metric::MoodScore => &STEPS[3],
        Metric::ScreenTime => &STEPS[4],
        Metric::Hydration => &STEPS[5],
    }
}

/// Position in the questionnaire: 0 = not started, 1..=6 = collecting the
/// matching metric, 7 = all six collected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CheckInStep(u8);

impl CheckInStep {
    pub const START: CheckInStep = CheckInStep(0);
    pub const LAST: CheckInStep = CheckInStep(6);
    pub const COMPLETE: CheckInStep = CheckInStep(7);

    pub fn new(value: u8) -> Option<Self> {
        (value <= Self::COMPLETE.0).then_some(CheckInStep(value))
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    pub fn definition(&self) -> Option<&'static StepDefinition> {
        step_definition(self.0)
    }

    fn next(self) -> Self {
        CheckInStep((self.0 + 1).min(Self::COMPLETE.0))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Answer {
    Text(String),
    /// Value picked from the step's fixed option list.
    QuickSelect(f64),
}

impl Answer {
    pub fn text(raw: impl Into<String>) -> Self {
        Answer::Text(raw.into())
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CheckInError {
    #[error("no number found in answer for {}", .0.key())]
    Validation(Metric),
    #[error("check-in step {0} does not accept answers")]
    InvalidStep(u8),
    #[error("scoring service unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("identity {0} not found")]
    IdentityNotFound(i64),
}

/// Extract the first decimal number from free text ("I slept 7.5 hours" -> 7.5).
pub fn extract_number(text: &str) -> Option<f64> {
    let bytes = text.as_bytes();
    let mut start = 0;
    while start < bytes.len() {
        let mut pos = start;
        if matches!(bytes[pos], b'+' | b'-') {
            pos += 1;
        }
        let digits_from = pos;
        while pos < bytes.len() && bytes[pos].is_ascii_digit() {
            pos += 1;
        }
        let has_integer = pos > digits_from;
        let mut end = pos;
        if pos < bytes.len() && bytes[pos] == b'.' {
            let mut frac = pos + 1;
            while frac < bytes.len() && bytes[frac].is_ascii_digit() {
                frac += 1;
            }
            if frac > pos + 1 {
                end = frac;
            }
        }
        if has_integer || end > pos {
            // Overlong digit runs parse to infinity, which JSON cannot carry.
            return text[start..end].parse().ok().filter(|v: &f64| v.is_finite());
        }
        start += 1;
    }
    None
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub next_step: CheckInStep,
    pub partial: PartialSubmission,
}

impl Transition {
    pub fn ready_for_scoring(&self) -> bool {
        self.next_step == CheckInStep::COMPLETE
    }
}

/// Pure step function. Out-of-range values are accepted as given; the
/// scoring side clamps them.
pub fn transition(
    step: CheckInStep,
    partial: &PartialSubmission,
    answer: &Answer,
) -> Result<Transition, CheckInError> {
    if step == CheckInStep::START {
        return Ok(Transition {
            next_step: step.next(),
            partial: partial.clone(),
        });
    }

    let definition = step
        .definition()
        .ok_or(CheckInError::InvalidStep(step.value()))?;

    let value = match answer {
        Answer::QuickSelect(value) => Some(*value),
        Answer::Text(raw) => extract_number(raw.trim()),
    }
    .filter(|v| v.is_finite())
    .ok_or(CheckInError::Validation(definition.metric))?;

    let mut updated = partial.clone();
    updated.insert(definition.metric, value);

    Ok(Transition {
        next_step: step.next(),
        partial: updated,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct Advance {
    pub next_step: CheckInStep,
    pub updated_partial: PartialSubmission,
    pub prediction: Option<Prediction>,
}

/// Drives one user's check-in. `advance` takes `&mut self`, so a second
/// answer cannot be processed while a scoring request is still in flight.
pub struct CheckInEngine<S> {
    scoring: S,
    user_id: Option<i64>,
    step: CheckInStep,
    partial: PartialSubmission,
    last_prediction: Option<Prediction>,
}

impl<S: ScoringService> CheckInEngine<S> {
    pub fn new(scoring: S) -> Self {
        Self {
            scoring,
            user_id: None,
            step: CheckInStep::START,
            partial: PartialSubmission::new(),
            last_prediction: None,
        }
    }

    pub fn set_user(&mut self, user_id: Option<i64>) {
        self.user_id = user_id;
    }

    pub fn user_id(&self) -> Option<i64> {
        self.user_id
    }

    pub fn step(&self) -> CheckInStep {
        self.step
    }

    pub fn partial(&self) -> &PartialSubmission {
        &self.partial
    }

    pub fn last_prediction(&self) -> Option<&Prediction> {
        self.last_prediction.as_ref()
    }

    pub fn is_showing_results(&self) -> bool {
        self.step == CheckInStep::COMPLETE
    }

    /// Abandons any in-progress answers.
    pub fn start_new(&mut self) {
        self.step = CheckInStep::START;
        self.partial.clear();
        self.last_prediction = None;
    }

    pub async fn advance(&mut self, answer: Answer) -> Result<Advance, CheckInError> {
        let transition = transition(self.step, &self.partial, &answer)?;

        if !transition.ready_for_scoring() {
            self.step = transition.next_step;
            self.partial = transition.partial;
            return Ok(Advance {
                next_step: self.step,
                updated_partial: self.partial.clone(),
                prediction: None,
            });
        }

        // Keep the last answer so a failed submission can be retried as-is.
        self.partial = transition.partial;
        self.submit().await
    }

    /// Re-send a complete record after a `ServiceUnavailable` failure.
    pub async fn retry(&mut self) -> Result<Advance, CheckInError> {
        if self.step != CheckInStep::LAST || !self.partial.is_complete() {
            return Err(CheckInError::InvalidStep(self.step.value()));
        }
        self.submit().await
    }

    async fn submit(&mut self) -> Result<Advance, CheckInError> {
        let metrics = MetricValues::from_partial(&self.partial)
            .ok_or(CheckInError::InvalidStep(self.step.value()))?;
        let request = ScoringRequest {
            metrics,
            user_id: self.user_id,
        };

        match self.scoring.score(&request).await {
            Ok(prediction) => {
                tracing::debug!(
                    score = prediction.daily_score,
                    "check-in scored for user {:?}",
                    self.user_id
                );
                self.step = CheckInStep::COMPLETE;
                self.partial.clear();
                self.last_prediction = Some(prediction.clone());
                Ok(Advance {
                    next_step: self.step,
                    updated_partial: self.partial.clone(),
                    prediction: Some(prediction),
                })
            }
            Err(err) => {
                tracing::warn!("Scoring request failed: {:#}", err);
                self.step = CheckInStep::LAST;
                let reason = match err.downcast::<CheckInError>() {
                    Ok(CheckInError::ServiceUnavailable(reason)) => reason,
                    Ok(other) => other.to_string(),
                    Err(err) => err.to_string(),
                };
                Err(CheckInError::ServiceUnavailable(reason))
            }
        }
    }
}
