use crate::analytics::insights::InsightReport;
use crate::analytics::stats::UserAggregateStats;
use crate::config::ClientConfig;
use crate::domain::checkin::{CheckInError, CheckInStep};
use crate::domain::models::{
    Metric, PartialSubmission, Prediction, SessionList, TalkRequest, TalkResponse, User,
};
use crate::services::scoring::{ScoringRequest, ScoringService};
use anyhow::anyhow;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::time::Duration;

/// HTTP client for the HabitOS API. Every request is bounded by the
/// configured timeout.
#[derive(Debug, Clone)]
pub struct HabitClient {
    base_url: String,
    http: reqwest::Client,
}

impl HabitClient {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(5)))
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn from_config(config: &ClientConfig) -> anyhow::Result<Self> {
        Self::new(&config.api_url, config.timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<R: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<R, CheckInError> {
        let resp = request.send().await.map_err(unavailable)?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(CheckInError::ServiceUnavailable(format!("API returned {status}: {body}")));
        }
        resp.json::<R>().await.map_err(unavailable)
    }

    pub async fn talk(&self, request: &TalkRequest) -> Result<TalkResponse, CheckInError> {
        self.send(self.http.post(self.url("/api/talk")).json(request)).await
    }

    pub async fn create_user(&self, username: &str) -> Result<User, CheckInError> {
        self.send(self.http.post(self.url("/api/user")).json(&json!({ "username": username })))
            .await
    }

    /// Looks up a stored identity. A 404 means the server no longer knows it.
    pub async fn get_user(&self, user_id: i64) -> Result<User, CheckInError> {
        let resp = self
            .http
            .get(self.url(&format!("/api/user/{user_id}")))
            .send()
            .await
            .map_err(unavailable)?;
        match resp.status() {
            StatusCode::NOT_FOUND => Err(CheckInError::IdentityNotFound(user_id)),
            status if status.is_success() => resp.json::<User>().await.map_err(unavailable),
            status => Err(CheckInError::ServiceUnavailable(format!("API returned {status}"))),
        }
    }

    pub async fn history(&self, user_id: i64, limit: i64, offset: i64) -> Result<SessionList, CheckInError> {
        let request = self
            .http
            .get(self.url(&format!("/api/user/{user_id}/history")))
            .query(&[("limit", limit), ("offset", offset)]);
        self.send(request).await
    }

    /// Aggregate stats, or `None` when the server cannot provide them.
    pub async fn stats(&self, user_id: i64) -> Option<UserAggregateStats> {
        let request = self.http.get(self.url(&format!("/api/user/{user_id}/stats")));
        match self.send(request).await {
            Ok(stats) => Some(stats),
            Err(e) => {
                tracing::warn!("Stats unavailable for user {}: {}", user_id, e);
                None
            }
        }
    }

    pub async fn insights(&self, user_id: i64) -> Result<InsightReport, CheckInError> {
        self.send(self.http.get(self.url(&format!("/api/user/{user_id}/insights"))))
            .await
    }
}

fn unavailable(err: reqwest::Error) -> CheckInError {
    if err.is_timeout() {
        CheckInError::ServiceUnavailable("request timed out".to_string())
    } else {
        CheckInError::ServiceUnavailable(err.to_string())
    }
}

/// Final-step talk request carrying a complete check-in.
pub fn final_talk_request(request: &ScoringRequest) -> TalkRequest {
    TalkRequest {
        user_message: request.metrics.hydration.to_string(),
        current_step: CheckInStep::LAST.value(),
        temp_data: PartialSubmission::from(&request.metrics),
        user_id: request.user_id,
    }
}

/// Scores check-ins through the server's `/api/talk` endpoint, which also
/// persists the session when a user is signed in.
#[derive(Debug, Clone)]
pub struct HttpScoring {
    client: HabitClient,
}

impl HttpScoring {
    pub fn new(client: HabitClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ScoringService for HttpScoring {
    async fn score(&self, request: &ScoringRequest) -> anyhow::Result<Prediction> {
        let response = self.client.talk(&final_talk_request(request)).await?;
        response.prediction.ok_or_else(|| {
            let missing: Vec<&str> = Metric::ALL
                .iter()
                .filter(|m| response.updated_data.get(**m).is_none())
                .map(|m| m.key())
                .collect();
            anyhow!("server returned no prediction (step {}, missing {:?})", response.next_step, missing)
        })
    }
}
