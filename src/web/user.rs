use crate::analytics::insights::InsightReport;
use crate::analytics::stats::{aggregate_stats, UserAggregateStats};
use crate::db;
use crate::domain::models::{SessionList, User};
use crate::state::SharedState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;

pub const USERNAME_MIN_LEN: usize = 2;
pub const USERNAME_MAX_LEN: usize = 100;
pub const HISTORY_DEFAULT_LIMIT: i64 = 10;
pub const HISTORY_MAX_LIMIT: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct CreateUser {
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl HistoryQuery {
    fn bounds(&self) -> Result<(i64, i64), StatusCode> {
        let limit = self.limit.unwrap_or(HISTORY_DEFAULT_LIMIT);
        let offset = self.offset.unwrap_or(0);
        if !(1..=HISTORY_MAX_LIMIT).contains(&limit) || offset < 0 {
            return Err(StatusCode::UNPROCESSABLE_ENTITY);
        }
        Ok((limit, offset))
    }
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/user", post(create_user))
        .route("/user/:id", get(get_user))
        .route("/user/:id/history", get(get_history))
        .route("/user/:id/stats", get(get_stats))
        .route("/user/:id/insights", get(get_insights))
        .with_state(state)
}

async fn create_user(
    State(state): State<SharedState>,
    Json(payload): Json<CreateUser>,
) -> Result<Json<User>, StatusCode> {
    let length = payload.username.chars().count();
    if !(USERNAME_MIN_LEN..=USERNAME_MAX_LEN).contains(&length) {
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }

    let user = db::create_or_get_user(&state.pool, &payload.username)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create user {}: {}", payload.username, e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
    Ok(Json(user))
}

async fn require_user(state: &SharedState, user_id: i64) -> Result<User, StatusCode> {
    db::find_user_by_id(&state.pool, user_id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to load user {}: {}", user_id, e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .ok_or(StatusCode::NOT_FOUND)
}

async fn get_user(
    State(state): State<SharedState>,
    Path(user_id): Path<i64>,
) -> Result<Json<User>, StatusCode> {
    require_user(&state, user_id).await.map(Json)
}

async fn get_history(
    State(state): State<SharedState>,
    Path(user_id): Path<i64>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<SessionList>, StatusCode> {
    let (limit, offset) = query.bounds()?;
    require_user(&state, user_id).await?;

    let total = db::count_sessions(&state.pool, user_id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    let sessions = db::list_sessions(&state.pool, user_id, limit, offset)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok(Json(SessionList { total, sessions }))
}

async fn load_stats(state: &SharedState, user_id: i64) -> Result<UserAggregateStats, StatusCode> {
    require_user(state, user_id).await?;
    let sessions = db::all_sessions(&state.pool, user_id).await.map_err(|e| {
        tracing::error!("Failed to load sessions for user {}: {}", user_id, e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    Ok(aggregate_stats(user_id, &sessions, Utc::now()))
}

async fn get_stats(
    State(state): State<SharedState>,
    Path(user_id): Path<i64>,
) -> Result<Json<UserAggregateStats>, StatusCode> {
    load_stats(&state, user_id).await.map(Json)
}

async fn get_insights(
    State(state): State<SharedState>,
    Path(user_id): Path<i64>,
) -> Result<Json<InsightReport>, StatusCode> {
    let stats = load_stats(&state, user_id).await?;
    Ok(Json(InsightReport::from_stats(&stats)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::routes;
    use crate::web::test_support::{get, lazy_state, post_json, send};
    use serde_json::json;

    #[test]
    fn test_history_bounds() {
        let query = HistoryQuery { limit: None, offset: None };
        assert_eq!(query.bounds(), Ok((10, 0)));

        let query = HistoryQuery { limit: Some(100), offset: Some(20) };
        assert_eq!(query.bounds(), Ok((100, 20)));

        for (limit, offset) in [(Some(0), None), (Some(101), None), (None, Some(-1))] {
            let query = HistoryQuery { limit, offset };
            assert_eq!(query.bounds(), Err(StatusCode::UNPROCESSABLE_ENTITY));
        }
    }

    #[tokio::test]
    async fn test_short_username_is_rejected_before_storage() {
        let (status, _) = send(routes(lazy_state()), post_json("/api/user", json!({ "username": "a" }))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let long = "x".repeat(101);
        let (status, _) = send(routes(lazy_state()), post_json("/api/user", json!({ "username": long }))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_bad_history_limit_is_rejected_before_storage() {
        let (status, _) = send(routes(lazy_state()), get("/api/user/1/history?limit=500")).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_non_numeric_user_id_is_rejected() {
        let (status, _) = send(routes(lazy_state()), get("/api/user/abc/stats")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
