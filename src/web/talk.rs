use crate::analytics::stats::{summarize, HistorySummary, RECENT_WINDOW_DAYS};
use crate::db;
use crate::domain::checkin::CheckInStep;
use crate::domain::models::{NewSubmission, TalkRequest, TalkResponse};
use crate::services::talk as conversation;
use crate::state::SharedState;
use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use chrono::{Duration, Utc};

pub fn router(state: SharedState) -> Router {
    Router::new().route("/talk", post(talk)).with_state(state)
}

async fn talk(
    State(state): State<SharedState>,
    Json(req): Json<TalkRequest>,
) -> Result<Json<TalkResponse>, StatusCode> {
    if req.current_step > CheckInStep::LAST.value() {
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }

    // History only shapes the final report.
    let history = match (req.current_step, req.user_id) {
        (step, Some(user_id)) if step == CheckInStep::LAST.value() => recent_history(&state, user_id).await,
        _ => None,
    };

    let outcome = conversation::respond(&req, history.as_ref()).map_err(|e| {
        tracing::warn!("Rejected talk request: {}", e);
        StatusCode::UNPROCESSABLE_ENTITY
    })?;

    if let (Some(user_id), Some((metrics, prediction))) = (req.user_id, outcome.completed) {
        let new = NewSubmission {
            user_id,
            metrics,
            prediction,
        };
        match db::insert_session(&state.pool, &new).await {
            Ok(session) => tracing::info!(
                "Saved session {} for user {} (score {:.1})",
                session.id,
                user_id,
                session.daily_score
            ),
            Err(e) => tracing::error!("Failed to save session for user {}: {}", user_id, e),
        }
    }

    Ok(Json(outcome.response))
}

/// Last week's averages, or `None` when unavailable. Storage errors degrade
/// to an unpersonalised report.
async fn recent_history(state: &SharedState, user_id: i64) -> Option<HistorySummary> {
    let since = Utc::now() - Duration::days(RECENT_WINDOW_DAYS);
    match db::sessions_since(&state.pool, user_id, since).await {
        Ok(sessions) => summarize(&sessions),
        Err(e) => {
            tracing::warn!("Could not load history for user {}: {}", user_id, e);
            None
        }
    }
}
