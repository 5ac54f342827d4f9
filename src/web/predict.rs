use crate::domain::models::Prediction;
use crate::services::scoring::{direct_prediction, PredictInput};
use crate::state::SharedState;
use axum::{http::StatusCode, routing::post, Json, Router};

pub fn router(state: SharedState) -> Router {
    Router::new().route("/predict", post(predict)).with_state(state)
}

async fn predict(Json(input): Json<PredictInput>) -> Result<Json<Prediction>, StatusCode> {
    input.validate().map_err(|field| {
        tracing::debug!("Rejected prediction input: {} out of range", field);
        StatusCode::UNPROCESSABLE_ENTITY
    })?;
    Ok(Json(direct_prediction(&input)))
}

#[cfg(test)]
mod tests {
    use crate::web::routes;
    use crate::web::test_support::{lazy_state, post_json, send};
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_predict_scores_four_metrics() {
        let request = post_json(
            "/api/predict",
            json!({ "sleep_hours": 9.0, "work_intensity": 10.0, "stress_level": 1.0, "mood_score": 10.0 }),
        );
        let (status, body) = send(routes(lazy_state()), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["daily_score"], 98.0);
    }

    #[tokio::test]
    async fn test_predict_rejects_out_of_range() {
        let request = post_json(
            "/api/predict",
            json!({ "sleep_hours": 30.0, "work_intensity": 5.0, "stress_level": 5.0, "mood_score": 5.0 }),
        );
        let (status, _) = send(routes(lazy_state()), request).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }
}
