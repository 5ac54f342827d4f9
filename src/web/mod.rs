pub mod predict;
pub mod talk;
pub mod user;

use crate::state::SharedState;
use axum::{routing::get, Json, Router};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
    service: &'static str,
    version: &'static str,
}

async fn health() -> Json<Health> {
    Json(Health {
        status: "online",
        service: "HabitOS API",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub fn routes(state: SharedState) -> Router {
    let api = Router::new()
        .merge(talk::router(state.clone()))
        .merge(predict::router(state.clone()))
        .merge(user::router(state));

    Router::new().route("/", get(health)).nest("/api", api)
}
