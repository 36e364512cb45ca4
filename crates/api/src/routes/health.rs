use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};

use crate::error::ApiResult;
use crate::state::AppState;

/// Health check routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/v1/ping", get(ping))
}

/// Full health check. Verifies database connectivity on the postgres backend.
async fn health_check(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let database = match state.pool() {
        Some(pool) => {
            sqlx::query("SELECT 1").execute(pool).await?;
            "connected"
        }
        None => "disabled",
    };

    Ok(Json(json!({
        "status": "ok",
        "store": state.config().store_backend.as_str(),
        "database": database,
    })))
}

/// Lightweight ping with no store access.
async fn ping() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use crate::routes::test_support::{get, TestApp};

    #[tokio::test]
    async fn health_reports_memory_backend() {
        let app = TestApp::new();
        let (status, body) = app.send(get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["store"], "memory");
        assert_eq!(body["database"], "disabled");
    }

    #[tokio::test]
    async fn ping() {
        let (status, body) = TestApp::new().send(get("/v1/ping")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }
}
