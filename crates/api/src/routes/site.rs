use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use portfolio_site_core::document::OwnerId;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::state::AppState;

/// Public routes. No token required.
pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/site", get(public_site))
}

#[derive(Debug, Deserialize)]
struct SiteQuery {
    owner: Option<String>,
}

/// The configuration the public page renders. Always answers; the `source`
/// field says whether it came from the store, the cache or the defaults.
async fn public_site(
    State(state): State<AppState>,
    Query(query): Query<SiteQuery>,
) -> Json<Value> {
    let requested = query.owner.filter(|uid| !uid.is_empty()).map(OwnerId::from);
    let resolution = state.public_engine().load_public_config(requested.as_ref()).await;
    Json(json!({
        "config": resolution.config,
        "source": resolution.source,
    }))
}
