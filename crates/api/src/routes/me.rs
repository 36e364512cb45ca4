//! Owner-only routes. Every handler runs on an engine signed in as the token's
//! subject, attached to that owner's documents.

use axum::extract::{Path, State};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use portfolio_site_core::assets::check_document_size;
use portfolio_site_core::document::SiteConfig;
use portfolio_site_core::mutation::SectionData;
use portfolio_site_core::{ConfigSyncEngine, SaveOutcome, SyncError};
use serde_json::{json, Value};

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Owner routes. All require a bearer token.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/me/profile", get(profile))
        .route("/v1/me/config", get(config).put(save_config))
        .route("/v1/me/provision", post(provision))
        .route("/v1/me/sections/{section}", patch(update_section))
        .route("/v1/me/publish", post(publish))
}

async fn session(state: &AppState, user: AuthUser) -> ApiResult<ConfigSyncEngine> {
    let AuthUser(identity) = user;
    let uid = identity.uid.clone();
    let engine = state.owner_engine(identity);
    engine.load_user_data(&uid).await?;
    Ok(engine)
}

fn saved(outcome: SaveOutcome) -> Json<Value> {
    Json(json!({
        "config": outcome.config,
        "cacheWarning": outcome.cache_warning.map(|err| err.to_string()),
    }))
}

async fn profile(State(state): State<AppState>, user: AuthUser) -> ApiResult<Json<Value>> {
    let engine = session(&state, user).await?;
    let profile = engine
        .profile()
        .ok_or_else(|| ApiError::NotFound("profile not provisioned".to_string()))?;
    Ok(Json(json!({
        "profile": profile,
        "canEdit": engine.can_edit(),
    })))
}

async fn config(State(state): State<AppState>, user: AuthUser) -> ApiResult<Json<Value>> {
    let engine = session(&state, user).await?;
    Ok(Json(json!({
        "config": engine.config(),
        "canEdit": engine.can_edit(),
    })))
}

async fn provision(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
) -> ApiResult<Json<Value>> {
    let engine = state.owner_engine(identity.clone());
    let outcome = engine.ensure_user_doc(&identity).await?;
    Ok(Json(json!({
        "profileCreated": outcome.profile_created,
        "configCreated": outcome.config_created,
    })))
}

async fn update_section(
    State(state): State<AppState>,
    user: AuthUser,
    Path(section): Path<String>,
    Json(data): Json<Value>,
) -> ApiResult<Json<Value>> {
    let engine = session(&state, user).await?;
    let data = SectionData::try_from(data).map_err(SyncError::from)?;
    let config = engine.merge_section(&section, data)?;
    check_document_size(&config)?;
    let outcome = engine.save_config(config).await?;
    Ok(saved(outcome))
}

async fn save_config(
    State(state): State<AppState>,
    user: AuthUser,
    Json(draft): Json<Value>,
) -> ApiResult<Json<Value>> {
    let draft = SiteConfig::from_draft(draft).map_err(SyncError::from)?;
    check_document_size(&draft)?;
    let engine = session(&state, user).await?;
    let outcome = engine.save_config(draft).await?;
    Ok(saved(outcome))
}

async fn publish(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
) -> ApiResult<Json<Value>> {
    let outcome = state.owner_engine(identity).publish_site().await?;
    Ok(Json(json!({
        "ownerUid": outcome.pointer.owner_uid,
        "updatedAt": outcome.pointer.updated_at,
        "mirrorWritten": outcome.mirror_error.is_none(),
    })))
}
