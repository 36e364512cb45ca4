pub mod health;
pub mod me;
pub mod site;

use axum::Router;

use crate::state::AppState;

/// Assemble the full router with all route groups.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(health::routes())
        .merge(site::routes())
        .merge(me::routes())
        .with_state(state)
}
