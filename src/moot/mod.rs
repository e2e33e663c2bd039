use axum::{middleware, routing::get, Router};

use crate::auth::middleware::{moot_court_access, require_authentication};
use crate::state::AppState;

pub mod handlers;

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/moot/setup", get(handlers::setup))
        .route("/moot/session", get(handlers::session))
        .route_layer(middleware::from_fn_with_state(state, moot_court_access))
        .route_layer(middleware::from_fn(require_authentication))
}
