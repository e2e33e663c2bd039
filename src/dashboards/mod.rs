use axum::{middleware, routing::get, Router};

use crate::auth::middleware::{lawyer_only, recruiter_only, require_authentication, student_only};
use crate::state::AppState;

pub mod handlers;

/// Each dashboard is gated on its role; the authentication check runs first.
pub fn router(state: AppState) -> Router<AppState> {
    let student = Router::new()
        .route("/student/dashboard", get(handlers::student_dashboard))
        .route_layer(middleware::from_fn_with_state(state.clone(), student_only));
    let lawyer = Router::new()
        .route("/lawyer/dashboard", get(handlers::lawyer_dashboard))
        .route_layer(middleware::from_fn_with_state(state.clone(), lawyer_only));
    let recruiter = Router::new()
        .route("/recruiter/dashboard", get(handlers::recruiter_dashboard))
        .route_layer(middleware::from_fn_with_state(state, recruiter_only));

    Router::new()
        .merge(student)
        .merge(lawyer)
        .merge(recruiter)
        .route_layer(middleware::from_fn(require_authentication))
}
