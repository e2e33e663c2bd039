use axum::{
    http::StatusCode,
    response::{Html, Response},
    routing::get,
    Router,
};

use crate::error::client_error;
use crate::state::AppState;
use crate::web::{page::PageContext, views};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/about", get(about))
        .fallback(not_found)
}

pub async fn home(ctx: PageContext) -> Html<String> {
    views::home(&ctx)
}

pub async fn about(ctx: PageContext) -> Html<String> {
    views::about(&ctx)
}

pub async fn not_found() -> Response {
    client_error(StatusCode::NOT_FOUND)
}
