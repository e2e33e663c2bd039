use axum::response::Html;

use crate::web::{page::PageContext, views};

pub async fn setup(ctx: PageContext) -> Html<String> {
    views::moot_setup(&ctx)
}

pub async fn session(ctx: PageContext) -> Html<String> {
    views::moot_session(&ctx)
}
