use axum::{extract::State, response::Html};
use tracing::instrument;

use crate::error::AppError;
use crate::state::AppState;
use crate::users::Role;
use crate::web::{page::PageContext, views};

const RECENT_STUDENTS: i64 = 20;

pub async fn student_dashboard(ctx: PageContext) -> Html<String> {
    views::student_dashboard(&ctx)
}

pub async fn lawyer_dashboard(ctx: PageContext) -> Html<String> {
    views::lawyer_dashboard(&ctx)
}

#[instrument(skip_all)]
pub async fn recruiter_dashboard(
    State(state): State<AppState>,
    ctx: PageContext,
) -> Result<Html<String>, AppError> {
    let students = state
        .users
        .list_by_role(Role::Student, RECENT_STUDENTS, 0)
        .await?;
    Ok(views::recruiter_dashboard(&ctx, &students))
}
