use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Json, Router,
};
use tracing::{info, instrument, warn};

use super::{
    dto::{LoginForm, MeResponse, PublicUser, SignupForm},
    extractors::AuthStatus,
    middleware::require_authentication,
};
use crate::{
    error::{AppError, ModelError},
    sessions::Session,
    state::AppState,
    users::Role,
    web::{
        csrf::CsrfToken,
        page::PageContext,
        validator::{
            is_valid_email, max_chars, min_chars, normalize_email, not_blank, Validator, BLANK,
            MAX_FIELD_CHARS, TOO_LONG,
        },
        views,
    },
};

const INVALID_CREDENTIALS: &str = "Email or password is incorrect";

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/user/signup", get(signup_form).post(signup))
        .route("/user/login", get(login_form).post(login))
}

pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/user/logout", post(logout))
        .route("/user/account", get(account))
        .route_layer(middleware::from_fn(require_authentication))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/api/user/me", get(get_me))
}

async fn unprocessable(
    state: &AppState,
    session: &Session,
    csrf: &CsrfToken,
    auth: AuthStatus,
    render: impl FnOnce(&PageContext) -> Html<String>,
) -> Result<Response, AppError> {
    let ctx = PageContext::build(state, session, csrf, auth).await?;
    Ok((StatusCode::UNPROCESSABLE_ENTITY, render(&ctx)).into_response())
}

pub async fn signup_form(ctx: PageContext) -> Html<String> {
    views::signup(&ctx, &SignupForm::default(), &Validator::default())
}

#[instrument(skip_all)]
pub async fn signup(
    State(state): State<AppState>,
    session: Session,
    csrf: CsrfToken,
    auth: AuthStatus,
    Form(mut form): Form<SignupForm>,
) -> Result<Response, AppError> {
    form.email = normalize_email(&form.email);
    form.name = form.name.trim().to_string();

    let mut v = Validator::default();
    v.check_field(not_blank(&form.name), "name", BLANK);
    v.check_field(max_chars(&form.name, MAX_FIELD_CHARS), "name", TOO_LONG);
    v.check_field(not_blank(&form.email), "email", BLANK);
    v.check_field(max_chars(&form.email, MAX_FIELD_CHARS), "email", TOO_LONG);
    v.check_field(
        is_valid_email(&form.email),
        "email",
        "This field must be a valid email address",
    );
    v.check_field(not_blank(&form.password), "password", BLANK);
    v.check_field(
        min_chars(&form.password, 8),
        "password",
        "This field must be at least 8 characters long",
    );
    let role = form.role.parse::<Role>().ok();
    v.check_field(role.is_some(), "role", "Please select a valid role");

    let role = match role {
        Some(role) if v.valid() => role,
        _ => {
            warn!(fields = ?v.field_errors.keys().collect::<Vec<_>>(), "signup rejected");
            return unprocessable(&state, &session, &csrf, auth, |ctx| {
                views::signup(ctx, &form, &v)
            })
            .await;
        }
    };

    match state
        .users
        .insert(&form.name, &form.email, &form.password, role)
        .await
    {
        Ok(user_id) => info!(user_id, email = %form.email, %role, "user registered"),
        Err(ModelError::DuplicateEmail) => {
            warn!(email = %form.email, "email already registered");
            v.add_field_error("email", "Email address is already in use");
            return unprocessable(&state, &session, &csrf, auth, |ctx| {
                views::signup(ctx, &form, &v)
            })
            .await;
        }
        Err(e) => return Err(e.into()),
    }

    session
        .put_flash("Your signup was successful. Please log in.")
        .await;
    Ok(Redirect::to("/user/login").into_response())
}

pub async fn login_form(ctx: PageContext) -> Html<String> {
    views::login(&ctx, &LoginForm::default(), &Validator::default())
}

#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    csrf: CsrfToken,
    auth: AuthStatus,
    Form(mut form): Form<LoginForm>,
) -> Result<Response, AppError> {
    form.email = normalize_email(&form.email);

    let mut v = Validator::default();
    v.check_field(not_blank(&form.email), "email", BLANK);
    v.check_field(
        is_valid_email(&form.email),
        "email",
        "This field must be a valid email address",
    );
    v.check_field(not_blank(&form.password), "password", BLANK);
    if !v.valid() {
        return unprocessable(&state, &session, &csrf, auth, |ctx| {
            views::login(ctx, &form, &v)
        })
        .await;
    }

    let user_id = match state.users.authenticate(&form.email, &form.password).await {
        Ok(id) => id,
        Err(ModelError::InvalidCredentials) => {
            warn!(email = %form.email, "login rejected");
            v.add_non_field_error(INVALID_CREDENTIALS);
            return unprocessable(&state, &session, &csrf, auth, |ctx| {
                views::login(ctx, &form, &v)
            })
            .await;
        }
        Err(e) => return Err(e.into()),
    };

    // rotate before binding the user id
    session.renew().await;
    csrf.rotate().await?;
    session.put_user_id(user_id).await;

    let user = state.users.get(user_id).await?;
    info!(user_id, role = %user.role, "user logged in");
    Ok(Redirect::to(user.role.dashboard_path()).into_response())
}

#[instrument(skip_all)]
pub async fn logout(session: Session, csrf: CsrfToken) -> Result<Redirect, AppError> {
    session.renew().await;
    csrf.rotate().await?;
    session.remove_user_id().await;
    session
        .put_flash("You've been logged out successfully!")
        .await;
    info!("user logged out");
    Ok(Redirect::to("/"))
}

#[instrument(skip_all)]
pub async fn account(
    State(state): State<AppState>,
    session: Session,
    csrf: CsrfToken,
    auth: AuthStatus,
) -> Result<Response, AppError> {
    let Some(user_id) = session.user_id().await else {
        return Ok(Redirect::to("/user/login").into_response());
    };
    let user = match state.users.get(user_id).await {
        Ok(user) => user,
        Err(ModelError::NoRecord) => return Ok(Redirect::to("/user/login").into_response()),
        Err(e) => return Err(e.into()),
    };
    let ctx = PageContext::build(&state, &session, &csrf, auth).await?;
    Ok(views::account(&ctx, &user).into_response())
}

#[instrument(skip_all)]
pub async fn get_me(
    State(state): State<AppState>,
    auth: AuthStatus,
) -> Result<Json<MeResponse>, AppError> {
    let user = match auth.user_id() {
        Some(id) => match state.users.get(id).await {
            Ok(user) => Some(PublicUser::from(user)),
            Err(ModelError::NoRecord) => None,
            Err(e) => return Err(e.into()),
        },
        None => None,
    };
    Ok(Json(MeResponse {
        authenticated: user.is_some(),
        user,
    }))
}
