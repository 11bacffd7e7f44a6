use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{instrument, warn};

use crate::{
    error::AuthError,
    state::AppState,
    user::{
        dto::{CreateUserRequest, PublicUser, TokenRequest, TokenResponse},
        extractors::AuthUser,
        services::AuthService,
    },
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/user/create/", post(create_user))
        .route("/user/token/", post(create_token))
        .route("/user/me/", get(get_me))
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AuthError> {
    payload.map(|Json(p)| p).map_err(|rejection| {
        warn!(error = %rejection, "malformed request body");
        AuthError::Validation(rejection.body_text())
    })
}

fn required(field: &'static str, value: Option<String>) -> Result<String, AuthError> {
    value.ok_or_else(|| AuthError::Validation(format!("{field} is required")))
}

#[instrument(skip(auth, payload))]
pub async fn create_user(
    State(auth): State<AuthService>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PublicUser>), AuthError> {
    let payload = body(payload)?;
    let email = required("email", payload.email)?;
    let password = required("password", payload.password)?;
    let name = required("name", payload.name)?;

    let user = auth.register(&email, &password, &name).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[instrument(skip(auth, payload))]
pub async fn create_token(
    State(auth): State<AuthService>,
    payload: Result<Json<TokenRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>, AuthError> {
    let payload = body(payload)?;
    let email = required("email", payload.email)?;
    let password = required("password", payload.password)?;

    let token = auth.issue_token(&email, &password).await?;
    Ok(Json(TokenResponse { token }))
}

#[instrument(skip_all)]
pub async fn get_me(AuthUser(user): AuthUser) -> Json<PublicUser> {
    Json(PublicUser::from(user))
}
