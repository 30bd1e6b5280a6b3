use crate::error::{ApiError, ErrorResponse};
use crate::state::ApiState;
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use keeper_domain::constants::IDENTITY_TAG;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub(crate) const REGISTERED: &str = "Registration complete! Reconnect and sign in.";
pub(crate) const SIGNED_IN: &str = "You have signed in successfully!";

/// Account credentials.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Plain confirmation message.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

#[utoipa::path(
    post,
    path = "/api/v1/register",
    request_body = Credentials,
    responses(
        (status = CREATED, description = "Account created", body = MessageResponse),
        (status = BAD_REQUEST, description = "Empty username or password", body = ErrorResponse),
        (status = CONFLICT, description = "Username already taken", body = ErrorResponse),
        (status = INTERNAL_SERVER_ERROR, description = "Storage failure", body = ErrorResponse),
    ),
    tag = IDENTITY_TAG,
)]
pub(crate) async fn register_handler(
    State(state): State<ApiState>,
    Json(body): Json<Credentials>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    state.identity.register(&body.username, &body.password).await?;
    Ok((StatusCode::CREATED, Json(MessageResponse { message: REGISTERED.to_owned() })))
}

#[utoipa::path(
    post,
    path = "/api/v1/login",
    request_body = Credentials,
    responses(
        (status = OK, description = "Credentials accepted", body = MessageResponse),
        (status = BAD_REQUEST, description = "Empty username or password", body = ErrorResponse),
        (status = UNAUTHORIZED, description = "Wrong credentials", body = ErrorResponse),
        (status = INTERNAL_SERVER_ERROR, description = "Storage failure", body = ErrorResponse),
    ),
    tag = IDENTITY_TAG,
)]
pub(crate) async fn login_handler(
    State(state): State<ApiState>,
    Json(body): Json<Credentials>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.identity.login(&body.username, &body.password).await?;
    Ok(Json(MessageResponse { message: SIGNED_IN.to_owned() }))
}
