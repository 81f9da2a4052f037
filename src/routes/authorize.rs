use axum::extract::State;
use axum::Json;

use crate::app::AppState;
use crate::models::{AuthorizationGrant, AuthorizationRequest, AuthorizationResponse};

#[utoipa::path(
    post,
    path = "/authorize",
    tag = "Authorization",
    request_body = AuthorizationRequest,
    responses(
        (status = 200, description = "Complete grant on success; empty object on any denial", body = AuthorizationGrant)
    )
)]
pub async fn authorize(
    State(state): State<AppState>,
    Json(payload): Json<AuthorizationRequest>,
) -> Json<AuthorizationResponse> {
    Json(state.authorizer.authorize(&payload).await)
}
