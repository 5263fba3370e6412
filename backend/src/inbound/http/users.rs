//! User proxy endpoint.
//!
//! Users live in the external Auth service; this handler forwards the lookup
//! and reshapes the answer. An unreachable collaborator surfaces as 502.

use actix_web::{HttpResponse, get, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{AuthUser, Error};
use crate::inbound::http::error::ApiResult;
use crate::inbound::http::state::HttpState;

/// User representation returned by the proxy endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "Alice Silva")]
    pub nome: String,
    #[schema(example = "alice@example.com")]
    pub email: String,
    pub is_admin: bool,
}

impl From<AuthUser> for UserResponse {
    fn from(user: AuthUser) -> Self {
        Self {
            id: user.id,
            nome: user.name,
            email: user.email,
            is_admin: user.is_admin,
        }
    }
}

/// Resolve a user through the Auth service.
#[utoipa::path(
    get,
    path = "/usuarios/{id}",
    tags = ["usuarios"],
    params(("id" = i32, Path, description = "User identifier")),
    responses(
        (status = 200, description = "The user as the Auth service reports it", body = UserResponse),
        (status = 404, description = "The Auth service knows no such user", body = Error),
        (status = 502, description = "The Auth service is unreachable", body = Error)
    )
)]
#[get("/usuarios/{id}")]
pub async fn get_user(
    state: web::Data<HttpState>,
    path: web::Path<i32>,
) -> ApiResult<HttpResponse> {
    let user = state.users.get_user(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}
