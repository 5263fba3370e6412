//! Bearer-token guard for mutating routes.
//!
//! Token validation is owned by the external Auth service; this module only
//! extracts the `Authorization: Bearer` header and forwards it. Missing or
//! rejected tokens surface as 401, an unreachable Auth service as 502.

use actix_web::HttpRequest;
use actix_web::http::header;

use crate::domain::user_service::map_gateway_error;
use crate::domain::{AuthUser, Error};
use crate::inbound::http::state::HttpState;

fn bearer_token(req: &HttpRequest) -> Result<&str, Error> {
    let header_value = req
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or_else(|| Error::unauthorized("missing Authorization header"))?
        .to_str()
        .map_err(|_| Error::unauthorized("malformed Authorization header"))?;

    header_value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| Error::unauthorized("expected a Bearer token"))
}

/// Validate the request's bearer token through the Auth gateway.
pub async fn require_user(req: &HttpRequest, state: &HttpState) -> Result<AuthUser, Error> {
    let token = bearer_token(req)?;
    state
        .auth
        .validate_token(token)
        .await
        .map_err(map_gateway_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;
    use crate::domain::ErrorCode;
    use rstest::rstest;

    #[rstest]
    #[case(None)]
    #[case(Some("Basic dXNlcjpwYXNz"))]
    #[case(Some("Bearer "))]
    #[case(Some("Bearer    "))]
    fn rejects_missing_or_malformed_headers(#[case] value: Option<&str>) {
        let mut request = TestRequest::default();
        if let Some(value) = value {
            request = request.insert_header((header::AUTHORIZATION, value));
        }
        let req = request.to_http_request();
        let err = bearer_token(&req).unwrap_err();
        assert_eq!(err.code, ErrorCode::Unauthorized);
    }

    #[test]
    fn extracts_the_token() {
        let req = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Bearer abc123"))
            .to_http_request();
        assert_eq!(bearer_token(&req).expect("token present"), "abc123");
    }

    #[actix_web::test]
    async fn valid_token_resolves_a_user() {
        let state = HttpState::fixture();
        let req = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Bearer any-token"))
            .to_http_request();
        let user = require_user(&req, &state).await.expect("token accepted");
        assert_eq!(user.id, 1);
    }
}
