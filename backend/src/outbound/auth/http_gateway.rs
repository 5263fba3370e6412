//! Reqwest-backed Auth service gateway.
//!
//! This adapter owns transport details only: request construction, the
//! timeout and retry policy, HTTP status mapping, and JSON decoding into
//! domain users. User identity itself stays with the Auth service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use url::Url;
use tracing::debug;

use crate::domain::AuthUser;
use crate::domain::ports::{AuthGateway, AuthGatewayError};

use super::dto::AuthUserDto;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Auth gateway performing HTTP GET requests against one base URL.
///
/// Transient failures (timeout or connection-level) are retried once; HTTP
/// error statuses are answers from the collaborator and never retried.
pub struct AuthHttpGateway {
    client: Client,
    base_url: Url,
}

impl AuthHttpGateway {
    /// Build a gateway with the default 5 second request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(base_url: Url) -> Result<Self, reqwest::Error> {
        Self::with_timeout(base_url, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Build a gateway with an explicit request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn with_timeout(base_url: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, AuthGatewayError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| AuthGatewayError::transport("auth base URL cannot carry a path"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_user_payload(
        &self,
        url: Url,
        bearer: Option<&str>,
    ) -> Result<AuthUser, AuthGatewayError> {
        let mut last_error = None;
        for attempt in 0..2 {
            let mut request = self.client.get(url.clone());
            if let Some(token) = bearer {
                request = request.bearer_auth(token);
            }

            match request.send().await {
                Ok(response) => return decode_response(response).await,
                Err(error) => {
                    let mapped = map_transport_error(error);
                    if !is_retryable(&mapped) {
                        return Err(mapped);
                    }
                    debug!(attempt, error = %mapped, "auth request failed, retrying");
                    last_error = Some(mapped);
                }
            }
        }
        // Loop always stores an error before falling through.
        Err(last_error
            .unwrap_or_else(|| AuthGatewayError::transport("auth request failed")))
    }
}

#[async_trait]
impl AuthGateway for AuthHttpGateway {
    async fn fetch_user(&self, id: i32) -> Result<AuthUser, AuthGatewayError> {
        let url = self.endpoint(&["usuarios", &id.to_string()])?;
        self.get_user_payload(url, None).await
    }

    async fn validate_token(&self, token: &str) -> Result<AuthUser, AuthGatewayError> {
        let url = self.endpoint(&["usuarios", "me"])?;
        self.get_user_payload(url, Some(token)).await
    }
}

async fn decode_response(response: reqwest::Response) -> Result<AuthUser, AuthGatewayError> {
    let status = response.status();
    let body = response.bytes().await.map_err(map_transport_error)?;
    if !status.is_success() {
        return Err(map_status_error(status, body.as_ref()));
    }

    let dto: AuthUserDto = serde_json::from_slice(body.as_ref())
        .map_err(|error| AuthGatewayError::decode(format!("invalid auth payload: {error}")))?;
    Ok(AuthUser::from(dto))
}

fn is_retryable(error: &AuthGatewayError) -> bool {
    matches!(
        error,
        AuthGatewayError::Timeout { .. } | AuthGatewayError::Transport { .. }
    )
}

fn map_transport_error(error: reqwest::Error) -> AuthGatewayError {
    if error.is_timeout() {
        AuthGatewayError::timeout(error.to_string())
    } else {
        AuthGatewayError::transport(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> AuthGatewayError {
    let body_preview = body_preview(body);
    let message = if body_preview.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        format!("status {}: {}", status.as_u16(), body_preview)
    };

    match status {
        StatusCode::NOT_FOUND => AuthGatewayError::NotFound,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            AuthGatewayError::unauthorized(message)
        }
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            AuthGatewayError::timeout(message)
        }
        _ => AuthGatewayError::upstream(status.as_u16(), message),
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    async fn answer_with(socket: &mut TcpStream, response: &str) {
        let mut buf = [0u8; 1024];
        let _ = socket.read(&mut buf).await;
        socket
            .write_all(response.as_bytes())
            .await
            .expect("write response");
    }

    fn user_response() -> String {
        let body = r#"{"id":1,"nome":"Alice Silva","email":"alice@example.com","is_admin":false}"#;
        format!(
            "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        )
    }

    #[tokio::test]
    async fn dropped_connection_is_retried_once_and_succeeds() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            // First connection closes before any response reaches the client.
            let (socket, _) = listener.accept().await.expect("first accept");
            drop(socket);
            let (mut socket, _) = listener.accept().await.expect("second accept");
            answer_with(&mut socket, &user_response()).await;
        });

        let base = Url::parse(&format!("http://{addr}")).expect("valid URL");
        let gateway = AuthHttpGateway::new(base).expect("client builds");
        let user = gateway.fetch_user(1).await.expect("retry succeeds");
        assert_eq!((user.id, user.name.as_str()), (1, "Alice Silva"));
    }

    #[tokio::test]
    async fn http_error_statuses_are_answered_without_retry() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let requests = Arc::new(AtomicUsize::new(0));
        let served = Arc::clone(&requests);
        tokio::spawn(async move {
            loop {
                let (mut socket, _) = listener.accept().await.expect("accept");
                served.fetch_add(1, Ordering::SeqCst);
                answer_with(
                    &mut socket,
                    "HTTP/1.1 500 Internal Server Error\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
                )
                .await;
            }
        });

        let base = Url::parse(&format!("http://{addr}")).expect("valid URL");
        let gateway = AuthHttpGateway::new(base).expect("client builds");
        let err = gateway.fetch_user(1).await.unwrap_err();
        assert_eq!(err, AuthGatewayError::upstream(500, "status 500"));
        assert_eq!(requests.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn second_transient_failure_surfaces_the_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            for _ in 0..2 {
                let (socket, _) = listener.accept().await.expect("accept");
                drop(socket);
            }
        });

        let base = Url::parse(&format!("http://{addr}")).expect("valid URL");
        let gateway = AuthHttpGateway::new(base).expect("client builds");
        let err = gateway.fetch_user(1).await.unwrap_err();
        assert!(matches!(
            err,
            AuthGatewayError::Transport { .. } | AuthGatewayError::Timeout { .. }
        ));
    }

    #[rstest]
    #[case(StatusCode::NOT_FOUND, AuthGatewayError::NotFound)]
    #[case(
        StatusCode::UNAUTHORIZED,
        AuthGatewayError::unauthorized("status 401")
    )]
    #[case(StatusCode::FORBIDDEN, AuthGatewayError::unauthorized("status 403"))]
    #[case(StatusCode::GATEWAY_TIMEOUT, AuthGatewayError::timeout("status 504"))]
    #[case(
        StatusCode::INTERNAL_SERVER_ERROR,
        AuthGatewayError::upstream(500, "status 500")
    )]
    fn statuses_map_to_gateway_errors(
        #[case] status: StatusCode,
        #[case] expected: AuthGatewayError,
    ) {
        assert_eq!(map_status_error(status, b""), expected);
    }

    #[test]
    fn status_message_includes_body_preview() {
        let err = map_status_error(StatusCode::BAD_GATEWAY, b"upstream  exploded");
        assert_eq!(
            err,
            AuthGatewayError::upstream(502, "status 502: upstream exploded")
        );
    }

    #[test]
    fn long_bodies_are_truncated() {
        let body = "x".repeat(400);
        let AuthGatewayError::Upstream { message, .. } =
            map_status_error(StatusCode::BAD_GATEWAY, body.as_bytes())
        else {
            panic!("expected upstream error");
        };
        assert!(message.ends_with("..."));
        assert!(message.len() < 200);
    }

    #[rstest]
    #[case(AuthGatewayError::timeout("deadline"), true)]
    #[case(AuthGatewayError::transport("refused"), true)]
    #[case(AuthGatewayError::NotFound, false)]
    #[case(AuthGatewayError::upstream(500, "boom"), false)]
    fn only_transient_errors_retry(#[case] error: AuthGatewayError, #[case] expected: bool) {
        assert_eq!(is_retryable(&error), expected);
    }

    #[test]
    fn endpoint_joins_segments_onto_base() {
        let gateway = AuthHttpGateway::new(
            Url::parse("http://auth.internal:8080/api/").expect("valid URL"),
        )
        .expect("client builds");
        let url = gateway.endpoint(&["usuarios", "7"]).expect("valid endpoint");
        assert_eq!(url.as_str(), "http://auth.internal:8080/api/usuarios/7");
    }
}
