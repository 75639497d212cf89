//! Account registration and login endpoints

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::info;
use vidstream_core::accounts::{RegisterRequest, UserDto};

use crate::errors::ApiError;
use crate::server::AppState;

/// Login body. Fields are optional so that a missing one is reported as a
/// failed login rather than a malformed request.
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    username: Option<String>,
    password: Option<String>,
}

/// Successful login.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Signed access token for the `Authorization: Bearer` header
    pub access_token: String,
}

/// `POST /auth/register`
///
/// # Errors
/// - `ApiError::BadRequest` - Missing, empty or unknown fields
/// - `ApiError::Forbidden` - Username already registered
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<UserDto>), ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    request.validate()?;

    let accounts = state.accounts.clone();
    let account = tokio::task::spawn_blocking(move || accounts.register(request))
        .await
        .map_err(|e| ApiError::Internal(format!("registration task failed: {e}")))??;

    Ok((StatusCode::CREATED, Json(UserDto::from(&account))))
}

/// `POST /auth/login`
///
/// # Errors
/// - `ApiError::BadRequest` - Body is not JSON
/// - `ApiError::Unauthorized` - Missing field, unknown username or wrong password
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let (Some(username), Some(password)) = (request.username, request.password) else {
        return Err(ApiError::Unauthorized(
            "username and password are required".to_string(),
        ));
    };

    let accounts = state.accounts.clone();
    let account = tokio::task::spawn_blocking(move || accounts.authenticate(&username, &password))
        .await
        .map_err(|e| ApiError::Internal(format!("login task failed: {e}")))??;

    let access_token = state.tokens.issue(&account)?;
    info!("Account {} logged in", account.username);
    Ok(Json(TokenResponse { access_token }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{Body, to_bytes};
    use axum::http::{Request, header};
    use axum::response::Response;
    use serde_json::{Value, json};
    use tower::ServiceExt;
    use vidstream_core::VideoCatalog;
    use vidstream_core::config::VidstreamConfig;
    use vidstream_core::test_fixtures::fast_auth_config;

    use super::*;
    use crate::server::build_router;

    fn test_state() -> AppState {
        let config = VidstreamConfig {
            auth: fast_auth_config(),
            ..VidstreamConfig::default()
        };
        AppState::new(config, Arc::new(VideoCatalog::new())).unwrap()
    }

    async fn post_json(app: axum::Router, uri: &str, body: Value) -> Response {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        app.oneshot(request).await.unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn dummy() -> Value {
        json!({ "username": "dummy@dummy.com", "password": "dummy" })
    }

    #[tokio::test]
    async fn test_register_returns_account_without_password() {
        let app = build_router(test_state());

        let response = post_json(app, "/auth/register", dummy()).await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = json_body(response).await;
        assert_eq!(body["username"], "dummy@dummy.com");
        assert!(body["id"].as_str().unwrap().parse::<uuid::Uuid>().is_ok());
        assert!(body["createdAt"].is_string());
        assert!(body.get("password").is_none());
        assert!(body.get("passwordHash").is_none());
    }

    #[tokio::test]
    async fn test_register_rejects_bad_bodies() {
        let app = build_router(test_state());

        for body in [
            json!({ "password": "dummy" }),
            json!({ "username": "dummy@dummy.com" }),
            json!({ "username": "dummy@dummy.com", "password": "dummy", "extraField": "dummy" }),
            json!({ "username": "", "password": "dummy" }),
        ] {
            let response = post_json(app.clone(), "/auth/register", body.clone()).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{body}");
        }
    }

    #[tokio::test]
    async fn test_register_duplicate_username_is_forbidden() {
        let app = build_router(test_state());

        let first = post_json(app.clone(), "/auth/register", dummy()).await;
        assert_eq!(first.status(), StatusCode::CREATED);
        let second = post_json(app, "/auth/register", dummy()).await;
        assert_eq!(second.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_login_issues_verifiable_token() {
        let state = test_state();
        let app = build_router(state.clone());
        post_json(app.clone(), "/auth/register", dummy()).await;

        let response = post_json(app, "/auth/login", dummy()).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body: TokenResponse = serde_json::from_value(json_body(response).await).unwrap();
        let claims = state.tokens.verify(&body.access_token).unwrap();
        assert_eq!(claims.username, "dummy@dummy.com");
    }

    #[tokio::test]
    async fn test_login_failures_are_unauthorized() {
        let app = build_router(test_state());
        post_json(app.clone(), "/auth/register", dummy()).await;

        for body in [
            json!({ "password": "dummy" }),
            json!({ "username": "dummy@dummy.com" }),
            json!({ "username": "invalid", "password": "dummy" }),
            json!({ "username": "dummy@dummy.com", "password": "invalid" }),
        ] {
            let response = post_json(app.clone(), "/auth/login", body.clone()).await;
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{body}");
        }
    }
}
