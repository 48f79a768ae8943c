//! Unified API router for Roster
//!
//! Merges all module routers into a single axum `Router` with cookie
//! sessions, CORS, request tracing and consistent error bodies.
//!
//! ## Endpoint Map
//!
//! | Path                  | Module   | Description                          |
//! |-----------------------|----------|--------------------------------------|
//! | `/health`             | api      | Liveness probe                       |
//! | `/register`, `/login` | accounts | Account creation and sign-in         |
//! | `/logout`, `/profile` | accounts | Sign-out, profile and email on file  |
//! | `/dashboard`          | students | Owner's records, newest first        |
//! | `/create`, `/edit/*`  | students | Record create, read and update       |
//! | `/delete/*`           | students | Record removal                       |
//! | `/send-pdf/*`         | students | Re-send the PDF summary by mail      |
//! | `/search`             | fetcher  | Keyword lookup                       |
//! | `/search/send`        | fetcher  | Mail the last lookup result          |
//!
//! Request bodies are form-encoded; responses are JSON. Failures use the
//! envelope `{"error": {"code", "message"}}`, with `fields` added for
//! validation failures.

use crate::accounts::{accounts_router, AccountsState};
use crate::config::ServerConfig;
use crate::error::{Error, NotifyError, ValidationErrors};
use crate::fetcher::{fetcher_router, FetcherState};
use crate::students::{students_router, StudentsState};
use axum::{
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tower_sessions::cookie::SameSite;
use tower_sessions::{MemoryStore, SessionManagerLayer};

/// Build the complete Roster HTTP application
pub fn build_app(
    accounts_state: AccountsState,
    students_state: StudentsState,
    fetcher_state: FetcherState,
    server: &ServerConfig,
) -> Router {
    let cors = build_cors(&server.cors_origins);
    let sessions = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(server.secure_cookies)
        .with_same_site(SameSite::Lax);

    Router::new()
        .route("/health", get(health_check))
        .merge(accounts_router(accounts_state))
        .merge(students_router(students_state))
        .merge(fetcher_router(fetcher_state))
        .layer(sessions)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

// =============================================================================
// Error envelope
// =============================================================================

/// API error response
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

/// API error detail
#[derive(Debug, Serialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<ValidationErrors>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                fields: None,
            },
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("BAD_REQUEST", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }

    pub fn validation(fields: ValidationErrors) -> Self {
        let mut err = Self::new("VALIDATION_ERROR", "Please correct the errors below.");
        err.error.fields = Some(fields);
        err
    }
}

fn notify_status(err: &NotifyError) -> StatusCode {
    match err {
        NotifyError::NoRecipient => StatusCode::UNPROCESSABLE_ENTITY,
        NotifyError::BackendUnconfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
        NotifyError::AuthFailure(_) | NotifyError::DeliveryFailure(_) => StatusCode::BAD_GATEWAY,
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Error::Validation(fields) => {
                (StatusCode::UNPROCESSABLE_ENTITY, ApiError::validation(fields))
            }
            Error::NotFound => (StatusCode::NOT_FOUND, ApiError::not_found("Student not found")),
            Error::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                ApiError::new("INVALID_CREDENTIALS", "Invalid username or password"),
            ),
            Error::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                ApiError::new("UNAUTHORIZED", "Please sign in to continue"),
            ),
            Error::Notify(e) => (notify_status(&e), ApiError::new(e.code(), e.user_message())),
            Error::FetchFailure(msg) => (
                StatusCode::BAD_GATEWAY,
                ApiError::new("FETCH_FAILED", format!("Error performing the search: {}", msg)),
            ),
            other => {
                // Detail stays in the log; it can carry on-disk paths
                tracing::error!("Request failed: {}", other);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiError::internal("Something went wrong. Please try again later."),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

// =============================================================================
// Root handlers
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

/// GET /health
async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// =============================================================================
// CORS
// =============================================================================

fn build_cors(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    if origins.is_empty() {
        cors.allow_origin(Any)
    } else {
        let parsed: Vec<_> = origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        cors.allow_origin(parsed)
    }
}

/// Shared fixtures for router tests
#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::accounts::AccountStore;
    use crate::config::{FetcherConfig, MailBackend, MailConfig};
    use crate::fetcher::Fetcher;
    use crate::notifier::{Notifier, RecordingTransport};
    use crate::students::{StudentStore, StudentWorkflow};
    use axum::body::Body;
    use axum::http::Request;
    use std::sync::Arc;
    use tempfile::TempDir;
    use tower::ServiceExt;

    pub struct TestApp {
        pub router: Router,
        pub accounts: Arc<AccountStore>,
        pub transport: Arc<RecordingTransport>,
        _dir: TempDir,
    }

    pub struct TestOptions {
        pub transport: RecordingTransport,
        pub backend: MailBackend,
        pub fetch_base_url: String,
    }

    impl Default for TestOptions {
        fn default() -> Self {
            Self {
                transport: RecordingTransport::default(),
                backend: MailBackend::Smtp,
                fetch_base_url: "http://127.0.0.1:9/wiki/".to_string(),
            }
        }
    }

    pub async fn test_app() -> TestApp {
        test_app_with(TestOptions::default()).await
    }

    pub async fn test_app_with(options: TestOptions) -> TestApp {
        let dir = TempDir::new().unwrap();
        let accounts = Arc::new(
            AccountStore::new(dir.path().join("accounts"))
                .await
                .unwrap(),
        );
        let students = Arc::new(
            StudentStore::new(dir.path().join("students"))
                .await
                .unwrap(),
        );

        let transport = Arc::new(options.transport);
        let notifier = Arc::new(Notifier::with_transport(
            MailConfig {
                backend: options.backend,
                from: Some("school@example.com".to_string()),
                ..Default::default()
            },
            transport.clone(),
        ));
        let fetcher = Arc::new(
            Fetcher::new(&FetcherConfig {
                base_url: options.fetch_base_url,
                ..Default::default()
            })
            .unwrap(),
        );

        let router = build_app(
            AccountsState {
                accounts: accounts.clone(),
                notifier: notifier.clone(),
            },
            StudentsState {
                accounts: accounts.clone(),
                workflow: Arc::new(StudentWorkflow::new(students, notifier.clone())),
            },
            FetcherState {
                accounts: accounts.clone(),
                fetcher,
                notifier,
            },
            &ServerConfig::default(),
        );

        TestApp {
            router,
            accounts,
            transport,
            _dir: dir,
        }
    }

    impl TestApp {
        /// POST a form body, optionally with a session cookie
        pub async fn post(&self, uri: &str, body: &str, cookie: Option<&str>) -> Response {
            let mut builder = Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/x-www-form-urlencoded");
            if let Some(cookie) = cookie {
                builder = builder.header("cookie", cookie);
            }
            self.router
                .clone()
                .oneshot(builder.body(Body::from(body.to_string())).unwrap())
                .await
                .unwrap()
        }

        pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response {
            let mut builder = Request::builder().uri(uri);
            if let Some(cookie) = cookie {
                builder = builder.header("cookie", cookie);
            }
            self.router
                .clone()
                .oneshot(builder.body(Body::empty()).unwrap())
                .await
                .unwrap()
        }

        /// Register an account and return its session cookie
        pub async fn sign_up(&self, username: &str, email: Option<&str>) -> String {
            let body = format!(
                "username={}&email={}&password1=correct-horse&password2=correct-horse",
                username,
                email.unwrap_or("placeholder@example.com")
            );
            let resp = self.post("/register", &body, None).await;
            assert_eq!(resp.status(), StatusCode::CREATED);
            if email.is_none() {
                self.accounts.set_email(username, None).await.unwrap();
            }
            session_cookie(&resp).unwrap()
        }
    }

    /// `name=value` part of the response's Set-Cookie header
    pub fn session_cookie(resp: &Response) -> Option<String> {
        resp.headers()
            .get("set-cookie")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(str::to_string)
    }

    pub async fn body_json(response: Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), 1024 * 64)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }
}
