//! HTTP handlers for accounts and sign-in sessions
//!
//! - POST /register: create account, sign in, send welcome mail
//! - POST /login   : sign in
//! - POST /logout  : sign out
//! - GET  /profile : signed-in owner's profile
//! - POST /profile : set or clear the email on file

use crate::accounts::store::AccountStore;
use crate::accounts::types::*;
use crate::error::{Error, Result};
use crate::notifier::Notifier;
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Form, Json, Router,
};
use std::sync::Arc;
use tower_sessions::Session;

/// Session key holding the signed-in username
pub const SESSION_USER_KEY: &str = "username";

/// Shared state for account handlers
#[derive(Clone)]
pub struct AccountsState {
    pub accounts: Arc<AccountStore>,
    pub notifier: Arc<Notifier>,
}

/// Create the accounts router
pub fn accounts_router(state: AccountsState) -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/profile", get(get_profile).post(update_profile))
        .with_state(state)
}

pub(crate) fn session_error(e: impl std::fmt::Display) -> Error {
    Error::Internal(format!("Session error: {}", e))
}

/// The signed-in owner, or `Unauthorized`
pub async fn current_owner(accounts: &AccountStore, session: &Session) -> Result<Account> {
    let username: Option<String> = session
        .get(SESSION_USER_KEY)
        .await
        .map_err(session_error)?;

    match username {
        Some(username) => accounts.get(&username).await.ok_or(Error::Unauthorized),
        None => Err(Error::Unauthorized),
    }
}

async fn sign_in(session: &Session, account: &Account) -> Result<()> {
    session.cycle_id().await.map_err(session_error)?;
    session
        .insert(SESSION_USER_KEY, &account.username)
        .await
        .map_err(session_error)
}

// =============================================================================
// Handlers
// =============================================================================

/// POST /register
async fn register(
    State(state): State<AccountsState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Result<impl IntoResponse> {
    let account = state.accounts.register(form).await?;
    sign_in(&session, &account).await?;

    let mut warnings = Vec::new();
    let message = match state.notifier.welcome(&account).await {
        Ok(()) => "Registration successful! A welcome email has been sent.".to_string(),
        Err(e) => {
            warnings.push(format!(
                "The welcome email could not be sent. {}",
                e.user_message()
            ));
            "Registration successful!".to_string()
        }
    };

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "messages": [message],
            "warnings": warnings,
            "account": account.profile(),
        })),
    ))
}

/// POST /login
async fn login(
    State(state): State<AccountsState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<impl IntoResponse> {
    let account = state
        .accounts
        .authenticate(&form.username, &form.password)
        .await?;
    sign_in(&session, &account).await?;

    tracing::info!(username = %account.username, "Signed in");
    Ok(Json(serde_json::json!({
        "messages": [format!("Welcome back, {}.", account.username)],
        "warnings": [],
        "account": account.profile(),
    })))
}

/// POST /logout
async fn logout(session: Session) -> Result<impl IntoResponse> {
    session.flush().await.map_err(session_error)?;
    Ok(Json(serde_json::json!({
        "messages": ["You have been signed out."],
        "warnings": [],
    })))
}

/// GET /profile
async fn get_profile(
    State(state): State<AccountsState>,
    session: Session,
) -> Result<impl IntoResponse> {
    let owner = current_owner(&state.accounts, &session).await?;
    Ok(Json(owner.profile()))
}

/// POST /profile
async fn update_profile(
    State(state): State<AccountsState>,
    session: Session,
    Form(form): Form<ProfileForm>,
) -> Result<impl IntoResponse> {
    let owner = current_owner(&state.accounts, &session).await?;
    let email = form.validate()?;
    let account = state.accounts.set_email(&owner.username, email).await?;

    let message = match &account.email {
        Some(email) => format!("Email updated to {}.", email),
        None => "Email removed from your profile.".to_string(),
    };
    Ok(Json(serde_json::json!({
        "messages": [message],
        "warnings": [],
        "account": account.profile(),
    })))
}

#[cfg(test)]
mod tests {
    use crate::api::test_support::*;
    use crate::config::MailBackend;
    use crate::error::NotifyError;
    use crate::notifier::RecordingTransport;
    use axum::http::StatusCode;

    const SIGN_UP: &str =
        "username=profe&email=profe%40example.com&password1=correct-horse&password2=correct-horse";

    #[tokio::test]
    async fn test_register_signs_in_and_welcomes() {
        let app = test_app().await;

        let resp = app.post("/register", SIGN_UP, None).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let cookie = session_cookie(&resp).unwrap();

        let json = body_json(resp).await;
        assert_eq!(json["account"]["username"], "profe");
        assert!(json["account"].get("passwordHash").is_none());
        assert_eq!(json["warnings"].as_array().unwrap().len(), 0);

        let sent = app.transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "profe@example.com");
        assert_eq!(sent[0].subject, "Welcome to Roster");

        let resp = app.get("/profile", Some(&cookie)).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["username"], "profe");
    }

    #[tokio::test]
    async fn test_register_mail_failure_is_warning() {
        let app = test_app_with(TestOptions {
            transport: RecordingTransport::failing(NotifyError::AuthFailure("535".into())),
            ..Default::default()
        })
        .await;

        let resp = app.post("/register", SIGN_UP, None).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let json = body_json(resp).await;
        assert_eq!(json["warnings"].as_array().unwrap().len(), 1);
        assert!(app.accounts.get("profe").await.is_some());
    }

    #[tokio::test]
    async fn test_register_with_disabled_mail() {
        let app = test_app_with(TestOptions {
            backend: MailBackend::Disabled,
            ..Default::default()
        })
        .await;

        let resp = app.post("/register", SIGN_UP, None).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let json = body_json(resp).await;
        assert!(json["warnings"][0]
            .as_str()
            .unwrap()
            .contains("Mail is not configured"));
    }

    #[tokio::test]
    async fn test_register_validation() {
        let app = test_app().await;

        let resp = app
            .post(
                "/register",
                "username=profe&email=nope&password1=12345678&password2=12345678",
                None,
            )
            .await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let json = body_json(resp).await;
        assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
        assert!(json["error"]["fields"]["email"].is_array());
        assert!(json["error"]["fields"]["password2"].is_array());
        assert!(app.transport.sent().is_empty());
    }

    #[tokio::test]
    async fn test_login_and_logout() {
        let app = test_app().await;
        app.post("/register", SIGN_UP, None).await;

        let resp = app
            .post("/login", "username=profe&password=wrong-horse", None)
            .await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(resp).await["error"]["code"], "INVALID_CREDENTIALS");

        let resp = app
            .post("/login", "username=profe&password=correct-horse", None)
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let cookie = session_cookie(&resp).unwrap();

        assert_eq!(
            app.get("/profile", Some(&cookie)).await.status(),
            StatusCode::OK
        );

        let resp = app.post("/logout", "", Some(&cookie)).await;
        assert_eq!(resp.status(), StatusCode::OK);

        assert_eq!(
            app.get("/profile", Some(&cookie)).await.status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[tokio::test]
    async fn test_profile_requires_session() {
        let app = test_app().await;
        let resp = app.get("/profile", None).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(resp).await["error"]["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_update_profile_email() {
        let app = test_app().await;
        let cookie = app.sign_up("profe", Some("profe@example.com")).await;

        let resp = app
            .post("/profile", "email=new%40example.com", Some(&cookie))
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["account"]["email"], "new@example.com");

        let resp = app.post("/profile", "email=broken", Some(&cookie)).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let resp = app.post("/profile", "email=", Some(&cookie)).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(app.accounts.get("profe").await.unwrap().email.is_none());
    }
}
