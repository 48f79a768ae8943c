//! HTTP handlers for keyword lookups
//!
//! - POST /search      : run a lookup and remember the result
//! - POST /search/send : mail the remembered result to the owner

use crate::accounts::handler::session_error;
use crate::accounts::{current_owner, AccountStore};
use crate::api::ApiError;
use crate::error::{Error, Result};
use crate::fetcher::types::{FetchOutcome, SearchForm, SearchResult};
use crate::fetcher::{self, Fetcher};
use crate::notifier::Notifier;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Form, Json, Router,
};
use std::sync::Arc;
use tower_sessions::Session;

/// Session key holding the last successful lookup
pub const LAST_SEARCH_KEY: &str = "last_search";

/// Shared state for lookup handlers
#[derive(Clone)]
pub struct FetcherState {
    pub accounts: Arc<AccountStore>,
    pub fetcher: Arc<Fetcher>,
    pub notifier: Arc<Notifier>,
}

/// Create the lookup router
pub fn fetcher_router(state: FetcherState) -> Router {
    Router::new()
        .route("/search", post(search))
        .route("/search/send", post(send_results))
        .with_state(state)
}

/// POST /search
async fn search(
    State(state): State<FetcherState>,
    session: Session,
    Form(form): Form<SearchForm>,
) -> Result<impl IntoResponse> {
    current_owner(&state.accounts, &session).await?;
    let keyword = form.validate()?;

    let (messages, warnings, result) = match state.fetcher.fetch(&keyword).await {
        Ok(FetchOutcome::Done(result)) => {
            session
                .insert(LAST_SEARCH_KEY, &result)
                .await
                .map_err(session_error)?;
            (
                vec![format!("Search completed for: {}", keyword)],
                vec![],
                Some(result),
            )
        }
        Ok(FetchOutcome::Empty { .. }) => {
            forget_result(&session).await?;
            (
                vec![],
                vec!["No results were found on Wikipedia. Try another keyword.".to_string()],
                None,
            )
        }
        Err(Error::FetchFailure(msg)) => {
            forget_result(&session).await?;
            (
                vec![],
                vec![format!("Error performing the search: {}", msg)],
                None,
            )
        }
        Err(e) => return Err(e),
    };

    Ok(Json(serde_json::json!({
        "messages": messages,
        "warnings": warnings,
        "result": result,
    })))
}

async fn forget_result(session: &Session) -> Result<()> {
    session
        .remove::<SearchResult>(LAST_SEARCH_KEY)
        .await
        .map_err(session_error)?;
    Ok(())
}

/// POST /search/send
async fn send_results(
    State(state): State<FetcherState>,
    session: Session,
) -> Result<Response> {
    let owner = current_owner(&state.accounts, &session).await?;

    let result: Option<SearchResult> = session
        .get(LAST_SEARCH_KEY)
        .await
        .map_err(session_error)?;
    let Some(result) = result else {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(ApiError::bad_request("Run a search before sending its results")),
        )
            .into_response());
    };

    let recipient = fetcher::notify(&state.notifier, &owner, &result).await?;
    Ok(Json(serde_json::json!({
        "messages": [format!("Results sent to {}.", recipient)],
        "warnings": [],
    }))
    .into_response())
}
