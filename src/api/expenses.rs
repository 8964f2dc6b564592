use axum::{
    extract::State,
    http::{
        HeaderMap, HeaderValue, StatusCode,
        header::{CONTENT_TYPE, SET_COOKIE},
    },
    response::{IntoResponse, Response},
};
use tracing::{debug, error, warn};

use crate::{
    concur::{API_DESTINATION, AUTH_DESTINATION},
    management::{AUTH_TOKEN_KEY, session_cookie, session_from_headers},
    server::AppState,
    types::SessionToken,
    utils,
};

/// Failures reported to the browser. Details go to the log only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerError {
    TokenCreation,
    InvalidToken,
    Fetch,
}

impl HandlerError {
    pub fn message(&self) -> &'static str {
        match self {
            HandlerError::TokenCreation => {
                "Failed to create authentication token. Hint: Make sure to have the destination configured. See the logs for more details."
            }
            HandlerError::InvalidToken => "Invalid authentication token.",
            HandlerError::Fetch => {
                "Failed to fetch expense entries. Hint: Make sure to have the destination configured. See the logs for more details."
            }
        }
    }
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, self.message()).into_response()
    }
}

/// `GET /expenses`: lists expense entries for the caller's session.
///
/// Requests without a session cookie get a fresh session, returned via
/// `Set-Cookie`.
pub async fn expenses(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let (session, fresh) = match session_from_headers(&headers) {
        Some(id) => (id, false),
        None => (utils::generate_session_id(), true),
    };

    let mut response = match handle(&state, &session).await {
        Ok(json) => ([(CONTENT_TYPE, "application/json")], format!("{}\n", json)).into_response(),
        Err(e) => e.into_response(),
    };

    if fresh {
        if let Ok(cookie) = HeaderValue::from_str(&session_cookie(&session)) {
            response.headers_mut().insert(SET_COOKIE, cookie);
        }
    }
    response
}

/// Resolves the session's token (creating and caching it on first use) and
/// fetches the expense entries with it.
///
/// A token rejected by the API with 401 is dropped from the session so the
/// next request authenticates again; the current request still fails.
pub async fn handle(state: &AppState, session: &str) -> Result<String, HandlerError> {
    let token = match state.sessions.get(session, AUTH_TOKEN_KEY).await {
        Some(cached) => SessionToken::from(cached),
        None => {
            debug!("authentication token not found, creating new one");
            let token = state
                .client
                .obtain_token(AUTH_DESTINATION)
                .await
                .map_err(|e| {
                    error!(error = %e, destination = AUTH_DESTINATION, "could not create authentication token");
                    HandlerError::TokenCreation
                })?;

            if token.is_empty() {
                error!("empty authentication token created");
                return Err(HandlerError::InvalidToken);
            }

            debug!("setting authentication token for the current session");
            state
                .sessions
                .set(session, AUTH_TOKEN_KEY, token.as_str())
                .await;
            token
        }
    };

    match state.client.fetch_expenses(API_DESTINATION, &token).await {
        Ok(json) => Ok(json),
        Err(e) => {
            if e.is_unauthorized() {
                warn!("authentication token rejected, dropping it from the session");
                state.sessions.clear(session, AUTH_TOKEN_KEY).await;
            }
            error!(
                error = %e,
                destination = API_DESTINATION,
                configuration = e.is_configuration(),
                "could not fetch expense entries"
            );
            Err(HandlerError::Fetch)
        }
    }
}
