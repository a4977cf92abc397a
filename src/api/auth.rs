use axum::{
    Json,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use time::OffsetDateTime;

use super::types::{AuthFailureResponse, AuthStatusResponse, AuthUserDto, CredentialsForm};
use super::{ApiError, AppState};
use crate::auth::generate_session_token;
use crate::db::User;
use crate::services::AccountError;

pub const SESSION_COOKIE_NAME: &str = "session";

/// Identity resolved once at the request boundary by [`auth_gate`] and
/// threaded to handlers as a request extension, instead of each call site
/// re-reading the cookie store.
#[derive(Clone)]
pub struct Identity(pub Option<User>);

// ============================================================================
// Cookies
// ============================================================================

fn session_cookie(token: String, expires_at: &DateTime<Utc>, secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::build((SESSION_COOKIE_NAME, token))
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .path("/")
        .build();

    if let Ok(expires) = OffsetDateTime::from_unix_timestamp(expires_at.timestamp()) {
        cookie.set_expires(expires);
    }

    cookie
}

/// Emptied value with Max-Age 0 so the browser drops it immediately.
fn removal_cookie(secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, ""))
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .path("/")
        .max_age(time::Duration::ZERO)
        .build()
}

// ============================================================================
// Middleware
// ============================================================================

/// Resolves the session cookie to an [`Identity`] for the rest of the
/// request. An absent cookie short-circuits without touching the store;
/// store failures are fatal, not treated as "logged out".
pub async fn auth_gate(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let identity = match jar.get(SESSION_COOKIE_NAME) {
        None => Identity(None),
        Some(cookie) => {
            let resolved = state
                .sessions()
                .validate_session(cookie.value())
                .await
                .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

            if let Some((_, user)) = &resolved {
                tracing::Span::current().record("user_id", user.username.as_str());
            }

            Identity(resolved.map(|(_, user)| user))
        }
    };

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

/// Page-style routes under the authenticated section: anonymous viewers
/// are sent to the login page rather than shown an error.
pub async fn require_auth(request: Request, next: Next) -> Response {
    let authenticated = request
        .extensions()
        .get::<Identity>()
        .is_some_and(|identity| identity.0.is_some());

    if authenticated {
        next.run(request).await
    } else {
        Redirect::to("/login").into_response()
    }
}

// ============================================================================
// Handlers
// ============================================================================

fn account_error_to_api(err: AccountError) -> ApiError {
    match err {
        AccountError::InvalidCredentials => {
            ApiError::Unauthorized("Incorrect username or password".to_string())
        }
        AccountError::Validation(message) => ApiError::ValidationError(message),
        AccountError::Database(cause) => ApiError::DatabaseError(cause),
        other => ApiError::internal(other.to_string()),
    }
}

/// POST /api/auth/register
/// Creates the account, logs the new user in, and sends them home.
pub async fn register(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    axum::extract::Form(payload): axum::extract::Form<CredentialsForm>,
) -> Result<(CookieJar, Redirect), ApiError> {
    let user = state
        .accounts()
        .register(&payload.username, &payload.password)
        .await
        .map_err(account_error_to_api)?;

    start_session(&state, jar, &user).await
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    axum::extract::Form(payload): axum::extract::Form<CredentialsForm>,
) -> Result<(CookieJar, Redirect), ApiError> {
    let user = state
        .accounts()
        .verify_login(&payload.username, &payload.password)
        .await
        .map_err(account_error_to_api)?;

    start_session(&state, jar, &user).await
}

async fn start_session(
    state: &Arc<AppState>,
    jar: CookieJar,
    user: &User,
) -> Result<(CookieJar, Redirect), ApiError> {
    let token = generate_session_token();
    let session = state
        .sessions()
        .create_session(&token, user.id)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

    let secure = state.config().server.secure_cookies;
    let jar = jar.add(session_cookie(token, &session.expires_at, secure));

    Ok((jar, Redirect::to("/")))
}

/// POST /api/auth/logout
/// Clears the cookie and removes the session row. Both halves always run:
/// clearing only the cookie would leave a usable session behind. Calling
/// this twice is a no-op, not an error.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), ApiError> {
    if let Some(cookie) = jar.get(SESSION_COOKIE_NAME) {
        state
            .sessions()
            .invalidate_session(cookie.value())
            .await
            .map_err(|e| ApiError::DatabaseError(e.to_string()))?;
    }

    let secure = state.config().server.secure_cookies;
    let jar = jar.add(removal_cookie(secure));

    Ok((jar, Redirect::to("/")))
}

/// GET /api/auth
/// Who is the viewer? Resolves the cookie itself (it is not behind the
/// gate) so a broken session check can degrade to "logged out" instead of
/// taking the page shell down with it.
pub async fn auth_status(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    let resolved = match jar.get(SESSION_COOKIE_NAME) {
        None => Ok(None),
        Some(cookie) => state.sessions().validate_session(cookie.value()).await,
    };

    match resolved {
        Ok(pair) => {
            let authenticated_user = pair.map(|(_, user)| AuthUserDto {
                username: user.username,
                role: user.role,
            });
            (
                StatusCode::OK,
                Json(AuthStatusResponse { authenticated_user }),
            )
                .into_response()
        }
        Err(err) => {
            tracing::error!("Authentication error: {err}");
            (
                StatusCode::UNAUTHORIZED,
                Json(AuthFailureResponse {
                    user: None,
                    error: "Authentication failed".to_string(),
                }),
            )
                .into_response()
        }
    }
}
