//! Shared-password login and the gate in front of the generation routes.

use axum::extract::{Form, Query, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{info, instrument, warn};
use url::form_urlencoded::byte_serialize;

use super::AppState;
use super::csrf::{csrf_token, validate_csrf};
use super::flash;
use super::views::LoginTemplate;
use crate::constants::PROTECTED_PREFIXES;
use crate::error::SnapError;

const AUTHENTICATED_KEY: &str = "authenticated";

pub(crate) async fn is_authenticated(session: &Session) -> Result<bool, SnapError> {
    Ok(session
        .get::<bool>(AUTHENTICATED_KEY)
        .await?
        .unwrap_or(false))
}

pub(crate) fn is_protected(path: &str) -> bool {
    PROTECTED_PREFIXES
        .iter()
        .any(|prefix| path.starts_with(prefix))
}

/// Only same-site relative paths are followed after login.
pub(crate) fn safe_redirect(target: Option<&str>) -> &str {
    match target {
        Some(target)
            if target.starts_with('/') && !target.starts_with("//") && !target.contains('\\') =>
        {
            target
        }
        _ => "/",
    }
}

pub(crate) fn login_url(redirect: &str) -> String {
    format!(
        "/login?redirect={}",
        byte_serialize(redirect.as_bytes()).collect::<String>()
    )
}

#[derive(Deserialize, Debug)]
pub(crate) struct LoginQuery {
    redirect: Option<String>,
}

#[derive(Deserialize)]
pub(crate) struct LoginForm {
    password: Option<String>,
    csrf_token: String,
    redirect: Option<String>,
}

/// GET /login
pub(crate) async fn login_page(
    session: Session,
    Query(query): Query<LoginQuery>,
) -> Result<Response, SnapError> {
    let redirect = safe_redirect(query.redirect.as_deref()).to_string();
    if is_authenticated(&session).await? {
        return Ok(Redirect::to(&redirect).into_response());
    }

    let csrf_token = csrf_token(&session).await?;
    let flash = flash::take_flash_message(&session).await?;
    let (has_flash, flash_message, flash_class) = match flash {
        Some(message) => (true, message.text.to_string(), message.class.to_string()),
        None => (false, String::new(), String::new()),
    };
    Ok(LoginTemplate {
        csrf_token,
        redirect,
        has_flash,
        flash_message,
        flash_class,
    }
    .into_response())
}

/// POST /api/auth/login
#[instrument(level = "info", skip_all)]
pub(crate) async fn login_handler(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Redirect, SnapError> {
    validate_csrf(&session, &form.csrf_token).await?;
    let target = safe_redirect(form.redirect.as_deref()).to_string();
    let password = form
        .password
        .filter(|password| !password.is_empty())
        .ok_or_else(|| SnapError::BadRequest("Password is required".to_string()))?;

    if password != state.config.auth_password {
        warn!("Login attempt with a wrong password");
        flash::set_flash(&session, flash::FLASH_INVALID_PASSWORD).await?;
        return Ok(Redirect::to(&login_url(&target)));
    }

    session.cycle_id().await?;
    session.insert(AUTHENTICATED_KEY, true).await?;
    info!("Login successful, redirecting to {target}");
    Ok(Redirect::to(&target))
}

/// GET or POST /api/auth/logout
pub(crate) async fn logout_handler(session: Session) -> Result<Redirect, SnapError> {
    session.flush().await?;
    flash::set_flash(&session, flash::FLASH_LOGGED_OUT).await?;
    Ok(Redirect::to("/login"))
}

/// Middleware guarding the protected prefixes. Pages redirect to the login
/// form, API calls get a 401.
pub(crate) async fn require_auth(
    session: Session,
    request: Request,
    next: Next,
) -> Result<Response, SnapError> {
    let path = request.uri().path().to_string();
    if !is_protected(&path) || is_authenticated(&session).await? {
        return Ok(next.run(request).await);
    }

    if path.starts_with("/api/") {
        return Err(SnapError::Unauthorized);
    }
    info!("Unauthenticated request for {path}, redirecting to login");
    flash::set_flash(&session, flash::FLASH_AUTH_REQUIRED).await?;
    Ok(Redirect::to(&login_url(&path)).into_response())
}
