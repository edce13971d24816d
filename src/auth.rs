use chrono::Utc;
use log::{debug, info};
use url::Url;

use crate::config::Credentials;
use crate::document::HtmlDocument;
use crate::error::{AuthError, TransportError};
use crate::session_store::SessionState;
use crate::transport::Transport;
use crate::zwiftpower::{
    HOME_URL, LOGOUT_MARKER, PASSWORD_FIELD, PROFILE_LINK_MARKER, REMEMBER_ME_FIELD, SSO_LOGIN_URL,
    USERNAME_FIELD,
};

/// Log in to ZwiftPower through Zwift SSO and return the resulting session.
///
/// 1. ZwiftPower login entry, redirects not followed: must point at the identity provider.
/// 2. Identity provider login page, redirects not followed.
/// 3. First form on that page.
/// 4. All named inputs, with credentials and remember-me filled in.
/// 5. Form POST, redirects followed back to ZwiftPower.
/// 6. Home page must show a logged-in marker.
///
/// Any failure is fatal; nothing partial is returned.
pub fn login<T: Transport + ?Sized>(transport: &T, credentials: &Credentials) -> Result<SessionState, AuthError> {
    info!("Performing login via Zwift SSO...");

    let entry = transport.get_no_redirect(SSO_LOGIN_URL)?;
    let idp_url = entry
        .location
        .as_deref()
        .and_then(|location| resolve(&entry.url, location))
        .ok_or(AuthError::RedirectMissing)?;
    debug!("SSO redirect -> {}", idp_url);

    let login_page = transport.get_no_redirect(&idp_url)?;
    let mut form = HtmlDocument::parse(&login_page.body)
        .first_form()
        .ok_or(AuthError::FormNotFound)?;
    let action = resolve(&login_page.url, &form.action).ok_or(AuthError::FormNotFound)?;

    form.set(USERNAME_FIELD, &credentials.username);
    form.set(PASSWORD_FIELD, &credentials.password);
    if form.has(REMEMBER_ME_FIELD) {
        form.set(REMEMBER_ME_FIELD, "on");
    }

    let submitted = transport.post_form(&action, form.fields())?;
    if !submitted.is_success() {
        return Err(AuthError::SubmissionFailed(submitted.status));
    }

    let home = transport.get(HOME_URL)?;
    let logged_in = home.is_success()
        && (home.body.contains(LOGOUT_MARKER) || home.body.contains(PROFILE_LINK_MARKER));
    if !logged_in {
        return Err(AuthError::VerificationFailed(home.status));
    }

    info!("Successfully logged into ZwiftPower!");
    Ok(SessionState::new(transport.export_cookies()?, Utc::now()))
}

/// Liveness probe for a restored session: the home page must offer a logout link.
pub fn probe_session<T: Transport + ?Sized>(transport: &T) -> Result<bool, TransportError> {
    let home = transport.get(HOME_URL)?;
    Ok(home.is_success() && home.body.contains(LOGOUT_MARKER))
}

fn resolve(base: &str, target: &str) -> Option<String> {
    let target = target.trim();
    if target.is_empty() {
        return None;
    }
    match Url::parse(target) {
        Ok(url) => Some(url.to_string()),
        Err(_) => Url::parse(base).ok()?.join(target).ok().map(|u| u.to_string()),
    }
}
