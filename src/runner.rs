use log::{info, warn};

use crate::auth;
use crate::config::Credentials;
use crate::delay_manager::Throttle;
use crate::error::AuthError;
use crate::extractor::{ProfileExtractor, RiderRecord};
use crate::session_store::{SessionState, SessionStore};
use crate::transport::Transport;
use crate::zwiftpower;

/// Make sure `transport` holds an authenticated session.
///
/// A cached session is reused only if it is inside the expiry window (checked
/// by the store) and the live probe passes. Otherwise log in once and
/// overwrite the cache.
pub fn ensure_session<T: Transport + ?Sized>(
    transport: &T,
    store: &SessionStore,
    credentials: &Credentials,
) -> Result<SessionState, AuthError> {
    match store.load() {
        Some(cached) => {
            if restore(transport, &cached) {
                info!("Session still valid, skipping login.");
                return Ok(cached);
            }
            warn!("Session invalid, logging in again...");
        }
        None => info!("No valid cookies found, logging in..."),
    }

    let session = auth::login(transport, credentials)?;
    if let Err(e) = store.save(&session) {
        // The session is still usable for this run.
        warn!("Failed to save cookie cache {:?}: {}", store.path(), e);
    }
    Ok(session)
}

fn restore<T: Transport + ?Sized>(transport: &T, cached: &SessionState) -> bool {
    if let Err(e) = transport.import_cookies(&cached.cookies) {
        warn!("Could not restore cached cookies: {}", e);
        return false;
    }
    match auth::probe_session(transport) {
        Ok(alive) => alive,
        Err(e) => {
            warn!("Session probe failed: {}", e);
            false
        }
    }
}

/// Fetches rider profiles one at a time, pausing on the throttle after each.
pub struct BatchRunner<D: Throttle> {
    throttle: D,
    extractor: ProfileExtractor,
}

impl<D: Throttle> BatchRunner<D> {
    pub fn new(throttle: D) -> Self {
        BatchRunner {
            throttle,
            extractor: ProfileExtractor::new(),
        }
    }

    /// One record per identifier, in input order. Failures never stop the run.
    pub fn run<T: Transport + ?Sized>(&self, transport: &T, identifiers: &[String]) -> Vec<RiderRecord> {
        let mut results = Vec::with_capacity(identifiers.len());

        for (idx, raw_id) in identifiers.iter().enumerate() {
            let rider_id = raw_id.trim();
            info!("[{}] Checking {}...", idx + 1, rider_id);

            results.push(self.fetch_rider(transport, rider_id));
            self.throttle.pause();
        }

        results
    }

    pub fn fetch_rider<T: Transport + ?Sized>(&self, transport: &T, rider_id: &str) -> RiderRecord {
        let url = zwiftpower::profile_url(rider_id);
        match transport.get(&url) {
            Ok(page) if page.is_success() => self.extractor.extract(rider_id, &page.body),
            Ok(page) => {
                warn!("Profile {} returned {}", rider_id, page.status);
                RiderRecord::profile_not_found(rider_id)
            }
            Err(e) => {
                warn!("Failed to fetch profile {}: {}", rider_id, e);
                RiderRecord::profile_not_found(rider_id)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delay_manager::NoDelay;
    use crate::extractor::{NOT_FOUND, NO_CATEGORY, PROFILE_NOT_FOUND};
    use crate::transport::fake::FakeTransport;
    use crate::transport::{CookieSet, Page};
    use crate::zwiftpower::{HOME_URL, SSO_LOGIN_URL};
    use chrono::{Duration, Utc};
    use reqwest::StatusCode;
    use std::cell::Cell;
    use tempfile::tempdir;

    const IDP_URL: &str = "https://secure.zwift.com/auth";
    const ACTION_URL: &str = "https://secure.zwift.com/auth/submit";

    fn credentials() -> Credentials {
        Credentials {
            username: "u".to_string(),
            password: "p".to_string(),
        }
    }

    fn logged_in_home() -> Page {
        Page::new(HOME_URL, StatusCode::OK, "<a>Logout</a>")
    }

    fn logged_out_home() -> Page {
        Page::new(HOME_URL, StatusCode::OK, "<a>Login</a>")
    }

    fn with_login_routes(fake: &FakeTransport) {
        fake.route(
            "GET!",
            SSO_LOGIN_URL,
            Page::new(SSO_LOGIN_URL, StatusCode::FOUND, "").with_location(IDP_URL),
        );
        let form = format!(
            r#"<form action="{}"><input name="username"><input name="password"></form>"#,
            ACTION_URL
        );
        fake.route("GET!", IDP_URL, Page::new(IDP_URL, StatusCode::OK, form));
        fake.route("POST", ACTION_URL, Page::new(HOME_URL, StatusCode::OK, ""));
    }

    fn seed_cache(store: &SessionStore, cookies: &str, age: Duration) {
        let state = SessionState::new(CookieSet::from_raw(cookies), Utc::now() - age);
        store.save(&state).unwrap();
    }

    #[test]
    fn fresh_cache_with_live_probe_skips_login() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("cookies.json"), Duration::hours(4));
        seed_cache(&store, "cached", Duration::hours(1));

        let fake = FakeTransport::new();
        with_login_routes(&fake);
        fake.route("GET", HOME_URL, logged_in_home());

        let session = ensure_session(&fake, &store, &credentials()).unwrap();
        assert_eq!(session.cookies.as_str(), "cached");
        assert_eq!(fake.cookies.borrow().as_str(), "cached");
        assert_eq!(fake.count("GET!", SSO_LOGIN_URL), 0);
    }

    #[test]
    fn expired_cache_logs_in_once_and_overwrites() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("cookies.json"), Duration::hours(4));
        seed_cache(&store, "stale", Duration::hours(5));

        let fake = FakeTransport::new();
        with_login_routes(&fake);
        fake.route("GET", HOME_URL, logged_in_home());
        *fake.cookies.borrow_mut() = CookieSet::from_raw("fresh");

        ensure_session(&fake, &store, &credentials()).unwrap();
        assert_eq!(fake.count("GET!", SSO_LOGIN_URL), 1);
        // No liveness probe for an expired entry; only the post-login check.
        assert_eq!(fake.count("GET", HOME_URL), 1);
        assert_eq!(store.load().unwrap().cookies.as_str(), "fresh");
    }

    #[test]
    fn fresh_cache_with_dead_probe_logs_in_once() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("cookies.json"), Duration::hours(4));
        seed_cache(&store, "revoked", Duration::minutes(10));

        let fake = FakeTransport::new();
        with_login_routes(&fake);
        fake.route("GET", HOME_URL, logged_out_home());
        fake.route("GET", HOME_URL, logged_in_home());
        *fake.issued_on_post.borrow_mut() = Some(CookieSet::from_raw("fresh"));

        let session = ensure_session(&fake, &store, &credentials()).unwrap();
        assert_eq!(fake.count("GET!", SSO_LOGIN_URL), 1);
        assert_eq!(session.cookies.as_str(), "fresh");
        assert_eq!(fake.cookies.borrow().as_str(), "fresh");
        assert_eq!(store.load().unwrap().cookies.as_str(), "fresh");
    }

    #[test]
    fn rejected_login_keeps_restored_cookies_out_of_cache() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("cookies.json"), Duration::hours(4));
        seed_cache(&store, "revoked", Duration::minutes(10));

        let fake = FakeTransport::new();
        with_login_routes(&fake);
        fake.replace("POST", ACTION_URL, Page::new(ACTION_URL, StatusCode::UNAUTHORIZED, ""));
        fake.route("GET", HOME_URL, logged_out_home());
        *fake.issued_on_post.borrow_mut() = Some(CookieSet::from_raw("fresh"));

        let err = ensure_session(&fake, &store, &credentials()).unwrap_err();
        assert!(matches!(err, AuthError::SubmissionFailed(status) if status == StatusCode::UNAUTHORIZED));
        assert_eq!(fake.cookies.borrow().as_str(), "revoked");
        assert_eq!(store.load().unwrap().cookies.as_str(), "revoked");
    }

    #[test]
    fn missing_cache_logs_in() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("cookies.json"), Duration::hours(4));

        let fake = FakeTransport::new();
        with_login_routes(&fake);
        fake.route("GET", HOME_URL, logged_in_home());

        ensure_session(&fake, &store, &credentials()).unwrap();
        assert_eq!(fake.count("GET!", SSO_LOGIN_URL), 1);
        assert!(store.path().exists());
    }

    #[test]
    fn failed_login_is_fatal_and_not_cached() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("cookies.json"), Duration::hours(4));

        let fake = FakeTransport::new();
        fake.route("GET!", SSO_LOGIN_URL, Page::new(SSO_LOGIN_URL, StatusCode::OK, ""));

        let err = ensure_session(&fake, &store, &credentials()).unwrap_err();
        assert!(matches!(err, AuthError::RedirectMissing));
        assert!(!store.path().exists());
    }

    struct CountingThrottle(Cell<usize>);

    impl Throttle for CountingThrottle {
        fn pause(&self) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn run_keeps_order_and_survives_failures() {
        let fake = FakeTransport::new();
        fake.route(
            "GET",
            &zwiftpower::profile_url("1"),
            Page::new("", StatusCode::OK, r#"<table><tr><th>zFTP</th><td>250w</td></tr></table>"#),
        );
        fake.route(
            "GET",
            &zwiftpower::profile_url("2"),
            Page::new("", StatusCode::INTERNAL_SERVER_ERROR, ""),
        );

        let throttle = CountingThrottle(Cell::new(0));
        let runner = BatchRunner::new(&throttle);
        let ids = vec!["1".to_string(), " 2 ".to_string(), "3".to_string()];
        let records = runner.run(&fake, &ids);

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].identifier, "1");
        assert_eq!(records[0].threshold_power, "250w");
        assert_eq!(records[0].racing_score, NOT_FOUND);
        assert_eq!(records[0].category, NO_CATEGORY);
        assert_eq!(records[1].identifier, "2");
        assert_eq!(records[1].values(), [PROFILE_NOT_FOUND; 4]);
        // Unrouted in the fake: 404.
        assert_eq!(records[2].values(), [PROFILE_NOT_FOUND; 4]);
        assert_eq!(throttle.0.get(), 3);
    }

    #[test]
    fn empty_batch_does_nothing() {
        let fake = FakeTransport::new();
        let records = BatchRunner::new(NoDelay).run(&fake, &[]);
        assert!(records.is_empty());
        assert!(fake.requests.borrow().is_empty());
    }
}
