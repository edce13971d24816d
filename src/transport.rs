use std::sync::Arc;
use std::time::Duration;

use cookie_store::CookieStore;
use log::debug;
use reqwest::blocking::{Client, ClientBuilder, Response};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE, LOCATION, USER_AGENT};
use reqwest::redirect::Policy;
use reqwest::StatusCode;
use reqwest_cookie_store::CookieStoreMutex;
use serde::{Deserialize, Serialize};

use crate::error::TransportError;

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/111.0.0.0 Safari/537.36";

/// Serialized cookie jar. Opaque to everything but the transport that produced it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CookieSet(String);

impl CookieSet {
    pub fn from_raw(raw: impl Into<String>) -> Self {
        CookieSet(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

/// A fully read response.
#[derive(Debug, Clone)]
pub struct Page {
    /// Final URL, after any redirects that were followed.
    pub url: String,
    pub status: StatusCode,
    /// `Location` header, if the response carried one.
    pub location: Option<String>,
    pub body: String,
}

impl Page {
    pub fn new(url: impl Into<String>, status: StatusCode, body: impl Into<String>) -> Self {
        Page {
            url: url.into(),
            status,
            location: None,
            body: body.into(),
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Cookie-aware HTTP session used by the login flow and the batch runner.
pub trait Transport {
    /// GET, following redirects.
    fn get(&self, url: &str) -> Result<Page, TransportError>;
    /// GET, returning the first response as-is (redirects are not followed).
    fn get_no_redirect(&self, url: &str) -> Result<Page, TransportError>;
    /// Form-encoded POST, following redirects.
    fn post_form(&self, url: &str, form: &[(String, String)]) -> Result<Page, TransportError>;
    fn export_cookies(&self) -> Result<CookieSet, TransportError>;
    /// Replace the whole cookie jar.
    fn import_cookies(&self, cookies: &CookieSet) -> Result<(), TransportError>;
}

/// `reqwest` blocking transport. Two clients share one cookie jar since the
/// redirect policy is fixed per client.
pub struct HttpTransport {
    client: Client,
    no_redirect: Client,
    jar: Arc<CookieStoreMutex>,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let jar = Arc::new(CookieStoreMutex::new(CookieStore::default()));

        let client = Self::builder(&jar, timeout).build()?;
        let no_redirect = Self::builder(&jar, timeout)
            .redirect(Policy::none())
            .build()?;

        Ok(HttpTransport {
            client,
            no_redirect,
            jar,
        })
    }

    fn builder(jar: &Arc<CookieStoreMutex>, timeout: Duration) -> ClientBuilder {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

        Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .cookie_provider(Arc::clone(jar))
    }

    fn read(resp: Response) -> Result<Page, TransportError> {
        let url = resp.url().to_string();
        let status = resp.status();
        let location = resp
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = resp.text()?;
        debug!("{} -> {} ({} bytes)", url, status, body.len());

        Ok(Page {
            url,
            status,
            location,
            body,
        })
    }

    fn lock_jar(&self) -> Result<std::sync::MutexGuard<'_, CookieStore>, TransportError> {
        self.jar
            .lock()
            .map_err(|_| TransportError::Cookies("cookie jar lock poisoned".to_string()))
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str) -> Result<Page, TransportError> {
        Self::read(self.client.get(url).send()?)
    }

    fn get_no_redirect(&self, url: &str) -> Result<Page, TransportError> {
        Self::read(self.no_redirect.get(url).send()?)
    }

    fn post_form(&self, url: &str, form: &[(String, String)]) -> Result<Page, TransportError> {
        Self::read(self.client.post(url).form(form).send()?)
    }

    fn export_cookies(&self) -> Result<CookieSet, TransportError> {
        let store = self.lock_jar()?;
        let mut buf = Vec::new();
        // Session cookies included: the SSO cookies carry no expiry.
        cookie_store::serde::json::save_incl_expired_and_nonpersistent(&store, &mut buf)
            .map_err(|e| TransportError::Cookies(e.to_string()))?;
        let raw = String::from_utf8(buf).map_err(|e| TransportError::Cookies(e.to_string()))?;
        Ok(CookieSet(raw))
    }

    fn import_cookies(&self, cookies: &CookieSet) -> Result<(), TransportError> {
        let loaded = cookie_store::serde::json::load_all(cookies.as_bytes())
            .map_err(|e| TransportError::Cookies(e.to_string()))?;
        *self.lock_jar()? = loaded;
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_jar_export_imports_back() {
        let transport = HttpTransport::new(Duration::from_secs(5)).unwrap();
        let exported = transport.export_cookies().unwrap();
        transport.import_cookies(&exported).unwrap();
        assert_eq!(transport.export_cookies().unwrap(), exported);
    }

    #[test]
    fn garbage_cookie_set_is_rejected() {
        let transport = HttpTransport::new(Duration::from_secs(5)).unwrap();
        let result = transport.import_cookies(&CookieSet::from_raw("{not json"));
        assert!(matches!(result, Err(TransportError::Cookies(_))));
    }

    #[test]
    fn page_success_follows_status() {
        assert!(Page::new("u", StatusCode::OK, "").is_success());
        assert!(!Page::new("u", StatusCode::FOUND, "").is_success());
        assert!(!Page::new("u", StatusCode::NOT_FOUND, "").is_success());
    }
}
