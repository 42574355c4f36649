// Session cookie helpers
use actix_web::cookie::{Cookie, SameSite};
use actix_web::HttpRequest;
use parking_lot::Mutex;
use time::Duration;

use crate::config::SessionConfig;
use crate::session::TokenStorage;

/// Create the HttpOnly session cookie.
pub fn create_session_cookie(cfg: &SessionConfig, token: &str) -> Cookie<'static> {
    // Lax so the cookie survives the redirect back from an emailed portal link
    let mut cookie = Cookie::build(cfg.cookie_name.clone(), token.to_string())
        .path("/")
        .max_age(Duration::seconds(i64::try_from(cfg.ttl.as_secs()).unwrap_or(i64::MAX)))
        .http_only(true)
        .same_site(SameSite::Lax)
        .finish();

    if cfg.cookie_secure {
        cookie.set_secure(true);
    }
    if let Some(d) = &cfg.cookie_domain {
        cookie.set_domain(d.clone());
    }
    cookie
}

/// Expired cookie with the same attributes, so the browser drops it.
pub fn clear_session_cookie(cfg: &SessionConfig) -> Cookie<'static> {
    let mut cookie = Cookie::build(cfg.cookie_name.clone(), "")
        .path("/")
        .max_age(Duration::seconds(0))
        .http_only(true)
        .same_site(SameSite::Lax)
        .finish();
    if cfg.cookie_secure {
        cookie.set_secure(true);
    }
    if let Some(d) = &cfg.cookie_domain {
        cookie.set_domain(d.clone());
    }
    cookie
}

/// Extract the session token from the cookie, falling back to a bearer header.
pub fn extract_token(req: &HttpRequest, cookie_name: &str) -> Option<String> {
    if let Some(cookie) = req.cookie(cookie_name) {
        let val = cookie.value().trim();
        if !val.is_empty() {
            return Some(val.to_string());
        }
    }

    let header = req.headers().get("authorization")?.to_str().ok()?;
    let rest = header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))?
        .trim();
    if rest.is_empty() {
        None
    } else {
        Some(rest.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum CookieChange {
    Set(String),
    Clear,
}

/// Per-request token storage backed by the session cookie.
///
/// Reads come from the incoming request; writes are recorded and turned into
/// a `Set-Cookie` on the response via [`CookieTokenStorage::pending_cookie`].
pub struct CookieTokenStorage {
    incoming: Option<String>,
    change: Mutex<Option<CookieChange>>,
    settings: SessionConfig,
}

impl CookieTokenStorage {
    pub fn from_request(req: &HttpRequest, settings: &SessionConfig) -> Self {
        Self {
            incoming: extract_token(req, &settings.cookie_name),
            change: Mutex::new(None),
            settings: settings.clone(),
        }
    }

    /// Cookie to attach to the response, if the session changed during this request.
    pub fn pending_cookie(&self) -> Option<Cookie<'static>> {
        match self.change.lock().as_ref()? {
            CookieChange::Set(token) => Some(create_session_cookie(&self.settings, token)),
            CookieChange::Clear => Some(clear_session_cookie(&self.settings)),
        }
    }
}

impl TokenStorage for CookieTokenStorage {
    fn load_token(&self) -> anyhow::Result<Option<String>> {
        Ok(match self.change.lock().as_ref() {
            Some(CookieChange::Set(token)) => Some(token.clone()),
            Some(CookieChange::Clear) => None,
            None => self.incoming.clone(),
        })
    }

    fn save_token(&self, token: &str) -> anyhow::Result<()> {
        *self.change.lock() = Some(CookieChange::Set(token.to_string()));
        Ok(())
    }

    fn clear_token(&self) -> anyhow::Result<()> {
        *self.change.lock() = Some(CookieChange::Clear);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;
    use std::path::PathBuf;

    fn settings() -> SessionConfig {
        SessionConfig {
            cookie_name: "portal_session".into(),
            ttl: std::time::Duration::from_secs(3600),
            cookie_secure: true,
            cookie_domain: None,
            file_path: PathBuf::from("unused.json"),
        }
    }

    #[test]
    fn session_cookie_attributes() {
        let c = create_session_cookie(&settings(), "tok");
        assert_eq!(c.name(), "portal_session");
        assert_eq!(c.value(), "tok");
        assert_eq!(c.http_only(), Some(true));
        assert_eq!(c.secure(), Some(true));
        assert_eq!(c.same_site(), Some(SameSite::Lax));
        assert_eq!(c.max_age(), Some(Duration::seconds(3600)));

        let mut forever = settings();
        forever.ttl = std::time::Duration::from_secs(u64::MAX);
        let c = create_session_cookie(&forever, "tok");
        assert!(c.max_age().unwrap() > Duration::days(365));

        let cleared = clear_session_cookie(&settings());
        assert_eq!(cleared.value(), "");
        assert_eq!(cleared.max_age(), Some(Duration::seconds(0)));
    }

    #[test]
    fn token_from_cookie_or_bearer() {
        let req = TestRequest::default()
            .cookie(Cookie::new("portal_session", "from-cookie"))
            .insert_header(("authorization", "Bearer from-header"))
            .to_http_request();
        assert_eq!(extract_token(&req, "portal_session").as_deref(), Some("from-cookie"));

        let req = TestRequest::default()
            .insert_header(("authorization", "Bearer from-header"))
            .to_http_request();
        assert_eq!(extract_token(&req, "portal_session").as_deref(), Some("from-header"));

        let req = TestRequest::default().to_http_request();
        assert_eq!(extract_token(&req, "portal_session"), None);
    }

    #[test]
    fn cookie_storage_records_changes() {
        let req = TestRequest::default()
            .cookie(Cookie::new("portal_session", "old"))
            .to_http_request();
        let storage = CookieTokenStorage::from_request(&req, &settings());
        assert_eq!(storage.load_token().unwrap().as_deref(), Some("old"));
        assert!(storage.pending_cookie().is_none());

        storage.clear_token().unwrap();
        assert_eq!(storage.load_token().unwrap(), None);
        assert_eq!(storage.pending_cookie().unwrap().value(), "");

        storage.save_token("new").unwrap();
        assert_eq!(storage.load_token().unwrap().as_deref(), Some("new"));
        assert_eq!(storage.pending_cookie().unwrap().value(), "new");
    }
}
