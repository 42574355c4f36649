// Shared application state
use actix_web::HttpRequest;
use std::sync::Arc;

use crate::config::SessionConfig;
use crate::gateway::AuthGateway;
use crate::handlers::cookies::CookieTokenStorage;
use crate::session::SessionStore;

pub struct PortalState {
    pub gateway: Arc<dyn AuthGateway>,
    pub session: SessionConfig,
}

impl PortalState {
    pub fn new(gateway: Arc<dyn AuthGateway>, session: SessionConfig) -> Self {
        Self { gateway, session }
    }

    /// A fresh Session Store for this request, persisted through the session cookie.
    pub fn session_for(&self, req: &HttpRequest) -> (SessionStore, Arc<CookieTokenStorage>) {
        let storage = Arc::new(CookieTokenStorage::from_request(req, &self.session));
        let store = SessionStore::new(self.gateway.clone(), storage.clone());
        (store, storage)
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::path::PathBuf;
    use std::time::Duration;

    pub const COOKIE: &str = "portal_session";

    pub fn session_config() -> SessionConfig {
        SessionConfig {
            cookie_name: COOKIE.into(),
            ttl: Duration::from_secs(3600),
            cookie_secure: false,
            cookie_domain: None,
            file_path: PathBuf::from("unused.json"),
        }
    }

    pub fn portal_state(gateway: Arc<dyn AuthGateway>) -> actix_web::web::Data<PortalState> {
        actix_web::web::Data::new(PortalState::new(gateway, session_config()))
    }
}
