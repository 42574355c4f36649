// Auth Gateway: session operations against the backend Auth API
pub mod http;

use async_trait::async_trait;

use crate::errors::AuthError;
use crate::models::auth_types::{LoginResponse, RegisterRequest};
use crate::models::principal::Principal;

pub use http::HttpAuthGateway;

/// One request per call, no retry, no caching.
#[async_trait]
pub trait AuthGateway: Send + Sync {
    async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, AuthError>;

    async fn logout(&self, token: Option<&str>) -> Result<(), AuthError>;

    async fn current_identity(&self, token: &str) -> Result<Principal, AuthError>;

    /// Returns the backend's confirmation message.
    async fn register(&self, request: &RegisterRequest) -> Result<String, AuthError>;
}

#[cfg(test)]
pub mod fake {
    use super::*;
    use crate::models::principal::{AccountStatus, Role};
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::sync::Notify;

    pub fn principal(role: Role, status: AccountStatus) -> Principal {
        Principal {
            id: format!("{}-1", role),
            name: format!("Test {}", role),
            email: format!("{}@studio.test", role),
            role,
            status,
            avatar_url: None,
        }
    }

    /// Scripted gateway: tokens map to identities, emails map to login outcomes.
    #[derive(Default)]
    pub struct FakeGateway {
        pub identities: Mutex<HashMap<String, Principal>>,
        pub logins: Mutex<HashMap<String, Result<LoginResponse, AuthError>>>,
        pub register_result: Mutex<Option<Result<String, AuthError>>>,
        pub identity_error: Mutex<Option<AuthError>>,
        pub logout_fails: bool,
        /// When set, `current_identity` waits for a notification before answering.
        pub identity_gate: Option<Arc<Notify>>,
        pub calls: AtomicUsize,
        pub logout_calls: AtomicUsize,
    }

    impl FakeGateway {
        pub fn with_session(token: &str, principal: Principal) -> Self {
            let gw = Self::default();
            gw.identities.lock().insert(token.to_string(), principal);
            gw
        }

        pub fn accept_login(&self, email: &str, token: &str, principal: Principal) {
            self.identities.lock().insert(token.to_string(), principal.clone());
            self.logins.lock().insert(
                email.to_string(),
                Ok(LoginResponse {
                    token: Some(token.to_string()),
                    user: principal,
                }),
            );
        }

        pub fn reject_login(&self, email: &str, err: AuthError) {
            self.logins.lock().insert(email.to_string(), Err(err));
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AuthGateway for FakeGateway {
        async fn login(&self, email: &str, _password: &str) -> Result<LoginResponse, AuthError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.logins
                .lock()
                .get(email)
                .cloned()
                .unwrap_or(Err(AuthError::InvalidCredentials))
        }

        async fn logout(&self, _token: Option<&str>) -> Result<(), AuthError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.logout_calls.fetch_add(1, Ordering::SeqCst);
            if self.logout_fails {
                Err(AuthError::Unreachable("connection refused".into()))
            } else {
                Ok(())
            }
        }

        async fn current_identity(&self, token: &str) -> Result<Principal, AuthError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.identity_gate {
                gate.notified().await;
            }
            if let Some(err) = self.identity_error.lock().clone() {
                return Err(err);
            }
            self.identities
                .lock()
                .get(token)
                .cloned()
                .ok_or(AuthError::Unauthenticated)
        }

        async fn register(&self, _request: &RegisterRequest) -> Result<String, AuthError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.register_result
                .lock()
                .clone()
                .unwrap_or_else(|| Ok("Registration received.".into()))
        }
    }
}
