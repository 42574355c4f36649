// Session Store: who is logged in right now
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use super::storage::TokenStorage;
use crate::errors::AuthError;
use crate::gateway::AuthGateway;
use crate::models::auth_types::RegisterRequest;
use crate::models::principal::{Principal, SessionState};

pub struct SessionStore {
    gateway: Arc<dyn AuthGateway>,
    storage: Arc<dyn TokenStorage>,
    state: RwLock<SessionState>,
    // bumped by every user-initiated action; a resync only lands if nothing happened since it began
    epoch: AtomicU64,
    detached: AtomicBool,
}

impl SessionStore {
    pub fn new(gateway: Arc<dyn AuthGateway>, storage: Arc<dyn TokenStorage>) -> Self {
        Self {
            gateway,
            storage,
            state: RwLock::new(SessionState::default()),
            epoch: AtomicU64::new(0),
            detached: AtomicBool::new(false),
        }
    }

    pub fn snapshot(&self) -> SessionState {
        self.state.read().clone()
    }

    pub fn principal(&self) -> Option<Principal> {
        self.state.read().principal.clone()
    }

    /// The owner went away; results of calls still in flight are dropped.
    pub fn detach(&self) {
        self.detached.store(true, Ordering::SeqCst);
    }

    fn begin_action(&self) -> u64 {
        self.epoch.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn still_current(&self, epoch: u64) -> bool {
        !self.detached.load(Ordering::SeqCst) && self.epoch.load(Ordering::SeqCst) == epoch
    }

    fn clear_persisted(&self) {
        if let Err(e) = self.storage.clear_token() {
            tracing::warn!("Failed to clear persisted session token: {:#}", e);
        }
    }

    fn set_logged_out(&self) {
        *self.state.write() = SessionState {
            token: None,
            principal: None,
            resolved: true,
        };
    }

    /// Resync from the persisted credential. Never fails: any problem ends logged out.
    pub async fn initialize(&self) {
        let epoch = self.epoch.load(Ordering::SeqCst);

        let token = match self.storage.load_token() {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!("Unreadable session token, starting logged out: {:#}", e);
                if self.still_current(epoch) {
                    self.clear_persisted();
                    self.set_logged_out();
                }
                return;
            }
        };

        let Some(token) = token else {
            if self.still_current(epoch) {
                self.set_logged_out();
            }
            return;
        };

        let outcome = self.gateway.current_identity(&token).await;
        if !self.still_current(epoch) {
            tracing::debug!("Discarding stale session resync");
            return;
        }

        match outcome {
            Ok(principal) => {
                tracing::debug!(user = %principal.id, role = %principal.role, "session resynced");
                *self.state.write() = SessionState {
                    token: Some(token),
                    principal: Some(principal),
                    resolved: true,
                };
            }
            Err(err) => {
                tracing::debug!("Session resync failed, treating as logged out: {}", err);
                self.clear_persisted();
                self.set_logged_out();
            }
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Principal, AuthError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::Validation(
                "Please enter your email and password.".into(),
            ));
        }

        self.begin_action();
        let response = self.gateway.login(email, password).await?;
        if self.detached.load(Ordering::SeqCst) {
            return Ok(response.user);
        }

        match &response.token {
            Some(token) => {
                if let Err(e) = self.storage.save_token(token) {
                    tracing::warn!("Failed to persist session token: {:#}", e);
                }
            }
            None => tracing::warn!("Login response carried no token; session will not survive a reload"),
        }

        *self.state.write() = SessionState {
            token: response.token.clone(),
            principal: Some(response.user.clone()),
            resolved: true,
        };
        tracing::info!(user = %response.user.id, role = %response.user.role, "login succeeded");
        Ok(response.user)
    }

    /// Local clearing always happens; the backend call is best effort.
    pub async fn logout(&self) {
        self.begin_action();
        let token = self
            .state
            .read()
            .token
            .clone()
            .or_else(|| self.storage.load_token().ok().flatten());

        if let Err(e) = self.gateway.logout(token.as_deref()).await {
            tracing::debug!("Backend logout failed, clearing locally anyway: {}", e);
        }

        self.clear_persisted();
        self.set_logged_out();
    }

    /// Registration does not log in; new accounts start pending.
    pub async fn register(&self, request: &RegisterRequest) -> Result<String, AuthError> {
        if request.name.trim().is_empty()
            || request.email.trim().is_empty()
            || request.password.is_empty()
        {
            return Err(AuthError::Validation("Please fill in every field.".into()));
        }
        self.gateway.register(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::fake::{principal, FakeGateway};
    use crate::models::principal::{AccountStatus, Role};
    use crate::session::storage::testing::MemoryTokenStorage;
    use tokio::sync::Notify;

    fn store(gw: FakeGateway, storage: Arc<MemoryTokenStorage>) -> (SessionStore, Arc<FakeGateway>) {
        let gw = Arc::new(gw);
        (SessionStore::new(gw.clone(), storage), gw)
    }

    #[tokio::test]
    async fn starts_unresolved() {
        let (s, _) = store(FakeGateway::default(), Arc::new(MemoryTokenStorage::default()));
        let snap = s.snapshot();
        assert!(!snap.resolved);
        assert!(snap.principal.is_none());
    }

    #[tokio::test]
    async fn initialize_without_token_skips_backend() {
        let (s, gw) = store(FakeGateway::default(), Arc::new(MemoryTokenStorage::default()));
        s.initialize().await;
        assert_eq!(
            s.snapshot(),
            SessionState {
                token: None,
                principal: None,
                resolved: true
            }
        );
        assert_eq!(gw.call_count(), 0);
    }

    #[tokio::test]
    async fn initialize_with_expired_token_clears_it() {
        let storage = Arc::new(MemoryTokenStorage::with_token("expired"));
        let (s, _) = store(FakeGateway::default(), storage.clone());
        s.initialize().await;

        let snap = s.snapshot();
        assert!(snap.resolved);
        assert!(snap.principal.is_none());
        assert_eq!(storage.current(), None);
    }

    #[tokio::test]
    async fn initialize_transport_failure_degrades_to_logged_out() {
        let storage = Arc::new(MemoryTokenStorage::with_token("tok"));
        let gw = FakeGateway::with_session("tok", principal(Role::Admin, AccountStatus::Active));
        *gw.identity_error.lock() = Some(AuthError::Timeout);
        let (s, _) = store(gw, storage.clone());
        s.initialize().await;

        assert!(s.snapshot().resolved);
        assert!(s.principal().is_none());
        assert_eq!(storage.current(), None);
    }

    #[tokio::test]
    async fn initialize_restores_principal() {
        let storage = Arc::new(MemoryTokenStorage::with_token("tok"));
        let p = principal(Role::Developer, AccountStatus::Active);
        let (s, _) = store(FakeGateway::with_session("tok", p.clone()), storage.clone());
        s.initialize().await;

        let snap = s.snapshot();
        assert!(snap.resolved);
        assert_eq!(snap.principal, Some(p));
        assert_eq!(snap.token.as_deref(), Some("tok"));
        assert_eq!(storage.current().as_deref(), Some("tok"));
    }

    #[tokio::test]
    async fn login_persists_token_and_principal() {
        let storage = Arc::new(MemoryTokenStorage::default());
        let gw = FakeGateway::default();
        let p = principal(Role::Client, AccountStatus::Active);
        gw.accept_login("client@studio.test", "tok-9", p.clone());
        let (s, _) = store(gw, storage.clone());

        let got = s.login("  client@studio.test ", "pw").await.unwrap();
        assert_eq!(got, p);
        let snap = s.snapshot();
        assert!(snap.resolved);
        assert_eq!(snap.principal, Some(p));
        assert_eq!(storage.current().as_deref(), Some("tok-9"));
    }

    #[tokio::test]
    async fn failed_login_leaves_state_untouched() {
        let storage = Arc::new(MemoryTokenStorage::with_token("tok"));
        let p = principal(Role::Admin, AccountStatus::Active);
        let gw = FakeGateway::with_session("tok", p.clone());
        gw.reject_login("admin@studio.test", AuthError::InvalidCredentials);
        let (s, _) = store(gw, storage.clone());
        s.initialize().await;
        let before = s.snapshot();

        let err = s.login("admin@studio.test", "wrong").await.unwrap_err();
        assert_eq!(err, AuthError::InvalidCredentials);
        assert_eq!(s.snapshot(), before);
        assert_eq!(storage.current().as_deref(), Some("tok"));
    }

    #[tokio::test]
    async fn empty_login_fields_never_reach_backend() {
        let (s, gw) = store(FakeGateway::default(), Arc::new(MemoryTokenStorage::default()));
        assert!(matches!(s.login("", "pw").await, Err(AuthError::Validation(_))));
        assert!(matches!(s.login("a@b.test", "").await, Err(AuthError::Validation(_))));
        assert_eq!(gw.call_count(), 0);
    }

    #[tokio::test]
    async fn logout_clears_even_when_backend_fails() {
        let storage = Arc::new(MemoryTokenStorage::default());
        let mut gw = FakeGateway::default();
        gw.logout_fails = true;
        gw.accept_login("dev@studio.test", "tok", principal(Role::Developer, AccountStatus::Active));
        let (s, gw) = store(gw, storage.clone());

        s.login("dev@studio.test", "pw").await.unwrap();
        s.logout().await;

        assert_eq!(gw.logout_calls.load(std::sync::atomic::Ordering::SeqCst), 1);
        assert_eq!(storage.current(), None);
        let snap = s.snapshot();
        assert!(snap.principal.is_none());
        assert!(snap.token.is_none());
    }

    #[tokio::test]
    async fn register_does_not_log_in() {
        let storage = Arc::new(MemoryTokenStorage::default());
        let (s, _) = store(FakeGateway::default(), storage.clone());
        let msg = s
            .register(&RegisterRequest {
                name: "New Client".into(),
                email: "new@client.test".into(),
                password: "pw".into(),
            })
            .await
            .unwrap();
        assert_eq!(msg, "Registration received.");
        assert_eq!(s.snapshot(), SessionState::default());
        assert_eq!(storage.current(), None);
    }

    #[tokio::test]
    async fn reload_recovers_same_principal() {
        let storage = Arc::new(MemoryTokenStorage::default());
        let gw = Arc::new(FakeGateway::default());
        let p = principal(Role::Client, AccountStatus::Pending);
        gw.accept_login("client@studio.test", "tok-r", p.clone());

        let first = SessionStore::new(gw.clone(), storage.clone());
        first.login("client@studio.test", "pw").await.unwrap();
        drop(first);

        let reloaded = SessionStore::new(gw, storage);
        reloaded.initialize().await;
        let recovered = reloaded.principal().unwrap();
        assert_eq!(recovered.role, p.role);
        assert_eq!(recovered.status, p.status);
    }

    #[tokio::test]
    async fn detached_store_discards_resync_result() {
        let gate = Arc::new(Notify::new());
        let mut gw = FakeGateway::with_session("tok", principal(Role::Admin, AccountStatus::Active));
        gw.identity_gate = Some(gate.clone());
        let (s, _) = store(gw, Arc::new(MemoryTokenStorage::with_token("tok")));

        tokio::join!(s.initialize(), async {
            s.detach();
            gate.notify_one();
        });

        assert_eq!(s.snapshot(), SessionState::default());
    }

    #[tokio::test]
    async fn stale_resync_does_not_undo_a_login() {
        let gate = Arc::new(Notify::new());
        let storage = Arc::new(MemoryTokenStorage::with_token("stale"));
        let mut gw = FakeGateway::default();
        gw.identity_gate = Some(gate.clone());
        let p = principal(Role::Client, AccountStatus::Active);
        gw.accept_login("client@studio.test", "fresh", p.clone());
        let (s, _) = store(gw, storage.clone());

        tokio::join!(s.initialize(), async {
            s.login("client@studio.test", "pw").await.unwrap();
            gate.notify_one();
        });

        assert_eq!(s.principal(), Some(p));
        assert_eq!(storage.current().as_deref(), Some("fresh"));
    }
}
