//! The authentication lifecycle.
//!
//! `Unauthenticated` -> `Restoring(token)` -> `Authenticated(user)` or back
//! to `Unauthenticated`; the terminal states only transition again through
//! a fresh login. Expected failures come back as structured errors carrying
//! the server's message, so UI code never needs exception handling for them.

use std::path::PathBuf;

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::api::{ApiClient, ApiError};
use crate::models::User;

use super::session::{Session, SessionData};
use super::view_mode::{ViewMode, ViewModeStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPhase {
    /// A persisted token is being revalidated against the server.
    Restoring,
    Authenticated,
    Unauthenticated,
}

pub struct AuthManager {
    api: ApiClient,
    session: Session,
    view_modes: ViewModeStore,
    user: Option<User>,
    phase: AuthPhase,
}

impl AuthManager {
    pub fn new(api: ApiClient, cache_dir: PathBuf) -> Self {
        Self {
            api,
            session: Session::new(cache_dir.clone()),
            view_modes: ViewModeStore::new(cache_dir),
            user: None,
            phase: AuthPhase::Unauthenticated,
        }
    }

    pub fn phase(&self) -> AuthPhase {
        self.phase
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.user.as_ref().map(|u| u.is_admin).unwrap_or(false)
    }

    pub fn view_mode(&self) -> ViewMode {
        if self.is_authenticated() {
            ViewMode::Authenticated
        } else {
            self.view_modes.load()
        }
    }

    /// Enter a demo preview mode. Ignored while actually authenticated.
    pub fn set_demo_mode(&mut self, mode: ViewMode) -> Result<()> {
        if !self.is_authenticated() {
            self.view_modes.save(mode)?;
        }
        Ok(())
    }

    /// Restore a persisted session by replaying the whoami call.
    /// No stored token means there is nothing to do.
    pub async fn restore(&mut self) -> Result<()> {
        if !self.session.load()? {
            self.phase = AuthPhase::Unauthenticated;
            return Ok(());
        }

        let token = self
            .session
            .token()
            .map(str::to_string)
            .unwrap_or_default();
        self.phase = AuthPhase::Restoring;
        self.api.set_token(&token);
        debug!("Restoring persisted session");

        let result = self.api.me().await;
        self.apply_whoami(result)
    }

    /// Apply the outcome of a whoami call. 401/403 invalidates the stored
    /// session; any other failure class is transient and leaves the token
    /// on disk for retry on next start.
    fn apply_whoami(&mut self, result: Result<User, ApiError>) -> Result<()> {
        match result {
            Ok(user) => {
                info!(email = %user.email, "Session restored");
                self.user = Some(user);
                self.phase = AuthPhase::Authenticated;
            }
            Err(e) if e.invalidates_session() => {
                warn!("Stored token rejected, clearing session");
                self.clear_local_state()?;
            }
            Err(e) => {
                debug!(error = %e, "Whoami failed transiently, keeping token");
                self.user = None;
                self.phase = AuthPhase::Unauthenticated;
            }
        }
        Ok(())
    }

    /// Authenticate and persist the issued token. Returns the resolved user
    /// so the caller can branch on role without a second round trip.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<User, ApiError> {
        let response = self.api.login(email, password).await?;
        self.adopt(response.access_token, response.user.clone());
        Ok(response.user)
    }

    /// Create an account; the backend issues a token immediately.
    pub async fn register(
        &mut self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<User, ApiError> {
        let response = self.api.register(email, password, full_name).await?;
        self.adopt(response.access_token, response.user.clone());
        Ok(response.user)
    }

    fn adopt(&mut self, token: String, user: User) {
        self.session
            .update(SessionData::new(token.clone(), user.email.clone()));
        if let Err(e) = self.session.save() {
            // The login itself succeeded; losing persistence only costs
            // the session surviving a restart.
            warn!(error = %e, "Failed to persist session");
        }
        self.api.set_token(&token);
        self.user = Some(user);
        self.phase = AuthPhase::Authenticated;
    }

    /// End the session. Durable storage is cleared before in-memory state
    /// so no intermediate read can observe a stale authenticated session.
    pub fn logout(&mut self) -> Result<()> {
        self.clear_local_state()?;
        info!("Logged out");
        Ok(())
    }

    fn clear_local_state(&mut self) -> Result<()> {
        // Storage first, then state.
        self.session.clear()?;
        self.view_modes.clear()?;
        self.api.clear_token();
        self.user = None;
        self.phase = AuthPhase::Unauthenticated;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use tempfile::TempDir;

    fn manager(dir: &TempDir) -> AuthManager {
        let config = AppConfig {
            api_base_url: "https://api.dgolf.invalid".to_string(),
            last_email: None,
        };
        let api = ApiClient::new(config).unwrap();
        AuthManager::new(api, dir.path().to_path_buf())
    }

    fn seeded_manager(dir: &TempDir) -> AuthManager {
        let mut m = manager(dir);
        m.session
            .update(SessionData::new("tok-1".into(), "eva@example.se".into()));
        m.session.save().unwrap();
        m.api.set_token("tok-1");
        m
    }

    fn sample_user(is_admin: bool) -> User {
        serde_json::from_value(serde_json::json!({
            "id": "u-1",
            "email": "eva@example.se",
            "full_name": "Eva Berg",
            "is_admin": is_admin,
        }))
        .unwrap()
    }

    #[test]
    fn test_whoami_rejection_clears_token_and_user() {
        // After a 401 both the in-memory user and persisted token are gone.
        let dir = TempDir::new().unwrap();
        let mut m = seeded_manager(&dir);

        m.apply_whoami(Err(ApiError::Unauthorized)).unwrap();

        assert!(m.user().is_none());
        assert!(m.api.token().is_none());
        let mut reloaded = Session::new(dir.path().to_path_buf());
        assert!(!reloaded.load().unwrap());
    }

    #[test]
    fn test_transient_whoami_failure_keeps_token() {
        let dir = TempDir::new().unwrap();
        let mut m = seeded_manager(&dir);

        m.apply_whoami(Err(ApiError::ServerError("boom".into())))
            .unwrap();

        assert!(m.user().is_none());
        assert_eq!(m.phase(), AuthPhase::Unauthenticated);
        // Token survives for retry on next start.
        assert_eq!(m.api.token().as_deref(), Some("tok-1"));
        let mut reloaded = Session::new(dir.path().to_path_buf());
        assert!(reloaded.load().unwrap());
    }

    #[test]
    fn test_whoami_success_authenticates() {
        let dir = TempDir::new().unwrap();
        let mut m = seeded_manager(&dir);

        m.apply_whoami(Ok(sample_user(true))).unwrap();

        assert_eq!(m.phase(), AuthPhase::Authenticated);
        assert!(m.is_admin());
        assert_eq!(m.view_mode(), ViewMode::Authenticated);
    }

    #[test]
    fn test_adopt_then_logout_clears_everything() {
        // Logout clears storage and state at once.
        let dir = TempDir::new().unwrap();
        let mut m = manager(&dir);

        m.adopt("tok-2".into(), sample_user(true));
        assert!(m.is_authenticated());
        assert!(m.is_admin());
        assert_eq!(m.api.token().as_deref(), Some("tok-2"));

        m.logout().unwrap();

        assert!(!m.is_authenticated());
        assert!(m.api.token().is_none());
        assert_eq!(m.view_mode(), ViewMode::Guest);
        let mut reloaded = Session::new(dir.path().to_path_buf());
        assert!(!reloaded.load().unwrap());
    }

    #[test]
    fn test_demo_mode_ignored_while_authenticated() {
        let dir = TempDir::new().unwrap();
        let mut m = manager(&dir);
        m.adopt("tok-3".into(), sample_user(false));

        m.set_demo_mode(ViewMode::DemoAdmin).unwrap();
        assert_eq!(m.view_mode(), ViewMode::Authenticated);
    }
}
