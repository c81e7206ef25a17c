//! Authentication module for managing user sessions and credentials.
//!
//! This module provides:
//! - `Session`: persisted bearer-token storage restored on startup
//! - `AuthManager`: the login/logout/restore lifecycle over the API client
//! - `ViewMode`: explicit demo/guest/authenticated view selection
//! - `CredentialStore`: secure OS-level credential storage via keyring
//!
//! The token and the resolved user never disagree outside the in-flight
//! whoami window: every path that clears one clears the other.

pub mod credentials;
pub mod manager;
pub mod session;
pub mod view_mode;

pub use credentials::CredentialStore;
pub use manager::{AuthManager, AuthPhase};
pub use session::{Session, SessionData};
pub use view_mode::{ViewMode, ViewModeStore};
