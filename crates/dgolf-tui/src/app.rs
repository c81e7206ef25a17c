//! Application state management for the DGolf terminal client.
//!
//! The `App` struct owns the core services (auth, cache registration, API
//! client, outbox, device watcher) and all UI state. Data reads go through
//! the offline cache controller, so the same screens work with or without
//! a network; background refreshes report back over an mpsc channel.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use dgolf_core::api::{ApiClient, ApiError};
use dgolf_core::auth::{AuthManager, CredentialStore, ViewMode};
use dgolf_core::cache::{
    CacheConfig, FetchRequest, OfflineController, Registration, RouteOutcome, SwMessage,
    UpdateEvent,
};
use dgolf_core::config::AppConfig;
use dgolf_core::device::{DeviceSignals, DeviceWatcher};
use dgolf_core::models::{Article, Destination, InquiryCreate, Testimonial};
use dgolf_core::sync::InquiryOutbox;

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background task message channel.
const CHANNEL_BUFFER_SIZE: usize = 32;

/// Maximum length for email input.
pub const MAX_EMAIL_LENGTH: usize = 64;

/// Maximum length for password input.
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Maximum length for the inquiry message field.
pub const MAX_MESSAGE_LENGTH: usize = 500;

/// Approximate logical pixels per terminal cell, used to map the terminal
/// size onto the viewport breakpoints (96 cols ~ 768 px).
const CELL_WIDTH_PX: u32 = 8;
const CELL_HEIGHT_PX: u32 = 16;

// ============================================================================
// UI State Types
// ============================================================================

/// Main navigation tabs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Destinations,
    Articles,
    Account,
}

impl Tab {
    pub fn title(&self) -> &'static str {
        match self {
            Tab::Destinations => "Destinations",
            Tab::Articles => "Articles",
            Tab::Account => "Account",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            Tab::Destinations => Tab::Articles,
            Tab::Articles => Tab::Account,
            Tab::Account => Tab::Destinations,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            Tab::Destinations => Tab::Account,
            Tab::Articles => Tab::Destinations,
            Tab::Account => Tab::Articles,
        }
    }
}

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    LoggingIn,
    ComposingInquiry,
    ShowingHelp,
    ConfirmingQuit,
    ConfirmingUpdate,
    Quitting,
}

/// Login form focus state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginFocus {
    Email,
    Password,
    Button,
}

// ============================================================================
// Background Task Results
// ============================================================================

/// Results sent from background refresh tasks back to the main loop.
enum RefreshResult {
    Destinations(Vec<Destination>),
    Articles(Vec<Article>),
    Testimonials(Vec<Testimonial>),
    /// Connectivity as observed by a never-cached endpoint.
    Online(bool),
    /// Queued offline inquiries that reached the backend.
    OutboxFlushed(usize),
    Error(String),
    RefreshComplete,
}

/// Why a routed read produced no data.
enum ReadError {
    /// Served the structured offline payload; nothing cached.
    Offline,
    Http(StatusCode),
    Parse(String),
}

impl std::fmt::Display for ReadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReadError::Offline => write!(f, "offline with no cached copy"),
            ReadError::Http(status) => write!(f, "HTTP {status}"),
            ReadError::Parse(e) => write!(f, "unreadable response: {e}"),
        }
    }
}

// ============================================================================
// Main Application Struct
// ============================================================================

pub struct App {
    // Core services
    pub config: AppConfig,
    pub auth: AuthManager,
    pub api: ApiClient,
    pub registration: Registration,
    pub outbox: InquiryOutbox,
    pub device: DeviceWatcher,

    // UI state
    pub state: AppState,
    pub current_tab: Tab,
    pub destination_selection: usize,
    pub article_selection: usize,
    /// Compact layout: whether the detail pane has replaced the list.
    pub detail_open: bool,

    // Login form state
    pub login_email: String,
    pub login_password: String,
    pub login_focus: LoginFocus,
    pub login_error: Option<String>,

    // Inquiry compose state
    pub inquiry_message: String,

    // Cached data
    pub destinations: Vec<Destination>,
    pub articles: Vec<Article>,
    pub testimonials: Vec<Testimonial>,

    // Connectivity as last observed
    pub online: bool,

    // Update lifecycle
    pub update_available: Option<String>,
    update_rx: Option<watch::Receiver<UpdateEvent>>,

    // Background task channel
    refresh_rx: mpsc::Receiver<RefreshResult>,
    refresh_tx: mpsc::Sender<RefreshResult>,

    // Status message for the status bar
    pub status_message: Option<String>,
}

impl App {
    pub fn new(config: AppConfig, cols: u16, rows: u16) -> Result<Self> {
        let cache_dir = config.cache_dir()?;
        std::fs::create_dir_all(&cache_dir)?;

        let api = ApiClient::new(config.clone())?;
        let auth = AuthManager::new(api.clone(), cache_dir.clone());
        let outbox = InquiryOutbox::new(cache_dir);
        let device = DeviceWatcher::spawn(device_signals(cols, rows));

        let (refresh_tx, refresh_rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);

        let login_email = config.last_email.clone().unwrap_or_default();

        Ok(Self {
            config,
            auth,
            api,
            registration: Registration::new(),
            outbox,
            device,

            state: AppState::Normal,
            current_tab: Tab::Destinations,
            destination_selection: 0,
            article_selection: 0,
            detail_open: false,

            login_email,
            login_password: String::new(),
            login_focus: LoginFocus::Email,
            login_error: None,

            inquiry_message: String::new(),

            destinations: Vec::new(),
            articles: Vec::new(),
            testimonials: Vec::new(),

            online: true,

            update_available: None,
            update_rx: None,

            refresh_rx,
            refresh_tx,

            status_message: None,
        })
    }

    /// Register the offline cache controller and restore the session.
    /// Cache population failures are not fatal to startup: the app still
    /// works online without a warm cache.
    pub async fn startup(&mut self) -> Result<()> {
        let controller = OfflineController::new(
            self.cache_root()?,
            self.config.api_base_url.clone(),
            CacheConfig::default(),
            Arc::new(self.api.clone()),
        )?;

        if let Err(e) = self.registration.register(controller).await {
            warn!(error = %e, "Cache install failed, continuing without offline support");
        }
        self.update_rx = Some(self.registration.subscribe());

        if let Err(e) = self.auth.restore().await {
            warn!(error = %e, "Session restore failed");
        }

        self.refresh_all_background();
        Ok(())
    }

    fn cache_root(&self) -> Result<PathBuf> {
        Ok(self.config.cache_dir()?.join("responses"))
    }

    // =========================================================================
    // Selection helpers
    // =========================================================================

    pub fn selected_destination(&self) -> Option<&Destination> {
        self.destinations.get(self.destination_selection)
    }

    pub fn selected_article(&self) -> Option<&Article> {
        self.articles.get(self.article_selection)
    }

    pub fn move_selection(&mut self, delta: isize) {
        let (selection, len) = match self.current_tab {
            Tab::Destinations => (&mut self.destination_selection, self.destinations.len()),
            Tab::Articles => (&mut self.article_selection, self.articles.len()),
            Tab::Account => return,
        };
        if len == 0 {
            *selection = 0;
            return;
        }
        let new = (*selection as isize + delta).clamp(0, len as isize - 1);
        *selection = new as usize;
    }

    /// Testimonials for the currently selected destination.
    pub fn selected_destination_testimonials(&self) -> Vec<&Testimonial> {
        match self.selected_destination() {
            Some(dest) => self
                .testimonials
                .iter()
                .filter(|t| t.destination_id.as_deref() == Some(dest.id.as_str()))
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn view_mode(&self) -> ViewMode {
        self.auth.view_mode()
    }

    // =========================================================================
    // Background refresh
    // =========================================================================

    /// Refresh the catalog through the cache controller in the background.
    pub fn refresh_all_background(&mut self) {
        let Some(controller) = self.registration.active() else {
            warn!("No active cache controller, skipping refresh");
            return;
        };
        let base = self.config.api_base_url.clone();
        let tx = self.refresh_tx.clone();

        tokio::spawn(async move {
            Self::execute_background_refresh(tx, controller, base).await;
        });

        self.status_message = Some("Refreshing...".to_string());
    }

    async fn execute_background_refresh(
        tx: mpsc::Sender<RefreshResult>,
        controller: Arc<OfflineController>,
        base: String,
    ) {
        match read_json::<Vec<Destination>>(&controller, &format!("{base}/api/destinations")).await
        {
            Ok(destinations) => {
                let _ = tx.send(RefreshResult::Destinations(destinations)).await;
            }
            Err(e) => {
                let _ = tx
                    .send(RefreshResult::Error(format!("Destinations: {e}")))
                    .await;
            }
        }

        match read_json::<Vec<Article>>(&controller, &format!("{base}/api/articles")).await {
            Ok(articles) => {
                let _ = tx.send(RefreshResult::Articles(articles)).await;
            }
            Err(e) => {
                let _ = tx.send(RefreshResult::Error(format!("Articles: {e}"))).await;
            }
        }

        // Testimonials are never cached, so this read doubles as a
        // connectivity probe.
        match read_json::<Vec<Testimonial>>(&controller, &format!("{base}/api/testimonials")).await
        {
            Ok(testimonials) => {
                let _ = tx.send(RefreshResult::Online(true)).await;
                let _ = tx.send(RefreshResult::Testimonials(testimonials)).await;
            }
            Err(ReadError::Offline) => {
                let _ = tx.send(RefreshResult::Online(false)).await;
            }
            Err(e) => {
                let _ = tx
                    .send(RefreshResult::Error(format!("Testimonials: {e}")))
                    .await;
            }
        }

        let _ = tx.send(RefreshResult::RefreshComplete).await;
    }

    /// Drain completed background work and update state. Called every tick.
    pub async fn check_background_tasks(&mut self) {
        let mut results = Vec::new();
        while let Ok(result) = self.refresh_rx.try_recv() {
            results.push(result);
        }
        for result in results {
            self.process_refresh_result(result);
        }

        self.check_update_events().await;
    }

    fn process_refresh_result(&mut self, result: RefreshResult) {
        match result {
            RefreshResult::Destinations(data) => {
                self.destination_selection = self
                    .destination_selection
                    .min(data.len().saturating_sub(1));
                self.destinations = data;
            }
            RefreshResult::Articles(data) => {
                self.article_selection = self.article_selection.min(data.len().saturating_sub(1));
                self.articles = data;
            }
            RefreshResult::Testimonials(data) => {
                self.testimonials = data;
            }
            RefreshResult::Online(online) => {
                if self.online != online {
                    info!(online, "Connectivity changed");
                }
                self.online = online;
                if online {
                    self.flush_outbox_background();
                }
            }
            RefreshResult::OutboxFlushed(count) => {
                self.status_message = Some(format!("Sent {count} queued inquiries"));
            }
            RefreshResult::Error(message) => {
                debug!(message = %message, "Refresh error");
                self.status_message = Some(message);
            }
            RefreshResult::RefreshComplete => {
                if self.status_message.as_deref() == Some("Refreshing...") {
                    self.status_message = None;
                }
            }
        }
    }

    async fn check_update_events(&mut self) {
        let Some(rx) = self.update_rx.as_mut() else {
            return;
        };
        if !rx.has_changed().unwrap_or(false) {
            return;
        }
        let event = rx.borrow_and_update().clone();
        if let UpdateEvent::UpdateAvailable { version } = event {
            info!(version = %version, "Cache update available");
            self.update_available = Some(version);
            if matches!(self.state, AppState::Normal) {
                self.state = AppState::ConfirmingUpdate;
            }
        }
    }

    /// Promote the waiting controller and re-read through the new cache.
    pub async fn apply_update(&mut self) {
        if let Err(e) = self.registration.post_message(SwMessage::SkipWaiting).await {
            warn!(error = %e, "Update activation failed");
            self.status_message = Some("Update failed".to_string());
        } else if let Some(version) = self.update_available.take() {
            self.status_message = Some(format!("Updated to {version}"));
            self.refresh_all_background();
        }
        self.state = AppState::Normal;
    }

    pub fn dismiss_update(&mut self) {
        // Keep the version around: the account tab still offers the update.
        self.state = AppState::Normal;
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    pub async fn submit_login(&mut self) {
        let email = self.login_email.trim().to_string();
        let password = self.login_password.clone();
        if email.is_empty() || password.is_empty() {
            self.login_error = Some("Email and password are required".to_string());
            return;
        }

        match self.auth.login(&email, &password).await {
            Ok(user) => {
                // Role decides the landing view with no second round trip.
                self.status_message = Some(if user.is_admin {
                    format!("Welcome back, {} (admin)", user.full_name)
                } else {
                    format!("Welcome back, {}", user.full_name)
                });
                self.current_tab = Tab::Account;
                self.state = AppState::Normal;
                self.login_password.clear();
                self.login_error = None;

                self.config.last_email = Some(email.clone());
                if let Err(e) = self.config.save() {
                    warn!(error = %e, "Failed to save config");
                }
                if let Err(e) = CredentialStore::store(&email, &password) {
                    debug!(error = %e, "Keychain unavailable, not remembering password");
                }

                self.refresh_all_background();
            }
            Err(e) => {
                self.login_error = Some(e.user_message("Login failed"));
            }
        }
    }

    pub fn logout(&mut self) {
        if let Err(e) = self.auth.logout() {
            warn!(error = %e, "Logout cleanup failed");
        }
        self.status_message = Some("Logged out".to_string());
    }

    pub fn set_demo_mode(&mut self, mode: ViewMode) {
        if let Err(e) = self.auth.set_demo_mode(mode) {
            warn!(error = %e, "Failed to persist view mode");
        }
    }

    // =========================================================================
    // Inquiries
    // =========================================================================

    fn build_inquiry(&self) -> Option<InquiryCreate> {
        let destination = self.selected_destination()?;
        let (name, email) = match self.auth.user() {
            Some(user) => (user.full_name.clone(), user.email.clone()),
            None => ("Guest".to_string(), self.login_email.clone()),
        };
        Some(InquiryCreate {
            name,
            email,
            phone: None,
            destination_id: Some(destination.id.clone()),
            destination_name: Some(destination.name.clone()),
            dates: None,
            group_size: None,
            budget: None,
            message: Some(self.inquiry_message.clone()),
        })
    }

    /// Submit the composed inquiry; network failures queue it instead.
    pub async fn submit_inquiry(&mut self) {
        let Some(inquiry) = self.build_inquiry() else {
            self.state = AppState::Normal;
            return;
        };

        match self.api.create_inquiry(&inquiry).await {
            Ok(_) => {
                self.status_message = Some("Inquiry sent".to_string());
            }
            Err(ApiError::NetworkError(_)) => {
                match self.outbox.enqueue(inquiry) {
                    Ok(()) => {
                        self.online = false;
                        self.status_message =
                            Some("Offline - inquiry queued for sync".to_string());
                    }
                    Err(e) => {
                        warn!(error = %e, "Failed to queue inquiry");
                        self.status_message = Some("Could not queue inquiry".to_string());
                    }
                }
            }
            Err(e) => {
                self.status_message = Some(e.user_message("Could not send inquiry"));
            }
        }

        self.inquiry_message.clear();
        self.state = AppState::Normal;
    }

    fn flush_outbox_background(&self) {
        if self.outbox.pending_count() == 0 {
            return;
        }
        let api = self.api.clone();
        let outbox = InquiryOutbox::new(match self.config.cache_dir() {
            Ok(dir) => dir,
            Err(_) => return,
        });
        let tx = self.refresh_tx.clone();
        tokio::spawn(async move {
            match outbox.flush(&api).await {
                Ok(0) => {}
                Ok(count) => {
                    let _ = tx.send(RefreshResult::OutboxFlushed(count)).await;
                }
                Err(e) => {
                    warn!(error = %e, "Outbox flush failed");
                }
            }
        });
    }

    // =========================================================================
    // Device adaptation
    // =========================================================================

    pub fn on_resize(&mut self, cols: u16, rows: u16) {
        self.device.signals(device_signals(cols, rows));
    }
}

/// Map the terminal geometry onto viewport-style signals.
fn device_signals(cols: u16, rows: u16) -> DeviceSignals {
    DeviceSignals::new(
        format!(
            "dgolf/{} ({}; {})",
            env!("CARGO_PKG_VERSION"),
            std::env::consts::OS,
            std::env::consts::ARCH
        ),
        u32::from(cols) * CELL_WIDTH_PX,
        u32::from(rows) * CELL_HEIGHT_PX,
    )
}

/// Route a GET through the controller and decode the JSON body.
async fn read_json<T: DeserializeOwned>(
    controller: &OfflineController,
    url: &str,
) -> Result<T, ReadError> {
    let request = FetchRequest::get(url);
    let response = match controller.route(&request).await {
        RouteOutcome::Response(response) => response,
        // GETs are always intercepted; non-GETs never come through here.
        RouteOutcome::Bypass => return Err(ReadError::Http(StatusCode::METHOD_NOT_ALLOWED)),
    };

    if response.status == StatusCode::SERVICE_UNAVAILABLE {
        if let Ok(value) = serde_json::from_slice::<serde_json::Value>(&response.body) {
            if value.get("offline").and_then(|v| v.as_bool()) == Some(true) {
                return Err(ReadError::Offline);
            }
        }
    }
    if !response.status.is_success() {
        return Err(ReadError::Http(response.status));
    }

    serde_json::from_slice(&response.body).map_err(|e| ReadError::Parse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tab_cycle_wraps() {
        assert_eq!(Tab::Destinations.next(), Tab::Articles);
        assert_eq!(Tab::Account.next(), Tab::Destinations);
        assert_eq!(Tab::Destinations.prev(), Tab::Account);
    }

    #[test]
    fn test_device_signals_scale_cells_to_pixels() {
        let signals = device_signals(96, 40);
        assert_eq!(signals.width, 768);
        assert_eq!(signals.height, 640);
    }
}
