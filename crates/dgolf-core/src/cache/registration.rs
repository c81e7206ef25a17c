//! Controller registration and update lifecycle.
//!
//! A registration holds at most one *active* and one *waiting* controller.
//! Registering a new version installs it; if another version is already
//! active, the new controller parks as waiting and an `UpdateAvailable`
//! event goes out on the event channel. The waiting controller only takes
//! over after an explicit `SkipWaiting` message, mirroring how a page
//! confirms an update before reloading.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info};

use super::controller::OfflineController;
use super::types::CacheError;

/// Messages a client can post to the registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwMessage {
    /// Promote the waiting controller immediately.
    SkipWaiting,
}

/// Lifecycle notifications published to clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateEvent {
    /// No controller has been registered yet.
    None,
    /// A new version finished installing while another is active.
    UpdateAvailable { version: String },
    /// A controller activated and claimed all clients.
    Activated { version: String },
}

pub struct Registration {
    active: Option<Arc<OfflineController>>,
    waiting: Option<Arc<OfflineController>>,
    events_tx: watch::Sender<UpdateEvent>,
    events_rx: watch::Receiver<UpdateEvent>,
}

impl Default for Registration {
    fn default() -> Self {
        Self::new()
    }
}

impl Registration {
    pub fn new() -> Self {
        let (events_tx, events_rx) = watch::channel(UpdateEvent::None);
        Self {
            active: None,
            waiting: None,
            events_tx,
            events_rx,
        }
    }

    /// Subscribe to lifecycle events. The receiver always reflects the
    /// latest event, so late subscribers see the current state.
    pub fn subscribe(&self) -> watch::Receiver<UpdateEvent> {
        self.events_rx.clone()
    }

    /// The query half of the message protocol: the active cache version.
    pub fn active_version(&self) -> Option<String> {
        self.active.as_ref().map(|c| c.version().to_string())
    }

    /// The controller currently governing requests, if any.
    pub fn active(&self) -> Option<Arc<OfflineController>> {
        self.active.clone()
    }

    pub fn has_waiting(&self) -> bool {
        self.waiting.is_some()
    }

    /// Install a controller and integrate it into the lifecycle.
    ///
    /// - No active controller: activate immediately and claim.
    /// - Same version as active: refresh install, no update event.
    /// - Different version: park as waiting, publish `UpdateAvailable`.
    ///
    /// A version whose store was fully installed by an earlier process
    /// skips the install step, so a warm cache stays usable when the
    /// process starts offline. An install failure aborts registration and
    /// leaves the current active controller (if any) in place.
    pub async fn register(
        &mut self,
        controller: OfflineController,
    ) -> Result<(), CacheError> {
        if controller.store().is_ready() {
            debug!(version = %controller.version(), "Store already installed, skipping install");
        } else {
            controller.install().await?;
        }
        let controller = Arc::new(controller);

        let same_as_active = self
            .active
            .as_ref()
            .map(|active| active.version() == controller.version());

        match same_as_active {
            None => {
                self.activate(controller).await?;
            }
            Some(true) => {
                debug!(version = %controller.version(), "Re-registered current version");
            }
            Some(false) => {
                let version = controller.version().to_string();
                info!(version = %version, "Update installed, waiting for activation");
                self.waiting = Some(controller);
                let _ = self.events_tx.send(UpdateEvent::UpdateAvailable { version });
            }
        }
        Ok(())
    }

    /// Handle a client message.
    pub async fn post_message(&mut self, message: SwMessage) -> Result<(), CacheError> {
        match message {
            SwMessage::SkipWaiting => {
                if let Some(waiting) = self.waiting.take() {
                    self.activate(waiting).await?;
                }
                Ok(())
            }
        }
    }

    async fn activate(
        &mut self,
        controller: Arc<OfflineController>,
    ) -> Result<(), CacheError> {
        controller.activate().await?;
        let version = controller.version().to_string();
        self.active = Some(controller);
        // Claim: every subscriber observes the new governing version.
        let _ = self.events_tx.send(UpdateEvent::Activated { version });
        Ok(())
    }
}
