//! Device classification and the adaptive-layout switch.
//!
//! Classification is pure: a `DeviceSignals` snapshot maps to the same
//! `DeviceProfile` every time, and nothing here is persisted. The profile
//! only selects which UI composition to mount; it never gates business
//! logic or changes a request.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use tokio::sync::{mpsc, watch};
use tracing::debug;

/// Width at or below which a viewport is mobile.
pub const MOBILE_MAX_WIDTH: u32 = 768;

/// Upper bound of the tablet width band (exclusive above).
pub const TABLET_MAX_WIDTH: u32 = 1024;

/// Resize debounce. Classification is idempotent per snapshot, so collapsing
/// bursts only avoids redundant re-renders.
const RESIZE_DEBOUNCE_MS: u64 = 120;

static MOBILE_UA: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Android|webOS|iPhone|iPad|iPod|BlackBerry|IEMobile|Opera Mini")
        .expect("mobile UA pattern is valid")
});

/// Raw signals sampled from the rendering context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceSignals {
    pub user_agent: String,
    pub width: u32,
    pub height: u32,
    pub touch_points: u32,
}

impl DeviceSignals {
    pub fn new(user_agent: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            user_agent: user_agent.into(),
            width,
            height,
            touch_points: 0,
        }
    }

    pub fn with_touch(mut self, touch_points: u32) -> Self {
        self.touch_points = touch_points;
        self
    }
}

/// Derived classification. The flags are not mutually exclusive (a
/// tablet-width viewport with a mobile user agent sets both); `is_mobile`
/// is the authoritative switch between the two UI compositions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceProfile {
    pub is_mobile: bool,
    pub is_tablet: bool,
    pub is_desktop: bool,
    pub is_touch: bool,
    pub width: u32,
    pub height: u32,
}

impl DeviceProfile {
    pub fn layout(&self) -> LayoutKind {
        if self.is_mobile {
            LayoutKind::Mobile
        } else {
            LayoutKind::Desktop
        }
    }
}

/// Which of the two parallel UI compositions to mount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutKind {
    Mobile,
    Desktop,
}

/// Classify a snapshot of signals.
pub fn classify(signals: &DeviceSignals) -> DeviceProfile {
    let ua = signals.user_agent.as_str();

    let mobile_ua = MOBILE_UA.is_match(ua);
    let is_mobile = mobile_ua || signals.width <= MOBILE_MAX_WIDTH;

    let tablet_width = signals.width > MOBILE_MAX_WIDTH && signals.width <= TABLET_MAX_WIDTH;
    let tablet_ua = contains_ignore_case(ua, "iPad")
        || (contains_ignore_case(ua, "Android") && contains_ignore_case(ua, "Mobile"));
    let is_tablet = tablet_width || tablet_ua;

    let is_desktop = signals.width > TABLET_MAX_WIDTH && !mobile_ua;

    DeviceProfile {
        is_mobile,
        is_tablet,
        is_desktop,
        // Touch support is independent of the size classification.
        is_touch: signals.touch_points > 0,
        width: signals.width,
        height: signals.height,
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_ascii_lowercase().contains(&needle.to_ascii_lowercase())
}

/// Debounced re-classification on resize events.
///
/// Push every raw resize through [`DeviceWatcher::signals`]; the watcher
/// collapses bursts and publishes the latest profile on a watch channel.
pub struct DeviceWatcher {
    signals_tx: mpsc::UnboundedSender<DeviceSignals>,
    profile_rx: watch::Receiver<DeviceProfile>,
}

impl DeviceWatcher {
    /// Spawn the watcher with an initial snapshot, classified immediately.
    pub fn spawn(initial: DeviceSignals) -> Self {
        let (signals_tx, mut signals_rx) = mpsc::unbounded_channel::<DeviceSignals>();
        let (profile_tx, profile_rx) = watch::channel(classify(&initial));

        tokio::spawn(async move {
            while let Some(mut latest) = signals_rx.recv().await {
                // Debounce: keep absorbing signals until the burst goes quiet.
                loop {
                    tokio::select! {
                        next = signals_rx.recv() => match next {
                            Some(signals) => latest = signals,
                            None => break,
                        },
                        _ = tokio::time::sleep(Duration::from_millis(RESIZE_DEBOUNCE_MS)) => break,
                    }
                }
                let profile = classify(&latest);
                debug!(width = profile.width, mobile = profile.is_mobile, "Device reclassified");
                if profile_tx.send(profile).is_err() {
                    break;
                }
            }
        });

        Self {
            signals_tx,
            profile_rx,
        }
    }

    /// Report a resize (or other signal change).
    pub fn signals(&self, signals: DeviceSignals) {
        let _ = self.signals_tx.send(signals);
    }

    /// Subscribe to profile updates.
    pub fn subscribe(&self) -> watch::Receiver<DeviceProfile> {
        self.profile_rx.clone()
    }

    /// The most recently published profile.
    pub fn current(&self) -> DeviceProfile {
        *self.profile_rx.borrow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DESKTOP_UA: &str =
        "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0";
    const IPHONE_UA: &str =
        "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 Mobile/15E148";
    const IPAD_UA: &str =
        "Mozilla/5.0 (iPad; CPU OS 16_0 like Mac OS X) AppleWebKit/605.1.15";

    #[test]
    fn test_classification_is_idempotent() {
        // Repeated classification of a fixed tuple drifts nowhere.
        let signals = DeviceSignals::new(DESKTOP_UA, 1200, 800);
        let first = classify(&signals);
        for _ in 0..10 {
            assert_eq!(classify(&signals), first);
        }
    }

    #[test]
    fn test_narrow_desktop_browser_is_mobile() {
        // Width alone is sufficient, even with a desktop user agent.
        let profile = classify(&DeviceSignals::new(DESKTOP_UA, 600, 900));
        assert!(profile.is_mobile);
        assert!(!profile.is_desktop);
        assert_eq!(profile.layout(), LayoutKind::Mobile);
    }

    #[test]
    fn test_mobile_ua_wide_viewport_is_still_mobile() {
        let profile = classify(&DeviceSignals::new(IPHONE_UA, 1400, 900));
        assert!(profile.is_mobile);
        assert!(!profile.is_desktop);
    }

    #[test]
    fn test_width_boundaries() {
        let at_768 = classify(&DeviceSignals::new(DESKTOP_UA, 768, 800));
        assert!(at_768.is_mobile);
        assert!(!at_768.is_tablet);

        let at_769 = classify(&DeviceSignals::new(DESKTOP_UA, 769, 800));
        assert!(!at_769.is_mobile);
        assert!(at_769.is_tablet);

        let at_1024 = classify(&DeviceSignals::new(DESKTOP_UA, 1024, 800));
        assert!(at_1024.is_tablet);
        assert!(!at_1024.is_desktop);

        let at_1025 = classify(&DeviceSignals::new(DESKTOP_UA, 1025, 800));
        assert!(at_1025.is_desktop);
        assert_eq!(at_1025.layout(), LayoutKind::Desktop);
    }

    #[test]
    fn test_tablet_ua_overlaps_mobile() {
        // iPad UA at tablet width: both flags set, mobile wins the layout.
        let profile = classify(&DeviceSignals::new(IPAD_UA, 900, 1200));
        assert!(profile.is_tablet);
        assert!(profile.is_mobile);
        assert_eq!(profile.layout(), LayoutKind::Mobile);
    }

    #[test]
    fn test_touch_does_not_affect_size_classes() {
        let untouched = classify(&DeviceSignals::new(DESKTOP_UA, 1400, 900));
        let touched = classify(&DeviceSignals::new(DESKTOP_UA, 1400, 900).with_touch(5));
        assert!(!untouched.is_touch);
        assert!(touched.is_touch);
        assert_eq!(untouched.is_mobile, touched.is_mobile);
        assert_eq!(untouched.is_desktop, touched.is_desktop);
    }

    #[tokio::test(start_paused = true)]
    async fn test_watcher_debounces_resize_bursts() {
        // Resizing 1200px -> 600px flips the layout without restart.
        let watcher = DeviceWatcher::spawn(DeviceSignals::new(DESKTOP_UA, 1200, 800));
        assert_eq!(watcher.current().layout(), LayoutKind::Desktop);

        let mut updates = watcher.subscribe();

        // A burst of intermediate widths collapses to the last one.
        for width in [1100, 900, 700, 600] {
            watcher.signals(DeviceSignals::new(DESKTOP_UA, width, 800));
        }

        updates.changed().await.unwrap();
        let profile = *updates.borrow();
        assert_eq!(profile.width, 600);
        assert!(profile.is_mobile);
        assert_eq!(profile.layout(), LayoutKind::Mobile);
    }
}
