//! Notification collaborator.
//!
//! The reminder scheduler only talks to the `Notifier` trait; the desktop
//! implementation sits on top of the system notification center. Delivery is
//! best-effort with no acknowledgment or retry.

use anyhow::Result;
use notify_rust::{Notification, Timeout};

/// Platform notification permission, checked at reminder-arrangement time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionState {
    Granted,
    Denied,
    Undetermined,
}

pub trait Notifier {
    fn permission_state(&self) -> PermissionState;

    /// Ask the platform for permission. May resolve immediately (desktop) or
    /// stay `Undetermined` until the user answers a prompt.
    fn request_permission(&mut self);

    fn show(&self, title: &str, body: &str) -> Result<()>;
}

/// Desktop notifications via the system notification center.
///
/// Desktops have no runtime permission prompt, so permission starts
/// `Undetermined` and resolves to `Granted` on request; `set_enabled(false)`
/// maps to `Denied` so callers can honor a user opt-out.
pub struct DesktopNotifier {
    enabled: bool,
    requested: bool,
}

impl DesktopNotifier {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            requested: false,
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}

impl Default for DesktopNotifier {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Notifier for DesktopNotifier {
    fn permission_state(&self) -> PermissionState {
        if !self.enabled {
            PermissionState::Denied
        } else if self.requested {
            PermissionState::Granted
        } else {
            PermissionState::Undetermined
        }
    }

    fn request_permission(&mut self) {
        self.requested = true;
    }

    fn show(&self, title: &str, body: &str) -> Result<()> {
        Notification::new()
            .summary(title)
            .body(body)
            .timeout(Timeout::Milliseconds(10000))
            .show()
            .map_err(|e| anyhow::anyhow!("Failed to show notification: {}", e))?;

        Ok(())
    }
}

/// Recording notifier for tests: counts deliveries instead of showing them.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    pub permission: Option<PermissionState>,
    pub shown: std::cell::RefCell<Vec<(String, String)>>,
}

impl RecordingNotifier {
    pub fn granted() -> Self {
        Self {
            permission: Some(PermissionState::Granted),
            shown: std::cell::RefCell::new(Vec::new()),
        }
    }

    pub fn denied() -> Self {
        Self {
            permission: Some(PermissionState::Denied),
            shown: std::cell::RefCell::new(Vec::new()),
        }
    }

    pub fn shown_titles(&self) -> Vec<String> {
        self.shown.borrow().iter().map(|(t, _)| t.clone()).collect()
    }
}

impl Notifier for RecordingNotifier {
    fn permission_state(&self) -> PermissionState {
        self.permission.unwrap_or(PermissionState::Undetermined)
    }

    fn request_permission(&mut self) {
        self.permission = Some(PermissionState::Granted);
    }

    fn show(&self, title: &str, body: &str) -> Result<()> {
        self.shown
            .borrow_mut()
            .push((title.to_string(), body.to_string()));
        Ok(())
    }
}
