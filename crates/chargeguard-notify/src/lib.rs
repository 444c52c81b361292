//! Notification presentation
//!
//! Projects monitoring status onto desktop notifications via `notify-send`.
//! Two independent channels: a low-priority ongoing status that is replaced
//! in place, and a critical alarm notification raised once when the target is
//! reached. Holds no decision logic; the control socket carries the stop and
//! close actions back to the daemon.

use std::process::Command;

const APP_NAME: &str = "chargeguard";

/// Stable replace-ids so each channel updates its own notification.
const STATUS_ID: u32 = 4270;
const ALARM_ID: u32 = 4271;

/// Presents monitoring state as desktop notifications.
pub struct NotificationPresenter {
    enabled: bool,
}

impl NotificationPresenter {
    pub fn new() -> Self {
        Self { enabled: true }
    }

    /// Presenter that drops everything, for headless runs.
    pub fn disabled() -> Self {
        Self { enabled: false }
    }

    /// Update the ongoing status channel in place.
    ///
    /// `ongoing` keeps the notification resident while a session is live;
    /// a non-ongoing update (session ended) expires normally.
    pub fn show_status(&self, text: &str, ongoing: bool) {
        self.send(status_args(text, ongoing));
    }

    /// Raise the high-priority alarm notification.
    ///
    /// Names the two actions the user can take; both arrive through the
    /// control socket as stop-alarm and close-alarm commands. The actions
    /// are spelled out in the body rather than attached with `-A`:
    /// `notify-send -A` blocks until the user reacts, and this runs inside
    /// the engine's synchronous effect sequence.
    pub fn show_alarm(&self, text: &str) {
        self.send(alarm_args(text));
    }

    fn send(&self, args: Vec<String>) {
        if !self.enabled {
            return;
        }
        match Command::new("notify-send").args(&args).output() {
            Ok(output) if !output.status.success() => {
                tracing::warn!(
                    "notify-send exited with {}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                );
            }
            Ok(_) => {}
            Err(e) => tracing::warn!("notify-send failed: {}", e),
        }
    }
}

impl Default for NotificationPresenter {
    fn default() -> Self {
        Self::new()
    }
}

fn status_args(text: &str, ongoing: bool) -> Vec<String> {
    let mut args = vec![
        "-a".to_string(),
        APP_NAME.to_string(),
        "-r".to_string(),
        STATUS_ID.to_string(),
        "-u".to_string(),
        "low".to_string(),
    ];
    if ongoing {
        // Never expire while the session is live.
        args.push("-t".to_string());
        args.push("0".to_string());
    }
    args.push("Battery Alarm".to_string());
    args.push(text.to_string());
    args
}

fn alarm_args(text: &str) -> Vec<String> {
    vec![
        "-a".to_string(),
        APP_NAME.to_string(),
        "-r".to_string(),
        ALARM_ID.to_string(),
        "-u".to_string(),
        "critical".to_string(),
        "Battery Alarm".to_string(),
        format!("{}\nStop: chargeguardctl stop-alarm / Close: chargeguardctl close", text),
    ]
}
