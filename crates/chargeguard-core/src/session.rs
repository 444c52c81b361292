//! Session configuration and battery value types

use serde::{Deserialize, Serialize};

/// Token in outbound message templates replaced with the battery level.
pub const LEVEL_TOKEN: &str = "[LEVEL]";

/// A single battery observation delivered by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatteryReading {
    /// Charge level in percent (0-100).
    pub level_percent: u8,
    /// Whether the battery is currently charging (or full with the charger
    /// attached).
    pub is_charging: bool,
}

impl BatteryReading {
    pub fn new(level_percent: u8, is_charging: bool) -> Self {
        Self {
            level_percent,
            is_charging,
        }
    }
}

/// How a monitoring session was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionOrigin {
    /// Explicit user request.
    Manual,
    /// Created automatically on charger connect.
    AutoStart,
}

/// Which sound the alarm controller should play when the target is reached.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlarmChoice {
    /// System default alarm sound.
    #[default]
    Default,
    /// Notification sound.
    Notification,
    /// Ringtone sound.
    Ringtone,
    /// User-supplied sound file.
    Custom(String),
}

/// Outbound message settings for one session.
///
/// Presence of this value means outbound messaging is enabled; the template
/// may contain the literal [`LEVEL_TOKEN`] which is substituted with the
/// trigger level at send time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub destination: String,
    pub template: String,
}

/// Immutable snapshot of user intent for one monitoring session.
///
/// Frozen when the session starts; the engine never consults the settings
/// store mid-session, so a live settings edit cannot change an active
/// session's trigger behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Charge level (1-100) at which the alarm fires.
    pub target_level: u8,
    pub origin: SessionOrigin,
    /// Battery level observed at session start. Meaningful only for
    /// `AutoStart` sessions; used for status display.
    pub start_level: u8,
    pub alarm_choice: AlarmChoice,
    pub outbound: Option<OutboundMessage>,
}

impl SessionConfig {
    /// Manual session with default alarm and no outbound message.
    pub fn manual(target_level: u8) -> Self {
        Self {
            target_level,
            origin: SessionOrigin::Manual,
            start_level: 0,
            alarm_choice: AlarmChoice::Default,
            outbound: None,
        }
    }
}

/// Settings snapshot consulted when a charger-connect event arrives.
///
/// The caller reads this from the settings store at the instant of the event;
/// the engine holds no reference to the store itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoStartSettings {
    pub enabled: bool,
    pub target_level: u8,
    pub alarm_choice: AlarmChoice,
    pub outbound: Option<OutboundMessage>,
}

impl AutoStartSettings {
    /// Build the frozen session config for an auto-started session.
    pub(crate) fn into_session_config(self, start_level: u8) -> SessionConfig {
        SessionConfig {
            target_level: self.target_level,
            origin: SessionOrigin::AutoStart,
            start_level,
            alarm_choice: self.alarm_choice,
            outbound: self.outbound,
        }
    }
}

/// Substitute the `[LEVEL]` token in a message template.
///
/// Only the exact bracketed token is replaced; other occurrences of the
/// substring "LEVEL" are left untouched.
pub fn render_template(template: &str, level_percent: u8) -> String {
    template.replace(LEVEL_TOKEN, &level_percent.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_template() {
        let out = render_template("Battery charged to [LEVEL]%!", 85);
        assert_eq!(out, "Battery charged to 85%!");
    }

    #[test]
    fn test_render_template_leaves_bare_level_alone() {
        let out = render_template("LEVEL is [LEVEL], SEA_LEVEL unchanged", 42);
        assert_eq!(out, "LEVEL is 42, SEA_LEVEL unchanged");
    }

    #[test]
    fn test_render_template_multiple_tokens() {
        let out = render_template("[LEVEL] and again [LEVEL]", 7);
        assert_eq!(out, "7 and again 7");
    }

    #[test]
    fn test_manual_config_defaults() {
        let config = SessionConfig::manual(80);
        assert_eq!(config.target_level, 80);
        assert_eq!(config.origin, SessionOrigin::Manual);
        assert!(config.outbound.is_none());
    }

    #[test]
    fn test_auto_start_settings_freeze() {
        let settings = AutoStartSettings {
            enabled: true,
            target_level: 90,
            alarm_choice: AlarmChoice::Ringtone,
            outbound: None,
        };
        let config = settings.into_session_config(55);
        assert_eq!(config.origin, SessionOrigin::AutoStart);
        assert_eq!(config.start_level, 55);
        assert_eq!(config.target_level, 90);
        assert_eq!(config.alarm_choice, AlarmChoice::Ringtone);
    }

    #[test]
    fn test_alarm_choice_serde() {
        let json = serde_json::to_string(&AlarmChoice::Custom("/tmp/a.ogg".into())).unwrap();
        let parsed: AlarmChoice = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, AlarmChoice::Custom("/tmp/a.ogg".into()));
    }
}
