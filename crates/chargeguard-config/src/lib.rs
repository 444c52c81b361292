//! Preference persistence
//!
//! Durable key/value settings backing the monitoring daemon: target level,
//! auto-start, alarm choice, and outbound message configuration. TOML on
//! disk, read once when a session starts and overwritten as a whole group on
//! every user change; there are no merge semantics.

use chargeguard_core::{
    AlarmChoice, AutoStartSettings, LEVEL_TOKEN, OutboundMessage, SessionConfig, SessionOrigin,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("target level {0} is outside the valid range 1-100")]
    InvalidTarget(u8),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

/// System-wide fallback configuration path.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/chargeguard/config.toml";

pub const DEFAULT_MESSAGE: &str = "Battery charged to [LEVEL]%! Please unplug the charger.";

/// Persisted alarm sound selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AlarmKind {
    #[default]
    Default,
    Notification,
    Ringtone,
    Custom,
}

/// Outbound message API credentials, separate from the per-user settings so
/// they can live in the system-wide file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhatsappApi {
    #[serde(default = "default_api_url")]
    pub url: String,
    #[serde(default)]
    pub phone_number_id: String,
    #[serde(default)]
    pub access_token: String,
}

impl Default for WhatsappApi {
    fn default() -> Self {
        Self {
            url: default_api_url(),
            phone_number_id: String::new(),
            access_token: String::new(),
        }
    }
}

fn default_api_url() -> String {
    "https://graph.facebook.com/v19.0".to_string()
}

/// User preferences, the whole persisted record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default = "default_target_level")]
    pub target_level: u8,

    #[serde(default = "default_auto_start")]
    pub auto_start: bool,

    #[serde(default)]
    pub alarm_type: AlarmKind,

    #[serde(default)]
    pub custom_alarm_uri: String,

    #[serde(default)]
    pub whatsapp_enabled: bool,

    #[serde(default)]
    pub whatsapp_number: String,

    #[serde(default = "default_message")]
    pub custom_message: String,

    #[serde(default)]
    pub api: WhatsappApi,
}

fn default_target_level() -> u8 {
    80
}

fn default_auto_start() -> bool {
    true
}

fn default_message() -> String {
    DEFAULT_MESSAGE.to_string()
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            target_level: default_target_level(),
            auto_start: default_auto_start(),
            alarm_type: AlarmKind::default(),
            custom_alarm_uri: String::new(),
            whatsapp_enabled: false,
            whatsapp_number: String::new(),
            custom_message: default_message(),
            api: WhatsappApi::default(),
        }
    }
}

impl Preferences {
    /// Load preferences from a file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let prefs: Self = toml::from_str(&contents)?;
        prefs.validate()?;
        Ok(prefs)
    }

    /// Load from the default locations: user config first, then the
    /// system-wide file, then built-in defaults.
    pub fn load_default() -> Result<Self, ConfigError> {
        if let Some(user_config) = Self::user_config_path()
            && user_config.exists()
        {
            return Self::load(&user_config);
        }

        let system_config = Path::new(SYSTEM_CONFIG_PATH);
        if system_config.exists() {
            return Self::load(system_config);
        }

        tracing::warn!("no configuration file found, using defaults");
        Ok(Self::default())
    }

    /// Save preferences to a file, overwriting the whole record.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        self.validate()?;
        let contents = toml::to_string_pretty(self)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, contents)?;
        tracing::info!("preferences saved to {}", path.display());
        Ok(())
    }

    /// Save to the default user configuration location.
    pub fn save_default(&self) -> Result<(), ConfigError> {
        let Some(path) = Self::user_config_path() else {
            return Err(ConfigError::Io(std::io::Error::other(
                "cannot resolve user config directory",
            )));
        };
        self.save(&path)
    }

    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("chargeguard").join("config.toml"))
    }

    /// Reject values a session must never be started with.
    ///
    /// This is the configuration boundary: an out-of-range target is refused
    /// here and never stored.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.target_level) {
            return Err(ConfigError::InvalidTarget(self.target_level));
        }
        if self.whatsapp_enabled && !self.custom_message.contains(LEVEL_TOKEN) {
            tracing::warn!("custom message has no [LEVEL] token, level will not appear in it");
        }
        Ok(())
    }

    /// The alarm sound selection as the core type.
    pub fn alarm_choice(&self) -> AlarmChoice {
        match self.alarm_type {
            AlarmKind::Default => AlarmChoice::Default,
            AlarmKind::Notification => AlarmChoice::Notification,
            AlarmKind::Ringtone => AlarmChoice::Ringtone,
            AlarmKind::Custom => AlarmChoice::Custom(self.custom_alarm_uri.clone()),
        }
    }

    /// Outbound message settings, when enabled and routable.
    pub fn outbound(&self) -> Option<OutboundMessage> {
        if self.whatsapp_enabled && !self.whatsapp_number.is_empty() {
            Some(OutboundMessage {
                destination: self.whatsapp_number.clone(),
                template: self.custom_message.clone(),
            })
        } else {
            None
        }
    }

    /// Freeze these preferences into a manual session config.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            target_level: self.target_level,
            origin: SessionOrigin::Manual,
            start_level: 0,
            alarm_choice: self.alarm_choice(),
            outbound: self.outbound(),
        }
    }

    /// Snapshot consulted by the engine on charger-connect events.
    pub fn auto_start_settings(&self) -> AutoStartSettings {
        AutoStartSettings {
            enabled: self.auto_start,
            target_level: self.target_level,
            alarm_choice: self.alarm_choice(),
            outbound: self.outbound(),
        }
    }
}
