//! Control socket protocol
//!
//! JSON-lines over a Unix domain socket: one command per line in, one
//! response per line out. This is the surface the UI, notification actions,
//! and scripts drive the daemon through.

use chargeguard_config::AlarmKind;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Commands accepted on the control socket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum ControlCommand {
    /// Start a manual monitoring session, persisting any supplied settings
    /// first.
    Start(StartParams),
    /// Stop the active session (monitoring or alarm).
    Stop,
    /// Acknowledge the active alarm.
    StopAlarm,
    /// Acknowledge the active alarm and shut the daemon down.
    CloseAlarm,
    /// Report the current state.
    Status,
}

/// Optional settings carried by a start command; unset fields keep their
/// persisted values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StartParams {
    pub target_level: Option<u8>,
    pub auto_start: Option<bool>,
    pub alarm_type: Option<AlarmKind>,
    pub custom_alarm_uri: Option<String>,
    pub whatsapp_enabled: Option<bool>,
    pub whatsapp_number: Option<String>,
    pub custom_message: Option<String>,
}

/// One response line per command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

impl ControlResponse {
    pub fn ok() -> Self {
        Self {
            ok: true,
            error: None,
            state: None,
        }
    }

    pub fn ok_with_state(state: String) -> Self {
        Self {
            ok: true,
            error: None,
            state: Some(state),
        }
    }

    pub fn err(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: Some(error.into()),
            state: None,
        }
    }
}

/// Resolve the control socket path: the user runtime dir when available,
/// otherwise a world-readable fallback under /tmp.
pub fn socket_path() -> PathBuf {
    dirs::runtime_dir()
        .map(|dir| dir.join("chargeguard.sock"))
        .unwrap_or_else(|| PathBuf::from("/tmp/chargeguard.sock"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_round_trip() {
        let cmd = ControlCommand::Start(StartParams {
            target_level: Some(90),
            whatsapp_enabled: Some(true),
            ..StartParams::default()
        });
        let line = serde_json::to_string(&cmd).unwrap();
        let parsed: ControlCommand = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed, cmd);
    }

    #[test]
    fn test_plain_commands_parse() {
        for (line, expected) in [
            (r#"{"cmd":"stop"}"#, ControlCommand::Stop),
            (r#"{"cmd":"stop_alarm"}"#, ControlCommand::StopAlarm),
            (r#"{"cmd":"close_alarm"}"#, ControlCommand::CloseAlarm),
            (r#"{"cmd":"status"}"#, ControlCommand::Status),
        ] {
            let parsed: ControlCommand = serde_json::from_str(line).unwrap();
            assert_eq!(parsed, expected);
        }
    }

    #[test]
    fn test_start_with_partial_params() {
        let parsed: ControlCommand =
            serde_json::from_str(r#"{"cmd":"start","target_level":85}"#).unwrap();
        let ControlCommand::Start(params) = parsed else {
            panic!("expected start");
        };
        assert_eq!(params.target_level, Some(85));
        assert_eq!(params.auto_start, None);
    }

    #[test]
    fn test_response_serialization_skips_empty_fields() {
        let line = serde_json::to_string(&ControlResponse::ok()).unwrap();
        assert_eq!(line, r#"{"ok":true}"#);

        let line = serde_json::to_string(&ControlResponse::err("bad target")).unwrap();
        assert!(line.contains("bad target"));
    }
}
