//! Monitoring state machine
//!
//! One engine instance owns the single process-wide session. Every entry
//! point fully computes a transition and returns the ordered side effects for
//! it; callers must execute the effects in order and must not feed the next
//! event until they have done so.

use crate::session::{
    AutoStartSettings, BatteryReading, SessionConfig, SessionOrigin, render_template,
};
use crate::{AlarmChoice, StartError};

/// The single session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitoringState {
    /// No active session.
    Idle,
    /// Session active, target not yet reached.
    Monitoring {
        config: SessionConfig,
        last_reading: Option<BatteryReading>,
    },
    /// Target reached, alarm latched, awaiting user acknowledgement.
    AlarmActive {
        config: SessionConfig,
        trigger_reading: BatteryReading,
    },
}

/// Side-effect requests emitted by transitions, in execution order.
///
/// A failure executing a later effect must never roll back or block an
/// earlier one; the alarm keeps sounding even if the outbound message fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Start the audible alarm.
    StartAlarm(AlarmChoice),
    /// Stop the audible alarm.
    StopAlarm,
    /// Update the ongoing status display.
    ShowStatus { text: String, ongoing: bool },
    /// Raise the high-priority alarm notification with stop/close actions.
    ShowAlarmNotification { text: String },
    /// Dispatch an outbound message (fire-and-forget).
    SendMessage { destination: String, body: String },
    /// The session ended; the surrounding service may tear down.
    StopSession,
}

/// Battery monitoring state machine.
pub struct MonitorEngine {
    state: MonitoringState,
}

impl MonitorEngine {
    pub fn new() -> Self {
        Self {
            state: MonitoringState::Idle,
        }
    }

    /// Current state, for status queries and presentation.
    pub fn state(&self) -> &MonitoringState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, MonitoringState::Idle)
    }

    /// Start a session on explicit user request.
    ///
    /// Rejects targets outside 1-100 and start requests while a session is
    /// already active; a rejected start leaves the state untouched.
    pub fn start_manual(&mut self, config: SessionConfig) -> Result<Vec<Effect>, StartError> {
        if !(1..=100).contains(&config.target_level) {
            return Err(StartError::InvalidTarget(config.target_level));
        }
        if !self.is_idle() {
            return Err(StartError::AlreadyMonitoring);
        }

        tracing::info!(target_level = config.target_level, "monitoring started");
        let effects = vec![Effect::ShowStatus {
            text: format!("Monitoring for {}% charge level", config.target_level),
            ongoing: true,
        }];
        self.state = MonitoringState::Monitoring {
            config,
            last_reading: None,
        };
        Ok(effects)
    }

    /// Charger-connect event.
    ///
    /// Starts an auto session when idle and the preference is enabled.
    /// Deliberately never checks the trigger condition here, even when the
    /// connect-time level already meets the target: detection runs on battery
    /// reading delivery only, so there is a single trigger code path. The
    /// next reading fires the alarm if the level qualifies.
    pub fn handle_power_connected(
        &mut self,
        reading: BatteryReading,
        settings: &AutoStartSettings,
    ) -> Vec<Effect> {
        if !self.is_idle() || !settings.enabled {
            return Vec::new();
        }
        if !(1..=100).contains(&settings.target_level) {
            tracing::warn!(
                target_level = settings.target_level,
                "ignoring auto-start with out-of-range target"
            );
            return Vec::new();
        }
        // Auto sessions only exist while charging.
        if !reading.is_charging {
            return Vec::new();
        }

        let config = settings.clone().into_session_config(reading.level_percent);
        tracing::info!(
            target_level = config.target_level,
            start_level = config.start_level,
            "auto-start monitoring on charger connect"
        );
        let effects = vec![Effect::ShowStatus {
            text: format!(
                "Monitoring for {}% charge level (auto-started at {}%)",
                config.target_level, config.start_level
            ),
            ongoing: true,
        }];
        self.state = MonitoringState::Monitoring {
            config,
            last_reading: Some(reading),
        };
        effects
    }

    /// Charger-disconnect event.
    ///
    /// Auto sessions end here; manual sessions keep running until the user
    /// stops them, and a latched alarm outlives the cable.
    pub fn handle_power_disconnected(&mut self) -> Vec<Effect> {
        let auto = matches!(
            &self.state,
            MonitoringState::Monitoring { config, .. }
                if config.origin == SessionOrigin::AutoStart
        );
        if !auto {
            return Vec::new();
        }

        tracing::info!("charger disconnected, ending auto-start session");
        self.state = MonitoringState::Idle;
        vec![
            Effect::ShowStatus {
                text: "Monitoring stopped".to_string(),
                ongoing: false,
            },
            Effect::StopSession,
        ]
    }

    /// Battery status event, the core decision point.
    ///
    /// Updates the last reading and status display, and fires the alarm on
    /// the first reading where the battery is charging at or above the
    /// target. Readings are ignored while idle or once the alarm is latched.
    pub fn handle_battery_reading(&mut self, reading: BatteryReading) -> Vec<Effect> {
        let state = std::mem::replace(&mut self.state, MonitoringState::Idle);
        match state {
            MonitoringState::Monitoring { config, .. } => {
                let mut effects = vec![Effect::ShowStatus {
                    text: status_text(reading, config.target_level),
                    ongoing: true,
                }];

                if reading.is_charging && reading.level_percent >= config.target_level {
                    tracing::info!(
                        level = reading.level_percent,
                        target_level = config.target_level,
                        "target reached, triggering alarm"
                    );
                    effects.push(Effect::StartAlarm(config.alarm_choice.clone()));
                    effects.push(Effect::ShowAlarmNotification {
                        text: format!(
                            "Battery charged to {}%! Tap to stop alarm.",
                            reading.level_percent
                        ),
                    });
                    if let Some(outbound) = &config.outbound
                        && !outbound.destination.is_empty()
                    {
                        effects.push(Effect::SendMessage {
                            destination: outbound.destination.clone(),
                            body: render_template(&outbound.template, reading.level_percent),
                        });
                    }
                    self.state = MonitoringState::AlarmActive {
                        config,
                        trigger_reading: reading,
                    };
                } else {
                    self.state = MonitoringState::Monitoring {
                        config,
                        last_reading: Some(reading),
                    };
                }
                effects
            }
            other => {
                // Idle: nothing to monitor. AlarmActive: alarm already
                // latched, a session never re-triggers.
                self.state = other;
                Vec::new()
            }
        }
    }

    /// Explicit stop from the user, valid in any active state.
    ///
    /// Idempotent: calling it while idle is a no-op and emits nothing.
    pub fn stop_manual(&mut self) -> Vec<Effect> {
        match std::mem::replace(&mut self.state, MonitoringState::Idle) {
            MonitoringState::Idle => Vec::new(),
            MonitoringState::Monitoring { .. } => {
                tracing::info!("monitoring stopped by user");
                vec![stopped_status(), Effect::StopSession]
            }
            MonitoringState::AlarmActive { .. } => {
                tracing::info!("alarm stopped by user");
                vec![Effect::StopAlarm, stopped_status(), Effect::StopSession]
            }
        }
    }

    /// User acknowledgement of an active alarm.
    ///
    /// Converges on the same teardown as [`stop_manual`](Self::stop_manual)
    /// so near-simultaneous stop/close actions collapse to a single
    /// [`Effect::StopAlarm`]; a no-op in any other state.
    pub fn acknowledge_alarm(&mut self) -> Vec<Effect> {
        if matches!(self.state, MonitoringState::AlarmActive { .. }) {
            self.stop_manual()
        } else {
            Vec::new()
        }
    }
}

impl Default for MonitorEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn status_text(reading: BatteryReading, target_level: u8) -> String {
    if reading.is_charging {
        format!(
            "Charging: {}% (Target: {}%)",
            reading.level_percent, target_level
        )
    } else {
        format!(
            "Not charging: {}% - Connect charger",
            reading.level_percent
        )
    }
}

fn stopped_status() -> Effect {
    Effect::ShowStatus {
        text: "Monitoring stopped".to_string(),
        ongoing: false,
    }
}
