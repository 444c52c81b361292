//! Battery monitoring core
//!
//! The monitoring engine consumes power/battery events and decides when a
//! charging session starts, when the configured target level is reached, and
//! when the alarm starts and stops. It performs no I/O itself: every
//! transition returns an ordered list of [`Effect`] values that the caller
//! hands to the alarm, notification, and messaging collaborators.
//!
//! # Example
//!
//! ```
//! use chargeguard_core::{BatteryReading, Effect, MonitorEngine, SessionConfig};
//!
//! let mut engine = MonitorEngine::new();
//! let effects = engine.start_manual(SessionConfig::manual(80)).unwrap();
//! assert!(matches!(effects[0], Effect::ShowStatus { .. }));
//!
//! let effects = engine.handle_battery_reading(BatteryReading::new(80, true));
//! assert!(effects.iter().any(|e| matches!(e, Effect::StartAlarm(_))));
//! ```

pub mod engine;
pub mod session;

pub use engine::{Effect, MonitorEngine, MonitoringState};
pub use session::{
    AlarmChoice, AutoStartSettings, BatteryReading, LEVEL_TOKEN, OutboundMessage, SessionConfig,
    SessionOrigin, render_template,
};

use thiserror::Error;

/// Errors surfaced when a monitoring session cannot be started.
///
/// These are the only failures the engine reports to its caller; side-effect
/// failures are contained inside the collaborators that execute them.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StartError {
    #[error("target level {0} is outside the valid range 1-100")]
    InvalidTarget(u8),

    #[error("a monitoring session is already active")]
    AlreadyMonitoring,
}
