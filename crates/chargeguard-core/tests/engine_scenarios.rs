//! End-to-end session scenarios against the monitoring engine

use chargeguard_core::{
    AlarmChoice, AutoStartSettings, BatteryReading, Effect, MonitorEngine, MonitoringState,
    SessionConfig, SessionOrigin, StartError,
};

fn reading(level: u8, charging: bool) -> BatteryReading {
    BatteryReading::new(level, charging)
}

fn auto_settings(target: u8) -> AutoStartSettings {
    AutoStartSettings {
        enabled: true,
        target_level: target,
        alarm_choice: AlarmChoice::Default,
        outbound: None,
    }
}

fn count_alarm_starts(effects: &[Effect]) -> usize {
    effects
        .iter()
        .filter(|e| matches!(e, Effect::StartAlarm(_)))
        .count()
}

/// Manual session, target 80: readings 50 then 80 walk
/// Idle -> Monitoring -> AlarmActive with exactly one alarm start.
#[test]
fn manual_session_reaches_target() {
    let mut engine = MonitorEngine::new();
    assert!(engine.is_idle());

    engine.start_manual(SessionConfig::manual(80)).unwrap();
    assert!(matches!(engine.state(), MonitoringState::Monitoring { .. }));

    let mut alarm_starts = 0;
    alarm_starts += count_alarm_starts(&engine.handle_battery_reading(reading(50, true)));
    assert!(matches!(engine.state(), MonitoringState::Monitoring { .. }));

    alarm_starts += count_alarm_starts(&engine.handle_battery_reading(reading(80, true)));
    assert!(matches!(engine.state(), MonitoringState::AlarmActive { .. }));
    assert_eq!(alarm_starts, 1);

    // Duplicate delivery of the trigger reading must not start a second alarm.
    alarm_starts += count_alarm_starts(&engine.handle_battery_reading(reading(80, true)));
    assert_eq!(alarm_starts, 1);
}

/// Charger connect at a level already past the target: the session opens
/// without trigger-checking, and the next reading fires the alarm.
#[test]
fn auto_start_above_target_fires_on_next_reading() {
    let mut engine = MonitorEngine::new();

    let effects = engine.handle_power_connected(reading(85, true), &auto_settings(80));
    assert_eq!(count_alarm_starts(&effects), 0);
    let MonitoringState::Monitoring { config, .. } = engine.state() else {
        panic!("expected Monitoring after connect");
    };
    assert_eq!(config.origin, SessionOrigin::AutoStart);
    assert_eq!(config.start_level, 85);

    let effects = engine.handle_battery_reading(reading(85, true));
    assert_eq!(count_alarm_starts(&effects), 1);
    assert!(matches!(engine.state(), MonitoringState::AlarmActive { .. }));
}

/// Manual sessions ignore charger disconnect entirely.
#[test]
fn manual_session_ignores_disconnect() {
    let mut engine = MonitorEngine::new();
    engine.start_manual(SessionConfig::manual(80)).unwrap();

    assert!(engine.handle_power_disconnected().is_empty());
    assert!(matches!(engine.state(), MonitoringState::Monitoring { .. }));

    // Still triggers later as usual.
    let effects = engine.handle_battery_reading(reading(80, true));
    assert_eq!(count_alarm_starts(&effects), 1);
}

/// Near-simultaneous "close" and "stop" while the alarm is active produce
/// exactly one StopAlarm effect and end in Idle.
#[test]
fn stop_close_race_is_idempotent() {
    let mut engine = MonitorEngine::new();
    engine.start_manual(SessionConfig::manual(80)).unwrap();
    engine.handle_battery_reading(reading(80, true));

    let first = engine.acknowledge_alarm();
    let second = engine.stop_manual();

    let stops = first
        .iter()
        .chain(second.iter())
        .filter(|e| matches!(e, Effect::StopAlarm))
        .count();
    assert_eq!(stops, 1);
    assert!(second.is_empty());
    assert!(engine.is_idle());
}

/// A rejected start leaves the engine exactly where it was.
#[test]
fn rejected_start_changes_nothing() {
    let mut engine = MonitorEngine::new();
    assert_eq!(
        engine.start_manual(SessionConfig::manual(0)),
        Err(StartError::InvalidTarget(0))
    );
    assert_eq!(
        engine.start_manual(SessionConfig::manual(101)),
        Err(StartError::InvalidTarget(101))
    );
    assert!(engine.is_idle());

    // And a fresh session can still start normally afterwards.
    engine.start_manual(SessionConfig::manual(100)).unwrap();
    assert!(matches!(engine.state(), MonitoringState::Monitoring { .. }));
}

/// A full auto-start lifecycle: connect, charge, disconnect before target.
#[test]
fn auto_session_full_lifecycle() {
    let mut engine = MonitorEngine::new();

    engine.handle_power_connected(reading(40, true), &auto_settings(80));
    engine.handle_battery_reading(reading(41, true));
    engine.handle_battery_reading(reading(42, true));

    let effects = engine.handle_power_disconnected();
    assert!(effects.contains(&Effect::StopSession));
    assert!(engine.is_idle());

    // A new connect opens a fresh session with a new start level.
    engine.handle_power_connected(reading(42, true), &auto_settings(80));
    let MonitoringState::Monitoring { config, .. } = engine.state() else {
        panic!("expected Monitoring");
    };
    assert_eq!(config.start_level, 42);
}
