//! Power event watcher
//!
//! Polls the battery source and turns state changes into discrete events:
//! charger connect/disconnect edges plus battery readings. Edges are sent
//! before the reading that revealed them, so a consumer always learns about
//! the new charger state before it sees the level.

use crate::power::BatterySource;
use chargeguard_core::BatteryReading;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Events delivered to the monitoring daemon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PowerEvent {
    /// Charger plugged in; carries the reading observed at the edge.
    Connected(BatteryReading),
    /// Charger unplugged.
    Disconnected,
    /// Battery level or charging state changed.
    Reading(BatteryReading),
}

#[derive(Debug, Clone)]
pub struct WatcherConfig {
    pub poll_interval: Duration,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
        }
    }
}

/// Polls a [`BatterySource`] and feeds [`PowerEvent`]s into a channel.
pub struct PowerWatcher {
    source: BatterySource,
    config: WatcherConfig,
}

impl PowerWatcher {
    pub fn new(source: BatterySource, config: WatcherConfig) -> Self {
        Self { source, config }
    }

    /// Start the polling task.
    ///
    /// The first successful sample is delivered as a plain `Reading`; connect
    /// and disconnect edges are only reported for changes observed while
    /// running, matching platforms that broadcast power events edge-triggered.
    pub fn spawn(self, tx: mpsc::Sender<PowerEvent>) -> JoinHandle<()> {
        tokio::spawn(async move {
            tracing::info!(
                interval_secs = self.config.poll_interval.as_secs(),
                "power watcher started"
            );
            let mut ticker = tokio::time::interval(self.config.poll_interval);
            let mut previous: Option<BatteryReading> = None;

            loop {
                ticker.tick().await;

                let reading = match self.source.read() {
                    Ok(reading) => reading,
                    Err(e) => {
                        tracing::warn!("battery read failed: {}", e);
                        continue;
                    }
                };

                for event in diff_events(previous, reading) {
                    if tx.send(event).await.is_err() {
                        tracing::debug!("event channel closed, stopping power watcher");
                        return;
                    }
                }
                previous = Some(reading);
            }
        })
    }
}

/// Compute the events a new sample produces relative to the previous one.
fn diff_events(previous: Option<BatteryReading>, next: BatteryReading) -> Vec<PowerEvent> {
    let mut events = Vec::new();

    match previous {
        None => events.push(PowerEvent::Reading(next)),
        Some(prev) => {
            if !prev.is_charging && next.is_charging {
                events.push(PowerEvent::Connected(next));
            } else if prev.is_charging && !next.is_charging {
                events.push(PowerEvent::Disconnected);
            }
            if prev != next {
                events.push(PowerEvent::Reading(next));
            }
        }
    }

    events
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(level: u8, charging: bool) -> BatteryReading {
        BatteryReading::new(level, charging)
    }

    #[test]
    fn test_first_sample_is_plain_reading() {
        let events = diff_events(None, reading(50, true));
        assert_eq!(events, vec![PowerEvent::Reading(reading(50, true))]);
    }

    #[test]
    fn test_unchanged_sample_is_silent() {
        let events = diff_events(Some(reading(50, false)), reading(50, false));
        assert!(events.is_empty());
    }

    #[test]
    fn test_level_change_emits_reading() {
        let events = diff_events(Some(reading(50, true)), reading(51, true));
        assert_eq!(events, vec![PowerEvent::Reading(reading(51, true))]);
    }

    #[test]
    fn test_connect_edge_precedes_reading() {
        let events = diff_events(Some(reading(50, false)), reading(50, true));
        assert_eq!(
            events,
            vec![
                PowerEvent::Connected(reading(50, true)),
                PowerEvent::Reading(reading(50, true)),
            ]
        );
    }

    #[test]
    fn test_disconnect_edge_precedes_reading() {
        let events = diff_events(Some(reading(80, true)), reading(79, false));
        assert_eq!(
            events,
            vec![
                PowerEvent::Disconnected,
                PowerEvent::Reading(reading(79, false)),
            ]
        );
    }

    #[tokio::test]
    async fn test_watcher_stops_when_channel_closes() {
        // Closed receiver: the send fails and the task returns instead of
        // polling forever.
        use crate::power::{BatterySource, PowerPaths};
        use std::fs;
        use tempfile::TempDir;

        let dir = TempDir::new().unwrap();
        let bat = dir.path().join("BAT0");
        fs::create_dir_all(&bat).unwrap();
        fs::write(bat.join("type"), "Battery").unwrap();
        fs::write(bat.join("capacity"), "50").unwrap();
        fs::write(bat.join("status"), "Discharging").unwrap();

        let source = BatterySource::with_paths(PowerPaths {
            supply_dir: dir.path().to_path_buf(),
            battery: bat.clone(),
            charger: dir.path().join("missing"),
        })
        .unwrap();

        let (tx, rx) = mpsc::channel(1);
        drop(rx);

        let watcher = PowerWatcher::new(
            source,
            WatcherConfig {
                poll_interval: Duration::from_millis(10),
            },
        );
        let handle = watcher.spawn(tx);
        handle.await.unwrap();
    }
}
