//! Platform battery interface
//!
//! Reads battery charge level and charging state from the Linux power-supply
//! class in sysfs, and turns changes into discrete [`PowerEvent`]s for the
//! monitoring daemon. The kernel exposes these as plain attribute files, so
//! the watcher polls and diffs rather than waiting on inotify.

pub mod power;
pub mod watcher;

pub use power::{BatterySource, PowerPaths};
pub use watcher::{PowerEvent, PowerWatcher, WatcherConfig};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HalError {
    #[error("no battery found under {0}")]
    NoBattery(PathBuf),

    #[error("unreadable power-supply attribute {path}: {reason}")]
    BadAttribute { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
