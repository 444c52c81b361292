//! Battery and charger state from sysfs
//!
//! Reads charge level and charging status from the power-supply class,
//! auto-detecting the battery and charger entries by their `type` attribute.

use crate::HalError;
use chargeguard_core::BatteryReading;
use std::fs;
use std::path::{Path, PathBuf};

/// Battery charging status as reported by the kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChargeStatus {
    Charging,
    Discharging,
    Full,
    NotCharging,
    Unknown,
}

impl ChargeStatus {
    fn parse(s: &str) -> Self {
        match s.trim() {
            "Charging" => ChargeStatus::Charging,
            "Discharging" => ChargeStatus::Discharging,
            "Full" => ChargeStatus::Full,
            "Not charging" => ChargeStatus::NotCharging,
            _ => ChargeStatus::Unknown,
        }
    }
}

/// Sysfs locations for the battery and charger supplies.
#[derive(Debug, Clone)]
pub struct PowerPaths {
    pub supply_dir: PathBuf,
    pub battery: PathBuf,
    pub charger: PathBuf,
}

impl Default for PowerPaths {
    fn default() -> Self {
        Self {
            supply_dir: PathBuf::from("/sys/class/power_supply"),
            battery: PathBuf::from("/sys/class/power_supply/BAT0"),
            charger: PathBuf::from("/sys/class/power_supply/AC"),
        }
    }
}

/// Reads battery state from sysfs.
pub struct BatterySource {
    paths: PowerPaths,
}

impl BatterySource {
    /// Auto-detect the battery and charger under the default sysfs root.
    pub fn new() -> Result<Self, HalError> {
        Self::with_paths(PowerPaths::default())
    }

    /// Create with explicit paths, detecting supplies under `supply_dir`
    /// when present. Tests point this at a fake sysfs tree.
    pub fn with_paths(paths: PowerPaths) -> Result<Self, HalError> {
        let mut source = Self { paths };
        source.detect_supplies()?;
        if !source.paths.battery.exists() {
            return Err(HalError::NoBattery(source.paths.supply_dir.clone()));
        }
        Ok(source)
    }

    /// Scan the supply directory and resolve battery/charger entries by type.
    fn detect_supplies(&mut self) -> Result<(), HalError> {
        if !self.paths.supply_dir.exists() {
            return Ok(());
        }

        for entry in fs::read_dir(&self.paths.supply_dir)? {
            let entry = entry?;
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().to_lowercase();

            let Ok(psu_type) = fs::read_to_string(path.join("type")) else {
                continue;
            };
            let psu_type = psu_type.trim().to_lowercase();

            if psu_type == "battery" {
                tracing::info!("found battery at {}", path.display());
                self.paths.battery = path;
            } else if psu_type == "mains" || psu_type == "usb" || name.contains("charger") {
                tracing::info!("found charger at {}", path.display());
                self.paths.charger = path;
            }
        }

        Ok(())
    }

    /// Read the current battery level and charging state.
    ///
    /// Charging means the battery reports `Charging` or `Full`, or the
    /// charger supply is online; a full battery on the cable still counts as
    /// charging for trigger purposes.
    pub fn read(&self) -> Result<BatteryReading, HalError> {
        let level = self.read_capacity()?;
        let status = ChargeStatus::parse(
            &fs::read_to_string(self.paths.battery.join("status"))
                .unwrap_or_else(|_| "Unknown".to_string()),
        );

        let is_charging = matches!(status, ChargeStatus::Charging | ChargeStatus::Full)
            || self.charger_online();

        Ok(BatteryReading::new(level, is_charging))
    }

    /// Whether the charger supply reports itself online.
    pub fn charger_online(&self) -> bool {
        let online_path = self.paths.charger.join("online");
        match fs::read_to_string(&online_path) {
            Ok(contents) => contents.trim() == "1",
            Err(_) => false,
        }
    }

    fn read_capacity(&self) -> Result<u8, HalError> {
        let path = self.paths.battery.join("capacity");
        let contents = fs::read_to_string(&path)?;
        let level: i64 = contents.trim().parse().map_err(|_| HalError::BadAttribute {
            path: path.clone(),
            reason: format!("not an integer: {:?}", contents.trim()),
        })?;
        if !(0..=100).contains(&level) {
            return Err(HalError::BadAttribute {
                path,
                reason: format!("capacity {} out of range", level),
            });
        }
        Ok(level as u8)
    }

    pub fn paths(&self) -> &PowerPaths {
        &self.paths
    }
}
