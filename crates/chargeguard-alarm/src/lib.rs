//! Alarm playback
//!
//! Owns the physical alarm side effect as a single start/stop toggle over a
//! spawned looping audio player. Failures never escape this crate: the alarm
//! runs inside the engine's side-effect sequence, so an unavailable sound
//! source degrades through a fallback chain instead of erroring out, and the
//! worst case is a generated tone rather than a silent session.

use chargeguard_core::AlarmChoice;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

/// Sound files the stock alarm choices resolve to.
#[derive(Debug, Clone)]
pub struct SoundPaths {
    pub default_alarm: PathBuf,
    pub notification: PathBuf,
    pub ringtone: PathBuf,
}

impl Default for SoundPaths {
    fn default() -> Self {
        let theme = Path::new("/usr/share/sounds/freedesktop/stereo");
        Self {
            default_alarm: theme.join("alarm-clock-elapsed.oga"),
            notification: theme.join("message-new-instant.oga"),
            ringtone: theme.join("phone-incoming-call.oga"),
        }
    }
}

/// Single start/stop toggle over the alarm sound.
pub struct AlarmController {
    sounds: SoundPaths,
    player: Option<Child>,
}

impl AlarmController {
    pub fn new(sounds: SoundPaths) -> Self {
        Self {
            sounds,
            player: None,
        }
    }

    /// Start the alarm for the given choice.
    ///
    /// Idempotent: any prior player is stopped cleanly first, so duplicate
    /// start requests never stack two sounds. A missing custom file falls
    /// back to the default alarm sound; a missing default falls back to a
    /// generated tone.
    pub fn start(&mut self, choice: &AlarmChoice) {
        self.stop();

        match self.resolve(choice) {
            Some(path) => match spawn_player(&path) {
                Ok(child) => {
                    tracing::info!("alarm started with {}", path.display());
                    self.player = Some(child);
                }
                Err(e) => {
                    tracing::warn!("player failed for {}: {}, using tone", path.display(), e);
                    self.start_tone();
                }
            },
            None => {
                tracing::warn!("no alarm sound available, using tone");
                self.start_tone();
            }
        }
    }

    /// Stop the alarm. Safe to call when nothing is playing.
    pub fn stop(&mut self) {
        if let Some(mut child) = self.player.take() {
            if let Err(e) = child.kill() {
                tracing::warn!("failed to kill alarm player: {}", e);
            }
            // Reap so a long alarm session never accumulates zombies.
            let _ = child.wait();
            tracing::info!("alarm stopped");
        }
    }

    pub fn is_active(&self) -> bool {
        self.player.is_some()
    }

    /// Resolve a choice to an existing sound file, falling back from a
    /// missing custom file to the default alarm.
    fn resolve(&self, choice: &AlarmChoice) -> Option<PathBuf> {
        let preferred = match choice {
            AlarmChoice::Default => self.sounds.default_alarm.clone(),
            AlarmChoice::Notification => self.sounds.notification.clone(),
            AlarmChoice::Ringtone => self.sounds.ringtone.clone(),
            AlarmChoice::Custom(path) if !path.is_empty() => PathBuf::from(path),
            AlarmChoice::Custom(_) => self.sounds.default_alarm.clone(),
        };

        if preferred.exists() {
            return Some(preferred);
        }
        tracing::warn!(
            "alarm sound {} not found, falling back to default",
            preferred.display()
        );
        if self.sounds.default_alarm.exists() {
            return Some(self.sounds.default_alarm.clone());
        }
        None
    }

    /// Last-resort alarm: a generated sine tone that runs until stopped.
    fn start_tone(&mut self) {
        let result = Command::new("speaker-test")
            .args(["-t", "sine", "-f", "880"])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        match result {
            Ok(child) => self.player = Some(child),
            Err(e) => tracing::warn!("tone fallback failed: {}", e),
        }
    }
}

impl Drop for AlarmController {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Spawn a looping player for a sound file.
fn spawn_player(path: &Path) -> std::io::Result<Child> {
    Command::new("mpv")
        .arg("--loop=inf")
        .arg("--no-video")
        .arg("--really-quiet")
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
}
