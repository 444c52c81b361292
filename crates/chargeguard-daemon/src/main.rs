//! chargeguard daemon
//!
//! Watches the battery through sysfs and fires a user-visible alarm when the
//! charge level crosses the configured target while charging. All state
//! transitions run on a single event loop: power events from the watcher and
//! user commands from the control socket are funneled into one queue, and
//! each event is fully processed, side effects included, before the next one
//! is accepted.

mod control;

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use chargeguard_alarm::{AlarmController, SoundPaths};
use chargeguard_config::Preferences;
use chargeguard_core::{Effect, MonitorEngine, MonitoringState};
use chargeguard_hal::{BatterySource, PowerEvent, PowerWatcher, WatcherConfig};
use chargeguard_messaging::MessageSender;
use chargeguard_notify::NotificationPresenter;

use control::{ControlCommand, ControlResponse, StartParams, socket_path};

/// Everything the event loop consumes, already serialized into one stream.
enum DaemonEvent {
    Power(PowerEvent),
    Control(ControlCommand, oneshot::Sender<ControlResponse>),
}

/// Owns the engine and its collaborators.
struct App {
    engine: MonitorEngine,
    prefs: Preferences,
    alarm: AlarmController,
    presenter: NotificationPresenter,
    sender: Arc<MessageSender>,
}

impl App {
    fn new(prefs: Preferences) -> Self {
        let sender = Arc::new(MessageSender::new(
            prefs.api.url.clone(),
            prefs.api.phone_number_id.clone(),
            prefs.api.access_token.clone(),
        ));
        Self {
            engine: MonitorEngine::new(),
            prefs,
            alarm: AlarmController::new(SoundPaths::default()),
            presenter: NotificationPresenter::new(),
            sender,
        }
    }

    /// Process one event end to end. Returns true when the daemon should
    /// shut down.
    fn handle_event(&mut self, event: DaemonEvent) -> bool {
        match event {
            DaemonEvent::Power(power_event) => {
                self.handle_power(power_event);
                false
            }
            DaemonEvent::Control(cmd, resp) => self.handle_control(cmd, resp),
        }
    }

    fn handle_power(&mut self, event: PowerEvent) {
        let effects = match event {
            PowerEvent::Connected(reading) => {
                // Settings snapshot taken at the event, frozen for the session.
                let settings = self.prefs.auto_start_settings();
                self.engine.handle_power_connected(reading, &settings)
            }
            PowerEvent::Disconnected => self.engine.handle_power_disconnected(),
            PowerEvent::Reading(reading) => self.engine.handle_battery_reading(reading),
        };
        self.run_effects(effects);
    }

    fn handle_control(
        &mut self,
        cmd: ControlCommand,
        resp: oneshot::Sender<ControlResponse>,
    ) -> bool {
        let mut shutdown = false;
        let response = match cmd {
            ControlCommand::Start(params) => self.handle_start(params),
            ControlCommand::Stop => {
                let effects = self.engine.stop_manual();
                self.run_effects(effects);
                ControlResponse::ok()
            }
            ControlCommand::StopAlarm => {
                let effects = self.engine.acknowledge_alarm();
                self.run_effects(effects);
                ControlResponse::ok()
            }
            ControlCommand::CloseAlarm => {
                // Same acknowledgement as stop-alarm, then full exit.
                let effects = self.engine.acknowledge_alarm();
                self.run_effects(effects);
                shutdown = true;
                ControlResponse::ok()
            }
            ControlCommand::Status => {
                ControlResponse::ok_with_state(describe_state(self.engine.state()))
            }
        };

        if resp.send(response).is_err() {
            debug!("control client went away before the response");
        }
        shutdown
    }

    fn handle_start(&mut self, params: StartParams) -> ControlResponse {
        let merged = merge_start_params(&self.prefs, params);
        if let Err(e) = merged.validate() {
            return ControlResponse::err(e.to_string());
        }

        // The original app persists settings on every user change; a failed
        // save is logged but does not block the session.
        if let Err(e) = merged.save_default() {
            warn!("failed to persist preferences: {}", e);
        }
        self.prefs = merged;

        match self.engine.start_manual(self.prefs.session_config()) {
            Ok(effects) => {
                self.run_effects(effects);
                ControlResponse::ok()
            }
            Err(e) => ControlResponse::err(e.to_string()),
        }
    }

    /// Execute a transition's side effects in emission order.
    ///
    /// Each collaborator contains its own failures, so a dead notification
    /// daemon or an unreachable message API never interrupts the sequence.
    fn run_effects(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::StartAlarm(choice) => self.alarm.start(&choice),
                Effect::StopAlarm => self.alarm.stop(),
                Effect::ShowStatus { text, ongoing } => self.presenter.show_status(&text, ongoing),
                Effect::ShowAlarmNotification { text } => self.presenter.show_alarm(&text),
                Effect::SendMessage { destination, body } => self.dispatch_message(destination, body),
                Effect::StopSession => debug!("session ended"),
            }
        }
    }

    /// Fire-and-forget outbound message; the result never feeds back into
    /// engine state and nothing is retried.
    fn dispatch_message(&self, destination: String, body: String) {
        if !self.sender.is_configured() {
            warn!("outbound message requested but API credentials are not configured");
            return;
        }
        let sender = Arc::clone(&self.sender);
        tokio::spawn(async move {
            if let Err(e) = sender.send(&destination, &body).await {
                warn!("outbound message failed: {}", e);
            }
        });
    }
}

/// Overlay explicit start parameters on the persisted preferences.
fn merge_start_params(prefs: &Preferences, params: StartParams) -> Preferences {
    let mut merged = prefs.clone();
    if let Some(v) = params.target_level {
        merged.target_level = v;
    }
    if let Some(v) = params.auto_start {
        merged.auto_start = v;
    }
    if let Some(v) = params.alarm_type {
        merged.alarm_type = v;
    }
    if let Some(v) = params.custom_alarm_uri {
        merged.custom_alarm_uri = v;
    }
    if let Some(v) = params.whatsapp_enabled {
        merged.whatsapp_enabled = v;
    }
    if let Some(v) = params.whatsapp_number {
        merged.whatsapp_number = v;
    }
    if let Some(v) = params.custom_message {
        merged.custom_message = v;
    }
    merged
}

fn describe_state(state: &MonitoringState) -> String {
    match state {
        MonitoringState::Idle => "idle".to_string(),
        MonitoringState::Monitoring {
            config,
            last_reading,
        } => match last_reading {
            Some(reading) => format!(
                "monitoring: {}% of target {}%",
                reading.level_percent, config.target_level
            ),
            None => format!("monitoring: target {}%", config.target_level),
        },
        MonitoringState::AlarmActive {
            trigger_reading, ..
        } => format!("alarm: triggered at {}%", trigger_reading.level_percent),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging();
    info!("chargeguard daemon starting");

    let prefs = Preferences::load_default().context("failed to load preferences")?;
    info!(
        target_level = prefs.target_level,
        auto_start = prefs.auto_start,
        "preferences loaded"
    );

    let source = BatterySource::new().context("no usable battery found")?;
    let mut app = App::new(prefs);

    let (tx, mut rx) = mpsc::channel::<DaemonEvent>(64);

    // Power watcher feeds its own channel; bridge it into the main queue.
    let (power_tx, mut power_rx) = mpsc::channel::<PowerEvent>(64);
    PowerWatcher::new(source, WatcherConfig::default()).spawn(power_tx);
    let bridge_tx = tx.clone();
    tokio::spawn(async move {
        while let Some(event) = power_rx.recv().await {
            if bridge_tx.send(DaemonEvent::Power(event)).await.is_err() {
                break;
            }
        }
    });

    // Control socket.
    let path = socket_path();
    let _ = std::fs::remove_file(&path);
    let listener = UnixListener::bind(&path)
        .with_context(|| format!("failed to bind control socket at {}", path.display()))?;
    info!("control socket at {}", path.display());
    tokio::spawn(serve_control(listener, tx.clone()));
    drop(tx);

    loop {
        tokio::select! {
            maybe_event = rx.recv() => {
                match maybe_event {
                    Some(event) => {
                        if app.handle_event(event) {
                            info!("close requested, shutting down");
                            break;
                        }
                    }
                    None => break,
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("received shutdown signal");
                break;
            }
        }
    }

    // Make sure nothing keeps ringing past process exit.
    let effects = app.engine.stop_manual();
    app.run_effects(effects);
    let _ = std::fs::remove_file(&path);
    info!("chargeguard daemon stopped");
    Ok(())
}

fn setup_logging() {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .init();
}

/// Accept control clients; each connection gets its own line-handling task.
async fn serve_control(listener: UnixListener, tx: mpsc::Sender<DaemonEvent>) {
    loop {
        match listener.accept().await {
            Ok((stream, _)) => {
                tokio::spawn(handle_connection(stream, tx.clone()));
            }
            Err(e) => {
                warn!("control socket accept failed: {}", e);
            }
        }
    }
}

async fn handle_connection(stream: UnixStream, tx: mpsc::Sender<DaemonEvent>) {
    let (read_half, mut write_half) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();

    while let Ok(Some(line)) = lines.next_line().await {
        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<ControlCommand>(&line) {
            Ok(cmd) => {
                let (resp_tx, resp_rx) = oneshot::channel();
                if tx.send(DaemonEvent::Control(cmd, resp_tx)).await.is_err() {
                    return;
                }
                resp_rx
                    .await
                    .unwrap_or_else(|_| ControlResponse::err("daemon shutting down"))
            }
            Err(e) => ControlResponse::err(format!("invalid command: {}", e)),
        };

        let mut out = serde_json::to_vec(&response).unwrap_or_default();
        out.push(b'\n');
        if write_half.write_all(&out).await.is_err() {
            return;
        }
    }
}
