mod client;
mod ui;

use anyhow::Result;
use chrono::Utc;
use client::ApiClient;
use crossterm::{
    event::{Event, EventStream, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures_util::StreamExt;
use lw_core::{
    logs::LogHub, media, reconcile::DisplayState, simulate::Simulator, LogEntry, LogLevel,
    SnapshotPayload, StatusPayload,
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{io, time::Duration};
use tokio::sync::mpsc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

const DEFAULT_POLL_MS: u64 = 2000;
const POLL_QUEUE_CAPACITY: usize = 64;

pub const MAIN_LOG_SURFACE: &str = "system";
pub const FOOTER_LOG_SURFACE: &str = "footer";

#[derive(Clone, Debug)]
struct Config {
    api_base: String,
    poll_interval: Duration,
    sim_seed: u64,
}

/// One resolved remote read. Snapshot and status reads carry the sequence
/// number of the tick that issued them; the log read has no ordering
/// requirement.
enum PollEvent {
    Snapshot {
        seq: u64,
        result: Result<SnapshotPayload>,
    },
    Statuses {
        seq: u64,
        result: Result<StatusPayload>,
    },
    Logs {
        result: Result<Vec<LogEntry>>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = load_config();
    init_logging();

    let client = ApiClient::new(config.api_base.clone());
    let mut hub = LogHub::default();
    hub.register(MAIN_LOG_SURFACE);
    hub.register(FOOTER_LOG_SURFACE);
    let mut state = DisplayState::new();
    let mut simulator = Simulator::new(config.sim_seed);

    let now = Utc::now();
    hub.broadcast(
        &LogEntry::local(LogLevel::Info, "Factory line monitor started"),
        now,
    );
    hub.broadcast(
        &LogEntry::local(LogLevel::Info, "Connecting to inspection backend..."),
        now,
    );

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    let mut events = EventStream::new();

    let (poll_tx, mut poll_rx) = mpsc::channel(POLL_QUEUE_CAPACITY);
    let mut ticker = tokio::time::interval(config.poll_interval);
    let mut seq: u64 = 0;

    let result = loop {
        if let Err(err) = terminal.draw(|frame| ui::render(frame, &state, &hub)) {
            break Err(err.into());
        }

        tokio::select! {
            _ = ticker.tick() => {
                seq += 1;
                spawn_poll(&client, seq, &poll_tx);
            }
            Some(event) = poll_rx.recv() => {
                apply_poll_event(event, &mut state, &mut hub, &mut simulator);
                while let Ok(event) = poll_rx.try_recv() {
                    apply_poll_event(event, &mut state, &mut hub, &mut simulator);
                }
            }
            maybe_event = events.next() => {
                if let Some(Ok(Event::Key(key))) = maybe_event {
                    if key.kind == KeyEventKind::Press
                        && matches!(key.code, KeyCode::Char('q') | KeyCode::Esc)
                    {
                        break Ok(());
                    }
                }
            }
        }
    };

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    result
}

/// Issue the three reads for one tick. Each resolves independently and is
/// applied whenever it lands; reads from a previous tick may still be in
/// flight, and the sequence gate in the reconciler sorts out the race.
fn spawn_poll(client: &ApiClient, seq: u64, tx: &mpsc::Sender<PollEvent>) {
    let snapshot_client = client.clone();
    let snapshot_tx = tx.clone();
    tokio::spawn(async move {
        let result = snapshot_client.fetch_snapshot().await;
        let _ = snapshot_tx.send(PollEvent::Snapshot { seq, result }).await;
    });

    let status_client = client.clone();
    let status_tx = tx.clone();
    tokio::spawn(async move {
        let result = status_client.fetch_statuses().await;
        let _ = status_tx.send(PollEvent::Statuses { seq, result }).await;
    });

    let logs_client = client.clone();
    let logs_tx = tx.clone();
    tokio::spawn(async move {
        let result = logs_client.fetch_logs().await;
        let _ = logs_tx.send(PollEvent::Logs { result }).await;
    });
}

fn apply_poll_event(
    event: PollEvent,
    state: &mut DisplayState,
    hub: &mut LogHub,
    simulator: &mut Simulator,
) {
    let now = Utc::now();
    match event {
        PollEvent::Snapshot { seq, result } => match result {
            Ok(payload) => {
                state.simulated = false;
                state.apply_snapshot(seq, &payload, media::extension_probe, hub, now);
            }
            Err(err) => {
                debug!(error = %err, "snapshot read failed, synthesizing");
                hub.broadcast(&Simulator::activation_log(), now);
                let (snapshot, _) = simulator.synthesize(now);
                state.simulated = true;
                state.apply_snapshot(seq, &snapshot, media::extension_probe, hub, now);
            }
        },
        PollEvent::Statuses { seq, result } => match result {
            Ok(payload) => {
                state.apply_statuses(seq, &payload, hub, now);
            }
            Err(err) => {
                debug!(error = %err, "status read failed, synthesizing");
                hub.broadcast(&Simulator::activation_log(), now);
                let (_, statuses) = simulator.synthesize(now);
                state.simulated = true;
                state.apply_statuses(seq, &statuses, hub, now);
            }
        },
        PollEvent::Logs { result } => match result {
            Ok(batch) => hub.merge_remote(&batch, now),
            // Non-critical source: a failed log read is swallowed.
            Err(err) => debug!(error = %err, "log read failed"),
        },
    }
}

fn load_config() -> Config {
    let api_base = std::env::var("LW_API_BASE")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| "http://127.0.0.1:8080".to_string());
    let poll_interval = std::env::var("LW_POLL_MS")
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_millis(DEFAULT_POLL_MS));
    let sim_seed = std::env::var("LW_SIM_SEED")
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or_else(|| {
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0)
        });
    Config {
        api_base,
        poll_interval,
        sim_seed,
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stdout_enabled = matches!(
        std::env::var("LW_LOG_STDOUT").ok().as_deref(),
        Some("1") | Some("true") | Some("TRUE") | Some("yes") | Some("YES")
    );
    if stdout_enabled {
        let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
    } else {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::sink)
            .try_init();
    }
}
