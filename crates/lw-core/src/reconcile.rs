use crate::logs::LogHub;
use crate::media::{self, PlaceholderKind, RenderInstruction, StillOutcome};
use crate::{
    EvidenceSnapshot, LogEntry, LogLevel, ResultSnapshot, SnapshotPayload, StatusPayload,
    TaskKind, TaskStatus, Verdict,
};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, VecDeque};

/// Recent evidence file names kept per station for the history strip.
pub const HISTORY_CAPACITY: usize = 4;

/// Everything the dashboard shows for one station.
#[derive(Debug, Default)]
pub struct StationState {
    pub evidence: Option<EvidenceSnapshot>,
    pub result: Option<ResultSnapshot>,
    pub status: TaskStatus,
    pub render: RenderInstruction,
    pub history: VecDeque<String>,
}

/// The single owner of everything the dashboard displays. Reconstructed
/// incrementally every poll cycle; never persisted.
///
/// Each payload kind carries its own last-applied sequence number: a read
/// from an older tick that resolves late is dropped instead of overwriting
/// fresher data.
#[derive(Debug, Default)]
pub struct DisplayState {
    stations: BTreeMap<TaskKind, StationState>,
    last_snapshot_seq: u64,
    last_status_seq: u64,
    pub simulated: bool,
}

impl DisplayState {
    pub fn new() -> Self {
        let mut stations = BTreeMap::new();
        for kind in TaskKind::ALL {
            stations.insert(kind, StationState::default());
        }
        Self {
            stations,
            last_snapshot_seq: 0,
            last_status_seq: 0,
            simulated: false,
        }
    }

    pub fn station(&self, kind: TaskKind) -> Option<&StationState> {
        self.stations.get(&kind)
    }

    fn station_mut(&mut self, kind: TaskKind) -> &mut StationState {
        self.stations.entry(kind).or_default()
    }

    /// Apply a freshly fetched (or synthesized) evidence+result payload.
    /// Snapshots are replaced wholesale per station; a station absent from
    /// the payload renders an explicit placeholder instead of stale data.
    /// Returns false when the payload lost the sequence race.
    pub fn apply_snapshot(
        &mut self,
        seq: u64,
        payload: &SnapshotPayload,
        probe: impl Fn(TaskKind, &EvidenceSnapshot) -> StillOutcome,
        hub: &mut LogHub,
        now: DateTime<Utc>,
    ) -> bool {
        if seq < self.last_snapshot_seq {
            return false;
        }
        self.last_snapshot_seq = seq;

        for kind in TaskKind::ALL {
            match payload.get(&kind).and_then(|entry| entry.as_ref()) {
                Some(station_payload) => {
                    let (evidence, result) = station_payload.split();

                    match result.status {
                        Verdict::Error => hub.broadcast(
                            &LogEntry::local(
                                LogLevel::Error,
                                format!("{kind} inspection error: {}", result.details),
                            ),
                            now,
                        ),
                        Verdict::Ok => hub.broadcast(
                            &LogEntry::local(
                                LogLevel::Info,
                                format!(
                                    "{kind} inspection completed ({})",
                                    result.confidence
                                ),
                            ),
                            now,
                        ),
                        _ => {}
                    }

                    let still = probe(kind, &evidence);
                    let (render, media_log) = media::resolve(kind, Some(&evidence), still);
                    if let Some(entry) = media_log {
                        hub.broadcast(&entry, now);
                    }

                    let file = media::file_name(&evidence.path).to_string();
                    let station = self.station_mut(kind);
                    if !file.is_empty() && station.history.front() != Some(&file) {
                        station.history.push_front(file);
                        station.history.truncate(HISTORY_CAPACITY);
                    }
                    station.evidence = Some(evidence);
                    station.result = Some(result);
                    station.render = render;
                }
                None => {
                    let station = self.station_mut(kind);
                    station.evidence = None;
                    station.result = None;
                    station.render =
                        RenderInstruction::Placeholder(PlaceholderKind::NoData);
                }
            }
        }
        true
    }

    /// Apply an operational-status payload. A transition log fires only
    /// when the stored status differs and the new one is RUNNING, ERROR or
    /// COMPLETED; the new status is stored unconditionally afterwards.
    /// Stations absent from the payload keep their previous status.
    pub fn apply_statuses(
        &mut self,
        seq: u64,
        payload: &StatusPayload,
        hub: &mut LogHub,
        now: DateTime<Utc>,
    ) -> bool {
        if seq < self.last_status_seq {
            return false;
        }
        self.last_status_seq = seq;

        for (&kind, &status) in payload {
            let previous = self.station_mut(kind).status;
            if status != previous {
                let transition = match status {
                    TaskStatus::Running => Some(LogEntry::local(
                        LogLevel::Info,
                        format!("{kind} task started"),
                    )),
                    TaskStatus::Completed => Some(LogEntry::local(
                        LogLevel::Info,
                        format!("{kind} task completed"),
                    )),
                    TaskStatus::Error => Some(LogEntry::local(
                        LogLevel::Error,
                        format!("{kind} task error"),
                    )),
                    TaskStatus::Idle => None,
                };
                if let Some(entry) = transition {
                    hub.broadcast(&entry, now);
                }
            }
            self.station_mut(kind).status = status;
        }
        true
    }
}
