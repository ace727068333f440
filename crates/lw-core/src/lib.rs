use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub mod logs;
pub mod media;
pub mod reconcile;
pub mod simulate;

/// Inspection stations on the line. Closed set; wire names match the
/// backend's spelling (including `FORDING` for the folding station).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskKind {
    Case,
    Box,
    Cover,
    Fording,
    Final,
}

impl TaskKind {
    pub const ALL: [TaskKind; 5] = [
        TaskKind::Case,
        TaskKind::Box,
        TaskKind::Cover,
        TaskKind::Fording,
        TaskKind::Final,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Case => "CASE",
            TaskKind::Box => "BOX",
            TaskKind::Cover => "COVER",
            TaskKind::Fording => "FORDING",
            TaskKind::Final => "FINAL",
        }
    }

    /// Human-readable station name for panel titles.
    pub fn label(&self) -> &'static str {
        match self {
            TaskKind::Case => "Case",
            TaskKind::Box => "Box",
            TaskKind::Cover => "Cover",
            TaskKind::Fording => "Folding",
            TaskKind::Final => "Final check",
        }
    }

    /// Station-specific result sub-fields shown next to the generic
    /// status/confidence/details block.
    pub fn result_fields(&self) -> &'static [&'static str] {
        match self {
            TaskKind::Box => &["Dimensions", "Integrity", "Quality"],
            TaskKind::Cover => &[
                "Alignment",
                "Seal quality",
                "Surface check",
                "Edge detection",
            ],
            _ => &[],
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskKind {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.trim().to_uppercase().as_str() {
            "CASE" => Ok(TaskKind::Case),
            "BOX" => Ok(TaskKind::Box),
            "COVER" => Ok(TaskKind::Cover),
            "FORDING" | "FOLDING" => Ok(TaskKind::Fording),
            "FINAL" => Ok(TaskKind::Final),
            other => Err(format!("Unknown task kind: {other}")),
        }
    }
}

/// Operational state of a station, distinct from the inspection verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskStatus {
    Idle,
    Running,
    Completed,
    Error,
}

impl Default for TaskStatus {
    fn default() -> Self {
        Self::Idle
    }
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Idle => "IDLE",
            TaskStatus::Running => "RUNNING",
            TaskStatus::Completed => "COMPLETED",
            TaskStatus::Error => "ERROR",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.trim().to_uppercase().as_str() {
            "IDLE" => Ok(TaskStatus::Idle),
            "RUNNING" => Ok(TaskStatus::Running),
            "COMPLETED" => Ok(TaskStatus::Completed),
            "ERROR" => Ok(TaskStatus::Error),
            other => Err(format!("Unknown task status: {other}")),
        }
    }
}

/// Verdict of the most recent inspection for a station. `"-"` is the
/// backend's placeholder for "no verdict yet".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "NG")]
    Ng,
    #[serde(rename = "ERROR")]
    Error,
    #[serde(rename = "-")]
    None,
}

impl Default for Verdict {
    fn default() -> Self {
        Self::None
    }
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Ok => "OK",
            Verdict::Ng => "NG",
            Verdict::Error => "ERROR",
            Verdict::None => "-",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Confidence as reported by the backend: either a pre-formatted string
/// like `"95.2%"` or a bare number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Confidence {
    Text(String),
    Number(f64),
}

impl Default for Confidence {
    fn default() -> Self {
        Confidence::Text("0%".to_string())
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Confidence::Text(text) => f.write_str(text),
            Confidence::Number(value) => write!(f, "{value:.1}%"),
        }
    }
}

/// Latest captured evidence file reference for one station, replaced
/// wholesale each poll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceSnapshot {
    pub path: String,
    pub timestamp: String,
}

/// Outcome of the inspection for the most recent evidence. Lifecycle
/// mirrors [`EvidenceSnapshot`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSnapshot {
    pub status: Verdict,
    pub confidence: Confidence,
    pub details: String,
}

/// Combined per-station payload as served by the evidence+result source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationPayload {
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub status: Verdict,
    #[serde(default)]
    pub confidence: Confidence,
    #[serde(default)]
    pub details: String,
    #[serde(default, flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl StationPayload {
    pub fn split(&self) -> (EvidenceSnapshot, ResultSnapshot) {
        (
            EvidenceSnapshot {
                path: self.path.clone(),
                timestamp: self.timestamp.clone(),
            },
            ResultSnapshot {
                status: self.status,
                confidence: self.confidence.clone(),
                details: self.details.clone(),
            },
        )
    }
}

/// Evidence+result payload for one poll: `None` means the station has no
/// current data and must render a placeholder.
pub type SnapshotPayload = BTreeMap<TaskKind, Option<StationPayload>>;

/// Operational statuses for one poll.
pub type StatusPayload = BTreeMap<TaskKind, TaskStatus>;

/// Convert a raw string-keyed snapshot mapping, dropping unknown stations.
pub fn snapshot_from_wire(
    raw: BTreeMap<String, Option<StationPayload>>,
) -> SnapshotPayload {
    raw.into_iter()
        .filter_map(|(name, payload)| {
            TaskKind::from_str(&name).ok().map(|kind| (kind, payload))
        })
        .collect()
}

/// Convert a raw string-keyed status mapping, dropping entries whose
/// station or status is unrecognized.
pub fn statuses_from_wire(raw: BTreeMap<String, String>) -> StatusPayload {
    raw.into_iter()
        .filter_map(|(name, status)| {
            let kind = TaskKind::from_str(&name).ok()?;
            let status = TaskStatus::from_str(&status).ok()?;
            Some((kind, status))
        })
        .collect()
}

/// Severity of a system-log entry. `Plain` covers the backend's empty
/// level string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    #[serde(rename = "info")]
    Info,
    #[serde(rename = "warning")]
    Warning,
    #[serde(rename = "error")]
    Error,
    #[serde(rename = "")]
    Plain,
}

impl Default for LogLevel {
    fn default() -> Self {
        Self::Plain
    }
}

/// One human-readable event. Entries carrying an `id` came from the remote
/// log source and are deduplicated per surface; locally generated entries
/// have no id and are always rendered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    #[serde(default)]
    pub id: Option<String>,
    pub message: String,
    #[serde(default)]
    pub level: LogLevel,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl LogEntry {
    pub fn local(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            id: None,
            message: message.into(),
            level,
            timestamp: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_kind_round_trips_wire_names() {
        for kind in TaskKind::ALL {
            assert_eq!(TaskKind::from_str(kind.as_str()), Ok(kind));
        }
        assert_eq!(TaskKind::from_str("folding"), Ok(TaskKind::Fording));
        assert!(TaskKind::from_str("ROBOT").is_err());
    }

    #[test]
    fn verdict_serializes_placeholder_dash() {
        let json = serde_json::to_string(&Verdict::None).expect("serialize");
        assert_eq!(json, "\"-\"");
        let back: Verdict = serde_json::from_str("\"-\"").expect("deserialize");
        assert_eq!(back, Verdict::None);
    }

    #[test]
    fn confidence_accepts_string_or_number() {
        let text: Confidence = serde_json::from_str("\"95.2%\"").expect("text form");
        assert_eq!(text.to_string(), "95.2%");
        let number: Confidence = serde_json::from_str("87.35").expect("number form");
        assert_eq!(number.to_string(), "87.3%");
    }

    #[test]
    fn station_payload_tolerates_missing_and_extra_fields() {
        let payload: StationPayload = serde_json::from_str(
            r#"{"path":"saved_frames/case_1.jpg","orderNo":"A-17"}"#,
        )
        .expect("partial payload");
        assert_eq!(payload.status, Verdict::None);
        assert_eq!(payload.confidence.to_string(), "0%");
        assert!(payload.extra.contains_key("orderNo"));

        let (evidence, result) = payload.split();
        assert_eq!(evidence.path, "saved_frames/case_1.jpg");
        assert_eq!(result.details, "");
    }

    #[test]
    fn wire_mappings_drop_unknown_stations() {
        let mut raw = BTreeMap::new();
        raw.insert("CASE".to_string(), "RUNNING".to_string());
        raw.insert("ROBOT".to_string(), "RUNNING".to_string());
        raw.insert("BOX".to_string(), "resting".to_string());
        let statuses = statuses_from_wire(raw);
        assert_eq!(statuses.len(), 1);
        assert_eq!(statuses.get(&TaskKind::Case), Some(&TaskStatus::Running));
    }

    #[test]
    fn log_entry_defaults_to_local_shape() {
        let entry: LogEntry =
            serde_json::from_str(r#"{"message":"backend restarted"}"#).expect("entry");
        assert_eq!(entry.id, None);
        assert_eq!(entry.level, LogLevel::Plain);
        assert_eq!(entry.timestamp, None);
    }
}
