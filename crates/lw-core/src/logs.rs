use crate::{LogEntry, LogLevel};
use chrono::{DateTime, NaiveDateTime, Utc};
use std::collections::{BTreeMap, HashSet, VecDeque};

/// Maximum entries a surface keeps; inserting beyond this evicts the oldest.
pub const SURFACE_CAPACITY: usize = 100;

/// A log entry as it appears on a surface: formatted line plus the
/// metadata needed for dedup and styling. Immutable once rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedLog {
    pub id: Option<String>,
    pub level: LogLevel,
    pub line: String,
}

/// One bounded, newest-first log panel.
#[derive(Debug, Default)]
pub struct LogSurface {
    entries: VecDeque<RenderedLog>,
    seen_ids: HashSet<String>,
}

impl LogSurface {
    /// Append an entry. Entries whose id is already rendered on this
    /// surface are dropped; everything else is formatted as
    /// `[HH:MM:SS] message` and inserted at the newest-first position.
    /// Returns whether the entry was rendered.
    pub fn append(&mut self, entry: &LogEntry, now: DateTime<Utc>) -> bool {
        if let Some(id) = &entry.id {
            if self.seen_ids.contains(id) {
                return false;
            }
        }

        let stamp = format_stamp(entry.timestamp.as_deref(), now);
        let rendered = RenderedLog {
            id: entry.id.clone(),
            level: entry.level,
            line: format!("[{stamp}] {}", entry.message),
        };
        if let Some(id) = &rendered.id {
            self.seen_ids.insert(id.clone());
        }
        self.entries.push_front(rendered);

        if self.entries.len() > SURFACE_CAPACITY {
            if let Some(evicted) = self.entries.pop_back() {
                if let Some(id) = evicted.id {
                    self.seen_ids.remove(&id);
                }
            }
        }
        true
    }

    /// Rendered entries, newest first.
    pub fn entries(&self) -> impl Iterator<Item = &RenderedLog> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Owner of every log surface on the dashboard. A broadcast entry lands on
/// all of them identically, so multiple panels stay consistent.
#[derive(Debug, Default)]
pub struct LogHub {
    surfaces: BTreeMap<String, LogSurface>,
}

impl LogHub {
    pub fn register(&mut self, name: &str) {
        self.surfaces.entry(name.to_string()).or_default();
    }

    pub fn broadcast(&mut self, entry: &LogEntry, now: DateTime<Utc>) {
        for surface in self.surfaces.values_mut() {
            surface.append(entry, now);
        }
    }

    /// Merge a remote log batch, entry by entry, through the usual dedup.
    pub fn merge_remote(&mut self, batch: &[LogEntry], now: DateTime<Utc>) {
        for entry in batch {
            self.broadcast(entry, now);
        }
    }

    pub fn surface(&self, name: &str) -> Option<&LogSurface> {
        self.surfaces.get(name)
    }
}

fn format_stamp(timestamp: Option<&str>, now: DateTime<Utc>) -> String {
    if let Some(raw) = timestamp {
        if let Some(parsed) = parse_timestamp(raw) {
            return parsed.format("%H:%M:%S").to_string();
        }
    }
    now.format("%H:%M:%S").to_string()
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.naive_utc());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").ok()
}
