use crate::{
    Confidence, LogEntry, LogLevel, SnapshotPayload, StationPayload, StatusPayload,
    TaskKind, TaskStatus, Verdict,
};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Probability that a station has any synthetic data at all in one round.
const DATA_CHANCE: f64 = 0.8;

/// Simple LCG PRNG so simulated rounds are reproducible under a fixed seed.
#[derive(Debug, Clone)]
struct SeededRng {
    state: u64,
}

impl SeededRng {
    fn new(seed: u64) -> Self {
        Self {
            state: seed.wrapping_add(1),
        }
    }

    fn next_u64(&mut self) -> u64 {
        // LCG parameters from Numerical Recipes
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.state
    }

    fn next_range(&mut self, min: u64, max: u64) -> u64 {
        if max <= min {
            return min;
        }
        min + (self.next_u64() % (max - min))
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() as f64) / (u64::MAX as f64)
    }

    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }
}

/// Synthesizes plausible poll payloads while the remote source is down, so
/// the display stays exercised. Output feeds the same reconciliation path
/// as real data.
#[derive(Debug, Clone)]
pub struct Simulator {
    rng: SeededRng,
    frame: u64,
}

impl Simulator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: SeededRng::new(seed),
            frame: 0,
        }
    }

    /// Warning entry broadcast each time a failed read activates the
    /// fallback.
    pub fn activation_log() -> LogEntry {
        LogEntry::local(LogLevel::Warning, "API not available, using simulation mode")
    }

    /// One synthetic round: per station, an 0.8 chance of a status drawn
    /// uniformly from the four operational states with a matching
    /// evidence+result payload, else no data and IDLE.
    pub fn synthesize(&mut self, now: DateTime<Utc>) -> (SnapshotPayload, StatusPayload) {
        let mut snapshot = SnapshotPayload::new();
        let mut statuses = StatusPayload::new();

        for kind in TaskKind::ALL {
            if !self.rng.chance(DATA_CHANCE) {
                snapshot.insert(kind, None);
                statuses.insert(kind, TaskStatus::Idle);
                continue;
            }

            let status = match self.rng.next_range(0, 4) {
                0 => TaskStatus::Idle,
                1 => TaskStatus::Running,
                2 => TaskStatus::Completed,
                _ => TaskStatus::Error,
            };
            let payload = self.station_payload(kind, status, now);
            snapshot.insert(kind, Some(payload));
            statuses.insert(kind, status);
        }

        (snapshot, statuses)
    }

    fn station_payload(
        &mut self,
        kind: TaskKind,
        status: TaskStatus,
        now: DateTime<Utc>,
    ) -> StationPayload {
        self.frame += 1;
        let (verdict, confidence, details) = match status {
            TaskStatus::Completed => (
                Verdict::Ok,
                format!("{:.1}%", 80.0 + self.rng.next_f64() * 19.9),
                "Task completed successfully".to_string(),
            ),
            TaskStatus::Error => (
                Verdict::Error,
                "0%".to_string(),
                "Device not responding".to_string(),
            ),
            TaskStatus::Running => {
                (Verdict::None, "0%".to_string(), "Processing...".to_string())
            }
            TaskStatus::Idle => (Verdict::None, "0%".to_string(), String::new()),
        };

        StationPayload {
            path: format!(
                "{}_frame_{}.jpg",
                kind.as_str().to_lowercase(),
                self.frame
            ),
            timestamp: now.format("%Y-%m-%d %H:%M:%S").to_string(),
            status: verdict,
            confidence: Confidence::Text(confidence),
            details,
            extra: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, 9, 45, 12)
            .single()
            .expect("valid test time")
    }

    #[test]
    fn same_seed_produces_identical_rounds() {
        let mut a = Simulator::new(42);
        let mut b = Simulator::new(42);
        for _ in 0..10 {
            assert_eq!(a.synthesize(at()), b.synthesize(at()));
        }
    }

    #[test]
    fn every_station_gets_either_data_or_explicit_absence() {
        let mut sim = Simulator::new(3);
        let (snapshot, statuses) = sim.synthesize(at());
        assert_eq!(snapshot.len(), TaskKind::ALL.len());
        assert_eq!(statuses.len(), TaskKind::ALL.len());
        for kind in TaskKind::ALL {
            let entry = snapshot.get(&kind).expect("station present");
            let status = statuses.get(&kind).expect("status present");
            if entry.is_none() {
                assert_eq!(*status, TaskStatus::Idle);
            }
        }
    }

    #[test]
    fn payload_shape_matches_the_drawn_status() {
        let mut sim = Simulator::new(11);
        for _ in 0..40 {
            let (snapshot, statuses) = sim.synthesize(at());
            for kind in TaskKind::ALL {
                let Some(payload) = snapshot.get(&kind).and_then(|p| p.as_ref()) else {
                    continue;
                };
                match statuses.get(&kind).expect("status present") {
                    TaskStatus::Completed => {
                        assert_eq!(payload.status, Verdict::Ok);
                        assert_eq!(payload.details, "Task completed successfully");
                        let text = payload.confidence.to_string();
                        let value: f64 = text
                            .trim_end_matches('%')
                            .parse()
                            .expect("numeric confidence");
                        assert!((80.0..=99.9).contains(&value), "confidence {text}");
                    }
                    TaskStatus::Error => {
                        assert_eq!(payload.status, Verdict::Error);
                        assert_eq!(payload.details, "Device not responding");
                    }
                    TaskStatus::Running => {
                        assert_eq!(payload.status, Verdict::None);
                        assert_eq!(payload.details, "Processing...");
                    }
                    TaskStatus::Idle => {
                        assert_eq!(payload.status, Verdict::None);
                    }
                }
            }
        }
    }

    #[test]
    fn synthetic_evidence_looks_like_a_station_frame() {
        let mut sim = Simulator::new(5);
        for _ in 0..20 {
            let (snapshot, _) = sim.synthesize(at());
            for kind in TaskKind::ALL {
                if let Some(payload) = snapshot.get(&kind).and_then(|p| p.as_ref()) {
                    let prefix = kind.as_str().to_lowercase();
                    assert!(payload.path.starts_with(&format!("{prefix}_frame_")));
                    assert!(payload.path.ends_with(".jpg"));
                    assert_eq!(payload.timestamp, "2025-03-14 09:45:12");
                }
            }
        }
    }

    #[test]
    fn activation_log_is_a_local_warning() {
        let entry = Simulator::activation_log();
        assert_eq!(entry.id, None);
        assert_eq!(entry.level, LogLevel::Warning);
        assert!(entry.message.contains("simulation mode"));
    }
}
