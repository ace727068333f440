use crate::{EvidenceSnapshot, LogEntry, LogLevel, TaskKind};

/// Extensions the motion fallback accepts after a failed still render.
pub const MOTION_FORMATS: [&str; 3] = ["mp4", "avi", "webm"];

/// Extensions the default probe treats as renderable stills.
pub const STILL_FORMATS: [&str; 5] = ["jpg", "jpeg", "png", "bmp", "tiff"];

/// Label shown when the evidence carries no timestamp.
pub const UNKNOWN_TIME: &str = "Unknown time";

/// Result of the unconditional still-image render attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StillOutcome {
    Rendered,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderKind {
    NoData,
    LoadFailed,
}

/// What to draw on one station's evidence surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderInstruction {
    Placeholder(PlaceholderKind),
    Still {
        file: String,
        timestamp: String,
    },
    Motion {
        file: String,
        timestamp: String,
        looped: bool,
        muted: bool,
        autoplay: bool,
    },
}

impl Default for RenderInstruction {
    fn default() -> Self {
        RenderInstruction::Placeholder(PlaceholderKind::NoData)
    }
}

/// Media files are fetched by file name alone; the directory component of
/// the reported path is discarded.
pub fn file_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

fn extension(file: &str) -> Option<String> {
    file.rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
}

pub fn is_motion_format(file: &str) -> bool {
    extension(file).is_some_and(|ext| MOTION_FORMATS.contains(&ext.as_str()))
}

/// Default still-render probe: treat known image formats as renderable
/// and everything else as a failed still attempt.
pub fn extension_probe(_kind: TaskKind, evidence: &EvidenceSnapshot) -> StillOutcome {
    let file = file_name(&evidence.path);
    match extension(file) {
        Some(ext) if STILL_FORMATS.contains(&ext.as_str()) => StillOutcome::Rendered,
        _ => StillOutcome::Failed,
    }
}

/// Decide the render for one station's evidence. The still render is
/// attempted unconditionally, even for video source files, since it can
/// usually show at least a representative frame; on failure the motion
/// fallback is gated on the recognized format set.
pub fn resolve(
    kind: TaskKind,
    evidence: Option<&EvidenceSnapshot>,
    still: StillOutcome,
) -> (RenderInstruction, Option<LogEntry>) {
    let Some(evidence) = evidence.filter(|e| !e.path.trim().is_empty()) else {
        return (RenderInstruction::Placeholder(PlaceholderKind::NoData), None);
    };

    let file = file_name(&evidence.path).to_string();
    let timestamp = if evidence.timestamp.trim().is_empty() {
        UNKNOWN_TIME.to_string()
    } else {
        evidence.timestamp.clone()
    };

    match still {
        StillOutcome::Rendered => {
            let log = LogEntry::local(LogLevel::Info, format!("Loaded image for {kind}"));
            (RenderInstruction::Still { file, timestamp }, Some(log))
        }
        StillOutcome::Failed if is_motion_format(&file) => {
            let log = LogEntry::local(LogLevel::Info, format!("Loaded video for {kind}"));
            (
                RenderInstruction::Motion {
                    file,
                    timestamp,
                    looped: true,
                    muted: true,
                    autoplay: true,
                },
                Some(log),
            )
        }
        StillOutcome::Failed => {
            let log = LogEntry::local(
                LogLevel::Warning,
                format!("Failed to load media for {kind}: {file}"),
            );
            (
                RenderInstruction::Placeholder(PlaceholderKind::LoadFailed),
                Some(log),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evidence(path: &str, timestamp: &str) -> EvidenceSnapshot {
        EvidenceSnapshot {
            path: path.to_string(),
            timestamp: timestamp.to_string(),
        }
    }

    #[test]
    fn missing_evidence_renders_placeholder_without_log() {
        let (render, log) = resolve(TaskKind::Case, None, StillOutcome::Failed);
        assert_eq!(
            render,
            RenderInstruction::Placeholder(PlaceholderKind::NoData)
        );
        assert!(log.is_none());

        let empty = evidence("", "2025-03-14 09:00:00");
        let (render, log) = resolve(TaskKind::Case, Some(&empty), StillOutcome::Rendered);
        assert_eq!(
            render,
            RenderInstruction::Placeholder(PlaceholderKind::NoData)
        );
        assert!(log.is_none());
    }

    #[test]
    fn successful_still_render_logs_info() {
        let ev = evidence("saved_frames/case_frame_7.jpg", "2025-03-14 09:00:00");
        let (render, log) = resolve(TaskKind::Case, Some(&ev), StillOutcome::Rendered);
        assert_eq!(
            render,
            RenderInstruction::Still {
                file: "case_frame_7.jpg".to_string(),
                timestamp: "2025-03-14 09:00:00".to_string(),
            }
        );
        let log = log.expect("info log");
        assert_eq!(log.level, LogLevel::Info);
        assert!(log.message.contains("image for CASE"));
    }

    #[test]
    fn failed_still_on_unrecognized_format_renders_placeholder_with_warning() {
        let ev = evidence("saved_frames/box_frame_12.jpg", "2025-03-14 09:00:00");
        let (render, log) = resolve(TaskKind::Box, Some(&ev), StillOutcome::Failed);
        assert_eq!(
            render,
            RenderInstruction::Placeholder(PlaceholderKind::LoadFailed)
        );
        assert_eq!(log.expect("warning log").level, LogLevel::Warning);
    }

    #[test]
    fn failed_still_on_motion_format_falls_back_to_motion() {
        let ev = evidence("saved_frames/cover_frame_3.mp4", "");
        let (render, log) = resolve(TaskKind::Cover, Some(&ev), StillOutcome::Failed);
        assert_eq!(
            render,
            RenderInstruction::Motion {
                file: "cover_frame_3.mp4".to_string(),
                timestamp: UNKNOWN_TIME.to_string(),
                looped: true,
                muted: true,
                autoplay: true,
            }
        );
        let log = log.expect("info log");
        assert_eq!(log.level, LogLevel::Info);
        assert!(log.message.contains("video for COVER"));
    }

    #[test]
    fn file_name_discards_directory_components() {
        assert_eq!(file_name("saved_frames/case_1.jpg"), "case_1.jpg");
        assert_eq!(file_name("Z:\\frames\\box_2.avi"), "box_2.avi");
        assert_eq!(file_name("plain.png"), "plain.png");
    }

    #[test]
    fn motion_format_check_is_case_insensitive() {
        assert!(is_motion_format("clip.MP4"));
        assert!(is_motion_format("clip.webm"));
        assert!(!is_motion_format("clip.mov"));
        assert!(!is_motion_format("noext"));
    }

    #[test]
    fn extension_probe_separates_stills_from_the_rest() {
        let still = evidence("frames/final_1.jpeg", "");
        assert_eq!(
            extension_probe(TaskKind::Final, &still),
            StillOutcome::Rendered
        );
        let clip = evidence("frames/final_1.mp4", "");
        assert_eq!(extension_probe(TaskKind::Final, &clip), StillOutcome::Failed);
    }
}
