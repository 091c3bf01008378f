//! Progress tracking
//!
//! yt-dlp reports progress through the templates below, one event per line.
//! [`ProgressTracker`] folds those events into the status line shown to the user:
//! `Video X of Y | Status: S | P%`.

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc::UnboundedSender;

const LINE_MARKER: &str = "[downloadium]";

/// `--progress-template` for download events
pub const DOWNLOAD_TEMPLATE: &str = "download:[downloadium] download %(info.id)s %(progress.status)s %(progress.downloaded_bytes)s %(progress.total_bytes)s %(progress.total_bytes_estimate)s";

/// `--progress-template` for postprocessor events
pub const POSTPROCESS_TEMPLATE: &str =
    "postprocess:[downloadium] postprocess %(progress.postprocessor)s %(progress.status)s";

/// A single event reported by yt-dlp
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    Downloading {
        video_id: Option<String>,
        downloaded_bytes: Option<f64>,
        total_bytes: Option<f64>,
        total_bytes_estimate: Option<f64>,
    },
    Finished {
        video_id: Option<String>,
    },
    Error {
        message: String,
    },
    PostProcess {
        postprocessor: String,
        status: String,
    },
}

/// Whether an update replaces the status line or is logged above it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdateKind {
    #[default]
    Status,
    Warning,
}

/// What the UI displays: a status line and, when known, a percentage
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    pub message: String,
    pub percent: Option<f64>,
    pub kind: UpdateKind,
}

impl ProgressUpdate {
    pub fn new(message: impl Into<String>, percent: Option<f64>) -> Self {
        Self {
            message: message.into(),
            percent,
            kind: UpdateKind::Status,
        }
    }

    /// A message that must stay visible after the next status line
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            percent: None,
            kind: UpdateKind::Warning,
        }
    }

    pub fn is_warning(&self) -> bool {
        self.kind == UpdateKind::Warning
    }
}

/// yt-dlp prints NA (or None) for fields it doesn't know
fn field(token: Option<&str>) -> Option<String> {
    match token {
        None | Some("NA") | Some("None") | Some("") => None,
        Some(value) => Some(value.to_string()),
    }
}

fn number(token: Option<&str>) -> Option<f64> {
    field(token)?.parse().ok()
}

/// Parse one line of yt-dlp output into an event
pub fn parse_progress_line(line: &str) -> Option<ProgressEvent> {
    let line = line.trim();

    if let Some(message) = line.strip_prefix("ERROR:") {
        return Some(ProgressEvent::Error {
            message: message.trim().to_string(),
        });
    }

    let rest = line.strip_prefix(LINE_MARKER)?;
    let mut tokens = rest.split_whitespace();

    match tokens.next()? {
        "download" => {
            let video_id = field(tokens.next());
            let status = tokens.next()?;
            match status {
                "downloading" => Some(ProgressEvent::Downloading {
                    video_id,
                    downloaded_bytes: number(tokens.next()),
                    total_bytes: number(tokens.next()),
                    total_bytes_estimate: number(tokens.next()),
                }),
                "finished" => Some(ProgressEvent::Finished { video_id }),
                "error" => Some(ProgressEvent::Error {
                    message: String::new(),
                }),
                _ => None,
            }
        }
        "postprocess" => Some(ProgressEvent::PostProcess {
            postprocessor: field(tokens.next()).unwrap_or_default(),
            status: field(tokens.next()).unwrap_or_default(),
        }),
        _ => None,
    }
}

/// Aggregates events across the videos of a playlist or channel
#[derive(Debug, Clone, Default)]
pub struct ProgressTracker {
    total: u32,
    current_index: u32,
    current_video_id: Option<String>,
}

impl ProgressTracker {
    /// `total` is the number of videos expected, 0 when unknown
    pub fn new(total: u32) -> Self {
        Self {
            total,
            current_index: 0,
            current_video_id: None,
        }
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    #[allow(dead_code)]
    pub fn current_index(&self) -> u32 {
        self.current_index
    }

    fn line(&self, index: u32, parts: &[&str]) -> String {
        let body = parts.join(" | ");
        if self.total > 0 {
            format!("Video {} of {} | {}", index, self.total, body)
        } else {
            body
        }
    }

    fn current_line(&self, parts: &[&str]) -> String {
        self.line(self.current_index.max(1), parts)
    }

    /// Status before the first byte arrives
    pub fn start(&self) -> ProgressUpdate {
        ProgressUpdate::new(self.line(0, &["Status: Downloading"]), Some(0.0))
    }

    /// Status after yt-dlp exits successfully
    pub fn done(&self) -> ProgressUpdate {
        ProgressUpdate::new("Status: Done", Some(100.0))
    }

    pub fn warning(&self, text: &str) -> ProgressUpdate {
        ProgressUpdate::warning(text)
    }

    /// Fold an event into the tracker. Returns `None` for events that don't change the display.
    pub fn apply(&mut self, event: &ProgressEvent) -> Option<ProgressUpdate> {
        match event {
            ProgressEvent::Downloading {
                video_id,
                downloaded_bytes,
                total_bytes,
                total_bytes_estimate,
            } => {
                if let Some(id) = video_id.as_deref().filter(|id| !id.is_empty()) {
                    if self.current_video_id.as_deref() != Some(id) {
                        self.current_video_id = Some(id.to_string());
                        self.current_index += 1;
                    }
                }

                let total = total_bytes
                    .filter(|t| *t > 0.0)
                    .or(total_bytes_estimate.filter(|t| *t > 0.0));
                let percent = total.map(|total| {
                    (downloaded_bytes.unwrap_or(0.0) / total * 100.0).clamp(0.0, 100.0)
                });

                let mut message = self.current_line(&["Status: Downloading"]);
                if let Some(p) = percent {
                    message.push_str(&format!(" | {:.1}%", p));
                }
                Some(ProgressUpdate::new(message, percent))
            }

            ProgressEvent::Finished { .. } => Some(ProgressUpdate::new(
                self.current_line(&["Status: Encoding", "100.0%"]),
                Some(100.0),
            )),

            ProgressEvent::Error { message } => {
                let line = if message.is_empty() {
                    self.current_line(&["Status: Error"])
                } else {
                    self.current_line(&["Status: Error", message.as_str()])
                };
                Some(ProgressUpdate::new(line, Some(0.0)))
            }

            ProgressEvent::PostProcess {
                postprocessor,
                status,
            } => {
                if status != "started" && status != "finished" {
                    return None;
                }
                let state = if postprocessor.contains("EmbedSubtitle") {
                    "Status: Embedding Subtitles"
                } else {
                    "Status: Encoding"
                };
                Some(ProgressUpdate::new(self.current_line(&[state]), None))
            }
        }
    }
}

/// Read yt-dlp output line by line, sending one update per recognised event.
///
/// Returns the number of events seen. A dropped receiver is not an error.
pub async fn pump_progress<R>(
    mut reader: R,
    tracker: &mut ProgressTracker,
    sender: &UnboundedSender<ProgressUpdate>,
) -> std::io::Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut events = 0;
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }

        let line = String::from_utf8_lossy(&buf);
        let Some(event) = parse_progress_line(&line) else {
            continue;
        };

        events += 1;
        if let Some(update) = tracker.apply(&event) {
            let _ = sender.send(update);
        }
    }

    Ok(events)
}
