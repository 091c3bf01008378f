//! Downloader module - yt-dlp integration for videos, playlists and channels

use crate::core::formats::with_url;
use crate::core::progress::{
    DOWNLOAD_TEMPLATE, POSTPROCESS_TEMPLATE, ProgressEvent, ProgressTracker, ProgressUpdate,
    pump_progress,
};
use crate::core::ytdlp::{
    BEST_FORMAT, FailureKind, YtDlp, YtDlpOptions, build_format_string, classify_failure,
    count_entries, ffmpeg_available, metadata_options,
};
use crate::error::{DownloadiumError, Result};
use crate::types::{BEST_RESOLUTION, Config, DownloadOutcome};
use crate::utils::paths::ensure_dir;
use crate::utils::validation::strip_ansi;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncReadExt, BufReader};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

const FFMPEG_WARNING: &str =
    "Warning: ffmpeg/ffprobe not found in PATH. Downloading without embedded subtitles.";
const FORMAT_FALLBACK_WARNING: &str = "Warning: requested format unavailable. Falling back to Best...";

/// Everything a download needs besides the URL
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadSettings {
    pub output_dir: String,
    pub resolution: String,
    /// Container yt-dlp merges into
    pub video_format: String,
    pub cookies_file: Option<String>,
    pub sleep_interval: f64,
    pub max_sleep_interval: f64,
    pub sleep_interval_requests: f64,
    /// Subtitle languages written alongside the video
    pub subtitle_langs: Vec<String>,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            output_dir: "videos".into(),
            resolution: BEST_RESOLUTION.into(),
            video_format: "mp4".into(),
            cookies_file: None,
            sleep_interval: 2.0,
            max_sleep_interval: 5.0,
            sleep_interval_requests: 1.0,
            subtitle_langs: vec!["en.*".into(), "en".into()],
        }
    }
}

impl DownloadSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            output_dir: config.output_dir.clone(),
            resolution: config.resolution.clone(),
            video_format: config.video_format.clone(),
            cookies_file: config.cookies_file.clone(),
            sleep_interval: config.sleep_interval,
            max_sleep_interval: config.max_sleep_interval,
            sleep_interval_requests: config.sleep_interval_requests,
            ..Self::default()
        }
    }
}

/// Outcome of a single yt-dlp run
enum RunResult {
    Success,
    Failed { stderr: String },
}

/// Runs yt-dlp downloads and reports progress over a channel
#[derive(Debug, Clone)]
pub struct DownloadManager {
    settings: DownloadSettings,
    ytdlp: YtDlp,
}

impl DownloadManager {
    pub fn new(settings: DownloadSettings, ytdlp: YtDlp) -> Self {
        Self { settings, ytdlp }
    }

    /// Count how many videos the URL resolves to (1 for a single video)
    pub async fn fetch_metadata(&self, url: &str) -> Result<u32> {
        let url = url.trim();
        if url.is_empty() {
            return Err(DownloadiumError::MissingInput("video URL".into()));
        }

        let args = with_url(
            metadata_options(self.settings.cookies_file.as_deref()).to_args(),
            url,
        );
        let info = self.ytdlp.run_json(&args).await?;
        let count = count_entries(&info);
        tracing::debug!(url, count, "counted videos");
        Ok(count)
    }

    /// Output path template: <dir>/<channel>/<playlist>/<title>.<ext>
    fn output_template(&self) -> String {
        Path::new(&self.settings.output_dir)
            .join("%(channel)s")
            .join("%(playlist)s")
            .join("%(title)s.%(ext)s")
            .to_string_lossy()
            .into_owned()
    }

    /// Full option set for a download with the given format selector
    pub fn download_options(&self, format: &str, embed_subtitles: bool) -> YtDlpOptions {
        YtDlpOptions {
            output_template: Some(self.output_template()),
            na_placeholder: Some("Videos".into()),
            format: Some(format.into()),
            merge_output_format: Some(self.settings.video_format.clone()),
            playlist: Some(true),
            windows_filenames: true,
            fragment_retries: Some(5),
            skip_unavailable_fragments: true,
            no_keep_fragments: true,
            sleep_interval: Some(self.settings.sleep_interval),
            max_sleep_interval: Some(self.settings.max_sleep_interval),
            sleep_requests: Some(self.settings.sleep_interval_requests),
            write_subs: true,
            write_auto_subs: true,
            sub_langs: self.settings.subtitle_langs.clone(),
            sub_format: Some("best".into()),
            embed_subs: embed_subtitles,
            newline: true,
            progress_templates: vec![DOWNLOAD_TEMPLATE.into(), POSTPROCESS_TEMPLATE.into()],
            ..YtDlpOptions::base()
        }
        .with_cookies(self.settings.cookies_file.as_deref())
    }

    /// Download a video, playlist or channel, sending progress to `sender`
    pub async fn download(
        &self,
        url: &str,
        sender: &UnboundedSender<ProgressUpdate>,
    ) -> Result<DownloadOutcome> {
        let url = url.trim();
        if url.is_empty() {
            return Err(DownloadiumError::MissingInput("video URL".into()));
        }
        if self.settings.output_dir.trim().is_empty() {
            return Err(DownloadiumError::MissingInput("output directory".into()));
        }

        self.ytdlp.ensure_available().await?;
        ensure_dir(&self.settings.output_dir).await?;

        let embed_subtitles = ffmpeg_available().await;
        if !embed_subtitles {
            let _ = sender.send(ProgressUpdate::warning(FFMPEG_WARNING));
        }

        let total = match self.fetch_metadata(url).await {
            Ok(total) => total,
            Err(e) => {
                tracing::warn!(error = %e, "could not count videos, progress will omit totals");
                0
            }
        };

        let mut tracker = ProgressTracker::new(total);
        let _ = sender.send(tracker.start());

        let format = build_format_string(&self.settings.resolution);
        let stderr = match self.run_once(url, &format, embed_subtitles, &mut tracker, sender).await? {
            RunResult::Success => return Ok(self.finish(&tracker, sender)),
            RunResult::Failed { stderr } => stderr,
        };

        match classify_failure(&stderr) {
            FailureKind::FormatUnavailable => {
                tracing::debug!(format = %format, "requested format unavailable, retrying with best");
                let _ = sender.send(tracker.warning(FORMAT_FALLBACK_WARNING));

                let mut tracker = ProgressTracker::new(total);
                match self
                    .run_once(url, BEST_FORMAT, embed_subtitles, &mut tracker, sender)
                    .await?
                {
                    RunResult::Success => Ok(self.finish(&tracker, sender)),
                    RunResult::Failed { stderr } => {
                        Err(DownloadiumError::YtDlp(strip_ansi(stderr.trim())))
                    }
                }
            }
            FailureKind::RateLimited => Err(DownloadiumError::RateLimited(strip_ansi(stderr.trim()))),
            _ => {
                let event = ProgressEvent::Error {
                    message: error_detail(&stderr),
                };
                if let Some(update) = tracker.apply(&event) {
                    let _ = sender.send(update);
                }
                Err(DownloadiumError::YtDlp(strip_ansi(stderr.trim())))
            }
        }
    }

    fn finish(&self, tracker: &ProgressTracker, sender: &UnboundedSender<ProgressUpdate>) -> DownloadOutcome {
        let _ = sender.send(tracker.done());
        DownloadOutcome {
            output_dir: PathBuf::from(&self.settings.output_dir),
            videos: tracker.total(),
        }
    }

    async fn run_once(
        &self,
        url: &str,
        format: &str,
        embed_subtitles: bool,
        tracker: &mut ProgressTracker,
        sender: &UnboundedSender<ProgressUpdate>,
    ) -> Result<RunResult> {
        let args = with_url(self.download_options(format, embed_subtitles).to_args(), url);
        let mut child = self.ytdlp.spawn(&args)?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| DownloadiumError::Spawn("yt-dlp stdout unavailable".into()))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| DownloadiumError::Spawn("yt-dlp stderr unavailable".into()))?;

        let stderr_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            let _ = stderr.read_to_end(&mut buf).await;
            String::from_utf8_lossy(&buf).into_owned()
        });

        let events = pump_progress(BufReader::new(stdout), tracker, sender).await?;
        let status = child.wait().await?;
        let stderr = stderr_task.await.unwrap_or_default();

        tracing::debug!(events, code = ?status.code(), "yt-dlp exited");

        if status.success() {
            Ok(RunResult::Success)
        } else {
            Ok(RunResult::Failed { stderr })
        }
    }
}

/// The most relevant line of yt-dlp's stderr
fn error_detail(stderr: &str) -> String {
    let stripped = strip_ansi(stderr);
    stripped
        .lines()
        .rev()
        .find_map(|line| line.trim().strip_prefix("ERROR:").map(|m| m.trim().to_string()))
        .or_else(|| stripped.lines().rev().map(str::trim).find(|l| !l.is_empty()).map(str::to_string))
        .unwrap_or_default()
}

/// Run a download on a background task, returning its handle and the progress queue
pub fn spawn_download(
    manager: DownloadManager,
    url: String,
) -> (JoinHandle<Result<DownloadOutcome>>, UnboundedReceiver<ProgressUpdate>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let handle = tokio::spawn(async move { manager.download(&url, &tx).await });
    (handle, rx)
}
