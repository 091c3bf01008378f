//! yt-dlp integration: option assembly, process spawning, and output parsing

use crate::error::{DownloadiumError, Result};
use crate::types::{BEST_RESOLUTION, VideoFormat, VideoInfo};
use crate::utils::command::is_command_available;
use crate::utils::validation::{leading_height, strip_ansi};
use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;
use std::process::Stdio;
use tokio::process::{Child, Command};

/// Format used whenever the requested one can't be honoured
pub const BEST_FORMAT: &str = "bestvideo+bestaudio/best";

/// Handle to the yt-dlp executable
#[derive(Debug, Clone)]
pub struct YtDlp {
    program: String,
}

impl YtDlp {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub async fn is_available(&self) -> bool {
        is_command_available(&self.program).await
    }

    pub async fn ensure_available(&self) -> Result<()> {
        if self.is_available().await {
            Ok(())
        } else {
            Err(DownloadiumError::MissingDependency(self.program.clone()))
        }
    }

    /// Spawn yt-dlp with piped stdout/stderr
    pub fn spawn(&self, args: &[String]) -> Result<Child> {
        tracing::debug!(program = %self.program, args = ?args, "spawning yt-dlp");
        Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| DownloadiumError::Spawn(format!("Failed to start {}: {}", self.program, e)))
    }

    /// Run yt-dlp to completion and parse its stdout as a single JSON document
    pub async fn run_json(&self, args: &[String]) -> Result<Value> {
        let output = self
            .spawn(args)?
            .wait_with_output()
            .await
            .map_err(|e| DownloadiumError::Spawn(format!("{} did not finish: {}", self.program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DownloadiumError::YtDlp(strip_ansi(stderr.trim())));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let json = stdout
            .lines()
            .rev()
            .find(|line| line.trim_start().starts_with('{'))
            .ok_or_else(|| DownloadiumError::Extraction("yt-dlp printed no video information".into()))?;

        Ok(serde_json::from_str(json)?)
    }
}

/// Both ffmpeg and ffprobe are needed to embed subtitles
pub async fn ffmpeg_available() -> bool {
    is_command_available("ffmpeg").await && is_command_available("ffprobe").await
}

/// Typed yt-dlp option set, rendered into command-line flags
#[derive(Debug, Clone, Default, PartialEq)]
pub struct YtDlpOptions {
    pub ignore_config: bool,
    pub no_colors: bool,
    pub quiet: bool,
    pub no_warnings: bool,
    pub no_cache_dir: bool,
    pub retries: Option<u32>,
    pub fragment_retries: Option<u32>,
    pub socket_timeout: Option<u32>,
    pub skip_unavailable_fragments: bool,
    pub no_keep_fragments: bool,
    pub windows_filenames: bool,
    pub output_template: Option<String>,
    pub na_placeholder: Option<String>,
    pub format: Option<String>,
    pub merge_output_format: Option<String>,
    /// `Some(true)` = --yes-playlist, `Some(false)` = --no-playlist
    pub playlist: Option<bool>,
    pub flat_playlist: bool,
    pub skip_download: bool,
    pub sleep_interval: Option<f64>,
    pub max_sleep_interval: Option<f64>,
    pub sleep_requests: Option<f64>,
    pub write_subs: bool,
    pub write_auto_subs: bool,
    pub sub_langs: Vec<String>,
    pub sub_format: Option<String>,
    pub embed_subs: bool,
    pub cookies: Option<String>,
    /// -J: one JSON document for the whole URL, no download
    pub dump_single_json: bool,
    /// -j: one JSON document per video
    pub dump_json: bool,
    pub no_simulate: bool,
    pub newline: bool,
    pub progress_templates: Vec<String>,
}

impl YtDlpOptions {
    /// Defaults shared by every invocation
    pub fn base() -> Self {
        Self {
            ignore_config: true,
            no_colors: true,
            no_warnings: true,
            no_cache_dir: true,
            retries: Some(5),
            ..Default::default()
        }
    }

    /// Attach a cookie file, only if it exists
    pub fn with_cookies(mut self, cookies_file: Option<&str>) -> Self {
        self.cookies = cookies_file
            .filter(|path| !path.is_empty() && Path::new(path).is_file())
            .map(str::to_string);
        self
    }

    pub fn to_args(&self) -> Vec<String> {
        let mut args: Vec<String> = Vec::new();
        let mut flag = |enabled: bool, name: &str| {
            if enabled {
                args.push(name.into());
            }
        };

        flag(self.ignore_config, "--ignore-config");
        flag(self.no_colors, "--no-colors");
        flag(self.quiet, "--quiet");
        flag(self.no_warnings, "--no-warnings");
        flag(self.no_cache_dir, "--no-cache-dir");
        flag(self.skip_unavailable_fragments, "--skip-unavailable-fragments");
        flag(self.no_keep_fragments, "--no-keep-fragments");
        flag(self.windows_filenames, "--windows-filenames");
        flag(self.flat_playlist, "--flat-playlist");
        flag(self.skip_download, "--skip-download");
        flag(self.write_subs, "--write-subs");
        flag(self.write_auto_subs, "--write-auto-subs");
        flag(self.embed_subs, "--embed-subs");
        flag(self.dump_single_json, "--dump-single-json");
        flag(self.dump_json, "--dump-json");
        flag(self.no_simulate, "--no-simulate");
        flag(self.newline, "--newline");

        match self.playlist {
            Some(true) => args.push("--yes-playlist".into()),
            Some(false) => args.push("--no-playlist".into()),
            None => {}
        }

        let mut value = |name: &str, value: Option<String>| {
            if let Some(value) = value {
                args.push(name.into());
                args.push(value);
            }
        };

        value("--retries", self.retries.map(|n| n.to_string()));
        value("--fragment-retries", self.fragment_retries.map(|n| n.to_string()));
        value("--socket-timeout", self.socket_timeout.map(|n| n.to_string()));
        value("--output", self.output_template.clone());
        value("--output-na-placeholder", self.na_placeholder.clone());
        value("--format", self.format.clone());
        value("--merge-output-format", self.merge_output_format.clone());
        value("--sleep-interval", self.sleep_interval.map(|s| s.to_string()));
        value("--max-sleep-interval", self.max_sleep_interval.map(|s| s.to_string()));
        value("--sleep-requests", self.sleep_requests.map(|s| s.to_string()));
        value(
            "--sub-langs",
            (!self.sub_langs.is_empty()).then(|| self.sub_langs.join(",")),
        );
        value("--sub-format", self.sub_format.clone());
        value("--cookies", self.cookies.clone());

        for template in &self.progress_templates {
            args.push("--progress-template".into());
            args.push(template.clone());
        }

        args
    }
}

/// Options for counting the videos behind a URL
pub fn metadata_options(cookies_file: Option<&str>) -> YtDlpOptions {
    YtDlpOptions {
        quiet: true,
        flat_playlist: true,
        dump_single_json: true,
        playlist: Some(true),
        socket_timeout: Some(30),
        // Neutralises a strict --format from a global config
        format: Some("best".into()),
        ..YtDlpOptions::base()
    }
    .with_cookies(cookies_file)
}

/// Options for listing the formats of a single video
pub fn formats_options(cookies_file: Option<&str>) -> YtDlpOptions {
    YtDlpOptions {
        quiet: true,
        dump_single_json: true,
        playlist: Some(false),
        socket_timeout: Some(30),
        format: Some(BEST_FORMAT.into()),
        ..YtDlpOptions::base()
    }
    .with_cookies(cookies_file)
}

/// Translate a resolution label into a yt-dlp format selector
pub fn build_format_string(resolution: &str) -> String {
    let res = resolution.trim().to_lowercase();
    if res.is_empty() || res == BEST_RESOLUTION.to_lowercase() {
        return BEST_FORMAT.into();
    }
    if res == "worst" {
        return "worst".into();
    }

    match leading_height(&res) {
        Some(height) => format!("bestvideo[height<={}]+bestaudio/best", height),
        None => BEST_FORMAT.into(),
    }
}

/// Number of videos described by a flat-playlist dump
pub fn count_entries(info: &Value) -> u32 {
    if info.is_null() {
        return 0;
    }

    if let Some(count) = info.get("playlist_count").and_then(Value::as_u64) {
        if count > 0 {
            return count as u32;
        }
    }

    match info.get("entries") {
        None | Some(Value::Null) => 1,
        Some(Value::Array(entries)) => (entries.len() as u32).max(1),
        Some(_) => 1,
    }
}

/// Extract title, thumbnail and the list of resolutions, best first
pub fn parse_resolutions(info: &Value) -> Result<VideoInfo> {
    let formats = info
        .get("formats")
        .and_then(Value::as_array)
        .filter(|formats| !formats.is_empty())
        .ok_or_else(|| DownloadiumError::Extraction("no formats available for this video".into()))?;

    let mut seen = HashSet::new();
    let mut ranked: Vec<(u32, String)> = Vec::new();

    for format in formats {
        let vcodec = format.get("vcodec").and_then(Value::as_str).unwrap_or("none");
        let Some(note) = format.get("format_note").and_then(Value::as_str) else {
            continue;
        };
        if vcodec == "none" || note.is_empty() || !seen.insert(note.to_string()) {
            continue;
        }

        let height = format
            .get("height")
            .and_then(Value::as_u64)
            .map(|h| h as u32)
            .or_else(|| leading_height(note))
            .unwrap_or(0);
        ranked.push((height, note.to_string()));
    }

    // Stable sort keeps yt-dlp's order among equal heights
    ranked.sort_by(|a, b| b.0.cmp(&a.0));

    let mut resolutions = vec![BEST_RESOLUTION.to_string()];
    resolutions.extend(ranked.into_iter().map(|(_, note)| note));

    Ok(VideoInfo {
        title: info.get("title").and_then(Value::as_str).map(str::to_string),
        thumbnail: info.get("thumbnail").and_then(Value::as_str).map(str::to_string),
        resolutions,
    })
}

/// mp4/mkv formats with a known resolution, highest first
pub fn parse_video_formats(info: &Value) -> Vec<VideoFormat> {
    let Some(formats) = info.get("formats").and_then(Value::as_array) else {
        return Vec::new();
    };

    let mut out: Vec<VideoFormat> = formats
        .iter()
        .filter_map(|format| {
            let ext = format.get("ext")?.as_str()?.to_lowercase();
            if ext != "mp4" && ext != "mkv" {
                return None;
            }
            let resolution = format.get("format_note")?.as_str()?.to_string();
            let format_id = match format.get("format_id")? {
                Value::String(id) => id.clone(),
                Value::Number(id) => id.to_string(),
                _ => return None,
            };
            if resolution.is_empty() || format_id.is_empty() {
                return None;
            }
            Some(VideoFormat {
                format_id,
                resolution,
                ext,
            })
        })
        .collect();

    out.sort_by_key(|f| std::cmp::Reverse(leading_height(&f.resolution).unwrap_or(0)));
    out
}

/// How a failed yt-dlp run should be handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Retry with the best available format
    FormatUnavailable,
    RateLimited,
    Other,
}

pub fn classify_failure(stderr: &str) -> FailureKind {
    let lower = stderr.to_lowercase();
    if lower.contains("requested format is not available") {
        FailureKind::FormatUnavailable
    } else if lower.contains("rate-limited") || lower.contains("this content isn't available") {
        FailureKind::RateLimited
    } else {
        FailureKind::Other
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_build_format_string() {
        assert_eq!(build_format_string("Best"), BEST_FORMAT);
        assert_eq!(build_format_string("best"), BEST_FORMAT);
        assert_eq!(build_format_string(""), BEST_FORMAT);
        assert_eq!(build_format_string("worst"), "worst");
        assert_eq!(
            build_format_string("720p"),
            "bestvideo[height<=720]+bestaudio/best"
        );
        assert_eq!(
            build_format_string(" 1080P "),
            "bestvideo[height<=1080]+bestaudio/best"
        );
        assert_eq!(build_format_string("premium"), BEST_FORMAT);
    }

    #[test]
    fn test_count_entries() {
        assert_eq!(count_entries(&Value::Null), 0);
        assert_eq!(count_entries(&json!({"id": "abc"})), 1);
        assert_eq!(count_entries(&json!({"playlist_count": 12, "entries": []})), 12);
        assert_eq!(count_entries(&json!({"playlist_count": 0, "entries": [{}, {}, {}]})), 3);
        assert_eq!(count_entries(&json!({"entries": []})), 1);
        assert_eq!(count_entries(&json!({"entries": null})), 1);
    }

    #[test]
    fn test_parse_resolutions_orders_and_dedupes() {
        let info = json!({
            "title": "Never Gonna Give You Up",
            "thumbnail": "https://i.ytimg.com/vi/dQw4w9WgXcQ/maxresdefault.jpg",
            "formats": [
                {"format_note": "medium", "vcodec": "none", "height": null},
                {"format_note": "360p", "vcodec": "avc1", "height": 360},
                {"format_note": "1080p", "vcodec": "avc1", "height": 1080},
                {"format_note": "720p", "vcodec": "vp9", "height": 720},
                {"format_note": "720p", "vcodec": "avc1", "height": 720},
                {"format_note": "480p", "vcodec": "avc1"},
                {"format_note": "storyboard", "vcodec": "images"},
                {"vcodec": "avc1", "height": 144}
            ]
        });

        let parsed = parse_resolutions(&info).unwrap();
        assert_eq!(parsed.title.as_deref(), Some("Never Gonna Give You Up"));
        assert!(parsed.thumbnail.unwrap().ends_with("maxresdefault.jpg"));
        assert_eq!(
            parsed.resolutions,
            vec!["Best", "1080p", "720p", "480p", "360p", "storyboard"]
        );
    }

    #[test]
    fn test_parse_resolutions_without_formats() {
        let err = parse_resolutions(&json!({"title": "x"})).unwrap_err();
        assert!(matches!(err, DownloadiumError::Extraction(_)));

        let only_audio = parse_resolutions(&json!({
            "formats": [{"format_note": "medium", "vcodec": "none"}]
        }))
        .unwrap();
        assert_eq!(only_audio.resolutions, vec!["Best"]);
    }

    #[test]
    fn test_parse_video_formats() {
        let info = json!({
            "formats": [
                {"format_id": "2", "format_note": "720p", "ext": "mkv"},
                {"format_id": "1", "format_note": "1080p", "ext": "mp4"},
                {"format_id": "3", "format_note": "480p", "ext": "webm"},
                {"format_id": "4", "ext": "mp4"},
                {"format_id": 18, "format_note": "360p", "ext": "MP4"}
            ]
        });

        let formats = parse_video_formats(&info);
        assert_eq!(
            formats,
            vec![
                VideoFormat { format_id: "1".into(), resolution: "1080p".into(), ext: "mp4".into() },
                VideoFormat { format_id: "2".into(), resolution: "720p".into(), ext: "mkv".into() },
                VideoFormat { format_id: "18".into(), resolution: "360p".into(), ext: "mp4".into() },
            ]
        );
        assert!(parse_video_formats(&json!({})).is_empty());
    }

    #[test]
    fn test_classify_failure() {
        assert_eq!(
            classify_failure("ERROR: [youtube] abc: Requested format is not available. Use --list-formats"),
            FailureKind::FormatUnavailable
        );
        assert_eq!(
            classify_failure("ERROR: Your account has been rate-limited by YouTube"),
            FailureKind::RateLimited
        );
        assert_eq!(
            classify_failure("ERROR: This content isn't available, try again later."),
            FailureKind::RateLimited
        );
        assert_eq!(classify_failure("ERROR: Private video"), FailureKind::Other);
    }

    #[test]
    fn test_metadata_options_args() {
        let args = metadata_options(None).to_args();
        for expected in [
            "--ignore-config",
            "--flat-playlist",
            "--dump-single-json",
            "--yes-playlist",
            "--quiet",
        ] {
            assert!(args.contains(&expected.to_string()), "missing {expected}");
        }
        let format_at = args.iter().position(|a| a == "--format").unwrap();
        assert_eq!(args[format_at + 1], "best");
        let timeout_at = args.iter().position(|a| a == "--socket-timeout").unwrap();
        assert_eq!(args[timeout_at + 1], "30");
        assert!(!args.contains(&"--cookies".to_string()));
    }

    #[test]
    fn test_cookies_only_when_file_exists() {
        let tmp = tempfile::tempdir().unwrap();
        let cookies = tmp.path().join("cookies.txt");
        let cookies_str = cookies.to_string_lossy().to_string();

        assert_eq!(formats_options(Some(cookies_str.as_str())).cookies, None);

        std::fs::write(&cookies, "# Netscape HTTP Cookie File\n").unwrap();
        let args = formats_options(Some(cookies_str.as_str())).to_args();
        let at = args.iter().position(|a| a == "--cookies").unwrap();
        assert_eq!(args[at + 1], cookies_str);
        assert!(args.contains(&"--no-playlist".to_string()));
    }

    #[test]
    fn test_sub_langs_are_joined() {
        let opts = YtDlpOptions {
            sub_langs: vec!["en.*".into(), "en".into()],
            ..Default::default()
        };
        assert_eq!(opts.to_args(), vec!["--sub-langs", "en.*,en"]);
    }
}
