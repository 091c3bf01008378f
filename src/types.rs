//! Type definitions for downloadium
//!
//! Source of truth for the data structures shared across modules.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ============================================
// Video Types
// ============================================

/// Label of the resolution entry that lets yt-dlp pick the best format
pub const BEST_RESOLUTION: &str = "Best";

/// What yt-dlp reports about a single video, reduced to what the UI needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoInfo {
    pub title: Option<String>,
    /// URL of the preferred thumbnail
    pub thumbnail: Option<String>,
    /// "Best" followed by format notes, highest first, e.g. "1080p", "720p"
    pub resolutions: Vec<String>,
}

/// A downloadable mp4/mkv format
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoFormat {
    /// Format code for yt-dlp
    pub format_id: String,
    /// "1080p", "720p", etc.
    pub resolution: String,
    pub ext: String,
}

/// Result of a finished video download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOutcome {
    pub output_dir: PathBuf,
    /// Number of videos yt-dlp reported, 0 when unknown
    pub videos: u32,
}

/// Result of a subtitle request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubtitleOutcome {
    Saved { language: String },
    NotAvailable { language: String },
}

// ============================================
// Config Types
// ============================================

/// Menu selector type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SelectorType {
    #[default]
    Fzf,
    Dialoguer,
}

/// User configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Download directory path (empty = ~/Downloads)
    pub output_dir: String,
    /// Default resolution label (default: "Best")
    pub resolution: String,
    /// Merge container (default: "mp4")
    pub video_format: String,
    /// Netscape cookie file passed to yt-dlp
    pub cookies_file: Option<String>,
    /// Subtitle language for subtitle-only downloads (default: "en")
    pub subtitle_language: String,
    /// Seconds to sleep between videos
    pub sleep_interval: f64,
    pub max_sleep_interval: f64,
    /// Seconds to sleep between extraction requests
    pub sleep_interval_requests: f64,
    /// yt-dlp executable
    pub ytdlp_path: String,
    /// Editor command (default: "nvim")
    pub editor: String,
    /// Menu selector
    pub selector: SelectorType,
    /// Lifetime of cached video info, in seconds
    pub cache_ttl_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: String::new(), // Resolved at load time
            resolution: BEST_RESOLUTION.into(),
            video_format: "mp4".into(),
            cookies_file: None,
            subtitle_language: "en".into(),
            sleep_interval: 2.0,
            max_sleep_interval: 5.0,
            sleep_interval_requests: 1.0,
            ytdlp_path: "yt-dlp".into(),
            editor: "nvim".into(),
            selector: SelectorType::default(),
            cache_ttl_secs: 3600,
        }
    }
}

// ============================================
// Selector Types
// ============================================

/// Item displayed in selector menu
#[derive(Debug, Clone)]
pub struct MenuItem<T> {
    /// Display text
    pub label: String,
    /// Underlying value
    pub value: T,
}

/// What to fetch for the chosen URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Video,
    Thumbnail,
    Subtitles,
    Everything,
}

// ============================================
// State Machine Types
// ============================================

/// Application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    /// Ask for a URL
    Init,
    /// Fetch resolutions and thumbnail
    LoadInfo,
    /// Pick a resolution
    SelectResolution,
    /// Pick what to download
    SelectAction,
    /// Run the selected jobs
    Download,
    /// Exit application
    Exit,
}

// ============================================
// Cache Types
// ============================================

/// Cached data with TTL
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub data: T,
    pub timestamp: i64,
    /// Time-to-live in seconds
    pub ttl: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_partial_file_uses_defaults() {
        let cfg: Config = serde_json::from_str(r#"{"resolution": "720p", "selector": "dialoguer"}"#)
            .unwrap();
        assert_eq!(cfg.resolution, "720p");
        assert_eq!(cfg.selector, SelectorType::Dialoguer);
        assert_eq!(cfg.video_format, "mp4");
        assert_eq!(cfg.subtitle_language, "en");
        assert_eq!(cfg.cache_ttl_secs, 3600);
    }
}
