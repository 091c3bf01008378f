//! Core modules: yt-dlp integration, progress, downloads

pub mod downloader;
pub mod formats;
pub mod progress;
pub mod subtitles;
pub mod thumbnail;
pub mod ytdlp;
