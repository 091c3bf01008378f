//! Resolution and format discovery

use crate::core::ytdlp::{YtDlp, formats_options, parse_resolutions, parse_video_formats};
use crate::error::{DownloadiumError, Result};
use crate::types::{VideoFormat, VideoInfo};
use crate::utils::validation::validate_url;

/// Fetch title, thumbnail and available resolutions for a video
pub async fn get_resolutions(ytdlp: &YtDlp, url: &str, cookies_file: Option<&str>) -> Result<VideoInfo> {
    if !validate_url(url) {
        return Err(DownloadiumError::InvalidUrl);
    }
    ytdlp.ensure_available().await?;

    let info = ytdlp
        .run_json(&with_url(formats_options(cookies_file).to_args(), url))
        .await
        .map_err(|e| match e {
            DownloadiumError::YtDlp(msg) => DownloadiumError::Extraction(msg),
            other => other,
        })?;

    let parsed = parse_resolutions(&info)?;
    tracing::debug!(url, resolutions = parsed.resolutions.len(), "resolutions loaded");
    Ok(parsed)
}

/// List mp4/mkv formats for a video. Unsupported URLs yield an empty list.
pub async fn fetch_video_formats(ytdlp: &YtDlp, url: &str, cookies_file: Option<&str>) -> Result<Vec<VideoFormat>> {
    if !validate_url(url) {
        return Ok(Vec::new());
    }
    ytdlp.ensure_available().await?;

    let info = ytdlp
        .run_json(&with_url(formats_options(cookies_file).to_args(), url))
        .await?;
    Ok(parse_video_formats(&info))
}

/// Append the URL after a `--` so it is never read as a flag
pub(crate) fn with_url(mut args: Vec<String>, url: &str) -> Vec<String> {
    args.push("--".into());
    args.push(url.trim().to_string());
    args
}
