//! Thumbnail download

use crate::error::{DownloadiumError, Result};
use crate::utils::paths::ensure_dir;
use crate::utils::validation::sanitize_filename;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

fn image_extension(name: &str) -> Option<&str> {
    let (_, ext) = name.rsplit_once('.')?;
    IMAGE_EXTENSIONS
        .iter()
        .find(|known| known.eq_ignore_ascii_case(ext))
        .copied()
}

/// File name for a thumbnail, derived from the video title when known, else from the URL
pub fn thumbnail_file_name(thumbnail_url: &str, title: Option<&str>) -> String {
    let path = thumbnail_url.split(['?', '#']).next().unwrap_or_default();
    let basename = path.rsplit('/').next().unwrap_or_default();

    if let Some(title) = title.map(str::trim).filter(|t| !t.is_empty()) {
        let ext = image_extension(basename).unwrap_or("jpg");
        return format!("{}_thumbnail.{}", sanitize_filename(title), ext);
    }

    if basename.is_empty() || !basename.contains('.') {
        return "thumbnail.jpg".into();
    }

    let basename = sanitize_filename(basename);
    if image_extension(&basename).is_some() {
        basename
    } else {
        format!("{}.jpg", basename)
    }
}

/// Download a thumbnail image into `output_dir`, returning the written path
pub async fn download_thumbnail(
    thumbnail_url: &str,
    title: Option<&str>,
    output_dir: &str,
) -> Result<PathBuf> {
    let thumbnail_url = thumbnail_url.trim();
    if thumbnail_url.is_empty() {
        return Err(DownloadiumError::MissingInput("thumbnail URL".into()));
    }
    if output_dir.trim().is_empty() {
        return Err(DownloadiumError::MissingInput("output directory".into()));
    }

    ensure_dir(output_dir).await?;

    let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
    let mut response = client.get(thumbnail_url).send().await?;

    if !response.status().is_success() {
        return Err(DownloadiumError::Network(format!(
            "HTTP {}: {}",
            response.status(),
            thumbnail_url
        )));
    }

    let path = Path::new(output_dir).join(thumbnail_file_name(thumbnail_url, title));
    let mut file = File::create(&path).await?;
    while let Some(chunk) = response.chunk().await? {
        file.write_all(&chunk).await?;
    }
    file.flush().await?;

    tracing::debug!(path = %path.display(), "thumbnail saved");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name_from_url() {
        assert_eq!(
            thumbnail_file_name("https://i.ytimg.com/vi/abc/maxresdefault.jpg", None),
            "maxresdefault.jpg"
        );
        assert_eq!(
            thumbnail_file_name("https://i.ytimg.com/vi_webp/abc/hq720.webp?sqp=-oaymwE", None),
            "hq720.webp"
        );
        assert_eq!(
            thumbnail_file_name("https://cdn.example.com/thumbs/frame.v2", None),
            "frame.v2.jpg"
        );
        assert_eq!(thumbnail_file_name("https://cdn.example.com/thumbs/", None), "thumbnail.jpg");
        assert_eq!(thumbnail_file_name("https://cdn.example.com/image", None), "thumbnail.jpg");
    }

    #[test]
    fn test_file_name_from_title() {
        assert_eq!(
            thumbnail_file_name("https://i.ytimg.com/vi/abc/maxresdefault.jpg", Some("Intro: Part 1/2")),
            "Intro_ Part 1_2_thumbnail.jpg"
        );
        assert_eq!(
            thumbnail_file_name("https://i.ytimg.com/vi_webp/abc/hq720.WEBP", Some("clip")),
            "clip_thumbnail.webp"
        );
        assert_eq!(
            thumbnail_file_name("https://cdn.example.com/image", Some("  ")),
            "thumbnail.jpg"
        );
    }

    #[tokio::test]
    async fn test_download_requires_input() {
        let err = download_thumbnail("", None, "/tmp").await.unwrap_err();
        assert!(matches!(err, DownloadiumError::MissingInput(_)));

        let err = download_thumbnail("https://i.ytimg.com/vi/a/default.jpg", None, " ")
            .await
            .unwrap_err();
        assert!(matches!(err, DownloadiumError::MissingInput(_)));
    }
}
