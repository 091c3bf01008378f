//! Subtitle-only downloads

use crate::core::formats::with_url;
use crate::core::ytdlp::{YtDlp, YtDlpOptions};
use crate::error::{DownloadiumError, Result};
use crate::types::SubtitleOutcome;
use crate::utils::paths::ensure_dir;
use serde_json::Value;
use std::path::Path;

/// Options that write one language's subtitles without downloading the video
pub fn subtitle_options(language: &str, output_dir: &str, cookies_file: Option<&str>) -> YtDlpOptions {
    YtDlpOptions {
        quiet: true,
        skip_download: true,
        write_subs: true,
        sub_langs: vec![language.to_string()],
        output_template: Some(
            Path::new(output_dir)
                .join("%(title)s.%(ext)s")
                .to_string_lossy()
                .into_owned(),
        ),
        playlist: Some(false),
        dump_json: true,
        no_simulate: true,
        ..YtDlpOptions::base()
    }
    .with_cookies(cookies_file)
}

/// Whether yt-dlp selected subtitles in `language`
pub fn subtitle_language_available(info: &Value, language: &str) -> bool {
    info.get("requested_subtitles")
        .and_then(|subs| subs.get(language))
        .is_some_and(|entry| !entry.is_null())
}

/// Download subtitles for a single video
pub async fn download_subtitles(
    ytdlp: &YtDlp,
    url: &str,
    language: &str,
    output_dir: &str,
    cookies_file: Option<&str>,
) -> Result<SubtitleOutcome> {
    let language = language.trim();
    if url.trim().is_empty() {
        return Err(DownloadiumError::MissingInput("video URL".into()));
    }
    if output_dir.trim().is_empty() {
        return Err(DownloadiumError::MissingInput("output directory".into()));
    }
    if language.is_empty() {
        return Err(DownloadiumError::MissingInput("subtitle language".into()));
    }

    ytdlp.ensure_available().await?;
    ensure_dir(output_dir).await?;

    let args = with_url(subtitle_options(language, output_dir, cookies_file).to_args(), url);
    let info = ytdlp.run_json(&args).await?;

    let language = language.to_string();
    if subtitle_language_available(&info, &language) {
        Ok(SubtitleOutcome::Saved { language })
    } else {
        Ok(SubtitleOutcome::NotAvailable { language })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_subtitle_options() {
        let args = subtitle_options("pt-BR", "/tmp/subs", None).to_args();
        for flag in ["--skip-download", "--write-subs", "--no-playlist", "--dump-json", "--no-simulate"] {
            assert!(args.contains(&flag.to_string()), "missing {flag}");
        }
        assert!(!args.contains(&"--write-auto-subs".to_string()));

        let at = args.iter().position(|a| a == "--sub-langs").unwrap();
        assert_eq!(args[at + 1], "pt-BR");
        let at = args.iter().position(|a| a == "--output").unwrap();
        assert_eq!(args[at + 1], "/tmp/subs/%(title)s.%(ext)s");
    }

    #[test]
    fn test_subtitle_language_available() {
        let info = json!({
            "requested_subtitles": {
                "en": {"ext": "vtt", "url": "https://example.com/en.vtt"},
                "es": null
            }
        });
        assert!(subtitle_language_available(&info, "en"));
        assert!(!subtitle_language_available(&info, "es"));
        assert!(!subtitle_language_available(&info, "fr"));
        assert!(!subtitle_language_available(&json!({"requested_subtitles": null}), "en"));
        assert!(!subtitle_language_available(&json!({}), "en"));
    }

    #[tokio::test]
    async fn test_download_requires_input() {
        let ytdlp = YtDlp::new("/nonexistent/yt-dlp");

        let err = download_subtitles(&ytdlp, "", "en", "/tmp", None).await.unwrap_err();
        assert!(matches!(err, DownloadiumError::MissingInput(_)));

        let err = download_subtitles(&ytdlp, "https://youtu.be/x", " ", "/tmp", None)
            .await
            .unwrap_err();
        assert!(matches!(err, DownloadiumError::MissingInput(_)));

        let err = download_subtitles(&ytdlp, "https://youtu.be/x", "en", "/tmp", None)
            .await
            .unwrap_err();
        assert!(matches!(err, DownloadiumError::MissingDependency(_)));
    }
}
