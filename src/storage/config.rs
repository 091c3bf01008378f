//! Configuration management

use crate::error::{DownloadiumError, Result};
use crate::types::Config;
use crate::utils::paths::{default_output_dir, ensure_dir, get_config_dir, get_config_path};
use std::path::Path;
use tokio::fs;
use tokio::process::Command;

/// Load configuration from the default location, merging with defaults
pub async fn load_config() -> Result<Config> {
    load_config_from(&get_config_path()).await
}

/// Load configuration from `config_path`. Missing fields take their defaults.
pub async fn load_config_from(config_path: &str) -> Result<Config> {
    let mut config = if Path::new(config_path).exists() {
        let content = fs::read_to_string(config_path).await?;
        serde_json::from_str::<Config>(&content)
            .map_err(|e| DownloadiumError::InvalidConfig(format!("{}: {}", config_path, e)))?
    } else {
        Config::default()
    };

    // Set output_dir with default if empty
    if config.output_dir.trim().is_empty() {
        config.output_dir = default_output_dir();
    }

    if config.resolution.trim().is_empty() {
        config.resolution = Config::default().resolution;
    }

    Ok(config)
}

/// Save configuration to file
pub async fn save_config(config: &Config) -> Result<()> {
    ensure_dir(&get_config_dir()).await?;
    let content = serde_json::to_string_pretty(config)?;
    fs::write(get_config_path(), content).await?;
    Ok(())
}

/// Open config file in editor
pub async fn edit_config(editor: &str) -> Result<()> {
    let config_path = get_config_path();

    // Ensure config file exists
    if !Path::new(&config_path).exists() {
        save_config(&Config::default()).await?;
    }

    Command::new(editor)
        .arg(&config_path)
        .status()
        .await
        .map_err(|e| DownloadiumError::Spawn(format!("Failed to start {}: {}", editor, e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_file_gives_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.json");

        let config = load_config_from(&path.to_string_lossy()).await.unwrap();
        assert_eq!(config.resolution, "Best");
        assert_eq!(config.output_dir, default_output_dir());
    }

    #[tokio::test]
    async fn test_user_values_win() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"output_dir": "/srv/videos", "video_format": "mkv", "sleep_interval": 0.5, "resolution": ""}"#,
        )
        .unwrap();

        let config = load_config_from(&path.to_string_lossy()).await.unwrap();
        assert_eq!(config.output_dir, "/srv/videos");
        assert_eq!(config.video_format, "mkv");
        assert_eq!(config.sleep_interval, 0.5);
        assert_eq!(config.resolution, "Best");
        assert_eq!(config.ytdlp_path, "yt-dlp");
    }

    #[tokio::test]
    async fn test_invalid_file_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.json");
        std::fs::write(&path, r#"{"output_dir": 42}"#).unwrap();

        let err = load_config_from(&path.to_string_lossy()).await.unwrap_err();
        assert!(matches!(err, DownloadiumError::InvalidConfig(_)));
    }
}
