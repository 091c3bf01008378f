//! downloadium - videos, thumbnails and subtitles from your terminal
//!
//! Paste a URL, pick a resolution, and let yt-dlp do the rest.

mod core;
mod error;
mod storage;
mod types;
mod ui;
mod utils;

use clap::Parser;
use colored::Colorize;
use std::io::IsTerminal;

use crate::core::downloader::{DownloadManager, DownloadSettings, spawn_download};
use crate::core::formats::{fetch_video_formats, get_resolutions};
use crate::core::subtitles::download_subtitles;
use crate::core::thumbnail::download_thumbnail;
use crate::core::ytdlp::YtDlp;
use crate::error::{DownloadiumError, ErrorCode};
use crate::storage::cache::InfoCache;
use crate::storage::config;
use crate::types::{Action, AppState, MenuItem, SubtitleOutcome, VideoInfo};
use crate::ui::progress::ProgressDisplay;
use crate::ui::selector::{Selector, create_selector};
use crate::utils::logging::init_tracing;
use crate::utils::paths::{ensure_app_dirs, get_info_cache_dir};
use crate::utils::validation::validate_url;

/// Download videos, thumbnails and subtitles from your terminal.
#[derive(Parser, Debug)]
#[command(name = "downloadium")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Video, playlist or channel URL
    url: Option<String>,

    /// Resolution: Best, worst, or a height such as 720p
    #[arg(short, long)]
    resolution: Option<String>,

    /// Container to merge into (mp4, mkv, webm)
    #[arg(short, long)]
    format: Option<String>,

    /// Output directory
    #[arg(short, long)]
    output: Option<String>,

    /// Netscape cookie file for yt-dlp
    #[arg(long)]
    cookies: Option<String>,

    /// Download the video
    #[arg(long)]
    video: bool,

    /// Download the thumbnail
    #[arg(long)]
    thumbnail: bool,

    /// Download subtitles only
    #[arg(long)]
    subtitles: bool,

    /// Subtitle language for --subtitles
    #[arg(long)]
    lang: Option<String>,

    /// Download video, thumbnail and subtitles
    #[arg(short, long)]
    all: bool,

    /// List mp4/mkv formats and exit
    #[arg(long)]
    list_formats: bool,

    /// Ignore cached video information
    #[arg(long)]
    no_cache: bool,

    /// Delete cached video information and exit
    #[arg(long)]
    clear_cache: bool,

    /// Edit the configuration file
    #[arg(short, long)]
    edit: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Which downloads to run for the URL
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Jobs {
    video: bool,
    thumbnail: bool,
    subtitles: bool,
}

impl From<Action> for Jobs {
    fn from(action: Action) -> Self {
        match action {
            Action::Video => Jobs { video: true, ..Jobs::default() },
            Action::Thumbnail => Jobs { thumbnail: true, ..Jobs::default() },
            Action::Subtitles => Jobs { subtitles: true, ..Jobs::default() },
            Action::Everything => Jobs { video: true, thumbnail: true, subtitles: true },
        }
    }
}

/// Jobs requested on the command line, if any
fn requested_jobs(cli: &Cli) -> Option<Jobs> {
    if cli.all {
        return Some(Action::Everything.into());
    }
    let jobs = Jobs {
        // A resolution on its own means "download the video"
        video: cli.video || (cli.resolution.is_some() && !cli.thumbnail && !cli.subtitles),
        thumbnail: cli.thumbnail,
        subtitles: cli.subtitles,
    };
    (jobs != Jobs::default()).then_some(jobs)
}

fn print_error(err: &DownloadiumError) {
    eprintln!("{} {}", "Error:".red(), err);
}

fn action_menu() -> Vec<MenuItem<Action>> {
    vec![
        MenuItem { label: "🎬 Download video".into(), value: Action::Video },
        MenuItem { label: "🖼  Download thumbnail".into(), value: Action::Thumbnail },
        MenuItem { label: "💬 Download subtitles".into(), value: Action::Subtitles },
        MenuItem { label: "📦 Download everything".into(), value: Action::Everything },
    ]
}

fn resolution_menu(info: &VideoInfo) -> Vec<MenuItem<String>> {
    info.resolutions
        .iter()
        .map(|r| MenuItem { label: r.clone(), value: r.clone() })
        .collect()
}

/// Load video info, from cache when possible
async fn load_info(
    ytdlp: &YtDlp,
    cache: &InfoCache,
    url: &str,
    cookies: Option<&str>,
    use_cache: bool,
) -> error::Result<VideoInfo> {
    if use_cache {
        if let Some(info) = cache.get::<VideoInfo>(url).await {
            println!("{}", "Loaded video information from cache.".dimmed());
            return Ok(info);
        }
    }

    println!("{}", "Loading resolutions and thumbnail...".dimmed());
    let info = get_resolutions(ytdlp, url, cookies).await?;

    // Caching is best-effort
    if let Err(e) = cache.set(url, &info).await {
        tracing::debug!(error = %e, "could not cache video info");
    }

    Ok(info)
}

async fn run_video(manager: DownloadManager, url: &str) -> error::Result<()> {
    let display = ProgressDisplay::new();
    let (handle, mut rx) = spawn_download(manager, url.to_string());

    display.drain(&mut rx).await;

    let result = match handle.await {
        Ok(result) => result,
        Err(e) => Err(DownloadiumError::Spawn(format!("download task failed: {}", e))),
    };

    match result {
        Ok(outcome) => {
            display.finish("Status: Done");
            println!(
                "{} {}",
                "✓ Download finished:".green(),
                outcome.output_dir.display()
            );
            Ok(())
        }
        Err(e) => {
            display.abandon("Status: Error");
            Err(e)
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Ensure app directories exist
    ensure_app_dirs().await?;

    // Handle --edit flag
    if cli.edit {
        let cfg = config::load_config().await?;
        config::edit_config(&cfg.editor).await?;
        return Ok(());
    }

    let cfg = config::load_config().await?;
    let cache = InfoCache::new(get_info_cache_dir(), cfg.cache_ttl_secs);

    if cli.clear_cache {
        cache.clear().await?;
        println!("{}", "Cache cleared.".green());
        return Ok(());
    }

    let ytdlp = YtDlp::new(cfg.ytdlp_path.clone());

    let mut settings = DownloadSettings::from_config(&cfg);
    if let Some(ref output) = cli.output {
        settings.output_dir = output.clone();
    }
    if let Some(ref format) = cli.format {
        settings.video_format = format.clone();
    }
    if cli.cookies.is_some() {
        settings.cookies_file = cli.cookies.clone();
    }
    let subtitle_language = cli.lang.clone().unwrap_or_else(|| cfg.subtitle_language.clone());

    let interactive = std::io::stdin().is_terminal();
    let selector: Selector = create_selector(cfg.selector);

    // State machine
    let mut state = AppState::Init;
    let mut url = cli.url.clone().unwrap_or_default().trim().to_string();
    let mut info: Option<VideoInfo> = None;
    let mut jobs = requested_jobs(&cli);
    let mut failure: Option<ErrorCode> = None;

    while state != AppState::Exit {
        match state {
            AppState::Init => {
                if url.is_empty() {
                    if !interactive {
                        print_error(&DownloadiumError::MissingInput("video URL".into()));
                        failure = Some(ErrorCode::MissingInput);
                        state = AppState::Exit;
                        continue;
                    }
                    url = dialoguer::Input::<String>::new()
                        .with_prompt("Video URL")
                        .interact_text()?
                        .trim()
                        .to_string();
                }

                if !validate_url(&url) {
                    print_error(&DownloadiumError::InvalidUrl);
                    failure = Some(ErrorCode::InvalidUrl);
                    state = AppState::Exit;
                    continue;
                }

                if cli.list_formats {
                    match fetch_video_formats(&ytdlp, &url, settings.cookies_file.as_deref()).await {
                        Ok(formats) if formats.is_empty() => {
                            println!("{}", "No mp4/mkv formats found.".yellow());
                        }
                        Ok(formats) => {
                            for f in formats {
                                println!("{:>8}  {:<10} {}", f.format_id, f.resolution, f.ext.dimmed());
                            }
                        }
                        Err(e) => {
                            print_error(&e);
                            failure = Some(e.code());
                        }
                    }
                    state = AppState::Exit;
                    continue;
                }

                state = AppState::LoadInfo;
            }

            AppState::LoadInfo => {
                let needs_info = jobs.is_none_or(|j| j.video || j.thumbnail);
                if !needs_info {
                    state = AppState::Download;
                    continue;
                }

                match load_info(&ytdlp, &cache, &url, settings.cookies_file.as_deref(), !cli.no_cache).await {
                    Ok(loaded) => {
                        if let Some(ref title) = loaded.title {
                            println!("{} {}", "Video:".dimmed(), title);
                        }
                        info = Some(loaded);
                        state = AppState::SelectAction;
                    }
                    Err(e) => {
                        print_error(&e);
                        failure = Some(e.code());
                        state = AppState::Exit;
                    }
                }
            }

            AppState::SelectAction => {
                if jobs.is_none() {
                    jobs = if interactive {
                        selector.select(&action_menu(), "Select Action").map(Jobs::from)
                    } else {
                        Some(Action::Video.into())
                    };
                }

                state = match jobs {
                    Some(_) => AppState::SelectResolution,
                    None => {
                        failure = Some(ErrorCode::NoSelection);
                        AppState::Exit
                    }
                };
            }

            AppState::SelectResolution => {
                let wants_video = jobs.is_some_and(|j| j.video);
                if !wants_video {
                    state = AppState::Download;
                    continue;
                }

                if let Some(ref resolution) = cli.resolution {
                    settings.resolution = resolution.clone();
                    state = AppState::Download;
                    continue;
                }

                let menu = info.as_ref().map(resolution_menu).unwrap_or_default();
                if !interactive || menu.is_empty() {
                    // Keep the configured default
                    state = AppState::Download;
                    continue;
                }

                match selector.select(&menu, "Select Resolution") {
                    Some(resolution) => {
                        settings.resolution = resolution;
                        state = AppState::Download;
                    }
                    None => {
                        print_error(&DownloadiumError::NoSelection);
                        failure = Some(ErrorCode::NoSelection);
                        state = AppState::Exit;
                    }
                }
            }

            AppState::Download => {
                let jobs = jobs.unwrap_or_default();

                if jobs.video {
                    println!("{} {}", "Resolution:".dimmed(), settings.resolution);
                    let manager = DownloadManager::new(settings.clone(), ytdlp.clone());
                    if let Err(e) = run_video(manager, &url).await {
                        print_error(&e);
                        failure = Some(e.code());
                    }
                }

                if jobs.thumbnail {
                    let thumbnail = info.as_ref().and_then(|i| i.thumbnail.as_deref());
                    match thumbnail {
                        Some(thumbnail_url) => {
                            let title = info.as_ref().and_then(|i| i.title.as_deref());
                            match download_thumbnail(thumbnail_url, title, &settings.output_dir).await {
                                Ok(path) => println!(
                                    "{} {}",
                                    "✓ Thumbnail saved to:".green(),
                                    path.display()
                                ),
                                Err(e) => {
                                    print_error(&e);
                                    failure = Some(e.code());
                                }
                            }
                        }
                        None => println!("{}", "No thumbnail available for this video.".yellow()),
                    }
                }

                if jobs.subtitles {
                    match download_subtitles(
                        &ytdlp,
                        &url,
                        &subtitle_language,
                        &settings.output_dir,
                        settings.cookies_file.as_deref(),
                    )
                    .await
                    {
                        Ok(SubtitleOutcome::Saved { language }) => {
                            println!("{}", format!("✓ Subtitles ({}) saved.", language).green());
                        }
                        Ok(SubtitleOutcome::NotAvailable { language }) => {
                            println!(
                                "{}",
                                format!("Subtitles ({}) are not available for this video.", language)
                                    .yellow()
                            );
                        }
                        Err(e) => {
                            print_error(&e);
                            failure = Some(e.code());
                        }
                    }
                }

                state = AppState::Exit;
            }

            AppState::Exit => break,
        }
    }

    if let Some(code) = failure {
        std::process::exit(code.exit_code());
    }

    Ok(())
}
