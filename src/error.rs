//! Error types for downloadium

use thiserror::Error;

/// Coarse error categories, used for exit codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Input errors
    InvalidUrl,
    MissingInput,
    NoSelection,
    InvalidConfig,

    // Dependency errors
    MissingDependency,

    // yt-dlp errors
    ExtractionError,
    RateLimited,
    DownloadError,

    // Network errors
    NetworkError,

    // System errors
    FileError,
    SpawnError,
}

impl ErrorCode {
    /// Process exit code for this category
    pub fn exit_code(self) -> i32 {
        match self {
            Self::InvalidUrl | Self::MissingInput | Self::NoSelection => 2,
            Self::InvalidConfig => 3,
            Self::MissingDependency => 4,
            Self::ExtractionError | Self::DownloadError => 5,
            Self::RateLimited => 6,
            Self::NetworkError => 7,
            Self::FileError | Self::SpawnError => 1,
        }
    }
}

/// Main error type for downloadium
#[derive(Error, Debug)]
pub enum DownloadiumError {
    #[error("Invalid or unsupported URL")]
    InvalidUrl,

    #[error("Missing input: {0}")]
    MissingInput(String),

    #[error("Missing dependency: {0}. Please install it.")]
    MissingDependency(String),

    #[error("Failed to extract video information: {0}")]
    Extraction(String),

    #[error(
        "YouTube rate-limited this session (it can last up to ~1h). Try again later; keep delays between videos and use cookies/login if possible. Detail: {0}"
    )]
    RateLimited(String),

    #[error("Download failed (yt-dlp): {0}")]
    YtDlp(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("No selection made")]
    NoSelection,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("File error: {0}")]
    File(#[from] std::io::Error),

    #[error("Failed to spawn process: {0}")]
    Spawn(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DownloadiumError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidUrl => ErrorCode::InvalidUrl,
            Self::MissingInput(_) => ErrorCode::MissingInput,
            Self::MissingDependency(_) => ErrorCode::MissingDependency,
            Self::Extraction(_) => ErrorCode::ExtractionError,
            Self::RateLimited(_) => ErrorCode::RateLimited,
            Self::YtDlp(_) => ErrorCode::DownloadError,
            Self::Network(_) => ErrorCode::NetworkError,
            Self::NoSelection => ErrorCode::NoSelection,
            Self::InvalidConfig(_) => ErrorCode::InvalidConfig,
            Self::File(_) => ErrorCode::FileError,
            Self::Spawn(_) => ErrorCode::SpawnError,
            Self::Http(_) => ErrorCode::NetworkError,
            Self::Json(_) => ErrorCode::ExtractionError,
        }
    }
}

pub type Result<T> = std::result::Result<T, DownloadiumError>;
