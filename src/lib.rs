//! downloadium library
//!
//! Core functionality for the downloadium CLI: yt-dlp option assembly,
//! progress tracking, and thumbnail/subtitle downloads.

pub mod core;
pub mod error;
pub mod storage;
pub mod types;
pub mod ui;
pub mod utils;
