//! Storage modules: config, video info cache

pub mod cache;
pub mod config;
