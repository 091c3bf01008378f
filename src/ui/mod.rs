//! Terminal UI: menu selectors and the progress bar

pub mod dialoguer_selector;
pub mod fzf;
pub mod progress;
pub mod selector;
