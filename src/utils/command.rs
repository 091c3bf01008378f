//! External command lookup

use std::path::Path;
use tokio::process::Command;

/// Check if a command is available in PATH, or exists when given as a path
pub async fn is_command_available(cmd: &str) -> bool {
    if cmd.contains(std::path::MAIN_SEPARATOR) || cmd.contains('/') {
        return Path::new(cmd).is_file();
    }

    Command::new("which")
        .arg(cmd)
        .output()
        .await
        .map(|o| o.status.success())
        .unwrap_or(false)
}
