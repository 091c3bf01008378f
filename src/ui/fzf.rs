//! fzf selector implementation

use crate::types::MenuItem;
use std::io::Write;
use std::process::{Command, Stdio};

pub struct FzfSelector;

/// Render menu items as fzf input lines: `<index>\t<label>`
fn fzf_input<T>(items: &[MenuItem<T>]) -> String {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| format!("{}\t{}", i, item.label))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Index of the item fzf printed back
fn parse_selection(output: &str) -> Option<usize> {
    let line = output.trim();
    if line.is_empty() {
        return None;
    }
    line.split('\t').next()?.parse().ok()
}

impl FzfSelector {
    pub fn new() -> Self {
        Self
    }

    pub fn select<T: Clone>(&self, items: &[MenuItem<T>], prompt: &str) -> Option<T> {
        if items.is_empty() {
            return None;
        }

        // Menu order is meaningful (best resolution first), so no sorting
        let mut child = Command::new("fzf")
            .args([
                "--prompt", &format!("{} > ", prompt),
                "--height", "40%",
                "--reverse",
                "--no-sort",
                "--ansi",
                "--delimiter", "\t",
                "--with-nth", "2",
            ])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .ok()?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(fzf_input(items).as_bytes()).ok()?;
        }

        let output = child.wait_with_output().ok()?;

        if !output.status.success() {
            return None; // User cancelled
        }

        let index = parse_selection(&String::from_utf8_lossy(&output.stdout))?;
        items.get(index).map(|item| item.value.clone())
    }

    pub fn is_available(&self) -> bool {
        Command::new("which")
            .arg("fzf")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_and_selection_round_trip() {
        let items = vec![
            MenuItem { label: "Best".to_string(), value: "Best" },
            MenuItem { label: "720p".to_string(), value: "720p" },
        ];
        assert_eq!(fzf_input(&items), "0\tBest\n1\t720p");
        assert_eq!(parse_selection("1\t720p\n"), Some(1));
        assert_eq!(parse_selection("\n"), None);
        assert_eq!(parse_selection("x\tBest"), None);
    }
}
