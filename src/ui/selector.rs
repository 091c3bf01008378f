//! Selector enum and factory

use super::dialoguer_selector::DialoguerSelector;
use super::fzf::FzfSelector;
use crate::types::{MenuItem, SelectorType};

/// Interactive menu backend
pub enum Selector {
    Fzf(FzfSelector),
    Dialoguer(DialoguerSelector),
}

impl Selector {
    /// Select an item from the menu. `None` means the user cancelled.
    pub fn select<T: Clone>(&self, items: &[MenuItem<T>], prompt: &str) -> Option<T> {
        match self {
            Selector::Fzf(s) => s.select(items, prompt),
            Selector::Dialoguer(s) => s.select(items, prompt),
        }
    }
}

/// Create a selector based on type, falling back to dialoguer when fzf is missing
pub fn create_selector(selector_type: SelectorType) -> Selector {
    match selector_type {
        SelectorType::Fzf => {
            let fzf = FzfSelector::new();
            if fzf.is_available() {
                return Selector::Fzf(fzf);
            }
            tracing::debug!("fzf not found, using dialoguer");
            Selector::Dialoguer(DialoguerSelector::new())
        }
        SelectorType::Dialoguer => Selector::Dialoguer(DialoguerSelector::new()),
    }
}
