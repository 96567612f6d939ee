use crate::picker::{Picker, non_empty};
use anyhow::Result;
use dialoguer::{Input, theme::ColorfulTheme};
use std::path::PathBuf;

/// Terminal fallback for the picker.
#[derive(Default)]
pub struct TerminalPicker {
    theme: ColorfulTheme,
}

impl Picker for TerminalPicker {
    fn prompt(&self, label: &str, initial: &str) -> Result<Option<String>> {
        let mut input = Input::<String>::with_theme(&self.theme)
            .with_prompt(format!("{label} (blank = cancel)"))
            .allow_empty(true);
        if !initial.is_empty() {
            input = input.with_initial_text(initial);
        }
        let raw = input.interact_text()?;
        Ok(non_empty(&raw))
    }
}

/// Drag-and-drop terminals wrap paths in quotes.
pub fn clean_dropped_path(raw: &str) -> PathBuf {
    let trimmed = raw.trim();
    let unquoted = trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| trimmed.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')))
        .unwrap_or(trimmed);
    PathBuf::from(unquoted)
}

pub fn prompt_input_path() -> Result<PathBuf> {
    println!("Drag and drop the video here or type the full path:");
    let theme = ColorfulTheme::default();
    loop {
        let raw: String = Input::with_theme(&theme)
            .with_prompt("Video path")
            .interact_text()?;
        let path = clean_dropped_path(&raw);
        if path.exists() {
            return Ok(path);
        }
        println!("Path not found, please try again.");
    }
}
