use crate::tui::TerminalPicker;
use anyhow::{Context, Result};
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use which::which;

/// Source of free-text answers for interactive modes.
pub trait Picker {
    /// `Ok(None)` means the user backed out.
    fn prompt(&self, label: &str, initial: &str) -> Result<Option<String>>;
}

/// `rofi -dmenu` used as a one-line text prompt.
#[derive(Debug, Clone)]
pub struct RofiPicker {
    bin: PathBuf,
}

impl RofiPicker {
    pub fn detect() -> Option<Self> {
        which("rofi").ok().map(|bin| Self { bin })
    }
}

impl Picker for RofiPicker {
    fn prompt(&self, label: &str, initial: &str) -> Result<Option<String>> {
        let mut child = Command::new(&self.bin)
            .args(["-dmenu", "-p", label, "-filter", initial])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .context("failed to spawn rofi")?;
        // empty menu: whatever is typed comes back on stdout
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(b"")?;
        }
        let out = child.wait_with_output().context("failed to wait for rofi")?;
        if !out.status.success() {
            return Ok(None);
        }
        Ok(non_empty(&String::from_utf8_lossy(&out.stdout)))
    }
}

pub(crate) fn non_empty(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// rofi when installed, otherwise the terminal.
pub fn detect() -> Box<dyn Picker> {
    match RofiPicker::detect() {
        Some(rofi) => Box::new(rofi),
        None => {
            tracing::warn!("rofi not found, prompting on the terminal instead");
            Box::new(TerminalPicker::default())
        }
    }
}
