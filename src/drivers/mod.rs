//! One module per subcommand. Drivers turn raw CLI parameters into plans and
//! hand them to the shared [`App`](crate::app::App).

pub mod audio;
pub mod fade;
pub mod join;
pub mod trim;
pub mod utvideo;
pub mod vhs;
pub mod youtube;

use crate::app::same_file;
use crate::error::KitError;
use anyhow::{Context, Result, bail};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Absolute path of an existing input file.
pub(crate) fn resolve_input(path: &Path) -> Result<PathBuf> {
    if !path.is_file() {
        return Err(KitError::FileNotFound(path.to_path_buf()).into());
    }
    std::path::absolute(path).with_context(|| format!("cannot resolve {}", path.display()))
}

/// File name used in progress lines and notifications.
pub(crate) fn label_of(path: &Path) -> String {
    path.file_name()
        .and_then(OsStr::to_str)
        .map(str::to_string)
        .unwrap_or_else(|| path.display().to_string())
}

/// Refuse an output that would land on one of the inputs.
pub(crate) fn ensure_distinct<'a>(
    inputs: impl IntoIterator<Item = &'a Path>,
    output: &Path,
) -> Result<()> {
    for input in inputs {
        if same_file(input, output) {
            bail!(
                "output {} would overwrite its own input; pass a different -o",
                output.display()
            );
        }
    }
    Ok(())
}

pub(crate) fn report_done(summary: &str, output: &Path) {
    println!("✅ {summary}: {}", output.display());
}
