use crate::error::{KitError, KitResult};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// One concat-demuxer directive per input, in caller order. Paths that cannot
/// be carried on a single UTF-8 line are rejected rather than mangled.
pub fn list_file_contents(inputs: &[PathBuf]) -> KitResult<String> {
    let mut contents = String::new();
    for path in inputs {
        let text = path.to_str().ok_or_else(|| {
            unlistable(path, "is not valid UTF-8")
        })?;
        if text.contains(['\n', '\r']) {
            return Err(unlistable(path, "contains a line break"));
        }
        let escaped = text.replace('\'', r"'\''");
        contents.push_str(&format!("file '{escaped}'\n"));
    }
    Ok(contents)
}

fn unlistable(path: &Path, why: &str) -> KitError {
    KitError::InvalidFilterParameter(format!(
        "{} {why} and cannot go into a concat list",
        path.display()
    ))
}

/// Write the list into a temp file removed when the handle drops.
pub fn write_list_file(inputs: &[PathBuf], dir: Option<&Path>) -> KitResult<NamedTempFile> {
    let mut builder = tempfile::Builder::new();
    builder.prefix("videokit-concat-").suffix(".txt");
    let mut file = match dir {
        Some(dir) => builder.tempfile_in(dir)?,
        None => builder.tempfile()?,
    };
    file.write_all(list_file_contents(inputs)?.as_bytes())?;
    file.flush()?;
    Ok(file)
}
