use crate::error::{KitError, KitResult};
use std::collections::HashMap;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use which::which;

pub const FFMPEG: &str = "ffmpeg";
pub const FFPROBE: &str = "ffprobe";
pub const SOX: &str = "sox";

/// Binary lookup table: explicit overrides first, then `PATH`.
#[derive(Debug, Clone, Default)]
pub struct Tools {
    overrides: HashMap<String, PathBuf>,
}

impl Tools {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_override(mut self, name: &str, path: Option<PathBuf>) -> Self {
        if let Some(path) = path {
            self.overrides.insert(name.to_string(), path);
        }
        self
    }

    /// Resolve `name` (as it appears in `argv[0]`) to an executable path.
    pub fn resolve(&self, name: &OsStr) -> KitResult<PathBuf> {
        let key = name.to_string_lossy();
        if let Some(path) = self.overrides.get(key.as_ref()) {
            if path.is_file() {
                return Ok(path.clone());
            }
            return Err(KitError::ExternalToolNotFound(path.display().to_string()));
        }
        resolve_bin(Path::new(name))
    }

    pub fn ensure(&self, name: &str) -> KitResult<PathBuf> {
        self.resolve(OsStr::new(name))
    }
}

fn resolve_bin(bin: &Path) -> KitResult<PathBuf> {
    if bin.components().count() > 1 {
        if bin.is_file() {
            return Ok(bin.to_path_buf());
        }
        return Err(KitError::ExternalToolNotFound(bin.display().to_string()));
    }

    which(bin)
        .or_else(|_| {
            if cfg!(windows) {
                let mut exe = bin.as_os_str().to_os_string();
                exe.push(".exe");
                which(exe)
            } else {
                Err(which::Error::CannotFindBinaryPath)
            }
        })
        .map_err(|_| KitError::ExternalToolNotFound(bin.display().to_string()))
}
