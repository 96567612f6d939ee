use crate::error::{KitError, KitResult};
use crate::tools::{FFPROBE, Tools};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Command;

/// What ffprobe told us about one input file.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaDescriptor {
    pub path: PathBuf,
    pub duration_seconds: f64,
    pub width: u32,
    pub height: u32,
    pub frame_rate: f64,
    pub has_video: bool,
    pub has_audio: bool,
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

pub fn probe(tools: &Tools, path: &Path) -> KitResult<MediaDescriptor> {
    if !path.exists() {
        return Err(KitError::FileNotFound(path.to_path_buf()));
    }
    let ffprobe = tools.ensure(FFPROBE)?;

    tracing::debug!(path = %path.display(), "probing");
    let out = Command::new(&ffprobe)
        .args(["-v", "error", "-print_format", "json", "-show_format", "-show_streams"])
        .arg(path)
        .output()?;
    if !out.status.success() {
        return Err(KitError::ProbeFailed {
            path: path.to_path_buf(),
            reason: format!(
                "status {}: {}",
                out.status,
                String::from_utf8_lossy(&out.stderr).trim()
            ),
        });
    }
    MediaDescriptor::from_ffprobe_json(path, &out.stdout)
}

impl MediaDescriptor {
    pub fn from_ffprobe_json(path: &Path, json: &[u8]) -> KitResult<Self> {
        let failed = |reason: String| KitError::ProbeFailed {
            path: path.to_path_buf(),
            reason,
        };
        let parsed: ProbeOutput =
            serde_json::from_slice(json).map_err(|e| failed(format!("unparseable output: {e}")))?;

        let video = parsed
            .streams
            .iter()
            .find(|s| s.codec_type.as_deref() == Some("video"));
        let has_audio = parsed
            .streams
            .iter()
            .any(|s| s.codec_type.as_deref() == Some("audio"));

        let duration_seconds = parsed
            .format
            .as_ref()
            .and_then(|f| f.duration.as_deref())
            .or_else(|| video.and_then(|v| v.duration.as_deref()))
            .and_then(|d| d.trim().parse::<f64>().ok())
            .filter(|d| d.is_finite() && *d >= 0.0)
            .ok_or_else(|| failed("no duration reported".into()))?;

        let frame_rate = video
            .and_then(|v| {
                v.avg_frame_rate
                    .as_deref()
                    .and_then(parse_frame_rate)
                    .or_else(|| v.r_frame_rate.as_deref().and_then(parse_frame_rate))
            })
            .unwrap_or(0.0);

        Ok(Self {
            path: path.to_path_buf(),
            duration_seconds,
            width: video.and_then(|v| v.width).unwrap_or(0),
            height: video.and_then(|v| v.height).unwrap_or(0),
            frame_rate,
            has_video: video.is_some(),
            has_audio,
        })
    }
}

/// `"30000/1001"` or `"25"` to frames per second. `"0/0"` yields `None`.
pub fn parse_frame_rate(raw: &str) -> Option<f64> {
    let fps = match raw.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            if den == 0.0 {
                return None;
            }
            num / den
        }
        None => raw.trim().parse().ok()?,
    };
    (fps.is_finite() && fps > 0.0).then_some(fps)
}
