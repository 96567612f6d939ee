use crate::filters::{FilterSpec, TapeNoise};
use crate::timestamp::TimeRange;
use chrono::NaiveDateTime;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverwritePolicy {
    #[default]
    Overwrite,
    Fail,
}

/// Fixed codec policies; none of them is user-tunable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecSettings {
    /// Repackage every stream untouched.
    StreamCopy,
    /// Drop video, copy audio.
    AudioStreamCopy,
    /// UTVideo at 60 fps with 32-bit float PCM.
    LosslessMaster,
    /// ProRes 422 HQ, 10-bit 4:2:2, 16-bit PCM.
    ProRes422Hq,
    /// UTVideo tagged bt709; audio is routed separately.
    VhsIntermediate,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Trim(TimeRange),
    /// `inputs[0]` is the concat list file.
    Concat,
    Fade,
    ExtractAudio,
    ConvertUtvideo,
    PrepareYoutube,
    /// Filter the picture; when `audio_out` is set the untouched source audio
    /// is written there as float PCM in the same pass.
    VhsVideo { audio_out: Option<PathBuf> },
    /// `inputs` are `[video, audio]`.
    VhsMux,
}

/// Everything needed to assemble one ffmpeg invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct JobPlan {
    pub operation: Operation,
    pub inputs: Vec<PathBuf>,
    pub output: PathBuf,
    pub codec: CodecSettings,
    pub filters: Option<FilterSpec>,
    pub overwrite: OverwritePolicy,
}

impl JobPlan {
    fn new(
        operation: Operation,
        inputs: Vec<PathBuf>,
        output: PathBuf,
        codec: CodecSettings,
    ) -> Self {
        Self {
            operation,
            inputs,
            output,
            codec,
            filters: None,
            overwrite: OverwritePolicy::default(),
        }
    }

    /// Stream copy unless fades are requested, which need a re-encode.
    pub fn trim(
        input: &Path,
        range: TimeRange,
        fades: Option<FilterSpec>,
        output: PathBuf,
    ) -> Self {
        let codec = if fades.is_some() {
            CodecSettings::LosslessMaster
        } else {
            CodecSettings::StreamCopy
        };
        let mut plan = Self::new(Operation::Trim(range), vec![input.to_path_buf()], output, codec);
        plan.filters = fades;
        plan
    }

    pub fn concat(list_file: &Path, output: PathBuf) -> Self {
        Self::new(
            Operation::Concat,
            vec![list_file.to_path_buf()],
            output,
            CodecSettings::StreamCopy,
        )
    }

    pub fn fade(input: &Path, fades: FilterSpec, output: PathBuf) -> Self {
        let mut plan = Self::new(
            Operation::Fade,
            vec![input.to_path_buf()],
            output,
            CodecSettings::LosslessMaster,
        );
        plan.filters = Some(fades);
        plan
    }

    pub fn extract_audio(input: &Path, output: PathBuf) -> Self {
        Self::new(
            Operation::ExtractAudio,
            vec![input.to_path_buf()],
            output,
            CodecSettings::AudioStreamCopy,
        )
    }

    pub fn convert_utvideo(input: &Path, output: PathBuf) -> Self {
        Self::new(
            Operation::ConvertUtvideo,
            vec![input.to_path_buf()],
            output,
            CodecSettings::LosslessMaster,
        )
    }

    pub fn prepare_youtube(input: &Path, scale: Option<String>, output: PathBuf) -> Self {
        let mut plan = Self::new(
            Operation::PrepareYoutube,
            vec![input.to_path_buf()],
            output,
            CodecSettings::ProRes422Hq,
        );
        plan.filters = scale.map(|video| FilterSpec { video, audio: None });
        plan
    }

    pub fn vhs_video(
        input: &Path,
        graph: FilterSpec,
        video_out: PathBuf,
        audio_out: Option<PathBuf>,
    ) -> Self {
        let mut plan = Self::new(
            Operation::VhsVideo { audio_out },
            vec![input.to_path_buf()],
            video_out,
            CodecSettings::VhsIntermediate,
        );
        plan.filters = Some(graph);
        plan
    }

    /// Stage two of the VHS chain: takes the stage-one outputs explicitly.
    pub fn vhs_mux(video: &Path, audio: &Path, output: PathBuf) -> Self {
        Self::new(
            Operation::VhsMux,
            vec![video.to_path_buf(), audio.to_path_buf()],
            output,
            CodecSettings::StreamCopy,
        )
    }

    pub fn with_overwrite(mut self, overwrite: OverwritePolicy) -> Self {
        self.overwrite = overwrite;
        self
    }
}

/// One sox invocation of the tape-audio chain.
#[derive(Debug, Clone, PartialEq)]
pub enum AudioFxPlan {
    NoiseBed {
        output: PathBuf,
        duration_seconds: f64,
        noise: TapeNoise,
    },
    Mix {
        source: PathBuf,
        noise_bed: PathBuf,
        output: PathBuf,
        noise: TapeNoise,
    },
    Effects {
        input: PathBuf,
        output: PathBuf,
        expression: String,
    },
}

// ---------- output naming ----------

const UNSAFE_NAME_CHARS: &[char] = &[':', '*', '?', '"', '<', '>', '|'];

fn stem_of(input: &Path) -> String {
    input
        .file_stem()
        .and_then(OsStr::to_str)
        .unwrap_or("output")
        .to_string()
}

fn dotted_ext(input: &Path) -> Option<String> {
    input
        .extension()
        .and_then(OsStr::to_str)
        .map(|e| format!(".{e}"))
}

pub fn sanitize_stem(stem: &str) -> String {
    stem.chars()
        .map(|c| if UNSAFE_NAME_CHARS.contains(&c) { '-' } else { c })
        .collect()
}

/// `<stem><suffix>` with `ext` (including the dot) or the input's own extension.
pub fn suffixed_output(input: &Path, suffix: &str, ext: Option<&str>) -> PathBuf {
    let ext = ext
        .map(str::to_string)
        .or_else(|| dotted_ext(input))
        .unwrap_or_default();
    input.with_file_name(format!("{}{suffix}{ext}", stem_of(input)))
}

pub fn timestamped_output(input: &Path, now: NaiveDateTime) -> PathBuf {
    let ext = dotted_ext(input).unwrap_or_default();
    input.with_file_name(format!("{}{ext}", now.format("%Y%m%d_%H%M%S")))
}

pub fn joined_output(first: &Path, now: NaiveDateTime) -> PathBuf {
    let ext = dotted_ext(first).unwrap_or_else(|| ".avi".into());
    first.with_file_name(format!("joined_{}{ext}", now.format("%Y%m%d-%H%M%S")))
}

/// `<sanitized stem>.avi` beside the input, never the input itself.
pub fn vhs_output(input: &Path) -> PathBuf {
    let out = input.with_file_name(format!("{}.avi", sanitize_stem(&stem_of(input))));
    if out == input {
        return suffixed_output(input, "_vhs", Some(".avi"));
    }
    out
}

/// An explicit `-o` may name a file or an existing directory.
pub fn output_in(explicit: Option<&Path>, default: PathBuf) -> PathBuf {
    match explicit {
        Some(dir) if dir.is_dir() => match default.file_name() {
            Some(name) => dir.join(name),
            None => dir.to_path_buf(),
        },
        Some(file) => file.to_path_buf(),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(12, 4, 5)
            .unwrap()
    }

    #[test]
    fn test_trim_codec_depends_on_fades() {
        let range = TimeRange::new(1.0, 2.0).unwrap();
        let copy = JobPlan::trim(Path::new("a.mp4"), range, None, "b.mp4".into());
        assert_eq!(copy.codec, CodecSettings::StreamCopy);

        let fades = FilterSpec {
            video: "fps=60".into(),
            audio: None,
        };
        let enc = JobPlan::trim(Path::new("a.mp4"), range, Some(fades), "b.mp4".into());
        assert_eq!(enc.codec, CodecSettings::LosslessMaster);
    }

    #[test]
    fn test_suffixed_names() {
        let input = Path::new("/v/clip.mkv");
        assert_eq!(suffixed_output(input, "_fade", None), PathBuf::from("/v/clip_fade.mkv"));
        assert_eq!(
            suffixed_output(input, "_utvideo", Some(".avi")),
            PathBuf::from("/v/clip_utvideo.avi")
        );
        assert_eq!(suffixed_output(input, "", Some(".wav")), PathBuf::from("/v/clip.wav"));
        assert_eq!(
            suffixed_output(Path::new("/v/noext"), "_trim", None),
            PathBuf::from("/v/noext_trim")
        );
    }

    #[test]
    fn test_timestamped_names() {
        assert_eq!(
            timestamped_output(Path::new("/v/clip.mp4"), noon()),
            PathBuf::from("/v/20240309_120405.mp4")
        );
        assert_eq!(
            joined_output(Path::new("/v/a.mov"), noon()),
            PathBuf::from("/v/joined_20240309-120405.mov")
        );
        assert_eq!(
            joined_output(Path::new("/v/a"), noon()),
            PathBuf::from("/v/joined_20240309-120405.avi")
        );
    }

    #[test]
    fn test_vhs_output_naming() {
        assert_eq!(vhs_output(Path::new("/v/a:b?.mp4")), PathBuf::from("/v/a-b-.avi"));
        assert_eq!(vhs_output(Path::new("/v/tape.avi")), PathBuf::from("/v/tape_vhs.avi"));
    }

    #[test]
    fn test_output_in_directory() {
        let dir = tempfile::tempdir().unwrap();
        let default = PathBuf::from("/v/clip_fade.mp4");
        assert_eq!(output_in(Some(dir.path()), default.clone()), dir.path().join("clip_fade.mp4"));
        assert_eq!(output_in(Some(Path::new("/x/y.mp4")), default.clone()), PathBuf::from("/x/y.mp4"));
        assert_eq!(output_in(None, default.clone()), default);
    }
}
