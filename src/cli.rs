use crate::filters::{validate_percent_range, validate_unit_interval};
use crate::timestamp;
use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "videokit",
    version,
    about = "Everyday video chores (trim, join, fade, masters, VHS look) via ffmpeg and sox"
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Show raw tool logs and debug tracing
    #[arg(short = 'v', long, global = true, action = ArgAction::SetTrue)]
    pub verbose: bool,

    /// Path to ffmpeg binary (overrides PATH lookup)
    #[arg(long, global = true, env = "VIDEOKIT_FFMPEG", value_hint = ValueHint::ExecutablePath)]
    pub ffmpeg: Option<PathBuf>,

    /// Path to ffprobe binary (overrides PATH lookup)
    #[arg(long, global = true, env = "VIDEOKIT_FFPROBE", value_hint = ValueHint::ExecutablePath)]
    pub ffprobe: Option<PathBuf>,

    /// Path to sox binary (overrides PATH lookup)
    #[arg(long, global = true, env = "VIDEOKIT_SOX", value_hint = ValueHint::ExecutablePath)]
    pub sox: Option<PathBuf>,

    /// Never send desktop notifications
    #[arg(long, global = true, action = ArgAction::SetTrue)]
    pub no_notify: bool,

    /// Hide the terminal progress bar
    #[arg(long, global = true, action = ArgAction::SetTrue)]
    pub no_progress: bool,

    /// Keep partially written output when a tool fails
    #[arg(long, global = true, action = ArgAction::SetTrue)]
    pub keep_partial: bool,

    /// Fail instead of overwriting an existing output file
    #[arg(long, global = true, action = ArgAction::SetTrue)]
    pub no_overwrite: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Give a video the look and sound of a worn VHS tape (<input>.avi)
    ApplyVhsEffect(VhsArgs),
    /// Cut a segment out of a video
    TrimVideo(TrimArgs),
    /// Join videos in the given order without re-encoding
    ConcatVideos(ConcatArgs),
    /// Fade a video in and/or out (UTVideo, 60 fps, float PCM)
    FadeVideo(FadeArgs),
    /// Copy the audio track out to <input>.wav
    ExtractAudio(InputArg),
    /// Re-encode to lossless UTVideo at 60 fps (<input>_utvideo.avi)
    ConvertToUtvideo(InputArg),
    /// Make a ProRes 422 HQ 2160p master for upload (<input>_youtube.mov)
    PrepareYoutube(InputArg),
}

#[derive(Args, Debug, Clone)]
pub struct InputArg {
    /// Input video file
    #[arg(value_hint = ValueHint::FilePath)]
    pub input: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct VhsArgs {
    /// Input video file (asked for on the terminal when omitted)
    #[arg(value_hint = ValueHint::FilePath)]
    pub input: Option<String>,

    /// Saturation multiplier
    #[arg(long, default_value = "0.75")]
    pub saturation: f64,

    /// Grain strength 0..100
    #[arg(long, default_value = "5", value_parser = validate_percent_range)]
    pub noise: u8,

    /// Peak horizontal line jitter in pixels
    #[arg(long, default_value = "5.5")]
    pub jitter: f64,

    /// Darken every other line, 0..1 (0 = off)
    #[arg(long, default_value = "0", value_parser = validate_unit_interval)]
    pub scanlines: f64,
}

#[derive(Args, Debug, Clone)]
pub struct TrimArgs {
    /// Input video file
    #[arg(short = 'i', long, value_hint = ValueHint::FilePath)]
    pub input: PathBuf,

    /// Start time (seconds, MM:SS or HH:MM:SS(.sss))
    #[arg(long, required_unless_present = "interactive")]
    pub start: Option<String>,

    /// End time (seconds, MM:SS or HH:MM:SS(.sss))
    #[arg(long, required_unless_present = "interactive")]
    pub end: Option<String>,

    /// Output file (default: <input>_trim<ext>, or <timestamp><ext> when interactive)
    #[arg(short = 'o', long, value_hint = ValueHint::FilePath)]
    pub output: Option<PathBuf>,

    /// Ask for start and end through rofi (terminal if rofi is missing)
    #[arg(long, action = ArgAction::SetTrue)]
    pub interactive: bool,

    /// Fade in over this long (forces a lossless re-encode)
    #[arg(long, value_parser = parse_fade_duration)]
    pub fade_in: Option<f64>,

    /// Fade out over this long (forces a lossless re-encode)
    #[arg(long, value_parser = parse_fade_duration)]
    pub fade_out: Option<f64>,

    /// Reject an end past the input duration instead of clamping it
    #[arg(long, action = ArgAction::SetTrue)]
    pub strict_end: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ConcatArgs {
    /// Videos to join, in order
    #[arg(required = true, num_args = 2.., value_hint = ValueHint::FilePath)]
    pub inputs: Vec<PathBuf>,

    /// Output file (default: joined_<timestamp><ext> beside the first input)
    #[arg(short = 'o', long, value_hint = ValueHint::FilePath)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct FadeArgs {
    /// Input video file
    #[arg(short = 'i', long, value_hint = ValueHint::FilePath)]
    pub input: PathBuf,

    /// Same fade duration in and out
    #[arg(
        long,
        value_parser = parse_fade_duration,
        conflicts_with_all = ["fade_in", "fade_out"],
        required_unless_present_any = ["fade_in", "fade_out"]
    )]
    pub fade: Option<f64>,

    /// Fade-in duration (seconds or HH:MM:SS(.sss))
    #[arg(long, value_parser = parse_fade_duration)]
    pub fade_in: Option<f64>,

    /// Fade-out duration (seconds or HH:MM:SS(.sss))
    #[arg(long, value_parser = parse_fade_duration)]
    pub fade_out: Option<f64>,

    /// Output file or directory (default: <input>_fade<ext>)
    #[arg(short = 'o', long, value_hint = ValueHint::AnyPath)]
    pub output: Option<PathBuf>,
}

impl FadeArgs {
    /// `(fade_in, fade_out)` in seconds, zero for an absent side.
    pub fn durations(&self) -> (f64, f64) {
        match self.fade {
            Some(both) => (both, both),
            None => (self.fade_in.unwrap_or(0.0), self.fade_out.unwrap_or(0.0)),
        }
    }
}

pub fn parse_fade_duration(raw: &str) -> Result<f64, String> {
    let secs = timestamp::parse(raw).map_err(|e| e.to_string())?;
    if secs <= 0.0 {
        return Err(format!("fade duration must be > 0 (got {secs})"));
    }
    Ok(secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_fade_symmetric() {
        let cli = Cli::try_parse_from(["videokit", "fade-video", "-i", "a.mp4", "--fade", "2.5"]).unwrap();
        let Commands::FadeVideo(args) = cli.command else {
            panic!("wrong subcommand");
        };
        assert_eq!(args.durations(), (2.5, 2.5));
    }

    #[test]
    fn test_fade_requires_some_fade() {
        assert!(Cli::try_parse_from(["videokit", "fade-video", "-i", "a.mp4"]).is_err());
        assert!(
            Cli::try_parse_from(["videokit", "fade-video", "-i", "a.mp4", "--fade", "1", "--fade-in", "2"])
                .is_err()
        );
        assert!(Cli::try_parse_from(["videokit", "fade-video", "-i", "a.mp4", "--fade", "0"]).is_err());
    }

    #[test]
    fn test_fade_accepts_timestamp_syntax() {
        let cli = Cli::try_parse_from([
            "videokit", "fade-video", "-i", "a.mp4", "--fade-in", "00:00:01.5", "--fade-out", "3",
        ])
        .unwrap();
        let Commands::FadeVideo(args) = cli.command else {
            panic!("wrong subcommand");
        };
        assert_eq!(args.durations(), (1.5, 3.0));
    }

    #[test]
    fn test_trim_needs_range_unless_interactive() {
        assert!(Cli::try_parse_from(["videokit", "trim-video", "-i", "a.mp4"]).is_err());
        assert!(Cli::try_parse_from(["videokit", "trim-video", "-i", "a.mp4", "--interactive"]).is_ok());
        let cli = Cli::try_parse_from([
            "videokit", "trim-video", "-i", "a.mp4", "--start", "5", "--end", "00:00:15",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::TrimVideo(ref t) if t.start.as_deref() == Some("5")));
    }

    #[test]
    fn test_concat_needs_two_inputs() {
        assert!(Cli::try_parse_from(["videokit", "concat-videos", "a.mp4"]).is_err());
        assert!(Cli::try_parse_from(["videokit", "concat-videos", "a.mp4", "b.mp4"]).is_ok());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["videokit", "extract-audio", "a.mp4", "--no-notify", "--keep-partial"]).unwrap();
        assert!(cli.global.no_notify);
        assert!(cli.global.keep_partial);
    }

    #[test]
    fn test_vhs_input_optional() {
        let cli = Cli::try_parse_from(["videokit", "apply-vhs-effect"]).unwrap();
        assert!(matches!(cli.command, Commands::ApplyVhsEffect(ref v) if v.input.is_none() && v.noise == 5));
    }
}
