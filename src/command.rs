//! Pure translation of plans into argument vectors. `argv[0]` is the bare tool
//! name; the runner resolves it to a binary.

use crate::filters::{TapeNoise, VHS_VIDEO_LABEL};
use crate::plan::{AudioFxPlan, CodecSettings, JobPlan, Operation, OverwritePolicy};
use crate::timestamp::format_hms;
use crate::tools::{FFMPEG, SOX};
use std::ffi::OsString;

#[derive(Debug, Default)]
struct Argv(Vec<OsString>);

impl Argv {
    fn arg(&mut self, a: impl Into<OsString>) -> &mut Self {
        self.0.push(a.into());
        self
    }

    fn args<I, S>(&mut self, items: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.0.extend(items.into_iter().map(Into::into));
        self
    }
}

fn codec_args(codec: CodecSettings) -> &'static [&'static str] {
    match codec {
        CodecSettings::StreamCopy => &["-c", "copy"],
        CodecSettings::AudioStreamCopy => &["-vn", "-c:a", "copy"],
        CodecSettings::LosslessMaster => &["-c:v", "utvideo", "-r", "60", "-c:a", "pcm_f32le"],
        CodecSettings::ProRes422Hq => &[
            "-c:v",
            "prores_ks",
            "-profile:v",
            "3",
            "-pix_fmt",
            "yuv422p10le",
            "-c:a",
            "pcm_s16le",
        ],
        CodecSettings::VhsIntermediate => &[
            "-c:v",
            "utvideo",
            "-pix_fmt",
            "yuv420p",
            "-colorspace",
            "bt709",
            "-color_primaries",
            "bt709",
            "-color_trc",
            "bt709",
        ],
    }
}

pub fn assemble(plan: &JobPlan) -> Vec<OsString> {
    let mut argv = Argv::default();
    argv.args([FFMPEG, "-hide_banner"]);
    argv.arg(match plan.overwrite {
        OverwritePolicy::Overwrite => "-y",
        OverwritePolicy::Fail => "-n",
    });

    match &plan.operation {
        Operation::Trim(range) => {
            argv.args(["-ss".into(), format_hms(range.start_seconds)]);
            push_inputs(&mut argv, plan);
            argv.args(["-t".into(), format_hms(range.duration())]);
        }
        Operation::Concat => {
            argv.args(["-f", "concat", "-safe", "0"]);
            push_inputs(&mut argv, plan);
        }
        Operation::VhsMux => {
            push_inputs(&mut argv, plan);
            argv.args(["-map", "0:v", "-map", "1:a"]);
        }
        Operation::ConvertUtvideo | Operation::PrepareYoutube => {
            push_inputs(&mut argv, plan);
            argv.args(["-map", "0"]);
        }
        Operation::Fade | Operation::ExtractAudio | Operation::VhsVideo { .. } => {
            push_inputs(&mut argv, plan);
        }
    }

    if let Operation::VhsVideo { audio_out } = &plan.operation {
        if let Some(graph) = &plan.filters {
            argv.args(["-filter_complex", graph.video.as_str()]);
        }
        argv.args(codec_args(plan.codec).iter().copied());
        argv.args(["-map", VHS_VIDEO_LABEL]);
        argv.arg(plan.output.as_os_str());
        if let Some(audio_out) = audio_out {
            // sox only mixes streams that share rate and layout with the noise bed
            let bed = TapeNoise::default();
            argv.args(["-map", "0:a", "-c:a", "pcm_f32le"]);
            argv.args(["-ar".to_string(), bed.sample_rate.to_string()]);
            argv.args(["-ac".to_string(), bed.channels.to_string()]);
            argv.arg(audio_out.as_os_str());
        }
        return argv.0;
    }

    if let Some(filters) = &plan.filters {
        if !filters.video.is_empty() {
            argv.args(["-vf", filters.video.as_str()]);
        }
        if let Some(af) = filters.audio.as_deref().filter(|af| !af.is_empty()) {
            argv.args(["-af", af]);
        }
    }
    argv.args(codec_args(plan.codec).iter().copied());
    argv.arg(plan.output.as_os_str());
    argv.0
}

fn push_inputs(argv: &mut Argv, plan: &JobPlan) {
    for input in &plan.inputs {
        argv.arg("-i").arg(input.as_os_str());
    }
}

pub fn assemble_sox(plan: &AudioFxPlan) -> Vec<OsString> {
    let mut argv = Argv::default();
    argv.arg(SOX);
    match plan {
        AudioFxPlan::NoiseBed {
            output,
            duration_seconds,
            noise,
        } => {
            argv.args(["-n".to_string(), "-r".into(), noise.sample_rate.to_string()]);
            argv.args(["-b".to_string(), noise.bit_depth.to_string()]);
            argv.args(["-e", "floating-point"]);
            argv.args(["-c".to_string(), noise.channels.to_string()]);
            argv.arg(output.as_os_str());
            argv.args(["synth".to_string(), duration_seconds.to_string(), "brownnoise".into()]);
            argv.args(["vol".to_string(), noise.linear_level().to_string()]);
        }
        AudioFxPlan::Mix {
            source,
            noise_bed,
            output,
            noise,
        } => {
            argv.arg("-m");
            argv.args(["-v".to_string(), noise.source_volume.to_string()]);
            argv.arg(source.as_os_str());
            argv.args(["-v".to_string(), noise.noise_volume.to_string()]);
            argv.arg(noise_bed.as_os_str());
            argv.arg(output.as_os_str());
        }
        AudioFxPlan::Effects {
            input,
            output,
            expression,
        } => {
            argv.arg(input.as_os_str()).arg(output.as_os_str());
            argv.args(expression.split_whitespace());
        }
    }
    argv.0
}

/// Shell-style rendering for logs.
pub fn display_argv(argv: &[OsString]) -> String {
    argv.iter()
        .map(|a| {
            let s = a.to_string_lossy();
            if s.is_empty() || s.contains(|c: char| c.is_whitespace() || "'\"\\;[]".contains(c)) {
                format!("'{}'", s.replace('\'', r"'\''"))
            } else {
                s.into_owned()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
