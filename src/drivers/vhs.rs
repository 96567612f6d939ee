//! VHS look in three stages: picture (plus raw audio) through ffmpeg, tape
//! hiss and low-pass through sox, then a stream-copy mux.

use super::{ensure_distinct, label_of, report_done, resolve_input};
use crate::app::App;
use crate::cli::VhsArgs;
use crate::filters::{TapeNoise, VhsOptions, build_vhs_filters};
use crate::notify::NotificationProgress;
use crate::plan::{AudioFxPlan, JobPlan, OverwritePolicy, vhs_output};
use crate::probe::MediaDescriptor;
use crate::runner::ProgressObserver;
use crate::tools::{FFMPEG, SOX};
use crate::tui::{clean_dropped_path, prompt_input_path};
use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};

const TASK: &str = "VHS effect";

/// Intermediate files, all inside one scratch directory.
struct Scratch {
    video: PathBuf,
    raw_audio: PathBuf,
    noise_bed: PathBuf,
    mixed: PathBuf,
    tape_audio: PathBuf,
}

impl Scratch {
    fn in_dir(dir: &Path) -> Self {
        Self {
            video: dir.join("vhs.avi"),
            raw_audio: dir.join("audio.wav"),
            noise_bed: dir.join("noise.wav"),
            mixed: dir.join("mix.wav"),
            tape_audio: dir.join("vhs.wav"),
        }
    }

    fn audio_plans(&self, duration_seconds: f64, lowpass: &str) -> [AudioFxPlan; 3] {
        let noise = TapeNoise::default();
        [
            AudioFxPlan::NoiseBed {
                output: self.noise_bed.clone(),
                duration_seconds,
                noise: noise.clone(),
            },
            AudioFxPlan::Mix {
                source: self.raw_audio.clone(),
                noise_bed: self.noise_bed.clone(),
                output: self.mixed.clone(),
                noise,
            },
            AudioFxPlan::Effects {
                input: self.mixed.clone(),
                output: self.tape_audio.clone(),
                expression: lowpass.to_string(),
            },
        ]
    }
}

fn options_for(media: &MediaDescriptor, args: &VhsArgs) -> VhsOptions {
    VhsOptions {
        // yuv420p planes need even dimensions
        width: media.width / 2 * 2,
        height: media.height / 2 * 2,
        saturation: args.saturation,
        noise: args.noise,
        jitter: args.jitter,
        scanlines: args.scanlines,
        ..VhsOptions::default()
    }
}

fn input_path(args: &VhsArgs) -> Result<PathBuf> {
    match args.input.as_deref() {
        Some(raw) => Ok(clean_dropped_path(raw)),
        None => prompt_input_path(),
    }
}

pub fn run(app: &App, args: &VhsArgs) -> Result<()> {
    let input = resolve_input(&input_path(args)?)?;
    let tools = app.runner().tools();
    tools.ensure(FFMPEG)?;

    let media = app.probe(&input)?;
    if !media.has_video {
        bail!("{} has no video stream", input.display());
    }
    let graph = build_vhs_filters(&options_for(&media, args))?;
    let output = vhs_output(&input);
    ensure_distinct([input.as_path()], &output)?;
    let label = label_of(&input);

    if !media.has_audio {
        tracing::info!("no audio stream, skipping tape audio");
        let plan = JobPlan::vhs_video(&input, graph, output.clone(), None)
            .with_overwrite(app.overwrite());
        app.run_ffmpeg(&plan, TASK, &label, media.duration_seconds)?;
        report_done("VHS effect applied", &output);
        return Ok(());
    }

    tools.ensure(SOX)?;
    if media.duration_seconds <= 0.0 {
        bail!("cannot size the tape noise: duration of {} is unknown", input.display());
    }

    let parent = input.parent().unwrap_or(Path::new("."));
    let dir = tempfile::Builder::new()
        .prefix(".videokit-vhs-")
        .tempdir_in(parent)
        .with_context(|| format!("cannot create scratch directory in {}", parent.display()))?;
    let scratch = Scratch::in_dir(dir.path());
    tracing::debug!(dir = %dir.path().display(), "scratch directory");

    tracing::info!("stage 1/3: picture");
    let lowpass = graph.audio.clone().unwrap_or_default();
    let stage_one = JobPlan::vhs_video(
        &input,
        graph,
        scratch.video.clone(),
        Some(scratch.raw_audio.clone()),
    )
    .with_overwrite(OverwritePolicy::Overwrite);
    app.run_ffmpeg(&stage_one, TASK, &format!("{label} (video)"), media.duration_seconds)?;

    tracing::info!("stage 2/3: tape audio");
    let mut note = NotificationProgress::start(app.notifier(), TASK, &format!("{label} (audio)"));
    let audio = scratch
        .audio_plans(media.duration_seconds, &lowpass)
        .iter()
        .try_for_each(|plan| app.run_sox(plan).map(drop));
    note.on_finish(audio.is_ok());
    audio?;

    tracing::info!("stage 3/3: mux");
    let mux = JobPlan::vhs_mux(&scratch.video, &scratch.tape_audio, output.clone())
        .with_overwrite(app.overwrite());
    app.run_ffmpeg(&mux, TASK, &label_of(&output), media.duration_seconds)?;

    report_done("VHS effect applied", &output);
    Ok(())
}
