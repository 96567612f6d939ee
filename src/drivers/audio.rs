use super::{ensure_distinct, label_of, report_done, resolve_input};
use crate::app::{App, same_file};
use crate::cli::InputArg;
use crate::plan::{JobPlan, suffixed_output};
use anyhow::{Result, bail};
use std::path::{Path, PathBuf};

/// `<stem>.wav`, or `<stem>_audio.wav` when the source already is that file.
fn wav_output(input: &Path) -> PathBuf {
    let output = suffixed_output(input, "", Some(".wav"));
    if same_file(input, &output) {
        return suffixed_output(input, "_audio", Some(".wav"));
    }
    output
}

pub fn run(app: &App, args: &InputArg) -> Result<()> {
    let input = resolve_input(&args.input)?;
    let media = app.probe(&input)?;
    if !media.has_audio {
        bail!("{} has no audio stream to extract", input.display());
    }

    let output = wav_output(&input);
    ensure_distinct([input.as_path()], &output)?;
    let plan = JobPlan::extract_audio(&input, output.clone()).with_overwrite(app.overwrite());
    app.run_ffmpeg(&plan, "Audio extraction", &label_of(&input), media.duration_seconds)?;

    report_done("Audio extracted", &output);
    Ok(())
}
