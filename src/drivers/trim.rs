use super::{ensure_distinct, label_of, report_done, resolve_input};
use crate::app::App;
use crate::cli::TrimArgs;
use crate::filters::build_fade_filters;
use crate::picker::Picker;
use crate::plan::{JobPlan, suffixed_output, timestamped_output};
use crate::timestamp::{EndPolicy, TimeRange};
use anyhow::{Context, Result};
use chrono::Local;
use std::path::{Path, PathBuf};

/// Ask for start and end. `None` when the user backs out of either prompt.
pub(crate) fn prompt_range(
    picker: &dyn Picker,
    start: Option<&str>,
    end: Option<&str>,
) -> Result<Option<(String, String)>> {
    let Some(start) = picker.prompt("Start time", start.unwrap_or("0"))? else {
        return Ok(None);
    };
    let Some(end) = picker.prompt("End time", end.unwrap_or(""))? else {
        return Ok(None);
    };
    Ok(Some((start, end)))
}

fn default_output(input: &Path, interactive: bool, reencode: bool) -> PathBuf {
    let output = if interactive {
        timestamped_output(input, Local::now().naive_local())
    } else {
        suffixed_output(input, "_trim", None)
    };
    // UTVideo/float PCM only fit an AVI container
    if reencode {
        output.with_extension("avi")
    } else {
        output
    }
}

pub fn run(app: &App, args: &TrimArgs) -> Result<()> {
    let input = resolve_input(&args.input)?;

    let (start, end) = if args.interactive {
        match prompt_range(app.picker(), args.start.as_deref(), args.end.as_deref())? {
            Some(answers) => answers,
            None => {
                println!("Cancelled by user.");
                return Ok(());
            }
        }
    } else {
        (
            args.start.clone().context("--start is required")?,
            args.end.clone().context("--end is required")?,
        )
    };

    let requested = TimeRange::parse(&start, &end)?;
    let media = app.probe(&input)?;
    let policy = if args.strict_end {
        EndPolicy::Strict
    } else {
        EndPolicy::Clamp
    };
    let range = requested.fit_to(media.duration_seconds, policy)?;

    let fades = match (args.fade_in, args.fade_out) {
        (None, None) => None,
        (fade_in, fade_out) => {
            let mut spec = build_fade_filters(
                fade_in.unwrap_or(0.0),
                fade_out.unwrap_or(0.0),
                range.duration(),
            )?;
            if !media.has_audio {
                spec.audio = None;
            }
            Some(spec)
        }
    };

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output(&input, args.interactive, fades.is_some()));
    ensure_distinct([input.as_path()], &output)?;
    tracing::info!(
        start = range.start_seconds,
        end = range.end_seconds,
        reencode = fades.is_some(),
        "cutting"
    );

    let plan = JobPlan::trim(&input, range, fades, output.clone()).with_overwrite(app.overwrite());
    app.run_ffmpeg(&plan, "Video cut", &label_of(&input), range.duration())?;

    report_done("Trimmed video saved", &output);
    Ok(())
}
