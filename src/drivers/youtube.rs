use super::{ensure_distinct, label_of, report_done, resolve_input};
use crate::app::App;
use crate::cli::InputArg;
use crate::filters::{YOUTUBE_TARGET_HEIGHT, upscale_filter};
use crate::plan::{JobPlan, suffixed_output};
use anyhow::{Result, bail};

pub fn run(app: &App, args: &InputArg) -> Result<()> {
    let input = resolve_input(&args.input)?;
    let media = app.probe(&input)?;
    if !media.has_video {
        bail!("{} has no video stream", input.display());
    }

    let scale = upscale_filter(media.height, YOUTUBE_TARGET_HEIGHT)?;
    match &scale {
        Some(filter) => tracing::info!(from = media.height, %filter, "upscaling"),
        None => tracing::info!(height = media.height, "already at or above target height"),
    }

    let output = suffixed_output(&input, "_youtube", Some(".mov"));
    ensure_distinct([input.as_path()], &output)?;
    let plan =
        JobPlan::prepare_youtube(&input, scale, output.clone()).with_overwrite(app.overwrite());
    app.run_ffmpeg(&plan, "YouTube master", &label_of(&input), media.duration_seconds)?;

    report_done("Ready for upload", &output);
    Ok(())
}
