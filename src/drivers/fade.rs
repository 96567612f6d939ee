use super::{ensure_distinct, label_of, report_done, resolve_input};
use crate::app::App;
use crate::cli::FadeArgs;
use crate::filters::build_fade_filters;
use crate::plan::{JobPlan, output_in, suffixed_output};
use anyhow::{Result, bail};

pub fn run(app: &App, args: &FadeArgs) -> Result<()> {
    let input = resolve_input(&args.input)?;
    let (fade_in, fade_out) = args.durations();

    let media = app.probe(&input)?;
    if media.duration_seconds <= 0.0 {
        bail!("cannot fade {}: duration is unknown", input.display());
    }

    let mut filters = build_fade_filters(fade_in, fade_out, media.duration_seconds)?;
    if !media.has_audio {
        filters.audio = None;
    }

    let output = output_in(args.output.as_deref(), suffixed_output(&input, "_fade", None));
    ensure_distinct([input.as_path()], &output)?;
    let plan = JobPlan::fade(&input, filters, output.clone()).with_overwrite(app.overwrite());
    app.run_ffmpeg(&plan, "Video fade", &label_of(&input), media.duration_seconds)?;

    report_done("Faded video saved", &output);
    Ok(())
}
