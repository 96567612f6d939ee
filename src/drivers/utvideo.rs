use super::{ensure_distinct, label_of, report_done, resolve_input};
use crate::app::App;
use crate::cli::InputArg;
use crate::plan::{JobPlan, suffixed_output};
use anyhow::Result;

pub fn run(app: &App, args: &InputArg) -> Result<()> {
    let input = resolve_input(&args.input)?;
    let media = app.probe(&input)?;

    let output = suffixed_output(&input, "_utvideo", Some(".avi"));
    ensure_distinct([input.as_path()], &output)?;
    let plan = JobPlan::convert_utvideo(&input, output.clone()).with_overwrite(app.overwrite());
    app.run_ffmpeg(&plan, "UTVideo conversion", &label_of(&input), media.duration_seconds)?;

    report_done("Converted to UTVideo", &output);
    Ok(())
}
