use super::{ensure_distinct, label_of, report_done, resolve_input};
use crate::app::App;
use crate::cli::ConcatArgs;
use crate::concat::write_list_file;
use crate::plan::{JobPlan, joined_output};
use anyhow::{Context, Result};
use chrono::Local;
use std::path::PathBuf;

pub fn run(app: &App, args: &ConcatArgs) -> Result<()> {
    let inputs = args
        .inputs
        .iter()
        .map(|p| resolve_input(p))
        .collect::<Result<Vec<PathBuf>>>()?;

    let mut total_seconds = 0.0;
    for input in &inputs {
        let media = app
            .probe(input)
            .with_context(|| format!("probing {}", input.display()))?;
        total_seconds += media.duration_seconds;
    }

    let output = match &args.output {
        Some(out) => out.clone(),
        None => joined_output(&inputs[0], Local::now().naive_local()),
    };
    ensure_distinct(inputs.iter().map(PathBuf::as_path), &output)?;

    // the list file must outlive the ffmpeg run
    let list = write_list_file(&inputs, None)?;
    tracing::debug!(list = %list.path().display(), count = inputs.len(), "wrote concat list");

    let label = format!("{} (+{} more)", label_of(&inputs[0]), inputs.len() - 1);
    let plan = JobPlan::concat(list.path(), output.clone()).with_overwrite(app.overwrite());
    app.run_ffmpeg(&plan, "Video join", &label, total_seconds)?;

    report_done("Joined video saved", &output);
    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::app::Settings;
    use crate::app::tests::{fake_tool, test_app};
    use crate::tools::{FFMPEG, FFPROBE, Tools};
    use std::path::Path;

    /// Fake ffmpeg that keeps a copy of the list it was handed, then runs `gate`.
    fn join_app(dir: &Path, gate: &str) -> App {
        let ffprobe = fake_tool(
            dir,
            "ffprobe",
            r#"echo '{"format":{"duration":"1.0"},"streams":[{"codec_type":"video"}]}'"#,
        );
        let d = dir.display();
        let script = format!(
            "prev=\nfor arg; do\n  if [ \"$prev\" = \"-i\" ]; then\n    echo \"$arg\" > '{d}/list-path'\n    cp \"$arg\" '{d}/list-copy'\n  fi\n  prev=$arg\n  last=$arg\ndone\n{gate}\necho joined > \"$last\""
        );
        let ffmpeg = fake_tool(dir, "ffmpeg", &script);
        test_app(
            Tools::new()
                .with_override(FFMPEG, Some(ffmpeg))
                .with_override(FFPROBE, Some(ffprobe)),
            Settings::default(),
        )
    }

    fn join_args(dir: &Path) -> ConcatArgs {
        let inputs: Vec<PathBuf> = ["a.mp4", "b.mp4"].iter().map(|n| dir.join(n)).collect();
        for input in &inputs {
            std::fs::write(input, b"clip").unwrap();
        }
        ConcatArgs {
            inputs,
            output: Some(dir.join("joined.mp4")),
        }
    }

    fn handed_list(dir: &Path) -> PathBuf {
        let recorded = std::fs::read_to_string(dir.join("list-path")).unwrap();
        PathBuf::from(recorded.trim_end())
    }

    #[test]
    fn test_join_lists_inputs_in_order_and_drops_the_list() {
        let dir = tempfile::tempdir().unwrap();
        let app = join_app(dir.path(), "");
        let args = join_args(dir.path());
        run(&app, &args).unwrap();

        let listed = std::fs::read_to_string(dir.path().join("list-copy")).unwrap();
        let lines: Vec<&str> = listed.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("a.mp4'"), "{listed}");
        assert!(lines[1].ends_with("b.mp4'"), "{listed}");

        assert!(dir.path().join("joined.mp4").exists());
        assert!(!handed_list(dir.path()).exists());
    }

    #[test]
    fn test_failed_join_drops_the_list_and_output() {
        let dir = tempfile::tempdir().unwrap();
        let app = join_app(dir.path(), "exit 1");
        let args = join_args(dir.path());
        assert!(run(&app, &args).is_err());

        assert!(!handed_list(dir.path()).exists());
        assert!(!dir.path().join("joined.mp4").exists());
    }

    #[test]
    fn test_join_refuses_to_overwrite_an_input() {
        let dir = tempfile::tempdir().unwrap();
        let app = join_app(dir.path(), "");
        let args = ConcatArgs {
            output: Some(dir.path().join("b.mp4")),
            ..join_args(dir.path())
        };
        assert!(run(&app, &args).is_err());
        assert_eq!(std::fs::read(dir.path().join("b.mp4")).unwrap(), b"clip");
        assert!(!dir.path().join("list-path").exists());
    }
}
