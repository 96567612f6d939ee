use crate::error::{KitError, KitResult};
use crate::tools::{FFMPEG, Tools};
use regex::Regex;
use std::ffi::OsString;
use std::io::{BufRead, BufReader, ErrorKind, Read};
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use std::sync::LazyLock;
use std::time::{Duration, Instant};

static PROGRESS_KV: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\w+)=([\w\-\.:/]+)$").expect("progress pattern compiles"));

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessResult {
    pub exit_code: i32,
    pub duration_wall: Duration,
}

/// Receives best-effort completion updates while a tool runs.
pub trait ProgressObserver {
    /// `percent` is within 0..=100.
    fn on_progress(&mut self, percent: f64);

    fn on_finish(&mut self, _success: bool) {}
}

impl<A: ProgressObserver, B: ProgressObserver> ProgressObserver for (A, B) {
    fn on_progress(&mut self, percent: f64) {
        self.0.on_progress(percent);
        self.1.on_progress(percent);
    }

    fn on_finish(&mut self, success: bool) {
        self.0.on_finish(success);
        self.1.on_finish(success);
    }
}

impl<T: ProgressObserver + ?Sized> ProgressObserver for &mut T {
    fn on_progress(&mut self, percent: f64) {
        (**self).on_progress(percent);
    }

    fn on_finish(&mut self, success: bool) {
        (**self).on_finish(success);
    }
}

pub struct Progress<'a> {
    /// Expected output duration; `<= 0` means unknown.
    pub total_seconds: f64,
    pub observer: &'a mut dyn ProgressObserver,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ProgressEvent {
    Elapsed(f64),
    End,
}

fn parse_progress_line(line: &str) -> Option<ProgressEvent> {
    let caps = PROGRESS_KV.captures(line.trim())?;
    match (&caps[1], &caps[2]) {
        // both keys carry microseconds
        ("out_time_ms" | "out_time_us", v) => v
            .parse::<i64>()
            .ok()
            .filter(|us| *us >= 0)
            .map(|us| ProgressEvent::Elapsed(us as f64 / 1_000_000.0)),
        ("progress", "end") => Some(ProgressEvent::End),
        _ => None,
    }
}

fn percent_of(elapsed: f64, total: f64) -> f64 {
    if total > 0.0 {
        (elapsed / total * 100.0).clamp(0.0, 100.0)
    } else {
        ((elapsed % 10.0) * 10.0).min(100.0)
    }
}

fn pump_progress<R: Read>(reader: R, total_seconds: f64, observer: &mut dyn ProgressObserver) {
    let reader = BufReader::new(reader);
    for line in reader.lines() {
        let Ok(line) = line else { break };
        match parse_progress_line(&line) {
            Some(ProgressEvent::Elapsed(secs)) => {
                observer.on_progress(percent_of(secs, total_seconds))
            }
            Some(ProgressEvent::End) => observer.on_progress(100.0),
            None => {}
        }
    }
}

fn exit_code_of(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(sig) = status.signal() {
            return 128 + sig;
        }
    }
    1
}

fn is_ffmpeg(program: &OsString) -> bool {
    Path::new(program)
        .file_stem()
        .is_some_and(|s| s == FFMPEG)
}

/// Spawns one external tool at a time and waits for it.
#[derive(Debug, Clone, Default)]
pub struct Runner {
    tools: Tools,
    verbose: bool,
}

impl Runner {
    pub fn new(tools: Tools, verbose: bool) -> Self {
        Self { tools, verbose }
    }

    pub fn tools(&self) -> &Tools {
        &self.tools
    }

    /// Run `argv` to completion. `argv[0]` is resolved before anything is
    /// spawned. For ffmpeg, progress flags are injected when an observer is
    /// attached and logging is reduced to errors unless verbose.
    pub fn run(
        &self,
        argv: &[OsString],
        mut progress: Option<Progress<'_>>,
    ) -> KitResult<ProcessResult> {
        let (program, rest) = argv
            .split_first()
            .ok_or_else(|| KitError::ExternalToolNotFound("<empty command>".into()))?;
        let tool = program.to_string_lossy().into_owned();
        let bin = self.tools.resolve(program)?;

        let mut cmd = Command::new(&bin);
        if is_ffmpeg(program) {
            if progress.is_some() {
                cmd.args(["-progress", "pipe:1", "-nostats"]);
            }
            if !self.verbose {
                cmd.args(["-loglevel", "error"]);
            }
        }
        cmd.args(rest);
        cmd.stdin(Stdio::null())
            .stdout(if progress.is_some() {
                Stdio::piped()
            } else {
                Stdio::inherit()
            })
            .stderr(Stdio::inherit());

        tracing::debug!(tool = %tool, bin = %bin.display(), args = ?rest, "spawning");
        let started = Instant::now();
        let mut child = cmd.spawn().map_err(|e| match e.kind() {
            ErrorKind::NotFound => KitError::ExternalToolNotFound(tool.clone()),
            _ => KitError::Io(e),
        })?;

        if let Some(p) = progress.as_mut() {
            if let Some(stdout) = child.stdout.take() {
                pump_progress(stdout, p.total_seconds, &mut *p.observer);
            }
        }

        let status = child.wait()?;
        let duration_wall = started.elapsed();
        if let Some(p) = progress.as_mut() {
            p.observer.on_finish(status.success());
        }

        let exit_code = exit_code_of(status);
        tracing::debug!(tool = %tool, exit_code, elapsed = ?duration_wall, "finished");
        if exit_code != 0 {
            return Err(KitError::ExternalToolFailed { tool, exit_code });
        }
        Ok(ProcessResult {
            exit_code,
            duration_wall,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        seen: Vec<f64>,
        finished: Option<bool>,
    }

    impl ProgressObserver for Recorder {
        fn on_progress(&mut self, percent: f64) {
            self.seen.push(percent);
        }

        fn on_finish(&mut self, success: bool) {
            self.finished = Some(success);
        }
    }

    fn argv(items: &[&str]) -> Vec<OsString> {
        items.iter().map(OsString::from).collect()
    }

    #[test]
    fn test_parse_progress_lines() {
        assert_eq!(
            parse_progress_line("out_time_ms=2500000"),
            Some(ProgressEvent::Elapsed(2.5))
        );
        assert_eq!(
            parse_progress_line("out_time_us=1000000"),
            Some(ProgressEvent::Elapsed(1.0))
        );
        assert_eq!(parse_progress_line("progress=end"), Some(ProgressEvent::End));
        assert_eq!(parse_progress_line("progress=continue"), None);
        assert_eq!(parse_progress_line("out_time_ms=N/A"), None);
        assert_eq!(parse_progress_line("out_time_ms=-9223372036854775807"), None);
        assert_eq!(parse_progress_line("frame=  120 fps= 30"), None);
    }

    #[test]
    fn test_percent_math() {
        assert_eq!(percent_of(5.0, 10.0), 50.0);
        assert_eq!(percent_of(12.0, 10.0), 100.0);
        assert_eq!(percent_of(3.0, 0.0), 30.0);
        assert_eq!(percent_of(13.0, 0.0), 30.0);
    }

    #[test]
    fn test_pair_observer_fans_out() {
        let mut a = Recorder::default();
        let mut b = Recorder::default();
        {
            let mut pair = (&mut a, &mut b);
            pair.on_progress(42.0);
            pair.on_finish(true);
        }
        assert_eq!(a.seen, vec![42.0]);
        assert_eq!(b.seen, vec![42.0]);
        assert_eq!(b.finished, Some(true));
    }

    #[test]
    fn test_missing_binary_never_spawns() {
        let runner = Runner::default();
        let err = runner
            .run(&argv(&["videokit-no-such-tool", "-x"]), None)
            .unwrap_err();
        assert!(matches!(err, KitError::ExternalToolNotFound(name) if name == "videokit-no-such-tool"));

        assert!(matches!(
            runner.run(&[], None),
            Err(KitError::ExternalToolNotFound(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_nonzero_exit_is_reported() {
        let runner = Runner::default();
        let err = runner.run(&argv(&["sh", "-c", "exit 3"]), None).unwrap_err();
        assert!(matches!(
            err,
            KitError::ExternalToolFailed { ref tool, exit_code: 3 } if tool == "sh"
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_signal_maps_to_exit_status() {
        let runner = Runner::default();
        let err = runner.run(&argv(&["sh", "-c", "kill -9 $$"]), None).unwrap_err();
        assert!(matches!(err, KitError::ExternalToolFailed { exit_code: 137, .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_success_and_progress() {
        let runner = Runner::default();
        let mut rec = Recorder::default();
        let script = "printf 'frame=1\\nout_time_ms=5000000\\nprogress=continue\\nout_time_ms=bogus\\nprogress=end\\n'";
        let result = runner
            .run(
                &argv(&["sh", "-c", script]),
                Some(Progress {
                    total_seconds: 10.0,
                    observer: &mut rec,
                }),
            )
            .unwrap();
        assert_eq!(result.exit_code, 0);
        assert_eq!(rec.seen, vec![50.0, 100.0]);
        assert_eq!(rec.finished, Some(true));
    }

    #[cfg(unix)]
    #[test]
    fn test_failure_still_finishes_observer() {
        let runner = Runner::default();
        let mut rec = Recorder::default();
        let err = runner
            .run(
                &argv(&["sh", "-c", "echo garbage; exit 2"]),
                Some(Progress {
                    total_seconds: 0.0,
                    observer: &mut rec,
                }),
            )
            .unwrap_err();
        assert!(matches!(err, KitError::ExternalToolFailed { exit_code: 2, .. }));
        assert!(rec.seen.is_empty());
        assert_eq!(rec.finished, Some(false));
    }
}
