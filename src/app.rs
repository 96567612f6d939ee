use crate::command::{assemble, assemble_sox, display_argv};
use crate::error::{KitError, KitResult};
use crate::notify::{NotificationProgress, Notifier};
use crate::picker::Picker;
use crate::plan::{AudioFxPlan, JobPlan, OverwritePolicy};
use crate::probe::{MediaDescriptor, probe};
use crate::progress::ProgressUi;
use crate::runner::{ProcessResult, Progress, Runner};
use std::path::Path;
use std::time::SystemTime;

#[derive(Debug, Clone, Copy, Default)]
pub struct Settings {
    pub overwrite: OverwritePolicy,
    /// Leave whatever a failed tool wrote at the output path.
    pub keep_partial: bool,
    pub show_progress: bool,
}

/// Capabilities shared by every driver for one invocation.
pub struct App {
    runner: Runner,
    notifier: Box<dyn Notifier>,
    picker: Box<dyn Picker>,
    settings: Settings,
}

impl App {
    pub fn new(
        runner: Runner,
        notifier: Box<dyn Notifier>,
        picker: Box<dyn Picker>,
        settings: Settings,
    ) -> Self {
        Self {
            runner,
            notifier,
            picker,
            settings,
        }
    }

    pub fn runner(&self) -> &Runner {
        &self.runner
    }

    pub fn notifier(&self) -> &dyn Notifier {
        self.notifier.as_ref()
    }

    pub fn picker(&self) -> &dyn Picker {
        self.picker.as_ref()
    }

    pub fn overwrite(&self) -> OverwritePolicy {
        self.settings.overwrite
    }

    pub fn probe(&self, path: &Path) -> KitResult<MediaDescriptor> {
        let media = probe(self.runner.tools(), path)?;
        tracing::debug!(
            path = %media.path.display(),
            duration = media.duration_seconds,
            size = %format!("{}x{}", media.width, media.height),
            fps = media.frame_rate,
            audio = media.has_audio,
            "probed"
        );
        Ok(media)
    }

    /// Assemble and run one ffmpeg plan with terminal and desktop progress.
    pub fn run_ffmpeg(
        &self,
        plan: &JobPlan,
        task: &str,
        label: &str,
        total_seconds: f64,
    ) -> KitResult<ProcessResult> {
        let argv = assemble(plan);
        tracing::debug!(command = %display_argv(&argv), "assembled");

        let before = FileStamp::of(&plan.output);
        let ui = if self.settings.show_progress {
            ProgressUi::new(task, label)
        } else {
            ProgressUi::hidden()
        };
        let mut observer = (ui, NotificationProgress::start(self.notifier(), task, label));
        let result = self.runner.run(
            &argv,
            Some(Progress {
                total_seconds,
                observer: &mut observer,
            }),
        );

        match &result {
            Ok(done) => tracing::info!(
                exit_code = done.exit_code,
                elapsed = ?done.duration_wall,
                "{task} finished"
            ),
            Err(KitError::ExternalToolFailed { .. }) => self.discard_partial(plan, before),
            Err(_) => {}
        }
        result
    }

    pub fn run_sox(&self, plan: &AudioFxPlan) -> KitResult<ProcessResult> {
        let argv = assemble_sox(plan);
        tracing::debug!(command = %display_argv(&argv), "assembled");
        self.runner.run(&argv, None)
    }

    fn discard_partial(&self, plan: &JobPlan, before: Option<FileStamp>) {
        let output = plan.output.as_path();
        if self.settings.keep_partial || plan.inputs.iter().any(|i| same_file(i, output)) {
            return;
        }
        let Some(after) = FileStamp::of(output) else {
            return;
        };
        if let Some(before) = before {
            // with -n, or when the tool bailed before writing, the file is the user's
            if plan.overwrite == OverwritePolicy::Fail || before == after {
                return;
            }
        }
        match std::fs::remove_file(output) {
            Ok(()) => tracing::warn!(path = %output.display(), "removed partial output"),
            Err(err) => {
                tracing::warn!(path = %output.display(), %err, "could not remove partial output")
            }
        }
    }
}

/// Size and mtime of a file, enough to tell whether a tool wrote to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileStamp {
    len: u64,
    modified: Option<SystemTime>,
}

impl FileStamp {
    fn of(path: &Path) -> Option<Self> {
        let meta = std::fs::metadata(path).ok()?;
        meta.is_file().then(|| Self {
            len: meta.len(),
            modified: meta.modified().ok(),
        })
    }
}

/// Whether two paths name the same file, comparing canonical forms when both exist.
pub(crate) fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => match (std::path::absolute(a), std::path::absolute(b)) {
            (Ok(a), Ok(b)) => a == b,
            _ => a == b,
        },
    }
}
