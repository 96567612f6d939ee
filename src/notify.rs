use crate::runner::ProgressObserver;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use which::which;

pub const PROGRESS_TIMEOUT_MS: u32 = 0;
pub const FINISHED_TIMEOUT_MS: u32 = 2000;
pub const ERROR_TIMEOUT_MS: u32 = 4000;

/// Desktop notification capability. Every method is best-effort.
pub trait Notifier {
    /// Show or replace a notification, returning its id when known.
    fn notify(
        &self,
        summary: &str,
        body: &str,
        replaces: Option<u32>,
        timeout_ms: u32,
    ) -> Option<u32>;

    fn close(&self, id: Option<u32>);
}

/// Used when no notification daemon is reachable.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(
        &self,
        summary: &str,
        body: &str,
        replaces: Option<u32>,
        _timeout_ms: u32,
    ) -> Option<u32> {
        tracing::debug!(summary, body = %body.replace('\n', " "), "notification");
        replaces
    }

    fn close(&self, _id: Option<u32>) {}
}

#[derive(Debug, Clone)]
pub struct DunstNotifier {
    bin: PathBuf,
}

impl DunstNotifier {
    pub fn detect() -> Option<Self> {
        which("dunstify").ok().map(|bin| Self { bin })
    }
}

impl Notifier for DunstNotifier {
    fn notify(
        &self,
        summary: &str,
        body: &str,
        replaces: Option<u32>,
        timeout_ms: u32,
    ) -> Option<u32> {
        let mut cmd = Command::new(&self.bin);
        if let Some(id) = replaces {
            cmd.args(["-r", &id.to_string()]);
        }
        cmd.args(["-p", "-t", &timeout_ms.to_string(), summary, body]);
        let out = match cmd.stdin(Stdio::null()).stderr(Stdio::null()).output() {
            Ok(out) => out,
            Err(err) => {
                tracing::debug!(%err, "dunstify failed");
                return replaces;
            }
        };
        String::from_utf8_lossy(&out.stdout)
            .trim()
            .parse::<u32>()
            .ok()
            .or(replaces)
    }

    fn close(&self, id: Option<u32>) {
        let Some(id) = id else { return };
        let _ = Command::new(&self.bin)
            .args(["-C", &id.to_string()])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
    }
}

/// Dunst when installed, otherwise a silent stand-in.
pub fn detect(enabled: bool) -> Box<dyn Notifier> {
    if !enabled {
        return Box::new(NoopNotifier);
    }
    match DunstNotifier::detect() {
        Some(dunst) => Box::new(dunst),
        None => {
            tracing::debug!("dunstify not found, desktop notifications disabled");
            Box::new(NoopNotifier)
        }
    }
}

/// Keeps one notification updated while a job runs.
pub struct NotificationProgress<'a> {
    notifier: &'a dyn Notifier,
    task: String,
    label: String,
    id: Option<u32>,
    last_percent: f64,
}

impl<'a> NotificationProgress<'a> {
    pub fn start(notifier: &'a dyn Notifier, task: &str, label: &str) -> Self {
        let id = notifier.notify(task, &format!("{label}\n0.0%"), None, PROGRESS_TIMEOUT_MS);
        Self {
            notifier,
            task: task.to_string(),
            label: label.to_string(),
            id,
            last_percent: -1.0,
        }
    }
}

impl ProgressObserver for NotificationProgress<'_> {
    fn on_progress(&mut self, percent: f64) {
        if percent - self.last_percent < 1.0 && percent < 100.0 {
            return;
        }
        if percent >= 100.0 && self.last_percent >= 100.0 {
            return;
        }
        self.last_percent = percent;
        self.id = self.notifier.notify(
            &self.task,
            &format!("{}\n{percent:.1}%", self.label),
            self.id,
            PROGRESS_TIMEOUT_MS,
        );
    }

    fn on_finish(&mut self, success: bool) {
        self.notifier.close(self.id.take());
        if success {
            self.notifier.notify(
                &self.task,
                &format!("Finished:\n{}", self.label),
                None,
                FINISHED_TIMEOUT_MS,
            );
        } else {
            self.notifier.notify(
                &format!("❌ {}", self.task),
                &format!("Failed:\n{}", self.label),
                None,
                ERROR_TIMEOUT_MS,
            );
        }
    }
}
