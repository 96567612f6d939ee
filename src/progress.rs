use crate::runner::ProgressObserver;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration;

const TICKS: u64 = 1000;

/// Terminal spinner plus percentage bar for one external-tool run.
pub struct ProgressUi {
    _multi: MultiProgress,
    spinner: ProgressBar,
    bar: ProgressBar,
}

impl ProgressUi {
    pub fn new(task: &str, label: &str) -> Self {
        Self::with_target(task, label, ProgressDrawTarget::stderr())
    }

    pub fn hidden() -> Self {
        Self::with_target("", "", ProgressDrawTarget::hidden())
    }

    fn with_target(task: &str, label: &str, target: ProgressDrawTarget) -> Self {
        let multi = MultiProgress::with_draw_target(target);

        let spinner = multi.add(ProgressBar::new_spinner());
        spinner.enable_steady_tick(Duration::from_millis(80));
        spinner.set_style(
            ProgressStyle::with_template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["-", "\\", "|", "/", "+"]),
        );
        spinner.set_message(format!("{task}: {label}"));

        let bar = multi.add(ProgressBar::new(TICKS));
        bar.set_style(
            ProgressStyle::with_template(
                "[{elapsed_precise}]  [{bar:60.cyan/bright-black}] {percent:>3}%  ETA:{eta_precise}\n{wide_msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
        );
        bar.set_message("Starting.");

        Self {
            _multi: multi,
            spinner,
            bar,
        }
    }

    fn update_stage(&self, percent: f64) {
        self.bar.set_position((percent / 100.0 * TICKS as f64) as u64);
        if percent < 10.0 {
            self.bar.set_message("Reading input...");
        } else if percent < 95.0 {
            self.bar.set_message("Processing...");
        } else {
            self.bar.set_message("Writing headers, closing output...");
        }
    }
}

impl ProgressObserver for ProgressUi {
    fn on_progress(&mut self, percent: f64) {
        self.update_stage(percent);
    }

    fn on_finish(&mut self, success: bool) {
        if success {
            self.bar.finish_with_message("Done");
            self.spinner.finish_with_message("Completed");
        } else {
            self.bar.abandon_with_message("Failed");
            self.spinner.abandon();
        }
    }
}
