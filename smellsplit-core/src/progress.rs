//! Progress reporting for batch runs.
//!
//! The CLI uses `IndicatifReporter` to show one bar per batch; library callers
//! and tests use `NoopReporter`.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Receives progress events from the batch driver.
pub trait ProgressReporter: Send + Sync {
    /// Begin a batch of `total` repositories.
    fn start(&self, task: &str, total: u64);

    /// A repository is about to be processed (1-based `index`).
    fn repository(&self, index: u64, total: u64, name: &str);

    /// One repository finished, successfully or not.
    fn advance(&self);

    fn finish(&self);

    /// Print a line above the bar.
    fn message(&self, msg: &str);
}

/// Reporter that drops everything.
#[derive(Debug, Default)]
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn start(&self, _task: &str, _total: u64) {}
    fn repository(&self, _index: u64, _total: u64, _name: &str) {}
    fn advance(&self) {}
    fn finish(&self) {}
    fn message(&self, _msg: &str) {}
}

/// Reporter backed by an `indicatif` progress bar on stderr.
#[derive(Debug)]
pub struct IndicatifReporter {
    bar: ProgressBar,
}

impl Default for IndicatifReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl IndicatifReporter {
    pub fn new() -> Self {
        Self {
            bar: ProgressBar::with_draw_target(None, ProgressDrawTarget::stderr()),
        }
    }

    /// A reporter that tracks state but never draws (tests, `--quiet`).
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }
}

impl ProgressReporter for IndicatifReporter {
    fn start(&self, task: &str, total: u64) {
        self.bar.set_length(total);
        self.bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} {prefix} [{bar:30.cyan/blue}] {pos}/{len} {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
        );
        self.bar.set_prefix(task.to_string());
        self.bar.reset();
    }

    fn repository(&self, index: u64, total: u64, name: &str) {
        self.bar
            .set_message(format!("processing repository {index}/{total}: {name}"));
    }

    fn advance(&self) {
        self.bar.inc(1);
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }

    fn message(&self, msg: &str) {
        self.bar.println(msg);
    }
}
