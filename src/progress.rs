//! Progress indicators for apply and destroy.

use colored::Colorize;
use declarative::{Address, ApplyResult, ChangeAction, ProgressCallback};
use indicatif::{ProgressBar, ProgressStyle};

/// Spinner for a single long-running step (refresh, import).
pub fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("  {spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Reports engine progress on a bar, one line per finished instance.
pub struct ApplyProgress {
    bar: ProgressBar,
    quiet: bool,
}

impl ApplyProgress {
    pub fn new(total: usize, quiet: bool) -> Self {
        let bar = if quiet {
            ProgressBar::hidden()
        } else {
            ProgressBar::new(total as u64)
        };
        bar.set_style(
            ProgressStyle::default_bar()
                .template("  {spinner:.cyan} [{bar:30.cyan/dim}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("━╸─"),
        );
        Self { bar, quiet }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressCallback for ApplyProgress {
    fn on_level_start(&mut self, count: usize) {
        log::debug!("Starting level with {count} instance(s)");
    }

    fn on_resource_start(&mut self, address: &Address, action: ChangeAction) {
        self.bar.set_message(format!("{action} {address}"));
    }

    fn on_resource_complete(&mut self, address: &Address, result: &ApplyResult) {
        self.bar.inc(1);
        if self.quiet {
            return;
        }
        let line = match result {
            ApplyResult::NoChange => format!("  {} {address}", "○".dimmed()),
            ApplyResult::Created => format!("  {} {address} created", "✓".green()),
            ApplyResult::Updated => format!("  {} {address} updated", "✓".green()),
            ApplyResult::Replaced => format!("  {} {address} replaced", "✓".green()),
            ApplyResult::Deleted => format!("  {} {address} destroyed", "✓".green()),
            ApplyResult::Failed { error } => format!("  {} {address}: {error}", "✗".red()),
        };
        self.bar.println(line);
    }

    fn on_level_complete(&mut self) {}
}
