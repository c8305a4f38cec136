//! Progress display for staged publishing

use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use gantry_core::coordination::{PackagePublishResult, PublishingStage, RollbackResult};
use gantry_core::PublishObserver;

/// Shows one progress bar across every package being published
pub struct PublishProgress {
    bar: ProgressBar,
}

impl PublishProgress {
    /// Create a bar for `total` packages; hidden when `enabled` is false
    pub fn new(total: usize, enabled: bool) -> Self {
        let bar = if enabled {
            let bar = ProgressBar::new(total as u64);
            let bar_style = ProgressStyle::default_bar()
                .template("{spinner:.cyan} {msg} [{bar:30.cyan/blue}] {pos}/{len} ({elapsed})")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▓▒░");
            bar.set_style(bar_style);
            bar.enable_steady_tick(Duration::from_millis(100));
            bar
        } else {
            ProgressBar::hidden()
        };

        Self { bar }
    }

    /// Clear the bar
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl PublishObserver for PublishProgress {
    fn on_stage_start(&self, stage: &PublishingStage) {
        self.bar.set_message(format!(
            "Stage {} ({} package(s))",
            stage.stage + 1,
            stage.packages.len()
        ));
    }

    fn on_package_complete(&self, result: &PackagePublishResult) {
        if result.success {
            self.bar.println(format!(
                "  {} {} ({:.1}s)",
                style("✓").green(),
                result.package,
                result.duration.as_secs_f64()
            ));
        } else {
            self.bar.println(format!(
                "  {} {}: {}",
                style("✗").red(),
                result.package,
                result.error.as_deref().unwrap_or("unknown error")
            ));
        }
        self.bar.inc(1);
    }

    fn on_stage_complete(&self, stage: &PublishingStage, success: bool) {
        if !success {
            self.bar
                .println(format!("{} Stage {} failed", style("!").yellow().bold(), stage.stage + 1));
        }
    }

    fn on_rollback_complete(&self, result: &RollbackResult) {
        for package in &result.rolled_back_packages {
            self.bar
                .println(format!("  {} rolled back {}", style("↺").blue(), package));
        }
        for error in &result.errors {
            self.bar.println(format!("  {} {}", style("✗").red(), error));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_hidden_progress_counts_packages() {
        let progress = PublishProgress::new(2, false);
        let result = PackagePublishResult {
            package: "core".to_string(),
            success: true,
            error: None,
            duration: Duration::from_millis(10),
            timestamp: Utc::now(),
        };

        progress.on_package_complete(&result);
        progress.on_package_complete(&result);
        assert_eq!(progress.bar.position(), 2);
        progress.finish();
    }
}
