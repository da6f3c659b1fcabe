use indicatif::{ProgressBar, ProgressStyle};
use std::time::{Duration, Instant};

pub struct SpinnerGuard {
    spinner: Option<ProgressBar>,
    started: Instant,
}

impl SpinnerGuard {
    pub fn start(message: &str, enabled: bool) -> Self {
        let spinner = enabled.then(|| {
            let pb = ProgressBar::new_spinner();
            let style = ProgressStyle::default_spinner()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "✓"])
                .template("{spinner:.cyan} {msg} [{elapsed}]");
            if let Ok(style) = style {
                pb.set_style(style);
            }
            pb.set_message(message.to_string());
            pb.enable_steady_tick(Duration::from_millis(80));
            pb
        });

        Self {
            spinner,
            started: Instant::now(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.spinner.is_some()
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn stop(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }
}

impl Drop for SpinnerGuard {
    fn drop(&mut self) {
        self.stop();
    }
}
