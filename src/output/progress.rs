use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use super::styling::{bright_green, bright_yellow};

/// Spinner shown while the single blocking query runs.
pub struct QueryProgress {
    pb: ProgressBar,
}

impl QueryProgress {
    pub fn start(query_name: &str) -> Self {
        let pb = create_spinner(bright_yellow(format!("Running query '{query_name}'")).to_string());
        Self { pb }
    }

    pub fn finish(self) {
        self.pb
            .finish_with_message(bright_green("Query finished ✓").to_string());
    }
}

fn create_spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_draw_target(ProgressDrawTarget::stderr());
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("  {msg} {spinner}")
            .unwrap(),
    );
    pb.set_message(message);
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}
