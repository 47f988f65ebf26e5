mod exports;
mod progress;
mod styling;
mod tables;

pub use exports::export_report;
pub use progress::QueryProgress;
use styling::{dim, magenta_bold};

/// Prints the `cistat` banner to stderr.
///
/// Displays the tool name, version, and description at the start of
/// execution.
pub fn print_banner() {
    eprintln!(
        r"
{} {}
  {}
",
        magenta_bold("📊 cistat"),
        dim(env!("CARGO_PKG_VERSION")),
        dim("CI triage & duration statistics")
    );
}
