pub mod classification_time;
pub mod task_durations;
pub mod try_usage;

pub use classification_time::ClassificationParams;
pub use task_durations::TaskDurationParams;
