use anyhow::Result;
use chrono::{Duration, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use log::info;
use std::path::PathBuf;

use crate::config::{Config, OutputFormat};
use crate::output;
use crate::query::{QueryClient, QueryWindow};
use crate::recipes::{self, ClassificationParams, TaskDurationParams};
use crate::report::Report;

#[derive(Parser)]
#[command(name = "cistat")]
#[command(author, version, about = "CI triage & duration statistics", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a configuration file (default: ./cistat.{toml,json,yaml})
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Query service base URL
    #[arg(short, long, global = true, env = "CISTAT_URL")]
    url: Option<String>,

    /// Branch to gather statistics for
    #[arg(short, long, global = true)]
    branch: Option<String>,

    /// Start of the date window (YYYY-MM-DD, default: one week ago)
    #[arg(long, global = true)]
    from: Option<NaiveDate>,

    /// End of the date window (YYYY-MM-DD, exclusive, default: today)
    #[arg(long, global = true)]
    to: Option<NaiveDate>,

    /// Write the report to a file instead of stdout
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Report format
    #[arg(short, long, global = true)]
    format: Option<OutputFormat>,

    /// Pretty-print JSON output
    #[arg(long, global = true, default_value_t = false)]
    pretty: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// How quickly failed jobs get classified by sheriffs
    ClassificationTime {
        /// Percentage of fastest response times to use (0..=100, default 95)
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
        percent: Option<u8>,

        /// Time in seconds in which a job should be classified (default 900)
        #[arg(long)]
        response_limit: Option<i64>,

        /// Maximum seconds after a push in which a job has to start
        /// (default 14400)
        #[arg(long)]
        start_delay: Option<i64>,
    },

    /// Which tasks consume the most machine time
    TaskDurations {
        /// Platform for results
        #[arg(short = 'p', long, default_value = "windows10-64")]
        platform: String,

        /// Build configuration
        #[arg(short = 'B', long, default_value = "opt")]
        build_type: String,

        /// Maximum number of tasks to return
        #[arg(short, long, default_value_t = 20)]
        limit: usize,

        /// Column to sort on (0-based index)
        #[arg(long, default_value_t = 2)]
        sort_key: usize,
    },

    /// How try pushes get submitted
    TryUsage,
}

impl Cli {
    pub async fn execute(&self) -> Result<()> {
        let config = Config::load(self.config.as_deref())?;

        let base_url = self
            .url
            .clone()
            .unwrap_or_else(|| config.service.base_url.clone());
        let window = self.window(&config);
        let client = QueryClient::new(&base_url)?;

        let report = match &self.command {
            Commands::ClassificationTime {
                percent,
                response_limit,
                start_delay,
            } => {
                let params = ClassificationParams {
                    percent: percent.unwrap_or(config.classification.percent),
                    response_limit: response_limit.unwrap_or(config.classification.response_limit),
                    start_delay: start_delay.unwrap_or(config.classification.start_delay),
                };
                info!(
                    "Computing classification times for {} ({} to {})",
                    window.branch, window.from, window.to
                );

                let progress = output::QueryProgress::start("classification_time_simple");
                let rows = client.classification_times(&window).await?;
                progress.finish();

                recipes::classification_time::run(rows, &params)?
            }

            Commands::TaskDurations {
                platform,
                build_type,
                limit,
                sort_key,
            } => {
                info!(
                    "Ranking task durations for {} {} on {}",
                    platform, build_type, window.branch
                );

                let progress = output::QueryProgress::start("task_durations");
                let records = client.task_durations(&window, platform, build_type).await?;
                progress.finish();

                recipes::task_durations::run(
                    records,
                    &TaskDurationParams {
                        limit: *limit,
                        sort_key: *sort_key,
                    },
                )?
            }

            Commands::TryUsage => {
                info!("Classifying try usage ({} to {})", window.from, window.to);

                let progress = output::QueryProgress::start("try_commit_messages");
                let pushes = client.try_commit_messages(&window).await?;
                progress.finish();

                recipes::try_usage::run(pushes)?
            }
        };

        self.render(&report, &config)
    }

    fn window(&self, config: &Config) -> QueryWindow {
        let today = Utc::now().date_naive();
        QueryWindow {
            branch: self
                .branch
                .clone()
                .unwrap_or_else(|| config.service.branch.clone()),
            from: self.from.unwrap_or(today - Duration::days(7)),
            to: self.to.unwrap_or(today),
        }
    }

    fn render(&self, report: &Report, config: &Config) -> Result<()> {
        let format = self.format.unwrap_or(config.output.format);
        let pretty = self.pretty || config.output.pretty;

        if let Some(path) = &self.output {
            let mut file = std::fs::File::create(path)?;
            output::export_report(report, format, pretty, &mut file)?;
            info!("Report written to: {}", path.display());
        } else {
            output::export_report(report, format, pretty, &mut std::io::stdout())?;
        }

        Ok(())
    }
}
