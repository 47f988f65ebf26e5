use serde_json::json;

use crate::error::Result;
use crate::query::types::TaskRecord;
use crate::report::Report;

#[derive(Debug, Clone)]
pub struct TaskDurationParams {
    /// Maximum number of tasks to report.
    pub limit: usize,
    /// 0-based column to sort on: 0 name, 1 job count, 2 average, 3 total.
    pub sort_key: usize,
}

impl Default for TaskDurationParams {
    fn default() -> Self {
        Self {
            limit: 20,
            sort_key: 2,
        }
    }
}

/// Ranks tasks by how much machine time they consume. Tasks without a
/// computed average (never finished inside the window) are skipped.
pub fn run(records: Vec<TaskRecord>, params: &TaskDurationParams) -> Result<Report> {
    let mut ranked: Vec<(String, u64, f64, i64)> = records
        .into_iter()
        .filter_map(|TaskRecord(name, count, average)| {
            let average = (average? / 60.0 * 100.0).round() / 100.0;
            let total = (count as f64 * average).round() as i64;
            Some((name, count, average, total))
        })
        .collect();

    ranked.sort_by(|a, b| match params.sort_key {
        0 => b.0.cmp(&a.0),
        1 => b.1.cmp(&a.1),
        3 => b.3.cmp(&a.3),
        _ => b.2.partial_cmp(&a.2).unwrap_or(std::cmp::Ordering::Equal),
    });
    ranked.truncate(params.limit);

    let mut report = Report::new(
        "Task durations",
        &["Taskname", "Num Jobs", "Average Hours", "Total Hours"],
    );
    for (name, count, average, total) in ranked {
        report.push_row(vec![json!(name), json!(count), json!(average), json!(total)]);
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_records_without_an_average() {
        let records = vec![
            TaskRecord("build-linux64/opt".into(), 4, Some(120.0)),
            TaskRecord("test-never-finished".into(), 2, None),
        ];

        let report = run(records, &TaskDurationParams::default()).unwrap();
        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.rows[0][0], json!("build-linux64/opt"));
    }

    #[test]
    fn converts_rounds_and_totals() {
        let records = vec![TaskRecord("test-a".into(), 3, Some(100.0))];

        let report = run(records, &TaskDurationParams::default()).unwrap();
        // 100 / 60 rounded to 2 decimals, times the job count.
        assert_eq!(report.rows[0][2], json!(1.67));
        assert_eq!(report.rows[0][3], json!(5));
    }

    #[test]
    fn sorts_descending_and_truncates() {
        let records = vec![
            TaskRecord("small".into(), 1, Some(60.0)),
            TaskRecord("large".into(), 1, Some(600.0)),
            TaskRecord("medium".into(), 1, Some(300.0)),
        ];

        let report = run(
            records,
            &TaskDurationParams {
                limit: 2,
                sort_key: 2,
            },
        )
        .unwrap();

        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.rows[0][0], json!("large"));
        assert_eq!(report.rows[1][0], json!("medium"));
    }

    #[test]
    fn sort_key_selects_the_column() {
        let records = vec![
            TaskRecord("few-long".into(), 2, Some(600.0)),
            TaskRecord("many-short".into(), 100, Some(60.0)),
        ];

        let by_count = run(
            records.clone(),
            &TaskDurationParams {
                limit: 20,
                sort_key: 1,
            },
        )
        .unwrap();
        assert_eq!(by_count.rows[0][0], json!("many-short"));

        let by_total = run(
            records,
            &TaskDurationParams {
                limit: 20,
                sort_key: 3,
            },
        )
        .unwrap();
        assert_eq!(by_total.rows[0][0], json!("many-short"));
    }
}
