use serde_json::json;

use crate::error::{CistatError, Result};
use crate::query::types::ClassifiedRun;
use crate::report::Report;

/// Classification label for failures that a later commit resolved. Groups
/// containing one say nothing about triage speed and are dropped wholesale.
const FIXED_BY_COMMIT: &str = "fixed by commit";

/// Tuning knobs for the classification-time statistic.
#[derive(Debug, Clone)]
pub struct ClassificationParams {
    /// Percentage of fastest response times to keep, 0..=100. Slower ones
    /// are ignored; reclassifications produce artificially slow samples.
    pub percent: u8,
    /// Inactivity gap in seconds between a job ending and the next one
    /// starting before the group is considered done with its first episode.
    pub response_limit: i64,
    /// Maximum seconds after the push in which a job has to start. Excludes
    /// manually requested retriggers and backfills that sheriffs no longer
    /// watch.
    pub start_delay: i64,
}

impl Default for ClassificationParams {
    fn default() -> Self {
        Self {
            percent: 95,
            response_limit: 15 * 60,
            start_delay: 4 * 60 * 60,
        }
    }
}

/// All runs of one job configuration on one push: the original run plus any
/// retries, retriggers or backfills.
#[derive(Debug, Clone, PartialEq)]
struct JobGroup {
    push: u64,
    job_name: String,
    jobs: Vec<ClassifiedRun>,
}

/// Computes the trimmed-percentile classification-time report.
///
/// Precondition: `rows` is sorted by `(push, job_name)`, which the stored
/// query guarantees. Rows with an equal key that are not contiguous would
/// silently form spurious extra groups.
pub fn run(rows: Vec<ClassifiedRun>, params: &ClassificationParams) -> Result<Report> {
    let delays: Vec<i64> = group_runs(rows)
        .iter()
        .filter(|group| !has_fixed_by_commit(group))
        .flat_map(|group| group_delays(group, params))
        .collect();

    let (average, limit) = trimmed_percentile(delays, params.percent)?;

    let mut report = Report::new(
        "Classification time",
        &[
            "average classification time (s)",
            "limit classification time (s)",
        ],
    );
    report.push_row(vec![json!(average), json!(limit)]);
    Ok(report)
}

/// Folds the ordered row stream into completed job groups. Adjacent rows
/// sharing `(push, job_name)` share a group; empty input yields no groups.
fn group_runs(rows: Vec<ClassifiedRun>) -> Vec<JobGroup> {
    let mut groups: Vec<JobGroup> = Vec::new();
    for row in rows {
        match groups.last_mut() {
            Some(group) if group.push == row.push && group.job_name == row.job_name => {
                group.jobs.push(row);
            }
            _ => groups.push(JobGroup {
                push: row.push,
                job_name: row.job_name.clone(),
                jobs: vec![row],
            }),
        }
    }
    groups
}

fn has_fixed_by_commit(group: &JobGroup) -> bool {
    group
        .jobs
        .iter()
        .any(|job| job.classification.any(|label| label == FIXED_BY_COMMIT))
}

/// Classification delays of one group, in seconds.
///
/// The jobs are scanned in `start_time` order. `last_ok_end` tracks the end
/// of the last job that started within `response_limit` of its predecessor
/// ending; the first larger gap ends the activity episode and everything
/// after it is excluded. The anchor is computed over the full sorted set,
/// including late starters, before the start-delay filter selects which
/// jobs actually emit a delay.
fn group_delays(group: &JobGroup, params: &ClassificationParams) -> Vec<i64> {
    let mut jobs: Vec<&ClassifiedRun> = group.jobs.iter().collect();
    jobs.sort_by_key(|job| job.start_time);

    let Some(first) = jobs.first() else {
        return Vec::new();
    };

    let mut last_ok_end = first.end_time;
    let mut active = 1;
    for job in &jobs[1..] {
        if job.start_time - last_ok_end > params.response_limit {
            break;
        }
        last_ok_end = job.end_time;
        active += 1;
    }

    jobs[..active]
        .iter()
        .filter(|job| job.start_time - job.push_date <= params.start_delay)
        .filter_map(|job| job.classified_at.earliest())
        .map(|classified_at| (classified_at.floor() as i64 - last_ok_end).max(0))
        .collect()
}

/// Reduces the delay multiset to `(average, limit)` over the fastest
/// `percent` of samples. At least one sample is always kept when data
/// exists; an empty set is a reportable no-data condition, not a division
/// by zero.
fn trimmed_percentile(mut delays: Vec<i64>, percent: u8) -> Result<(i64, i64)> {
    if delays.is_empty() {
        return Err(CistatError::NoData);
    }

    delays.sort();
    // A percent above 100 (possible via the config file, which does not
    // share the CLI's range check) keeps the full set rather than indexing
    // past it.
    let keep = ((f64::from(percent) / 100.0 * delays.len() as f64).round() as usize)
        .clamp(1, delays.len());
    let kept = &delays[..keep];

    let sum: i64 = kept.iter().sum();
    let average = (sum as f64 / keep as f64).round() as i64;
    Ok((average, kept[keep - 1]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::types::OneOrMany;

    fn run_row(push: u64, job_name: &str, start: i64, end: i64, classified_at: f64) -> ClassifiedRun {
        ClassifiedRun {
            push,
            job_name: job_name.to_string(),
            push_date: 0,
            start_time: start,
            end_time: end,
            classification: OneOrMany::One("intermittent".to_string()),
            classified_at: OneOrMany::One(classified_at),
        }
    }

    fn params() -> ClassificationParams {
        ClassificationParams::default()
    }

    #[test]
    fn grouping_follows_key_runs() {
        let rows = vec![
            run_row(1, "test-a", 10, 20, 100.0),
            run_row(1, "test-a", 30, 40, 100.0),
            run_row(1, "test-b", 10, 20, 100.0),
            run_row(2, "test-b", 10, 20, 100.0),
            run_row(2, "test-b", 50, 60, 100.0),
        ];

        let groups = group_runs(rows);
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].jobs.len(), 2);
        assert_eq!(groups[1].jobs.len(), 1);
        assert_eq!(groups[2].jobs.len(), 2);
    }

    #[test]
    fn empty_input_yields_no_groups_and_no_data() {
        assert!(group_runs(vec![]).is_empty());
        assert!(matches!(
            run(vec![], &params()),
            Err(CistatError::NoData)
        ));
    }

    #[test]
    fn fixed_by_commit_drops_the_whole_group() {
        let mut fixed = run_row(1, "test-a", 10, 20, 100.0);
        fixed.classification = OneOrMany::One(FIXED_BY_COMMIT.to_string());
        let rows = vec![run_row(1, "test-a", 30, 40, 100.0), fixed];

        assert!(matches!(run(rows, &params()), Err(CistatError::NoData)));
    }

    #[test]
    fn fixed_by_commit_inside_a_reclassification_list_also_drops() {
        let mut reclassified = run_row(1, "test-a", 10, 20, 100.0);
        reclassified.classification = OneOrMany::Many(vec![
            "intermittent".to_string(),
            FIXED_BY_COMMIT.to_string(),
        ]);

        assert!(matches!(
            run(vec![reclassified], &params()),
            Err(CistatError::NoData)
        ));
    }

    #[test]
    fn unknown_labels_never_exclude() {
        let mut odd = run_row(1, "test-a", 10, 20, 100.0);
        odd.classification = OneOrMany::One("fixed by backout".to_string());

        let report = run(vec![odd], &params()).unwrap();
        assert_eq!(report.rows.len(), 1);
    }

    #[test]
    fn gap_cuts_off_later_jobs() {
        // Gaps of 100s and 2000s between three runs: the job after the
        // 2000s gap is a separate inactivity episode and emits nothing.
        let group = JobGroup {
            push: 1,
            job_name: "test-a".to_string(),
            jobs: vec![
                run_row(1, "test-a", 0, 100, 5000.0),
                run_row(1, "test-a", 200, 300, 5000.0),
                run_row(1, "test-a", 2300, 2400, 5000.0),
            ],
        };

        let delays = group_delays(&group, &params());
        // Anchor is the end of the second run; both pre-gap runs emit.
        assert_eq!(delays, vec![4700, 4700]);
    }

    #[test]
    fn gap_right_after_the_first_job_keeps_only_the_first() {
        let group = JobGroup {
            push: 1,
            job_name: "test-a".to_string(),
            jobs: vec![
                run_row(1, "test-a", 0, 100, 5000.0),
                run_row(1, "test-a", 1100, 1200, 5000.0),
            ],
        };

        let delays = group_delays(&group, &params());
        assert_eq!(delays, vec![4900]);
    }

    #[test]
    fn late_starters_advance_the_anchor_but_emit_nothing() {
        let late_start = 4 * 60 * 60 + 1;
        let group = JobGroup {
            push: 1,
            job_name: "test-a".to_string(),
            jobs: vec![
                run_row(1, "test-a", 10, late_start - 100, 60000.0),
                run_row(1, "test-a", late_start, late_start + 100, 60000.0),
            ],
        };

        let delays = group_delays(&group, &params());
        // One sample from the on-time job, measured against the late
        // run's end because the anchor scan saw both.
        assert_eq!(delays, vec![60000 - (late_start + 100)]);
    }

    #[test]
    fn unsorted_rows_inside_a_group_are_ordered_by_start_time() {
        let group = JobGroup {
            push: 1,
            job_name: "test-a".to_string(),
            jobs: vec![
                run_row(1, "test-a", 200, 300, 5000.0),
                run_row(1, "test-a", 0, 100, 5000.0),
            ],
        };

        // Sorted by start time the gap is 100s, so both runs stay active.
        assert_eq!(group_delays(&group, &params()).len(), 2);
    }

    #[test]
    fn percent_zero_still_uses_one_sample() {
        let (average, limit) = trimmed_percentile(vec![30, 10, 20], 0).unwrap();
        assert_eq!(average, 10);
        assert_eq!(limit, 10);
    }

    #[test]
    fn percent_above_hundred_keeps_the_full_set() {
        let (average, limit) = trimmed_percentile(vec![10, 20], 200).unwrap();
        assert_eq!(average, 15);
        assert_eq!(limit, 20);
    }

    #[test]
    fn trimming_drops_the_slowest_samples() {
        let delays = vec![10, 20, 30, 40, 50, 60, 70, 80, 90, 1000];
        let (average, limit) = trimmed_percentile(delays, 90).unwrap();
        assert_eq!(average, 50);
        assert_eq!(limit, 90);
    }

    #[test]
    fn reclassified_job_uses_the_earliest_classification() {
        let mut reclassified = run_row(1, "test-a", 10, 20, 0.0);
        reclassified.classified_at = OneOrMany::Many(vec![500.0, 300.0]);
        let scalar = run_row(2, "test-a", 10, 20, 300.0);

        let group_a = group_runs(vec![reclassified]);
        let group_b = group_runs(vec![scalar]);
        assert_eq!(
            group_delays(&group_a[0], &params()),
            group_delays(&group_b[0], &params())
        );
    }

    #[test]
    fn delays_never_go_negative() {
        // Classified before the job even finished, e.g. clock skew.
        let row = run_row(1, "test-a", 10, 500, 100.0);
        let groups = group_runs(vec![row]);
        assert_eq!(group_delays(&groups[0], &params()), vec![0]);
    }

    #[test]
    fn single_job_scenario_end_to_end() {
        let row = run_row(1, "test-a", 10, 20, 100.0);
        let report = run(
            vec![row],
            &ClassificationParams {
                percent: 100,
                response_limit: 900,
                start_delay: 14400,
            },
        )
        .unwrap();

        assert_eq!(
            report.headers,
            vec![
                "average classification time (s)",
                "limit classification time (s)"
            ]
        );
        assert_eq!(report.rows, vec![vec![json!(80), json!(80)]]);
    }
}
