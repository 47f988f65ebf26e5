use serde::{Deserialize, Serialize};

use crate::error::{CistatError, Result};

/// Envelope every query-service response arrives in. The payload shape
/// depends on the stored query, so it stays generic here.
#[derive(Debug, Deserialize)]
pub struct QueryResponse<T> {
    pub data: T,
}

/// A field that the query service reports either as a single value or as an
/// ordered list of values. Classification fields use this for jobs that were
/// reclassified: one event is a scalar, two or more arrive as a list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        match self {
            Self::One(value) => std::slice::from_ref(value).iter(),
            Self::Many(values) => values.iter(),
        }
    }

    pub fn any<F>(&self, pred: F) -> bool
    where
        F: FnMut(&T) -> bool,
    {
        self.iter().any(pred)
    }
}

impl OneOrMany<f64> {
    /// The earliest timestamp among the recorded events. `None` only for an
    /// empty list, which the query service does not produce for classified
    /// jobs.
    pub fn earliest(&self) -> Option<f64> {
        self.iter().copied().reduce(f64::min)
    }
}

/// Columnar result of the `classification_time_simple` query: parallel
/// arrays, row-aligned by index.
#[derive(Debug, Deserialize)]
pub struct ClassificationColumns {
    #[serde(rename = "repo.index")]
    pub push: Vec<u64>,
    #[serde(rename = "job.type.name")]
    pub job_name: Vec<String>,
    #[serde(rename = "repo.push.date")]
    pub push_date: Vec<i64>,
    #[serde(rename = "failure.notes.failure_classification")]
    pub classification: Vec<OneOrMany<String>>,
    #[serde(rename = "failure.notes.created")]
    pub classified_at: Vec<OneOrMany<f64>>,
    #[serde(rename = "action.start_time")]
    pub start_time: Vec<i64>,
    #[serde(rename = "action.end_time")]
    pub end_time: Vec<i64>,
}

/// One failed job run, assembled from the columnar arrays.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedRun {
    pub push: u64,
    pub job_name: String,
    pub push_date: i64,
    pub start_time: i64,
    pub end_time: i64,
    pub classification: OneOrMany<String>,
    pub classified_at: OneOrMany<f64>,
}

impl ClassificationColumns {
    /// Converts the parallel columns into row records.
    ///
    /// Fails with [`CistatError::ColumnMismatch`] when any column disagrees
    /// with the length of `repo.index`; a truncated zip would silently drop
    /// rows instead.
    pub fn into_rows(self) -> Result<Vec<ClassifiedRun>> {
        let expected = self.push.len();
        check_len("job.type.name", expected, self.job_name.len())?;
        check_len("repo.push.date", expected, self.push_date.len())?;
        check_len(
            "failure.notes.failure_classification",
            expected,
            self.classification.len(),
        )?;
        check_len("failure.notes.created", expected, self.classified_at.len())?;
        check_len("action.start_time", expected, self.start_time.len())?;
        check_len("action.end_time", expected, self.end_time.len())?;

        let rows = self
            .push
            .into_iter()
            .zip(self.job_name)
            .zip(self.push_date)
            .zip(self.classification)
            .zip(self.classified_at)
            .zip(self.start_time)
            .zip(self.end_time)
            .map(
                |((((((push, job_name), push_date), classification), classified_at), start_time), end_time)| {
                    ClassifiedRun {
                        push,
                        job_name,
                        push_date,
                        start_time,
                        end_time,
                        classification,
                        classified_at,
                    }
                },
            )
            .collect();

        Ok(rows)
    }
}

fn check_len(column: &str, expected: usize, actual: usize) -> Result<()> {
    if actual == expected {
        Ok(())
    } else {
        Err(CistatError::ColumnMismatch {
            column: column.to_string(),
            expected,
            actual,
        })
    }
}

/// One record of the `task_durations` query: task name, number of jobs and
/// average duration in hours. The average is missing for tasks that never
/// finished inside the window.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskRecord(pub String, pub u64, pub Option<f64>);

/// Columnar result of the `try_commit_messages` query.
#[derive(Debug, Deserialize)]
pub struct TryPushColumns {
    pub user: Vec<String>,
    pub message: Vec<String>,
}

impl TryPushColumns {
    pub fn into_rows(self) -> Result<Vec<(String, String)>> {
        check_len("message", self.user.len(), self.message.len())?;
        Ok(self.user.into_iter().zip(self.message).collect())
    }
}
