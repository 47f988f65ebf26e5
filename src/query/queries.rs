use chrono::NaiveDate;
use serde_json::{json, Value};

/// Date window and branch every stored query is parameterized over.
#[derive(Debug, Clone)]
pub struct QueryWindow {
    pub branch: String,
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl QueryWindow {
    fn date_filter(&self) -> Value {
        json!({"and": [
            {"gte": {"repo.push.date": {"date": self.from.format("%Y-%m-%d").to_string()}}},
            {"lt": {"repo.push.date": {"date": self.to.format("%Y-%m-%d").to_string()}}}
        ]})
    }
}

/// Failed-and-classified job runs, ordered by push and job configuration.
///
/// The `sort` clause is load-bearing: the grouping step downstream assumes
/// rows with equal `(repo.index, job.type.name)` arrive contiguously.
pub fn classification_time_simple(window: &QueryWindow) -> Value {
    json!({
        "from": "jobs",
        "select": [
            "repo.index",
            "job.type.name",
            "repo.push.date",
            "failure.notes.failure_classification",
            "failure.notes.created",
            "action.start_time",
            "action.end_time"
        ],
        "where": {"and": [
            {"eq": {"repo.branch.name": window.branch}},
            {"eq": {"state": "completed"}},
            {"eq": {"result": "testfailed"}},
            {"exists": "failure.notes.created"},
            window.date_filter()
        ]},
        "sort": ["repo.index", "job.type.name"],
        "limit": 100000,
        "format": "cube"
    })
}

/// Per-task job counts and average duration in hours.
pub fn task_durations(window: &QueryWindow, platform: &str, build_type: &str) -> Value {
    json!({
        "from": "jobs",
        "groupby": ["job.type.name"],
        "select": [
            {"aggregate": "count"},
            {"value": "action.duration", "aggregate": "average"}
        ],
        "where": {"and": [
            {"eq": {"repo.branch.name": window.branch}},
            {"eq": {"build.platform": platform}},
            {"eq": {"build.type": build_type}},
            window.date_filter()
        ]},
        "limit": 50000,
        "format": "list"
    })
}

/// Commit messages and authors of try pushes inside the window.
pub fn try_commit_messages(window: &QueryWindow) -> Value {
    json!({
        "from": "push",
        "select": [
            {"name": "user", "value": "user"},
            {"name": "message", "value": "changeset.description"}
        ],
        "where": {"and": [
            {"eq": {"repo.branch.name": "try"}},
            window.date_filter()
        ]},
        "limit": 100000,
        "format": "cube"
    })
}
