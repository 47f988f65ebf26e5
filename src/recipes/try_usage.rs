use std::collections::HashSet;

use serde_json::json;

use crate::error::{CistatError, Result};
use crate::report::Report;

/// Submission methods in match order. A push is attributed to the first
/// marker its commit message contains; the empty marker matches everything,
/// so it collects the remainder.
const METHODS: &[(&str, &str)] = &[
    ("mach try syntax", "Pushed via `mach try syntax`"),
    ("vanilla try syntax", "try:"),
    ("mach try fuzzy", "Pushed via `mach try fuzzy`"),
    ("empty", ""),
];

/// Classifies try pushes by submission method and reports push and user
/// counts per method, busiest method first.
pub fn run(pushes: Vec<(String, String)>) -> Result<Report> {
    if pushes.is_empty() {
        return Err(CistatError::NoData);
    }

    let total = pushes.len();
    let total_users: HashSet<&str> = pushes.iter().map(|(user, _)| user.as_str()).collect();

    let mut counts = vec![0usize; METHODS.len()];
    let mut users: Vec<HashSet<&str>> = vec![HashSet::new(); METHODS.len()];
    for (user, message) in &pushes {
        for (i, (_, marker)) in METHODS.iter().enumerate() {
            if message.contains(marker) {
                counts[i] += 1;
                users[i].insert(user.as_str());
                break;
            }
        }
    }

    // Total goes in ahead of the method rows; the stable sort then keeps
    // it on top whenever a single method accounts for every push.
    let mut rows: Vec<(&str, usize, usize)> = vec![("total", total, total_users.len())];
    rows.extend(
        METHODS
            .iter()
            .enumerate()
            .filter(|(i, _)| counts[*i] > 0)
            .map(|(i, (method, _))| (*method, counts[i], users[i].len())),
    );
    rows.sort_by(|a, b| b.1.cmp(&a.1));

    let mut report = Report::new(
        "Try usage",
        &["Method", "Pushes", "Percent", "Users", "Push / User"],
    );
    for (method, pushes, users) in rows {
        let percent = (pushes as f64 / total as f64 * 1000.0).round() / 10.0;
        let per_user = (pushes as f64 / users as f64 * 100.0).round() / 100.0;
        report.push_row(vec![
            json!(method),
            json!(pushes),
            json!(percent),
            json!(users),
            json!(per_user),
        ]);
    }
    Ok(report)
}
