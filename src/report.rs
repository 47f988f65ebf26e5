use serde::Serialize;
use serde_json::Value;

/// Tabular result of one recipe run: string headers plus positional value
/// rows. Rendering (terminal table, JSON, CSV) happens in `output`, outside
/// the recipes.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub title: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Report {
    pub fn new(title: impl Into<String>, headers: &[&str]) -> Self {
        Self {
            title: title.into(),
            headers: headers.iter().map(ToString::to_string).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<Value>) {
        self.rows.push(row);
    }
}
