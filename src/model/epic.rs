use crate::model::{Error, Result};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct EpicSummary {
    /// Stable issue key, e.g. `EPIC-123`.
    pub key: String,
    pub due_date: Option<String>,
    /// Percent in `0..=100`.
    pub completion: f64,
    pub url: String,
    pub summary: String,
}

impl EpicSummary {
    pub fn new(
        key: impl ToString,
        due_date: Option<String>,
        completion: f64,
        url: impl ToString,
        summary: impl ToString,
    ) -> Self {
        Self {
            key: key.to_string(),
            due_date,
            completion,
            url: url.to_string(),
            summary: summary.to_string(),
        }
    }
}

// Parser
impl EpicSummary {
    pub fn parse(details: &Value, completion_field: &str, jira_base_url: &str) -> Result<Self> {
        let Some(key) = details["key"].as_str() else {
            return Err(Error::UnexpectedResponse("Not found 'key' field".into()));
        };
        let fields = &details["fields"];
        Ok(Self::new(
            key,
            fields["duedate"].as_str().map(String::from),
            fields[completion_field].as_f64().unwrap_or_default(),
            format!("{jira_base_url}/browse/{key}"),
            fields["summary"].as_str().unwrap_or_default(),
        ))
    }
}

// Render
impl EpicSummary {
    pub fn due_date_cell(&self) -> String {
        match &self.due_date {
            Some(date) if !date.trim().is_empty() => date.trim().to_string(),
            _ => "-".to_string(),
        }
    }

    pub fn completion_cell(&self) -> String {
        format!("{}%", self.completion.round() as i64)
    }
}
