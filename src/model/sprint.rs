use crate::model::{Error, Result};
use chrono::{DateTime, FixedOffset};
use indexmap::IndexMap;
use serde_json::Value;

#[derive(Debug, Clone, Eq, Hash, PartialEq)]
pub struct ClosedSprint {
    pub id: u64,
    pub name: String,
    pub end_date: DateTime<FixedOffset>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SprintStats {
    pub commited_points: f64,
    pub done_points: f64,
    pub goal: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SprintIssue {
    pub points: f64,
    pub status: String,
    pub assignee: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AssigneeStats {
    pub points: f64,
    pub tickets: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SprintReport {
    pub sprint: String,
    pub sprint_goal: String,
    pub commited_points: f64,
    pub done_points: f64,
    pub total_points: f64,
    pub done_tickets: usize,
    pub by_assignee: IndexMap<String, AssigneeStats>,
}

// Create
impl ClosedSprint {
    pub fn new(id: u64, name: impl ToString, end_date: &DateTime<FixedOffset>) -> Self {
        Self {
            id,
            name: name.to_string(),
            end_date: *end_date,
        }
    }
}

impl SprintReport {
    pub fn new(sprint: impl ToString, sprint_goal: impl ToString) -> Self {
        Self {
            sprint: sprint.to_string(),
            sprint_goal: sprint_goal.to_string(),
            commited_points: 0.0,
            done_points: 0.0,
            total_points: 0.0,
            done_tickets: 0,
            by_assignee: IndexMap::new(),
        }
    }
}

// Parser
impl ClosedSprint {
    /// Sprints that were never given an end date are skipped.
    pub fn parse(details: &Value) -> Result<Option<Self>> {
        let Some(id) = details["id"].as_u64() else {
            return Err(Error::UnexpectedResponse("Not found 'id' field".into()));
        };
        let Some(name) = details["name"].as_str() else {
            return Err(Error::UnexpectedResponse("Not found 'name' field".into()));
        };
        let Some(end_date) = details["endDate"].as_str() else {
            return Ok(None);
        };
        let Ok(end_date) = DateTime::parse_from_rfc3339(end_date) else {
            return Err(Error::UnexpectedResponse(format!(
                "Not a valid date time: {end_date}"
            )));
        };
        Ok(Some(Self::new(id, name, &end_date)))
    }
}

impl SprintStats {
    pub fn parse(details: &Value) -> Self {
        let contents = &details["contents"];
        Self {
            commited_points: contents["completedIssuesInitialEstimateSum"]["value"]
                .as_f64()
                .unwrap_or_default(),
            done_points: contents["completedIssuesEstimateSum"]["value"]
                .as_f64()
                .unwrap_or_default(),
            goal: details["sprint"]["goal"]
                .as_str()
                .unwrap_or_default()
                .trim()
                .to_string(),
        }
    }
}

impl SprintIssue {
    pub fn parse(details: &Value, story_points_field: &str) -> Result<Self> {
        let fields = &details["fields"];
        let Some(status) = fields["status"]["name"].as_str() else {
            return Err(Error::UnexpectedResponse(
                "Not found 'status.name' field".into(),
            ));
        };
        Ok(Self {
            points: fields[story_points_field].as_f64().unwrap_or_default(),
            status: status.to_string(),
            assignee: fields["assignee"]["displayName"]
                .as_str()
                .map(String::from),
        })
    }

    pub fn is_done(&self) -> bool {
        self.status.eq_ignore_ascii_case("done")
    }
}
