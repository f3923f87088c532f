use crate::jira::{JiraClient, PageProgress, SprintSource};
use crate::model::{ClosedSprint, EpicSummary, Error, Result, SprintIssue, SprintStats};
use serde_json::Value;

const SPRINTS_PAGE_SIZE: usize = 50;
const ISSUES_PAGE_SIZE: usize = 100;

impl SprintSource for JiraClient {
    async fn list_closed_sprints<'a>(
        &self,
        board_id: u64,
        mut cb: PageProgress<'a>,
    ) -> Result<Vec<ClosedSprint>> {
        let path = format!("/rest/agile/1.0/board/{board_id}/sprint");
        let mut page = 0;
        let mut sprints = vec![];

        loop {
            cb(page);
            let response = self
                .api
                .get_json(
                    &path,
                    &[
                        ("state", "closed".to_string()),
                        ("startAt", (page * SPRINTS_PAGE_SIZE).to_string()),
                        ("maxResults", SPRINTS_PAGE_SIZE.to_string()),
                    ],
                )
                .await?;
            let values = array(&response, "values")?;
            for details in values {
                if let Some(sprint) = ClosedSprint::parse(details)? {
                    sprints.push(sprint);
                }
            }
            let is_last = response["isLast"].as_bool().unwrap_or(false);
            if is_last || values.len() < SPRINTS_PAGE_SIZE {
                break;
            }
            page += 1;
        }
        Ok(sprints)
    }

    async fn sprint_stats(&self, board_id: u64, sprint_id: u64) -> Result<SprintStats> {
        let response = self
            .api
            .get_json(
                "/rest/greenhopper/1.0/rapid/charts/sprintreport",
                &[
                    ("rapidViewId", board_id.to_string()),
                    ("sprintId", sprint_id.to_string()),
                ],
            )
            .await?;
        Ok(SprintStats::parse(&response))
    }

    async fn sprint_issues(&self, board_id: u64, sprint_id: u64) -> Result<Vec<SprintIssue>> {
        let path = format!("/rest/agile/1.0/board/{board_id}/sprint/{sprint_id}/issue");
        let mut issues = vec![];

        loop {
            let response = self
                .api
                .get_json(
                    &path,
                    &[
                        ("startAt", issues.len().to_string()),
                        ("maxResults", ISSUES_PAGE_SIZE.to_string()),
                    ],
                )
                .await?;
            let page = array(&response, "issues")?;
            for details in page {
                issues.push(SprintIssue::parse(details, &self.story_points_field)?);
            }
            let total = response["total"].as_u64().unwrap_or(0) as usize;
            if page.is_empty() || page.len() < ISSUES_PAGE_SIZE || issues.len() >= total {
                break;
            }
        }
        Ok(issues)
    }

    async fn ongoing_epics(&self, project: &str) -> Result<Vec<EpicSummary>> {
        self.fetch_ongoing_epics(project).await
    }
}

pub(super) fn array<'v>(response: &'v Value, field: &str) -> Result<&'v Vec<Value>> {
    response[field]
        .as_array()
        .ok_or_else(|| Error::UnexpectedResponse(format!("Not found '{field}' field")))
}
