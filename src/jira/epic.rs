use crate::jira::sprint::array;
use crate::jira::JiraClient;
use crate::model::{EpicSummary, Result};

const EPICS_PAGE_SIZE: usize = 100;

impl JiraClient {
    pub(super) async fn fetch_ongoing_epics(&self, project: &str) -> Result<Vec<EpicSummary>> {
        let jql = format!(
            "project = \"{}\" AND issuetype = Epic AND status = \"In Progress\"",
            project.replace('"', "\\\"")
        );
        let fields = format!("summary,duedate,{}", self.epic_completion_field);
        let response = self
            .api
            .get_json(
                "/rest/api/2/search",
                &[
                    ("jql", jql),
                    ("maxResults", EPICS_PAGE_SIZE.to_string()),
                    ("fields", fields),
                ],
            )
            .await?;

        let epics = array(&response, "issues")?
            .iter()
            .map(|issue| EpicSummary::parse(issue, &self.epic_completion_field, self.api.base_url()))
            .collect::<Result<Vec<_>>>()?;
        for epic in &epics {
            tracing::debug!(key = %epic.key, summary = %epic.summary, url = %epic.url, "Ongoing epic");
        }
        Ok(epics)
    }
}
