use crate::config::Config;
use crate::http::ApiClient;
use crate::model::Result;

#[derive(Debug, Clone)]
pub struct JiraClient {
    pub(super) api: ApiClient,
    pub(super) story_points_field: String,
    pub(super) epic_completion_field: String,
}

impl JiraClient {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            api: ApiClient::new(config.jira.clone())?,
            story_points_field: config.story_points_field.clone(),
            epic_completion_field: config.epic_completion_field.clone(),
        })
    }
}

#[cfg(test)]
impl JiraClient {
    pub fn for_tests(base_url: &str) -> Self {
        let credentials = crate::config::ApiCredentials {
            base_url: base_url.to_string(),
            email: "bot@example.com".to_string(),
            token: "token".to_string(),
        };
        Self {
            api: ApiClient::new(credentials).expect("http client"),
            story_points_field: "customfield_10026".to_string(),
            epic_completion_field: "customfield_10435".to_string(),
        }
    }
}
