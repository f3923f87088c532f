use crate::model::{Error, Result, Team};
use crate::Args;

#[derive(Debug, Clone, PartialEq)]
pub struct ApiCredentials {
    pub base_url: String,
    pub email: String,
    pub token: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub team: Team,
    pub jira: ApiCredentials,
    pub confluence: ApiCredentials,
    pub page_id: String,
    pub sprint_count: usize,
    pub story_points_field: String,
    pub epic_completion_field: String,
    pub working_days: Option<u32>,
    pub interactive: bool,
    pub dry_run: bool,
}

impl TryFrom<&Args> for Config {
    type Error = Error;

    fn try_from(args: &Args) -> Result<Self> {
        let board_id = required(&args.team_board_id, "TEAM_BOARD_ID")?;
        let Ok(board_id) = board_id.parse::<u64>() else {
            return Err(Error::Configuration(format!(
                "TEAM_BOARD_ID must be a number, got `{board_id}`"
            )));
        };
        if args.sprint_count == 0 {
            return Err(Error::Configuration(
                "--sprint-count must be at least 1".into(),
            ));
        }

        Ok(Self {
            team: Team::new(
                required(&args.team_name, "TEAM_NAME")?,
                board_id,
                required(&args.team_jira_project, "TEAM_JIRA_PROJECT")?,
            ),
            jira: ApiCredentials {
                base_url: base_url(required(&args.jira_base_url, "JIRA_BASE_URL")?),
                email: required(&args.jira_email, "JIRA_EMAIL")?,
                token: required(&args.jira_api_token, "JIRA_API_TOKEN")?,
            },
            confluence: ApiCredentials {
                base_url: base_url(required(&args.confluence_base_url, "CONFLUENCE_BASE_URL")?),
                email: required(&args.confluence_email, "CONFLUENCE_EMAIL")?,
                token: required(&args.confluence_api_token, "CONFLUENCE_API_TOKEN")?,
            },
            page_id: required(&args.confluence_page_id, "CONFLUENCE_PAGE_ID")?,
            sprint_count: args.sprint_count,
            story_points_field: args.story_points_field.clone(),
            epic_completion_field: args.epic_completion_field.clone(),
            working_days: args.working_days,
            interactive: args.interactive,
            dry_run: args.dry_run,
        })
    }
}

fn required(value: &Option<String>, name: &str) -> Result<String> {
    match value.as_deref().map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value.to_string()),
        _ => Err(Error::Configuration(format!(
            "{name} environment variable is not set"
        ))),
    }
}

fn base_url(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn args() -> Args {
        Args {
            jira_base_url: Some("https://example.atlassian.net/".into()),
            jira_email: Some("bot@example.com".into()),
            jira_api_token: Some("jira-token".into()),
            confluence_base_url: Some("https://example.atlassian.net/wiki".into()),
            confluence_email: Some("bot@example.com".into()),
            confluence_api_token: Some("wiki-token".into()),
            confluence_page_id: Some("123456".into()),
            team_name: Some("Supply".into()),
            team_board_id: Some("42".into()),
            team_jira_project: Some("FR - supply".into()),
            sprint_count: 3,
            story_points_field: "customfield_10026".into(),
            epic_completion_field: "customfield_10435".into(),
            working_days: None,
            interactive: false,
            dry_run: false,
        }
    }

    #[test]
    fn builds_typed_config() {
        let config = Config::try_from(&args()).unwrap();
        assert_eq!(config.team, Team::new("Supply", 42, "FR - supply"));
        assert_eq!(config.jira.base_url, "https://example.atlassian.net");
        assert_eq!(config.page_id, "123456");
    }

    #[test]
    fn missing_variable_is_a_configuration_error() {
        let mut args = args();
        args.team_name = Some("  ".into());
        let error = Config::try_from(&args).unwrap_err();
        assert_eq!(
            error.to_string(),
            "Configuration error: TEAM_NAME environment variable is not set"
        );
    }

    #[test]
    fn board_id_must_be_numeric() {
        let mut args = args();
        args.team_board_id = Some("board".into());
        assert!(matches!(
            Config::try_from(&args),
            Err(Error::Configuration(_))
        ));
    }
}
