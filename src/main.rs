mod analyze;
mod config;
mod confluence;
mod http;
mod jira;
mod model;
mod report;
mod utils;

use crate::analyze::{build_sprint_report, latest_sprints};
use crate::config::Config;
use crate::confluence::{ConfluenceClient, DocumentStore};
use crate::jira::{JiraClient, SprintSource};
use crate::model::{Result, SprintReport};
use crate::report::annotation::{AnnotationSupplier, DefaultAnnotations, InteractivePrompt};
use crate::utils::FetchProgress;
use clap::Parser;
use indicatif::MultiProgress;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug, Clone)]
#[command(version, about = "Writes closed-sprint metrics and ongoing epics into a Confluence page")]
struct Args {
    #[arg(long, env = "JIRA_BASE_URL")]
    jira_base_url: Option<String>,
    #[arg(long, env = "JIRA_EMAIL")]
    jira_email: Option<String>,
    #[arg(long, env = "JIRA_API_TOKEN", hide_env_values = true)]
    jira_api_token: Option<String>,
    #[arg(long, env = "CONFLUENCE_BASE_URL")]
    confluence_base_url: Option<String>,
    #[arg(long, env = "CONFLUENCE_EMAIL")]
    confluence_email: Option<String>,
    #[arg(long, env = "CONFLUENCE_API_TOKEN", hide_env_values = true)]
    confluence_api_token: Option<String>,
    #[arg(long, env = "CONFLUENCE_PAGE_ID")]
    confluence_page_id: Option<String>,
    #[arg(long, env = "TEAM_NAME")]
    team_name: Option<String>,
    #[arg(long, env = "TEAM_BOARD_ID")]
    team_board_id: Option<String>,
    #[arg(long, env = "TEAM_JIRA_PROJECT")]
    team_jira_project: Option<String>,
    /// Number of latest closed sprints to report on.
    #[arg(long = "sprint-count", env = "PAST_SPRINT_FETCH_COUNT", default_value_t = 3)]
    sprint_count: usize,
    #[arg(long, env = "STORY_POINTS_FIELD", default_value = "customfield_10026")]
    story_points_field: String,
    #[arg(long, env = "EPIC_COMPLETION_FIELD", default_value = "customfield_10435")]
    epic_completion_field: String,
    /// Working days per assignee and sprint, used for the points/day rate.
    #[arg(long, env = "WORKING_DAYS")]
    working_days: Option<u32>,
    /// Ask for sprint goal completion and working days on the terminal.
    #[arg(long)]
    interactive: bool,
    /// Print the page body instead of writing it.
    #[arg(long)]
    dry_run: bool,
}

#[derive(Debug, Clone, PartialEq)]
enum Outcome {
    DryRun(String),
    Unchanged,
    Written { version: u64 },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    init_logging();
    let args = Args::parse();
    match run(&args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(%error, "Weekly report failed");
            ExitCode::FAILURE
        }
    }
}

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

async fn run(args: &Args) -> Result<()> {
    let config = Config::try_from(args)?;
    let jira = JiraClient::new(&config)?;
    let confluence = ConfluenceClient::new(config.confluence.clone())?;
    let defaults = DefaultAnnotations {
        working_days: config.working_days,
    };
    let mut supplier: Box<dyn AnnotationSupplier> = if config.interactive {
        Box::new(InteractivePrompt::new(
            std::io::stdin().lock(),
            std::io::stderr(),
            defaults,
        ))
    } else {
        Box::new(defaults)
    };

    match publish(&config, &jira, &confluence, supplier.as_mut()).await? {
        Outcome::DryRun(body) => println!("{body}"),
        Outcome::Unchanged => tracing::info!("Page is already up to date"),
        Outcome::Written { version } => tracing::info!(version, "Page updated"),
    }
    Ok(())
}

async fn publish<S: SprintSource, D: DocumentStore>(
    config: &Config,
    source: &S,
    store: &D,
    supplier: &mut dyn AnnotationSupplier,
) -> Result<Outcome> {
    let reports = fetch_sprint_reports(config, source).await?;
    let epics = source.ongoing_epics(&config.team.project).await?;
    tracing::info!(epics = epics.len(), "Fetched ongoing epics");

    if config.dry_run {
        let body = store.read_body(&config.page_id).await?;
        let body = report::synchronize(&body, &config.team.name, &reports, &epics, supplier)?;
        return Ok(Outcome::DryRun(body));
    }

    let page = store.read_body_and_version(&config.page_id).await?;
    let body = report::synchronize(&page.body, &config.team.name, &reports, &epics, supplier)?;
    if body == page.body {
        return Ok(Outcome::Unchanged);
    }
    store
        .write(&page.id, &page.title, &body, page.version)
        .await?;
    Ok(Outcome::Written {
        version: page.version + 1,
    })
}

async fn fetch_sprint_reports<S: SprintSource>(
    config: &Config,
    source: &S,
) -> Result<Vec<SprintReport>> {
    let multi_progress = MultiProgress::new();
    let sprints_pb = multi_progress.add_spinner("Fetch closed sprints ...");
    let progress_pb = sprints_pb.clone();
    let progress = move |page: usize| {
        progress_pb.set_message(format!("Fetch closed sprints (#{} page) ...", page + 1));
    };
    let closed = source
        .list_closed_sprints(config.team.board_id, Box::new(progress))
        .await?;
    let sprints = latest_sprints(closed, config.sprint_count);
    sprints_pb.finish_with_message(format!(
        "✅ Completed fetch closed sprints (latest {})",
        sprints.len()
    ));

    let reports_pb = multi_progress.add_counter(sprints.len() as u64, "Fetch sprint reports");
    let mut reports = vec![];
    for sprint in &sprints {
        tracing::info!(sprint = %sprint.name, id = sprint.id, "Building sprint report");
        let (stats, issues) = futures::try_join!(
            source.sprint_stats(config.team.board_id, sprint.id),
            source.sprint_issues(config.team.board_id, sprint.id),
        )?;
        reports.push(build_sprint_report(sprint, &stats, &issues));
        reports_pb.inc(1);
    }
    reports_pb.finish_with_message("✅ Completed fetch sprint reports");
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiCredentials;
    use crate::confluence::Page;
    use crate::jira::PageProgress;
    use crate::model::{ClosedSprint, EpicSummary, Error, SprintIssue, SprintStats, Team};
    use crate::report::assignee_matrix;
    use chrono::DateTime;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    struct FakeTracker {
        sprints: Vec<ClosedSprint>,
        epics: Vec<EpicSummary>,
    }

    impl SprintSource for FakeTracker {
        async fn list_closed_sprints<'a>(
            &self,
            _board_id: u64,
            mut cb: PageProgress<'a>,
        ) -> Result<Vec<ClosedSprint>> {
            cb(0);
            Ok(self.sprints.clone())
        }

        async fn sprint_stats(&self, _board_id: u64, sprint_id: u64) -> Result<SprintStats> {
            Ok(SprintStats {
                commited_points: 10.0,
                done_points: sprint_id as f64,
                goal: format!("Goal {sprint_id}"),
            })
        }

        async fn sprint_issues(&self, _board_id: u64, sprint_id: u64) -> Result<Vec<SprintIssue>> {
            Ok(vec![SprintIssue {
                points: sprint_id as f64,
                status: "Done".to_string(),
                assignee: Some(format!("Dev {sprint_id}")),
            }])
        }

        async fn ongoing_epics(&self, _project: &str) -> Result<Vec<EpicSummary>> {
            Ok(self.epics.clone())
        }
    }

    struct FakeWiki {
        page: Mutex<Page>,
        concurrent_edit: bool,
    }

    impl FakeWiki {
        fn new(body: &str) -> Self {
            Self {
                page: Mutex::new(Page {
                    id: "123".to_string(),
                    title: "Weekly".to_string(),
                    version: 1,
                    body: body.to_string(),
                }),
                concurrent_edit: false,
            }
        }

        fn body(&self) -> String {
            self.page.lock().unwrap().body.clone()
        }
    }

    impl DocumentStore for FakeWiki {
        async fn read_body(&self, _page_id: &str) -> Result<String> {
            Ok(self.body())
        }

        async fn read_body_and_version(&self, _page_id: &str) -> Result<Page> {
            Ok(self.page.lock().unwrap().clone())
        }

        async fn write(
            &self,
            page_id: &str,
            _title: &str,
            body: &str,
            expected_version: u64,
        ) -> Result<()> {
            let mut page = self.page.lock().unwrap();
            if self.concurrent_edit || page.version != expected_version {
                return Err(Error::VersionConflict {
                    page_id: page_id.to_string(),
                    expected: expected_version,
                });
            }
            page.version += 1;
            page.body = body.to_string();
            Ok(())
        }
    }

    fn config() -> Config {
        let credentials = ApiCredentials {
            base_url: "http://localhost".to_string(),
            email: "bot@example.com".to_string(),
            token: "token".to_string(),
        };
        Config {
            team: Team::new("Supply", 42, "FR - supply"),
            jira: credentials.clone(),
            confluence: credentials,
            page_id: "123".to_string(),
            sprint_count: 2,
            story_points_field: "customfield_10026".to_string(),
            epic_completion_field: "customfield_10435".to_string(),
            working_days: None,
            interactive: false,
            dry_run: false,
        }
    }

    fn tracker() -> FakeTracker {
        let sprint = |id: u64, end: &str| {
            ClosedSprint::new(id, format!("S{id}"), &DateTime::parse_from_rfc3339(end).unwrap())
        };
        FakeTracker {
            sprints: vec![
                sprint(1, "2024-01-14T10:00:00Z"),
                sprint(3, "2024-02-11T10:00:00Z"),
                sprint(2, "2024-01-28T10:00:00Z"),
            ],
            epics: vec![EpicSummary::new("EPIC-1", None, 50.0, "", "")],
        }
    }

    #[tokio::test]
    async fn publishes_once_then_stays_unchanged() {
        let wiki = FakeWiki::new("");
        let tracker = tracker();
        let mut supplier = DefaultAnnotations::default();

        let outcome = publish(&config(), &tracker, &wiki, &mut supplier).await.unwrap();
        assert_eq!(outcome, Outcome::Written { version: 2 });

        let grid = assignee_matrix::LOCATOR.grid(&wiki.body()).unwrap();
        let sprints = grid.rows.iter().map(|row| row[0].to_text()).collect::<Vec<_>>();
        assert_eq!(sprints, vec!["S3", "S2"]);
        assert_eq!(grid.columns()[4..], ["Dev 3", "Dev 2"].map(String::from));

        let outcome = publish(&config(), &tracker, &wiki, &mut supplier).await.unwrap();
        assert_eq!(outcome, Outcome::Unchanged);
    }

    #[tokio::test]
    async fn dry_run_does_not_write() {
        let wiki = FakeWiki::new("");
        let mut config = config();
        config.dry_run = true;

        let outcome = publish(&config, &tracker(), &wiki, &mut DefaultAnnotations::default())
            .await
            .unwrap();
        assert!(matches!(outcome, Outcome::DryRun(body) if body.contains("Weekly Report for Supply")));
        assert_eq!(wiki.body(), "");
    }

    #[tokio::test]
    async fn version_conflict_is_fatal() {
        let mut wiki = FakeWiki::new("");
        wiki.concurrent_edit = true;

        let result = publish(&config(), &tracker(), &wiki, &mut DefaultAnnotations::default()).await;
        assert!(matches!(result, Err(Error::VersionConflict { expected: 1, .. })));
        assert_eq!(wiki.body(), "");
    }
}
