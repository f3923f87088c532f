mod client;
mod epic;
mod sprint;

use crate::model::{ClosedSprint, EpicSummary, Result, SprintIssue, SprintStats};

pub use client::JiraClient;

pub type PageProgress<'a> = Box<dyn FnMut(usize) + Send + 'a>;

/// Read-only view of the project tracker.
pub trait SprintSource {
    async fn list_closed_sprints<'a>(
        &self,
        board_id: u64,
        cb: PageProgress<'a>,
    ) -> Result<Vec<ClosedSprint>>;

    async fn sprint_stats(&self, board_id: u64, sprint_id: u64) -> Result<SprintStats>;

    async fn sprint_issues(&self, board_id: u64, sprint_id: u64) -> Result<Vec<SprintIssue>>;

    async fn ongoing_epics(&self, project: &str) -> Result<Vec<EpicSummary>>;
}
