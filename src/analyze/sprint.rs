use crate::model::{AssigneeStats, ClosedSprint, SprintIssue, SprintReport, SprintStats};
use itertools::Itertools;

pub const UNASSIGNED: &str = "Unassigned";

/// Newest sprints first, at most `count` of them.
pub fn latest_sprints(sprints: Vec<ClosedSprint>, count: usize) -> Vec<ClosedSprint> {
    sprints
        .into_iter()
        .sorted_by(|s1, s2| s2.end_date.cmp(&s1.end_date))
        .take(count)
        .collect()
}

pub fn build_sprint_report(
    sprint: &ClosedSprint,
    stats: &SprintStats,
    issues: &[SprintIssue],
) -> SprintReport {
    let mut report = SprintReport::new(&sprint.name, &stats.goal);
    report.commited_points = stats.commited_points;
    report.done_points = stats.done_points;

    for issue in issues {
        report.total_points += issue.points;
        if !issue.is_done() {
            continue;
        }
        report.done_tickets += 1;
        let assignee = issue.assignee.as_deref().unwrap_or(UNASSIGNED);
        let entry = report
            .by_assignee
            .entry(assignee.to_string())
            .or_insert_with(AssigneeStats::default);
        entry.points += issue.points;
        entry.tickets += 1;
    }
    report
}
