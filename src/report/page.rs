use crate::report::table::{escape, Slot};
use crate::report::{assignee_matrix, epics};

pub const CLOSED_SPRINTS_HEADING: &str = "Closed Sprints";
pub const ONGOING_EPICS_HEADING: &str = "Ongoing Epics";

/// Fresh page: title, then one section per synchronized table.
pub fn assemble(team_name: &str, sprints_table: &str, epics_table: &str) -> String {
    format!(
        "<h1>Weekly Report for {}</h1><h2>{CLOSED_SPRINTS_HEADING}</h2>{sprints_table}<h2>{ONGOING_EPICS_HEADING}</h2>{epics_table}",
        escape(team_name)
    )
}

/// Writes both tables into `body`. When the page already has both sections the
/// tables are replaced in place and everything else is kept byte for byte;
/// otherwise the page is assembled from scratch.
pub fn compose(body: &str, team_name: &str, sprints_table: &str, epics_table: &str) -> String {
    let slots = (
        assignee_matrix::LOCATOR.slot(body),
        epics::LOCATOR.slot(body),
    );
    let (Some(sprints_slot), Some(epics_slot)) = slots else {
        tracing::info!("Page has no report sections, assembling a new page");
        return assemble(team_name, sprints_table, epics_table);
    };

    let mut replacements = vec![
        (range_of(&sprints_slot), sprints_table),
        (range_of(&epics_slot), epics_table),
    ];
    replacements.sort_by_key(|(range, _)| std::cmp::Reverse(range.start));

    let mut composed = body.to_string();
    for (range, table) in replacements {
        composed.replace_range(range, table);
    }
    composed
}

fn range_of(slot: &Slot) -> std::ops::Range<usize> {
    match slot {
        Slot::Table(range) | Slot::Malformed(range) => range.clone(),
        Slot::Vacant(at) => *at..*at,
    }
}
