use crate::model::SprintReport;
use crate::report::annotation::Annotations;
use crate::report::table::{normalize, Cell, Grid, TableLocator, TableStyle};
use itertools::Itertools;

pub const SPRINT_COLUMN: &str = "Sprint";
pub const SPRINT_GOAL_COLUMN: &str = "Sprint Goal";
pub const SPRINT_POINTS_DONE_COLUMN: &str = "Points Done";
pub const SPRINT_COMMITS_COLUMN: &str = "Commited points";
pub const NON_ASSIGNEE_COLUMNS: [&str; 4] = [
    SPRINT_COLUMN,
    SPRINT_GOAL_COLUMN,
    SPRINT_POINTS_DONE_COLUMN,
    SPRINT_COMMITS_COLUMN,
];

/// Cell value for rows that predate an assignee column.
pub const FILLER: &str = "-";

pub const SPRINT_ASSIGNEE_TABLE_WIDTH: u32 = 1382;
pub const STYLE: TableStyle = TableStyle::new(Some(SPRINT_ASSIGNEE_TABLE_WIDTH), Some("center"));
pub const LOCATOR: TableLocator = TableLocator::new("Closed Sprints", 0);

/// What a merge of `reports` into the existing sprint × assignee table will
/// do, decided before any annotation is gathered.
#[derive(Debug, Clone, PartialEq)]
pub enum MatrixPlan<'a> {
    Init {
        assignees: Vec<String>,
        reports: Vec<&'a SprintReport>,
    },
    Extend {
        grid: Grid,
        new_assignees: Vec<String>,
        reports: Vec<&'a SprintReport>,
    },
}

impl<'a> MatrixPlan<'a> {
    pub fn new(existing: Option<Grid>, reports: &'a [SprintReport]) -> Self {
        let reports = reports.iter().unique_by(|r| normalize(&r.sprint)).collect::<Vec<_>>();
        let grid = match existing {
            Some(grid) if is_sprint_table(&grid) => grid,
            Some(_) => {
                tracing::warn!(
                    "Existing sprint table has no rows or an unexpected header, initializing new table"
                );
                return Self::init(reports);
            }
            None => {
                tracing::info!("No existing sprint assignee table found, initializing new table");
                return Self::init(reports);
            }
        };

        let existing_assignees = assignees_of(&grid);
        let existing_sprints = grid
            .rows
            .iter()
            .map(|row| row[0].to_text())
            .collect::<Vec<_>>();
        let reports = reports
            .into_iter()
            .filter(|r| !existing_sprints.contains(&normalize(&r.sprint)))
            .collect::<Vec<_>>();
        let new_assignees = assignee_columns(&reports)
            .filter(|a| !existing_assignees.contains(a))
            .collect::<Vec<_>>();

        Self::Extend {
            grid,
            new_assignees,
            reports,
        }
    }

    fn init(reports: Vec<&'a SprintReport>) -> Self {
        let assignees = assignee_columns(&reports).collect();
        Self::Init { assignees, reports }
    }

    /// Reports that will get a freshly rendered row.
    pub fn reports(&self) -> &[&'a SprintReport] {
        match self {
            Self::Init { reports, .. } | Self::Extend { reports, .. } => reports,
        }
    }

    /// Every assignee column of the resulting table, in column order.
    pub fn assignees(&self) -> Vec<String> {
        match self {
            Self::Init { assignees, .. } => assignees.clone(),
            Self::Extend {
                grid,
                new_assignees,
                ..
            } => assignees_of(grid)
                .into_iter()
                .chain(new_assignees.iter().cloned())
                .collect(),
        }
    }

    pub fn apply(self, annotations: &Annotations) -> Grid {
        match self {
            Self::Init { assignees, reports } => {
                let columns = NON_ASSIGNEE_COLUMNS
                    .iter()
                    .map(|c| c.to_string())
                    .chain(assignees)
                    .collect::<Vec<_>>();
                let mut grid = Grid::new(&columns);
                for report in reports {
                    grid.push_row(render_row(report, &columns, annotations));
                }
                grid
            }
            Self::Extend {
                mut grid,
                new_assignees,
                reports,
            } => {
                if !new_assignees.is_empty() {
                    tracing::info!(assignees = ?new_assignees, "Adding assignee columns");
                }
                for assignee in &new_assignees {
                    grid.push_column(assignee, FILLER);
                }
                if reports.is_empty() {
                    tracing::info!("No new sprint reports to add");
                    return grid;
                }

                tracing::info!(
                    sprints = ?reports.iter().map(|r| &r.sprint).collect::<Vec<_>>(),
                    "Adding new sprint reports"
                );
                let columns = grid.columns();
                for report in reports.into_iter().rev() {
                    grid.insert_row(0, render_row(report, &columns, annotations));
                }
                grid
            }
        }
    }
}

fn is_sprint_table(grid: &Grid) -> bool {
    !grid.is_empty() && grid.columns().first().map(String::as_str) == Some(SPRINT_COLUMN)
}

/// Column names for the assignees of `reports`, first-seen order.
fn assignee_columns<'r>(reports: &'r [&'r SprintReport]) -> impl Iterator<Item = String> + 'r {
    reports
        .iter()
        .flat_map(|r| r.by_assignee.keys())
        .map(|a| normalize(a))
        .filter(|a| !a.is_empty() && !NON_ASSIGNEE_COLUMNS.contains(&a.as_str()))
        .unique()
}

fn assignees_of(grid: &Grid) -> Vec<String> {
    grid.columns()
        .into_iter()
        .filter(|c| !NON_ASSIGNEE_COLUMNS.contains(&c.as_str()))
        .collect()
}

fn render_row(report: &SprintReport, columns: &[String], annotations: &Annotations) -> Vec<Cell> {
    columns
        .iter()
        .map(|column| match column.as_str() {
            SPRINT_COLUMN => Cell::text(&report.sprint),
            SPRINT_GOAL_COLUMN => Cell::text(goal_cell(report, annotations)),
            SPRINT_POINTS_DONE_COLUMN => Cell::text(report.done_points.to_string()),
            SPRINT_COMMITS_COLUMN => Cell::text(report.commited_points.to_string()),
            assignee => Cell::text(assignee_cell(report, assignee, annotations)),
        })
        .collect()
}

fn goal_cell(report: &SprintReport, annotations: &Annotations) -> String {
    let emoji = match annotations.goal_met(&report.sprint) {
        Some(true) => "✅",
        Some(false) => "❌",
        None => return report.sprint_goal.clone(),
    };
    format!("{} {emoji}", report.sprint_goal).trim().to_string()
}

fn assignee_cell(report: &SprintReport, assignee: &str, annotations: &Annotations) -> String {
    let Some(points) = report
        .by_assignee
        .iter()
        .filter(|(name, _)| normalize(name) == assignee)
        .map(|(_, stats)| stats.points)
        .reduce(|total, points| total + points)
    else {
        return "0 points".to_string();
    };
    match annotations.working_days(&report.sprint, assignee) {
        Some(days) if days > 0 => {
            format!("{points} points ({:.2} points/day)", points / days as f64)
        }
        _ => format!("{points} points"),
    }
}
