use crate::model::{EpicSummary, Error, Result};
use crate::report::table::{escape, normalize, Cell, Grid, TableLocator, TableStyle};
use indexmap::IndexMap;
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex_lite::Regex;

pub const ONGOING_EPICS_COLUMNS: [&str; 6] =
    ["Jira link", "Due date", "Completion", "RDP", "QRQC", "Actions"];

const KEY_CELL: usize = 0;
const DUE_DATE_CELL: usize = 1;
const COMPLETION_CELL: usize = 2;

pub const STYLE: TableStyle = TableStyle::new(None, None);
pub const LOCATOR: TableLocator = TableLocator::new("Ongoing Epics", 1);

static JIRA_KEY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<ac:parameter\s+ac:name="key"\s*>(.*?)</ac:parameter>"#)
        .expect("valid jira key regex")
});

/// Merges `epics` into the epics table found in `body` (if any) and renders
/// the resulting table.
pub fn sync(body: &str, epics: &[EpicSummary]) -> String {
    merge(LOCATOR.grid(body), epics).render(&STYLE)
}

/// New epics first, then the existing rows in their current order: tracked
/// epics get fresh due date and completion, rows without a jira key are kept
/// verbatim, epics that are no longer ongoing are dropped.
pub fn merge(existing: Option<Grid>, epics: &[EpicSummary]) -> Grid {
    let epics = epics.iter().unique_by(|e| e.key.clone()).collect::<Vec<_>>();
    let grid = match existing {
        Some(grid) if is_epics_table(&grid) => grid,
        _ => {
            tracing::info!("No existing ongoing epics table found, initializing new table");
            return init(&epics);
        }
    };

    let existing_keys = grid.rows.iter().filter_map(|row| key_of(row)).collect::<Vec<_>>();
    let (to_update, to_insert): (Vec<&&EpicSummary>, Vec<&&EpicSummary>) = epics
        .iter()
        .partition(|epic| existing_keys.contains(&normalize(&epic.key)));
    tracing::info!(
        new = ?to_insert.iter().map(|e| &e.key).collect::<Vec<_>>(),
        updated = ?to_update.iter().map(|e| &e.key).collect::<Vec<_>>(),
        "Merging ongoing epics"
    );

    let mut updated = IndexMap::new();
    for epic in &to_update {
        match update_row(&grid, epic) {
            Ok((index, row)) => {
                updated.insert(index, row);
            }
            Err(error) => tracing::warn!(key = %epic.key, %error, "Skipping epic update"),
        }
    }

    let mut merged = Grid {
        header: grid.header.clone(),
        rows: to_insert
            .iter()
            .map(|epic| new_row(epic, grid.header.len()))
            .collect(),
    };
    for (index, row) in grid.rows.into_iter().enumerate() {
        if let Some(row) = updated.shift_remove(&index) {
            merged.push_row(row);
        } else if let Some(key) = key_of(&row) {
            tracing::info!(%key, "Dropping epic that is no longer ongoing");
        } else {
            merged.push_row(row);
        }
    }
    merged
}

/// Locates the row tracking `epic` and overwrites its due date and completion,
/// leaving the key macro and the annotation columns exactly as they are.
pub fn update_row(grid: &Grid, epic: &EpicSummary) -> Result<(usize, Vec<Cell>)> {
    let key = normalize(&epic.key);
    let Some(index) = grid
        .rows
        .iter()
        .position(|row| key_of(row).as_ref() == Some(&key))
    else {
        return Err(Error::UnknownKey(epic.key.clone()));
    };
    let mut row = grid.rows[index].clone();
    row[DUE_DATE_CELL] = Cell::text(epic.due_date_cell());
    row[COMPLETION_CELL] = Cell::text(epic.completion_cell());
    Ok((index, row))
}

pub fn key_of(row: &[Cell]) -> Option<String> {
    let cell = row.get(KEY_CELL)?;
    let captures = JIRA_KEY.captures(cell.as_markup())?;
    let key = Cell::markup(&captures[1]).to_text();
    (!key.is_empty()).then_some(key)
}

fn init(epics: &[&EpicSummary]) -> Grid {
    let mut grid = Grid::new(&ONGOING_EPICS_COLUMNS);
    for epic in epics {
        grid.push_row(new_row(epic, ONGOING_EPICS_COLUMNS.len()));
    }
    grid
}

fn is_epics_table(grid: &Grid) -> bool {
    grid.header.len() > COMPLETION_CELL
        && grid.header[KEY_CELL].to_text() == ONGOING_EPICS_COLUMNS[KEY_CELL]
}

fn new_row(epic: &EpicSummary, width: usize) -> Vec<Cell> {
    let mut row = vec![
        key_cell(&epic.key),
        Cell::text(epic.due_date_cell()),
        Cell::text(epic.completion_cell()),
    ];
    row.resize(width.max(row.len()), Cell::empty());
    row
}

fn key_cell(key: &str) -> Cell {
    Cell::markup(format!(
        "<ac:structured-macro ac:name=\"jira\"><ac:parameter ac:name=\"key\">{}</ac:parameter></ac:structured-macro>",
        escape(key)
    ))
}
