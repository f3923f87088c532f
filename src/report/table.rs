use crate::model::{Error, Result};
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex_lite::Regex;
use std::ops::Range;

static TABLE_OPEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<table(?:\s[^>]*)?>").expect("valid table regex"));
static TABLE_CLOSE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)</table\s*>").expect("valid table regex"));
static ROW: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<tr(?:\s[^>]*)?>(.*?)</tr\s*>").expect("valid row regex"));
static ROW_OPEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<tr(?:\s[^>]*)?>").expect("valid row regex"));
static ROW_CLOSE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)</tr\s*>").expect("valid row regex"));
static CELL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<(th|td)(?:\s[^>]*)?>(.*?)</t[hd]\s*>").expect("valid cell regex")
});
static CELL_OPEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<t[hd](?:\s[^>]*)?>").expect("valid cell regex"));
static CELL_CLOSE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)</t[hd]\s*>").expect("valid cell regex"));
static HEADING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<h[1-6](?:\s[^>]*)?>(.*?)</h[1-6]\s*>").expect("valid heading regex")
});
static SECTION_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<h[12](?:\s[^>]*)?>").expect("valid heading regex"));
static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid space regex"));

/// One table cell, kept as the markup found between its `<td>`/`<th>` tags.
#[derive(Debug, Clone, Eq, Hash, PartialEq)]
pub struct Cell(String);

impl Cell {
    pub fn markup(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_string())
    }

    pub fn text(value: impl AsRef<str>) -> Self {
        Self::markup(escape(value.as_ref()))
    }

    pub fn empty() -> Self {
        Self(String::new())
    }

    pub fn as_markup(&self) -> &str {
        &self.0
    }

    /// Visible text: paragraph wrappers and other tags removed, entities decoded.
    pub fn to_text(&self) -> String {
        let stripped = TAG.replace_all(&self.0, "");
        normalize(&unescape(&stripped))
    }
}

/// Parsed table: header cells and data rows, every row as wide as the header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Grid {
    pub header: Vec<Cell>,
    pub rows: Vec<Vec<Cell>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TableStyle {
    pub width: Option<u32>,
    pub layout: Option<&'static str>,
}

// Create
impl Grid {
    pub fn new(columns: &[impl AsRef<str>]) -> Self {
        Self {
            header: columns.iter().map(Cell::text).collect(),
            rows: vec![],
        }
    }

    pub fn columns(&self) -> Vec<String> {
        self.header.iter().map(Cell::to_text).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.header.is_empty() || self.rows.is_empty()
    }

    /// Appends a trailing column; existing rows receive `filler`.
    pub fn push_column(&mut self, name: &str, filler: &str) {
        self.header.push(Cell::text(name));
        for row in &mut self.rows {
            row.push(Cell::text(filler));
        }
    }

    pub fn insert_row(&mut self, index: usize, row: Vec<Cell>) {
        debug_assert_eq!(row.len(), self.header.len());
        self.rows.insert(index, row);
    }

    pub fn push_row(&mut self, row: Vec<Cell>) {
        debug_assert_eq!(row.len(), self.header.len());
        self.rows.push(row);
    }
}

// Parser
impl Grid {
    /// Parses one `<table>…</table>` region. The first row must be made of
    /// `<th>` cells; data rows shorter than the header are padded with empty
    /// cells, wider ones make the table malformed.
    pub fn parse(markup: &str) -> Result<Self> {
        let Some(open) = TABLE_OPEN.find(markup) else {
            return Err(Error::MalformedDocument("missing <table> tag".into()));
        };
        let Some(close) = TABLE_CLOSE.find_at(markup, open.end()) else {
            return Err(Error::MalformedDocument("missing </table> tag".into()));
        };
        let inner = &markup[open.end()..close.start()];
        if TABLE_OPEN.is_match(inner) {
            return Err(Error::MalformedDocument("nested <table> tag".into()));
        }
        balanced(inner, &ROW_OPEN, &ROW_CLOSE, "tr")?;

        let mut rows = ROW.captures_iter(inner).map(|row| -> Result<Vec<(bool, Cell)>> {
            let row = row.get(1).map_or("", |m| m.as_str());
            balanced(row, &CELL_OPEN, &CELL_CLOSE, "td")?;
            Ok(CELL
                .captures_iter(row)
                .map(|cell| {
                    let is_header = cell[1].eq_ignore_ascii_case("th");
                    (is_header, Cell::markup(&cell[2]))
                })
                .collect::<Vec<_>>())
        });

        let header = match rows.next().transpose()? {
            Some(cells) if !cells.is_empty() && cells.iter().all(|(is_header, _)| *is_header) => {
                cells.into_iter().map(|(_, cell)| cell).collect::<Vec<_>>()
            }
            _ => return Err(Error::MalformedDocument("table has no header row".into())),
        };

        let mut grid = Self {
            header,
            rows: vec![],
        };
        for cells in rows {
            let mut cells = cells?
                .into_iter()
                .map(|(_, cell)| cell)
                .collect::<Vec<_>>();
            if cells.is_empty() {
                continue;
            }
            if cells.len() > grid.header.len() {
                return Err(Error::MalformedDocument(format!(
                    "row has {} cells but the header has {}",
                    cells.len(),
                    grid.header.len()
                )));
            }
            cells.resize(grid.header.len(), Cell::empty());
            grid.rows.push(cells);
        }
        Ok(grid)
    }
}

// Render
impl Grid {
    pub fn render(&self, style: &TableStyle) -> String {
        let header = self
            .header
            .iter()
            .map(|cell| format!("<th>{}</th>", cell.as_markup()))
            .join("");
        let rows = self
            .rows
            .iter()
            .map(|row| {
                let cells = row
                    .iter()
                    .map(|cell| format!("<td>{}</td>", cell.as_markup()))
                    .join("");
                format!("<tr>{cells}</tr>")
            })
            .join("");
        format!(
            "<table{}><thead><tr>{header}</tr></thead><tbody>{rows}</tbody></table>",
            style.attributes()
        )
    }
}

impl TableStyle {
    pub const fn new(width: Option<u32>, layout: Option<&'static str>) -> Self {
        Self { width, layout }
    }

    fn attributes(&self) -> String {
        let mut attributes = String::new();
        if let Some(width) = self.width {
            attributes.push_str(&format!(" data-table-width=\"{width}\""));
        }
        if let Some(layout) = self.layout {
            attributes.push_str(&format!(" data-layout=\"{layout}\""));
        }
        attributes
    }
}

/// Where an owned table lives inside the page body: the first table of the
/// section opened by `heading`, or the table at `position` for pages that
/// predate the section headings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableLocator {
    pub heading: &'static str,
    pub position: usize,
}

/// Byte range a synchronized table occupies (or should occupy) in a body.
#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
    Table(Range<usize>),
    /// Section without a table: insert at this offset.
    Vacant(usize),
    /// Section whose table markup is unbalanced: from the first `<table` to
    /// the end of the section.
    Malformed(Range<usize>),
}

impl TableLocator {
    pub const fn new(heading: &'static str, position: usize) -> Self {
        Self { heading, position }
    }

    /// Content range between this locator's heading and the next heading.
    pub fn section(&self, body: &str) -> Option<Range<usize>> {
        let heading = HEADING.captures_iter(body).find(|captures| {
            Cell::markup(&captures[1]).to_text() == self.heading
        })?;
        let start = heading.get(0)?.end();
        let end = SECTION_BREAK
            .find_at(body, start)
            .map_or(body.len(), |next| next.start());
        Some(start..end)
    }

    /// Slot inside this locator's section, `None` when the heading is absent.
    pub fn slot(&self, body: &str) -> Option<Slot> {
        let section = self.section(body)?;
        let slot = match find_table(&body[section.clone()], 0) {
            Ok(Some(range)) => Slot::Table(section.start + range.start..section.start + range.end),
            Ok(None) => Slot::Vacant(section.start),
            Err(_) => {
                let start = TABLE_OPEN
                    .find(&body[section.clone()])
                    .map_or(section.start, |open| section.start + open.start());
                Slot::Malformed(start..section.end)
            }
        };
        Some(slot)
    }

    pub fn find(&self, body: &str) -> Result<Option<Range<usize>>> {
        match self.section(body) {
            Some(section) => Ok(find_table(&body[section.clone()], 0)?
                .map(|range| section.start + range.start..section.start + range.end)),
            None => find_table(body, self.position),
        }
    }

    /// Existing grid, or `None` when the document has no usable prior state.
    pub fn grid(&self, body: &str) -> Option<Grid> {
        let parsed = self
            .find(body)
            .and_then(|range| range.map(|range| Grid::parse(&body[range])).transpose());
        match parsed {
            Ok(grid) => grid,
            Err(error) => {
                tracing::warn!(table = self.heading, %error, "Ignoring unparsable table");
                None
            }
        }
    }
}

/// Range of the `nth` top-level table in `text`. A `<table>` that is not
/// closed before the next one opens makes the text malformed.
pub fn find_table(text: &str, nth: usize) -> Result<Option<Range<usize>>> {
    let mut offset = 0;
    let mut index = 0;
    while let Some(open) = TABLE_OPEN.find_at(text, offset) {
        let close = TABLE_CLOSE.find_at(text, open.end());
        let next_open = TABLE_OPEN.find_at(text, open.end());
        let close = match (close, next_open) {
            (Some(close), Some(next)) if next.start() < close.start() => {
                return Err(Error::MalformedDocument("unbalanced <table> tag".into()))
            }
            (Some(close), _) => close,
            (None, _) => return Err(Error::MalformedDocument("unclosed <table> tag".into())),
        };
        if index == nth {
            return Ok(Some(open.start()..close.end()));
        }
        index += 1;
        offset = close.end();
    }
    Ok(None)
}

/// Identity form of a name: trimmed, whitespace runs collapsed to one space.
pub fn normalize(text: &str) -> String {
    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}

pub fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn unescape(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

fn balanced(text: &str, open: &Regex, close: &Regex, tag: &str) -> Result<()> {
    let opened = open.find_iter(text).count();
    let closed = close.find_iter(text).count();
    if opened != closed {
        return Err(Error::MalformedDocument(format!(
            "{opened} <{tag}> tags but {closed} closing tags"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const STYLE: TableStyle = TableStyle::new(Some(1382), Some("center"));

    #[test]
    fn parses_confluence_edited_table() {
        let markup = r#"<table data-table-width="1382" data-layout="center" ac:local-id="x">
            <colgroup><col /></colgroup>
            <tbody>
              <tr><th><p><strong>Sprint</strong></p></th><th><p>Alice</p></th></tr>
              <tr><td><p>S1</p></td><td class="numberingColumn"><p>5 points</p></td></tr>
              <tr><td><p>S0 &amp; more</p></td></tr>
            </tbody></table>"#;
        let grid = Grid::parse(markup).unwrap();

        assert_eq!(grid.columns(), vec!["Sprint", "Alice"]);
        assert_eq!(grid.rows.len(), 2);
        assert_eq!(grid.rows[0][0].to_text(), "S1");
        assert_eq!(grid.rows[0][1].as_markup(), "<p>5 points</p>");
        assert_eq!(grid.rows[1][0].to_text(), "S0 & more");
        assert_eq!(grid.rows[1][1], Cell::empty());
    }

    #[test]
    fn render_then_parse_is_stable() {
        let mut grid = Grid::new(&["Sprint", "Alice"]);
        grid.push_row(vec![Cell::text("S1 <beta>"), Cell::text("5 points")]);
        let rendered = grid.render(&STYLE);

        assert_eq!(
            rendered,
            "<table data-table-width=\"1382\" data-layout=\"center\"><thead><tr><th>Sprint</th>\
             <th>Alice</th></tr></thead><tbody><tr><td>S1 &lt;beta&gt;</td><td>5 points</td>\
             </tr></tbody></table>"
        );
        assert_eq!(Grid::parse(&rendered).unwrap().render(&STYLE), rendered);
    }

    #[test]
    fn rejects_unbalanced_markup() {
        assert!(Grid::parse("<table><tr><th>A</th></tr><tr><td>1</td>").is_err());
        assert!(Grid::parse("<table><tr><th>A</th></tr><tr><td>1</tr></table>").is_err());
        assert!(Grid::parse("<table><tr><td>A</td></tr></table>").is_err());
        assert!(find_table("<p>x</p><table><tr><td>1</td></tr>", 0).is_err());
        assert!(find_table("<table><table></table>", 0).is_err());
    }

    #[test]
    fn rejects_rows_wider_than_header() {
        let result = Grid::parse("<table><tr><th>A</th></tr><tr><td>1</td><td>2</td></tr></table>");
        assert!(matches!(result, Err(Error::MalformedDocument(_))));
    }

    #[test]
    fn push_column_fills_existing_rows() {
        let mut grid = Grid::new(&["Sprint"]);
        grid.push_row(vec![Cell::text("S1")]);
        grid.push_column("Bob", "-");
        assert_eq!(grid.columns(), vec!["Sprint", "Bob"]);
        assert_eq!(grid.rows[0], vec![Cell::text("S1"), Cell::text("-")]);
    }

    #[test]
    fn normalize_trims_and_collapses_whitespace() {
        assert_eq!(normalize("  Jane \t Doe\n"), "Jane Doe");
        assert_eq!(Cell::text("Sprint  12 ").to_text(), normalize("Sprint  12 "));
    }

    #[test]
    fn finds_nth_table() {
        let body = "<table><tr><th>A</th></tr></table><p>x</p><table><tr><th>B</th></tr></table>";
        assert_eq!(find_table(body, 0).unwrap(), Some(0..34));
        let second = find_table(body, 1).unwrap().unwrap();
        assert_eq!(&body[second], "<table><tr><th>B</th></tr></table>");
        assert_eq!(find_table(body, 2).unwrap(), None);
    }

    #[test]
    fn locator_prefers_heading_over_position() {
        let locator = TableLocator::new("Ongoing Epics", 1);
        let body = "<table><tr><th>Human</th></tr></table>\
            <h2>Closed Sprints</h2><table><tr><th>Sprint</th></tr></table>\
            <h2>Ongoing Epics</h2><p>note</p><table><tr><th>Jira link</th></tr></table>";
        let grid = locator.grid(body).unwrap();
        assert_eq!(grid.columns(), vec!["Jira link"]);

        let legacy = "<table><tr><th>Sprint</th></tr></table><table><tr><th>Jira link</th></tr></table>";
        assert_eq!(locator.grid(legacy).unwrap().columns(), vec!["Jira link"]);
    }

    #[test]
    fn locator_slots() {
        let locator = TableLocator::new("Closed Sprints", 0);
        let body = "<h2>Closed Sprints</h2><h2>Ongoing Epics</h2>";
        assert_eq!(locator.slot(body), Some(Slot::Vacant(23)));

        let body = "<h2>Closed Sprints</h2><table><tr><h2>Ongoing Epics</h2>";
        assert_eq!(locator.slot(body), Some(Slot::Malformed(23..34)));

        let body = "<h2>Closed Sprints</h2><p>n</p><table><tr><h2>Ongoing Epics</h2>";
        assert_eq!(locator.slot(body), Some(Slot::Malformed(31..42)));
        assert_eq!(locator.grid(body), None);

        assert_eq!(locator.slot("<p>nothing</p>"), None);
    }
}
