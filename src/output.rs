// WHY: sink-neutral description of emitted rows so the core never touches a writer

use serde::Serialize;

/// A formatted text fragment inside a rich cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Run {
    pub text: String,
    pub emphasis: bool,
}

impl Run {
    pub fn plain(text: impl Into<String>) -> Self {
        Self { text: text.into(), emphasis: false }
    }

    pub fn emphasized(text: impl Into<String>) -> Self {
        Self { text: text.into(), emphasis: true }
    }
}

/// One output cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Cell {
    Text(String),
    Emphasized(String),
    Rich(Vec<Run>),
    Count(u64),
}

impl Cell {
    /// Cell content with formatting dropped
    pub fn plain_text(&self) -> String {
        match self {
            Cell::Text(text) | Cell::Emphasized(text) => text.clone(),
            Cell::Rich(runs) => runs.iter().map(|r| r.text.as_str()).collect(),
            Cell::Count(count) => count.to_string(),
        }
    }
}

/// Cells of one output row, column 0 first
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Row {
    pub cells: Vec<Cell>,
}

impl Row {
    pub fn single(cell: Cell) -> Self {
        Self { cells: vec![cell] }
    }

    pub fn pair(primary: Cell, secondary: Cell) -> Self {
        Self { cells: vec![primary, secondary] }
    }
}

/// Two plain columns per entry: key, count
pub fn frequency_report_rows<'a>(entries: impl IntoIterator<Item = (&'a str, u64)>) -> Vec<Row> {
    entries
        .into_iter()
        .map(|(key, count)| Row::pair(Cell::Text(key.to_string()), Cell::Count(count)))
        .collect()
}
