// WHY: per-line token classification and row shaping, pure functions of (tokens, table)

use crate::frequency::FrequencyTable;
use crate::output::{Cell, Row, Run};
use crate::tokens::{self, TokenSet, DELIMITER};

/// Shape chosen for one line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifiedRow {
    /// No token is in the table: original tokens sorted and rejoined
    SortedLine(String),
    /// The line's only token is the dominant one
    SingleToken(String),
    /// Dominant token plus the remaining trimmed tokens, sorted
    TopTokenRow { top: String, remaining: Vec<String> },
}

impl ClassifiedRow {
    /// Cells to emit for this shape
    pub fn to_row(&self) -> Row {
        match self {
            ClassifiedRow::SortedLine(line) => Row::single(Cell::Text(line.clone())),
            ClassifiedRow::SingleToken(token) => {
                Row::pair(Cell::Emphasized(token.clone()), Cell::Text(token.clone()))
            }
            ClassifiedRow::TopTokenRow { top, remaining } => {
                let rest: Vec<&str> = remaining.iter().map(String::as_str).collect();
                let primary = Cell::Rich(vec![
                    Run::emphasized(top.clone()),
                    Run::plain(DELIMITER.to_string()),
                    Run::plain(tokens::join(&rest)),
                ]);
                Row::pair(primary, Cell::Text(top.clone()))
            }
        }
    }

    pub fn kind(&self) -> RowKind {
        match self {
            ClassifiedRow::SortedLine(_) => RowKind::SortedLine,
            ClassifiedRow::SingleToken(_) => RowKind::SingleToken,
            ClassifiedRow::TopTokenRow { .. } => RowKind::TopTokenRow,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    SortedLine,
    SingleToken,
    TopTokenRow,
}

/// Find the dominant token: the first trimmed token whose count is strictly
/// greater than every count seen before it. Tokens missing from the table are
/// ignored; a count of zero never wins.
pub fn find_top_token<'a>(tokens: &[&'a str], table: &FrequencyTable) -> Option<&'a str> {
    let mut top = None;
    let mut top_count = 0u64;

    for &token in tokens {
        let clean = token.trim();
        if let Some(count) = table.get(clean) {
            if count > top_count {
                top = Some(clean);
                top_count = count;
            }
        }
    }

    top
}

/// Reshape a line around its dominant token
pub fn reconstruct(set: &TokenSet<'_>, top: Option<&str>) -> ClassifiedRow {
    let top = match top {
        Some(top) => top,
        None => {
            let mut sorted = set.tokens().to_vec();
            tokens::sort_case_insensitive(&mut sorted);
            return ClassifiedRow::SortedLine(tokens::join(&sorted));
        }
    };

    if set.len() == 1 {
        return ClassifiedRow::SingleToken(top.to_string());
    }

    let mut remaining = set.trimmed();
    if let Some(position) = remaining.iter().position(|t| *t == top) {
        remaining.remove(position);
    }
    tokens::sort_case_insensitive(&mut remaining);

    ClassifiedRow::TopTokenRow {
        top: top.to_string(),
        remaining: remaining.into_iter().map(str::to_string).collect(),
    }
}

/// Split, classify and reshape one line
pub fn classify_line(line: &str, table: &FrequencyTable) -> ClassifiedRow {
    let set = TokenSet::split(line);
    let top = find_top_token(set.tokens(), table);
    reconstruct(&set, top)
}
