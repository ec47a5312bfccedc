// WHY: adjacency marking as a pure function of (previous, current) pairs
// No state survives between pairs, so three equal lines in a row mark both followers

use serde::Serialize;

/// One source line with its underline decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnnotatedLine {
    pub text: String,
    pub underline: bool,
}

impl AnnotatedLine {
    pub fn plain(text: impl Into<String>) -> Self {
        Self { text: text.into(), underline: false }
    }

    pub fn underlined(text: impl Into<String>) -> Self {
        Self { text: text.into(), underline: true }
    }
}

/// Underline decision for a line given its predecessor (exact equality)
pub fn is_repeat(previous: Option<&str>, current: &str) -> bool {
    previous == Some(current)
}

/// Mark every line that exactly repeats the line before it
pub fn mark_duplicates<S: AsRef<str>>(lines: &[S]) -> Vec<AnnotatedLine> {
    let previous = std::iter::once(None).chain(lines.iter().map(|l| Some(l.as_ref())));

    previous
        .zip(lines.iter().map(AsRef::as_ref))
        .map(|(previous, current)| AnnotatedLine {
            text: current.to_string(),
            underline: is_repeat(previous, current),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags(lines: &[&str]) -> Vec<bool> {
        mark_duplicates(lines).iter().map(|l| l.underline).collect()
    }

    #[test]
    fn test_run_of_three_marks_each_follower() {
        assert_eq!(flags(&["A", "A", "A", "B"]), vec![false, true, true, false]);
    }

    #[test]
    fn test_first_line_never_marked() {
        let marked = mark_duplicates(&["x"]);
        assert_eq!(marked, vec![AnnotatedLine::plain("x")]);
        assert!(mark_duplicates::<&str>(&[]).is_empty());
    }

    #[test]
    fn test_only_immediate_predecessor_counts() {
        assert_eq!(flags(&["A", "B", "A", "B", "B"]), vec![false, false, false, false, true]);
    }

    #[test]
    fn test_exact_equality_only() {
        assert_eq!(flags(&["a", "A", "a ", "a ", ""]), vec![false, false, false, true, false]);
    }

    #[test]
    fn test_empty_lines_repeat_too() {
        assert_eq!(flags(&["", "", "x"]), vec![false, true, false]);
    }

    #[test]
    fn test_preserves_length_and_text() {
        let lines = vec!["one".to_string(), "two".to_string(), "two".to_string()];
        let marked = mark_duplicates(&lines);
        assert_eq!(marked.len(), lines.len());
        assert_eq!(marked[2], AnnotatedLine::underlined("two"));
        for (line, annotated) in lines.iter().zip(&marked) {
            assert_eq!(line, &annotated.text);
        }
    }
}
