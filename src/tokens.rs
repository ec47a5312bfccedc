// WHY: comma-delimited token view of a line, order and duplicates preserved

/// Fixed delimiter used both to split lines and to rejoin tokens
pub const DELIMITER: char = ',';

/// Ordered tokens of one line, exactly as split
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSet<'a> {
    tokens: Vec<&'a str>,
}

impl<'a> TokenSet<'a> {
    /// Split a line on the delimiter. An empty line yields one empty token.
    pub fn split(line: &'a str) -> Self {
        Self { tokens: line.split(DELIMITER).collect() }
    }

    pub fn tokens(&self) -> &[&'a str] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Never true for a split line; kept for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Tokens with surrounding whitespace removed, same order
    pub fn trimmed(&self) -> Vec<&'a str> {
        self.tokens.iter().map(|t| t.trim()).collect()
    }
}

/// Stable sort comparing the uppercase form of each value; original casing kept
pub fn sort_case_insensitive(values: &mut [&str]) {
    values.sort_by_cached_key(|value| value.to_uppercase());
}

/// Join values with the delimiter
pub fn join(values: &[&str]) -> String {
    let mut separator = [0u8; 4];
    values.join(&*DELIMITER.encode_utf8(&mut separator))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_preserves_order_and_duplicates() {
        let set = TokenSet::split("b, a,b ,c");
        assert_eq!(set.tokens(), &["b", " a", "b ", "c"]);
        assert_eq!(set.trimmed(), vec!["b", "a", "b", "c"]);
    }

    #[test]
    fn test_empty_line_is_one_empty_token() {
        let set = TokenSet::split("");
        assert_eq!(set.len(), 1);
        assert_eq!(set.tokens(), &[""]);
        assert!(!set.is_empty());
    }

    #[test]
    fn test_trailing_delimiter_yields_empty_token() {
        assert_eq!(TokenSet::split("a,").tokens(), &["a", ""]);
    }

    #[test]
    fn test_case_insensitive_sort_is_stable() {
        let mut values = vec!["b", "B", "a", "A", "c"];
        sort_case_insensitive(&mut values);
        assert_eq!(values, vec!["a", "A", "b", "B", "c"]);
    }

    #[test]
    fn test_sort_uses_uppercase_ordering() {
        // '_' sits between uppercase and lowercase letters in code point order
        let mut values = vec!["_x", "a"];
        sort_case_insensitive(&mut values);
        assert_eq!(values, vec!["a", "_x"]);
    }

    #[test]
    fn test_join_round_trips_split() {
        let line = "q, r ,,s";
        assert_eq!(join(TokenSet::split(line).tokens()), line);
    }
}
