// Source lines and frequency tables with known expected outputs
// WHY: deterministic input/output pairs keep pipeline assertions readable

#![allow(dead_code)]

/// Lines with an adjacent run of three and a non-adjacent repeat
pub const REPEATED_LINES: &[&str] = &["alpha", "alpha", "alpha", "beta", "alpha", "gamma", "gamma"];

/// Underline flags expected for REPEATED_LINES
pub const REPEATED_UNDERLINES: &[bool] = &[false, true, true, false, false, false, true];

/// Frequency report expected for REPEATED_LINES, descending by count
pub const REPEATED_REPORT: &[(&str, &str)] = &[("alpha", "4"), ("gamma", "2"), ("beta", "1")];

/// Comma-separated source lines for classification
pub const CLASSIFY_LINES: &[&str] = &["B,a,C", "x", "b,A", "q,r"];

/// Frequency table used against CLASSIFY_LINES
pub const CLASSIFY_TABLE: &[(&str, f64)] = &[("a", 3.0), ("x", 2.0), ("q", 1.0), ("r", 1.0)];

/// Expected cell text per row for CLASSIFY_LINES against CLASSIFY_TABLE
pub const CLASSIFY_EXPECTED: &[&[&str]] = &[
    &["a,B,C", "a"],
    &["x", "x"],
    &["A,b"],
    &["q,r", "q"],
];
