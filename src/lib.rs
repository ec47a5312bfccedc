pub mod classify;
pub mod config;
pub mod document;
pub mod docx;
pub mod duplicates;
pub mod error;
pub mod frequency;
pub mod output;
pub mod package;
pub mod pipeline;
pub mod reader;
pub mod tokens;
pub mod xlsx;

// Re-export the transform core for convenient access
pub use classify::{classify_line, find_top_token, reconstruct, ClassifiedRow, RowKind};
pub use duplicates::{mark_duplicates, AnnotatedLine};
pub use frequency::{count_lines, FrequencyTable};
pub use output::{Cell, Row, Run};
pub use tokens::{TokenSet, DELIMITER};

// Re-export run entry points and their configuration
pub use config::RunConfig;
pub use error::{RunError, SinkError, SourceError};
pub use pipeline::{annotate, classify, AnnotateStats, ClassifyStats, Collaborators};
