use thiserror::Error;

/// Failures while loading or aggregating the match dataset.
///
/// Missing columns are not errors: queries that need them are skipped.
#[derive(Debug, Error)]
pub enum StatsError {
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A numeric column holds a value that is not a non-negative integer.
    /// `row` is 1-based and excludes the header line.
    #[error("column '{column}' row {row}: '{value}' is not a non-negative integer")]
    InvalidNumber {
        column: String,
        row: usize,
        value: String,
    },
}
