/// PaperTable error types
///
/// Errors only arise at the boundaries: loading rows, parsing configuration,
/// or naming a field/column by string. The recomputation pipeline itself never
/// fails; malformed values are carried as "unknown".
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A field name outside the closed vocabulary
    #[error("unknown field '{0}'")]
    UnknownField(String),

    /// Two rows share an identifier
    #[error("duplicate row id '{0}'")]
    DuplicateRow(String),

    #[error("unknown sort column '{0}'")]
    UnknownSortColumn(String),

    /// Row markup did not follow the row/detail pairing convention
    #[error("malformed row markup: {0}")]
    Markup(String),

    /// A row reload or detail fetch failed
    #[error("fetch failed: {0}")]
    Fetch(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            Error::UnknownField("features_lasers".to_string()).to_string(),
            "unknown field 'features_lasers'"
        );
        assert_eq!(
            Error::Fetch("Paper not found".to_string()).to_string(),
            "fetch failed: Paper not found"
        );
    }

    #[test]
    fn test_json_error_conversion() {
        let err: Error = serde_json::from_str::<Vec<u32>>("[1,").unwrap_err().into();
        assert!(matches!(err, Error::Json(_)));
    }
}
