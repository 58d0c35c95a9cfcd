use thiserror::Error;

/// Shared error vocabulary for the parsing, reconstruction, and diffing
/// crates built on top of this core.
#[derive(Debug, Error)]
pub enum UscError {
    #[error("section {section} not found in the {year} source")]
    SectionNotFound { section: String, year: i32 },

    #[error("no source available for year {year}")]
    SourceUnavailable { year: i32 },

    #[error("failed to parse section {section} ({year}): {reason}")]
    ParseFailure {
        section: String,
        year: i32,
        reason: String,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience `Result` alias used across the workspace.
pub type Result<T> = std::result::Result<T, UscError>;
