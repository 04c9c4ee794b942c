use thiserror::Error;

/// Result type for chunker operations
pub type Result<T> = std::result::Result<T, ChunkerError>;

/// Errors that prevent a chunker from being built at all.
///
/// Per-file problems (unsupported extension, unreadable file, parse failure) are not
/// errors: they surface as [`crate::ExtractionWarning`]s next to an empty chunk list.
#[derive(Error, Debug)]
pub enum ChunkerError {
    /// The grammar could not be attached to a parser
    #[error("Failed to load {language} grammar: {message}")]
    GrammarLoad { language: String, message: String },

    /// One of the extraction queries failed to compile for a grammar
    #[error("Failed to compile {query} query for {language}: {message}")]
    QueryCompile {
        language: String,
        query: String,
        message: String,
    },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ChunkerError {
    /// Create a grammar load error
    pub fn grammar_load(language: impl Into<String>, message: impl Into<String>) -> Self {
        Self::GrammarLoad {
            language: language.into(),
            message: message.into(),
        }
    }

    /// Create a query compile error
    pub fn query_compile(
        language: impl Into<String>,
        query: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::QueryCompile {
            language: language.into(),
            query: query.into(),
            message: message.into(),
        }
    }

    /// Create an invalid config error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
