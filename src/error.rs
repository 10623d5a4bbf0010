use thiserror::Error;

/// Reasons a single `extract` item can fail.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtractError {
    #[error("Invalid YouTube video ID '{0}'. Must be 11 characters long.")]
    InvalidVideoId(String),

    #[error("Language code must not be empty.")]
    EmptyLanguage,

    #[error("No transcript found for language: {language}")]
    NoTranscript { language: String },
}
