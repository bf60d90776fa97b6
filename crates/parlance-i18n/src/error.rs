//! Error types for internationalization operations

use parlance_common::ParlanceError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during internationalization operations
#[derive(Error, Debug)]
pub enum I18nError {
    /// Failed to parse a language identifier
    #[error("Invalid language identifier: {0}")]
    InvalidLanguage(String),

    /// Failed to read a locale file
    #[error("Failed to load locale file {}: {source}", path.display())]
    LocaleLoad {
        /// File that could not be read
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// A locale file is not valid locale JSON
    #[error("Failed to parse locale file {}: {reason}", path.display())]
    LocaleParse {
        /// File that could not be parsed
        path: PathBuf,
        /// What was wrong with it
        reason: String,
    },

    /// A message template is malformed
    #[error("Invalid template '{id}' for language {language}: {reason}")]
    InvalidTemplate {
        /// Language of the catalog entry
        language: String,
        /// Message identifier
        id: String,
        /// What was wrong with it
        reason: String,
    },

    /// The locale directory matches neither the flat nor the nested layout
    #[error("Unable to determine locale layout under {}", path.display())]
    UnsupportedLayout {
        /// Locale root that was inspected
        path: PathBuf,
    },

    /// Message not found for a language
    #[error("Message not found: {id} ({language})")]
    MessageNotFound {
        /// Language that was searched
        language: String,
        /// Message identifier
        id: String,
    },

    /// File watcher failure
    #[error("Locale watcher error: {0}")]
    Watcher(#[from] notify::Error),
}

/// Result type for i18n operations
pub type I18nResult<T> = Result<T, I18nError>;

impl From<I18nError> for ParlanceError {
    fn from(err: I18nError) -> Self {
        let locale = match &err {
            I18nError::InvalidLanguage(language)
            | I18nError::InvalidTemplate { language, .. }
            | I18nError::MessageNotFound { language, .. } => Some(language.clone()),
            _ => None,
        };
        Self::localization_with_source(err.to_string(), locale, err)
    }
}
