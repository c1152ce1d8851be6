//! Unified error type for the ledger, its store and its chat transport.

use poise::serenity_prelude as serenity;
use thiserror::Error;

/// Every failure the crate can produce.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration file or environment problem
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// Persistent store failure
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Chat text that is not a positive amount. Expected and ignored by callers.
    #[error("Invalid amount: {input:?}")]
    InvalidAmount {
        /// The raw text that failed to parse
        input: String,
    },

    /// No live transaction with this id
    #[error("Transaction not found: {id}")]
    TransactionNotFound {
        /// Transaction id that was looked up
        id: String,
    },

    /// Category is not part of the configured set
    #[error("Unknown category: {name}")]
    UnknownCategory {
        /// Rejected category name
        name: String,
    },

    /// Archive requested on an empty ledger
    #[error("No transactions to archive")]
    NoTransactions,

    /// The 50/50 balance is only defined for two participants
    #[error("Balance needs exactly two participants, found {}", participants.join(", "))]
    TooManyParticipants {
        /// Every author found in the ledger, sorted
        participants: Vec<String>,
    },

    /// File generation or delivery failed
    #[error("Export failed: {message}")]
    Export {
        /// What went wrong
        message: String,
    },

    /// The chat transport rejected a request
    #[error("Chat transport error: {message}")]
    Transport {
        /// What went wrong
        message: String,
    },

    /// JSON (de)serialization of archive columns
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing or malformed environment variable
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// Serenity/Poise framework error
    #[error("Serenity/Poise framework error: {0}")]
    Framework(Box<serenity::Error>),
}

impl From<serenity::Error> for Error {
    fn from(value: serenity::Error) -> Self {
        Self::Framework(Box::new(value))
    }
}

impl From<csv::Error> for Error {
    fn from(value: csv::Error) -> Self {
        Self::Export {
            message: value.to_string(),
        }
    }
}

impl Error {
    /// Text shown in the chat when a handler gives up on this error.
    #[must_use]
    pub fn user_notice(&self) -> String {
        match self {
            Self::TransactionNotFound { .. } => {
                "⚠️ That transaction no longer exists.".to_string()
            }
            Self::UnknownCategory { name } => format!("⚠️ Unknown category '{name}'."),
            Self::TooManyParticipants { participants } => format!(
                "⚠️ Balance only works for two people, but found: {}",
                participants.join(", ")
            ),
            Self::Export { .. } => {
                "⚠️ Export failed. Data is still archived in the database.".to_string()
            }
            _ => "⚠️ Something went wrong. Please try again.".to_string(),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generic_notice_hides_store_details() {
        let err = Error::Database(sea_orm::DbErr::Custom("disk I/O error".to_string()));
        let notice = err.user_notice();
        assert!(!notice.contains("disk"));
        assert!(notice.contains("Something went wrong"));
    }

    #[test]
    fn test_participants_listed_in_message() {
        let err = Error::TooManyParticipants {
            participants: vec!["alice".into(), "bob".into(), "carol".into()],
        };
        assert!(err.to_string().contains("alice, bob, carol"));
        assert!(err.user_notice().contains("carol"));
    }
}
