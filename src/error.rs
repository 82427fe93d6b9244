//! Custom error types for chirp.
//!
//! The engine distinguishes three failure classes: validation errors
//! (rejected before touching storage), not-found errors, and storage
//! failures. Duplicate-key conflicts are not errors at all; mutating
//! operations report them as an [`Outcome`] on the `Ok` side.

use std::path::PathBuf;
use thiserror::Error;

/// Primary error type for chirp operations.
#[derive(Error, Debug)]
pub enum ChirpError {
    // =========================================================================
    // Validation Errors (no storage access attempted)
    // =========================================================================
    /// Tweet or reply text was empty after trimming.
    #[error("Text cannot be empty")]
    EmptyText,

    /// Keyword parsing produced no usable tokens.
    #[error("No keywords provided")]
    NoKeywords,

    /// A hashtag term appeared more than once in a single composition.
    #[error("Duplicate hashtag in tweet: #{term}")]
    DuplicateHashtag { term: String },

    /// A user attempted to follow themselves.
    #[error("You cannot follow yourself")]
    SelfFollow,

    /// Favorite list name was empty after trimming.
    #[error("List name cannot be empty")]
    EmptyListName,

    /// Email did not contain '@' and a dotted domain.
    #[error("Invalid email address: '{email}'")]
    InvalidEmail { email: String },

    /// Phone number contained non-digit characters.
    #[error("Invalid phone number: '{phone}' (digits only)")]
    InvalidPhone { phone: String },

    // =========================================================================
    // Not Found
    // =========================================================================
    /// Referenced tweet id does not exist.
    #[error("Tweet with ID {tid} not found")]
    TweetNotFound { tid: i64 },

    /// Referenced user id does not exist.
    #[error("User with ID {usr} not found")]
    UserNotFound { usr: i64 },

    /// Referenced favorite list does not exist for this owner.
    #[error("Favorite list '{lname}' not found")]
    ListNotFound { lname: String },

    // =========================================================================
    // Storage Errors
    // =========================================================================
    /// Database schema version mismatch.
    #[error("Database schema version mismatch: expected {expected}, found {found}")]
    SchemaMismatch { expected: i32, found: i32 },

    /// Database operation failed.
    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    // =========================================================================
    // IO / Configuration Errors
    // =========================================================================
    /// File read/write error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Configuration file parsing error.
    #[error("Invalid configuration in '{path}': {reason}")]
    ConfigError { path: PathBuf, reason: String },
}

/// Result type alias for chirp operations.
pub type Result<T> = std::result::Result<T, ChirpError>;

impl ChirpError {
    /// Create a duplicate hashtag error.
    pub fn duplicate_hashtag(term: impl Into<String>) -> Self {
        Self::DuplicateHashtag { term: term.into() }
    }

    /// Create a tweet not found error.
    #[must_use]
    pub const fn tweet_not_found(tid: i64) -> Self {
        Self::TweetNotFound { tid }
    }

    /// Create a user not found error.
    #[must_use]
    pub const fn user_not_found(usr: i64) -> Self {
        Self::UserNotFound { usr }
    }

    /// Create a list not found error.
    pub fn list_not_found(lname: impl Into<String>) -> Self {
        Self::ListNotFound {
            lname: lname.into(),
        }
    }

    /// True if this error is a validation failure the caller should fix,
    /// as opposed to a storage-side problem.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::EmptyText
                | Self::NoKeywords
                | Self::DuplicateHashtag { .. }
                | Self::SelfFollow
                | Self::EmptyListName
                | Self::InvalidEmail { .. }
                | Self::InvalidPhone { .. }
        )
    }
}

/// Result of a mutating operation guarded by a natural-key uniqueness rule.
///
/// Duplicate inserts are informational no-ops, never hard failures: the
/// second retweet of the same tweet, the second follow of the same user,
/// and the second add of a tweet to the same list all leave storage
/// untouched and report `Duplicate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A new row was written.
    Created,
    /// The natural key already existed; nothing was written.
    Duplicate,
}

impl Outcome {
    /// True if the operation wrote a new row.
    #[must_use]
    pub const fn created(self) -> bool {
        matches!(self, Self::Created)
    }
}

/// Result of a signup attempt.
///
/// Duplicate email/phone are conflict no-ops in the same spirit as
/// [`Outcome::Duplicate`], but the caller needs to know which field
/// collided to report it usefully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignupOutcome {
    /// Account created with the given user id.
    Created(i64),
    /// Another account already uses this email.
    DuplicateEmail,
    /// Another account already uses this phone number.
    DuplicatePhone,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_classification() {
        assert!(ChirpError::EmptyText.is_validation());
        assert!(ChirpError::SelfFollow.is_validation());
        assert!(ChirpError::duplicate_hashtag("rust").is_validation());
        assert!(!ChirpError::tweet_not_found(3).is_validation());
    }

    #[test]
    fn error_messages() {
        assert_eq!(
            ChirpError::duplicate_hashtag("go").to_string(),
            "Duplicate hashtag in tweet: #go"
        );
        assert_eq!(
            ChirpError::tweet_not_found(42).to_string(),
            "Tweet with ID 42 not found"
        );
    }

    #[test]
    fn outcome_created() {
        assert!(Outcome::Created.created());
        assert!(!Outcome::Duplicate.created());
    }
}
