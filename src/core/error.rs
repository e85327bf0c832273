//! Error handling for manifest-sync
//!
//! This module provides the error types and user-friendly error reporting for
//! the synchronizer. The error system is designed around two core principles:
//! 1. **Strongly-typed errors** for precise error handling in code
//! 2. **User-friendly messages** with actionable suggestions for CLI users
//!
//! # Architecture
//!
//! The error system consists of two main types:
//! - [`SyncError`] - Enumerated error types for all failure cases
//! - [`ErrorContext`] - Wrapper that adds user-friendly messages and suggestions
//!
//! # Error Categories
//!
//! - **External tool**: [`SyncError::SteamCmdNotFound`],
//!   [`SyncError::SteamCmdCommandError`], [`SyncError::InvalidAppId`]
//! - **Parsing**: [`SyncError::VdfParseError`]
//! - **Hosting API**: [`SyncError::ApiError`], [`SyncError::RateLimitUnavailable`]
//! - **Publishing**: [`SyncError::IndexPublishFailed`], [`SyncError::StoreUploadFailed`]
//! - **Setup**: [`SyncError::ConfigError`], [`SyncError::MissingCredential`]
//!
//! Common standard library and dependency errors are converted automatically:
//! [`std::io::Error`] → [`SyncError::IoError`], [`toml::de::Error`] →
//! [`SyncError::TomlError`], [`serde_json::Error`] → [`SyncError::JsonError`],
//! [`reqwest::Error`] → [`SyncError::HttpError`].
//!
//! Use [`user_friendly_error`] to convert any error into a user-friendly format
//! with contextual suggestions before displaying it at the CLI boundary.

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// The main error type for manifest-sync operations.
///
/// Each variant represents a specific failure mode and carries the details
/// needed to produce an actionable message (app ids, branch names, HTTP
/// statuses). Per-branch and per-app failures are caught and logged by the
/// pass loops; only setup failures terminate the process.
#[derive(Error, Debug)]
pub enum SyncError {
    /// SteamCMD entry point is missing and could not be installed.
    #[error("SteamCMD is not installed at {path} and bootstrap failed")]
    SteamCmdNotFound {
        /// Expected location of the steamcmd.sh entry point
        path: String,
    },

    /// A SteamCMD invocation failed to spawn or timed out.
    ///
    /// A non-zero exit with captured output is *not* reported through this
    /// variant; that case is "no usable data" and is handled by the driver.
    #[error("SteamCMD invocation failed: {reason}")]
    SteamCmdCommandError {
        /// What went wrong (spawn failure, timeout, signal)
        reason: String,
    },

    /// An application identifier was not a string of digits.
    ///
    /// Rejected before any network or tool invocation is attempted.
    #[error("invalid app id \"{app_id}\": app ids must be positive integers")]
    InvalidAppId {
        /// The offending identifier as given
        app_id: String,
    },

    /// A VDF document could not be parsed.
    #[error("invalid VDF at line {line}: {reason}")]
    VdfParseError {
        /// 1-based line within the accumulated block
        line: usize,
        /// Parser diagnostic
        reason: String,
    },

    /// The parsed tool output lacks a required field for an application.
    #[error("app {app_id} is missing required field \"{field}\"")]
    MissingAppField {
        /// Application the manifest was being generated for
        app_id: u32,
        /// Dotted path of the absent field
        field: String,
    },

    /// The hosting API returned a non-success status that is not a probe 404.
    #[error("hosting API error on {operation}: HTTP {status}")]
    ApiError {
        /// Operation being performed (e.g. "list branches")
        operation: String,
        /// HTTP status code returned
        status: u16,
        /// Response body, truncated by the client
        body: String,
    },

    /// The rate-limit endpoint itself could not be queried.
    ///
    /// Fatal for the pass: proceeding without knowledge of the remaining
    /// budget risks hard failures from the remote API.
    #[error("unable to query rate limit status: {reason}")]
    RateLimitUnavailable {
        /// Underlying transport or decode failure
        reason: String,
    },

    /// The indexing API rejected a listing payload.
    #[error("index publish for branch {branch} failed with HTTP {status}")]
    IndexPublishFailed {
        /// Branch whose listing was being published
        branch: String,
        /// Status code returned (success is exactly 200)
        status: u16,
    },

    /// An object store upload did not succeed.
    #[error("object store upload of {key} failed: {reason}")]
    StoreUploadFailed {
        /// Branch-scoped object key
        key: String,
        /// SDK error description
        reason: String,
    },

    /// Configuration file is invalid or unusable.
    #[error("configuration error: {message}")]
    ConfigError {
        /// Description of what is wrong
        message: String,
    },

    /// A required environment credential is absent.
    #[error("missing required credential: set the {variable} environment variable")]
    MissingCredential {
        /// Name of the environment variable
        variable: String,
    },

    /// IO errors from std library operations.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// TOML parsing errors from configuration loading.
    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// JSON decode errors from API responses.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Transport-level HTTP errors.
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Generic errors that don't fit other categories.
    #[error("{message}")]
    Other {
        /// Generic error message
        message: String,
    },
}

/// Error context wrapper providing user-friendly messages and suggestions.
///
/// Wraps a [`SyncError`] with an optional suggestion (an actionable step,
/// shown green) and optional details (background, shown yellow). This is how
/// errors are presented at the CLI boundary.
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: SyncError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context with no suggestion or details.
    #[must_use]
    pub const fn new(error: SyncError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add additional details explaining the error.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Display the error context to stderr with terminal colors.
    ///
    /// - Error message: red and bold
    /// - Details: yellow
    /// - Suggestion: green
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

/// Attach suggestions and details appropriate for a specific [`SyncError`].
fn create_error_context(error: SyncError) -> ErrorContext {
    match &error {
        SyncError::SteamCmdNotFound {
            ..
        } => ErrorContext::new(error)
            .with_suggestion(
                "Check network access to steamcdn-a.akamaihd.net or unpack SteamCMD manually into the steamcmd directory",
            )
            .with_details("The driver downloads and unpacks SteamCMD on first use"),
        SyncError::InvalidAppId {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("App ids are the numeric Steam application identifiers, e.g. 730"),
        SyncError::RateLimitUnavailable {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Check the API token and network connectivity, then re-run the pass")
            .with_details(
                "The pass refuses to issue quota-consuming calls without knowing the remaining budget",
            ),
        SyncError::MissingCredential {
            variable,
        } => {
            let variable = variable.clone();
            ErrorContext::new(error)
                .with_suggestion(format!("Export {variable} before running this command"))
        }
        SyncError::ConfigError {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Check the msync.toml syntax and field names"),
        _ => ErrorContext::new(error),
    }
}

/// Convert any error into a user-friendly [`ErrorContext`].
///
/// Downcasts known error types to attach targeted suggestions; everything
/// else is wrapped as-is so the full chain still reaches the user.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if error.downcast_ref::<SyncError>().is_some() {
        // Take ownership of the typed error rather than cloning it
        return match error.downcast::<SyncError>() {
            Ok(sync_error) => create_error_context(sync_error),
            Err(error) => ErrorContext::new(SyncError::Other {
                message: error.to_string(),
            }),
        };
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        match io_error.kind() {
            std::io::ErrorKind::PermissionDenied => {
                return ErrorContext::new(SyncError::Other {
                    message: format!("permission denied: {io_error}"),
                })
                .with_suggestion("Check ownership of the steamapps and steamcmd directories");
            }
            std::io::ErrorKind::NotFound => {
                return ErrorContext::new(SyncError::Other {
                    message: format!("file not found: {io_error}"),
                })
                .with_suggestion("Check that the path exists and is spelled correctly");
            }
            _ => {}
        }
    }

    if let Some(toml_error) = error.downcast_ref::<toml::de::Error>() {
        return ErrorContext::new(SyncError::ConfigError {
            message: toml_error.to_string(),
        })
        .with_suggestion("Check the TOML syntax in msync.toml: quotes, brackets, and field names");
    }

    // Preserve the anyhow chain in the generic fallback
    let mut message = error.to_string();
    let chain: Vec<String> = error.chain().skip(1).map(ToString::to_string).collect();
    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(SyncError::Other {
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_app_id_message_names_the_id() {
        let err = SyncError::InvalidAppId {
            app_id: "abc".to_string(),
        };
        assert!(err.to_string().contains("\"abc\""));
    }

    #[test]
    fn context_display_includes_suggestion_and_details() {
        let ctx = ErrorContext::new(SyncError::Other {
            message: "boom".to_string(),
        })
        .with_suggestion("try again")
        .with_details("it exploded");

        let rendered = format!("{ctx}");
        assert!(rendered.contains("boom"));
        assert!(rendered.contains("Suggestion: try again"));
        assert!(rendered.contains("Details: it exploded"));
    }

    #[test]
    fn user_friendly_error_maps_typed_errors() {
        let err = anyhow::Error::from(SyncError::MissingCredential {
            variable: "MSYNC_GITHUB_TOKEN".to_string(),
        });
        let ctx = user_friendly_error(err);
        assert!(ctx.suggestion.unwrap().contains("MSYNC_GITHUB_TOKEN"));
    }

    #[test]
    fn user_friendly_error_preserves_anyhow_chain() {
        let err = anyhow::anyhow!("inner").context("outer");
        let ctx = user_friendly_error(err);
        let message = ctx.error.to_string();
        assert!(message.contains("outer"));
        assert!(message.contains("inner"));
    }
}
