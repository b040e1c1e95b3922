//! Error type shared by every FICCT crate
//!
//! Variants that can originate in more than one place carry an
//! [`ErrorContext`] so a log line can be traced back to where it failed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

pub type FicctResult<T> = Result<T, FicctError>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Random id, printed with the log line
    pub error_id: String,
    pub timestamp: DateTime<Utc>,
    /// Subsystem that raised the error, e.g. `session_store`
    pub component: String,
    pub operation: Option<String>,
    pub metadata: BTreeMap<String, String>,
    /// Hints shown to the user next to the message
    pub recovery_suggestions: Vec<String>,
}

impl ErrorContext {
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            error_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            component: component.into(),
            operation: None,
            metadata: BTreeMap::new(),
            recovery_suggestions: Vec::new(),
        }
    }

    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.metadata.insert(key.into(), value.to_string());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.recovery_suggestions.push(suggestion.into());
        self
    }
}

/// Main error type for the FICCT client
#[derive(Error, Debug)]
pub enum FicctError {
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("Session storage error: {message}")]
    Storage {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("Authentication error: {message}")]
    Authentication {
        message: String,
        context: ErrorContext,
    },

    #[error("Access denied: {message}")]
    Forbidden {
        message: String,
        context: ErrorContext,
    },

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
        context: ErrorContext,
    },

    #[error("Server error: {message}")]
    Server {
        message: String,
        status: Option<u16>,
        context: ErrorContext,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },
}

impl FicctError {
    /// Get the error context
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            FicctError::Config { context, .. } => Some(context),
            FicctError::Storage { context, .. } => Some(context),
            FicctError::Network { context, .. } => Some(context),
            FicctError::Authentication { context, .. } => Some(context),
            FicctError::Forbidden { context, .. } => Some(context),
            FicctError::Validation { context, .. } => Some(context),
            FicctError::Server { context, .. } => Some(context),
            FicctError::Internal { context, .. } => Some(context),
            FicctError::Io(_) | FicctError::Serialization(_) => None,
        }
    }

    /// Check if the caller may reasonably try the same operation again
    pub fn is_recoverable(&self) -> bool {
        match self {
            FicctError::Network { .. } => true,
            FicctError::Server { status, .. } => status.map(|s| s >= 500).unwrap_or(true),
            _ => false,
        }
    }

    /// Emit one event for this error
    ///
    /// Failures caused by the user or the network are warnings; anything
    /// pointing at a local defect is an error.
    pub fn log(&self) {
        let context = self.context();
        let error_id = context.map(|c| c.error_id.as_str()).unwrap_or("-");
        let component = context.map(|c| c.component.as_str()).unwrap_or("-");
        let operation = context.and_then(|c| c.operation.as_deref()).unwrap_or("-");

        match self {
            FicctError::Network { .. }
            | FicctError::Authentication { .. }
            | FicctError::Forbidden { .. }
            | FicctError::Validation { .. } => {
                tracing::warn!(error_id, component, operation, error = %self, "request failed");
            }
            _ => {
                tracing::error!(error_id, component, operation, error = %self, "unexpected failure");
            }
        }
    }
}

/// `Storage` error, optionally wrapping the underlying failure
#[macro_export]
macro_rules! storage_error {
    ($msg:expr, $component:expr) => {
        $crate::FicctError::Storage {
            message: $msg.to_string(),
            source: None,
            context: $crate::ErrorContext::new($component),
        }
    };
    ($msg:expr, $component:expr, $source:expr) => {
        $crate::FicctError::Storage {
            message: $msg.to_string(),
            source: Some(Box::new($source)),
            context: $crate::ErrorContext::new($component),
        }
    };
}

/// `Config` error with the usual hints about the config file
#[macro_export]
macro_rules! config_error {
    ($msg:expr, $component:expr) => {
        $crate::FicctError::Config {
            message: $msg.to_string(),
            source: None,
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Check your configuration file")
                .with_suggestion("Run 'ficct config --init' to create default config"),
        }
    };
}

#[macro_export]
macro_rules! validation_error {
    ($msg:expr, $field:expr, $component:expr) => {
        $crate::FicctError::Validation {
            message: $msg.to_string(),
            field: Some($field.to_string()),
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Check the field value and format"),
        }
    };
}

/// No usable session
#[macro_export]
macro_rules! auth_error {
    ($msg:expr, $component:expr) => {
        $crate::FicctError::Authentication {
            message: $msg.to_string(),
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Run 'ficct login' to start a new session"),
        }
    };
}
