// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for the capability bridge.

use thiserror::Error;

/// Top-level error type for all bridge operations.
#[derive(Debug, Error)]
pub enum BridgeError {
    // -- Inbound calls from creative content --
    #[error("{operation}: {message}")]
    Validation { operation: String, message: String },

    #[error("unknown bridge channel: {0}")]
    UnknownChannel(String),

    #[error("unknown capability event: {0}")]
    UnknownEvent(String),

    #[error("operation {operation} is not exposed on channel {channel}")]
    OperationNotAllowed { channel: String, operation: String },

    #[error("bridge channel already registered: {0}")]
    DuplicateChannel(String),

    // -- Providers and synchronisation --
    #[error("capability source failed: {0}")]
    Source(String),

    #[error("teardown of provider {provider} failed: {reason}")]
    ProviderTeardown { provider: String, reason: String },

    #[error("state sync out of order: {0}")]
    SyncOrder(String),

    #[error("content surface rejected script: {0}")]
    Surface(String),

    // -- Host actions --
    #[error("host action failed: {0}")]
    Host(String),

    #[error("calendar error: {0}")]
    Calendar(String),

    // -- Configuration / persistence --
    #[error("configuration error: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("feature not available on this platform")]
    PlatformUnavailable,
}

impl BridgeError {
    /// Shorthand for a validation failure on an inbound operation.
    pub fn validation(operation: &str, message: impl Into<String>) -> Self {
        Self::Validation {
            operation: operation.to_string(),
            message: message.into(),
        }
    }

    /// Whether the error is swallowed silently instead of being reported to
    /// the creative. Creatives probe for channels and events speculatively.
    pub fn is_silent(&self) -> bool {
        matches!(self, Self::UnknownChannel(_) | Self::UnknownEvent(_))
    }

    /// The `(operation, message)` pair reported back through `fireError`.
    pub fn content_signal(&self, fallback_operation: &str) -> (String, String) {
        match self {
            Self::Validation { operation, message } => (operation.clone(), message.clone()),
            other => (fallback_operation.to_string(), other.to_string()),
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, BridgeError>;
