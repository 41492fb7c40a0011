//! Error types for the micrarium library.
//!
//! This module provides a unified error type with explicit variants for
//! transport, service, and input validation errors.

use std::fmt;
use thiserror::Error;

/// The unified error type for micrarium operations.
///
/// This error type covers all possible failure modes in the library,
/// with explicit variants to allow callers to handle specific cases.
#[derive(Debug, Error)]
pub enum Error {
    /// Network transport errors (DNS, TLS, connection, timeout).
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Service errors (rejected queries, missing rows, schema drift).
    #[error("service error: {0}")]
    Service(#[from] ServiceError),

    /// Input validation errors (invalid slide id, URL, or label).
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),
}

/// Transport-level errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Network connection failed.
    #[error("connection failed: {message}")]
    Connection { message: String },

    /// Request timed out.
    #[error("request timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// Generic HTTP error.
    #[error("HTTP error: {message}")]
    Http { message: String },

    /// Filesystem error from a local archive.
    #[error("I/O error: {message}")]
    Io { message: String },
}

/// Service-level errors returned by the hosted data or storage API.
///
/// PostgREST-style services report failures as an HTTP status plus an
/// optional machine-readable code (`42703`, `PGRST204`, ...) and a
/// human-readable message. Local archives synthesize the same shape so
/// callers can classify failures uniformly.
#[derive(Debug)]
pub struct ServiceError {
    /// HTTP status code.
    pub status: u16,
    /// Service error code (if present).
    pub code: Option<String>,
    /// Error message from the service.
    pub message: Option<String>,
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {}", self.status)?;
        if let Some(ref code) = self.code {
            write!(f, " [{}]", code)?;
        }
        if let Some(ref message) = self.message {
            write!(f, ": {}", message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ServiceError {}

/// Error-text signatures that indicate a column is absent from the
/// service schema rather than the request being otherwise malformed.
const SCHEMA_ABSENCE_SIGNATURES: &[&str] =
    &["does not exist", "unknown column", "not found", "schema cache"];

impl ServiceError {
    /// Create a new service error.
    pub fn new(status: u16, code: Option<String>, message: Option<String>) -> Self {
        Self {
            status,
            code,
            message,
        }
    }

    /// Check if this error reports a column missing from the schema.
    ///
    /// Hosted services have no single error code for this: depending on
    /// the layer that rejects the write it surfaces as an undefined-column
    /// SQL error, an unknown-column message, or a stale schema cache. The
    /// classification is a substring match over the error text, kept in
    /// one place so it can later be replaced by an explicit capability
    /// probe without touching call sites.
    pub fn is_schema_absence(&self) -> bool {
        let Some(ref message) = self.message else {
            return false;
        };
        let message = message.to_lowercase();
        SCHEMA_ABSENCE_SIGNATURES
            .iter()
            .any(|signature| message.contains(signature))
    }

    /// Check if this error reports a missing row.
    pub fn is_not_found(&self) -> bool {
        self.status == 404 || self.code.as_deref() == Some("PGRST116")
    }

    /// Check if this is an authorization error.
    pub fn is_auth_error(&self) -> bool {
        self.status == 401 || self.status == 403
    }
}

/// Input validation errors.
#[derive(Debug, Error)]
pub enum InvalidInputError {
    /// Invalid slide id format.
    #[error("invalid slide id '{value}': {reason}")]
    SlideId { value: String, reason: String },

    /// Invalid store URL format.
    #[error("invalid store URL '{value}': {reason}")]
    StoreUrl { value: String, reason: String },

    /// Label outside a fixed vocabulary.
    #[error("invalid {vocabulary} label '{value}': {reason}")]
    Label {
        vocabulary: &'static str,
        value: String,
        reason: String,
    },

    /// Generic invalid input.
    #[error("invalid input: {message}")]
    Other { message: String },
}
