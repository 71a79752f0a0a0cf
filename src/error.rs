//! Unified error types for the intent signer
//!
//! Module errors (`AbiError`, `Eip712Error`, `SignatureError`, `SigningError`)
//! stay precise inside their modules; at the crate boundary they all collapse into
//! [`IntentError`], categorized by [`ErrorCode`].

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::abi::AbiError;
use crate::eip712::Eip712Error;
use crate::signature::SignatureError;
use crate::signing::SigningError;
use crate::utils::crypto::HexError;

/// Main error type for all signer operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentError {
    pub code: ErrorCode,
    pub message: String,
    pub details: Option<String>,
}

impl IntentError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    // Convenience constructors
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Validation, msg)
    }

    pub fn encoding(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Encoding, msg)
    }

    pub fn unsupported_type(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::UnsupportedType, msg)
    }

    pub fn signature(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Signature, msg)
    }

    pub fn external_call(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ExternalCall, msg)
    }
}

impl fmt::Display for IntentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)?;
        if let Some(ref details) = self.details {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

impl std::error::Error for IntentError {}

/// Error categories surfaced to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Malformed hex, wrong byte length, unresolved type, arity mismatch
    Validation,
    /// Numeric value outside the declared type's range
    Encoding,
    /// ABI type name not recognized
    UnsupportedType,
    /// Malformed signature bytes or failed recovery
    Signature,
    /// Signer rejection or collaborator network failure
    ExternalCall,
}

/// Result type alias for signer operations
pub type IntentResult<T> = Result<T, IntentError>;

// Conversions from module and common error types

impl From<AbiError> for IntentError {
    fn from(e: AbiError) -> Self {
        IntentError::new(e.code(), e.to_string())
    }
}

impl From<Eip712Error> for IntentError {
    fn from(e: Eip712Error) -> Self {
        IntentError::new(e.code(), e.to_string())
    }
}

impl From<SignatureError> for IntentError {
    fn from(e: SignatureError) -> Self {
        IntentError::new(e.code(), e.to_string())
    }
}

impl From<SigningError> for IntentError {
    fn from(e: SigningError) -> Self {
        IntentError::new(e.code(), e.to_string())
    }
}

impl From<HexError> for IntentError {
    fn from(e: HexError) -> Self {
        IntentError::new(ErrorCode::Validation, e.to_string())
    }
}

impl From<serde_json::Error> for IntentError {
    fn from(e: serde_json::Error) -> Self {
        IntentError::new(ErrorCode::Validation, format!("invalid JSON: {}", e))
    }
}

impl From<reqwest::Error> for IntentError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            IntentError::external_call("Request timed out")
        } else if e.is_connect() {
            IntentError::external_call("Connection failed")
        } else {
            IntentError::external_call(e.to_string())
        }
    }
}
