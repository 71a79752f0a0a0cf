//! External Signing Boundary
//!
//! The engine only produces digests. Turning a digest into a signature is the
//! job of an external key holder (a wallet), modeled here as a request/response
//! capability:
//! 1. Build a [`SigningRequest`] from typed data (digest computed up front)
//! 2. Run the pre-flight checks against a [`ContractProbe`]
//! 3. Submit once to a [`TypedDataSigner`] and check the returned signature
//!
//! Submission is single-shot: a prepared request is consumed by the call and
//! nothing is retried.

pub mod signer;
pub mod probe;
pub mod session;

pub use signer::*;
pub use probe::*;
pub use session::*;

use crate::eip712::Eip712Error;
use crate::error::ErrorCode;
use crate::signature::SignatureError;

/// Signing boundary errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SigningError {
    #[error("signing request rejected: {0}")]
    Rejected(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("pre-flight check failed: {0}")]
    Preflight(String),

    #[error("digest does not match the typed data")]
    DigestMismatch,

    #[error("signature recovers to {recovered}, expected {expected}")]
    SignerMismatch { expected: String, recovered: String },

    #[error(transparent)]
    Eip712(#[from] Eip712Error),

    #[error(transparent)]
    Signature(#[from] SignatureError),
}

impl SigningError {
    /// Category reported at the crate boundary
    pub fn code(&self) -> ErrorCode {
        match self {
            SigningError::Rejected(_) | SigningError::Network(_) | SigningError::Rpc(_) => {
                ErrorCode::ExternalCall
            }
            SigningError::Preflight(_) | SigningError::DigestMismatch => ErrorCode::Validation,
            SigningError::SignerMismatch { .. } => ErrorCode::Signature,
            SigningError::Eip712(e) => e.code(),
            SigningError::Signature(e) => e.code(),
        }
    }
}

impl From<reqwest::Error> for SigningError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            SigningError::Network("request timed out".to_string())
        } else if e.is_connect() {
            SigningError::Network("connection failed".to_string())
        } else {
            SigningError::Network(e.to_string())
        }
    }
}
