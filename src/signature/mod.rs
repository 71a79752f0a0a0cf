//! ECDSA Signature Codec
//!
//! Splits and joins secp256k1 signatures and recovers the signing address from
//! a 32-byte digest.
//!
//! - 65-byte `r ‖ s ‖ v` (v as 0/1, 27/28 or an EIP-155 value)
//! - 64-byte EIP-2098 compact form (`yParity` in the top bit of `s`)
//!
//! Output is always 65 bytes with `v` in {27, 28}.

pub mod codec;
pub mod recover;

pub use codec::*;
pub use recover::*;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ErrorCode;
use crate::utils::crypto::{decode_hex, to_hex_prefixed, HexError};

/// Signature module errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    #[error("signature must be 64 or 65 bytes, got {0}")]
    InvalidLength(usize),

    #[error("digest must be 32 bytes, got {0}")]
    InvalidDigest(usize),

    #[error("invalid recovery id: v = {0}")]
    InvalidRecoveryId(u8),

    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error(transparent)]
    Hex(#[from] HexError),
}

impl SignatureError {
    /// Category reported at the crate boundary
    pub fn code(&self) -> ErrorCode {
        match self {
            SignatureError::InvalidLength(_)
            | SignatureError::InvalidDigest(_)
            | SignatureError::InvalidPrivateKey(_)
            | SignatureError::Hex(_) => ErrorCode::Validation,
            SignatureError::InvalidRecoveryId(_) | SignatureError::InvalidSignature(_) => {
                ErrorCode::Signature
            }
        }
    }
}

/// A 32-byte signing digest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Digest(pub [u8; 32]);

impl Digest {
    /// Accepts exactly 32 bytes
    pub fn from_slice(bytes: &[u8]) -> Result<Self, SignatureError> {
        bytes
            .try_into()
            .map(Digest)
            .map_err(|_| SignatureError::InvalidDigest(bytes.len()))
    }

    pub fn from_hex(s: &str) -> Result<Self, SignatureError> {
        Self::from_slice(&decode_hex(s)?)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl From<[u8; 32]> for Digest {
    fn from(bytes: [u8; 32]) -> Self {
        Digest(bytes)
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&to_hex_prefixed(&self.0))
    }
}

impl FromStr for Digest {
    type Err = SignatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl TryFrom<String> for Digest {
    type Error = SignatureError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_hex(&s)
    }
}

impl From<Digest> for String {
    fn from(digest: Digest) -> Self {
        digest.to_string()
    }
}
