//! Signature splitting and joining

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::SignatureError;
use crate::utils::crypto::{decode_hex, to_hex_prefixed};

/// An ECDSA signature with Ethereum-style `v` (27 or 28)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Signature {
    pub r: [u8; 32],
    pub s: [u8; 32],
    pub v: u8,
}

impl Signature {
    /// Build from components; `v` is normalized like the last byte of a 65-byte signature
    pub fn new(r: [u8; 32], s: [u8; 32], v: u8) -> Result<Self, SignatureError> {
        Ok(Self {
            r,
            s,
            v: normalize_v(v)?,
        })
    }

    /// Split a 65-byte or 64-byte (EIP-2098) signature into `r`, `s`, `v`
    pub fn split(bytes: &[u8]) -> Result<Self, SignatureError> {
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];

        match bytes.len() {
            65 => {
                r.copy_from_slice(&bytes[..32]);
                s.copy_from_slice(&bytes[32..64]);
                Self::new(r, s, bytes[64])
            }
            64 => {
                r.copy_from_slice(&bytes[..32]);
                s.copy_from_slice(&bytes[32..]);
                let y_parity = s[0] >> 7;
                s[0] &= 0x7f;
                Ok(Self { r, s, v: 27 + y_parity })
            }
            other => Err(SignatureError::InvalidLength(other)),
        }
    }

    /// Parse a hex signature, with or without `0x`
    pub fn from_hex(s: &str) -> Result<Self, SignatureError> {
        Self::split(&decode_hex(s)?)
    }

    /// Recovery id (0 or 1)
    pub fn recovery_id(&self) -> u8 {
        1 - (self.v % 2)
    }

    /// `r ‖ s ‖ v`
    pub fn to_bytes(&self) -> [u8; 65] {
        let mut out = [0u8; 65];
        out[..32].copy_from_slice(&self.r);
        out[32..64].copy_from_slice(&self.s);
        out[64] = self.v;
        out
    }

    /// EIP-2098 compact form: `r ‖ (yParity << 255 | s)`.
    ///
    /// The parity bit takes the top bit of `s`, so a high-`s` signature has no
    /// compact form.
    pub fn to_compact(&self) -> Result<[u8; 64], SignatureError> {
        if self.s[0] & 0x80 != 0 {
            return Err(SignatureError::InvalidSignature(
                "high s cannot be compacted".to_string(),
            ));
        }

        let mut out = [0u8; 64];
        out[..32].copy_from_slice(&self.r);
        out[32..].copy_from_slice(&self.s);
        out[32] |= self.recovery_id() << 7;
        Ok(out)
    }

    pub fn to_hex(&self) -> String {
        to_hex_prefixed(&self.to_bytes())
    }
}

/// Map a raw `v` byte to 27/28.
///
/// 0/1 are recovery ids; anything from 27 up carries the parity in its low bit
/// (odd is 27), which also covers EIP-155 values.
fn normalize_v(v: u8) -> Result<u8, SignatureError> {
    match v {
        0 | 1 => Ok(v + 27),
        27..=u8::MAX => Ok(28 - (v % 2)),
        _ => Err(SignatureError::InvalidRecoveryId(v)),
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Signature {
    type Err = SignatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl TryFrom<String> for Signature {
    type Error = SignatureError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_hex(&s)
    }
}

impl From<Signature> for String {
    fn from(signature: Signature) -> Self {
        signature.to_hex()
    }
}
