//! ABI type definitions for Solidity/EVM contracts

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

pub use super::numeric::{I256, U256};
use crate::error::ErrorCode;
use crate::utils::crypto::{decode_hex, parse_address, to_checksum_address, to_hex_prefixed, HexError};

/// All possible Solidity types
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum AbiType {
    /// `uintN`, N in 8..=256 step 8
    Uint(usize),
    /// `intN`, N in 8..=256 step 8
    Int(usize),
    Address,
    Bool,
    /// `bytesN`, N in 1..=32
    FixedBytes(usize),
    Bytes,
    String,
    /// `T[]`
    Array(Box<AbiType>),
    /// `T[N]`
    FixedArray(Box<AbiType>, usize),
    /// `(T1,T2,...)`
    Tuple(Vec<AbiType>),
}

impl AbiType {
    /// Check if the type is dynamic (requires offset encoding)
    pub fn is_dynamic(&self) -> bool {
        match self {
            AbiType::Bytes | AbiType::String | AbiType::Array(_) => true,
            AbiType::FixedArray(inner, _) => inner.is_dynamic(),
            AbiType::Tuple(components) => components.iter().any(|t| t.is_dynamic()),
            _ => false,
        }
    }

    /// Get the size in bytes this type occupies in the head of an enclosing block
    pub fn head_size(&self) -> Result<usize, AbiError> {
        let overflow = || AbiError::UnsupportedType(format!("{} is too large to encode", self));

        match self {
            AbiType::Tuple(components) if !self.is_dynamic() => {
                components.iter().try_fold(0usize, |total, t| {
                    total.checked_add(t.head_size()?).ok_or_else(overflow)
                })
            }
            AbiType::FixedArray(inner, size) if !self.is_dynamic() => {
                inner.head_size()?.checked_mul(*size).ok_or_else(overflow)
            }
            _ => Ok(32),
        }
    }

    /// Single-word value types (`uintN`, `intN`, `address`, `bool`, `bytesN`)
    pub fn is_static_word(&self) -> bool {
        matches!(
            self,
            AbiType::Uint(_)
                | AbiType::Int(_)
                | AbiType::Address
                | AbiType::Bool
                | AbiType::FixedBytes(_)
        )
    }

    /// Parse an elementary (non-array, non-tuple) type name.
    ///
    /// `uint` and `int` alias to their 256-bit forms.
    pub fn parse_elementary(s: &str) -> Result<Self, AbiError> {
        let unsupported = || AbiError::UnsupportedType(s.to_string());

        match s {
            "address" => return Ok(AbiType::Address),
            "bool" => return Ok(AbiType::Bool),
            "bytes" => return Ok(AbiType::Bytes),
            "string" => return Ok(AbiType::String),
            "uint" => return Ok(AbiType::Uint(256)),
            "int" => return Ok(AbiType::Int(256)),
            _ => {}
        }

        if let Some(size) = s.strip_prefix("bytes") {
            let size = parse_width(size).ok_or_else(unsupported)?;
            if !(1..=32).contains(&size) {
                return Err(unsupported());
            }
            return Ok(AbiType::FixedBytes(size));
        }

        let (signed, bits) = if let Some(bits) = s.strip_prefix("uint") {
            (false, bits)
        } else if let Some(bits) = s.strip_prefix("int") {
            (true, bits)
        } else {
            return Err(unsupported());
        };

        let bits = parse_width(bits).ok_or_else(unsupported)?;
        if bits == 0 || bits > 256 || bits % 8 != 0 {
            return Err(unsupported());
        }
        Ok(if signed { AbiType::Int(bits) } else { AbiType::Uint(bits) })
    }

    /// Whether a bare type name belongs to the elementary namespace
    /// (so it can never name a user-defined struct)
    pub fn is_elementary_name(s: &str) -> bool {
        matches!(s, "address" | "bool" | "bytes" | "string")
            || ["uint", "int", "bytes"].iter().any(|prefix| {
                s.strip_prefix(prefix)
                    .map_or(false, |rest| rest.bytes().all(|b| b.is_ascii_digit()))
            })
    }

    /// Get the canonical type string for signature calculation
    pub fn canonical_type(&self) -> String {
        match self {
            AbiType::Uint(bits) => format!("uint{}", bits),
            AbiType::Int(bits) => format!("int{}", bits),
            AbiType::Address => "address".to_string(),
            AbiType::Bool => "bool".to_string(),
            AbiType::FixedBytes(size) => format!("bytes{}", size),
            AbiType::Bytes => "bytes".to_string(),
            AbiType::String => "string".to_string(),
            AbiType::Array(inner) => format!("{}[]", inner.canonical_type()),
            AbiType::FixedArray(inner, size) => format!("{}[{}]", inner.canonical_type(), size),
            AbiType::Tuple(components) => {
                let inner = components
                    .iter()
                    .map(|t| t.canonical_type())
                    .collect::<Vec<_>>()
                    .join(",");
                format!("({})", inner)
            }
        }
    }
}

/// Largest `N` accepted in a `T[N]` type
pub const MAX_FIXED_ARRAY_LENGTH: usize = 1 << 16;

/// Parse the `N` of a `T[N]` suffix: decimal, non-zero, at most [`MAX_FIXED_ARRAY_LENGTH`]
pub fn parse_array_length(s: &str) -> Option<usize> {
    parse_width(s).filter(|n| *n <= MAX_FIXED_ARRAY_LENGTH)
}

/// Decimal width suffix without sign or leading zeros
fn parse_width(s: &str) -> Option<usize> {
    if s.is_empty() || s.starts_with('0') || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

impl FromStr for AbiType {
    type Err = AbiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        super::parser::parse_type(s)
    }
}

impl TryFrom<String> for AbiType {
    type Error = AbiError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<AbiType> for String {
    fn from(t: AbiType) -> Self {
        t.canonical_type()
    }
}

impl fmt::Display for AbiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical_type())
    }
}

/// ABI value - runtime representation of Solidity values
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbiValue {
    Uint(U256),
    Int(I256),
    Address([u8; 20]),
    Bool(bool),
    /// `bytesN` content, exactly N bytes
    FixedBytes(Vec<u8>),
    Bytes(Vec<u8>),
    String(String),
    /// Dynamic or fixed-size array
    Array(Vec<AbiValue>),
    Tuple(Vec<AbiValue>),
}

impl AbiValue {
    /// Create a uint value from a u64
    pub fn uint(value: u64) -> Self {
        AbiValue::Uint(U256::from(value))
    }

    /// Create an int value from an i64
    pub fn int(value: i64) -> Self {
        AbiValue::Int(I256::from(value))
    }

    /// Create an Address value from a hex string (EIP-55 checked when mixed-case)
    pub fn address_from_str(s: &str) -> Result<Self, AbiError> {
        Ok(AbiValue::Address(parse_address(s)?))
    }

    /// Create bytes value from hex string
    pub fn bytes_from_hex(s: &str) -> Result<Self, AbiError> {
        Ok(AbiValue::Bytes(decode_hex(s)?))
    }

    /// Short name of the value's shape, for error messages
    pub fn kind(&self) -> &'static str {
        match self {
            AbiValue::Uint(_) => "uint",
            AbiValue::Int(_) => "int",
            AbiValue::Address(_) => "address",
            AbiValue::Bool(_) => "bool",
            AbiValue::FixedBytes(_) => "fixed bytes",
            AbiValue::Bytes(_) => "bytes",
            AbiValue::String(_) => "string",
            AbiValue::Array(_) => "array",
            AbiValue::Tuple(_) => "tuple",
        }
    }

    /// Convert user-entered text into a value of the given type.
    ///
    /// Integers accept decimal or `0x` hex, booleans accept `true/false/1/0`,
    /// byte types take hex. Arrays and tuples take JSON text.
    pub fn parse_param(abi_type: &AbiType, text: &str) -> Result<Self, AbiError> {
        let text = text.trim();
        match abi_type {
            AbiType::Uint(bits) => {
                let value = U256::parse(text).map_err(|e| widen_range_error(e, abi_type))?;
                check_uint_width(&value, *bits, abi_type)?;
                Ok(AbiValue::Uint(value))
            }
            AbiType::Int(bits) => {
                let value = I256::parse(text).map_err(|e| widen_range_error(e, abi_type))?;
                if !value.fits_bits(*bits) {
                    return Err(AbiError::OutOfRange {
                        type_name: abi_type.canonical_type(),
                        value: value.to_string(),
                    });
                }
                Ok(AbiValue::Int(value))
            }
            AbiType::Address => Self::address_from_str(text),
            AbiType::Bool => match text.to_ascii_lowercase().as_str() {
                "true" | "1" => Ok(AbiValue::Bool(true)),
                "false" | "0" => Ok(AbiValue::Bool(false)),
                _ => Err(AbiError::InvalidValue(format!("not a bool: {}", text))),
            },
            // Short input is right-padded so the value always holds exactly N bytes
            AbiType::FixedBytes(size) => {
                let mut bytes = decode_hex(text)?;
                if bytes.len() > *size {
                    return Err(AbiError::OutOfRange {
                        type_name: abi_type.canonical_type(),
                        value: format!("{} bytes", bytes.len()),
                    });
                }
                bytes.resize(*size, 0);
                Ok(AbiValue::FixedBytes(bytes))
            }
            AbiType::Bytes => Self::bytes_from_hex(text),
            AbiType::String => Ok(AbiValue::String(text.to_string())),
            AbiType::Array(_) | AbiType::FixedArray(..) | AbiType::Tuple(_) => {
                let json: Json = serde_json::from_str(text).map_err(|e| {
                    AbiError::InvalidValue(format!("{} expects JSON: {}", abi_type, e))
                })?;
                Self::from_json(abi_type, &json)
            }
        }
    }

    /// Convert a JSON value into a value of the given type
    pub fn from_json(abi_type: &AbiType, json: &Json) -> Result<Self, AbiError> {
        let mismatch = || AbiError::TypeMismatch {
            expected: abi_type.canonical_type(),
            got: json_kind(json).to_string(),
        };

        match (abi_type, json) {
            (AbiType::Bool, Json::Bool(b)) => Ok(AbiValue::Bool(*b)),
            (AbiType::Uint(_) | AbiType::Int(_), Json::Number(n)) => {
                Self::parse_param(abi_type, &n.to_string())
            }
            (AbiType::String, Json::String(s)) => Ok(AbiValue::String(s.clone())),
            (t, Json::String(s)) if !matches!(t, AbiType::Array(_) | AbiType::FixedArray(..) | AbiType::Tuple(_)) => {
                Self::parse_param(t, s)
            }
            (AbiType::Array(inner), Json::Array(items)) => items
                .iter()
                .map(|item| Self::from_json(inner, item))
                .collect::<Result<Vec<_>, _>>()
                .map(AbiValue::Array),
            (AbiType::FixedArray(inner, size), Json::Array(items)) => {
                if items.len() != *size {
                    return Err(AbiError::TypeMismatch {
                        expected: abi_type.canonical_type(),
                        got: format!("array of {} elements", items.len()),
                    });
                }
                items
                    .iter()
                    .map(|item| Self::from_json(inner, item))
                    .collect::<Result<Vec<_>, _>>()
                    .map(AbiValue::Array)
            }
            (AbiType::Tuple(components), Json::Array(items)) => {
                if items.len() != components.len() {
                    return Err(AbiError::TypeMismatch {
                        expected: abi_type.canonical_type(),
                        got: format!("tuple of {} elements", items.len()),
                    });
                }
                components
                    .iter()
                    .zip(items)
                    .map(|(t, item)| Self::from_json(t, item))
                    .collect::<Result<Vec<_>, _>>()
                    .map(AbiValue::Tuple)
            }
            _ => Err(mismatch()),
        }
    }

    /// Render as JSON: integers as decimal strings, addresses checksummed, bytes as hex
    pub fn to_json(&self) -> Json {
        match self {
            AbiValue::Uint(v) => Json::String(v.to_string()),
            AbiValue::Int(v) => Json::String(v.to_string()),
            AbiValue::Address(a) => Json::String(to_checksum_address(a)),
            AbiValue::Bool(b) => Json::Bool(*b),
            AbiValue::FixedBytes(b) | AbiValue::Bytes(b) => Json::String(to_hex_prefixed(b)),
            AbiValue::String(s) => Json::String(s.clone()),
            AbiValue::Array(values) | AbiValue::Tuple(values) => {
                Json::Array(values.iter().map(|v| v.to_json()).collect())
            }
        }
    }
}

/// Reject a uint that needs more than `bits` bits
pub(crate) fn check_uint_width(value: &U256, bits: usize, abi_type: &AbiType) -> Result<(), AbiError> {
    if value.bits() > bits {
        return Err(AbiError::OutOfRange {
            type_name: abi_type.canonical_type(),
            value: value.to_string(),
        });
    }
    Ok(())
}

fn widen_range_error(err: AbiError, abi_type: &AbiType) -> AbiError {
    match err {
        AbiError::OutOfRange { value, .. } => AbiError::OutOfRange {
            type_name: abi_type.canonical_type(),
            value,
        },
        other => other,
    }
}

fn json_kind(json: &Json) -> &'static str {
    match json {
        Json::Null => "null",
        Json::Bool(_) => "bool",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}

/// ABI errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AbiError {
    /// Type name not recognized
    #[error("unsupported type: {0}")]
    UnsupportedType(String),

    /// Value cannot be read as the requested type
    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// Value does not fit the declared width
    #[error("value out of range for {type_name}: {value}")]
    OutOfRange { type_name: String, value: String },

    /// Value shape or arity disagrees with the type
    #[error("type mismatch: expected {expected}, got {got}")]
    TypeMismatch { expected: String, got: String },

    #[error("decoding error: {0}")]
    Decoding(String),

    /// Function signature cannot be parsed
    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    /// Raw selector is not 4 bytes of hex
    #[error("invalid selector: {0}")]
    InvalidSelector(String),

    #[error(transparent)]
    Hex(#[from] HexError),
}

impl AbiError {
    /// Category reported at the crate boundary
    pub fn code(&self) -> ErrorCode {
        match self {
            AbiError::UnsupportedType(_) => ErrorCode::UnsupportedType,
            AbiError::OutOfRange { .. } => ErrorCode::Encoding,
            AbiError::InvalidValue(_)
            | AbiError::TypeMismatch { .. }
            | AbiError::Decoding(_)
            | AbiError::InvalidSignature(_)
            | AbiError::InvalidSelector(_)
            | AbiError::Hex(_) => ErrorCode::Validation,
        }
    }
}
