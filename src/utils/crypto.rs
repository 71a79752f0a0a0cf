//! Hashing and hex helpers shared by the ABI, EIP-712 and signature modules

use tiny_keccak::{Hasher, Keccak};

/// Errors produced while parsing hex payloads and addresses
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HexError {
    #[error("invalid hex: {0}")]
    InvalidHex(String),

    #[error("invalid length: expected {expected} bytes, got {got}")]
    InvalidLength { expected: usize, got: usize },

    #[error("bad address checksum: {0}")]
    BadChecksum(String),
}

/// Keccak256 hash (used for Ethereum addresses)
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    hasher.update(data);
    let mut out = [0u8; 32];
    hasher.finalize(&mut out);
    out
}

/// Keccak256 over several slices without concatenating them first
pub fn keccak256_concat(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    for part in parts {
        hasher.update(part);
    }
    let mut out = [0u8; 32];
    hasher.finalize(&mut out);
    out
}

/// Convert raw address bytes to checksummed Ethereum address (EIP-55)
pub fn to_checksum_address(address: &[u8]) -> String {
    let lower = hex::encode(address);
    let hash = keccak256(lower.as_bytes());

    let mut result = String::from("0x");
    for (i, ch) in lower.chars().enumerate() {
        let byte = hash[i / 2];
        let nibble = if i % 2 == 0 { byte >> 4 } else { byte & 0x0f };

        if ch.is_ascii_digit() {
            result.push(ch);
        } else if nibble >= 8 {
            result.push(ch.to_ascii_uppercase());
        } else {
            result.push(ch);
        }
    }

    result
}

/// Render bytes as a `0x`-prefixed lowercase hex string
pub fn to_hex_prefixed(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Decode a hex string, with or without `0x` prefix.
///
/// An empty string and a bare `0x` both decode to no bytes.
pub fn decode_hex(s: &str) -> Result<Vec<u8>, HexError> {
    let trimmed = s.trim();
    let body = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    hex::decode(body).map_err(|e| HexError::InvalidHex(format!("{}: {}", trimmed, e)))
}

/// Decode a hex string that must hold exactly `N` bytes
pub fn decode_hex_array<const N: usize>(s: &str) -> Result<[u8; N], HexError> {
    let bytes = decode_hex(s)?;
    bytes_to_array(&bytes)
}

/// Copy a slice into a fixed-size array, rejecting any other length
pub fn bytes_to_array<const N: usize>(bytes: &[u8]) -> Result<[u8; N], HexError> {
    bytes.try_into().map_err(|_| HexError::InvalidLength {
        expected: N,
        got: bytes.len(),
    })
}

/// Parse an Ethereum address.
///
/// All-lowercase and all-uppercase inputs are accepted as is; mixed-case inputs
/// must carry a valid EIP-55 checksum.
pub fn parse_address(s: &str) -> Result<[u8; 20], HexError> {
    let trimmed = s.trim();
    let address: [u8; 20] = decode_hex_array(trimmed)?;

    let body = trimmed.trim_start_matches("0x").trim_start_matches("0X");
    let has_lower = body.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = body.chars().any(|c| c.is_ascii_uppercase());

    if has_lower && has_upper {
        let expected = to_checksum_address(&address);
        if expected[2..] != *body {
            return Err(HexError::BadChecksum(trimmed.to_string()));
        }
    }

    Ok(address)
}
