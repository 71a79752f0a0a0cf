//! 256-bit integers backing `uintN` / `intN` ABI values

use std::cmp::Ordering;
use std::fmt;

use super::types::AbiError;

/// 256-bit unsigned integer (little-endian u64 limbs)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct U256(pub [u64; 4]);

impl U256 {
    pub const ZERO: U256 = U256([0, 0, 0, 0]);
    pub const ONE: U256 = U256([1, 0, 0, 0]);
    pub const MAX: U256 = U256([u64::MAX, u64::MAX, u64::MAX, u64::MAX]);

    /// Create from bytes (big-endian, exactly 32)
    pub fn from_be_bytes(bytes: &[u8; 32]) -> Self {
        let mut limbs = [0u64; 4];
        for (i, limb) in limbs.iter_mut().enumerate() {
            let offset = (3 - i) * 8;
            let mut chunk = [0u8; 8];
            chunk.copy_from_slice(&bytes[offset..offset + 8]);
            *limb = u64::from_be_bytes(chunk);
        }
        U256(limbs)
    }

    /// Create from a big-endian slice of at most 32 significant bytes
    pub fn from_be_slice(bytes: &[u8]) -> Result<Self, AbiError> {
        let first_nonzero = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len());
        let significant = &bytes[first_nonzero..];
        if significant.len() > 32 {
            return Err(AbiError::OutOfRange {
                type_name: "uint256".to_string(),
                value: format!("0x{}", hex::encode(bytes)),
            });
        }
        let mut padded = [0u8; 32];
        padded[32 - significant.len()..].copy_from_slice(significant);
        Ok(Self::from_be_bytes(&padded))
    }

    /// Convert to bytes (big-endian, 32 bytes)
    pub fn to_be_bytes(&self) -> [u8; 32] {
        let mut bytes = [0u8; 32];
        for i in 0..4 {
            let offset = (3 - i) * 8;
            bytes[offset..offset + 8].copy_from_slice(&self.0[i].to_be_bytes());
        }
        bytes
    }

    /// Parse a decimal string, or a hex string with `0x` prefix
    pub fn parse(s: &str) -> Result<Self, AbiError> {
        let s = s.trim();
        match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            Some(hex_digits) => Self::from_hex(hex_digits),
            None => Self::from_dec(s),
        }
    }

    /// Parse from hex string (without 0x prefix)
    pub fn from_hex(s: &str) -> Result<Self, AbiError> {
        if s.is_empty() {
            return Err(AbiError::InvalidValue("empty hex integer".to_string()));
        }
        let digits = s.trim_start_matches('0');
        if digits.len() > 64 {
            return Err(AbiError::OutOfRange {
                type_name: "uint256".to_string(),
                value: format!("0x{}", s),
            });
        }
        let padded = format!("{:0>64}", digits);
        let bytes = hex::decode(&padded)
            .map_err(|_| AbiError::InvalidValue(format!("invalid hex integer: 0x{}", s)))?;
        Self::from_be_slice(&bytes)
    }

    /// Parse from decimal string
    pub fn from_dec(s: &str) -> Result<Self, AbiError> {
        if s.is_empty() {
            return Err(AbiError::InvalidValue("empty decimal integer".to_string()));
        }
        let out_of_range = || AbiError::OutOfRange {
            type_name: "uint256".to_string(),
            value: s.to_string(),
        };

        let mut result = U256::ZERO;
        for c in s.chars() {
            let digit = c
                .to_digit(10)
                .ok_or_else(|| AbiError::InvalidValue(format!("invalid decimal digit: {}", c)))?;
            result = result.checked_mul_u64(10).ok_or_else(out_of_range)?;
            result = result
                .checked_add(U256::from(digit as u64))
                .ok_or_else(out_of_range)?;
        }
        Ok(result)
    }

    /// Checked addition
    pub fn checked_add(&self, other: U256) -> Option<U256> {
        let (sum, carry) = self.overflowing_add(other);
        if carry {
            None
        } else {
            Some(sum)
        }
    }

    fn overflowing_add(&self, other: U256) -> (U256, bool) {
        let mut result = [0u64; 4];
        let mut carry = 0u64;

        for i in 0..4 {
            let (sum1, c1) = self.0[i].overflowing_add(other.0[i]);
            let (sum2, c2) = sum1.overflowing_add(carry);
            result[i] = sum2;
            carry = (c1 as u64) + (c2 as u64);
        }

        (U256(result), carry != 0)
    }

    /// Checked multiplication by u64
    pub fn checked_mul_u64(&self, other: u64) -> Option<U256> {
        let mut result = [0u64; 4];
        let mut carry = 0u128;

        for i in 0..4 {
            let prod = (self.0[i] as u128) * (other as u128) + carry;
            result[i] = prod as u64;
            carry = prod >> 64;
        }

        if carry != 0 {
            None
        } else {
            Some(U256(result))
        }
    }

    /// Divide by a u64, returning quotient and remainder
    pub fn div_rem_u64(&self, divisor: u64) -> (U256, u64) {
        let mut quotient = [0u64; 4];
        let mut rem = 0u128;
        for i in (0..4).rev() {
            let cur = (rem << 64) | self.0[i] as u128;
            quotient[i] = (cur / divisor as u128) as u64;
            rem = cur % divisor as u128;
        }
        (U256(quotient), rem as u64)
    }

    /// Two's complement negation modulo 2^256
    pub fn wrapping_neg(&self) -> U256 {
        let inverted = U256([!self.0[0], !self.0[1], !self.0[2], !self.0[3]]);
        inverted.overflowing_add(U256::ONE).0
    }

    /// Number of significant bits
    pub fn bits(&self) -> usize {
        for i in (0..4).rev() {
            if self.0[i] != 0 {
                return i * 64 + (64 - self.0[i].leading_zeros() as usize);
            }
        }
        0
    }

    /// Check if zero
    pub fn is_zero(&self) -> bool {
        self.0 == [0, 0, 0, 0]
    }

    /// Value as u64 if it fits
    pub fn to_u64(&self) -> Option<u64> {
        if self.bits() <= 64 {
            Some(self.0[0])
        } else {
            None
        }
    }

    /// Value as usize if it fits (offsets and lengths while decoding)
    pub fn to_usize(&self) -> Option<usize> {
        self.to_u64().and_then(|v| usize::try_from(v).ok())
    }

    /// To hex string (64 chars, no prefix)
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_be_bytes())
    }
}

impl From<u64> for U256 {
    fn from(value: u64) -> Self {
        U256([value, 0, 0, 0])
    }
}

impl From<u128> for U256 {
    fn from(value: u128) -> Self {
        U256([value as u64, (value >> 64) as u64, 0, 0])
    }
}

impl Ord for U256 {
    fn cmp(&self, other: &Self) -> Ordering {
        for i in (0..4).rev() {
            match self.0[i].cmp(&other.0[i]) {
                Ordering::Equal => continue,
                ord => return ord,
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for U256 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for U256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return f.write_str("0");
        }
        let mut digits = Vec::with_capacity(78);
        let mut value = *self;
        while !value.is_zero() {
            let (q, r) = value.div_rem_u64(10);
            digits.push(b'0' + r as u8);
            value = q;
        }
        digits.reverse();
        f.write_str(std::str::from_utf8(&digits).map_err(|_| fmt::Error)?)
    }
}

/// 256-bit signed integer, stored as its two's complement bit pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct I256(pub U256);

impl I256 {
    pub const ZERO: I256 = I256(U256::ZERO);
    pub const MAX: I256 = I256(U256([u64::MAX, u64::MAX, u64::MAX, u64::MAX >> 1]));
    pub const MIN: I256 = I256(U256([0, 0, 0, 1 << 63]));

    /// Create from i128
    pub fn from_i128(value: i128) -> Self {
        let magnitude = U256::from(value.unsigned_abs());
        if value < 0 {
            I256(magnitude.wrapping_neg())
        } else {
            I256(magnitude)
        }
    }

    /// Parse a decimal or `0x` hex string with optional leading `-`
    pub fn parse(s: &str) -> Result<Self, AbiError> {
        let s = s.trim();
        let (negative, body) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s.strip_prefix('+').unwrap_or(s)),
        };

        let out_of_range = || AbiError::OutOfRange {
            type_name: "int256".to_string(),
            value: s.to_string(),
        };
        let magnitude = U256::parse(body).map_err(|e| match e {
            AbiError::OutOfRange { .. } => out_of_range(),
            other => other,
        })?;

        if negative {
            // |MIN| = 2^255 is the largest admissible magnitude
            if magnitude > I256::MIN.0 {
                return Err(out_of_range());
            }
            Ok(I256(magnitude.wrapping_neg()))
        } else {
            if magnitude.bits() > 255 {
                return Err(out_of_range());
            }
            Ok(I256(magnitude))
        }
    }

    /// Check if the sign bit is set
    pub fn is_negative(&self) -> bool {
        self.0 .0[3] >> 63 == 1
    }

    /// Absolute value as unsigned
    pub fn unsigned_abs(&self) -> U256 {
        if self.is_negative() {
            self.0.wrapping_neg()
        } else {
            self.0
        }
    }

    /// Whether the value fits a signed integer of `bits` width
    pub fn fits_bits(&self, bits: usize) -> bool {
        if bits >= 256 {
            return true;
        }
        if self.is_negative() {
            // -x fits iff (!x) fits as a non-negative value of bits-1
            let inverted = U256([!self.0 .0[0], !self.0 .0[1], !self.0 .0[2], !self.0 .0[3]]);
            inverted.bits() < bits
        } else {
            self.0.bits() < bits
        }
    }

    /// Convert to bytes (big-endian, two's complement, 32 bytes)
    pub fn to_be_bytes(&self) -> [u8; 32] {
        self.0.to_be_bytes()
    }

    /// Create from bytes (big-endian, two's complement)
    pub fn from_be_bytes(bytes: &[u8; 32]) -> Self {
        I256(U256::from_be_bytes(bytes))
    }
}

impl From<i64> for I256 {
    fn from(value: i64) -> Self {
        I256::from_i128(value as i128)
    }
}

impl fmt::Display for I256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_negative() {
            write!(f, "-{}", self.unsigned_abs())
        } else {
            write!(f, "{}", self.0)
        }
    }
}
