//! ABI decoder for Solidity/EVM contracts
//!
//! Strict: every offset and length is bounds-checked, and padding bits of
//! single-word values must be canonical.

use super::types::*;

/// ABI decoder
pub struct AbiDecoder;

impl AbiDecoder {
    /// Decode a single value at `offset`, returning it with the offset just past its head
    pub fn decode_value(data: &[u8], abi_type: &AbiType, offset: usize) -> Result<(AbiValue, usize), AbiError> {
        match abi_type {
            t if t.is_static_word() => {
                let word = Self::read_word(data, offset)?;
                Ok((Self::decode_word(word, abi_type)?, offset + 32))
            }

            AbiType::Bytes => {
                let (bytes, next) = Self::decode_dynamic_bytes(data, offset)?;
                Ok((AbiValue::Bytes(bytes), next))
            }

            AbiType::String => {
                let (bytes, next) = Self::decode_dynamic_bytes(data, offset)?;
                let s = String::from_utf8(bytes)
                    .map_err(|_| AbiError::Decoding("invalid UTF-8 in string".to_string()))?;
                Ok((AbiValue::String(s), next))
            }

            AbiType::Array(inner_type) => Self::decode_dynamic_array(data, offset, inner_type),

            AbiType::FixedArray(inner_type, size) => {
                // The element heads must fit in the data before the type list is built
                let needed = inner_type
                    .head_size()?
                    .checked_mul(*size)
                    .and_then(|heads| heads.checked_add(offset))
                    .filter(|end| *end <= data.len());
                if needed.is_none() {
                    return Err(AbiError::Decoding(format!(
                        "insufficient data for {}",
                        abi_type.canonical_type()
                    )));
                }

                let types: Vec<AbiType> = std::iter::repeat((**inner_type).clone()).take(*size).collect();
                let (values, next) = Self::decode_tuple(data, offset, &types)?;
                Ok((AbiValue::Array(values), next))
            }

            AbiType::Tuple(types) => {
                let (values, next) = Self::decode_tuple(data, offset, types)?;
                Ok((AbiValue::Tuple(values), next))
            }

            _ => Err(AbiError::UnsupportedType(abi_type.canonical_type())),
        }
    }

    /// Decode an argument list (the inverse of [`super::AbiEncoder::encode`])
    pub fn decode(data: &[u8], types: &[AbiType]) -> Result<Vec<AbiValue>, AbiError> {
        let (values, _) = Self::decode_tuple(data, 0, types)?;
        Ok(values)
    }

    /// Decode a single word against a static word type
    pub fn decode_word(word: &[u8; 32], abi_type: &AbiType) -> Result<AbiValue, AbiError> {
        let non_canonical = || {
            AbiError::Decoding(format!(
                "non-canonical {} word: 0x{}",
                abi_type.canonical_type(),
                hex::encode(word)
            ))
        };

        match abi_type {
            AbiType::Uint(bits) => {
                let value = U256::from_be_bytes(word);
                if value.bits() > *bits {
                    return Err(non_canonical());
                }
                Ok(AbiValue::Uint(value))
            }

            AbiType::Int(bits) => {
                let value = I256::from_be_bytes(word);
                if !value.fits_bits(*bits) {
                    return Err(non_canonical());
                }
                Ok(AbiValue::Int(value))
            }

            AbiType::Address => {
                if word[..12].iter().any(|b| *b != 0) {
                    return Err(non_canonical());
                }
                let mut addr = [0u8; 20];
                addr.copy_from_slice(&word[12..]);
                Ok(AbiValue::Address(addr))
            }

            AbiType::Bool => match (word[..31].iter().all(|b| *b == 0), word[31]) {
                (true, 0) => Ok(AbiValue::Bool(false)),
                (true, 1) => Ok(AbiValue::Bool(true)),
                _ => Err(non_canonical()),
            },

            AbiType::FixedBytes(size) => {
                if word[*size..].iter().any(|b| *b != 0) {
                    return Err(non_canonical());
                }
                Ok(AbiValue::FixedBytes(word[..*size].to_vec()))
            }

            _ => Err(AbiError::TypeMismatch {
                expected: "single-word type".to_string(),
                got: abi_type.canonical_type(),
            }),
        }
    }

    /// Decode a tuple whose block starts at `base_offset`
    fn decode_tuple(data: &[u8], base_offset: usize, types: &[AbiType]) -> Result<(Vec<AbiValue>, usize), AbiError> {
        let mut values = Vec::with_capacity(types.len());
        let mut head_offset = base_offset;

        for abi_type in types {
            if abi_type.is_dynamic() {
                let relative = Self::read_usize(data, head_offset, "offset")?;
                let data_offset = base_offset
                    .checked_add(relative)
                    .ok_or_else(|| AbiError::Decoding("offset overflow".to_string()))?;

                let (value, _) = Self::decode_value(data, abi_type, data_offset)?;
                values.push(value);
                head_offset += 32;
            } else {
                let (value, next) = Self::decode_value(data, abi_type, head_offset)?;
                values.push(value);
                head_offset = next;
            }
        }

        Ok((values, head_offset))
    }

    /// Decode length-prefixed bytes, checking the zero padding
    fn decode_dynamic_bytes(data: &[u8], offset: usize) -> Result<(Vec<u8>, usize), AbiError> {
        let length = Self::read_usize(data, offset, "length")?;
        let start = offset + 32;
        let padded = length
            .checked_add(31)
            .map(|l| l / 32 * 32)
            .ok_or_else(|| AbiError::Decoding("length overflow".to_string()))?;
        let end = start
            .checked_add(padded)
            .filter(|end| *end <= data.len())
            .ok_or_else(|| AbiError::Decoding(format!("insufficient data for {} bytes", length)))?;

        if data[start + length..end].iter().any(|b| *b != 0) {
            return Err(AbiError::Decoding("non-zero padding after bytes".to_string()));
        }

        Ok((data[start..start + length].to_vec(), end))
    }

    /// Decode a dynamic array
    fn decode_dynamic_array(data: &[u8], offset: usize, inner_type: &AbiType) -> Result<(AbiValue, usize), AbiError> {
        let length = Self::read_usize(data, offset, "array length")?;

        // Each element needs at least one head word
        let remaining = data.len().saturating_sub(offset + 32);
        if length > remaining / 32 {
            return Err(AbiError::Decoding(format!(
                "array length {} exceeds available data",
                length
            )));
        }

        let types = vec![inner_type.clone(); length];
        let (values, next) = Self::decode_tuple(data, offset + 32, &types)?;
        Ok((AbiValue::Array(values), next))
    }

    fn read_word(data: &[u8], offset: usize) -> Result<&[u8; 32], AbiError> {
        offset
            .checked_add(32)
            .and_then(|end| data.get(offset..end))
            .and_then(|slice| slice.try_into().ok())
            .ok_or_else(|| {
                AbiError::Decoding(format!(
                    "insufficient data: need 32 bytes at offset {}, have {}",
                    offset,
                    data.len()
                ))
            })
    }

    fn read_usize(data: &[u8], offset: usize, what: &str) -> Result<usize, AbiError> {
        let word = Self::read_word(data, offset)?;
        U256::from_be_bytes(word)
            .to_usize()
            .ok_or_else(|| AbiError::Decoding(format!("{} too large", what)))
    }
}
