//! ABI encoder for Solidity/EVM contracts

use super::types::*;

/// ABI encoder
pub struct AbiEncoder;

impl AbiEncoder {
    /// Encode a single value according to its type
    pub fn encode_value(value: &AbiValue, abi_type: &AbiType) -> Result<Vec<u8>, AbiError> {
        match (value, abi_type) {
            (_, t) if t.is_static_word() => Ok(Self::encode_word(value, abi_type)?.to_vec()),

            // Dynamic bytes
            (AbiValue::Bytes(bytes), AbiType::Bytes) => Ok(Self::encode_dynamic_bytes(bytes)),

            // String
            (AbiValue::String(s), AbiType::String) => Ok(Self::encode_dynamic_bytes(s.as_bytes())),

            // Dynamic array
            (AbiValue::Array(values), AbiType::Array(inner_type)) => {
                Self::encode_dynamic_array(values, inner_type)
            }

            // Fixed array
            (AbiValue::Array(values), AbiType::FixedArray(inner_type, size)) => {
                if values.len() != *size {
                    return Err(AbiError::TypeMismatch {
                        expected: abi_type.canonical_type(),
                        got: format!("array of {} elements", values.len()),
                    });
                }
                Self::encode_fixed_array(values, inner_type)
            }

            // Tuple
            (AbiValue::Tuple(values), AbiType::Tuple(types)) => {
                if values.len() != types.len() {
                    return Err(AbiError::TypeMismatch {
                        expected: abi_type.canonical_type(),
                        got: format!("tuple of {} elements", values.len()),
                    });
                }
                Self::encode_tuple(values, types)
            }

            _ => Err(AbiError::TypeMismatch {
                expected: abi_type.canonical_type(),
                got: value.kind().to_string(),
            }),
        }
    }

    /// Encode a single-word static value, validating its range against the type
    pub fn encode_word(value: &AbiValue, abi_type: &AbiType) -> Result<[u8; 32], AbiError> {
        let mut word = [0u8; 32];
        match (value, abi_type) {
            (AbiValue::Uint(u), AbiType::Uint(bits)) => {
                check_uint_width(u, *bits, abi_type)?;
                word = u.to_be_bytes();
            }

            (AbiValue::Int(i), AbiType::Int(bits)) => {
                if !i.fits_bits(*bits) {
                    return Err(AbiError::OutOfRange {
                        type_name: abi_type.canonical_type(),
                        value: i.to_string(),
                    });
                }
                word = i.to_be_bytes();
            }

            (AbiValue::Address(addr), AbiType::Address) => {
                word[12..].copy_from_slice(addr);
            }

            (AbiValue::Bool(b), AbiType::Bool) => {
                word[31] = *b as u8;
            }

            // bytesN is left-aligned, zero-padded on the right; the value holds exactly N bytes
            (AbiValue::FixedBytes(bytes), AbiType::FixedBytes(size)) => {
                if bytes.len() != *size {
                    return Err(AbiError::OutOfRange {
                        type_name: abi_type.canonical_type(),
                        value: format!("{} bytes", bytes.len()),
                    });
                }
                word[..bytes.len()].copy_from_slice(bytes);
            }

            _ => {
                return Err(AbiError::TypeMismatch {
                    expected: abi_type.canonical_type(),
                    got: value.kind().to_string(),
                })
            }
        }
        Ok(word)
    }

    /// Encode multiple values as an argument list
    pub fn encode(values: &[AbiValue], types: &[AbiType]) -> Result<Vec<u8>, AbiError> {
        if values.len() != types.len() {
            return Err(AbiError::TypeMismatch {
                expected: format!("{} values", types.len()),
                got: format!("{} values", values.len()),
            });
        }

        Self::encode_tuple(values, types)
    }

    /// Encode a tuple (also used for function parameters).
    ///
    /// Dynamic members get an offset in the head, measured from the start of this block.
    ///
    /// Members are encoded before any buffer is sized, so the head size comes from
    /// the actual encodings and a type's declared size never drives an allocation.
    fn encode_tuple(values: &[AbiValue], types: &[AbiType]) -> Result<Vec<u8>, AbiError> {
        let encoded = values
            .iter()
            .zip(types)
            .map(|(value, abi_type)| Ok((abi_type.is_dynamic(), Self::encode_value(value, abi_type)?)))
            .collect::<Result<Vec<_>, AbiError>>()?;

        let head_size: usize = encoded
            .iter()
            .map(|(dynamic, bytes)| if *dynamic { 32 } else { bytes.len() })
            .sum();

        let mut head = Vec::with_capacity(head_size);
        let mut tail = Vec::new();

        for (dynamic, bytes) in &encoded {
            if *dynamic {
                let offset = head_size + tail.len();
                head.extend_from_slice(&U256::from(offset as u64).to_be_bytes());
                tail.extend_from_slice(bytes);
            } else {
                head.extend_from_slice(bytes);
            }
        }

        head.extend_from_slice(&tail);
        Ok(head)
    }

    /// Encode dynamic bytes: length word + data right-padded to 32
    fn encode_dynamic_bytes(bytes: &[u8]) -> Vec<u8> {
        let len = bytes.len();
        let padded_len = len.div_ceil(32) * 32;

        let mut result = Vec::with_capacity(32 + padded_len);
        result.extend_from_slice(&U256::from(len as u64).to_be_bytes());
        result.extend_from_slice(bytes);
        result.resize(32 + padded_len, 0);
        result
    }

    /// Encode a dynamic array: length word + elements as a fresh argument list
    fn encode_dynamic_array(values: &[AbiValue], inner_type: &AbiType) -> Result<Vec<u8>, AbiError> {
        let mut result = Vec::new();
        result.extend_from_slice(&U256::from(values.len() as u64).to_be_bytes());

        let types = vec![inner_type.clone(); values.len()];
        result.extend_from_slice(&Self::encode_tuple(values, &types)?);
        Ok(result)
    }

    /// Encode a fixed-size array (no length word)
    fn encode_fixed_array(values: &[AbiValue], inner_type: &AbiType) -> Result<Vec<u8>, AbiError> {
        let types = vec![inner_type.clone(); values.len()];
        Self::encode_tuple(values, &types)
    }
}
