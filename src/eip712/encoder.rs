//! EIP-712 Type Encoding
//!
//! Implements `typeHash`, `encodeData` and `hashStruct` over a [`TypeRegistry`].

use super::registry::TypeRegistry;
use super::types::*;
use crate::abi::{AbiEncoder, AbiType, AbiValue};
use crate::utils::crypto::keccak256;

/// typeHash = keccak256(encodeType(typeOf(s)))
pub fn type_hash(registry: &TypeRegistry, type_name: &str) -> Result<[u8; 32], Eip712Error> {
    let encoded = registry.canonical_type_string(type_name)?;
    Ok(keccak256(encoded.as_bytes()))
}

/// hashStruct(s) = keccak256(typeHash ‖ encodeData(s))
pub fn hash_struct(
    registry: &TypeRegistry,
    type_name: &str,
    value: &TypedValue,
) -> Result<[u8; 32], Eip712Error> {
    Ok(keccak256(&encode_data(registry, type_name, value)?))
}

/// Type hash followed by one 32-byte word per declared field, in declaration order.
///
/// The whole type graph below `type_name` is resolved before any field is encoded.
pub fn encode_data(
    registry: &TypeRegistry,
    type_name: &str,
    value: &TypedValue,
) -> Result<Vec<u8>, Eip712Error> {
    let type_hash = type_hash(registry, type_name)?;
    encode_struct_words(registry, type_name, type_hash, value)
}

fn encode_struct_words(
    registry: &TypeRegistry,
    type_name: &str,
    type_hash: [u8; 32],
    value: &TypedValue,
) -> Result<Vec<u8>, Eip712Error> {
    let TypedValue::Struct(fields) = value else {
        return Err(Eip712Error::TypeMismatch {
            expected: type_name.to_string(),
            got: value.kind().to_string(),
        });
    };

    let definition = registry.definition(type_name)?;

    if let Some(extra) = fields
        .keys()
        .find(|key| !definition.fields.iter().any(|f| &f.name == *key))
    {
        return Err(Eip712Error::UnexpectedField {
            type_name: type_name.to_string(),
            field: extra.clone(),
        });
    }

    let mut encoded = Vec::with_capacity(32 * (definition.fields.len() + 1));
    encoded.extend_from_slice(&type_hash);

    for field in &definition.fields {
        let field_value = fields.get(&field.name).ok_or_else(|| Eip712Error::MissingField {
            type_name: type_name.to_string(),
            field: field.name.clone(),
        })?;

        let field_type = registry.resolve(&field.type_name)?;
        encoded.extend_from_slice(&encode_field(registry, &field_type, field_value)?);
    }

    Ok(encoded)
}

/// Encode one field value to its 32-byte word
fn encode_field(
    registry: &TypeRegistry,
    field_type: &Eip712Type,
    value: &TypedValue,
) -> Result<[u8; 32], Eip712Error> {
    let mismatch = |expected: String| Eip712Error::TypeMismatch {
        expected,
        got: value.kind().to_string(),
    };

    match field_type {
        // Dynamic types are hashed
        Eip712Type::Elementary(AbiType::String) => match value {
            TypedValue::Atomic(AbiValue::String(s)) => Ok(keccak256(s.as_bytes())),
            _ => Err(mismatch("string".to_string())),
        },
        Eip712Type::Elementary(AbiType::Bytes) => match value {
            TypedValue::Atomic(AbiValue::Bytes(b)) => Ok(keccak256(b)),
            _ => Err(mismatch("bytes".to_string())),
        },

        Eip712Type::Elementary(abi_type) => match value {
            TypedValue::Atomic(atomic) => Ok(AbiEncoder::encode_word(atomic, abi_type)?),
            _ => Err(mismatch(abi_type.canonical_type())),
        },

        // Struct references are encoded as their hashStruct
        Eip712Type::Struct(name) => {
            let type_hash = type_hash(registry, name)?;
            Ok(keccak256(&encode_struct_words(registry, name, type_hash, value)?))
        }

        // Arrays hash the concatenation of their element words
        Eip712Type::Array { element, length } => {
            let TypedValue::Array(items) = value else {
                return Err(mismatch("array".to_string()));
            };
            if let Some(expected) = length {
                if items.len() != *expected {
                    return Err(Eip712Error::TypeMismatch {
                        expected: format!("array of {} elements", expected),
                        got: format!("array of {} elements", items.len()),
                    });
                }
            }

            let mut words = Vec::with_capacity(32 * items.len());
            for item in items {
                words.extend_from_slice(&encode_field(registry, element, item)?);
            }
            Ok(keccak256(&words))
        }
    }
}
