//! EIP-712 Hashing
//!
//! Domain separator, signing digest and the `eth_signTypedData_v4` document.

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use std::collections::BTreeMap;

use super::encoder::hash_struct;
use super::registry::TypeRegistry;
use super::types::*;
use crate::utils::crypto::keccak256_concat;

/// Magic prefix for EIP-712 encoding
const EIP712_PREFIX: [u8; 2] = [0x19, 0x01];

/// Name of the domain struct
pub const EIP712_DOMAIN: &str = "EIP712Domain";

/// The one domain shape this crate signs under
pub const EIP712_DOMAIN_TYPE: &str =
    "EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)";

/// Field list of the fixed `EIP712Domain` type
pub fn domain_type() -> TypeDefinition {
    TypeDefinition::new(
        EIP712_DOMAIN,
        vec![
            FieldDefinition::new("name", "string"),
            FieldDefinition::new("version", "string"),
            FieldDefinition::new("chainId", "uint256"),
            FieldDefinition::new("verifyingContract", "address"),
        ],
    )
}

/// domainSeparator = hashStruct(eip712Domain)
pub fn domain_separator(domain: &Domain) -> Result<[u8; 32], Eip712Error> {
    let registry = TypeRegistry::from_definitions([domain_type()])?;
    hash_struct(&registry, EIP712_DOMAIN, &domain.to_value())
}

/// `"\x19\x01" ‖ domainSeparator ‖ hashStruct(message)`
pub fn get_pre_image(domain_separator: &[u8; 32], struct_hash: &[u8; 32]) -> [u8; 66] {
    let mut pre_image = [0u8; 66];
    pre_image[..2].copy_from_slice(&EIP712_PREFIX);
    pre_image[2..34].copy_from_slice(domain_separator);
    pre_image[34..].copy_from_slice(struct_hash);
    pre_image
}

/// The final digest handed to a signer
pub fn signing_digest(domain_separator: &[u8; 32], struct_hash: &[u8; 32]) -> [u8; 32] {
    keccak256_concat(&[&EIP712_PREFIX, domain_separator, struct_hash])
}

/// Hash a message value under a domain in one step
pub fn hash_typed_message(
    domain: &Domain,
    registry: &TypeRegistry,
    primary_type: &str,
    message: &TypedValue,
) -> Result<[u8; 32], Eip712Error> {
    let separator = domain_separator(domain)?;
    let struct_hash = hash_struct(registry, primary_type, message)?;
    Ok(signing_digest(&separator, &struct_hash))
}

/// Complete EIP-712 typed data document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypedData {
    /// Type definitions (struct name -> fields), optionally including `EIP712Domain`
    pub types: BTreeMap<String, Vec<FieldDefinition>>,

    /// The name of the primary type being signed
    pub primary_type: String,

    /// The EIP-712 domain
    pub domain: Domain,

    /// The actual message data to sign
    pub message: Json,
}

impl TypedData {
    /// Parse typed data from a JSON string
    pub fn from_json(json: &str) -> Result<Self, Eip712Error> {
        serde_json::from_str(json).map_err(|e| Eip712Error::InvalidJson(e.to_string()))
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, Eip712Error> {
        serde_json::to_string(self).map_err(|e| Eip712Error::InvalidJson(e.to_string()))
    }

    /// Build a document from a registry and value tree
    pub fn new(
        registry: &TypeRegistry,
        primary_type: &str,
        domain: Domain,
        message: Json,
    ) -> Result<Self, Eip712Error> {
        registry.definition(primary_type)?;

        let mut types: BTreeMap<String, Vec<FieldDefinition>> = registry
            .names()
            .filter_map(|name| registry.get(name))
            .map(|definition| (definition.name.clone(), definition.fields.clone()))
            .collect();
        types.insert(EIP712_DOMAIN.to_string(), domain_type().fields);

        Ok(Self {
            types,
            primary_type: primary_type.to_string(),
            domain,
            message,
        })
    }

    /// Registry of the message types.
    ///
    /// An `EIP712Domain` entry, if present, must match the fixed domain type.
    pub fn registry(&self) -> Result<TypeRegistry, Eip712Error> {
        let mut definitions = Vec::with_capacity(self.types.len());
        for (name, fields) in &self.types {
            if name == EIP712_DOMAIN {
                if *fields != domain_type().fields {
                    return Err(Eip712Error::DuplicateType(EIP712_DOMAIN.to_string()));
                }
                continue;
            }
            definitions.push(TypeDefinition::new(name.clone(), fields.clone()));
        }

        let registry = TypeRegistry::from_definitions(definitions)?;
        registry.definition(&self.primary_type)?;
        Ok(registry)
    }

    /// Message converted into a value tree of the primary type
    pub fn message_value(&self, registry: &TypeRegistry) -> Result<TypedValue, Eip712Error> {
        registry.value_from_json(&self.primary_type, &self.message)
    }

    /// hashStruct of the message
    pub fn struct_hash(&self) -> Result<[u8; 32], Eip712Error> {
        let registry = self.registry()?;
        let value = self.message_value(&registry)?;
        hash_struct(&registry, &self.primary_type, &value)
    }

    /// The signing digest for this document
    pub fn digest(&self) -> Result<[u8; 32], Eip712Error> {
        let separator = domain_separator(&self.domain)?;
        Ok(signing_digest(&separator, &self.struct_hash()?))
    }
}
