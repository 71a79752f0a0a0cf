//! EIP-712 Type Definitions
//!
//! Core data structures for EIP-712 typed data hashing.

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use std::collections::BTreeMap;
use std::fmt;

use crate::abi::parser::is_identifier;
use crate::abi::{parse_array_length, AbiError, AbiType, AbiValue, U256};
use crate::error::ErrorCode;
use crate::utils::crypto::{parse_address, to_checksum_address};

/// A field in a struct type definition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct FieldDefinition {
    /// The name of the field
    pub name: String,
    /// The type of the field (e.g., "address", "uint256", "Person[]")
    #[serde(rename = "type")]
    pub type_name: String,
}

impl FieldDefinition {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
        }
    }
}

/// A named struct type with its ordered fields
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct TypeDefinition {
    pub name: String,
    pub fields: Vec<FieldDefinition>,
}

impl TypeDefinition {
    pub fn new(name: impl Into<String>, fields: Vec<FieldDefinition>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }

    /// Render this single type as `Name(type1 name1,type2 name2)`
    pub fn encode(&self) -> String {
        let fields = self
            .fields
            .iter()
            .map(|f| format!("{} {}", f.type_name, f.name))
            .collect::<Vec<_>>()
            .join(",");
        format!("{}({})", self.name, fields)
    }

    /// Parse a concatenated type string such as `Mail(Person from,string contents)Person(string name)`
    /// back into definitions, in order of appearance.
    pub fn parse_encoded(encoded: &str) -> Result<Vec<TypeDefinition>, Eip712Error> {
        let malformed = |reason: &str| Eip712Error::InvalidTypeName(format!("{}: {}", reason, encoded));

        let mut definitions = Vec::new();
        let mut rest = encoded.trim();

        while !rest.is_empty() {
            let open = rest.find('(').ok_or_else(|| malformed("missing '('"))?;
            let close = rest.find(')').ok_or_else(|| malformed("missing ')'"))?;
            if close < open {
                return Err(malformed("unbalanced parentheses"));
            }

            let name = rest[..open].trim();
            let body = &rest[open + 1..close];

            let mut fields = Vec::new();
            if !body.trim().is_empty() {
                for member in body.split(',') {
                    let mut parts = member.split_whitespace();
                    match (parts.next(), parts.next(), parts.next()) {
                        (Some(type_name), Some(field), None) => {
                            fields.push(FieldDefinition::new(field, type_name))
                        }
                        _ => return Err(malformed("expected '<type> <name>'")),
                    }
                }
            }

            definitions.push(TypeDefinition::new(name, fields));
            rest = rest[close + 1..].trim_start();
        }

        if definitions.is_empty() {
            return Err(malformed("no type definitions"));
        }
        Ok(definitions)
    }
}

impl fmt::Display for TypeDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

/// A field type resolved into its EIP-712 shape
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Eip712Type {
    /// An ABI elementary type (`uintN`, `address`, `string`, ...)
    Elementary(AbiType),
    /// Reference to a registered struct
    Struct(String),
    /// `T[]` (length `None`) or `T[N]`
    Array {
        element: Box<Eip712Type>,
        length: Option<usize>,
    },
}

impl Eip712Type {
    /// Parse a field type string. Struct names are not checked against a registry here.
    pub fn parse(type_name: &str) -> Result<Self, Eip712Error> {
        let type_name = type_name.trim();

        if let Some(stripped) = type_name.strip_suffix(']') {
            let open = stripped
                .rfind('[')
                .ok_or_else(|| Eip712Error::InvalidTypeName(type_name.to_string()))?;
            let element = Self::parse(&stripped[..open])?;
            let size = &stripped[open + 1..];
            let length = if size.is_empty() {
                None
            } else {
                let n = parse_array_length(size)
                    .ok_or_else(|| Eip712Error::InvalidTypeName(type_name.to_string()))?;
                Some(n)
            };
            return Ok(Eip712Type::Array {
                element: Box::new(element),
                length,
            });
        }

        if AbiType::is_elementary_name(type_name) {
            return Ok(Eip712Type::Elementary(AbiType::parse_elementary(type_name)?));
        }

        if is_identifier(type_name) {
            return Ok(Eip712Type::Struct(type_name.to_string()));
        }

        Err(Eip712Error::InvalidTypeName(type_name.to_string()))
    }

    /// Struct name at the bottom of any array nesting
    pub fn struct_name(&self) -> Option<&str> {
        match self {
            Eip712Type::Elementary(_) => None,
            Eip712Type::Struct(name) => Some(name),
            Eip712Type::Array { element, .. } => element.struct_name(),
        }
    }
}

/// The EIP-712 signing domain. Every field is required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawDomain", into = "RawDomain")]
pub struct Domain {
    /// The human-readable name of the signing domain
    pub name: String,
    /// The current major version of the signing domain
    pub version: String,
    /// The EIP-155 chain ID. EIP-712 declares it `uint256`; it is narrowed to `u64` here,
    /// and a wider value is rejected as `InvalidDomain` when parsed.
    pub chain_id: u64,
    /// The address of the contract that will verify the signature
    pub verifying_contract: [u8; 20],
}

impl Domain {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        chain_id: u64,
        verifying_contract: [u8; 20],
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            chain_id,
            verifying_contract,
        }
    }

    /// Value tree matching the fixed `EIP712Domain` type
    pub fn to_value(&self) -> TypedValue {
        TypedValue::from_fields([
            ("name", TypedValue::string(&self.name)),
            ("version", TypedValue::string(&self.version)),
            ("chainId", TypedValue::uint(self.chain_id)),
            ("verifyingContract", TypedValue::address(self.verifying_contract)),
        ])
    }
}

/// JSON form of [`Domain`]: chain id as number or string, address as hex
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDomain {
    name: Option<String>,
    version: Option<String>,
    chain_id: Option<Json>,
    verifying_contract: Option<String>,
}

impl TryFrom<RawDomain> for Domain {
    type Error = Eip712Error;

    fn try_from(raw: RawDomain) -> Result<Self, Self::Error> {
        let missing = |field: &str| Eip712Error::InvalidDomain(format!("missing {}", field));

        let chain_id = match raw.chain_id.ok_or_else(|| missing("chainId"))? {
            Json::Number(n) => n.as_u64(),
            Json::String(s) => U256::parse(&s).ok().and_then(|v| v.to_u64()),
            _ => None,
        }
        .ok_or_else(|| Eip712Error::InvalidDomain("chainId must be an unsigned integer".to_string()))?;

        let contract = raw.verifying_contract.ok_or_else(|| missing("verifyingContract"))?;
        let verifying_contract = parse_address(&contract)
            .map_err(|e| Eip712Error::InvalidDomain(format!("verifyingContract: {}", e)))?;

        Ok(Domain {
            name: raw.name.ok_or_else(|| missing("name"))?,
            version: raw.version.ok_or_else(|| missing("version"))?,
            chain_id,
            verifying_contract,
        })
    }
}

impl From<Domain> for RawDomain {
    fn from(domain: Domain) -> Self {
        RawDomain {
            name: Some(domain.name),
            version: Some(domain.version),
            chain_id: Some(Json::from(domain.chain_id)),
            verifying_contract: Some(to_checksum_address(&domain.verifying_contract)),
        }
    }
}

/// A value tree to be hashed against a registered type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypedValue {
    /// Elementary value
    Atomic(AbiValue),
    /// Array of values (dynamic or fixed)
    Array(Vec<TypedValue>),
    /// Struct value keyed by field name
    Struct(BTreeMap<String, TypedValue>),
}

impl TypedValue {
    pub fn uint(value: u64) -> Self {
        TypedValue::Atomic(AbiValue::uint(value))
    }

    pub fn address(address: [u8; 20]) -> Self {
        TypedValue::Atomic(AbiValue::Address(address))
    }

    pub fn string(value: impl Into<String>) -> Self {
        TypedValue::Atomic(AbiValue::String(value.into()))
    }

    pub fn bytes(value: impl Into<Vec<u8>>) -> Self {
        TypedValue::Atomic(AbiValue::Bytes(value.into()))
    }

    /// Build a struct value from `(field, value)` pairs
    pub fn from_fields<K, I>(fields: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, TypedValue)>,
    {
        TypedValue::Struct(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// JSON form accepted back by [`super::TypeRegistry::value_from_json`]
    pub fn to_json(&self) -> Json {
        match self {
            TypedValue::Atomic(value) => value.to_json(),
            TypedValue::Array(items) => Json::Array(items.iter().map(TypedValue::to_json).collect()),
            TypedValue::Struct(fields) => Json::Object(
                fields
                    .iter()
                    .map(|(name, value)| (name.clone(), value.to_json()))
                    .collect(),
            ),
        }
    }

    /// Short name of the value's shape, for error messages
    pub fn kind(&self) -> &'static str {
        match self {
            TypedValue::Atomic(value) => value.kind(),
            TypedValue::Array(_) => "array",
            TypedValue::Struct(_) => "struct",
        }
    }
}

impl From<AbiValue> for TypedValue {
    fn from(value: AbiValue) -> Self {
        TypedValue::Atomic(value)
    }
}

/// Errors that can occur during EIP-712 operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Eip712Error {
    #[error("Type {0} already registered with different fields")]
    DuplicateType(String),

    #[error("Invalid type name: {0}")]
    InvalidTypeName(String),

    #[error("Duplicate field {field} in {type_name}")]
    DuplicateField { type_name: String, field: String },

    #[error("Unknown type: {0}")]
    UnknownType(String),

    #[error("Missing field: {type_name}.{field}")]
    MissingField { type_name: String, field: String },

    #[error("Unexpected field: {type_name}.{field}")]
    UnexpectedField { type_name: String, field: String },

    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch { expected: String, got: String },

    #[error("Invalid domain: {0}")]
    InvalidDomain(String),

    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    #[error(transparent)]
    Abi(#[from] AbiError),
}

impl Eip712Error {
    /// Category reported at the crate boundary
    pub fn code(&self) -> ErrorCode {
        match self {
            Eip712Error::Abi(e) => e.code(),
            _ => ErrorCode::Validation,
        }
    }
}
