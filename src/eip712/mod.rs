//! EIP-712 Typed Data Hashing
//!
//! Struct registry, `hashStruct`, domain separator and signing digest for
//! EIP-712 typed structured data. Signing itself lives in [`crate::signature`].
//!
//! # Reference
//! - <https://eips.ethereum.org/EIPS/eip-712>
//!
//! # Example
//! ```rust,ignore
//! use intent_signer::eip712::TypedData;
//!
//! let typed_data = TypedData::from_json(json_string)?;
//! let digest = typed_data.digest()?;
//! ```

pub mod types;
pub mod registry;
pub mod encoder;
pub mod hasher;

pub use types::*;
pub use registry::*;
pub use encoder::*;
pub use hasher::*;
