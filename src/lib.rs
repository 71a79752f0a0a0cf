//! Intent Signer Library
//!
//! EIP-712 typed-data hashing and signing for intent-router flows.
//!
//! # Architecture
//!
//! This crate provides:
//! - **abi**: Solidity ABI encoding/decoding, signature parsing, selectors
//! - **eip712**: type registry, struct hashing, domain separator, signing digest
//! - **signature**: 65-byte signature codec and secp256k1 recovery
//! - **signing**: the external signer boundary with pre-flight checks
//! - **intent**: Intent, Permit and DCA schemas plus router calldata
//! - **utils**: keccak/hex helpers, redacting logger, configuration
//!
//! # Security
//!
//! Private keys live in `zeroize::Zeroizing` buffers and are never logged.
//! The signer boundary is single-shot: a prepared request is consumed by its
//! one submission, and the recovered signer is checked against the expected one.
//!
//! # Example
//!
//! ```rust,ignore
//! use intent_signer::intent::{intent_domain, Action, Intent};
//! use intent_signer::utils::config::SignerConfig;
//!
//! let config = SignerConfig::default();
//! let domain = intent_domain(&config, 1, config.known_contract(1).unwrap());
//! let intent = Intent::builder(owner).action(Action::new("Deposit", 1)).build();
//! let digest = intent.digest(&domain)?;
//! ```

pub mod error;
pub mod abi;
pub mod eip712;
pub mod signature;
pub mod signing;
pub mod intent;
pub mod utils;

// Re-export key types for convenience
pub use error::{ErrorCode, IntentError, IntentResult};
pub use abi::{AbiType, AbiValue, FunctionSelector, FunctionSignature, I256, U256};
pub use eip712::{domain_separator, signing_digest, Domain, TypeRegistry, TypedData, TypedValue};
pub use signature::{recover_address, verify_digest, verify_typed_data, Digest, Signature};
pub use signing::{preflight, LocalKeySigner, SignedMessage, SigningRequest, TypedDataSigner};

// Re-export crypto utilities for binaries
pub use utils::crypto::{keccak256, parse_address, to_checksum_address};
