//! Intent Schemas
//!
//! The message shapes signed through the intent router:
//! - `Intent` with its `Actions[]`, `RelayFee` and opaque `bytes[]` inputs
//! - EIP-2612 `Permit`
//! - `DCAIntent` (own domain, no verifying contract)
//!
//! All three go through the same registry-driven EIP-712 engine. [`fixed`]
//! recomputes the Intent hash the way the router contract does, for
//! cross-checking. [`calldata`] holds the ABI encoders for the structs the
//! router receives as call arguments.

pub mod schema;
pub mod model;
pub mod fixed;
pub mod calldata;

pub use schema::*;
pub use model::*;
pub use calldata::*;

#[cfg(test)]
mod tests;
