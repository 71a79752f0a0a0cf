//! ABI (Application Binary Interface) module for Solidity/EVM contracts
//!
//! This module provides the Solidity ABI encoding engine:
//! - Elementary and compound types (`uintN`, `intN`, address, bool, bytes, string, arrays, tuples)
//! - Head/tail encoding with range validation, and strict decoding
//! - Human-readable signature parsing
//! - Function selectors and calldata composition

pub mod numeric;
pub mod types;
pub mod encoder;
pub mod decoder;
pub mod parser;
pub mod selector;


pub use types::*;
pub use encoder::*;
pub use decoder::*;
pub use parser::*;
pub use selector::*;
