//! Hard-coded Intent hashing, word for word as the router contract computes it.
//!
//! Kept apart from the registry-driven engine so the two can be checked
//! against each other.

use super::model::{Action, Intent, RelayFee};
use super::schema::{ACTIONS_TYPE, INTENT_TYPE, RELAY_FEE_TYPE};
use crate::abi::{AbiEncoder, AbiError, AbiType, AbiValue};
use crate::eip712::{domain_separator, signing_digest, Domain, Eip712Error};
use crate::utils::crypto::keccak256;

/// Type strings the fixed encoding hashes into its type hashes.
///
/// [`Default`] gives the bundled router schema; a deployment that renamed or
/// reordered fields passes its own strings instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntentTypeStrings<'a> {
    pub intent: &'a str,
    pub actions: &'a str,
    pub relay_fee: &'a str,
}

impl Default for IntentTypeStrings<'static> {
    fn default() -> Self {
        Self {
            intent: INTENT_TYPE,
            actions: ACTIONS_TYPE,
            relay_fee: RELAY_FEE_TYPE,
        }
    }
}

impl<'a> IntentTypeStrings<'a> {
    /// Bundled strings, with any of the given ones substituted
    pub fn new(intent: Option<&'a str>, actions: Option<&'a str>, relay_fee: Option<&'a str>) -> Self {
        let defaults = IntentTypeStrings::default();
        Self {
            intent: intent.unwrap_or(defaults.intent),
            actions: actions.unwrap_or(defaults.actions),
            relay_fee: relay_fee.unwrap_or(defaults.relay_fee),
        }
    }

    pub fn intent_typehash(&self) -> [u8; 32] {
        keccak256(self.intent.as_bytes())
    }

    pub fn actions_typehash(&self) -> [u8; 32] {
        keccak256(self.actions.as_bytes())
    }

    pub fn relay_fee_typehash(&self) -> [u8; 32] {
        keccak256(self.relay_fee.as_bytes())
    }

    /// keccak256(abi.encode(ACTIONS_TYPEHASH, keccak(action), keccak(protocol), ...))
    pub fn action_hash(&self, action: &Action) -> Result<[u8; 32], AbiError> {
        let encoded = AbiEncoder::encode(
            &[
                word(self.actions_typehash()),
                word(keccak256(action.action.as_bytes())),
                word(keccak256(action.protocol.as_bytes())),
                AbiValue::Address(action.protocol_address),
                AbiValue::Uint(action.chain_id),
                AbiValue::Address(action.token_in),
                AbiValue::Uint(action.amount_in),
                AbiValue::Address(action.token_out),
                AbiValue::Uint(action.amount_out),
                AbiValue::Address(action.receiver),
                AbiValue::Uint(action.slippage),
            ],
            &[
                B32,
                B32,
                B32,
                AbiType::Address,
                U256_T,
                AbiType::Address,
                U256_T,
                AbiType::Address,
                U256_T,
                AbiType::Address,
                U256_T,
            ],
        )?;
        Ok(keccak256(&encoded))
    }

    pub fn relay_fee_hash(&self, relay_fee: &RelayFee) -> Result<[u8; 32], AbiError> {
        let encoded = AbiEncoder::encode(
            &[
                word(self.relay_fee_typehash()),
                AbiValue::Address(relay_fee.token),
                AbiValue::Uint(relay_fee.amount),
            ],
            &[B32, AbiType::Address, U256_T],
        )?;
        Ok(keccak256(&encoded))
    }

    pub fn intent_struct_hash(&self, intent: &Intent) -> Result<[u8; 32], AbiError> {
        let action_hashes = intent
            .actions
            .iter()
            .map(|action| self.action_hash(action))
            .collect::<Result<Vec<_>, _>>()?;
        let actions_hash = hash_packed(action_hashes.into_iter());
        let inputs_hash = hash_packed(intent.inputs.iter().map(|input| keccak256(input)));

        let encoded = AbiEncoder::encode(
            &[
                word(self.intent_typehash()),
                AbiValue::Address(intent.owner),
                AbiValue::Uint(intent.nonce),
                AbiValue::Uint(intent.deadline),
                word(actions_hash),
                word(self.relay_fee_hash(&intent.relay_fee)?),
                word(inputs_hash),
            ],
            &[B32, AbiType::Address, U256_T, U256_T, B32, B32, B32],
        )?;
        Ok(keccak256(&encoded))
    }

    pub fn intent_digest(&self, domain: &Domain, intent: &Intent) -> Result<[u8; 32], Eip712Error> {
        let separator = domain_separator(domain)?;
        Ok(signing_digest(&separator, &self.intent_struct_hash(intent)?))
    }
}

/// keccak256 of the Intent type string
pub fn intent_typehash() -> [u8; 32] {
    IntentTypeStrings::default().intent_typehash()
}

pub fn actions_typehash() -> [u8; 32] {
    IntentTypeStrings::default().actions_typehash()
}

pub fn relay_fee_typehash() -> [u8; 32] {
    IntentTypeStrings::default().relay_fee_typehash()
}

fn word(bytes: [u8; 32]) -> AbiValue {
    AbiValue::FixedBytes(bytes.to_vec())
}

const B32: AbiType = AbiType::FixedBytes(32);
const U256_T: AbiType = AbiType::Uint(256);

pub fn action_hash(action: &Action) -> Result<[u8; 32], AbiError> {
    IntentTypeStrings::default().action_hash(action)
}

pub fn relay_fee_hash(relay_fee: &RelayFee) -> Result<[u8; 32], AbiError> {
    IntentTypeStrings::default().relay_fee_hash(relay_fee)
}

/// keccak256 over the packed 32-byte hashes
fn hash_packed(hashes: impl Iterator<Item = [u8; 32]>) -> [u8; 32] {
    let packed: Vec<u8> = hashes.flatten().collect();
    keccak256(&packed)
}

/// Struct hash of an intent without going through the type registry
pub fn intent_struct_hash(intent: &Intent) -> Result<[u8; 32], AbiError> {
    IntentTypeStrings::default().intent_struct_hash(intent)
}

/// Signing digest of an intent via the fixed encoding
pub fn intent_digest(domain: &Domain, intent: &Intent) -> Result<[u8; 32], Eip712Error> {
    IntentTypeStrings::default().intent_digest(domain, intent)
}
