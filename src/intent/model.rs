//! Intent, permit and DCA message values

use serde_json::Value as Json;

use super::schema::{dca_domain, Schema};
use crate::abi::{AbiValue, U256};
use crate::eip712::{hash_typed_message, Domain, Eip712Error, TypedData, TypedValue};

fn uint(value: U256) -> TypedValue {
    TypedValue::Atomic(AbiValue::Uint(value))
}

/// Hash `value` under `domain` for one of the bundled schemas
fn schema_digest(schema: Schema, domain: &Domain, value: &TypedValue) -> Result<[u8; 32], Eip712Error> {
    hash_typed_message(domain, &schema.registry()?, schema.primary_type(), value)
}

fn schema_typed_data(schema: Schema, domain: Domain, value: &TypedValue) -> Result<TypedData, Eip712Error> {
    TypedData::new(&schema.registry()?, schema.primary_type(), domain, value.to_json())
}

/// One step of an intent
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Action {
    pub action: String,
    pub protocol: String,
    pub protocol_address: [u8; 20],
    pub chain_id: U256,
    pub token_in: [u8; 20],
    pub amount_in: U256,
    pub token_out: [u8; 20],
    pub amount_out: U256,
    pub receiver: [u8; 20],
    pub slippage: U256,
}

impl Action {
    /// Action with zero addresses and amounts
    pub fn new(action: impl Into<String>, chain_id: u64) -> Self {
        Self {
            action: action.into(),
            chain_id: U256::from(chain_id),
            ..Default::default()
        }
    }

    pub fn to_value(&self) -> TypedValue {
        TypedValue::from_fields([
            ("action", TypedValue::string(&self.action)),
            ("protocol", TypedValue::string(&self.protocol)),
            ("protocolAddress", TypedValue::address(self.protocol_address)),
            ("chainId", uint(self.chain_id)),
            ("tokenIn", TypedValue::address(self.token_in)),
            ("amountIn", uint(self.amount_in)),
            ("tokenOut", TypedValue::address(self.token_out)),
            ("amountOut", uint(self.amount_out)),
            ("receiver", TypedValue::address(self.receiver)),
            ("slippage", uint(self.slippage)),
        ])
    }
}

/// Fee paid to the relayer submitting the intent
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RelayFee {
    pub token: [u8; 20],
    pub amount: U256,
}

impl RelayFee {
    pub fn to_value(&self) -> TypedValue {
        TypedValue::from_fields([
            ("token", TypedValue::address(self.token)),
            ("amount", uint(self.amount)),
        ])
    }
}

/// A signed instruction for the intent router
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Intent {
    pub owner: [u8; 20],
    pub nonce: U256,
    pub deadline: U256,
    pub actions: Vec<Action>,
    pub relay_fee: RelayFee,
    pub inputs: Vec<Vec<u8>>,
}

impl Intent {
    pub fn builder(owner: [u8; 20]) -> IntentBuilder {
        IntentBuilder {
            intent: Intent {
                owner,
                ..Default::default()
            },
        }
    }

    pub fn to_value(&self) -> TypedValue {
        TypedValue::from_fields([
            ("owner", TypedValue::address(self.owner)),
            ("nonce", uint(self.nonce)),
            ("deadline", uint(self.deadline)),
            (
                "actions",
                TypedValue::Array(self.actions.iter().map(Action::to_value).collect()),
            ),
            ("relayFee", self.relay_fee.to_value()),
            (
                "inputs",
                TypedValue::Array(self.inputs.iter().map(|i| TypedValue::bytes(i.clone())).collect()),
            ),
        ])
    }

    /// The message as a JSON object for `eth_signTypedData_v4`
    pub fn message_json(&self) -> Json {
        self.to_value().to_json()
    }

    pub fn typed_data(&self, domain: Domain) -> Result<TypedData, Eip712Error> {
        schema_typed_data(Schema::Intent, domain, &self.to_value())
    }

    pub fn digest(&self, domain: &Domain) -> Result<[u8; 32], Eip712Error> {
        schema_digest(Schema::Intent, domain, &self.to_value())
    }
}

/// Builder for [`Intent`]
#[derive(Debug, Clone)]
pub struct IntentBuilder {
    intent: Intent,
}

impl IntentBuilder {
    pub fn nonce(mut self, nonce: impl Into<U256>) -> Self {
        self.intent.nonce = nonce.into();
        self
    }

    pub fn deadline(mut self, deadline: impl Into<U256>) -> Self {
        self.intent.deadline = deadline.into();
        self
    }

    pub fn action(mut self, action: Action) -> Self {
        self.intent.actions.push(action);
        self
    }

    pub fn relay_fee(mut self, token: [u8; 20], amount: impl Into<U256>) -> Self {
        self.intent.relay_fee = RelayFee {
            token,
            amount: amount.into(),
        };
        self
    }

    /// Append one opaque input (usually encoded calldata)
    pub fn input(mut self, input: impl Into<Vec<u8>>) -> Self {
        self.intent.inputs.push(input.into());
        self
    }

    pub fn build(self) -> Intent {
        self.intent
    }
}

/// EIP-2612 permit
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Permit {
    pub owner: [u8; 20],
    pub spender: [u8; 20],
    pub value: U256,
    pub nonce: U256,
    pub deadline: U256,
}

impl Permit {
    pub fn to_value(&self) -> TypedValue {
        TypedValue::from_fields([
            ("owner", TypedValue::address(self.owner)),
            ("spender", TypedValue::address(self.spender)),
            ("value", uint(self.value)),
            ("nonce", uint(self.nonce)),
            ("deadline", uint(self.deadline)),
        ])
    }

    /// Typed data under the token's own domain (token name, version, chain, token address)
    pub fn typed_data(&self, domain: Domain) -> Result<TypedData, Eip712Error> {
        schema_typed_data(Schema::Permit, domain, &self.to_value())
    }

    pub fn digest(&self, domain: &Domain) -> Result<[u8; 32], Eip712Error> {
        schema_digest(Schema::Permit, domain, &self.to_value())
    }
}

/// Dollar-cost-averaging order
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DcaIntent {
    pub chain_id: U256,
    pub src_token: [u8; 20],
    pub dst_token: [u8; 20],
    pub amount: U256,
    pub interval: U256,
    pub price_impact: U256,
    pub epoch: U256,
}

impl DcaIntent {
    pub fn to_value(&self) -> TypedValue {
        TypedValue::from_fields([
            ("chainId", uint(self.chain_id)),
            ("srcToken", TypedValue::address(self.src_token)),
            ("dstToken", TypedValue::address(self.dst_token)),
            ("amount", uint(self.amount)),
            ("interval", uint(self.interval)),
            ("priceImpact", uint(self.price_impact)),
            ("epoch", uint(self.epoch)),
        ])
    }

    /// The DCA domain on this intent's chain; chain id 0 means mainnet
    pub fn domain(&self) -> Result<Domain, Eip712Error> {
        let chain_id = match self.chain_id.to_u64() {
            Some(0) => 1,
            Some(id) => id,
            None => {
                return Err(Eip712Error::InvalidDomain(format!(
                    "chainId {} does not fit in 64 bits",
                    self.chain_id
                )))
            }
        };
        Ok(dca_domain(chain_id))
    }

    pub fn typed_data(&self) -> Result<TypedData, Eip712Error> {
        schema_typed_data(Schema::Dca, self.domain()?, &self.to_value())
    }

    pub fn digest(&self) -> Result<[u8; 32], Eip712Error> {
        schema_digest(Schema::Dca, &self.domain()?, &self.to_value())
    }
}
