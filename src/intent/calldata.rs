//! ABI encoders for the structs the intent router takes as call arguments

use crate::abi::{parse_type, AbiEncoder, AbiError, AbiType, AbiValue, U256};
use crate::signature::Signature;

/// Morpho-style market identifier
pub const MARKET_PARAMS_TYPE: &str =
    "tuple(address loanToken,address collateralToken,address oracle,address irm,uint256 lltv)";

pub const PERMIT_STRUCT_TYPE: &str = "tuple(address token,address owner,uint256 value,uint256 deadline,uint8 v,bytes32 r,bytes32 s,uint256 relayFee)";

pub const BUILD_AND_EXECUTE_CALL_VALUE_TYPE: &str = "tuple(uint256 tokenOutPercent,address tokenOut,address target,uint256 value,string protocol,string action,address receiver,bytes adaptorData)";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MarketParams {
    pub loan_token: [u8; 20],
    pub collateral_token: [u8; 20],
    pub oracle: [u8; 20],
    pub irm: [u8; 20],
    pub lltv: U256,
}

impl MarketParams {
    pub fn abi_type() -> Result<AbiType, AbiError> {
        parse_type(MARKET_PARAMS_TYPE)
    }

    pub fn to_abi_value(&self) -> AbiValue {
        AbiValue::Tuple(vec![
            AbiValue::Address(self.loan_token),
            AbiValue::Address(self.collateral_token),
            AbiValue::Address(self.oracle),
            AbiValue::Address(self.irm),
            AbiValue::Uint(self.lltv),
        ])
    }

    /// A single MarketParams argument
    pub fn encode(&self) -> Result<Vec<u8>, AbiError> {
        AbiEncoder::encode(&[self.to_abi_value()], &[Self::abi_type()?])
    }

    /// `abi.encode(MarketParams[])`
    pub fn encode_list(list: &[MarketParams]) -> Result<Vec<u8>, AbiError> {
        let list_type = AbiType::Array(Box::new(Self::abi_type()?));
        let values = AbiValue::Array(list.iter().map(MarketParams::to_abi_value).collect());
        AbiEncoder::encode(&[values], &[list_type])
    }
}

/// A signed permit handed to the router together with the relayer fee
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermitStruct {
    pub token: [u8; 20],
    pub owner: [u8; 20],
    pub value: U256,
    pub deadline: U256,
    pub signature: Signature,
    pub relay_fee: U256,
}

impl PermitStruct {
    pub fn to_abi_value(&self) -> AbiValue {
        AbiValue::Tuple(vec![
            AbiValue::Address(self.token),
            AbiValue::Address(self.owner),
            AbiValue::Uint(self.value),
            AbiValue::Uint(self.deadline),
            AbiValue::Uint(U256::from(self.signature.v as u64)),
            AbiValue::FixedBytes(self.signature.r.to_vec()),
            AbiValue::FixedBytes(self.signature.s.to_vec()),
            AbiValue::Uint(self.relay_fee),
        ])
    }

    pub fn encode(&self) -> Result<Vec<u8>, AbiError> {
        AbiEncoder::encode(&[self.to_abi_value()], &[parse_type(PERMIT_STRUCT_TYPE)?])
    }
}

/// One call the router builds and executes on behalf of an intent
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BuildAndExecuteCallValue {
    pub token_out_percent: U256,
    pub token_out: [u8; 20],
    pub target: [u8; 20],
    pub value: U256,
    pub protocol: String,
    pub action: String,
    pub receiver: [u8; 20],
    pub adaptor_data: Vec<u8>,
}

impl BuildAndExecuteCallValue {
    pub fn to_abi_value(&self) -> AbiValue {
        AbiValue::Tuple(vec![
            AbiValue::Uint(self.token_out_percent),
            AbiValue::Address(self.token_out),
            AbiValue::Address(self.target),
            AbiValue::Uint(self.value),
            AbiValue::String(self.protocol.clone()),
            AbiValue::String(self.action.clone()),
            AbiValue::Address(self.receiver),
            AbiValue::Bytes(self.adaptor_data.clone()),
        ])
    }

    pub fn encode(&self) -> Result<Vec<u8>, AbiError> {
        AbiEncoder::encode(
            &[self.to_abi_value()],
            &[parse_type(BUILD_AND_EXECUTE_CALL_VALUE_TYPE)?],
        )
    }
}
