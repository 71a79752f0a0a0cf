//! Function selector derivation and calldata composition

use std::fmt;
use std::str::FromStr;

use super::encoder::AbiEncoder;
use super::parser::FunctionSignature;
use super::types::*;
use crate::utils::crypto::{keccak256, to_hex_prefixed};

/// 4-byte function selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FunctionSelector(pub [u8; 4]);

impl FunctionSelector {
    /// First 4 bytes of keccak256 over the canonical signature
    pub fn from_signature(signature: &str) -> Result<Self, AbiError> {
        let parsed = FunctionSignature::parse(signature)?;
        Ok(Self::from_canonical(&parsed.canonical()))
    }

    /// Hash an already-canonical signature string without parsing it
    pub fn from_canonical(canonical: &str) -> Self {
        let hash = keccak256(canonical.as_bytes());
        FunctionSelector([hash[0], hash[1], hash[2], hash[3]])
    }

    /// Parse a raw selector: exactly 4 bytes of hex, `0x` optional
    pub fn from_hex(s: &str) -> Result<Self, AbiError> {
        let trimmed = s.trim();
        let body = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        if body.len() != 8 {
            return Err(AbiError::InvalidSelector(format!(
                "expected 4 bytes, got {:?}",
                trimmed
            )));
        }
        let bytes = hex::decode(body)
            .map_err(|_| AbiError::InvalidSelector(format!("not hex: {:?}", trimmed)))?;

        let mut selector = [0u8; 4];
        selector.copy_from_slice(&bytes);
        Ok(FunctionSelector(selector))
    }

    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

impl fmt::Display for FunctionSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", to_hex_prefixed(&self.0))
    }
}

impl FromStr for FunctionSelector {
    type Err = AbiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

/// Where a calldata selector comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorSource {
    /// Human-readable signature; also supplies the parameter types
    Signature(String),
    /// Raw 4-byte selector; parameter types supplied separately
    Raw(String),
}

/// Concatenate a selector with the ABI encoding of `values`
pub fn encode_calldata(
    selector: FunctionSelector,
    types: &[AbiType],
    values: &[AbiValue],
) -> Result<Vec<u8>, AbiError> {
    let params = AbiEncoder::encode(values, types)?;

    let mut result = Vec::with_capacity(4 + params.len());
    result.extend_from_slice(&selector.0);
    result.extend_from_slice(&params);
    Ok(result)
}

/// Encode a call from a human-readable signature, taking the types from it
pub fn encode_call(signature: &str, values: &[AbiValue]) -> Result<Vec<u8>, AbiError> {
    let parsed = FunctionSignature::parse(signature)?;
    let types = parsed.input_types();

    if types.len() != values.len() {
        return Err(AbiError::TypeMismatch {
            expected: format!("{} arguments for {}", types.len(), parsed.canonical()),
            got: format!("{} arguments", values.len()),
        });
    }

    let selector = FunctionSelector::from_canonical(&parsed.canonical());
    encode_calldata(selector, &types, values)
}

/// Encode a call from a selector source and user-entered argument text.
///
/// With a signature the types come from it; with a raw selector they must be given.
pub fn encode_call_from_text(
    source: &SelectorSource,
    types: &[AbiType],
    args: &[String],
) -> Result<Vec<u8>, AbiError> {
    let (selector, types) = match source {
        SelectorSource::Signature(signature) => {
            let parsed = FunctionSignature::parse(signature)?;
            (
                FunctionSelector::from_canonical(&parsed.canonical()),
                parsed.input_types(),
            )
        }
        SelectorSource::Raw(raw) => (FunctionSelector::from_hex(raw)?, types.to_vec()),
    };

    if types.len() != args.len() {
        return Err(AbiError::TypeMismatch {
            expected: format!("{} arguments", types.len()),
            got: format!("{} arguments", args.len()),
        });
    }

    let values = types
        .iter()
        .zip(args)
        .map(|(t, arg)| AbiValue::parse_param(t, arg))
        .collect::<Result<Vec<_>, _>>()?;

    encode_calldata(selector, &types, &values)
}

/// Well-known function selectors
pub struct KnownSelectors;

impl KnownSelectors {
    pub const TRANSFER: [u8; 4] = [0xa9, 0x05, 0x9c, 0xbb]; // transfer(address,uint256)
    pub const APPROVE: [u8; 4] = [0x09, 0x5e, 0xa7, 0xb3]; // approve(address,uint256)
    pub const TRANSFER_FROM: [u8; 4] = [0x23, 0xb8, 0x72, 0xdd]; // transferFrom(address,address,uint256)
    pub const BALANCE_OF: [u8; 4] = [0x70, 0xa0, 0x82, 0x31]; // balanceOf(address)
    pub const PERMIT: [u8; 4] = [0xd5, 0x05, 0xac, 0xcf]; // permit(address,address,uint256,uint256,uint8,bytes32,bytes32)

    /// Identify a function by its selector
    pub fn identify(selector: &FunctionSelector) -> Option<&'static str> {
        match selector.0 {
            Self::TRANSFER => Some("transfer(address,uint256)"),
            Self::APPROVE => Some("approve(address,uint256)"),
            Self::TRANSFER_FROM => Some("transferFrom(address,address,uint256)"),
            Self::BALANCE_OF => Some("balanceOf(address)"),
            Self::PERMIT => Some("permit(address,address,uint256,uint256,uint8,bytes32,bytes32)"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_transfer_selector() {
        let selector = FunctionSelector::from_signature("transfer(address,uint256)").unwrap();
        assert_eq!(selector.0, KnownSelectors::TRANSFER);
        assert_eq!(selector.to_string(), "0xa9059cbb");
    }

    #[test]
    fn test_selector_canonicalizes_aliases_and_names() {
        let a = FunctionSelector::from_signature("function transfer(address to, uint amount)").unwrap();
        assert_eq!(a.0, KnownSelectors::TRANSFER);
    }

    #[test]
    fn test_known_selectors_match_derivation() {
        for known in [
            KnownSelectors::TRANSFER,
            KnownSelectors::APPROVE,
            KnownSelectors::TRANSFER_FROM,
            KnownSelectors::BALANCE_OF,
            KnownSelectors::PERMIT,
        ] {
            let selector = FunctionSelector(known);
            let signature = KnownSelectors::identify(&selector).unwrap();
            assert_eq!(FunctionSelector::from_signature(signature).unwrap(), selector);
        }
    }

    #[test]
    fn test_raw_selector() {
        assert_eq!(FunctionSelector::from_hex("0xa9059cbb").unwrap().0, KnownSelectors::TRANSFER);
        assert_eq!(FunctionSelector::from_hex("a9059cbb").unwrap().0, KnownSelectors::TRANSFER);

        for bad in ["0xa9059c", "0xa9059cbb00", "0xzz059cbb", ""] {
            let err = FunctionSelector::from_hex(bad).unwrap_err();
            assert!(matches!(err, AbiError::InvalidSelector(_)), "{}", bad);
            assert_eq!(err.code(), ErrorCode::Validation);
        }
    }

    #[test]
    fn test_encode_call_transfer() {
        let mut to = [0u8; 20];
        to[0] = 0xab;
        to[19] = 0xcd;

        let calldata = encode_call(
            "transfer(address,uint256)",
            &[AbiValue::Address(to), AbiValue::uint(1000)],
        )
        .unwrap();

        // 4 bytes selector + 32 bytes address + 32 bytes amount
        assert_eq!(calldata.len(), 68);
        assert_eq!(&calldata[..4], &KnownSelectors::TRANSFER);
        assert_eq!(calldata[16], 0xab);
        assert_eq!(&calldata[66..], &[0x03, 0xe8]);
    }

    #[test]
    fn test_encode_call_arity() {
        let err = encode_call("transfer(address,uint256)", &[AbiValue::Address([0; 20])]).unwrap_err();
        assert_eq!(err.code(), ErrorCode::Validation);
    }

    #[test]
    fn test_encode_call_from_text_raw_selector() {
        let calldata = encode_call_from_text(
            &SelectorSource::Raw("0x70a08231".to_string()),
            &[AbiType::Address],
            &["0x0000000000000000000000000000000000000001".to_string()],
        )
        .unwrap();

        assert_eq!(&calldata[..4], &KnownSelectors::BALANCE_OF);
        assert_eq!(calldata.len(), 36);
        assert_eq!(calldata[35], 1);
    }

    #[test]
    fn test_encode_call_from_text_tuple_argument() {
        let calldata = encode_call_from_text(
            &SelectorSource::Signature(
                "supply(tuple(address loanToken,address collateralToken,address oracle,address irm,uint256 lltv) marketParams,uint256 assets)".to_string(),
            ),
            &[],
            &[
                r#"["0x0000000000000000000000000000000000000001","0x0000000000000000000000000000000000000002","0x0000000000000000000000000000000000000003","0x0000000000000000000000000000000000000004","860000000000000000"]"#.to_string(),
                "1000".to_string(),
            ],
        )
        .unwrap();

        // static tuple inline: 5 words + 1 word
        assert_eq!(calldata.len(), 4 + 6 * 32);
        assert_eq!(calldata[4 + 31], 1);
        assert_eq!(calldata[4 + 3 * 32 + 31], 4);
    }
}
