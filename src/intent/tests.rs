//! Intent schema tests

use super::*;
use crate::abi::{AbiDecoder, AbiValue, U256};
use crate::eip712::{domain_separator, type_hash, TypedData};
use crate::signature::{recover_address, verify_digest, Digest};
use crate::signing::{LocalKeySigner, TypedDataSigner};
use crate::utils::config::SignerConfig;
use crate::utils::crypto::{keccak256, parse_address};

const ROUTER: &str = "0xbF955e4370210697E768dCCeD7866c4456C26849";

fn router_domain() -> crate::eip712::Domain {
    intent_domain(&SignerConfig::default(), 1, parse_address(ROUTER).unwrap())
}

/// One Deposit action, zero addresses and amounts, a single empty input
fn zero_intent() -> Intent {
    Intent::builder([0u8; 20])
        .action(Action::new("Deposit", 1))
        .input(Vec::new())
        .build()
}

fn sample_intent() -> Intent {
    let token = parse_address("0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48").unwrap();
    Intent::builder(parse_address("0x2c7536E3605D9C16a7a3D7b1898e529396a65c23").unwrap())
        .nonce(7u64)
        .deadline(1_893_456_000u64)
        .action(Action {
            protocol: "aave".to_string(),
            protocol_address: [0x11u8; 20],
            token_in: token,
            amount_in: U256::from(1_000_000u64),
            slippage: U256::from(50u64),
            ..Action::new("Deposit", 1)
        })
        .action(Action {
            token_out: token,
            amount_out: U256::from(u128::MAX),
            receiver: [0x22u8; 20],
            ..Action::new("Withdraw", 137)
        })
        .relay_fee(token, 1_000u64)
        .input(vec![0xa9, 0x05, 0x9c, 0xbb])
        .input(Vec::new())
        .build()
}

#[test]
fn test_schema_type_hashes() {
    let registry = intent_registry().unwrap();
    assert_eq!(registry.canonical_type_string("Intent").unwrap(), INTENT_TYPE);
    assert_eq!(registry.canonical_type_string("Actions").unwrap(), ACTIONS_TYPE);
    assert_eq!(
        hex::encode(type_hash(&registry, "Intent").unwrap()),
        "4e7385ddd09de0530f79ed591a6513f47a47fbbefd19818a2a5119ef559b981a"
    );
    assert_eq!(
        hex::encode(type_hash(&registry, "RelayFee").unwrap()),
        "6eac4c4847c4f318ecd1ea9e057fa98a7fe23b5d707a92872d1d75a9366ffb8c"
    );
    assert_eq!(fixed::intent_typehash(), type_hash(&registry, "Intent").unwrap());
    assert_eq!(fixed::actions_typehash(), type_hash(&registry, "Actions").unwrap());

    // EIP-2612 PERMIT_TYPEHASH
    assert_eq!(
        hex::encode(type_hash(&permit_registry().unwrap(), "Permit").unwrap()),
        "6e71edae12b1b97f4d1f60370fef10105fa2faae0126114a169c64845d6126c9"
    );
    assert_eq!(
        hex::encode(type_hash(&dca_registry().unwrap(), "DCAIntent").unwrap()),
        "73936a5610887a3c56b972ab07fc1e49a62f5824b99e0b417ede725eaf5908a2"
    );
}

#[test]
fn test_zero_intent_digest() {
    let domain = router_domain();
    assert_eq!(
        hex::encode(domain_separator(&domain).unwrap()),
        "04eeebb2072e78b7806fd4e19bdcf46c2e5fd304a18846a764649d7692dda0b9"
    );
    assert_eq!(
        hex::encode(zero_intent().digest(&domain).unwrap()),
        "101d2e6f9760959b16723a65a3a2cca36f6b77c9441202665b8b0565aa028540"
    );
}

#[test]
fn test_zero_intent_signature_recovers_signer() {
    // Known test key (DO NOT USE IN PRODUCTION)
    let signer =
        LocalKeySigner::from_hex("4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318").unwrap();
    let expected = parse_address("0x2c7536E3605D9C16a7a3D7b1898e529396a65c23").unwrap();
    assert_eq!(signer.address(), expected);

    let digest = Digest(zero_intent().digest(&router_domain()).unwrap());
    let signature = signer.sign_digest(&digest).unwrap();

    assert_eq!(recover_address(&digest, &signature).unwrap(), expected);
    assert!(verify_digest(&digest, &signature, &expected).unwrap());

    // The same signature does not verify against a different intent
    let other = Digest(sample_intent().digest(&router_domain()).unwrap());
    assert_ne!(recover_address(&other, &signature).unwrap(), expected);
}

#[test]
fn test_generic_matches_fixed_schema() {
    let domain = router_domain();
    for intent in [zero_intent(), sample_intent(), Intent::default()] {
        assert_eq!(
            intent.digest(&domain).unwrap(),
            fixed::intent_digest(&domain, &intent).unwrap()
        );
    }
}

#[test]
fn test_custom_type_strings_change_digest() {
    let domain = router_domain();
    let intent = sample_intent();

    let bundled = fixed::IntentTypeStrings::new(None, None, None);
    assert_eq!(bundled, fixed::IntentTypeStrings::default());
    assert_eq!(
        bundled.intent_digest(&domain, &intent).unwrap(),
        fixed::intent_digest(&domain, &intent).unwrap()
    );

    let relay_fee = "RelayFee(address token,uint256 amount,uint256 gasLimit)";
    let custom = fixed::IntentTypeStrings::new(None, None, Some(relay_fee));
    assert_eq!(custom.intent, INTENT_TYPE);
    assert_eq!(custom.relay_fee_typehash(), keccak256(relay_fee.as_bytes()));
    assert_ne!(
        custom.intent_digest(&domain, &intent).unwrap(),
        fixed::intent_digest(&domain, &intent).unwrap()
    );

    let renamed = fixed::IntentTypeStrings {
        intent: "Order(address owner,uint256 nonce,uint256 deadline,Actions[] actions,RelayFee relayFee,bytes[] inputs)",
        ..Default::default()
    };
    assert_ne!(
        renamed.intent_struct_hash(&intent).unwrap(),
        fixed::intent_struct_hash(&intent).unwrap()
    );
}

#[test]
fn test_intent_typed_data_round_trip() {
    let intent = sample_intent();
    let domain = router_domain();

    let typed_data = intent.typed_data(domain.clone()).unwrap();
    let json = typed_data.to_json().unwrap();
    let parsed = TypedData::from_json(&json).unwrap();

    assert_eq!(parsed.primary_type, "Intent");
    assert_eq!(parsed.digest().unwrap(), intent.digest(&domain).unwrap());
    assert_eq!(parsed.message["inputs"][0], "0xa9059cbb");
}

#[test]
fn test_empty_arrays_hash_empty_input() {
    let empty = Intent::default();
    let action_hashes: Vec<u8> = Vec::new();
    assert_eq!(
        fixed::intent_struct_hash(&empty).unwrap(),
        {
            let mut words = Vec::new();
            words.extend_from_slice(&fixed::intent_typehash());
            words.extend_from_slice(&[0u8; 96]);
            words.extend_from_slice(&keccak256(&action_hashes));
            words.extend_from_slice(&fixed::relay_fee_hash(&RelayFee::default()).unwrap());
            words.extend_from_slice(&keccak256(&[]));
            keccak256(&words)
        }
    );
}

#[test]
fn test_dca_domain() {
    let dca = DcaIntent {
        chain_id: U256::from(1u64),
        amount: U256::from(10u64),
        ..Default::default()
    };
    let domain = dca.domain().unwrap();
    assert_eq!(domain.name, "DCAIntent");
    assert_eq!(domain.verifying_contract, [0u8; 20]);
    assert_eq!(
        hex::encode(domain_separator(&domain).unwrap()),
        "e9ffd2d9295abfe83559151963fcc9835aa4f0b12f747b73aeb6d199677633fa"
    );

    let defaulted = DcaIntent::default().domain().unwrap();
    assert_eq!(defaulted.chain_id, 1);

    let typed_data = dca.typed_data().unwrap();
    assert_eq!(typed_data.digest().unwrap(), dca.digest().unwrap());

    let too_big = DcaIntent {
        chain_id: U256::MAX,
        ..Default::default()
    };
    assert!(too_big.domain().is_err());
}

#[test]
fn test_permit_digest_matches_typed_data() {
    let permit = Permit {
        owner: parse_address("0x1234567890123456789012345678901234567890").unwrap(),
        spender: parse_address("0x0987654321098765432109876543210987654321").unwrap(),
        value: U256::from(1_000_000_000_000_000_000u64),
        nonce: U256::ZERO,
        deadline: U256::from(1_893_456_000u64),
    };
    let domain = crate::eip712::Domain::new(
        "Uniswap V2",
        "1",
        1,
        parse_address("0x7a250d5630B4cF539739dF2C5dAcb4c659F2488D").unwrap(),
    );

    assert_eq!(
        hex::encode(permit.digest(&domain).unwrap()),
        "b12ecaadc287025e1930e51c5d26c10858446146d6a2ad20cac0f4e0ef3d92f1"
    );
}

#[test]
fn test_schema_from_str() {
    assert_eq!("intent".parse::<Schema>().unwrap(), Schema::Intent);
    assert_eq!("DCA".parse::<Schema>().unwrap(), Schema::Dca);
    assert!("order".parse::<Schema>().is_err());
    for schema in Schema::ALL {
        assert!(schema.registry().unwrap().contains(schema.primary_type()));
    }
}

#[test]
fn test_market_params_encoding() {
    let params = MarketParams {
        loan_token: [0x01u8; 20],
        collateral_token: [0x02u8; 20],
        oracle: [0x03u8; 20],
        irm: [0x04u8; 20],
        lltv: U256::from(860_000_000_000_000_000u64),
    };

    // Static tuple: five words inline
    let single = params.encode().unwrap();
    assert_eq!(single.len(), 160);
    assert_eq!(&single[12..32], &[0x01u8; 20]);

    // Dynamic array: offset, length, then the tuples
    let list = MarketParams::encode_list(&[params.clone(), MarketParams::default()]).unwrap();
    assert_eq!(list.len(), 64 + 2 * 160);
    assert_eq!(list[31], 0x20);
    assert_eq!(list[63], 2);
    assert_eq!(&list[64..224], &single[..]);
}

#[test]
fn test_permit_struct_encoding() {
    let signature = crate::signature::Signature::new([0xaau8; 32], [0xbbu8; 32], 28).unwrap();
    let permit = PermitStruct {
        token: [0x01u8; 20],
        owner: [0x02u8; 20],
        value: U256::from(5u64),
        deadline: U256::from(6u64),
        signature,
        relay_fee: U256::from(7u64),
    };

    let encoded = permit.encode().unwrap();
    assert_eq!(encoded.len(), 8 * 32);
    assert_eq!(encoded[4 * 32 + 31], 28);
    assert_eq!(&encoded[5 * 32..6 * 32], &[0xaau8; 32]);
    assert_eq!(encoded[8 * 32 - 1], 7);
}

#[test]
fn test_build_and_execute_encoding_round_trip() {
    let call = BuildAndExecuteCallValue {
        token_out_percent: U256::from(100u64),
        token_out: [0x01u8; 20],
        target: [0x02u8; 20],
        value: U256::ZERO,
        protocol: "uniswap".to_string(),
        action: "swap".to_string(),
        receiver: [0x03u8; 20],
        adaptor_data: vec![0xde, 0xad, 0xbe, 0xef],
    };

    let encoded = call.encode().unwrap();
    // Dynamic tuple: leading offset to the tuple body
    assert_eq!(encoded[31], 0x20);

    let tuple_type = crate::abi::parse_type(BUILD_AND_EXECUTE_CALL_VALUE_TYPE).unwrap();
    let decoded = AbiDecoder::decode(&encoded, &[tuple_type]).unwrap();
    assert_eq!(decoded, vec![call.to_abi_value()]);
    assert!(matches!(&decoded[0], AbiValue::Tuple(fields) if fields.len() == 8));
}
