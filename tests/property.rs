use intent_signer::abi::{AbiDecoder, AbiEncoder, AbiType, AbiValue, I256, U256};
use intent_signer::intent::{fixed, intent_domain, Action, Intent};
use intent_signer::signature::{recover_address, sign_digest, address_of, Digest, Signature};
use intent_signer::utils::config::SignerConfig;
use intent_signer::{keccak256, to_checksum_address};
use proptest::prelude::*;
use secp256k1::SecretKey;

fn any_secret_key() -> impl Strategy<Value = SecretKey> {
    prop::array::uniform32(any::<u8>()).prop_filter_map("valid secp256k1 scalar", |bytes| {
        SecretKey::from_slice(&bytes).ok()
    })
}

fn any_u256() -> impl Strategy<Value = U256> {
    prop::array::uniform32(any::<u8>()).prop_map(|bytes| U256::from_be_bytes(&bytes))
}

fn any_action() -> impl Strategy<Value = Action> {
    (
        "[A-Za-z]{0,12}",
        "[a-z0-9 ]{0,16}",
        prop::array::uniform20(any::<u8>()),
        any::<u64>(),
        any_u256(),
        prop::array::uniform20(any::<u8>()),
    )
        .prop_map(|(name, protocol, token, chain_id, amount, receiver)| Action {
            protocol,
            token_in: token,
            amount_in: amount,
            receiver,
            ..Action::new(name, chain_id)
        })
}

fn any_intent() -> impl Strategy<Value = Intent> {
    (
        prop::array::uniform20(any::<u8>()),
        any::<u64>(),
        prop::collection::vec(any_action(), 0..4),
        prop::collection::vec(prop::collection::vec(any::<u8>(), 0..80), 0..3),
    )
        .prop_map(|(owner, nonce, actions, inputs)| {
            let mut builder = Intent::builder(owner).nonce(nonce).deadline(nonce / 2);
            for action in actions {
                builder = builder.action(action);
            }
            for input in inputs {
                builder = builder.input(input);
            }
            builder.build()
        })
}

/// All-zero, all-one or random word; the zero and all-one words hit the range bounds
fn any_word_fill() -> impl Strategy<Value = [u8; 32]> {
    prop_oneof![
        Just([0u8; 32]),
        Just([0xffu8; 32]),
        prop::array::uniform32(any::<u8>()),
    ]
}

/// `uintN` value built from the low `width` bytes of `fill`
fn uint_word(width: usize, mut fill: [u8; 32]) -> U256 {
    for b in &mut fill[..32 - width] {
        *b = 0;
    }
    U256::from_be_bytes(&fill)
}

/// `intN` value: the low `width` bytes of `fill`, sign-extended
fn int_word(width: usize, mut fill: [u8; 32]) -> I256 {
    let extension = if fill[32 - width] & 0x80 != 0 { 0xff } else { 0 };
    for b in &mut fill[..32 - width] {
        *b = extension;
    }
    I256::from_be_bytes(&fill)
}

fn any_leaf_type() -> impl Strategy<Value = AbiType> {
    prop_oneof![
        (1usize..=32).prop_map(|width| AbiType::Uint(width * 8)),
        (1usize..=32).prop_map(|width| AbiType::Int(width * 8)),
        (1usize..=32).prop_map(AbiType::FixedBytes),
        Just(AbiType::Address),
        Just(AbiType::Bool),
        Just(AbiType::Bytes),
        Just(AbiType::String),
    ]
}

/// Nested tuples, dynamic arrays and fixed arrays over any element type
fn any_abi_type() -> impl Strategy<Value = AbiType> {
    any_leaf_type().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 1..4).prop_map(AbiType::Tuple),
            inner.clone().prop_map(|t| AbiType::Array(Box::new(t))),
            (inner, 1usize..4).prop_map(|(t, k)| AbiType::FixedArray(Box::new(t), k)),
        ]
    })
}

/// Values that fit `abi_type`, including the edges of every integer range
fn value_for(abi_type: &AbiType) -> BoxedStrategy<AbiValue> {
    match abi_type {
        AbiType::Uint(bits) => {
            let width = bits / 8;
            any_word_fill()
                .prop_map(move |fill| AbiValue::Uint(uint_word(width, fill)))
                .boxed()
        }
        AbiType::Int(bits) => {
            let width = bits / 8;
            // 0x7f over all-one is intN max, 0x80 over all-zero is intN min
            let top = prop_oneof![Just(None), Just(Some(0x7fu8)), Just(Some(0x80u8))];
            (any_word_fill(), top)
                .prop_map(move |(mut fill, top)| {
                    if let Some(top) = top {
                        fill[32 - width] = top;
                    }
                    AbiValue::Int(int_word(width, fill))
                })
                .boxed()
        }
        AbiType::FixedBytes(n) => prop::collection::vec(any::<u8>(), *n)
            .prop_map(AbiValue::FixedBytes)
            .boxed(),
        AbiType::Address => prop::array::uniform20(any::<u8>()).prop_map(AbiValue::Address).boxed(),
        AbiType::Bool => any::<bool>().prop_map(AbiValue::Bool).boxed(),
        AbiType::Bytes => prop::collection::vec(any::<u8>(), 0..70).prop_map(AbiValue::Bytes).boxed(),
        AbiType::String => ".{0,20}".prop_map(AbiValue::String).boxed(),
        AbiType::Array(inner) => prop::collection::vec(value_for(inner), 0..4)
            .prop_map(AbiValue::Array)
            .boxed(),
        AbiType::FixedArray(inner, k) => prop::collection::vec(value_for(inner), *k)
            .prop_map(AbiValue::Array)
            .boxed(),
        AbiType::Tuple(types) => types
            .iter()
            .map(value_for)
            .collect::<Vec<_>>()
            .prop_map(AbiValue::Tuple)
            .boxed(),
    }
}

fn any_typed_values() -> impl Strategy<Value = (Vec<AbiType>, Vec<AbiValue>)> {
    prop::collection::vec(any_abi_type(), 1..4).prop_flat_map(|types| {
        let values: Vec<_> = types.iter().map(value_for).collect();
        (Just(types), values)
    })
}

/// Shapes that mix static and dynamic members at every level
const COMPOUND_TYPES: &[&str] = &[
    "(uint256,string,bytes)",
    "(int8,(bytes3,string[]),bool)",
    "string[3]",
    "bytes[2][]",
    "(uint256,string)[]",
    "(address,bytes32)[2]",
    "(string,uint16)[2][]",
];

proptest! {
    #[test]
    fn checksum_addresses_roundtrip(bytes in prop::array::uniform20(any::<u8>())) {
        let checksummed = to_checksum_address(&bytes);
        prop_assert!(checksummed.starts_with("0x"));

        let tail = checksummed.trim_start_matches("0x");
        let lower_expected = hex::encode(bytes);
        prop_assert_eq!(tail.to_ascii_lowercase(), lower_expected.clone());

        let hash = keccak256(lower_expected.as_bytes());
        let mut expected = String::from("0x");
        for (i, ch) in lower_expected.chars().enumerate() {
            let byte = hash[i / 2];
            let nibble = if i % 2 == 0 { byte >> 4 } else { byte & 0x0f };
            if ch.is_ascii_digit() || nibble < 8 {
                expected.push(ch);
            } else {
                expected.push(ch.to_ascii_uppercase());
            }
        }
        prop_assert_eq!(checksummed, expected);
    }

    #[test]
    fn signatures_recover_their_signer(secret in any_secret_key(), digest in prop::array::uniform32(any::<u8>())) {
        let digest = Digest(digest);
        let signature = sign_digest(&digest, &secret);
        prop_assert!(signature.v == 27 || signature.v == 28);
        prop_assert_eq!(recover_address(&digest, &signature).unwrap(), address_of(&secret));

        // Compact and 65-byte forms carry the same signature
        let compact = Signature::split(&signature.to_compact().unwrap()).unwrap();
        prop_assert_eq!(compact, signature);
    }

    #[test]
    fn dynamic_values_decode_to_what_was_encoded(
        data in prop::collection::vec(any::<u8>(), 0..100),
        text in ".{0,40}",
        words in prop::collection::vec(any_u256(), 0..5),
    ) {
        let types = vec![
            AbiType::Bytes,
            AbiType::String,
            AbiType::Array(Box::new(AbiType::Uint(256))),
        ];
        let values = vec![
            AbiValue::Bytes(data),
            AbiValue::String(text),
            AbiValue::Array(words.into_iter().map(AbiValue::Uint).collect()),
        ];

        let encoded = AbiEncoder::encode(&values, &types).unwrap();
        prop_assert_eq!(encoded.len() % 32, 0);
        prop_assert_eq!(AbiDecoder::decode(&encoded, &types).unwrap(), values);
    }

    #[test]
    fn any_abi_values_decode_to_what_was_encoded((types, values) in any_typed_values()) {
        let encoded = AbiEncoder::encode(&values, &types).unwrap();
        prop_assert_eq!(encoded.len() % 32, 0);
        prop_assert_eq!(AbiDecoder::decode(&encoded, &types).unwrap(), values);
    }

    #[test]
    fn compound_values_decode_to_what_was_encoded(
        (abi_type, value) in prop::sample::select(COMPOUND_TYPES).prop_flat_map(|name| {
            let abi_type: AbiType = name.parse().unwrap();
            let values = value_for(&abi_type);
            (Just(abi_type), values)
        }),
        head in any_word_fill(),
    ) {
        // A static word in front shifts every offset of the compound value
        let types = vec![AbiType::Uint(256), abi_type];
        let values = vec![AbiValue::Uint(U256::from_be_bytes(&head)), value];

        let encoded = AbiEncoder::encode(&values, &types).unwrap();
        prop_assert_eq!(AbiDecoder::decode(&encoded, &types).unwrap(), values);
    }

    #[test]
    fn integer_bounds_are_exact(width in 1usize..=32) {
        let bits = width * 8;

        let max = AbiValue::Uint(uint_word(width, [0xff; 32]));
        let encoded = AbiEncoder::encode(&[max.clone()], &[AbiType::Uint(bits)]).unwrap();
        prop_assert_eq!(AbiDecoder::decode(&encoded, &[AbiType::Uint(bits)]).unwrap(), vec![max]);

        let mut fill = [0u8; 32];
        fill[32 - width] = 0x80;
        let min = AbiValue::Int(int_word(width, fill));
        let encoded = AbiEncoder::encode(&[min.clone()], &[AbiType::Int(bits)]).unwrap();
        prop_assert_eq!(AbiDecoder::decode(&encoded, &[AbiType::Int(bits)]).unwrap(), vec![min]);

        // One past the bound no longer fits
        if width < 32 {
            let mut over = [0u8; 32];
            over[31 - width] = 1;
            let value = AbiValue::Uint(U256::from_be_bytes(&over));
            prop_assert!(AbiEncoder::encode(&[value], &[AbiType::Uint(bits)]).is_err());

            let mut below = [0xffu8; 32];
            below[32 - width] = 0x7f;
            let value = AbiValue::Int(I256::from_be_bytes(&below));
            prop_assert!(AbiEncoder::encode(&[value], &[AbiType::Int(bits)]).is_err());
        }
    }

    #[test]
    fn registry_hashing_matches_fixed_intent_encoding(intent in any_intent(), chain_id in 1u64..100_000) {
        let config = SignerConfig::default();
        let domain = intent_domain(&config, chain_id, [0x42u8; 20]);
        prop_assert_eq!(
            intent.digest(&domain).unwrap(),
            fixed::intent_digest(&domain, &intent).unwrap()
        );
    }
}
