//! Signing capability and the local-key implementation
//!
//! SECURITY: the local signer keeps its secret in a zeroizing buffer and only
//! materializes a `SecretKey` for the duration of one signature.

use rand::RngCore;
use secp256k1::SecretKey;
use std::fmt;
use std::future::Future;
use zeroize::Zeroizing;

use super::SigningError;
use crate::eip712::TypedData;
use crate::signature::{address_of, sign_digest, Digest, Signature, SignatureError};
use crate::utils::crypto::{decode_hex, to_checksum_address};

/// A typed-data document together with the digest it hashes to
#[derive(Debug, Clone)]
pub struct SigningRequest {
    pub typed_data: TypedData,
    pub digest: Digest,
}

impl SigningRequest {
    /// Hash the document; fails before any signer is involved
    pub fn new(typed_data: TypedData) -> Result<Self, SigningError> {
        let digest = Digest(typed_data.digest()?);
        Ok(Self { typed_data, digest })
    }

    pub fn chain_id(&self) -> u64 {
        self.typed_data.domain.chain_id
    }

    pub fn verifying_contract(&self) -> &[u8; 20] {
        &self.typed_data.domain.verifying_contract
    }
}

/// An external key holder able to sign EIP-712 typed data.
///
/// One call is one user-visible approval; callers must not retry on error.
pub trait TypedDataSigner {
    /// Address the signer signs as
    fn address(&self) -> [u8; 20];

    fn sign_typed_data(
        &self,
        request: &SigningRequest,
    ) -> impl Future<Output = Result<Signature, SigningError>> + Send;
}

/// Signs with an in-process secp256k1 key
pub struct LocalKeySigner {
    secret: Zeroizing<[u8; 32]>,
    address: [u8; 20],
}

impl LocalKeySigner {
    /// Create from a raw 32-byte secret
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SigningError> {
        let secret_key = SecretKey::from_slice(bytes)
            .map_err(|e| SignatureError::InvalidPrivateKey(e.to_string()))?;

        let mut secret = Zeroizing::new([0u8; 32]);
        secret.copy_from_slice(bytes);

        Ok(Self {
            secret,
            address: address_of(&secret_key),
        })
    }

    /// Create from a hex secret, with or without `0x`
    pub fn from_hex(hex_key: &str) -> Result<Self, SigningError> {
        let bytes = Zeroizing::new(
            decode_hex(hex_key).map_err(SignatureError::from)?,
        );
        Self::from_bytes(&bytes)
    }

    /// Fresh random key
    pub fn random() -> Self {
        let mut rng = rand::thread_rng();
        loop {
            let mut bytes = Zeroizing::new([0u8; 32]);
            rng.fill_bytes(&mut bytes[..]);
            if let Ok(signer) = Self::from_bytes(&bytes[..]) {
                return signer;
            }
        }
    }

    /// Sign a digest directly
    pub fn sign_digest(&self, digest: &Digest) -> Result<Signature, SigningError> {
        let secret_key = SecretKey::from_slice(&self.secret[..])
            .map_err(|e| SignatureError::InvalidPrivateKey(e.to_string()))?;
        Ok(sign_digest(digest, &secret_key))
    }
}

impl fmt::Debug for LocalKeySigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalKeySigner")
            .field("address", &to_checksum_address(&self.address))
            .finish_non_exhaustive()
    }
}

impl TypedDataSigner for LocalKeySigner {
    fn address(&self) -> [u8; 20] {
        self.address
    }

    /// Re-derives the digest from the document, as a wallet would, before signing
    async fn sign_typed_data(&self, request: &SigningRequest) -> Result<Signature, SigningError> {
        let digest = Digest(request.typed_data.digest()?);
        if digest != request.digest {
            return Err(SigningError::DigestMismatch);
        }
        self.sign_digest(&digest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::recover_address;

    const TEST_KEY: &str = "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

    fn request() -> SigningRequest {
        let typed_data = TypedData::from_json(
            r#"{
                "types": {"Ping": [{"name": "n", "type": "uint256"}]},
                "primaryType": "Ping",
                "domain": {"name": "Ping", "version": "1", "chainId": 1,
                           "verifyingContract": "0x0000000000000000000000000000000000000001"},
                "message": {"n": 1}
            }"#,
        )
        .unwrap();
        SigningRequest::new(typed_data).unwrap()
    }

    #[test]
    fn test_local_signer_address() {
        let signer = LocalKeySigner::from_hex(TEST_KEY).unwrap();
        assert_eq!(
            to_checksum_address(&signer.address()),
            "0x2c7536E3605D9C16a7a3D7b1898e529396a65c23"
        );
        assert!(!format!("{:?}", signer).contains("4c0883"));
    }

    #[test]
    fn test_rejects_invalid_keys() {
        assert!(LocalKeySigner::from_bytes(&[0u8; 32]).is_err());
        assert!(LocalKeySigner::from_hex("0x1234").is_err());
        assert!(LocalKeySigner::from_hex("not hex").is_err());
    }

    #[tokio::test]
    async fn test_sign_typed_data() {
        let signer = LocalKeySigner::random();
        let request = request();

        let signature = signer.sign_typed_data(&request).await.unwrap();
        assert_eq!(recover_address(&request.digest, &signature).unwrap(), signer.address());
    }

    #[tokio::test]
    async fn test_digest_mismatch_refused() {
        let signer = LocalKeySigner::from_hex(TEST_KEY).unwrap();
        let mut request = request();
        request.digest = Digest([0u8; 32]);

        assert_eq!(
            signer.sign_typed_data(&request).await.unwrap_err(),
            SigningError::DigestMismatch
        );
    }
}
