//! Signing and address recovery over raw digests

use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};

use super::{Digest, Signature, SignatureError};
use crate::eip712::TypedData;
use crate::error::IntentResult;
use crate::utils::crypto::{keccak256, to_checksum_address};

/// Sign a digest directly (no prefix applied)
pub fn sign_digest(digest: &Digest, secret_key: &SecretKey) -> Signature {
    let secp = Secp256k1::new();
    let message = Message::from_digest(digest.0);

    let (recovery_id, compact) = secp
        .sign_ecdsa_recoverable(&message, secret_key)
        .serialize_compact();

    let mut r = [0u8; 32];
    let mut s = [0u8; 32];
    r.copy_from_slice(&compact[..32]);
    s.copy_from_slice(&compact[32..]);

    // libsecp256k1 only produces recovery ids 0 and 1 for low-s signatures
    Signature {
        r,
        s,
        v: 27 + (recovery_id.to_i32() as u8 & 1),
    }
}

/// Sign a digest with a raw 32-byte private key
pub fn sign_hash(hash: &[u8], private_key: &[u8]) -> Result<Signature, SignatureError> {
    if private_key.len() != 32 {
        return Err(SignatureError::InvalidPrivateKey(format!(
            "expected 32 bytes, got {}",
            private_key.len()
        )));
    }

    let digest = Digest::from_slice(hash)?;
    let secret_key = SecretKey::from_slice(private_key)
        .map_err(|e| SignatureError::InvalidPrivateKey(e.to_string()))?;

    Ok(sign_digest(&digest, &secret_key))
}

/// Recover the signer's address from a digest and signature
pub fn recover_address(digest: &Digest, signature: &Signature) -> Result<[u8; 20], SignatureError> {
    if signature.v != 27 && signature.v != 28 {
        return Err(SignatureError::InvalidRecoveryId(signature.v));
    }

    let recovery_id = RecoveryId::from_i32(signature.recovery_id() as i32)
        .map_err(|e| SignatureError::InvalidSignature(e.to_string()))?;

    let mut compact = [0u8; 64];
    compact[..32].copy_from_slice(&signature.r);
    compact[32..].copy_from_slice(&signature.s);

    let recoverable = RecoverableSignature::from_compact(&compact, recovery_id)
        .map_err(|e| SignatureError::InvalidSignature(e.to_string()))?;

    let secp = Secp256k1::new();
    let public_key = secp
        .recover_ecdsa(&Message::from_digest(digest.0), &recoverable)
        .map_err(|e| SignatureError::InvalidSignature(format!("recovery failed: {}", e)))?;

    Ok(public_key_to_address(&public_key))
}

/// Recovered signer as an EIP-55 checksummed string
pub fn recover_checksum_address(
    digest: &Digest,
    signature: &Signature,
) -> Result<String, SignatureError> {
    Ok(to_checksum_address(&recover_address(digest, signature)?))
}

/// True when `signature` over `digest` was produced by `expected`.
///
/// The digest is taken as given; use [`verify_typed_data`] to re-derive it from
/// the signed document.
pub fn verify_digest(
    digest: &Digest,
    signature: &Signature,
    expected: &[u8; 20],
) -> Result<bool, SignatureError> {
    Ok(recover_address(digest, signature)? == *expected)
}

/// Recompute the digest of `typed_data` and check the signer
pub fn verify_typed_data(
    typed_data: &TypedData,
    signature: &Signature,
    expected: &[u8; 20],
) -> IntentResult<bool> {
    let digest = Digest(typed_data.digest()?);
    Ok(verify_digest(&digest, signature, expected)?)
}

/// Ethereum address of a secret key
pub fn address_of(secret_key: &SecretKey) -> [u8; 20] {
    let secp = Secp256k1::new();
    public_key_to_address(&PublicKey::from_secret_key(&secp, secret_key))
}

/// Low 20 bytes of keccak256 over the uncompressed key without its 0x04 prefix
pub fn public_key_to_address(public_key: &PublicKey) -> [u8; 20] {
    let uncompressed = public_key.serialize_uncompressed();
    let hash = keccak256(&uncompressed[1..]);

    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..]);
    address
}
