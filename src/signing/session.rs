//! Pre-flight validation and single-shot submission

use serde::Serialize;

use super::{ContractProbe, SigningError, SigningRequest, TypedDataSigner};
use crate::signature::{recover_address, Digest, Signature};
use crate::utils::crypto::to_checksum_address;
use crate::{log_info, log_warn};

/// A request that passed pre-flight checks for one signer.
///
/// [`PreparedSigning::submit`] consumes it, so each preparation maps to
/// exactly one request to the external signer.
#[derive(Debug)]
pub struct PreparedSigning {
    request: SigningRequest,
    signer: [u8; 20],
}

/// A verified signature over a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedMessage {
    pub digest: Digest,
    pub signature: Signature,
    pub signer: String,
}

/// Validate a request before it reaches the signer:
/// - chain id is non-zero
/// - the verifying contract is not the signer's own address
/// - the verifying contract holds code according to `probe`
pub fn preflight<P>(
    request: SigningRequest,
    signer: [u8; 20],
    probe: &P,
) -> Result<PreparedSigning, SigningError>
where
    P: ContractProbe + ?Sized,
{
    if request.chain_id() == 0 {
        return Err(SigningError::Preflight("chain id must be non-zero".to_string()));
    }

    let contract = *request.verifying_contract();
    if contract == signer {
        return Err(SigningError::Preflight(
            "verifying contract cannot be the signer's own address".to_string(),
        ));
    }

    if !probe.is_contract(&contract)? {
        log_warn!(
            "signing",
            "Verifying contract has no code",
            contract = to_checksum_address(&contract)
        );
        return Err(SigningError::Preflight(format!(
            "{} is not a contract",
            to_checksum_address(&contract)
        )));
    }

    Ok(PreparedSigning { request, signer })
}

impl PreparedSigning {
    pub fn request(&self) -> &SigningRequest {
        &self.request
    }

    pub fn digest(&self) -> Digest {
        self.request.digest
    }

    /// Send the request to `signer` once and check who signed it
    pub async fn submit<S>(self, signer: &S) -> Result<SignedMessage, SigningError>
    where
        S: TypedDataSigner,
    {
        if signer.address() != self.signer {
            return Err(SigningError::Preflight(
                "request was prepared for a different signer".to_string(),
            ));
        }

        let digest = self.request.digest;
        log_info!(
            "signing",
            "Requesting signature",
            primary_type = self.request.typed_data.primary_type,
            digest = digest,
        );

        let signature = signer.sign_typed_data(&self.request).await?;

        let recovered = recover_address(&digest, &signature)?;
        if recovered != self.signer {
            return Err(SigningError::SignerMismatch {
                expected: to_checksum_address(&self.signer),
                recovered: to_checksum_address(&recovered),
            });
        }

        log_info!("signing", "Signature verified", signer = to_checksum_address(&recovered));

        Ok(SignedMessage {
            digest,
            signature,
            signer: to_checksum_address(&recovered),
        })
    }
}
