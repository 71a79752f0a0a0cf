//! Contract-code probe
//!
//! Answers whether an address holds contract code, so a verifying contract is
//! never a plain account. Lookups are single-shot; a failure is returned to
//! the caller as is.

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;
use url::Url;

use super::SigningError;
use crate::error::IntentResult;
use crate::utils::config::SignerConfig;
use crate::utils::crypto::{decode_hex, to_checksum_address};
use crate::log_debug;

/// Tells contracts apart from externally owned accounts
pub trait ContractProbe {
    fn is_contract(&self, address: &[u8; 20]) -> Result<bool, SigningError>;
}

/// `eth_getCode` over JSON-RPC.
///
/// Uses the blocking client; call it outside of an async runtime.
pub struct RpcContractProbe {
    client: Client,
    endpoint: Url,
}

impl RpcContractProbe {
    pub fn new(endpoint: Url) -> Result<Self, SigningError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| SigningError::Network(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { client, endpoint })
    }

    /// Probe for the configured RPC endpoint, if there is one
    pub fn from_config(config: &SignerConfig) -> IntentResult<Option<Self>> {
        match config.rpc_endpoint()? {
            Some(endpoint) => Ok(Some(Self::new(endpoint)?)),
            None => Ok(None),
        }
    }
}

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    method: &'static str,
    params: (&'a str, &'static str),
    id: u32,
}

#[derive(Deserialize)]
struct RpcResponse {
    result: Option<String>,
    error: Option<RpcError>,
}

#[derive(Deserialize)]
struct RpcError {
    message: String,
}

impl ContractProbe for RpcContractProbe {
    fn is_contract(&self, address: &[u8; 20]) -> Result<bool, SigningError> {
        let address = to_checksum_address(address);

        let response: RpcResponse = self
            .client
            .post(self.endpoint.clone())
            .json(&RpcRequest {
                jsonrpc: "2.0",
                method: "eth_getCode",
                params: (&address, "latest"),
                id: 1,
            })
            .send()?
            .error_for_status()?
            .json()?;

        if let Some(error) = response.error {
            return Err(SigningError::Rpc(error.message));
        }

        let code = response
            .result
            .ok_or_else(|| SigningError::Rpc("no result in response".to_string()))?;
        let code = decode_hex(&code).map_err(|e| SigningError::Rpc(e.to_string()))?;

        log_debug!("probe", "eth_getCode", address = address, code_len = code.len());
        Ok(!code.is_empty())
    }
}

/// Answers from a fixed set of addresses known to hold code
#[derive(Debug, Clone, Default)]
pub struct StaticContractProbe {
    contracts: BTreeSet<[u8; 20]>,
}

impl StaticContractProbe {
    pub fn new<I>(contracts: I) -> Self
    where
        I: IntoIterator<Item = [u8; 20]>,
    {
        Self {
            contracts: contracts.into_iter().collect(),
        }
    }

    /// The known contracts from configuration
    pub fn from_config(config: &SignerConfig) -> Self {
        Self::new(config.known_contract_addresses())
    }

    pub fn insert(&mut self, address: [u8; 20]) {
        self.contracts.insert(address);
    }
}

impl ContractProbe for StaticContractProbe {
    fn is_contract(&self, address: &[u8; 20]) -> Result<bool, SigningError> {
        Ok(self.contracts.contains(address))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::crypto::parse_address;

    #[test]
    fn test_static_probe_from_config() {
        let probe = StaticContractProbe::from_config(&SignerConfig::default());
        let mainnet = parse_address("0xbF955e4370210697E768dCCeD7866c4456C26849").unwrap();

        assert!(probe.is_contract(&mainnet).unwrap());
        assert!(!probe.is_contract(&[0x42u8; 20]).unwrap());
    }

    #[test]
    fn test_rpc_request_shape() {
        let request = RpcRequest {
            jsonrpc: "2.0",
            method: "eth_getCode",
            params: ("0x0000000000000000000000000000000000000001", "latest"),
            id: 1,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["method"], "eth_getCode");
        assert_eq!(json["params"][1], "latest");
    }

    #[test]
    fn test_no_rpc_configured() {
        assert!(RpcContractProbe::from_config(&SignerConfig::default())
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_unreachable_rpc_is_external_call_error() {
        let probe = RpcContractProbe::new(Url::parse("http://127.0.0.1:9").unwrap()).unwrap();
        let err = probe.is_contract(&[1u8; 20]).unwrap_err();
        assert_eq!(err.code(), crate::error::ErrorCode::ExternalCall);
    }
}
