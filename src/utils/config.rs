//! Signer Configuration
//!
//! Loads and validates runtime settings:
//! - RPC endpoint used by the contract-code probe (TLS enforced outside localhost)
//! - Default EIP-712 domain name and version for intents
//! - Known verifying contracts per chain
//! - Debug logging switch
//!
//! Values come from an optional JSON file, then `INTENT_SIGNER_*` environment
//! variables override them.

use crate::error::{IntentError, IntentResult};
use crate::utils::crypto::parse_address;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use url::Url;

/// Environment variable overriding [`SignerConfig::rpc_url`]
pub const ENV_RPC_URL: &str = "INTENT_SIGNER_RPC_URL";
/// Environment variable overriding [`SignerConfig::debug`]
pub const ENV_DEBUG: &str = "INTENT_SIGNER_DEBUG";
/// Environment variable overriding [`SignerConfig::domain_name`]
pub const ENV_DOMAIN_NAME: &str = "INTENT_SIGNER_DOMAIN_NAME";

/// Hosts allowed to use plain HTTP
const LOCAL_HOSTS: [&str; 3] = ["localhost", "127.0.0.1", "::1"];

/// Runtime configuration for the signer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SignerConfig {
    /// JSON-RPC endpoint for `eth_getCode` lookups
    pub rpc_url: Option<String>,
    /// EIP-712 domain name used for intents
    pub domain_name: String,
    /// EIP-712 domain version used for intents
    pub domain_version: String,
    /// Chain id -> verifying contract known to hold code
    pub known_contracts: BTreeMap<u64, String>,
    /// Emit debug-level log lines
    pub debug: bool,
}

impl Default for SignerConfig {
    fn default() -> Self {
        let mut known_contracts = BTreeMap::new();
        known_contracts.insert(1, "0xbF955e4370210697E768dCCeD7866c4456C26849".to_string());
        known_contracts.insert(56, "0x10ED43C718714eb63d5aA57B78B54704E256024E".to_string());
        known_contracts.insert(137, "0xd9145CCE52D386f254917e481eB44e9943F39138".to_string());
        known_contracts.insert(42161, "0x000000000000Ad05Ccc4F10045630fb830B95127".to_string());

        Self {
            rpc_url: None,
            domain_name: "SuperIntentRouter".to_string(),
            domain_version: "v1".to_string(),
            known_contracts,
            debug: false,
        }
    }
}

impl SignerConfig {
    /// Parse a configuration from JSON; missing keys take their defaults
    pub fn from_json(json: &str) -> IntentResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a JSON file (if given) and apply environment overrides
    pub fn load(path: Option<&Path>) -> IntentResult<Self> {
        let mut config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|e| {
                    IntentError::validation(format!("cannot read config {}", path.display()))
                        .with_details(e.to_string())
                })?;
                serde_json::from_str(&raw)?
            }
            None => Self::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a key lookup (the process environment in [`Self::load`])
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_RPC_URL).filter(|v| !v.trim().is_empty()) {
            self.rpc_url = Some(url.trim().to_string());
        }
        if let Some(name) = lookup(ENV_DOMAIN_NAME).filter(|v| !v.is_empty()) {
            self.domain_name = name;
        }
        if let Some(flag) = lookup(ENV_DEBUG) {
            self.debug = matches!(flag.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }
    }

    /// Validate the RPC endpoint and every known contract address
    pub fn validate(&self) -> IntentResult<()> {
        if let Some(raw) = &self.rpc_url {
            validate_rpc_url(raw)?;
        }

        if self.domain_name.is_empty() {
            return Err(IntentError::validation("domain name must not be empty"));
        }

        for (chain_id, address) in &self.known_contracts {
            parse_address(address).map_err(|e| {
                IntentError::validation(format!("invalid known contract for chain {}", chain_id))
                    .with_details(e.to_string())
            })?;
        }

        Ok(())
    }

    /// Parsed RPC endpoint, if configured
    pub fn rpc_endpoint(&self) -> IntentResult<Option<Url>> {
        self.rpc_url.as_deref().map(validate_rpc_url).transpose()
    }

    /// Known verifying contract for a chain
    pub fn known_contract(&self, chain_id: u64) -> Option<[u8; 20]> {
        self.known_contracts
            .get(&chain_id)
            .and_then(|address| parse_address(address).ok())
    }

    /// All known contracts as raw addresses
    pub fn known_contract_addresses(&self) -> Vec<[u8; 20]> {
        self.known_contracts
            .values()
            .filter_map(|address| parse_address(address).ok())
            .collect()
    }
}

/// Parse an RPC URL, requiring https unless it points at a local node
fn validate_rpc_url(raw: &str) -> IntentResult<Url> {
    let url = Url::parse(raw).map_err(|e| {
        IntentError::validation(format!("invalid RPC URL: {}", raw)).with_details(e.to_string())
    })?;

    match url.scheme() {
        "https" => Ok(url),
        "http" => {
            let host = url.host_str().unwrap_or_default().trim_matches(['[', ']']);
            if LOCAL_HOSTS.contains(&host) {
                Ok(url)
            } else {
                Err(IntentError::validation(format!(
                    "RPC URL must use https outside localhost: {}",
                    raw
                )))
            }
        }
        other => Err(IntentError::validation(format!(
            "unsupported RPC URL scheme: {}",
            other
        ))),
    }
}
