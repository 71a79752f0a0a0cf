//! Type schemas and domains for the intent, permit and DCA flows

use crate::eip712::{Domain, Eip712Error, TypeDefinition, TypeRegistry};
use crate::utils::config::SignerConfig;

pub const ACTIONS_TYPE: &str = "Actions(string action,string protocol,address protocolAddress,uint256 chainId,address tokenIn,uint256 amountIn,address tokenOut,uint256 amountOut,address receiver,uint256 slippage)";

pub const RELAY_FEE_TYPE: &str = "RelayFee(address token,uint256 amount)";

/// `encodeType(Intent)`, dependencies included
pub const INTENT_TYPE: &str = "Intent(address owner,uint256 nonce,uint256 deadline,Actions[] actions,RelayFee relayFee,bytes[] inputs)Actions(string action,string protocol,address protocolAddress,uint256 chainId,address tokenIn,uint256 amountIn,address tokenOut,uint256 amountOut,address receiver,uint256 slippage)RelayFee(address token,uint256 amount)";

/// EIP-2612 permit
pub const PERMIT_TYPE: &str =
    "Permit(address owner,address spender,uint256 value,uint256 nonce,uint256 deadline)";

pub const DCA_INTENT_TYPE: &str = "DCAIntent(uint256 chainId,address srcToken,address dstToken,uint256 amount,uint256 interval,uint256 priceImpact,uint256 epoch)";

pub const DCA_DOMAIN_NAME: &str = "DCAIntent";
pub const DCA_DOMAIN_VERSION: &str = "1";

/// The signing flows this crate ships schemas for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Schema {
    Intent,
    Permit,
    Dca,
}

impl Schema {
    pub const ALL: [Schema; 3] = [Schema::Intent, Schema::Permit, Schema::Dca];

    pub fn primary_type(&self) -> &'static str {
        match self {
            Schema::Intent => "Intent",
            Schema::Permit => "Permit",
            Schema::Dca => "DCAIntent",
        }
    }

    /// The full `encodeType` string of the primary type
    pub fn encoded_type(&self) -> &'static str {
        match self {
            Schema::Intent => INTENT_TYPE,
            Schema::Permit => PERMIT_TYPE,
            Schema::Dca => DCA_INTENT_TYPE,
        }
    }

    pub fn registry(&self) -> Result<TypeRegistry, Eip712Error> {
        registry_from_encoded(self.encoded_type())
    }
}

impl std::str::FromStr for Schema {
    type Err = Eip712Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "intent" => Ok(Schema::Intent),
            "permit" => Ok(Schema::Permit),
            "dca" | "dcaintent" => Ok(Schema::Dca),
            _ => Err(Eip712Error::UnknownType(s.to_string())),
        }
    }
}

/// Registry holding every struct named in a concatenated type string
pub fn registry_from_encoded(encoded: &str) -> Result<TypeRegistry, Eip712Error> {
    TypeRegistry::from_definitions(TypeDefinition::parse_encoded(encoded)?)
}

pub fn intent_registry() -> Result<TypeRegistry, Eip712Error> {
    Schema::Intent.registry()
}

pub fn permit_registry() -> Result<TypeRegistry, Eip712Error> {
    Schema::Permit.registry()
}

pub fn dca_registry() -> Result<TypeRegistry, Eip712Error> {
    Schema::Dca.registry()
}

/// Intent router domain with the configured name and version
pub fn intent_domain(config: &SignerConfig, chain_id: u64, verifying_contract: [u8; 20]) -> Domain {
    Domain::new(
        config.domain_name.clone(),
        config.domain_version.clone(),
        chain_id,
        verifying_contract,
    )
}

/// DCA intents are signed without a verifying contract
pub fn dca_domain(chain_id: u64) -> Domain {
    Domain::new(DCA_DOMAIN_NAME, DCA_DOMAIN_VERSION, chain_id, [0u8; 20])
}
