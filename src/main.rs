use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context};
use clap::{Parser, Subcommand};
use serde_json::json;

use intent_signer::abi::{encode_call_from_text, FunctionSignature, KnownSelectors, SelectorSource};
use intent_signer::eip712::{domain_separator, type_hash, TypeDefinition, TypeRegistry, TypedData};
use intent_signer::intent::Schema;
use intent_signer::signature::{recover_checksum_address, Digest, Signature};
use intent_signer::signing::{
    preflight, ContractProbe, LocalKeySigner, RpcContractProbe, SigningRequest,
    StaticContractProbe, TypedDataSigner,
};
use intent_signer::utils::config::SignerConfig;
use intent_signer::utils::crypto::{parse_address, to_hex_prefixed};
use intent_signer::utils::logging::enable_debug;

/// Environment variable holding the hex private key for `sign`
const ENV_PRIVATE_KEY: &str = "INTENT_SIGNER_PRIVATE_KEY";

#[derive(Parser)]
#[command(author, version, about = "EIP-712 intent hashing and signing")]
struct Cli {
    /// Emit machine-readable JSON
    #[arg(long, global = true)]
    json: bool,

    /// Enable debug logging on stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Canonical type string and type hash of a bundled schema or an encoded type.
    TypeHash {
        /// `intent`, `permit`, `dca`, or a full type string like `Mail(address to)`
        schema: String,
        /// Primary type when the type string defines several structs
        #[arg(long)]
        primary: Option<String>,
    },
    /// Domain separator, struct hash and signing digest of a typed-data JSON file.
    Digest {
        /// Path to the file, or `-` for stdin
        file: PathBuf,
    },
    /// Canonical signature and 4-byte selector of a function.
    Selector { signature: String },
    /// ABI-encode a call from a function signature and its arguments.
    Calldata {
        signature: String,
        args: Vec<String>,
    },
    /// Split a 65-byte (or 64-byte compact) signature into r, s and v.
    Split { signature: String },
    /// Recover the signer of a digest or typed-data file.
    Recover {
        signature: String,
        #[arg(long, conflicts_with = "typed_data", required_unless_present = "typed_data")]
        digest: Option<String>,
        #[arg(long)]
        typed_data: Option<PathBuf>,
    },
    /// Sign a typed-data file with the key in INTENT_SIGNER_PRIVATE_KEY.
    Sign {
        file: PathBuf,
        /// Treat this address as a deployed contract during pre-flight
        #[arg(long = "trust")]
        trusted: Vec<String>,
    },
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    let config = SignerConfig::load(args.config.as_deref())?;
    if args.verbose || config.debug {
        enable_debug();
    }

    let output = match args.command {
        Commands::TypeHash { schema, primary } => type_hash_command(&schema, primary.as_deref())?,
        Commands::Digest { file } => digest_command(&file)?,
        Commands::Selector { signature } => selector_command(&signature)?,
        Commands::Calldata { signature, args } => {
            let calldata = encode_call_from_text(&SelectorSource::Signature(signature), &[], &args)?;
            Output::new(json!({ "calldata": to_hex_prefixed(&calldata) }))
        }
        Commands::Split { signature } => split_command(&signature)?,
        Commands::Recover {
            signature,
            digest,
            typed_data,
        } => recover_command(&signature, digest.as_deref(), typed_data.as_deref())?,
        Commands::Sign { file, trusted } => sign_command(&config, &file, &trusted)?,
    };

    output.print(args.json);
    Ok(())
}

/// Command result printed as JSON or as `key: value` lines
struct Output(serde_json::Value);

impl Output {
    fn new(value: serde_json::Value) -> Self {
        Output(value)
    }

    fn print(&self, as_json: bool) {
        if as_json {
            println!("{}", self.0);
            return;
        }

        if let Some(fields) = self.0.as_object() {
            for (key, value) in fields {
                match value {
                    serde_json::Value::String(s) => println!("{}: {}", key, s),
                    other => println!("{}: {}", key, other),
                }
            }
        }
    }
}

fn read_input(path: &Path) -> anyhow::Result<String> {
    if path == Path::new("-") {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        return Ok(buffer);
    }
    fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))
}

fn load_typed_data(path: &Path) -> anyhow::Result<TypedData> {
    Ok(TypedData::from_json(&read_input(path)?)?)
}

fn type_hash_command(schema: &str, primary: Option<&str>) -> anyhow::Result<Output> {
    let (registry, primary) = match schema.parse::<Schema>() {
        Ok(schema) => (schema.registry()?, primary.unwrap_or(schema.primary_type()).to_string()),
        Err(_) => {
            let definitions = TypeDefinition::parse_encoded(schema)?;
            let first = definitions
                .first()
                .map(|d| d.name.clone())
                .ok_or_else(|| anyhow!("no type definitions in {:?}", schema))?;
            (
                TypeRegistry::from_definitions(definitions)?,
                primary.map(str::to_string).unwrap_or(first),
            )
        }
    };

    Ok(Output::new(json!({
        "primaryType": primary,
        "encodedType": registry.canonical_type_string(&primary)?,
        "typeHash": to_hex_prefixed(&type_hash(&registry, &primary)?),
    })))
}

fn digest_command(path: &Path) -> anyhow::Result<Output> {
    let typed_data = load_typed_data(path)?;

    Ok(Output::new(json!({
        "primaryType": typed_data.primary_type,
        "domainSeparator": to_hex_prefixed(&domain_separator(&typed_data.domain)?),
        "structHash": to_hex_prefixed(&typed_data.struct_hash()?),
        "digest": to_hex_prefixed(&typed_data.digest()?),
    })))
}

fn selector_command(signature: &str) -> anyhow::Result<Output> {
    let parsed = FunctionSignature::parse(signature)?;
    let canonical = parsed.canonical();
    let selector = intent_signer::FunctionSelector::from_canonical(&canonical);

    let mut value = json!({
        "signature": canonical,
        "selector": selector.to_string(),
    });
    if let Some(known) = KnownSelectors::identify(&selector) {
        value["known"] = json!(known);
    }
    Ok(Output::new(value))
}

fn split_command(raw: &str) -> anyhow::Result<Output> {
    let signature = Signature::from_hex(raw)?;

    let mut value = json!({
        "r": to_hex_prefixed(&signature.r),
        "s": to_hex_prefixed(&signature.s),
        "v": signature.v,
        "recoveryId": signature.recovery_id(),
    });
    // High-s signatures have no compact form
    if let Ok(compact) = signature.to_compact() {
        value["compact"] = json!(to_hex_prefixed(&compact));
    }
    Ok(Output::new(value))
}

fn recover_command(
    raw: &str,
    digest: Option<&str>,
    typed_data: Option<&Path>,
) -> anyhow::Result<Output> {
    let signature = Signature::from_hex(raw)?;
    let digest = match (digest, typed_data) {
        (Some(hex_digest), _) => Digest::from_hex(hex_digest)?,
        (None, Some(path)) => Digest(load_typed_data(path)?.digest()?),
        (None, None) => bail!("either --digest or --typed-data is required"),
    };

    Ok(Output::new(json!({
        "digest": digest.to_string(),
        "signer": recover_checksum_address(&digest, &signature)?,
    })))
}

fn sign_command(config: &SignerConfig, path: &Path, trusted: &[String]) -> anyhow::Result<Output> {
    let key = std::env::var(ENV_PRIVATE_KEY)
        .map_err(|_| anyhow!("{} is not set", ENV_PRIVATE_KEY))?;
    let signer = LocalKeySigner::from_hex(key.trim())?;

    let request = SigningRequest::new(load_typed_data(path)?)?;

    // The RPC probe blocks, so pre-flight runs before the runtime starts
    let probe: Box<dyn ContractProbe> = match RpcContractProbe::from_config(config)? {
        Some(rpc) => Box::new(rpc),
        None => {
            let mut probe = StaticContractProbe::from_config(config);
            for address in trusted {
                probe.insert(parse_address(address)?);
            }
            Box::new(probe)
        }
    };
    let prepared = preflight(request, signer.address(), probe.as_ref())?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let signed = runtime.block_on(prepared.submit(&signer))?;

    Ok(Output::new(serde_json::to_value(&signed)?))
}
