//! Structured logging for signing flows
//!
//! Every field is classified by its key before it is written:
//! - key material (`private_key`, `secret`, `seed`) never reaches the output
//! - addresses (signer, owner, verifying contract) keep their first and last bytes
//! - digests, signatures and calldata are shortened
//!
//! Entries go to stderr so command output on stdout stays machine-readable.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

static DEBUG_ENABLED: AtomicBool = AtomicBool::new(false);

/// Turn on debug entries (`--verbose` or `debug: true` in the config)
pub fn enable_debug() {
    DEBUG_ENABLED.store(true, Ordering::SeqCst);
}

pub fn disable_debug() {
    DEBUG_ENABLED.store(false, Ordering::SeqCst);
}

pub fn is_debug_enabled() -> bool {
    DEBUG_ENABLED.load(Ordering::SeqCst)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        })
    }
}

/// How a field value is shown, decided from its key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Secret,
    Address,
    Hash,
    Plain,
}

const SECRET_KEYS: &[&str] = &["private", "secret", "seed", "mnemonic", "password", "signing_key"];
const ADDRESS_KEYS: &[&str] = &["address", "signer", "owner", "recipient", "contract", "from", "to"];
const HASH_KEYS: &[&str] = &["hash", "digest", "separator", "signature", "calldata"];

impl FieldKind {
    /// Secret beats address beats hash, so `signer_private_key` stays hidden
    pub fn classify(key: &str) -> Self {
        let key = key.to_ascii_lowercase();
        let matches = |needles: &[&str]| needles.iter().any(|n| key.contains(n));

        if matches(SECRET_KEYS) {
            FieldKind::Secret
        } else if matches(ADDRESS_KEYS) {
            FieldKind::Address
        } else if matches(HASH_KEYS) {
            FieldKind::Hash
        } else {
            FieldKind::Plain
        }
    }

    pub fn render(&self, value: &str) -> String {
        let value = value.trim();
        if value.is_empty() {
            return "[EMPTY]".to_string();
        }

        match self {
            FieldKind::Secret => format!("[REDACTED:{}chars]", value.len()),
            // 0x + 3 bytes ... 2 bytes
            FieldKind::Address => shorten(value, 8, 4),
            // 0x + 5 bytes ... 3 bytes
            FieldKind::Hash => shorten(value, 12, 6),
            FieldKind::Plain => value.to_string(),
        }
    }
}

fn shorten(value: &str, head: usize, tail: usize) -> String {
    if !value.is_ascii() || value.len() <= head + tail + 3 {
        return value.to_string();
    }
    format!("{}...{}", &value[..head], &value[value.len() - tail..])
}

/// One structured log line
#[derive(Debug)]
pub struct LogEntry {
    pub level: LogLevel,
    pub module: &'static str,
    pub message: String,
    pub fields: Vec<(&'static str, String)>,
}

impl LogEntry {
    pub fn new(level: LogLevel, module: &'static str, message: impl Into<String>) -> Self {
        Self {
            level,
            module,
            message: message.into(),
            fields: Vec::new(),
        }
    }

    /// Add a field, rendered according to [`FieldKind::classify`]
    pub fn field(mut self, key: &'static str, value: impl fmt::Display) -> Self {
        let rendered = FieldKind::classify(key).render(&value.to_string());
        self.fields.push((key, rendered));
        self
    }

    /// Add a field that is always hidden whatever its key
    pub fn secret_field(mut self, key: &'static str, value: impl fmt::Display) -> Self {
        self.fields.push((key, FieldKind::Secret.render(&value.to_string())));
        self
    }

    /// The line as written, without the timestamp
    pub fn render(&self) -> String {
        let mut line = format!("{} [{}] {}", self.level, self.module, self.message);
        if !self.fields.is_empty() {
            line.push_str(" |");
            for (key, value) in &self.fields {
                line.push_str(&format!(" {}={}", key, value));
            }
        }
        line
    }

    pub fn log(self) {
        if self.level == LogLevel::Debug && !is_debug_enabled() {
            return;
        }

        let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ");
        eprintln!("[{}] {}", timestamp, self.render());
    }
}

#[doc(hidden)]
#[macro_export]
macro_rules! __log_entry {
    ($level:ident, $module:expr, $msg:expr $(, $key:ident = $value:expr)* $(,)?) => {
        $crate::utils::logging::LogEntry::new(
            $crate::utils::logging::LogLevel::$level,
            $module,
            $msg
        )
        $(.field(stringify!($key), &$value))*
        .log()
    };
}

/// `log_debug!("module", "message", key = value, ...)`
#[macro_export]
macro_rules! log_debug {
    ($($args:tt)*) => { $crate::__log_entry!(Debug, $($args)*) };
}

#[macro_export]
macro_rules! log_info {
    ($($args:tt)*) => { $crate::__log_entry!(Info, $($args)*) };
}

#[macro_export]
macro_rules! log_warn {
    ($($args:tt)*) => { $crate::__log_entry!(Warn, $($args)*) };
}

#[macro_export]
macro_rules! log_error {
    ($($args:tt)*) => { $crate::__log_entry!(Error, $($args)*) };
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDRESS: &str = "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045";
    const DIGEST: &str = "0xbe609aee343fb3c4b28e1df9e632fca64fcfaede20f02e86244efddf30957bd2";

    #[test]
    fn test_classify() {
        assert_eq!(FieldKind::classify("private_key"), FieldKind::Secret);
        assert_eq!(FieldKind::classify("signer_private_key"), FieldKind::Secret);
        assert_eq!(FieldKind::classify("verifying_contract"), FieldKind::Address);
        assert_eq!(FieldKind::classify("signer"), FieldKind::Address);
        assert_eq!(FieldKind::classify("digest"), FieldKind::Hash);
        assert_eq!(FieldKind::classify("domain_separator"), FieldKind::Hash);
        assert_eq!(FieldKind::classify("primary_type"), FieldKind::Plain);
        assert_eq!(FieldKind::classify("chain_id"), FieldKind::Plain);
    }

    #[test]
    fn test_render() {
        assert_eq!(FieldKind::Secret.render("4c0883a6"), "[REDACTED:8chars]");
        assert_eq!(FieldKind::Secret.render(""), "[EMPTY]");
        assert_eq!(FieldKind::Address.render(ADDRESS), "0xd8dA6B...6045");
        assert_eq!(FieldKind::Hash.render(DIGEST), "0xbe609aee34...957bd2");

        // Too short to shorten
        assert_eq!(FieldKind::Hash.render("0xa9059cbb"), "0xa9059cbb");
    }

    #[test]
    fn test_log_entry() {
        let entry = LogEntry::new(LogLevel::Info, "signing", "Requesting signature")
            .field("primary_type", "Intent")
            .field("digest", DIGEST)
            .field("private_key", "4c0883a69102937d")
            .secret_field("request", "{\"key\":1}");

        assert_eq!(
            entry.render(),
            "INFO [signing] Requesting signature | primary_type=Intent \
             digest=0xbe609aee34...957bd2 private_key=[REDACTED:16chars] \
             request=[REDACTED:9chars]"
        );
    }
}
