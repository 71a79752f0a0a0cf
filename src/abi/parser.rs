//! Human-readable signature and type-string parser
//!
//! Accepts what people actually paste into a calldata form:
//! `function transfer(address to, uint amount) external returns (bool)`,
//! `deposit(tuple(address token, uint256 amount)[] calldata items)`, or a bare
//! type such as `(address,uint256)[]`.

use super::types::{parse_array_length, AbiError, AbiType};

/// Keywords allowed between a parameter type and its name
const PARAM_KEYWORDS: [&str; 5] = ["memory", "calldata", "storage", "indexed", "payable"];

/// Keywords allowed after the parameter list
const TRAILING_KEYWORDS: [&str; 7] = [
    "external", "public", "view", "pure", "payable", "nonpayable", "returns",
];

/// One named (or anonymous) parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbiParam {
    pub name: Option<String>,
    pub param_type: AbiType,
}

/// Parsed function signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSignature {
    pub name: String,
    pub inputs: Vec<AbiParam>,
}

impl FunctionSignature {
    /// Parse a human-readable function signature
    pub fn parse(signature: &str) -> Result<Self, AbiError> {
        let invalid = |reason: &str| AbiError::InvalidSignature(format!("{}: {}", reason, signature.trim()));

        let s = signature.trim();
        let s = s.strip_prefix("function ").map(str::trim_start).unwrap_or(s);

        let open = s.find('(').ok_or_else(|| invalid("missing '('"))?;
        let name = s[..open].trim();
        if !is_identifier(name) {
            return Err(invalid("invalid function name"));
        }

        let close = matching_paren(s, open).ok_or_else(|| invalid("unbalanced parentheses"))?;
        let trailing = s[close + 1..].trim();
        if !trailing.is_empty() {
            let first = trailing
                .split(|c: char| c.is_whitespace() || c == '(')
                .next()
                .unwrap_or_default();
            if !TRAILING_KEYWORDS.contains(&first) {
                return Err(invalid("unexpected text after parameter list"));
            }
        }

        let inputs = parse_param_list(&s[open + 1..close]).map_err(|e| match e {
            AbiError::InvalidSignature(_) => e,
            other => AbiError::InvalidSignature(format!("{} in {}", other, signature.trim())),
        })?;

        Ok(FunctionSignature {
            name: name.to_string(),
            inputs,
        })
    }

    /// Canonical form used for selector hashing: `name(t1,t2,...)`
    pub fn canonical(&self) -> String {
        let params = self
            .inputs
            .iter()
            .map(|p| p.param_type.canonical_type())
            .collect::<Vec<_>>()
            .join(",");
        format!("{}({})", self.name, params)
    }

    /// Parameter types in declaration order
    pub fn input_types(&self) -> Vec<AbiType> {
        self.inputs.iter().map(|p| p.param_type.clone()).collect()
    }
}

/// Parse a single type string; tuple components may carry names
pub fn parse_type(s: &str) -> Result<AbiType, AbiError> {
    let param = parse_param(s)?;
    match param.name {
        None => Ok(param.param_type),
        Some(name) => Err(AbiError::UnsupportedType(format!("{} {}", param.param_type, name))),
    }
}

/// Parse a comma-separated parameter list (without the surrounding parentheses)
fn parse_param_list(s: &str) -> Result<Vec<AbiParam>, AbiError> {
    if s.trim().is_empty() {
        return Ok(Vec::new());
    }
    split_top_level(s)?
        .into_iter()
        .map(|piece| {
            if piece.trim().is_empty() {
                Err(AbiError::InvalidSignature(format!("empty parameter in ({})", s)))
            } else {
                parse_param(piece)
            }
        })
        .collect()
}

/// Parse `type [keyword] [name]`
fn parse_param(s: &str) -> Result<AbiParam, AbiError> {
    let s = s.trim();

    // Base type: a parenthesized tuple or an elementary name
    let (mut param_type, mut rest) = if s.starts_with('(') || s.starts_with("tuple(") {
        let open = s.find('(').unwrap_or(0);
        let close = matching_paren(s, open)
            .ok_or_else(|| AbiError::InvalidSignature(format!("unbalanced parentheses: {}", s)))?;
        let components = parse_param_list(&s[open + 1..close])?
            .into_iter()
            .map(|p| p.param_type)
            .collect();
        (AbiType::Tuple(components), &s[close + 1..])
    } else {
        let end = s
            .find(|c: char| c == '[' || c.is_whitespace())
            .unwrap_or(s.len());
        (AbiType::parse_elementary(&s[..end])?, &s[end..])
    };

    // Array suffixes, applied left to right: `T[2][]` is a dynamic array of T[2]
    while let Some(after_open) = rest.strip_prefix('[') {
        let close = after_open
            .find(']')
            .ok_or_else(|| AbiError::InvalidSignature(format!("unclosed array suffix: {}", s)))?;
        let size = &after_open[..close];
        param_type = if size.is_empty() {
            AbiType::Array(Box::new(param_type))
        } else {
            let n = parse_array_length(size)
                .ok_or_else(|| AbiError::UnsupportedType(format!("invalid array size: [{}]", size)))?;
            AbiType::FixedArray(Box::new(param_type), n)
        };
        rest = &after_open[close + 1..];
    }

    // Optional location keyword(s), then an optional name
    let mut name = None;
    for token in rest.split_whitespace() {
        if name.is_some() {
            return Err(AbiError::InvalidSignature(format!("unexpected token '{}' in {}", token, s)));
        }
        if PARAM_KEYWORDS.contains(&token) {
            continue;
        }
        if !is_identifier(token) {
            return Err(AbiError::InvalidSignature(format!("invalid parameter name '{}'", token)));
        }
        name = Some(token.to_string());
    }
    if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
        return Err(AbiError::UnsupportedType(s.to_string()));
    }

    Ok(AbiParam { name, param_type })
}

/// Split on commas that are not nested inside parentheses
fn split_top_level(s: &str) -> Result<Vec<&str>, AbiError> {
    let mut pieces = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| AbiError::InvalidSignature(format!("unbalanced parentheses: {}", s)))?;
            }
            ',' if depth == 0 => {
                pieces.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(AbiError::InvalidSignature(format!("unbalanced parentheses: {}", s)));
    }
    pieces.push(&s[start..]);
    Ok(pieces)
}

/// Index of the ')' matching the '(' at `open`
fn matching_paren(s: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in s[open..].char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Solidity identifier: `[A-Za-z_$][A-Za-z0-9_$]*`
pub(crate) fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_type_arrays() {
        assert_eq!(
            parse_type("uint256[]").unwrap(),
            AbiType::Array(Box::new(AbiType::Uint(256)))
        );
        assert_eq!(
            parse_type("address[5]").unwrap(),
            AbiType::FixedArray(Box::new(AbiType::Address), 5)
        );
        // T[2][] is a dynamic array of T[2]
        assert_eq!(
            parse_type("bool[2][]").unwrap(),
            AbiType::Array(Box::new(AbiType::FixedArray(Box::new(AbiType::Bool), 2)))
        );
    }

    #[test]
    fn test_parse_type_tuples() {
        assert_eq!(
            parse_type("(uint256,address,bool)").unwrap(),
            AbiType::Tuple(vec![AbiType::Uint(256), AbiType::Address, AbiType::Bool])
        );
        assert_eq!(
            parse_type("tuple(address loanToken, uint lltv)[]").unwrap(),
            AbiType::Array(Box::new(AbiType::Tuple(vec![AbiType::Address, AbiType::Uint(256)])))
        );
        assert_eq!(parse_type("()").unwrap(), AbiType::Tuple(vec![]));
    }

    #[test]
    fn test_parse_type_rejects_unknown() {
        assert!(matches!(parse_type("uint7"), Err(AbiError::UnsupportedType(_))));
        assert!(matches!(parse_type("uint256[0]"), Err(AbiError::UnsupportedType(_))));
        assert!(matches!(parse_type("uint256[65537]"), Err(AbiError::UnsupportedType(_))));
        assert!(matches!(parse_type("uint256[1099511627776]"), Err(AbiError::UnsupportedType(_))));
        assert_eq!(
            parse_type("uint256[65536]").unwrap(),
            AbiType::FixedArray(Box::new(AbiType::Uint(256)), 65536)
        );
        assert!(parse_type("uint256 amount").is_err());
    }

    #[test]
    fn test_parse_signature_with_names_and_keywords() {
        let sig = FunctionSignature::parse(
            "function deposit(tuple(address token, uint amount)[] calldata items, bytes memory data) external",
        )
        .unwrap();

        assert_eq!(sig.name, "deposit");
        assert_eq!(sig.inputs.len(), 2);
        assert_eq!(sig.inputs[0].name.as_deref(), Some("items"));
        assert_eq!(sig.canonical(), "deposit((address,uint256)[],bytes)");
    }

    #[test]
    fn test_parse_signature_nested_tuples() {
        let sig = FunctionSignature::parse("f((uint8,(bool,string)[2]),int)").unwrap();
        assert_eq!(sig.canonical(), "f((uint8,(bool,string)[2]),int256)");
    }

    #[test]
    fn test_parse_signature_no_params() {
        let sig = FunctionSignature::parse("totalSupply()").unwrap();
        assert!(sig.inputs.is_empty());
        assert_eq!(sig.canonical(), "totalSupply()");
    }

    #[test]
    fn test_parse_signature_returns_clause_ignored() {
        let sig = FunctionSignature::parse("balanceOf(address owner) view returns (uint256)").unwrap();
        assert_eq!(sig.canonical(), "balanceOf(address)");
    }

    #[test]
    fn test_invalid_signatures() {
        for bad in [
            "transfer",
            "transfer(address,uint256",
            "1transfer(address)",
            "transfer(address,,uint256)",
            "transfer(address) garbage",
            "transfer(uint7)",
            "transfer(address to extra)",
        ] {
            assert!(
                matches!(FunctionSignature::parse(bad), Err(AbiError::InvalidSignature(_))),
                "{} should be rejected",
                bad
            );
        }
    }
}
