//! Account addresses and their display form.
//!
//! An address is `0x` followed by 40 hex digits. Two addresses are the same
//! account when they match ignoring ASCII case, so an EIP-55 checksummed
//! rendering and its lower-case rendering compare equal.
//!
//! ```ignore
//! let addr = Address::parse("0x12D79D457E935110a5fD52351490063Eff3bcD22")?;
//! assert_eq!(addr.short(), "0x12D79D...3bcD22");
//! ```

use crate::core::keys::display;
use crate::error::{SessionError, SessionResult};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::OnceLock;
use regex::Regex;

fn address_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^0x[0-9a-fA-F]{40}$").expect("static address regex"))
}

/// Syntactically valid account address. Keeps the caller's casing.
#[derive(Debug, Clone, Eq)]
pub struct Address(String);

impl Address {
    pub fn parse(value: &str) -> SessionResult<Self> {
        let value = value.trim();
        if address_re().is_match(value) {
            Ok(Self(value.to_string()))
        } else {
            Err(SessionError::InvalidAddress(value.to_string()))
        }
    }

    pub fn is_valid(value: &str) -> bool { address_re().is_match(value.trim()) }

    pub fn as_str(&self) -> &str { &self.0 }

    /// Display form: first 8 chars, "...", last 6 chars.
    pub fn short(&self) -> String { short_address(&self.0) }
}

impl PartialEq for Address {
    fn eq(&self, other: &Self) -> bool { self.0.eq_ignore_ascii_case(&other.0) }
}

impl std::hash::Hash for Address {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) { self.0.to_ascii_lowercase().hash(state) }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> { s.serialize_str(&self.0) }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(d)?;
        Address::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Truncate any address-like string for display.
///
/// Strings shorter than prefix + suffix are returned unchanged; there is
/// nothing to elide.
pub fn short_address(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() < display::PREFIX_LEN + display::SUFFIX_LEN {
        return value.to_string();
    }
    let prefix: String = chars[..display::PREFIX_LEN].iter().collect();
    let suffix: String = chars[chars.len() - display::SUFFIX_LEN..].iter().collect();
    format!("{prefix}{}{suffix}", display::ELLIPSIS)
}
