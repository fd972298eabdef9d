//! Execution context handed to a VM for one call, and its foreign-boundary shape.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::revision::FeatureSchedule;

/// A 20-byte account address.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// The all-zero address.
    pub const ZERO: Address = Address([0u8; 20]);

    /// Builds an address whose last byte is `n`, handy for tests and fixtures.
    pub const fn from_low_u8(n: u8) -> Self {
        let mut bytes = [0u8; 20];
        bytes[19] = n;
        Address(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("0x")?;
        for byte in self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

/// Error returned when parsing a malformed hex address.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid address '{0}': expected 40 hex digits with optional 0x prefix")]
pub struct InvalidAddress(pub String);

impl FromStr for Address {
    type Err = InvalidAddress;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let bytes = crate::hex::decode(digits).map_err(|_| InvalidAddress(s.to_string()))?;
        let array: [u8; 20] = bytes
            .try_into()
            .map_err(|_| InvalidAddress(s.to_string()))?;
        Ok(Address(array))
    }
}

impl Serialize for Address {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Block environment of the executing transaction.
///
/// Number and timestamp are signed so that out-of-range values coming from a
/// caller can be detected rather than silently wrapped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvInfo {
    pub number: i64,
    pub timestamp: i64,
    pub gas_limit: u64,
}

/// Everything a VM needs to execute one call frame.
///
/// Owned by the caller and borrowed immutably for exactly one `exec`.
#[derive(Debug, Clone, Copy)]
pub struct ExecutionContext<'a> {
    /// Call depth of this frame, 0 for the outermost call.
    pub depth: usize,
    pub caller: Address,
    pub callee: Address,
    pub code: &'a [u8],
    pub input: &'a [u8],
    pub env: EnvInfo,
    pub schedule: FeatureSchedule,
    /// Frame forbids state modification.
    pub is_static: bool,
}

impl<'a> ExecutionContext<'a> {
    /// Creates a depth-0 context for `code` with zero addresses, empty input
    /// and a default environment.
    pub fn new(code: &'a [u8]) -> Self {
        Self {
            depth: 0,
            caller: Address::ZERO,
            callee: Address::ZERO,
            code,
            input: &[],
            env: EnvInfo::default(),
            schedule: FeatureSchedule::default(),
            is_static: false,
        }
    }

    /// Sets the call depth.
    pub fn with_depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }

    /// Sets caller and callee.
    pub fn with_addresses(mut self, caller: Address, callee: Address) -> Self {
        self.caller = caller;
        self.callee = callee;
        self
    }

    /// Sets the call input data.
    pub fn with_input(mut self, input: &'a [u8]) -> Self {
        self.input = input;
        self
    }

    /// Sets the block environment.
    pub fn with_env(mut self, env: EnvInfo) -> Self {
        self.env = env;
        self
    }

    /// Sets the feature schedule.
    pub fn with_schedule(mut self, schedule: FeatureSchedule) -> Self {
        self.schedule = schedule;
        self
    }

    /// Marks the frame as static.
    pub fn with_static(mut self, is_static: bool) -> Self {
        self.is_static = is_static;
        self
    }
}

/// The context in the shape a backend receives it: integers narrowed to the
/// widths of the plugin ABI.
#[derive(Debug, Clone, Copy)]
pub struct Message<'a> {
    pub depth: i32,
    pub gas: i64,
    pub caller: Address,
    pub callee: Address,
    pub code: &'a [u8],
    pub input: &'a [u8],
    pub is_static: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_display_and_parse() {
        let addr = Address::from_low_u8(0xab);
        let text = addr.to_string();
        assert_eq!(text, "0x00000000000000000000000000000000000000ab");
        assert_eq!(text.parse::<Address>().unwrap(), addr);
        assert_eq!(
            "00000000000000000000000000000000000000ab".parse::<Address>().unwrap(),
            addr
        );
    }

    #[test]
    fn test_address_parse_rejects_bad_length() {
        assert!("0x1234".parse::<Address>().is_err());
        assert!("0xzz00000000000000000000000000000000000000".parse::<Address>().is_err());
    }

    #[test]
    fn test_context_builder() {
        let code = [0x00];
        let ctx = ExecutionContext::new(&code)
            .with_depth(3)
            .with_addresses(Address::from_low_u8(1), Address::from_low_u8(2))
            .with_static(true);
        assert_eq!(ctx.depth, 3);
        assert_eq!(ctx.caller, Address::from_low_u8(1));
        assert_eq!(ctx.callee, Address::from_low_u8(2));
        assert!(ctx.is_static);
        assert_eq!(ctx.code, &[0x00]);
    }
}
