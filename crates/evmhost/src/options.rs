//! Backend configuration options.
//!
//! Options are opaque `name=value` pairs collected during configuration and
//! applied, in arrival order, to every backend the factory builds. This layer
//! never validates names or values; each backend decides what it accepts and
//! how duplicates resolve.

use std::fmt;
use std::str::FromStr;

use crate::error::OptionParseError;

/// One `name=value` backend option.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VmOption {
    pub name: String,
    pub value: String,
}

impl VmOption {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for VmOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)
    }
}

impl FromStr for VmOption {
    type Err = OptionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_option(s)
    }
}

/// Splits `input` at the first `=` into name and value.
///
/// The value may itself contain `=`; either side may be empty.
pub fn parse_option(input: &str) -> Result<VmOption, OptionParseError> {
    let (name, value) = input
        .split_once('=')
        .ok_or_else(|| OptionParseError::MissingSeparator {
            input: input.to_string(),
        })?;
    Ok(VmOption::new(name, value))
}

/// Ordered, append-only list of options. Duplicates are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionList {
    options: Vec<VmOption>,
}

impl OptionList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, option: VmOption) {
        self.options.push(option);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, VmOption> {
        self.options.iter()
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }
}

impl<'a> IntoIterator for &'a OptionList {
    type Item = &'a VmOption;
    type IntoIter = std::slice::Iter<'a, VmOption>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<VmOption> for OptionList {
    fn from_iter<I: IntoIterator<Item = VmOption>>(iter: I) -> Self {
        Self {
            options: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_splits_at_first_separator() {
        assert_eq!(parse_option("x=1").unwrap(), VmOption::new("x", "1"));
        assert_eq!(parse_option("expr=a=b").unwrap(), VmOption::new("expr", "a=b"));
        assert_eq!(parse_option("flag=").unwrap(), VmOption::new("flag", ""));
        assert_eq!(parse_option("=v").unwrap(), VmOption::new("", "v"));
    }

    #[test]
    fn test_parse_requires_separator() {
        assert_eq!(
            parse_option("verbose"),
            Err(OptionParseError::MissingSeparator {
                input: "verbose".into()
            })
        );
    }

    #[test]
    fn test_display_round_trips() {
        let option: VmOption = "stack-limit=16".parse().unwrap();
        assert_eq!(option.to_string(), "stack-limit=16");
    }

    #[test]
    fn test_list_keeps_order_and_duplicates() {
        let mut list = OptionList::new();
        list.push(VmOption::new("y", "2"));
        list.push(VmOption::new("x", "1"));
        list.push(VmOption::new("y", "3"));
        let pairs: Vec<_> = list
            .iter()
            .map(|o| (o.name.as_str(), o.value.as_str()))
            .collect();
        assert_eq!(pairs, vec![("y", "2"), ("x", "1"), ("y", "3")]);
        assert_eq!(list.len(), 3);
    }
}
