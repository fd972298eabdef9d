use evmhost_abi::SetOptionResult;

use crate::stack::MAX_STACK_LIMIT;

/// Options recognized by the built-in backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterpreterConfig {
    /// Maximum operand stack height, `stack-limit`.
    pub stack_limit: usize,
    /// Report pushed stack values to step observers, `trace-pushed`.
    pub trace_pushed: bool,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            stack_limit: MAX_STACK_LIMIT,
            trace_pushed: true,
        }
    }
}

impl InterpreterConfig {
    /// Applies one `name=value` option. Later values replace earlier ones.
    pub fn set_option(&mut self, name: &str, value: &str) -> SetOptionResult {
        match name {
            "stack-limit" => match value.parse::<usize>() {
                Ok(limit) if (1..=MAX_STACK_LIMIT).contains(&limit) => {
                    self.stack_limit = limit;
                    SetOptionResult::Accepted
                }
                _ => SetOptionResult::InvalidValue,
            },
            "trace-pushed" => match value {
                "true" => {
                    self.trace_pushed = true;
                    SetOptionResult::Accepted
                }
                "false" => {
                    self.trace_pushed = false;
                    SetOptionResult::Accepted
                }
                _ => SetOptionResult::InvalidValue,
            },
            _ => SetOptionResult::InvalidName,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stack_limit_bounds() {
        let mut config = InterpreterConfig::default();
        assert_eq!(config.set_option("stack-limit", "16"), SetOptionResult::Accepted);
        assert_eq!(config.stack_limit, 16);
        assert_eq!(config.set_option("stack-limit", "0"), SetOptionResult::InvalidValue);
        assert_eq!(config.set_option("stack-limit", "1025"), SetOptionResult::InvalidValue);
        assert_eq!(config.set_option("stack-limit", "lots"), SetOptionResult::InvalidValue);
        assert_eq!(config.stack_limit, 16);
    }

    #[test]
    fn test_last_value_wins() {
        let mut config = InterpreterConfig::default();
        config.set_option("trace-pushed", "false");
        config.set_option("trace-pushed", "true");
        assert!(config.trace_pushed);
        assert_eq!(config.set_option("trace-pushed", "yes"), SetOptionResult::InvalidValue);
    }

    #[test]
    fn test_unknown_name() {
        let mut config = InterpreterConfig::default();
        assert_eq!(config.set_option("jit", "on"), SetOptionResult::InvalidName);
        assert_eq!(config, InterpreterConfig::default());
    }
}
