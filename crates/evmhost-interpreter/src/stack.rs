use evmhost_abi::StatusCode;

use crate::word::U256;

/// Hard upper bound on the operand stack.
pub const MAX_STACK_LIMIT: usize = 1024;

/// Operand stack with a configurable height limit.
#[derive(Debug)]
pub struct Stack {
    items: Vec<U256>,
    limit: usize,
}

impl Stack {
    pub fn new(limit: usize) -> Self {
        Self {
            items: Vec::with_capacity(limit.min(64)),
            limit,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn top(&self) -> Option<&U256> {
        self.items.last()
    }

    pub fn push(&mut self, value: U256) -> Result<(), StatusCode> {
        if self.items.len() >= self.limit {
            return Err(StatusCode::StackOverflow);
        }
        self.items.push(value);
        Ok(())
    }

    pub fn pop(&mut self) -> Result<U256, StatusCode> {
        self.items.pop().ok_or(StatusCode::StackUnderflow)
    }

    /// Duplicates the `n`-th item from the top (1-based).
    pub fn dup(&mut self, n: usize) -> Result<(), StatusCode> {
        let len = self.items.len();
        if n == 0 || n > len {
            return Err(StatusCode::StackUnderflow);
        }
        self.push(self.items[len - n])
    }

    /// Swaps the top with the item `n` below it.
    pub fn swap(&mut self, n: usize) -> Result<(), StatusCode> {
        let len = self.items.len();
        if n == 0 || n >= len {
            return Err(StatusCode::StackUnderflow);
        }
        self.items.swap(len - 1, len - 1 - n);
        Ok(())
    }
}
