//! The execution loop shared by the built-in backends.

use std::collections::HashMap;

use evmhost_abi::opcodes::{self, *};
use evmhost_abi::{Address, Message, Revision, StatusCode, Step, StepObserver};

use crate::config::InterpreterConfig;
use crate::gas;
use crate::memory::Memory;
use crate::stack::Stack;
use crate::word::U256;

/// Marks the offsets that hold a JUMPDEST opcode outside push data.
pub fn analyze_jumpdests(code: &[u8]) -> Vec<bool> {
    let mut valid = vec![false; code.len()];
    let mut pc = 0;
    while pc < code.len() {
        let opcode = code[pc];
        if opcode == JUMPDEST {
            valid[pc] = true;
        }
        pc += 1 + opcodes::immediate_size(opcode);
    }
    valid
}

/// Whether `opcode` leaves exactly one new value on top of the stack.
fn pushes_value(opcode: u8) -> bool {
    matches!(
        opcode,
        ADD | MUL
            | SUB
            | LT
            | GT
            | EQ
            | ISZERO
            | AND
            | OR
            | XOR
            | NOT
            | SHL
            | SHR
            | ADDRESS
            | CALLER
            | CALLDATALOAD
            | CALLDATASIZE
            | CODESIZE
            | MLOAD
            | SLOAD
            | PC
            | MSIZE
            | GAS
            | PUSH1..=PUSH32
            | DUP1..=DUP16
    )
}

/// Reads a 32-byte word from `data` at `offset`, zero-padded past the end.
fn load_padded(data: &[u8], offset: U256) -> U256 {
    let Some(start) = offset.to_usize().filter(|start| *start < data.len()) else {
        return U256::ZERO;
    };
    let end = data.len().min(start.saturating_add(32));
    let mut word = [0u8; 32];
    word[..end - start].copy_from_slice(&data[start..end]);
    U256::from_be_bytes(&word)
}

#[derive(Debug, Clone, Copy)]
enum Control {
    Continue,
    Jump(usize),
    Halt(StatusCode),
}

/// State of one call frame.
pub(crate) struct Machine<'a> {
    config: InterpreterConfig,
    revision: Revision,
    code: &'a [u8],
    input: &'a [u8],
    caller: Address,
    callee: Address,
    is_static: bool,
    jumpdests: &'a [bool],
    stack: Stack,
    memory: Memory,
    storage: HashMap<U256, U256>,
    gas: i64,
    pc: usize,
    return_range: (usize, usize),
}

impl<'a> Machine<'a> {
    /// `jumpdests` comes from [`analyze_jumpdests`]; an empty table makes
    /// every jump invalid.
    pub fn new(
        config: InterpreterConfig,
        revision: Revision,
        message: &Message<'a>,
        jumpdests: &'a [bool],
    ) -> Self {
        Self {
            config,
            revision,
            code: message.code,
            input: message.input,
            caller: message.caller,
            callee: message.callee,
            is_static: message.is_static,
            jumpdests,
            stack: Stack::new(config.stack_limit),
            memory: Memory::default(),
            storage: HashMap::new(),
            gas: message.gas,
            pc: 0,
            return_range: (0, 0),
        }
    }

    /// Runs to completion, writing returned or reverted data into `output`.
    ///
    /// Returns the final status and the gas left, which is zero unless the
    /// frame succeeded or reverted.
    pub fn run(
        mut self,
        mut observer: Option<&mut dyn StepObserver>,
        output: &mut Vec<u8>,
    ) -> (StatusCode, i64) {
        output.clear();
        let mut index = 0u32;

        let status = loop {
            let offset = self.pc;
            let opcode = self.code.get(offset).copied().unwrap_or(STOP);
            let control = self.step(opcode);
            let status = match control {
                Ok(Control::Halt(status)) | Err(status) => status,
                Ok(_) => StatusCode::Success,
            };

            if let Some(observer) = observer.as_deref_mut() {
                let pushed = match control {
                    Ok(_) if self.config.trace_pushed && pushes_value(opcode) => {
                        self.stack.top().map(U256::to_be_bytes)
                    }
                    _ => None,
                };
                observer.on_step(&Step {
                    index,
                    code_offset: offset,
                    opcode,
                    status,
                    gas_left: self.gas,
                    stack_depth: self.stack.len(),
                    pushed: pushed.as_ref(),
                    memory_size: self.memory.len(),
                });
            }
            index = index.wrapping_add(1);

            match control {
                Ok(Control::Continue) => self.pc = offset + 1 + opcodes::immediate_size(opcode),
                Ok(Control::Jump(dest)) => self.pc = dest,
                Ok(Control::Halt(status)) | Err(status) => break status,
            }
        };

        match status {
            StatusCode::Success | StatusCode::Revert => {
                let (offset, size) = self.return_range;
                output.extend_from_slice(self.memory.slice(offset, size));
                (status, self.gas)
            }
            _ => (status, 0),
        }
    }

    fn charge(&mut self, amount: u64) -> Result<(), StatusCode> {
        match i64::try_from(amount) {
            Ok(amount) if amount <= self.gas => {
                self.gas -= amount;
                Ok(())
            }
            _ => Err(StatusCode::OutOfGas),
        }
    }

    fn push(&mut self, value: U256) -> Result<(), StatusCode> {
        self.stack.push(value)
    }

    fn push_usize(&mut self, value: usize) -> Result<(), StatusCode> {
        self.stack.push(U256::from_u64(value as u64))
    }

    fn unary(&mut self, op: impl FnOnce(U256) -> U256) -> Result<(), StatusCode> {
        let a = self.stack.pop()?;
        self.push(op(a))
    }

    /// `op` receives the top of the stack first.
    fn binary(&mut self, op: impl FnOnce(U256, U256) -> U256) -> Result<(), StatusCode> {
        let a = self.stack.pop()?;
        let b = self.stack.pop()?;
        self.push(op(a, b))
    }

    /// Grows memory over a fixed-size access at `offset` and charges for it.
    fn grow(&mut self, offset: U256, size: usize) -> Result<usize, StatusCode> {
        let offset = offset.to_usize().ok_or(StatusCode::OutOfGas)?;
        let cost = self.memory.expansion_cost(offset, size)?;
        self.charge(cost)?;
        self.memory.expand(offset, size)?;
        Ok(offset)
    }

    /// Like [`Machine::grow`] for a stack-supplied size. Empty ranges ignore
    /// the offset.
    fn grow_range(&mut self, offset: U256, size: U256) -> Result<(usize, usize), StatusCode> {
        let size = size.to_usize().ok_or(StatusCode::OutOfGas)?;
        if size == 0 {
            return Ok((0, 0));
        }
        let offset = self.grow(offset, size)?;
        Ok((offset, size))
    }

    fn jump_target(&self, dest: U256) -> Result<Control, StatusCode> {
        dest.to_usize()
            .filter(|dest| self.jumpdests.get(*dest).copied().unwrap_or(false))
            .map(Control::Jump)
            .ok_or(StatusCode::BadJumpDestination)
    }

    fn require_mutable(&self) -> Result<(), StatusCode> {
        if self.is_static {
            Err(StatusCode::StaticModeViolation)
        } else {
            Ok(())
        }
    }

    fn step(&mut self, opcode: u8) -> Result<Control, StatusCode> {
        if opcode == INVALID || opcodes::instruction_name(self.revision, opcode).is_none() {
            return Err(StatusCode::UndefinedInstruction);
        }
        self.charge(gas::static_cost(self.revision, opcode))?;

        match opcode {
            STOP => return Ok(Control::Halt(StatusCode::Success)),
            ADD => self.binary(U256::wrapping_add)?,
            MUL => self.binary(U256::wrapping_mul)?,
            SUB => self.binary(U256::wrapping_sub)?,
            LT => self.binary(|a, b| U256::from(a < b))?,
            GT => self.binary(|a, b| U256::from(a > b))?,
            EQ => self.binary(|a, b| U256::from(a == b))?,
            ISZERO => self.unary(|a| U256::from(a.is_zero()))?,
            AND => self.binary(|a, b| a & b)?,
            OR => self.binary(|a, b| a | b)?,
            XOR => self.binary(|a, b| a ^ b)?,
            NOT => self.unary(|a| !a)?,
            SHL => self.binary(|shift, value| value.shl(shift))?,
            SHR => self.binary(|shift, value| value.shr(shift))?,
            ADDRESS => self.push(U256::from_address(&self.callee))?,
            CALLER => self.push(U256::from_address(&self.caller))?,
            CALLDATALOAD => {
                let offset = self.stack.pop()?;
                self.push(load_padded(self.input, offset))?;
            }
            CALLDATASIZE => self.push_usize(self.input.len())?,
            CODESIZE => self.push_usize(self.code.len())?,
            POP => {
                self.stack.pop()?;
            }
            MLOAD => {
                let offset = self.stack.pop()?;
                let offset = self.grow(offset, 32)?;
                let word = U256::from_be_slice(self.memory.slice(offset, 32));
                self.push(word)?;
            }
            MSTORE => {
                let offset = self.stack.pop()?;
                let value = self.stack.pop()?;
                let offset = self.grow(offset, 32)?;
                self.memory.write(offset, &value.to_be_bytes());
            }
            MSTORE8 => {
                let offset = self.stack.pop()?;
                let value = self.stack.pop()?;
                let offset = self.grow(offset, 1)?;
                self.memory.write(offset, &[value.low_u8()]);
            }
            SLOAD => {
                let key = self.stack.pop()?;
                let value = self.storage.get(&key).copied().unwrap_or_default();
                self.push(value)?;
            }
            SSTORE => {
                self.require_mutable()?;
                let key = self.stack.pop()?;
                let value = self.stack.pop()?;
                let current = self.storage.get(&key).copied().unwrap_or_default();
                if current.is_zero() && !value.is_zero() {
                    self.charge(gas::SSTORE_SET)?;
                } else {
                    self.charge(gas::SSTORE_RESET)?;
                }
                if value.is_zero() {
                    self.storage.remove(&key);
                } else {
                    self.storage.insert(key, value);
                }
            }
            JUMP => {
                let dest = self.stack.pop()?;
                return self.jump_target(dest);
            }
            JUMPI => {
                let dest = self.stack.pop()?;
                let condition = self.stack.pop()?;
                if !condition.is_zero() {
                    return self.jump_target(dest);
                }
            }
            PC => self.push_usize(self.pc)?,
            MSIZE => self.push_usize(self.memory.len())?,
            GAS => self.push(U256::from_u64(self.gas as u64))?,
            JUMPDEST => {}
            PUSH1..=PUSH32 => {
                let size = opcodes::immediate_size(opcode);
                let start = (self.pc + 1).min(self.code.len());
                let end = (self.pc + 1 + size).min(self.code.len());
                let available = &self.code[start..end];
                let mut word = [0u8; 32];
                word[32 - size..32 - size + available.len()].copy_from_slice(available);
                self.push(U256::from_be_bytes(&word))?;
            }
            DUP1..=DUP16 => self.stack.dup(usize::from(opcode - DUP1) + 1)?,
            SWAP1..=SWAP16 => self.stack.swap(usize::from(opcode - SWAP1) + 1)?,
            LOG0..=LOG4 => {
                self.require_mutable()?;
                let offset = self.stack.pop()?;
                let size = self.stack.pop()?;
                for _ in 0..(opcode - LOG0) {
                    self.stack.pop()?;
                }
                let data_cost = size
                    .to_usize()
                    .and_then(|size| gas::LOG_DATA.checked_mul(size as u64))
                    .ok_or(StatusCode::OutOfGas)?;
                self.charge(data_cost)?;
                self.grow_range(offset, size)?;
            }
            RETURN | REVERT => {
                let offset = self.stack.pop()?;
                let size = self.stack.pop()?;
                self.return_range = self.grow_range(offset, size)?;
                let status = if opcode == RETURN {
                    StatusCode::Success
                } else {
                    StatusCode::Revert
                };
                return Ok(Control::Halt(status));
            }
            // Remaining opcodes need a host interface.
            _ => return Err(StatusCode::InternalError),
        }
        Ok(Control::Continue)
    }
}
