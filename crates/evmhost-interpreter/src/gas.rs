//! Static instruction costs.

use evmhost_abi::opcodes::*;
use evmhost_abi::Revision;

pub const ZERO: u64 = 0;
pub const BASE: u64 = 2;
pub const VERY_LOW: u64 = 3;
pub const LOW: u64 = 5;
pub const MID: u64 = 8;
pub const HIGH: u64 = 10;
pub const JUMPDEST_COST: u64 = 1;

pub const SSTORE_SET: u64 = 20_000;
pub const SSTORE_RESET: u64 = 5_000;

pub const LOG_BASE: u64 = 375;
pub const LOG_TOPIC: u64 = 375;
pub const LOG_DATA: u64 = 8;

/// Fixed part of an instruction's cost. Memory growth and storage writes
/// are charged on top by the instruction itself.
pub fn static_cost(revision: Revision, opcode: u8) -> u64 {
    match opcode {
        STOP | RETURN | REVERT | SSTORE => ZERO,
        ADDRESS | CALLER | CALLDATASIZE | CODESIZE | POP | PC | MSIZE | GAS => BASE,
        ADD | SUB | LT | GT | EQ | ISZERO | AND | OR | XOR | NOT | SHL | SHR | CALLDATALOAD
        | MLOAD | MSTORE | MSTORE8 => VERY_LOW,
        MUL => LOW,
        JUMP => MID,
        JUMPI => HIGH,
        JUMPDEST => JUMPDEST_COST,
        SLOAD if revision >= Revision::TangerineWhistle => 200,
        SLOAD => 50,
        PUSH1..=PUSH32 | DUP1..=DUP16 | SWAP1..=SWAP16 => VERY_LOW,
        LOG0..=LOG4 => LOG_BASE + LOG_TOPIC * u64::from(opcode - LOG0),
        _ => ZERO,
    }
}
