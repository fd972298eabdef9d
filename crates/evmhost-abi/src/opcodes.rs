//! Opcode values and per-revision instruction names.
//!
//! Used by the trace printer to name the instruction at a code offset and by
//! the built-in interpreter to decide which opcodes exist in a revision.

use crate::revision::Revision;

pub const STOP: u8 = 0x00;
pub const ADD: u8 = 0x01;
pub const MUL: u8 = 0x02;
pub const SUB: u8 = 0x03;
pub const LT: u8 = 0x10;
pub const GT: u8 = 0x11;
pub const EQ: u8 = 0x14;
pub const ISZERO: u8 = 0x15;
pub const AND: u8 = 0x16;
pub const OR: u8 = 0x17;
pub const XOR: u8 = 0x18;
pub const NOT: u8 = 0x19;
pub const SHL: u8 = 0x1b;
pub const SHR: u8 = 0x1c;
pub const ADDRESS: u8 = 0x30;
pub const CALLER: u8 = 0x33;
pub const CALLDATALOAD: u8 = 0x35;
pub const CALLDATASIZE: u8 = 0x36;
pub const CODESIZE: u8 = 0x38;
pub const POP: u8 = 0x50;
pub const MLOAD: u8 = 0x51;
pub const MSTORE: u8 = 0x52;
pub const MSTORE8: u8 = 0x53;
pub const SLOAD: u8 = 0x54;
pub const SSTORE: u8 = 0x55;
pub const JUMP: u8 = 0x56;
pub const JUMPI: u8 = 0x57;
pub const PC: u8 = 0x58;
pub const MSIZE: u8 = 0x59;
pub const GAS: u8 = 0x5a;
pub const JUMPDEST: u8 = 0x5b;
pub const PUSH1: u8 = 0x60;
pub const PUSH32: u8 = 0x7f;
pub const DUP1: u8 = 0x80;
pub const DUP16: u8 = 0x8f;
pub const SWAP1: u8 = 0x90;
pub const SWAP16: u8 = 0x9f;
pub const LOG0: u8 = 0xa0;
pub const LOG4: u8 = 0xa4;
pub const CREATE: u8 = 0xf0;
pub const CALL: u8 = 0xf1;
pub const RETURN: u8 = 0xf3;
pub const DELEGATECALL: u8 = 0xf4;
pub const CREATE2: u8 = 0xf5;
pub const STATICCALL: u8 = 0xfa;
pub const REVERT: u8 = 0xfd;
pub const INVALID: u8 = 0xfe;
pub const SELFDESTRUCT: u8 = 0xff;

const PUSH_NAMES: [&str; 32] = [
    "PUSH1", "PUSH2", "PUSH3", "PUSH4", "PUSH5", "PUSH6", "PUSH7", "PUSH8", "PUSH9", "PUSH10",
    "PUSH11", "PUSH12", "PUSH13", "PUSH14", "PUSH15", "PUSH16", "PUSH17", "PUSH18", "PUSH19",
    "PUSH20", "PUSH21", "PUSH22", "PUSH23", "PUSH24", "PUSH25", "PUSH26", "PUSH27", "PUSH28",
    "PUSH29", "PUSH30", "PUSH31", "PUSH32",
];

const DUP_NAMES: [&str; 16] = [
    "DUP1", "DUP2", "DUP3", "DUP4", "DUP5", "DUP6", "DUP7", "DUP8", "DUP9", "DUP10", "DUP11",
    "DUP12", "DUP13", "DUP14", "DUP15", "DUP16",
];

const SWAP_NAMES: [&str; 16] = [
    "SWAP1", "SWAP2", "SWAP3", "SWAP4", "SWAP5", "SWAP6", "SWAP7", "SWAP8", "SWAP9", "SWAP10",
    "SWAP11", "SWAP12", "SWAP13", "SWAP14", "SWAP15", "SWAP16",
];

const LOG_NAMES: [&str; 5] = ["LOG0", "LOG1", "LOG2", "LOG3", "LOG4"];

/// Returns the mnemonic and the revision that introduced the opcode.
fn definition(opcode: u8) -> Option<(&'static str, Revision)> {
    use Revision::*;

    let def = match opcode {
        0x00 => ("STOP", Frontier),
        0x01 => ("ADD", Frontier),
        0x02 => ("MUL", Frontier),
        0x03 => ("SUB", Frontier),
        0x04 => ("DIV", Frontier),
        0x05 => ("SDIV", Frontier),
        0x06 => ("MOD", Frontier),
        0x07 => ("SMOD", Frontier),
        0x08 => ("ADDMOD", Frontier),
        0x09 => ("MULMOD", Frontier),
        0x0a => ("EXP", Frontier),
        0x0b => ("SIGNEXTEND", Frontier),
        0x10 => ("LT", Frontier),
        0x11 => ("GT", Frontier),
        0x12 => ("SLT", Frontier),
        0x13 => ("SGT", Frontier),
        0x14 => ("EQ", Frontier),
        0x15 => ("ISZERO", Frontier),
        0x16 => ("AND", Frontier),
        0x17 => ("OR", Frontier),
        0x18 => ("XOR", Frontier),
        0x19 => ("NOT", Frontier),
        0x1a => ("BYTE", Frontier),
        0x1b => ("SHL", Constantinople),
        0x1c => ("SHR", Constantinople),
        0x1d => ("SAR", Constantinople),
        0x20 => ("SHA3", Frontier),
        0x30 => ("ADDRESS", Frontier),
        0x31 => ("BALANCE", Frontier),
        0x32 => ("ORIGIN", Frontier),
        0x33 => ("CALLER", Frontier),
        0x34 => ("CALLVALUE", Frontier),
        0x35 => ("CALLDATALOAD", Frontier),
        0x36 => ("CALLDATASIZE", Frontier),
        0x37 => ("CALLDATACOPY", Frontier),
        0x38 => ("CODESIZE", Frontier),
        0x39 => ("CODECOPY", Frontier),
        0x3a => ("GASPRICE", Frontier),
        0x3b => ("EXTCODESIZE", Frontier),
        0x3c => ("EXTCODECOPY", Frontier),
        0x3d => ("RETURNDATASIZE", Byzantium),
        0x3e => ("RETURNDATACOPY", Byzantium),
        0x3f => ("EXTCODEHASH", Constantinople),
        0x40 => ("BLOCKHASH", Frontier),
        0x41 => ("COINBASE", Frontier),
        0x42 => ("TIMESTAMP", Frontier),
        0x43 => ("NUMBER", Frontier),
        0x44 => ("DIFFICULTY", Frontier),
        0x45 => ("GASLIMIT", Frontier),
        0x50 => ("POP", Frontier),
        0x51 => ("MLOAD", Frontier),
        0x52 => ("MSTORE", Frontier),
        0x53 => ("MSTORE8", Frontier),
        0x54 => ("SLOAD", Frontier),
        0x55 => ("SSTORE", Frontier),
        0x56 => ("JUMP", Frontier),
        0x57 => ("JUMPI", Frontier),
        0x58 => ("PC", Frontier),
        0x59 => ("MSIZE", Frontier),
        0x5a => ("GAS", Frontier),
        0x5b => ("JUMPDEST", Frontier),
        0x60..=0x7f => (PUSH_NAMES[(opcode - PUSH1) as usize], Frontier),
        0x80..=0x8f => (DUP_NAMES[(opcode - DUP1) as usize], Frontier),
        0x90..=0x9f => (SWAP_NAMES[(opcode - SWAP1) as usize], Frontier),
        0xa0..=0xa4 => (LOG_NAMES[(opcode - LOG0) as usize], Frontier),
        0xf0 => ("CREATE", Frontier),
        0xf1 => ("CALL", Frontier),
        0xf2 => ("CALLCODE", Frontier),
        0xf3 => ("RETURN", Frontier),
        0xf4 => ("DELEGATECALL", Homestead),
        0xf5 => ("CREATE2", Constantinople),
        0xfa => ("STATICCALL", Byzantium),
        0xfd => ("REVERT", Byzantium),
        0xfe => ("INVALID", Frontier),
        0xff => ("SELFDESTRUCT", Frontier),
        _ => return None,
    };
    Some(def)
}

/// Returns the mnemonic of `opcode` if it is defined in `revision`.
pub fn instruction_name(revision: Revision, opcode: u8) -> Option<&'static str> {
    match definition(opcode) {
        Some((name, since)) if since <= revision => Some(name),
        _ => None,
    }
}

/// Returns the revision that introduced `opcode`, if any did.
pub fn introduced_in(opcode: u8) -> Option<Revision> {
    definition(opcode).map(|(_, since)| since)
}

/// Number of immediate bytes following `opcode` (non-zero only for PUSH).
pub fn immediate_size(opcode: u8) -> usize {
    if (PUSH1..=PUSH32).contains(&opcode) {
        (opcode - PUSH1) as usize + 1
    } else {
        0
    }
}
