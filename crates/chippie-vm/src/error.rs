use std::io;

use thiserror::Error;

use crate::instruction::Instruction;

pub type Result<T> = std::result::Result<T, Error>;

/// Raised by the decoder for words that do not map to any instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unknown opcode: {0:#06x}")]
    UnknownOpcode(u16),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BoundsError {
    #[error("register V{index:X} out of bounds (have {count} registers)")]
    Register { index: usize, count: usize },
    #[error("memory access {addr:#06x}..{end:#06x} out of bounds (memory size {size:#06x})")]
    Memory { addr: usize, end: usize, size: usize },
    #[error("point ({x}, {y}) out of bounds (display is {width}x{height})")]
    Display {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    },
    #[error("key {key:#x} out of bounds (have {count} keys)")]
    Key { key: usize, count: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StackError {
    #[error("stack is full (capacity {capacity})")]
    Full { capacity: usize },
    #[error("stack is empty")]
    Empty,
}

/// Everything a cycle, a load or a constructor can fail with.
///
/// [`Error::EndOfProgram`] is not a fault: it tells the driver that the
/// program counter ran off the end of memory and the loop should stop.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Bounds(#[from] BoundsError),
    #[error(transparent)]
    Stack(#[from] StackError),
    #[error("end of program")]
    EndOfProgram,
    #[error("want {want} args, got {got}")]
    ArgCount { want: usize, got: usize },
    #[error("instruction not implemented: {0}")]
    NotImplemented(Instruction),
    #[error("key wait abandoned by the key source")]
    KeyWaitAbandoned,
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    pub fn is_end_of_program(&self) -> bool {
        matches!(self, Error::EndOfProgram)
    }
}
