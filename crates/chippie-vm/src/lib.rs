//! A virtual machine for chip8 style bytecode: 4K of ram, sixteen 8 bit registers, a call
//! stack, two 60hz timers, a hexadecimal keypad and a monochrome display.
//!
//! The [`Cpu`] executes one instruction per [`Cpu::tick`]. How fast it ticks is up to the
//! driver. The display and the keypad are shared with the driver so they can be rendered and
//! fed from other threads.

///Program configuration, the shape of the machine
mod config;
///This holds all of the constants (written in capital letters in the code)
pub mod constants;
///Handles the fetch, decode execute cycle
mod cpu;
///Everything that can go wrong
mod error;
///The monochrome display
mod framebuffer;
///An overview of all instructions in the chip 8 instruction set architecture
mod instruction;
///The hexadecimal keypad and waiting for a key
mod keypad;
///A data structure modeling ram
mod memory;
///What each instruction does
mod operations;
///The registers for the chip8 cpu
mod registers;
///Holds the data loaded from disk
mod rombuffer;
///The stack that is used in the cpu
mod stack;
///The delay and sound timers
mod timers;

// Re-export structs and modules that might be used by drivers and graphics libraries
pub use config::Config;
pub use constants::{DISPLAY_HEIGHT, DISPLAY_WIDTH};
pub use cpu::Cpu;
pub use error::{BoundsError, DecodeError, Error, Result, StackError};
pub use framebuffer::{Color, Framebuffer, SharedFramebuffer, lock as lock_framebuffer};
pub use instruction::{Instruction, Opcode, decode, nibbles, to_addr, to_byte};
pub use keypad::{KeyInput, KeyWait, KeyWaitStatus, Keypad};
pub use memory::{FONTSET, Memory};
pub use rombuffer::RomBuffer;
pub use stack::Stack;
pub use timers::Timers;
