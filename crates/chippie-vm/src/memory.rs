use std::io::{self, Read};

use tracing::debug;

use crate::constants::ROM_START_ADDRESS;
use crate::error::{BoundsError, Error, Result};

/// The fontset
/// this is a collection of bytes that make up the hex digits when written out in binary, one
/// byte below the other. F0 90 90 90 F0 looks like
///
/// 1111
/// 1  1
/// 1  1
/// 1  1
/// 1111
///
/// which is a zero.
pub const FONTSET: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, //0
    0x20, 0x60, 0x20, 0x20, 0x70, //1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, //2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, //3
    0x90, 0x90, 0xF0, 0x10, 0x10, //4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, //5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, //6
    0xF0, 0x10, 0x20, 0x40, 0x40, //7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, //8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, //9
    0xF0, 0x90, 0xF0, 0x90, 0x90, //a
    0xE0, 0x90, 0xE0, 0x90, 0xE0, //b
    0xF0, 0x80, 0x80, 0x80, 0xF0, //c
    0xE0, 0x90, 0x90, 0x90, 0xE0, //d
    0xF0, 0x80, 0xF0, 0x80, 0xF0, //e
    0xF0, 0x80, 0xF0, 0x80, 0x80, //f
];

///The ram of the chip8 cpu, uses big endian, and is laid out in the following way:
///0x000 to 0x050 the fontset
///0x200 start of chip-8 programs
///size - 1 end of ram
#[derive(Debug, Clone)]
pub struct Memory {
    bytes: Vec<u8>,
}

impl Memory {
    /// Returns zeroed ram of `size` bytes with the fontset already loaded
    pub fn with_fonts(size: usize) -> Result<Self> {
        if size <= usize::from(ROM_START_ADDRESS) {
            return Err(Error::InvalidConfig(format!(
                "memory size must be > {ROM_START_ADDRESS:#x}, got {size:#x}"
            )));
        }

        let mut bytes = vec![0; size];
        bytes[..FONTSET.len()].copy_from_slice(&FONTSET);
        Ok(Self { bytes })
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// How many bytes of program fit between the start address and the end of ram
    pub fn program_capacity(&self) -> usize {
        self.len() - usize::from(ROM_START_ADDRESS)
    }

    /// Copies the reader into ram at the start address, anything past the end of ram is ignored.
    /// Returns the amount of bytes loaded.
    pub fn load(&mut self, reader: &mut impl Read) -> io::Result<usize> {
        let mut program = Vec::with_capacity(self.program_capacity());
        reader
            .take(self.program_capacity() as u64)
            .read_to_end(&mut program)?;

        let start = usize::from(ROM_START_ADDRESS);
        self.bytes[start..start + program.len()].copy_from_slice(&program);
        debug!(bytes = program.len(), start, "loaded program");
        Ok(program.len())
    }

    /// Zeroes everything except the fontset
    pub fn clear_program(&mut self) {
        self.bytes[FONTSET.len()..].fill(0);
    }

    pub fn get_byte(&self, addr: usize) -> std::result::Result<u8, BoundsError> {
        Ok(self.slice(addr, 1)?[0])
    }

    pub fn set_byte(&mut self, addr: usize, value: u8) -> std::result::Result<(), BoundsError> {
        self.slice_mut(addr, 1)?[0] = value;
        Ok(())
    }

    /// Returns the big endian word at `addr`
    pub fn get_word(&self, addr: usize) -> std::result::Result<u16, BoundsError> {
        let word = self.slice(addr, 2)?;
        Ok(u16::from_be_bytes([word[0], word[1]]))
    }

    pub fn slice(&self, addr: usize, len: usize) -> std::result::Result<&[u8], BoundsError> {
        let range = self.check(addr, len)?;
        Ok(&self.bytes[range])
    }

    pub fn slice_mut(
        &mut self,
        addr: usize,
        len: usize,
    ) -> std::result::Result<&mut [u8], BoundsError> {
        let range = self.check(addr, len)?;
        Ok(&mut self.bytes[range])
    }

    fn check(
        &self,
        addr: usize,
        len: usize,
    ) -> std::result::Result<std::ops::Range<usize>, BoundsError> {
        let end = addr.saturating_add(len);
        if end > self.bytes.len() {
            return Err(BoundsError::Memory {
                addr,
                end,
                size: self.bytes.len(),
            });
        }
        Ok(addr..end)
    }
}
