use std::fmt;

use strum_macros::{Display, EnumIter};

use crate::error::{DecodeError, Error, Result};

/// # Every operation in the chip8 instruction set
/// Operands are always the three low nibbles of the word, how they are read depends on the
/// operation:
/// ## nnn
/// a memory address, 12 bits long
/// ## nn
/// a byte, 8 bits
/// ## n
/// a "nibble", 4 bits
/// ## X and Y
/// Registers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum Opcode {
    /// Does absolutely nothing, only 0000 decodes to this
    Nop, //0000
    /// A call into a machine language routine of the host, which we do not emulate
    ExecNNN, //0nnn
    /// Turns all the pixels to off
    Clear, //00e0
    /// Sets the program counter to the last address on the stack
    Return, //00ee
    JumpNNN, //1nnn
    CallSub, //2nnn
    SkipIfXEqNN, //3xnn
    SkipIfXNotEqNN, //4xnn
    SkipIfXEqY, //5xy0
    StoreNNInX, //6xnn
    /// Adds nn to register x, without touching the carry flag
    AddNNToX, //7xnn
    StoreYinX, //8xy0
    SetXToXORY, //8xy1
    SetXToXANDY, //8xy2
    SetXToXXORY, //8xy3
    /// vx + vy, vf is the carry
    AddYToX, //8xy4
    /// vx - vy, vf is set when there was *no* borrow
    SubYFromX, //8xy5
    /// vy >> 1 stored in x, vf is the bit that was shifted out
    StoreYShiftedRightInX, //8xy6
    /// vy - vx, vf is set when there was *no* borrow
    SetXToYMinusX, //8xy7
    /// vy << 1 stored in x, vf is the bit that was shifted out
    StoreYShiftedLeftInX, //8xye
    SkipIfXNotEqY, //9xy0
    StoreMemAddrNNNInRegI, //annn
    JumpToAddrNNNPlusV0, //bnnn
    SetXToRandomNumWithMaskNN, //cxnn
    /// Draws an 8 pixel wide, n pixel tall sprite at (vx, vy)
    DrawSpriteInXY, //dxyn
    SkipIfKeyInXIsPressed, //ex9e
    SkipIfKeyInXNotPressed, //exa1
    StoreValDTInX, //fx07
    WaitForKeyAndStoreInX, //fx0a
    SetDTToX, //fx15
    SetSTToX, //fx18
    AddXToI, //fx1e
    SetIToMemAddrOfSpriteInX, //fx29
    StoreBCDOfXInI, //fx33
    Store0ToXInI, //fx55
    Fill0ToXWithValueInAddrI, //fx65
}

/// A decoded word: the operation plus the three low nibbles it was decoded from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    pub op: Opcode,
    pub operands: [u8; 3],
}

impl Instruction {
    pub fn new(op: Opcode, operands: [u8; 3]) -> Self {
        Self { op, operands }
    }

    /// The register index in `[_x__]`
    pub fn x(&self) -> usize {
        usize::from(self.operands[0])
    }

    /// The register index in `[__y_]`
    pub fn y(&self) -> usize {
        usize::from(self.operands[1])
    }

    /// The nibble in `[___n]`
    pub fn n(&self) -> u8 {
        self.operands[2]
    }

    /// The byte in `[__nn]`
    pub fn nn(&self) -> Result<u8> {
        to_byte(&self.operands[1..])
    }

    /// The address in `[_nnn]`
    pub fn nnn(&self) -> Result<u16> {
        to_addr(&self.operands)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{Op: {}, Operands: [{:#x}, {:#x}, {:#x}]}}",
            self.op, self.operands[0], self.operands[1], self.operands[2]
        )
    }
}

/// Takes two bytes, and decodes what instruction they represent
pub fn decode(word: u16) -> std::result::Result<Instruction, DecodeError> {
    let [d0, d1, d2, d3] = nibbles(word);

    let op = match d0 {
        0x0 => match (d1, d2, d3) {
            (0x0, 0x0, 0x0) => Opcode::Nop,
            (0x0, 0xE, 0x0) => Opcode::Clear,
            (0x0, 0xE, 0xE) => Opcode::Return,
            _ => Opcode::ExecNNN,
        },
        0x1 => Opcode::JumpNNN,
        0x2 => Opcode::CallSub,
        0x3 => Opcode::SkipIfXEqNN,
        0x4 => Opcode::SkipIfXNotEqNN,
        0x5 => Opcode::SkipIfXEqY,
        0x6 => Opcode::StoreNNInX,
        0x7 => Opcode::AddNNToX,
        0x8 => match d3 {
            0x0 => Opcode::StoreYinX,
            0x1 => Opcode::SetXToXORY,
            0x2 => Opcode::SetXToXANDY,
            0x3 => Opcode::SetXToXXORY,
            0x4 => Opcode::AddYToX,
            0x5 => Opcode::SubYFromX,
            0x6 => Opcode::StoreYShiftedRightInX,
            0x7 => Opcode::SetXToYMinusX,
            0xE => Opcode::StoreYShiftedLeftInX,
            _ => return Err(DecodeError::UnknownOpcode(word)),
        },
        0x9 if d3 == 0x0 => Opcode::SkipIfXNotEqY,
        0xA => Opcode::StoreMemAddrNNNInRegI,
        0xB => Opcode::JumpToAddrNNNPlusV0,
        0xC => Opcode::SetXToRandomNumWithMaskNN,
        0xD => Opcode::DrawSpriteInXY,
        0xE => match (d2, d3) {
            (0x9, 0xE) => Opcode::SkipIfKeyInXIsPressed,
            (0xA, 0x1) => Opcode::SkipIfKeyInXNotPressed,
            _ => return Err(DecodeError::UnknownOpcode(word)),
        },
        0xF => match (d2, d3) {
            (0x0, 0x7) => Opcode::StoreValDTInX,
            (0x0, 0xA) => Opcode::WaitForKeyAndStoreInX,
            (0x1, 0x5) => Opcode::SetDTToX,
            (0x1, 0x8) => Opcode::SetSTToX,
            (0x1, 0xE) => Opcode::AddXToI,
            (0x2, 0x9) => Opcode::SetIToMemAddrOfSpriteInX,
            (0x3, 0x3) => Opcode::StoreBCDOfXInI,
            (0x5, 0x5) => Opcode::Store0ToXInI,
            (0x6, 0x5) => Opcode::Fill0ToXWithValueInAddrI,
            _ => return Err(DecodeError::UnknownOpcode(word)),
        },
        _ => return Err(DecodeError::UnknownOpcode(word)),
    };

    Ok(Instruction::new(op, [d1, d2, d3]))
}

/// Splits a word into its four nibbles, most significant first
pub fn nibbles(word: u16) -> [u8; 4] {
    [
        ((word >> 12) & 0xf) as u8,
        ((word >> 8) & 0xf) as u8,
        ((word >> 4) & 0xf) as u8,
        (word & 0xf) as u8,
    ]
}

/// Builds a 12 bit address out of three nibbles
pub fn to_addr(nibbles: &[u8]) -> Result<u16> {
    match nibbles {
        [n0, n1, n2] => Ok(u16::from(*n0) << 8 | u16::from(*n1) << 4 | u16::from(*n2)),
        _ => Err(Error::ArgCount {
            want: 3,
            got: nibbles.len(),
        }),
    }
}

/// Builds a byte out of two nibbles
pub fn to_byte(nibbles: &[u8]) -> Result<u8> {
    match nibbles {
        [n0, n1] => Ok(n0 << 4 | n1),
        _ => Err(Error::ArgCount {
            want: 2,
            got: nibbles.len(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    /// One word per opcode, with all operand nibbles set to 0x1 where they are free
    fn sample_word(op: Opcode) -> u16 {
        match op {
            Opcode::Nop => 0x0000,
            Opcode::ExecNNN => 0x0111,
            Opcode::Clear => 0x00E0,
            Opcode::Return => 0x00EE,
            Opcode::JumpNNN => 0x1111,
            Opcode::CallSub => 0x2111,
            Opcode::SkipIfXEqNN => 0x3111,
            Opcode::SkipIfXNotEqNN => 0x4111,
            Opcode::SkipIfXEqY => 0x5110,
            Opcode::StoreNNInX => 0x6111,
            Opcode::AddNNToX => 0x7111,
            Opcode::StoreYinX => 0x8110,
            Opcode::SetXToXORY => 0x8111,
            Opcode::SetXToXANDY => 0x8112,
            Opcode::SetXToXXORY => 0x8113,
            Opcode::AddYToX => 0x8114,
            Opcode::SubYFromX => 0x8115,
            Opcode::StoreYShiftedRightInX => 0x8116,
            Opcode::SetXToYMinusX => 0x8117,
            Opcode::StoreYShiftedLeftInX => 0x811E,
            Opcode::SkipIfXNotEqY => 0x9110,
            Opcode::StoreMemAddrNNNInRegI => 0xA111,
            Opcode::JumpToAddrNNNPlusV0 => 0xB111,
            Opcode::SetXToRandomNumWithMaskNN => 0xC111,
            Opcode::DrawSpriteInXY => 0xD111,
            Opcode::SkipIfKeyInXIsPressed => 0xE19E,
            Opcode::SkipIfKeyInXNotPressed => 0xE1A1,
            Opcode::StoreValDTInX => 0xF107,
            Opcode::WaitForKeyAndStoreInX => 0xF10A,
            Opcode::SetDTToX => 0xF115,
            Opcode::SetSTToX => 0xF118,
            Opcode::AddXToI => 0xF11E,
            Opcode::SetIToMemAddrOfSpriteInX => 0xF129,
            Opcode::StoreBCDOfXInI => 0xF133,
            Opcode::Store0ToXInI => 0xF155,
            Opcode::Fill0ToXWithValueInAddrI => 0xF165,
        }
    }

    #[test]
    fn decodes_every_opcode() {
        for op in Opcode::iter() {
            let word = sample_word(op);
            assert_eq!(decode(word).map(|i| i.op), Ok(op), "word {word:#06x}");
        }
    }

    #[test]
    fn decodes_clear() {
        assert_eq!(decode(0x00E0).unwrap().op, Opcode::Clear);
    }

    #[test]
    fn decodes_jump_operands() {
        assert_eq!(
            decode(0x1234),
            Ok(Instruction::new(Opcode::JumpNNN, [0x2, 0x3, 0x4]))
        );
    }

    #[test]
    fn decodes_add_y_to_x() {
        assert_eq!(
            decode(0x8014),
            Ok(Instruction::new(Opcode::AddYToX, [0x0, 0x1, 0x4]))
        );
    }

    #[test]
    fn family_zero_only_matches_exact_words() {
        assert_eq!(decode(0x0000).unwrap().op, Opcode::Nop);
        assert_eq!(decode(0x00E1).unwrap().op, Opcode::ExecNNN);
        assert_eq!(decode(0x01EE).unwrap().op, Opcode::ExecNNN);
        assert_eq!(decode(0x0FFF).unwrap().op, Opcode::ExecNNN);
    }

    #[test]
    fn rejects_unknown_patterns() {
        for word in [0x8008, 0x800F, 0x9001, 0x900F, 0xE000, 0xE19F, 0xF000, 0xF1FF, 0xF166] {
            assert_eq!(decode(word), Err(DecodeError::UnknownOpcode(word)));
        }
    }

    #[test]
    fn operand_views() {
        let instruction = decode(0xDABC).unwrap();
        assert_eq!(instruction.x(), 0xA);
        assert_eq!(instruction.y(), 0xB);
        assert_eq!(instruction.n(), 0xC);
        assert_eq!(instruction.nn().unwrap(), 0xBC);
        assert_eq!(instruction.nnn().unwrap(), 0xABC);
    }

    #[test]
    fn splits_nibbles() {
        assert_eq!(nibbles(0xABCD), [0xA, 0xB, 0xC, 0xD]);
    }

    #[test]
    fn to_addr_and_to_byte_check_arg_count() {
        assert_eq!(to_addr(&[0x1, 0x2, 0x3]).unwrap(), 0x123);
        assert_eq!(to_byte(&[0xF, 0x1]).unwrap(), 0xF1);
        assert!(matches!(
            to_addr(&[0x1, 0x2]),
            Err(Error::ArgCount { want: 3, got: 2 })
        ));
        assert!(matches!(
            to_byte(&[0x1, 0x2, 0x3]),
            Err(Error::ArgCount { want: 2, got: 3 })
        ));
    }

    #[test]
    fn formats_like_a_listing() {
        let instruction = decode(0x1234).unwrap();
        assert_eq!(
            instruction.to_string(),
            "{Op: JumpNNN, Operands: [0x2, 0x3, 0x4]}"
        );
    }
}
