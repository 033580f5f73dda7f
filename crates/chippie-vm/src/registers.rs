use crate::constants::{FLAG_REGISTER, NUM_REGISTERS};
use crate::error::BoundsError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
///# Holds the general purpose registers V0 through VF and the index register
pub struct Registers {
    register: [u8; NUM_REGISTERS as usize],
    vindex: u16,
}

impl Registers {
    pub fn set_index_register(&mut self, value: u16) {
        self.vindex = value;
    }
    pub fn get_index_register(&self) -> u16 {
        self.vindex
    }

    pub fn get_register(&self, register: usize) -> Result<u8, BoundsError> {
        self.register
            .get(register)
            .copied()
            .ok_or(BoundsError::Register {
                index: register,
                count: self.register.len(),
            })
    }
    pub fn set_register(&mut self, register: usize, value: u8) -> Result<(), BoundsError> {
        let count = self.register.len();
        let slot = self
            .register
            .get_mut(register)
            .ok_or(BoundsError::Register {
                index: register,
                count,
            })?;
        *slot = value;
        Ok(())
    }

    /// VF always exists, so setting the flag cannot fail
    pub fn set_flag(&mut self, value: bool) {
        self.register[usize::from(FLAG_REGISTER)] = u8::from(value);
    }

    /// V0 through V(x-1), checked
    pub fn range(&self, x: usize) -> Result<&[u8], BoundsError> {
        self.register.get(..x).ok_or(BoundsError::Register {
            index: x,
            count: self.register.len(),
        })
    }

    pub fn range_mut(&mut self, x: usize) -> Result<&mut [u8], BoundsError> {
        let count = self.register.len();
        self.register
            .get_mut(..x)
            .ok_or(BoundsError::Register { index: x, count })
    }

    pub fn all(&self) -> [u8; NUM_REGISTERS as usize] {
        self.register
    }
}
