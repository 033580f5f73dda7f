use crate::constants::{DISPLAY_HEIGHT, DISPLAY_WIDTH, RAM_SIZE, STACK_SIZE};

/// The shape of the machine to build. The defaults describe the classic 4K machine with a
/// 64x32 display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub stack_capacity: usize,
    pub memory_size: usize,
    pub width: usize,
    pub height: usize,
    /// Seed for the random number instruction, a random seed is used when this is None
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            stack_capacity: STACK_SIZE,
            memory_size: RAM_SIZE,
            width: DISPLAY_WIDTH,
            height: DISPLAY_HEIGHT,
            seed: None,
        }
    }
}
