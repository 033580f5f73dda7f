use std::time::Duration;

/// The width of the display in pixels
pub const DISPLAY_WIDTH: usize = 64;
/// The height of the display in pixels
pub const DISPLAY_HEIGHT: usize = 32;
/// The size of ram in bytes for the classic machine
pub const RAM_SIZE: usize = 4096;
/// How many return addresses fit on the classic call stack
pub const STACK_SIZE: usize = 16;
/// Programs are loaded here, and the program counter starts here
pub const ROM_START_ADDRESS: u16 = 0x200;
/// Every instruction is two bytes wide
pub const INSTRUCTION_SIZE: u16 = 2;
/// Amount of registers CHIP-8 has
pub const NUM_REGISTERS: u8 = 16;
/// Register VF doubles as the carry, borrow and collision flag
pub const FLAG_REGISTER: u8 = 0xF;
/// Amount of keys on the hexadecimal keypad
pub const NUM_KEYS: u8 = 16;
/// Every font glyph is 5 bytes tall
pub const FONT_STRIDE: u16 = 5;
/// The delay and sound timers count down at 60hz
pub const TIMER_PERIOD: Duration = Duration::from_millis(16);
