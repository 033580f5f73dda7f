use std::io::Read;
use std::sync::Arc;
use std::time::Instant;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, trace, warn};

use crate::config::Config;
use crate::constants::{INSTRUCTION_SIZE, NUM_REGISTERS, ROM_START_ADDRESS};
use crate::error::{Error, Result};
use crate::framebuffer::{self, Framebuffer, SharedFramebuffer};
use crate::instruction::{Instruction, decode};
use crate::keypad::{KeyInput, KeyWait, KeyWaitStatus};
use crate::memory::Memory;
use crate::operations;
use crate::registers::Registers;
use crate::rombuffer::RomBuffer;
use crate::stack::Stack;
use crate::timers::Timers;

/// The biggest memory a 16 bit program counter can walk through
const MAX_MEMORY_SIZE: usize = 0x10000;

/// A key wait registered by FX0A, and the register the key goes into
pub(crate) struct PendingKey {
    pub(crate) register: usize,
    pub(crate) wait: KeyWait,
}

/// The main cpu,
pub struct Cpu {
    /// The black and white pixels, shared with whoever renders them
    pub(crate) framebuffer: SharedFramebuffer,
    /// The keypad, owned by whoever produces key events
    pub(crate) keys: Arc<dyn KeyInput>,
    ///Program counter, used to keep track of what to fetch,decode and execute from ram, initialized at 0x200
    pub(crate) program_counter: u16,
    /// The memory, stores the fontset and the rom data
    pub(crate) memory: Memory,
    /// A random number generator. Seedable so random instructions can be tested
    pub(crate) rng: ChaCha8Rng,
    /// Registers 0x0 through 0xF and the index register
    pub(crate) registers: Registers,
    pub(crate) timers: Timers,
    pub(crate) stack: Stack,
    /// Set while FX0A is waiting for a key, nothing executes until it resolves
    pub(crate) pending_key: Option<PendingKey>,
    last_instruction: Option<Instruction>,
}

impl Cpu {
    /// Creates a new cpu with `memory_size` bytes of ram (fontset included) and room for
    /// `stack_capacity` return addresses. Load a program with [`Cpu::load`] before ticking.
    pub fn new(
        stack_capacity: usize,
        memory_size: usize,
        framebuffer: SharedFramebuffer,
        keys: Arc<dyn KeyInput>,
    ) -> Result<Self> {
        if memory_size > MAX_MEMORY_SIZE {
            return Err(Error::InvalidConfig(format!(
                "memory size must be <= {MAX_MEMORY_SIZE:#x}, got {memory_size:#x}"
            )));
        }

        Ok(Self {
            framebuffer,
            keys,
            program_counter: ROM_START_ADDRESS,
            memory: Memory::with_fonts(memory_size)?,
            rng: ChaCha8Rng::from_rng(&mut rand::rng()),
            registers: Registers::default(),
            timers: Timers::new(Instant::now()),
            stack: Stack::new(stack_capacity)?,
            pending_key: None,
            last_instruction: None,
        })
    }

    /// Creates a new cpu, and the framebuffer it draws on, from a config
    pub fn from_config(config: &Config, keys: Arc<dyn KeyInput>) -> Result<Self> {
        let framebuffer = Framebuffer::new(config.width, config.height)?.shared();
        let cpu = Self::new(config.stack_capacity, config.memory_size, framebuffer, keys)?;
        Ok(match config.seed {
            Some(seed) => cpu.with_seed(seed),
            None => cpu,
        })
    }

    /// Makes the random number instruction deterministic
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
        self
    }

    /// Copies a program into ram at 0x200. Programs bigger than the ram are cut off.
    pub fn load(&mut self, reader: &mut impl Read) -> Result<()> {
        self.memory.load(reader)?;
        Ok(())
    }

    pub fn load_rom(&mut self, rom: &RomBuffer) -> Result<()> {
        self.load(&mut rom.contents())
    }

    /// A single cpu cycle: decrements the timers if a period went by, then fetches, decodes and
    /// executes one instruction. While a key wait is outstanding the cycle only checks whether
    /// the key arrived.
    ///
    /// Returns [`Error::EndOfProgram`] once the program counter runs off the end of ram.
    pub fn tick(&mut self) -> Result<()> {
        self.timers.update(Instant::now());

        if self.pending_key.is_some() {
            return self.poll_key_wait();
        }

        let opcode = self.fetch()?;
        let pc = self.program_counter;
        self.program_counter += INSTRUCTION_SIZE;

        let instruction = decode(opcode)?;
        self.last_instruction = Some(instruction);
        trace!("{pc:#05x}: {instruction}");

        operations::handler(instruction.op)(self, &instruction)
    }

    /// Returns the two bytes the program counter points to
    fn fetch(&self) -> Result<u16> {
        let pc = usize::from(self.program_counter);
        if pc + usize::from(INSTRUCTION_SIZE) >= self.memory.len() {
            return Err(Error::EndOfProgram);
        }
        Ok(self.memory.get_word(pc)?)
    }

    fn poll_key_wait(&mut self) -> Result<()> {
        let Some(pending) = &self.pending_key else {
            return Ok(());
        };
        let register = pending.register;

        match pending.wait.poll() {
            KeyWaitStatus::Pending => Ok(()),
            KeyWaitStatus::Pressed(key) => {
                self.pending_key = None;
                debug!(key, register, "key wait resolved");
                self.registers.set_register(register, key)?;
                Ok(())
            }
            KeyWaitStatus::Abandoned => {
                self.pending_key = None;
                warn!(register, "key wait abandoned");
                Err(Error::KeyWaitAbandoned)
            }
        }
    }

    /// Gives up on an outstanding key wait, and tells the key source to forget it. The key
    /// source is only told when its registration is still ours, a wait that was already
    /// resolved or replaced by another consumer is left alone.
    pub fn abandon_key_wait(&mut self) {
        let Some(pending) = self.pending_key.take() else {
            return;
        };
        // the key source holds the sending end only while our registration is current
        if pending.wait.poll() == KeyWaitStatus::Pending {
            self.keys.cancel_wait();
        }
        debug!("abandoned key wait");
    }

    /// Puts the machine back in its power-on state. Ram is zeroed apart from the fontset, so
    /// a program has to be loaded again.
    pub fn reset(&mut self) {
        self.abandon_key_wait();
        self.program_counter = ROM_START_ADDRESS;
        self.registers = Registers::default();
        self.timers = Timers::new(Instant::now());
        self.stack.clear();
        self.memory.clear_program();
        framebuffer::lock(&self.framebuffer).clear();
        self.last_instruction = None;
        debug!("reset");
    }

    pub fn pc(&self) -> u16 {
        self.program_counter
    }

    pub fn index(&self) -> u16 {
        self.registers.get_index_register()
    }

    /// V0 through VF
    pub fn registers(&self) -> [u8; NUM_REGISTERS as usize] {
        self.registers.all()
    }

    pub fn last_instruction(&self) -> Option<Instruction> {
        self.last_instruction
    }

    /// The framebuffer the cpu draws on
    pub fn display(&self) -> SharedFramebuffer {
        Arc::clone(&self.framebuffer)
    }

    pub fn delay_timer(&self) -> u8 {
        self.timers.delay()
    }

    pub fn sound_timer(&self) -> u8 {
        self.timers.sound()
    }

    pub fn is_waiting_for_key(&self) -> bool {
        self.pending_key.is_some()
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn stack_depth(&self) -> usize {
        self.stack.len()
    }
}

impl Drop for Cpu {
    fn drop(&mut self) {
        self.abandon_key_wait();
    }
}
