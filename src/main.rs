use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::Context;
use chippie_vm::{Config, Cpu, KeyInput, Keypad, RomBuffer, lock_framebuffer};
use clap::Parser;
use tracing::level_filters::LevelFilter;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Run a chip8 rom headless.
///
/// Key events are read from stdin, one per line: a hex digit presses that key, the same digit
/// prefixed with `-` releases it.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// The path to the rom to run.
    #[arg(long)]
    rom: PathBuf,

    /// Stack capacity, in return addresses.
    #[arg(long, default_value_t = Config::default().stack_capacity)]
    stack: usize,

    /// Ram size in bytes, fontset and program included.
    #[arg(long, default_value_t = Config::default().memory_size)]
    memory: usize,

    #[arg(long, default_value_t = Config::default().width)]
    width: usize,

    #[arg(long, default_value_t = Config::default().height)]
    height: usize,

    /// Seed for the random number instruction.
    #[arg(long)]
    seed: Option<u64>,

    /// Time to sleep between cycles.
    #[arg(long, default_value = "2")]
    cycle_delay_ms: u64,

    /// Stop after this many cycles.
    #[arg(long)]
    max_cycles: Option<u64>,
}

impl Args {
    fn config(&self) -> Config {
        Config {
            stack_capacity: self.stack,
            memory_size: self.memory,
            width: self.width,
            height: self.height,
            seed: self.seed,
        }
    }
}

/// A key going down or up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct KeyEvent {
    key: usize,
    pressed: bool,
}

fn parse_key_event(line: &str) -> Option<KeyEvent> {
    let line = line.trim();
    let (digits, pressed) = match line.strip_prefix('-') {
        Some(rest) => (rest, false),
        None => (line, true),
    };
    let key = usize::from_str_radix(digits, 16).ok()?;
    Some(KeyEvent { key, pressed })
}

/// Feeds key events from stdin to the keypad until stdin closes
fn spawn_key_reader(keys: Arc<Keypad>) -> io::Result<thread::JoinHandle<()>> {
    thread::Builder::new()
        .name("keys".to_string())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(err) => {
                        warn!(%err, "stopped reading keys");
                        break;
                    }
                };
                let Some(event) = parse_key_event(&line) else {
                    warn!(line = %line, "not a key event");
                    continue;
                };
                match keys.set(event.key, event.pressed) {
                    Ok(()) => debug!(key = event.key, pressed = event.pressed, "key"),
                    Err(err) => warn!(%err, "ignored key event"),
                }
            }
            // nobody is left to press the key any wait now or later is blocked on
            info!("stdin closed, key waits will be abandoned");
            keys.close();
        })
}

fn run(cpu: &mut Cpu, delay: Duration, max_cycles: Option<u64>) -> anyhow::Result<u64> {
    let mut cycles = 0;
    loop {
        if max_cycles.is_some_and(|max| cycles >= max) {
            info!(cycles, "reached the cycle limit");
            return Ok(cycles);
        }

        match cpu.tick() {
            Ok(()) => {}
            Err(err) if err.is_end_of_program() => {
                info!(cycles, "end of program");
                return Ok(cycles);
            }
            Err(err) => {
                let last = cpu
                    .last_instruction()
                    .map_or_else(|| "none".to_string(), |instruction| instruction.to_string());
                return Err(err).with_context(|| {
                    format!(
                        "cycle {cycles} failed at pc {:#05x}, index {:#05x}, last instruction {last}",
                        cpu.pc(),
                        cpu.index()
                    )
                });
            }
        }

        cycles += 1;
        thread::sleep(delay);
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();
    tracing_subscriber::registry()
        .with(fmt::layer().compact().with_thread_names(true))
        .with(filter)
        .init();

    let rom = RomBuffer::open(&args.rom)
        .with_context(|| format!("could not open rom {}", args.rom.display()))?;

    let keys = Arc::new(Keypad::new());
    let mut cpu = Cpu::from_config(&args.config(), Arc::clone(&keys) as Arc<dyn KeyInput>)
        .context("error creating emulator")?;
    cpu.load_rom(&rom).context("could not load rom")?;
    info!(rom = %args.rom.display(), bytes = rom.len(), "loaded");

    spawn_key_reader(keys).context("could not start the key reader")?;

    let cycles = run(
        &mut cpu,
        Duration::from_millis(args.cycle_delay_ms),
        args.max_cycles,
    )?;

    let display = cpu.display();
    let lit = lock_framebuffer(&display)
        .rows()
        .flatten()
        .filter(|pixel| pixel.is_set())
        .count();
    info!(
        cycles,
        pc = cpu.pc(),
        index = cpu.index(),
        registers = ?cpu.registers(),
        lit,
        "stopped"
    );
    Ok(())
}
