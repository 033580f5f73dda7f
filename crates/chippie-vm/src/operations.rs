use rand::Rng;
use tracing::debug;

use crate::constants::{FONT_STRIDE, INSTRUCTION_SIZE};
use crate::cpu::{Cpu, PendingKey};
use crate::error::{BoundsError, Error, Result};
use crate::framebuffer;
use crate::instruction::{Instruction, Opcode};

/// Executes one decoded instruction. The program counter already points past it.
pub(crate) type Handler = fn(&mut Cpu, &Instruction) -> Result<()>;

/// Looks up the handler for an operation
pub(crate) fn handler(op: Opcode) -> Handler {
    match op {
        Opcode::Nop => nop,
        Opcode::ExecNNN => exec,
        Opcode::Clear => clear,
        Opcode::Return => ret,
        Opcode::JumpNNN => jump,
        Opcode::CallSub => call,
        Opcode::SkipIfXEqNN => skip_eq_nn,
        Opcode::SkipIfXNotEqNN => skip_ne_nn,
        Opcode::SkipIfXEqY => skip_eq_y,
        Opcode::StoreNNInX => load_nn,
        Opcode::AddNNToX => add_nn,
        Opcode::StoreYinX => mov,
        Opcode::SetXToXORY => or,
        Opcode::SetXToXANDY => and,
        Opcode::SetXToXXORY => xor,
        Opcode::AddYToX => add,
        Opcode::SubYFromX => sub,
        Opcode::StoreYShiftedRightInX => shr,
        Opcode::SetXToYMinusX => subn,
        Opcode::StoreYShiftedLeftInX => shl,
        Opcode::SkipIfXNotEqY => skip_ne_y,
        Opcode::StoreMemAddrNNNInRegI => load_i,
        Opcode::JumpToAddrNNNPlusV0 => jump_v0,
        Opcode::SetXToRandomNumWithMaskNN => random,
        Opcode::DrawSpriteInXY => draw,
        Opcode::SkipIfKeyInXIsPressed => skip_key_pressed,
        Opcode::SkipIfKeyInXNotPressed => skip_key_not_pressed,
        Opcode::StoreValDTInX => load_dt,
        Opcode::WaitForKeyAndStoreInX => wait_key,
        Opcode::SetDTToX => set_dt,
        Opcode::SetSTToX => set_st,
        Opcode::AddXToI => add_i,
        Opcode::SetIToMemAddrOfSpriteInX => load_font,
        Opcode::StoreBCDOfXInI => bcd,
        Opcode::Store0ToXInI => store_registers,
        Opcode::Fill0ToXWithValueInAddrI => load_registers,
    }
}

fn skip_if(cpu: &mut Cpu, condition: bool) {
    if condition {
        cpu.program_counter = cpu.program_counter.wrapping_add(INSTRUCTION_SIZE);
    }
}

fn vx(cpu: &Cpu, instruction: &Instruction) -> Result<u8> {
    Ok(cpu.registers.get_register(instruction.x())?)
}

fn vy(cpu: &Cpu, instruction: &Instruction) -> Result<u8> {
    Ok(cpu.registers.get_register(instruction.y())?)
}

fn index(cpu: &Cpu) -> usize {
    usize::from(cpu.registers.get_index_register())
}

/// Vx = f(Vx, Vy). The flag, if any, is written after the result so it wins when x is F.
fn alu(
    cpu: &mut Cpu,
    instruction: &Instruction,
    f: impl FnOnce(u8, u8) -> (u8, Option<bool>),
) -> Result<()> {
    let (result, flag) = f(vx(cpu, instruction)?, vy(cpu, instruction)?);
    cpu.registers.set_register(instruction.x(), result)?;
    if let Some(flag) = flag {
        cpu.registers.set_flag(flag);
    }
    Ok(())
}

/// do nothing
fn nop(_cpu: &mut Cpu, _instruction: &Instruction) -> Result<()> {
    Ok(())
}

/// machine code routine at nnn, which there is no machine for
fn exec(_cpu: &mut Cpu, instruction: &Instruction) -> Result<()> {
    Err(Error::NotImplemented(*instruction))
}

/// clear
fn clear(cpu: &mut Cpu, _instruction: &Instruction) -> Result<()> {
    framebuffer::lock(&cpu.framebuffer).clear();
    Ok(())
}

/// PC = STACK.pop()
fn ret(cpu: &mut Cpu, _instruction: &Instruction) -> Result<()> {
    cpu.program_counter = cpu.stack.pop()?;
    Ok(())
}

/// PC = nnn
fn jump(cpu: &mut Cpu, instruction: &Instruction) -> Result<()> {
    cpu.program_counter = instruction.nnn()?;
    Ok(())
}

/// STACK.push(PC); PC = nnn
fn call(cpu: &mut Cpu, instruction: &Instruction) -> Result<()> {
    let addr = instruction.nnn()?;
    cpu.stack.push(cpu.program_counter)?;
    cpu.program_counter = addr;
    Ok(())
}

/// if Vx == nn then pc += 2
fn skip_eq_nn(cpu: &mut Cpu, instruction: &Instruction) -> Result<()> {
    let condition = vx(cpu, instruction)? == instruction.nn()?;
    skip_if(cpu, condition);
    Ok(())
}

/// if Vx != nn then pc += 2
fn skip_ne_nn(cpu: &mut Cpu, instruction: &Instruction) -> Result<()> {
    let condition = vx(cpu, instruction)? != instruction.nn()?;
    skip_if(cpu, condition);
    Ok(())
}

/// if Vx == Vy then pc += 2
fn skip_eq_y(cpu: &mut Cpu, instruction: &Instruction) -> Result<()> {
    let condition = vx(cpu, instruction)? == vy(cpu, instruction)?;
    skip_if(cpu, condition);
    Ok(())
}

/// if Vx != Vy then pc += 2
fn skip_ne_y(cpu: &mut Cpu, instruction: &Instruction) -> Result<()> {
    let condition = vx(cpu, instruction)? != vy(cpu, instruction)?;
    skip_if(cpu, condition);
    Ok(())
}

/// Vx = nn
fn load_nn(cpu: &mut Cpu, instruction: &Instruction) -> Result<()> {
    cpu.registers.set_register(instruction.x(), instruction.nn()?)?;
    Ok(())
}

/// Vx += nn, no carry
fn add_nn(cpu: &mut Cpu, instruction: &Instruction) -> Result<()> {
    let result = vx(cpu, instruction)?.wrapping_add(instruction.nn()?);
    cpu.registers.set_register(instruction.x(), result)?;
    Ok(())
}

/// Vx = Vy
fn mov(cpu: &mut Cpu, instruction: &Instruction) -> Result<()> {
    alu(cpu, instruction, |_, y| (y, None))
}

/// Vx |= Vy
fn or(cpu: &mut Cpu, instruction: &Instruction) -> Result<()> {
    alu(cpu, instruction, |x, y| (x | y, None))
}

/// Vx &= Vy
fn and(cpu: &mut Cpu, instruction: &Instruction) -> Result<()> {
    alu(cpu, instruction, |x, y| (x & y, None))
}

/// Vx ^= Vy
fn xor(cpu: &mut Cpu, instruction: &Instruction) -> Result<()> {
    alu(cpu, instruction, |x, y| (x ^ y, None))
}

/// Vx += Vy; VF = carry
fn add(cpu: &mut Cpu, instruction: &Instruction) -> Result<()> {
    alu(cpu, instruction, |x, y| {
        let (result, carry) = x.overflowing_add(y);
        (result, Some(carry))
    })
}

/// Vx -= Vy; VF = not borrow
fn sub(cpu: &mut Cpu, instruction: &Instruction) -> Result<()> {
    alu(cpu, instruction, |x, y| (x.wrapping_sub(y), Some(x >= y)))
}

/// Vx = Vy - Vx; VF = not borrow
fn subn(cpu: &mut Cpu, instruction: &Instruction) -> Result<()> {
    alu(cpu, instruction, |x, y| (y.wrapping_sub(x), Some(y >= x)))
}

/// Vx = Vy >> 1; VF = the bit shifted out
fn shr(cpu: &mut Cpu, instruction: &Instruction) -> Result<()> {
    alu(cpu, instruction, |_, y| (y >> 1, Some(y & 0x01 == 0x01)))
}

/// Vx = Vy << 1; VF = the bit shifted out
fn shl(cpu: &mut Cpu, instruction: &Instruction) -> Result<()> {
    alu(cpu, instruction, |_, y| (y << 1, Some(y & 0x80 == 0x80)))
}

/// I = nnn
fn load_i(cpu: &mut Cpu, instruction: &Instruction) -> Result<()> {
    cpu.registers.set_index_register(instruction.nnn()?);
    Ok(())
}

/// PC = nnn + V0
fn jump_v0(cpu: &mut Cpu, instruction: &Instruction) -> Result<()> {
    // at most 0xFFF + 0xFF, no overflow
    let target = instruction.nnn()? + u16::from(cpu.registers.get_register(0)?);
    let size = cpu.memory.len();
    if usize::from(target) >= size {
        return Err(BoundsError::Memory {
            addr: usize::from(target),
            end: usize::from(target + INSTRUCTION_SIZE),
            size,
        }
        .into());
    }
    cpu.program_counter = target;
    Ok(())
}

/// Vx = random byte & nn
fn random(cpu: &mut Cpu, instruction: &Instruction) -> Result<()> {
    let mask = instruction.nn()?;
    let byte: u8 = cpu.rng.random();
    cpu.registers.set_register(instruction.x(), byte & mask)?;
    Ok(())
}

/// XOR n bytes of sprite data from I onto the display at (Vx, Vy); VF = collision
fn draw(cpu: &mut Cpu, instruction: &Instruction) -> Result<()> {
    let x = usize::from(vx(cpu, instruction)?);
    let y = usize::from(vy(cpu, instruction)?);
    let rows = cpu
        .memory
        .slice(index(cpu), usize::from(instruction.n()))?;

    let collision = framebuffer::lock(&cpu.framebuffer).draw_sprite(x, y, rows);
    cpu.registers.set_flag(collision);
    Ok(())
}

/// if key Vx is down then pc += 2
fn skip_key_pressed(cpu: &mut Cpu, instruction: &Instruction) -> Result<()> {
    let pressed = cpu.keys.get(usize::from(vx(cpu, instruction)?))?;
    skip_if(cpu, pressed);
    Ok(())
}

/// if key Vx is up then pc += 2
fn skip_key_not_pressed(cpu: &mut Cpu, instruction: &Instruction) -> Result<()> {
    let pressed = cpu.keys.get(usize::from(vx(cpu, instruction)?))?;
    skip_if(cpu, !pressed);
    Ok(())
}

/// Vx = DT
fn load_dt(cpu: &mut Cpu, instruction: &Instruction) -> Result<()> {
    let delay = cpu.timers.delay();
    cpu.registers.set_register(instruction.x(), delay)?;
    Ok(())
}

/// Vx = next key pressed. Nothing else runs until the key arrives.
fn wait_key(cpu: &mut Cpu, instruction: &Instruction) -> Result<()> {
    let register = instruction.x();
    cpu.registers.get_register(register)?;
    cpu.pending_key = Some(PendingKey {
        register,
        wait: cpu.keys.wait_for_keypress(),
    });
    debug!(register, "waiting for a key");
    Ok(())
}

/// DT = Vx
fn set_dt(cpu: &mut Cpu, instruction: &Instruction) -> Result<()> {
    let value = vx(cpu, instruction)?;
    cpu.timers.set_delay(value);
    Ok(())
}

/// ST = Vx
fn set_st(cpu: &mut Cpu, instruction: &Instruction) -> Result<()> {
    let value = vx(cpu, instruction)?;
    cpu.timers.set_sound(value);
    Ok(())
}

/// I += Vx
fn add_i(cpu: &mut Cpu, instruction: &Instruction) -> Result<()> {
    let index = cpu
        .registers
        .get_index_register()
        .wrapping_add(u16::from(vx(cpu, instruction)?));
    cpu.registers.set_index_register(index);
    Ok(())
}

/// I = address of the font glyph for Vx
fn load_font(cpu: &mut Cpu, instruction: &Instruction) -> Result<()> {
    let glyph = u16::from(vx(cpu, instruction)?);
    cpu.registers.set_index_register(glyph * FONT_STRIDE);
    Ok(())
}

/// mem[I..I+3] = hundreds, tens and ones of Vx
fn bcd(cpu: &mut Cpu, instruction: &Instruction) -> Result<()> {
    let value = vx(cpu, instruction)?;
    let digits = [value / 100, value / 10 % 10, value % 10];
    let index = index(cpu);
    cpu.memory.slice_mut(index, digits.len())?.copy_from_slice(&digits);
    Ok(())
}

/// mem[I..I+x] = V0..Vx, I unchanged
fn store_registers(cpu: &mut Cpu, instruction: &Instruction) -> Result<()> {
    let index = index(cpu);
    let values = cpu.registers.range(instruction.x())?;
    cpu.memory
        .slice_mut(index, values.len())?
        .copy_from_slice(values);
    Ok(())
}

/// V0..Vx = mem[I..I+x], I unchanged
fn load_registers(cpu: &mut Cpu, instruction: &Instruction) -> Result<()> {
    let index = index(cpu);
    let values = cpu.registers.range_mut(instruction.x())?;
    let bytes = cpu.memory.slice(index, values.len())?;
    values.copy_from_slice(bytes);
    Ok(())
}
