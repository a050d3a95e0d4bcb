mod parse;

use crate::cpu::registers::{CpuRegister, CpuRegisterPair, CpuRegisters, Flags};
use crate::lcd::LcdState;
use crate::memory::AddressSpace;

pub use parse::{parse_next_instruction, ParseError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpCondition {
    NZ,
    Z,
    NC,
    C,
}

impl JumpCondition {
    fn check(self, flags: Flags) -> bool {
        match self {
            Self::NZ => !flags.zero,
            Self::Z => flags.zero,
            Self::NC => !flags.carry,
            Self::C => flags.carry,
        }
    }
}

/// A value source for 8-bit loads and arithmetic: a register, an immediate, or one of the
/// memory addressing modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadTarget {
    Register(CpuRegister),
    Immediate(u8),
    IndirectHL,
    IndirectHLInc,
    IndirectHLDec,
    IndirectBC,
    IndirectDE,
    Accumulator,
    FFIndirectC,
    FFDirect(u8),
    Direct(u16),
}

impl ReadTarget {
    fn read_value(
        self,
        cpu_registers: &mut CpuRegisters,
        address_space: &AddressSpace,
        lcd_state: &LcdState,
    ) -> u8 {
        match self {
            Self::Register(register) => cpu_registers.get(register),
            Self::Immediate(value) => value,
            Self::Accumulator => cpu_registers.a,
            Self::IndirectHL
            | Self::IndirectHLInc
            | Self::IndirectHLDec
            | Self::IndirectBC
            | Self::IndirectDE
            | Self::FFIndirectC
            | Self::FFDirect(..)
            | Self::Direct(..) => {
                let address = self.memory_address(cpu_registers);
                address_space.read_address_u8(address, lcd_state)
            }
        }
    }

    // The effective address of a memory addressing mode, applying the HL post-adjustment for
    // the (HL+)/(HL-) modes.
    fn memory_address(self, cpu_registers: &mut CpuRegisters) -> u16 {
        match self {
            Self::IndirectHL => cpu_registers.hl(),
            Self::IndirectHLInc => hl_post_adjust(cpu_registers, 1),
            Self::IndirectHLDec => hl_post_adjust(cpu_registers, -1),
            Self::IndirectBC => cpu_registers.bc(),
            Self::IndirectDE => cpu_registers.de(),
            Self::FFIndirectC => high_page(cpu_registers.c),
            Self::FFDirect(offset) => high_page(offset),
            Self::Direct(address) => address,
            Self::Register(..) | Self::Immediate(..) | Self::Accumulator => {
                unreachable!("register and immediate sources have no memory address")
            }
        }
    }

    fn cycles_required(self) -> u32 {
        match self {
            Self::Register(..) | Self::Accumulator => 0,
            Self::FFDirect(..) => 8,
            Self::Direct(..) => 12,
            _ => 4,
        }
    }
}

/// A destination for 8-bit loads; mirrors [`ReadTarget`] minus immediates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteTarget {
    Register(CpuRegister),
    IndirectHL,
    IndirectHLInc,
    IndirectHLDec,
    IndirectBC,
    IndirectDE,
    Accumulator,
    FFIndirectC,
    FFDirect(u8),
    Direct(u16),
}

impl WriteTarget {
    fn write_value(
        self,
        value: u8,
        cpu_registers: &mut CpuRegisters,
        address_space: &mut AddressSpace,
        lcd_state: &LcdState,
    ) {
        match self {
            Self::Register(register) => cpu_registers.set(register, value),
            Self::Accumulator => cpu_registers.a = value,
            Self::IndirectHL
            | Self::IndirectHLInc
            | Self::IndirectHLDec
            | Self::IndirectBC
            | Self::IndirectDE
            | Self::FFIndirectC
            | Self::FFDirect(..)
            | Self::Direct(..) => {
                let address = self.memory_address(cpu_registers);
                address_space.write_address_u8(address, value, lcd_state);
            }
        }
    }

    fn memory_address(self, cpu_registers: &mut CpuRegisters) -> u16 {
        match self {
            Self::IndirectHL => cpu_registers.hl(),
            Self::IndirectHLInc => hl_post_adjust(cpu_registers, 1),
            Self::IndirectHLDec => hl_post_adjust(cpu_registers, -1),
            Self::IndirectBC => cpu_registers.bc(),
            Self::IndirectDE => cpu_registers.de(),
            Self::FFIndirectC => high_page(cpu_registers.c),
            Self::FFDirect(offset) => high_page(offset),
            Self::Direct(address) => address,
            Self::Register(..) | Self::Accumulator => {
                unreachable!("register destinations have no memory address")
            }
        }
    }

    fn cycles_required(self) -> u32 {
        match self {
            Self::Register(..) | Self::Accumulator => 0,
            Self::FFDirect(..) => 8,
            Self::Direct(..) => 12,
            _ => 4,
        }
    }
}

/// A read-modify-write operand: a register, the accumulator, or the byte at (HL).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModifyTarget {
    Register(CpuRegister),
    IndirectHL,
    Accumulator,
}

impl ModifyTarget {
    fn read_value(
        self,
        cpu_registers: &CpuRegisters,
        address_space: &AddressSpace,
        lcd_state: &LcdState,
    ) -> u8 {
        match self {
            Self::Register(register) => cpu_registers.get(register),
            Self::IndirectHL => address_space.read_address_u8(cpu_registers.hl(), lcd_state),
            Self::Accumulator => cpu_registers.a,
        }
    }

    fn write_value(
        self,
        value: u8,
        cpu_registers: &mut CpuRegisters,
        address_space: &mut AddressSpace,
        lcd_state: &LcdState,
    ) {
        match self {
            Self::Register(register) => cpu_registers.set(register, value),
            Self::IndirectHL => {
                address_space.write_address_u8(cpu_registers.hl(), value, lcd_state);
            }
            Self::Accumulator => cpu_registers.a = value,
        }
    }

    fn cycles_required(self) -> u32 {
        match self {
            Self::IndirectHL => 4,
            Self::Register(..) | Self::Accumulator => 0,
        }
    }
}

// Returns HL before adjustment, as the (HL+)/(HL-) modes access the old address.
fn hl_post_adjust(cpu_registers: &mut CpuRegisters, delta: i16) -> u16 {
    let hl = cpu_registers.hl();
    cpu_registers.set_hl(hl.wrapping_add(delta as u16));
    hl
}

fn high_page(offset: u8) -> u16 {
    0xFF00 | u16::from(offset)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    // All 8-bit LD/LDH instructions
    Load(WriteTarget, ReadTarget),
    // LD rr, nn
    LoadRegisterPairImmediate(CpuRegisterPair, u16),
    // LD (nn), SP
    LoadDirectStackPointer(u16),
    // LD SP, HL
    LoadStackPointerHL,
    // LD HL, SP+e
    LoadHLStackPointerOffset(i8),
    // PUSH rr
    PushStack(CpuRegisterPair),
    // POP rr
    PopStack(CpuRegisterPair),
    // ADD r / (HL) / n
    Add(ReadTarget),
    // ADC r / (HL) / n
    AddWithCarry(ReadTarget),
    // SUB r / (HL) / n
    Subtract(ReadTarget),
    // SBC r / (HL) / n
    SubtractWithCarry(ReadTarget),
    // CP r / (HL) / n
    Compare(ReadTarget),
    // INC r / (HL)
    Increment(ModifyTarget),
    // DEC r / (HL)
    Decrement(ModifyTarget),
    // AND r / (HL) / n
    And(ReadTarget),
    // OR r / (HL) / n
    Or(ReadTarget),
    // XOR r / (HL) / n
    Xor(ReadTarget),
    // ADD HL, rr
    AddHLRegister(CpuRegisterPair),
    // INC rr
    IncRegisterPair(CpuRegisterPair),
    // DEC rr
    DecRegisterPair(CpuRegisterPair),
    // ADD SP, e
    AddSPImmediate(i8),
    // RLCA / RLC r / RLC (HL)
    RotateLeft(ModifyTarget),
    // RLA / RL r / RL (HL)
    RotateLeftThruCarry(ModifyTarget),
    // RRCA / RRC r / RRC (HL)
    RotateRight(ModifyTarget),
    // RRA / RR r / RR (HL)
    RotateRightThruCarry(ModifyTarget),
    // SLA r / (HL)
    ShiftLeft(ModifyTarget),
    // SWAP r / (HL)
    Swap(ModifyTarget),
    // SRA r / (HL)
    ArithmeticShiftRight(ModifyTarget),
    // SRL r / (HL)
    LogicalShiftRight(ModifyTarget),
    // BIT n, r / (HL)
    TestBit(u8, ReadTarget),
    // RES n, r / (HL)
    ResetBit(u8, ModifyTarget),
    // SET n, r / (HL)
    SetBit(u8, ModifyTarget),
    // CCF
    ComplementCarryFlag,
    // SCF
    SetCarryFlag,
    // DAA
    DecimalAdjustAccumulator,
    // CPL
    ComplementAccumulator,
    // JP nn
    Jump(u16),
    // JP HL
    JumpHL,
    // JP cc, nn
    JumpCond(JumpCondition, u16),
    // JR e
    RelativeJump(i8),
    // JR cc, e
    RelativeJumpCond(JumpCondition, i8),
    // CALL nn
    Call(u16),
    // CALL cc, nn
    CallCond(JumpCondition, u16),
    // RET
    Return,
    // RET cc
    ReturnCond(JumpCondition),
    // RETI
    ReturnFromInterruptHandler,
    // RST n
    RestartCall(u8),
    // HALT
    Halt,
    // STOP
    Stop,
    // DI
    DisableInterrupts,
    // EI
    EnableInterrupts,
    // NOP
    NoOp,
}

impl Instruction {
    /// Execute this instruction, modifying CPU registers, flags, and memory as needed.
    ///
    /// This method does *not* advance the PC register past the instruction; it expects PC to
    /// have been updated when the instruction was fetched. Control flow instructions overwrite
    /// PC from here.
    pub fn execute(
        self,
        address_space: &mut AddressSpace,
        cpu_registers: &mut CpuRegisters,
        lcd_state: &LcdState,
    ) {
        match self {
            Self::Load(destination, source) => {
                let value = source.read_value(cpu_registers, address_space, lcd_state);
                destination.write_value(value, cpu_registers, address_space, lcd_state);
            }
            Self::LoadRegisterPairImmediate(rr, value) => {
                cpu_registers.set_pair(rr, value);
            }
            Self::LoadDirectStackPointer(address) => {
                address_space.write_address_u16(address, cpu_registers.sp, lcd_state);
            }
            Self::LoadStackPointerHL => {
                cpu_registers.sp = cpu_registers.hl();
            }
            Self::PushStack(rr) => {
                let value = cpu_registers.get_pair(rr);
                push_word(cpu_registers, address_space, lcd_state, value);
            }
            Self::PopStack(rr) => {
                let value = pop_word(cpu_registers, address_space, lcd_state);
                cpu_registers.set_pair(rr, value);
            }
            Self::Add(source) => {
                let operand = source.read_value(cpu_registers, address_space, lcd_state);
                let (result, flags) = alu_add(cpu_registers.a, operand, false);
                cpu_registers.a = result;
                cpu_registers.flags = flags;
            }
            Self::AddWithCarry(source) => {
                let operand = source.read_value(cpu_registers, address_space, lcd_state);
                let (result, flags) =
                    alu_add(cpu_registers.a, operand, cpu_registers.flags.carry);
                cpu_registers.a = result;
                cpu_registers.flags = flags;
            }
            Self::Subtract(source) => {
                let operand = source.read_value(cpu_registers, address_space, lcd_state);
                let (result, flags) = alu_sub(cpu_registers.a, operand, false);
                cpu_registers.a = result;
                cpu_registers.flags = flags;
            }
            Self::SubtractWithCarry(source) => {
                let operand = source.read_value(cpu_registers, address_space, lcd_state);
                let (result, flags) =
                    alu_sub(cpu_registers.a, operand, cpu_registers.flags.carry);
                cpu_registers.a = result;
                cpu_registers.flags = flags;
            }
            Self::Compare(source) => {
                // A subtraction that keeps only the flags
                let operand = source.read_value(cpu_registers, address_space, lcd_state);
                let (_, flags) = alu_sub(cpu_registers.a, operand, false);
                cpu_registers.flags = flags;
            }
            Self::Increment(target) => {
                let value = target.read_value(cpu_registers, address_space, lcd_state);
                let (result, flags) = alu_add(value, 1, false);
                target.write_value(result, cpu_registers, address_space, lcd_state);
                cpu_registers.flags = Flags { carry: cpu_registers.flags.carry, ..flags };
            }
            Self::Decrement(target) => {
                let value = target.read_value(cpu_registers, address_space, lcd_state);
                let (result, flags) = alu_sub(value, 1, false);
                target.write_value(result, cpu_registers, address_space, lcd_state);
                cpu_registers.flags = Flags { carry: cpu_registers.flags.carry, ..flags };
            }
            Self::And(source) => {
                let result =
                    cpu_registers.a & source.read_value(cpu_registers, address_space, lcd_state);
                cpu_registers.a = result;
                cpu_registers.flags = logic_flags(result, true);
            }
            Self::Or(source) => {
                let result =
                    cpu_registers.a | source.read_value(cpu_registers, address_space, lcd_state);
                cpu_registers.a = result;
                cpu_registers.flags = logic_flags(result, false);
            }
            Self::Xor(source) => {
                let result =
                    cpu_registers.a ^ source.read_value(cpu_registers, address_space, lcd_state);
                cpu_registers.a = result;
                cpu_registers.flags = logic_flags(result, false);
            }
            Self::AddHLRegister(rr) => {
                let (result, flags) =
                    alu_add_u16(cpu_registers.hl(), cpu_registers.get_pair(rr));
                cpu_registers.set_hl(result);
                cpu_registers.flags = Flags { zero: cpu_registers.flags.zero, ..flags };
            }
            Self::IncRegisterPair(rr) => {
                cpu_registers.set_pair(rr, cpu_registers.get_pair(rr).wrapping_add(1));
            }
            Self::DecRegisterPair(rr) => {
                cpu_registers.set_pair(rr, cpu_registers.get_pair(rr).wrapping_sub(1));
            }
            Self::AddSPImmediate(offset) => {
                let (result, flags) = alu_add_sp(cpu_registers.sp, offset);
                cpu_registers.sp = result;
                cpu_registers.flags = flags;
            }
            Self::LoadHLStackPointerOffset(offset) => {
                let (result, flags) = alu_add_sp(cpu_registers.sp, offset);
                cpu_registers.set_hl(result);
                cpu_registers.flags = flags;
            }
            Self::RotateLeft(target) => {
                let (result, flags) =
                    alu_rlc(target.read_value(cpu_registers, address_space, lcd_state));
                target.write_value(result, cpu_registers, address_space, lcd_state);
                cpu_registers.flags = rotate_zero_policy(target, flags);
            }
            Self::RotateLeftThruCarry(target) => {
                let (result, flags) = alu_rl(
                    target.read_value(cpu_registers, address_space, lcd_state),
                    cpu_registers.flags.carry,
                );
                target.write_value(result, cpu_registers, address_space, lcd_state);
                cpu_registers.flags = rotate_zero_policy(target, flags);
            }
            Self::RotateRight(target) => {
                let (result, flags) =
                    alu_rrc(target.read_value(cpu_registers, address_space, lcd_state));
                target.write_value(result, cpu_registers, address_space, lcd_state);
                cpu_registers.flags = rotate_zero_policy(target, flags);
            }
            Self::RotateRightThruCarry(target) => {
                let (result, flags) = alu_rr(
                    target.read_value(cpu_registers, address_space, lcd_state),
                    cpu_registers.flags.carry,
                );
                target.write_value(result, cpu_registers, address_space, lcd_state);
                cpu_registers.flags = rotate_zero_policy(target, flags);
            }
            Self::ShiftLeft(target) => {
                let (result, flags) =
                    alu_sla(target.read_value(cpu_registers, address_space, lcd_state));
                target.write_value(result, cpu_registers, address_space, lcd_state);
                cpu_registers.flags = flags;
            }
            Self::Swap(target) => {
                let result = target
                    .read_value(cpu_registers, address_space, lcd_state)
                    .rotate_left(4);
                target.write_value(result, cpu_registers, address_space, lcd_state);
                cpu_registers.flags = shift_flags(result, false);
            }
            Self::ArithmeticShiftRight(target) => {
                let (result, flags) =
                    alu_sra(target.read_value(cpu_registers, address_space, lcd_state));
                target.write_value(result, cpu_registers, address_space, lcd_state);
                cpu_registers.flags = flags;
            }
            Self::LogicalShiftRight(target) => {
                let (result, flags) =
                    alu_srl(target.read_value(cpu_registers, address_space, lcd_state));
                target.write_value(result, cpu_registers, address_space, lcd_state);
                cpu_registers.flags = flags;
            }
            Self::TestBit(bit, source) => {
                let value = source.read_value(cpu_registers, address_space, lcd_state);
                cpu_registers.flags = Flags {
                    zero: value & (1 << bit) == 0,
                    subtract: false,
                    half_carry: true,
                    carry: cpu_registers.flags.carry,
                };
            }
            Self::SetBit(bit, target) => {
                let value =
                    target.read_value(cpu_registers, address_space, lcd_state) | (1 << bit);
                target.write_value(value, cpu_registers, address_space, lcd_state);
            }
            Self::ResetBit(bit, target) => {
                let value =
                    target.read_value(cpu_registers, address_space, lcd_state) & !(1 << bit);
                target.write_value(value, cpu_registers, address_space, lcd_state);
            }
            Self::ComplementCarryFlag => {
                let flags = cpu_registers.flags;
                cpu_registers.flags =
                    Flags { subtract: false, half_carry: false, carry: !flags.carry, ..flags };
            }
            Self::SetCarryFlag => {
                let flags = cpu_registers.flags;
                cpu_registers.flags =
                    Flags { subtract: false, half_carry: false, carry: true, ..flags };
            }
            Self::DecimalAdjustAccumulator => {
                let (result, flags) = alu_daa(cpu_registers.a, cpu_registers.flags);
                cpu_registers.a = result;
                cpu_registers.flags = flags;
            }
            Self::ComplementAccumulator => {
                cpu_registers.a = !cpu_registers.a;
                let flags = cpu_registers.flags;
                cpu_registers.flags = Flags { subtract: true, half_carry: true, ..flags };
            }
            Self::Jump(address) => {
                cpu_registers.pc = address;
            }
            Self::JumpHL => {
                cpu_registers.pc = cpu_registers.hl();
            }
            Self::JumpCond(cc, address) => {
                if cc.check(cpu_registers.flags) {
                    cpu_registers.pc = address;
                }
            }
            Self::RelativeJump(offset) => {
                cpu_registers.pc = cpu_registers.pc.wrapping_add(offset as u16);
            }
            Self::RelativeJumpCond(cc, offset) => {
                if cc.check(cpu_registers.flags) {
                    cpu_registers.pc = cpu_registers.pc.wrapping_add(offset as u16);
                }
            }
            Self::Call(address) => {
                let return_address = cpu_registers.pc;
                push_word(cpu_registers, address_space, lcd_state, return_address);
                cpu_registers.pc = address;
            }
            Self::CallCond(cc, address) => {
                if cc.check(cpu_registers.flags) {
                    let return_address = cpu_registers.pc;
                    push_word(cpu_registers, address_space, lcd_state, return_address);
                    cpu_registers.pc = address;
                }
            }
            Self::Return => {
                cpu_registers.pc = pop_word(cpu_registers, address_space, lcd_state);
            }
            Self::ReturnCond(cc) => {
                if cc.check(cpu_registers.flags) {
                    cpu_registers.pc = pop_word(cpu_registers, address_space, lcd_state);
                }
            }
            Self::ReturnFromInterruptHandler => {
                cpu_registers.pc = pop_word(cpu_registers, address_space, lcd_state);
                // Unlike EI, RETI enables interrupts with no one-instruction delay
                cpu_registers.ime = true;
            }
            Self::RestartCall(vector) => {
                let return_address = cpu_registers.pc;
                push_word(cpu_registers, address_space, lcd_state, return_address);
                cpu_registers.pc = vector.into();
            }
            Self::Halt => {
                if !cpu_registers.ime && super::interrupt_triggered_no_ime_check(address_space) {
                    // HALT bug: the CPU fails to halt and the following byte executes twice
                    cpu_registers.halt_bug_triggered = true;
                } else {
                    cpu_registers.halted = true;
                }
            }
            Self::Stop => {
                cpu_registers.stopped = true;
            }
            Self::DisableInterrupts => {
                cpu_registers.ime = false;
            }
            Self::EnableInterrupts => {
                cpu_registers.ime = true;

                cpu_registers.interrupt_delay = true;
                // Return early because this is the only instruction that should not clear the
                // interrupt delay
                return;
            }
            Self::NoOp => {}
        }

        cpu_registers.interrupt_delay = false;
    }

    /// The number of clock cycles (T-cycles) required to execute this instruction.
    ///
    /// Takes the CPU registers as a parameter because conditional control flow costs a
    /// different number of cycles depending on whether the condition holds.
    pub fn cycles_required(self, cpu_registers: &CpuRegisters) -> u32 {
        match self {
            Self::DecimalAdjustAccumulator
            | Self::ComplementAccumulator
            | Self::RotateLeft(ModifyTarget::Accumulator)
            | Self::RotateLeftThruCarry(ModifyTarget::Accumulator)
            | Self::RotateRight(ModifyTarget::Accumulator)
            | Self::RotateRightThruCarry(ModifyTarget::Accumulator)
            | Self::SetCarryFlag
            | Self::ComplementCarryFlag
            | Self::NoOp
            | Self::DisableInterrupts
            | Self::EnableInterrupts
            | Self::JumpHL
            | Self::Halt
            | Self::Stop => 4,

            Self::LoadStackPointerHL
            | Self::AddHLRegister(..)
            | Self::IncRegisterPair(..)
            | Self::DecRegisterPair(..) => 8,
            Self::LoadRegisterPairImmediate(..)
            | Self::PopStack(..)
            | Self::LoadHLStackPointerOffset(..)
            | Self::RelativeJump(..) => 12,
            Self::PushStack(..)
            | Self::AddSPImmediate(..)
            | Self::Jump(..)
            | Self::Return
            | Self::ReturnFromInterruptHandler
            | Self::RestartCall(..) => 16,
            Self::LoadDirectStackPointer(..) => 20,
            Self::Call(..) => 24,
            Self::JumpCond(cc, ..) => {
                if cc.check(cpu_registers.flags) {
                    16
                } else {
                    12
                }
            }
            Self::RelativeJumpCond(cc, ..) => {
                if cc.check(cpu_registers.flags) {
                    12
                } else {
                    8
                }
            }
            Self::CallCond(cc, ..) => {
                if cc.check(cpu_registers.flags) {
                    24
                } else {
                    12
                }
            }
            Self::ReturnCond(cc) => {
                if cc.check(cpu_registers.flags) {
                    20
                } else {
                    8
                }
            }
            Self::Load(destination, source) => {
                4 + source.cycles_required() + destination.cycles_required()
            }
            Self::Add(source)
            | Self::AddWithCarry(source)
            | Self::Subtract(source)
            | Self::SubtractWithCarry(source)
            | Self::And(source)
            | Self::Or(source)
            | Self::Xor(source)
            | Self::Compare(source) => 4 + source.cycles_required(),
            Self::TestBit(_, source) => 8 + source.cycles_required(),
            Self::Increment(target) | Self::Decrement(target) => 4 + 2 * target.cycles_required(),
            Self::RotateLeft(target)
            | Self::RotateRight(target)
            | Self::RotateLeftThruCarry(target)
            | Self::RotateRightThruCarry(target)
            | Self::ShiftLeft(target)
            | Self::ArithmeticShiftRight(target)
            | Self::LogicalShiftRight(target)
            | Self::Swap(target)
            | Self::ResetBit(_, target)
            | Self::SetBit(_, target) => 8 + 2 * target.cycles_required(),
        }
    }
}

/// Decrement SP by 2 and store a 16-bit value at the new SP, low byte first. SP wraps.
pub(crate) fn push_word(
    cpu_registers: &mut CpuRegisters,
    address_space: &mut AddressSpace,
    lcd_state: &LcdState,
    value: u16,
) {
    cpu_registers.sp = cpu_registers.sp.wrapping_sub(2);
    address_space.write_address_u16(cpu_registers.sp, value, lcd_state);
}

/// Read the 16-bit value at SP and increment SP by 2. SP wraps.
fn pop_word(
    cpu_registers: &mut CpuRegisters,
    address_space: &AddressSpace,
    lcd_state: &LcdState,
) -> u16 {
    let value = address_space.read_address_u16(cpu_registers.sp, lcd_state);
    cpu_registers.sp = cpu_registers.sp.wrapping_add(2);
    value
}

// 8-bit addition with optional carry-in. Z from the result, H from bit 3, C from bit 7.
fn alu_add(a: u8, b: u8, carry_in: bool) -> (u8, Flags) {
    let carry_in = u8::from(carry_in);
    let wide = u16::from(a) + u16::from(b) + u16::from(carry_in);
    let result = wide as u8;

    let flags = Flags {
        zero: result == 0,
        subtract: false,
        half_carry: (a & 0x0F) + (b & 0x0F) + carry_in > 0x0F,
        carry: wide > 0xFF,
    };
    (result, flags)
}

// 8-bit subtraction with optional borrow-in. H from a low-nibble borrow, C from a full
// borrow.
fn alu_sub(a: u8, b: u8, carry_in: bool) -> (u8, Flags) {
    let carry_in = u8::from(carry_in);
    let result = a.wrapping_sub(b).wrapping_sub(carry_in);

    let flags = Flags {
        zero: result == 0,
        subtract: true,
        half_carry: a & 0x0F < (b & 0x0F) + carry_in,
        carry: u16::from(a) < u16::from(b) + u16::from(carry_in),
    };
    (result, flags)
}

// 16-bit addition for ADD HL, rr. H from bit 11, C from bit 15; the caller preserves Z.
fn alu_add_u16(a: u16, b: u16) -> (u16, Flags) {
    let wide = u32::from(a) + u32::from(b);

    let flags = Flags {
        zero: false,
        subtract: false,
        half_carry: (a & 0x0FFF) + (b & 0x0FFF) > 0x0FFF,
        carry: wide > 0xFFFF,
    };
    (wide as u16, flags)
}

// Signed offset addition for ADD SP, e and LD HL, SP+e. H and C come from unsigned
// additions on the low byte of SP and the raw offset byte, even for negative offsets.
fn alu_add_sp(sp: u16, offset: i8) -> (u16, Flags) {
    let offset_byte = offset as u8;

    let flags = Flags {
        zero: false,
        subtract: false,
        half_carry: (sp & 0x000F) + u16::from(offset_byte & 0x0F) > 0x000F,
        carry: (sp & 0x00FF) + u16::from(offset_byte) > 0x00FF,
    };
    (sp.wrapping_add(offset as u16), flags)
}

fn shift_flags(result: u8, carry: bool) -> Flags {
    Flags { zero: result == 0, subtract: false, half_carry: false, carry }
}

fn logic_flags(result: u8, half_carry: bool) -> Flags {
    Flags { zero: result == 0, subtract: false, half_carry, carry: false }
}

// The non-prefixed RLCA/RLA/RRCA/RRA forms always report Z=0; the CB-prefixed forms compute
// it from the result.
fn rotate_zero_policy(target: ModifyTarget, flags: Flags) -> Flags {
    if target == ModifyTarget::Accumulator {
        Flags { zero: false, ..flags }
    } else {
        flags
    }
}

fn alu_rlc(value: u8) -> (u8, Flags) {
    let result = value.rotate_left(1);
    (result, shift_flags(result, value & 0x80 != 0))
}

fn alu_rl(value: u8, carry_in: bool) -> (u8, Flags) {
    let result = value << 1 | u8::from(carry_in);
    (result, shift_flags(result, value & 0x80 != 0))
}

fn alu_rrc(value: u8) -> (u8, Flags) {
    let result = value.rotate_right(1);
    (result, shift_flags(result, value & 0x01 != 0))
}

fn alu_rr(value: u8, carry_in: bool) -> (u8, Flags) {
    let result = value >> 1 | u8::from(carry_in) << 7;
    (result, shift_flags(result, value & 0x01 != 0))
}

fn alu_sla(value: u8) -> (u8, Flags) {
    let result = value << 1;
    (result, shift_flags(result, value & 0x80 != 0))
}

// Shifts right with bit 7 held.
fn alu_sra(value: u8) -> (u8, Flags) {
    let result = value >> 1 | value & 0x80;
    (result, shift_flags(result, value & 0x01 != 0))
}

fn alu_srl(value: u8) -> (u8, Flags) {
    let result = value >> 1;
    (result, shift_flags(result, value & 0x01 != 0))
}

// BCD correction of A after an 8-bit add or subtract, steered by the N, H, and C flags.
// After an addition, out-of-range nibbles also trigger the correction; after a subtraction
// only the recorded borrows do.
fn alu_daa(a: u8, flags: Flags) -> (u8, Flags) {
    let mut adjustment = 0;
    let mut carry = flags.carry;

    if flags.half_carry || (!flags.subtract && a & 0x0F > 0x09) {
        adjustment |= 0x06;
    }
    if flags.carry || (!flags.subtract && a > 0x99) {
        adjustment |= 0x60;
        carry = true;
    }

    let result =
        if flags.subtract { a.wrapping_sub(adjustment) } else { a.wrapping_add(adjustment) };

    let flags = Flags { zero: result == 0, subtract: flags.subtract, half_carry: false, carry };
    (result, flags)
}
