pub(crate) mod instructions;
mod registers;


pub use registers::{CpuRegister, CpuRegisterPair, CpuRegisters, Flags};

use crate::lcd::LcdState;
use crate::memory::ioregisters::IoRegister;
use crate::memory::AddressSpace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptType {
    VBlank,
    LcdStatus,
    Timer,
    Serial,
    Joypad,
}

impl InterruptType {
    /// The interrupt sources in priority order, highest priority first.
    pub const PRIORITY_ORDER: [Self; 5] =
        [Self::VBlank, Self::LcdStatus, Self::Timer, Self::Serial, Self::Joypad];

    /// The bit this interrupt occupies in the IF and IE registers.
    pub fn bit(self) -> u8 {
        match self {
            Self::VBlank => 1 << 0,
            Self::LcdStatus => 1 << 1,
            Self::Timer => 1 << 2,
            Self::Serial => 1 << 3,
            Self::Joypad => 1 << 4,
        }
    }

    /// The address the CPU jumps to when this interrupt is serviced.
    pub fn handler_address(self) -> u16 {
        match self {
            Self::VBlank => 0x0040,
            Self::LcdStatus => 0x0048,
            Self::Timer => 0x0050,
            Self::Serial => 0x0058,
            Self::Joypad => 0x0060,
        }
    }
}

/// Cycles consumed by the interrupt service routine: 2 wait states plus the PC push plus the
/// jump to the handler address.
pub const ISR_CYCLES_REQUIRED: u32 = 20;

fn pending_interrupts(address_space: &AddressSpace) -> u8 {
    let interrupt_flags = address_space.get_io_registers().read_register(IoRegister::IF);
    interrupt_flags & address_space.get_ie_register() & 0x1F
}

/// Whether the CPU should execute the interrupt service routine instead of fetching the next
/// instruction.
///
/// This is only true if the IME flag is set and was not set by the immediately preceding
/// instruction (EI takes effect one instruction late).
pub fn interrupt_triggered(cpu_registers: &CpuRegisters, address_space: &AddressSpace) -> bool {
    cpu_registers.ime && !cpu_registers.interrupt_delay && pending_interrupts(address_space) != 0
}

/// Whether any enabled interrupt is pending, regardless of the IME flag. This is the condition
/// that wakes a halted CPU.
pub fn interrupt_triggered_no_ime_check(address_space: &AddressSpace) -> bool {
    pending_interrupts(address_space) != 0
}

/// Execute the interrupt service routine: disable interrupts, acknowledge the highest-priority
/// pending interrupt, push PC, and jump to the corresponding handler address.
///
/// Should only be called when [`interrupt_triggered`] returns true.
pub fn execute_interrupt_service_routine(
    cpu_registers: &mut CpuRegisters,
    address_space: &mut AddressSpace,
    lcd_state: &LcdState,
) {
    cpu_registers.ime = false;
    cpu_registers.halted = false;

    let pending = pending_interrupts(address_space);
    let Some(interrupt_type) =
        InterruptType::PRIORITY_ORDER.into_iter().find(|interrupt| interrupt.bit() & pending != 0)
    else {
        return;
    };

    log::trace!("Servicing {interrupt_type:?} interrupt, PC=0x{:04X}", cpu_registers.pc);

    address_space.get_io_registers_mut().interrupt_flags().clear(interrupt_type);

    let return_address = cpu_registers.pc;
    instructions::push_word(cpu_registers, address_space, lcd_state, return_address);

    cpu_registers.pc = interrupt_type.handler_address();
}
