use crate::cpu::instructions::{self, ParseError};
use crate::cpu::{self, CpuRegisters};
use crate::joypad::{self, Button, JoypadState};
use crate::lcd::{self, LcdState, Renderer};
use crate::memory::{AddressSpace, Cartridge};
use crate::timer::TimerUnit;
use thiserror::Error;

/// T-cycles per frame: 4194304 Hz master clock / ~59.7 frames per second.
pub const CYCLES_PER_FRAME: u32 = 70224;

#[derive(Error, Debug)]
pub enum StepError {
    #[error("error parsing CPU instruction: {source}")]
    InstructionParse {
        #[from]
        source: ParseError,
    },
}

/// One complete emulated machine: CPU registers, address space, timers, and the LCD state
/// machine, advanced in lockstep on a shared cycle budget.
pub struct Emulator {
    address_space: AddressSpace,
    cpu_registers: CpuRegisters,
    lcd_state: LcdState,
    timer: TimerUnit,
    joypad_state: JoypadState,
}

impl Emulator {
    pub fn new(cartridge: Box<dyn Cartridge>) -> Self {
        Self {
            address_space: AddressSpace::new(cartridge),
            cpu_registers: CpuRegisters::new(),
            lcd_state: LcdState::new(),
            timer: TimerUnit::new(),
            joypad_state: JoypadState::new(),
        }
    }

    /// Restore the post-boot-ROM machine state, as if a reset signal had been sent to the
    /// CPU. The cartridge is untouched.
    pub fn reset(&mut self) {
        self.address_space.reset();
        self.cpu_registers = CpuRegisters::new();
        self.lcd_state = LcdState::new();
        self.timer = TimerUnit::new();
        self.joypad_state = JoypadState::new();
    }

    /// Execute one step and advance every unit by the cycles it consumed.
    ///
    /// A step is one of: an instruction, the interrupt service routine, or a 4-cycle idle
    /// tick while halted or stopped. Returns the number of T-cycles consumed.
    pub fn step(&mut self, renderer: &mut dyn Renderer) -> Result<u32, StepError> {
        joypad::update_joyp_register(&self.joypad_state, self.address_space.get_io_registers_mut());

        let cycles = self.tick_cpu()?;

        self.timer.tick(self.address_space.get_io_registers_mut(), cycles);

        // STOP freezes the LCD along with the CPU; the timer keeps running
        if !self.cpu_registers.stopped {
            lcd::tick(&mut self.lcd_state, &mut self.address_space, cycles, renderer);
        }

        Ok(cycles)
    }

    fn tick_cpu(&mut self) -> Result<u32, StepError> {
        if self.cpu_registers.stopped {
            return Ok(4);
        }

        if cpu::interrupt_triggered(&self.cpu_registers, &self.address_space) {
            cpu::execute_interrupt_service_routine(
                &mut self.cpu_registers,
                &mut self.address_space,
                &self.lcd_state,
            );

            return Ok(cpu::ISR_CYCLES_REQUIRED);
        }

        if self.cpu_registers.halted {
            if cpu::interrupt_triggered_no_ime_check(&self.address_space) {
                self.cpu_registers.halted = false;
            } else {
                // Let the other units run for 1 M-cycle
                return Ok(4);
            }
        }

        let (instruction, pc) = instructions::parse_next_instruction(
            &self.address_space,
            self.cpu_registers.pc,
            &self.lcd_state,
            self.cpu_registers.halt_bug_triggered,
        )?;

        self.cpu_registers.halt_bug_triggered = false;

        log::trace!("Updating PC from 0x{:04X} to 0x{pc:04X}", self.cpu_registers.pc);
        self.cpu_registers.pc = pc;

        let cycles_required = instruction.cycles_required(&self.cpu_registers);

        log::trace!("Executing {instruction:02X?}, {cycles_required} cycles");
        instruction.execute(&mut self.address_space, &mut self.cpu_registers, &self.lcd_state);

        Ok(cycles_required)
    }

    /// Execute one frame's worth of T-cycles. Returns the cycles actually consumed, which
    /// can slightly exceed [`CYCLES_PER_FRAME`] because the last step may straddle the
    /// boundary.
    pub fn run_frame(&mut self, renderer: &mut dyn Renderer) -> Result<u64, StepError> {
        let mut frame_cycles = 0_u64;
        while frame_cycles < u64::from(CYCLES_PER_FRAME) {
            frame_cycles += u64::from(self.step(renderer)?);
        }

        Ok(frame_cycles)
    }

    /// Report a button press from the input collaborator. Any press requests the joypad
    /// interrupt and ends STOP mode.
    pub fn press_button(&mut self, button: Button) {
        self.joypad_state.set_pressed(button, true);
        self.address_space.get_io_registers_mut().interrupt_flags().set(cpu::InterruptType::Joypad);
        self.cpu_registers.stopped = false;
    }

    /// Report a button release from the input collaborator.
    pub fn release_button(&mut self, button: Button) {
        self.joypad_state.set_pressed(button, false);
    }

    /// Read-only view of the CPU registers, for debug facilities and tests.
    pub fn cpu_registers(&self) -> &CpuRegisters {
        &self.cpu_registers
    }

    /// Read-only view of the address space, for the renderer and debug facilities.
    pub fn address_space(&self) -> &AddressSpace {
        &self.address_space
    }

    pub fn pc(&self) -> u16 {
        self.cpu_registers.pc
    }

    pub fn sp(&self) -> u16 {
        self.cpu_registers.sp
    }

    pub fn ime(&self) -> bool {
        self.cpu_registers.ime
    }
}
