use crate::cpu::InterruptType;
use crate::memory::ioregisters::{IoRegister, IoRegisters};

const DIV_PERIOD: u32 = 256;

fn tima_period(tac_select: u8) -> u32 {
    match tac_select & 0x03 {
        0x00 => 1024, // 4096 Hz
        0x01 => 16,   // 262144 Hz
        0x02 => 64,   // 65536 Hz
        0x03 => 256,  // 16384 Hz
        _ => unreachable!("tac_select is masked to 2 bits"),
    }
}

/// The DIV and TIMA counters.
///
/// DIV ticks unconditionally at 16384 Hz. TIMA ticks at the TAC-selected frequency while TAC
/// bit 2 is set; on overflow it reloads from TMA and requests the timer interrupt. Selecting
/// a different TAC frequency restarts the TIMA subcounter at the new period.
#[derive(Debug, Clone)]
pub struct TimerUnit {
    div_counter: u32,
    tima_counter: u32,
    tac_select: u8,
}

impl TimerUnit {
    pub fn new() -> Self {
        Self { div_counter: 0, tima_counter: tima_period(0), tac_select: 0 }
    }

    /// Advance the timer unit by the given number of T-cycles.
    pub fn tick(&mut self, io_registers: &mut IoRegisters, cycles: u32) {
        if cycles > DIV_PERIOD {
            panic!("cycles must be <= {DIV_PERIOD}, was {cycles}");
        }

        self.div_counter += cycles;
        while self.div_counter >= DIV_PERIOD {
            self.div_counter -= DIV_PERIOD;
            let old_div = io_registers.read_register(IoRegister::DIV);
            io_registers.privileged_set_div(old_div.wrapping_add(1));
        }

        let timer_control = io_registers.read_register(IoRegister::TAC);
        let tac_select = timer_control & 0x03;
        if tac_select != self.tac_select {
            self.tac_select = tac_select;
            self.tima_counter = tima_period(tac_select);
        }

        if timer_control & 0x04 == 0 {
            // TIMA is frozen; DIV keeps running
            return;
        }

        let mut remaining = cycles;
        while remaining >= self.tima_counter {
            remaining -= self.tima_counter;
            self.tima_counter = tima_period(tac_select);

            let old_tima = io_registers.read_register(IoRegister::TIMA);
            match old_tima.overflowing_add(1) {
                (new_tima, false) => {
                    io_registers.write_register(IoRegister::TIMA, new_tima);
                }
                (_, true) => {
                    let timer_modulo = io_registers.read_register(IoRegister::TMA);
                    io_registers.write_register(IoRegister::TIMA, timer_modulo);

                    io_registers.interrupt_flags().set(InterruptType::Timer);
                }
            }
        }
        self.tima_counter -= remaining;
    }
}
