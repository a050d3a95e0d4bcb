//! The execution core of a Game Boy (DMG) emulator: the LR35902 CPU interpreter, the flat
//! memory bus, the interrupt controller, and the cycle-driven timer and LCD-status state
//! machines, advanced in lockstep per instruction.
//!
//! ROM loading beyond a flat image, bank-switching hardware, pixel rendering, windowing,
//! sound, and the serial link are collaborators behind the [`Cartridge`] and [`Renderer`]
//! seams.

mod config;
mod cpu;
mod emulator;
mod joypad;
mod lcd;
mod memory;
mod timer;

use thiserror::Error;

pub use config::RunConfig;
pub use cpu::{CpuRegister, CpuRegisterPair, CpuRegisters, Flags, InterruptType};
pub use emulator::{Emulator, StepError, CYCLES_PER_FRAME};
pub use joypad::Button;
pub use lcd::{LcdMode, LcdState, NullRenderer, Renderer};
pub use memory::{AddressSpace, Cartridge, CartridgeLoadError, FlatCartridge};

#[derive(Error, Debug)]
pub enum RunError {
    #[error("error loading cartridge: {source}")]
    CartridgeLoad {
        #[from]
        source: CartridgeLoadError,
    },
    #[error("emulation halted: {source}")]
    Step {
        #[from]
        source: StepError,
    },
}

/// Load the configured ROM and emulate it headless for the configured number of frames.
pub fn run(run_config: &RunConfig) -> Result<(), RunError> {
    log::info!("Running with config:\n{run_config}");

    let cartridge = FlatCartridge::from_file(&run_config.rom_file_path)?;
    let mut emulator = Emulator::new(Box::new(cartridge));
    let mut renderer = NullRenderer;

    let mut total_cycles = 0_u64;
    for frame in 0..run_config.frames {
        total_cycles += emulator.run_frame(&mut renderer)?;
        log::trace!("Completed frame {frame}");
    }

    log::info!(
        "Executed {} frames ({total_cycles} cycles), final PC=0x{:04X}",
        run_config.frames,
        emulator.pc()
    );

    Ok(())
}
