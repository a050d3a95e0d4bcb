use crate::cpu::InterruptType;
use crate::memory::ioregisters::IoRegister;
use crate::memory::AddressSpace;

/// T-cycles per scanline, and the portions spent in each mode on a visible line.
pub const CYCLES_PER_SCANLINE: u32 = 456;
const OAM_SCAN_CYCLES: u32 = 80;
const PIXEL_TRANSFER_CYCLES: u32 = 172;

const VISIBLE_SCANLINES: u8 = 144;
const TOTAL_SCANLINES: u8 = 154;

// STAT interrupt source enable bits
const STAT_HBLANK_SOURCE: u8 = 1 << 3;
const STAT_VBLANK_SOURCE: u8 = 1 << 4;
const STAT_OAM_SOURCE: u8 = 1 << 5;
const STAT_LYC_SOURCE: u8 = 1 << 6;

const STAT_LYC_MATCH: u8 = 1 << 2;

/// The four modes the LCD cycles through, as exposed in STAT bits 1:0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LcdMode {
    /// Mode 0: the remainder of a visible line after pixel transfer.
    HBlank,
    /// Mode 1: lines 144-153, between frames.
    VBlank,
    /// Mode 2: the first 80 cycles of a visible line.
    ScanningOam,
    /// Mode 3: pixels are being transferred; VRAM and OAM are unavailable to the CPU.
    RenderingScanline,
}

impl LcdMode {
    fn stat_bits(self) -> u8 {
        match self {
            Self::HBlank => 0x00,
            Self::VBlank => 0x01,
            Self::ScanningOam => 0x02,
            Self::RenderingScanline => 0x03,
        }
    }

    fn stat_interrupt_source(self) -> Option<u8> {
        match self {
            Self::HBlank => Some(STAT_HBLANK_SOURCE),
            Self::VBlank => Some(STAT_VBLANK_SOURCE),
            Self::ScanningOam => Some(STAT_OAM_SOURCE),
            Self::RenderingScanline => None,
        }
    }
}

/// Receives completed scanlines from the LCD state machine.
///
/// Called at the end of mode 3 for every visible line; implementations pull whatever they
/// need (VRAM, OAM, the scroll and palette registers) through the address space.
pub trait Renderer {
    fn draw_scanline(&mut self, address_space: &AddressSpace, ly: u8);
}

/// A renderer that discards every scanline, for headless runs.
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn draw_scanline(&mut self, _address_space: &AddressSpace, _ly: u8) {}
}

/// The LCD scanline/mode state machine.
///
/// Drives LY, the STAT mode and coincidence bits, and the VBLANK/STAT interrupt requests off
/// the cycle budget reported by the CPU. The bus consults [`mode`] to decide whether the CPU
/// may touch VRAM and OAM.
///
/// [`mode`]: LcdState::mode
#[derive(Debug, Clone)]
pub struct LcdState {
    // Counts down the cycles remaining in the current scanline
    scanline_counter: u32,
    mode: LcdMode,
}

impl LcdState {
    pub fn new() -> Self {
        Self { scanline_counter: CYCLES_PER_SCANLINE, mode: LcdMode::ScanningOam }
    }

    #[cfg(test)]
    pub(crate) fn with_mode_for_test(mode: LcdMode) -> Self {
        Self { scanline_counter: CYCLES_PER_SCANLINE, mode }
    }

    pub fn mode(&self) -> LcdMode {
        self.mode
    }
}

/// Advance the LCD state machine by the given number of T-cycles.
///
/// `cycles` must be smaller than the 80-cycle OAM scan window so that at most one mode
/// boundary is crossed per call; per-instruction budgets (at most 24, plus 20 for interrupt
/// service) satisfy this.
pub fn tick(
    lcd_state: &mut LcdState,
    address_space: &mut AddressSpace,
    cycles: u32,
    renderer: &mut dyn Renderer,
) {
    assert!(cycles < OAM_SCAN_CYCLES, "cycles must be < {OAM_SCAN_CYCLES}, was {cycles}");

    if !address_space.lcd_enabled() {
        // LY and the scanline counter are held at zero and the mode bits read 0 while the
        // LCD is off; no interrupts fire
        lcd_state.scanline_counter = CYCLES_PER_SCANLINE;
        lcd_state.mode = LcdMode::HBlank;

        let io_registers = address_space.get_io_registers_mut();
        io_registers.privileged_set_ly(0);
        let stat = io_registers.read_register(IoRegister::STAT);
        io_registers.privileged_set_stat(stat & !0x03);
        return;
    }

    let mut remaining = cycles;
    while remaining >= lcd_state.scanline_counter {
        remaining -= lcd_state.scanline_counter;
        lcd_state.scanline_counter = CYCLES_PER_SCANLINE;
        advance_scanline(address_space);
    }
    lcd_state.scanline_counter -= remaining;

    let ly = address_space.get_io_registers().read_register(IoRegister::LY);
    let new_mode = current_mode(ly, lcd_state.scanline_counter);

    if new_mode != lcd_state.mode {
        enter_mode(lcd_state.mode, new_mode, ly, address_space, renderer);
        lcd_state.mode = new_mode;
    }
}

fn current_mode(ly: u8, scanline_counter: u32) -> LcdMode {
    if ly >= VISIBLE_SCANLINES {
        return LcdMode::VBlank;
    }

    let line_cycle = CYCLES_PER_SCANLINE - scanline_counter;
    if line_cycle < OAM_SCAN_CYCLES {
        LcdMode::ScanningOam
    } else if line_cycle < OAM_SCAN_CYCLES + PIXEL_TRANSFER_CYCLES {
        LcdMode::RenderingScanline
    } else {
        LcdMode::HBlank
    }
}

fn advance_scanline(address_space: &mut AddressSpace) {
    let io_registers = address_space.get_io_registers_mut();

    let mut ly = io_registers.read_register(IoRegister::LY) + 1;
    if ly == TOTAL_SCANLINES {
        ly = 0;
    }
    io_registers.privileged_set_ly(ly);

    if ly == VISIBLE_SCANLINES {
        io_registers.interrupt_flags().set(InterruptType::VBlank);
    }

    check_lyc_coincidence(address_space);
}

fn enter_mode(
    old_mode: LcdMode,
    new_mode: LcdMode,
    ly: u8,
    address_space: &mut AddressSpace,
    renderer: &mut dyn Renderer,
) {
    // The scanline is complete once pixel transfer ends
    if old_mode == LcdMode::RenderingScanline && new_mode == LcdMode::HBlank {
        renderer.draw_scanline(address_space, ly);
    }

    let io_registers = address_space.get_io_registers_mut();
    let stat = io_registers.read_register(IoRegister::STAT);
    io_registers.privileged_set_stat((stat & !0x03) | new_mode.stat_bits());

    if let Some(source_bit) = new_mode.stat_interrupt_source() {
        if stat & source_bit != 0 {
            io_registers.interrupt_flags().set(InterruptType::LcdStatus);
        }
    }
}

/// Update the STAT coincidence bit from LY and LYC, requesting a STAT interrupt on a rising
/// edge if the LYC source is enabled.
fn check_lyc_coincidence(address_space: &mut AddressSpace) {
    let io_registers = address_space.get_io_registers_mut();

    let ly = io_registers.read_register(IoRegister::LY);
    let lyc = io_registers.read_register(IoRegister::LYC);
    let stat = io_registers.read_register(IoRegister::STAT);

    if ly == lyc {
        let newly_set = stat & STAT_LYC_MATCH == 0;
        io_registers.privileged_set_stat(stat | STAT_LYC_MATCH);

        if newly_set && stat & STAT_LYC_SOURCE != 0 {
            io_registers.interrupt_flags().set(InterruptType::LcdStatus);
        }
    } else {
        io_registers.privileged_set_stat(stat & !STAT_LYC_MATCH);
    }
}
