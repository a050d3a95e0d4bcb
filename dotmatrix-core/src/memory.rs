pub mod address;
pub mod ioregisters;

use crate::lcd::{LcdMode, LcdState};
use crate::memory::ioregisters::{IoRegister, IoRegisters};
use std::path::Path;
use std::{fs, io};
use thiserror::Error;

/// The cartridge side of the bus.
///
/// The core forwards every access in 0x0000-0x7FFF and 0xA000-0xBFFF here. Writes in the ROM
/// range are control writes (bank-switching hardware lives on the cartridge), never stores.
pub trait Cartridge {
    /// Read a byte from the ROM address range \[0x0000, 0x7FFF\].
    fn rom_read(&self, address: u16) -> u8;

    /// Handle a CPU write to the ROM address range (an MBC control write).
    fn control_write(&mut self, address: u16, value: u8);

    /// Read a byte from the external RAM range \[0xA000, 0xBFFF\].
    fn ram_read(&self, address: u16) -> u8;

    /// Write a byte to the external RAM range.
    fn ram_write(&mut self, address: u16, value: u8);
}

#[derive(Error, Debug)]
pub enum CartridgeLoadError {
    #[error("ROM image should be at least 0x150 bytes, was {rom_len} bytes")]
    ImageTooShort { rom_len: usize },
    #[error("error reading ROM image from {file_path}: {source}")]
    FileReadError {
        file_path: String,
        #[source]
        source: io::Error,
    },
}

/// An unbanked cartridge: a raw ROM image with the first 0x8000 bytes mapped 1:1, plus 8 KiB
/// of external RAM. Control writes are accepted and ignored.
pub struct FlatCartridge {
    rom: Vec<u8>,
    ram: [u8; 8192],
}

impl FlatCartridge {
    /// Create a cartridge from a raw ROM image.
    ///
    /// # Errors
    ///
    /// Returns an error if the image is shorter than the 0x150-byte cartridge header.
    pub fn new(rom: Vec<u8>) -> Result<Self, CartridgeLoadError> {
        log::info!("Initializing cartridge from {} bytes of ROM data", rom.len());

        if rom.len() < 0x0150 {
            return Err(CartridgeLoadError::ImageTooShort { rom_len: rom.len() });
        }

        Ok(Self { rom, ram: [0; 8192] })
    }

    /// Load a cartridge from a ROM image on disk.
    pub fn from_file<P: AsRef<Path>>(file_path: P) -> Result<Self, CartridgeLoadError> {
        let file_path = file_path.as_ref();
        log::info!("Loading ROM image from '{}'", file_path.display());

        let rom = fs::read(file_path).map_err(|err| CartridgeLoadError::FileReadError {
            file_path: file_path.display().to_string(),
            source: err,
        })?;

        Self::new(rom)
    }
}

impl Cartridge for FlatCartridge {
    fn rom_read(&self, address: u16) -> u8 {
        self.rom.get(address as usize).copied().unwrap_or(0xFF)
    }

    fn control_write(&mut self, _address: u16, _value: u8) {}

    fn ram_read(&self, address: u16) -> u8 {
        self.ram[(address - address::EXTERNAL_RAM_START) as usize]
    }

    fn ram_write(&mut self, address: u16, value: u8) {
        self.ram[(address - address::EXTERNAL_RAM_START) as usize] = value;
    }
}

/// The flat 16-bit address space as seen by the CPU.
///
/// Owns all memory arrays and the memory-mapped registers; ROM and external RAM accesses are
/// dispatched to the cartridge collaborator. Reads and writes take the LCD state because the
/// LCD blocks CPU access to VRAM and OAM during parts of each scanline.
pub struct AddressSpace {
    cartridge: Box<dyn Cartridge>,
    vram: [u8; 8192],
    working_ram: [u8; 8192],
    oam: [u8; 160],
    io_registers: IoRegisters,
    hram: [u8; 127],
    ie_register: u8,
}

impl AddressSpace {
    pub fn new(cartridge: Box<dyn Cartridge>) -> Self {
        Self {
            cartridge,
            vram: [0; 8192],
            working_ram: [0; 8192],
            oam: [0; 160],
            io_registers: IoRegisters::new(),
            hram: [0; 127],
            ie_register: 0x00,
        }
    }

    fn is_cpu_access_allowed(&self, address: u16, lcd_state: &LcdState) -> bool {
        if !self.lcd_enabled() {
            return true;
        }

        // OAM is inaccessible while the LCD is scanning it or rendering from it
        if (address::OAM_START..=address::OAM_END).contains(&address)
            && matches!(lcd_state.mode(), LcdMode::ScanningOam | LcdMode::RenderingScanline)
        {
            return false;
        }

        // VRAM is inaccessible while pixels are being transferred out of it
        !((address::VRAM_START..=address::VRAM_END).contains(&address)
            && lcd_state.mode() == LcdMode::RenderingScanline)
    }

    /// Whether LCDC bit 7 (LCD enable) is set.
    pub fn lcd_enabled(&self) -> bool {
        self.io_registers.read_register(IoRegister::LCDC) & 0x80 != 0
    }

    /// Read the value at the given address from the perspective of the CPU. Returns 0xFF if
    /// the LCD currently blocks CPU access to the address.
    pub fn read_address_u8(&self, address: u16, lcd_state: &LcdState) -> u8 {
        if !self.is_cpu_access_allowed(address, lcd_state) {
            return 0xFF;
        }

        self.read_address_u8_no_access_check(address)
    }

    fn read_address_u8_no_access_check(&self, address: u16) -> u8 {
        match address {
            address @ address::ROM_START..=address::ROM_END => self.cartridge.rom_read(address),
            address @ address::VRAM_START..=address::VRAM_END => {
                self.vram[(address - address::VRAM_START) as usize]
            }
            address @ address::EXTERNAL_RAM_START..=address::EXTERNAL_RAM_END => {
                self.cartridge.ram_read(address)
            }
            address @ address::WORKING_RAM_START..=address::WORKING_RAM_END => {
                self.working_ram[(address - address::WORKING_RAM_START) as usize]
            }
            address @ address::ECHO_RAM_START..=address::ECHO_RAM_END => {
                self.working_ram[(address - address::ECHO_RAM_START) as usize]
            }
            address @ address::OAM_START..=address::OAM_END => {
                self.oam[(address - address::OAM_START) as usize]
            }
            address::UNUSABLE_START..=address::UNUSABLE_END => 0xFF,
            address @ address::IO_REGISTERS_START..=address::IO_REGISTERS_END => {
                self.io_registers.read_address(address)
            }
            address @ address::HRAM_START..=address::HRAM_END => {
                self.hram[(address - address::HRAM_START) as usize]
            }
            address::IE_REGISTER => self.ie_register,
        }
    }

    /// Read the value at the given address and the following address as a little-endian
    /// 16-bit value.
    pub fn read_address_u16(&self, address: u16, lcd_state: &LcdState) -> u16 {
        let lsb = self.read_address_u8(address, lcd_state);
        let msb = self.read_address_u8(address.wrapping_add(1), lcd_state);
        u16::from_le_bytes([lsb, msb])
    }

    /// Assign a value to the given address from the perspective of the CPU. The write is
    /// dropped if the LCD currently blocks CPU access to the address.
    pub fn write_address_u8(&mut self, address: u16, value: u8, lcd_state: &LcdState) {
        if !self.is_cpu_access_allowed(address, lcd_state) {
            return;
        }

        match address {
            address @ address::ROM_START..=address::ROM_END => {
                // Not a store; the cartridge interprets this as a control write
                self.cartridge.control_write(address, value);
            }
            address @ address::VRAM_START..=address::VRAM_END => {
                self.vram[(address - address::VRAM_START) as usize] = value;
            }
            address @ address::EXTERNAL_RAM_START..=address::EXTERNAL_RAM_END => {
                self.cartridge.ram_write(address, value);
            }
            address @ address::WORKING_RAM_START..=address::WORKING_RAM_END => {
                self.working_ram[(address - address::WORKING_RAM_START) as usize] = value;
            }
            address @ address::ECHO_RAM_START..=address::ECHO_RAM_END => {
                self.working_ram[(address - address::ECHO_RAM_START) as usize] = value;
            }
            address @ address::OAM_START..=address::OAM_END => {
                self.oam[(address - address::OAM_START) as usize] = value;
            }
            address::UNUSABLE_START..=address::UNUSABLE_END => {}
            address @ address::IO_REGISTERS_START..=address::IO_REGISTERS_END => {
                self.io_registers.write_address(address, value);
            }
            address @ address::HRAM_START..=address::HRAM_END => {
                self.hram[(address - address::HRAM_START) as usize] = value;
            }
            address::IE_REGISTER => {
                self.ie_register = value;
            }
        }
    }

    /// Assign a 16-bit value to the given address and the following address, little-endian.
    pub fn write_address_u16(&mut self, address: u16, value: u16, lcd_state: &LcdState) {
        let [lsb, msb] = value.to_le_bytes();
        self.write_address_u8(address, lsb, lcd_state);
        self.write_address_u8(address.wrapping_add(1), msb, lcd_state);
    }

    /// Read the OAM/VRAM byte at the given address from the perspective of the renderer,
    /// bypassing the CPU access check.
    ///
    /// # Panics
    ///
    /// Panics if the address is not an OAM or VRAM address.
    pub fn renderer_read_address_u8(&self, address: u16) -> u8 {
        match address {
            address @ address::VRAM_START..=address::VRAM_END => {
                self.vram[(address - address::VRAM_START) as usize]
            }
            address @ address::OAM_START..=address::OAM_END => {
                self.oam[(address - address::OAM_START) as usize]
            }
            _ => panic!("renderer reads are only allowed from VRAM and OAM, got {address:04X}"),
        }
    }

    pub fn get_io_registers(&self) -> &IoRegisters {
        &self.io_registers
    }

    pub fn get_io_registers_mut(&mut self) -> &mut IoRegisters {
        &mut self.io_registers
    }

    /// The current value of the IE register (interrupts enabled).
    pub fn get_ie_register(&self) -> u8 {
        self.ie_register
    }

    /// Clear all RAM and restore the post-boot-ROM register values. The cartridge is left
    /// alone.
    pub fn reset(&mut self) {
        self.vram = [0; 8192];
        self.working_ram = [0; 8192];
        self.oam = [0; 160];
        self.io_registers = IoRegisters::new();
        self.hram = [0; 127];
        self.ie_register = 0x00;
    }
}
