use serde::{Deserialize, Serialize};
use std::fmt::Formatter;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Path to the ROM image to execute.
    pub rom_file_path: String,
    /// Number of frames to emulate before exiting.
    pub frames: u64,
}

impl std::fmt::Display for RunConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "rom_file_path: {}", self.rom_file_path)?;
        write!(f, "frames: {}", self.frames)
    }
}
