use clap::Parser;
use dotmatrix_core::RunConfig;
use std::error::Error;

#[derive(Parser)]
struct Cli {
    #[arg(short = 'f', long = "rom-file-path")]
    rom_file_path: String,
    #[arg(short = 'n', long = "frames", default_value_t = 60)]
    frames: u64,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let args = Cli::parse();

    let run_config = RunConfig {
        rom_file_path: args.rom_file_path,
        frames: args.frames,
    };

    dotmatrix_core::run(&run_config)?;

    Ok(())
}
