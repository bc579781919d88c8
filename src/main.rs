//! s25fl - Host tool for the S25FL064L flash driver
//!
//! Runs the driver against the in-memory chip emulator, backed by an image
//! file, so every driver operation can be exercised from the command line.
//!
//! # Architecture
//!
//! - `s25fl-core` is the `no_std` driver, compiled in blocking mode here
//! - `s25fl-dummy` emulates the chip behind the bus
//! - This binary loads the image and settings, initializes the driver and
//!   dispatches to one command, then saves the image back if it changed

mod cli;
mod commands;
mod error;
mod image;
mod settings;

use clap::Parser;
use cli::{Cli, Commands};
use commands::Flash;
use error::CliError;
use s25fl_core::device::{S25fl064l, TOTAL_SIZE};
use s25fl_dummy::DummyFlash;
use settings::Settings;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Set log level based on verbosity
    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    let settings = match cli.config.as_deref() {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    log::debug!("Settings: {:?}", settings);

    let contents = image::load(cli.image.as_deref(), TOTAL_SIZE as usize)?;
    let mut emulator = DummyFlash::with_data(settings.dummy_config(), &contents);
    drop(contents);

    let mut flash = S25fl064l::with_config(&mut emulator, settings.driver);
    flash.initialize()?;

    let result = commands::check_identity(&flash, cli.command.mutates())
        .and_then(|()| run(&mut flash, &cli.command));

    flash.enter_power_down()?;
    drop(flash);

    // Keep whatever reached the chip, even if the command failed part way
    if cli.command.mutates() {
        if let Some(path) = cli.image.as_deref() {
            image::save(path, &emulator.into_data())?;
        }
    }

    result.map_err(Into::into)
}

fn run(flash: &mut Flash<'_>, command: &Commands) -> Result<(), CliError> {
    match command {
        Commands::Info => commands::run_info(flash),
        Commands::Read {
            output,
            start,
            length,
        } => commands::run_read(flash, output, *start, *length),
        Commands::Write {
            input,
            start,
            no_erase,
            no_verify,
        } => commands::run_write(flash, input, *start, !*no_erase, !*no_verify),
        Commands::Erase {
            chip,
            start,
            length,
        } => commands::run_erase(flash, *chip, *start, *length),
        Commands::Memtest { first, sectors } => commands::run_memtest(flash, *first, *sectors),
        Commands::Status => commands::run_status(flash),
    }
}
