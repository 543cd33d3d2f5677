use std::io::Read;
use std::process::ExitCode;
use std::sync::mpsc;

use clap::Parser;
use orchard_core::CoreError;
use orchard_core::core::machine::{Machine, RunOutcome};
use orchard_core::core::StopHandle;
use orchard_core::device::video_scanner::CYCLES_PER_FRAME;
use orchard_machines::registry;
use orchard_machines::rom_loader::RomLoadError;
use thiserror::Error;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod cli;
mod config;
mod rom_path;

use cli::Cli;
use config::{ConfigError, ConfigFile, Settings};

/// CPU cycles per run slice; input and stop requests are serviced between
/// slices.
const SLICE_CYCLES: u64 = CYCLES_PER_FRAME;

#[derive(Debug, Error)]
enum FrontendError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("unknown machine {name:?} (available: {available})")]
    UnknownMachine { name: String, available: String },

    #[error(transparent)]
    Rom(#[from] RomLoadError),

    #[error("emulation stopped: {0}")]
    Core(#[from] CoreError),
}

fn init_logging(filter: Option<&str>) {
    let filter = match filter {
        Some(directives) => EnvFilter::new(directives),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.log.as_deref());

    if cli.list {
        for entry in registry::all() {
            println!("{:<12} roms: {}.zip or {}", entry.name, entry.rom_name, entry.image_name);
        }
        return ExitCode::SUCCESS;
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("orchard: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), FrontendError> {
    let file = match (&cli.config, config::default_path()) {
        (Some(path), _) => ConfigFile::load(path, true)?,
        (None, Some(path)) => ConfigFile::load(&path, false)?,
        (None, None) => ConfigFile::default(),
    };
    let settings = Settings::resolve(cli, file)?;

    let entry = registry::find(&settings.machine).ok_or_else(|| FrontendError::UnknownMachine {
        name: settings.machine.clone(),
        available: registry::names(),
    })?;

    let rom_set = rom_path::load_rom_set(entry, &settings.rom)?;
    let mut machine = (entry.create)(&rom_set)?;
    machine.set_speed(settings.speed, settings.granularity);
    info!(
        machine = entry.name,
        rom = %settings.rom.display(),
        cycles = settings.cycles,
        speed = settings.speed,
        "starting"
    );

    if let Some(text) = &cli.type_text {
        type_text(machine.as_mut(), text.bytes());
    }

    if settings.cycles == 0 {
        run_interactive(machine.as_mut())?;
    } else {
        run_counted(machine.as_mut(), settings.cycles)?;
    }

    let state = machine.cpu_state();
    println!(
        "cycles={} PC=${:04X} A=${:02X} X=${:02X} Y=${:02X} S=${:02X} P=${:02X}",
        machine.cpu_cycles(),
        state.pc,
        state.a,
        state.x,
        state.y,
        state.s,
        state.p
    );
    Ok(())
}

/// Feed bytes to the keyboard, with newlines as RETURN.
fn type_text(machine: &mut dyn Machine, bytes: impl IntoIterator<Item = u8>) {
    for byte in bytes {
        machine.type_key(if byte == b'\n' { 0x0D } else { byte });
    }
}

fn run_counted(machine: &mut dyn Machine, cycles: u64) -> Result<(), CoreError> {
    let mut remaining = cycles;
    while remaining > 0 {
        let slice = remaining.min(SLICE_CYCLES);
        if machine.run_cycles(slice)? == RunOutcome::Interrupted {
            break;
        }
        remaining -= slice;
    }
    Ok(())
}

/// Run until stdin closes, forwarding its bytes to the keyboard.
fn run_interactive(machine: &mut dyn Machine) -> Result<(), CoreError> {
    let (tx, rx) = mpsc::channel();
    spawn_stdin_reader(tx, machine.stop_handle());
    loop {
        type_text(machine, rx.try_iter());
        if machine.run_cycles(SLICE_CYCLES)? == RunOutcome::Interrupted {
            info!("input closed");
            return Ok(());
        }
    }
}

fn spawn_stdin_reader(tx: mpsc::Sender<u8>, stop: StopHandle) {
    std::thread::spawn(move || {
        let mut buf = [0u8; 256];
        let mut stdin = std::io::stdin().lock();
        loop {
            match stdin.read(&mut buf) {
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Ok(0) | Err(_) => break,
                Ok(n) => {
                    if buf[..n].iter().any(|&b| tx.send(b).is_err()) {
                        break;
                    }
                }
            }
        }
        stop.stop();
    });
}
