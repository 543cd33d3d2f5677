use std::path::PathBuf;

use clap::Parser;

/// Headless Apple IIe runner.
#[derive(Debug, Parser)]
#[command(name = "orchard", version)]
pub struct Cli {
    /// Machine to run (see --list)
    #[arg(short, long)]
    pub machine: Option<String>,

    /// System ROM image, ZIP archive or ROM directory
    #[arg(short, long)]
    pub rom: Option<PathBuf>,

    /// CPU cycles to run; 0 runs until stdin closes
    #[arg(short, long)]
    pub cycles: Option<u64>,

    /// Speed in percent of real time; 0 runs unpaced
    #[arg(short, long)]
    pub speed: Option<u32>,

    /// Scheduler units the emulated clock may lead wall-clock time by
    #[arg(long)]
    pub granularity: Option<u64>,

    /// Config file [default: <config dir>/orchard/config.toml]
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log filter, e.g. "info" or "orchard_core=debug" [default: $RUST_LOG]
    #[arg(long)]
    pub log: Option<String>,

    /// Text typed into the keyboard after power-on
    #[arg(short = 't', long = "type")]
    pub type_text: Option<String>,

    /// List registered machines and exit
    #[arg(long)]
    pub list: bool,
}
