use std::ffi::OsString;
use std::os::fd::RawFd;

use clap::{Args, Subcommand};
use nsbox::pool::{DEFAULT_QUEUE_CAPACITY, DEFAULT_WORKERS};

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod doctor;
pub mod probe;
pub mod run;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Launch the sandbox and serve the guest.
    Run(RunArgs),
    /// Act as a guest: exchange a version packet with the host.
    Probe(ProbeArgs),
    /// Check sandbox prerequisites on this host.
    Doctor(DoctorArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Run(args) => run::run(args, format),
        Command::Probe(args) => probe::run(args, format),
        Command::Doctor(args) => doctor::run(args, format),
        Command::Version(args) => version::run(args, format),
    }
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Worker threads serving guest packets.
    #[arg(long, default_value_t = DEFAULT_WORKERS, env = "NSBOX_WORKERS")]
    pub workers: usize,
    /// Declared capacity of the dispatch queue (one slot stays empty).
    #[arg(long, default_value_t = DEFAULT_QUEUE_CAPACITY, env = "NSBOX_QUEUE_CAPACITY")]
    pub queue_capacity: usize,
    /// Also isolate the hostname (UTS namespace).
    #[arg(long)]
    pub uts: bool,
    /// Hostname inside the sandbox.
    #[arg(long, requires = "uts")]
    pub hostname: Option<String>,
    /// Guest command. The built-in probe runs when omitted.
    #[arg(last = true, value_name = "GUEST")]
    pub guest: Vec<OsString>,
}

#[derive(Args, Debug)]
pub struct ProbeArgs {
    /// Descriptor to read host packets from.
    #[arg(long, env = "NSBOX_IPC_READ_FD")]
    pub read_fd: RawFd,
    /// Descriptor to write packets to the host.
    #[arg(long, env = "NSBOX_IPC_WRITE_FD")]
    pub write_fd: RawFd,
}

#[derive(Args, Debug, Default)]
pub struct DoctorArgs {}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
