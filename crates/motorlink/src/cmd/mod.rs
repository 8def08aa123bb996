use clap::{Args, Subcommand, ValueEnum};
use motorlink_frame::CommandKind;
use motorlink_transport::{is_standard_baud, DEFAULT_BAUD_RATE, STANDARD_BAUD_RATES};
use tracing::warn;

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod monitor;
pub mod ports;
pub mod send;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List serial ports on this host.
    Ports(PortsArgs),
    /// Print telemetry from a controller.
    Monitor(MonitorArgs),
    /// Send a single command to a controller.
    Send(SendArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Ports(args) => ports::run(args, format),
        Command::Monitor(args) => monitor::run(args, format),
        Command::Send(args) => send::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// The line still opens at any rate the driver accepts; this only flags typos.
fn warn_unusual_baud(baud: u32) {
    if !is_standard_baud(baud) {
        warn!(
            baud,
            standard = ?STANDARD_BAUD_RATES,
            "baud rate is not one the controller normally uses"
        );
    }
}

#[derive(Args, Debug, Default)]
pub struct PortsArgs {}

#[derive(Args, Debug)]
pub struct MonitorArgs {
    /// Serial port the controller is attached to.
    #[arg(env = "MOTORLINK_PORT")]
    pub port: String,
    /// Line speed.
    #[arg(long, env = "MOTORLINK_BAUD", default_value_t = DEFAULT_BAUD_RATE)]
    pub baud: u32,
    /// Exit after printing N records.
    #[arg(long)]
    pub count: Option<u64>,
    /// Include each frame as hex.
    #[arg(long)]
    pub hex: bool,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Serial port the controller is attached to.
    #[arg(env = "MOTORLINK_PORT")]
    pub port: String,
    /// What to set.
    #[arg(value_enum)]
    pub kind: CommandArg,
    /// Value to send. Mode takes 0 (manual) or 1 (automatic); start-stop takes 1 or 0.
    #[arg(allow_negative_numbers = true)]
    pub value: f32,
    /// Line speed.
    #[arg(long, env = "MOTORLINK_BAUD", default_value_t = DEFAULT_BAUD_RATE)]
    pub baud: u32,
    /// Treat a PWM value as 0-100 % instead of raw 0-255 duty.
    #[arg(long)]
    pub percent: bool,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum CommandArg {
    Pwm,
    Rpm,
    Kp,
    Ki,
    Kd,
    Mode,
    StartStop,
}

impl From<CommandArg> for CommandKind {
    fn from(arg: CommandArg) -> Self {
        match arg {
            CommandArg::Pwm => CommandKind::Pwm,
            CommandArg::Rpm => CommandKind::Rpm,
            CommandArg::Kp => CommandKind::Kp,
            CommandArg::Ki => CommandKind::Ki,
            CommandArg::Kd => CommandKind::Kd,
            CommandArg::Mode => CommandKind::Mode,
            CommandArg::StartStop => CommandKind::StartStop,
        }
    }
}
