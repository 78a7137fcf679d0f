//! # Kestrel Loader Binary
//!
//! Runs the loader HAL on a development host: the simulated board comes
//! up with the console on stdin/stdout, the `pre-init` script and any
//! `--exec` lines run, and the autoboot countdown launches the kernel
//! unless a key is pressed.
//!
//! # Usage
//!
//! ```bash
//! # Bring the board up and list devices
//! kestrel --config loader.toml -c lsdev
//!
//! # Autoboot a kernel verified at 0x80000401
//! kestrel --entry 0x80000401
//!
//! # Zynq profile, verbose JSON logs
//! kestrel --board zynq7000 --entry 0xc0000000 -v --json
//! ```

#![deny(warnings)]

use clap::Parser;
use kestrel_common::config::{BoardKind, ConfigError, ConfigLoader, LoaderConfig, LogLevel};
use kestrel_common::consts::{DEFAULT_CONFIG_PATH, PRE_INIT_SCRIPT, TICKS_PER_SECOND};
use kestrel_common::hal::error::to_errno;
use kestrel_common::hal::transport::{DeviceId, DeviceTransport};
use kestrel_hal::console::{Attr, Console};
use kestrel_hal::sim::{LoopbackUart, SimBootInfo, SimCpu, SimUsbEndpoint, StdioUart};
use kestrel_hal::timer::SystemTimer;
use kestrel_hal::transports::{SerialTransport, UsbCdcTransport};
use kestrel_hal::{BoardProfile, Hal, HalParts};
use std::path::PathBuf;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::EnvFilter;

/// Kestrel - second-stage boot loader HAL
#[derive(Parser, Debug)]
#[command(name = "kestrel")]
#[command(author = "RTS007")]
#[command(version)]
#[command(about = "Second-stage boot loader HAL running on a simulated board")]
#[command(long_about = None)]
struct Args {
    /// Path to the loader configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Board profile, overrides the configuration
    #[arg(short, long)]
    board: Option<BoardKind>,

    /// Entry point of an already verified kernel image (hex)
    #[arg(short, long, value_parser = parse_address)]
    entry: Option<usize>,

    /// Command line to run after the pre-init script (can be repeated)
    #[arg(short = 'c', long = "exec", action = clap::ArgAction::Append)]
    exec: Vec<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json: bool,
}

fn parse_address(s: &str) -> Result<usize, String> {
    let digits = s.trim_start_matches("0x").trim_start_matches("0X");
    usize::from_str_radix(digits, 16).map_err(|e| format!("invalid address '{s}': {e}"))
}

fn main() {
    if let Err(e) = run() {
        error!("Loader failed: {}", e);
        eprintln!("kestrel: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let (mut config, defaulted) = match LoaderConfig::load(&args.config) {
        Ok(config) => (config, false),
        Err(ConfigError::FileNotFound) => (LoaderConfig::default(), true),
        Err(e) => return Err(e.into()),
    };
    if let Some(kind) = args.board {
        config.board.kind = kind;
    }

    setup_tracing(&args, config.shared.log_level);
    info!("Kestrel loader v{} starting...", env!("CARGO_PKG_VERSION"));
    if defaulted {
        warn!("No configuration at {:?}, using defaults", args.config);
    }

    let mut hal = build_hal(config)?;
    hal.init()?;

    let board = hal.board().name;
    let console = hal.console();
    console.set_attr(Attr::Init);
    console.print(format_args!(
        "Kestrel loader v{} ({board})\n",
        env!("CARGO_PKG_VERSION")
    ));
    console.set_attr(Attr::User);

    if hal.config().pre_init_script().is_some() {
        // Failures are already reported on the console.
        hal.run_script(PRE_INIT_SCRIPT).ok();
    }
    for line in &args.exec {
        let status = to_errno(&hal.exec(line));
        debug!("'{}' returned {}", line, status);
    }

    if let Some(addr) = args.entry {
        hal.set_kernel_entry(addr);
    }

    autoboot(&mut hal);
    info!("No kernel launched, loader exiting");
    Ok(())
}

/// Assemble the simulated board.
fn build_hal(config: LoaderConfig) -> Result<Hal, Box<dyn std::error::Error>> {
    let board = BoardProfile::for_kind(config.board.kind);
    let timer = SystemTimer::new();

    let cpu = SimCpu::new(board.cpu_info).with_jump_hook(|entry, bootinfo| {
        info!(
            "Kernel entered at {:#x}, boot info in r9 = {:#x}",
            entry, bootinfo
        );
        std::process::exit(0);
    });

    let usb = SimUsbEndpoint::new();
    usb.set_configured(true);
    let serial: Box<dyn DeviceTransport> =
        Box::new(SerialTransport::new(LoopbackUart::new(), timer.clone(), 0));
    let cdc: Box<dyn DeviceTransport> = Box::new(UsbCdcTransport::new(usb, timer.clone(), 1));

    let parts = HalParts {
        cpu: Box::new(cpu),
        timer: Box::new(timer.clone()),
        bootinfo: Box::new(SimBootInfo::new()),
        console: Console::new(Box::new(StdioUart::new()), Box::new(timer)),
        transports: vec![(DeviceId::COM1, serial), (DeviceId::ACM0, cdc)],
    };
    Ok(Hal::new(config, parts)?)
}

/// Count down and run `go!` unless a key is pressed.
fn autoboot(hal: &mut Hal) {
    if hal.kernel_entry().is_none() {
        return;
    }

    let ticks = hal.launch_timeout();
    if ticks > 0 {
        let secs = ticks.div_ceil(TICKS_PER_SECOND);
        hal.console().print(format_args!(
            "Autoboot in {secs} s, press any key to stop\n"
        ));
        if hal.console().wait_keypress(ticks) {
            info!("Autoboot interrupted");
            return;
        }
    }

    if let Err(e) = hal.exec("go!") {
        error!("Autoboot failed: {}", e);
    }
}

/// Setup tracing subscriber based on CLI arguments and the configured level.
fn setup_tracing(args: &Args, configured: LogLevel) {
    let level = if args.verbose {
        Level::DEBUG
    } else {
        configured.into()
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
