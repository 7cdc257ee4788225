//! keystack CLI - in-process front end for the token-gated stack device.
//!
//! ```text
//! main() -> load config -> init_tracing() -> Device::new(registrar)
//!                                                 |
//!                     one-shot: set-size | push | pop | unwind
//!                     shell:    same commands + attach | detach | status, read from stdin
//! ```
//!
//! There is no persistence: every invocation starts a fresh device with an
//! empty stack, and the token is absent unless `--attach` simulates it.

mod session;

use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use keystack_config::KeystackConfig;
use keystack_core::{
    Device, EndpointFileRegistrar, NullRegistrar, Registrar, TokenFilter, dispatch,
};
use keystack_types::HotplugEvent;

use session::{Command, Outcome, Session, StackCommand};

#[derive(Parser)]
#[command(name = "keystack")]
#[command(about = "Integer stack usable only while the hardware key is attached", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,

    /// Config file (default: ~/.keystack/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Simulate the configured key being attached at startup
    #[arg(long, global = true)]
    attach: bool,

    /// Publish an endpoint descriptor file while the key is attached
    #[arg(long, global = true)]
    publish: bool,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Resize the stack (shrinking discards values above the new size)
    SetSize {
        #[arg(allow_negative_numbers = true)]
        size: i64,
    },
    /// Push one integer
    Push {
        #[arg(allow_negative_numbers = true)]
        value: String,
    },
    /// Pop one value, printing NULL when the stack is empty
    Pop,
    /// Pop and print until the stack is empty
    Unwind,
    /// Read commands from stdin, one per line
    Shell,
}

fn init_tracing(config: Option<&KeystackConfig>) {
    let fallback = config.and_then(KeystackConfig::log_filter).unwrap_or("warn");
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    // stdout carries command results only.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr).with_target(false))
        .with(env_filter)
        .init();
}

fn load_config(path: Option<&PathBuf>) -> Result<KeystackConfig> {
    let config = match path {
        Some(path) => Some(KeystackConfig::load_from(path)?),
        None => KeystackConfig::load()?,
    };
    Ok(config.unwrap_or_default())
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_ref());
    init_tracing(config.as_ref().ok());
    let config = config.context("loading configuration")?;

    let registrar: Box<dyn Registrar> = if cli.publish {
        Box::new(EndpointFileRegistrar::new(config.endpoint_dir()))
    } else {
        Box::new(NullRegistrar)
    };
    let device = Device::new(config.default_capacity()?, config.endpoint_name(), registrar);
    let filter = TokenFilter::new(config.token(), config.token_interface());
    tracing::debug!(
        endpoint = device.endpoint(),
        capacity = %device.snapshot().capacity,
        token = %filter.token,
        interface = filter.interface,
        "Device ready"
    );

    if cli.attach {
        dispatch(&device, &filter, HotplugEvent::attach(filter.token, filter.interface))
            .context("attaching simulated key")?;
    }

    // Teardown must run even when stdout or stdin fails mid-command.
    let result = run_command(&device, filter, cli.command);
    device.shutdown();
    let ok = result.context("running command")?;
    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

fn run_command(device: &Device, filter: TokenFilter, command: CliCommand) -> io::Result<bool> {
    let stdout = io::stdout();
    let mut session = Session::new(device, filter, BufWriter::new(stdout.lock()), io::stderr());
    let command = match command {
        CliCommand::Shell => return session.run_script(io::stdin().lock()),
        CliCommand::SetSize { size } => StackCommand::SetSize(size),
        CliCommand::Push { value } => StackCommand::Push(value),
        CliCommand::Pop => StackCommand::Pop,
        CliCommand::Unwind => StackCommand::Unwind,
    };
    let outcome = session.execute(&Command::Stack(command))?;
    session.flush()?;
    Ok(outcome == Outcome::Done)
}
