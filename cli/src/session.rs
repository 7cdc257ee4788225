//! Command execution shared by one-shot invocations and the interactive shell.
//!
//! Output mirrors the classic `int_stack` tool: `OK` after a resize, `NULL`
//! for an empty pop, and fixed `ERROR:` lines for a full stack or a
//! non-positive size.

use std::io::{self, BufRead, Write};

use thiserror::Error;

use keystack_core::{Device, PresenceState, TokenFilter, dispatch};
use keystack_types::{DeviceError, HotplugEvent, ReadOutcome, TokenId};

/// Commands that operate on the stack and therefore require the key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StackCommand {
    SetSize(i64),
    Push(String),
    Pop,
    Unwind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Stack(StackCommand),
    /// Simulated hotplug; `None` means the configured token on its interface.
    Attach(Option<(TokenId, u8)>),
    Detach(Option<(TokenId, u8)>),
    Status,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("unknown command: {0} (try `help`)")]
    Unknown(String),
    #[error("{0} expects an argument")]
    MissingArgument(&'static str),
    #[error("unexpected argument: {0}")]
    TrailingArgument(String),
    #[error("not a number: {0}")]
    InvalidNumber(String),
    #[error("not a token id (expected VID:PID in hex): {0}")]
    InvalidToken(String),
}

const HELP: &str = "\
commands:
  set-size N          resize the stack
  push N              push an integer
  pop                 pop one value (NULL when empty)
  unwind              pop until empty
  attach [VID:PID [IFACE]]
  detach [VID:PID [IFACE]]
  status              show gate and stack state
  quit
";

impl Command {
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            return Err(CommandError::Unknown(String::new()));
        };
        let command = match name {
            "set-size" => {
                let raw = words.next().ok_or(CommandError::MissingArgument("set-size"))?;
                let size = raw
                    .parse::<i64>()
                    .map_err(|_| CommandError::InvalidNumber(raw.to_string()))?;
                Self::Stack(StackCommand::SetSize(size))
            }
            "push" => {
                let raw = words.next().ok_or(CommandError::MissingArgument("push"))?;
                Self::Stack(StackCommand::Push(raw.to_string()))
            }
            "pop" => Self::Stack(StackCommand::Pop),
            "unwind" => Self::Stack(StackCommand::Unwind),
            "attach" => Self::Attach(parse_token_arg(&mut words)?),
            "detach" => Self::Detach(parse_token_arg(&mut words)?),
            "status" => Self::Status,
            "help" => Self::Help,
            "quit" | "exit" => Self::Quit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        match words.next() {
            Some(extra) => Err(CommandError::TrailingArgument(extra.to_string())),
            None => Ok(command),
        }
    }
}

fn parse_token_arg<'a>(
    words: &mut impl Iterator<Item = &'a str>,
) -> Result<Option<(TokenId, u8)>, CommandError> {
    let Some(raw) = words.next() else {
        return Ok(None);
    };
    let invalid = || CommandError::InvalidToken(raw.to_string());
    let (vid, pid) = raw.split_once(':').ok_or_else(invalid)?;
    let vendor_id = u16::from_str_radix(vid, 16).map_err(|_| invalid())?;
    let product_id = u16::from_str_radix(pid, 16).map_err(|_| invalid())?;
    let interface = match words.next() {
        Some(iface) => iface
            .parse::<u8>()
            .map_err(|_| CommandError::InvalidNumber(iface.to_string()))?,
        None => 0,
    };
    Ok(Some((TokenId::new(vendor_id, product_id), interface)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Done,
    Failed,
    Quit,
}

pub struct Session<'a, O: Write, E: Write> {
    device: &'a Device,
    filter: TokenFilter,
    out: O,
    err: E,
}

impl<'a, O: Write, E: Write> Session<'a, O, E> {
    #[must_use]
    pub fn new(device: &'a Device, filter: TokenFilter, out: O, err: E) -> Self {
        Self {
            device,
            filter,
            out,
            err,
        }
    }

    pub fn execute(&mut self, command: &Command) -> io::Result<Outcome> {
        match command {
            Command::Stack(command) => {
                if let Err(err) = self.device.handle_open() {
                    self.report(err)?;
                    return Ok(Outcome::Failed);
                }
                self.stack_command(command)
            }
            Command::Attach(target) => self.hotplug(HotplugEvent::attach, *target),
            Command::Detach(target) => self.hotplug(HotplugEvent::detach, *target),
            Command::Status => {
                self.status()?;
                Ok(Outcome::Done)
            }
            Command::Help => {
                self.out.write_all(HELP.as_bytes())?;
                Ok(Outcome::Done)
            }
            Command::Quit => Ok(Outcome::Quit),
        }
    }

    fn stack_command(&mut self, command: &StackCommand) -> io::Result<Outcome> {
        let result = match command {
            StackCommand::SetSize(size) => self
                .device
                .handle_configure(*size)
                .map(|()| writeln!(self.out, "OK")),
            StackCommand::Push(raw) => self
                .device
                .handle_write(format!("{raw}\n").as_bytes())
                .map(|_| Ok(())),
            StackCommand::Pop => self.device.handle_read().map(|outcome| match outcome {
                ReadOutcome::Value(value) => self.out.write_all(value.to_line().as_bytes()),
                ReadOutcome::Empty => writeln!(self.out, "NULL"),
            }),
            StackCommand::Unwind => {
                while let Ok(ReadOutcome::Value(value)) = self.device.handle_read() {
                    self.out.write_all(value.to_line().as_bytes())?;
                }
                Ok(Ok(()))
            }
        };
        match result {
            Ok(written) => {
                written?;
                Ok(Outcome::Done)
            }
            Err(err) => {
                self.report(err)?;
                Ok(Outcome::Failed)
            }
        }
    }

    fn hotplug(
        &mut self,
        event: fn(TokenId, u8) -> HotplugEvent,
        target: Option<(TokenId, u8)>,
    ) -> io::Result<Outcome> {
        let (token, interface) = target.unwrap_or((self.filter.token, self.filter.interface));
        let event = event(token, interface);
        match dispatch(self.device, &self.filter, event) {
            Ok(true) => Ok(Outcome::Done),
            Ok(false) => {
                writeln!(self.err, "ignored: {token} interface {interface} is not the key")?;
                Ok(Outcome::Done)
            }
            Err(err) => {
                writeln!(self.err, "error: {err}")?;
                Ok(Outcome::Failed)
            }
        }
    }

    fn status(&mut self) -> io::Result<()> {
        let snapshot = self.device.snapshot();
        let gate = match self.device.presence() {
            PresenceState::Present(token) => format!("present {token}"),
            PresenceState::Absent => "absent".to_string(),
        };
        writeln!(
            self.out,
            "{gate} capacity={} top={} {:?}",
            snapshot.capacity,
            snapshot.top(),
            snapshot.values
        )
    }

    fn report(&mut self, err: DeviceError) -> io::Result<()> {
        match err {
            DeviceError::NotAuthorized => writeln!(self.err, "error: token is not inserted"),
            DeviceError::InvalidSize { .. } => writeln!(self.err, "ERROR: size should be > 0"),
            DeviceError::Full(_) => writeln!(self.err, "ERROR: stack is full"),
            DeviceError::MalformedInput(_) | DeviceError::OutOfMemory { .. } => {
                writeln!(self.err, "error: {err} ({})", err.errno_name())
            }
        }
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    /// Run commands line by line until input ends or `quit`.
    ///
    /// Returns `false` if any command failed; later commands still run.
    pub fn run_script(&mut self, input: impl BufRead) -> io::Result<bool> {
        let mut all_ok = true;
        for line in input.lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let command = match Command::parse(line) {
                Ok(command) => command,
                Err(err) => {
                    writeln!(self.err, "error: {err}")?;
                    all_ok = false;
                    continue;
                }
            };
            match self.execute(&command)? {
                Outcome::Done => {}
                Outcome::Failed => all_ok = false,
                Outcome::Quit => break,
            }
        }
        self.out.flush()?;
        Ok(all_ok)
    }
}
