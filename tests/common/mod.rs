//! Shared test utilities and fixtures

#![allow(dead_code)]

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use keystack_core::{Device, NullRegistrar};
use keystack_types::{Capacity, ReadOutcome, TokenId};

pub const KEY: TokenId = TokenId::new(0x18d1, 0x4ee8);

pub fn device(capacity: i64) -> Device {
    Device::new(
        Capacity::new(capacity).expect("capacity"),
        "int_stack",
        Box::new(NullRegistrar),
    )
}

pub fn attached_device(capacity: i64) -> Device {
    let device = device(capacity);
    device.on_attach(KEY).expect("attach");
    device
}

/// Pop until empty or refused, most recent first.
pub fn drain(device: &Device) -> Vec<i32> {
    let mut values = Vec::new();
    while let Ok(ReadOutcome::Value(value)) = device.handle_read() {
        values.push(value.value());
    }
    values
}

pub fn push_all(device: &Device, values: impl IntoIterator<Item = i32>) {
    for value in values {
        device
            .handle_write(value.to_string().as_bytes())
            .expect("push");
    }
}

/// Write a config file whose endpoint dir points inside `dir`.
pub fn write_config(dir: &Path, extra: &str) -> PathBuf {
    let path = dir.join("config.toml");
    let endpoint_dir = dir.join("run");
    let contents = format!(
        "[endpoint]\nname = \"int_stack\"\ndir = \"{}\"\n{extra}",
        endpoint_dir.display()
    );
    fs::write(&path, contents).expect("write config");
    path
}

/// Run the keystack binary with `args`, feeding `stdin`.
pub fn keystack(config: &Path, args: &[&str], stdin: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_keystack"))
        .arg("--config")
        .arg(config)
        .args(args)
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn keystack");
    child
        .stdin
        .take()
        .expect("stdin pipe")
        .write_all(stdin.as_bytes())
        .expect("write stdin");
    child.wait_with_output().expect("wait keystack")
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

/// Like [`keystack`], but the read end of stdout is closed before the binary
/// writes anything, so its first flush fails with a broken pipe.
pub fn keystack_without_reader(config: &Path, args: &[&str], stdin: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_keystack"))
        .arg("--config")
        .arg(config)
        .args(args)
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn keystack");
    drop(child.stdout.take());
    child
        .stdin
        .take()
        .expect("stdin pipe")
        .write_all(stdin.as_bytes())
        .expect("write stdin");
    child.wait_with_output().expect("wait keystack")
}
