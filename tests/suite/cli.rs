//! The keystack binary, driven through its command surface.

use crate::common::{keystack, keystack_without_reader, stderr, stdout, write_config};

#[test]
fn commands_fail_without_the_key() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = write_config(dir.path(), "");

    let output = keystack(&config, &["pop"], "");
    assert!(!output.status.success());
    assert_eq!(stdout(&output), "");
    assert!(
        stderr(&output).contains("error: token is not inserted"),
        "{}",
        stderr(&output)
    );
}

#[test]
fn one_shot_commands_with_simulated_key() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = write_config(dir.path(), "");

    let pop = keystack(&config, &["--attach", "pop"], "");
    assert!(pop.status.success());
    assert_eq!(stdout(&pop), "NULL\n");

    let set_size = keystack(&config, &["--attach", "set-size", "4"], "");
    assert!(set_size.status.success());
    assert_eq!(stdout(&set_size), "OK\n");

    let bad_size = keystack(&config, &["--attach", "set-size", "-5"], "");
    assert!(!bad_size.status.success());
    assert!(stderr(&bad_size).contains("ERROR: size should be > 0"));

    let push = keystack(&config, &["--attach", "push", "-3"], "");
    assert!(push.status.success());
    assert_eq!(stdout(&push), "");
}

#[test]
fn shell_runs_a_full_session() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = write_config(dir.path(), "[stack]\ndefault_capacity = 2\n");
    let script = "attach\npush 1\npush 2\npush 3\nunwind\npop\nstatus\n";

    let output = keystack(&config, &["shell"], script);
    assert!(!output.status.success(), "push 3 overflows capacity 2");
    assert_eq!(
        stdout(&output),
        "2\n1\nNULL\npresent 18D1:4EE8 capacity=2 top=0 []\n"
    );
    assert!(stderr(&output).contains("ERROR: stack is full"));
}

#[test]
fn published_endpoint_is_withdrawn_on_exit() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = write_config(dir.path(), "");

    let output = keystack(&config, &["--publish", "shell"], "attach\npush 1\npop\n");
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(stdout(&output), "1\n");
    assert!(dir.path().join("run").exists(), "publish creates the endpoint dir");
    assert!(!dir.path().join("run").join("int_stack").exists());
}

#[test]
fn endpoint_is_withdrawn_when_stdout_is_closed() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = write_config(dir.path(), "");

    let output =
        keystack_without_reader(&config, &["--publish", "shell"], "attach\npush 1\npop\n");
    assert!(!output.status.success(), "writing to a closed stdout must fail");
    assert!(dir.path().join("run").exists(), "publish creates the endpoint dir");
    assert!(
        !dir.path().join("run").join("int_stack").exists(),
        "endpoint left behind: {}",
        stderr(&output)
    );
}

#[test]
fn invalid_config_is_reported() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = write_config(dir.path(), "[stack]\ndefault_capacity = 0\n");

    let output = keystack(&config, &["--attach", "pop"], "");
    assert!(!output.status.success());
    assert!(
        stderr(&output).contains("stack.default_capacity"),
        "{}",
        stderr(&output)
    );
}
