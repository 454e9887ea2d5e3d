use std::{
    borrow::Cow,
    ffi::OsStr,
    io::{ErrorKind, Read, Write},
    process::Command,
    thread::{Scope, ScopedJoinHandle},
};

use anyhow::{anyhow, Result};

use super::bash::cmd_as_bash_string;

pub fn get_cmd_and_args(cmd: &Command) -> Vec<Cow<str>> {
    let prog_name = cmd.get_program().to_string_lossy();
    let mut args: Vec<_> = cmd
        .get_args()
        .map(|s: &OsStr| s.to_string_lossy())
        .collect();
    let mut cmd_and_args = vec![prog_name];
    cmd_and_args.append(&mut args);
    cmd_and_args
}

pub fn get_cmd_and_args_as_bash_string(cmd: &Command) -> String {
    cmd_as_bash_string(get_cmd_and_args(cmd))
}

/// Drain `child_output` into a string on a separate thread, so that
/// the child never blocks on a full pipe while we wait for it. Invalid
/// UTF-8 is replaced.
pub fn new_reader_thread<'scope, 'env, F: Read + Send + 'scope>(
    scope: &'scope Scope<'scope, 'env>,
    mut child_output: F,
) -> Result<ScopedJoinHandle<'scope, Result<String>>> {
    std::thread::Builder::new()
        .name("output reader".into())
        .spawn_scoped(scope, move || -> Result<String> {
            let mut buf = Vec::new();
            child_output.read_to_end(&mut buf)?;
            Ok(String::from_utf8_lossy(&buf).into_owned())
        })
        .map_err(move |e| anyhow!("{e}"))
}

/// Feed `input` to the child's stdin on a separate thread, then close
/// it. A child exiting without reading all of its input is not an
/// error.
pub fn new_writer_thread<'scope, 'env, F: Write + Send + 'scope>(
    scope: &'scope Scope<'scope, 'env>,
    mut child_input: F,
    input: &'env str,
) -> Result<ScopedJoinHandle<'scope, Result<()>>> {
    std::thread::Builder::new()
        .name("input writer".into())
        .spawn_scoped(scope, move || -> Result<()> {
            match child_input.write_all(input.as_bytes()) {
                Err(e) if e.kind() == ErrorKind::BrokenPipe => Ok(()),
                r => Ok(r?),
            }
        })
        .map_err(move |e| anyhow!("{e}"))
}

/// Wait for a thread created by `new_reader_thread` or
/// `new_writer_thread`.
pub fn join_io_thread<T>(handle: ScopedJoinHandle<'_, Result<T>>) -> Result<T> {
    handle
        .join()
        .map_err(|_| anyhow!("child I/O thread panicked"))?
}

#[cfg(test)]
mod tests {
    use std::process::Stdio;

    use super::*;

    #[test]
    fn t_get_cmd_and_args_as_bash_string() {
        let mut cmd = Command::new("../build/rw_lock");
        cmd.args(["4", "read", "a b"]);
        assert_eq!(
            get_cmd_and_args_as_bash_string(&cmd),
            "../build/rw_lock 4 read 'a b'"
        );
    }

    #[test]
    fn t_threads_round_trip_through_cat() -> Result<()> {
        let mut child = Command::new("cat")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()?;
        let input = "1000\n500000\n".to_string();
        let output = std::thread::scope(|scope| -> Result<String> {
            let writer = new_writer_thread(scope, child.stdin.take().expect("piped"), &input)?;
            let reader = new_reader_thread(scope, child.stdout.take().expect("piped"))?;
            join_io_thread(writer)?;
            join_io_thread(reader)
        })?;
        assert!(child.wait()?.success());
        assert_eq!(output, input);
        Ok(())
    }
}
