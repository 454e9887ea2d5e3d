//! Running one external process and timing it.

use std::{
    os::unix::process::CommandExt,
    path::PathBuf,
    process::{Child, Command, ExitStatus, Stdio},
    time::{Duration, Instant},
};

use anyhow::Result;
use nix::{
    errno::Errno,
    sys::signal::{killpg, Signal},
    unistd::Pid,
};

use crate::{
    ctx,
    io_utils::capture::{
        get_cmd_and_args_as_bash_string, join_io_thread, new_reader_thread, new_writer_thread,
    },
};

const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// One process invocation, fully resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub stdin: Option<String>,
    /// Whether stdout and stderr are captured; otherwise they are
    /// discarded
    pub capture: bool,
    pub timeout: Option<Duration>,
}

impl Invocation {
    pub fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }

    /// The command line, shell-quoted, for messages.
    pub fn to_bash_string(&self) -> String {
        get_cmd_and_args_as_bash_string(&self.command())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Completed {
        elapsed: Duration,
        stdout: String,
    },
    Failed {
        status: ExitStatus,
        stdout: String,
        stderr: String,
    },
    TimedOut {
        after: Duration,
    },
}

/// Kill the process group led by `child`, which includes anything a
/// launcher like `mpiexec` or `sh` started. Grandchildren would keep
/// captured pipes open otherwise.
fn kill_process_group(child: &Child) -> Result<()> {
    let pgid = Pid::from_raw(child.id() as i32);
    match killpg(pgid, Signal::SIGKILL) {
        Ok(()) | Err(Errno::ESRCH) => Ok(()),
        Err(e) => Err(anyhow::Error::from(e).context(format!("killing process group {pgid}"))),
    }
}

/// Wait for the child, killing its process group when `timeout`
/// expires. Returns `None` on timeout, after the child has been
/// reaped.
fn wait_with_timeout(child: &mut Child, timeout: Option<Duration>) -> Result<Option<ExitStatus>> {
    let Some(timeout) = timeout else {
        return Ok(Some(child.wait()?));
    };
    let start = Instant::now();
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if start.elapsed() >= timeout {
            kill_process_group(child)?;
            child.wait()?;
            return Ok(None);
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}

/// Run the invocation to completion (or timeout). The elapsed time
/// spans from just before spawning to just after reaping the child.
/// Failing to spawn (e.g. program missing) is an error, a non-zero
/// exit is a `RunOutcome::Failed`.
pub fn run_invocation(invocation: &Invocation) -> Result<RunOutcome> {
    let Invocation {
        program: _,
        args: _,
        stdin,
        capture,
        timeout,
    } = invocation;

    let mut cmd = invocation.command();
    if timeout.is_some() {
        // Own process group, so that the timeout takes down the whole
        // tree. Without a timeout, Ctrl-C keeps reaching the child.
        cmd.process_group(0);
    }
    cmd.stdin(if stdin.is_some() {
        Stdio::piped()
    } else {
        Stdio::null()
    });
    if *capture {
        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
    } else {
        cmd.stdout(Stdio::null()).stderr(Stdio::null());
    }

    let start = Instant::now();
    let mut child = cmd
        .spawn()
        .map_err(ctx!("running {}", invocation.to_bash_string()))?;

    let (status, stdout, stderr) = std::thread::scope(|scope| -> Result<_> {
        let writer = match (stdin, child.stdin.take()) {
            (Some(input), Some(child_stdin)) => {
                Some(new_writer_thread(scope, child_stdin, input)?)
            }
            _ => None,
        };
        let stdout_reader = child
            .stdout
            .take()
            .map(|out| new_reader_thread(scope, out))
            .transpose()?;
        let stderr_reader = child
            .stderr
            .take()
            .map(|err| new_reader_thread(scope, err))
            .transpose()?;

        let status = wait_with_timeout(&mut child, *timeout)?;

        if let Some(writer) = writer {
            join_io_thread(writer)?;
        }
        let stdout = stdout_reader.map(join_io_thread).transpose()?;
        let stderr = stderr_reader.map(join_io_thread).transpose()?;
        Ok((status, stdout.unwrap_or_default(), stderr.unwrap_or_default()))
    })?;
    let elapsed = start.elapsed();

    Ok(match status {
        None => RunOutcome::TimedOut { after: elapsed },
        Some(status) if status.success() => RunOutcome::Completed { elapsed, stdout },
        Some(status) => RunOutcome::Failed {
            status,
            stdout,
            stderr,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(script: &str) -> Invocation {
        Invocation {
            program: "sh".into(),
            args: vec!["-c".into(), script.into()],
            stdin: None,
            capture: true,
            timeout: None,
        }
    }

    #[test]
    fn t_completed_with_output() -> Result<()> {
        match run_invocation(&sh("echo hello; echo oops >&2"))? {
            RunOutcome::Completed { elapsed, stdout } => {
                assert_eq!(stdout, "hello\n");
                assert!(elapsed > Duration::ZERO);
            }
            other => panic!("unexpected {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn t_stdin_is_fed() -> Result<()> {
        let mut inv = sh("read a; read b; echo \"$b $a\"");
        inv.stdin = Some("1000\n500000\n".into());
        match run_invocation(&inv)? {
            RunOutcome::Completed { stdout, .. } => assert_eq!(stdout, "500000 1000\n"),
            other => panic!("unexpected {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn t_failed() -> Result<()> {
        match run_invocation(&sh("echo bad >&2; exit 2"))? {
            RunOutcome::Failed { status, stderr, .. } => {
                assert_eq!(status.code(), Some(2));
                assert_eq!(stderr, "bad\n");
            }
            other => panic!("unexpected {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn t_timeout() -> Result<()> {
        let mut inv = sh("exec sleep 5");
        inv.capture = false;
        inv.timeout = Some(Duration::from_millis(200));
        match run_invocation(&inv)? {
            RunOutcome::TimedOut { after } => assert!(after < Duration::from_secs(4)),
            other => panic!("unexpected {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn t_timeout_kills_grandchildren() -> Result<()> {
        // `sh` forks `sleep`, which holds on to the captured stdout
        let mut inv = sh("sleep 6; echo done");
        inv.timeout = Some(Duration::from_millis(300));
        match run_invocation(&inv)? {
            RunOutcome::TimedOut { after } => {
                assert!(after < Duration::from_secs(3), "took {after:?}")
            }
            other => panic!("unexpected {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn t_missing_program() {
        let inv = Invocation {
            program: "/nonexistent/parbench-test-program".into(),
            args: vec![],
            stdin: None,
            capture: false,
            timeout: None,
        };
        let e = run_invocation(&inv).unwrap_err();
        assert!(format!("{e:#}").contains("/nonexistent/parbench-test-program"));
    }
}
