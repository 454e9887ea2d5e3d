use std::{os::unix::process::ExitStatusExt as _, process::ExitStatus};

pub trait ExitStatusExt {
    /// "exit code 3" or "killed by signal 9", for error messages.
    fn describe(&self) -> String;
}

impl ExitStatusExt for ExitStatus {
    fn describe(&self) -> String {
        if let Some(code) = self.code() {
            format!("exit code {code}")
        } else if let Some(signal) = self.signal() {
            format!("killed by signal {signal}")
        } else {
            format!("{self}")
        }
    }
}

/// Join captured stdout and stderr, each terminated by a newline if
/// non-empty.
pub fn combined_outputs(stdout: &str, stderr: &str) -> String {
    let mut outputs = String::new();
    for s in [stdout, stderr] {
        if !s.is_empty() {
            outputs.push_str(s);
            if !s.ends_with('\n') {
                outputs.push('\n');
            }
        }
    }
    outputs
}
