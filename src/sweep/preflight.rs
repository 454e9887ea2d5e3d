//! Checks done before the result file is created.

use std::path::Path;

use nix::unistd::{access, AccessFlags};

use crate::warn;

use super::{
    definition::{MissingExecutable, SweepDefinition},
    SweepError,
};

fn check_executable(name: &str, path: &Path) -> Result<(), SweepError> {
    if !path.is_file() {
        return Err(SweepError::MissingExecutable {
            name: name.into(),
            path: path.to_owned(),
        });
    }
    access(path, AccessFlags::X_OK).map_err(|_| SweepError::NotExecutable {
        name: name.into(),
        path: path.to_owned(),
    })
}

/// Verify required files and executables. Returns the indices (into
/// `definition.executables`) of the executables to sweep; with
/// `MissingExecutable::Skip`, unavailable ones are left out with a
/// warning.
pub fn preflight(definition: &SweepDefinition) -> Result<Vec<usize>, SweepError> {
    for file in &definition.required_files {
        if !file.exists() {
            return Err(SweepError::MissingRequiredFile(file.clone()));
        }
    }

    let mut available = Vec::new();
    for (i, executable) in definition.executables.iter().enumerate() {
        let path = definition.executable_path(executable);
        match check_executable(&executable.name, &path) {
            Ok(()) => available.push(i),
            Err(e) => match definition.missing_executable {
                MissingExecutable::Fail => return Err(e),
                MissingExecutable::Skip => warn!("skipping: {e}"),
            },
        }
    }
    if available.is_empty() {
        return Err(SweepError::NoExecutables(definition.name.clone()));
    }
    Ok(available)
}
