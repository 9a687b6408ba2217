use crate::redirection::{OutputStreams, RedirectionError};
use is_executable::IsExecutable;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

#[derive(Error, Debug)]
pub(crate) enum PathError {
    #[error("{0}: command not found")]
    CommandNotFound(String),

    #[error("{0}: execution failed: {1:?}")]
    CommandError(String, std::io::Error),

    #[error("Failed setting up standard I/O redirection: {0}")]
    IoRedirectionFailed(#[from] RedirectionError),
}

/// Runs the program at `location` to completion, ignoring its exit status.
///
/// The child inherits the environment and working directory of the shell, and writes to the
/// provided output streams.
pub(crate) fn run_binary(
    name: &str,
    location: &Path,
    args: &[String],
    streams: &OutputStreams,
) -> Result<(), PathError> {
    let mut command = Command::new(location);

    // Let the program see the name it was invoked with rather than its full path.
    #[cfg(unix)]
    std::os::unix::process::CommandExt::arg0(&mut command, name);

    // Pass command args.
    command.args(args);

    // Redirect standard output and error.
    command.stdout(streams.stdout_as_stdio()?);
    command.stderr(streams.stderr_as_stdio()?);

    // Block until the program is done.
    let status = command.status().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            PathError::CommandNotFound(name.to_owned())
        } else {
            PathError::CommandError(name.to_owned(), e)
        }
    })?;

    log::debug!("{} exited with {}", name, status);

    Ok(())
}

/// Resolves a command name to a file.
///
/// Names containing a path separator are used as-is, otherwise the first directory of the
/// search path holding a file with that exact name wins.
pub(crate) fn find_in_path(search_path: &[PathBuf], name: &str) -> Option<PathBuf> {
    if name.is_empty() {
        return None;
    }

    if name.contains(std::path::MAIN_SEPARATOR) {
        return Some(PathBuf::from(name)).filter(|location| location.is_file());
    }

    // Check whether the file exists in any of the directories.
    search_path
        .iter()
        .map(|dir| dir.join(name))
        .find(|location| location.is_file())
}

/// Lists the names of the executables in the search path starting with `prefix`.
///
/// Directories which cannot be read are skipped.
pub(crate) fn find_partial_executable_matches_in_path(
    search_path: &[PathBuf],
    prefix: &str,
) -> BTreeSet<String> {
    let mut matches = BTreeSet::new();

    for dir in search_path {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                log::debug!("Skipping '{}' for completion: {}", dir.display(), e);
                continue;
            }
        };

        let names = entries
            .filter_map(Result::ok)
            .filter(|entry| entry.path().is_executable())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| name.starts_with(prefix));

        matches.extend(names);
    }

    matches
}
