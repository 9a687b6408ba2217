use regex::Regex;
use std::fs::{File, OpenOptions};
use std::io::{stderr, stdout, Write};
use std::path::Path;
use std::process::Stdio;
use thiserror::Error;

#[derive(Error, Debug)]
pub(crate) enum RedirectionError {
    #[error("Invalid redirection operator pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("Failed to create directory '{0}': {1:?}")]
    CreateDirectoryFailed(String, std::io::Error),

    #[error("Failed to redirect to '{0}': {1:?}")]
    OpenFailed(String, std::io::Error),

    #[error("Failed to clone file descriptor: {0:?}")]
    CloneFailed(std::io::Error),

    #[error("Failed to write to {0}: {1:?}")]
    WriteFailed(Stream, std::io::Error),
}

/// An output stream of the shell that can be redirected.
#[derive(strum_macros::Display, Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Stream {
    #[strum(to_string = "standard output")]
    Stdout,

    #[strum(to_string = "standard error")]
    Stderr,
}

/// Whether a redirection target is emptied or extended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RedirectMode {
    Truncate,
    Append,
}

/// A redirection parsed from the end of a command line, e.g. `2>> errors.log`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RedirectionSpec {
    stream: Stream,
    mode: RedirectMode,
    target: String,
}

impl RedirectionSpec {
    pub(crate) fn new(stream: Stream, mode: RedirectMode, target: impl Into<String>) -> Self {
        Self {
            stream,
            mode,
            target: target.into(),
        }
    }

    pub(crate) fn stream(&self) -> Stream {
        self.stream
    }

    pub(crate) fn mode(&self) -> RedirectMode {
        self.mode
    }

    pub(crate) fn target(&self) -> &str {
        &self.target
    }
}

/// Recognizes the `>`, `1>`, `2>`, `>>`, `1>>` and `2>>` operators.
pub(crate) struct RedirectionResolver {
    operator: Regex,
}

impl RedirectionResolver {
    pub(crate) fn new() -> Result<Self, RedirectionError> {
        let operator = Regex::new(r"^(?<descriptor>[12])?>(?<append>>)?$")?;

        Ok(Self { operator })
    }

    /// Looks for a redirection in the last two tokens.
    /// Also removes the operator and its target from the tokens.
    ///
    /// # Note
    /// The operator must be a token of its own, i.e. surrounded with spaces.
    pub(crate) fn extract(&self, tokens: &mut Vec<String>) -> Option<RedirectionSpec> {
        if tokens.len() < 2 {
            return None;
        }

        let groups = self.operator.captures(&tokens[tokens.len() - 2])?;

        let stream = match groups.name("descriptor") {
            Some(descriptor) if descriptor.as_str() == "2" => Stream::Stderr,
            _ => Stream::Stdout,
        };
        let mode = if groups.name("append").is_some() {
            RedirectMode::Append
        } else {
            RedirectMode::Truncate
        };

        // Remove the target and the operator from the tokens.
        let target = tokens.pop()?;
        tokens.pop();

        Some(RedirectionSpec::new(stream, mode, target))
    }
}

/// The output and error destinations of a single command.
///
/// The process-wide handles are never swapped: a redirected stream owns its file, which is
/// closed when the command is done and this value is dropped.
pub(crate) struct OutputStreams {
    stdout: Descriptor,
    stderr: Descriptor,
}

impl OutputStreams {
    /// The inherited standard output and error.
    pub(crate) fn standard() -> Self {
        Self {
            stdout: Descriptor::StandardOutput,
            stderr: Descriptor::StandardError,
        }
    }

    /// Opens the redirection target, creating missing parent directories, and substitutes it
    /// for the stream it applies to.
    pub(crate) fn redirected(spec: &RedirectionSpec) -> Result<Self, RedirectionError> {
        let file = open_redirect_file(spec.target(), spec.mode())?;

        let mut streams = Self::standard();
        match spec.stream() {
            Stream::Stdout => streams.stdout = Descriptor::File(file),
            Stream::Stderr => streams.stderr = Descriptor::File(file),
        }

        log::debug!(
            "Redirecting {} to '{}' ({:?})",
            spec.stream(),
            spec.target(),
            spec.mode()
        );

        Ok(streams)
    }

    /// Writes a new line to the standard output.
    pub(crate) fn writeln(&mut self, args: std::fmt::Arguments) -> Result<(), RedirectionError> {
        self.stdout
            .writeln(args)
            .map_err(|e| RedirectionError::WriteFailed(Stream::Stdout, e))
    }

    /// Writes a new line to the standard error.
    pub(crate) fn ewriteln(&mut self, args: std::fmt::Arguments) -> Result<(), RedirectionError> {
        self.stderr
            .writeln(args)
            .map_err(|e| RedirectionError::WriteFailed(Stream::Stderr, e))
    }

    pub(crate) fn stdout_as_stdio(&self) -> Result<Stdio, RedirectionError> {
        (&self.stdout).try_into()
    }

    pub(crate) fn stderr_as_stdio(&self) -> Result<Stdio, RedirectionError> {
        (&self.stderr).try_into()
    }
}

enum Descriptor {
    File(File),
    StandardOutput,
    StandardError,
}

impl Descriptor {
    fn writeln(&mut self, args: std::fmt::Arguments) -> std::io::Result<()> {
        match self {
            Descriptor::File(file) => writeln!(file, "{}", args),
            Descriptor::StandardOutput => {
                let mut stdout = stdout().lock();
                writeln!(stdout, "{}", args)?;
                stdout.flush()
            }
            Descriptor::StandardError => writeln!(stderr(), "{}", args),
        }
    }
}

impl TryFrom<&Descriptor> for Stdio {
    type Error = RedirectionError;

    fn try_from(value: &Descriptor) -> Result<Self, Self::Error> {
        let stdio = match value {
            Descriptor::File(file) => {
                let file = file.try_clone().map_err(RedirectionError::CloneFailed)?;

                file.into()
            }
            Descriptor::StandardOutput => stdout().into(),
            Descriptor::StandardError => stderr().into(),
        };

        Ok(stdio)
    }
}

fn open_redirect_file(target: &str, mode: RedirectMode) -> Result<File, RedirectionError> {
    ensure_parent_directory(target)?;

    let append = mode == RedirectMode::Append;

    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(!append)
        .append(append)
        .open(target)
        .map_err(|e| RedirectionError::OpenFailed(target.to_owned(), e))
}

fn ensure_parent_directory(target: &str) -> Result<(), RedirectionError> {
    let Some(parent) = Path::new(target).parent() else {
        return Ok(());
    };

    if parent.as_os_str().is_empty() || parent.is_dir() {
        return Ok(());
    }

    log::debug!("Creating missing directory '{}'", parent.display());

    std::fs::create_dir_all(parent).map_err(|e| {
        RedirectionError::CreateDirectoryFailed(parent.display().to_string(), e)
    })
}
