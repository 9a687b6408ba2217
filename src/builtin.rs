use crate::config::ShellConfig;
use crate::path::find_in_path;
use crate::redirection::{OutputStreams, RedirectionError};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use strum_macros::{EnumString, IntoStaticStr, VariantNames};
use thiserror::Error;

#[derive(Error, Debug)]
pub(crate) enum BuiltInError {
    #[error("{command}: expected {expected} argument(s), got {found}")]
    WrongArgumentCount {
        command: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("exit: {0}: numeric argument required")]
    InvalidExitCode(String),

    #[error("cd: HOME not set")]
    HomeNotSet,

    #[error("cd: {0}: No such file or directory")]
    NoSuchDirectory(String),

    #[error("pwd: failed to determine the current working directory: {0:?}")]
    CurrentDirectory(std::io::Error),

    #[error("{0}: not found")]
    NotFound(String),

    #[error(transparent)]
    Output(#[from] RedirectionError),
}

/// What the shell should do once a builtin returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BuiltInOutcome {
    Continue,
    Exit(i32),
}

#[derive(EnumString, VariantNames, IntoStaticStr, Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BuiltInCommand {
    #[strum(to_string = "cd")]
    ChangeDirectory,

    #[strum(to_string = "echo")]
    Echo,

    #[strum(to_string = "exit")]
    Exit,

    #[strum(to_string = "pwd")]
    PrintWorkingDirectory,

    #[strum(to_string = "type")]
    Type,
}

impl BuiltInCommand {
    fn name(&self) -> &'static str {
        self.into()
    }

    /// Runs the built-in command.
    ///
    /// # Note
    /// User mistakes are returned as errors rather than written out, the caller reports them on
    /// the standard error of the command.
    pub(crate) fn run(
        &self,
        args: &[String],
        config: &ShellConfig,
        streams: &mut OutputStreams,
    ) -> Result<BuiltInOutcome, BuiltInError> {
        match self {
            BuiltInCommand::ChangeDirectory => {
                let arg = self.single_argument(args)?;
                let working_directory = resolve_directory(arg, config.home())?;

                std::env::set_current_dir(&working_directory).map_err(|_| {
                    BuiltInError::NoSuchDirectory(working_directory.display().to_string())
                })?;

                log::debug!("Changed directory to '{}'", working_directory.display());
            }
            BuiltInCommand::Echo => {
                streams.writeln(format_args!("{}", args.join(" ")))?;
            }
            BuiltInCommand::Exit => {
                let arg = self.single_argument(args)?;

                let exit_code = arg
                    .trim()
                    .parse::<i32>()
                    .map_err(|_| BuiltInError::InvalidExitCode(arg.to_owned()))?;

                return Ok(BuiltInOutcome::Exit(exit_code));
            }
            BuiltInCommand::PrintWorkingDirectory => {
                self.expect_arguments(args, 0)?;

                let cwd = std::env::current_dir().map_err(BuiltInError::CurrentDirectory)?;

                streams.writeln(format_args!("{}", cwd.display()))?;
            }
            BuiltInCommand::Type => {
                let arg = self.single_argument(args)?;

                if let Ok(sub_command) = BuiltInCommand::from_str(arg) {
                    streams.writeln(format_args!("{} is a shell builtin", sub_command.name()))?;
                } else if let Some(location) = find_in_path(config.search_path(), arg) {
                    streams.writeln(format_args!("{} is {}", arg, location.display()))?;
                } else {
                    return Err(BuiltInError::NotFound(arg.to_owned()));
                }
            }
        };

        Ok(BuiltInOutcome::Continue)
    }

    fn expect_arguments(&self, args: &[String], expected: usize) -> Result<(), BuiltInError> {
        if args.len() != expected {
            return Err(BuiltInError::WrongArgumentCount {
                command: self.name(),
                expected,
                found: args.len(),
            });
        }

        Ok(())
    }

    fn single_argument<'a>(&self, args: &'a [String]) -> Result<&'a str, BuiltInError> {
        self.expect_arguments(args, 1)?;

        Ok(&args[0])
    }
}

/// Expands a leading `~` to the home directory.
fn resolve_directory(arg: &str, home: Option<&PathBuf>) -> Result<PathBuf, BuiltInError> {
    let relative = if arg == "~" {
        ""
    } else if let Some(relative) = arg.strip_prefix("~/") {
        relative
    } else {
        return Ok(PathBuf::from(arg));
    };

    let home = home.ok_or(BuiltInError::HomeNotSet)?;

    if relative.is_empty() {
        Ok(home.to_path_buf())
    } else {
        Ok(home.join(Path::new(relative)))
    }
}
