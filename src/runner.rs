use crate::builtin::{BuiltInCommand, BuiltInError, BuiltInOutcome};
use crate::config::ShellConfig;
use crate::parser::Command;
use crate::path::{find_in_path, run_binary, PathError};
use crate::redirection::{OutputStreams, RedirectionError};
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub(crate) enum RunnerError {
    #[error(transparent)]
    BuiltInCommand(#[from] BuiltInError),

    #[error(transparent)]
    Path(#[from] PathError),

    #[error(transparent)]
    Redirection(#[from] RedirectionError),
}

/// Sets up the redirection of the command, then resolves and runs it.
///
/// Errors of the command itself are reported on its standard error and do not fail the run.
/// The redirection target is closed once the command is done, whatever its result.
pub(crate) fn run_command(
    command: &Command,
    config: &ShellConfig,
) -> Result<BuiltInOutcome, RunnerError> {
    let mut streams = match command.redirection() {
        Some(spec) => OutputStreams::redirected(spec)?,
        None => OutputStreams::standard(),
    };

    match dispatch(command, config, &mut streams) {
        Ok(outcome) => Ok(outcome),
        Err(e) => {
            log::debug!("{} failed: {:?}", command.program(), e);
            streams.ewriteln(format_args!("{}", e))?;

            Ok(BuiltInOutcome::Continue)
        }
    }
}

/// Runs a builtin if the program names one, or else the first matching executable of the
/// search path.
fn dispatch(
    command: &Command,
    config: &ShellConfig,
    streams: &mut OutputStreams,
) -> Result<BuiltInOutcome, RunnerError> {
    if let Ok(builtin) = BuiltInCommand::from_str(command.program()) {
        return Ok(builtin.run(command.arguments(), config, streams)?);
    }

    let location = find_in_path(config.search_path(), command.program())
        .ok_or_else(|| PathError::CommandNotFound(command.program().to_owned()))?;

    log::debug!("Running '{}'", location.display());

    run_binary(command.program(), &location, command.arguments(), streams)?;

    Ok(BuiltInOutcome::Continue)
}

#[cfg(test)]
mod tests {
    use super::{run_command, RunnerError};
    use crate::builtin::BuiltInOutcome;
    use crate::config::ShellConfig;
    use crate::parser::{parse_input, Command};
    use crate::redirection::{RedirectionError, RedirectionResolver};

    fn parse(input: &str) -> Command {
        parse_input(input, &RedirectionResolver::new().unwrap())
            .unwrap()
            .unwrap()
    }

    #[test]
    fn it_redirects_builtin_output_then_appends() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("x").join("out.txt");
        let config = ShellConfig::default();

        let outcome =
            run_command(&parse(&format!("echo hi > {}", target.display())), &config).unwrap();
        assert_eq!(BuiltInOutcome::Continue, outcome);
        assert_eq!("hi\n", std::fs::read_to_string(&target).unwrap());

        run_command(&parse(&format!("echo there >> {}", target.display())), &config).unwrap();
        assert_eq!("hi\nthere\n", std::fs::read_to_string(&target).unwrap());

        run_command(&parse(&format!("echo again 1> {}", target.display())), &config).unwrap();
        assert_eq!("again\n", std::fs::read_to_string(&target).unwrap());
    }

    #[test]
    fn it_reports_errors_on_the_redirected_standard_error() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("err.txt");
        let config = ShellConfig::new(vec![dir.path().to_path_buf()], None);

        run_command(
            &parse(&format!("type nonexistent 2> {}", target.display())),
            &config,
        )
        .unwrap();
        run_command(
            &parse(&format!("nonexistent hello 2>> {}", target.display())),
            &config,
        )
        .unwrap();

        assert_eq!(
            "nonexistent: not found\nnonexistent: command not found\n",
            std::fs::read_to_string(&target).unwrap()
        );
    }

    #[test]
    fn it_leaves_other_streams_alone() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("err.txt");

        // Standard output is not redirected, the target is only created.
        run_command(
            &parse(&format!("echo visible 2> {}", target.display())),
            &ShellConfig::default(),
        )
        .unwrap();

        assert_eq!("", std::fs::read_to_string(&target).unwrap());
    }

    #[test]
    fn it_returns_exit_requests() {
        assert_eq!(
            BuiltInOutcome::Exit(42),
            run_command(&parse("exit 42"), &ShellConfig::default()).unwrap()
        );
        assert_eq!(
            BuiltInOutcome::Continue,
            run_command(&parse("exit nope"), &ShellConfig::default()).unwrap()
        );
    }

    #[test]
    fn it_fails_without_running_when_the_target_cannot_be_opened() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("x");
        std::fs::create_dir(&target).unwrap();

        assert!(matches!(
            run_command(
                &parse(&format!("echo hi > {}", target.display())),
                &ShellConfig::default()
            ),
            Err(RunnerError::Redirection(RedirectionError::OpenFailed(..)))
        ));
    }

    #[test]
    #[cfg(unix)]
    fn it_runs_executables_from_the_search_path() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.txt");
        let config = ShellConfig::new(vec!["/bin".into(), "/usr/bin".into()], None);

        run_command(
            &parse(&format!(
                "sh -c 'echo \"from child\"' > {}",
                target.display()
            )),
            &config,
        )
        .unwrap();

        assert_eq!("from child\n", std::fs::read_to_string(&target).unwrap());
    }

    #[test]
    #[cfg(unix)]
    fn it_redirects_the_standard_error_of_executables() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("logs").join("err.txt");
        let config = ShellConfig::new(vec!["/bin".into(), "/usr/bin".into()], None);

        // Only the error stream lands in the file, standard output is inherited.
        run_command(
            &parse(&format!(
                "sh -c 'echo out; echo oops >&2' 2> {}",
                target.display()
            )),
            &config,
        )
        .unwrap();
        assert_eq!("oops\n", std::fs::read_to_string(&target).unwrap());

        run_command(
            &parse(&format!("sh -c 'echo again >&2' 2>> {}", target.display())),
            &config,
        )
        .unwrap();
        assert_eq!("oops\nagain\n", std::fs::read_to_string(&target).unwrap());

        run_command(
            &parse(&format!("sh -c 'echo fresh >&2' 2> {}", target.display())),
            &config,
        )
        .unwrap();
        assert_eq!("fresh\n", std::fs::read_to_string(&target).unwrap());
    }
}
