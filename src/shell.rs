use crate::autocomplete::CompositeAutocomplete;
use crate::builtin::BuiltInOutcome;
use crate::config::{ShellConfig, PROMPT};
use crate::editor::{capture_input, EditorError, LineOutcome};
use crate::parser::parse_input;
use crate::redirection::{RedirectionError, RedirectionResolver};
use crate::runner::run_command;
use crate::terminal::{RawTerminal, TerminalError};
use std::io::Write;
use thiserror::Error;

/// Exit status when the session is interrupted with Ctrl-C.
const INTERRUPTED_EXIT_CODE: i32 = 130;

#[derive(Error, Debug)]
pub(crate) enum ShellError {
    #[error(transparent)]
    Terminal(#[from] TerminalError),

    #[error(transparent)]
    Editor(#[from] EditorError),

    #[error("Failed to setup redirections: {0}")]
    Redirection(#[from] RedirectionError),

    #[error("Failed to write the prompt: {0:?}")]
    WritePromptFailed(std::io::Error),
}

/// The read-eval loop, with everything it needs built once up front.
pub(crate) struct Shell {
    config: ShellConfig,
    autocomplete: CompositeAutocomplete,
    redirections: RedirectionResolver,
}

impl Shell {
    pub(crate) fn new(config: ShellConfig) -> Result<Self, ShellError> {
        Ok(Self {
            autocomplete: CompositeAutocomplete::new(&config),
            redirections: RedirectionResolver::new()?,
            config,
        })
    }

    /// Runs commands until the user exits, and returns the exit status of the shell.
    pub(crate) fn run(&self) -> Result<i32, ShellError> {
        loop {
            match self.read_line()? {
                LineOutcome::Submitted(line) => {
                    if let BuiltInOutcome::Exit(code) = self.execute(&line) {
                        return Ok(code);
                    }
                }
                LineOutcome::Interrupted => return Ok(INTERRUPTED_EXIT_CODE),
                LineOutcome::Closed => return Ok(0),
            }
        }
    }

    /// Prints the prompt and reads one line, holding the terminal in raw mode meanwhile.
    fn read_line(&self) -> Result<LineOutcome, ShellError> {
        let mut terminal = RawTerminal::acquire()?;
        let mut stdout = std::io::stdout().lock();

        write!(stdout, "{}", PROMPT).map_err(ShellError::WritePromptFailed)?;
        stdout.flush().map_err(ShellError::WritePromptFailed)?;

        let outcome = if terminal.is_raw() {
            capture_input(&mut terminal, &mut stdout, PROMPT, &self.autocomplete)?
        } else {
            // Input which is not typed in a terminal is not echoed back.
            capture_input(&mut terminal, &mut std::io::sink(), PROMPT, &self.autocomplete)?
        };

        Ok(outcome)
    }

    /// Parses and runs one line. Any error is reported and the loop goes on.
    fn execute(&self, line: &str) -> BuiltInOutcome {
        let command = match parse_input(line, &self.redirections) {
            Ok(Some(command)) => command,
            Ok(None) => return BuiltInOutcome::Continue,
            Err(e) => {
                eprintln!("{}", e);
                return BuiltInOutcome::Continue;
            }
        };

        match run_command(&command, &self.config) {
            Ok(outcome) => outcome,
            Err(e) => {
                eprintln!("{}", e);
                BuiltInOutcome::Continue
            }
        }
    }
}
