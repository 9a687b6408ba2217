use crate::redirection::{RedirectionResolver, RedirectionSpec};
use crate::tokenizer::{tokenize, TokenizeError};
use thiserror::Error;

#[derive(Error, Debug)]
pub(crate) enum ParsingError {
    #[error(transparent)]
    Tokenize(#[from] TokenizeError),

    #[error("Expected a program name")]
    ProgramExpected,
}

/// A command with its arguments and optional output redirection.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct Command {
    program: String,
    arguments: Vec<String>,
    redirection: Option<RedirectionSpec>,
}

impl Command {
    fn new(program: String, arguments: Vec<String>, redirection: Option<RedirectionSpec>) -> Self {
        Self {
            program,
            arguments,
            redirection,
        }
    }

    pub(crate) fn program(&self) -> &str {
        &self.program
    }

    pub(crate) fn arguments(&self) -> &[String] {
        &self.arguments
    }

    pub(crate) fn redirection(&self) -> Option<&RedirectionSpec> {
        self.redirection.as_ref()
    }
}

/// Parses a line into a command. Blank lines yield no command.
pub(crate) fn parse_input(
    input: &str,
    redirections: &RedirectionResolver,
) -> Result<Option<Command>, ParsingError> {
    let mut tokens = tokenize(input)?;

    if tokens.is_empty() {
        return Ok(None);
    }

    let redirection = redirections.extract(&mut tokens);

    let mut tokens = tokens.into_iter();
    let program = match tokens.next() {
        Some(program) if !program.is_empty() => program,
        // A redirection alone, or an empty quoted program name.
        _ => return Err(ParsingError::ProgramExpected),
    };

    log::debug!("Parsed command '{}' ({:?})", program, redirection);

    Ok(Some(Command::new(program, tokens.collect(), redirection)))
}
