use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use std::io::{IsTerminal, Read, StdinLock};
use thiserror::Error;

#[derive(Error, Debug)]
pub(crate) enum TerminalError {
    #[error("Failed to setup raw terminal access: {0:?}")]
    SetupFailed(std::io::Error),

    #[error("Failed to read from the standard input: {0:?}")]
    ReadFailed(std::io::Error),
}

/// Byte-level access to the input of the shell.
///
/// When reading from a terminal, raw mode is enabled for as long as this value lives: input is
/// neither echoed nor line-buffered, and control characters such as Ctrl-C arrive as plain
/// bytes. The previous mode is restored on drop.
pub(crate) struct RawTerminal<R: Read> {
    input: R,
    raw_mode: bool,
}

impl RawTerminal<StdinLock<'static>> {
    /// Takes control of the standard input.
    ///
    /// Raw mode is only enabled if the standard input is a terminal, so the shell can still be
    /// driven through a pipe.
    pub(crate) fn acquire() -> Result<Self, TerminalError> {
        let stdin = std::io::stdin();
        let raw_mode = stdin.is_terminal();

        if raw_mode {
            enable_raw_mode().map_err(TerminalError::SetupFailed)?;
        } else {
            log::debug!("Standard input is not a terminal, reading it as-is");
        }

        Ok(Self {
            input: stdin.lock(),
            raw_mode,
        })
    }
}

impl<R: Read> RawTerminal<R> {
    /// Reads from an arbitrary source, without touching the terminal mode.
    #[cfg(test)]
    pub(crate) fn from_reader(input: R) -> Self {
        Self {
            input,
            raw_mode: false,
        }
    }

    /// Whether keystrokes have to be echoed by the shell itself.
    pub(crate) fn is_raw(&self) -> bool {
        self.raw_mode
    }

    /// Blocks until one byte is available. Returns `None` at the end of the input.
    pub(crate) fn read_byte(&mut self) -> Result<Option<u8>, TerminalError> {
        let mut buffer = [0u8; 1];

        loop {
            match self.input.read(&mut buffer) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(buffer[0])),
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(TerminalError::ReadFailed(e)),
            }
        }
    }
}

impl<R: Read> Drop for RawTerminal<R> {
    fn drop(&mut self) {
        if self.raw_mode {
            if let Err(e) = disable_raw_mode() {
                log::error!("Failed to restore the terminal mode: {}", e);
            }
        }
    }
}
