use strum_macros::Display;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub(crate) enum TokenizeError {
    #[error("Unterminated {0} quote")]
    UnterminatedQuote(QuoteKind),
}

#[derive(Display, Debug, Clone, Copy, PartialEq, Eq)]
#[strum(serialize_all = "lowercase")]
pub(crate) enum QuoteKind {
    Single,
    Double,
}

const ESCAPE_CHARACTER: char = '\\';
const SINGLE_QUOTE: char = '\'';
const DOUBLE_QUOTE: char = '"';

/// The quoting state threaded through the tokenizer.
///
/// Single and double quoting are never active at the same time: each quote character is taken
/// literally while the other kind of quoting is open.
#[derive(Default, Debug)]
struct QuoteState {
    in_single_quotes: bool,
    in_double_quotes: bool,

    /// A backslash was read and its meaning depends on the next character.
    escaped_pending: bool,
}

impl QuoteState {
    fn is_quoted(&self) -> bool {
        self.in_single_quotes || self.in_double_quotes
    }

    fn open_quote(&self) -> Option<QuoteKind> {
        if self.in_single_quotes {
            Some(QuoteKind::Single)
        } else if self.in_double_quotes {
            Some(QuoteKind::Double)
        } else {
            None
        }
    }
}

/// The token being built.
///
/// A token is started by its first character or by a pair of quotes, so that `''` yields an
/// empty token while runs of whitespace yield none.
#[derive(Default)]
struct TokenBuffer {
    text: String,
    started: bool,
}

impl TokenBuffer {
    fn push(&mut self, char: char) {
        self.text.push(char);
        self.started = true;
    }

    fn start(&mut self) {
        self.started = true;
    }

    fn take(&mut self) -> Option<String> {
        if !self.started {
            return None;
        }

        self.started = false;
        Some(std::mem::take(&mut self.text))
    }
}

/// Split the provided line at whitespaces, taking into account single-quoting, double-quoting,
/// and escaping rules.
///
/// Inside double quotes a backslash only escapes `"` and `\`; before any other character it is
/// kept. A backslash at the very end of the line is dropped.
pub(crate) fn tokenize(input: &str) -> Result<Vec<String>, TokenizeError> {
    let mut tokens = Vec::new();
    let mut current = TokenBuffer::default();
    let mut state = QuoteState::default();

    for char in input.chars() {
        match char {
            SINGLE_QUOTE => {
                if state.escaped_pending && state.in_double_quotes {
                    // `\'` is not an escape sequence within double quotes.
                    current.push(ESCAPE_CHARACTER);
                }

                if state.in_double_quotes || state.escaped_pending {
                    current.push(char);
                } else {
                    state.in_single_quotes = !state.in_single_quotes;
                    current.start();
                }

                state.escaped_pending = false;
            }
            DOUBLE_QUOTE => {
                if state.in_single_quotes || state.escaped_pending {
                    current.push(char);
                } else {
                    state.in_double_quotes = !state.in_double_quotes;
                    current.start();
                }

                state.escaped_pending = false;
            }
            ESCAPE_CHARACTER => {
                if state.in_single_quotes || state.escaped_pending {
                    current.push(char);
                    state.escaped_pending = false;
                } else {
                    state.escaped_pending = true;
                }
            }
            _ if char.is_whitespace() => {
                if state.escaped_pending && state.is_quoted() {
                    current.push(ESCAPE_CHARACTER);
                }

                if state.is_quoted() || state.escaped_pending {
                    current.push(char);
                } else if let Some(token) = current.take() {
                    // Unquoted whitespace ends the current token.
                    tokens.push(token);
                }

                state.escaped_pending = false;
            }
            _ => {
                if state.escaped_pending && state.in_double_quotes {
                    current.push(ESCAPE_CHARACTER);
                }

                current.push(char);
                state.escaped_pending = false;
            }
        }
    }

    if let Some(quote) = state.open_quote() {
        return Err(TokenizeError::UnterminatedQuote(quote));
    }

    if let Some(token) = current.take() {
        tokens.push(token);
    }

    log::trace!("Tokenized {:?} into {:?}", input, tokens);

    Ok(tokens)
}
