use crate::autocomplete::Autocomplete;
use crate::terminal::{RawTerminal, TerminalError};
use crossterm::cursor::MoveToColumn;
use crossterm::queue;
use crossterm::style::Print;
use crossterm::terminal::{Clear, ClearType};
use std::io::{Read, Write};
use thiserror::Error;

#[derive(Error, Debug)]
pub(crate) enum EditorError {
    #[error(transparent)]
    Terminal(#[from] TerminalError),

    #[error("Failed to write to the standard output: {0:?}")]
    WriteStdoutFailed(std::io::Error),
}

const CTRL_C: u8 = 0x03;
const CTRL_D: u8 = 0x04;
const BELL: u8 = 0x07;
const CTRL_H: u8 = 0x08;
const TAB: u8 = 0x09;
const LINE_FEED: u8 = 0x0a;
const CARRIAGE_RETURN: u8 = 0x0d;
const ESCAPE: u8 = 0x1b;
const BACKSPACE: u8 = 0x7f;

/// Where the editor is in the lifecycle of one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EditorState {
    Collecting,
    Submitted,

    /// Ctrl-C was pressed, the session is over.
    Interrupted,

    /// The input ended, or Ctrl-D was pressed on an empty line.
    Closed,
}

/// How the terminal must be updated after a keystroke.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Render {
    Nothing,
    Echo(char),
    EraseLastChar,
    Redraw(String),
    Newline,
    Bell,
}

/// The result of editing one line.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum LineOutcome {
    Submitted(String),
    Interrupted,
    Closed,
}

/// Progress through an ANSI escape sequence, e.g. the `ESC [ A` sent by the up arrow.
///
/// `ESC [` and `ESC O` sequences are swallowed up to their final byte. After a lone `ESC` any
/// other byte is handled as usual, and control bytes always abort a pending sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EscapeState {
    None,
    Escape,
    ControlSequence,
}

/// The state machine behind the prompt.
///
/// Feeding bytes through [`LineEditor::step`] never touches the terminal: it returns the
/// [`Render`] to apply, which keeps the displayed line in sync with the buffer.
pub(crate) struct LineEditor<'a> {
    autocomplete: &'a dyn Autocomplete,
    line: Vec<u8>,
    state: EditorState,
    escape: EscapeState,
}

impl<'a> LineEditor<'a> {
    pub(crate) fn new(autocomplete: &'a dyn Autocomplete) -> Self {
        Self {
            autocomplete,
            line: Vec::new(),
            state: EditorState::Collecting,
            escape: EscapeState::None,
        }
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> EditorState {
        self.state
    }

    pub(crate) fn line(&self) -> String {
        String::from_utf8_lossy(&self.line).into_owned()
    }

    /// Applies one input byte.
    pub(crate) fn step(&mut self, byte: u8) -> Render {
        if self.state != EditorState::Collecting {
            return Render::Nothing;
        }

        if self.swallow_escape_sequence(byte) {
            return Render::Nothing;
        }

        match byte {
            CARRIAGE_RETURN | LINE_FEED => {
                self.state = EditorState::Submitted;
                Render::Newline
            }
            CTRL_C => {
                self.state = EditorState::Interrupted;
                Render::Newline
            }
            CTRL_D if self.line.is_empty() => {
                self.state = EditorState::Closed;
                Render::Newline
            }
            BACKSPACE | CTRL_H => match self.line.pop() {
                Some(_) => Render::EraseLastChar,
                None => Render::Nothing,
            },
            TAB => self.complete(),
            ESCAPE => {
                self.escape = EscapeState::Escape;
                Render::Nothing
            }
            b' '..=b'~' => {
                self.line.push(byte);
                Render::Echo(byte as char)
            }
            _ => Render::Nothing,
        }
    }

    /// Marks the end of the input. A pending line is submitted as-is.
    pub(crate) fn close(&mut self) {
        if self.state == EditorState::Collecting {
            self.state = if self.line.is_empty() {
                EditorState::Closed
            } else {
                EditorState::Submitted
            };
        }
    }

    /// Returns the outcome, if the line is done.
    pub(crate) fn outcome(&self) -> Option<LineOutcome> {
        match self.state {
            EditorState::Collecting => None,
            EditorState::Submitted => Some(LineOutcome::Submitted(self.line())),
            EditorState::Interrupted => Some(LineOutcome::Interrupted),
            EditorState::Closed => Some(LineOutcome::Closed),
        }
    }

    /// Replaces the line with its first completion followed by a space.
    fn complete(&mut self) -> Render {
        let completions = self.autocomplete.completions(&self.line());

        match completions.into_iter().next() {
            Some(completion) => {
                self.line = format!("{} ", completion).into_bytes();
                Render::Redraw(self.line())
            }
            None => Render::Bell,
        }
    }

    /// Returns whether the byte belongs to an escape sequence.
    fn swallow_escape_sequence(&mut self, byte: u8) -> bool {
        if byte < b' ' {
            // Ctrl-C, Enter and the like are never part of a sequence.
            self.escape = EscapeState::None;
            return false;
        }

        match self.escape {
            EscapeState::None => false,
            EscapeState::Escape if byte == b'[' || byte == b'O' => {
                self.escape = EscapeState::ControlSequence;
                true
            }
            EscapeState::Escape => {
                self.escape = EscapeState::None;
                false
            }
            EscapeState::ControlSequence => {
                // Parameters and intermediates until the final byte.
                if (0x40..=0x7e).contains(&byte) {
                    self.escape = EscapeState::None;
                }
                true
            }
        }
    }
}

/// Reads one line from the terminal, echoing it to `output` as it is typed.
///
/// The prompt is expected to be displayed already, it is reprinted when the line is redrawn.
pub(crate) fn capture_input<R: Read, W: Write>(
    terminal: &mut RawTerminal<R>,
    output: &mut W,
    prompt: &str,
    autocomplete: &dyn Autocomplete,
) -> Result<LineOutcome, EditorError> {
    let mut editor = LineEditor::new(autocomplete);

    loop {
        if let Some(outcome) = editor.outcome() {
            return Ok(outcome);
        }

        match terminal.read_byte()? {
            Some(byte) => {
                let render = editor.step(byte);
                apply(output, prompt, render).map_err(EditorError::WriteStdoutFailed)?;
            }
            None => editor.close(),
        }
    }
}

/// Outputs the rendering of a keystroke to the terminal.
fn apply<W: Write>(output: &mut W, prompt: &str, render: Render) -> std::io::Result<()> {
    match render {
        Render::Nothing => return Ok(()),
        Render::Echo(character) => queue!(output, Print(character))?,
        Render::EraseLastChar => {
            // Move back, overwrite with a space, and move back again.
            output.write_all(&[CTRL_H, b' ', CTRL_H])?;
        }
        Render::Redraw(line) => queue!(
            output,
            MoveToColumn(0),
            Clear(ClearType::CurrentLine),
            Print(prompt),
            Print(line)
        )?,
        // Raw mode disables output processing, so the carriage return has to be explicit.
        Render::Newline => output.write_all(b"\r\n")?,
        Render::Bell => output.write_all(&[BELL])?,
    }

    output.flush()
}

#[cfg(test)]
mod tests {
    use super::{capture_input, EditorState, LineEditor, LineOutcome, Render};
    use crate::autocomplete::Autocomplete;
    use crate::terminal::RawTerminal;
    use std::collections::BTreeSet;

    struct FixedAutocomplete(&'static [&'static str]);

    impl Autocomplete for FixedAutocomplete {
        fn completions(&self, input: &str) -> BTreeSet<String> {
            self.0
                .iter()
                .filter(|name| name.starts_with(input))
                .map(ToString::to_string)
                .collect()
        }
    }

    static COMMANDS: FixedAutocomplete = FixedAutocomplete(&["exit", "echo", "type"]);

    fn feed(editor: &mut LineEditor, bytes: &[u8]) -> Vec<Render> {
        bytes.iter().map(|byte| editor.step(*byte)).collect()
    }

    #[test]
    fn it_collects_printable_characters() {
        let mut editor = LineEditor::new(&COMMANDS);

        assert_eq!(
            vec![Render::Echo('l'), Render::Echo('s'), Render::Echo(' ')],
            feed(&mut editor, b"ls ")
        );
        assert_eq!("ls ", editor.line());
        assert_eq!(EditorState::Collecting, editor.state());
        assert_eq!(None, editor.outcome());
    }

    #[test]
    fn it_submits_on_enter() {
        for enter in [b'\r', b'\n'] {
            let mut editor = LineEditor::new(&COMMANDS);
            feed(&mut editor, b"pwd");

            assert_eq!(Render::Newline, editor.step(enter));
            assert_eq!(
                Some(LineOutcome::Submitted("pwd".to_owned())),
                editor.outcome()
            );

            // Nothing changes once submitted.
            assert_eq!(Render::Nothing, editor.step(b'x'));
            assert_eq!("pwd", editor.line());
        }
    }

    #[test]
    fn it_erases_characters() {
        let mut editor = LineEditor::new(&COMMANDS);
        feed(&mut editor, b"ab");

        assert_eq!(Render::EraseLastChar, editor.step(0x7f));
        assert_eq!("a", editor.line());
        assert_eq!(Render::EraseLastChar, editor.step(0x08));
        assert_eq!("", editor.line());

        // No-op on an empty line.
        assert_eq!(Render::Nothing, editor.step(0x7f));
        assert_eq!("", editor.line());
    }

    #[test]
    fn it_interrupts_on_ctrl_c() {
        let mut editor = LineEditor::new(&COMMANDS);
        feed(&mut editor, b"echo");

        assert_eq!(Render::Newline, editor.step(0x03));
        assert_eq!(Some(LineOutcome::Interrupted), editor.outcome());
    }

    #[test]
    fn it_closes_on_ctrl_d_only_when_empty() {
        let mut editor = LineEditor::new(&COMMANDS);
        feed(&mut editor, b"a");

        assert_eq!(Render::Nothing, editor.step(0x04));
        assert_eq!(EditorState::Collecting, editor.state());

        feed(&mut editor, &[0x7f]);
        assert_eq!(Render::Newline, editor.step(0x04));
        assert_eq!(Some(LineOutcome::Closed), editor.outcome());
    }

    #[test]
    fn it_completes_with_the_first_match() {
        let mut editor = LineEditor::new(&COMMANDS);
        feed(&mut editor, b"e");

        // "echo" sorts before "exit".
        assert_eq!(Render::Redraw("echo ".to_owned()), editor.step(b'\t'));
        assert_eq!("echo ", editor.line());
        assert_eq!(EditorState::Collecting, editor.state());
    }

    #[test]
    fn it_rings_the_bell_without_completion() {
        let mut editor = LineEditor::new(&COMMANDS);
        feed(&mut editor, b"xyz");

        assert_eq!(Render::Bell, editor.step(b'\t'));
        assert_eq!("xyz", editor.line());
    }

    #[test]
    fn it_ignores_other_bytes() {
        let mut editor = LineEditor::new(&COMMANDS);

        assert_eq!(
            vec![Render::Nothing, Render::Nothing, Render::Nothing],
            feed(&mut editor, &[0x01, 0x00, 0xc3])
        );
        assert_eq!("", editor.line());
    }

    #[test]
    fn it_swallows_escape_sequences() {
        let mut editor = LineEditor::new(&COMMANDS);

        // Up arrow, then Delete (ESC [ 3 ~), then a character.
        feed(&mut editor, b"\x1b[A\x1b[3~x");

        assert_eq!("x", editor.line());

        // A lone escape only drops itself.
        feed(&mut editor, b"\x1ba");
        assert_eq!("xa", editor.line());
    }

    #[test]
    fn it_interrupts_inside_escape_sequences() {
        let mut editor = LineEditor::new(&COMMANDS);
        feed(&mut editor, b"\x1b");

        assert_eq!(Render::Newline, editor.step(0x03));
        assert_eq!(Some(LineOutcome::Interrupted), editor.outcome());

        let mut editor = LineEditor::new(&COMMANDS);
        feed(&mut editor, b"ls\x1b[");

        assert_eq!(Render::Newline, editor.step(0x03));
        assert_eq!(Some(LineOutcome::Interrupted), editor.outcome());
    }

    #[test]
    fn it_submits_inside_escape_sequences() {
        let mut editor = LineEditor::new(&COMMANDS);
        feed(&mut editor, b"ls\x1b[1;");

        assert_eq!(Render::Newline, editor.step(b'\r'));
        assert_eq!(
            Some(LineOutcome::Submitted("ls".to_owned())),
            editor.outcome()
        );
    }

    #[test]
    fn it_captures_a_line_from_the_terminal() {
        let mut terminal = RawTerminal::from_reader(&b"ec\t\x7fhi\rnext"[..]);
        let mut output = Vec::new();

        let outcome = capture_input(&mut terminal, &mut output, "$ ", &COMMANDS).unwrap();

        assert_eq!(LineOutcome::Submitted("echohi".to_owned()), outcome);

        let output = String::from_utf8(output).unwrap();
        assert!(output.starts_with("ec"));
        assert!(output.contains("$ echo "));
        assert!(output.ends_with("\x08 \x08hi\r\n"));
    }

    #[test]
    fn it_submits_pending_input_at_the_end() {
        let mut terminal = RawTerminal::from_reader(&b"pwd"[..]);

        assert_eq!(
            LineOutcome::Submitted("pwd".to_owned()),
            capture_input(&mut terminal, &mut Vec::<u8>::new(), "$ ", &COMMANDS).unwrap()
        );
        assert_eq!(
            LineOutcome::Closed,
            capture_input(&mut terminal, &mut Vec::<u8>::new(), "$ ", &COMMANDS).unwrap()
        );
    }
}
