use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::iter::Peekable;
use std::vec::IntoIter;

use rustyline::{Config, DefaultEditor};

use crate::errors::ReadError;

pub const PROMPT: &str = "scm> ";

/// A character source feeding the tokenizer. Interactive sources use the
/// two hooks to manage the prompt and to drop buffered input after an
/// error; for other sources they are no-ops.
pub trait Reader {
    fn peek(&mut self) -> Result<char, ReadError>;
    fn next(&mut self) -> Result<char, ReadError>;

    /// The next read starts a fresh top-level expression.
    fn begin_expression(&mut self) {}

    /// Discard any buffered input, back to a clean prompt.
    fn discard(&mut self) {}
}

pub struct StringReader {
    cache: Peekable<IntoIter<char>>,
}

impl StringReader {
    pub fn from(s: &str) -> StringReader {
        StringReader {
            cache: s.chars().collect::<Vec<_>>().into_iter().peekable(),
        }
    }

    fn empty() -> StringReader {
        StringReader::from("")
    }
}

impl Reader for StringReader {
    #[inline]
    fn peek(&mut self) -> Result<char, ReadError> {
        self.cache.peek().ok_or(ReadError::EndOfInput).copied()
    }

    #[inline]
    fn next(&mut self) -> Result<char, ReadError> {
        self.cache.next().ok_or(ReadError::EndOfInput)
    }
}

pub struct FileReader {
    lines: Lines<BufReader<File>>,
    iter: StringReader,
}

impl FileReader {
    /// Open `filename`, retrying with an `.scm` suffix when the bare name
    /// does not exist.
    pub fn open(filename: &str) -> Result<Self, ReadError> {
        let file = match File::open(filename) {
            Ok(file) => file,
            Err(err) if !filename.ends_with(".scm") => {
                File::open(format!("{}.scm", filename))
                    .map_err(|_| ReadError::Io(err.to_string()))?
            }
            Err(err) => return Err(ReadError::Io(err.to_string())),
        };
        Ok(FileReader {
            lines: BufReader::new(file).lines(),
            iter: StringReader::empty(),
        })
    }

    fn next_line(lines: &mut Lines<BufReader<File>>) -> Result<StringReader, ReadError> {
        match lines.next() {
            Some(Ok(line)) => Ok(StringReader::from(&format!("{}\n", line))),
            Some(Err(msg)) => Err(ReadError::Io(msg.to_string())),
            None => Err(ReadError::EndOfInput),
        }
    }
}

impl Reader for FileReader {
    fn next(&mut self) -> Result<char, ReadError> {
        loop {
            match self.iter.next() {
                Err(ReadError::EndOfInput) => self.iter = FileReader::next_line(&mut self.lines)?,
                result => return result,
            }
        }
    }

    fn peek(&mut self) -> Result<char, ReadError> {
        loop {
            match self.iter.peek() {
                Err(ReadError::EndOfInput) => self.iter = FileReader::next_line(&mut self.lines)?,
                result => return result,
            }
        }
    }
}

pub struct StdinReader {
    editor: DefaultEditor,
    buffer: StringReader,
    fresh: bool,
}

impl StdinReader {
    pub fn new() -> Result<Self, ReadError> {
        let config = Config::builder().auto_add_history(true).build();
        let editor = DefaultEditor::with_config(config).map_err(ReadError::from)?;
        Ok(StdinReader {
            editor,
            buffer: StringReader::empty(),
            fresh: true,
        })
    }

    fn next_line(&mut self) -> Result<StringReader, ReadError> {
        // Continuation lines of a multi-line expression get a blank prompt
        // of the same width.
        let prompt = if self.fresh { PROMPT } else { "     " };
        self.fresh = false;
        match self.editor.readline(prompt) {
            Ok(line) => Ok(StringReader::from(&format!("{}\n", line))),
            Err(err) => Err(err.into()),
        }
    }
}

impl Reader for StdinReader {
    fn next(&mut self) -> Result<char, ReadError> {
        loop {
            match self.buffer.next() {
                Err(ReadError::EndOfInput) => self.buffer = self.next_line()?,
                result => return result,
            }
        }
    }

    fn peek(&mut self) -> Result<char, ReadError> {
        loop {
            match self.buffer.peek() {
                Err(ReadError::EndOfInput) => self.buffer = self.next_line()?,
                result => return result,
            }
        }
    }

    fn begin_expression(&mut self) {
        self.fresh = true;
    }

    fn discard(&mut self) {
        self.buffer = StringReader::empty();
        self.fresh = true;
    }
}
