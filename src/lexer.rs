use std::fmt;

use crate::errors::ReadError;
use crate::reader::Reader;
use crate::types::{Flt, Int};

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    LeftParen,
    RightParen,
    Quote,
    Backquote,
    Unquote,
    UnquoteSplicing,
    Dot,
    Integer(Int),
    Float(Flt),
    Boolean(bool),
    Str(String),
    Symbol(String),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Token::*;
        match self {
            LeftParen => write!(f, "("),
            RightParen => write!(f, ")"),
            Quote => write!(f, "'"),
            Backquote => write!(f, "`"),
            Unquote => write!(f, ","),
            UnquoteSplicing => write!(f, ",@"),
            Dot => write!(f, "."),
            Integer(value) => value.fmt(f),
            Float(value) => value.fmt(f),
            Boolean(true) => write!(f, "#t"),
            Boolean(false) => write!(f, "#f"),
            Str(value) => write!(f, "\"{}\"", value),
            Symbol(name) => write!(f, "{}", name),
        }
    }
}

/// Turns a character source into a token stream, tracking 1-based line and
/// column positions for diagnostics.
pub struct Lexer<R> {
    reader: R,
    peeked: Option<Token>,
    line: usize,
    column: usize,
    token_line: usize,
    token_column: usize,
}

impl<R: Reader> Lexer<R> {
    pub fn new(reader: R) -> Self {
        Lexer {
            reader,
            peeked: None,
            line: 1,
            column: 0,
            token_line: 1,
            token_column: 1,
        }
    }

    /// Position where the most recently scanned token started.
    pub fn token_position(&self) -> (usize, usize) {
        (self.token_line, self.token_column)
    }

    /// The next read starts a fresh top-level expression.
    pub fn begin_expression(&mut self) {
        self.reader.begin_expression();
    }

    /// Drop any buffered token and input, back to a clean prompt.
    pub fn reset(&mut self) {
        self.peeked = None;
        self.reader.discard();
    }

    pub fn peek_token(&mut self) -> Result<&Token, ReadError> {
        if self.peeked.is_none() {
            self.peeked = Some(self.scan()?);
        }
        Ok(self.peeked.as_ref().unwrap())
    }

    pub fn next_token(&mut self) -> Result<Token, ReadError> {
        match self.peeked.take() {
            Some(token) => Ok(token),
            None => self.scan(),
        }
    }

    fn advance(&mut self) -> Result<char, ReadError> {
        let ch = self.reader.next()?;
        if ch == '\n' {
            self.line += 1;
            self.column = 0;
        } else {
            self.column += 1;
        }
        Ok(ch)
    }

    fn scan(&mut self) -> Result<Token, ReadError> {
        self.skip_blank()?;
        self.token_line = self.line;
        self.token_column = self.column + 1;

        let ch = self.advance()?;
        match ch {
            '(' | '[' => Ok(Token::LeftParen),
            ')' | ']' => Ok(Token::RightParen),
            '\'' => Ok(Token::Quote),
            '`' => Ok(Token::Backquote),
            ',' => {
                if self.reader.peek() == Ok('@') {
                    self.advance()?;
                    Ok(Token::UnquoteSplicing)
                } else {
                    Ok(Token::Unquote)
                }
            }
            '"' => self.scan_string(),
            _ => self.scan_word(ch),
        }
    }

    /// Skip whitespace and `;` comments (consumed to end of line).
    fn skip_blank(&mut self) -> Result<(), ReadError> {
        loop {
            match self.reader.peek() {
                Ok(c) if c.is_whitespace() => {
                    self.advance()?;
                }
                Ok(';') => loop {
                    match self.advance() {
                        Ok('\n') => break,
                        Ok(_) => (),
                        Err(ReadError::EndOfInput) => return Ok(()),
                        Err(err) => return Err(err),
                    }
                },
                Ok(_) => return Ok(()),
                Err(ReadError::EndOfInput) => return Ok(()),
                Err(err) => return Err(err),
            }
        }
    }

    fn scan_string(&mut self) -> Result<Token, ReadError> {
        let unterminated = |line: usize, column: usize| ReadError::UnterminatedString { line, column };
        let (line, column) = (self.token_line, self.token_column);
        let mut value = String::new();
        loop {
            match self.advance() {
                Err(ReadError::EndOfInput) => return Err(unterminated(line, column)),
                Err(err) => return Err(err),
                Ok('"') => return Ok(Token::Str(value)),
                Ok('\\') => match self.advance() {
                    Err(ReadError::EndOfInput) => return Err(unterminated(line, column)),
                    Err(err) => return Err(err),
                    Ok('n') => value.push('\n'),
                    Ok(ch) => value.push(ch),
                },
                Ok(ch) => value.push(ch),
            }
        }
    }

    fn scan_word(&mut self, first: char) -> Result<Token, ReadError> {
        let mut word = String::new();
        word.push(first);
        loop {
            match self.reader.peek() {
                Ok(c) if is_word_boundary(c) => break,
                Ok(_) => word.push(self.advance()?),
                Err(ReadError::EndOfInput) => break,
                Err(err) => return Err(err),
            }
        }
        self.classify(word)
    }

    fn classify(&self, word: String) -> Result<Token, ReadError> {
        match word.as_str() {
            "." => return Ok(Token::Dot),
            "#t" => return Ok(Token::Boolean(true)),
            "#f" => return Ok(Token::Boolean(false)),
            _ => (),
        }
        if word.eq_ignore_ascii_case("true") {
            return Ok(Token::Boolean(true));
        }
        if word.eq_ignore_ascii_case("false") {
            return Ok(Token::Boolean(false));
        }
        if looks_numeric(&word) {
            if let Ok(number) = word.parse::<Int>() {
                return Ok(Token::Integer(number));
            }
            if let Ok(number) = word.parse::<Flt>() {
                return Ok(Token::Float(number));
            }
            return Err(ReadError::BadNumber {
                text: word,
                line: self.token_line,
                column: self.token_column,
            });
        }
        if word.starts_with('#') {
            return Err(ReadError::Unexpected {
                token: word,
                line: self.token_line,
                column: self.token_column,
            });
        }
        Ok(Token::Symbol(word))
    }
}

#[inline]
fn is_word_boundary(c: char) -> bool {
    c.is_whitespace() || matches!(c, '(' | ')' | '[' | ']' | '\'' | '`' | ',' | '"' | ';')
}

/// A word starting with a digit, or a sign or dot directly followed by a
/// digit, must parse as a number; `+`, `-`, `...` and the like stay symbols.
fn looks_numeric(word: &str) -> bool {
    let mut chars = word.chars();
    match chars.next() {
        Some('0'..='9') => true,
        Some('.') => matches!(chars.next(), Some('0'..='9')),
        Some('+') | Some('-') => match chars.next() {
            Some('0'..='9') => true,
            Some('.') => matches!(chars.next(), Some('0'..='9')),
            _ => false,
        },
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::{Lexer, Token};
    use crate::errors::ReadError;
    use crate::reader::StringReader;

    fn lexer(text: &str) -> Lexer<StringReader> {
        Lexer::new(StringReader::from(text))
    }

    fn tokens(text: &str) -> Vec<Token> {
        let mut lexer = lexer(text);
        let mut result = Vec::new();
        loop {
            match lexer.next_token() {
                Ok(token) => result.push(token),
                Err(ReadError::EndOfInput) => return result,
                Err(err) => panic!("unexpected error: {}", err),
            }
        }
    }

    #[test]
    fn parens_and_atoms() {
        assert_eq!(
            tokens("(+ 1 2.5)"),
            vec![
                Token::LeftParen,
                Token::Symbol(String::from("+")),
                Token::Integer(1),
                Token::Float(2.5),
                Token::RightParen,
            ]
        );
    }

    #[test]
    fn square_brackets_read_as_parens() {
        assert_eq!(
            tokens("[1 2]"),
            vec![
                Token::LeftParen,
                Token::Integer(1),
                Token::Integer(2),
                Token::RightParen,
            ]
        );
    }

    #[test]
    fn booleans() {
        assert_eq!(
            tokens("#t #f true False"),
            vec![
                Token::Boolean(true),
                Token::Boolean(false),
                Token::Boolean(true),
                Token::Boolean(false),
            ]
        );
    }

    #[test]
    fn numbers() {
        assert_eq!(tokens("42"), vec![Token::Integer(42)]);
        assert_eq!(tokens("-1"), vec![Token::Integer(-1)]);
        assert_eq!(tokens("3.14"), vec![Token::Float(3.14)]);
        assert_eq!(tokens("-.5"), vec![Token::Float(-0.5)]);
        assert_eq!(tokens("-5e-6"), vec![Token::Float(-5e-6)]);
    }

    #[test]
    fn signs_and_dots_stay_symbols() {
        assert_eq!(
            tokens("+ - ..."),
            vec![
                Token::Symbol(String::from("+")),
                Token::Symbol(String::from("-")),
                Token::Symbol(String::from("...")),
            ]
        );
        assert_eq!(tokens("."), vec![Token::Dot]);
    }

    #[test]
    fn malformed_number() {
        let mut lexer = lexer("  1.2.3");
        assert_eq!(
            lexer.next_token(),
            Err(ReadError::BadNumber {
                text: String::from("1.2.3"),
                line: 1,
                column: 3,
            })
        );
    }

    #[test]
    fn symbols_preserve_case() {
        assert_eq!(
            tokens("Foo set! foo-bar?"),
            vec![
                Token::Symbol(String::from("Foo")),
                Token::Symbol(String::from("set!")),
                Token::Symbol(String::from("foo-bar?")),
            ]
        );
    }

    #[test]
    fn quote_ticks() {
        assert_eq!(
            tokens("'foo `x ,y ,@z"),
            vec![
                Token::Quote,
                Token::Symbol(String::from("foo")),
                Token::Backquote,
                Token::Symbol(String::from("x")),
                Token::Unquote,
                Token::Symbol(String::from("y")),
                Token::UnquoteSplicing,
                Token::Symbol(String::from("z")),
            ]
        );
    }

    #[test]
    fn strings_with_escapes() {
        assert_eq!(
            tokens(r#""hello world""#),
            vec![Token::Str(String::from("hello world"))]
        );
        assert_eq!(
            tokens(r#""say \"hi\"\n""#),
            vec![Token::Str(String::from("say \"hi\"\n"))]
        );
    }

    #[test]
    fn unterminated_string() {
        let mut lexer = lexer("\n \"oops");
        assert_eq!(
            lexer.next_token(),
            Err(ReadError::UnterminatedString { line: 2, column: 2 })
        );
    }

    #[test]
    fn comments_are_skipped() {
        assert_eq!(
            tokens("1 ; the rest is noise (2 3\n4"),
            vec![Token::Integer(1), Token::Integer(4)]
        );
        assert_eq!(tokens(";; nothing here"), vec![]);
    }

    #[test]
    fn positions_track_lines() {
        let mut lexer = lexer("(a\n   b)");
        assert_eq!(lexer.next_token(), Ok(Token::LeftParen));
        assert_eq!(lexer.token_position(), (1, 1));
        assert_eq!(lexer.next_token(), Ok(Token::Symbol(String::from("a"))));
        assert_eq!(lexer.token_position(), (1, 2));
        assert_eq!(lexer.next_token(), Ok(Token::Symbol(String::from("b"))));
        assert_eq!(lexer.token_position(), (2, 4));
    }

    #[test]
    fn peek_does_not_consume() {
        let mut lexer = lexer("1 2");
        assert_eq!(lexer.peek_token(), Ok(&Token::Integer(1)));
        assert_eq!(lexer.peek_token(), Ok(&Token::Integer(1)));
        assert_eq!(lexer.next_token(), Ok(Token::Integer(1)));
        assert_eq!(lexer.next_token(), Ok(Token::Integer(2)));
        assert_eq!(lexer.next_token(), Err(ReadError::EndOfInput));
    }
}
