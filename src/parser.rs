use crate::errors::ReadError;
use crate::intern::intern;
use crate::lexer::{Lexer, Token};
use crate::reader::Reader;
use crate::types::Sexpr;

/// Read a single S-expression from the token stream.
pub fn read_sexpr<R: Reader>(lexer: &mut Lexer<R>) -> Result<Sexpr, ReadError> {
    let token = lexer.next_token()?;
    datum(lexer, token)
}

fn datum<R: Reader>(lexer: &mut Lexer<R>, token: Token) -> Result<Sexpr, ReadError> {
    match token {
        Token::LeftParen => {
            let (line, column) = lexer.token_position();
            read_list(lexer, line, column)
        }
        // the quote-tick rewrite happens at read time
        Token::Quote => {
            let quoted = read_sexpr(lexer)?;
            Ok(Sexpr::list(vec![Sexpr::symbol("quote"), quoted]))
        }
        Token::Integer(number) => Ok(Sexpr::Integer(number)),
        Token::Float(number) => Ok(Sexpr::Float(number)),
        Token::Boolean(true) => Ok(Sexpr::True),
        Token::Boolean(false) => Ok(Sexpr::False),
        Token::Str(value) => Ok(Sexpr::String(value)),
        Token::Symbol(ref name) if name == "nil" => Ok(Sexpr::Nil),
        Token::Symbol(name) => Ok(Sexpr::Symbol(intern(&name))),
        unexpected => Err(unexpected_token(lexer, &unexpected)),
    }
}

fn read_list<R: Reader>(
    lexer: &mut Lexer<R>,
    line: usize,
    column: usize,
) -> Result<Sexpr, ReadError> {
    let mut items = Vec::new();
    loop {
        let token = match lexer.next_token() {
            Err(ReadError::EndOfInput) => return Err(ReadError::Unclosed { line, column }),
            other => other?,
        };
        match token {
            Token::RightParen => return Ok(Sexpr::list(items)),
            Token::Dot if !items.is_empty() => {
                let tail = match lexer.next_token() {
                    Err(ReadError::EndOfInput) => {
                        return Err(ReadError::Unclosed { line, column })
                    }
                    other => datum(lexer, other?)?,
                };
                return match lexer.next_token() {
                    Ok(Token::RightParen) => Ok(Sexpr::dotted_list(items, tail)),
                    Ok(token) => Err(unexpected_token(lexer, &token)),
                    Err(ReadError::EndOfInput) => Err(ReadError::Unclosed { line, column }),
                    Err(err) => Err(err),
                };
            }
            other => items.push(datum(lexer, other)?),
        }
    }
}

fn unexpected_token<R: Reader>(lexer: &Lexer<R>, token: &Token) -> ReadError {
    let (line, column) = lexer.token_position();
    ReadError::Unexpected {
        token: token.to_string(),
        line,
        column,
    }
}
