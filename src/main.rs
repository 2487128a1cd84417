use std::env;
use std::process;

use tinyscm::envir::Env;
use tinyscm::errors::ReadError;
use tinyscm::eval::{eval, eval_file};
use tinyscm::lexer::Lexer;
use tinyscm::parser::read_sexpr;
use tinyscm::reader::{FileReader, StdinReader};
use tinyscm::scheme::root_env;
use tinyscm::types::Sexpr;

fn eval_and_print(sexpr: &Sexpr, env: &mut Env) {
    match eval(sexpr, env) {
        // define, set!, print and friends yield no value worth echoing
        Ok(Sexpr::Undefined) => (),
        Ok(result) => println!("{}", result),
        Err(msg) => println!("Error: {}", msg),
    }
}

fn print_file_ast(filename: &str) -> Result<(), ReadError> {
    let mut lexer = Lexer::new(FileReader::open(filename)?);
    loop {
        match read_sexpr(&mut lexer) {
            Ok(sexpr) => println!("{}", sexpr),
            Err(ReadError::EndOfInput) => return Ok(()),
            Err(err) => return Err(err),
        }
    }
}

fn repl(env: &mut Env, print_ast: bool) {
    let reader = match StdinReader::new() {
        Ok(reader) => reader,
        Err(msg) => {
            eprintln!("Error: {}", msg);
            process::exit(1);
        }
    };
    let mut lexer = Lexer::new(reader);
    loop {
        lexer.begin_expression();
        match read_sexpr(&mut lexer) {
            Ok(ref sexpr) if print_ast => println!("{}", sexpr),
            Ok(ref sexpr) => eval_and_print(sexpr, env),
            // end of input on stdin is a normal exit
            Err(ReadError::EndOfInput) => {
                println!();
                return;
            }
            Err(msg) => {
                println!("Error: {}", msg);
                lexer.reset();
            }
        }
    }
}

fn main() {
    let mut print_ast = false;
    let mut files: Vec<String> = Vec::new();
    for arg in env::args().skip(1) {
        match arg.as_str() {
            "--ast" => print_ast = true,
            _ => files.push(arg),
        }
    }

    let env = &mut root_env();

    for file in &files {
        if print_ast {
            if let Err(msg) = print_file_ast(file) {
                eprintln!("Error: {}", msg);
                process::exit(1);
            }
        } else if let Err(msg) = eval_file(file, env) {
            eprintln!("Error: {}", msg);
            process::exit(1);
        }
    }
    if !files.is_empty() {
        return;
    }

    repl(env, print_ast);
}
