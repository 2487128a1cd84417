use std::io::Write;
use std::process;
use std::rc::Rc;

use super::utils::*;
use crate::envir::Env;
use crate::errors::Error;
use crate::eval::{apply, eval, eval_file, force_value};
use crate::list::Pair;
use crate::types::{EvalResult, Int, Sexpr};

pub fn cons(args: &[Sexpr], _env: &mut Env) -> EvalResult {
    let (car, cdr) = two_args(args, "cons")?;
    Ok(Sexpr::cons(car.clone(), cdr.clone()))
}

pub fn car(args: &[Sexpr], _env: &mut Env) -> EvalResult {
    let pair = pair_arg(one_arg(args, "car")?, 0, "car")?;
    Ok(pair.car.clone())
}

pub fn cdr(args: &[Sexpr], _env: &mut Env) -> EvalResult {
    let pair = pair_arg(one_arg(args, "cdr")?, 0, "cdr")?;
    Ok(pair.cdr.clone())
}

pub fn list(args: &[Sexpr], _env: &mut Env) -> EvalResult {
    Ok(Sexpr::list(args.to_vec()))
}

pub fn length(args: &[Sexpr], _env: &mut Env) -> EvalResult {
    let items = list_arg(one_arg(args, "length")?, 0, "length")?;
    Ok(Sexpr::Integer(items.len() as Int))
}

pub fn append(args: &[Sexpr], _env: &mut Env) -> EvalResult {
    let (last, rest) = match args.split_last() {
        Some(split) => split,
        None => return Ok(Sexpr::Nil),
    };
    // the last argument becomes the tail and may be any value
    let mut result = last.clone();
    for (index, value) in rest.iter().enumerate().rev() {
        let items = list_arg(value, index, "append")?;
        result = Sexpr::dotted_list(items, result);
    }
    Ok(result)
}

pub fn not(args: &[Sexpr], _env: &mut Env) -> EvalResult {
    Ok(Sexpr::from(!one_arg(args, "not")?.is_true()))
}

/// Identity comparison: interned symbols and numbers by value, compound
/// values by reference.
fn eq_identity(lhs: &Sexpr, rhs: &Sexpr) -> bool {
    use Sexpr::*;
    match (lhs, rhs) {
        (Symbol(a), Symbol(b)) => a == b,
        (Integer(a), Integer(b)) => a == b,
        (Float(a), Float(b)) => a == b,
        (True, True) | (False, False) | (Nil, Nil) | (Undefined, Undefined) => true,
        (String(a), String(b)) => a == b,
        (Pair(a), Pair(b)) => Rc::ptr_eq(a, b),
        (Func(a), Func(b)) => a.func as usize == b.func as usize,
        (Lambda(a), Lambda(b)) => Rc::ptr_eq(a, b),
        (Dlambda(a), Dlambda(b)) => Rc::ptr_eq(a, b),
        (Macro(a), Macro(b)) => Rc::ptr_eq(a, b),
        (Promise(a), Promise(b)) => Rc::ptr_eq(a, b),
        _ => false,
    }
}

pub fn is_eq(args: &[Sexpr], _env: &mut Env) -> EvalResult {
    let (lhs, rhs) = two_args(args, "eq?")?;
    Ok(Sexpr::from(eq_identity(lhs, rhs)))
}

pub fn is_eqv(args: &[Sexpr], _env: &mut Env) -> EvalResult {
    let (lhs, rhs) = two_args(args, "eqv?")?;
    // eqv? additionally equates numbers across exactness
    let same = if lhs.is_number() && rhs.is_number() {
        lhs == rhs
    } else {
        eq_identity(lhs, rhs)
    };
    Ok(Sexpr::from(same))
}

pub fn is_equal(args: &[Sexpr], _env: &mut Env) -> EvalResult {
    let (lhs, rhs) = two_args(args, "equal?")?;
    Ok(Sexpr::from(lhs == rhs))
}

pub fn is_atom(args: &[Sexpr], _env: &mut Env) -> EvalResult {
    use Sexpr::*;
    Ok(Sexpr::from(matches!(
        one_arg(args, "atom?")?,
        True | False | Integer(_) | Float(_) | Symbol(_) | Nil | String(_)
    )))
}

pub fn is_boolean(args: &[Sexpr], _env: &mut Env) -> EvalResult {
    Ok(Sexpr::from(matches!(
        one_arg(args, "boolean?")?,
        Sexpr::True | Sexpr::False
    )))
}

pub fn is_list(args: &[Sexpr], _env: &mut Env) -> EvalResult {
    Ok(Sexpr::from(one_arg(args, "list?")?.is_list()))
}

pub fn is_null(args: &[Sexpr], _env: &mut Env) -> EvalResult {
    Ok(Sexpr::from(matches!(one_arg(args, "null?")?, Sexpr::Nil)))
}

pub fn is_pair(args: &[Sexpr], _env: &mut Env) -> EvalResult {
    Ok(Sexpr::from(matches!(
        one_arg(args, "pair?")?,
        Sexpr::Pair(_)
    )))
}

pub fn is_procedure(args: &[Sexpr], _env: &mut Env) -> EvalResult {
    Ok(Sexpr::from(matches!(
        one_arg(args, "procedure?")?,
        Sexpr::Func(_) | Sexpr::Lambda(_) | Sexpr::Dlambda(_) | Sexpr::Macro(_)
    )))
}

pub fn is_promise(args: &[Sexpr], _env: &mut Env) -> EvalResult {
    Ok(Sexpr::from(matches!(
        one_arg(args, "promise?")?,
        Sexpr::Promise(_)
    )))
}

pub fn is_string(args: &[Sexpr], _env: &mut Env) -> EvalResult {
    Ok(Sexpr::from(matches!(
        one_arg(args, "string?")?,
        Sexpr::String(_)
    )))
}

pub fn is_symbol(args: &[Sexpr], _env: &mut Env) -> EvalResult {
    Ok(Sexpr::from(matches!(
        one_arg(args, "symbol?")?,
        Sexpr::Symbol(_)
    )))
}

/// Join values for `print`, quoting strings so output reads back.
fn join(args: &[Sexpr]) -> String {
    args.iter()
        .map(|value| value.to_string())
        .collect::<Vec<String>>()
        .join(" ")
}

/// Join values for `display`, strings shown raw without quotes.
fn join_raw(args: &[Sexpr]) -> String {
    args.iter()
        .map(|value| match value {
            Sexpr::String(text) => text.clone(),
            other => other.to_string(),
        })
        .collect::<Vec<String>>()
        .join(" ")
}

pub fn print(args: &[Sexpr], _env: &mut Env) -> EvalResult {
    println!("{}", join(args));
    Ok(Sexpr::Undefined)
}

pub fn display(args: &[Sexpr], _env: &mut Env) -> EvalResult {
    print!("{}", join_raw(args));
    let _ = std::io::stdout().flush();
    Ok(Sexpr::Undefined)
}

pub fn displayln(args: &[Sexpr], _env: &mut Env) -> EvalResult {
    println!("{}", join_raw(args));
    Ok(Sexpr::Undefined)
}

pub fn newline(args: &[Sexpr], _env: &mut Env) -> EvalResult {
    if !args.is_empty() {
        return Err(Error::wrong_arg_num("newline"));
    }
    println!();
    Ok(Sexpr::Undefined)
}

pub fn raise_error(args: &[Sexpr], _env: &mut Env) -> EvalResult {
    Err(Error::Custom(join(args)))
}

pub fn exit(args: &[Sexpr], _env: &mut Env) -> EvalResult {
    if !args.is_empty() {
        return Err(Error::wrong_arg_num("exit"));
    }
    process::exit(0);
}

pub fn load(args: &[Sexpr], env: &mut Env) -> EvalResult {
    if args.is_empty() {
        return Err(Error::wrong_arg_num("load"));
    }
    let mut last = Sexpr::Undefined;
    for (index, value) in args.iter().enumerate() {
        match value {
            Sexpr::String(filename) => last = eval_file(filename, env)?,
            other => return Err(Error::wrong_type(index, "load", other)),
        }
    }
    Ok(last)
}

pub fn evalfn(args: &[Sexpr], env: &mut Env) -> EvalResult {
    eval(one_arg(args, "eval")?, env)
}

pub fn applyfn(args: &[Sexpr], env: &mut Env) -> EvalResult {
    let (operator, operands) = two_args(args, "apply")?;
    procedure_arg(operator, 0, "apply")?;
    let items = list_arg(operands, 1, "apply")?;
    apply(operator, &items, env)
}

pub fn map(args: &[Sexpr], env: &mut Env) -> EvalResult {
    let (operator, items) = two_args(args, "map")?;
    procedure_arg(operator, 0, "map")?;
    let items = list_arg(items, 1, "map")?;
    let mut result = Vec::with_capacity(items.len());
    for item in items {
        result.push(apply(operator, &[item], env)?);
    }
    Ok(Sexpr::list(result))
}

pub fn filter(args: &[Sexpr], env: &mut Env) -> EvalResult {
    let (predicate, items) = two_args(args, "filter")?;
    procedure_arg(predicate, 0, "filter")?;
    let items = list_arg(items, 1, "filter")?;
    let mut result = Vec::new();
    for item in items {
        if apply(predicate, &[item.clone()], env)?.is_true() {
            result.push(item);
        }
    }
    Ok(Sexpr::list(result))
}

pub fn reduce(args: &[Sexpr], env: &mut Env) -> EvalResult {
    let (operator, items) = two_args(args, "reduce")?;
    procedure_arg(operator, 0, "reduce")?;
    if matches!(items, Sexpr::Nil) {
        return Err(Error::wrong_type(1, "reduce", items));
    }
    let items = list_arg(items, 1, "reduce")?;
    reduce_iter(operator, &items[0], &items[1..], env)
}

fn reduce_iter(operator: &Sexpr, initial: &Sexpr, items: &[Sexpr], env: &mut Env) -> EvalResult {
    match items.split_first() {
        None => Ok(initial.clone()),
        Some((first, rest)) => {
            let folded = reduce_iter(operator, initial, rest, env)?;
            apply(operator, &[first.clone(), folded], env)
        }
    }
}

pub fn force(args: &[Sexpr], _env: &mut Env) -> EvalResult {
    force_value(one_arg(args, "force")?)
}

/// A stream pair is a pair whose cdr is a promise.
fn stream_arg<'a>(value: &'a Sexpr, index: usize, name: &str) -> Result<&'a Pair, Error> {
    match value {
        Sexpr::Pair(pair) if matches!(pair.cdr, Sexpr::Promise(_)) => Ok(pair),
        other => Err(Error::wrong_type(index, name, other)),
    }
}

pub fn stream_car(args: &[Sexpr], _env: &mut Env) -> EvalResult {
    let pair = stream_arg(one_arg(args, "stream-car")?, 0, "stream-car")?;
    Ok(pair.car.clone())
}

pub fn stream_cdr(args: &[Sexpr], _env: &mut Env) -> EvalResult {
    let pair = stream_arg(one_arg(args, "stream-cdr")?, 0, "stream-cdr")?;
    force_value(&pair.cdr)
}

pub fn is_stream_null(args: &[Sexpr], _env: &mut Env) -> EvalResult {
    Ok(Sexpr::from(matches!(
        one_arg(args, "stream-null?")?,
        Sexpr::Nil
    )))
}

pub fn is_stream_pair(args: &[Sexpr], _env: &mut Env) -> EvalResult {
    let value = one_arg(args, "stream-pair?")?;
    Ok(Sexpr::from(stream_arg(value, 0, "stream-pair?").is_ok()))
}

// The stream map/filter/reduce family realizes its whole result at once;
// it terminates only on finite streams.

pub fn stream_map(args: &[Sexpr], env: &mut Env) -> EvalResult {
    let (operator, stream) = two_args(args, "stream-map")?;
    procedure_arg(operator, 0, "stream-map")?;
    stream_arg(stream, 1, "stream-map")?;
    stream_map_iter(operator, stream, env)
}

fn stream_map_iter(operator: &Sexpr, stream: &Sexpr, env: &mut Env) -> EvalResult {
    if matches!(stream, Sexpr::Nil) {
        return Ok(Sexpr::Nil);
    }
    let pair = stream_arg(stream, 1, "stream-map")?;
    let head = apply(operator, &[pair.car.clone()], env)?;
    let rest = force_value(&pair.cdr)?;
    Ok(Sexpr::cons(head, stream_map_iter(operator, &rest, env)?))
}

pub fn stream_filter(args: &[Sexpr], env: &mut Env) -> EvalResult {
    let (predicate, stream) = two_args(args, "stream-filter")?;
    procedure_arg(predicate, 0, "stream-filter")?;
    stream_arg(stream, 1, "stream-filter")?;
    stream_filter_iter(predicate, stream, env)
}

fn stream_filter_iter(predicate: &Sexpr, stream: &Sexpr, env: &mut Env) -> EvalResult {
    if matches!(stream, Sexpr::Nil) {
        return Ok(Sexpr::Nil);
    }
    let pair = stream_arg(stream, 1, "stream-filter")?;
    let keep = apply(predicate, &[pair.car.clone()], env)?.is_true();
    let rest = force_value(&pair.cdr)?;
    let filtered = stream_filter_iter(predicate, &rest, env)?;
    if keep {
        Ok(Sexpr::cons(pair.car.clone(), filtered))
    } else {
        Ok(filtered)
    }
}

pub fn stream_reduce(args: &[Sexpr], env: &mut Env) -> EvalResult {
    let (operator, stream) = two_args(args, "stream-reduce")?;
    procedure_arg(operator, 0, "stream-reduce")?;
    let pair = stream_arg(stream, 1, "stream-reduce")?;
    let rest = force_value(&pair.cdr)?;
    stream_reduce_iter(operator, &pair.car, &rest, env)
}

fn stream_reduce_iter(
    operator: &Sexpr,
    initial: &Sexpr,
    stream: &Sexpr,
    env: &mut Env,
) -> EvalResult {
    if matches!(stream, Sexpr::Nil) {
        return Ok(initial.clone());
    }
    let pair = stream_arg(stream, 1, "stream-reduce")?;
    let rest = force_value(&pair.cdr)?;
    let folded = stream_reduce_iter(operator, initial, &rest, env)?;
    apply(operator, &[pair.car.clone(), folded], env)
}
