use crate::errors::Error;
use crate::intern::Symbol;
use crate::list::Pair;
use crate::types::Sexpr;

/// Check that a special form's operand list is proper and its length is
/// within `min..=max`.
pub fn validate_form(args: &Sexpr, min: usize, max: usize) -> Result<(), Error> {
    let length = args.list_len().map_err(|_| Error::bad_form(args))?;
    if length < min {
        Err(Error::too_few_operands())
    } else if length > max {
        Err(Error::too_many_operands())
    } else {
        Ok(())
    }
}

/// Extract head of an operand list, for empty list throw an error
#[inline]
pub fn head_or_err(args: &Sexpr) -> Result<&Sexpr, Error> {
    args.head().ok_or_else(Error::too_few_operands)
}

/// The single operand of a form that takes exactly one.
#[inline]
pub fn one_operand(args: &Sexpr) -> Result<&Sexpr, Error> {
    validate_form(args, 1, 1)?;
    head_or_err(args)
}

/// If `sexpr` is a symbol, return its key, otherwise throw an error
#[inline]
pub fn symbol_or_err(sexpr: &Sexpr) -> Result<Symbol, Error> {
    match sexpr {
        Sexpr::Symbol(sym) => Ok(*sym),
        other => Err(Error::Type(format!("non-symbol: {}", other))),
    }
}

/// Exactly one argument for primitive `name`.
#[inline]
pub fn one_arg<'a>(args: &'a [Sexpr], name: &str) -> Result<&'a Sexpr, Error> {
    match args {
        [arg] => Ok(arg),
        _ => Err(Error::wrong_arg_num(name)),
    }
}

/// Exactly two arguments for primitive `name`.
#[inline]
pub fn two_args<'a>(args: &'a [Sexpr], name: &str) -> Result<(&'a Sexpr, &'a Sexpr), Error> {
    match args {
        [first, second] => Ok((first, second)),
        _ => Err(Error::wrong_arg_num(name)),
    }
}

/// Argument `index` of `name` must be a pair.
#[inline]
pub fn pair_arg<'a>(value: &'a Sexpr, index: usize, name: &str) -> Result<&'a Pair, Error> {
    match value {
        Sexpr::Pair(pair) => Ok(pair),
        other => Err(Error::wrong_type(index, name, other)),
    }
}

/// Argument `index` of `name` must be a proper list; collect its items.
#[inline]
pub fn list_arg(value: &Sexpr, index: usize, name: &str) -> Result<Vec<Sexpr>, Error> {
    value
        .list_to_vec()
        .map_err(|_| Error::wrong_type(index, name, value))
}

/// Argument `index` of `name` must be callable.
#[inline]
pub fn procedure_arg(value: &Sexpr, index: usize, name: &str) -> Result<(), Error> {
    match value {
        Sexpr::Func(_) | Sexpr::Lambda(_) | Sexpr::Dlambda(_) | Sexpr::Macro(_) => Ok(()),
        other => Err(Error::wrong_type(index, name, other)),
    }
}
