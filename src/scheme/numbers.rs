use std::cmp::Ordering;

use super::utils::*;
use crate::envir::Env;
use crate::errors::Error;
use crate::types::{EvalResult, Flt, Int, Sexpr};

macro_rules! math_op {
    ( $op:tt, $lhs:expr, $rhs:expr ) => {{
        use Sexpr::{Float, Integer};
        match ($lhs, $rhs) {
            (Integer(x), Integer(y)) => Ok(Integer(x $op y)),
            (Integer(x), Float(y)) => Ok(Float(x as Flt $op y)),
            (Float(x), Integer(y)) => Ok(Float(x $op y as Flt)),
            (Float(x), Float(y)) => Ok(Float(x $op y)),
            (Float(_) | Integer(_), y) => Err(Error::not_a_number(&y)),
            (x, _) => Err(Error::not_a_number(&x)),
        }
    }};
}

pub fn add(args: &[Sexpr], _env: &mut Env) -> EvalResult {
    args.iter()
        .cloned()
        .try_fold(Sexpr::Integer(0), |acc, x| math_op!(+, acc, x))
}

pub fn sub(args: &[Sexpr], _env: &mut Env) -> EvalResult {
    let (first, rest) = args.split_first().ok_or_else(|| Error::wrong_arg_num("-"))?;
    if rest.is_empty() {
        // (- x) negates
        return math_op!(-, Sexpr::Integer(0), first.clone());
    }
    rest.iter()
        .cloned()
        .try_fold(first.clone(), |acc, x| math_op!(-, acc, x))
}

pub fn mul(args: &[Sexpr], _env: &mut Env) -> EvalResult {
    args.iter()
        .cloned()
        .try_fold(Sexpr::Integer(1), |acc, x| math_op!(*, acc, x))
}

/// Integer division stays exact when it divides evenly, otherwise the
/// quotient is a float; any float operand makes the result a float.
fn div2(lhs: Sexpr, rhs: Sexpr) -> EvalResult {
    use Sexpr::{Float, Integer};
    match (lhs, rhs) {
        (Integer(x), Integer(y)) => {
            if y == 0 {
                Err(Error::division_by_zero())
            } else if x % y == 0 {
                Ok(Integer(x / y))
            } else {
                Ok(Float(x as Flt / y as Flt))
            }
        }
        (Integer(x), Float(y)) => {
            if y == 0.0 {
                Err(Error::division_by_zero())
            } else {
                Ok(Float(x as Flt / y))
            }
        }
        (Float(x), Integer(y)) => {
            if y == 0 {
                Err(Error::division_by_zero())
            } else {
                Ok(Float(x / y as Flt))
            }
        }
        (Float(x), Float(y)) => {
            if y == 0.0 {
                Err(Error::division_by_zero())
            } else {
                Ok(Float(x / y))
            }
        }
        (Float(_) | Integer(_), y) => Err(Error::not_a_number(&y)),
        (x, _) => Err(Error::not_a_number(&x)),
    }
}

pub fn div(args: &[Sexpr], _env: &mut Env) -> EvalResult {
    let (first, rest) = args.split_first().ok_or_else(|| Error::wrong_arg_num("/"))?;
    if rest.is_empty() {
        // (/ x) is the reciprocal
        return div2(Sexpr::Integer(1), first.clone());
    }
    rest.iter().cloned().try_fold(first.clone(), div2)
}

/// Check the operands of an integer-division flavored primitive: both must
/// be numbers and the divisor nonzero.
fn divisor_args<'a>(args: &'a [Sexpr], name: &str) -> Result<(&'a Sexpr, &'a Sexpr), Error> {
    let (lhs, rhs) = two_args(args, name)?;
    for value in [lhs, rhs] {
        if !value.is_number() {
            return Err(Error::not_a_number(value));
        }
    }
    if rhs == &Sexpr::Integer(0) {
        return Err(Error::division_by_zero());
    }
    Ok((lhs, rhs))
}

pub fn quotient(args: &[Sexpr], _env: &mut Env) -> EvalResult {
    use Sexpr::{Float, Integer};
    let (lhs, rhs) = divisor_args(args, "quotient")?;
    match (lhs.clone(), rhs.clone()) {
        (Integer(x), Integer(y)) => Ok(Integer(x / y)),
        (Integer(x), Float(y)) => Ok(Float((x as Flt / y).trunc())),
        (Float(x), Integer(y)) => Ok(Float((x / y as Flt).trunc())),
        (Float(x), Float(y)) => Ok(Float((x / y).trunc())),
        (x, _) => Err(Error::not_a_number(&x)),
    }
}

/// Remainder takes the sign of the dividend.
pub fn remainder(args: &[Sexpr], _env: &mut Env) -> EvalResult {
    use Sexpr::{Float, Integer};
    let (lhs, rhs) = divisor_args(args, "remainder")?;
    match (lhs.clone(), rhs.clone()) {
        (Integer(x), Integer(y)) => Ok(Integer(x % y)),
        (Integer(x), Float(y)) => Ok(Float(x as Flt % y)),
        (Float(x), Integer(y)) => Ok(Float(x % y as Flt)),
        (Float(x), Float(y)) => Ok(Float(x % y)),
        (x, _) => Err(Error::not_a_number(&x)),
    }
}

/// Modulo takes the sign of the divisor.
pub fn modulo(args: &[Sexpr], _env: &mut Env) -> EvalResult {
    use Sexpr::{Float, Integer};
    let (lhs, rhs) = divisor_args(args, "modulo")?;
    match (lhs.clone(), rhs.clone()) {
        (Integer(x), Integer(y)) => Ok(Integer(((x % y) + y) % y)),
        (Integer(x), Float(y)) => Ok(Float(x as Flt - y * (x as Flt / y).floor())),
        (Float(x), Integer(y)) => Ok(Float(x - y as Flt * (x / y as Flt).floor())),
        (Float(x), Float(y)) => Ok(Float(x - y * (x / y).floor())),
        (x, _) => Err(Error::not_a_number(&x)),
    }
}

pub fn abs(args: &[Sexpr], _env: &mut Env) -> EvalResult {
    match one_arg(args, "abs")? {
        Sexpr::Integer(x) => Ok(Sexpr::Integer(x.abs())),
        Sexpr::Float(x) => Ok(Sexpr::Float(x.abs())),
        other => Err(Error::not_a_number(other)),
    }
}

pub fn expt(args: &[Sexpr], _env: &mut Env) -> EvalResult {
    use Sexpr::{Float, Integer};
    let (base, exponent) = two_args(args, "expt")?;
    match (base.clone(), exponent.clone()) {
        (Integer(x), Integer(y)) if y >= 0 => {
            // fall back to floats when the exact power overflows
            let exact = u32::try_from(y).ok().and_then(|e| x.checked_pow(e));
            Ok(match exact {
                Some(value) => Integer(value),
                None => Float((x as Flt).powf(y as Flt)),
            })
        }
        (Integer(x), Integer(y)) => Ok(Float((x as Flt).powf(y as Flt))),
        (Integer(x), Float(y)) => Ok(Float((x as Flt).powf(y))),
        (Float(x), Integer(y)) => Ok(Float(x.powf(y as Flt))),
        (Float(x), Float(y)) => Ok(Float(x.powf(y))),
        (Float(_) | Integer(_), y) => Err(Error::not_a_number(&y)),
        (x, _) => Err(Error::not_a_number(&x)),
    }
}

/// Use `partial_cmp` to compare subsequent values
fn cmp(args: &[Sexpr], pred: fn(Ordering) -> bool) -> EvalResult {
    for value in args {
        if !value.is_number() {
            return Err(Error::not_a_number(value));
        }
    }
    for window in args.windows(2) {
        let order = window[0]
            .partial_cmp(&window[1])
            .ok_or_else(|| Error::not_a_number(&window[1]))?;
        if !pred(order) {
            return Ok(Sexpr::False);
        }
    }
    Ok(Sexpr::True)
}

pub fn num_eq(args: &[Sexpr], _env: &mut Env) -> EvalResult {
    cmp(args, |order| order == Ordering::Equal)
}

pub fn lt(args: &[Sexpr], _env: &mut Env) -> EvalResult {
    cmp(args, |order| order == Ordering::Less)
}

pub fn gt(args: &[Sexpr], _env: &mut Env) -> EvalResult {
    cmp(args, |order| order == Ordering::Greater)
}

pub fn le(args: &[Sexpr], _env: &mut Env) -> EvalResult {
    cmp(args, |order| order != Ordering::Greater)
}

pub fn ge(args: &[Sexpr], _env: &mut Env) -> EvalResult {
    cmp(args, |order| order != Ordering::Less)
}

pub fn is_zero(args: &[Sexpr], _env: &mut Env) -> EvalResult {
    let value = one_arg(args, "zero?")?;
    if !value.is_number() {
        return Err(Error::not_a_number(value));
    }
    Ok(Sexpr::from(value == &Sexpr::Integer(0)))
}

fn int_value(value: &Sexpr, index: usize, name: &str) -> Result<Int, Error> {
    match value {
        Sexpr::Integer(x) => Ok(*x),
        Sexpr::Float(x) if x.fract() == 0.0 => Ok(*x as Int),
        other => Err(Error::wrong_type(index, name, other)),
    }
}

pub fn is_even(args: &[Sexpr], _env: &mut Env) -> EvalResult {
    let value = int_value(one_arg(args, "even?")?, 0, "even?")?;
    Ok(Sexpr::from(value % 2 == 0))
}

pub fn is_odd(args: &[Sexpr], _env: &mut Env) -> EvalResult {
    let value = int_value(one_arg(args, "odd?")?, 0, "odd?")?;
    Ok(Sexpr::from(value % 2 != 0))
}

pub fn is_number(args: &[Sexpr], _env: &mut Env) -> EvalResult {
    Ok(Sexpr::from(one_arg(args, "number?")?.is_number()))
}

pub fn is_integer(args: &[Sexpr], _env: &mut Env) -> EvalResult {
    Ok(Sexpr::from(matches!(
        one_arg(args, "integer?")?,
        Sexpr::Integer(_)
    )))
}

fn as_float(value: &Sexpr) -> Result<Flt, Error> {
    match value {
        Sexpr::Integer(x) => Ok(*x as Flt),
        Sexpr::Float(x) => Ok(*x),
        other => Err(Error::not_a_number(other)),
    }
}

macro_rules! float_fn {
    ( $( $fname:ident ( $name:literal ) => $method:ident ),* $(,)? ) => {
        $(
            pub fn $fname(args: &[Sexpr], _env: &mut Env) -> EvalResult {
                let value = as_float(one_arg(args, $name)?)?;
                Ok(Sexpr::Float(value.$method()))
            }
        )*
    };
}

float_fn! {
    sqrt("sqrt") => sqrt,
    exp("exp") => exp,
    log("log") => ln,
    sin("sin") => sin,
    cos("cos") => cos,
    tan("tan") => tan,
    atan("atan") => atan,
}

macro_rules! round_fn {
    ( $( $fname:ident ( $name:literal ) => $method:ident ),* $(,)? ) => {
        $(
            pub fn $fname(args: &[Sexpr], _env: &mut Env) -> EvalResult {
                match one_arg(args, $name)? {
                    Sexpr::Integer(x) => Ok(Sexpr::Integer(*x)),
                    Sexpr::Float(x) => Ok(Sexpr::Integer(x.$method() as Int)),
                    other => Err(Error::not_a_number(other)),
                }
            }
        )*
    };
}

round_fn! {
    floor("floor") => floor,
    ceil("ceil") => ceil,
    trunc("trunc") => trunc,
}
