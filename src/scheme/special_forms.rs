use std::rc::Rc;

use super::utils::*;
use crate::envir::Env;
use crate::errors::Error;
use crate::eval::{eval, return_last};
use crate::intern::{self, Symbol};
use crate::types::{Dlambda, EvalResult, Form, Formals, Lambda, Macro, Sexpr, TcoResult};

// See: https://groups.csail.mit.edu/mac/ftpdir/scheme-7.4/doc-html/scheme_3.html

/// Recognize a reserved special-form keyword. Called on the car of a pair
/// before the operator is evaluated, so these names cannot be shadowed.
pub fn dispatch(sym: Symbol) -> Option<Form> {
    intern::with_name(sym, |name| {
        let form: Form = match name {
            "quote" => quote,
            "quasiquote" => quasiquote,
            "unquote" => unquote,
            "if" => iffn,
            "cond" => condfn,
            "and" => andfn,
            "or" => orfn,
            "begin" => begin,
            "define" => define,
            "set!" => set,
            "lambda" => lambda,
            "dlambda" => dlambda,
            "let" => let_form,
            "define-macro" => define_macro,
            "delay" => delay,
            "cons-stream" => cons_stream,
            _ => return None,
        };
        Some(form)
    })
}

pub fn quote(args: &Sexpr, _env: &mut Env) -> TcoResult {
    one_operand(args).map(|expr| (expr.clone(), None))
}

pub fn iffn(args: &Sexpr, env: &mut Env) -> TcoResult {
    validate_form(args, 2, 3)?;
    let mut iter = args.iter();
    let predicate = iter.next().ok_or_else(Error::too_few_operands)?;
    let consequent = iter.next().ok_or_else(Error::too_few_operands)?;
    if eval(predicate, env)?.is_true() {
        Ok((consequent.clone(), Some(env.clone())))
    } else {
        match iter.next() {
            Some(alternative) => Ok((alternative.clone(), Some(env.clone()))),
            None => Ok((Sexpr::Undefined, None)),
        }
    }
}

pub fn condfn(args: &Sexpr, env: &mut Env) -> TcoResult {
    let mut clauses = args.iter();
    while let Some(clause) = clauses.next() {
        let (test, body) = match clause {
            Sexpr::Pair(pair) => (&pair.car, &pair.cdr),
            Sexpr::Nil => return Err(Error::too_few_operands()),
            other => return Err(Error::bad_form(other)),
        };
        if let Sexpr::Symbol(sym) = test {
            if intern::is_named(*sym, "else") {
                if !matches!(clauses.rest(), Sexpr::Nil) {
                    return Err(Error::Type(format!("else clause isn't last: {}", args)));
                }
                return return_last(body, env);
            }
        }
        let value = eval(test, env)?;
        if value.is_true() {
            return match body {
                // a clause with no body yields its predicate's value
                Sexpr::Nil => Ok((value, None)),
                _ => return_last(body, env),
            };
        }
    }
    Ok((Sexpr::Undefined, None))
}

pub fn andfn(args: &Sexpr, env: &mut Env) -> TcoResult {
    let mut iter = args.iter();
    let mut last = match iter.next() {
        Some(expr) => expr,
        None => return Ok((Sexpr::True, None)),
    };
    for expr in iter {
        if !eval(last, env)?.is_true() {
            return Ok((Sexpr::False, None));
        }
        last = expr;
    }
    Ok((last.clone(), Some(env.clone())))
}

pub fn orfn(args: &Sexpr, env: &mut Env) -> TcoResult {
    let mut iter = args.iter();
    let mut last = match iter.next() {
        Some(expr) => expr,
        None => return Ok((Sexpr::False, None)),
    };
    for expr in iter {
        let value = eval(last, env)?;
        if value.is_true() {
            return Ok((value, None));
        }
        last = expr;
    }
    Ok((last.clone(), Some(env.clone())))
}

pub fn begin(args: &Sexpr, env: &mut Env) -> TcoResult {
    validate_form(args, 1, usize::MAX)?;
    return_last(args, env)
}

pub fn define(args: &Sexpr, env: &mut Env) -> TcoResult {
    validate_form(args, 2, usize::MAX)?;
    let target = head_or_err(args)?;
    let rest = args.tail().ok_or_else(Error::too_few_operands)?;
    match target {
        // (define sym expr)
        Sexpr::Symbol(sym) => {
            validate_form(args, 2, 2)?;
            let value = eval(head_or_err(rest)?, env)?;
            env.insert(*sym, value);
        }
        // (define (name . params) body...)
        Sexpr::Pair(pair) => {
            let name = symbol_or_err(&pair.car)?;
            let lambda = lambda_init(&pair.cdr, rest, env)?;
            env.insert(name, lambda);
        }
        other => return Err(Error::Type(format!("non-symbol: {}", other))),
    }
    Ok((Sexpr::Undefined, None))
}

pub fn set(args: &Sexpr, env: &mut Env) -> TcoResult {
    validate_form(args, 2, 2)?;
    let mut iter = args.iter();
    let key = symbol_or_err(iter.next().ok_or_else(Error::too_few_operands)?)?;
    let expr = iter.next().ok_or_else(Error::too_few_operands)?;
    let value = eval(expr, env)?;
    match env.find_env(key) {
        Some(ref mut owner) => {
            owner.insert(key, value);
            Ok((Sexpr::Undefined, None))
        }
        None => Err(Error::Assign(intern::name(key))),
    }
}

pub fn lambda(args: &Sexpr, env: &mut Env) -> TcoResult {
    validate_form(args, 2, usize::MAX)?;
    let params = head_or_err(args)?;
    let body = args.tail().ok_or_else(Error::too_few_operands)?;
    Ok((lambda_init(params, body, env)?, None))
}

#[inline]
pub(crate) fn lambda_init(params: &Sexpr, body: &Sexpr, env: &Env) -> EvalResult {
    let formals = Formals::parse(params)?;
    Ok(Sexpr::Lambda(Rc::new(Lambda {
        formals,
        body: body.clone(),
        env: env.clone(),
    })))
}

/// Like `lambda`, but no environment is captured; parameters are bound in
/// a child of whatever environment the call happens in.
pub fn dlambda(args: &Sexpr, _env: &mut Env) -> TcoResult {
    validate_form(args, 2, usize::MAX)?;
    let params = head_or_err(args)?;
    let body = args.tail().ok_or_else(Error::too_few_operands)?;
    let formals = Formals::parse(params)?;
    Ok((
        Sexpr::Dlambda(Rc::new(Dlambda {
            formals,
            body: body.clone(),
        })),
        None,
    ))
}

pub fn let_form(args: &Sexpr, env: &mut Env) -> TcoResult {
    validate_form(args, 2, usize::MAX)?;
    let bindings = head_or_err(args)?;
    let body = args.tail().ok_or_else(Error::too_few_operands)?;

    let mut local = env.branch();
    let mut iter = bindings.iter();
    for binding in iter.by_ref() {
        validate_form(binding, 2, 2)?;
        let mut parts = binding.iter();
        let key = symbol_or_err(parts.next().ok_or_else(Error::too_few_operands)?)?;
        let expr = parts.next().ok_or_else(Error::too_few_operands)?;
        // binding values see the outer environment; this is let, not let*
        let value = eval(expr, env)?;
        local.insert(key, value);
    }
    if !matches!(iter.rest(), Sexpr::Nil) {
        return Err(Error::Type(format!("bad bindings list in let form: {}", bindings)));
    }
    return_last(body, &mut local)
}

pub fn define_macro(args: &Sexpr, env: &mut Env) -> TcoResult {
    validate_form(args, 2, usize::MAX)?;
    let target = head_or_err(args)?;
    let body = args.tail().ok_or_else(Error::too_few_operands)?;
    match target {
        Sexpr::Pair(pair) if matches!(pair.car, Sexpr::Symbol(_)) => {
            let name = symbol_or_err(&pair.car)?;
            let formals = Formals::parse(&pair.cdr)?;
            env.insert(
                name,
                Sexpr::Macro(Rc::new(Macro {
                    formals,
                    body: body.clone(),
                    env: env.clone(),
                })),
            );
            Ok((Sexpr::Undefined, None))
        }
        _ => Err(Error::Macro(String::from("invalid use of define-macro"))),
    }
}

pub fn delay(args: &Sexpr, env: &mut Env) -> TcoResult {
    let expr = one_operand(args)?;
    Ok((Sexpr::promise(expr.clone(), env.clone()), None))
}

/// `(cons-stream a b)` evaluates `a` now and wraps `b` in a promise.
pub fn cons_stream(args: &Sexpr, env: &mut Env) -> TcoResult {
    validate_form(args, 2, 2)?;
    let mut iter = args.iter();
    let head_expr = iter.next().ok_or_else(Error::too_few_operands)?;
    let tail_expr = iter.next().ok_or_else(Error::too_few_operands)?;
    let head = eval(head_expr, env)?;
    Ok((
        Sexpr::cons(head, Sexpr::promise(tail_expr.clone(), env.clone())),
        None,
    ))
}

pub fn quasiquote(args: &Sexpr, env: &mut Env) -> TcoResult {
    let expr = one_operand(args)?;
    Ok((qq_eval(expr, env, 1)?, None))
}

pub fn unquote(_args: &Sexpr, _env: &mut Env) -> TcoResult {
    Err(Error::Type(String::from("unquote outside of quasiquote")))
}

/// Rebuild a quasiquoted expression, evaluating unquoted parts. Nested
/// quasiquotes raise the depth; unquotes lower it; depth zero evaluates.
fn qq_eval(sexpr: &Sexpr, env: &mut Env, depth: i32) -> EvalResult {
    let pair = match sexpr {
        Sexpr::Pair(pair) => pair,
        _ => return Ok(sexpr.clone()),
    };
    let mut depth = depth;
    if let Sexpr::Symbol(sym) = &pair.car {
        if intern::is_named(*sym, "unquote") {
            depth -= 1;
            if depth == 0 {
                validate_form(&pair.cdr, 1, 1)?;
                return eval(head_or_err(&pair.cdr)?, env);
            }
        } else if intern::is_named(*sym, "quasiquote") {
            depth += 1;
        }
    }
    Ok(Sexpr::cons(
        qq_eval(&pair.car, env, depth)?,
        qq_eval(&pair.cdr, env, depth)?,
    ))
}
