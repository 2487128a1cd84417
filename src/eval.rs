use crate::envir::Env;
use crate::errors::{Error, ReadError};
use crate::intern;
use crate::lexer::Lexer;
use crate::list::Pair;
use crate::parser::read_sexpr;
use crate::reader::FileReader;
use crate::scheme::special_forms;
use crate::types::{EvalResult, Macro, Promise, PromiseState, Sexpr, TcoResult};

/// Evaluate `sexpr` in `env`, driving tail calls through the trampoline:
/// the loop state is the `(expr, env)` pair, and any step that lands in
/// tail position hands back a new pair instead of recursing.
pub fn eval(sexpr: &Sexpr, env: &mut Env) -> EvalResult {
    let mut sexpr = sexpr.clone();
    let mut env = env.clone();
    loop {
        match sexpr {
            Sexpr::Symbol(sym) => {
                return env
                    .get(sym)
                    .ok_or_else(|| Error::Unbound(intern::name(sym)))
            }
            Sexpr::Pair(ref pair) => match eval_pair(pair, &mut env)? {
                (s, None) => return Ok(s),
                (s, Some(e)) => {
                    sexpr = s;
                    env = e;
                }
            },
            // everything else is self-evaluating
            _ => return Ok(sexpr),
        }
    }
}

fn eval_pair(pair: &Pair, env: &mut Env) -> TcoResult {
    // Special forms are recognized before the operator is evaluated, so
    // quoted data never reaches macro expansion.
    if let Sexpr::Symbol(sym) = &pair.car {
        if let Some(form) = special_forms::dispatch(*sym) {
            return form(&pair.cdr, env);
        }
    }
    let operator = eval(&pair.car, env)?;
    if let Sexpr::Macro(ref mac) = operator {
        // The expansion re-enters the trampoline in the caller's env.
        let expansion = expand_macro(mac, &pair.cdr)?;
        return Ok((expansion, Some(env.clone())));
    }
    let args = eval_args(&pair.cdr, env)?;
    apply_tail(&operator, &args, env)
}

/// Evaluate the operands of a call, strictly left to right.
fn eval_args(operands: &Sexpr, env: &mut Env) -> Result<Vec<Sexpr>, Error> {
    let mut args = Vec::new();
    let mut iter = operands.iter();
    for expr in iter.by_ref() {
        args.push(eval(expr, env)?);
    }
    match iter.rest() {
        Sexpr::Nil => Ok(args),
        _ => Err(Error::bad_form(operands)),
    }
}

/// Apply a procedure to already-evaluated arguments. A compound procedure
/// body is handed back as a tail expression rather than evaluated here.
pub fn apply_tail(operator: &Sexpr, args: &[Sexpr], env: &mut Env) -> TcoResult {
    match operator {
        Sexpr::Func(prim) => (prim.func)(args, env).map(|value| (value, None)),
        Sexpr::Lambda(lambda) => {
            let mut local = lambda.formals.bind(args, &lambda.env)?;
            return_last(&lambda.body, &mut local)
        }
        // a dynamic closure binds its parameters under the caller's frame
        Sexpr::Dlambda(dlambda) => {
            let mut local = dlambda.formals.bind(args, env)?;
            return_last(&dlambda.body, &mut local)
        }
        other => Err(Error::not_callable(other)),
    }
}

/// Apply a procedure and drive the result to a final value. This is the
/// entry point for host code (`apply`, `map`, `filter`, `reduce`, the
/// stream procedures) calling back into Scheme.
pub fn apply(operator: &Sexpr, args: &[Sexpr], env: &mut Env) -> EvalResult {
    match apply_tail(operator, args, env)? {
        (value, None) => Ok(value),
        (expr, Some(mut local)) => eval(&expr, &mut local),
    }
}

/// Evaluate all the elements of the list but last, return last element
/// unevaluated together with its environment (the tail position).
pub fn return_last(body: &Sexpr, env: &mut Env) -> TcoResult {
    let mut iter = body.iter();
    let mut last = match iter.next() {
        Some(expr) => expr,
        None => return Ok((Sexpr::Undefined, None)),
    };
    for expr in iter {
        eval(last, env)?;
        last = expr;
    }
    Ok((last.clone(), Some(env.clone())))
}

/// Evaluate a body to completion and return the value of its last
/// expression.
pub fn eval_sequence(body: &Sexpr, env: &mut Env) -> EvalResult {
    let mut last = Sexpr::Undefined;
    for expr in body.iter() {
        last = eval(expr, env)?;
    }
    Ok(last)
}

fn expand_macro(mac: &Macro, operands: &Sexpr) -> EvalResult {
    // operands are passed through unevaluated
    let args = operands.list_to_vec()?;
    let mut local = mac.formals.bind(&args, &mac.env).map_err(|err| match err {
        Error::Arity(msg) => Error::Macro(msg),
        other => other,
    })?;
    eval_sequence(&mac.body, &mut local)
}

impl Promise {
    /// Force the promise. The memo slot is set to the sentinel before the
    /// thunk runs, so a self-referential force fails instead of looping;
    /// a failed force stays pending and can be retried.
    pub fn force(&self) -> EvalResult {
        let (expr, mut env) = {
            let mut state = self.state.borrow_mut();
            match &*state {
                PromiseState::Forced(value) => return Ok(value.clone()),
                PromiseState::Forcing => return Err(Error::CircularForce),
                PromiseState::Pending { expr, env } => {
                    let pending = (expr.clone(), env.clone());
                    *state = PromiseState::Forcing;
                    pending
                }
            }
        };
        match eval(&expr, &mut env) {
            Ok(value) => {
                *self.state.borrow_mut() = PromiseState::Forced(value.clone());
                Ok(value)
            }
            Err(err) => {
                *self.state.borrow_mut() = PromiseState::Pending { expr, env };
                Err(err)
            }
        }
    }
}

/// Force through a chain of promises to a non-promise value; every link
/// memoizes its own result. Non-promises come back unchanged.
pub fn force_value(value: &Sexpr) -> EvalResult {
    let mut value = value.clone();
    loop {
        let promise = match value {
            Sexpr::Promise(ref promise) => promise.clone(),
            _ => return Ok(value),
        };
        value = promise.force()?;
    }
}

/// Read and evaluate a whole file, returning the value of its last
/// expression.
pub fn eval_file(filename: &str, env: &mut Env) -> EvalResult {
    let reader = FileReader::open(filename)?;
    let mut lexer = Lexer::new(reader);
    let mut last = Sexpr::Undefined;
    loop {
        match read_sexpr(&mut lexer) {
            Ok(ref sexpr) => last = eval(sexpr, env)?,
            Err(ReadError::EndOfInput) => break,
            Err(err) => return Err(Error::Read(err)),
        }
    }
    Ok(last)
}

#[cfg(test)]
mod tests {
    use super::{eval, force_value};
    use crate::envir::Env;
    use crate::errors::Error;
    use crate::intern::intern;
    use crate::types::{EvalResult, Sexpr};

    #[test]
    fn atoms() {
        let mut env = Env::new();

        assert_eq!(eval(&Sexpr::True, &mut env), Ok(Sexpr::True));
        assert_eq!(eval(&Sexpr::False, &mut env), Ok(Sexpr::False));
        assert_eq!(eval(&Sexpr::Integer(42), &mut env), Ok(Sexpr::Integer(42)));
        assert_eq!(eval(&Sexpr::Float(3.14), &mut env), Ok(Sexpr::Float(3.14)));
        assert_eq!(eval(&Sexpr::Nil, &mut env), Ok(Sexpr::Nil));
        assert_eq!(eval(&Sexpr::Undefined, &mut env), Ok(Sexpr::Undefined));
        assert_eq!(
            eval(&Sexpr::from("hello world"), &mut env),
            Ok(Sexpr::from("hello world"))
        );
    }

    #[test]
    fn symbols() {
        let mut env = Env::new();
        env.insert(intern("true"), Sexpr::True);
        env.insert(intern("foo"), Sexpr::symbol("bar"));

        assert_eq!(eval(&Sexpr::symbol("true"), &mut env), Ok(Sexpr::True));
        assert_eq!(eval(&Sexpr::symbol("foo"), &mut env), Ok(Sexpr::symbol("bar")));
        assert_eq!(
            eval(&Sexpr::symbol("baz"), &mut env),
            Err(Error::Unbound(String::from("baz")))
        );
    }

    #[test]
    fn empty_list_is_self_evaluating() {
        let mut env = Env::new();
        assert_eq!(eval(&Sexpr::Nil, &mut env), Ok(Sexpr::Nil));
    }

    #[test]
    fn not_callable() {
        let mut env = Env::new();
        env.insert(intern("x"), Sexpr::Integer(42));

        // (x #t) => (42 #t) => Err
        assert_eq!(
            eval(
                &Sexpr::list(vec![Sexpr::symbol("x"), Sexpr::True]),
                &mut env
            ),
            Err(Error::not_callable(&Sexpr::Integer(42)))
        );
    }

    #[test]
    fn primitive_call() {
        use crate::types::Primitive;

        fn first(args: &[Sexpr], _env: &mut Env) -> EvalResult {
            Ok(args[0].clone())
        }

        let mut env = Env::new();
        env.insert(
            intern("first"),
            Sexpr::Func(Primitive {
                name: "first",
                func: first,
            }),
        );
        // (first 1 2) => 1, twice in a row
        let call = Sexpr::list(vec![
            Sexpr::symbol("first"),
            Sexpr::Integer(1),
            Sexpr::Integer(2),
        ]);
        assert_eq!(eval(&call, &mut env), Ok(Sexpr::Integer(1)));
        assert_eq!(eval(&call, &mut env), Ok(Sexpr::Integer(1)));
    }

    #[test]
    fn operands_evaluate_left_to_right() {
        use crate::types::Primitive;

        fn order(args: &[Sexpr], _env: &mut Env) -> EvalResult {
            Ok(Sexpr::list(args.to_vec()))
        }

        let mut env = Env::new();
        env.insert(
            intern("order"),
            Sexpr::Func(Primitive {
                name: "order",
                func: order,
            }),
        );
        env.insert(intern("a"), Sexpr::Integer(1));
        env.insert(intern("b"), Sexpr::Integer(2));

        assert_eq!(
            eval(
                &Sexpr::list(vec![
                    Sexpr::symbol("order"),
                    Sexpr::symbol("a"),
                    Sexpr::symbol("b"),
                ]),
                &mut env
            ),
            Ok(Sexpr::list(vec![Sexpr::Integer(1), Sexpr::Integer(2)]))
        );
    }

    #[test]
    fn force_is_idempotent_on_non_promises() {
        assert_eq!(force_value(&Sexpr::Integer(42)), Ok(Sexpr::Integer(42)));
        assert_eq!(force_value(&Sexpr::Nil), Ok(Sexpr::Nil));
    }

    #[test]
    fn promises_memoize() {
        let mut env = Env::new();
        env.insert(intern("x"), Sexpr::Integer(1));

        let promise = Sexpr::promise(Sexpr::symbol("x"), env.clone());
        assert_eq!(force_value(&promise), Ok(Sexpr::Integer(1)));

        // rebinding x is invisible to an already-forced promise
        env.insert(intern("x"), Sexpr::Integer(2));
        assert_eq!(force_value(&promise), Ok(Sexpr::Integer(1)));
    }

    #[test]
    fn failed_force_can_be_retried() {
        let mut env = Env::new();
        let promise = Sexpr::promise(Sexpr::symbol("x"), env.clone());

        assert_eq!(
            force_value(&promise),
            Err(Error::Unbound(String::from("x")))
        );
        env.insert(intern("x"), Sexpr::Integer(7));
        assert_eq!(force_value(&promise), Ok(Sexpr::Integer(7)));
    }
}
