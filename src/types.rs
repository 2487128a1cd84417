use std::cell::RefCell;
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

use crate::envir::Env;
use crate::errors::Error;
use crate::intern::{self, Symbol};
use crate::list::Pair;

pub type Int = i64;
pub type Flt = f64;

pub type EvalResult = Result<Sexpr, Error>;

/// Result of a step that may land in tail position: either a final value
/// (`None`) or an expression to re-enter the trampoline with (`Some(env)`).
pub type TcoResult = Result<(Sexpr, Option<Env>), Error>;

/// A host-implemented procedure. Arguments arrive already evaluated.
pub type PrimFn = fn(&[Sexpr], &mut Env) -> EvalResult;

/// A special-form handler, applied to the unevaluated operand list.
pub type Form = fn(&Sexpr, &mut Env) -> TcoResult;

#[derive(Clone)]
pub enum Sexpr {
    Integer(Int),
    Float(Flt),
    True,
    False,
    Symbol(Symbol),
    String(String),
    Nil,
    Undefined,
    Pair(Rc<Pair>),
    Func(Primitive),
    Lambda(Rc<Lambda>),
    Dlambda(Rc<Dlambda>),
    Macro(Rc<Macro>),
    Promise(Rc<Promise>),
}

#[derive(Clone, Copy)]
pub struct Primitive {
    pub name: &'static str,
    pub func: PrimFn,
}

/// A parsed formal-parameter list. Covers all three shapes: a proper list
/// of symbols, a single symbol collecting every argument, and a dotted
/// list with fixed parameters plus a rest parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Formals {
    pub required: Vec<Symbol>,
    pub rest: Option<Symbol>,
}

#[derive(Clone)]
pub struct Lambda {
    pub formals: Formals,
    pub body: Sexpr,
    pub env: Env,
}

#[derive(Clone)]
pub struct Dlambda {
    pub formals: Formals,
    pub body: Sexpr,
}

#[derive(Clone)]
pub struct Macro {
    pub formals: Formals,
    pub body: Sexpr,
    pub env: Env,
}

pub struct Promise {
    pub(crate) state: RefCell<PromiseState>,
}

/// `Forcing` is the re-entrancy sentinel: the slot is set before the thunk
/// runs, so a self-referential force is detected instead of looping.
pub(crate) enum PromiseState {
    Pending { expr: Sexpr, env: Env },
    Forcing,
    Forced(Sexpr),
}

impl Sexpr {
    #[inline]
    pub fn symbol(name: &str) -> Sexpr {
        Sexpr::Symbol(intern::intern(name))
    }

    pub fn promise(expr: Sexpr, env: Env) -> Sexpr {
        Sexpr::Promise(Rc::new(Promise {
            state: RefCell::new(PromiseState::Pending { expr, env }),
        }))
    }

    /// Every value is true except `#f`.
    #[inline]
    pub fn is_true(&self) -> bool {
        !matches!(self, Sexpr::False)
    }

    #[inline]
    pub fn is_number(&self) -> bool {
        matches!(self, Sexpr::Integer(_) | Sexpr::Float(_))
    }
}

impl Formals {
    pub fn parse(params: &Sexpr) -> Result<Formals, Error> {
        if let Sexpr::Symbol(sym) = params {
            return Ok(Formals {
                required: Vec::new(),
                rest: Some(*sym),
            });
        }

        let mut required = Vec::new();
        let mut iter = params.iter();
        for elem in iter.by_ref() {
            match elem {
                Sexpr::Symbol(sym) => required.push(*sym),
                other => return Err(Error::Type(format!("non-symbol parameter: {}", other))),
            }
        }
        let rest = match iter.rest() {
            Sexpr::Nil => None,
            Sexpr::Symbol(sym) => Some(*sym),
            other => return Err(Error::Type(format!("non-symbol parameter: {}", other))),
        };

        let mut seen = std::collections::HashSet::new();
        for sym in required.iter().chain(rest.iter()) {
            if !seen.insert(*sym) {
                return Err(Error::Type(format!(
                    "duplicate parameter: {}",
                    intern::name(*sym)
                )));
            }
        }
        Ok(Formals { required, rest })
    }

    /// Bind `args` in a fresh child of `parent`, enforcing arity.
    pub fn bind(&self, args: &[Sexpr], parent: &Env) -> Result<Env, Error> {
        if args.len() < self.required.len() {
            return Err(Error::Arity(String::from("too few arguments supplied")));
        }
        if self.rest.is_none() && args.len() > self.required.len() {
            return Err(Error::Arity(String::from("too many arguments supplied")));
        }
        let mut local = parent.branch();
        for (sym, val) in self.required.iter().zip(args) {
            local.insert(*sym, val.clone());
        }
        if let Some(rest) = self.rest {
            local.insert(rest, Sexpr::list(args[self.required.len()..].to_vec()));
        }
        Ok(local)
    }
}

fn fmt_float(f: &mut fmt::Formatter<'_>, value: Flt) -> fmt::Result {
    // Reals always print with a decimal point, so they read back as reals.
    if value.is_finite() && value.fract() == 0.0 {
        write!(f, "{:.1}", value)
    } else {
        write!(f, "{}", value)
    }
}

fn fmt_string(f: &mut fmt::Formatter<'_>, value: &str) -> fmt::Result {
    write!(f, "\"")?;
    for ch in value.chars() {
        match ch {
            '"' => write!(f, "\\\"")?,
            '\\' => write!(f, "\\\\")?,
            '\n' => write!(f, "\\n")?,
            c => write!(f, "{}", c)?,
        }
    }
    write!(f, "\"")
}

impl fmt::Display for Sexpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Sexpr::*;
        match self {
            Integer(value) => value.fmt(f),
            Float(value) => fmt_float(f, *value),
            True => write!(f, "#t"),
            False => write!(f, "#f"),
            Symbol(sym) => intern::with_name(*sym, |name| write!(f, "{}", name)),
            String(value) => fmt_string(f, value),
            Nil => write!(f, "()"),
            Undefined => write!(f, "undefined"),
            Pair(_) => {
                write!(f, "(")?;
                let mut iter = self.iter();
                let mut first = true;
                for elem in iter.by_ref() {
                    if !first {
                        write!(f, " ")?;
                    }
                    first = false;
                    write!(f, "{}", elem)?;
                }
                match iter.rest() {
                    Nil => (),
                    tail => write!(f, " . {}", tail)?,
                }
                write!(f, ")")
            }
            Func(prim) => write!(f, "#[primitive {}]", prim.name),
            Lambda(_) => write!(f, "#[lambda λ]"),
            Dlambda(_) => write!(f, "#[dlambda λ]"),
            Macro(_) => write!(f, "#[macro λ]"),
            Promise(promise) => match *promise.state.borrow() {
                PromiseState::Forced(_) => write!(f, "#[promise forced]"),
                _ => write!(f, "#[promise (not forced)]"),
            },
        }
    }
}

impl fmt::Debug for Sexpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl PartialEq for Sexpr {
    fn eq(&self, other: &Self) -> bool {
        use Sexpr::*;
        match (self, other) {
            (True, True) => true,
            (False, False) => true,
            (Nil, Nil) => true,
            (Undefined, Undefined) => true,
            (Symbol(s), Symbol(o)) => s == o,
            (String(s), String(o)) => s == o,
            // numbers compare across exactness
            (Integer(s), Integer(o)) => s == o,
            (Float(s), Float(o)) => s == o,
            (Integer(s), Float(o)) => &(*s as Flt) == o,
            (Float(s), Integer(o)) => s == &(*o as Flt),
            // pairs compare structurally
            (Pair(s), Pair(o)) => {
                Rc::ptr_eq(s, o) || (s.car == o.car && s.cdr == o.cdr)
            }
            // primitives are compared by host function address
            (Func(s), Func(o)) => s.name == o.name && s.func as usize == o.func as usize,
            // closures, macros, and promises by identity
            (Lambda(s), Lambda(o)) => Rc::ptr_eq(s, o),
            (Dlambda(s), Dlambda(o)) => Rc::ptr_eq(s, o),
            (Macro(s), Macro(o)) => Rc::ptr_eq(s, o),
            (Promise(s), Promise(o)) => Rc::ptr_eq(s, o),
            _ => false,
        }
    }
}

impl PartialOrd for Sexpr {
    fn partial_cmp(&self, other: &Sexpr) -> Option<Ordering> {
        match (self, other) {
            (Sexpr::Integer(x), Sexpr::Integer(y)) => x.partial_cmp(y),
            (Sexpr::Integer(x), Sexpr::Float(y)) => (*x as Flt).partial_cmp(y),
            (Sexpr::Float(x), Sexpr::Integer(y)) => x.partial_cmp(&(*y as Flt)),
            (Sexpr::Float(x), Sexpr::Float(y)) => x.partial_cmp(y),
            _ => None,
        }
    }
}

impl From<bool> for Sexpr {
    fn from(val: bool) -> Self {
        match val {
            true => Self::True,
            false => Self::False,
        }
    }
}

impl From<&str> for Sexpr {
    fn from(val: &str) -> Self {
        Sexpr::String(String::from(val))
    }
}

impl From<Vec<Sexpr>> for Sexpr {
    fn from(items: Vec<Sexpr>) -> Self {
        Sexpr::list(items)
    }
}
