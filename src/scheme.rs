use crate::envir::Env;
use crate::intern::intern;
use crate::types::{PrimFn, Primitive, Sexpr};

mod numbers;
mod procedures;
pub mod special_forms;
mod utils;

/// Build the global environment, populated with every primitive procedure.
pub fn root_env() -> Env {
    let table: &[(&'static str, PrimFn)] = &[
        // arithmetic
        ("+", numbers::add),
        ("-", numbers::sub),
        ("*", numbers::mul),
        ("/", numbers::div),
        ("quotient", numbers::quotient),
        ("remainder", numbers::remainder),
        ("modulo", numbers::modulo),
        ("abs", numbers::abs),
        ("expt", numbers::expt),
        ("=", numbers::num_eq),
        ("<", numbers::lt),
        (">", numbers::gt),
        ("<=", numbers::le),
        (">=", numbers::ge),
        ("zero?", numbers::is_zero),
        ("even?", numbers::is_even),
        ("odd?", numbers::is_odd),
        ("sqrt", numbers::sqrt),
        ("exp", numbers::exp),
        ("log", numbers::log),
        ("sin", numbers::sin),
        ("cos", numbers::cos),
        ("tan", numbers::tan),
        ("atan", numbers::atan),
        ("floor", numbers::floor),
        ("ceil", numbers::ceil),
        ("trunc", numbers::trunc),
        // predicates
        ("number?", numbers::is_number),
        ("integer?", numbers::is_integer),
        ("atom?", procedures::is_atom),
        ("boolean?", procedures::is_boolean),
        ("list?", procedures::is_list),
        ("null?", procedures::is_null),
        ("pair?", procedures::is_pair),
        ("procedure?", procedures::is_procedure),
        ("promise?", procedures::is_promise),
        ("string?", procedures::is_string),
        ("symbol?", procedures::is_symbol),
        // equivalence
        ("eq?", procedures::is_eq),
        ("eqv?", procedures::is_eqv),
        ("equal?", procedures::is_equal),
        ("not", procedures::not),
        // pairs and lists
        ("cons", procedures::cons),
        ("car", procedures::car),
        ("cdr", procedures::cdr),
        ("list", procedures::list),
        ("length", procedures::length),
        ("append", procedures::append),
        ("map", procedures::map),
        ("filter", procedures::filter),
        ("reduce", procedures::reduce),
        // input/output
        ("print", procedures::print),
        ("display", procedures::display),
        ("displayln", procedures::displayln),
        ("newline", procedures::newline),
        ("error", procedures::raise_error),
        ("exit", procedures::exit),
        ("load", procedures::load),
        // meta
        ("eval", procedures::evalfn),
        ("apply", procedures::applyfn),
        // promises and streams
        ("force", procedures::force),
        ("stream-car", procedures::stream_car),
        ("stream-cdr", procedures::stream_cdr),
        ("stream-null?", procedures::is_stream_null),
        ("stream-pair?", procedures::is_stream_pair),
        ("stream-map", procedures::stream_map),
        ("stream-filter", procedures::stream_filter),
        ("stream-reduce", procedures::stream_reduce),
    ];

    let mut env = Env::new();
    for &(name, func) in table {
        env.insert(intern(name), Sexpr::Func(Primitive { name, func }));
    }
    env.insert(intern("undefined"), Sexpr::Undefined);
    env
}
