use std::cell::RefCell;

use string_interner::{DefaultBackend, DefaultSymbol, StringInterner};

/// An interned symbol. Two symbols with the same spelling share the same key.
pub type Symbol = DefaultSymbol;

thread_local! {
    // The interpreter is single-threaded; the table lives for the whole session.
    static SYMBOLS: RefCell<StringInterner<DefaultBackend>> =
        RefCell::new(StringInterner::new());
}

/// Intern `name`, returning its symbol key.
pub fn intern(name: &str) -> Symbol {
    SYMBOLS.with(|table| table.borrow_mut().get_or_intern(name))
}

/// Run `f` on the spelling of an interned symbol.
pub fn with_name<R>(sym: Symbol, f: impl FnOnce(&str) -> R) -> R {
    SYMBOLS.with(|table| {
        let table = table.borrow();
        // Symbols only come out of `intern`, so resolution cannot fail.
        f(table.resolve(sym).unwrap())
    })
}

/// The spelling of an interned symbol, as an owned string.
pub fn name(sym: Symbol) -> String {
    with_name(sym, str::to_owned)
}

/// Does `sym` spell exactly `text`?
pub fn is_named(sym: Symbol, text: &str) -> bool {
    with_name(sym, |spelling| spelling == text)
}

#[cfg(test)]
mod tests {
    use super::{intern, is_named, name};

    #[test]
    fn same_spelling_same_key() {
        assert_eq!(intern("abc"), intern("abc"));
        assert_ne!(intern("abc"), intern("abd"));
    }

    #[test]
    fn case_is_preserved() {
        assert_ne!(intern("Foo"), intern("foo"));
        assert_eq!(name(intern("Foo")), "Foo");
    }

    #[test]
    fn named() {
        assert!(is_named(intern("set!"), "set!"));
        assert!(!is_named(intern("set!"), "set"));
    }
}
