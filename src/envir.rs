use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::intern::Symbol;
use crate::types::Sexpr;

/// A chain of frames mapping symbols to values. Cloning an `Env` is cheap
/// and shares the underlying frame, so closures and the evaluator can hold
/// the same frame and observe each other's `define`/`set!`.
#[derive(Clone)]
pub struct Env(Rc<RefCell<Frame>>);

struct Frame {
    bindings: HashMap<Symbol, Sexpr>,
    parent: Option<Env>,
}

impl Env {
    /// Create the root environment
    pub fn new() -> Self {
        Env(Rc::new(RefCell::new(Frame {
            bindings: HashMap::new(),
            parent: None,
        })))
    }

    /// Create an environment inheriting from the current one
    #[inline]
    pub fn branch(&self) -> Self {
        Env(Rc::new(RefCell::new(Frame {
            bindings: HashMap::new(),
            parent: Some(self.clone()),
        })))
    }

    /// Bind `key` in this frame, shadowing any outer binding
    #[inline]
    pub fn insert(&mut self, key: Symbol, val: Sexpr) {
        self.0.borrow_mut().bindings.insert(key, val);
    }

    /// Get (recursively) the value associated with the key if available
    #[inline]
    pub fn get(&self, key: Symbol) -> Option<Sexpr> {
        let frame = self.0.borrow();
        if let Some(val) = frame.bindings.get(&key) {
            Some(val.clone())
        } else {
            frame.parent.as_ref().and_then(|parent| parent.get(key))
        }
    }

    /// Find (recursively) the environment that binds the key
    #[inline]
    pub fn find_env(&self, key: Symbol) -> Option<Self> {
        let frame = self.0.borrow();
        if frame.bindings.contains_key(&key) {
            Some(self.clone())
        } else {
            frame.parent.as_ref().and_then(|parent| parent.find_env(key))
        }
    }
}

impl Default for Env {
    fn default() -> Self {
        Self::new()
    }
}

// Environments are compared by frame identity; two chains are the same
// environment only if they share the same first frame.
impl PartialEq for Env {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Env {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let frame = self.0.borrow();
        write!(f, "{{")?;
        let mut first = true;
        for (key, val) in frame.bindings.iter() {
            if !first {
                write!(f, ", ")?;
            }
            first = false;
            write!(f, "{:?}: {}", key, val)?;
        }
        write!(f, "}}")?;
        match &frame.parent {
            Some(parent) => write!(f, " -> {:?}", parent),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Env;
    use crate::intern::intern;
    use crate::types::Sexpr;

    #[test]
    fn insert() {
        let mut env = Env::new();
        assert_eq!(env.get(intern("foo")), None);

        env.insert(intern("foo"), Sexpr::Integer(42));
        assert_eq!(env.get(intern("foo")), Some(Sexpr::Integer(42)));

        env.insert(intern("bar"), Sexpr::True);
        assert_eq!(env.get(intern("foo")), Some(Sexpr::Integer(42)));
        assert_eq!(env.get(intern("bar")), Some(Sexpr::True));

        env.insert(intern("foo"), Sexpr::from("ok?"));
        assert_eq!(env.get(intern("foo")), Some(Sexpr::from("ok?")));
    }

    #[test]
    fn branch() {
        let mut root = Env::new();
        root.insert(intern("foo"), Sexpr::Integer(42));

        {
            let mut local = root.branch();
            assert_eq!(root.get(intern("foo")), Some(Sexpr::Integer(42)));
            assert_eq!(local.get(intern("foo")), Some(Sexpr::Integer(42)));

            local.insert(intern("foo"), Sexpr::True);
            assert_eq!(root.get(intern("foo")), Some(Sexpr::Integer(42)));
            assert_eq!(local.get(intern("foo")), Some(Sexpr::True));
        }

        assert_eq!(root.get(intern("foo")), Some(Sexpr::Integer(42)));
    }

    #[test]
    fn find_env() {
        let mut root = Env::new();
        root.insert(intern("foo"), Sexpr::Integer(42));

        assert_eq!(root.find_env(intern("foo")), Some(root.clone()));

        let local1 = root.branch();
        assert_eq!(local1.find_env(intern("foo")), Some(root.clone()));

        let local2 = local1.branch();
        assert_eq!(local2.find_env(intern("foo")), Some(root.clone()));
        assert_eq!(local2.find_env(intern("bar")), None);
    }

    #[test]
    fn compared_by_identity() {
        let root = Env::new();
        assert_eq!(root, root.clone());
        assert_ne!(root, Env::new());
        assert_ne!(root, root.branch());
    }
}
