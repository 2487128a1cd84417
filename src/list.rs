use std::rc::Rc;

use crate::errors::Error;
use crate::types::Sexpr;

/// A cons cell. The cdr may be any value, so both proper lists
/// (nil-terminated) and dotted lists share this spine.
#[derive(Debug, Clone)]
pub struct Pair {
    pub car: Sexpr,
    pub cdr: Sexpr,
}

impl Sexpr {
    #[inline]
    pub fn cons(car: Sexpr, cdr: Sexpr) -> Sexpr {
        Sexpr::Pair(Rc::new(Pair { car, cdr }))
    }

    /// Build a proper list from the items.
    pub fn list(items: Vec<Sexpr>) -> Sexpr {
        let mut result = Sexpr::Nil;
        for item in items.into_iter().rev() {
            result = Sexpr::cons(item, result);
        }
        result
    }

    /// Build a dotted list ending in `tail`.
    pub fn dotted_list(items: Vec<Sexpr>, tail: Sexpr) -> Sexpr {
        let mut result = tail;
        for item in items.into_iter().rev() {
            result = Sexpr::cons(item, result);
        }
        result
    }

    /// Iterate over the cars along the pair spine, stopping at the first
    /// non-pair cdr. `ListIter::rest` exposes the unconsumed tail, so the
    /// caller can tell a proper list from a dotted one.
    #[inline]
    pub fn iter(&self) -> ListIter<'_> {
        ListIter { cursor: self }
    }

    /// The car, when this is a pair.
    #[inline]
    pub fn head(&self) -> Option<&Sexpr> {
        match self {
            Sexpr::Pair(pair) => Some(&pair.car),
            _ => None,
        }
    }

    /// The cdr, when this is a pair.
    #[inline]
    pub fn tail(&self) -> Option<&Sexpr> {
        match self {
            Sexpr::Pair(pair) => Some(&pair.cdr),
            _ => None,
        }
    }

    /// Is this a well-formed (nil-terminated) list?
    pub fn is_list(&self) -> bool {
        let mut iter = self.iter();
        iter.by_ref().for_each(drop);
        matches!(iter.rest(), Sexpr::Nil)
    }

    /// Length of a proper list; `Err` on a dotted list or non-list.
    pub fn list_len(&self) -> Result<usize, Error> {
        let mut iter = self.iter();
        let count = iter.by_ref().count();
        match iter.rest() {
            Sexpr::Nil => Ok(count),
            _ => Err(Error::bad_form(self)),
        }
    }

    /// Collect a proper list into a vector; `Err` on a dotted list.
    pub fn list_to_vec(&self) -> Result<Vec<Sexpr>, Error> {
        let mut iter = self.iter();
        let items: Vec<Sexpr> = iter.by_ref().cloned().collect();
        match iter.rest() {
            Sexpr::Nil => Ok(items),
            _ => Err(Error::bad_form(self)),
        }
    }
}

#[derive(Clone)]
pub struct ListIter<'a> {
    cursor: &'a Sexpr,
}

impl<'a> ListIter<'a> {
    /// The part of the spine not yet consumed: `Nil` after a proper list,
    /// the dotted tail otherwise.
    #[inline]
    pub fn rest(&self) -> &'a Sexpr {
        self.cursor
    }
}

impl<'a> Iterator for ListIter<'a> {
    type Item = &'a Sexpr;

    fn next(&mut self) -> Option<Self::Item> {
        match self.cursor {
            Sexpr::Pair(pair) => {
                self.cursor = &pair.cdr;
                Some(&pair.car)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_builds_nil_terminated_spine() {
        assert_eq!(Sexpr::list(vec![]), Sexpr::Nil);

        let list = Sexpr::list(vec![Sexpr::Integer(1), Sexpr::Integer(2)]);
        assert_eq!(list.head(), Some(&Sexpr::Integer(1)));
        let rest = list.tail().unwrap();
        assert_eq!(rest.head(), Some(&Sexpr::Integer(2)));
        assert_eq!(rest.tail(), Some(&Sexpr::Nil));
    }

    #[test]
    fn dotted_list_keeps_its_tail() {
        let pair = Sexpr::dotted_list(vec![Sexpr::Integer(1)], Sexpr::Integer(2));
        assert_eq!(pair.head(), Some(&Sexpr::Integer(1)));
        assert_eq!(pair.tail(), Some(&Sexpr::Integer(2)));
        assert!(!pair.is_list());
    }

    #[test]
    fn iter_walks_the_spine() {
        let list = Sexpr::list(vec![
            Sexpr::Integer(1),
            Sexpr::Integer(2),
            Sexpr::Integer(3),
        ]);
        let collected: Vec<&Sexpr> = list.iter().collect();
        assert_eq!(
            collected,
            vec![&Sexpr::Integer(1), &Sexpr::Integer(2), &Sexpr::Integer(3)]
        );

        let mut iter = list.iter();
        iter.next();
        assert_eq!(iter.rest().head(), Some(&Sexpr::Integer(2)));
    }

    #[test]
    fn iter_stops_at_a_dotted_tail() {
        let pair = Sexpr::dotted_list(
            vec![Sexpr::Integer(1), Sexpr::Integer(2)],
            Sexpr::Integer(3),
        );
        let mut iter = pair.iter();
        assert_eq!(iter.next(), Some(&Sexpr::Integer(1)));
        assert_eq!(iter.next(), Some(&Sexpr::Integer(2)));
        assert_eq!(iter.next(), None);
        assert_eq!(iter.rest(), &Sexpr::Integer(3));
    }

    #[test]
    fn list_len() {
        assert_eq!(Sexpr::Nil.list_len(), Ok(0));
        assert_eq!(
            Sexpr::list(vec![Sexpr::True, Sexpr::False]).list_len(),
            Ok(2)
        );
        assert!(Sexpr::dotted_list(vec![Sexpr::True], Sexpr::False)
            .list_len()
            .is_err());
        assert!(Sexpr::Integer(1).list_len().is_err());
    }

    #[test]
    fn shared_tails_are_cheap() {
        let tail = Sexpr::list(vec![Sexpr::Integer(2), Sexpr::Integer(3)]);
        let a = Sexpr::cons(Sexpr::Integer(1), tail.clone());
        let b = Sexpr::cons(Sexpr::Integer(0), tail.clone());
        assert_eq!(a.tail(), Some(&tail));
        assert_eq!(b.tail(), Some(&tail));
    }
}
