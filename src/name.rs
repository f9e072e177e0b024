//! Process-wide name interning.
//!
//! Names are the keys that hold the runtime together: dictionary lookup,
//! operator dispatch, and resource categories all go through them, so
//! comparisons must be cheap. Interning maps every byte sequence to a
//! single stable allocation; two names are equal iff they hold the same
//! pointer, and the pointer doubles as the hash key.

use std::{
    cmp::Ordering,
    collections::HashSet,
    fmt,
    hash::{Hash, Hasher},
    sync::Mutex,
};

use once_cell::sync::Lazy;

/// The global intern pool. Entries are leaked to obtain `'static` storage;
/// they never move and never go away, which is what gives `Name` its
/// identity semantics. A single mutex is enough here: interning is rare
/// after warm-up, lookups happen on already-interned handles.
static NAME_TABLE: Lazy<Mutex<HashSet<&'static [u8]>>> = Lazy::new(|| Mutex::new(HashSet::new()));

/// A stable, trivially-copyable handle to an interned byte sequence
#[derive(Clone, Copy)]
pub struct Name(&'static [u8]);

impl Name {
    pub fn new(bytes: &[u8]) -> Self {
        let mut table = NAME_TABLE.lock().unwrap();

        if let Some(&interned) = table.get(bytes) {
            return Self(interned);
        }

        let interned: &'static [u8] = Box::leak(bytes.to_vec().into_boxed_slice());
        table.insert(interned);

        Self(interned)
    }

    pub fn as_bytes(&self) -> &'static [u8] {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Byte-wise comparison, used by the lexical relational operators
    pub fn lexical_cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(other.0)
    }
}

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        // interning guarantees content equality implies pointer equality
        std::ptr::eq(self.0, other.0)
    }
}

impl Eq for Name {}

impl Hash for Name {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (self.0.as_ptr() as usize).hash(state);
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", String::from_utf8_lossy(self.0))
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(self.0))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::thread;

    #[test]
    fn same_bytes_same_handle() {
        let a = Name::new(b"moveto");
        let b = Name::new(b"moveto");

        assert_eq!(a, b);
        assert!(std::ptr::eq(a.as_bytes(), b.as_bytes()));
    }

    #[test]
    fn different_bytes_different_handle() {
        assert_ne!(Name::new(b"moveto"), Name::new(b"lineto"));
    }

    #[test]
    fn empty_name() {
        let a = Name::new(b"");
        assert_eq!(a, Name::new(b""));
        assert!(a.is_empty());
    }

    #[test]
    fn concurrent_interning_is_consistent() {
        let handles: Vec<_> = (0..16)
            .map(|_| thread::spawn(|| Name::new(b"concurrent-name")))
            .collect();

        let names: Vec<Name> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        for name in &names[1..] {
            assert_eq!(names[0], *name);
        }
    }

    #[test]
    fn lexical_ordering_is_bytewise() {
        assert_eq!(
            Name::new(b"abc").lexical_cmp(&Name::new(b"abd")),
            Ordering::Less
        );
    }
}
