//! String interning for GraphQL names.

use rustc_hash::FxHashMap;
use std::cell::RefCell;

/// An interned text identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Text(u32);

impl Text {
    /// Creates a new text from a raw index.
    #[must_use]
    pub const fn from_raw(index: u32) -> Self {
        Self(index)
    }
}

/// A string interner that deduplicates names while a document is parsed.
///
/// One interner lives for the duration of a single parse and lowering pass;
/// it is not shared between threads.
#[derive(Debug)]
pub struct Interner {
    map: RefCell<FxHashMap<String, Text>>,
    strings: RefCell<Vec<String>>,
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}

impl Interner {
    /// Creates a new interner with the GraphQL built-in names pre-registered.
    #[must_use]
    pub fn new() -> Self {
        let interner = Self {
            map: RefCell::new(FxHashMap::default()),
            strings: RefCell::new(Vec::new()),
        };

        for name in [
            "Int",
            "Float",
            "String",
            "Boolean",
            "ID",
            "Query",
            "type",
            "enum",
            "input",
            "scalar",
            "schema",
            "query",
            "mutation",
            "subscription",
            "fragment",
            "on",
            "directive",
            "true",
            "false",
            "null",
            "__typename",
            "__schema",
            "__type",
        ] {
            interner.intern(name);
        }

        interner
    }

    /// Interns a string, returning its identifier.
    pub fn intern(&self, s: &str) -> Text {
        let mut map = self.map.borrow_mut();
        if let Some(&id) = map.get(s) {
            return id;
        }

        let mut strings = self.strings.borrow_mut();
        let id = Text(strings.len() as u32);
        strings.push(s.to_string());
        map.insert(s.to_string(), id);
        id
    }

    /// Gets the string for an identifier.
    #[must_use]
    pub fn get(&self, id: Text) -> String {
        let strings = self.strings.borrow();
        strings.get(id.0 as usize).cloned().unwrap_or_default()
    }

    /// Returns true if the identifier refers to the given string.
    #[must_use]
    pub fn is(&self, id: Text, s: &str) -> bool {
        self.strings
            .borrow()
            .get(id.0 as usize)
            .is_some_and(|stored| stored == s)
    }

    /// Returns the number of interned strings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.strings.borrow().len()
    }

    /// Returns true if no strings are interned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strings.borrow().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern() {
        let interner = Interner::new();
        let id1 = interner.intern("today");
        let id2 = interner.intern("today");
        let id3 = interner.intern("testError");

        assert_eq!(id1, id2);
        assert_ne!(id1, id3);
    }

    #[test]
    fn test_get() {
        let interner = Interner::new();
        let id = interner.intern("Time");
        assert_eq!(interner.get(id), "Time");
        assert!(interner.is(id, "Time"));
        assert!(!interner.is(id, "String"));
    }

    #[test]
    fn test_builtin_names() {
        let interner = Interner::new();
        let before = interner.len();
        let int_id = interner.intern("Int");
        assert_eq!(interner.get(int_id), "Int");
        assert_eq!(interner.len(), before);
    }

    #[test]
    fn test_unknown_id_is_empty() {
        let interner = Interner::new();
        assert_eq!(interner.get(Text::from_raw(10_000)), "");
    }
}
