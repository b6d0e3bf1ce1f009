//! String Interner - Deduplicate tag and attribute names
//!
//! Tag names ("div", "span") and attribute names ("class", "id") are stored
//! once and referenced by a 4-byte ID.

use std::collections::HashMap;

/// Interned string ID - just 4 bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct InternedString(pub u32);

impl InternedString {
    /// Empty string
    pub const EMPTY: InternedString = InternedString(0);
}

/// String interner for deduplicating names
#[derive(Debug)]
pub struct StringInterner {
    strings: Vec<Box<str>>,
    map: HashMap<Box<str>, u32>,
}

impl StringInterner {
    /// Create a new interner with common names pre-interned
    pub fn new() -> Self {
        let mut interner = Self {
            strings: Vec::with_capacity(64),
            map: HashMap::with_capacity(64),
        };

        // Empty string is always index 0
        interner.intern("");

        const COMMON: &[&str] = &[
            "html", "head", "body", "div", "span", "p", "a", "ul", "li",
            "button", "input", "form", "section",
            "id", "class", "style", "title", "type", "name", "value", "role",
        ];
        for name in COMMON {
            interner.intern(name);
        }

        interner
    }

    /// Intern a string, returning its ID.
    /// If the string is already interned, returns the existing ID.
    pub fn intern(&mut self, s: &str) -> InternedString {
        if let Some(&idx) = self.map.get(s) {
            return InternedString(idx);
        }

        let idx = self.strings.len() as u32;
        self.strings.push(s.into());
        self.map.insert(s.into(), idx);
        InternedString(idx)
    }

    /// Look up a string without interning it
    pub fn lookup(&self, s: &str) -> Option<InternedString> {
        self.map.get(s).map(|&idx| InternedString(idx))
    }

    /// Get the string for an interned ID
    #[inline]
    pub fn get(&self, id: InternedString) -> &str {
        self.strings.get(id.0 as usize).map_or("", |s| s)
    }

    /// Number of interned strings
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    /// Approximate heap usage in bytes
    pub fn memory_usage(&self) -> usize {
        let bytes: usize = self.strings.iter().map(|s| s.len() * 2).sum();
        bytes
            + self.strings.capacity() * std::mem::size_of::<Box<str>>()
            + self.map.capacity() * (std::mem::size_of::<Box<str>>() + std::mem::size_of::<u32>())
    }
}

impl Default for StringInterner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_dedup() {
        let mut interner = StringInterner::new();
        let id1 = interner.intern("hello");
        let id2 = interner.intern("hello");
        assert_eq!(id1, id2);
    }

    #[test]
    fn test_get_string() {
        let mut interner = StringInterner::new();
        let id = interner.intern("world");
        assert_eq!(interner.get(id), "world");
        assert_eq!(interner.get(InternedString::EMPTY), "");
    }

    #[test]
    fn test_lookup_does_not_intern() {
        let interner = StringInterner::new();
        let before = interner.len();
        assert!(interner.lookup("not-there").is_none());
        assert!(interner.lookup("div").is_some());
        assert_eq!(interner.len(), before);
    }
}
