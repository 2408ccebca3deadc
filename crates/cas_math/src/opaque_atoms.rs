//! Opaque atoms: sub-expressions treated as polynomial variables.
//!
//! Variables, constants like `pi`, function calls such as `sin(x)` and powers
//! with non-integer exponents all become atoms. Each atom is identified by its
//! canonical key, so `sin(2*x)` and `sin(x*2)` share one variable index.

use crate::multipoly::VarIdx;
use rustc_hash::FxHashMap;

/// Interning table mapping canonical atom keys to polynomial variable indices.
#[derive(Debug, Clone, Default)]
pub struct AtomTable {
    keys: Vec<String>,
    index: FxHashMap<String, VarIdx>,
}

impl AtomTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index for `key`, allocating a new variable on first sight.
    pub fn intern(&mut self, key: &str) -> VarIdx {
        if let Some(&idx) = self.index.get(key) {
            return idx;
        }
        let idx = self.keys.len();
        self.keys.push(key.to_string());
        self.index.insert(key.to_string(), idx);
        idx
    }

    pub fn get(&self, key: &str) -> Option<VarIdx> {
        self.index.get(key).copied()
    }

    pub fn key(&self, idx: VarIdx) -> Option<&str> {
        self.keys.get(idx).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_is_stable() {
        let mut atoms = AtomTable::new();
        let a = atoms.intern("x");
        let b = atoms.intern("sin(x)");
        assert_eq!(atoms.intern("x"), a);
        assert_ne!(a, b);
        assert_eq!(atoms.key(b), Some("sin(x)"));
        assert_eq!(atoms.get("y"), None);
        assert_eq!(atoms.len(), 2);
    }
}
