//! Symbol interning for variable and function names.
//!
//! Every name is stored once and referenced by [`SymbolId`], which keeps
//! `Expr` cheap to hash and compare inside the hash-consing arena.

use rustc_hash::FxHashMap;

/// Unique identifier for an interned symbol.
///
/// Using usize for direct Vec indexing without casts.
pub type SymbolId = usize;

/// Symbol table for interning names.
///
/// # Design
/// - `strings`: canonical storage, indexed by SymbolId
/// - `lookup`: reverse map for O(1) intern check
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    strings: Vec<String>,
    lookup: FxHashMap<String, SymbolId>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a string, returning its SymbolId.
    pub fn intern(&mut self, s: &str) -> SymbolId {
        if let Some(&id) = self.lookup.get(s) {
            return id;
        }

        let id = self.strings.len();
        self.strings.push(s.to_string());
        self.lookup.insert(s.to_string(), id);
        id
    }

    /// Look up a name without interning it.
    pub fn get(&self, s: &str) -> Option<SymbolId> {
        self.lookup.get(s).copied()
    }

    /// Resolve a SymbolId back to its string.
    ///
    /// # Panics
    /// Panics if id was not produced by this table.
    #[inline]
    pub fn resolve(&self, id: SymbolId) -> &str {
        &self.strings[id]
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}
