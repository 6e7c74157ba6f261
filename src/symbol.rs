use lasso::{Spur, ThreadedRodeo};

/// Interned identifier for a symbolic atom (operator names, string atoms,
/// class names, variable debug names).
pub type SymId = Spur;

/// Thread-safe symbol store.
///
/// Guarantees:
/// - Same string always produces the same SymId
/// - Different strings always produce different SymIds
/// - A SymId resolves back to its original string
pub struct SymbolStore {
    rodeo: ThreadedRodeo,
}

impl SymbolStore {
    /// Create a new empty symbol store.
    pub fn new() -> Self {
        Self {
            rodeo: ThreadedRodeo::new(),
        }
    }

    /// Intern a string, returning its unique SymId.
    pub fn intern(&self, name: &str) -> SymId {
        self.rodeo.get_or_intern(name)
    }

    /// Resolve a SymId back to its string.
    /// Returns None if the id was not created by this store.
    pub fn resolve(&self, id: SymId) -> Option<&str> {
        self.rodeo.try_resolve(&id)
    }

    /// Get the SymId for a string if it was interned, without interning.
    pub fn get(&self, name: &str) -> Option<SymId> {
        self.rodeo.get(name)
    }

    /// Check whether a string has already been interned.
    pub fn contains(&self, name: &str) -> bool {
        self.rodeo.contains(name)
    }
}

impl Default for SymbolStore {
    fn default() -> Self {
        Self::new()
    }
}
