use crate::error::Error;
use crate::proto::{ClassDef, ClassId, TermTag, UnifyHook};
use crate::symbol::{SymId, SymbolStore};
use hashbrown::HashMap;
use parking_lot::RwLock;
use rustc_hash::FxHasher;
use smallvec::SmallVec;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU32, Ordering};

/// Unique identifier for a term in the term store.
/// TermIds are stable; two structurally equal terms share one id, so
/// ground-term equality is id equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TermId(u32);

impl TermId {
    /// Get the raw u32 value (for debugging/display).
    pub fn raw(self) -> u32 {
        self.0
    }

    pub(crate) fn from_raw(raw: u32) -> Self {
        TermId(raw)
    }
}

/// A term: variable, atom, or compound.
///
/// Compounds are cons chains; the first element of a chain is the head
/// operator. `Nil` is the empty sequence, distinct from every atom, so a
/// genuinely empty compound is representable. `Ext` terms belong to a
/// user-registered class with its own structural protocol.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Term {
    /// A logic variable, identified by its monotonic allocation index.
    Var(u32),
    /// An interned symbolic atom.
    Sym(SymId),
    /// An integer atom.
    Int(i64),
    /// The empty sequence.
    Nil,
    /// A sequence cell: first element and rest.
    Cons(TermId, TermId),
    /// An instance of a registered term class.
    Ext(ClassId, SmallVec<[TermId; 4]>),
    /// A reification placeholder for an unbound variable (`~_k`).
    Hole(u32),
}

/// Number of shards for hashcons maps (power of 2 for fast modulo).
const NUM_SHARDS: usize = 16;

/// Thread-safe term store with hashconsing.
///
/// The store is the shared context of a query: it interns terms, allocates
/// logic variables, and carries the term-class and unification-hook
/// registries. Goals reach it through the state they are applied to.
pub struct TermStore {
    /// Symbol interner for atoms, class names and variable debug names.
    symbols: SymbolStore,
    /// Central storage of all terms, indexed by TermId.
    nodes: RwLock<Vec<Term>>,
    /// Sharded hashcons maps for reducing contention.
    shards: [RwLock<HashMap<Term, TermId>>; NUM_SHARDS],
    /// Counter for generating unique TermIds.
    next_id: AtomicU32,
    /// Counter for allocating logic variables.
    next_var: AtomicU32,
    /// Debug names for named variables.
    var_names: RwLock<HashMap<u32, SymId>>,
    /// Registered term classes, indexed by ClassId.
    classes: RwLock<Vec<ClassDef>>,
    /// Head symbol -> class lookup for reconstruction.
    class_syms: RwLock<HashMap<SymId, ClassId>>,
    /// Unification hooks keyed on pairs of term tags. Last registration wins.
    unify_hooks: RwLock<HashMap<(TermTag, TermTag), UnifyHook>>,
    /// Whether unification performs the occurs check.
    occurs_check: bool,
}

impl TermStore {
    /// Create a new empty term store. The occurs check is off, matching the
    /// usual miniKanren contract (`appendo` and friends rely on that).
    pub fn new() -> Self {
        let shards = std::array::from_fn(|_| RwLock::new(HashMap::new()));
        Self {
            symbols: SymbolStore::new(),
            nodes: RwLock::new(Vec::new()),
            shards,
            next_id: AtomicU32::new(0),
            next_var: AtomicU32::new(0),
            var_names: RwLock::new(HashMap::new()),
            classes: RwLock::new(Vec::new()),
            class_syms: RwLock::new(HashMap::new()),
            unify_hooks: RwLock::new(HashMap::new()),
            occurs_check: false,
        }
    }

    /// Create a store whose unifier performs the occurs check.
    pub fn with_occurs_check() -> Self {
        Self {
            occurs_check: true,
            ..Self::new()
        }
    }

    /// Whether unification against this store performs the occurs check.
    pub fn occurs_check_enabled(&self) -> bool {
        self.occurs_check
    }

    /// The symbol interner backing this store.
    pub fn symbols(&self) -> &SymbolStore {
        &self.symbols
    }

    /// Intern a term, returning its TermId.
    /// If the term already exists, returns the existing TermId.
    fn intern(&self, term: Term) -> TermId {
        let shard_idx = Self::shard_index(&term);
        let shard = &self.shards[shard_idx];

        // Fast path: check if term exists (read lock)
        {
            let map = shard.read();
            if let Some(&id) = map.get(&term) {
                return id;
            }
        }

        // Slow path: need to insert (write lock)
        let mut map = shard.write();

        // Double-check after acquiring write lock
        if let Some(&id) = map.get(&term) {
            return id;
        }

        let id = TermId(self.next_id.fetch_add(1, Ordering::Relaxed));
        {
            let mut nodes = self.nodes.write();
            let idx = id.0 as usize;
            if nodes.len() <= idx {
                nodes.resize(idx + 1, Term::Nil); // placeholder
            }
            nodes[idx] = term.clone();
        }
        map.insert(term, id);
        id
    }

    /// Allocate a fresh unnamed logic variable.
    pub fn var(&self) -> TermId {
        let idx = self.next_var.fetch_add(1, Ordering::Relaxed);
        self.intern(Term::Var(idx))
    }

    /// Allocate a fresh logic variable carrying a debug name.
    /// The name only affects printing; identity is still the index.
    pub fn named_var(&self, name: &str) -> TermId {
        let idx = self.next_var.fetch_add(1, Ordering::Relaxed);
        let sym = self.symbols.intern(name);
        self.var_names.write().insert(idx, sym);
        self.intern(Term::Var(idx))
    }

    /// Allocate N fresh unnamed variables.
    pub fn vars<const N: usize>(&self) -> [TermId; N] {
        std::array::from_fn(|_| self.var())
    }

    /// The term for an already-allocated variable index.
    pub(crate) fn var_ref(&self, idx: u32) -> TermId {
        self.intern(Term::Var(idx))
    }

    /// Debug name of a variable index, if it has one.
    pub fn var_name(&self, idx: u32) -> Option<SymId> {
        self.var_names.read().get(&idx).copied()
    }

    /// Intern a symbolic atom.
    pub fn sym(&self, name: &str) -> TermId {
        let id = self.symbols.intern(name);
        self.intern(Term::Sym(id))
    }

    /// Intern an integer atom.
    pub fn int(&self, value: i64) -> TermId {
        self.intern(Term::Int(value))
    }

    /// The atom term for an already-interned symbol.
    pub(crate) fn sym_ref(&self, id: SymId) -> TermId {
        self.intern(Term::Sym(id))
    }

    /// The empty sequence.
    pub fn nil(&self) -> TermId {
        self.intern(Term::Nil)
    }

    /// A sequence cell.
    pub fn cons(&self, head: TermId, tail: TermId) -> TermId {
        self.intern(Term::Cons(head, tail))
    }

    /// A proper sequence of the given elements.
    pub fn list(&self, elems: &[TermId]) -> TermId {
        let mut out = self.nil();
        for &e in elems.iter().rev() {
            out = self.cons(e, out);
        }
        out
    }

    /// A compound: head operator followed by its arguments.
    pub fn expr(&self, head: TermId, args: &[TermId]) -> TermId {
        let mut out = self.nil();
        for &a in args.iter().rev() {
            out = self.cons(a, out);
        }
        self.cons(head, out)
    }

    /// A reification placeholder.
    pub(crate) fn hole(&self, k: u32) -> TermId {
        self.intern(Term::Hole(k))
    }

    /// An instance of a registered class. Fails if the class declared a
    /// fixed arity and the child count does not match.
    pub fn ext(&self, class: ClassId, children: &[TermId]) -> Result<TermId, Error> {
        let def = self
            .class_def(class)
            .ok_or_else(|| Error::Protocol {
                detail: format!("unregistered class id {}", class.raw()),
            })?;
        if let Some(expected) = def.arity {
            if expected != children.len() {
                return Err(Error::Arity {
                    class: def.name,
                    expected,
                    got: children.len(),
                });
            }
        }
        Ok(self.intern(Term::Ext(class, children.iter().copied().collect())))
    }

    /// Rebuild a class instance with a known-good child count.
    pub(crate) fn ext_raw(&self, class: ClassId, children: SmallVec<[TermId; 4]>) -> TermId {
        self.intern(Term::Ext(class, children))
    }

    /// Resolve a TermId to its term.
    /// Returns None if the TermId is invalid.
    pub fn resolve(&self, id: TermId) -> Option<Term> {
        let nodes = self.nodes.read();
        nodes.get(id.0 as usize).cloned()
    }

    /// The kind tag of a term, used for dispatch and type constraints.
    pub fn tag(&self, id: TermId) -> TermTag {
        match self.resolve(id) {
            Some(Term::Var(_)) => TermTag::Var,
            Some(Term::Sym(_)) => TermTag::Sym,
            Some(Term::Int(_)) => TermTag::Int,
            Some(Term::Nil) => TermTag::Nil,
            Some(Term::Cons(_, _)) => TermTag::Cons,
            Some(Term::Ext(c, _)) => TermTag::Class(c),
            Some(Term::Hole(_)) | None => TermTag::Hole,
        }
    }

    /// Check if a term is a variable, returning its index.
    pub fn is_var(&self, id: TermId) -> Option<u32> {
        match self.resolve(id) {
            Some(Term::Var(idx)) => Some(idx),
            _ => None,
        }
    }

    /// Structurally ground: no variable occurs anywhere in the term.
    /// (Callers resolve bindings first; this does not consult a substitution.)
    pub fn is_ground(&self, id: TermId) -> bool {
        let mut stack: SmallVec<[TermId; 16]> = SmallVec::new();
        stack.push(id);
        while let Some(t) = stack.pop() {
            match self.resolve(t) {
                Some(Term::Var(_)) => return false,
                Some(Term::Cons(h, r)) => {
                    stack.push(h);
                    stack.push(r);
                }
                Some(Term::Ext(_, children)) => {
                    for c in children.iter() {
                        stack.push(*c);
                    }
                }
                _ => {}
            }
        }
        true
    }

    /// Walk a sequence spine, returning its elements and its tail term.
    /// A proper sequence has tail `Nil`; an unbound spine ends in a `Var`.
    pub fn spine(&self, id: TermId) -> (Vec<TermId>, TermId) {
        let mut elems = Vec::new();
        let mut cur = id;
        loop {
            match self.resolve(cur) {
                Some(Term::Cons(h, r)) => {
                    elems.push(h);
                    cur = r;
                }
                _ => return (elems, cur),
            }
        }
    }

    /// Register a term class, returning its ClassId. The class name is
    /// interned and serves as the head symbol of its instances; `arity`
    /// fixes the child count (checked at reconstruction); `unify`
    /// optionally overrides unification for same-class pairs.
    pub fn register_class(
        &self,
        name: &str,
        arity: Option<usize>,
        unify: Option<UnifyHook>,
    ) -> ClassId {
        let sym = self.symbols.intern(name);
        let id = {
            let mut classes = self.classes.write();
            let id = ClassId::from_raw(classes.len() as u32);
            classes.push(ClassDef {
                name: name.to_string(),
                sym,
                arity,
            });
            id
        };
        // Last registration wins for the head symbol.
        self.class_syms.write().insert(sym, id);
        if let Some(hook) = unify {
            self.register_unify(TermTag::Class(id), TermTag::Class(id), hook);
        }
        id
    }

    /// Register a unification hook for a pair of term tags.
    /// Registration is additive; last registration wins.
    pub fn register_unify(&self, a: TermTag, b: TermTag, hook: UnifyHook) {
        self.unify_hooks.write().insert((a, b), hook);
    }

    /// Look up a unification hook for a pair of tags. The boolean reports
    /// whether the operands must be swapped to match the registered order.
    pub(crate) fn unify_hook(&self, a: TermTag, b: TermTag) -> Option<(UnifyHook, bool)> {
        let hooks = self.unify_hooks.read();
        if let Some(h) = hooks.get(&(a, b)) {
            return Some((h.clone(), false));
        }
        hooks.get(&(b, a)).map(|h| (h.clone(), true))
    }

    /// Snapshot of a class definition.
    pub fn class_def(&self, id: ClassId) -> Option<ClassDef> {
        self.classes.read().get(id.raw() as usize).cloned()
    }

    /// The class registered under a head symbol, if any.
    pub fn class_of_sym(&self, sym: SymId) -> Option<ClassId> {
        self.class_syms.read().get(&sym).copied()
    }

    /// Get the shard index for a term (for hashconsing distribution).
    fn shard_index(term: &Term) -> usize {
        let mut hasher = FxHasher::default();
        term.hash(&mut hasher);
        (hasher.finish() as usize) % NUM_SHARDS
    }
}

impl Default for TermStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Render a term for display. Named variables print as `~name`, unnamed
/// variables and holes as `~_k`, sequences lispy: `(h a b)`, with improper
/// tails as `(a b . t)`.
pub fn format_term(term: TermId, store: &TermStore) -> String {
    let mut out = String::new();
    render(term, store, &mut out);
    out
}

fn render(term: TermId, store: &TermStore, out: &mut String) {
    match store.resolve(term) {
        Some(Term::Var(idx)) => match store.var_name(idx).and_then(|s| {
            store.symbols().resolve(s).map(|n| n.to_string())
        }) {
            Some(name) => {
                out.push('~');
                out.push_str(&name);
            }
            None => {
                out.push_str("~_");
                out.push_str(&idx.to_string());
            }
        },
        Some(Term::Hole(k)) => {
            out.push_str("~_");
            out.push_str(&k.to_string());
        }
        Some(Term::Sym(s)) => {
            out.push_str(store.symbols().resolve(s).unwrap_or("<sym?>"));
        }
        Some(Term::Int(i)) => out.push_str(&i.to_string()),
        Some(Term::Nil) => out.push_str("()"),
        Some(Term::Cons(h, r)) => {
            out.push('(');
            render(h, store, out);
            let mut cur = r;
            loop {
                match store.resolve(cur) {
                    Some(Term::Cons(h2, r2)) => {
                        out.push(' ');
                        render(h2, store, out);
                        cur = r2;
                    }
                    Some(Term::Nil) => break,
                    _ => {
                        out.push_str(" . ");
                        render(cur, store, out);
                        break;
                    }
                }
            }
            out.push(')');
        }
        Some(Term::Ext(class, children)) => {
            let name = store
                .class_def(class)
                .map(|d| d.name)
                .unwrap_or_else(|| "<class?>".to_string());
            out.push('(');
            out.push_str(&name);
            for c in children.iter() {
                out.push(' ');
                render(*c, store, out);
            }
            out.push(')');
        }
        None => out.push_str("<term?>"),
    }
}
