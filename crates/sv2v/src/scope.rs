//! The Scoper (spec §4.2, component C3): a lexically-scoped symbol table
//! layered on top of the traversal kit.
//!
//! `ScopeStack<Meta>` is the concrete struct the teacher's design notes
//! call for ("implement as a concrete struct carrying those fields, with
//! methods consuming the node and returning the transformed node and
//! updated state"). Each pass (logic conversion, package/class
//! elaboration) owns one `ScopeStack<Meta>` -- with a pass-specific `Meta`
//! payload, the declared type for logic conversion, `IdentState` for
//! package elaboration -- and drives it alongside the [`crate::traverse`]
//! `Mapper`/`walk_*` functions: pushing a frame on a Part/Package/Class,
//! a generate block, a named statement block, or a function/task, and
//! popping it on every exit path (including early-return via `?`, since
//! `CompileResult` propagation unwinds through the pass's own call stack
//! rather than the scope stack, so passes must pop in a `let _ =
//! push/pop` bracket around each recursive call -- see
//! `logic::observe_part` and `elaborate::process::process_items` for the
//! two concrete instances of this idiom, which is spec §4.5's
//! "`partScoperT` ... multiple instances can be sequenced via monadic
//! composition" realized as two ordinary function calls in sequence).

use indexmap::IndexMap;

use crate::ast::AccessPath;
use crate::support::short_hash;

/// One recorded identifier: its resolved absolute path, a small key that
/// distinguishes shadowed declarations of the same name, and the pass's
/// own metadata payload.
#[derive(Debug, Clone)]
pub struct Entry<Meta> {
    pub accesses: AccessPath,
    pub extra_key: String,
    pub meta: Meta,
}

/// One pushed scope: an optional frame name (used to extend the access
/// path for declarations inside it), whether it is a procedural context
/// (function/task body, or nested inside one), and the identifiers
/// declared directly in it.
#[derive(Debug, Clone)]
pub struct Frame<Meta> {
    pub name: Option<String>,
    pub is_procedural: bool,
    entries: IndexMap<String, Entry<Meta>>,
    insert_counter: u64,
}

impl<Meta> Frame<Meta> {
    fn new(name: Option<String>, is_procedural: bool) -> Self {
        Self {
            name,
            is_procedural,
            entries: IndexMap::new(),
            insert_counter: 0,
        }
    }
}

/// The scope stack a single pass drives over one Description.
///
/// Lookups are deterministic, respect shadowing (innermost frame wins),
/// and never escape the Description the stack was created for (spec
/// §4.2 "Guarantees").
#[derive(Debug, Clone)]
pub struct ScopeStack<Meta> {
    frames: Vec<Frame<Meta>>,
}

impl<Meta: Clone> Default for ScopeStack<Meta> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Meta: Clone> ScopeStack<Meta> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            frames: vec![Frame::new(None, false)],
        }
    }

    /// Pushes a new frame. `is_procedural` should be `true` for
    /// function/task bodies; other frame kinds (generate blocks, named
    /// statement blocks, Part/Package/Class bodies) inherit proceduralness
    /// from whether they are nested inside a procedural frame already
    /// (see [`Self::push_scope`], which computes this for you).
    pub fn push_frame(&mut self, name: Option<String>, is_procedural: bool) {
        self.frames.push(Frame::new(name, is_procedural));
    }

    /// Pushes a frame whose proceduralness is inherited from the current
    /// innermost frame, OR'd with `force_procedural` (pass `true` when
    /// entering a function/task body).
    pub fn push_scope(&mut self, name: Option<String>, force_procedural: bool) {
        let inherited = self.within_procedure();
        self.push_frame(name, inherited || force_procedural);
    }

    /// Pops the innermost frame. Callers must pop along every control
    /// path out of the scope they pushed, including early error returns.
    pub fn pop_frame(&mut self) -> Frame<Meta> {
        self.frames.pop().expect("pop_frame called on the root frame")
    }

    /// True if the nearest enclosing frame is a procedural context
    /// (`withinProcedureM`).
    #[must_use]
    pub fn within_procedure(&self) -> bool {
        self.frames.last().is_some_and(|f| f.is_procedural)
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// The absolute access path to the current frame (used as the prefix
    /// for declarations made directly in it).
    #[must_use]
    pub fn current_path(&self) -> AccessPath {
        self.frames
            .iter()
            .filter_map(|f| f.name.as_ref())
            .map(|n| crate::ast::Access::plain(n.clone()))
            .collect()
    }

    /// Records `name` in the current (innermost) frame with metadata
    /// `meta`, overwriting any prior entry for `name` in that same frame.
    /// The access path is the current frame path with `name` appended.
    pub fn insert_elem(&mut self, name: &str, meta: Meta) {
        let mut path = self.current_path();
        path.push(crate::ast::Access::plain(name.to_string()));
        self.insert_elem_at(path, name, meta);
    }

    /// Like [`Self::insert_elem`], but at an explicit access path --
    /// used for declarations that were mangled/relocated (e.g. a
    /// package member reachable under its `P_x` root-scope name).
    pub fn insert_elem_at(&mut self, accesses: AccessPath, name: &str, meta: Meta) {
        let frame = self.frames.last_mut().expect("at least one frame always exists");
        frame.insert_counter += 1;
        let extra_key = short_hash(&(self.frames.len(), name, frame.insert_counter));
        frame.entries.insert(
            name.to_string(),
            Entry {
                accesses,
                extra_key,
                meta,
            },
        );
    }

    /// Resolves `name` by walking outward from the innermost frame.
    pub fn lookup_elem(&self, name: &str) -> Option<&Entry<Meta>> {
        self.frames.iter().rev().find_map(|f| f.entries.get(name))
    }

    /// Resolves `name` against the current frame only (`lookupLocalIdentM`).
    pub fn lookup_local_ident(&self, name: &str) -> Option<&Entry<Meta>> {
        self.frames.last().and_then(|f| f.entries.get(name))
    }

    /// Hands the current snapshot of the scope stack to a pure rewriter.
    /// (`embedScopes`)
    pub fn embed_scopes<R>(&self, f: impl FnOnce(&Self) -> R) -> R {
        f(self)
    }

    /// Projects the scope stack into a flat map from identifier to
    /// metadata: outer frames are applied first so that an inner frame's
    /// declaration of the same name wins (`extractMapping`).
    #[must_use]
    pub fn extract_mapping(&self) -> IndexMap<String, Meta> {
        let mut flat = IndexMap::new();
        for frame in &self.frames {
            for (name, entry) in &frame.entries {
                flat.insert(name.clone(), entry.meta.clone());
            }
        }
        flat
    }

    /// Mutable access to the top frame's metadata for `name`, if declared
    /// directly in it -- used when a pass needs to upgrade an existing
    /// entry's metadata in place (e.g. `Available` -> `Imported`).
    pub fn local_entry_mut(&mut self, name: &str) -> Option<&mut Entry<Meta>> {
        self.frames.last_mut()?.entries.get_mut(name)
    }

    /// Like [`Self::lookup_elem`], but mutable: walks outward from the
    /// innermost frame and returns the first match, wherever it lives.
    /// Used to upgrade a wildcard-import candidate to a firm binding even
    /// when referenced from a nested procedural frame.
    pub fn entry_mut(&mut self, name: &str) -> Option<&mut Entry<Meta>> {
        self.frames.iter_mut().rev().find_map(|f| f.entries.get_mut(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_isolation_inner_frame_then_pop() {
        let mut stack: ScopeStack<i32> = ScopeStack::new();
        stack.insert_elem("x", 1);
        stack.push_scope(Some("blk".into()), false);
        stack.insert_elem("x", 2);
        assert_eq!(stack.lookup_local_ident("x").map(|e| e.meta), Some(2));
        stack.pop_frame();
        assert_eq!(stack.lookup_local_ident("x").map(|e| e.meta), Some(1));
    }

    #[test]
    fn lookup_elem_walks_outward_through_shadowing() {
        let mut stack: ScopeStack<&'static str> = ScopeStack::new();
        stack.insert_elem("shared", "outer");
        stack.push_scope(None, false);
        stack.insert_elem("only_inner", "inner");
        assert_eq!(stack.lookup_elem("shared"), stack.lookup_elem("shared"));
        assert_eq!(stack.lookup_elem("shared").map(|e| e.meta), Some("outer"));
        assert_eq!(stack.lookup_elem("only_inner").map(|e| e.meta), Some("inner"));
        stack.pop_frame();
        assert!(stack.lookup_elem("only_inner").is_none());
    }

    #[test]
    fn within_procedure_reports_nearest_frame() {
        let mut stack: ScopeStack<()> = ScopeStack::new();
        assert!(!stack.within_procedure());
        stack.push_scope(None, true);
        assert!(stack.within_procedure());
        stack.push_scope(None, false);
        assert!(stack.within_procedure(), "proceduralness is inherited by nested frames");
        stack.pop_frame();
        stack.pop_frame();
        assert!(!stack.within_procedure());
    }

    #[test]
    fn reinsertion_replaces_prior_entry_in_same_frame() {
        let mut stack: ScopeStack<i32> = ScopeStack::new();
        stack.insert_elem("x", 1);
        stack.insert_elem("x", 2);
        assert_eq!(stack.extract_mapping().get("x"), Some(&2));
    }
}
