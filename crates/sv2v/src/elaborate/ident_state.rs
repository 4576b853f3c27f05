//! `IdentState`, the per-identifier metadata package elaboration threads
//! through its `ScopeStack` (spec §4.4 Step C.2).

/// The status of one identifier within a package-elaboration frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentState {
    /// A candidate exposed by one or more wildcard imports, not yet used.
    /// Holds the candidate *package names* -- which package eventually
    /// supplies the symbol isn't known until exactly one remains at the
    /// reference site.
    Available(Vec<String>),
    /// Bound to a specific symbol, either via an explicit `import` or
    /// because a wildcard candidate was resolved to one package. Holds the
    /// final (possibly mangled) name to substitute directly, taken from the
    /// source package's own export table -- this is what makes a re-export
    /// chain (`package B; export A::*; endpackage`, then `import B::x;`)
    /// resolve to `A_x` rather than a wrong `B_x`.
    Imported(String),
    /// Declared locally in the current package/module, carrying the final
    /// (possibly mangled) name to substitute at every reference site.
    Declared(String),
}

impl IdentState {
    /// Merges a newly-seen wildcard candidate `pkg` into this state,
    /// per spec §4.4 Step C.4 ("merging into the existing list;
    /// `Imported`/`Declared` entries are untouched").
    pub fn merge_wildcard(&mut self, pkg: &str) {
        if let IdentState::Available(pkgs) = self {
            if !pkgs.iter().any(|p| p == pkg) {
                pkgs.push(pkg.to_string());
            }
        }
    }
}
