//! `Elaborator`: drives Steps B/C of package & class elaboration (spec
//! §4.4) -- lazy, memoized, cycle-checked package processing; identifier
//! resolution and mangling (`resolveIdent`/`resolvePSIdent`/`resolveCSIdent`);
//! import/export handling; and Step E's per-Part global injection.

use ahash::{AHashMap, AHashSet};
use indexmap::IndexMap;

use super::ident_state::IdentState;
use super::{mangle, reorder};
use crate::ast::{
    Decl, Expr, FunctionDecl, GenItem, Instance, LHS, ModuleItem, PackageItem, Part, ParamBinding, ParamValue,
    PortBinding, Range, Stmt, TaskDecl, TimingControl, Type,
};
use crate::error::{CompileResult, Sv2vError};
use crate::scope::ScopeStack;
use crate::support::short_hash;
use crate::traverse::{collect_idents_in_expr, collect_idents_in_lhs, collect_idents_in_type};

/// Threads the package/class table, the memoized export cache, and the
/// accumulated global-injection pool (`pis`, spec §4.4 Step E) through one
/// elaboration run.
pub struct Elaborator {
    packages: AHashMap<String, Vec<PackageItem>>,
    classes: AHashMap<String, (Vec<Decl>, Vec<PackageItem>)>,
    /// Memoized export table per processed package: declared/re-exported
    /// name -> final (possibly mangled) substitution name.
    resolved: AHashMap<String, IndexMap<String, String>>,
    /// The flattened, identifier-resolved item list produced the one time
    /// each named package was processed -- spliced back by
    /// [`super::run`] at that package's original source position.
    package_outputs: AHashMap<String, Vec<PackageItem>>,
    visiting: Vec<String>,
    /// Dedup key (`className` + binding hash) -> synthetic package name,
    /// so the same specialization is only elaborated once (spec §4.4 Step
    /// D: "memoized by the pair").
    synthetic: AHashMap<String, String>,
    /// Every declaration with no natural single anchor point -- the root
    /// (unnamed) package's bare items, and synthetic class-specialization
    /// packages -- keyed by final name, injected into whichever Parts
    /// reference them (spec §4.4 Step E).
    pis: IndexMap<String, PackageItem>,
}

impl Elaborator {
    #[must_use]
    pub fn new(packages: AHashMap<String, Vec<PackageItem>>, classes: AHashMap<String, (Vec<Decl>, Vec<PackageItem>)>) -> Self {
        Self {
            packages,
            classes,
            resolved: AHashMap::default(),
            package_outputs: AHashMap::default(),
            visiting: Vec::new(),
            synthetic: AHashMap::default(),
            pis: IndexMap::new(),
        }
    }

    pub(super) fn class_table(&self) -> &AHashMap<String, (Vec<Decl>, Vec<PackageItem>)> {
        &self.classes
    }

    pub(super) fn synthetic_table_mut(&mut self) -> &mut AHashMap<String, String> {
        &mut self.synthetic
    }

    /// Elaborates a synthetic class-specialization package's flattened
    /// item list (spec §4.4 Step D). Unlike a named package, its members
    /// have no single natural anchor point in the output, so they go
    /// straight into `pis` for per-Part injection rather than through
    /// [`Self::take_package_output`]; its export table is still recorded
    /// in `resolved` so [`Self::resolve_ps_ident`] can find it by name.
    pub(super) fn process_class_items(&mut self, synthetic_name: &str, items: Vec<PackageItem>) -> CompileResult<()> {
        let mut scope = ScopeStack::new();
        let (output, exports) = self.process_items(&mut scope, synthetic_name, items)?;
        for item in &output {
            if let Some(name) = item_decl_name(item) {
                self.pis.insert(name.to_string(), item.clone());
            }
        }
        self.resolved.insert(synthetic_name.to_string(), exports);
        Ok(())
    }

    /// Processes the root (unnamed) package's bare top-level items, adding
    /// every declaration they produce into `pis` for later injection.
    pub fn process_root(&mut self, items: Vec<PackageItem>) -> CompileResult<()> {
        let mut scope = ScopeStack::new();
        let (output, _exports) = self.process_items(&mut scope, "", items)?;
        for item in output {
            if let Some(name) = item_decl_name(&item) {
                self.pis.insert(name.to_string(), item);
            }
        }
        Ok(())
    }

    /// Takes the flattened items produced the one time `name` was
    /// processed, for splicing back at that package's source position.
    /// Returns `None` if `name` hasn't been processed yet (callers process
    /// every named package before calling this).
    pub fn take_package_output(&mut self, name: &str) -> Option<Vec<PackageItem>> {
        self.package_outputs.remove(name)
    }

    /// Lazily elaborates package `name`, memoizing and cycle-checking
    /// (spec §4.4 Step B). Returns its export table: declared/re-exported
    /// name -> final substitution name.
    pub fn process_package(&mut self, name: &str) -> CompileResult<IndexMap<String, String>> {
        if let Some(exports) = self.resolved.get(name) {
            return Ok(exports.clone());
        }
        if let Some(pos) = self.visiting.iter().position(|v| v == name) {
            let mut cycle: Vec<String> = self.visiting[pos..].to_vec();
            cycle.push(name.to_string());
            return Err(Sv2vError::cycle(cycle));
        }
        let items = self
            .packages
            .get(name)
            .cloned()
            .ok_or_else(|| Sv2vError::missing(format!("package '{name}'")))?;

        self.visiting.push(name.to_string());
        let mut scope = ScopeStack::new();
        let result = self.process_items(&mut scope, name, items);
        self.visiting.pop();
        let (output, exports) = result?;

        self.package_outputs.insert(name.to_string(), output);
        self.resolved.insert(name.to_string(), exports.clone());
        Ok(exports)
    }

    /// Step C: reorders `items`, then walks them left to right over a
    /// fresh `ScopeStack<IdentState>`, resolving every nested reference and
    /// declaring every local name. Returns the surviving items (imports
    /// consumed, not emitted) plus the export table this item list makes
    /// available to importers.
    fn process_items(
        &mut self,
        scope: &mut ScopeStack<IdentState>,
        context: &str,
        items: Vec<PackageItem>,
    ) -> CompileResult<(Vec<PackageItem>, IndexMap<String, String>)> {
        let is_package = !context.is_empty();
        // Names this context's own frame so every declaration's recorded
        // access path is prefixed by `context` -- otherwise two distinct
        // packages/synthetic specializations that each declare a same-named
        // local would be indistinguishable by access path alone (spec §4.4
        // Step D.3's `scopeKeys`, see [`Elaborator::resolve_cs_ident`]).
        if is_package {
            scope.push_frame(Some(context.to_string()), false);
        }
        let items = reorder::reorder_items(items);
        let mut output = Vec::with_capacity(items.len());
        let mut export_requests: Vec<(Option<String>, Option<String>)> = Vec::new();

        for item in items {
            match item {
                PackageItem::Import { pkg, ident } => self.apply_import(scope, &pkg, ident.as_deref())?,
                PackageItem::Export { pkg, ident } => {
                    if !is_package {
                        return Err(Sv2vError::structural("export used outside a package"));
                    }
                    export_requests.push((pkg, ident));
                }
                PackageItem::Directive(d) => output.push(PackageItem::Directive(d)),
                PackageItem::Decl(decl) => {
                    let decl = self.process_decl(scope, is_package, context, decl)?;
                    output.push(PackageItem::Decl(decl));
                }
                PackageItem::Function(func) => {
                    let func = self.process_function(scope, is_package, context, func)?;
                    output.push(PackageItem::Function(func));
                }
                PackageItem::Task(task) => {
                    let task = self.process_task(scope, is_package, context, task)?;
                    output.push(PackageItem::Task(task));
                }
            }
        }

        let mut exports: IndexMap<String, String> = IndexMap::new();
        for (name, meta) in scope.extract_mapping() {
            if let IdentState::Declared(final_name) = meta {
                exports.insert(name, final_name);
            }
        }
        for (pkg, ident) in export_requests {
            self.apply_export(scope, &mut exports, pkg, ident)?;
        }

        if is_package {
            scope.pop_frame();
        }

        Ok((output, exports))
    }

    /// Step C.5: resolves one deferred `export` request into the current
    /// item list's export table.
    fn apply_export(
        &mut self,
        scope: &ScopeStack<IdentState>,
        exports: &mut IndexMap<String, String>,
        pkg: Option<String>,
        ident: Option<String>,
    ) -> CompileResult<()> {
        match (pkg, ident) {
            (Some(pkg), Some(ident)) => {
                let source = self.process_package(&pkg)?;
                let final_name = source
                    .get(&ident)
                    .cloned()
                    .ok_or_else(|| Sv2vError::missing(format!("'{ident}' in package '{pkg}'")))?;
                if !imported_from(scope, &ident, &pkg, &final_name) {
                    return Err(Sv2vError::structural(format!(
                        "'export {pkg}::{ident}' but '{ident}' was never imported from '{pkg}'"
                    )));
                }
                exports.insert(ident, final_name);
                Ok(())
            }
            (Some(pkg), None) => {
                let source = self.process_package(&pkg)?;
                for (name, final_name) in source {
                    if imported_from(scope, &name, &pkg, &final_name) {
                        exports.entry(name).or_insert(final_name);
                    }
                }
                Ok(())
            }
            (None, None) => {
                for (name, meta) in scope.extract_mapping() {
                    match meta {
                        IdentState::Imported(final_name) => {
                            exports.entry(name).or_insert(final_name);
                        }
                        IdentState::Available(pkgs) if pkgs.len() == 1 => {
                            let source = self.process_package(&pkgs[0])?;
                            if let Some(final_name) = source.get(&name) {
                                exports.entry(name).or_insert_with(|| final_name.clone());
                            }
                        }
                        _ => {}
                    }
                }
                Ok(())
            }
            (None, Some(ident)) => Err(Sv2vError::structural(format!("'export {ident}' with no package qualifier"))),
        }
    }

    /// Step C.4: `import pkg::ident;` binds `ident` firmly; `import
    /// pkg::*;` adds `pkg` as a wildcard candidate for every name `pkg`
    /// exports, merging into any existing candidate list.
    fn apply_import(&mut self, scope: &mut ScopeStack<IdentState>, pkg: &str, ident: Option<&str>) -> CompileResult<()> {
        let exports = self.process_package(pkg)?;
        match ident {
            Some(name) => {
                let final_name = exports
                    .get(name)
                    .cloned()
                    .ok_or_else(|| Sv2vError::missing(format!("'{name}' in package '{pkg}'")))?;
                if let Some(entry) = scope.lookup_local_ident(name) {
                    if matches!(entry.meta, IdentState::Declared(_)) {
                        return Err(Sv2vError::conflict(name, format!("'{name}' is both declared locally and imported from '{pkg}'")));
                    }
                }
                scope.insert_elem(name, IdentState::Imported(final_name));
                Ok(())
            }
            None => {
                for name in exports.keys() {
                    match scope.local_entry_mut(name) {
                        Some(entry) => entry.meta.merge_wildcard(pkg),
                        None => scope.insert_elem(name, IdentState::Available(vec![pkg.to_string()])),
                    }
                }
                Ok(())
            }
        }
    }

    /// Records a local declaration's final name and returns it: mangled as
    /// `P_x` at package scope, kept plain everywhere else (module scope,
    /// or inside a procedure -- spec §4.4 Step C.3).
    fn declare(&mut self, scope: &mut ScopeStack<IdentState>, is_package: bool, context: &str, name: &str) -> CompileResult<String> {
        if let Some(entry) = scope.lookup_local_ident(name) {
            if matches!(entry.meta, IdentState::Imported(_)) {
                return Err(Sv2vError::conflict(name, format!("'{name}' is both imported and declared locally")));
            }
        }
        let final_name = if is_package { mangle::mangled(context, name) } else { name.to_string() };
        scope.insert_elem(name, IdentState::Declared(final_name.clone()));
        Ok(final_name)
    }

    fn process_decl(&mut self, scope: &mut ScopeStack<IdentState>, is_package: bool, context: &str, decl: Decl) -> CompileResult<Decl> {
        Ok(match decl {
            Decl::Variable {
                direction,
                ty,
                name,
                unpacked,
                init,
            } => {
                let ty = self.resolve_type(scope, ty)?;
                let unpacked = self.resolve_ranges(scope, unpacked)?;
                let init = init.map(|e| self.resolve_expr(scope, e)).transpose()?;
                let name = self.declare(scope, is_package, context, &name)?;
                Decl::Variable {
                    direction,
                    ty,
                    name,
                    unpacked,
                    init,
                }
            }
            Decl::Param { kind, ty, name, expr } => {
                let ty = self.resolve_type(scope, ty)?;
                let expr = self.resolve_expr(scope, expr)?;
                let name = self.declare(scope, is_package, context, &name)?;
                Decl::Param { kind, ty, name, expr }
            }
            Decl::ParamType { kind, name, ty } => {
                let ty = ty.map(|t| self.resolve_type(scope, t)).transpose()?;
                let name = self.declare(scope, is_package, context, &name)?;
                Decl::ParamType { kind, name, ty }
            }
            Decl::CommentDecl(s) => Decl::CommentDecl(s),
        })
    }

    fn process_function(
        &mut self,
        scope: &mut ScopeStack<IdentState>,
        is_package: bool,
        context: &str,
        func: FunctionDecl,
    ) -> CompileResult<FunctionDecl> {
        let name = self.declare(scope, is_package, context, &func.name)?;
        let ret = self.resolve_type(scope, func.ret)?;
        scope.push_scope(Some(func.name.clone()), true);
        let result = self.process_subroutine_body(scope, func.ports, func.decls, func.stmts);
        scope.pop_frame();
        let (ports, decls, stmts) = result?;
        Ok(FunctionDecl {
            lifetime: func.lifetime,
            ret,
            name,
            ports,
            decls,
            stmts,
        })
    }

    fn process_task(&mut self, scope: &mut ScopeStack<IdentState>, is_package: bool, context: &str, task: TaskDecl) -> CompileResult<TaskDecl> {
        let name = self.declare(scope, is_package, context, &task.name)?;
        scope.push_scope(Some(task.name.clone()), true);
        let result = self.process_subroutine_body(scope, task.ports, task.decls, task.stmts);
        scope.pop_frame();
        let (ports, decls, stmts) = result?;
        Ok(TaskDecl {
            lifetime: task.lifetime,
            name,
            ports,
            decls,
            stmts,
        })
    }

    /// Ports and locals inside a function/task body always keep their
    /// plain name (spec §4.4 Step C.3: "inside a procedure ... the
    /// original name is kept"), regardless of whether the subroutine
    /// itself lives at package or module scope.
    fn process_subroutine_body(
        &mut self,
        scope: &mut ScopeStack<IdentState>,
        ports: Vec<Decl>,
        decls: Vec<Decl>,
        stmts: Vec<Stmt>,
    ) -> CompileResult<(Vec<Decl>, Vec<Decl>, Vec<Stmt>)> {
        let ports = ports
            .into_iter()
            .map(|d| self.process_decl(scope, false, "", d))
            .collect::<CompileResult<_>>()?;
        let decls = decls
            .into_iter()
            .map(|d| self.process_decl(scope, false, "", d))
            .collect::<CompileResult<_>>()?;
        let stmts = stmts.into_iter().map(|s| self.resolve_stmt(scope, s)).collect::<CompileResult<_>>()?;
        Ok((ports, decls, stmts))
    }

    // ---- Step C.6: identifier resolution ----

    /// `resolveIdent`: a bare name resolves against `Declared`/`Imported`
    /// directly; a lone `Available` candidate is resolved and the entry
    /// upgraded to `Imported` in place (even if it lives in an outer
    /// frame); more than one candidate is a fatal ambiguity; no entry at
    /// all leaves the name unchanged (it may be a module port, a genvar,
    /// or a global the injection pass will supply -- spec §4.4 Step E).
    fn resolve_ident_name(&mut self, scope: &mut ScopeStack<IdentState>, name: &str) -> CompileResult<String> {
        let meta = scope.lookup_elem(name).map(|e| e.meta.clone());
        match meta {
            Some(IdentState::Declared(final_name) | IdentState::Imported(final_name)) => Ok(final_name),
            Some(IdentState::Available(pkgs)) if pkgs.len() == 1 => {
                let pkg = pkgs[0].clone();
                let exports = self.process_package(&pkg)?;
                let final_name = exports
                    .get(name)
                    .cloned()
                    .ok_or_else(|| Sv2vError::missing(format!("'{name}' in package '{pkg}'")))?;
                if let Some(entry) = scope.entry_mut(name) {
                    entry.meta = IdentState::Imported(final_name.clone());
                }
                Ok(final_name)
            }
            Some(IdentState::Available(pkgs)) => Err(Sv2vError::ambiguous(name, pkgs)),
            None => Ok(name.to_string()),
        }
    }

    /// `resolvePSIdent`: `P::X` resolves against `P`'s export table.
    fn resolve_ps_ident(&mut self, pkg: &str, name: &str) -> CompileResult<String> {
        let exports = self.process_package(pkg)?;
        exports.get(name).cloned().ok_or_else(|| Sv2vError::missing(format!("'{name}' in package '{pkg}'")))
    }

    /// `resolveCSIdent`: `C#(bindings)::X` specializes class `C` (spec §4.4
    /// Step D, delegated to [`class::resolve_cs_ident`]) and resolves `X`
    /// against the resulting synthetic package.
    ///
    /// Before resolving the bindings themselves, collects `scopeKeys`: a
    /// short hash of the resolved access path of every identifier the
    /// bindings reference (spec §4.4 Step D.3). Module-local identifiers are
    /// never mangled, so two distinct scopes that each declare their own
    /// same-named local (e.g. two modules each with their own `N`) resolve
    /// `C#(N)` to identical `Expr::Ident("N")` bindings; folding each
    /// identifier's absolute scope-stack access path into the dedupe hash
    /// keeps those two specializations apart while still collapsing
    /// genuinely identical ones.
    fn resolve_cs_ident(&mut self, scope: &mut ScopeStack<IdentState>, class: &str, bindings: Vec<ParamBinding>, name: &str) -> CompileResult<String> {
        let scope_keys = scope_keys_for_bindings(scope, &bindings);
        let bindings = bindings
            .into_iter()
            .map(|b| self.resolve_param_binding(scope, b))
            .collect::<CompileResult<_>>()?;
        let synthetic = super::class::resolve_cs_ident(self, class, bindings, &scope_keys)?;
        self.resolve_ps_ident(&synthetic, name)
    }

    // ---- Recursive Type/Expr/LHS resolution ----

    fn resolve_ranges(&mut self, scope: &mut ScopeStack<IdentState>, ranges: Vec<Range>) -> CompileResult<Vec<Range>> {
        ranges
            .into_iter()
            .map(|(hi, lo)| Ok((self.resolve_expr(scope, hi)?, self.resolve_expr(scope, lo)?)))
            .collect()
    }

    fn resolve_param_binding(&mut self, scope: &mut ScopeStack<IdentState>, binding: ParamBinding) -> CompileResult<ParamBinding> {
        let value = match binding.value {
            ParamValue::Expr(e) => ParamValue::Expr(self.resolve_expr(scope, e)?),
            ParamValue::Type(t) => ParamValue::Type(Box::new(self.resolve_type(scope, *t)?)),
        };
        Ok(ParamBinding { name: binding.name, value })
    }

    fn resolve_type(&mut self, scope: &mut ScopeStack<IdentState>, ty: Type) -> CompileResult<Type> {
        Ok(match ty {
            Type::IntegerVector(kind, sg, ranges) => Type::IntegerVector(kind, sg, self.resolve_ranges(scope, ranges)?),
            Type::Net(kind, sg, ranges) => Type::Net(kind, sg, self.resolve_ranges(scope, ranges)?),
            Type::Implicit(sg, ranges) => Type::Implicit(sg, self.resolve_ranges(scope, ranges)?),
            Type::Alias(name, ranges) => {
                let name = self.resolve_ident_name(scope, &name)?;
                Type::Alias(name, self.resolve_ranges(scope, ranges)?)
            }
            // Collapses into a plain alias of the mangled/specialized name:
            // once resolved, a package/class-scoped type reference is just
            // another named type.
            Type::PackageScoped(pkg, name, ranges) => {
                let name = self.resolve_ps_ident(&pkg, &name)?;
                Type::Alias(name, self.resolve_ranges(scope, ranges)?)
            }
            Type::ClassScoped(class, bindings, name, ranges) => {
                let name = self.resolve_cs_ident(scope, &class, bindings, &name)?;
                Type::Alias(name, self.resolve_ranges(scope, ranges)?)
            }
            Type::Enum(base, items, ranges) => {
                let base = Box::new(self.resolve_type(scope, *base)?);
                let items = items
                    .into_iter()
                    .map(|(n, e)| -> CompileResult<_> { Ok((n, e.map(|e| self.resolve_expr(scope, e)).transpose()?)) })
                    .collect::<CompileResult<_>>()?;
                Type::Enum(base, items, self.resolve_ranges(scope, ranges)?)
            }
            Type::Struct {
                packed,
                is_union,
                members,
                ranges,
            } => {
                let members = members
                    .into_iter()
                    .map(|(t, n)| -> CompileResult<_> { Ok((self.resolve_type(scope, t)?, n)) })
                    .collect::<CompileResult<_>>()?;
                Type::Struct {
                    packed,
                    is_union,
                    members,
                    ranges: self.resolve_ranges(scope, ranges)?,
                }
            }
            Type::Unpacked(inner, ranges) => {
                let inner = Box::new(self.resolve_type(scope, *inner)?);
                Type::Unpacked(inner, self.resolve_ranges(scope, ranges)?)
            }
            Type::InterfaceRef(name, modport) => Type::InterfaceRef(self.resolve_ident_name(scope, &name)?, modport),
            Type::TypeOf(e) => Type::TypeOf(Box::new(self.resolve_expr(scope, *e)?)),
            // `int`/`byte`/`shortint`/`longint`/`integer`/`time` have no
            // Verilog-2005 equivalent; elaborate them to their `logic`
            // representation here so every later pass only ever sees
            // `IntegerVector` (spec §3).
            Type::IntegerAtom(kind, sg) => crate::ast::elaborate_atom(kind, sg),
            leaf @ (Type::NonInteger(_) | Type::TypedefRef(_)) => leaf,
        })
    }

    fn resolve_expr(&mut self, scope: &mut ScopeStack<IdentState>, expr: Expr) -> CompileResult<Expr> {
        Ok(match expr {
            Expr::Ident(name) => Expr::Ident(self.resolve_ident_name(scope, &name)?),
            Expr::PSIdent(pkg, name) => Expr::Ident(self.resolve_ps_ident(&pkg, &name)?),
            Expr::CSIdent(class, bindings, name) => Expr::Ident(self.resolve_cs_ident(scope, &class, bindings, &name)?),
            Expr::Index(base, idx) => Expr::Index(Box::new(self.resolve_expr(scope, *base)?), Box::new(self.resolve_expr(scope, *idx)?)),
            Expr::Range(base, hi, lo) => Expr::Range(
                Box::new(self.resolve_expr(scope, *base)?),
                Box::new(self.resolve_expr(scope, *hi)?),
                Box::new(self.resolve_expr(scope, *lo)?),
            ),
            Expr::Dot(base, field) => Expr::Dot(Box::new(self.resolve_expr(scope, *base)?), field),
            Expr::Concat(items) => Expr::Concat(items.into_iter().map(|e| self.resolve_expr(scope, e)).collect::<CompileResult<_>>()?),
            Expr::Repeat(n, items) => Expr::Repeat(
                Box::new(self.resolve_expr(scope, *n)?),
                items.into_iter().map(|e| self.resolve_expr(scope, e)).collect::<CompileResult<_>>()?,
            ),
            Expr::BinOp(l, op, r) => Expr::BinOp(Box::new(self.resolve_expr(scope, *l)?), op, Box::new(self.resolve_expr(scope, *r)?)),
            Expr::UnOp(op, e) => Expr::UnOp(op, Box::new(self.resolve_expr(scope, *e)?)),
            Expr::Cond(c, t, e) => Expr::Cond(
                Box::new(self.resolve_expr(scope, *c)?),
                Box::new(self.resolve_expr(scope, *t)?),
                Box::new(self.resolve_expr(scope, *e)?),
            ),
            Expr::Call(name, args) => {
                let name = self.resolve_ident_name(scope, &name)?;
                Expr::Call(name, args.into_iter().map(|e| self.resolve_expr(scope, e)).collect::<CompileResult<_>>()?)
            }
            Expr::TypeCast(ty, e) => Expr::TypeCast(Box::new(self.resolve_type(scope, *ty)?), Box::new(self.resolve_expr(scope, *e)?)),
            leaf @ (Expr::Number(_) | Expr::String(_)) => leaf,
        })
    }

    fn resolve_lhs(&mut self, scope: &mut ScopeStack<IdentState>, lhs: LHS) -> CompileResult<LHS> {
        Ok(match lhs {
            LHS::Ident(name) => LHS::Ident(self.resolve_ident_name(scope, &name)?),
            LHS::PSIdent(pkg, name) => LHS::Ident(self.resolve_ps_ident(&pkg, &name)?),
            LHS::CSIdent(class, bindings, name) => LHS::Ident(self.resolve_cs_ident(scope, &class, bindings, &name)?),
            LHS::Index(base, idx) => LHS::Index(Box::new(self.resolve_lhs(scope, *base)?), Box::new(self.resolve_expr(scope, *idx)?)),
            LHS::Range(base, hi, lo) => LHS::Range(
                Box::new(self.resolve_lhs(scope, *base)?),
                Box::new(self.resolve_expr(scope, *hi)?),
                Box::new(self.resolve_expr(scope, *lo)?),
            ),
            LHS::Dot(base, field) => LHS::Dot(Box::new(self.resolve_lhs(scope, *base)?), field),
            LHS::Concat(items) => LHS::Concat(items.into_iter().map(|l| self.resolve_lhs(scope, l)).collect::<CompileResult<_>>()?),
        })
    }

    fn resolve_stmt(&mut self, scope: &mut ScopeStack<IdentState>, stmt: Stmt) -> CompileResult<Stmt> {
        Ok(match stmt {
            Stmt::Block(label, decls, stmts) => {
                scope.push_scope(label.clone(), false);
                let result = self.resolve_block_body(scope, decls, stmts);
                scope.pop_frame();
                let (decls, stmts) = result?;
                Stmt::Block(label, decls, stmts)
            }
            Stmt::If(cond, then, els) => Stmt::If(
                self.resolve_expr(scope, cond)?,
                Box::new(self.resolve_stmt(scope, *then)?),
                els.map(|e| self.resolve_stmt(scope, *e)).transpose()?.map(Box::new),
            ),
            Stmt::Case(disc, arms, default) => {
                let disc = self.resolve_expr(scope, disc)?;
                let mut out_arms = Vec::with_capacity(arms.len());
                for (labels, s) in arms {
                    let labels = labels.into_iter().map(|e| self.resolve_expr(scope, e)).collect::<CompileResult<_>>()?;
                    let s = self.resolve_stmt(scope, s)?;
                    out_arms.push((labels, s));
                }
                let default = default.map(|d| self.resolve_stmt(scope, *d)).transpose()?.map(Box::new);
                Stmt::Case(disc, out_arms, default)
            }
            Stmt::For { inits, cond, incrs, body } => {
                let inits = inits.into_iter().map(|s| self.resolve_stmt(scope, s)).collect::<CompileResult<_>>()?;
                let cond = self.resolve_expr(scope, cond)?;
                let incrs = incrs.into_iter().map(|s| self.resolve_stmt(scope, s)).collect::<CompileResult<_>>()?;
                let body = Box::new(self.resolve_stmt(scope, *body)?);
                Stmt::For { inits, cond, incrs, body }
            }
            Stmt::While(cond, body) => Stmt::While(self.resolve_expr(scope, cond)?, Box::new(self.resolve_stmt(scope, *body)?)),
            Stmt::BlockingAssign(lhs, rhs) => Stmt::BlockingAssign(self.resolve_lhs(scope, lhs)?, self.resolve_expr(scope, rhs)?),
            Stmt::NonBlockingAssign(lhs, rhs) => Stmt::NonBlockingAssign(self.resolve_lhs(scope, lhs)?, self.resolve_expr(scope, rhs)?),
            Stmt::Timing(timing, body) => {
                let timing = self.resolve_timing(scope, timing)?;
                Stmt::Timing(timing, Box::new(self.resolve_stmt(scope, *body)?))
            }
            Stmt::SysTaskCall(name, args, lhs) => Stmt::SysTaskCall(
                name,
                args.into_iter().map(|e| self.resolve_expr(scope, e)).collect::<CompileResult<_>>()?,
                lhs.map(|l| self.resolve_lhs(scope, l)).transpose()?,
            ),
            Stmt::Null => Stmt::Null,
            Stmt::ExprStmt(e) => Stmt::ExprStmt(self.resolve_expr(scope, e)?),
        })
    }

    fn resolve_block_body(
        &mut self,
        scope: &mut ScopeStack<IdentState>,
        decls: Vec<Decl>,
        stmts: Vec<Stmt>,
    ) -> CompileResult<(Vec<Decl>, Vec<Stmt>)> {
        let decls = decls
            .into_iter()
            .map(|d| self.process_decl(scope, false, "", d))
            .collect::<CompileResult<_>>()?;
        let stmts = stmts.into_iter().map(|s| self.resolve_stmt(scope, s)).collect::<CompileResult<_>>()?;
        Ok((decls, stmts))
    }

    fn resolve_timing(&mut self, scope: &mut ScopeStack<IdentState>, timing: TimingControl) -> CompileResult<TimingControl> {
        Ok(match timing {
            TimingControl::Event(sensitivities) => TimingControl::Event(
                sensitivities
                    .into_iter()
                    .map(|s| -> CompileResult<_> {
                        Ok(crate::ast::Sensitivity {
                            edge: s.edge,
                            lhs: self.resolve_lhs(scope, s.lhs)?,
                        })
                    })
                    .collect::<CompileResult<_>>()?,
            ),
            TimingControl::Star => TimingControl::Star,
            TimingControl::Delay(e) => TimingControl::Delay(self.resolve_expr(scope, e)?),
        })
    }

    // ---- Part-level elaboration (Step C applied at module scope, plus
    // Step E's per-Part global injection) ----

    /// Elaborates one Part's item list: resolves every reference, declares
    /// every local name (always kept plain -- modules are never mangled),
    /// then injects whichever `pis` entries the resolved items actually
    /// reference (spec §4.4 Step E).
    pub fn process_part(&mut self, part: Part) -> CompileResult<Part> {
        let mut scope = ScopeStack::new();
        // See the matching frame push in `process_items`: names this Part's
        // own frame so two modules each declaring a same-named local get
        // distinct recorded access paths.
        scope.push_frame(Some(part.name.clone()), false);
        let mut items = Vec::with_capacity(part.items.len());
        for item in part.items {
            if let Some(item) = self.resolve_module_item(&mut scope, item)? {
                items.push(item);
            }
        }
        self.inject_pis(&mut items);
        Ok(Part { items, ..part })
    }

    fn resolve_module_item(&mut self, scope: &mut ScopeStack<IdentState>, item: ModuleItem) -> CompileResult<Option<ModuleItem>> {
        Ok(match item {
            ModuleItem::MIPackageItem(PackageItem::Decl(d)) => Some(ModuleItem::MIPackageItem(PackageItem::Decl(self.process_decl(scope, false, "", d)?))),
            ModuleItem::MIPackageItem(PackageItem::Function(f)) => {
                Some(ModuleItem::MIPackageItem(PackageItem::Function(self.process_function(scope, false, "", f)?)))
            }
            ModuleItem::MIPackageItem(PackageItem::Task(t)) => Some(ModuleItem::MIPackageItem(PackageItem::Task(self.process_task(scope, false, "", t)?))),
            ModuleItem::MIPackageItem(PackageItem::Import { pkg, ident }) => {
                self.apply_import(scope, &pkg, ident.as_deref())?;
                None
            }
            ModuleItem::MIPackageItem(PackageItem::Export { .. }) => return Err(Sv2vError::structural("export used outside a package")),
            ModuleItem::MIPackageItem(PackageItem::Directive(d)) => Some(ModuleItem::MIPackageItem(PackageItem::Directive(d))),
            ModuleItem::Initial(s) => Some(ModuleItem::Initial(self.resolve_stmt(scope, s)?)),
            ModuleItem::Always(kind, s) => Some(ModuleItem::Always(kind, self.resolve_stmt(scope, s)?)),
            ModuleItem::Assign(lhs, rhs) => Some(ModuleItem::Assign(self.resolve_lhs(scope, lhs)?, self.resolve_expr(scope, rhs)?)),
            ModuleItem::MIInstance(inst) => Some(ModuleItem::MIInstance(self.resolve_instance(scope, inst)?)),
            ModuleItem::Generate(items) => {
                scope.push_scope(None, false);
                let result = items
                    .into_iter()
                    .map(|g| self.resolve_gen_item(scope, g))
                    .collect::<CompileResult<Vec<_>>>();
                scope.pop_frame();
                Some(ModuleItem::Generate(result?))
            }
        })
    }

    fn resolve_instance(&mut self, scope: &mut ScopeStack<IdentState>, inst: Instance) -> CompileResult<Instance> {
        let params = inst
            .params
            .into_iter()
            .map(|b| self.resolve_param_binding(scope, b))
            .collect::<CompileResult<_>>()?;
        let ports = inst
            .ports
            .into_iter()
            .map(|p| -> CompileResult<_> {
                Ok(PortBinding {
                    name: p.name,
                    expr: p.expr.map(|e| self.resolve_expr(scope, e)).transpose()?,
                })
            })
            .collect::<CompileResult<_>>()?;
        Ok(Instance {
            module: inst.module,
            params,
            name: inst.name,
            ports,
        })
    }

    fn resolve_gen_item(&mut self, scope: &mut ScopeStack<IdentState>, item: GenItem) -> CompileResult<GenItem> {
        Ok(match item {
            GenItem::GIItem(mi) => match self.resolve_module_item(scope, *mi)? {
                Some(mi) => GenItem::GIItem(Box::new(mi)),
                // An `import` was the entire content of this generate
                // item; it carries nothing to emit.
                None => GenItem::GIBlock(None, Vec::new()),
            },
            GenItem::GIBlock(label, items) => {
                scope.push_scope(label.clone(), false);
                let result = items
                    .into_iter()
                    .map(|g| self.resolve_gen_item(scope, g))
                    .collect::<CompileResult<Vec<_>>>();
                scope.pop_frame();
                GenItem::GIBlock(label, result?)
            }
            GenItem::GIIf(cond, then, els) => {
                let cond = self.resolve_expr(scope, cond)?;
                let then = Box::new(self.resolve_gen_item(scope, *then)?);
                let els = els.map(|e| self.resolve_gen_item(scope, *e)).transpose()?.map(Box::new);
                GenItem::GIIf(cond, then, els)
            }
            GenItem::GICase(disc, arms, default) => {
                let disc = self.resolve_expr(scope, disc)?;
                let mut out_arms = Vec::with_capacity(arms.len());
                for (labels, g) in arms {
                    let labels = labels.into_iter().map(|e| self.resolve_expr(scope, e)).collect::<CompileResult<_>>()?;
                    let g = self.resolve_gen_item(scope, g)?;
                    out_arms.push((labels, g));
                }
                let default = default.map(|d| self.resolve_gen_item(scope, *d)).transpose()?.map(Box::new);
                GenItem::GICase(disc, out_arms, default)
            }
            GenItem::GIFor {
                genvar,
                init,
                cond,
                step,
                body,
            } => {
                let init = self.resolve_expr(scope, init)?;
                scope.push_scope(None, false);
                scope.insert_elem(&genvar, IdentState::Declared(genvar.clone()));
                let result = self.resolve_gen_for_tail(scope, cond, step, *body);
                scope.pop_frame();
                let (cond, step, body) = result?;
                GenItem::GIFor {
                    genvar,
                    init,
                    cond,
                    step,
                    body: Box::new(body),
                }
            }
        })
    }

    fn resolve_gen_for_tail(
        &mut self,
        scope: &mut ScopeStack<IdentState>,
        cond: Expr,
        step: Expr,
        body: GenItem,
    ) -> CompileResult<(Expr, Expr, GenItem)> {
        let cond = self.resolve_expr(scope, cond)?;
        let step = self.resolve_expr(scope, step)?;
        let body = self.resolve_gen_item(scope, body)?;
        Ok((cond, step, body))
    }

    /// Step E's `addUsedPIs`/`addItems`: closes the resolved item list's
    /// identifier-use set transitively over `pis`, prepending one cloned
    /// copy of each global declaration this Part (directly or
    /// transitively) references. Each Part gets its own independent copy,
    /// since a flattened Verilog-2005 module cannot reference a
    /// declaration that lives in another module.
    fn inject_pis(&self, items: &mut Vec<ModuleItem>) {
        let mut declared: AHashSet<String> = AHashSet::default();
        let mut used: AHashSet<String> = AHashSet::default();
        for item in items.iter() {
            if let Some(name) = module_item_decl_name(item) {
                declared.insert(name.to_string());
            }
            collect_used_in_module_item(item, &mut used);
        }

        let mut injected = Vec::new();
        let mut injected_names: AHashSet<String> = AHashSet::default();
        loop {
            let next: Vec<String> = used
                .iter()
                .filter(|name| !declared.contains(*name) && !injected_names.contains(*name) && self.pis.contains_key(*name))
                .cloned()
                .collect();
            if next.is_empty() {
                break;
            }
            for name in next {
                let Some(item) = self.pis.get(&name) else { continue };
                collect_used_in_package_item(item, &mut used);
                injected.push(ModuleItem::MIPackageItem(item.clone()));
                injected_names.insert(name);
            }
        }

        injected.reverse();
        let mut new_items = injected;
        new_items.append(items);
        *items = new_items;
    }
}

/// Collects one short hash per identifier referenced (directly, pre-
/// resolution) in `bindings`, keyed off that identifier's absolute
/// access path in `scope` -- the `scopeKeys` spec §4.4 Step D.3 folds into
/// a class specialization's dedupe hash alongside the resolved bindings
/// themselves. An identifier with no scope entry (a genvar, a module port,
/// or a future Step E global) contributes nothing: it carries no
/// scope-distinguishing information of its own.
fn scope_keys_for_bindings(scope: &ScopeStack<IdentState>, bindings: &[ParamBinding]) -> Vec<String> {
    let mut names: AHashSet<String> = AHashSet::default();
    for binding in bindings {
        match &binding.value {
            ParamValue::Expr(e) => collect_idents_in_expr(e, &mut names),
            ParamValue::Type(t) => collect_idents_in_type(t, &mut names),
        }
    }
    let mut sorted_names: Vec<&String> = names.iter().collect();
    sorted_names.sort();
    let mut keys: Vec<String> = sorted_names
        .into_iter()
        .filter_map(|name| scope.lookup_elem(name).map(|entry| short_hash(&(name, &entry.accesses))))
        .collect();
    keys.sort();
    keys
}

/// True if `ident` is currently resolvable in `scope` as having been
/// imported from `pkg` specifically -- either firmly (`import pkg::ident;`,
/// or a wildcard candidate already upgraded by an earlier reference) or as
/// a still-unresolved `import pkg::*;` candidate that includes `pkg`.
/// `export pkg::ident;`/`export pkg::*;` may only re-export what the
/// current package actually imported from `pkg` (spec §4.4 Step C.5).
fn imported_from(scope: &ScopeStack<IdentState>, ident: &str, pkg: &str, final_name: &str) -> bool {
    match scope.lookup_elem(ident).map(|e| &e.meta) {
        Some(IdentState::Imported(name)) => name == final_name,
        Some(IdentState::Available(pkgs)) => pkgs.iter().any(|p| p == pkg),
        _ => false,
    }
}

fn item_decl_name(item: &PackageItem) -> Option<&str> {
    match item {
        PackageItem::Decl(d) => d.name(),
        PackageItem::Function(f) => Some(f.name.as_str()),
        PackageItem::Task(t) => Some(t.name.as_str()),
        PackageItem::Import { .. } | PackageItem::Export { .. } | PackageItem::Directive(_) => None,
    }
}

fn module_item_decl_name(item: &ModuleItem) -> Option<&str> {
    match item {
        ModuleItem::MIPackageItem(pi) => item_decl_name(pi),
        _ => None,
    }
}

fn collect_used_in_decl(decl: &Decl, out: &mut AHashSet<String>) {
    match decl {
        Decl::Variable { ty, init, .. } => {
            collect_idents_in_type(ty, out);
            if let Some(e) = init {
                collect_idents_in_expr(e, out);
            }
        }
        Decl::Param { ty, expr, .. } => {
            collect_idents_in_type(ty, out);
            collect_idents_in_expr(expr, out);
        }
        Decl::ParamType { ty: Some(ty), .. } => collect_idents_in_type(ty, out),
        Decl::ParamType { ty: None, .. } | Decl::CommentDecl(_) => {}
    }
}

fn collect_used_in_stmt(stmt: &Stmt, out: &mut AHashSet<String>) {
    match stmt {
        Stmt::Block(_, decls, stmts) => {
            decls.iter().for_each(|d| collect_used_in_decl(d, out));
            stmts.iter().for_each(|s| collect_used_in_stmt(s, out));
        }
        Stmt::If(c, t, e) => {
            collect_idents_in_expr(c, out);
            collect_used_in_stmt(t, out);
            if let Some(e) = e {
                collect_used_in_stmt(e, out);
            }
        }
        Stmt::Case(d, arms, default) => {
            collect_idents_in_expr(d, out);
            for (labels, s) in arms {
                labels.iter().for_each(|e| collect_idents_in_expr(e, out));
                collect_used_in_stmt(s, out);
            }
            if let Some(d) = default {
                collect_used_in_stmt(d, out);
            }
        }
        Stmt::For { inits, cond, incrs, body } => {
            inits.iter().for_each(|s| collect_used_in_stmt(s, out));
            collect_idents_in_expr(cond, out);
            incrs.iter().for_each(|s| collect_used_in_stmt(s, out));
            collect_used_in_stmt(body, out);
        }
        Stmt::While(c, b) => {
            collect_idents_in_expr(c, out);
            collect_used_in_stmt(b, out);
        }
        Stmt::BlockingAssign(l, r) | Stmt::NonBlockingAssign(l, r) => {
            collect_idents_in_lhs(l, out);
            collect_idents_in_expr(r, out);
        }
        Stmt::Timing(timing, body) => {
            if let TimingControl::Event(sensitivities) = timing {
                sensitivities.iter().for_each(|s| collect_idents_in_lhs(&s.lhs, out));
            } else if let TimingControl::Delay(e) = timing {
                collect_idents_in_expr(e, out);
            }
            collect_used_in_stmt(body, out);
        }
        Stmt::SysTaskCall(_, args, lhs) => {
            args.iter().for_each(|e| collect_idents_in_expr(e, out));
            if let Some(l) = lhs {
                collect_idents_in_lhs(l, out);
            }
        }
        Stmt::Null => {}
        Stmt::ExprStmt(e) => collect_idents_in_expr(e, out),
    }
}

fn collect_used_in_package_item(item: &PackageItem, out: &mut AHashSet<String>) {
    match item {
        PackageItem::Decl(d) => collect_used_in_decl(d, out),
        PackageItem::Function(f) => {
            collect_idents_in_type(&f.ret, out);
            f.ports.iter().chain(f.decls.iter()).for_each(|d| collect_used_in_decl(d, out));
            f.stmts.iter().for_each(|s| collect_used_in_stmt(s, out));
        }
        PackageItem::Task(t) => {
            t.ports.iter().chain(t.decls.iter()).for_each(|d| collect_used_in_decl(d, out));
            t.stmts.iter().for_each(|s| collect_used_in_stmt(s, out));
        }
        PackageItem::Import { .. } | PackageItem::Export { .. } | PackageItem::Directive(_) => {}
    }
}

fn collect_used_in_module_item(item: &ModuleItem, out: &mut AHashSet<String>) {
    match item {
        ModuleItem::MIPackageItem(pi) => collect_used_in_package_item(pi, out),
        ModuleItem::Initial(s) | ModuleItem::Always(_, s) => collect_used_in_stmt(s, out),
        ModuleItem::Assign(lhs, rhs) => {
            collect_idents_in_lhs(lhs, out);
            collect_idents_in_expr(rhs, out);
        }
        ModuleItem::MIInstance(inst) => {
            for p in &inst.params {
                match &p.value {
                    ParamValue::Expr(e) => collect_idents_in_expr(e, out),
                    ParamValue::Type(t) => collect_idents_in_type(t, out),
                }
            }
            for p in &inst.ports {
                if let Some(e) = &p.expr {
                    collect_idents_in_expr(e, out);
                }
            }
        }
        ModuleItem::Generate(items) => items.iter().for_each(|g| collect_used_in_gen_item(g, out)),
    }
}

fn collect_used_in_gen_item(item: &GenItem, out: &mut AHashSet<String>) {
    match item {
        GenItem::GIItem(mi) => collect_used_in_module_item(mi, out),
        GenItem::GIBlock(_, items) => items.iter().for_each(|g| collect_used_in_gen_item(g, out)),
        GenItem::GIIf(c, t, e) => {
            collect_idents_in_expr(c, out);
            collect_used_in_gen_item(t, out);
            if let Some(e) = e {
                collect_used_in_gen_item(e, out);
            }
        }
        GenItem::GICase(d, arms, default) => {
            collect_idents_in_expr(d, out);
            for (labels, g) in arms {
                labels.iter().for_each(|e| collect_idents_in_expr(e, out));
                collect_used_in_gen_item(g, out);
            }
            if let Some(d) = default {
                collect_used_in_gen_item(d, out);
            }
        }
        GenItem::GIFor { init, cond, step, body, .. } => {
            collect_idents_in_expr(init, out);
            collect_idents_in_expr(cond, out);
            collect_idents_in_expr(step, out);
            collect_used_in_gen_item(body, out);
        }
    }
}
