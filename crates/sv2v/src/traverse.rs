//! Generic traversal kit (spec §4.1, component C2).
//!
//! For each AST family the kit exports a **Map** shape: [`Mapper`] is a
//! trait with one bottom-up hook per family, defaulting to identity, and a
//! `walk_*` free function per family that recurses into children first
//! (invoking the mapper recursively) and then applies the family's own
//! hook -- exactly `traverseNodes` from the spec, generalized over any
//! `Mapper` implementation. Passes implement only the hooks they care
//! about; unmentioned families pass through unchanged.
//!
//! The **Collect** shape is the write-only dual: rather than a fully
//! generic monoid-accumulator trait (which buys little in a typed
//! language over just writing the recursion once), this kit exports the
//! two collectors every pass in this crate actually needs --
//! [`collect_idents_in_expr`] and [`collect_idents_in_lhs`] -- which walk
//! an expression/LHS and write every referenced identifier into a
//! caller-supplied `AHashSet`. Passes with bespoke accumulation needs
//! (e.g. logic conversion's assigned-LHS-path set) write their own
//! small collector using the same recursive shape.

use ahash::AHashSet;

use crate::ast::{Decl, Expr, GenItem, LHS, ModuleItem, Stmt, Type};
use crate::error::CompileResult;

/// One bottom-up rewrite hook per AST family. Default implementations are
/// the identity; a pass overrides only the families it rewrites.
pub trait Mapper {
    fn map_type(&mut self, ty: Type) -> CompileResult<Type> {
        Ok(ty)
    }
    fn map_decl(&mut self, decl: Decl) -> CompileResult<Decl> {
        Ok(decl)
    }
    fn map_expr(&mut self, expr: Expr) -> CompileResult<Expr> {
        Ok(expr)
    }
    fn map_lhs(&mut self, lhs: LHS) -> CompileResult<LHS> {
        Ok(lhs)
    }
    fn map_stmt(&mut self, stmt: Stmt) -> CompileResult<Stmt> {
        Ok(stmt)
    }
    fn map_module_item(&mut self, item: ModuleItem) -> CompileResult<ModuleItem> {
        Ok(item)
    }
    fn map_gen_item(&mut self, item: GenItem) -> CompileResult<GenItem> {
        Ok(item)
    }
}

/// Walks `ty`'s children (none -- `Type` is a leaf as far as the traversal
/// kit is concerned; its internal `Expr`s, e.g. packed-range bounds, are
/// rewritten in place by passes that need it) then applies `M::map_type`.
pub fn walk_type<M: Mapper>(m: &mut M, ty: Type) -> CompileResult<Type> {
    m.map_type(ty)
}

pub fn walk_decl<M: Mapper>(m: &mut M, decl: Decl) -> CompileResult<Decl> {
    let decl = match decl {
        Decl::Variable {
            direction,
            ty,
            name,
            unpacked,
            init,
        } => Decl::Variable {
            direction,
            ty: walk_type(m, ty)?,
            name,
            unpacked,
            init: init.map(|e| walk_expr(m, e)).transpose()?,
        },
        Decl::Param { kind, ty, name, expr } => Decl::Param {
            kind,
            ty: walk_type(m, ty)?,
            name,
            expr: walk_expr(m, expr)?,
        },
        Decl::ParamType { kind, name, ty } => Decl::ParamType {
            kind,
            name,
            ty: ty.map(|t| walk_type(m, t)).transpose()?,
        },
        Decl::CommentDecl(s) => Decl::CommentDecl(s),
    };
    m.map_decl(decl)
}

pub fn walk_expr<M: Mapper>(m: &mut M, expr: Expr) -> CompileResult<Expr> {
    let expr = match expr {
        Expr::Index(base, idx) => Expr::Index(Box::new(walk_expr(m, *base)?), Box::new(walk_expr(m, *idx)?)),
        Expr::Range(base, hi, lo) => Expr::Range(
            Box::new(walk_expr(m, *base)?),
            Box::new(walk_expr(m, *hi)?),
            Box::new(walk_expr(m, *lo)?),
        ),
        Expr::Dot(base, field) => Expr::Dot(Box::new(walk_expr(m, *base)?), field),
        Expr::Concat(items) => Expr::Concat(items.into_iter().map(|e| walk_expr(m, e)).collect::<CompileResult<_>>()?),
        Expr::Repeat(n, items) => Expr::Repeat(
            Box::new(walk_expr(m, *n)?),
            items.into_iter().map(|e| walk_expr(m, e)).collect::<CompileResult<_>>()?,
        ),
        Expr::BinOp(l, op, r) => Expr::BinOp(Box::new(walk_expr(m, *l)?), op, Box::new(walk_expr(m, *r)?)),
        Expr::UnOp(op, e) => Expr::UnOp(op, Box::new(walk_expr(m, *e)?)),
        Expr::Cond(c, t, e) => Expr::Cond(
            Box::new(walk_expr(m, *c)?),
            Box::new(walk_expr(m, *t)?),
            Box::new(walk_expr(m, *e)?),
        ),
        Expr::Call(name, args) => Expr::Call(name, args.into_iter().map(|e| walk_expr(m, e)).collect::<CompileResult<_>>()?),
        Expr::TypeCast(ty, e) => Expr::TypeCast(Box::new(walk_type(m, *ty)?), Box::new(walk_expr(m, *e)?)),
        leaf @ (Expr::Number(_) | Expr::String(_) | Expr::Ident(_) | Expr::PSIdent(..) | Expr::CSIdent(..)) => leaf,
    };
    m.map_expr(expr)
}

pub fn walk_lhs<M: Mapper>(m: &mut M, lhs: LHS) -> CompileResult<LHS> {
    let lhs = match lhs {
        LHS::Index(base, idx) => LHS::Index(Box::new(walk_lhs(m, *base)?), Box::new(walk_expr(m, *idx)?)),
        LHS::Range(base, hi, lo) => LHS::Range(
            Box::new(walk_lhs(m, *base)?),
            Box::new(walk_expr(m, *hi)?),
            Box::new(walk_expr(m, *lo)?),
        ),
        LHS::Dot(base, field) => LHS::Dot(Box::new(walk_lhs(m, *base)?), field),
        LHS::Concat(items) => LHS::Concat(items.into_iter().map(|l| walk_lhs(m, l)).collect::<CompileResult<_>>()?),
        leaf @ (LHS::Ident(_) | LHS::PSIdent(..) | LHS::CSIdent(..)) => leaf,
    };
    m.map_lhs(lhs)
}

pub fn walk_stmt<M: Mapper>(m: &mut M, stmt: Stmt) -> CompileResult<Stmt> {
    let stmt = match stmt {
        Stmt::Block(label, decls, stmts) => Stmt::Block(
            label,
            decls.into_iter().map(|d| walk_decl(m, d)).collect::<CompileResult<_>>()?,
            stmts.into_iter().map(|s| walk_stmt(m, s)).collect::<CompileResult<_>>()?,
        ),
        Stmt::If(cond, then, els) => Stmt::If(
            walk_expr(m, cond)?,
            Box::new(walk_stmt(m, *then)?),
            els.map(|e| walk_stmt(m, *e)).transpose()?.map(Box::new),
        ),
        Stmt::Case(disc, arms, default) => Stmt::Case(
            walk_expr(m, disc)?,
            arms.into_iter()
                .map(|(labels, s)| -> CompileResult<_> {
                    Ok((
                        labels.into_iter().map(|e| walk_expr(m, e)).collect::<CompileResult<_>>()?,
                        walk_stmt(m, s)?,
                    ))
                })
                .collect::<CompileResult<_>>()?,
            default.map(|d| walk_stmt(m, *d)).transpose()?.map(Box::new),
        ),
        Stmt::For {
            inits,
            cond,
            incrs,
            body,
        } => Stmt::For {
            inits: inits.into_iter().map(|s| walk_stmt(m, s)).collect::<CompileResult<_>>()?,
            cond: walk_expr(m, cond)?,
            incrs: incrs.into_iter().map(|s| walk_stmt(m, s)).collect::<CompileResult<_>>()?,
            body: Box::new(walk_stmt(m, *body)?),
        },
        Stmt::While(cond, body) => Stmt::While(walk_expr(m, cond)?, Box::new(walk_stmt(m, *body)?)),
        Stmt::BlockingAssign(lhs, rhs) => Stmt::BlockingAssign(walk_lhs(m, lhs)?, walk_expr(m, rhs)?),
        Stmt::NonBlockingAssign(lhs, rhs) => Stmt::NonBlockingAssign(walk_lhs(m, lhs)?, walk_expr(m, rhs)?),
        Stmt::Timing(timing, body) => Stmt::Timing(timing, Box::new(walk_stmt(m, *body)?)),
        Stmt::SysTaskCall(name, args, lhs) => Stmt::SysTaskCall(
            name,
            args.into_iter().map(|e| walk_expr(m, e)).collect::<CompileResult<_>>()?,
            lhs.map(|l| walk_lhs(m, l)).transpose()?,
        ),
        Stmt::Null => Stmt::Null,
        Stmt::ExprStmt(e) => Stmt::ExprStmt(walk_expr(m, e)?),
    };
    m.map_stmt(stmt)
}

pub fn walk_module_item<M: Mapper>(m: &mut M, item: ModuleItem) -> CompileResult<ModuleItem> {
    let item = match item {
        ModuleItem::MIPackageItem(pi) => ModuleItem::MIPackageItem(walk_package_item(m, pi)?),
        ModuleItem::Initial(s) => ModuleItem::Initial(walk_stmt(m, s)?),
        ModuleItem::Always(kind, s) => ModuleItem::Always(kind, walk_stmt(m, s)?),
        ModuleItem::Assign(lhs, rhs) => ModuleItem::Assign(walk_lhs(m, lhs)?, walk_expr(m, rhs)?),
        ModuleItem::MIInstance(mut inst) => {
            inst.ports = inst
                .ports
                .into_iter()
                .map(|p| -> CompileResult<_> {
                    Ok(crate::ast::PortBinding {
                        name: p.name,
                        expr: p.expr.map(|e| walk_expr(m, e)).transpose()?,
                    })
                })
                .collect::<CompileResult<_>>()?;
            ModuleItem::MIInstance(inst)
        }
        ModuleItem::Generate(items) => {
            ModuleItem::Generate(items.into_iter().map(|g| walk_gen_item(m, g)).collect::<CompileResult<_>>()?)
        }
    };
    m.map_module_item(item)
}

/// `traverseSinglyNested`: walks only direct same-family (`GenItem`)
/// children, delegating into `ModuleItem` traversal at the leaves. This is
/// the shape passes compose as `own_mapper . recurse` when they only need
/// to look at generate-block structure.
pub fn walk_gen_item<M: Mapper>(m: &mut M, item: GenItem) -> CompileResult<GenItem> {
    let item = match item {
        GenItem::GIItem(mi) => GenItem::GIItem(Box::new(walk_module_item(m, *mi)?)),
        GenItem::GIBlock(label, items) => {
            GenItem::GIBlock(label, items.into_iter().map(|g| walk_gen_item(m, g)).collect::<CompileResult<_>>()?)
        }
        GenItem::GIIf(cond, then, els) => GenItem::GIIf(
            walk_expr(m, cond)?,
            Box::new(walk_gen_item(m, *then)?),
            els.map(|e| walk_gen_item(m, *e)).transpose()?.map(Box::new),
        ),
        GenItem::GICase(disc, arms, default) => GenItem::GICase(
            walk_expr(m, disc)?,
            arms.into_iter()
                .map(|(labels, g)| -> CompileResult<_> {
                    Ok((
                        labels.into_iter().map(|e| walk_expr(m, e)).collect::<CompileResult<_>>()?,
                        walk_gen_item(m, g)?,
                    ))
                })
                .collect::<CompileResult<_>>()?,
            default.map(|d| walk_gen_item(m, *d)).transpose()?.map(Box::new),
        ),
        GenItem::GIFor {
            genvar,
            init,
            cond,
            step,
            body,
        } => GenItem::GIFor {
            genvar,
            init: walk_expr(m, init)?,
            cond: walk_expr(m, cond)?,
            step: walk_expr(m, step)?,
            body: Box::new(walk_gen_item(m, *body)?),
        },
    };
    m.map_gen_item(item)
}

/// `PackageItem` carries `Decl`/`Stmt` children but is not itself one of
/// the five families with a dedicated `Mapper` hook (the spec lists
/// `{Description, ModuleItem, GenItem, Stmt, Expr, LHS, Type, Decl}`);
/// walking it just threads the mapper through its children.
pub fn walk_package_item<M: Mapper>(m: &mut M, item: crate::ast::PackageItem) -> CompileResult<crate::ast::PackageItem> {
    use crate::ast::PackageItem;
    Ok(match item {
        PackageItem::Function(mut func) => {
            func.decls = func.decls.into_iter().map(|d| walk_decl(m, d)).collect::<CompileResult<_>>()?;
            func.stmts = func.stmts.into_iter().map(|s| walk_stmt(m, s)).collect::<CompileResult<_>>()?;
            PackageItem::Function(func)
        }
        PackageItem::Task(mut task) => {
            task.decls = task.decls.into_iter().map(|d| walk_decl(m, d)).collect::<CompileResult<_>>()?;
            task.stmts = task.stmts.into_iter().map(|s| walk_stmt(m, s)).collect::<CompileResult<_>>()?;
            PackageItem::Task(task)
        }
        PackageItem::Decl(d) => PackageItem::Decl(walk_decl(m, d)?),
        other @ (PackageItem::Import { .. } | PackageItem::Export { .. } | PackageItem::Directive(_)) => other,
    })
}

// ---- Collect ----

/// Accumulates every identifier referenced inside `expr` (at any nesting
/// depth, including package/class-scoped heads) into `into`.
pub fn collect_idents_in_expr(expr: &Expr, into: &mut AHashSet<String>) {
    match expr {
        Expr::Ident(x) => {
            into.insert(x.clone());
        }
        Expr::PSIdent(p, x) => {
            into.insert(p.clone());
            into.insert(x.clone());
        }
        Expr::CSIdent(c, bindings, x) => {
            into.insert(c.clone());
            into.insert(x.clone());
            for b in bindings {
                collect_idents_in_param_binding(b, into);
            }
        }
        Expr::Index(base, idx) => {
            collect_idents_in_expr(base, into);
            collect_idents_in_expr(idx, into);
        }
        Expr::Range(base, hi, lo) => {
            collect_idents_in_expr(base, into);
            collect_idents_in_expr(hi, into);
            collect_idents_in_expr(lo, into);
        }
        Expr::Dot(base, _) => collect_idents_in_expr(base, into),
        Expr::Concat(items) => items.iter().for_each(|e| collect_idents_in_expr(e, into)),
        Expr::Repeat(n, items) => {
            collect_idents_in_expr(n, into);
            items.iter().for_each(|e| collect_idents_in_expr(e, into));
        }
        Expr::BinOp(l, _, r) => {
            collect_idents_in_expr(l, into);
            collect_idents_in_expr(r, into);
        }
        Expr::UnOp(_, e) => collect_idents_in_expr(e, into),
        Expr::Cond(c, t, e) => {
            collect_idents_in_expr(c, into);
            collect_idents_in_expr(t, into);
            collect_idents_in_expr(e, into);
        }
        Expr::Call(name, args) => {
            into.insert(name.clone());
            args.iter().for_each(|e| collect_idents_in_expr(e, into));
        }
        Expr::TypeCast(ty, e) => {
            collect_idents_in_type(ty, into);
            collect_idents_in_expr(e, into);
        }
        Expr::Number(_) | Expr::String(_) => {}
    }
}

fn collect_idents_in_param_binding(binding: &crate::ast::ParamBinding, into: &mut AHashSet<String>) {
    match &binding.value {
        crate::ast::ParamValue::Expr(e) => collect_idents_in_expr(e, into),
        crate::ast::ParamValue::Type(t) => collect_idents_in_type(t, into),
    }
}

/// Accumulates every identifier referenced inside `ty` (alias names,
/// package/class heads, embedded `type(expr)`) into `into`.
pub fn collect_idents_in_type(ty: &Type, into: &mut AHashSet<String>) {
    match ty {
        Type::Alias(name, _) | Type::TypedefRef(name) => {
            into.insert(name.clone());
        }
        Type::PackageScoped(p, x, _) => {
            into.insert(p.clone());
            into.insert(x.clone());
        }
        Type::ClassScoped(c, bindings, x, _) => {
            into.insert(c.clone());
            into.insert(x.clone());
            bindings.iter().for_each(|b| collect_idents_in_param_binding(b, into));
        }
        Type::TypeOf(e) => collect_idents_in_expr(e, into),
        Type::Enum(base, items, _) => {
            collect_idents_in_type(base, into);
            for (_, e) in items {
                if let Some(e) = e {
                    collect_idents_in_expr(e, into);
                }
            }
        }
        Type::Struct { members, .. } => members.iter().for_each(|(t, _)| collect_idents_in_type(t, into)),
        Type::Unpacked(inner, _) => collect_idents_in_type(inner, into),
        Type::InterfaceRef(name, _) => {
            into.insert(name.clone());
        }
        Type::IntegerVector(..) | Type::IntegerAtom(..) | Type::NonInteger(_) | Type::Net(..) | Type::Implicit(..) => {}
    }
}

/// Accumulates every identifier referenced inside `lhs` into `into`.
pub fn collect_idents_in_lhs(lhs: &LHS, into: &mut AHashSet<String>) {
    match lhs {
        LHS::Ident(x) => {
            into.insert(x.clone());
        }
        LHS::PSIdent(p, x) => {
            into.insert(p.clone());
            into.insert(x.clone());
        }
        LHS::CSIdent(c, bindings, x) => {
            into.insert(c.clone());
            into.insert(x.clone());
            bindings.iter().for_each(|b| collect_idents_in_param_binding(b, into));
        }
        LHS::Index(base, idx) => {
            collect_idents_in_lhs(base, into);
            collect_idents_in_expr(idx, into);
        }
        LHS::Range(base, hi, lo) => {
            collect_idents_in_lhs(base, into);
            collect_idents_in_expr(hi, into);
            collect_idents_in_expr(lo, into);
        }
        LHS::Dot(base, _) => collect_idents_in_lhs(base, into),
        LHS::Concat(items) => items.iter().for_each(|l| collect_idents_in_lhs(l, into)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::BinOp;

    struct ReplaceIdent {
        from: String,
        to: String,
    }

    impl Mapper for ReplaceIdent {
        fn map_expr(&mut self, expr: Expr) -> CompileResult<Expr> {
            Ok(match expr {
                Expr::Ident(x) if x == self.from => Expr::Ident(self.to.clone()),
                other => other,
            })
        }
    }

    #[test]
    fn walk_expr_rewrites_nested_idents_bottom_up() {
        let expr = Expr::BinOp(
            Box::new(Expr::Ident("a".into())),
            BinOp::Add,
            Box::new(Expr::Ident("b".into())),
        );
        let mut mapper = ReplaceIdent {
            from: "a".into(),
            to: "z".into(),
        };
        let result = walk_expr(&mut mapper, expr).unwrap();
        assert_eq!(
            result,
            Expr::BinOp(Box::new(Expr::Ident("z".into())), BinOp::Add, Box::new(Expr::Ident("b".into())))
        );
    }

    #[test]
    fn collect_idents_in_expr_finds_all_refs() {
        let expr = Expr::Cond(
            Box::new(Expr::Ident("sel".into())),
            Box::new(Expr::Call("f".into(), vec![Expr::Ident("x".into())])),
            Box::new(Expr::PSIdent("P".into(), "Y".into())),
        );
        let mut set = AHashSet::new();
        collect_idents_in_expr(&expr, &mut set);
        for name in ["sel", "f", "x", "P", "Y"] {
            assert!(set.contains(name), "missing {name}");
        }
    }
}
