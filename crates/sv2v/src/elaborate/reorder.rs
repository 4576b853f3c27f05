//! `reorderItems` (spec §4.4 Step C.1): a stable permutation that moves
//! each item's local dependencies ahead of it, suppressing duplicates.

use std::collections::VecDeque;

use ahash::AHashSet;

use crate::ast::{Decl, Expr, FunctionDecl, PackageItem, TaskDecl, Type};

fn item_name(item: &PackageItem) -> Option<&str> {
    match item {
        PackageItem::Decl(d) => d.name(),
        PackageItem::Function(f) => Some(f.name.as_str()),
        PackageItem::Task(t) => Some(t.name.as_str()),
        PackageItem::Import { .. } | PackageItem::Export { .. } | PackageItem::Directive(_) => None,
    }
}

fn collect_idents_in_expr(expr: &Expr, out: &mut AHashSet<String>) {
    match expr {
        Expr::Ident(x) => {
            out.insert(x.clone());
        }
        Expr::PSIdent(..) | Expr::CSIdent(..) | Expr::Number(_) | Expr::String(_) => {}
        Expr::Index(a, b) => {
            collect_idents_in_expr(a, out);
            collect_idents_in_expr(b, out);
        }
        Expr::Range(a, b, c) => {
            collect_idents_in_expr(a, out);
            collect_idents_in_expr(b, out);
            collect_idents_in_expr(c, out);
        }
        Expr::Dot(a, _) => collect_idents_in_expr(a, out),
        Expr::Concat(items) | Expr::Call(_, items) => items.iter().for_each(|e| collect_idents_in_expr(e, out)),
        Expr::Repeat(a, items) => {
            collect_idents_in_expr(a, out);
            items.iter().for_each(|e| collect_idents_in_expr(e, out));
        }
        Expr::BinOp(a, _, b) => {
            collect_idents_in_expr(a, out);
            collect_idents_in_expr(b, out);
        }
        Expr::UnOp(_, a) => collect_idents_in_expr(a, out),
        Expr::Cond(a, b, c) => {
            collect_idents_in_expr(a, out);
            collect_idents_in_expr(b, out);
            collect_idents_in_expr(c, out);
        }
        Expr::TypeCast(ty, e) => {
            collect_idents_in_type(ty, out);
            collect_idents_in_expr(e, out);
        }
    }
}

fn collect_idents_in_type(ty: &Type, out: &mut AHashSet<String>) {
    match ty {
        Type::Alias(name, ranges) => {
            out.insert(name.clone());
            ranges.iter().for_each(|(a, b)| {
                collect_idents_in_expr(a, out);
                collect_idents_in_expr(b, out);
            });
        }
        Type::IntegerVector(_, _, ranges) | Type::Net(_, _, ranges) | Type::Implicit(_, ranges) => {
            ranges.iter().for_each(|(a, b)| {
                collect_idents_in_expr(a, out);
                collect_idents_in_expr(b, out);
            });
        }
        Type::Enum(base, _, ranges) => {
            collect_idents_in_type(base, out);
            ranges.iter().for_each(|(a, b)| {
                collect_idents_in_expr(a, out);
                collect_idents_in_expr(b, out);
            });
        }
        Type::Struct { members, .. } => members.iter().for_each(|(t, _)| collect_idents_in_type(t, out)),
        Type::Unpacked(inner, _) => collect_idents_in_type(inner, out),
        Type::TypeOf(expr) => collect_idents_in_expr(expr, out),
        Type::IntegerAtom(..) | Type::NonInteger(_) | Type::PackageScoped(..) | Type::ClassScoped(..) | Type::InterfaceRef(..) | Type::TypedefRef(_) => {}
    }
}

fn item_uses(item: &PackageItem) -> AHashSet<String> {
    let mut out = AHashSet::default();
    match item {
        PackageItem::Decl(Decl::Variable { ty, init, .. }) => {
            collect_idents_in_type(ty, &mut out);
            if let Some(e) = init {
                collect_idents_in_expr(e, &mut out);
            }
        }
        PackageItem::Decl(Decl::Param { ty, expr, .. }) => {
            collect_idents_in_type(ty, &mut out);
            collect_idents_in_expr(expr, &mut out);
        }
        PackageItem::Decl(Decl::ParamType { ty: Some(ty), .. }) => collect_idents_in_type(ty, &mut out),
        PackageItem::Decl(Decl::ParamType { ty: None, .. } | Decl::CommentDecl(_)) => {}
        PackageItem::Function(FunctionDecl { ret, ports, decls, .. }) => {
            collect_idents_in_type(ret, &mut out);
            for d in ports.iter().chain(decls.iter()) {
                if let Decl::Variable { ty, init, .. } = d {
                    collect_idents_in_type(ty, &mut out);
                    if let Some(e) = init {
                        collect_idents_in_expr(e, &mut out);
                    }
                }
            }
        }
        PackageItem::Task(TaskDecl { ports, decls, .. }) => {
            for d in ports.iter().chain(decls.iter()) {
                if let Decl::Variable { ty, init, .. } = d {
                    collect_idents_in_type(ty, &mut out);
                    if let Some(e) = init {
                        collect_idents_in_expr(e, &mut out);
                    }
                }
            }
        }
        PackageItem::Import { .. } | PackageItem::Export { .. } | PackageItem::Directive(_) => {}
    }
    out
}

/// Reorders `items` so each use of a locally-defined name follows that
/// name's defining item, suppressing exact duplicates. Bails out to a
/// stable flush of the remaining queue if no progress can be made within
/// a bounded number of steps (a genuine same-scope mutual dependency
/// cycle, which is not valid SystemVerilog to begin with).
#[must_use]
pub fn reorder_items(items: Vec<PackageItem>) -> Vec<PackageItem> {
    let local_names: AHashSet<String> = items.iter().filter_map(item_name).map(str::to_string).collect();
    let stall_limit = items.len().saturating_mul(items.len()).max(8);

    let mut queue: VecDeque<PackageItem> = items.into();
    let mut output = Vec::with_capacity(queue.len());
    let mut satisfied: AHashSet<String> = AHashSet::default();
    let mut seen: AHashSet<PackageItem> = AHashSet::default();
    let mut stall = 0usize;

    while let Some(item) = queue.pop_front() {
        if stall > stall_limit {
            output.push(item);
            output.extend(queue);
            break;
        }
        let used = item_uses(&item);
        let missing = used.iter().find(|name| local_names.contains(*name) && !satisfied.contains(*name)).cloned();

        let Some(name) = missing else {
            if !seen.insert(item.clone()) {
                stall += 1;
                continue;
            }
            if let Some(n) = item_name(&item) {
                satisfied.insert(n.to_string());
            }
            output.push(item);
            stall = 0;
            continue;
        };

        match queue.iter().position(|it| item_name(it) == Some(name.as_str())) {
            Some(pos) => {
                let dep = queue.remove(pos).expect("position was just located");
                queue.push_front(item);
                queue.push_front(dep);
                stall += 1;
            }
            None => {
                // Defining item already emitted or is this item itself
                // (direct or indirect self-reference); emit as-is.
                if let Some(n) = item_name(&item) {
                    satisfied.insert(n.to_string());
                }
                output.push(item);
                stall = 0;
            }
        }
    }

    output
}
