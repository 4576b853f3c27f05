//! Step D (spec §4.4): class specialization. A parameterized class
//! reference `C#(bindings)::x` is turned into a one-off synthetic package
//! -- `C`'s parameters overridden by `bindings`, followed by its members --
//! elaborated exactly like any other package and memoized by the
//! `(class, bindings)` pair so repeated references to the same
//! specialization share one copy.

use indexmap::IndexMap;

use super::process::Elaborator;
use crate::ast::{Decl, ParamBinding, ParamValue};
use crate::error::{CompileResult, Sv2vError};
use crate::support::{resolve_bindings, short_hash};

/// Resolves `C#(bindings)` to the name of its synthetic package, running
/// the specialization the first time this `(class, bindings)` pair is
/// seen. `scope_keys` are the short hashes of the resolved access paths of
/// every identifier the (pre-resolution) bindings referenced -- folded into
/// the dedupe hash alongside the resolved bindings themselves so that two
/// scopes whose same-named locals resolve to the same binding *values*
/// still get distinct specializations (spec §4.4 Step D.3).
pub fn resolve_cs_ident(elab: &mut Elaborator, class: &str, bindings: Vec<ParamBinding>, scope_keys: &[String]) -> CompileResult<String> {
    let Some((params, items)) = elab.class_table().get(class).cloned() else {
        return Err(Sv2vError::missing(format!("class '{class}'")));
    };
    let param_names: Vec<String> = params.iter().filter_map(Decl::name).map(str::to_string).collect();
    let bound = resolve_bindings(class, &param_names, &bindings)?;

    let mut sorted: Vec<(&String, &ParamValue)> = bound.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    let hash = short_hash(&(scope_keys, &sorted));
    let dedupe_key = format!("{class}#{hash}");

    if let Some(existing) = elab.synthetic_table_mut().get(&dedupe_key) {
        return Ok(existing.clone());
    }

    let synthetic_name = format!("{class}_{hash}");
    elab.synthetic_table_mut().insert(dedupe_key, synthetic_name.clone());

    let mut class_items: Vec<crate::ast::PackageItem> = params
        .into_iter()
        .map(|decl| override_param(class, decl, &bound))
        .collect::<CompileResult<Vec<_>>>()?
        .into_iter()
        .map(crate::ast::PackageItem::Decl)
        .collect();
    class_items.extend(items);

    elab.process_class_items(&synthetic_name, class_items)?;
    Ok(synthetic_name)
}

/// Applies a resolved parameter override onto one of the class's own
/// parameter declarations. A type/value kind mismatch, or a missing
/// required type parameter with no default, is a fatal `ClassParamError`
/// (spec §4.4 Step D).
fn override_param(class: &str, decl: Decl, bound: &IndexMap<String, ParamValue>) -> CompileResult<Decl> {
    match decl {
        Decl::Param { kind, ty, name, expr } => match bound.get(&name) {
            Some(ParamValue::Expr(e)) => Ok(Decl::Param {
                kind,
                ty,
                name,
                expr: e.clone(),
            }),
            Some(ParamValue::Type(_)) => Err(Sv2vError::class_param(class, format!("'{name}' expects a value, got a type override"))),
            None => Ok(Decl::Param { kind, ty, name, expr }),
        },
        Decl::ParamType { kind, name, ty } => match bound.get(&name) {
            Some(ParamValue::Type(t)) => Ok(Decl::ParamType {
                kind,
                name,
                ty: Some((**t).clone()),
            }),
            Some(ParamValue::Expr(_)) => Err(Sv2vError::class_param(class, format!("'{name}' expects a type, got a value override"))),
            None if ty.is_some() => Ok(Decl::ParamType { kind, name, ty }),
            None => Err(Sv2vError::class_param(class, format!("missing required type parameter '{name}'"))),
        },
        other => Ok(other),
    }
}
