//! Stand-ins for the three "helper contracts consumed by this core" named
//! in spec §6 (`resolveBindings`, `exprToType`, `shortHash`). In a full
//! sv2v distribution these come from the expression-evaluation and
//! type-checking subsystems, both explicitly out of scope (spec §1); this
//! module gives them concrete, deterministic bodies so the rest of the
//! crate (and its tests) can run end-to-end.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use indexmap::IndexMap;

use crate::ast::{Expr, ParamBinding, ParamValue, Type};
use crate::error::{CompileResult, Sv2vError};

/// A deterministic short textual hash used as an identifier suffix for
/// mangled names (spec §3 "Mangling", §6 `shortHash`).
///
/// `DefaultHasher::new()` uses fixed SipHash keys, so this is stable
/// across runs and processes for the same input -- required for spec
/// §4.4's determinism guarantee ("Output is byte-identical for identical
/// inputs").
#[must_use]
pub fn short_hash(input: &impl Hash) -> String {
    let mut hasher = DefaultHasher::new();
    input.hash(&mut hasher);
    format!("{:08x}", hasher.finish() as u32)
}

/// Matches positional/named parameter `bindings` against `param_names` in
/// declaration order, producing a name-to-value map. Positional bindings
/// fill the earliest unbound names in order; named bindings bind directly.
/// Fails with `msg` as context on arity mismatch, unknown name, or a name
/// bound twice.
pub fn resolve_bindings(
    msg: &str,
    param_names: &[String],
    bindings: &[ParamBinding],
) -> CompileResult<IndexMap<String, ParamValue>> {
    let mut result: IndexMap<String, ParamValue> = IndexMap::new();
    let mut positional_cursor = 0usize;

    for binding in bindings {
        match &binding.name {
            Some(name) => {
                if !param_names.iter().any(|p| p == name) {
                    return Err(Sv2vError::class_param(msg, format!("unknown parameter '{name}'")));
                }
                if result.contains_key(name) {
                    return Err(Sv2vError::class_param(msg, format!("parameter '{name}' bound twice")));
                }
                result.insert(name.clone(), binding.value.clone());
            }
            None => {
                while positional_cursor < param_names.len() && result.contains_key(&param_names[positional_cursor]) {
                    positional_cursor += 1;
                }
                let Some(name) = param_names.get(positional_cursor) else {
                    return Err(Sv2vError::class_param(msg, "too many positional parameters"));
                };
                result.insert(name.clone(), binding.value.clone());
                positional_cursor += 1;
            }
        }
    }

    Ok(result)
}

/// Best-effort conversion of an expression used in a type-parameter
/// position into a `Type`. Returns `None` when the expression has no
/// sensible type reading (spec §6 `exprToType`).
#[must_use]
pub fn expr_to_type(expr: &Expr) -> Option<Type> {
    match expr {
        Expr::Ident(name) => Some(Type::Alias(name.clone(), Vec::new())),
        Expr::PSIdent(pkg, name) => Some(Type::PackageScoped(pkg.clone(), name.clone(), Vec::new())),
        Expr::CSIdent(class, bindings, name) => Some(Type::ClassScoped(class.clone(), bindings.clone(), name.clone(), Vec::new())),
        Expr::TypeCast(ty, _) => Some((**ty).clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_hash_is_deterministic() {
        let a = short_hash(&"WIDTH=2");
        let b = short_hash(&"WIDTH=2");
        assert_eq!(a, b);
        assert_ne!(a, short_hash(&"WIDTH=3"));
    }

    #[test]
    fn resolve_bindings_positional_then_named() {
        let names = vec!["A".to_string(), "B".to_string()];
        let bindings = vec![ParamBinding {
            name: None,
            value: ParamValue::Expr(Expr::Number("2".into())),
        }];
        let bound = resolve_bindings("C", &names, &bindings).unwrap();
        assert_eq!(bound.get("A"), Some(&ParamValue::Expr(Expr::Number("2".into()))));
        assert!(!bound.contains_key("B"));
    }

    #[test]
    fn resolve_bindings_rejects_double_bind() {
        let names = vec!["A".to_string()];
        let bindings = vec![
            ParamBinding {
                name: Some("A".into()),
                value: ParamValue::Expr(Expr::Number("1".into())),
            },
            ParamBinding {
                name: Some("A".into()),
                value: ParamValue::Expr(Expr::Number("2".into())),
            },
        ];
        assert!(resolve_bindings("C", &names, &bindings).is_err());
    }
}
