//! The crate's single fatal-error taxonomy (spec §7).
//!
//! Every pass returns `CompileResult<T>`; the first `Sv2vError` produced by
//! any pass propagates straight out of `Driver::run` with no recovery
//! attempted (spec §5 "Cancellation: none; a fatal error aborts the whole
//! run"). Mirrors the teacher's `RunError`/`ExcType` split: one hand-rolled
//! enum, a manual `Display`, no `thiserror`.

use std::fmt;

pub type CompileResult<T> = Result<T, Sv2vError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sv2vError {
    /// Import vs. declaration, or two conflicting imports of the same
    /// symbol.
    NameConflict { name: String, detail: String },
    /// A wildcard import exposes two distinct definitions of the same
    /// name.
    AmbiguousReference { name: String, candidates: Vec<String> },
    /// Import, export, or package-scoped reference to an unknown package
    /// or unknown member.
    MissingSymbol { what: String },
    /// Package `A` transitively refers to itself via imports.
    DependencyCycle { cycle: Vec<String> },
    /// Missing required parameter, type/expression mismatch on override,
    /// or reference to a parameterized class without `#()`.
    ClassParamError { class: String, detail: String },
    /// Export outside a package, non-LHS expression bound to an output
    /// port, packed ranges applied to a non-vector type, etc.
    StructuralError { detail: String },
}

impl fmt::Display for Sv2vError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sv2vError::NameConflict { name, detail } => write!(f, "name conflict on '{name}': {detail}"),
            Sv2vError::AmbiguousReference { name, candidates } => {
                write!(f, "ambiguous reference to '{name}': could refer to {}", candidates.join(", "))
            }
            Sv2vError::MissingSymbol { what } => write!(f, "missing symbol: {what}"),
            Sv2vError::DependencyCycle { cycle } => write!(f, "dependency loop: {}", cycle.join(" -> ")),
            Sv2vError::ClassParamError { class, detail } => write!(f, "class parameter error in '{class}': {detail}"),
            Sv2vError::StructuralError { detail } => write!(f, "structural error: {detail}"),
        }
    }
}

impl std::error::Error for Sv2vError {}

impl Sv2vError {
    #[must_use]
    pub fn ambiguous(name: impl Into<String>, mut candidates: Vec<String>) -> Self {
        candidates.sort();
        Self::AmbiguousReference {
            name: name.into(),
            candidates,
        }
    }

    #[must_use]
    pub fn missing(what: impl Into<String>) -> Self {
        Self::MissingSymbol { what: what.into() }
    }

    #[must_use]
    pub fn cycle(cycle: Vec<String>) -> Self {
        Self::DependencyCycle { cycle }
    }

    #[must_use]
    pub fn conflict(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::NameConflict {
            name: name.into(),
            detail: detail.into(),
        }
    }

    #[must_use]
    pub fn structural(detail: impl Into<String>) -> Self {
        Self::StructuralError {
            detail: detail.into(),
        }
    }

    #[must_use]
    pub fn class_param(class: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::ClassParamError {
            class: class.into(),
            detail: detail.into(),
        }
    }
}
