//! Declarations (spec §3 `Decl`).

use super::expr::Expr;
use super::types::{Range, Type};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Direction {
    Input,
    Output,
    Inout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ParamKind {
    Parameter,
    Localparam,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize, Default)]
pub enum Lifetime {
    #[default]
    Static,
    Automatic,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Decl {
    Variable {
        direction: Option<Direction>,
        ty: Type,
        name: String,
        unpacked: Vec<Range>,
        init: Option<Expr>,
    },
    Param {
        kind: ParamKind,
        ty: Type,
        name: String,
        expr: Expr,
    },
    ParamType {
        kind: ParamKind,
        name: String,
        ty: Option<Type>,
    },
    /// Emitted verbatim, semantically inert.
    CommentDecl(String),
}

impl Decl {
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Decl::Variable { name, .. } | Decl::Param { name, .. } | Decl::ParamType { name, .. } => Some(name),
            Decl::CommentDecl(_) => None,
        }
    }
}
