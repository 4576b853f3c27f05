//! Expressions, LHSs, and the `Access` path shape the Scoper resolves to.

use super::types::{ParamBinding, Type};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    And,
    Or,
    Xor,
    LogAnd,
    LogOr,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Shl,
    Shr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum UnOp {
    Neg,
    Not,
    BitNot,
    ReduceAnd,
    ReduceOr,
    ReduceXor,
}

/// One segment of a resolved absolute path: a name plus an optional index
/// expression (for array-indexed declarations reached through generate
/// loops). Mirrors spec §4.2's `Access name maybeIndex`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Access {
    pub name: String,
    pub index: Option<Box<Expr>>,
}

impl Access {
    #[must_use]
    pub fn plain(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            index: None,
        }
    }
}

/// An absolute reference path: a sequence of `Access` segments from the
/// root of the current Description down to the identifier.
pub type AccessPath = Vec<Access>;

#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Expr {
    Number(String),
    String(String),
    Ident(String),
    /// `P::X`
    PSIdent(String, String),
    /// `C#(bindings)::X`
    CSIdent(String, Vec<ParamBinding>, String),
    Index(Box<Expr>, Box<Expr>),
    Range(Box<Expr>, Box<Expr>, Box<Expr>),
    Dot(Box<Expr>, String),
    Concat(Vec<Expr>),
    Repeat(Box<Expr>, Vec<Expr>),
    BinOp(Box<Expr>, BinOp, Box<Expr>),
    UnOp(UnOp, Box<Expr>),
    Cond(Box<Expr>, Box<Expr>, Box<Expr>),
    Call(String, Vec<Expr>),
    /// `type(expr)` used in a type-parameter position.
    TypeCast(Box<Type>, Box<Expr>),
}

impl Expr {
    /// If this expression is (or reduces through indexing/selects to) a
    /// plain or package/class-scoped identifier reference, returns the
    /// identifier-shaped prefix the Scoper can resolve. Used by
    /// `lookupElemM` when called with an expression rather than an LHS.
    #[must_use]
    pub fn ident_prefix(&self) -> Option<IdentRef<'_>> {
        match self {
            Expr::Ident(x) => Some(IdentRef::Plain(x)),
            Expr::PSIdent(p, x) => Some(IdentRef::PackageScoped(p, x)),
            Expr::CSIdent(c, b, x) => Some(IdentRef::ClassScoped(c, b, x)),
            Expr::Index(base, _) | Expr::Range(base, _, _) | Expr::Dot(base, _) => base.ident_prefix(),
            _ => None,
        }
    }
}

/// A left-hand-side expression: strictly more restricted than `Expr`, but
/// the same shapes reappear (index/range/dot/concat over an identifier).
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum LHS {
    Ident(String),
    PSIdent(String, String),
    CSIdent(String, Vec<ParamBinding>, String),
    Index(Box<LHS>, Box<Expr>),
    Range(Box<LHS>, Box<Expr>, Box<Expr>),
    Dot(Box<LHS>, String),
    Concat(Vec<LHS>),
}

impl LHS {
    #[must_use]
    pub fn ident_prefix(&self) -> Option<IdentRef<'_>> {
        match self {
            LHS::Ident(x) => Some(IdentRef::Plain(x)),
            LHS::PSIdent(p, x) => Some(IdentRef::PackageScoped(p, x)),
            LHS::CSIdent(c, b, x) => Some(IdentRef::ClassScoped(c, b, x)),
            LHS::Index(base, _) | LHS::Range(base, _, _) | LHS::Dot(base, _) => base.ident_prefix(),
            LHS::Concat(_) => None,
        }
    }

    /// The root identifier name, if this LHS ultimately selects into a
    /// plain (non-scoped) identifier. Used by the logic-conversion pass
    /// when recording assignment targets into set `S`.
    #[must_use]
    pub fn root_name(&self) -> Option<&str> {
        match self.ident_prefix()? {
            IdentRef::Plain(x) => Some(x),
            _ => None,
        }
    }
}

/// A reference shape extracted from the head of an `Expr`/`LHS` chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentRef<'a> {
    Plain(&'a str),
    PackageScoped(&'a str, &'a str),
    ClassScoped(&'a str, &'a [ParamBinding], &'a str),
}
