//! Procedural statements.

use super::decl::Decl;
use super::expr::{Expr, LHS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Edge {
    Posedge,
    Negedge,
    Either,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Sensitivity {
    pub edge: Option<Edge>,
    pub lhs: LHS,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum TimingControl {
    /// `@(posedge clk, ...)` / `@*`
    Event(Vec<Sensitivity>),
    Star,
    Delay(Expr),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Stmt {
    /// A named or unnamed statement block; `Some(name)` blocks push a
    /// Scoper frame (spec §4.2).
    Block(Option<String>, Vec<Decl>, Vec<Stmt>),
    If(Expr, Box<Stmt>, Option<Box<Stmt>>),
    Case(Expr, Vec<(Vec<Expr>, Stmt)>, Option<Box<Stmt>>),
    For {
        inits: Vec<Stmt>,
        cond: Expr,
        incrs: Vec<Stmt>,
        body: Box<Stmt>,
    },
    While(Expr, Box<Stmt>),
    BlockingAssign(LHS, Expr),
    NonBlockingAssign(LHS, Expr),
    Timing(TimingControl, Box<Stmt>),
    /// `$readmemh`/`$readmemb` and other system task calls. The variable
    /// argument (when present) is what phase 1 of logic conversion must
    /// record into set `S`.
    SysTaskCall(String, Vec<Expr>, Option<LHS>),
    Null,
    ExprStmt(Expr),
}

impl Stmt {
    /// Returns the LHSs written by this statement's own assignment (not
    /// recursing into nested statements), excluding a `Timing` node's own
    /// trigger LHSs per spec §4.3 phase 1.
    #[must_use]
    pub fn own_assigned_lhs(&self) -> Option<&LHS> {
        match self {
            Stmt::BlockingAssign(lhs, _) | Stmt::NonBlockingAssign(lhs, _) => Some(lhs),
            _ => None,
        }
    }
}
