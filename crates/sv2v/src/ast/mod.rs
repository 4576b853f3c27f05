//! The AST model (spec §3, component C1): a closed family of immutable,
//! comparable tagged variants plus their pretty-print `Display` impls.
//!
//! Nodes are created by the (out-of-scope) parser and replaced wholesale by
//! passes — there is no in-place mutation and no cycles (spec §9
//! "Cyclic AST data": none).

mod decl;
mod display;
mod expr;
mod items;
mod stmt;
mod types;

pub use decl::{Decl, Direction, Lifetime, ParamKind};
pub use expr::{Access, AccessPath, BinOp, Expr, IdentRef, LHS, UnOp};
pub use items::{
    AlwaysKind, ClassDesc, Description, FunctionDecl, GenItem, Instance, ModuleItem, PackageDesc, PackageItem, Part,
    PartKeyword, PortBinding, TaskDecl, removed_comment,
};
pub use stmt::{Edge, Sensitivity, Stmt, TimingControl};
pub use types::{
    IntegerAtomType, IntegerVectorType, NetType, NonIntegerType, ParamBinding, ParamValue, Range, Signing, Type,
    bit_range, elaborate_atom, type_ranges, with_ranges,
};
