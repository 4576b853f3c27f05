//! `PackageItem`, `ModuleItem`, `GenItem`, and the top-level `Description`
//! family (spec §3).

use super::decl::{Decl, Lifetime};
use super::expr::{Expr, LHS};
use super::stmt::Stmt;
use super::types::ParamBinding;

#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct FunctionDecl {
    pub lifetime: Lifetime,
    pub ret: super::types::Type,
    pub name: String,
    pub ports: Vec<Decl>,
    pub decls: Vec<Decl>,
    pub stmts: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct TaskDecl {
    pub lifetime: Lifetime,
    pub name: String,
    pub ports: Vec<Decl>,
    pub decls: Vec<Decl>,
    pub stmts: Vec<Stmt>,
}

/// An item legal at package or module scope (spec §3).
///
/// `Import`/`Export` model the empty-string-means-wildcard convention from
/// the spec directly via `Option<String>` (`None` == wildcard `*`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum PackageItem {
    Function(FunctionDecl),
    Task(TaskDecl),
    /// `import pkg::ident;` — `ident == None` is `import pkg::*;`.
    Import { pkg: String, ident: Option<String> },
    /// `export pkg::ident;` — `pkg == None` is `export *::...`, `ident ==
    /// None` is `export pkg::*;`.
    Export { pkg: Option<String>, ident: Option<String> },
    Decl(Decl),
    /// Preserved verbatim; e.g. an `` `include `` or other directive text
    /// the parser could not interpret further.
    Directive(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum PartKeyword {
    Module,
    Interface,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum AlwaysKind {
    Comb,
    Latch,
    Ff,
    Plain,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct PortBinding {
    /// `None` for a positional binding.
    pub name: Option<String>,
    /// `None` for an explicitly unconnected port (`.name()`).
    pub expr: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Instance {
    pub module: String,
    pub params: Vec<ParamBinding>,
    pub name: String,
    pub ports: Vec<PortBinding>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ModuleItem {
    MIPackageItem(PackageItem),
    Initial(Stmt),
    Always(AlwaysKind, Stmt),
    Assign(LHS, Expr),
    MIInstance(Instance),
    Generate(Vec<GenItem>),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum GenItem {
    GIItem(Box<ModuleItem>),
    /// A (possibly named) generate block; named blocks push a Scoper
    /// frame (spec §4.2).
    GIBlock(Option<String>, Vec<GenItem>),
    GIIf(Expr, Box<GenItem>, Option<Box<GenItem>>),
    GICase(Expr, Vec<(Vec<Expr>, GenItem)>, Option<Box<GenItem>>),
    GIFor {
        genvar: String,
        init: Expr,
        cond: Expr,
        step: Expr,
        body: Box<GenItem>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Part {
    /// Header attributes `(* ... *)`, preserved verbatim.
    pub attrs: Vec<String>,
    pub is_extern: bool,
    pub keyword: PartKeyword,
    pub lifetime: Lifetime,
    pub name: String,
    pub port_names: Vec<String>,
    pub items: Vec<ModuleItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct PackageDesc {
    pub lifetime: Lifetime,
    pub name: String,
    pub items: Vec<PackageItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct ClassDesc {
    pub name: String,
    pub params: Vec<Decl>,
    pub items: Vec<PackageItem>,
}

/// One top-level AST node (spec §3).
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Description {
    Part(Part),
    Package(PackageDesc),
    Class(ClassDesc),
    Item(PackageItem),
}

impl Description {
    #[must_use]
    pub fn as_part(&self) -> Option<&Part> {
        match self {
            Description::Part(p) => Some(p),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_part_mut(&mut self) -> Option<&mut Part> {
        match self {
            Description::Part(p) => Some(p),
            _ => None,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Description::Part(p) => &p.name,
            Description::Package(p) => &p.name,
            Description::Class(c) => &c.name,
            Description::Item(_) => "",
        }
    }
}

/// Builds the `CommentDecl` `Description::Item` a removed package/class is
/// replaced by at its source position (spec §4.4 Step A).
#[must_use]
pub fn removed_comment(kind: &str, name: &str) -> Description {
    Description::Item(PackageItem::Decl(Decl::CommentDecl(format!("removed {kind} {name}"))))
}
