//! Pretty-printing (spec §6): renders each AST variant back to the
//! textual Verilog-2005 form named in its doc comment. Comment/whitespace
//! preservation is explicitly out of scope (spec §1 Non-goals); this is a
//! minimal, canonical renderer, not a source-formatting tool.

use std::fmt;

use super::decl::{Decl, Direction, Lifetime, ParamKind};
use super::expr::{Expr, LHS};
use super::items::{AlwaysKind, Description, GenItem, Instance, ModuleItem, PackageItem, Part, PartKeyword};
use super::stmt::{Edge, Stmt, TimingControl};
use super::types::{IntegerAtomType, IntegerVectorType, NetType, NonIntegerType, Range, Signing, Type};

fn indent(body: &str) -> String {
    body.lines().map(|l| format!("    {l}\n")).collect()
}

fn join<T: fmt::Display>(items: &[T], sep: &str) -> String {
    items.iter().map(ToString::to_string).collect::<Vec<_>>().join(sep)
}

impl fmt::Display for Signing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signing::Unspecified => Ok(()),
            Signing::Signed => write!(f, " signed"),
            Signing::Unsigned => write!(f, " unsigned"),
        }
    }
}

fn fmt_ranges(ranges: &[Range]) -> String {
    ranges
        .iter()
        .map(|(hi, lo)| format!("[{hi}:{lo}]"))
        .collect::<Vec<_>>()
        .join("")
}

impl fmt::Display for IntegerVectorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            IntegerVectorType::TBit => "bit",
            IntegerVectorType::TLogic => "logic",
            IntegerVectorType::TReg => "reg",
        })
    }
}

impl fmt::Display for IntegerAtomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            IntegerAtomType::TByte => "byte",
            IntegerAtomType::TShortint => "shortint",
            IntegerAtomType::TInt => "int",
            IntegerAtomType::TLongint => "longint",
            IntegerAtomType::TInteger => "integer",
            IntegerAtomType::TTime => "time",
        })
    }
}

impl fmt::Display for NonIntegerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NonIntegerType::TReal => "real",
            NonIntegerType::TShortreal => "shortreal",
            NonIntegerType::TRealtime => "realtime",
            NonIntegerType::TString => "string",
            NonIntegerType::TVoid => "void",
            NonIntegerType::TChandle => "chandle",
            NonIntegerType::TEvent => "event",
        })
    }
}

impl fmt::Display for NetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NetType::TWire => "wire",
            NetType::TTri => "tri",
            NetType::TWand => "wand",
            NetType::TWor => "wor",
        })
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::IntegerVector(kind, sg, rs) => write!(f, "{kind}{sg} {}", fmt_ranges(rs)),
            Type::IntegerAtom(kind, sg) => write!(f, "{kind}{sg}"),
            Type::NonInteger(kind) => write!(f, "{kind}"),
            Type::Net(kind, sg, rs) => write!(f, "{kind}{sg} {}", fmt_ranges(rs)),
            Type::Implicit(sg, rs) => write!(f, "{sg} {}", fmt_ranges(rs)),
            Type::Alias(name, rs) => write!(f, "{name} {}", fmt_ranges(rs)),
            Type::PackageScoped(p, x, rs) => write!(f, "{p}::{x} {}", fmt_ranges(rs)),
            Type::ClassScoped(c, b, x, rs) => write!(f, "{c}#({})::{x} {}", join(b, ", "), fmt_ranges(rs)),
            Type::Enum(base, items, rs) => {
                let items = items
                    .iter()
                    .map(|(n, e)| match e {
                        Some(e) => format!("{n}={e}"),
                        None => n.clone(),
                    })
                    .collect::<Vec<_>>()
                    .join(",");
                write!(f, "enum {base}{{{items}}}{}", fmt_ranges(rs))
            }
            Type::Struct {
                packed,
                is_union,
                members,
                ranges,
            } => {
                let kw = if *is_union { "union" } else { "struct" };
                let packed = if *packed { " packed" } else { "" };
                let members = members.iter().map(|(t, n)| format!("{t} {n};")).collect::<Vec<_>>().join(" ");
                write!(f, "{kw}{packed} {{{members}}} {}", fmt_ranges(ranges))
            }
            Type::InterfaceRef(name, modport) => match modport {
                Some(m) => write!(f, "{name}.{m}"),
                None => write!(f, "{name}"),
            },
            Type::TypeOf(e) => write!(f, "type({e})"),
            Type::TypedefRef(name) => write!(f, "{name}"),
            Type::Unpacked(inner, rs) => write!(f, "{inner}{}", fmt_ranges(rs)),
        }
    }
}

impl fmt::Display for super::types::ParamBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match &self.value {
            super::types::ParamValue::Expr(e) => e.to_string(),
            super::types::ParamValue::Type(t) => t.to_string(),
        };
        match &self.name {
            Some(n) => write!(f, ".{n}({value})"),
            None => write!(f, "{value}"),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Number(s) | Expr::Ident(s) => write!(f, "{s}"),
            Expr::String(s) => write!(f, "\"{s}\""),
            Expr::PSIdent(p, x) => write!(f, "{p}::{x}"),
            Expr::CSIdent(c, b, x) => write!(f, "{c}#({})::{x}", join(b, ", ")),
            Expr::Index(base, idx) => write!(f, "{base}[{idx}]"),
            Expr::Range(base, hi, lo) => write!(f, "{base}[{hi}:{lo}]"),
            Expr::Dot(base, field) => write!(f, "{base}.{field}"),
            Expr::Concat(items) => write!(f, "{{{}}}", join(items, ", ")),
            Expr::Repeat(n, items) => write!(f, "{{{n}{{{}}}}}", join(items, ", ")),
            Expr::BinOp(l, op, r) => write!(f, "({l} {} {r})", bin_op_str(*op)),
            Expr::UnOp(op, e) => write!(f, "({}{e})", un_op_str(*op)),
            Expr::Cond(c, t, e) => write!(f, "({c} ? {t} : {e})"),
            Expr::Call(name, args) => write!(f, "{name}({})", join(args, ", ")),
            Expr::TypeCast(ty, e) => write!(f, "{ty}'({e})"),
        }
    }
}

fn bin_op_str(op: super::expr::BinOp) -> &'static str {
    use super::expr::BinOp::*;
    match op {
        Add => "+",
        Sub => "-",
        Mul => "*",
        Div => "/",
        Mod => "%",
        And => "&",
        Or => "|",
        Xor => "^",
        LogAnd => "&&",
        LogOr => "||",
        Eq => "==",
        Ne => "!=",
        Lt => "<",
        Le => "<=",
        Gt => ">",
        Ge => ">=",
        Shl => "<<",
        Shr => ">>",
    }
}

fn un_op_str(op: super::expr::UnOp) -> &'static str {
    use super::expr::UnOp::*;
    match op {
        Neg => "-",
        Not => "!",
        BitNot => "~",
        ReduceAnd => "&",
        ReduceOr => "|",
        ReduceXor => "^",
    }
}

impl fmt::Display for LHS {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LHS::Ident(s) => write!(f, "{s}"),
            LHS::PSIdent(p, x) => write!(f, "{p}::{x}"),
            LHS::CSIdent(c, b, x) => write!(f, "{c}#({})::{x}", join(b, ", ")),
            LHS::Index(base, idx) => write!(f, "{base}[{idx}]"),
            LHS::Range(base, hi, lo) => write!(f, "{base}[{hi}:{lo}]"),
            LHS::Dot(base, field) => write!(f, "{base}.{field}"),
            LHS::Concat(items) => write!(f, "{{{}}}", join(items, ", ")),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Direction::Input => "input",
            Direction::Output => "output",
            Direction::Inout => "inout",
        })
    }
}

impl fmt::Display for Decl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decl::Variable {
                direction,
                ty,
                name,
                unpacked,
                init,
            } => {
                if let Some(dir) = direction {
                    write!(f, "{dir} ")?;
                }
                write!(f, "{ty} {name}{}", fmt_ranges(unpacked))?;
                if let Some(init) = init {
                    write!(f, " = {init}")?;
                }
                write!(f, ";")
            }
            Decl::Param { kind, ty, name, expr } => {
                let kw = match kind {
                    ParamKind::Parameter => "parameter",
                    ParamKind::Localparam => "localparam",
                };
                write!(f, "{kw} {ty} {name} = {expr};")
            }
            Decl::ParamType { kind, name, ty } => {
                let kw = match kind {
                    ParamKind::Parameter => "parameter",
                    ParamKind::Localparam => "localparam",
                };
                match ty {
                    Some(ty) => write!(f, "{kw} type {name} = {ty};"),
                    None => write!(f, "{kw} type {name};"),
                }
            }
            Decl::CommentDecl(text) => write!(f, "// {text}"),
        }
    }
}

impl fmt::Display for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lifetime::Static => Ok(()),
            Lifetime::Automatic => write!(f, "automatic "),
        }
    }
}

impl fmt::Display for TimingControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimingControl::Star => write!(f, "@*"),
            TimingControl::Delay(e) => write!(f, "#{e}"),
            TimingControl::Event(sens) => {
                let items = sens
                    .iter()
                    .map(|s| match s.edge {
                        Some(Edge::Posedge) => format!("posedge {}", s.lhs),
                        Some(Edge::Negedge) => format!("negedge {}", s.lhs),
                        _ => s.lhs.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join(" or ");
                write!(f, "@({items})")
            }
        }
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stmt::Block(label, decls, stmts) => {
                let mut body = String::new();
                for d in decls {
                    body.push_str(&format!("{d}\n"));
                }
                for s in stmts {
                    body.push_str(&format!("{s}\n"));
                }
                match label {
                    Some(name) => write!(f, "begin : {name}\n{}end", indent(&body)),
                    None => write!(f, "begin\n{}end", indent(&body)),
                }
            }
            Stmt::If(cond, then, els) => match els {
                Some(e) => write!(f, "if ({cond}) {then}\nelse {e}"),
                None => write!(f, "if ({cond}) {then}"),
            },
            Stmt::Case(disc, arms, default) => {
                let mut body = String::new();
                for (labels, stmt) in arms {
                    body.push_str(&format!("{}: {stmt}\n", join(labels, ", ")));
                }
                if let Some(d) = default {
                    body.push_str(&format!("default: {d}\n"));
                }
                write!(f, "case ({disc})\n{}endcase", indent(&body))
            }
            Stmt::For {
                inits,
                cond,
                incrs,
                body,
            } => write!(f, "for ({}; {cond}; {}) {body}", join(inits, ", "), join(incrs, ", ")),
            Stmt::While(cond, body) => write!(f, "while ({cond}) {body}"),
            Stmt::BlockingAssign(lhs, rhs) => write!(f, "{lhs} = {rhs};"),
            Stmt::NonBlockingAssign(lhs, rhs) => write!(f, "{lhs} <= {rhs};"),
            Stmt::Timing(timing, stmt) => write!(f, "{timing} {stmt}"),
            Stmt::SysTaskCall(name, args, lhs) => {
                let mut all: Vec<String> = args.iter().map(ToString::to_string).collect();
                if let Some(lhs) = lhs {
                    all.push(lhs.to_string());
                }
                write!(f, "{name}({});", all.join(", "))
            }
            Stmt::Null => write!(f, ";"),
            Stmt::ExprStmt(e) => write!(f, "{e};"),
        }
    }
}

impl fmt::Display for PackageItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PackageItem::Function(func) => {
                let mut body = String::new();
                for d in &func.decls {
                    body.push_str(&format!("{d}\n"));
                }
                for s in &func.stmts {
                    body.push_str(&format!("{s}\n"));
                }
                write!(
                    f,
                    "function {}{} {}({});\n{}endfunction",
                    func.lifetime,
                    func.ret,
                    func.name,
                    join(&func.ports, ", "),
                    indent(&body)
                )
            }
            PackageItem::Task(task) => {
                let mut body = String::new();
                for d in &task.decls {
                    body.push_str(&format!("{d}\n"));
                }
                for s in &task.stmts {
                    body.push_str(&format!("{s}\n"));
                }
                write!(
                    f,
                    "task {}{}({});\n{}endtask",
                    task.lifetime,
                    task.name,
                    join(&task.ports, ", "),
                    indent(&body)
                )
            }
            PackageItem::Import { pkg, ident } => {
                write!(f, "import {pkg}::{};", ident.as_deref().unwrap_or("*"))
            }
            PackageItem::Export { pkg, ident } => {
                write!(
                    f,
                    "export {}::{};",
                    pkg.as_deref().unwrap_or("*"),
                    ident.as_deref().unwrap_or("*")
                )
            }
            PackageItem::Decl(d) => write!(f, "{d}"),
            PackageItem::Directive(text) => write!(f, "{text}"),
        }
    }
}

fn fmt_ports(ports: &[super::items::PortBinding]) -> String {
    ports
        .iter()
        .map(|p| match (&p.name, &p.expr) {
            (Some(n), Some(e)) => format!(".{n}({e})"),
            (Some(n), None) => format!(".{n}()"),
            (None, Some(e)) => e.to_string(),
            (None, None) => String::new(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.params.is_empty() {
            write!(f, "{} {}({});", self.module, self.name, fmt_ports(&self.ports))
        } else {
            write!(
                f,
                "{} #({}) {}({});",
                self.module,
                join(&self.params, ", "),
                self.name,
                fmt_ports(&self.ports)
            )
        }
    }
}

impl fmt::Display for ModuleItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleItem::MIPackageItem(pi) => write!(f, "{pi}"),
            ModuleItem::Initial(s) => write!(f, "initial {s}"),
            ModuleItem::Always(kind, s) => {
                let kw = match kind {
                    AlwaysKind::Comb => "always_comb",
                    AlwaysKind::Latch => "always_latch",
                    AlwaysKind::Ff => "always_ff",
                    AlwaysKind::Plain => "always",
                };
                write!(f, "{kw} {s}")
            }
            ModuleItem::Assign(lhs, rhs) => write!(f, "assign {lhs} = {rhs};"),
            ModuleItem::MIInstance(inst) => write!(f, "{inst}"),
            ModuleItem::Generate(items) => {
                let mut body = String::new();
                for item in items {
                    body.push_str(&format!("{item}\n"));
                }
                write!(f, "generate\n{}endgenerate", indent(&body))
            }
        }
    }
}

impl fmt::Display for GenItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenItem::GIItem(item) => write!(f, "{item}"),
            GenItem::GIBlock(label, items) => {
                let mut body = String::new();
                for item in items {
                    body.push_str(&format!("{item}\n"));
                }
                match label {
                    Some(name) => write!(f, "begin : {name}\n{}end", indent(&body)),
                    None => write!(f, "begin\n{}end", indent(&body)),
                }
            }
            GenItem::GIIf(cond, then, els) => match els {
                Some(e) => write!(f, "if ({cond}) {then}\nelse {e}"),
                None => write!(f, "if ({cond}) {then}"),
            },
            GenItem::GICase(disc, arms, default) => {
                let mut body = String::new();
                for (labels, item) in arms {
                    body.push_str(&format!("{}: {item}\n", join(labels, ", ")));
                }
                if let Some(d) = default {
                    body.push_str(&format!("default: {d}\n"));
                }
                write!(f, "case ({disc})\n{}endcase", indent(&body))
            }
            GenItem::GIFor {
                genvar,
                init,
                cond,
                step,
                body,
            } => write!(f, "for ({genvar} = {init}; {cond}; {genvar} = {step}) {body}"),
        }
    }
}

impl fmt::Display for Part {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for attr in &self.attrs {
            writeln!(f, "(* {attr} *)")?;
        }
        if self.is_extern {
            write!(f, "extern ")?;
        }
        let kw = match self.keyword {
            PartKeyword::Module => "module",
            PartKeyword::Interface => "interface",
        };
        let mut body = String::new();
        for item in &self.items {
            body.push_str(&format!("{item}\n"));
        }
        write!(
            f,
            "{kw} {}{}({});\n{}end{kw}",
            self.lifetime,
            self.name,
            self.port_names.join(", "),
            indent(&body)
        )
    }
}

impl fmt::Display for Description {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Description::Part(p) => write!(f, "{p}"),
            Description::Package(pkg) => {
                let mut body = String::new();
                for item in &pkg.items {
                    body.push_str(&format!("{item}\n"));
                }
                write!(f, "package {}{};\n{}endpackage", pkg.lifetime, pkg.name, indent(&body))
            }
            Description::Class(cls) => {
                let mut body = String::new();
                for item in &cls.items {
                    body.push_str(&format!("{item}\n"));
                }
                write!(f, "class {};\n{}endclass", cls.name, indent(&body))
            }
            Description::Item(item) => write!(f, "{item}"),
        }
    }
}
