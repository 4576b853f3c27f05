//! Logic-to-net/variable conversion (spec §4.3, component C4).
//!
//! A two-phase rewrite of a `Part`: phase 1 observes which `logic`
//! declarations are ever written procedurally (landing them in `reg`);
//! phase 2 reclassifies every `logic` declaration and repairs the module
//! items that assumed the old classification. Grounded on the teacher's
//! `prepare.rs` prescan/prepare split (`prescan_module_names` walks the
//! whole body before `prepare_nodes` rewrites it) -- here phase 1 is
//! `observe_part` and phase 2 is `rewrite_part`.

use ahash::{AHashMap, AHashSet};

use crate::ast::{
    AlwaysKind, Decl, Description, Direction, Expr, GenItem, Instance, LHS, ModuleItem, NetType, Part, PortBinding,
    Signing, Stmt, TimingControl, Type, type_ranges,
};
use crate::error::{CompileResult, Sv2vError};
use crate::scope::ScopeStack;
use crate::support::short_hash;

/// Per-module port direction tables, built once over the whole file set so
/// that instance-port repairs (which need to know whether a bound port on
/// *another* module is an `Output`) can look across Parts.
pub type PortDirections = AHashMap<String, AHashMap<String, Direction>>;

/// Runs logic conversion over every `Part` in `descriptions`, in place.
/// Other Description kinds pass through unchanged (spec §4.3 operates
/// only on Parts; packages/classes are handled by elaboration).
pub fn run(descriptions: Vec<Description>) -> CompileResult<Vec<Description>> {
    let port_directions = collect_port_directions(&descriptions);
    descriptions
        .into_iter()
        .map(|desc| match desc {
            Description::Part(part) => Ok(Description::Part(convert_part(part, &port_directions)?)),
            other => Ok(other),
        })
        .collect()
}

fn collect_port_directions(descriptions: &[Description]) -> PortDirections {
    let mut table = PortDirections::default();
    for desc in descriptions {
        let Description::Part(part) = desc else { continue };
        let mut ports = AHashMap::default();
        for item in &part.items {
            if let ModuleItem::MIPackageItem(crate::ast::PackageItem::Decl(Decl::Variable {
                direction: Some(dir),
                name,
                ..
            })) = item
            {
                if part.port_names.iter().any(|p| p == name) {
                    ports.insert(name.clone(), *dir);
                }
            }
        }
        table.insert(part.name.clone(), ports);
    }
    table
}

/// The phase-1 observation: every declared `logic`'s resolved type, and
/// the set of root names that must become `reg`.
struct Observation {
    declared_types: AHashMap<String, Type>,
    reg_names: AHashSet<String>,
}

/// Phase 1: walk every statement, collecting the absolute paths of LHSs
/// assigned procedurally (plus `$readmemh`/`$readmemb` variable args) into
/// set `S`, while recording declarations into a Scoper so `S`'s paths are
/// resolvable. A name lands in `reg_names` if it's in `S` or declared
/// inside a function/task frame (spec §4.3 phase 1 + phase 2's reg rule,
/// computed together since both only need set membership, not full
/// lookup chains, for this crate's flat module-scope model).
fn observe_part(part: &Part) -> Observation {
    let mut scope: ScopeStack<Type> = ScopeStack::new();
    let mut assigned: AHashSet<String> = AHashSet::default();
    let mut declared_types: AHashMap<String, Type> = AHashMap::default();
    let mut procedural_names: AHashSet<String> = AHashSet::default();

    for item in &part.items {
        observe_module_item(item, &mut scope, &mut assigned, &mut declared_types, &mut procedural_names);
    }

    let mut reg_names = assigned.clone();
    reg_names.extend(procedural_names);
    // Only declared logic vectors are candidates; anything else in `S` (a
    // net already, or an undeclared/external name) is irrelevant here.
    reg_names.retain(|name| declared_types.contains_key(name));

    Observation {
        declared_types,
        reg_names,
    }
}

fn record_decl(
    decl: &Decl,
    scope: &mut ScopeStack<Type>,
    declared_types: &mut AHashMap<String, Type>,
    procedural_names: &mut AHashSet<String>,
) {
    if let Decl::Variable { ty, name, .. } = decl {
        scope.insert_elem(name, ty.clone());
        declared_types.insert(name.clone(), ty.clone());
        if scope.within_procedure() {
            procedural_names.insert(name.clone());
        }
    }
}

fn observe_module_item(
    item: &ModuleItem,
    scope: &mut ScopeStack<Type>,
    assigned: &mut AHashSet<String>,
    declared_types: &mut AHashMap<String, Type>,
    procedural_names: &mut AHashSet<String>,
) {
    match item {
        ModuleItem::MIPackageItem(crate::ast::PackageItem::Decl(decl)) => {
            record_decl(decl, scope, declared_types, procedural_names);
        }
        ModuleItem::MIPackageItem(crate::ast::PackageItem::Function(func)) => {
            scope.push_scope(Some(format!("${}", func.name)), true);
            for d in &func.decls {
                record_decl(d, scope, declared_types, procedural_names);
            }
            for s in &func.stmts {
                observe_stmt(s, scope, assigned, declared_types, procedural_names);
            }
            scope.pop_frame();
        }
        ModuleItem::MIPackageItem(crate::ast::PackageItem::Task(task)) => {
            scope.push_scope(Some(format!("${}", task.name)), true);
            for d in &task.decls {
                record_decl(d, scope, declared_types, procedural_names);
            }
            for s in &task.stmts {
                observe_stmt(s, scope, assigned, declared_types, procedural_names);
            }
            scope.pop_frame();
        }
        ModuleItem::MIPackageItem(_) => {}
        ModuleItem::Initial(s) | ModuleItem::Always(_, s) => {
            observe_stmt(s, scope, assigned, declared_types, procedural_names);
        }
        ModuleItem::Assign(..) | ModuleItem::MIInstance(_) => {}
        ModuleItem::Generate(items) => {
            scope.push_scope(None, false);
            for gi in items {
                observe_gen_item(gi, scope, assigned, declared_types, procedural_names);
            }
            scope.pop_frame();
        }
    }
}

fn observe_gen_item(
    item: &GenItem,
    scope: &mut ScopeStack<Type>,
    assigned: &mut AHashSet<String>,
    declared_types: &mut AHashMap<String, Type>,
    procedural_names: &mut AHashSet<String>,
) {
    match item {
        GenItem::GIItem(mi) => observe_module_item(mi, scope, assigned, declared_types, procedural_names),
        GenItem::GIBlock(label, items) => {
            scope.push_scope(label.clone(), false);
            for gi in items {
                observe_gen_item(gi, scope, assigned, declared_types, procedural_names);
            }
            scope.pop_frame();
        }
        GenItem::GIIf(_, then, els) => {
            observe_gen_item(then, scope, assigned, declared_types, procedural_names);
            if let Some(e) = els {
                observe_gen_item(e, scope, assigned, declared_types, procedural_names);
            }
        }
        GenItem::GICase(_, arms, default) => {
            for (_, g) in arms {
                observe_gen_item(g, scope, assigned, declared_types, procedural_names);
            }
            if let Some(d) = default {
                observe_gen_item(d, scope, assigned, declared_types, procedural_names);
            }
        }
        GenItem::GIFor { body, .. } => observe_gen_item(body, scope, assigned, declared_types, procedural_names),
    }
}

fn observe_stmt(
    stmt: &Stmt,
    scope: &mut ScopeStack<Type>,
    assigned: &mut AHashSet<String>,
    declared_types: &mut AHashMap<String, Type>,
    procedural_names: &mut AHashSet<String>,
) {
    match stmt {
        Stmt::Block(label, decls, stmts) => {
            scope.push_scope(label.clone(), false);
            for d in decls {
                record_decl(d, scope, declared_types, procedural_names);
            }
            for s in stmts {
                observe_stmt(s, scope, assigned, declared_types, procedural_names);
            }
            scope.pop_frame();
        }
        Stmt::If(_, then, els) => {
            observe_stmt(then, scope, assigned, declared_types, procedural_names);
            if let Some(e) = els {
                observe_stmt(e, scope, assigned, declared_types, procedural_names);
            }
        }
        Stmt::Case(_, arms, default) => {
            for (_, s) in arms {
                observe_stmt(s, scope, assigned, declared_types, procedural_names);
            }
            if let Some(d) = default {
                observe_stmt(d, scope, assigned, declared_types, procedural_names);
            }
        }
        Stmt::For { inits, incrs, body, .. } => {
            for s in inits.iter().chain(incrs.iter()) {
                observe_stmt(s, scope, assigned, declared_types, procedural_names);
            }
            observe_stmt(body, scope, assigned, declared_types, procedural_names);
        }
        Stmt::While(_, body) => observe_stmt(body, scope, assigned, declared_types, procedural_names),
        Stmt::BlockingAssign(lhs, _) | Stmt::NonBlockingAssign(lhs, _) => {
            if let Some(name) = lhs.root_name() {
                assigned.insert(name.to_string());
            }
        }
        // A Timing node's own trigger LHSs (the sensitivity list) are not
        // assignments and are excluded from `S`; only the inner statement
        // is observed.
        Stmt::Timing(_, body) => observe_stmt(body, scope, assigned, declared_types, procedural_names),
        Stmt::SysTaskCall(name, _, lhs) => {
            if matches!(name.as_str(), "$readmemh" | "$readmemb") {
                if let Some(lhs) = lhs {
                    if let Some(root) = lhs.root_name() {
                        assigned.insert(root.to_string());
                    }
                }
            }
        }
        Stmt::Null | Stmt::ExprStmt(_) => {}
    }
}

/// Phase 2: reclassify declarations and repair module items.
fn convert_part(part: Part, port_directions: &PortDirections) -> CompileResult<Part> {
    let observation = observe_part(&part);
    let mut out_items = Vec::with_capacity(part.items.len());
    for item in part.items {
        out_items.extend(rewrite_module_item(item, &observation, port_directions)?);
    }
    Ok(Part {
        items: out_items,
        ..part
    })
}

fn reclass_variable_type(ty: Type, name: &str, reg_names: &AHashSet<String>) -> Type {
    match ty {
        Type::IntegerVector(crate::ast::IntegerVectorType::TLogic, sg, rs) => {
            if reg_names.contains(name) {
                Type::IntegerVector(crate::ast::IntegerVectorType::TReg, sg, rs)
            } else {
                Type::Net(NetType::TWire, sg, rs)
            }
        }
        other => other,
    }
}

/// Verilog-2005 has no integer-vector keywords on parameters; collapse
/// `IntegerVector _ sg rs` typed params/localparams to `Implicit sg rs`,
/// substituting `[(0,0)]` when `rs` was empty (spec §4.3).
fn reclass_param_type(ty: Type) -> Type {
    match ty {
        Type::IntegerVector(_, sg, rs) => {
            let rs = if rs.is_empty() { vec![(Expr::Number("0".into()), Expr::Number("0".into()))] } else { rs };
            Type::Implicit(sg, rs)
        }
        other => other,
    }
}

fn rewrite_decl(decl: Decl, observation: &Observation) -> Decl {
    match decl {
        Decl::Variable {
            mut direction,
            ty,
            name,
            unpacked,
            init,
        } => {
            let ty = reclass_variable_type(ty, &name, &observation.reg_names);
            if matches!(ty, Type::IntegerVector(crate::ast::IntegerVectorType::TReg, ..)) && direction == Some(Direction::Inout) {
                direction = Some(Direction::Output);
            }
            Decl::Variable {
                direction,
                ty,
                name,
                unpacked,
                init,
            }
        }
        Decl::Param { kind, ty, name, expr } => Decl::Param {
            kind,
            ty: reclass_param_type(ty),
            name,
            expr,
        },
        Decl::ParamType { kind, name, ty } => Decl::ParamType {
            kind,
            name,
            ty: ty.map(reclass_param_type),
        },
        other @ Decl::CommentDecl(_) => other,
    }
}

fn rewrite_module_item(
    item: ModuleItem,
    observation: &Observation,
    port_directions: &PortDirections,
) -> CompileResult<Vec<ModuleItem>> {
    match item {
        ModuleItem::MIPackageItem(crate::ast::PackageItem::Decl(decl)) => {
            Ok(vec![ModuleItem::MIPackageItem(crate::ast::PackageItem::Decl(rewrite_decl(decl, observation)))])
        }
        ModuleItem::MIPackageItem(crate::ast::PackageItem::Function(mut func)) => {
            func.decls = func.decls.into_iter().map(|d| rewrite_decl(d, observation)).collect();
            func.stmts = func.stmts.into_iter().map(|s| rewrite_stmt(s, observation)).collect();
            Ok(vec![ModuleItem::MIPackageItem(crate::ast::PackageItem::Function(func))])
        }
        ModuleItem::MIPackageItem(crate::ast::PackageItem::Task(mut task)) => {
            task.decls = task.decls.into_iter().map(|d| rewrite_decl(d, observation)).collect();
            task.stmts = task.stmts.into_iter().map(|s| rewrite_stmt(s, observation)).collect();
            Ok(vec![ModuleItem::MIPackageItem(crate::ast::PackageItem::Task(task))])
        }
        ModuleItem::MIPackageItem(other) => Ok(vec![ModuleItem::MIPackageItem(other)]),
        ModuleItem::Assign(lhs, expr) => repair_assign(lhs, expr, observation),
        ModuleItem::MIInstance(inst) => repair_instance(inst, observation, port_directions),
        ModuleItem::Generate(items) => Ok(vec![ModuleItem::Generate(
            items
                .into_iter()
                .map(|gi| rewrite_gen_item(gi, observation, port_directions))
                .collect::<CompileResult<_>>()?,
        )]),
        ModuleItem::Initial(s) => Ok(vec![ModuleItem::Initial(rewrite_stmt(s, observation))]),
        ModuleItem::Always(kind, s) => Ok(vec![ModuleItem::Always(kind, rewrite_stmt(s, observation))]),
    }
}

/// Recurses through a statement tree reclassifying any nested `Decl`
/// (inside a named statement block) the same way module-level
/// declarations are reclassified, leaving control structure untouched.
fn rewrite_stmt(stmt: Stmt, observation: &Observation) -> Stmt {
    match stmt {
        Stmt::Block(label, decls, stmts) => Stmt::Block(
            label,
            decls.into_iter().map(|d| rewrite_decl(d, observation)).collect(),
            stmts.into_iter().map(|s| rewrite_stmt(s, observation)).collect(),
        ),
        Stmt::If(cond, then, els) => Stmt::If(
            cond,
            Box::new(rewrite_stmt(*then, observation)),
            els.map(|e| Box::new(rewrite_stmt(*e, observation))),
        ),
        Stmt::Case(disc, arms, default) => Stmt::Case(
            disc,
            arms.into_iter().map(|(labels, s)| (labels, rewrite_stmt(s, observation))).collect(),
            default.map(|d| Box::new(rewrite_stmt(*d, observation))),
        ),
        Stmt::For { inits, cond, incrs, body } => Stmt::For {
            inits: inits.into_iter().map(|s| rewrite_stmt(s, observation)).collect(),
            cond,
            incrs: incrs.into_iter().map(|s| rewrite_stmt(s, observation)).collect(),
            body: Box::new(rewrite_stmt(*body, observation)),
        },
        Stmt::While(cond, body) => Stmt::While(cond, Box::new(rewrite_stmt(*body, observation))),
        Stmt::Timing(timing, body) => Stmt::Timing(timing, Box::new(rewrite_stmt(*body, observation))),
        other @ (Stmt::BlockingAssign(..)
        | Stmt::NonBlockingAssign(..)
        | Stmt::SysTaskCall(..)
        | Stmt::Null
        | Stmt::ExprStmt(_)) => other,
    }
}

fn rewrite_gen_item(item: GenItem, observation: &Observation, port_directions: &PortDirections) -> CompileResult<GenItem> {
    Ok(match item {
        GenItem::GIItem(mi) => {
            let mut items = rewrite_module_item(*mi, observation, port_directions)?;
            if items.len() == 1 {
                GenItem::GIItem(Box::new(items.remove(0)))
            } else {
                GenItem::GIBlock(None, items.into_iter().map(|mi| GenItem::GIItem(Box::new(mi))).collect())
            }
        }
        GenItem::GIBlock(label, items) => GenItem::GIBlock(
            label,
            items
                .into_iter()
                .map(|gi| rewrite_gen_item(gi, observation, port_directions))
                .collect::<CompileResult<_>>()?,
        ),
        GenItem::GIIf(cond, then, els) => GenItem::GIIf(
            cond,
            Box::new(rewrite_gen_item(*then, observation, port_directions)?),
            els.map(|e| rewrite_gen_item(*e, observation, port_directions)).transpose()?.map(Box::new),
        ),
        GenItem::GICase(disc, arms, default) => GenItem::GICase(
            disc,
            arms.into_iter()
                .map(|(labels, g)| -> CompileResult<_> { Ok((labels, rewrite_gen_item(g, observation, port_directions)?)) })
                .collect::<CompileResult<_>>()?,
            default.map(|d| rewrite_gen_item(*d, observation, port_directions)).transpose()?.map(Box::new),
        ),
        GenItem::GIFor {
            genvar,
            init,
            cond,
            step,
            body,
        } => GenItem::GIFor {
            genvar,
            init,
            cond,
            step,
            body: Box::new(rewrite_gen_item(*body, observation, port_directions)?),
        },
    })
}

fn wire_ranges_for(name: &str, observation: &Observation) -> (Signing, Vec<crate::ast::Range>) {
    match observation.declared_types.get(name) {
        Some(ty) => {
            let (_, ranges) = type_ranges(ty.clone());
            let sg = match ty {
                Type::IntegerVector(_, sg, _) | Type::Net(_, sg, _) => *sg,
                _ => Signing::Unspecified,
            };
            (sg, ranges)
        }
        None => (Signing::Unspecified, Vec::new()),
    }
}

/// An `assign lhs = expr` whose LHS resolves to a reg is illegal in the
/// output Verilog-2005 and is replaced by a local-wire trampoline (spec
/// §4.3 "Bad continuous assignment").
fn repair_assign(lhs: LHS, expr: Expr, observation: &Observation) -> CompileResult<Vec<ModuleItem>> {
    let Some(root) = lhs.root_name() else {
        return Ok(vec![ModuleItem::Assign(lhs, expr)]);
    };
    if !observation.reg_names.contains(root) {
        return Ok(vec![ModuleItem::Assign(lhs, expr)]);
    }

    let tmp = format!("sv2v_tmp_{}", short_hash(&(lhs.to_string(), expr.to_string())));
    let (sg, ranges) = wire_ranges_for(root, observation);
    let wire_decl = Decl::Variable {
        direction: None,
        ty: Type::Net(NetType::TWire, sg, ranges),
        name: tmp.clone(),
        unpacked: Vec::new(),
        init: None,
    };

    Ok(vec![ModuleItem::Generate(vec![
        GenItem::GIItem(Box::new(ModuleItem::MIPackageItem(crate::ast::PackageItem::Decl(wire_decl)))),
        GenItem::GIItem(Box::new(ModuleItem::Assign(LHS::Ident(tmp.clone()), expr))),
        GenItem::GIItem(Box::new(ModuleItem::Always(
            AlwaysKind::Plain,
            Stmt::Timing(TimingControl::Star, Box::new(Stmt::BlockingAssign(lhs, Expr::Ident(tmp)))),
        ))),
    ])])
}

/// An instance port binding whose port direction is `Output` and whose
/// supplied expression resolves to a reg needs a trampoline wire so the
/// instance itself still drives a net (spec §4.3 "Reg driving output
/// port"). Non-LHS expressions bound to outputs are fatal.
fn repair_instance(inst: Instance, observation: &Observation, port_directions: &PortDirections) -> CompileResult<Vec<ModuleItem>> {
    let directions = port_directions.get(&inst.module);
    let mut header: Option<ModuleItem> = None;
    let mut prelude = Vec::new();
    let mut trailer = Vec::new();
    let mut ports = Vec::with_capacity(inst.ports.len());

    for PortBinding { name, expr } in inst.ports {
        let (Some(port_name), Some(expr)) = (name.clone(), expr.clone()) else {
            ports.push(PortBinding { name, expr });
            continue;
        };
        let is_output = directions.and_then(|d| d.get(&port_name)).is_some_and(|d| *d == Direction::Output);
        if !is_output {
            ports.push(PortBinding { name: Some(port_name), expr: Some(expr) });
            continue;
        }
        let Some(lhs) = expr_to_lhs(&expr) else {
            return Err(Sv2vError::structural(format!(
                "non-LHS expression bound to output port '{port_name}' of instance '{}'",
                inst.name
            )));
        };
        let Some(root) = lhs.root_name() else {
            ports.push(PortBinding { name: Some(port_name), expr: Some(expr) });
            continue;
        };
        if !observation.reg_names.contains(root) {
            ports.push(PortBinding { name: Some(port_name), expr: Some(expr) });
            continue;
        }

        if header.is_none() {
            header = Some(ModuleItem::MIPackageItem(crate::ast::PackageItem::Decl(Decl::CommentDecl(format!(
                "sv2v: trampoline wires for reg-driven outputs of instance {}",
                inst.name
            )))));
        }
        let tmp = format!("sv2v_tmp_{}_{port_name}", inst.name);
        let (sg, ranges) = wire_ranges_for(root, observation);
        prelude.push(ModuleItem::MIPackageItem(crate::ast::PackageItem::Decl(Decl::Variable {
            direction: None,
            ty: Type::Net(NetType::TWire, sg, ranges),
            name: tmp.clone(),
            unpacked: Vec::new(),
            init: None,
        })));
        trailer.push(ModuleItem::Always(
            AlwaysKind::Plain,
            Stmt::Timing(TimingControl::Star, Box::new(Stmt::BlockingAssign(lhs, Expr::Ident(tmp.clone())))),
        ));
        ports.push(PortBinding {
            name: Some(port_name),
            expr: Some(Expr::Ident(tmp)),
        });
    }

    let mut result = Vec::new();
    result.extend(header);
    result.extend(prelude);
    result.push(ModuleItem::MIInstance(Instance { ports, ..inst }));
    result.extend(trailer);
    Ok(result)
}

/// Structural mirror from `Expr` shapes down to `LHS` shapes, used when an
/// output port binding (an `Expr`) must be proven to be an assignable LHS.
fn expr_to_lhs(expr: &Expr) -> Option<LHS> {
    Some(match expr {
        Expr::Ident(x) => LHS::Ident(x.clone()),
        Expr::PSIdent(p, x) => LHS::PSIdent(p.clone(), x.clone()),
        Expr::CSIdent(c, b, x) => LHS::CSIdent(c.clone(), b.clone(), x.clone()),
        Expr::Index(base, idx) => LHS::Index(Box::new(expr_to_lhs(base)?), idx.clone()),
        Expr::Range(base, hi, lo) => LHS::Range(Box::new(expr_to_lhs(base)?), hi.clone(), lo.clone()),
        Expr::Dot(base, field) => LHS::Dot(Box::new(expr_to_lhs(base)?), field.clone()),
        Expr::Concat(items) => LHS::Concat(items.iter().map(expr_to_lhs).collect::<Option<_>>()?),
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{IntegerVectorType, Lifetime, PartKeyword};

    fn sample_part(items: Vec<ModuleItem>, port_names: Vec<&str>) -> Part {
        Part {
            attrs: Vec::new(),
            is_extern: false,
            keyword: PartKeyword::Module,
            lifetime: Lifetime::Static,
            name: "m".into(),
            port_names: port_names.into_iter().map(str::to_string).collect(),
            items,
        }
    }

    fn logic_decl(name: &str, direction: Option<Direction>) -> ModuleItem {
        ModuleItem::MIPackageItem(crate::ast::PackageItem::Decl(Decl::Variable {
            direction,
            ty: Type::IntegerVector(IntegerVectorType::TLogic, Signing::Unspecified, Vec::new()),
            name: name.into(),
            unpacked: Vec::new(),
            init: None,
        }))
    }

    #[test]
    fn s4_logic_used_as_reg_becomes_output_reg() {
        let part = sample_part(
            vec![
                logic_decl("o", Some(Direction::Output)),
                ModuleItem::Always(
                    AlwaysKind::Comb,
                    Stmt::BlockingAssign(LHS::Ident("o".into()), Expr::Number("1'b0".into())),
                ),
            ],
            vec!["o"],
        );
        let converted = convert_part(part, &PortDirections::default()).unwrap();
        let ModuleItem::MIPackageItem(crate::ast::PackageItem::Decl(Decl::Variable { direction, ty, .. })) =
            &converted.items[0]
        else {
            panic!("expected a variable decl");
        };
        assert_eq!(*direction, Some(Direction::Output));
        assert_eq!(ty, &Type::IntegerVector(IntegerVectorType::TReg, Signing::Unspecified, Vec::new()));
    }

    #[test]
    fn s5_logic_used_as_wire_becomes_output_wire() {
        let part = sample_part(
            vec![
                logic_decl("o", Some(Direction::Output)),
                ModuleItem::Assign(LHS::Ident("o".into()), Expr::Number("1'b0".into())),
            ],
            vec!["o"],
        );
        let converted = convert_part(part, &PortDirections::default()).unwrap();
        let ModuleItem::MIPackageItem(crate::ast::PackageItem::Decl(Decl::Variable { ty, .. })) = &converted.items[0]
        else {
            panic!("expected a variable decl");
        };
        assert_eq!(ty, &Type::Net(NetType::TWire, Signing::Unspecified, Vec::new()));
    }

    #[test]
    fn inout_driving_reg_demotes_to_output() {
        let part = sample_part(
            vec![
                logic_decl("io", Some(Direction::Inout)),
                ModuleItem::Initial(Stmt::BlockingAssign(LHS::Ident("io".into()), Expr::Number("0".into()))),
            ],
            vec!["io"],
        );
        let converted = convert_part(part, &PortDirections::default()).unwrap();
        let ModuleItem::MIPackageItem(crate::ast::PackageItem::Decl(Decl::Variable { direction, .. })) =
            &converted.items[0]
        else {
            panic!("expected a variable decl");
        };
        assert_eq!(*direction, Some(Direction::Output));
    }

    #[test]
    fn param_integer_vector_collapses_to_implicit() {
        let part = sample_part(
            vec![ModuleItem::MIPackageItem(crate::ast::PackageItem::Decl(Decl::Param {
                kind: crate::ast::ParamKind::Parameter,
                ty: Type::IntegerVector(IntegerVectorType::TLogic, Signing::Unspecified, Vec::new()),
                name: "P".into(),
                expr: Expr::Number("1".into()),
            }))],
            vec![],
        );
        let converted = convert_part(part, &PortDirections::default()).unwrap();
        let ModuleItem::MIPackageItem(crate::ast::PackageItem::Decl(Decl::Param { ty, .. })) = &converted.items[0]
        else {
            panic!("expected a param decl");
        };
        assert_eq!(ty, &Type::Implicit(Signing::Unspecified, vec![(Expr::Number("0".into()), Expr::Number("0".into()))]));
    }

    #[test]
    fn non_lhs_output_binding_is_fatal() {
        let port_directions = {
            let mut table = PortDirections::default();
            let mut ports = AHashMap::default();
            ports.insert("q".to_string(), Direction::Output);
            table.insert("sub".to_string(), ports);
            table
        };
        let inst = Instance {
            module: "sub".into(),
            params: Vec::new(),
            name: "u".into(),
            ports: vec![PortBinding {
                name: Some("q".into()),
                expr: Some(Expr::BinOp(
                    Box::new(Expr::Ident("a".into())),
                    crate::ast::BinOp::Add,
                    Box::new(Expr::Ident("b".into())),
                )),
            }],
        };
        let observation = Observation {
            declared_types: AHashMap::default(),
            reg_names: AHashSet::default(),
        };
        assert!(repair_instance(inst, &observation, &port_directions).is_err());
    }
}
