//! End-to-end package/class elaboration scenarios not already covered by
//! `logic.rs`'s inline unit tests.

use sv2v::ast::{
    BinOp, ClassDesc, Decl, Description, Expr, IntegerVectorType, Lifetime, ModuleItem, PackageDesc, PackageItem,
    ParamBinding, ParamKind, ParamValue, Part, PartKeyword, Signing, Type,
};
use sv2v::Sv2vError;

fn param(kind: ParamKind, ty: Type, name: &str, expr: Expr) -> Decl {
    Decl::Param {
        kind,
        ty,
        name: name.to_string(),
        expr,
    }
}

#[test]
fn parameterized_class_specialization_injects_synthetic_members() {
    let class = ClassDesc {
        name: "P".into(),
        params: vec![
            param(ParamKind::Parameter, Type::Implicit(Signing::Unspecified, Vec::new()), "WIDTH", Expr::Number("1".into())),
            Decl::ParamType {
                kind: ParamKind::Parameter,
                name: "BASE".into(),
                ty: Some(Type::IntegerVector(IntegerVectorType::TLogic, Signing::Unspecified, Vec::new())),
            },
        ],
        items: vec![PackageItem::Decl(Decl::ParamType {
            kind: ParamKind::Localparam,
            name: "Unit".into(),
            ty: Some(Type::Alias(
                "BASE".into(),
                vec![(
                    Expr::BinOp(Box::new(Expr::Ident("WIDTH".into())), BinOp::Sub, Box::new(Expr::Number("1".into()))),
                    Expr::Number("0".into()),
                )],
            )),
        })],
    };

    let top = Part {
        attrs: Vec::new(),
        is_extern: false,
        keyword: PartKeyword::Module,
        lifetime: Lifetime::Static,
        name: "top".into(),
        port_names: Vec::new(),
        items: vec![ModuleItem::MIPackageItem(PackageItem::Decl(Decl::Variable {
            direction: None,
            ty: Type::ClassScoped(
                "P".into(),
                vec![ParamBinding {
                    name: None,
                    value: ParamValue::Expr(Expr::Number("2".into())),
                }],
                "Unit".into(),
                Vec::new(),
            ),
            name: "b".into(),
            unpacked: Vec::new(),
            init: None,
        }))],
    };

    let result = sv2v::compile(vec![Description::Class(class), Description::Part(top)]).expect("compiles");
    // A class, unlike a package, leaves its `removed_comment` placeholder in
    // place rather than being spliced back in with flattened output -- its
    // members have no natural anchor of their own, they only ever surface
    // via Step E injection into whichever Parts reference them.
    assert_eq!(result.len(), 2, "the class Description is replaced by a comment, the module survives alongside it");
    assert_eq!(
        result[0],
        Description::Item(PackageItem::Decl(Decl::CommentDecl("removed class P".into())))
    );
    let part = result[1].as_part().expect("the surviving Description is still the module");

    // The last item is always `b`'s own declaration; whatever synthetic
    // package members it transitively needs are injected ahead of it, in
    // no particular order among themselves (spec §4.4 Step E).
    let (injected, rest) = part.items.split_at(part.items.len() - 1);
    let ModuleItem::MIPackageItem(PackageItem::Decl(Decl::Variable { ty: var_ty, name: var_name, .. })) = &rest[0] else {
        panic!("expected `b`'s variable declaration last, got {:?}", rest[0]);
    };
    assert_eq!(var_name, "b");
    let Type::Alias(unit_name, unit_ranges) = var_ty else {
        panic!("expected `b` typed as a plain alias to the synthetic typedef, got {var_ty:?}");
    };
    assert!(unit_ranges.is_empty());
    assert!(unit_name.starts_with("P_") && unit_name.ends_with("_Unit"), "unexpected mangled name {unit_name}");
    let hash = unit_name.strip_prefix("P_").unwrap().strip_suffix("_Unit").unwrap();
    let base_name = format!("P_{hash}_BASE");
    let width_name = format!("P_{hash}_WIDTH");

    let mut by_name = std::collections::HashMap::new();
    for item in injected {
        let ModuleItem::MIPackageItem(PackageItem::Decl(decl)) = item else {
            panic!("expected only injected Decls, got {item:?}");
        };
        by_name.insert(decl.name().unwrap().to_string(), decl.clone());
    }
    assert_eq!(by_name.len(), 3, "WIDTH, BASE, and Unit all get injected");

    assert_eq!(
        by_name[unit_name],
        Decl::ParamType {
            kind: ParamKind::Localparam,
            name: unit_name.clone(),
            ty: Some(Type::Alias(
                base_name.clone(),
                vec![(
                    Expr::BinOp(Box::new(Expr::Ident(width_name.clone())), BinOp::Sub, Box::new(Expr::Number("1".into()))),
                    Expr::Number("0".into()),
                )],
            )),
        }
    );
    assert_eq!(
        by_name[&base_name],
        Decl::ParamType {
            kind: ParamKind::Parameter,
            name: base_name.clone(),
            ty: Some(Type::IntegerVector(IntegerVectorType::TLogic, Signing::Unspecified, Vec::new())),
        }
    );
    assert_eq!(
        by_name[&width_name],
        Decl::Param {
            kind: ParamKind::Parameter,
            ty: Type::Implicit(Signing::Unspecified, Vec::new()),
            name: width_name.clone(),
            expr: Expr::Number("2".into()),
        },
        "the positional #(2) binding overrides WIDTH's default"
    );
}

#[test]
fn wildcard_import_resolves_against_the_exporting_package() {
    let pkg_a = PackageDesc {
        lifetime: Lifetime::Static,
        name: "A".into(),
        items: vec![PackageItem::Decl(param(
            ParamKind::Parameter,
            Type::Implicit(Signing::Unspecified, Vec::new()),
            "X",
            Expr::Number("5".into()),
        ))],
    };
    let pkg_b = PackageDesc {
        lifetime: Lifetime::Static,
        name: "B".into(),
        items: vec![
            PackageItem::Import { pkg: "A".into(), ident: None },
            PackageItem::Decl(param(
                ParamKind::Parameter,
                Type::Implicit(Signing::Unspecified, Vec::new()),
                "Y",
                Expr::BinOp(Box::new(Expr::Ident("X".into())), BinOp::Add, Box::new(Expr::Number("1".into()))),
            )),
        ],
    };

    let result = sv2v::compile(vec![Description::Package(pkg_a), Description::Package(pkg_b)]).expect("compiles");

    assert_eq!(
        result,
        vec![
            Description::Item(PackageItem::Decl(param(
                ParamKind::Parameter,
                Type::Implicit(Signing::Unspecified, Vec::new()),
                "A_X",
                Expr::Number("5".into()),
            ))),
            Description::Item(PackageItem::Decl(param(
                ParamKind::Parameter,
                Type::Implicit(Signing::Unspecified, Vec::new()),
                "B_Y",
                Expr::BinOp(Box::new(Expr::Ident("A_X".into())), BinOp::Add, Box::new(Expr::Number("1".into()))),
            ))),
        ]
    );
}

#[test]
fn class_specializations_bound_to_same_named_locals_in_different_modules_stay_distinct() {
    let class = ClassDesc {
        name: "C".into(),
        params: vec![param(ParamKind::Parameter, Type::Implicit(Signing::Unspecified, Vec::new()), "WIDTH", Expr::Number("1".into()))],
        items: vec![PackageItem::Decl(param(
            ParamKind::Localparam,
            Type::Implicit(Signing::Unspecified, Vec::new()),
            "Doubled",
            Expr::BinOp(Box::new(Expr::Ident("WIDTH".into())), BinOp::Mul, Box::new(Expr::Number("2".into()))),
        ))],
    };

    fn module_binding_local_k(name: &str, k_value: &str, var_name: &str) -> Part {
        Part {
            attrs: Vec::new(),
            is_extern: false,
            keyword: PartKeyword::Module,
            lifetime: Lifetime::Static,
            name: name.into(),
            port_names: Vec::new(),
            items: vec![
                ModuleItem::MIPackageItem(PackageItem::Decl(param(
                    ParamKind::Localparam,
                    Type::Implicit(Signing::Unspecified, Vec::new()),
                    "K",
                    Expr::Number(k_value.into()),
                ))),
                ModuleItem::MIPackageItem(PackageItem::Decl(Decl::Variable {
                    direction: None,
                    ty: Type::ClassScoped(
                        "C".into(),
                        vec![ParamBinding {
                            name: None,
                            value: ParamValue::Expr(Expr::Ident("K".into())),
                        }],
                        "Doubled".into(),
                        Vec::new(),
                    ),
                    name: var_name.into(),
                    unpacked: Vec::new(),
                    init: None,
                })),
            ],
        }
    }

    // `K` is a module-local parameter: its name is never mangled, so both
    // modules bind the class's `WIDTH` to the textually identical
    // `Expr::Ident("K")`, even though the two `K`s hold different values.
    // Without scope-aware deduplication the two specializations would
    // collapse into one shared synthetic package.
    let mod1 = module_binding_local_k("mod1", "3", "a");
    let mod2 = module_binding_local_k("mod2", "5", "b");

    let result = sv2v::compile(vec![Description::Class(class), Description::Part(mod1), Description::Part(mod2)]).expect("compiles");
    assert_eq!(result.len(), 3, "a removed-class comment plus both modules");

    fn find_part<'a>(result: &'a [Description], name: &str) -> &'a Part {
        result
            .iter()
            .find_map(|d| d.as_part().filter(|p| p.name == name))
            .unwrap_or_else(|| panic!("{name} did not survive"))
    }

    fn doubled_alias(part: &Part) -> &str {
        part.items
            .iter()
            .find_map(|item| match item {
                ModuleItem::MIPackageItem(PackageItem::Decl(Decl::Variable { ty: Type::Alias(name, _), .. })) => Some(name.as_str()),
                _ => None,
            })
            .expect("the class-scoped variable declaration survives")
    }

    let part1 = find_part(&result, "mod1");
    let part2 = find_part(&result, "mod2");
    let alias1 = doubled_alias(part1);
    let alias2 = doubled_alias(part2);

    assert!(alias1.starts_with("C_") && alias1.ends_with("_Doubled"), "unexpected mangled name {alias1}");
    assert!(alias2.starts_with("C_") && alias2.ends_with("_Doubled"), "unexpected mangled name {alias2}");
    assert_ne!(
        alias1, alias2,
        "mod1's and mod2's specializations both bind WIDTH to the bare identifier `K`, but each `K` is a distinct \
         module-local parameter -- they must not collapse into one shared synthetic package"
    );
}

#[test]
fn named_export_re_exports_only_what_was_actually_imported() {
    let pkg_a = PackageDesc {
        lifetime: Lifetime::Static,
        name: "A".into(),
        items: vec![PackageItem::Decl(param(
            ParamKind::Parameter,
            Type::Implicit(Signing::Unspecified, Vec::new()),
            "X",
            Expr::Number("5".into()),
        ))],
    };
    let pkg_b = PackageDesc {
        lifetime: Lifetime::Static,
        name: "B".into(),
        items: vec![
            PackageItem::Import {
                pkg: "A".into(),
                ident: Some("X".into()),
            },
            PackageItem::Export {
                pkg: Some("A".into()),
                ident: Some("X".into()),
            },
        ],
    };
    let pkg_c = PackageDesc {
        lifetime: Lifetime::Static,
        name: "C".into(),
        items: vec![
            PackageItem::Import { pkg: "B".into(), ident: None },
            PackageItem::Decl(param(
                ParamKind::Parameter,
                Type::Implicit(Signing::Unspecified, Vec::new()),
                "Y",
                Expr::BinOp(Box::new(Expr::Ident("X".into())), BinOp::Add, Box::new(Expr::Number("1".into()))),
            )),
        ],
    };

    let result = sv2v::compile(vec![Description::Package(pkg_a), Description::Package(pkg_b), Description::Package(pkg_c)])
        .expect("compiles");

    assert_eq!(
        result,
        vec![
            Description::Item(PackageItem::Decl(param(
                ParamKind::Parameter,
                Type::Implicit(Signing::Unspecified, Vec::new()),
                "A_X",
                Expr::Number("5".into()),
            ))),
            Description::Item(PackageItem::Decl(param(
                ParamKind::Parameter,
                Type::Implicit(Signing::Unspecified, Vec::new()),
                "C_Y",
                Expr::BinOp(Box::new(Expr::Ident("A_X".into())), BinOp::Add, Box::new(Expr::Number("1".into()))),
            ))),
        ],
        "B has nothing of its own to emit, but re-exports A::X so C can reach it through B::*"
    );
}

#[test]
fn export_of_a_name_never_imported_from_that_package_is_rejected() {
    let pkg_a = PackageDesc {
        lifetime: Lifetime::Static,
        name: "A".into(),
        items: vec![PackageItem::Decl(param(
            ParamKind::Parameter,
            Type::Implicit(Signing::Unspecified, Vec::new()),
            "X",
            Expr::Number("5".into()),
        ))],
    };
    let pkg_b = PackageDesc {
        lifetime: Lifetime::Static,
        name: "B".into(),
        items: vec![PackageItem::Export {
            pkg: Some("A".into()),
            ident: Some("X".into()),
        }],
    };

    let err = sv2v::compile(vec![Description::Package(pkg_a), Description::Package(pkg_b)])
        .expect_err("B never imported A::X, so exporting it must be fatal");

    assert!(
        matches!(err, Sv2vError::StructuralError { .. }),
        "expected a StructuralError, got {err:?}"
    );
}

#[test]
fn two_wildcard_imports_of_the_same_name_are_a_fatal_ambiguity() {
    let pkg_a = PackageDesc {
        lifetime: Lifetime::Static,
        name: "A".into(),
        items: vec![PackageItem::Decl(param(
            ParamKind::Parameter,
            Type::Implicit(Signing::Unspecified, Vec::new()),
            "X",
            Expr::Number("1".into()),
        ))],
    };
    let pkg_b = PackageDesc {
        lifetime: Lifetime::Static,
        name: "B".into(),
        items: vec![PackageItem::Decl(param(
            ParamKind::Parameter,
            Type::Implicit(Signing::Unspecified, Vec::new()),
            "X",
            Expr::Number("2".into()),
        ))],
    };
    let module = Part {
        attrs: Vec::new(),
        is_extern: false,
        keyword: PartKeyword::Module,
        lifetime: Lifetime::Static,
        name: "M".into(),
        port_names: Vec::new(),
        items: vec![
            ModuleItem::MIPackageItem(PackageItem::Import { pkg: "A".into(), ident: None }),
            ModuleItem::MIPackageItem(PackageItem::Import { pkg: "B".into(), ident: None }),
            ModuleItem::MIPackageItem(PackageItem::Decl(Decl::Variable {
                direction: None,
                ty: Type::Net(sv2v::ast::NetType::TWire, Signing::Unspecified, Vec::new()),
                name: "w".into(),
                unpacked: Vec::new(),
                init: Some(Expr::Ident("X".into())),
            })),
        ],
    };

    let err = sv2v::compile(vec![
        Description::Package(pkg_a),
        Description::Package(pkg_b),
        Description::Part(module),
    ])
    .expect_err("two equally-eligible wildcard imports of `X` must be rejected");

    let Sv2vError::AmbiguousReference { name, candidates } = &err else {
        panic!("expected an AmbiguousReference error, got {err:?}");
    };
    assert_eq!(name, "X");
    assert_eq!(candidates, &vec!["A".to_string(), "B".to_string()]);
}
