//! End-to-end logic-conversion scenarios spanning more than one Part, not
//! already covered by `logic.rs`'s inline single-Part unit tests.

use sv2v::ast::{
    AlwaysKind, Decl, Description, Direction, Expr, GenItem, IntegerAtomType, IntegerVectorType, Instance, Lifetime,
    ModuleItem, NetType, PackageItem, Part, PartKeyword, PortBinding, Sensitivity, Signing, Stmt, TimingControl, Type,
    LHS,
};

fn logic_var(name: &str, direction: Option<Direction>) -> ModuleItem {
    ModuleItem::MIPackageItem(PackageItem::Decl(Decl::Variable {
        direction,
        ty: Type::IntegerVector(IntegerVectorType::TLogic, Signing::Unspecified, Vec::new()),
        name: name.to_string(),
        unpacked: Vec::new(),
        init: None,
    }))
}

#[test]
fn reg_bound_to_an_instance_output_gets_a_trampoline_wire() {
    let sub = Part {
        attrs: Vec::new(),
        is_extern: false,
        keyword: PartKeyword::Module,
        lifetime: Lifetime::Static,
        name: "sub".into(),
        port_names: vec!["q".into()],
        items: vec![logic_var("q", Some(Direction::Output))],
    };

    let top = Part {
        attrs: Vec::new(),
        is_extern: false,
        keyword: PartKeyword::Module,
        lifetime: Lifetime::Static,
        name: "top".into(),
        port_names: Vec::new(),
        items: vec![
            logic_var("r", None),
            ModuleItem::Always(
                AlwaysKind::Comb,
                Stmt::Timing(
                    TimingControl::Star,
                    Box::new(Stmt::BlockingAssign(LHS::Ident("r".into()), Expr::Number("0".into()))),
                ),
            ),
            ModuleItem::MIInstance(Instance {
                module: "sub".into(),
                params: Vec::new(),
                name: "u".into(),
                ports: vec![PortBinding {
                    name: Some("q".into()),
                    expr: Some(Expr::Ident("r".into())),
                }],
            }),
        ],
    };

    let result = sv2v::compile(vec![Description::Part(sub), Description::Part(top)]).expect("compiles");
    let top = result
        .iter()
        .find_map(Description::as_part)
        .filter(|p| p.name == "top")
        .expect("top survives");

    assert_eq!(
        top.items,
        vec![
            ModuleItem::MIPackageItem(PackageItem::Decl(Decl::Variable {
                direction: None,
                ty: Type::IntegerVector(IntegerVectorType::TReg, Signing::Unspecified, Vec::new()),
                name: "r".into(),
                unpacked: Vec::new(),
                init: None,
            })),
            ModuleItem::Always(
                AlwaysKind::Comb,
                Stmt::Timing(
                    TimingControl::Star,
                    Box::new(Stmt::BlockingAssign(LHS::Ident("r".into()), Expr::Number("0".into()))),
                ),
            ),
            ModuleItem::MIPackageItem(PackageItem::Decl(Decl::CommentDecl(
                "sv2v: trampoline wires for reg-driven outputs of instance u".into()
            ))),
            ModuleItem::MIPackageItem(PackageItem::Decl(Decl::Variable {
                direction: None,
                ty: Type::Net(NetType::TWire, Signing::Unspecified, Vec::new()),
                name: "sv2v_tmp_u_q".into(),
                unpacked: Vec::new(),
                init: None,
            })),
            ModuleItem::MIInstance(Instance {
                module: "sub".into(),
                params: Vec::new(),
                name: "u".into(),
                ports: vec![PortBinding {
                    name: Some("q".into()),
                    expr: Some(Expr::Ident("sv2v_tmp_u_q".into())),
                }],
            }),
            ModuleItem::Always(
                AlwaysKind::Plain,
                Stmt::Timing(
                    TimingControl::Star,
                    Box::new(Stmt::BlockingAssign(LHS::Ident("r".into()), Expr::Ident("sv2v_tmp_u_q".into()))),
                ),
            ),
        ]
    );
}

#[test]
fn integer_atom_declarations_elaborate_to_sized_logic_before_conversion() {
    let part = Part {
        attrs: Vec::new(),
        is_extern: false,
        keyword: PartKeyword::Module,
        lifetime: Lifetime::Static,
        name: "counter".into(),
        port_names: Vec::new(),
        items: vec![ModuleItem::MIPackageItem(PackageItem::Decl(Decl::Variable {
            direction: None,
            ty: Type::IntegerAtom(IntegerAtomType::TInt, Signing::Unspecified),
            name: "x".into(),
            unpacked: Vec::new(),
            init: None,
        }))],
    };

    let result = sv2v::compile(vec![Description::Part(part)]).expect("compiles");
    let counter = result[0].as_part().expect("still a part");

    assert_eq!(
        counter.items,
        vec![ModuleItem::MIPackageItem(PackageItem::Decl(Decl::Variable {
            direction: None,
            ty: Type::Net(NetType::TWire, Signing::Signed, vec![(Expr::Number("31".into()), Expr::Number("0".into()))]),
            name: "x".into(),
            unpacked: Vec::new(),
            init: None,
        }))],
        "`int x;` has no Verilog-2005 equivalent: it must elaborate to a signed 32-bit wire"
    );
}

#[test]
fn generate_block_reg_reclassification_still_reaches_nested_declarations() {
    let part = Part {
        attrs: Vec::new(),
        is_extern: false,
        keyword: PartKeyword::Module,
        lifetime: Lifetime::Static,
        name: "gated".into(),
        port_names: Vec::new(),
        items: vec![ModuleItem::Generate(vec![GenItem::GIBlock(
            Some("blk".into()),
            vec![
                GenItem::GIItem(Box::new(logic_var("acc", None))),
                GenItem::GIItem(Box::new(ModuleItem::Always(
                    AlwaysKind::Ff,
                    Stmt::Timing(
                        TimingControl::Event(vec![Sensitivity {
                            edge: Some(sv2v::ast::Edge::Posedge),
                            lhs: LHS::Ident("clk".into()),
                        }]),
                        Box::new(Stmt::NonBlockingAssign(LHS::Ident("acc".into()), Expr::Number("1".into()))),
                    ),
                ))),
            ],
        )])],
    };

    let result = sv2v::compile(vec![Description::Part(part)]).expect("compiles");
    let gated = result[0].as_part().expect("still a part");

    let ModuleItem::Generate(items) = &gated.items[0] else {
        panic!("expected the generate block to survive, got {:?}", gated.items[0]);
    };
    let GenItem::GIBlock(label, inner) = &items[0] else {
        panic!("expected the named generate block to survive, got {:?}", items[0]);
    };
    assert_eq!(label.as_deref(), Some("blk"));
    let GenItem::GIItem(decl_item) = &inner[0] else {
        panic!("expected the declaration first, got {:?}", inner[0]);
    };
    assert_eq!(
        **decl_item,
        ModuleItem::MIPackageItem(PackageItem::Decl(Decl::Variable {
            direction: None,
            ty: Type::IntegerVector(IntegerVectorType::TReg, Signing::Unspecified, Vec::new()),
            name: "acc".into(),
            unpacked: Vec::new(),
            init: None,
        })),
        "a non-blocking assign inside a generate block still marks `acc` as a reg"
    );
}
