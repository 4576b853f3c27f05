//! Step A (spec §4.4): walk every Description, bucket Packages/Classes/bare
//! top-level items away from the Part list, and leave a `removed_comment`
//! placeholder at each Package/Class Description's original position.

use ahash::AHashMap;

use crate::ast::{Decl, Description, GenItem, ModuleItem, PackageItem, Part, removed_comment};

pub struct Collected {
    /// The surviving top-level Descriptions, in original order: Parts
    /// unchanged, and one `removed_comment` placeholder per Package/Class
    /// (later overwritten with that package's flattened items by
    /// [`super::process`]).
    pub out: Vec<Description>,
    /// Index into `out` of each named package's placeholder slot.
    pub package_slots: AHashMap<String, usize>,
    pub packages: AHashMap<String, Vec<PackageItem>>,
    pub classes: AHashMap<String, (Vec<Decl>, Vec<PackageItem>)>,
    /// Bare file-scope `PackageItem` descriptions (the root package `""`),
    /// collected for on-demand injection in Step E.
    pub root_items: Vec<PackageItem>,
}

#[must_use]
pub fn collect(descriptions: Vec<Description>) -> Collected {
    let mut out = Vec::with_capacity(descriptions.len());
    let mut package_slots = AHashMap::default();
    let mut packages = AHashMap::default();
    let mut classes = AHashMap::default();
    let mut root_items = Vec::new();

    for desc in descriptions {
        match desc {
            Description::Part(part) => out.push(Description::Part(scrub_generate_directives(part))),
            Description::Package(pkg) => {
                package_slots.insert(pkg.name.clone(), out.len());
                packages.insert(pkg.name.clone(), pkg.items);
                out.push(removed_comment("package", &pkg.name));
            }
            Description::Class(class) => {
                classes.insert(class.name.clone(), (class.params, class.items));
                out.push(removed_comment("class", &class.name));
            }
            Description::Item(item) => root_items.push(item),
        }
    }

    Collected {
        out,
        package_slots,
        packages,
        classes,
        root_items,
    }
}

/// Parts themselves carry no Package/Class content below their own
/// top-level item list in this AST (generate blocks only ever nest
/// `ModuleItem`s, never a `Description`), so nothing below a Part needs
/// scrubbing; this exists purely to document that invariant at the call
/// site and is a deliberate no-op.
fn scrub_generate_directives(part: Part) -> Part {
    debug_assert!(part.items.iter().all(contains_no_nested_description));
    part
}

fn contains_no_nested_description(item: &ModuleItem) -> bool {
    match item {
        ModuleItem::Generate(items) => items.iter().all(gen_item_has_no_description),
        _ => true,
    }
}

fn gen_item_has_no_description(item: &GenItem) -> bool {
    match item {
        GenItem::GIItem(mi) => contains_no_nested_description(mi),
        GenItem::GIBlock(_, items) => items.iter().all(gen_item_has_no_description),
        GenItem::GIIf(_, then, els) => {
            gen_item_has_no_description(then) && els.as_deref().map_or(true, gen_item_has_no_description)
        }
        GenItem::GICase(_, arms, default) => {
            arms.iter().all(|(_, g)| gen_item_has_no_description(g)) && default.as_deref().map_or(true, gen_item_has_no_description)
        }
        GenItem::GIFor { body, .. } => gen_item_has_no_description(body),
    }
}
