//! Package & class elaboration (spec §4.4, component C5): erases every
//! `Package`/`Class` Description, splicing each named package's flattened,
//! identifier-resolved items back at its original source position and
//! rewriting every surviving `Part` to reference the mangled/specialized
//! names directly.
//!
//! Grounded on the teacher's `prepare.rs` top-level driver, which walks a
//! whole module list once building up shared tables before rewriting each
//! module in turn -- here that shared table is [`process::Elaborator`],
//! built once over every package/class this file set declares.

mod class;
mod collect;
mod ident_state;
mod mangle;
mod process;
mod reorder;

use crate::ast::Description;
use crate::error::CompileResult;

pub use process::Elaborator;

/// Runs Steps A-E over the whole file set: collects packages/classes away
/// from the Part list (Step A), elaborates every named package -- in
/// sorted order, for determinism independent of declaration order --
/// splicing its flattened output back at its placeholder slot (Steps
/// B/C), elaborates the root package's bare items into the global
/// injection pool (Step E's source), then rewrites every surviving Part
/// (Step C applied at module scope, plus Step E's per-Part injection).
pub fn run(descriptions: Vec<Description>) -> CompileResult<Vec<Description>> {
    let collect::Collected {
        out,
        package_slots,
        packages,
        classes,
        root_items,
    } = collect::collect(descriptions);

    let mut elab = Elaborator::new(packages, classes);

    let mut names: Vec<String> = package_slots.keys().cloned().collect();
    names.sort();
    for name in &names {
        elab.process_package(name)?;
    }

    elab.process_root(root_items)?;

    let slot_names: ahash::AHashMap<usize, String> = package_slots.into_iter().map(|(name, slot)| (slot, name)).collect();

    let mut result = Vec::with_capacity(out.len());
    for (idx, desc) in out.into_iter().enumerate() {
        match slot_names.get(&idx) {
            Some(name) => {
                let items = elab.take_package_output(name).unwrap_or_default();
                result.extend(items.into_iter().map(Description::Item));
            }
            None => match desc {
                Description::Part(part) => result.push(Description::Part(elab.process_part(part)?)),
                other => result.push(other),
            },
        }
    }

    Ok(result)
}
