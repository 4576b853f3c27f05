//! The driver (spec §4.5, component C6): applies the passes in fixed
//! order over the whole file set, propagating the first fatal error
//! immediately.

use crate::ast::Description;
use crate::error::CompileResult;
use crate::{elaborate, logic};

/// Runs Package & class elaboration, then Logic conversion, over
/// `descriptions` (spec §4.5: "Package & class elaboration → Logic
/// conversion → (further passes omitted)"). Each pass receives the full
/// `Vec<Description>` produced by the previous one; a fatal error from
/// either pass aborts the run with no partial output.
pub fn run(descriptions: Vec<Description>) -> CompileResult<Vec<Description>> {
    let descriptions = elaborate::run(descriptions)?;
    logic::run(descriptions)
}
