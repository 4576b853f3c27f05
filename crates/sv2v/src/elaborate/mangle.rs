//! Deterministic name mangling (spec §3 "Mangling", §4.4 Step C.3/C.6).

/// `P_x` for a package-local member, or `x` unchanged at the root/module
/// scope (`pkg == ""`).
#[must_use]
pub fn mangled(pkg: &str, name: &str) -> String {
    if pkg.is_empty() { name.to_string() } else { format!("{pkg}_{name}") }
}
