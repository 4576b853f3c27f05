//! The `Type` family (spec §3) and the `typeRanges` invariant helper.

use super::expr::Expr;

/// Signing qualifier attached to integer and net types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Signing {
    Unspecified,
    Signed,
    Unsigned,
}

/// A packed dimension `[hi:lo]`.
pub type Range = (Expr, Expr);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum IntegerVectorType {
    TBit,
    TLogic,
    TReg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum IntegerAtomType {
    TByte,
    TShortint,
    TInt,
    TLongint,
    TInteger,
    TTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum NonIntegerType {
    TReal,
    TShortreal,
    TRealtime,
    TString,
    TVoid,
    TChandle,
    TEvent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum NetType {
    TWire,
    TTri,
    TWand,
    TWor,
}

/// A parameter or type-parameter binding used by `P::X` / `C#(...)::X`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct ParamBinding {
    pub name: Option<String>,
    pub value: ParamValue,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ParamValue {
    Expr(Expr),
    Type(Box<Type>),
}

/// The SystemVerilog type family (spec §3).
///
/// Range lists only ever appear on `IntegerVector`, `Net`, `Implicit`, and
/// the alias/enum/struct/unpacked shapes that carry an explicit packed-dims
/// tail; [`typeRanges`] is the single place that destructures a type into
/// "constructor without ranges" plus "ranges" and is the only code allowed
/// to attach ranges to a type that otherwise cannot carry them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Type {
    IntegerVector(IntegerVectorType, Signing, Vec<Range>),
    IntegerAtom(IntegerAtomType, Signing),
    NonInteger(NonIntegerType),
    Net(NetType, Signing, Vec<Range>),
    Implicit(Signing, Vec<Range>),
    /// A plain (unqualified) name reference, e.g. a typedef or struct name.
    Alias(String, Vec<Range>),
    /// `P::X`
    PackageScoped(String, String, Vec<Range>),
    /// `C#(bindings)::X`
    ClassScoped(String, Vec<ParamBinding>, String, Vec<Range>),
    Enum(Box<Type>, Vec<(String, Option<Expr>)>, Vec<Range>),
    Struct {
        packed: bool,
        is_union: bool,
        members: Vec<(Type, String)>,
        ranges: Vec<Range>,
    },
    InterfaceRef(String, Option<String>),
    /// `type(expr)`
    TypeOf(Box<Expr>),
    TypedefRef(String),
    /// Internal "unpacked type" wrapper used for array-of-`ty` unpacked dims.
    Unpacked(Box<Type>, Vec<Range>),
}

impl Type {
    /// True for constructors that are syntactically forbidden from carrying
    /// packed ranges (spec §3 invariant).
    #[must_use]
    pub fn forbids_ranges(&self) -> bool {
        matches!(self, Type::IntegerAtom(..) | Type::NonInteger(_))
    }
}

/// Destructures a type into `(type-without-ranges, ranges)`.
///
/// This is the sole sanctioned way to pull the packed-dimension list off a
/// type and is what passes use to rebuild a type with different ranges
/// while preserving everything else. Calling this on an atom or
/// non-integer type always yields an empty range list, honoring the
/// invariant that those constructors cannot carry ranges.
#[must_use]
pub fn type_ranges(ty: Type) -> (Type, Vec<Range>) {
    match ty {
        Type::IntegerVector(kind, sg, rs) => (Type::IntegerVector(kind, sg, Vec::new()), rs),
        Type::Net(kind, sg, rs) => (Type::Net(kind, sg, Vec::new()), rs),
        Type::Implicit(sg, rs) => (Type::Implicit(sg, Vec::new()), rs),
        Type::Alias(name, rs) => (Type::Alias(name, Vec::new()), rs),
        Type::PackageScoped(p, x, rs) => (Type::PackageScoped(p, x, Vec::new()), rs),
        Type::ClassScoped(c, b, x, rs) => (Type::ClassScoped(c, b, x, Vec::new()), rs),
        Type::Enum(base, items, rs) => (Type::Enum(base, items, Vec::new()), rs),
        Type::Struct {
            packed,
            is_union,
            members,
            ranges,
        } => (
            Type::Struct {
                packed,
                is_union,
                members,
                ranges: Vec::new(),
            },
            ranges,
        ),
        Type::Unpacked(inner, rs) => (Type::Unpacked(inner, Vec::new()), rs),
        // atoms, non-integers, interface refs, type(expr), typedef-refs never carry ranges
        other => (other, Vec::new()),
    }
}

/// Rebuilds a type from the pieces `type_ranges` produced, with a new range
/// list. Panics (a programmer error, not a user-facing one) if `ty` forbids
/// ranges and `ranges` is non-empty.
#[must_use]
pub fn with_ranges(ty: Type, ranges: Vec<Range>) -> Type {
    if ranges.is_empty() {
        return ty;
    }
    assert!(
        !ty.forbids_ranges(),
        "attempted to attach packed ranges to a type that cannot carry them"
    );
    let (bare, _) = type_ranges(ty);
    match bare {
        Type::IntegerVector(kind, sg, _) => Type::IntegerVector(kind, sg, ranges),
        Type::Net(kind, sg, _) => Type::Net(kind, sg, ranges),
        Type::Implicit(sg, _) => Type::Implicit(sg, ranges),
        Type::Alias(name, _) => Type::Alias(name, ranges),
        Type::PackageScoped(p, x, _) => Type::PackageScoped(p, x, ranges),
        Type::ClassScoped(c, b, x, _) => Type::ClassScoped(c, b, x, ranges),
        Type::Enum(base, items, _) => Type::Enum(base, items, ranges),
        Type::Struct {
            packed,
            is_union,
            members,
            ..
        } => Type::Struct {
            packed,
            is_union,
            members,
            ranges,
        },
        Type::Unpacked(inner, _) => Type::Unpacked(inner, ranges),
        other => other,
    }
}

/// A single bit range `[width-1:0]`, used when elaborating atom types.
#[must_use]
pub fn bit_range(width: u32) -> Range {
    (Expr::Number((width - 1).to_string()), Expr::Number("0".to_string()))
}

/// Elaborates `IntegerAtom`/`TInteger` types to their `IntegerVector TLogic`
/// equivalents per spec §3:
///
/// - `TInt`/`TShortint`/`TLongint`/`TByte` become `logic` with an explicit
///   bit range of width 32/16/64/8, signed unless explicitly overridden.
/// - `TInteger` becomes `logic` with a 32-bit range appended to any
///   user-supplied range list (there normally isn't one).
#[must_use]
pub fn elaborate_atom(kind: IntegerAtomType, sg: Signing) -> Type {
    let signing = if sg == Signing::Unspecified { Signing::Signed } else { sg };
    match kind {
        IntegerAtomType::TInt => Type::IntegerVector(IntegerVectorType::TLogic, signing, vec![bit_range(32)]),
        IntegerAtomType::TShortint => Type::IntegerVector(IntegerVectorType::TLogic, signing, vec![bit_range(16)]),
        IntegerAtomType::TLongint => Type::IntegerVector(IntegerVectorType::TLogic, signing, vec![bit_range(64)]),
        IntegerAtomType::TByte => Type::IntegerVector(IntegerVectorType::TLogic, signing, vec![bit_range(8)]),
        IntegerAtomType::TInteger => Type::IntegerVector(IntegerVectorType::TLogic, signing, vec![bit_range(32)]),
        IntegerAtomType::TTime => Type::IntegerVector(IntegerVectorType::TLogic, Signing::Unsigned, vec![bit_range(64)]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_ranges_round_trips_vector() {
        let ty = Type::IntegerVector(IntegerVectorType::TLogic, Signing::Signed, vec![bit_range(8)]);
        let (bare, ranges) = type_ranges(ty.clone());
        assert_eq!(ranges.len(), 1);
        assert_eq!(with_ranges(bare, ranges), ty);
    }

    #[test]
    fn type_ranges_is_empty_for_atoms() {
        let ty = Type::IntegerAtom(IntegerAtomType::TInt, Signing::Unspecified);
        let (_, ranges) = type_ranges(ty);
        assert!(ranges.is_empty());
    }

    #[test]
    fn elaborate_tint_is_signed_32_bit_logic() {
        let ty = elaborate_atom(IntegerAtomType::TInt, Signing::Unspecified);
        assert_eq!(
            ty,
            Type::IntegerVector(IntegerVectorType::TLogic, Signing::Signed, vec![bit_range(32)])
        );
    }
}
