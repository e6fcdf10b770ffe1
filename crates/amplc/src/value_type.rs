//! The AMPL-2023 value-type algebra: a base kind crossed with two
//! independent attribute bits (array, callable). Every predicate below is
//! total — defined for every representable `ValueType`, including the
//! base-none non-callable "no type" value reserved for uninitialized slots
//! and the implicit return type of a procedure.

use std::fmt;

/// The scalar base of a value-type, independent of the array/callable bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseKind {
    Int,
    Bool,
    /// "No type" — the return kind of a procedure, or an uninitialized slot.
    None,
}

/// base × array-attribute × callable-attribute, exactly as described in
/// the data model: a function is a callable with a non-none base, a
/// procedure is a callable with base none, and scalars carry neither
/// attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueType {
    pub base: BaseKind,
    pub array: bool,
    pub callable: bool,
}

impl ValueType {
    pub const NONE: Self = Self { base: BaseKind::None, array: false, callable: false };
    pub const INT: Self = Self { base: BaseKind::Int, array: false, callable: false };
    pub const BOOL: Self = Self { base: BaseKind::Bool, array: false, callable: false };

    #[must_use]
    pub fn scalar(base: BaseKind) -> Self {
        Self { base, array: false, callable: false }
    }

    #[must_use]
    pub fn array_of(base: BaseKind) -> Self {
        Self { base, array: true, callable: false }
    }

    /// Builds the value-type of an `int`/`bool` type production, with or
    /// without the trailing `array` attribute. Never callable: this is
    /// the type production used by `vardef`, parameter lists, and return
    /// type annotations, none of which can themselves name a callable.
    #[must_use]
    pub fn from_type(base: BaseKind, array: bool) -> Self {
        Self { base, array, callable: false }
    }

    /// Builds the value-type recorded for a subroutine's own identifier:
    /// callable, with base/array taken from its (optional) return type
    /// annotation. Absent annotation means base none, non-array — a
    /// procedure.
    #[must_use]
    pub fn subroutine(return_type: Option<Self>) -> Self {
        let rt = return_type.unwrap_or(Self::NONE);
        Self { base: rt.base, array: rt.array, callable: true }
    }

    #[must_use]
    pub fn is_array(self) -> bool {
        self.array
    }

    #[must_use]
    pub fn is_callable(self) -> bool {
        self.callable
    }

    /// A function is a callable with a non-none return base.
    #[must_use]
    pub fn is_function(self) -> bool {
        self.callable && !matches!(self.base, BaseKind::None)
    }

    /// A procedure is a callable with base none.
    #[must_use]
    pub fn is_procedure(self) -> bool {
        self.callable && matches!(self.base, BaseKind::None)
    }

    #[must_use]
    pub fn is_integer(self) -> bool {
        matches!(self.base, BaseKind::Int) && !self.callable
    }

    #[must_use]
    pub fn is_boolean(self) -> bool {
        matches!(self.base, BaseKind::Bool) && !self.callable
    }

    /// Strips the array attribute, keeping base and callable-ness. Used
    /// when indexing into an array value to obtain the element type.
    #[must_use]
    pub fn element_type(self) -> Self {
        Self { array: false, ..self }
    }

    /// "Set-return-type": strips the callable bit, keeping base and
    /// array. Applied to a subroutine's own value-type this yields the
    /// value-type a `return` expression in its body must produce.
    /// Idempotent: calling it again on the result is a no-op.
    #[must_use]
    pub fn return_type(self) -> Self {
        Self { callable: false, ..self }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let base = match self.base {
            BaseKind::Int => "int",
            BaseKind::Bool => "bool",
            BaseKind::None => "none",
        };
        if self.callable {
            if matches!(self.base, BaseKind::None) {
                write!(f, "procedure")
            } else if self.array {
                write!(f, "{base} array function")
            } else {
                write!(f, "{base} function")
            }
        } else if self.array {
            write!(f, "{base} array")
        } else {
            write!(f, "{base}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predicates_are_total_over_representable_types() {
        for base in [BaseKind::Int, BaseKind::Bool, BaseKind::None] {
            for array in [false, true] {
                for callable in [false, true] {
                    let vt = ValueType { base, array, callable };
                    // No predicate should panic for any combination.
                    let _ = (vt.is_array(), vt.is_callable(), vt.is_function(), vt.is_procedure(), vt.is_integer(), vt.is_boolean());
                }
            }
        }
    }

    #[test]
    fn function_vs_procedure() {
        let proc = ValueType::subroutine(None);
        assert!(proc.is_procedure());
        assert!(!proc.is_function());

        let func = ValueType::subroutine(Some(ValueType::INT));
        assert!(func.is_function());
        assert!(!func.is_procedure());
    }

    #[test]
    fn set_return_type_is_idempotent() {
        let func = ValueType::subroutine(Some(ValueType::array_of(BaseKind::Bool)));
        let once = func.return_type();
        let twice = once.return_type();
        assert_eq!(once, twice);
        assert_eq!(once, ValueType::array_of(BaseKind::Bool));
    }

    #[test]
    fn element_type_strips_array_only() {
        let arr = ValueType::array_of(BaseKind::Int);
        assert_eq!(arr.element_type(), ValueType::INT);
    }
}
