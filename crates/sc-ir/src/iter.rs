//! Iteration variables.
//!
//! An [`Iter`] is a loop index: a variable, the half-open range
//! `[min, min + extent)` it walks, and its role. Like every other IR
//! handle it compares and hashes by identity.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};
use crate::expr::{make_zero, Expr, VarExpr};
use crate::handle::Ref;

/// The role of an iteration variable.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IterType {
    /// Ordinary data-parallel index.
    #[default]
    Normal,
    /// Index accumulated over by a reduction.
    Reduction,
}

/// A loop range: `min` and `extent` share one scalar type.
#[derive(Clone, Debug)]
pub struct Range {
    /// First value.
    pub min: Expr,
    /// Number of iterations.
    pub extent: Expr,
}

impl Range {
    /// Builds a range.
    ///
    /// # Errors
    ///
    /// Fails if `min` is not scalar or the two types differ.
    pub fn make(min: Expr, extent: Expr) -> IrResult<Self> {
        if !min.ty().is_scalar() {
            return Err(IrError::NotScalar {
                op: "Range",
                operand: "min",
                ty: min.ty(),
            });
        }
        if min.ty() != extent.ty() {
            return Err(IrError::TypeMismatch {
                op: "Range",
                what: "min, extent",
                lhs: min.ty(),
                rhs: extent.ty(),
            });
        }
        Ok(Self { min, extent })
    }

    /// Builds `[0, extent)`.
    ///
    /// # Errors
    ///
    /// Fails if `extent` is not a scalar number.
    pub fn from_extent(extent: Expr) -> IrResult<Self> {
        let min = make_zero(extent.ty())?;
        Self::make(min, extent)
    }
}

/// Payload of an [`Iter`].
#[derive(Debug)]
pub struct IterNode {
    /// Loop variable.
    pub var: VarExpr,
    /// Declared range.
    pub range: Range,
    /// Role.
    pub iter_type: IterType,
}

/// Handle to an iteration variable.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Iter(Ref<IterNode>);

impl Iter {
    /// Builds an iteration variable over `range` using `var` as the index.
    ///
    /// # Errors
    ///
    /// Fails if `var`'s type differs from the range type.
    pub fn make(var: VarExpr, range: Range, iter_type: IterType) -> IrResult<Self> {
        if var.ty() != range.min.ty() {
            return Err(IrError::TypeMismatch {
                op: "Iter",
                what: "var, range",
                lhs: var.ty(),
                rhs: range.min.ty(),
            });
        }
        Ok(Self(Ref::new(IterNode {
            var,
            range,
            iter_type,
        })))
    }

    /// Builds an iteration variable with a fresh index named `label`, typed
    /// like the range.
    ///
    /// # Errors
    ///
    /// Propagates variable construction failures.
    pub fn new(label: &str, range: Range, iter_type: IterType) -> IrResult<Self> {
        let var = VarExpr::new(range.min.ty(), label)?;
        Self::make(var, range, iter_type)
    }

    /// Shorthand for a normal iter over `[0, extent)`.
    ///
    /// # Errors
    ///
    /// Fails if `extent` is not a scalar number.
    pub fn normal(label: &str, extent: Expr) -> IrResult<Self> {
        Self::new(label, Range::from_extent(extent)?, IterType::Normal)
    }

    /// Shorthand for a reduction iter over `[0, extent)`.
    ///
    /// # Errors
    ///
    /// Fails if `extent` is not a scalar number.
    pub fn reduction(label: &str, extent: Expr) -> IrResult<Self> {
        Self::new(label, Range::from_extent(extent)?, IterType::Reduction)
    }

    /// The loop variable.
    #[must_use]
    pub fn var(&self) -> &VarExpr {
        &self.0.var
    }

    /// The loop variable's label.
    #[must_use]
    pub fn label(&self) -> &str {
        self.0.var.label()
    }

    /// The declared range.
    #[must_use]
    pub fn range(&self) -> &Range {
        &self.0.range
    }

    /// The role.
    #[must_use]
    pub fn iter_type(&self) -> IterType {
        self.0.iter_type
    }

    /// Returns true for reduction iters.
    #[must_use]
    pub fn is_reduction(&self) -> bool {
        self.0.iter_type == IterType::Reduction
    }

    /// Returns true if both handles point at the same iter.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.0.ptr_eq(&other.0)
    }
}

impl fmt::Debug for Iter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sc_types::DataType;

    #[test]
    fn test_range_checks() {
        assert!(Range::make(Expr::int(0), Expr::int(10)).is_ok());
        assert!(matches!(
            Range::make(Expr::int(0), Expr::float(10.0)),
            Err(IrError::TypeMismatch { op: "Range", .. })
        ));
        let v = VarExpr::new(DataType::I32.with_lanes(4), "v").unwrap();
        assert!(matches!(
            Range::make(v.clone().into_expr(), v.into_expr()),
            Err(IrError::NotScalar { op: "Range", .. })
        ));
    }

    #[test]
    fn test_iter_roles() {
        let i = Iter::normal("i", Expr::int(10)).unwrap();
        let j = Iter::reduction("j", Expr::int(4)).unwrap();
        assert_eq!(i.iter_type(), IterType::Normal);
        assert!(j.is_reduction());
        assert_eq!(i.label(), "i");
        assert_eq!(i.var().ty(), DataType::I32);
    }

    #[test]
    fn test_iter_identity() {
        let a = Iter::normal("i", Expr::int(10)).unwrap();
        let b = Iter::normal("i", Expr::int(10)).unwrap();
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn test_iter_var_type_must_match() {
        let var = VarExpr::new(DataType::I64, "i").unwrap();
        let range = Range::from_extent(Expr::int(8)).unwrap();
        assert!(Iter::make(var, range, IterType::Normal).is_err());
    }
}
