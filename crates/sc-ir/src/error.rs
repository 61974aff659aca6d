//! Construction failures.
//!
//! Every factory in this workspace validates its preconditions before it
//! allocates a node and reports the first violation as an [`IrError`]. The
//! message names the failing operation and the broken invariant so the IR
//! author can fix the tree; these errors are not meant to be recovered from
//! mid-construction.

use sc_types::DataType;
use thiserror::Error;

use crate::expr::CallKind;

/// Result alias for IR construction.
pub type IrResult<T> = Result<T, IrError>;

/// A violated construction precondition.
#[derive(Clone, Debug, Error)]
pub enum IrError {
    /// A type that must be defined is `void`.
    #[error("{op}: type is not defined")]
    UndefinedType {
        /// The failing factory.
        op: &'static str,
    },

    /// A cast changes the lane count.
    #[error("Cast: lane length mismatch (target {target}, value {value})")]
    LaneMismatch {
        /// Lanes of the target type.
        target: u16,
        /// Lanes of the value's type.
        value: u16,
    },

    /// An operand that must be boolean is not.
    #[error("{op}: `{operand}` is not bool (got {ty})")]
    NotBool {
        /// The failing factory.
        op: &'static str,
        /// Which operand.
        operand: &'static str,
        /// Its type.
        ty: DataType,
    },

    /// An operand that must be scalar is not.
    #[error("{op}: `{operand}` is not scalar (got {ty})")]
    NotScalar {
        /// The failing factory.
        op: &'static str,
        /// Which operand.
        operand: &'static str,
        /// Its type.
        ty: DataType,
    },

    /// Two operands whose types must agree do not.
    #[error("{op}: type of {what} can not match ({lhs} vs {rhs})")]
    TypeMismatch {
        /// The failing factory.
        op: &'static str,
        /// The operand pair being compared.
        what: &'static str,
        /// First type.
        lhs: DataType,
        /// Second type.
        rhs: DataType,
    },

    /// The operation does not accept this type.
    #[error("{op}: unsupported type {ty}")]
    UnsupportedType {
        /// The failing factory.
        op: &'static str,
        /// The rejected type.
        ty: DataType,
    },

    /// A constant does not fit its type.
    #[error("{op}: value {value} is out of range for {ty}")]
    ValueOutOfRange {
        /// The failing factory.
        op: &'static str,
        /// The rejected value.
        value: i128,
        /// The constant's type.
        ty: DataType,
    },

    /// A name that must be non-empty is empty.
    #[error("{op}: name must not be empty")]
    EmptyName {
        /// The failing factory.
        op: &'static str,
    },

    /// A call's kind does not agree with its target.
    #[error("Call `{name}`: {kind:?} call has the wrong kind of target")]
    CallTargetMismatch {
        /// The call name.
        name: String,
        /// The requested call kind.
        kind: CallKind,
    },

    /// A store destination is neither a variable nor a tensor access.
    #[error("Store: lhs must be a Variable or a tensor access")]
    InvalidStoreTarget,

    /// An iteration variable in a reduction slot is not a reduction iter.
    #[error("{op}: iter `{iter}` must be a reduction iter")]
    NotReductionIter {
        /// The failing factory.
        op: &'static str,
        /// The iteration variable label.
        iter: String,
    },

    /// A reduction iter was passed where root iters are expected.
    #[error("NestLoop `{computation}`: root iter `{iter}` must not be a reduction iter")]
    ReductionRootIter {
        /// The computation name.
        computation: String,
        /// The iteration variable label.
        iter: String,
    },

    /// A tensor was indexed with the wrong number of indices.
    #[error("tensor `{tensor}` has rank {expected} but was indexed with {got} indices")]
    RankMismatch {
        /// The tensor name.
        tensor: String,
        /// The declared rank.
        expected: usize,
        /// The number of indices supplied.
        got: usize,
    },

    /// A tensor written by a computation already has another producer.
    #[error("tensor `{tensor}` is already produced by `{producer}`")]
    AlreadyProduced {
        /// The tensor name.
        tensor: String,
        /// The existing producer's name.
        producer: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_operation() {
        let err = IrError::LaneMismatch {
            target: 4,
            value: 1,
        };
        assert_eq!(
            err.to_string(),
            "Cast: lane length mismatch (target 4, value 1)"
        );

        let err = IrError::NotBool {
            op: "And",
            operand: "b",
            ty: DataType::I32,
        };
        assert_eq!(err.to_string(), "And: `b` is not bool (got int32)");

        assert_eq!(
            IrError::InvalidStoreTarget.to_string(),
            "Store: lhs must be a Variable or a tensor access"
        );

        let err = IrError::ValueOutOfRange {
            op: "make_const",
            value: -1,
            ty: DataType::uint(8),
        };
        assert_eq!(err.to_string(), "make_const: value -1 is out of range for uint8");
    }
}
