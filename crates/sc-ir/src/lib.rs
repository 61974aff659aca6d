//! # SC IR
//!
//! The expression and statement IR of the SC tensor compiler.
//!
//! ## Overview
//!
//! Programs are trees of immutable nodes behind shared handles:
//!
//! - **[`Expr`]**: values (constants, variables, arithmetic, comparisons,
//!   logic, selects, calls and tensor accesses)
//! - **[`Stmt`]**: effects (let bindings, conditionals, sequences, loops,
//!   stores, reductions, allocations)
//! - **[`Iter`]**: loop indices with a range and a role
//!
//! Every node is built by a `make` factory that validates its operands and
//! returns an [`IrError`] naming the broken invariant. No other construction
//! path exists, so any `Expr` or `Stmt` in hand is well-formed.
//!
//! ## Identity
//!
//! Handles are [`Ref`]s: `Arc`s compared and hashed by address. Two nodes
//! built from the same arguments are different nodes. Use
//! [`StructuralEq`] to compare trees by value.
//!
//! ## IR Pipeline Position
//!
//! ```text
//! [sc-ir]       <- This crate: Expr / Stmt / Iter
//!     |
//!     v
//! [sc-compute]  <- Tensors, computations, loop-nest lowering
//!     |
//!     v
//! [codegen]
//! ```
//!
//! ## Main Types
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`Expr`], [`ExprNode`] | Expression handle and variants |
//! | [`Stmt`], [`StmtNode`] | Statement handle and variants |
//! | [`VarExpr`] | An expression known to be a variable |
//! | [`Iter`], [`Range`] | Iteration variables |
//! | [`TensorBase`], [`Function`] | Call targets defined downstream |
//! | [`Visitor`] | Read-only traversal |

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod base;
pub mod equal;
pub mod error;
pub mod expr;
pub mod handle;
pub mod iter;
pub mod pretty;
pub mod stmt;
pub mod visit;

pub use base::{ExternFunction, Function, FunctionKind, FunctionNode, TensorBase, TensorBaseNode};
pub use equal::StructuralEq;
pub use error::{IrError, IrResult};
pub use expr::{
    add, div, make_const, make_zero, mul, sub, And, Binary, BinaryOp, Call, CallKind, CallTarget,
    Cast, Cmp, CmpOp, Expr, ExprKind, ExprNode, ExprVariant, FloatImm, IntImm, Not, Or, Select,
    UIntImm, Var, VarExpr, Variable,
};
pub use handle::{Ref, WeakRef};
pub use iter::{Iter, IterNode, IterType, Range};
pub use stmt::{
    reduce_add, Allocate, Block, For, ForType, IfThenElse, LetStmt, Reduce, ReduceType, Stmt,
    StmtKind, StmtNode, StmtVariant, Store, TensorLoc,
};
pub use visit::{walk_expr, walk_stmt, Visitor};

/// Re-exported element types.
pub use sc_types::{DataType, TypeKind};
