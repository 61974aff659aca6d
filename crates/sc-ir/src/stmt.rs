//! The statement node family.
//!
//! Same discipline as [`crate::expr`]: a [`Stmt`] is a shared handle to an
//! immutable [`StmtNode`], and each variant's `make` factory is its only
//! constructor. Slots that may legitimately be empty (the else branch of an
//! [`IfThenElse`], the rest of a terminal [`Block`]) are `Option`s; every
//! other slot always holds a node.

use std::fmt;
use std::ops::Deref;

use sc_types::DataType;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::base::TensorBase;
use crate::error::{IrError, IrResult};
use crate::expr::{Call, Expr, VarExpr, Variable};
use crate::handle::Ref;
use crate::iter::Iter;

/// Handle to an immutable statement node.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Stmt(Ref<StmtNode>);

/// The statement variants.
#[derive(Debug)]
pub enum StmtNode {
    /// Scoped binding.
    LetStmt(LetStmt),
    /// Conditional.
    IfThenElse(IfThenElse),
    /// Sequence.
    Block(Block),
    /// Counted loop.
    For(For),
    /// Assignment.
    Store(Store),
    /// Accumulation.
    Reduce(Reduce),
    /// Buffer declaration.
    Allocate(Allocate),
}

/// Tag for each [`StmtNode`] variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StmtKind {
    /// [`LetStmt`]
    LetStmt,
    /// [`IfThenElse`]
    IfThenElse,
    /// [`Block`]
    Block,
    /// [`For`]
    For,
    /// [`Store`]
    Store,
    /// [`Reduce`]
    Reduce,
    /// [`Allocate`]
    Allocate,
}

/// Compile-time mapping from a variant struct to its tag.
pub trait StmtVariant: Sized {
    /// The tag of this variant.
    const KIND: StmtKind;

    /// Borrows the variant out of a node, if the node is this variant.
    fn from_node(node: &StmtNode) -> Option<&Self>;
}

macro_rules! stmt_variants {
    ($($name:ident),* $(,)?) => {
        $(
            impl StmtVariant for $name {
                const KIND: StmtKind = StmtKind::$name;

                fn from_node(node: &StmtNode) -> Option<&Self> {
                    match node {
                        StmtNode::$name(n) => Some(n),
                        _ => None,
                    }
                }
            }
        )*

        impl StmtNode {
            /// Returns the variant tag.
            #[must_use]
            pub fn kind(&self) -> StmtKind {
                match self {
                    $(Self::$name(_) => StmtKind::$name,)*
                }
            }
        }
    };
}

stmt_variants!(LetStmt, IfThenElse, Block, For, Store, Reduce, Allocate);

impl Stmt {
    fn new(node: StmtNode) -> Self {
        Self(Ref::new(node))
    }

    /// Returns the node.
    #[must_use]
    pub fn node(&self) -> &StmtNode {
        &self.0
    }

    /// Returns the variant tag.
    #[must_use]
    pub fn kind(&self) -> StmtKind {
        self.0.kind()
    }

    /// Returns true if the node is variant `V`.
    #[must_use]
    pub fn is_type<V: StmtVariant>(&self) -> bool {
        self.kind() == V::KIND
    }

    /// Borrows the node as variant `V`.
    #[must_use]
    pub fn cast_to<V: StmtVariant>(&self) -> Option<&V> {
        V::from_node(&self.0)
    }

    /// Returns true if both handles point at the same node.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.0.ptr_eq(&other.0)
    }
}

impl Deref for Stmt {
    type Target = StmtNode;

    fn deref(&self) -> &StmtNode {
        &self.0
    }
}

impl fmt::Debug for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.node(), f)
    }
}

/// `let var = value in body`
#[derive(Debug)]
pub struct LetStmt {
    /// Bound variable.
    pub var: VarExpr,
    /// Bound value.
    pub value: Expr,
    /// Scope of the binding.
    pub body: Stmt,
}

impl LetStmt {
    /// Builds a let statement.
    ///
    /// # Errors
    ///
    /// Fails if `var`'s type differs from `value`'s.
    pub fn make(var: VarExpr, value: Expr, body: Stmt) -> IrResult<Stmt> {
        if var.ty() != value.ty() {
            return Err(IrError::TypeMismatch {
                op: "LetStmt",
                what: "var, value",
                lhs: var.ty(),
                rhs: value.ty(),
            });
        }
        Ok(Stmt::new(StmtNode::LetStmt(Self { var, value, body })))
    }
}

/// `if (cond) then_case else else_case`
#[derive(Debug)]
pub struct IfThenElse {
    /// Condition.
    pub cond: Expr,
    /// Taken when `cond` holds.
    pub then_case: Stmt,
    /// Taken otherwise, if present.
    pub else_case: Option<Stmt>,
}

impl IfThenElse {
    /// Builds a conditional.
    ///
    /// # Errors
    ///
    /// Fails if `cond` is not boolean.
    pub fn make(cond: Expr, then_case: Stmt, else_case: Option<Stmt>) -> IrResult<Stmt> {
        if !cond.ty().is_bool() {
            return Err(IrError::NotBool {
                op: "IfThenElse",
                operand: "cond",
                ty: cond.ty(),
            });
        }
        Ok(Stmt::new(StmtNode::IfThenElse(Self {
            cond,
            then_case,
            else_case,
        })))
    }
}

/// `first; rest`
#[derive(Debug)]
pub struct Block {
    /// Runs first.
    pub first: Stmt,
    /// Runs after `first`; absent for the last statement of a chain.
    pub rest: Option<Stmt>,
}

impl Block {
    /// Builds a block. Has no preconditions beyond its slot types.
    #[must_use]
    pub fn make(first: Stmt, rest: Option<Stmt>) -> Stmt {
        Stmt::new(StmtNode::Block(Self { first, rest }))
    }

    /// Chains `stmts` into right-nested blocks.
    ///
    /// Returns `None` for an empty sequence and the statement itself for a
    /// single one.
    #[must_use]
    pub fn from_stmts(stmts: impl IntoIterator<Item = Stmt>) -> Option<Stmt> {
        let stmts: Vec<Stmt> = stmts.into_iter().collect();
        let mut iter = stmts.into_iter().rev();
        let last = iter.next()?;
        Some(iter.fold(last, |rest, first| Self::make(first, Some(rest))))
    }
}

/// How a loop is executed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ForType {
    /// In order.
    #[default]
    Serial,
    /// Iterations may run concurrently.
    Parallel,
    /// Iterations map onto vector lanes.
    Vectorized,
    /// Fully unrolled.
    Unrolled,
}

/// `for (var = min; var < min + extent; ++var) body`
#[derive(Debug)]
pub struct For {
    /// Execution kind.
    pub for_type: ForType,
    /// Loop variable.
    pub var: VarExpr,
    /// First value of `var`.
    pub min: Expr,
    /// Trip count.
    pub extent: Expr,
    /// Loop body.
    pub body: Stmt,
}

impl For {
    /// Builds a loop.
    ///
    /// # Errors
    ///
    /// Fails if `min` is not scalar or its type differs from `extent`'s.
    pub fn make(
        for_type: ForType,
        var: VarExpr,
        min: Expr,
        extent: Expr,
        body: Stmt,
    ) -> IrResult<Stmt> {
        if !min.ty().is_scalar() {
            return Err(IrError::NotScalar {
                op: "For",
                operand: "min",
                ty: min.ty(),
            });
        }
        // extent is covered by the equality check.
        if min.ty() != extent.ty() {
            return Err(IrError::TypeMismatch {
                op: "For",
                what: "min, extent",
                lhs: min.ty(),
                rhs: extent.ty(),
            });
        }
        Ok(Stmt::new(StmtNode::For(Self {
            for_type,
            var,
            min,
            extent,
            body,
        })))
    }
}

fn is_store_target(lhs: &Expr) -> bool {
    lhs.is_type::<Variable>() || lhs.cast_to::<Call>().is_some_and(Call::is_tensor_access)
}

/// `lhs = rhs`
#[derive(Debug)]
pub struct Store {
    /// Destination: a variable or a tensor access.
    pub lhs: Expr,
    /// Stored value.
    pub rhs: Expr,
}

impl Store {
    /// Builds a store.
    ///
    /// # Errors
    ///
    /// Fails unless `lhs` is a variable or a tensor access.
    pub fn make(lhs: Expr, rhs: Expr) -> IrResult<Stmt> {
        if !is_store_target(&lhs) {
            return Err(IrError::InvalidStoreTarget);
        }
        Ok(Stmt::new(StmtNode::Store(Self { lhs, rhs })))
    }
}

/// Accumulation operator of a [`Reduce`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReduceType {
    /// `lhs += rhs`
    Add,
    /// `lhs *= rhs`
    Mul,
    /// `lhs = min(lhs, rhs)`
    Min,
    /// `lhs = max(lhs, rhs)`
    Max,
}

/// `lhs <op>= rhs` over `reduce_iters`.
#[derive(Debug)]
pub struct Reduce {
    /// Accumulation operator.
    pub reduce_type: ReduceType,
    /// Accumulator.
    pub lhs: Expr,
    /// Accumulated value.
    pub rhs: Expr,
    /// Iters reduced over. Empty when the enclosing computation supplies
    /// them.
    pub reduce_iters: Vec<Iter>,
}

impl Reduce {
    /// Builds a reduction.
    ///
    /// # Errors
    ///
    /// Fails if any of `reduce_iters` is not a reduction iter.
    pub fn make(
        reduce_type: ReduceType,
        lhs: Expr,
        rhs: Expr,
        reduce_iters: Vec<Iter>,
    ) -> IrResult<Stmt> {
        if let Some(iter) = reduce_iters.iter().find(|it| !it.is_reduction()) {
            return Err(IrError::NotReductionIter {
                op: "Reduce",
                iter: iter.label().to_string(),
            });
        }
        Ok(Stmt::new(StmtNode::Reduce(Self {
            reduce_type,
            lhs,
            rhs,
            reduce_iters,
        })))
    }
}

/// `lhs += rhs`, reducing over the enclosing computation's reduction iters.
///
/// # Errors
///
/// Never fails in practice; returns `IrResult` to compose with the other
/// factories.
pub fn reduce_add(lhs: Expr, rhs: Expr) -> IrResult<Stmt> {
    Reduce::make(ReduceType::Add, lhs, rhs, Vec::new())
}

/// Where an allocation lives.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TensorLoc {
    /// Main memory.
    #[default]
    Memory,
    /// Accelerator-local memory.
    Accelerator,
}

/// Declares storage for `buffer`.
#[derive(Debug)]
pub struct Allocate {
    /// The allocated tensor.
    pub buffer: TensorBase,
    /// Element type.
    pub data_type: DataType,
    /// Size per dimension.
    pub extents: SmallVec<[Expr; 4]>,
    /// Storage location.
    pub loc: TensorLoc,
}

impl Allocate {
    /// Builds an allocation.
    ///
    /// # Errors
    ///
    /// Fails if the element type is undefined or an extent is not a scalar
    /// integer.
    pub fn make(
        buffer: TensorBase,
        data_type: DataType,
        extents: impl IntoIterator<Item = Expr>,
        loc: TensorLoc,
    ) -> IrResult<Stmt> {
        if !data_type.defined() {
            return Err(IrError::UndefinedType { op: "Allocate" });
        }
        let extents: SmallVec<[Expr; 4]> = extents.into_iter().collect();
        for extent in &extents {
            let ty = extent.ty();
            if !ty.is_scalar() || !(ty.is_int() || ty.is_uint()) {
                return Err(IrError::UnsupportedType {
                    op: "Allocate",
                    ty,
                });
            }
        }
        Ok(Stmt::new(StmtNode::Allocate(Self {
            buffer,
            data_type,
            extents,
            loc,
        })))
    }
}
