//! Structural (value) comparison.
//!
//! `==` on IR handles is identity. [`StructuralEq`] instead compares the
//! trees node by node:
//!
//! - variables match on type and label;
//! - constants match on type and value (floats bit for bit);
//! - call targets match on kind and name;
//! - iters match on variable, range and role.

use crate::expr::{CallTarget, Expr, ExprNode, VarExpr};
use crate::iter::{Iter, Range};
use crate::stmt::{Stmt, StmtNode};

/// Value comparison of IR trees.
pub trait StructuralEq {
    /// Returns true if `self` and `other` describe the same tree.
    fn structural_eq(&self, other: &Self) -> bool;
}

impl<T: StructuralEq> StructuralEq for [T] {
    fn structural_eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().zip(other).all(|(a, b)| a.structural_eq(b))
    }
}

impl<T: StructuralEq> StructuralEq for Vec<T> {
    fn structural_eq(&self, other: &Self) -> bool {
        self.as_slice().structural_eq(other.as_slice())
    }
}

impl<T: StructuralEq> StructuralEq for Option<T> {
    fn structural_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Some(a), Some(b)) => a.structural_eq(b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl StructuralEq for CallTarget {
    fn structural_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Function(a), Self::Function(b)) => {
                a.function_kind() == b.function_kind() && a.name() == b.name()
            }
            (Self::Tensor(a), Self::Tensor(b)) => a.name() == b.name(),
            _ => false,
        }
    }
}

impl StructuralEq for Expr {
    fn structural_eq(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        match (self.node(), other.node()) {
            (ExprNode::IntImm(a), ExprNode::IntImm(b)) => {
                a.data_type == b.data_type && a.value == b.value
            }
            (ExprNode::UIntImm(a), ExprNode::UIntImm(b)) => {
                a.data_type == b.data_type && a.value == b.value
            }
            (ExprNode::FloatImm(a), ExprNode::FloatImm(b)) => {
                a.data_type == b.data_type && a.value.to_bits() == b.value.to_bits()
            }
            (ExprNode::Variable(a), ExprNode::Variable(b)) => {
                a.data_type == b.data_type && a.label == b.label
            }
            (ExprNode::Cast(a), ExprNode::Cast(b)) => {
                a.data_type == b.data_type && a.value.structural_eq(&b.value)
            }
            (ExprNode::Binary(a), ExprNode::Binary(b)) => {
                a.op == b.op && a.a.structural_eq(&b.a) && a.b.structural_eq(&b.b)
            }
            (ExprNode::Cmp(a), ExprNode::Cmp(b)) => {
                a.op == b.op && a.a.structural_eq(&b.a) && a.b.structural_eq(&b.b)
            }
            (ExprNode::And(a), ExprNode::And(b)) => {
                a.a.structural_eq(&b.a) && a.b.structural_eq(&b.b)
            }
            (ExprNode::Or(a), ExprNode::Or(b)) => {
                a.a.structural_eq(&b.a) && a.b.structural_eq(&b.b)
            }
            (ExprNode::Not(a), ExprNode::Not(b)) => a.value.structural_eq(&b.value),
            (ExprNode::Select(a), ExprNode::Select(b)) => {
                a.cond.structural_eq(&b.cond)
                    && a.true_case.structural_eq(&b.true_case)
                    && a.false_case.structural_eq(&b.false_case)
            }
            (ExprNode::Call(a), ExprNode::Call(b)) => {
                a.data_type == b.data_type
                    && a.call_kind == b.call_kind
                    && a.name == b.name
                    && a.args.as_slice().structural_eq(b.args.as_slice())
                    && a.target.structural_eq(&b.target)
            }
            _ => false,
        }
    }
}

impl StructuralEq for VarExpr {
    fn structural_eq(&self, other: &Self) -> bool {
        self.as_expr().structural_eq(other.as_expr())
    }
}

impl StructuralEq for Range {
    fn structural_eq(&self, other: &Self) -> bool {
        self.min.structural_eq(&other.min) && self.extent.structural_eq(&other.extent)
    }
}

impl StructuralEq for Iter {
    fn structural_eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
            || (self.iter_type() == other.iter_type()
                && self.var().structural_eq(other.var())
                && self.range().structural_eq(other.range()))
    }
}

impl StructuralEq for Stmt {
    fn structural_eq(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        match (self.node(), other.node()) {
            (StmtNode::LetStmt(a), StmtNode::LetStmt(b)) => {
                a.var.structural_eq(&b.var)
                    && a.value.structural_eq(&b.value)
                    && a.body.structural_eq(&b.body)
            }
            (StmtNode::IfThenElse(a), StmtNode::IfThenElse(b)) => {
                a.cond.structural_eq(&b.cond)
                    && a.then_case.structural_eq(&b.then_case)
                    && a.else_case.structural_eq(&b.else_case)
            }
            (StmtNode::Block(a), StmtNode::Block(b)) => {
                a.first.structural_eq(&b.first) && a.rest.structural_eq(&b.rest)
            }
            (StmtNode::For(a), StmtNode::For(b)) => {
                a.for_type == b.for_type
                    && a.var.structural_eq(&b.var)
                    && a.min.structural_eq(&b.min)
                    && a.extent.structural_eq(&b.extent)
                    && a.body.structural_eq(&b.body)
            }
            (StmtNode::Store(a), StmtNode::Store(b)) => {
                a.lhs.structural_eq(&b.lhs) && a.rhs.structural_eq(&b.rhs)
            }
            (StmtNode::Reduce(a), StmtNode::Reduce(b)) => {
                a.reduce_type == b.reduce_type
                    && a.lhs.structural_eq(&b.lhs)
                    && a.rhs.structural_eq(&b.rhs)
                    && a.reduce_iters.structural_eq(&b.reduce_iters)
            }
            (StmtNode::Allocate(a), StmtNode::Allocate(b)) => {
                a.buffer.name() == b.buffer.name()
                    && a.data_type == b.data_type
                    && a.loc == b.loc
                    && a.extents.as_slice().structural_eq(b.extents.as_slice())
            }
            _ => false,
        }
    }
}
