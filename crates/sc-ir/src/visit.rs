//! Read-only traversal of expression and statement trees.
//!
//! Implement [`Visitor`] and override the hooks you care about; the default
//! hooks call [`walk_expr`] / [`walk_stmt`], which visit every operand in
//! the order it appears in the node.

use crate::expr::{Expr, ExprNode};
use crate::stmt::{Stmt, StmtNode};

/// Hooks called for every node reached.
pub trait Visitor {
    /// Called for every expression.
    fn visit_expr(&mut self, expr: &Expr) {
        walk_expr(self, expr);
    }

    /// Called for every statement.
    fn visit_stmt(&mut self, stmt: &Stmt) {
        walk_stmt(self, stmt);
    }
}

/// Visits the operands of `expr`.
pub fn walk_expr<V: Visitor + ?Sized>(visitor: &mut V, expr: &Expr) {
    match expr.node() {
        ExprNode::IntImm(_)
        | ExprNode::UIntImm(_)
        | ExprNode::FloatImm(_)
        | ExprNode::Variable(_) => {}
        ExprNode::Cast(n) => visitor.visit_expr(&n.value),
        ExprNode::Binary(n) => {
            visitor.visit_expr(&n.a);
            visitor.visit_expr(&n.b);
        }
        ExprNode::Cmp(n) => {
            visitor.visit_expr(&n.a);
            visitor.visit_expr(&n.b);
        }
        ExprNode::And(n) => {
            visitor.visit_expr(&n.a);
            visitor.visit_expr(&n.b);
        }
        ExprNode::Or(n) => {
            visitor.visit_expr(&n.a);
            visitor.visit_expr(&n.b);
        }
        ExprNode::Not(n) => visitor.visit_expr(&n.value),
        ExprNode::Select(n) => {
            visitor.visit_expr(&n.cond);
            visitor.visit_expr(&n.true_case);
            visitor.visit_expr(&n.false_case);
        }
        ExprNode::Call(n) => {
            for arg in &n.args {
                visitor.visit_expr(arg);
            }
        }
    }
}

/// Visits the operands of `stmt`.
pub fn walk_stmt<V: Visitor + ?Sized>(visitor: &mut V, stmt: &Stmt) {
    match stmt.node() {
        StmtNode::LetStmt(n) => {
            visitor.visit_expr(n.var.as_expr());
            visitor.visit_expr(&n.value);
            visitor.visit_stmt(&n.body);
        }
        StmtNode::IfThenElse(n) => {
            visitor.visit_expr(&n.cond);
            visitor.visit_stmt(&n.then_case);
            if let Some(else_case) = &n.else_case {
                visitor.visit_stmt(else_case);
            }
        }
        StmtNode::Block(n) => {
            visitor.visit_stmt(&n.first);
            if let Some(rest) = &n.rest {
                visitor.visit_stmt(rest);
            }
        }
        StmtNode::For(n) => {
            visitor.visit_expr(n.var.as_expr());
            visitor.visit_expr(&n.min);
            visitor.visit_expr(&n.extent);
            visitor.visit_stmt(&n.body);
        }
        StmtNode::Store(n) => {
            visitor.visit_expr(&n.lhs);
            visitor.visit_expr(&n.rhs);
        }
        StmtNode::Reduce(n) => {
            visitor.visit_expr(&n.lhs);
            visitor.visit_expr(&n.rhs);
        }
        StmtNode::Allocate(n) => {
            for extent in &n.extents {
                visitor.visit_expr(extent);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{add, Variable};
    use crate::stmt::{Block, Store};
    use sc_types::DataType;

    #[derive(Default)]
    struct Labels(Vec<String>);

    impl Visitor for Labels {
        fn visit_expr(&mut self, expr: &Expr) {
            if let Some(v) = expr.cast_to::<Variable>() {
                self.0.push(v.label.clone());
            }
            walk_expr(self, expr);
        }
    }

    #[test]
    fn test_visits_in_operand_order() {
        let x = Variable::make(DataType::I32, "x").unwrap();
        let y = Variable::make(DataType::I32, "y").unwrap();
        let z = Variable::make(DataType::I32, "z").unwrap();
        let first = Store::make(x, add(y, z.clone()).unwrap()).unwrap();
        let second = Store::make(z, Expr::int(0)).unwrap();
        let body = Block::from_stmts([first, second]).unwrap();

        let mut labels = Labels::default();
        labels.visit_stmt(&body);
        assert_eq!(labels.0, ["x", "y", "z", "z"]);
    }
}
