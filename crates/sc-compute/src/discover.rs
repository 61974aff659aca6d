//! Input and output tensor discovery for loop bodies.
//!
//! Outputs are the tensors a body stores or reduces into, at any nesting
//! depth, in statement order. Inputs are every other tensor the body
//! reads. The index expressions of a destination are reads; the
//! destination tensor itself is not. Both lists are deduplicated by
//! identity and keep the order of first appearance.

use rustc_hash::FxHashSet;
use sc_ir::{walk_expr, walk_stmt, Call, Expr, Stmt, StmtNode, Visitor};

use crate::tensor::Tensor;

/// Ordered, identity-deduplicated tensor list.
#[derive(Default)]
struct TensorSet {
    seen: FxHashSet<usize>,
    tensors: Vec<Tensor>,
}

impl TensorSet {
    fn insert(&mut self, tensor: Tensor) {
        if self.seen.insert(tensor.addr()) {
            self.tensors.push(tensor);
        }
    }
}

fn accessed_tensor(expr: &Expr) -> Option<Tensor> {
    expr.cast_to::<Call>()
        .and_then(Call::tensor)
        .and_then(Tensor::from_base)
}

#[derive(Default)]
struct OutputCollector {
    found: TensorSet,
}

impl Visitor for OutputCollector {
    fn visit_expr(&mut self, _expr: &Expr) {}

    fn visit_stmt(&mut self, stmt: &Stmt) {
        let dest = match stmt.node() {
            StmtNode::Store(n) => Some(&n.lhs),
            StmtNode::Reduce(n) => Some(&n.lhs),
            _ => None,
        };
        if let Some(tensor) = dest.and_then(accessed_tensor) {
            self.found.insert(tensor);
        }
        walk_stmt(self, stmt);
    }
}

struct InputCollector<'a> {
    produced: &'a FxHashSet<usize>,
    found: TensorSet,
}

impl InputCollector<'_> {
    // Only the indices of a tensor destination are reads.
    fn visit_destination(&mut self, lhs: &Expr) {
        if lhs.is_tensor_access() {
            walk_expr(self, lhs);
        } else {
            self.visit_expr(lhs);
        }
    }
}

impl Visitor for InputCollector<'_> {
    fn visit_expr(&mut self, expr: &Expr) {
        if let Some(tensor) = accessed_tensor(expr) {
            if !self.produced.contains(&tensor.addr()) {
                self.found.insert(tensor);
            }
        }
        walk_expr(self, expr);
    }

    fn visit_stmt(&mut self, stmt: &Stmt) {
        match stmt.node() {
            StmtNode::Store(n) => {
                self.visit_destination(&n.lhs);
                self.visit_expr(&n.rhs);
            }
            StmtNode::Reduce(n) => {
                self.visit_destination(&n.lhs);
                self.visit_expr(&n.rhs);
            }
            _ => walk_stmt(self, stmt),
        }
    }
}

/// Tensors written by `body`, in statement order.
#[must_use]
pub fn output_tensors(body: &[Stmt]) -> Vec<Tensor> {
    let mut collector = OutputCollector::default();
    for stmt in body {
        collector.visit_stmt(stmt);
    }
    collector.found.tensors
}

/// Tensors read by `body`, in first-read order, excluding `produced`.
#[must_use]
pub fn input_tensors(body: &[Stmt], produced: &[Tensor]) -> Vec<Tensor> {
    let produced: FxHashSet<usize> = produced.iter().map(Tensor::addr).collect();
    let mut collector = InputCollector {
        produced: &produced,
        found: TensorSet::default(),
    };
    for stmt in body {
        collector.visit_stmt(stmt);
    }
    collector.found.tensors
}

#[cfg(test)]
mod tests {
    use super::*;
    use sc_ir::{add, mul, reduce_add, Cmp, CmpOp, DataType, IfThenElse, Store, VarExpr};

    fn tensor(name: &str, rank: usize) -> Tensor {
        Tensor::declare(name, DataType::F32, (0..rank).map(|_| Expr::int(16))).unwrap()
    }

    #[test]
    fn test_reads_and_writes() {
        let a = tensor("A", 1);
        let b = tensor("B", 1);
        let i = VarExpr::int32("i");
        let iv = i.as_expr().clone();
        let next = add(iv.clone(), Expr::int(1)).unwrap();

        let rhs = add(a.at([iv.clone()]).unwrap(), a.at([next]).unwrap()).unwrap();
        let body = vec![Store::make(b.at([iv]).unwrap(), rhs).unwrap()];

        assert_eq!(output_tensors(&body), vec![b.clone()]);
        assert_eq!(input_tensors(&body, &[b]), vec![a]);
    }

    #[test]
    fn test_destination_indices_are_reads() {
        let idx = Tensor::declare("Idx", DataType::I32, [Expr::int(16)]).unwrap();
        let out = tensor("Out", 1);
        let i = VarExpr::int32("i");
        let scatter = out.at([idx.at([i.as_expr().clone()]).unwrap()]).unwrap();

        let body = vec![Store::make(scatter, Expr::float(1.0)).unwrap()];
        let outputs = output_tensors(&body);
        assert_eq!(outputs, vec![out]);
        assert_eq!(input_tensors(&body, &outputs), vec![idx]);
    }

    #[test]
    fn test_nested_outputs_in_order() {
        let c = tensor("C", 1);
        let d = tensor("D", 1);
        let i = VarExpr::int32("i");
        let iv = i.as_expr().clone();
        let cond = Cmp::make(CmpOp::Lt, iv.clone(), Expr::int(8)).unwrap();

        let write_d = Store::make(d.at([iv.clone()]).unwrap(), Expr::float(0.0)).unwrap();
        let acc_c = reduce_add(
            c.at([iv.clone()]).unwrap(),
            mul(d.at([iv.clone()]).unwrap(), Expr::float(2.0)).unwrap(),
        )
        .unwrap();
        let nested = IfThenElse::make(cond, acc_c, None).unwrap();
        let again = Store::make(d.at([iv]).unwrap(), Expr::float(1.0)).unwrap();

        let body = vec![write_d, nested, again];
        let outputs = output_tensors(&body);
        assert_eq!(outputs, vec![d, c]);
        assert!(input_tensors(&body, &outputs).is_empty());
    }
}
