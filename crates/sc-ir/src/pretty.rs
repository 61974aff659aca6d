//! Pretty-printing for expressions and statements.
//!
//! Renders the IR as C-like pseudo code, suitable for inspection, logging
//! and test expectations. Uses standard `fmt::Display` trait.

use std::fmt;

use crate::expr::{BinaryOp, Call, CmpOp, Expr, ExprNode, VarExpr};
use crate::iter::{Iter, Range};
use crate::stmt::{ForType, ReduceType, Stmt, StmtNode, TensorLoc};

const INDENT: usize = 2;

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
            Self::Min => "min",
            Self::Max => "max",
        };
        f.write_str(s)
    }
}

impl fmt::Display for CmpOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        };
        f.write_str(s)
    }
}

impl fmt::Display for ReduceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Add => "+=",
            Self::Mul => "*=",
            Self::Min => "min=",
            Self::Max => "max=",
        };
        f.write_str(s)
    }
}

impl fmt::Display for ForType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Serial => "serial",
            Self::Parallel => "parallel",
            Self::Vectorized => "vectorized",
            Self::Unrolled => "unrolled",
        };
        f.write_str(s)
    }
}

impl fmt::Display for TensorLoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => f.write_str("memory"),
            Self::Accelerator => f.write_str("accelerator"),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.node() {
            ExprNode::IntImm(n) => write!(f, "{}", n.value),
            ExprNode::UIntImm(n) if n.data_type.is_bool() => {
                f.write_str(if n.value == 0 { "false" } else { "true" })
            }
            ExprNode::UIntImm(n) => write!(f, "{}u", n.value),
            ExprNode::FloatImm(n) => write!(f, "{:?}", n.value),
            ExprNode::Variable(n) => f.write_str(&n.label),
            ExprNode::Cast(n) => write!(f, "{}({})", n.data_type, n.value),
            ExprNode::Binary(n) => match n.op {
                BinaryOp::Min | BinaryOp::Max => write!(f, "{}({}, {})", n.op, n.a, n.b),
                _ => write!(f, "({} {} {})", n.a, n.op, n.b),
            },
            ExprNode::Cmp(n) => write!(f, "({} {} {})", n.a, n.op, n.b),
            ExprNode::And(n) => write!(f, "({} && {})", n.a, n.b),
            ExprNode::Or(n) => write!(f, "({} || {})", n.a, n.b),
            ExprNode::Not(n) => write!(f, "!{}", n.value),
            ExprNode::Select(n) => write!(
                f,
                "select({}, {}, {})",
                n.cond, n.true_case, n.false_case
            ),
            ExprNode::Call(n) => write_call(f, n),
        }
    }
}

fn write_call(f: &mut fmt::Formatter<'_>, call: &Call) -> fmt::Result {
    let (open, close) = if call.is_tensor_access() {
        ('[', ']')
    } else {
        ('(', ')')
    };
    write!(f, "{}{open}", call.name)?;
    for (i, arg) in call.args.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{arg}")?;
    }
    write!(f, "{close}")
}

impl fmt::Display for VarExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "range(min={}, ext={})", self.min, self.extent)
    }
}

impl fmt::Display for Iter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} in {}", self.var(), self.range())?;
        if self.is_reduction() {
            f.write_str(" (reduce)")?;
        }
        Ok(())
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_stmt(f, self, 0)
    }
}

/// Writes `stmt` one line per leaf, nested bodies indented.
fn write_stmt(f: &mut fmt::Formatter<'_>, stmt: &Stmt, indent: usize) -> fmt::Result {
    let pad = indent * INDENT;
    match stmt.node() {
        StmtNode::LetStmt(n) => {
            writeln!(f, "{:pad$}let {} = {}", "", n.var, n.value)?;
            write_stmt(f, &n.body, indent)
        }
        StmtNode::IfThenElse(n) => {
            writeln!(f, "{:pad$}if ({}) {{", "", n.cond)?;
            write_stmt(f, &n.then_case, indent + 1)?;
            if let Some(else_case) = &n.else_case {
                writeln!(f, "{:pad$}}} else {{", "")?;
                write_stmt(f, else_case, indent + 1)?;
            }
            writeln!(f, "{:pad$}}}", "")
        }
        StmtNode::Block(n) => {
            write_stmt(f, &n.first, indent)?;
            if let Some(rest) = &n.rest {
                write_stmt(f, rest, indent)?;
            }
            Ok(())
        }
        StmtNode::For(n) => {
            write!(f, "{:pad$}", "")?;
            if n.for_type != ForType::Serial {
                write!(f, "{} ", n.for_type)?;
            }
            writeln!(f, "for ({}, {}, {}) {{", n.var, n.min, n.extent)?;
            write_stmt(f, &n.body, indent + 1)?;
            writeln!(f, "{:pad$}}}", "")
        }
        StmtNode::Store(n) => writeln!(f, "{:pad$}{} = {}", "", n.lhs, n.rhs),
        StmtNode::Reduce(n) => {
            writeln!(f, "{:pad$}{} {} {}", "", n.lhs, n.reduce_type, n.rhs)
        }
        StmtNode::Allocate(n) => {
            write!(f, "{:pad$}allocate {}[{}", "", n.buffer.name(), n.data_type)?;
            for extent in &n.extents {
                write!(f, " * {extent}")?;
            }
            writeln!(f, "] in {}", n.loc)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{add, make_const, Cmp, Not, Select, Variable};
    use crate::stmt::{For, IfThenElse, Store};
    use sc_types::DataType;

    #[test]
    fn test_expr_rendering() {
        let x = Variable::make(DataType::I32, "x").unwrap();
        let sum = add(x.clone(), Expr::int(1)).unwrap();
        assert_eq!(sum.to_string(), "(x + 1)");

        let lt = Cmp::make(CmpOp::Lt, x.clone(), Expr::int(4)).unwrap();
        let sel = Select::make(lt.clone(), x, Expr::int(0)).unwrap();
        assert_eq!(sel.to_string(), "select((x < 4), x, 0)");
        assert_eq!(Not::make(lt).unwrap().to_string(), "!(x < 4)");
        assert_eq!(Expr::bool(true).to_string(), "true");
        assert_eq!(Expr::float(2.0).to_string(), "2.0");
        assert_eq!(
            make_const(DataType::uint(32), 7).unwrap().to_string(),
            "7u"
        );
    }

    #[test]
    fn test_stmt_rendering() {
        let i = VarExpr::int32("i");
        let y = Variable::make(DataType::I32, "y").unwrap();
        let store = Store::make(y.clone(), i.as_expr().clone()).unwrap();
        let cond = Cmp::make(CmpOp::Gt, y, Expr::int(0)).unwrap();
        let body = IfThenElse::make(cond, store, None).unwrap();
        let lp = For::make(ForType::Parallel, i, Expr::int(0), Expr::int(10), body).unwrap();

        let expected = "\
parallel for (i, 0, 10) {
  if ((y > 0)) {
    y = i
  }
}
";
        assert_eq!(lp.to_string(), expected);
    }
}
