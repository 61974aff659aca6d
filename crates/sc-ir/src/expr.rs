//! The expression node family.
//!
//! An [`Expr`] is a shared handle to an immutable [`ExprNode`]. Each node
//! variant is a struct with a `make` factory; the factory checks the
//! variant's preconditions and is the only way to get an `Expr` holding
//! that variant.
//!
//! | Variant | Result type | Preconditions |
//! |---------|-------------|---------------|
//! | [`IntImm`], [`UIntImm`], [`FloatImm`] | given | scalar of the matching kind |
//! | [`Variable`] | given | type defined |
//! | [`Cast`] | given | lane counts agree |
//! | [`Binary`] | `a` | same types, not bool |
//! | [`Cmp`] | bool, lanes of `a` | same types |
//! | [`And`], [`Or`] | `a` | both bool |
//! | [`Not`] | `value` | bool |
//! | [`Select`] | `true_case` | bool condition, same branch types |
//! | [`Call`] | given | type defined, non-empty name, kind agrees with target |

use std::fmt;
use std::ops::Deref;

use sc_types::{DataType, TypeKind};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::base::{Function, TensorBase};
use crate::error::{IrError, IrResult};
use crate::handle::Ref;

/// Handle to an immutable expression node.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Expr(Ref<ExprNode>);

/// The expression variants.
#[derive(Debug)]
pub enum ExprNode {
    /// Signed integer constant.
    IntImm(IntImm),
    /// Unsigned integer constant.
    UIntImm(UIntImm),
    /// Float constant.
    FloatImm(FloatImm),
    /// Named variable.
    Variable(Variable),
    /// Type conversion.
    Cast(Cast),
    /// Arithmetic.
    Binary(Binary),
    /// Comparison.
    Cmp(Cmp),
    /// Logical and.
    And(And),
    /// Logical or.
    Or(Or),
    /// Logical not.
    Not(Not),
    /// Value-producing conditional.
    Select(Select),
    /// Function call or tensor element access.
    Call(Call),
}

/// Tag for each [`ExprNode`] variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExprKind {
    /// [`IntImm`]
    IntImm,
    /// [`UIntImm`]
    UIntImm,
    /// [`FloatImm`]
    FloatImm,
    /// [`Variable`]
    Variable,
    /// [`Cast`]
    Cast,
    /// [`Binary`]
    Binary,
    /// [`Cmp`]
    Cmp,
    /// [`And`]
    And,
    /// [`Or`]
    Or,
    /// [`Not`]
    Not,
    /// [`Select`]
    Select,
    /// [`Call`]
    Call,
}

/// Compile-time mapping from a variant struct to its tag.
pub trait ExprVariant: Sized {
    /// The tag of this variant.
    const KIND: ExprKind;

    /// Borrows the variant out of a node, if the node is this variant.
    fn from_node(node: &ExprNode) -> Option<&Self>;
}

macro_rules! expr_variants {
    ($($name:ident),* $(,)?) => {
        $(
            impl ExprVariant for $name {
                const KIND: ExprKind = ExprKind::$name;

                fn from_node(node: &ExprNode) -> Option<&Self> {
                    match node {
                        ExprNode::$name(n) => Some(n),
                        _ => None,
                    }
                }
            }
        )*

        impl ExprNode {
            /// Returns the variant tag.
            #[must_use]
            pub fn kind(&self) -> ExprKind {
                match self {
                    $(Self::$name(_) => ExprKind::$name,)*
                }
            }
        }
    };
}

expr_variants!(
    IntImm, UIntImm, FloatImm, Variable, Cast, Binary, Cmp, And, Or, Not, Select, Call,
);

impl ExprNode {
    /// Returns the value type.
    #[must_use]
    pub fn ty(&self) -> DataType {
        match self {
            Self::IntImm(n) => n.data_type,
            Self::UIntImm(n) => n.data_type,
            Self::FloatImm(n) => n.data_type,
            Self::Variable(n) => n.data_type,
            Self::Cast(n) => n.data_type,
            Self::Binary(n) => n.data_type,
            Self::Cmp(n) => n.data_type,
            Self::And(n) => n.data_type,
            Self::Or(n) => n.data_type,
            Self::Not(n) => n.data_type,
            Self::Select(n) => n.data_type,
            Self::Call(n) => n.data_type,
        }
    }
}

impl Expr {
    fn new(node: ExprNode) -> Self {
        Self(Ref::new(node))
    }

    /// Returns the node.
    #[must_use]
    pub fn node(&self) -> &ExprNode {
        &self.0
    }

    /// Returns the variant tag.
    #[must_use]
    pub fn kind(&self) -> ExprKind {
        self.0.kind()
    }

    /// Returns the value type.
    #[must_use]
    pub fn ty(&self) -> DataType {
        self.0.ty()
    }

    /// Returns true if the node is variant `V`.
    #[must_use]
    pub fn is_type<V: ExprVariant>(&self) -> bool {
        self.kind() == V::KIND
    }

    /// Borrows the node as variant `V`.
    #[must_use]
    pub fn cast_to<V: ExprVariant>(&self) -> Option<&V> {
        V::from_node(&self.0)
    }

    /// Returns true for a `Call` of kind [`CallKind::TensorAccess`].
    #[must_use]
    pub fn is_tensor_access(&self) -> bool {
        self.cast_to::<Call>().is_some_and(Call::is_tensor_access)
    }

    /// Returns true if both handles point at the same node.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.0.ptr_eq(&other.0)
    }

    /// Identity key of the node.
    #[must_use]
    pub fn addr(&self) -> usize {
        self.0.addr()
    }

    /// Shorthand for a 32-bit integer constant.
    #[must_use]
    pub fn int(value: i64) -> Self {
        Self::new(ExprNode::IntImm(IntImm {
            data_type: DataType::I32,
            value,
        }))
    }

    /// Shorthand for a 32-bit float constant.
    #[must_use]
    pub fn float(value: f64) -> Self {
        Self::new(ExprNode::FloatImm(FloatImm {
            data_type: DataType::F32,
            value,
        }))
    }

    /// Shorthand for a boolean constant.
    #[must_use]
    pub fn bool(value: bool) -> Self {
        Self::new(ExprNode::UIntImm(UIntImm {
            data_type: DataType::BOOL,
            value: u64::from(value),
        }))
    }
}

impl Deref for Expr {
    type Target = ExprNode;

    fn deref(&self) -> &ExprNode {
        &self.0
    }
}

impl fmt::Debug for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.node(), f)
    }
}

/// Builds a constant of type `ty` holding `value`.
///
/// # Errors
///
/// Fails for vector, boolean, handle and void types, and with
/// [`IrError::ValueOutOfRange`] for a negative unsigned constant.
pub fn make_const(ty: DataType, value: i64) -> IrResult<Expr> {
    match ty.kind() {
        TypeKind::Int => IntImm::make(ty, value),
        TypeKind::UInt => match u64::try_from(value) {
            Ok(value) => UIntImm::make(ty, value),
            Err(_) => Err(IrError::ValueOutOfRange {
                op: "make_const",
                value: i128::from(value),
                ty,
            }),
        },
        #[allow(clippy::cast_precision_loss)]
        TypeKind::Float => FloatImm::make(ty, value as f64),
        _ => Err(IrError::UnsupportedType {
            op: "make_const",
            ty,
        }),
    }
}

/// The zero of a scalar numeric type.
///
/// # Errors
///
/// See [`make_const`].
pub fn make_zero(ty: DataType) -> IrResult<Expr> {
    make_const(ty, 0)
}

fn check_imm(op: &'static str, ty: DataType, kind: TypeKind) -> IrResult<()> {
    if ty.kind() == kind && ty.is_scalar() {
        Ok(())
    } else {
        Err(IrError::UnsupportedType { op, ty })
    }
}

/// Signed integer constant.
#[derive(Debug)]
pub struct IntImm {
    /// Value type.
    pub data_type: DataType,
    /// The constant.
    pub value: i64,
}

impl IntImm {
    /// Builds a signed integer constant.
    ///
    /// # Errors
    ///
    /// Fails unless `ty` is a scalar signed integer.
    pub fn make(ty: DataType, value: i64) -> IrResult<Expr> {
        check_imm("IntImm", ty, TypeKind::Int)?;
        Ok(Expr::new(ExprNode::IntImm(Self {
            data_type: ty,
            value,
        })))
    }
}

/// Unsigned integer constant. Boolean constants are stored here too.
#[derive(Debug)]
pub struct UIntImm {
    /// Value type.
    pub data_type: DataType,
    /// The constant.
    pub value: u64,
}

impl UIntImm {
    /// Builds an unsigned integer constant, or a boolean one when `ty` is
    /// bool.
    ///
    /// # Errors
    ///
    /// Fails unless `ty` is a scalar unsigned integer or bool, and with
    /// [`IrError::ValueOutOfRange`] for a bool other than 0 or 1.
    pub fn make(ty: DataType, value: u64) -> IrResult<Expr> {
        if ty.kind() == TypeKind::Bool {
            check_imm("UIntImm", ty, TypeKind::Bool)?;
            if value > 1 {
                return Err(IrError::ValueOutOfRange {
                    op: "UIntImm",
                    value: i128::from(value),
                    ty,
                });
            }
        } else {
            check_imm("UIntImm", ty, TypeKind::UInt)?;
        }
        Ok(Expr::new(ExprNode::UIntImm(Self {
            data_type: ty,
            value,
        })))
    }
}

/// Float constant.
#[derive(Debug)]
pub struct FloatImm {
    /// Value type.
    pub data_type: DataType,
    /// The constant.
    pub value: f64,
}

impl FloatImm {
    /// Builds a float constant.
    ///
    /// # Errors
    ///
    /// Fails unless `ty` is a scalar float.
    pub fn make(ty: DataType, value: f64) -> IrResult<Expr> {
        check_imm("FloatImm", ty, TypeKind::Float)?;
        Ok(Expr::new(ExprNode::FloatImm(Self {
            data_type: ty,
            value,
        })))
    }
}

/// A named variable.
#[derive(Debug)]
pub struct Variable {
    /// Value type.
    pub data_type: DataType,
    /// Display name. Not required to be unique.
    pub label: String,
}

impl Variable {
    /// Builds a variable.
    ///
    /// # Errors
    ///
    /// Fails if `ty` is not defined.
    pub fn make(ty: DataType, label: impl Into<String>) -> IrResult<Expr> {
        if !ty.defined() {
            return Err(IrError::UndefinedType { op: "Variable" });
        }
        Ok(Expr::new(ExprNode::Variable(Self {
            data_type: ty,
            label: label.into(),
        })))
    }
}

/// Conversion of `value` to another element type with the same lane count.
#[derive(Debug)]
pub struct Cast {
    /// Target type.
    pub data_type: DataType,
    /// Converted value.
    pub value: Expr,
}

impl Cast {
    /// Builds a cast.
    ///
    /// # Errors
    ///
    /// Fails if `ty` and `value`'s type differ in lane count.
    pub fn make(ty: DataType, value: Expr) -> IrResult<Expr> {
        if ty.length() != value.ty().length() {
            return Err(IrError::LaneMismatch {
                target: ty.length(),
                value: value.ty().length(),
            });
        }
        Ok(Expr::new(ExprNode::Cast(Self {
            data_type: ty,
            value,
        })))
    }
}

/// Arithmetic operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    /// `a + b`
    Add,
    /// `a - b`
    Sub,
    /// `a * b`
    Mul,
    /// `a / b`
    Div,
    /// `a % b`
    Mod,
    /// `min(a, b)`
    Min,
    /// `max(a, b)`
    Max,
}

/// Arithmetic on two operands of the same type.
#[derive(Debug)]
pub struct Binary {
    /// Operator.
    pub op: BinaryOp,
    /// Value type, equal to both operand types.
    pub data_type: DataType,
    /// Left operand.
    pub a: Expr,
    /// Right operand.
    pub b: Expr,
}

impl Binary {
    /// Builds an arithmetic node.
    ///
    /// # Errors
    ///
    /// Fails if the operand types differ or are boolean.
    pub fn make(op: BinaryOp, a: Expr, b: Expr) -> IrResult<Expr> {
        if a.ty() != b.ty() {
            return Err(IrError::TypeMismatch {
                op: "Binary",
                what: "a, b",
                lhs: a.ty(),
                rhs: b.ty(),
            });
        }
        if a.ty().is_bool() {
            return Err(IrError::UnsupportedType {
                op: "Binary",
                ty: a.ty(),
            });
        }
        Ok(Expr::new(ExprNode::Binary(Self {
            op,
            data_type: a.ty(),
            a,
            b,
        })))
    }
}

/// `a + b`
///
/// # Errors
///
/// See [`Binary::make`].
pub fn add(a: Expr, b: Expr) -> IrResult<Expr> {
    Binary::make(BinaryOp::Add, a, b)
}

/// `a - b`
///
/// # Errors
///
/// See [`Binary::make`].
pub fn sub(a: Expr, b: Expr) -> IrResult<Expr> {
    Binary::make(BinaryOp::Sub, a, b)
}

/// `a * b`
///
/// # Errors
///
/// See [`Binary::make`].
pub fn mul(a: Expr, b: Expr) -> IrResult<Expr> {
    Binary::make(BinaryOp::Mul, a, b)
}

/// `a / b`
///
/// # Errors
///
/// See [`Binary::make`].
pub fn div(a: Expr, b: Expr) -> IrResult<Expr> {
    Binary::make(BinaryOp::Div, a, b)
}

/// Comparison operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CmpOp {
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
}

/// Comparison of two operands of the same type.
#[derive(Debug)]
pub struct Cmp {
    /// Operator.
    pub op: CmpOp,
    /// Boolean with the operands' lane count.
    pub data_type: DataType,
    /// Left operand.
    pub a: Expr,
    /// Right operand.
    pub b: Expr,
}

impl Cmp {
    /// Builds a comparison.
    ///
    /// # Errors
    ///
    /// Fails if the operand types differ.
    pub fn make(op: CmpOp, a: Expr, b: Expr) -> IrResult<Expr> {
        if a.ty() != b.ty() {
            return Err(IrError::TypeMismatch {
                op: "Cmp",
                what: "a, b",
                lhs: a.ty(),
                rhs: b.ty(),
            });
        }
        Ok(Expr::new(ExprNode::Cmp(Self {
            op,
            data_type: DataType::bool().with_lanes(a.ty().length()),
            a,
            b,
        })))
    }
}

fn check_bool(op: &'static str, operand: &'static str, e: &Expr) -> IrResult<()> {
    if e.ty().is_bool() {
        Ok(())
    } else {
        Err(IrError::NotBool {
            op,
            operand,
            ty: e.ty(),
        })
    }
}

/// Logical and.
#[derive(Debug)]
pub struct And {
    /// Value type, taken from `a`.
    pub data_type: DataType,
    /// Left operand.
    pub a: Expr,
    /// Right operand.
    pub b: Expr,
}

impl And {
    /// Builds `a && b`.
    ///
    /// # Errors
    ///
    /// Fails if either operand is not boolean.
    pub fn make(a: Expr, b: Expr) -> IrResult<Expr> {
        check_bool("And", "a", &a)?;
        check_bool("And", "b", &b)?;
        Ok(Expr::new(ExprNode::And(Self {
            data_type: a.ty(),
            a,
            b,
        })))
    }
}

/// Logical or.
#[derive(Debug)]
pub struct Or {
    /// Value type, taken from `a`.
    pub data_type: DataType,
    /// Left operand.
    pub a: Expr,
    /// Right operand.
    pub b: Expr,
}

impl Or {
    /// Builds `a || b`.
    ///
    /// # Errors
    ///
    /// Fails if either operand is not boolean.
    pub fn make(a: Expr, b: Expr) -> IrResult<Expr> {
        check_bool("Or", "a", &a)?;
        check_bool("Or", "b", &b)?;
        Ok(Expr::new(ExprNode::Or(Self {
            data_type: a.ty(),
            a,
            b,
        })))
    }
}

/// Logical not.
#[derive(Debug)]
pub struct Not {
    /// Value type, taken from `value`.
    pub data_type: DataType,
    /// Negated operand.
    pub value: Expr,
}

impl Not {
    /// Builds `!value`. The operand slot holds `value` itself.
    ///
    /// # Errors
    ///
    /// Fails if `value` is not boolean.
    pub fn make(value: Expr) -> IrResult<Expr> {
        check_bool("Not", "value", &value)?;
        Ok(Expr::new(ExprNode::Not(Self {
            data_type: value.ty(),
            value,
        })))
    }
}

/// `cond ? true_case : false_case`
#[derive(Debug)]
pub struct Select {
    /// Value type, shared by both branches.
    pub data_type: DataType,
    /// Condition.
    pub cond: Expr,
    /// Value when `cond` holds.
    pub true_case: Expr,
    /// Value otherwise.
    pub false_case: Expr,
}

impl Select {
    /// Builds a select.
    ///
    /// # Errors
    ///
    /// Fails if `cond` is not boolean or the branch types differ.
    pub fn make(cond: Expr, true_case: Expr, false_case: Expr) -> IrResult<Expr> {
        check_bool("Select", "cond", &cond)?;
        if true_case.ty() != false_case.ty() {
            return Err(IrError::TypeMismatch {
                op: "Select",
                what: "true, false cases",
                lhs: true_case.ty(),
                rhs: false_case.ty(),
            });
        }
        Ok(Expr::new(ExprNode::Select(Self {
            data_type: true_case.ty(),
            cond,
            true_case,
            false_case,
        })))
    }
}

/// What a call does.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CallKind {
    /// Call to a function defined outside the graph.
    Extern,
    /// Call to a computation of the graph.
    Computation,
    /// Element read (or write destination) of a tensor.
    TensorAccess,
}

/// The callee of a [`Call`]. Exactly one target is always present.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum CallTarget {
    /// A function.
    Function(Function),
    /// A tensor.
    Tensor(TensorBase),
}

impl CallTarget {
    /// The target's name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Function(f) => f.name(),
            Self::Tensor(t) => t.name(),
        }
    }
}

impl From<Function> for CallTarget {
    fn from(f: Function) -> Self {
        Self::Function(f)
    }
}

impl From<TensorBase> for CallTarget {
    fn from(t: TensorBase) -> Self {
        Self::Tensor(t)
    }
}

/// A function call or tensor element access.
#[derive(Debug)]
pub struct Call {
    /// Return type.
    pub data_type: DataType,
    /// What the call does.
    pub call_kind: CallKind,
    /// Name of the call site.
    pub name: String,
    /// Arguments; indices for a tensor access.
    pub args: SmallVec<[Expr; 4]>,
    /// The callee.
    pub target: CallTarget,
}

impl Call {
    /// Builds a call.
    ///
    /// # Errors
    ///
    /// Fails if the return type is undefined, the name is empty, or the
    /// call kind does not agree with the target (tensor accesses need a
    /// tensor target and tensor targets need a tensor access).
    pub fn make(
        ret: DataType,
        call_kind: CallKind,
        name: impl Into<String>,
        args: impl IntoIterator<Item = Expr>,
        target: impl Into<CallTarget>,
    ) -> IrResult<Expr> {
        let name = name.into();
        let target = target.into();
        if !ret.defined() {
            return Err(IrError::UndefinedType { op: "Call" });
        }
        if name.is_empty() {
            return Err(IrError::EmptyName { op: "Call" });
        }
        let access = call_kind == CallKind::TensorAccess;
        if access != matches!(target, CallTarget::Tensor(_)) {
            return Err(IrError::CallTargetMismatch {
                name,
                kind: call_kind,
            });
        }
        Ok(Expr::new(ExprNode::Call(Self {
            data_type: ret,
            call_kind,
            name,
            args: args.into_iter().collect(),
            target,
        })))
    }

    /// Returns true for tensor element accesses.
    #[must_use]
    pub fn is_tensor_access(&self) -> bool {
        self.call_kind == CallKind::TensorAccess
    }

    /// The accessed tensor, if this is a tensor access.
    #[must_use]
    pub fn tensor(&self) -> Option<&TensorBase> {
        match &self.target {
            CallTarget::Tensor(t) => Some(t),
            CallTarget::Function(_) => None,
        }
    }

    /// The called function, if this is not a tensor access.
    #[must_use]
    pub fn function(&self) -> Option<&Function> {
        match &self.target {
            CallTarget::Function(f) => Some(f),
            CallTarget::Tensor(_) => None,
        }
    }
}

/// An [`Expr`] known to be a [`Variable`].
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct VarExpr(Expr);

/// Alternate name for [`VarExpr`].
pub type Var = VarExpr;

impl VarExpr {
    /// Builds a fresh variable.
    ///
    /// # Errors
    ///
    /// Fails if `ty` is not defined.
    pub fn new(ty: DataType, label: impl Into<String>) -> IrResult<Self> {
        Variable::make(ty, label).map(Self)
    }

    /// Builds a fresh 32-bit integer variable.
    #[must_use]
    pub fn int32(label: impl Into<String>) -> Self {
        Self::defined(DataType::I32, label.into())
    }

    // `ty` must already be known to be defined.
    fn defined(ty: DataType, label: String) -> Self {
        Self(Expr::new(ExprNode::Variable(Variable {
            data_type: ty,
            label,
        })))
    }

    /// Wraps `expr` if it is a variable.
    #[must_use]
    pub fn from_expr(expr: Expr) -> Option<Self> {
        expr.is_type::<Variable>().then_some(Self(expr))
    }

    /// Builds a new variable of the same type whose label is this label
    /// followed by `ext`.
    #[must_use]
    pub fn derive(&self, ext: &str) -> Self {
        Self::defined(self.ty(), format!("{}{ext}", self.label()))
    }

    /// The variable node.
    #[must_use]
    pub fn variable(&self) -> &Variable {
        match self.0.node() {
            ExprNode::Variable(v) => v,
            _ => unreachable!("VarExpr always wraps a Variable"),
        }
    }

    /// The label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.variable().label
    }

    /// The variable as a plain expression.
    #[must_use]
    pub fn as_expr(&self) -> &Expr {
        &self.0
    }

    /// Unwraps into a plain expression.
    #[must_use]
    pub fn into_expr(self) -> Expr {
        self.0
    }
}

impl Deref for VarExpr {
    type Target = Expr;

    fn deref(&self) -> &Expr {
        &self.0
    }
}

impl From<VarExpr> for Expr {
    fn from(v: VarExpr) -> Self {
        v.0
    }
}

impl fmt::Debug for VarExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::ExternFunction;
    use crate::equal::StructuralEq;

    fn flag(label: &str) -> Expr {
        Variable::make(DataType::BOOL, label).unwrap()
    }

    #[test]
    fn test_variable_requires_defined_type() {
        assert!(Variable::make(DataType::I32, "x").is_ok());
        assert!(matches!(
            Variable::make(DataType::VOID, "x"),
            Err(IrError::UndefinedType { op: "Variable" })
        ));
    }

    #[test]
    fn test_cast_lane_check() {
        let x = Variable::make(DataType::I32, "x").unwrap();
        let c = Cast::make(DataType::F32, x.clone()).unwrap();
        assert_eq!(c.ty(), DataType::F32);
        assert!(c.cast_to::<Cast>().unwrap().value.ptr_eq(&x));

        let err = Cast::make(DataType::F32.with_lanes(4), x).unwrap_err();
        assert!(matches!(
            err,
            IrError::LaneMismatch {
                target: 4,
                value: 1
            }
        ));
    }

    #[test]
    fn test_logical_ops_require_bool() {
        let p = flag("p");
        let q = flag("q");
        let x = Variable::make(DataType::I32, "x").unwrap();

        assert_eq!(And::make(p.clone(), q.clone()).unwrap().ty(), DataType::BOOL);
        assert_eq!(Or::make(p.clone(), q).unwrap().ty(), DataType::BOOL);
        assert!(matches!(
            And::make(p.clone(), x.clone()),
            Err(IrError::NotBool { operand: "b", .. })
        ));
        assert!(matches!(
            Or::make(x.clone(), p),
            Err(IrError::NotBool { operand: "a", .. })
        ));
        assert!(Not::make(x).is_err());
    }

    #[test]
    fn test_not_operand_is_input() {
        let p = flag("p");
        let n = Not::make(p.clone()).unwrap();
        let node = n.cast_to::<Not>().unwrap();
        assert!(node.value.ptr_eq(&p));
        assert!(!node.value.ptr_eq(&n));
    }

    #[test]
    fn test_binary_and_cmp() {
        let x = Variable::make(DataType::I32, "x").unwrap();
        let two = Expr::int(2);
        let m = mul(x.clone(), two).unwrap();
        assert_eq!(m.ty(), DataType::I32);
        assert_eq!(m.kind(), ExprKind::Binary);

        let f = Variable::make(DataType::F32, "f").unwrap();
        assert!(matches!(
            add(x.clone(), f),
            Err(IrError::TypeMismatch { op: "Binary", .. })
        ));

        let lt = Cmp::make(CmpOp::Lt, x.clone(), x).unwrap();
        assert!(lt.ty().is_bool());
    }

    #[test]
    fn test_select_checks() {
        let p = flag("p");
        let a = Expr::int(1);
        let b = Expr::int(2);
        let s = Select::make(p.clone(), a.clone(), b).unwrap();
        assert_eq!(s.ty(), DataType::I32);
        assert!(Select::make(a.clone(), a.clone(), a.clone()).is_err());
        assert!(Select::make(p, a, Expr::float(1.0)).is_err());
    }

    #[test]
    fn test_call_checks() {
        let exp = ExternFunction::make("exp").unwrap();
        let x = Expr::float(1.0);

        let call = Call::make(
            DataType::F32,
            CallKind::Extern,
            "exp",
            [x.clone()],
            exp.clone(),
        )
        .unwrap();
        assert!(!call.is_tensor_access());
        assert_eq!(call.cast_to::<Call>().unwrap().args.len(), 1);

        assert!(matches!(
            Call::make(DataType::VOID, CallKind::Extern, "exp", [], exp.clone()),
            Err(IrError::UndefinedType { op: "Call" })
        ));
        assert!(matches!(
            Call::make(DataType::F32, CallKind::Extern, "", [], exp.clone()),
            Err(IrError::EmptyName { op: "Call" })
        ));
        assert!(matches!(
            Call::make(DataType::F32, CallKind::TensorAccess, "exp", [x], exp),
            Err(IrError::CallTargetMismatch { .. })
        ));
    }

    #[test]
    fn test_make_const() {
        assert_eq!(make_const(DataType::I64, 3).unwrap().ty(), DataType::I64);
        assert_eq!(make_const(DataType::F64, 3).unwrap().ty(), DataType::F64);
        assert!(make_const(DataType::BOOL, 1).is_err());
        assert!(matches!(
            make_const(DataType::uint(8), -1),
            Err(IrError::ValueOutOfRange { value: -1, .. })
        ));
        assert_eq!(make_const(DataType::uint(8), 7).unwrap().ty(), DataType::uint(8));
        assert!(make_zero(DataType::I32.with_lanes(4)).is_err());
    }

    #[test]
    fn test_bool_immediates() {
        let t = UIntImm::make(DataType::BOOL, 1).unwrap();
        assert_eq!(t.ty(), DataType::BOOL);
        assert!(t.structural_eq(&Expr::bool(true)));
        assert!(UIntImm::make(DataType::BOOL, 0)
            .unwrap()
            .structural_eq(&Expr::bool(false)));
        assert!(matches!(
            UIntImm::make(DataType::BOOL, 2),
            Err(IrError::ValueOutOfRange { op: "UIntImm", .. })
        ));
        assert!(UIntImm::make(DataType::BOOL.with_lanes(2), 1).is_err());
        assert!(UIntImm::make(DataType::I32, 1).is_err());
    }

    #[test]
    fn test_var_derive() {
        let i = VarExpr::int32("i");
        let a = i.derive(".outer");
        let b = i.derive(".outer");
        assert_eq!(a.label(), "i.outer");
        assert_eq!(a.ty(), i.ty());
        assert_ne!(a, b);
    }

    #[test]
    fn test_var_from_expr() {
        assert!(VarExpr::from_expr(Expr::int(0)).is_none());
        let v = Variable::make(DataType::F32, "v").unwrap();
        assert_eq!(VarExpr::from_expr(v).unwrap().label(), "v");
    }
}
