//! Computations: the nodes of the tensor graph.
//!
//! A computation produces one or more tensors. There are three kinds:
//!
//! | Kind | Inputs | Outputs | Body |
//! |------|--------|---------|------|
//! | [`PlaceHolder`] | none | one, supplied from outside | none |
//! | [`Allocate`] | none | one, storage only | an `Allocate` statement |
//! | [`NestLoop`] | discovered | discovered | a loop nest |
//!
//! Construction runs as a single transaction. All preconditions are checked
//! and the derived tensor lists computed before the node is allocated.
//! Outputs are then bound one by one; if one of them already has another
//! producer, the bindings made so far are restored and nothing is
//! registered with the schedule. Another thread may briefly observe such a
//! binding before it is restored.
//!
//! A computation holds strong handles to its upstream computations: the
//! producers of its inputs and the allocations its outputs were reserved
//! by. Consumers thereby keep their producers alive, and since these edges
//! only point at computations that already existed, they never form a
//! cycle.

use std::any::Any;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use rustc_hash::FxHashSet;
use sc_ir::stmt::Allocate as AllocateStmt;
use sc_ir::{
    Call, CallKind, DataType, Expr, Function, FunctionKind, FunctionNode, IrError, IrResult,
    Iter, Ref, Stmt, TensorLoc, WeakRef,
};
use tracing::debug;

use crate::discover;
use crate::lower::{self, LowerConfig};
use crate::schedule::Schedule;
use crate::tensor::{check_decl, Tensor};

/// An externally supplied input tensor.
#[derive(Debug)]
pub struct PlaceHolder {
    /// Element type.
    pub data_type: DataType,
    /// Extent of each dimension.
    pub shape: Vec<Expr>,
}

/// Storage for a tensor, without a defining body.
#[derive(Debug)]
pub struct Allocate {
    /// Element type.
    pub data_type: DataType,
    /// Extent of each dimension.
    pub shape: Vec<Expr>,
    /// Where the storage lives.
    pub loc: TensorLoc,
}

/// A loop nest over the root iters, then the reduction iters.
#[derive(Debug)]
pub struct NestLoop {
    /// Reduction iters, the last one innermost.
    pub reduce_iters: Vec<Iter>,
    /// Statements run in the innermost loop.
    pub body: Vec<Stmt>,
}

/// The computation variants.
#[derive(Debug)]
pub enum ComputationKind {
    /// See [`PlaceHolder`].
    PlaceHolder(PlaceHolder),
    /// See [`Allocate`].
    Allocate(Allocate),
    /// See [`NestLoop`].
    NestLoop(NestLoop),
}

impl ComputationKind {
    /// The matching function kind.
    #[must_use]
    pub fn function_kind(&self) -> FunctionKind {
        match self {
            Self::PlaceHolder(_) => FunctionKind::PlaceHolder,
            Self::Allocate(_) => FunctionKind::Allocate,
            Self::NestLoop(_) => FunctionKind::NestLoop,
        }
    }
}

/// Payload of a [`Computation`].
pub struct ComputationNode {
    name: String,
    root_iters: Vec<Iter>,
    input_tensors: Vec<Tensor>,
    output_tensors: Vec<Tensor>,
    upstream: Vec<Computation>,
    kind: ComputationKind,
}

impl fmt::Debug for ComputationNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let upstream: Vec<&str> = self.upstream.iter().map(|cp| cp.name()).collect();
        f.debug_struct("ComputationNode")
            .field("name", &self.name)
            .field("root_iters", &self.root_iters)
            .field("input_tensors", &self.input_tensors)
            .field("output_tensors", &self.output_tensors)
            .field("upstream", &upstream)
            .field("kind", &self.kind)
            .finish()
    }
}

impl ComputationNode {
    /// The name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The variant.
    #[must_use]
    pub fn kind(&self) -> &ComputationKind {
        &self.kind
    }

    /// The outermost loop indices.
    #[must_use]
    pub fn root_iters(&self) -> &[Iter] {
        &self.root_iters
    }

    /// Reduction iters; empty unless this is a [`NestLoop`].
    #[must_use]
    pub fn reduce_iters(&self) -> &[Iter] {
        match &self.kind {
            ComputationKind::NestLoop(n) => &n.reduce_iters,
            _ => &[],
        }
    }

    /// Tensors read, in first-read order.
    #[must_use]
    pub fn input_tensors(&self) -> &[Tensor] {
        &self.input_tensors
    }

    /// Tensors written; a tensor's position here is its output index.
    #[must_use]
    pub fn output_tensors(&self) -> &[Tensor] {
        &self.output_tensors
    }

    /// Computations this one depends on, kept alive by it: the live
    /// producers of its inputs, then the allocations behind its outputs.
    #[must_use]
    pub fn upstream(&self) -> &[Computation] {
        &self.upstream
    }
}

/// Producers of `inputs` and allocations of `outputs`, deduplicated.
fn upstream_of(inputs: &[Tensor], outputs: &[Tensor]) -> Vec<Computation> {
    let mut seen = FxHashSet::default();
    inputs
        .iter()
        .filter_map(Tensor::source_cp)
        .chain(outputs.iter().filter_map(Tensor::allocation))
        .filter(|cp| seen.insert(cp.handle().addr()))
        .collect()
}

impl FunctionNode for ComputationNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn function_kind(&self) -> FunctionKind {
        self.kind.function_kind()
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// Handle to a computation. Compares and hashes by identity.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Computation(Ref<ComputationNode>);

impl Computation {
    pub(crate) fn from_ref(node: Ref<ComputationNode>) -> Self {
        Self(node)
    }

    pub(crate) fn handle(&self) -> &Ref<ComputationNode> {
        &self.0
    }

    pub(crate) fn downgrade(&self) -> WeakRef<ComputationNode> {
        self.0.downgrade()
    }

    /// Builds a placeholder or allocation: one output tensor named after
    /// the computation, bound at index 0, over root iters `name.i{k}`.
    fn declaration(
        op: &'static str,
        name: String,
        data_type: DataType,
        shape: Vec<Expr>,
        kind: ComputationKind,
    ) -> IrResult<Self> {
        let storage = matches!(kind, ComputationKind::Allocate(_));
        check_decl(op, &name, data_type, &shape)?;
        let root_iters = shape
            .iter()
            .enumerate()
            .map(|(k, extent)| Iter::normal(&format!("{name}.i{k}"), extent.clone()))
            .collect::<IrResult<Vec<_>>>()?;

        let node = Ref::new_cyclic(|weak| {
            let output = Tensor::bound(name.clone(), data_type, shape, weak, storage);
            ComputationNode {
                name,
                root_iters,
                input_tensors: Vec::new(),
                output_tensors: vec![output],
                upstream: Vec::new(),
                kind,
            }
        });
        let cp = Self(node);
        debug!(
            computation = %cp.name(),
            kind = op,
            rank = cp.root_iters().len(),
            "constructed computation"
        );
        Ok(cp)
    }

    /// The payload.
    #[must_use]
    pub fn node(&self) -> &ComputationNode {
        &self.0
    }

    /// The output at `index`.
    #[must_use]
    pub fn output(&self, index: usize) -> Option<&Tensor> {
        self.output_tensors().get(index)
    }

    /// Returns true if both handles point at the same computation.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.0.ptr_eq(&other.0)
    }

    /// The computation as a call target.
    #[must_use]
    pub fn as_function(&self) -> Function {
        let node: Arc<dyn FunctionNode> = Arc::<ComputationNode>::clone(self.0.as_arc());
        Ref::from_arc(node)
    }

    /// Recovers a computation from a call target.
    #[must_use]
    pub fn from_function(function: &Function) -> Option<Self> {
        function.downcast::<ComputationNode>().map(Self)
    }

    /// A call of this computation returning `ret`.
    ///
    /// # Errors
    ///
    /// See [`Call::make`].
    pub fn call(&self, ret: DataType, args: impl IntoIterator<Item = Expr>) -> IrResult<Expr> {
        Call::make(ret, CallKind::Computation, self.name(), args, self.as_function())
    }

    /// Lowers to a statement with the default [`LowerConfig`].
    ///
    /// # Errors
    ///
    /// See [`Computation::build_body_with`].
    pub fn build_body(&self) -> IrResult<Option<Stmt>> {
        self.build_body_with(&LowerConfig::default())
    }

    /// Lowers to a statement.
    ///
    /// - placeholder: `None`
    /// - allocation: an `Allocate` declaration of the output
    /// - nest loop: the loop nest, or `None` for an empty body
    ///
    /// # Errors
    ///
    /// Propagates statement construction failures.
    pub fn build_body_with(&self, config: &LowerConfig) -> IrResult<Option<Stmt>> {
        match self.kind() {
            ComputationKind::PlaceHolder(_) => Ok(None),
            ComputationKind::Allocate(a) => {
                let Some(output) = self.output(0) else {
                    return Ok(None);
                };
                AllocateStmt::make(output.as_base(), a.data_type, a.shape.iter().cloned(), a.loc)
                    .map(Some)
            }
            ComputationKind::NestLoop(n) => {
                debug!(computation = %self.name(), ?config, "lowering");
                lower::nest_loops(self.root_iters(), &n.reduce_iters, &n.body, config)
            }
        }
    }
}

impl Deref for Computation {
    type Target = ComputationNode;

    fn deref(&self) -> &ComputationNode {
        &self.0
    }
}

impl fmt::Debug for Computation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl PlaceHolder {
    /// Declares an input tensor `name` of the given shape.
    ///
    /// # Errors
    ///
    /// Fails if the name is empty, the type is undefined or an extent is
    /// not a scalar integer.
    pub fn make(
        name: impl Into<String>,
        shape: impl IntoIterator<Item = Expr>,
        data_type: DataType,
    ) -> IrResult<Computation> {
        let shape: Vec<Expr> = shape.into_iter().collect();
        let kind = ComputationKind::PlaceHolder(Self {
            data_type,
            shape: shape.clone(),
        });
        Computation::declaration("PlaceHolder", name.into(), data_type, shape, kind)
    }
}

impl Allocate {
    /// Declares storage for a tensor `name` at `loc`
    /// (`TensorLoc::default()` is main memory).
    ///
    /// # Errors
    ///
    /// Same as [`PlaceHolder::make`].
    pub fn make(
        name: impl Into<String>,
        shape: impl IntoIterator<Item = Expr>,
        data_type: DataType,
        loc: TensorLoc,
    ) -> IrResult<Computation> {
        let shape: Vec<Expr> = shape.into_iter().collect();
        let kind = ComputationKind::Allocate(Self {
            data_type,
            shape: shape.clone(),
            loc,
        });
        Computation::declaration("Allocate", name.into(), data_type, shape, kind)
    }
}

impl NestLoop {
    /// Builds a nest-loop computation and registers it with `schedule`.
    ///
    /// Outputs are the tensors `body` stores or reduces into; each is bound
    /// to the new computation at its position. An output may be unbound or
    /// reserved by an [`Allocate`], but not produced by another nest loop.
    /// Inputs are the other tensors `body` reads.
    ///
    /// # Errors
    ///
    /// Fails if the name is empty, a reduction iter is not a reduction
    /// iter, a root iter is one, or an output already has a live nest-loop
    /// producer.
    pub fn make<S: Schedule + ?Sized>(
        schedule: &mut S,
        name: impl Into<String>,
        root_iters: Vec<Iter>,
        reduce_iters: Vec<Iter>,
        body: Vec<Stmt>,
    ) -> IrResult<Computation> {
        let name = name.into();
        if name.is_empty() {
            return Err(IrError::EmptyName { op: "NestLoop" });
        }
        if let Some(iter) = reduce_iters.iter().find(|it| !it.is_reduction()) {
            return Err(IrError::NotReductionIter {
                op: "NestLoop",
                iter: iter.label().to_string(),
            });
        }
        if let Some(iter) = root_iters.iter().find(|it| it.is_reduction()) {
            return Err(IrError::ReductionRootIter {
                computation: name,
                iter: iter.label().to_string(),
            });
        }

        let output_tensors = discover::output_tensors(&body);
        let input_tensors = discover::input_tensors(&body, &output_tensors);
        let upstream = upstream_of(&input_tensors, &output_tensors);

        let cp = Computation(Ref::new(ComputationNode {
            name,
            root_iters,
            input_tensors,
            output_tensors,
            upstream,
            kind: ComputationKind::NestLoop(Self { reduce_iters, body }),
        }));
        let mut bound = Vec::with_capacity(cp.output_tensors().len());
        for (index, tensor) in cp.output_tensors().iter().enumerate() {
            match tensor.bind(&cp, index) {
                Ok(previous) => bound.push((tensor, previous)),
                Err(err) => {
                    for (tensor, previous) in bound.into_iter().rev() {
                        tensor.restore(&cp, previous);
                    }
                    return Err(err);
                }
            }
        }
        schedule.register(&cp, cp.name());

        debug!(
            computation = %cp.name(),
            kind = "NestLoop",
            inputs = cp.input_tensors().len(),
            outputs = cp.output_tensors().len(),
            "constructed computation"
        );
        Ok(cp)
    }
}

/// Builds a nest-loop computation with reduction iters.
///
/// # Errors
///
/// See [`NestLoop::make`].
pub fn nest_loop_computation_with_reduce<S: Schedule + ?Sized>(
    schedule: &mut S,
    name: impl Into<String>,
    root_iters: Vec<Iter>,
    reduce_iters: Vec<Iter>,
    body: Vec<Stmt>,
) -> IrResult<Computation> {
    NestLoop::make(schedule, name, root_iters, reduce_iters, body)
}

/// Builds a nest-loop computation without reduction iters.
///
/// # Errors
///
/// See [`NestLoop::make`].
pub fn nest_loop_computation<S: Schedule + ?Sized>(
    schedule: &mut S,
    name: impl Into<String>,
    root_iters: Vec<Iter>,
    body: Vec<Stmt>,
) -> IrResult<Computation> {
    NestLoop::make(schedule, name, root_iters, Vec::new(), body)
}
