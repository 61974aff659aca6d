//! Symbolic tensors.
//!
//! A [`Tensor`] is a named, typed, shaped array that exists only as a
//! handle in the graph. Indexing it with [`Tensor::at`] yields a
//! `TensorAccess` call expression that can be read from or stored to.
//!
//! ## Producers
//!
//! Each tensor remembers the computation that writes it and at which
//! output position. The link is a [`WeakRef`] so that a computation owning
//! its output tensors does not form a reference cycle; consumers keep their
//! producers alive instead (see [`ComputationNode::upstream`]).
//!
//! - placeholders create their output already bound;
//! - allocations create their output bound to the allocation, which only
//!   reserves storage. The first nest-loop computation storing to it takes
//!   the tensor over, and the allocation stays reachable through
//!   [`Tensor::allocation`];
//! - [`Tensor::declare`] creates an unbound tensor, which the first
//!   nest-loop computation storing to it binds.
//!
//! Binding a tensor that already has a different producer fails with
//! [`IrError::AlreadyProduced`]. A dropped nest-loop producer no longer
//! counts, but a placeholder's output stays read-only.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use sc_ir::{
    Call, CallKind, DataType, Expr, IrError, IrResult, Ref, StructuralEq, TensorBase,
    TensorBaseNode, WeakRef,
};
use smallvec::SmallVec;
use tracing::trace;

use crate::computation::{Computation, ComputationNode};

/// The computation writing a tensor.
#[derive(Clone, Debug)]
pub(crate) struct Producer {
    computation: WeakRef<ComputationNode>,
    name: String,
    index: usize,
}

impl Producer {
    fn new(computation: &Computation, index: usize) -> Self {
        Self {
            computation: computation.downgrade(),
            name: computation.name().to_string(),
            index,
        }
    }
}

/// How a tensor was declared.
#[derive(Debug)]
enum Origin {
    /// By [`Tensor::declare`]; any one computation may produce it.
    Declared,
    /// As a placeholder's output; never written by a nest loop.
    Input,
    /// As an allocation's output; one nest loop may take it over.
    Storage(WeakRef<ComputationNode>),
}

/// Payload of a [`Tensor`].
#[derive(Debug)]
pub struct TensorNode {
    name: String,
    data_type: DataType,
    shape: Vec<Expr>,
    origin: Origin,
    producer: Mutex<Option<Producer>>,
}

impl TensorNode {
    /// Builds a tensor bound to output `source_output_index` of
    /// `source_cp`.
    ///
    /// The index is taken as given; it is not checked against the
    /// computation's outputs.
    ///
    /// # Errors
    ///
    /// Fails if the name is empty, the type is undefined or an extent is
    /// not a scalar integer.
    pub fn make(
        name: impl Into<String>,
        data_type: DataType,
        shape: impl IntoIterator<Item = Expr>,
        source_cp: &Computation,
        source_output_index: usize,
    ) -> IrResult<Tensor> {
        let tensor = Tensor::declare(name, data_type, shape)?;
        tensor.bind(source_cp, source_output_index)?;
        Ok(tensor)
    }
}

impl TensorBaseNode for TensorNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// Handle to a tensor. Compares and hashes by identity.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Tensor(Ref<TensorNode>);

/// Checks the pieces shared by every tensor declaration.
pub(crate) fn check_decl(
    op: &'static str,
    name: &str,
    data_type: DataType,
    shape: &[Expr],
) -> IrResult<()> {
    if name.is_empty() {
        return Err(IrError::EmptyName { op });
    }
    if !data_type.defined() {
        return Err(IrError::UndefinedType { op });
    }
    for extent in shape {
        let ty = extent.ty();
        if !ty.is_scalar() || !(ty.is_int() || ty.is_uint()) {
            return Err(IrError::UnsupportedType { op, ty });
        }
    }
    Ok(())
}

impl Tensor {
    /// Declares an output tensor with no producer yet.
    ///
    /// # Errors
    ///
    /// Fails if the name is empty, the type is undefined or an extent is
    /// not a scalar integer.
    pub fn declare(
        name: impl Into<String>,
        data_type: DataType,
        shape: impl IntoIterator<Item = Expr>,
    ) -> IrResult<Self> {
        let name = name.into();
        let shape: Vec<Expr> = shape.into_iter().collect();
        check_decl("Tensor", &name, data_type, &shape)?;
        Ok(Self(Ref::new(TensorNode {
            name,
            data_type,
            shape,
            origin: Origin::Declared,
            producer: Mutex::new(None),
        })))
    }

    /// Builds the output of a placeholder or allocation that is still under
    /// construction. The declaration must have been checked by the caller.
    /// A `storage` output may later be taken over by a nest loop.
    pub(crate) fn bound(
        name: String,
        data_type: DataType,
        shape: Vec<Expr>,
        computation: &WeakRef<ComputationNode>,
        storage: bool,
    ) -> Self {
        let origin = if storage {
            Origin::Storage(computation.clone())
        } else {
            Origin::Input
        };
        let producer = Producer {
            computation: computation.clone(),
            name: name.clone(),
            index: 0,
        };
        Self(Ref::new(TensorNode {
            name,
            data_type,
            shape,
            origin,
            producer: Mutex::new(Some(producer)),
        }))
    }

    /// Records `computation` as this tensor's producer at output `index`
    /// and returns the producer it replaced.
    ///
    /// Rebinding to the same computation is a no-op. The allocation that
    /// reserved the tensor may be replaced, and so may a dropped producer
    /// unless the tensor is a placeholder's output.
    pub(crate) fn bind(
        &self,
        computation: &Computation,
        index: usize,
    ) -> IrResult<Option<Producer>> {
        let mut slot = self.0.producer.lock();
        if let Some(current) = slot.as_ref() {
            if current.computation.points_to(computation.handle()) {
                return Ok(Some(current.clone()));
            }
            let replaceable = match &self.0.origin {
                Origin::Input => false,
                Origin::Storage(alloc) if alloc.ptr_eq(&current.computation) => true,
                Origin::Declared | Origin::Storage(_) => current.computation.upgrade().is_none(),
            };
            if !replaceable {
                return Err(IrError::AlreadyProduced {
                    tensor: self.name().to_string(),
                    producer: current.name.clone(),
                });
            }
        }
        trace!(tensor = %self.name(), computation = %computation.name(), index, "bound output");
        Ok(slot.replace(Producer::new(computation, index)))
    }

    /// Undoes [`Tensor::bind`] if `computation` is still the producer.
    pub(crate) fn restore(&self, computation: &Computation, previous: Option<Producer>) {
        let mut slot = self.0.producer.lock();
        if slot
            .as_ref()
            .is_some_and(|p| p.computation.points_to(computation.handle()))
        {
            *slot = previous;
        }
    }

    fn live_producer(&self) -> Option<(Computation, usize)> {
        let slot = self.0.producer.lock();
        let producer = slot.as_ref()?;
        let node = producer.computation.upgrade()?;
        Some((Computation::from_ref(node), producer.index))
    }

    /// Recovers a tensor from a call target.
    #[must_use]
    pub fn from_base(base: &TensorBase) -> Option<Self> {
        base.downcast::<TensorNode>().map(Self)
    }

    /// The tensor as a call target.
    #[must_use]
    pub fn as_base(&self) -> TensorBase {
        let node: Arc<dyn TensorBaseNode> = Arc::<TensorNode>::clone(self.0.as_arc());
        Ref::from_arc(node)
    }

    /// The name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// The element type.
    #[must_use]
    pub fn data_type(&self) -> DataType {
        self.0.data_type
    }

    /// The extent of each dimension.
    #[must_use]
    pub fn shape(&self) -> &[Expr] {
        &self.0.shape
    }

    /// The rank.
    #[must_use]
    pub fn ndim(&self) -> usize {
        self.0.shape.len()
    }

    /// The producing computation, if bound and still alive.
    #[must_use]
    pub fn source_cp(&self) -> Option<Computation> {
        self.live_producer().map(|(cp, _)| cp)
    }

    /// The output position in the producing computation, if bound and
    /// still alive.
    #[must_use]
    pub fn source_output_index(&self) -> Option<usize> {
        self.live_producer().map(|(_, index)| index)
    }

    /// Returns true while the tensor has a live producer.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.live_producer().is_some()
    }

    /// The allocation that reserved this tensor's storage, if any.
    #[must_use]
    pub fn allocation(&self) -> Option<Computation> {
        match &self.0.origin {
            Origin::Storage(alloc) => alloc.upgrade().map(Computation::from_ref),
            Origin::Declared | Origin::Input => None,
        }
    }

    /// Identity key of the node.
    #[must_use]
    pub fn addr(&self) -> usize {
        self.0.addr()
    }

    /// Element access `name[indices...]`.
    ///
    /// # Errors
    ///
    /// Fails with [`IrError::RankMismatch`] unless exactly [`Tensor::ndim`]
    /// indices are given.
    pub fn at(&self, indices: impl IntoIterator<Item = Expr>) -> IrResult<Expr> {
        let indices: SmallVec<[Expr; 4]> = indices.into_iter().collect();
        if indices.len() != self.ndim() {
            return Err(IrError::RankMismatch {
                tensor: self.name().to_string(),
                expected: self.ndim(),
                got: indices.len(),
            });
        }
        Call::make(
            self.data_type(),
            CallKind::TensorAccess,
            self.name(),
            indices,
            self.as_base(),
        )
    }

    /// Starts an access one index at a time: `t.slice(i).index(j).access()`.
    #[must_use]
    pub fn slice(&self, index: Expr) -> TensorSlice<'_> {
        TensorSlice {
            tensor: self,
            indices: SmallVec::from_iter([index]),
        }
    }
}

impl fmt::Debug for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl fmt::Display for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[", self.name())?;
        for (k, extent) in self.shape().iter().enumerate() {
            if k > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{extent}")?;
        }
        write!(f, "]: {}", self.data_type())
    }
}

impl StructuralEq for Tensor {
    fn structural_eq(&self, other: &Self) -> bool {
        self.name() == other.name()
            && self.data_type() == other.data_type()
            && self.shape().structural_eq(other.shape())
    }
}

/// A partial index list into a tensor.
#[derive(Clone, Debug)]
#[must_use]
pub struct TensorSlice<'a> {
    tensor: &'a Tensor,
    indices: SmallVec<[Expr; 4]>,
}

impl TensorSlice<'_> {
    /// Appends the next index.
    pub fn index(mut self, index: Expr) -> Self {
        self.indices.push(index);
        self
    }

    /// Builds the access.
    ///
    /// # Errors
    ///
    /// See [`Tensor::at`].
    pub fn access(self) -> IrResult<Expr> {
        self.tensor.at(self.indices)
    }
}
