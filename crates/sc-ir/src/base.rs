//! Call targets that live outside this crate.
//!
//! A `Call` either reads an element of a tensor or invokes a function.
//! Tensors and computations are defined downstream (`sc-compute`), so the
//! IR only sees them through the object-safe [`TensorBaseNode`] and
//! [`FunctionNode`] traits. Both can be turned back into their concrete
//! handle with `downcast`.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};
use crate::handle::Ref;

/// A tensor as seen by the expression IR.
pub trait TensorBaseNode: fmt::Debug + Send + Sync + 'static {
    /// The tensor name.
    fn name(&self) -> &str;

    /// Converts the shared node into an `Any` for downcasting.
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

/// Type-erased handle to a tensor node.
pub type TensorBase = Ref<dyn TensorBaseNode>;

impl Ref<dyn TensorBaseNode> {
    /// Recovers the concrete node handle.
    #[must_use]
    pub fn downcast<T: TensorBaseNode>(&self) -> Option<Ref<T>> {
        Arc::clone(self.as_arc())
            .into_any()
            .downcast::<T>()
            .ok()
            .map(Ref::from_arc)
    }
}

/// What a function target is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FunctionKind {
    /// A function defined outside the graph (e.g. a math library call).
    Extern,
    /// A placeholder computation.
    PlaceHolder,
    /// An allocation computation.
    Allocate,
    /// A nested-loop computation.
    NestLoop,
}

/// A callable as seen by the expression IR.
pub trait FunctionNode: fmt::Debug + Send + Sync + 'static {
    /// The function name.
    fn name(&self) -> &str;

    /// The function kind.
    fn function_kind(&self) -> FunctionKind;

    /// Converts the shared node into an `Any` for downcasting.
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

/// Type-erased handle to a function node.
pub type Function = Ref<dyn FunctionNode>;

impl Ref<dyn FunctionNode> {
    /// Recovers the concrete node handle.
    #[must_use]
    pub fn downcast<T: FunctionNode>(&self) -> Option<Ref<T>> {
        Arc::clone(self.as_arc())
            .into_any()
            .downcast::<T>()
            .ok()
            .map(Ref::from_arc)
    }
}

/// A named function with no body in the graph.
#[derive(Debug)]
pub struct ExternFunction {
    name: String,
}

impl ExternFunction {
    /// Creates an extern function target.
    ///
    /// # Errors
    ///
    /// Fails if `name` is empty.
    pub fn make(name: impl Into<String>) -> IrResult<Function> {
        let name = name.into();
        if name.is_empty() {
            return Err(IrError::EmptyName {
                op: "ExternFunction",
            });
        }
        let node: Arc<dyn FunctionNode> = Arc::new(Self { name });
        Ok(Ref::from_arc(node))
    }
}

impl FunctionNode for ExternFunction {
    fn name(&self) -> &str {
        &self.name
    }

    fn function_kind(&self) -> FunctionKind {
        FunctionKind::Extern
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}
