//! # SC Compute
//!
//! Tensors and computations for the SC tensor compiler.
//!
//! ## Overview
//!
//! A program is a graph of [`Computation`]s connected by [`Tensor`]s:
//!
//! - a [`PlaceHolder`] stands for an input supplied from outside;
//! - an [`Allocate`] reserves storage;
//! - a [`NestLoop`] computes its outputs with statements run inside a loop
//!   nest.
//!
//! A nest loop's inputs and outputs are not declared; they are discovered
//! from the tensor accesses in its body. Each output tensor then points
//! back at the computation that produces it.
//!
//! ## Example
//!
//! ```
//! use sc_compute::{nest_loop_computation, PlaceHolder, Registry, Tensor};
//! use sc_ir::{mul, DataType, Expr, Iter, Store};
//!
//! let mut registry = Registry::new();
//! let a = PlaceHolder::make("A", [Expr::int(10)], DataType::F32)?;
//! let a = a.output(0).cloned().unwrap();
//! let b = Tensor::declare("B", DataType::F32, [Expr::int(10)])?;
//!
//! let i = Iter::normal("i", Expr::int(10))?;
//! let iv = i.var().as_expr().clone();
//! let body = Store::make(b.at([iv.clone()])?, mul(a.at([iv])?, Expr::float(2.0))?)?;
//! let cp = nest_loop_computation(&mut registry, "B", vec![i], vec![body])?;
//!
//! assert_eq!(cp.input_tensors(), [a]);
//! assert_eq!(cp.output_tensors(), [b]);
//! println!("{}", cp.build_body()?.unwrap());
//! # Ok::<(), sc_ir::IrError>(())
//! ```
//!
//! ## Lowering
//!
//! [`Computation::build_body`] nests one `For` per root iter, then one per
//! reduction iter, around the body. [`LowerConfig`] picks the loop kinds.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod computation;
pub mod discover;
pub mod lower;
pub mod schedule;
pub mod tensor;

pub use computation::{
    nest_loop_computation, nest_loop_computation_with_reduce, Allocate, Computation,
    ComputationKind, ComputationNode, NestLoop, PlaceHolder,
};
pub use lower::LowerConfig;
pub use schedule::{Registry, Schedule};
pub use tensor::{Tensor, TensorNode, TensorSlice};
