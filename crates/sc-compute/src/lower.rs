//! Loop-nest lowering.
//!
//! Turns a computation's body and iteration variables into one statement:
//!
//! ```text
//! for (root_0, ..) {            // root iters, outermost first
//!   for (root_1, ..) {
//!     for (reduce_0, ..) {      // reduction iters, last innermost
//!       body
//!     }
//!   }
//! }
//! ```
//!
//! Loop bounds come from each iteration variable's declared range.

use sc_ir::{Block, For, ForType, IrResult, Iter, Stmt};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Configuration for lowering.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LowerConfig {
    /// Execution kind of the loops over root iters.
    pub root_loop: ForType,
    /// Execution kind of the loops over reduction iters.
    pub reduce_loop: ForType,
}

impl LowerConfig {
    /// Parallel outer loops, serial reductions.
    #[must_use]
    pub fn parallel() -> Self {
        Self {
            root_loop: ForType::Parallel,
            reduce_loop: ForType::Serial,
        }
    }
}

/// Wraps `body` in one loop per iter, the first iter outermost.
///
/// # Errors
///
/// Propagates `For` construction failures.
pub fn wrap_loops(body: Stmt, iters: &[Iter], for_type: ForType) -> IrResult<Stmt> {
    iters.iter().rev().try_fold(body, |inner, iter| {
        trace!(iter = %iter.label(), ?for_type, "wrapping loop");
        let range = iter.range();
        For::make(
            for_type,
            iter.var().clone(),
            range.min.clone(),
            range.extent.clone(),
            inner,
        )
    })
}

/// Builds the full loop nest around `body`.
///
/// Returns `None` for an empty body.
///
/// # Errors
///
/// Propagates `For` construction failures.
pub fn nest_loops(
    root_iters: &[Iter],
    reduce_iters: &[Iter],
    body: &[Stmt],
    config: &LowerConfig,
) -> IrResult<Option<Stmt>> {
    let Some(inner) = Block::from_stmts(body.iter().cloned()) else {
        return Ok(None);
    };
    let inner = wrap_loops(inner, reduce_iters, config.reduce_loop)?;
    wrap_loops(inner, root_iters, config.root_loop).map(Some)
}
