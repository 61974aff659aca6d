//! Scheduling collaborator.
//!
//! Nest-loop computations announce themselves to a [`Schedule`] once they
//! are fully constructed. [`Registry`] is the in-tree implementation: it
//! keeps every registered computation alive, in registration order, and
//! finds them by name.

use rustc_hash::FxHashMap;
use tracing::trace;

use crate::computation::Computation;

/// Receives newly constructed computations.
pub trait Schedule {
    /// Records `computation` under `name`.
    fn register(&mut self, computation: &Computation, name: &str);
}

/// Ordered set of registered computations.
#[derive(Debug, Default)]
pub struct Registry {
    computations: Vec<Computation>,
    by_name: FxHashMap<String, usize>,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a computation by name. A name registered twice resolves to
    /// the later registration.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Computation> {
        self.by_name.get(name).map(|&i| &self.computations[i])
    }

    /// All computations in registration order.
    #[must_use]
    pub fn computations(&self) -> &[Computation] {
        &self.computations
    }

    /// Number of registrations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.computations.len()
    }

    /// Returns true if nothing has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.computations.is_empty()
    }
}

impl Schedule for Registry {
    fn register(&mut self, computation: &Computation, name: &str) {
        trace!(computation = %name, position = self.computations.len(), "registered");
        self.by_name.insert(name.to_string(), self.computations.len());
        self.computations.push(computation.clone());
    }
}
