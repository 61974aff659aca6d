//! Shared, immutable node handles with identity semantics.
//!
//! Every IR entity (expressions, statements, iteration variables,
//! computations, tensors) is a newtype over [`Ref`]. A `Ref` owns its node
//! through an [`Arc`]: cloning the handle shares the node, and the node is
//! dropped together with the last handle.
//!
//! Equality and hashing look at the node's address only. Two handles are
//! equal iff they point at the same allocation; structurally identical
//! nodes built by separate factory calls are *not* equal. Structural
//! comparison lives in [`crate::equal`].

use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::{Arc, Weak};

/// A counted, immutable, identity-compared handle to a node.
pub struct Ref<T: ?Sized>(Arc<T>);

impl<T> Ref<T> {
    /// Allocates a node and returns the first handle to it.
    #[must_use]
    pub fn new(node: T) -> Self {
        Self(Arc::new(node))
    }

    /// Allocates a node that needs a non-owning reference to itself while
    /// it is being built.
    ///
    /// The weak handle passed to `build` cannot be upgraded until `build`
    /// returns.
    #[must_use]
    pub fn new_cyclic<F>(build: F) -> Self
    where
        F: FnOnce(&WeakRef<T>) -> T,
    {
        Self(Arc::new_cyclic(|weak| build(&WeakRef(weak.clone()))))
    }
}

impl<T: ?Sized> Ref<T> {
    /// Wraps an existing `Arc`. Used to view a concrete node through a
    /// trait-object handle.
    #[must_use]
    pub fn from_arc(arc: Arc<T>) -> Self {
        Self(arc)
    }

    /// Returns the underlying `Arc`.
    #[must_use]
    pub fn as_arc(&self) -> &Arc<T> {
        &self.0
    }

    /// Returns the node address, the identity key of this handle.
    #[must_use]
    pub fn addr(&self) -> usize {
        Arc::as_ptr(&self.0).cast::<()>() as usize
    }

    /// Returns true if both handles point at the same node.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.addr() == other.addr()
    }

    /// Number of live handles sharing this node.
    #[must_use]
    pub fn strong_count(&self) -> usize {
        Arc::strong_count(&self.0)
    }

    /// Creates a non-owning handle to the same node.
    #[must_use]
    pub fn downgrade(&self) -> WeakRef<T> {
        WeakRef(Arc::downgrade(&self.0))
    }
}

impl<T: ?Sized> Clone for Ref<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T: ?Sized> Deref for Ref<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T: ?Sized> PartialEq for Ref<T> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl<T: ?Sized> Eq for Ref<T> {}

impl<T: ?Sized> Hash for Ref<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.addr().hash(state);
    }
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for Ref<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

/// A non-owning handle. It does not keep the node alive.
pub struct WeakRef<T: ?Sized>(Weak<T>);

impl<T: ?Sized> WeakRef<T> {
    /// Returns a strong handle if the node is still alive.
    #[must_use]
    pub fn upgrade(&self) -> Option<Ref<T>> {
        self.0.upgrade().map(Ref)
    }

    /// Returns true if both weak handles point at the same node.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.0.as_ptr().cast::<()>() == other.0.as_ptr().cast::<()>()
    }

    /// Returns true if this weak handle points at `node`.
    #[must_use]
    pub fn points_to(&self, node: &Ref<T>) -> bool {
        self.0.as_ptr().cast::<()>() as usize == node.addr()
    }
}

impl<T: ?Sized> Clone for WeakRef<T> {
    fn clone(&self) -> Self {
        Self(Weak::clone(&self.0))
    }
}

impl<T: ?Sized> fmt::Debug for WeakRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(weak)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hash::FxHashSet;

    #[derive(Debug, PartialEq)]
    struct Node(u32);

    #[test]
    fn test_identity_equality() {
        let a = Ref::new(Node(1));
        let b = a.clone();
        let c = Ref::new(Node(1));

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(*a, *c);
    }

    #[test]
    fn test_hash_by_identity() {
        let a = Ref::new(Node(7));
        let c = Ref::new(Node(7));

        let mut set = FxHashSet::default();
        set.insert(a.clone());
        set.insert(a.clone());
        set.insert(c);
        assert_eq!(set.len(), 2);
        assert!(set.contains(&a));
    }

    #[test]
    fn test_shared_count() {
        let a = Ref::new(Node(0));
        assert_eq!(a.strong_count(), 1);
        let b = a.clone();
        assert_eq!(a.strong_count(), 2);
        drop(b);
        assert_eq!(a.strong_count(), 1);
    }

    #[test]
    fn test_weak_does_not_own() {
        let a = Ref::new(Node(3));
        let weak = a.downgrade();
        assert!(weak.points_to(&a));
        assert!(weak.upgrade().is_some_and(|r| *r == Node(3)));
        drop(a);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn test_new_cyclic() {
        struct SelfRef {
            me: WeakRef<SelfRef>,
        }

        let node = Ref::new_cyclic(|weak| SelfRef { me: weak.clone() });
        let back = node.me.upgrade();
        assert!(back.is_some_and(|r| r.ptr_eq(&node)));
    }
}
