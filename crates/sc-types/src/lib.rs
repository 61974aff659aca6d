//! # SC Types
//!
//! Element type descriptors shared by every layer of the SC tensor IR.
//!
//! ## Overview
//!
//! A [`DataType`] describes one element of an expression value: its kind
//! (boolean, signed/unsigned integer, float, opaque handle), its bit width
//! and its lane count. Scalars have one lane; SIMD vectors have more.
//!
//! The IR factories only rely on a handful of queries:
//!
//! | Query | Used by |
//! |-------|---------|
//! | [`DataType::defined`] | `Variable`, `Call` |
//! | [`DataType::is_bool`] | `And`, `Or`, `Not`, conditions |
//! | [`DataType::is_scalar`] | `For` bounds |
//! | [`DataType::length`] | `Cast` |
//!
//! Equality is structural: two types are equal when kind, bits and lanes
//! all agree.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

use std::fmt;

use serde::{Deserialize, Serialize};

/// The kind of an element type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeKind {
    /// No value. The only undefined kind.
    Void,
    /// Boolean.
    Bool,
    /// Signed integer.
    Int,
    /// Unsigned integer.
    UInt,
    /// IEEE floating point.
    Float,
    /// Opaque pointer-sized handle.
    Handle,
}

/// A scalar or vector element type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DataType {
    kind: TypeKind,
    bits: u8,
    lanes: u16,
}

impl DataType {
    /// The undefined type.
    pub const VOID: Self = Self::new(TypeKind::Void, 0, 0);

    /// Scalar boolean.
    pub const BOOL: Self = Self::bool();

    /// 32-bit signed integer scalar.
    pub const I32: Self = Self::int(32);

    /// 64-bit signed integer scalar.
    pub const I64: Self = Self::int(64);

    /// 32-bit float scalar.
    pub const F32: Self = Self::float(32);

    /// 64-bit float scalar.
    pub const F64: Self = Self::float(64);

    /// Creates a type from its parts.
    #[must_use]
    pub const fn new(kind: TypeKind, bits: u8, lanes: u16) -> Self {
        Self { kind, bits, lanes }
    }

    /// Scalar boolean type.
    #[must_use]
    pub const fn bool() -> Self {
        Self::new(TypeKind::Bool, 1, 1)
    }

    /// Scalar signed integer with the given width.
    #[must_use]
    pub const fn int(bits: u8) -> Self {
        Self::new(TypeKind::Int, bits, 1)
    }

    /// Scalar unsigned integer with the given width.
    #[must_use]
    pub const fn uint(bits: u8) -> Self {
        Self::new(TypeKind::UInt, bits, 1)
    }

    /// Scalar float with the given width.
    #[must_use]
    pub const fn float(bits: u8) -> Self {
        Self::new(TypeKind::Float, bits, 1)
    }

    /// Opaque 64-bit handle.
    #[must_use]
    pub const fn handle() -> Self {
        Self::new(TypeKind::Handle, 64, 1)
    }

    /// Returns the same element type with a different lane count.
    #[must_use]
    pub const fn with_lanes(self, lanes: u16) -> Self {
        Self::new(self.kind, self.bits, lanes)
    }

    /// Returns the single-lane element type.
    #[must_use]
    pub const fn element_of(self) -> Self {
        self.with_lanes(1)
    }

    /// Returns the kind.
    #[must_use]
    pub const fn kind(self) -> TypeKind {
        self.kind
    }

    /// Returns the bit width of one lane.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.bits
    }

    /// Returns the lane count.
    #[must_use]
    pub const fn length(self) -> u16 {
        self.lanes
    }

    /// Returns true unless this is [`DataType::VOID`].
    #[must_use]
    pub const fn defined(self) -> bool {
        !matches!(self.kind, TypeKind::Void)
    }

    /// Returns true for boolean types of any lane count.
    #[must_use]
    pub const fn is_bool(self) -> bool {
        matches!(self.kind, TypeKind::Bool)
    }

    /// Returns true for single-lane defined types.
    #[must_use]
    pub const fn is_scalar(self) -> bool {
        self.defined() && self.lanes == 1
    }

    /// Returns true for multi-lane types.
    #[must_use]
    pub const fn is_vector(self) -> bool {
        self.lanes > 1
    }

    /// Returns true for signed integers.
    #[must_use]
    pub const fn is_int(self) -> bool {
        matches!(self.kind, TypeKind::Int)
    }

    /// Returns true for unsigned integers.
    #[must_use]
    pub const fn is_uint(self) -> bool {
        matches!(self.kind, TypeKind::UInt)
    }

    /// Returns true for floats.
    #[must_use]
    pub const fn is_float(self) -> bool {
        matches!(self.kind, TypeKind::Float)
    }

    /// Size in bytes of the whole value, lanes included.
    #[must_use]
    pub const fn size_bytes(self) -> usize {
        (self.bits as usize).div_ceil(8) * self.lanes as usize
    }
}

impl Default for DataType {
    fn default() -> Self {
        Self::VOID
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TypeKind::Void => return write!(f, "void"),
            TypeKind::Bool => write!(f, "bool")?,
            TypeKind::Int => write!(f, "int{}", self.bits)?,
            TypeKind::UInt => write!(f, "uint{}", self.bits)?,
            TypeKind::Float => write!(f, "float{}", self.bits)?,
            TypeKind::Handle => write!(f, "handle")?,
        }
        if self.lanes > 1 {
            write!(f, "x{}", self.lanes)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predicates() {
        assert!(DataType::BOOL.is_bool());
        assert!(DataType::BOOL.is_scalar());
        assert!(DataType::bool().with_lanes(4).is_bool());
        assert!(!DataType::bool().with_lanes(4).is_scalar());
        assert!(!DataType::I32.is_bool());
        assert!(!DataType::VOID.defined());
        assert!(!DataType::VOID.is_scalar());
        assert!(DataType::F32.defined());
    }

    #[test]
    fn test_structural_equality() {
        assert_eq!(DataType::int(32), DataType::I32);
        assert_ne!(DataType::I32, DataType::I64);
        assert_ne!(DataType::I32, DataType::I32.with_lanes(4));
        assert_eq!(DataType::F32.with_lanes(8).element_of(), DataType::F32);
    }

    #[test]
    fn test_length_and_size() {
        assert_eq!(DataType::F32.length(), 1);
        assert_eq!(DataType::F32.with_lanes(4).length(), 4);
        assert_eq!(DataType::F32.with_lanes(4).size_bytes(), 16);
        assert_eq!(DataType::BOOL.size_bytes(), 1);
    }

    #[test]
    fn test_display() {
        assert_eq!(DataType::I32.to_string(), "int32");
        assert_eq!(DataType::F32.with_lanes(4).to_string(), "float32x4");
        assert_eq!(DataType::VOID.to_string(), "void");
        assert_eq!(DataType::BOOL.to_string(), "bool");
    }
}
