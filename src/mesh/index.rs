//! Index types for mesh elements.
//!
//! Mesh elements reference particles by their stable [`Tag`], never by the
//! volatile array index, which can change whenever the particle store is
//! reordered. Triangles, bonds and mesh types have their own id wrappers so
//! they cannot be mixed up.

use std::fmt::{self, Debug};

use serde::{Deserialize, Serialize};

/// A stable particle tag.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Tag(u32);

/// A type-safe triangle index.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct TriangleId(u32);

/// A mesh type id, shared by triangles and bonds.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct TypeId(u32);

macro_rules! impl_index_type {
    ($name:ident, $display:literal) => {
        impl $name {
            /// Create a new id from a raw index.
            #[inline]
            pub fn new(index: usize) -> Self {
                debug_assert!(index < u32::MAX as usize, "index {} too large", index);
                Self(index as u32)
            }

            /// Get the index as `usize`.
            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }

            /// Get the raw value.
            #[inline]
            pub fn raw(self) -> u32 {
                self.0
            }
        }

        impl Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", $display, self.0)
            }
        }

        impl From<usize> for $name {
            fn from(v: usize) -> Self {
                Self::new(v)
            }
        }

        impl From<u32> for $name {
            fn from(v: u32) -> Self {
                Self(v)
            }
        }
    };
}

impl_index_type!(Tag, "Tag");
impl_index_type!(TriangleId, "T");
impl_index_type!(TypeId, "Type");

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids() {
        let t = Tag::new(42);
        assert_eq!(t.index(), 42);
        assert_eq!(t.raw(), 42);
        assert_eq!(Tag::from(42u32), t);
    }

    #[test]
    fn test_debug_format() {
        assert_eq!(format!("{:?}", Tag::new(7)), "Tag(7)");
        assert_eq!(format!("{:?}", TriangleId::new(3)), "T(3)");
        assert_eq!(format!("{:?}", TypeId::new(1)), "Type(1)");
    }
}
