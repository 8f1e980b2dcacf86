//! Type-safe identifier wrappers around [`String`].
//!
//! World objects, routing nodes and regions are all named by opaque strings
//! handed out by the world. Wrapping them prevents accidentally passing a
//! region name where a node id is expected. A node id is always the id of
//! the world object the node was built from.

use serde::{Deserialize, Serialize};

/// Generates a newtype wrapper around [`String`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Create an identifier from anything string-like.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }
    };
}

define_id! {
    /// Identifier of an object in the world (resource, structure, unit).
    ObjectId
}

define_id! {
    /// Identifier of a routing node. Equal to the id of its world object.
    NodeId
}

define_id! {
    /// Identifier of a region, the coarse spatial partition of the world.
    RegionId
}

impl From<ObjectId> for NodeId {
    fn from(id: ObjectId) -> Self {
        Self(id.0)
    }
}

impl From<&ObjectId> for NodeId {
    fn from(id: &ObjectId) -> Self {
        Self(id.0.clone())
    }
}

impl From<&NodeId> for ObjectId {
    fn from(id: &NodeId) -> Self {
        Self(id.0.clone())
    }
}
