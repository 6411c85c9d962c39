//! Generic attributed tree and its stack-based builder
//!
//! The tree layer knows nothing about MVNX semantics: it turns a markup
//! event sequence into an arena of attributed nodes and answers structural
//! queries (attributes, child buckets, descendant searches). Everything
//! format-aware sits above it in [`crate::mvnx::schema`] and
//! [`crate::mvnx::frames`].

pub mod builder;
pub mod node;

pub use builder::{build, build_with_allow_list, TreeBuilder};
pub use node::{ChildBuckets, Content, Node, NodeId, StructuralError, Tree};
