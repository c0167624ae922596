//! Scoped name resolution - same-file only.
//!
//! Adapters record a scope tree (frames + bindings) and pending name uses
//! while they walk; the resolver then turns those into structure edges,
//! searching frames innermost-to-outermost. Names with no candidate in the
//! file become dangling placeholders for the external cross-file linker.

pub mod resolver;
pub mod tree;

pub use resolver::{override_edges, resolve};
pub use tree::{Binding, ScopeId, ScopeKind, ScopeTree};
