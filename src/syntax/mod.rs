//! Syntax front-end: an owned, analyzer-friendly view of a prism parse

pub mod position;
pub mod tree;

pub use position::node_at;
pub use tree::{ConstPath, NodeId, NodeKind, Span, SyntaxNode, SyntaxTree};
