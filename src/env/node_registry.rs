//! Syntax position -> vertex or method, for hover

use super::method::MethodKey;
use crate::graph::{FileId, VertexId};
use crate::syntax::NodeId;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeEntry {
    Vertex(VertexId),
    Method(MethodKey),
}

#[derive(Debug, Default)]
pub struct NodeRegistry {
    by_file: HashMap<FileId, HashMap<NodeId, NodeEntry>>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, file: FileId, node: NodeId, entry: NodeEntry) {
        self.by_file.entry(file).or_default().insert(node, entry);
    }

    pub fn find(&self, file: FileId, node: NodeId) -> Option<&NodeEntry> {
        self.by_file.get(&file).and_then(|nodes| nodes.get(&node))
    }

    pub fn remove_file(&mut self, file: FileId) {
        self.by_file.remove(&file);
    }

    pub fn len(&self) -> usize {
        self.by_file.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
