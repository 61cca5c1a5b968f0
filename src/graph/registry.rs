//! Vertex arena keyed by syntax position
//!
//! Edges are stored as ids on both ends, so cycles in the graph need no
//! special ownership handling.

use super::vertex::{FileId, TypeVertex, VertexId};
use crate::types::Type;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Default)]
pub struct TypeVertexRegistry {
    vertices: HashMap<VertexId, TypeVertex>,
    /// Vertex ids per file in creation order
    by_file: BTreeMap<FileId, Vec<VertexId>>,
    calls_by_file: BTreeMap<FileId, Vec<VertexId>>,
}

impl TypeVertexRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a vertex unless one already exists for its syntax position
    ///
    /// Returns the id either way.
    pub fn insert(&mut self, vertex: TypeVertex) -> VertexId {
        let id = vertex.id;
        if self.vertices.contains_key(&id) {
            return id;
        }

        self.by_file.entry(id.file).or_default().push(id);
        if vertex.is_call() {
            self.calls_by_file.entry(id.file).or_default().push(id);
        }
        self.vertices.insert(id, vertex);
        id
    }

    pub fn get(&self, id: VertexId) -> Option<&TypeVertex> {
        self.vertices.get(&id)
    }

    pub fn get_mut(&mut self, id: VertexId) -> Option<&mut TypeVertex> {
        self.vertices.get_mut(&id)
    }

    pub fn contains(&self, id: VertexId) -> bool {
        self.vertices.contains_key(&id)
    }

    /// Make `vertex` read from `dependency`, recording the reverse link too
    pub fn add_dependency(&mut self, vertex: VertexId, dependency: VertexId) {
        if let Some(vtx) = self.vertices.get_mut(&vertex) {
            if !vtx.dependencies.contains(&dependency) {
                vtx.dependencies.push(dependency);
            }
        }
        if let Some(dep) = self.vertices.get_mut(&dependency) {
            if !dep.dependents.contains(&vertex) {
                dep.dependents.push(vertex);
            }
        }
    }

    /// Store an inference result; `memo_pass` marks it reusable in that pass
    pub fn set_inferred_type(&mut self, id: VertexId, ty: Type, memo_pass: Option<u64>) {
        if let Some(vtx) = self.vertices.get_mut(&id) {
            vtx.inferred_type = ty;
            vtx.memo_pass = memo_pass;
        }
    }

    pub fn ids_of_file(&self, file: FileId) -> &[VertexId] {
        self.by_file.get(&file).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every call vertex, grouped by file in file-id order
    pub fn call_ids(&self) -> Vec<VertexId> {
        self.calls_by_file.values().flatten().copied().collect()
    }

    /// Drop every vertex built for `file`, returning how many were removed
    pub fn remove_file(&mut self, file: FileId) -> usize {
        self.calls_by_file.remove(&file);
        let Some(ids) = self.by_file.remove(&file) else {
            return 0;
        };
        for id in &ids {
            self.vertices.remove(id);
        }
        ids.len()
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{CallVertex, VertexKind};
    use crate::syntax::NodeId;

    fn id(file: u32, node: u32) -> VertexId {
        VertexId::new(FileId(file), NodeId(node))
    }

    fn call(vid: VertexId) -> TypeVertex {
        TypeVertex::new(
            vid,
            "foo",
            VertexKind::Call(CallVertex {
                receiver: None,
                arguments: vec![],
                method_name: "foo".to_string(),
                scope: String::new(),
                self_type: "Object".to_string(),
                fast_receiver_type: None,
            }),
        )
    }

    #[test]
    fn test_insert_is_idempotent_per_position() {
        let mut registry = TypeVertexRegistry::new();
        registry.insert(TypeVertex::new(id(0, 1), "x", VertexKind::LvarWrite));
        registry.insert(TypeVertex::new(id(0, 1), "y", VertexKind::LvarRead));

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(id(0, 1)).map(|v| v.name.as_str()), Some("x"));
    }

    #[test]
    fn test_add_dependency_links_both_ends() {
        let mut registry = TypeVertexRegistry::new();
        let write = registry.insert(TypeVertex::new(id(0, 1), "x", VertexKind::LvarWrite));
        let read = registry.insert(TypeVertex::new(id(0, 2), "x", VertexKind::LvarRead));
        registry.add_dependency(read, write);
        registry.add_dependency(read, write);

        assert_eq!(registry.get(read).unwrap().dependencies.as_slice(), [write]);
        assert_eq!(registry.get(write).unwrap().dependents.as_slice(), [read]);
    }

    #[test]
    fn test_remove_file_keeps_other_files() {
        let mut registry = TypeVertexRegistry::new();
        registry.insert(call(id(0, 1)));
        registry.insert(TypeVertex::new(id(0, 2), "x", VertexKind::LvarWrite));
        registry.insert(call(id(1, 1)));

        assert_eq!(registry.call_ids(), vec![id(0, 1), id(1, 1)]);
        assert_eq!(registry.remove_file(FileId(0)), 2);
        assert_eq!(registry.call_ids(), vec![id(1, 1)]);
        assert!(registry.ids_of_file(FileId(0)).is_empty());
        assert!(registry.contains(id(1, 1)));
    }
}
