//! Method objects backing call resolution

use crate::graph::{FileId, VertexId};
use crate::store::Visibility;
use crate::syntax::NodeId;
use crate::types::Type;
use std::collections::HashMap;
use std::fmt;

/// Identity of a method: receiver fqname, name and singleton flag
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MethodKey {
    pub receiver: String,
    pub name: String,
    pub singleton: bool,
}

impl MethodKey {
    pub fn new(receiver: &str, name: &str, singleton: bool) -> Self {
        Self {
            receiver: receiver.to_string(),
            name: name.to_string(),
            singleton,
        }
    }

    /// Type of the object the method is called on
    pub fn receiver_type(&self) -> Type {
        Type::from_receiver(&self.receiver, self.singleton)
    }
}

impl fmt::Display for MethodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let separator = if self.singleton { "." } else { "#" };
        write!(f, "{}{}{}", self.receiver, separator, self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodKind {
    /// `def` with a body in the vertex graph
    Def,
    /// Generated by `attr_reader`/`attr_accessor`, reads `ivar`
    AttrReader { ivar: String },
    /// Generated by `attr_writer`/`attr_accessor`, writes `ivar`
    AttrWriter { ivar: String },
    /// Declared by the stdlib; only declared types are known
    Builtin,
    /// Singleton copy made by `module_function`
    Promoted { from: MethodKey },
}

#[derive(Debug, Clone)]
pub struct MethodEntry {
    pub key: MethodKey,
    pub kind: MethodKind,
    pub visibility: Visibility,
    pub paths: Vec<String>,
    /// Where the latest definition was found
    pub node: Option<(FileId, NodeId)>,
    pub line: usize,
    /// Declared parameter types by parameter name
    pub arg_types: HashMap<String, Type>,
    /// Declared return type
    pub return_type: Option<Type>,
    /// Vertices in tail or `return` position of the body
    pub return_vertices: Vec<VertexId>,
}

impl MethodEntry {
    pub fn new(key: MethodKey, kind: MethodKind, visibility: Visibility) -> Self {
        Self {
            key,
            kind,
            visibility,
            paths: Vec::new(),
            node: None,
            line: 0,
            arg_types: HashMap::new(),
            return_type: None,
            return_vertices: Vec::new(),
        }
    }

    pub fn add_path(&mut self, path: &str) {
        if !self.paths.iter().any(|p| p == path) {
            self.paths.push(path.to_string());
        }
    }

    pub fn remove_path(&mut self, path: &str) {
        self.paths.retain(|p| p != path);
    }

    pub fn is_dangling(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn add_return_vertex(&mut self, vertex: VertexId) {
        if !self.return_vertices.contains(&vertex) {
            self.return_vertices.push(vertex);
        }
    }

    pub(crate) fn remove_file_refs(&mut self, file: FileId) {
        self.return_vertices.retain(|id| id.file != file);
        if self.node.is_some_and(|(f, _)| f == file) {
            self.node = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_key_display() {
        assert_eq!(MethodKey::new("Foo", "bar", false).to_string(), "Foo#bar");
        assert_eq!(MethodKey::new("Foo", "build", true).to_string(), "Foo.build");
    }

    #[test]
    fn test_remove_file_refs() {
        let mut entry = MethodEntry::new(
            MethodKey::new("Foo", "bar", false),
            MethodKind::Def,
            Visibility::Public,
        );
        entry.node = Some((FileId(1), NodeId(4)));
        entry.add_return_vertex(VertexId::new(FileId(0), NodeId(9)));
        entry.add_return_vertex(VertexId::new(FileId(1), NodeId(9)));

        entry.remove_file_refs(FileId(1));
        assert_eq!(entry.return_vertices.len(), 1);
        assert_eq!(entry.node, None);
    }
}
