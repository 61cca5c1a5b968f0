//! Constant entities: classes, modules and constant variables

use crate::graph::{FileId, VertexId};
use crate::types::Type;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstKind {
    Class,
    Module,
}

/// Ivar name and whether it lives on the class object rather than instances
type IvarKey = (String, bool);

/// A class or module together with the instance variables touched in its body
///
/// Instance-side and class-level (`singleton`) ivars are tracked apart.
#[derive(Debug, Clone)]
pub struct ClassOrModule {
    pub name: String,
    pub kind: ConstKind,
    pub paths: Vec<String>,
    /// Writers per ivar, most recent last
    ivar_writes: HashMap<IvarKey, Vec<VertexId>>,
    ivar_reads: HashMap<IvarKey, Vec<VertexId>>,
}

impl ClassOrModule {
    pub fn new(name: &str, kind: ConstKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            paths: Vec::new(),
            ivar_writes: HashMap::new(),
            ivar_reads: HashMap::new(),
        }
    }

    pub fn add_ivar_write(&mut self, ivar_name: &str, singleton: bool, vertex: VertexId) {
        self.ivar_writes
            .entry((ivar_name.to_string(), singleton))
            .or_default()
            .push(vertex);
    }

    pub fn add_ivar_read(&mut self, ivar_name: &str, singleton: bool, vertex: VertexId) {
        self.ivar_reads
            .entry((ivar_name.to_string(), singleton))
            .or_default()
            .push(vertex);
    }

    /// The writer whose type an `@ivar` read or `attr_reader` reports
    pub fn latest_ivar_writer(&self, ivar_name: &str, singleton: bool) -> Option<VertexId> {
        self.ivar_writes
            .get(&(ivar_name.to_string(), singleton))
            .and_then(|writers| writers.last().copied())
    }

    pub fn ivar_reads(&self, ivar_name: &str, singleton: bool) -> &[VertexId] {
        self.ivar_reads
            .get(&(ivar_name.to_string(), singleton))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn remove_ivar_refs(&mut self, file: FileId) {
        for refs in [&mut self.ivar_writes, &mut self.ivar_reads] {
            refs.values_mut()
                .for_each(|ids| ids.retain(|id| id.file != file));
            refs.retain(|_, ids| !ids.is_empty());
        }
    }
}

/// `FOO = value`, or a constant declared with a type by the stdlib
#[derive(Debug, Clone)]
pub struct ConstVariable {
    pub name: String,
    pub paths: Vec<String>,
    /// Assigned values in assignment order, across all declaring files
    pub values: Vec<VertexId>,
    pub declared_type: Option<Type>,
}

impl ConstVariable {
    /// The most recent assignment still analyzed
    pub fn value(&self) -> Option<VertexId> {
        self.values.last().copied()
    }
}

#[derive(Debug, Clone)]
pub enum Constant {
    ClassOrModule(ClassOrModule),
    Variable(ConstVariable),
}

impl Constant {
    pub fn name(&self) -> &str {
        match self {
            Constant::ClassOrModule(c) => &c.name,
            Constant::Variable(v) => &v.name,
        }
    }

    pub fn paths(&self) -> &[String] {
        match self {
            Constant::ClassOrModule(c) => &c.paths,
            Constant::Variable(v) => &v.paths,
        }
    }

    fn paths_mut(&mut self) -> &mut Vec<String> {
        match self {
            Constant::ClassOrModule(c) => &mut c.paths,
            Constant::Variable(v) => &mut v.paths,
        }
    }

    pub fn add_path(&mut self, path: &str) {
        let paths = self.paths_mut();
        if !paths.iter().any(|p| p == path) {
            paths.push(path.to_string());
        }
    }

    pub fn remove_path(&mut self, path: &str) {
        self.paths_mut().retain(|p| p != path);
    }

    /// No file declares it any more
    pub fn is_dangling(&self) -> bool {
        self.paths().is_empty()
    }

    pub fn as_class_or_module(&self) -> Option<&ClassOrModule> {
        match self {
            Constant::ClassOrModule(c) => Some(c),
            Constant::Variable(_) => None,
        }
    }

    pub fn as_class_or_module_mut(&mut self) -> Option<&mut ClassOrModule> {
        match self {
            Constant::ClassOrModule(c) => Some(c),
            Constant::Variable(_) => None,
        }
    }

    /// Forget vertices of `file`; values built there are dropped as well
    pub(crate) fn remove_file_refs(&mut self, file: FileId) {
        match self {
            Constant::ClassOrModule(c) => c.remove_ivar_refs(file),
            Constant::Variable(v) => v.values.retain(|id| id.file != file),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::NodeId;

    fn vid(file: u32, node: u32) -> VertexId {
        VertexId::new(FileId(file), NodeId(node))
    }

    #[test]
    fn test_latest_ivar_writer_wins() {
        let mut foo = ClassOrModule::new("Foo", ConstKind::Class);
        assert_eq!(foo.latest_ivar_writer("@x", false), None);

        foo.add_ivar_write("@x", false, vid(0, 3));
        foo.add_ivar_write("@x", false, vid(1, 7));
        assert_eq!(foo.latest_ivar_writer("@x", false), Some(vid(1, 7)));

        foo.remove_ivar_refs(FileId(1));
        assert_eq!(foo.latest_ivar_writer("@x", false), Some(vid(0, 3)));
    }

    #[test]
    fn test_class_level_ivars_are_tracked_apart() {
        let mut foo = ClassOrModule::new("Foo", ConstKind::Class);
        foo.add_ivar_write("@x", false, vid(0, 3));
        foo.add_ivar_write("@x", true, vid(0, 9));
        foo.add_ivar_read("@x", true, vid(0, 12));

        assert_eq!(foo.latest_ivar_writer("@x", false), Some(vid(0, 3)));
        assert_eq!(foo.latest_ivar_writer("@x", true), Some(vid(0, 9)));
        assert!(foo.ivar_reads("@x", false).is_empty());
        assert_eq!(foo.ivar_reads("@x", true), [vid(0, 12)]);
    }

    #[test]
    fn test_variable_value_falls_back_to_remaining_file() {
        let mut limit = Constant::Variable(ConstVariable {
            name: "LIMIT".to_string(),
            paths: vec!["a.rb".to_string(), "b.rb".to_string()],
            values: vec![vid(0, 2), vid(1, 4)],
            declared_type: None,
        });

        limit.remove_file_refs(FileId(1));
        match &limit {
            Constant::Variable(v) => assert_eq!(v.value(), Some(vid(0, 2))),
            other => panic!("unexpected constant: {:?}", other),
        }
    }

    #[test]
    fn test_paths_and_dangling() {
        let mut constant = Constant::ClassOrModule(ClassOrModule::new("Foo", ConstKind::Class));
        constant.add_path("a.rb");
        constant.add_path("a.rb");
        constant.add_path("b.rb");
        assert_eq!(constant.paths().len(), 2);

        constant.remove_path("a.rb");
        assert!(!constant.is_dangling());
        constant.remove_path("b.rb");
        assert!(constant.is_dangling());
    }
}
