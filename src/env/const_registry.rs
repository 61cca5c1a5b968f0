//! Constant registry with lexical lookup

use super::constant::{ClassOrModule, ConstKind, ConstVariable, Constant};
use crate::graph::{FileId, VertexId};
use crate::types::Type;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct ConstRegistry {
    by_name: HashMap<String, Constant>,
    names_by_path: HashMap<String, Vec<String>>,
}

impl ConstRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Find or create a class/module and record `path` as a declaring file
    pub fn create_class_or_module(&mut self, fqname: &str, kind: ConstKind, path: &str) {
        let constant = self
            .by_name
            .entry(fqname.to_string())
            .or_insert_with(|| Constant::ClassOrModule(ClassOrModule::new(fqname, kind)));
        constant.add_path(path);
        self.record_path(path, fqname);
    }

    /// Find or create a constant variable
    ///
    /// Every assignment is kept; the latest one still analyzed is the value.
    pub fn create_variable(
        &mut self,
        fqname: &str,
        path: &str,
        value: Option<VertexId>,
        declared_type: Option<Type>,
    ) {
        let constant = self.by_name.entry(fqname.to_string()).or_insert_with(|| {
            Constant::Variable(ConstVariable {
                name: fqname.to_string(),
                paths: Vec::new(),
                values: Vec::new(),
                declared_type: None,
            })
        });
        if let Constant::Variable(variable) = constant {
            if let Some(value) = value {
                variable.values.push(value);
            }
            if declared_type.is_some() {
                variable.declared_type = declared_type;
            }
        }
        constant.add_path(path);
        self.record_path(path, fqname);
    }

    fn record_path(&mut self, path: &str, fqname: &str) {
        let names = self.names_by_path.entry(path.to_string()).or_default();
        if !names.iter().any(|n| n == fqname) {
            names.push(fqname.to_string());
        }
    }

    pub fn find(&self, fqname: &str) -> Option<&Constant> {
        self.by_name.get(fqname)
    }

    pub fn find_mut(&mut self, fqname: &str) -> Option<&mut Constant> {
        self.by_name.get_mut(fqname)
    }

    pub fn find_class_or_module(&self, fqname: &str) -> Option<&ClassOrModule> {
        self.find(fqname).and_then(Constant::as_class_or_module)
    }

    /// Resolve `name` as written inside `scope`
    ///
    /// Tries `scope::name`, then each shorter prefix of `scope`, then the
    /// bare name. An empty scope is the top level.
    pub fn lookup(&self, scope: &str, name: &str) -> Option<&Constant> {
        self.resolve_name(scope, name)
            .and_then(|fqname| self.by_name.get(&fqname))
    }

    /// Fully-qualified name `lookup` would resolve to
    pub fn resolve_name(&self, scope: &str, name: &str) -> Option<String> {
        if let Some(absolute) = name.strip_prefix("::") {
            return self
                .by_name
                .contains_key(absolute)
                .then(|| absolute.to_string());
        }

        if !scope.is_empty() {
            let tokens: Vec<&str> = scope.split("::").collect();
            for i in (1..=tokens.len()).rev() {
                let candidate = format!("{}::{}", tokens[..i].join("::"), name);
                if self.by_name.contains_key(&candidate) {
                    return Some(candidate);
                }
            }
        }

        self.by_name
            .contains_key(name)
            .then(|| name.to_string())
    }

    /// Drop `path` from every constant it declared and purge vertices of `file`
    ///
    /// Constants left without a declaring path are deleted.
    pub fn remove_by_path(&mut self, path: &str, file: Option<FileId>) {
        if let Some(names) = self.names_by_path.remove(path) {
            for name in names {
                let dangling = match self.by_name.get_mut(&name) {
                    Some(constant) => {
                        constant.remove_path(path);
                        constant.is_dangling()
                    }
                    None => false,
                };
                if dangling {
                    self.by_name.remove(&name);
                }
            }
        }

        if let Some(file) = file {
            for constant in self.by_name.values_mut() {
                constant.remove_file_refs(file);
            }
        }
    }

    /// Sorted constant names
    pub fn all_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.by_name.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_walks_scope_prefixes() {
        let mut registry = ConstRegistry::new();
        registry.create_class_or_module("A", ConstKind::Module, "a.rb");
        registry.create_class_or_module("A::B", ConstKind::Class, "a.rb");
        registry.create_class_or_module("A::B::C", ConstKind::Class, "a.rb");
        registry.create_class_or_module("D", ConstKind::Class, "d.rb");

        assert_eq!(registry.lookup("A::B", "C").map(|c| c.name()), Some("A::B::C"));
        assert_eq!(registry.lookup("A::B::C", "B").map(|c| c.name()), Some("A::B"));
        assert_eq!(registry.lookup("A::B", "D").map(|c| c.name()), Some("D"));
        assert_eq!(registry.lookup("", "A").map(|c| c.name()), Some("A"));
        assert_eq!(registry.lookup("", "C").map(|c| c.name()), None);
        assert_eq!(registry.lookup("A::B", "::D").map(|c| c.name()), Some("D"));
    }

    #[test]
    fn test_remove_by_path_keeps_reopened_constant() {
        let mut registry = ConstRegistry::new();
        registry.create_class_or_module("Foo", ConstKind::Class, "a.rb");
        registry.create_class_or_module("Foo", ConstKind::Class, "b.rb");
        registry.create_class_or_module("Bar", ConstKind::Class, "a.rb");

        registry.remove_by_path("a.rb", None);
        assert!(registry.find("Foo").is_some());
        assert!(registry.find("Bar").is_none());
        assert_eq!(registry.find("Foo").unwrap().paths(), ["b.rb".to_string()]);
    }

    #[test]
    fn test_rename_invalidation() {
        let mut registry = ConstRegistry::new();
        registry.create_class_or_module("A", ConstKind::Class, "x.rb");
        registry.remove_by_path("x.rb", None);
        registry.create_class_or_module("B", ConstKind::Class, "x.rb");

        assert!(registry.lookup("", "A").is_none());
        assert!(registry.lookup("", "B").is_some());
    }

    #[test]
    fn test_variable_keeps_declared_type() {
        let mut registry = ConstRegistry::new();
        registry.create_variable("VERSION", "<stdlib>", None, Some(Type::string()));
        match registry.find("VERSION") {
            Some(Constant::Variable(v)) => assert_eq!(v.declared_type, Some(Type::string())),
            other => panic!("unexpected constant: {:?}", other),
        }
    }
}
