//! Method registration and resolution

use super::method::{MethodEntry, MethodKey, MethodKind};
use crate::graph::FileId;
use crate::store::{ReceiverGuesser, SymbolStore, Visibility};
use crate::types::Type;
use std::collections::HashMap;

/// Registry for method definitions
#[derive(Debug, Default)]
pub struct MethodRegistry {
    methods: HashMap<MethodKey, MethodEntry>,
    keys_by_path: HashMap<String, Vec<MethodKey>>,
    /// Method name -> every key declaring it, for duck typing
    keys_by_name: HashMap<String, Vec<MethodKey>>,
}

impl MethodRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Find or create a method and record `path` as a declaring file
    ///
    /// A redefinition takes over kind and visibility of the new declaration.
    pub fn add(
        &mut self,
        key: MethodKey,
        kind: MethodKind,
        visibility: Visibility,
        path: &str,
    ) -> &mut MethodEntry {
        let by_path = self.keys_by_path.entry(path.to_string()).or_default();
        if !by_path.contains(&key) {
            by_path.push(key.clone());
        }
        let by_name = self.keys_by_name.entry(key.name.clone()).or_default();
        if !by_name.contains(&key) {
            by_name.push(key.clone());
        }

        let entry = self
            .methods
            .entry(key.clone())
            .or_insert_with(|| MethodEntry::new(key, kind.clone(), visibility));
        entry.kind = kind;
        entry.visibility = visibility;
        entry.add_path(path);
        entry
    }

    pub fn get(&self, key: &MethodKey) -> Option<&MethodEntry> {
        self.methods.get(key)
    }

    pub fn get_mut(&mut self, key: &MethodKey) -> Option<&mut MethodEntry> {
        self.methods.get_mut(key)
    }

    /// Exact lookup filtered by what the call site may see
    pub fn find(
        &self,
        receiver: &str,
        name: &str,
        singleton: bool,
        allowed: Visibility,
    ) -> Option<&MethodEntry> {
        self.methods
            .get(&MethodKey::new(receiver, name, singleton))
            .filter(|entry| allowed.permits(entry.visibility))
    }

    pub fn change_visibility(&mut self, key: &MethodKey, visibility: Visibility) -> bool {
        match self.methods.get_mut(key) {
            Some(entry) => {
                entry.visibility = visibility;
                true
            }
            None => false,
        }
    }

    /// The only method named `name` in the whole program, if there is one
    pub fn guess_method(&self, name: &str) -> Option<&MethodEntry> {
        match self.keys_by_name.get(name).map(Vec::as_slice) {
            Some([key]) => self.methods.get(key),
            _ => None,
        }
    }

    /// Receiver types declaring a method named `name`, first declaration first
    pub fn declaring_types(&self, name: &str) -> Vec<Type> {
        let mut types: Vec<Type> = Vec::new();
        for key in self.keys_by_name.get(name).into_iter().flatten() {
            let ty = key.receiver_type();
            if !types.contains(&ty) {
                types.push(ty);
            }
        }
        types
    }

    /// Guess the type of a value from the methods sent to it
    ///
    /// Intersects the declaring types of every name. A single survivor wins;
    /// otherwise the respond-to index is asked. When nothing declares a lone
    /// method name the result is a duck type for it, else `any`.
    pub fn guess_receiver_type_by_methods(&self, names: &[String], store: &SymbolStore) -> Type {
        let Some((first, rest)) = names.split_first() else {
            return Type::Any;
        };

        let mut candidates = self.declaring_types(first);
        for name in rest {
            let declaring = self.declaring_types(name);
            candidates.retain(|ty| declaring.contains(ty));
        }

        if let [only] = candidates.as_slice() {
            return only.clone();
        }

        match ReceiverGuesser::guess(store, names) {
            Ok(Type::Any) => {}
            Ok(guessed) => return guessed,
            Err(err) => tracing::debug!("receiver guess failed for {:?}: {}", names, err),
        }

        if candidates.is_empty() && names.len() == 1 {
            Type::Duck(first.clone())
        } else {
            Type::Any
        }
    }

    /// Drop `path` from its methods and purge vertices of `file`
    ///
    /// Methods without a declaring path are deleted.
    pub fn remove_by_path(&mut self, path: &str, file: Option<FileId>) {
        if let Some(keys) = self.keys_by_path.remove(path) {
            for key in keys {
                let dangling = match self.methods.get_mut(&key) {
                    Some(entry) => {
                        entry.remove_path(path);
                        entry.is_dangling()
                    }
                    None => false,
                };
                if dangling {
                    self.methods.remove(&key);
                    if let Some(keys) = self.keys_by_name.get_mut(&key.name) {
                        keys.retain(|k| k != &key);
                        if keys.is_empty() {
                            self.keys_by_name.remove(&key.name);
                        }
                    }
                }
            }
        }

        if let Some(file) = file {
            for entry in self.methods.values_mut() {
                entry.remove_file_refs(file);
            }
        }
    }

    /// Sorted display names, e.g. `Foo#bar`
    pub fn all_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.methods.keys().map(|k| k.to_string()).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn def(registry: &mut MethodRegistry, receiver: &str, name: &str, path: &str) {
        registry.add(
            MethodKey::new(receiver, name, false),
            MethodKind::Def,
            Visibility::Public,
            path,
        );
    }

    #[test]
    fn test_find_filters_visibility() {
        let mut registry = MethodRegistry::new();
        registry.add(
            MethodKey::new("Foo", "secret", false),
            MethodKind::Def,
            Visibility::Private,
            "foo.rb",
        );

        assert!(registry.find("Foo", "secret", false, Visibility::Public).is_none());
        assert!(registry.find("Foo", "secret", false, Visibility::Private).is_some());
        assert!(registry.find("Foo", "secret", true, Visibility::Private).is_none());
    }

    #[test]
    fn test_guess_method_requires_unique_name() {
        let mut registry = MethodRegistry::new();
        def(&mut registry, "Foo", "run", "foo.rb");
        def(&mut registry, "Foo", "name", "foo.rb");
        def(&mut registry, "Bar", "name", "bar.rb");

        assert_eq!(
            registry.guess_method("run").map(|m| m.key.to_string()),
            Some("Foo#run".to_string())
        );
        assert!(registry.guess_method("name").is_none());
        assert!(registry.guess_method("missing").is_none());
    }

    #[test]
    fn test_guess_receiver_type_by_methods() {
        let store = SymbolStore::open_in_memory().unwrap();
        let mut registry = MethodRegistry::new();
        def(&mut registry, "Foo", "name", "foo.rb");
        def(&mut registry, "Foo", "run", "foo.rb");
        def(&mut registry, "Bar", "name", "bar.rb");

        let names = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        assert_eq!(
            registry.guess_receiver_type_by_methods(&names(&["name", "run"]), &store),
            Type::instance("Foo")
        );
        assert_eq!(
            registry.guess_receiver_type_by_methods(&names(&["name"]), &store),
            Type::Any
        );
        assert_eq!(
            registry.guess_receiver_type_by_methods(&names(&["quack"]), &store),
            Type::Duck("quack".to_string())
        );
        assert_eq!(registry.guess_receiver_type_by_methods(&[], &store), Type::Any);
    }

    #[test]
    fn test_remove_by_path_keeps_other_declarations() {
        let mut registry = MethodRegistry::new();
        def(&mut registry, "Foo", "m_a", "a.rb");
        def(&mut registry, "Foo", "m_b", "b.rb");
        def(&mut registry, "Foo", "shared", "a.rb");
        def(&mut registry, "Foo", "shared", "b.rb");

        registry.remove_by_path("a.rb", None);
        assert_eq!(registry.all_names(), vec!["Foo#m_b", "Foo#shared"]);
        assert!(registry.guess_method("m_a").is_none());
    }
}
