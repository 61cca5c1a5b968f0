//! Respond-to patcher: recomputes the flattened method set of receivers
//!
//! This module is responsible for:
//! - Walking `inherit` edges to list a receiver's ancestors
//! - Resolving mixins reachable from the receiver and its ancestors
//! - Writing self/inherit/mixin rows to `receiver_responds`

use super::{singleton_fqname, strip_singleton, EdgeKind, Receiver, RespondSource, SymbolStore};
use crate::error::StoreError;
use std::collections::{HashSet, VecDeque};

pub struct RespondPatcher<'a> {
    store: &'a SymbolStore,
}

impl<'a> RespondPatcher<'a> {
    pub fn new(store: &'a SymbolStore) -> Self {
        Self { store }
    }

    /// Recompute respond-to rows for each receiver in `fqnames`
    pub fn patch(&self, fqnames: &[String]) -> Result<(), StoreError> {
        for fqname in fqnames {
            self.patch_receiver(fqname)?;
        }
        Ok(())
    }

    pub fn patch_receiver(&self, fqname: &str) -> Result<(), StoreError> {
        let Some(receiver) = self.store.find_receiver(fqname)? else {
            return self.store.delete_responds(fqname);
        };

        let mut rows = Vec::new();
        for (owner, source) in self.method_resolution_order(&receiver)? {
            for method in self.store.methods_of_receiver(owner.id)? {
                rows.push((method.name, source));
            }
        }

        self.store.replace_responds(&receiver.fqname, &rows)
    }

    /// Superclass chain, nearest first
    ///
    /// Singleton receivers walk the singleton form of each ancestor. The walk
    /// stops at the first edge that resolves to nothing.
    pub fn retrieve_ancestors(&self, receiver: &Receiver) -> Result<Vec<Receiver>, StoreError> {
        let mut ancestors = Vec::new();
        let mut seen = HashSet::from([receiver.fqname.clone()]);
        let mut current = receiver.clone();

        loop {
            let edges = self.store.edges_of(EdgeKind::Inherit, &current.fqname)?;
            let Some(edge) = edges.first() else {
                break;
            };
            let Some(parent) = self
                .store
                .resolve_name_to_receiver(&edge.eval_scope, &edge.passed_name)?
            else {
                break;
            };
            let parent = if receiver.is_singleton {
                match self.store.find_receiver(&singleton_fqname(&parent.fqname))? {
                    Some(singleton) => singleton,
                    None => break,
                }
            } else {
                parent
            };

            if !seen.insert(parent.fqname.clone()) {
                break;
            }
            ancestors.push(parent.clone());
            current = parent;
        }

        Ok(ancestors)
    }

    /// Modules mixed into `receiver`, including modules those modules mix in
    ///
    /// Unresolvable edges are skipped.
    pub fn mixins_of(&self, receiver: &Receiver) -> Result<Vec<Receiver>, StoreError> {
        let mut mixins = Vec::new();
        let mut seen = HashSet::from([receiver.fqname.clone()]);
        let mut queue = VecDeque::from([receiver.fqname.clone()]);

        while let Some(target) = queue.pop_front() {
            for edge in self.store.edges_of(EdgeKind::Mixin, &target)? {
                let Some(module) = self
                    .store
                    .resolve_name_to_receiver(&edge.eval_scope, &edge.passed_name)?
                else {
                    tracing::debug!(
                        "skipping mixin {} on {}: no such receiver",
                        edge.passed_name,
                        target
                    );
                    continue;
                };
                if seen.insert(module.fqname.clone()) {
                    queue.push_back(module.fqname.clone());
                    mixins.push(module);
                }
            }
        }

        Ok(mixins)
    }

    /// Self, then its mixins, then each ancestor followed by its mixins
    pub fn method_resolution_order(
        &self,
        receiver: &Receiver,
    ) -> Result<Vec<(Receiver, RespondSource)>, StoreError> {
        let mut order = vec![(receiver.clone(), RespondSource::SelfMethod)];
        for mixin in self.mixins_of(receiver)? {
            order.push((mixin, RespondSource::Mixin));
        }

        for ancestor in self.retrieve_ancestors(receiver)? {
            let mixins = self.mixins_of(&ancestor)?;
            order.push((ancestor, RespondSource::Inherit));
            for mixin in mixins {
                order.push((mixin, RespondSource::Mixin));
            }
        }

        Ok(order)
    }

    /// `fqnames` plus every receiver whose edges may reach one of them,
    /// transitively
    pub fn with_dependents(&self, fqnames: &[String]) -> Result<Vec<String>, StoreError> {
        let mut result: Vec<String> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<String> = fqnames.iter().cloned().collect();

        while let Some(fqname) = queue.pop_front() {
            if !seen.insert(fqname.clone()) {
                continue;
            }
            let base = strip_singleton(&fqname).0.to_string();
            for target in self.store.edge_targets_mentioning(&base)? {
                if !seen.contains(&target) {
                    queue.push_back(target);
                }
            }
            result.push(fqname);
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{DeclarationSite, ReceiverKind, Visibility};

    fn method_names_of(store: &SymbolStore, fqname: &str) -> Vec<String> {
        let mut names: Vec<String> = store
            .responds_of(fqname)
            .unwrap()
            .into_iter()
            .map(|r| r.method_name)
            .collect();
        names.sort();
        names.dedup();
        names
    }

    fn add_receiver(store: &SymbolStore, kind: ReceiverKind, fqname: &str, singleton: bool) {
        let site = DeclarationSite::new(&format!("/path/to/{}.rb", fqname), 10, "hash123");
        store.insert_receiver(kind, fqname, singleton, &site).unwrap();
    }

    fn add_method(store: &SymbolStore, fqname: &str, name: &str) {
        let receiver = store.find_receiver(fqname).unwrap().unwrap();
        store
            .insert_method(receiver.id, Visibility::Public, name, "/path/to/x.rb", 10)
            .unwrap();
    }

    fn seed() -> SymbolStore {
        let store = SymbolStore::open_in_memory().unwrap();
        add_receiver(&store, ReceiverKind::Class, "A", false);
        add_receiver(&store, ReceiverKind::Class, "singleton(A)", true);
        add_receiver(&store, ReceiverKind::Class, "B", false);
        add_receiver(&store, ReceiverKind::Class, "singleton(B)", true);
        for module in ["FeatureA", "FeatureB", "FeatureC", "FeatureD"] {
            add_receiver(&store, ReceiverKind::Module, module, false);
        }

        add_method(&store, "A", "method_from_a");
        add_method(&store, "singleton(A)", "method_from_singleton_a");
        add_method(&store, "B", "method_from_b");
        add_method(&store, "singleton(B)", "method_from_singleton_b");
        add_method(&store, "FeatureA", "method_from_feature_a");
        add_method(&store, "FeatureB", "method_from_feature_b");
        add_method(&store, "FeatureC", "method_from_feature_c");
        add_method(&store, "FeatureD", "method_from_feature_d");

        store.insert_inherit("B", "Object", "A", "/path/to/b.rb", 10).unwrap();
        store
            .insert_edge(EdgeKind::Mixin, "A", "Object", "FeatureA", "/path/to/a.rb", 10)
            .unwrap();
        store
            .insert_edge(EdgeKind::Mixin, "singleton(A)", "Object", "FeatureB", "/path/to/a.rb", 10)
            .unwrap();
        store
            .insert_edge(EdgeKind::Mixin, "B", "Object", "FeatureC", "/path/to/b.rb", 10)
            .unwrap();
        store
            .insert_edge(EdgeKind::Mixin, "singleton(B)", "Object", "FeatureD", "/path/to/b.rb", 10)
            .unwrap();
        store
    }

    #[test]
    fn test_patch_generates_receiver_respond_records() {
        let store = seed();
        let patcher = RespondPatcher::new(&store);
        patcher
            .patch(&store.all_receiver_names().unwrap())
            .unwrap();

        assert_eq!(
            method_names_of(&store, "A"),
            vec!["method_from_a", "method_from_feature_a"]
        );
        assert_eq!(
            method_names_of(&store, "singleton(A)"),
            vec!["method_from_feature_b", "method_from_singleton_a"]
        );
        assert_eq!(
            method_names_of(&store, "B"),
            vec![
                "method_from_a",
                "method_from_b",
                "method_from_feature_a",
                "method_from_feature_c"
            ]
        );
        assert_eq!(
            method_names_of(&store, "singleton(B)"),
            vec![
                "method_from_feature_b",
                "method_from_feature_d",
                "method_from_singleton_a",
                "method_from_singleton_b"
            ]
        );
    }

    #[test]
    fn test_method_resolution_order() {
        let store = seed();
        let patcher = RespondPatcher::new(&store);
        let b = store.find_receiver("B").unwrap().unwrap();

        let order: Vec<_> = patcher
            .method_resolution_order(&b)
            .unwrap()
            .into_iter()
            .map(|(r, source)| (r.fqname, source))
            .collect();
        assert_eq!(
            order,
            vec![
                ("B".to_string(), RespondSource::SelfMethod),
                ("FeatureC".to_string(), RespondSource::Mixin),
                ("A".to_string(), RespondSource::Inherit),
                ("FeatureA".to_string(), RespondSource::Mixin),
            ]
        );
    }

    #[test]
    fn test_missing_mixin_target_is_skipped() {
        let store = seed();
        store
            .insert_edge(EdgeKind::Mixin, "A", "Object", "Nowhere", "/path/to/a.rb", 11)
            .unwrap();
        let patcher = RespondPatcher::new(&store);
        patcher.patch_receiver("A").unwrap();

        assert_eq!(
            method_names_of(&store, "A"),
            vec!["method_from_a", "method_from_feature_a"]
        );
    }

    #[test]
    fn test_with_dependents_follows_edges() {
        let store = seed();
        let patcher = RespondPatcher::new(&store);

        let affected = patcher.with_dependents(&["A".to_string()]).unwrap();
        assert!(affected.contains(&"A".to_string()));
        assert!(affected.contains(&"B".to_string()));
        assert!(affected.contains(&"singleton(B)".to_string()));
    }
}
