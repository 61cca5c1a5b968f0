//! Global environment: the analysis session context
//!
//! This module provides a unified interface over the symbol store, the
//! constant/method/node registries and the vertex arena. One `GlobalEnv`
//! lives for one analysis session and is passed explicitly to the builder,
//! the inference routines and the coordinator.

use crate::env::const_registry::ConstRegistry;
use crate::env::files::FileTable;
use crate::env::method_registry::MethodRegistry;
use crate::env::node_registry::{NodeEntry, NodeRegistry};
use crate::error::StoreError;
use crate::graph::{FileId, TypeVertex, TypeVertexRegistry, VertexId};
use crate::store::SymbolStore;
use crate::syntax::NodeId;
use std::collections::HashMap;

/// Global environment: core of the type inference engine
///
/// This is a facade that coordinates the various subsystems:
/// - Symbol store (receivers, methods, edges, respond-to rows)
/// - Constant registry (classes, modules, constant variables)
/// - Method registry (method objects and the duck-typing name index)
/// - Vertex registry (the type vertex graph)
/// - Node registry (syntax position lookup for hover)
pub struct GlobalEnv {
    pub store: SymbolStore,

    pub files: FileTable,

    pub consts: ConstRegistry,

    pub methods: MethodRegistry,

    pub vertices: TypeVertexRegistry,

    pub nodes: NodeRegistry,

    /// Vertices whose inference is in progress, with their stack depth
    evaluating: HashMap<VertexId, usize>,

    /// Shallowest in-progress depth reached again by a cycle
    cycle_floor: usize,

    /// Current inference pass; results are reused only within one pass
    pass: u64,
    in_pass: bool,
}

impl GlobalEnv {
    pub fn new() -> Result<Self, StoreError> {
        Ok(Self {
            store: SymbolStore::open_in_memory()?,
            files: FileTable::new(),
            consts: ConstRegistry::new(),
            methods: MethodRegistry::new(),
            vertices: TypeVertexRegistry::new(),
            nodes: NodeRegistry::new(),
            evaluating: HashMap::new(),
            cycle_floor: usize::MAX,
            pass: 0,
            in_pass: false,
        })
    }

    // ===== Vertex Management =====

    /// Register a vertex and index its syntax position
    pub fn new_vertex(&mut self, vertex: TypeVertex) -> VertexId {
        let id = self.vertices.insert(vertex);
        self.nodes.add(id.file, id.node, NodeEntry::Vertex(id));
        id
    }

    pub fn get_vertex(&self, id: VertexId) -> Option<&TypeVertex> {
        self.vertices.get(id)
    }

    /// `vertex` reads from `dependency`
    pub fn add_dependency(&mut self, vertex: VertexId, dependency: VertexId) {
        self.vertices.add_dependency(vertex, dependency);
    }

    // ===== Files =====

    pub fn file_id(&mut self, path: &str) -> FileId {
        self.files.intern(path)
    }

    /// Entry recorded for a syntax position of `path`
    pub fn node_entry(&self, path: &str, node: NodeId) -> Option<&NodeEntry> {
        let file = self.files.id_of(path)?;
        self.nodes.find(file, node)
    }

    // ===== Invalidation =====

    /// Forget everything `path` declared
    ///
    /// Entities still declared by another file survive with `path` removed
    /// from their path list.
    pub fn remove_by_path(&mut self, path: &str) -> Result<(), StoreError> {
        let file = self.files.id_of(path);

        self.consts.remove_by_path(path, file);
        self.methods.remove_by_path(path, file);
        if let Some(file) = file {
            let removed = self.vertices.remove_file(file);
            self.nodes.remove_file(file);
            tracing::debug!("invalidated {}: {} vertices", path, removed);
        }
        self.store.remove_by_path(path)
    }

    // ===== Inference Passes =====

    /// Start a pass in which unconstrained results are memoized
    ///
    /// Returns false when a pass is already running; the caller then must
    /// not end it. The graph must not change while a pass is open.
    pub fn begin_inference_pass(&mut self) -> bool {
        if self.in_pass {
            return false;
        }
        self.pass += 1;
        self.in_pass = true;
        true
    }

    pub fn end_inference_pass(&mut self) {
        self.in_pass = false;
    }

    /// Pass id to memoize under, when memoization is active
    pub(crate) fn memo_pass(&self) -> Option<u64> {
        self.in_pass.then_some(self.pass)
    }

    // ===== Inference Guard =====

    /// Mark `id` as being inferred; false when it already is
    ///
    /// A refused vertex lowers the cycle floor to its own depth.
    pub(crate) fn begin_evaluating(&mut self, id: VertexId) -> bool {
        if let Some(&depth) = self.evaluating.get(&id) {
            self.cycle_floor = self.cycle_floor.min(depth);
            return false;
        }
        let depth = self.evaluating.len();
        self.evaluating.insert(id, depth);
        true
    }

    pub(crate) fn finish_evaluating(&mut self, id: VertexId) {
        self.evaluating.remove(&id);
    }

    /// Depth the next vertex will be evaluated at
    pub(crate) fn evaluation_depth(&self) -> usize {
        self.evaluating.len()
    }

    /// Reset the cycle floor before evaluating a vertex, returning the outer one
    pub(crate) fn enter_cycle_scope(&mut self) -> usize {
        std::mem::replace(&mut self.cycle_floor, usize::MAX)
    }

    /// Restore the outer cycle floor after evaluating the vertex at `depth`
    ///
    /// Returns whether the result is complete: no cycle reached a vertex
    /// evaluated above it.
    pub(crate) fn leave_cycle_scope(&mut self, depth: usize, outer_floor: usize) -> bool {
        let complete = self.cycle_floor >= depth;
        self.cycle_floor = if complete {
            outer_floor
        } else {
            outer_floor.min(self.cycle_floor)
        };
        complete
    }
}
