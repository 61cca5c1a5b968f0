//! Lazy, memoized inference over the vertex graph
//!
//! Every vertex kind computes its type on demand from its dependencies and
//! stores the result in `inferred_type`. Inside an inference pass an
//! unconstrained result is reused until the pass ends. A vertex that is
//! reached again while its own inference is still running yields `any`, so
//! cycles in the graph always terminate; results that saw such a cycle above
//! them are not reused.

use super::vertex::{CallVertex, Constraints, FileId, VertexId, VertexKind};
use crate::env::{Constant, GlobalEnv, MethodKey, MethodKind};
use crate::store::{singleton_fqname, strip_singleton, RespondPatcher, Visibility};
use crate::types::Type;
use smallvec::SmallVec;

/// Implicit ancestors of every receiver, searched last
const ROOT_CHAIN: [&str; 3] = ["Object", "Kernel", "BasicObject"];

/// Extra ancestors of class objects, searched before the root chain
const CLASS_OBJECT_CHAIN: [&str; 2] = ["Class", "Module"];

impl GlobalEnv {
    /// Infer the type of one vertex, memoizing the result
    pub fn infer_vertex(&mut self, id: VertexId, constraints: &Constraints) -> Type {
        let Some(vertex) = self.vertices.get(id) else {
            return Type::Any;
        };
        let memo_pass = self.memo_pass().filter(|_| constraints.is_empty());
        if memo_pass.is_some() && vertex.memo_pass == memo_pass {
            return vertex.inferred_type.clone();
        }
        let name = vertex.name.clone();
        let kind = vertex.kind.clone();
        let dependencies = vertex.dependencies.clone();

        let depth = self.evaluation_depth();
        if !self.begin_evaluating(id) {
            tracing::debug!("cycle through vertex {} ({})", id, name);
            return Type::Any;
        }
        let outer_floor = self.enter_cycle_scope();
        let ty = self.compute_type(&name, &kind, &dependencies, constraints);
        self.finish_evaluating(id);
        let complete = self.leave_cycle_scope(depth, outer_floor);

        // a constrained result never replaces this pass's unconstrained memo
        let current = self.memo_pass();
        let memo_is_current = current.is_some()
            && self.vertices.get(id).is_some_and(|v| v.memo_pass == current);
        if memo_pass.is_none() && memo_is_current {
            return ty;
        }
        self.vertices
            .set_inferred_type(id, ty.clone(), memo_pass.filter(|_| complete));
        ty
    }

    fn compute_type(
        &mut self,
        name: &str,
        kind: &VertexKind,
        dependencies: &SmallVec<[VertexId; 2]>,
        constraints: &Constraints,
    ) -> Type {
        match kind {
            VertexKind::Param { owner } | VertexKind::Kwparam { owner } => {
                self.infer_arg(owner, name, dependencies, constraints)
            }
            VertexKind::LvarWrite | VertexKind::IvarWrite { .. } => match dependencies.first() {
                Some(&value) => self.infer_vertex(value, constraints),
                None => Type::Any,
            },
            VertexKind::LvarRead => {
                let accurate = match dependencies.first() {
                    Some(&write) => self.infer_vertex(write, constraints),
                    None => Type::Any,
                };
                self.or_guess(accurate, constraints)
            }
            VertexKind::IvarRead { owner } => {
                let accurate = self.infer_ivar(owner, name, constraints);
                self.or_guess(accurate, constraints)
            }
            VertexKind::ConstRead { scope, constant } => {
                self.infer_const(scope, constant, constraints)
            }
            VertexKind::Array => {
                let elements = self.infer_all(dependencies, constraints);
                Type::array_of(Type::union(elements))
            }
            VertexKind::Hash => {
                let types = self.infer_all(dependencies, constraints);
                let pairs = types
                    .chunks_exact(2)
                    .map(|kv| (kv[0].clone(), kv[1].clone()))
                    .collect();
                Type::Hash(pairs)
            }
            VertexKind::InterpolatedString => {
                self.infer_all(dependencies, constraints);
                Type::string()
            }
            VertexKind::EmbeddedStatements => self
                .infer_all(dependencies, constraints)
                .pop()
                .unwrap_or(Type::Nil),
            VertexKind::Static(ty) => ty.clone(),
            VertexKind::Break => {
                if dependencies.is_empty() {
                    Type::Nil
                } else {
                    Type::union(self.infer_all(dependencies, constraints))
                }
            }
            VertexKind::If { missing_branch } => {
                let mut branches = self.infer_all(dependencies, constraints);
                if *missing_branch || branches.is_empty() {
                    branches.push(Type::Nil);
                }
                Type::union(branches)
            }
            VertexKind::Call(call) => self.infer_call(call, constraints),
        }
    }

    fn infer_all(&mut self, ids: &[VertexId], constraints: &Constraints) -> Vec<Type> {
        ids.iter()
            .map(|&id| self.infer_vertex(id, constraints))
            .collect()
    }

    /// Replace `any` with a duck-typing guess when methods are known to be sent
    fn or_guess(&self, accurate: Type, constraints: &Constraints) -> Type {
        if accurate == Type::Any && !constraints.is_empty() {
            self.guess_by_constraints(constraints)
        } else {
            accurate
        }
    }

    fn guess_by_constraints(&self, constraints: &Constraints) -> Type {
        if constraints.is_empty() {
            return Type::Any;
        }
        self.methods
            .guess_receiver_type_by_methods(&constraints.received_methods, &self.store)
    }

    /// Declared type, else default value type, else a guess from constraints
    fn infer_arg(
        &mut self,
        owner: &MethodKey,
        name: &str,
        defaults: &[VertexId],
        constraints: &Constraints,
    ) -> Type {
        let declared = self
            .methods
            .get(owner)
            .and_then(|method| method.arg_types.get(name))
            .cloned();
        if let Some(declared) = declared {
            return declared;
        }

        if !defaults.is_empty() {
            return Type::union(self.infer_all(defaults, constraints));
        }

        self.guess_by_constraints(constraints)
    }

    /// Type of the latest writer of `ivar_name` in `owner`, `nil` if none
    ///
    /// A `singleton(Foo)` owner reads the class-level ivars of `Foo`.
    pub fn infer_ivar(&mut self, owner: &str, ivar_name: &str, constraints: &Constraints) -> Type {
        let (class_name, singleton) = strip_singleton(owner);
        let writer = self
            .consts
            .find_class_or_module(class_name)
            .and_then(|class| class.latest_ivar_writer(ivar_name, singleton));
        match writer {
            Some(writer) => self.infer_vertex(writer, constraints),
            None => Type::Nil,
        }
    }

    fn infer_const(&mut self, scope: &str, constant: &str, constraints: &Constraints) -> Type {
        let (value, declared) = match self.consts.lookup(scope, constant) {
            Some(Constant::ClassOrModule(class)) => return Type::singleton(&class.name),
            Some(Constant::Variable(variable)) => (variable.value(), variable.declared_type.clone()),
            None => return Type::Any,
        };
        match (value, declared) {
            (Some(value), _) => self.infer_vertex(value, constraints),
            (None, Some(declared)) => declared,
            (None, None) => Type::Any,
        }
    }

    // ===== Calls =====

    /// Type of `self` at a call site, `any` when its receiver is unknown
    pub fn self_type_of(&self, self_type: &str) -> Type {
        let (name, singleton) = strip_singleton(self_type);
        if self.consts.find_class_or_module(name).is_some() {
            Type::Const {
                name: name.to_string(),
                singleton,
            }
        } else {
            Type::Any
        }
    }

    /// Cheap receiver guess run over every call before full inference
    ///
    /// An explicit receiver is assumed to be the declaring type of the only
    /// method with the call's name, if there is exactly one.
    pub fn fast_infer_receiver_type(&mut self, id: VertexId) {
        let Some(call) = self.vertices.get(id).and_then(|v| v.as_call()) else {
            return;
        };
        let guessed = match call.receiver {
            Some(_) => self
                .methods
                .guess_method(&call.method_name)
                .map(|method| method.key.receiver_type()),
            None => Some(self.self_type_of(&call.self_type)),
        }
        .filter(|ty| *ty != Type::Any);

        if let Some(vertex) = self.vertices.get_mut(id) {
            if let VertexKind::Call(call) = &mut vertex.kind {
                call.fast_receiver_type = guessed;
            }
        }
    }

    /// Fast pass over every call vertex in the session
    pub fn run_fast_pass(&mut self) -> usize {
        let calls = self.vertices.call_ids();
        for &id in &calls {
            self.fast_infer_receiver_type(id);
        }
        calls.len()
    }

    /// Full inference over every vertex of `file`
    ///
    /// Runs inside the current inference pass, or its own one.
    pub fn infer_file(&mut self, file: FileId) -> usize {
        let opened = self.begin_inference_pass();
        let ids = self.vertices.ids_of_file(file).to_vec();
        for &id in &ids {
            self.infer_vertex(id, &Constraints::none());
        }
        if opened {
            self.end_inference_pass();
        }
        ids.len()
    }

    fn infer_call(&mut self, call: &CallVertex, constraints: &Constraints) -> Type {
        let self_type = self.self_type_of(&call.self_type);
        let (receiver_type, allowed) = match call.receiver {
            None => (self_type, Visibility::Private),
            Some(receiver) => {
                let receiver_type = match &call.fast_receiver_type {
                    Some(guessed) => guessed.clone(),
                    None => self.infer_vertex(receiver, &Constraints::received(&call.method_name)),
                };
                let allowed = if receiver_type == self_type {
                    Visibility::Protected
                } else {
                    Visibility::Public
                };
                (receiver_type, allowed)
            }
        };

        if receiver_type.is_unresolvable_receiver() {
            return Type::Any;
        }
        let Some((receiver_name, singleton)) = receiver_type.receiver_name() else {
            return Type::Any;
        };
        let Some(key) = self.resolve_method(receiver_name, &call.method_name, singleton, allowed)
        else {
            tracing::debug!(
                "no method {} on {} for {:?} call",
                call.method_name,
                receiver_type.show(),
                allowed
            );
            return Type::Any;
        };

        let ret = self.infer_method_return(&key, constraints);
        substitute_receiver(ret, &receiver_type)
    }

    /// Resolve a method on a receiver, walking ancestors and mixins
    ///
    /// Looks for an exact entry first, then follows the receiver's
    /// method-resolution order from the symbol store, then the implicit
    /// root chain.
    pub fn resolve_method(
        &self,
        receiver: &str,
        name: &str,
        singleton: bool,
        allowed: Visibility,
    ) -> Option<MethodKey> {
        if let Some(entry) = self.methods.find(receiver, name, singleton, allowed) {
            return Some(entry.key.clone());
        }

        if let Some(key) = self.resolve_through_ancestors(receiver, name, singleton, allowed) {
            return Some(key);
        }

        let class_chain: &[&str] = if singleton { &CLASS_OBJECT_CHAIN } else { &[] };
        class_chain
            .iter()
            .chain(ROOT_CHAIN.iter())
            .find_map(|owner| self.methods.find(owner, name, false, allowed))
            .map(|entry| entry.key.clone())
    }

    fn resolve_through_ancestors(
        &self,
        receiver: &str,
        name: &str,
        singleton: bool,
        allowed: Visibility,
    ) -> Option<MethodKey> {
        let fqname = if singleton {
            singleton_fqname(receiver)
        } else {
            receiver.to_string()
        };

        let order = match self.store.find_receiver(&fqname) {
            Ok(Some(found)) => RespondPatcher::new(&self.store).method_resolution_order(&found),
            Ok(None) => return None,
            Err(err) => Err(err),
        };
        let order = match order {
            Ok(order) => order,
            Err(err) => {
                tracing::debug!("method resolution order of {} failed: {}", fqname, err);
                return None;
            }
        };

        order.iter().skip(1).find_map(|(owner, _)| {
            let (owner_name, owner_singleton) = strip_singleton(&owner.fqname);
            self.methods
                .find(owner_name, name, owner_singleton, allowed)
                .map(|entry| entry.key.clone())
        })
    }

    /// Return type of a method
    ///
    /// Declared types win. A `def` returns the union of its return vertices
    /// (`nil` for an empty body); accessors report their instance variable.
    pub fn infer_method_return(&mut self, key: &MethodKey, constraints: &Constraints) -> Type {
        let Some(method) = self.methods.get(key) else {
            return Type::Any;
        };
        if let Some(declared) = &method.return_type {
            return declared.clone();
        }
        let kind = method.kind.clone();
        let return_vertices = method.return_vertices.clone();

        match kind {
            MethodKind::Def => {
                if return_vertices.is_empty() {
                    Type::Nil
                } else {
                    Type::union(self.infer_all(&return_vertices, &Constraints::none()))
                }
            }
            MethodKind::AttrReader { ivar } | MethodKind::AttrWriter { ivar } => {
                let owner = if key.singleton {
                    singleton_fqname(&key.receiver)
                } else {
                    key.receiver.clone()
                };
                self.infer_ivar(&owner, &ivar, constraints)
            }
            MethodKind::Builtin => Type::Any,
            MethodKind::Promoted { from } if from != *key => {
                self.infer_method_return(&from, constraints)
            }
            MethodKind::Promoted { .. } => Type::Any,
        }
    }
}

/// Substitute `self`, `instance` and `class` in a declared return type
fn substitute_receiver(ret: Type, receiver: &Type) -> Type {
    match ret {
        Type::SelfType => receiver.clone(),
        Type::InstanceType => match receiver.receiver_name() {
            Some((name, _)) => Type::from_receiver(name, false),
            None => Type::Any,
        },
        Type::ClassType => match receiver.receiver_name() {
            Some((name, _)) => Type::singleton(name),
            None => Type::Any,
        },
        Type::Array(element) => Type::array_of(substitute_receiver(*element, receiver)),
        Type::Union(types) => Type::union(
            types
                .into_iter()
                .map(|ty| substitute_receiver(ty, receiver)),
        ),
        other => other,
    }
}
