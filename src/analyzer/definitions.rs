//! Definition Handlers - Processing class/module/method definitions
//!
//! This module is responsible for:
//! - Declaring classes and modules (constants, both receiver rows, superclass edges)
//! - Entering and leaving class, module and `class << self` bodies
//! - Declaring methods in the symbol store and the method registry
//! - Collecting the return vertices of a method body

use super::install::AstInstaller;
use super::parameters::install_parameters;
use crate::env::{ConstKind, MethodKey, MethodKind, NodeEntry};
use crate::error::BuildResult;
use crate::graph::VertexId;
use crate::store::{singleton_fqname, Visibility};
use crate::syntax::{ConstPath, NodeId, NodeKind};
use std::mem;

/// Install class definition
pub(super) fn install_class(
    installer: &mut AstInstaller,
    node: NodeId,
    constant_path: &ConstPath,
    superclass: Option<NodeId>,
    body: Option<NodeId>,
) -> BuildResult<Option<VertexId>> {
    let fqname = installer.declared_name(constant_path);
    let line = installer.line(node);
    let site = installer.site(line);

    installer
        .genv
        .consts
        .create_class_or_module(&fqname, ConstKind::Class, installer.path);
    installer.genv.store.insert_class(&fqname, &site)?;

    // Only the name is recorded; the store resolves it lazily so the
    // superclass may live in a file analyzed later.
    if let Some(passed_name) = superclass.and_then(|node| constant_reference(installer, node)) {
        let eval_scope = installer.lexical_scope();
        installer.genv.store.insert_inherit(
            &fqname,
            &eval_scope,
            &passed_name,
            installer.path,
            line,
        )?;
    }

    install_body(installer, constant_path, body)?;
    Ok(None)
}

/// Install module definition
pub(super) fn install_module(
    installer: &mut AstInstaller,
    node: NodeId,
    constant_path: &ConstPath,
    body: Option<NodeId>,
) -> BuildResult<Option<VertexId>> {
    let fqname = installer.declared_name(constant_path);
    let site = installer.site(installer.line(node));

    installer
        .genv
        .consts
        .create_class_or_module(&fqname, ConstKind::Module, installer.path);
    installer.genv.store.insert_module(&fqname, &site)?;

    install_body(installer, constant_path, body)?;
    Ok(None)
}

/// Install `class << self`
pub(super) fn install_singleton_class(
    installer: &mut AstInstaller,
    body: Option<NodeId>,
) -> BuildResult<Option<VertexId>> {
    let saved_singleton = mem::replace(&mut installer.in_singleton, true);
    let saved_lvars = mem::take(&mut installer.lvars);
    installer.visibilities.push(Visibility::Public);

    installer.install_optional(body)?;

    installer.visibilities.pop();
    installer.lvars = saved_lvars;
    installer.in_singleton = saved_singleton;
    Ok(None)
}

/// Enter the scope named by `constant_path`, install `body`, and leave
fn install_body(
    installer: &mut AstInstaller,
    constant_path: &ConstPath,
    body: Option<NodeId>,
) -> BuildResult<()> {
    let saved_scope = if constant_path.absolute {
        let mut scope = vec!["Object".to_string()];
        scope.extend(constant_path.names.iter().cloned());
        mem::replace(&mut installer.scope, scope)
    } else {
        let saved = installer.scope.clone();
        installer.scope.extend(constant_path.names.iter().cloned());
        saved
    };
    let saved_singleton = mem::replace(&mut installer.in_singleton, false);
    let saved_module_function = mem::replace(&mut installer.module_function, false);
    let saved_lvars = mem::take(&mut installer.lvars);
    let saved_method = installer.current_method.take();
    installer.visibilities.push(Visibility::Public);

    installer.install_optional(body)?;

    installer.visibilities.pop();
    installer.current_method = saved_method;
    installer.lvars = saved_lvars;
    installer.module_function = saved_module_function;
    installer.in_singleton = saved_singleton;
    installer.scope = saved_scope;
    Ok(())
}

/// `Foo`, `A::B` or `::A::B` as written, for a superclass or mixin argument
pub(super) fn constant_reference(installer: &AstInstaller, node: NodeId) -> Option<String> {
    match installer.tree.kind(node)? {
        NodeKind::ConstantRead { name } => Some(name.clone()),
        NodeKind::ConstantPath { path } if path.absolute => Some(format!("::{}", path.joined())),
        NodeKind::ConstantPath { path } => Some(path.joined()),
        _ => None,
    }
}

/// Install method definition
///
/// The def itself has no value; its body's tail and `return` arguments
/// become the method's return vertices.
pub(super) fn install_def(
    installer: &mut AstInstaller,
    node: NodeId,
    name: &str,
    self_receiver: bool,
    parameters: Option<NodeId>,
    body: Option<NodeId>,
) -> BuildResult<Option<VertexId>> {
    let singleton = self_receiver || installer.in_singleton;
    let owner = installer.current_self_type_name();
    let line = installer.line(node);
    let visibility = if self_receiver {
        Visibility::Public
    } else {
        installer.current_visibility()
    };

    let receiver_name = installer.current_receiver_name(singleton);
    let receiver_id = installer.receiver_id(&receiver_name, line)?;
    installer
        .genv
        .store
        .insert_method(receiver_id, visibility, name, installer.path, line)?;

    let key = MethodKey::new(&owner, name, singleton);
    let entry = installer
        .genv
        .methods
        .add(key.clone(), MethodKind::Def, visibility, installer.path);
    entry.node = Some((installer.file, node));
    entry.line = line;
    installer
        .genv
        .nodes
        .add(installer.file, node, NodeEntry::Method(key.clone()));

    if installer.module_function && !singleton {
        promote_to_singleton(installer, &owner, name, line)?;
    }

    let saved_lvars = mem::take(&mut installer.lvars);
    let saved_method = installer.current_method.replace(key.clone());
    let saved_returns = mem::take(&mut installer.return_vertices);

    if let Some(parameters) = parameters {
        install_parameters(installer, &key, parameters)?;
    }
    if let Some(tail) = installer.install_optional(body)? {
        installer.return_vertices.push(tail);
    }

    let returns = mem::replace(&mut installer.return_vertices, saved_returns);
    installer.current_method = saved_method;
    installer.lvars = saved_lvars;

    if let Some(entry) = installer.genv.methods.get_mut(&key) {
        for vertex in returns {
            entry.add_return_vertex(vertex);
        }
    }
    Ok(None)
}

/// Declare a public singleton copy of the instance method `owner#name`
pub(super) fn promote_to_singleton(
    installer: &mut AstInstaller,
    owner: &str,
    name: &str,
    line: usize,
) -> BuildResult<()> {
    let singleton_id = installer.receiver_id(&singleton_fqname(owner), line)?;
    installer.genv.store.insert_method(
        singleton_id,
        Visibility::Public,
        name,
        installer.path,
        line,
    )?;
    installer.genv.methods.add(
        MethodKey::new(owner, name, true),
        MethodKind::Promoted {
            from: MethodKey::new(owner, name, false),
        },
        Visibility::Public,
        installer.path,
    );
    Ok(())
}
