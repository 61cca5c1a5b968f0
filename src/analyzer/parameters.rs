//! Parameter Handlers - Processing method and block parameters
//!
//! This module is responsible for:
//! - Creating `Param`/`Kwparam` vertices for method parameters
//! - Wiring optional parameters to their default value
//! - Giving rest, keyword rest and block parameters their fixed types
//! - Registering every parameter as a local variable

use super::install::AstInstaller;
use crate::env::MethodKey;
use crate::error::BuildResult;
use crate::graph::{VertexId, VertexKind};
use crate::syntax::{NodeId, NodeKind};
use crate::types::Type;

/// Install the parameters of the method `owner`
///
/// # Example
/// ```ruby
/// def greet(name, greeting = "hi", *rest, loud:, times: 1, **opts, &block)
/// end
/// ```
pub(super) fn install_parameters(
    installer: &mut AstInstaller,
    owner: &MethodKey,
    parameters: NodeId,
) -> BuildResult<()> {
    for param in parameter_nodes(installer, parameters) {
        let tree = installer.tree;
        let Some(kind) = tree.kind(param) else {
            continue;
        };

        match kind {
            NodeKind::RequiredParameter { name } => {
                let kind = VertexKind::Param {
                    owner: owner.clone(),
                };
                bind(installer, param, name, kind, None);
            }
            NodeKind::OptionalParameter { name, value } => {
                let default = installer.install_node(*value)?;
                let kind = VertexKind::Param {
                    owner: owner.clone(),
                };
                bind(installer, param, name, kind, default);
            }
            NodeKind::RequiredKeywordParameter { name } => {
                let kind = VertexKind::Kwparam {
                    owner: owner.clone(),
                };
                bind(installer, param, name, kind, None);
            }
            NodeKind::OptionalKeywordParameter { name, value } => {
                let default = installer.install_node(*value)?;
                let kind = VertexKind::Kwparam {
                    owner: owner.clone(),
                };
                bind(installer, param, name, kind, default);
            }
            NodeKind::RestParameter { name: Some(name) } => {
                let kind = VertexKind::Static(Type::array_of(Type::Any));
                bind(installer, param, name, kind, None);
            }
            NodeKind::KeywordRestParameter { name: Some(name) } => {
                let kind = VertexKind::Static(Type::Hash(vec![(Type::Any, Type::Any)]));
                bind(installer, param, name, kind, None);
            }
            NodeKind::BlockParameter { name: Some(name) } => {
                let kind = VertexKind::Static(Type::instance("Proc"));
                bind(installer, param, name, kind, None);
            }
            _ => {}
        }
    }
    Ok(())
}

/// Install block parameters as local variable writes
///
/// Block arguments are not tracked, so only a default value gives them a type.
pub(super) fn install_block_parameters(
    installer: &mut AstInstaller,
    parameters: NodeId,
) -> BuildResult<()> {
    for param in parameter_nodes(installer, parameters) {
        let tree = installer.tree;
        let Some(kind) = tree.kind(param) else {
            continue;
        };

        match kind {
            NodeKind::RequiredParameter { name } | NodeKind::RequiredKeywordParameter { name } => {
                bind(installer, param, name, VertexKind::LvarWrite, None);
            }
            NodeKind::OptionalParameter { name, value }
            | NodeKind::OptionalKeywordParameter { name, value } => {
                let default = installer.install_node(*value)?;
                bind(installer, param, name, VertexKind::LvarWrite, default);
            }
            NodeKind::RestParameter { name: Some(name) } => {
                let kind = VertexKind::Static(Type::array_of(Type::Any));
                bind(installer, param, name, kind, None);
            }
            NodeKind::KeywordRestParameter { name: Some(name) } => {
                let kind = VertexKind::Static(Type::Hash(vec![(Type::Any, Type::Any)]));
                bind(installer, param, name, kind, None);
            }
            NodeKind::BlockParameter { name: Some(name) } => {
                let kind = VertexKind::Static(Type::instance("Proc"));
                bind(installer, param, name, kind, None);
            }
            _ => {}
        }
    }
    Ok(())
}

/// Parameter nodes in declaration order
fn parameter_nodes(installer: &AstInstaller, parameters: NodeId) -> Vec<NodeId> {
    match installer.tree.kind(parameters) {
        Some(kind @ NodeKind::Parameters { .. }) => kind.children(),
        _ => Vec::new(),
    }
}

fn bind(
    installer: &mut AstInstaller,
    node: NodeId,
    name: &str,
    kind: VertexKind,
    default: Option<VertexId>,
) -> VertexId {
    let dependencies: Vec<VertexId> = default.into_iter().collect();
    let vertex = installer.add_vertex(node, name, kind, &dependencies);
    installer.push_lvar(name, vertex);
    vertex
}
