//! Call Handlers - Processing method calls and blocks
//!
//! This module is responsible for:
//! - Routing every call through the hook table
//! - Installing a call's receiver, arguments and block (the hooks' continuation)
//! - Block scoping: block-local variables disappear when the block ends

use super::hooks::{CallChildren, CallSite};
use super::install::AstInstaller;
use super::parameters::install_block_parameters;
use crate::error::{BuildError, BuildResult};
use crate::graph::VertexId;
use crate::syntax::NodeId;

/// Install method call: `recv.name(args) { block }`
pub(super) fn install_call(
    installer: &mut AstInstaller,
    node: NodeId,
    receiver: Option<NodeId>,
    name: &str,
    arguments: &[NodeId],
    block: Option<NodeId>,
) -> BuildResult<Option<VertexId>> {
    let call = CallSite {
        node,
        receiver,
        name,
        arguments,
        block,
        line: installer.line(node),
    };

    let scope = installer.lexical_scope();
    let hooks = installer.hooks;
    let Some(hook) = hooks.fetch(&scope, name, receiver.is_some()) else {
        return Err(BuildError::NoMatchingHook {
            scope,
            name: name.to_string(),
        });
    };
    hook.apply(installer, &call, install_call_children)
}

/// Install receiver, arguments and block of a call
pub(super) fn install_call_children(
    installer: &mut AstInstaller,
    call: &CallSite,
) -> BuildResult<CallChildren> {
    let receiver = installer.install_optional(call.receiver)?;
    let arguments = installer.install_each(call.arguments)?;
    if let Some(block) = call.block {
        installer.install_node(block)?;
    }
    Ok(CallChildren {
        receiver,
        arguments,
    })
}

/// Install block: `{ |x| ... }` or `do |x| ... end`
pub(super) fn install_block(
    installer: &mut AstInstaller,
    parameters: Option<NodeId>,
    body: Option<NodeId>,
) -> BuildResult<()> {
    let mark = installer.lvars.len();

    if let Some(parameters) = parameters {
        install_block_parameters(installer, parameters)?;
    }
    installer.install_optional(body)?;

    installer.lvars.truncate(mark);
    Ok(())
}
