//! Default handling for every other call

use super::{CallHook, CallSite, Continuation};
use crate::analyzer::install::AstInstaller;
use crate::error::BuildResult;
use crate::graph::{CallVertex, VertexId, VertexKind};
use crate::types::Type;

/// Creates a `Call` vertex reading from the receiver and the arguments
pub struct NormalMethod;

impl CallHook for NormalMethod {
    fn matches(&self, _scope: &str, _name: &str) -> bool {
        true
    }

    fn accepts_explicit_receiver(&self) -> bool {
        true
    }

    fn apply(
        &self,
        installer: &mut AstInstaller,
        call: &CallSite,
        visit: Continuation,
    ) -> BuildResult<Option<VertexId>> {
        let children = visit(installer, call)?;

        // An explicit receiver the graph does not model still marks the call
        // as explicit, so it is never resolved against `self`.
        let receiver = match (call.receiver, children.receiver) {
            (Some(node), None) => {
                Some(installer.add_vertex(node, "?", VertexKind::Static(Type::Any), &[]))
            }
            (_, vertex) => vertex,
        };

        let kind = VertexKind::Call(CallVertex {
            receiver,
            arguments: children.arguments.clone(),
            method_name: call.name.to_string(),
            scope: installer.lexical_scope(),
            self_type: installer.self_type_at_call(),
            fast_receiver_type: None,
        });
        let dependencies: Vec<VertexId> = receiver.into_iter().chain(children.arguments).collect();
        Ok(Some(installer.add_vertex(
            call.node,
            call.name,
            kind,
            &dependencies,
        )))
    }
}
