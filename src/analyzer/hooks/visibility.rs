//! `private`, `protected` and `public`

use super::{change_visibility, literal_names, CallHook, CallSite, Continuation};
use crate::analyzer::install::AstInstaller;
use crate::error::BuildResult;
use crate::graph::VertexId;
use crate::store::Visibility;

/// Visibility changes in three forms:
///
/// - `private` changes the default for the rest of the body
/// - `private def foo ... end` applies to the wrapped definition only
/// - `private :foo, :bar` changes methods that are already declared
pub struct MethodVisibility;

impl MethodVisibility {
    fn visibility_of(name: &str) -> Option<Visibility> {
        match name {
            "public" => Some(Visibility::Public),
            "protected" => Some(Visibility::Protected),
            "private" => Some(Visibility::Private),
            _ => None,
        }
    }
}

impl CallHook for MethodVisibility {
    fn matches(&self, _scope: &str, name: &str) -> bool {
        Self::visibility_of(name).is_some()
    }

    fn apply(
        &self,
        installer: &mut AstInstaller,
        call: &CallSite,
        visit: Continuation,
    ) -> BuildResult<Option<VertexId>> {
        let Some(visibility) = Self::visibility_of(call.name) else {
            return Ok(None);
        };

        if call.arguments.is_empty() {
            installer.set_current_visibility(visibility);
            return Ok(None);
        }

        match literal_names(installer, call.arguments) {
            Some(names) => {
                let singleton = installer.in_singleton;
                for (_, name) in names {
                    change_visibility(installer, &name, singleton, visibility, call.line)?;
                }
            }
            None => {
                installer.visibilities.push(visibility);
                let visited = visit(installer, call);
                installer.visibilities.pop();
                visited?;
            }
        }
        Ok(None)
    }
}
