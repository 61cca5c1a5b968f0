//! `module_function`

use super::{change_visibility, literal_names, CallHook, CallSite, Continuation};
use crate::analyzer::definitions::promote_to_singleton;
use crate::analyzer::install::AstInstaller;
use crate::error::BuildResult;
use crate::graph::VertexId;
use crate::store::Visibility;

/// Makes methods private on the instance side and public on the singleton side
///
/// Without arguments every following `def` in the module body is promoted;
/// with `:name` arguments the already-declared methods are.
pub struct ModuleFunction;

impl CallHook for ModuleFunction {
    fn matches(&self, _scope: &str, name: &str) -> bool {
        name == "module_function"
    }

    fn apply(
        &self,
        installer: &mut AstInstaller,
        call: &CallSite,
        visit: Continuation,
    ) -> BuildResult<Option<VertexId>> {
        if call.arguments.is_empty() {
            installer.module_function = true;
            installer.set_current_visibility(Visibility::Private);
            return Ok(None);
        }

        let Some(names) = literal_names(installer, call.arguments) else {
            visit(installer, call)?;
            return Ok(None);
        };

        let owner = installer.current_self_type_name();
        for (_, name) in names {
            change_visibility(installer, &name, false, Visibility::Private, call.line)?;
            promote_to_singleton(installer, &owner, &name, call.line)?;
        }
        Ok(None)
    }
}
