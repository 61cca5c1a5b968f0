//! `include` and `extend`

use super::{CallHook, CallSite, Continuation};
use crate::analyzer::definitions::constant_reference;
use crate::analyzer::install::AstInstaller;
use crate::error::BuildResult;
use crate::graph::VertexId;
use crate::store::{singleton_fqname, EdgeKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MixinKind {
    Include,
    Extend,
}

/// Records a mixin edge for every constant argument
///
/// `include` targets the current receiver, `extend` its singleton class.
/// The module name is resolved lazily by the symbol store.
pub struct MixinHook {
    kind: MixinKind,
}

impl MixinHook {
    pub fn new(kind: MixinKind) -> Self {
        Self { kind }
    }
}

impl CallHook for MixinHook {
    fn matches(&self, _scope: &str, name: &str) -> bool {
        match self.kind {
            MixinKind::Include => name == "include",
            MixinKind::Extend => name == "extend",
        }
    }

    fn apply(
        &self,
        installer: &mut AstInstaller,
        call: &CallSite,
        _visit: Continuation,
    ) -> BuildResult<Option<VertexId>> {
        let owner = installer.current_self_type_name();
        let target = if self.kind == MixinKind::Extend || installer.in_singleton {
            singleton_fqname(&owner)
        } else {
            owner
        };
        let eval_scope = installer.lexical_scope();

        for &arg in call.arguments {
            let Some(passed_name) = constant_reference(installer, arg) else {
                tracing::debug!(
                    "skipping non-constant argument of {} at line {}",
                    call.name,
                    call.line
                );
                continue;
            };
            installer.genv.store.insert_edge(
                EdgeKind::Mixin,
                &target,
                &eval_scope,
                &passed_name,
                installer.path,
                call.line,
            )?;
        }
        Ok(None)
    }
}
