//! Call hooks: special semantics for calls that declare things
//!
//! Every call is dispatched through a [`HookTable`], an ordered list of
//! [`CallHook`] implementations. The first hook whose `matches` accepts the
//! call name wins; [`NormalMethod`] matches everything and comes last.

mod attr;
mod mixin;
mod module_function;
mod normal;
mod visibility;

pub use attr::{AttrAccess, AttrHook};
pub use mixin::{MixinHook, MixinKind};
pub use module_function::ModuleFunction;
pub use normal::NormalMethod;
pub use visibility::MethodVisibility;

use super::install::AstInstaller;
use crate::env::MethodKey;
use crate::error::BuildResult;
use crate::graph::VertexId;
use crate::store::Visibility;
use crate::syntax::{NodeId, NodeKind};

/// A call expression as seen by a hook
#[derive(Debug, Clone, Copy)]
pub struct CallSite<'t> {
    pub node: NodeId,
    pub receiver: Option<NodeId>,
    pub name: &'t str,
    pub arguments: &'t [NodeId],
    pub block: Option<NodeId>,
    pub line: usize,
}

/// Vertices produced by installing a call's children
#[derive(Debug, Clone, Default)]
pub struct CallChildren {
    pub receiver: Option<VertexId>,
    pub arguments: Vec<VertexId>,
}

/// The default visit of a call: install receiver, arguments and block
pub type Continuation = fn(&mut AstInstaller, &CallSite) -> BuildResult<CallChildren>;

pub trait CallHook: Send + Sync {
    /// Whether this hook handles `name` called inside `scope`
    fn matches(&self, scope: &str, name: &str) -> bool;

    /// Hooks only see receiver-less calls unless they opt in
    fn accepts_explicit_receiver(&self) -> bool {
        false
    }

    fn apply(
        &self,
        installer: &mut AstInstaller,
        call: &CallSite,
        visit: Continuation,
    ) -> BuildResult<Option<VertexId>>;
}

/// Ordered hook list, built once per session
pub struct HookTable {
    hooks: Vec<Box<dyn CallHook>>,
}

impl HookTable {
    pub fn new() -> Self {
        Self {
            hooks: vec![
                Box::new(AttrHook::new(AttrAccess::Reader)),
                Box::new(AttrHook::new(AttrAccess::Writer)),
                Box::new(AttrHook::new(AttrAccess::Accessor)),
                Box::new(MethodVisibility),
                Box::new(MixinHook::new(MixinKind::Include)),
                Box::new(MixinHook::new(MixinKind::Extend)),
                Box::new(ModuleFunction),
                Box::new(NormalMethod),
            ],
        }
    }

    /// First hook handling the call
    pub fn fetch(&self, scope: &str, name: &str, explicit_receiver: bool) -> Option<&dyn CallHook> {
        self.hooks
            .iter()
            .map(|hook| hook.as_ref())
            .filter(|hook| !explicit_receiver || hook.accepts_explicit_receiver())
            .find(|hook| hook.matches(scope, name))
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}

impl Default for HookTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Method names passed as `:sym` or `"str"` arguments
///
/// Returns `None` as soon as one argument is something else.
pub(super) fn literal_names(
    installer: &AstInstaller,
    arguments: &[NodeId],
) -> Option<Vec<(NodeId, String)>> {
    arguments
        .iter()
        .map(|&arg| match installer.tree.kind(arg)? {
            NodeKind::Symbol { value } | NodeKind::String { value } => Some((arg, value.clone())),
            _ => None,
        })
        .collect()
}

/// Change the recorded visibility of `name` on the current receiver
pub(super) fn change_visibility(
    installer: &mut AstInstaller,
    name: &str,
    singleton: bool,
    visibility: Visibility,
    line: usize,
) -> BuildResult<()> {
    let owner = installer.current_self_type_name();
    let receiver_name = installer.current_receiver_name(singleton);
    let receiver_id = installer.receiver_id(&receiver_name, line)?;
    let changed = installer
        .genv
        .store
        .change_visibility(receiver_id, name, visibility)?;
    let known = installer
        .genv
        .methods
        .change_visibility(&MethodKey::new(&owner, name, singleton), visibility);
    if changed == 0 && !known {
        tracing::debug!("{} {} on undeclared method {}", visibility.as_str(), owner, name);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_order() {
        let table = HookTable::new();
        assert_eq!(table.len(), 8);

        let hook = table.fetch("", "attr_reader", false).unwrap();
        assert!(!hook.accepts_explicit_receiver());
        assert!(hook.matches("", "attr_reader"));

        let fallback = table.fetch("Foo", "attr_reader", true).unwrap();
        assert!(fallback.accepts_explicit_receiver());
        assert!(fallback.matches("Foo", "anything"));

        assert!(table.fetch("", "private", false).unwrap().matches("", "protected"));
    }
}
