//! `attr_reader`, `attr_writer` and `attr_accessor`

use super::{literal_names, CallHook, CallSite, Continuation};
use crate::analyzer::install::AstInstaller;
use crate::env::{MethodKey, MethodKind, NodeEntry};
use crate::error::BuildResult;
use crate::graph::VertexId;
use crate::syntax::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrAccess {
    Reader,
    Writer,
    Accessor,
}

impl AttrAccess {
    pub fn method_name(&self) -> &'static str {
        match self {
            AttrAccess::Reader => "attr_reader",
            AttrAccess::Writer => "attr_writer",
            AttrAccess::Accessor => "attr_accessor",
        }
    }

    fn reads(&self) -> bool {
        matches!(self, AttrAccess::Reader | AttrAccess::Accessor)
    }

    fn writes(&self) -> bool {
        matches!(self, AttrAccess::Writer | AttrAccess::Accessor)
    }
}

/// Declares one accessor method per `:name` argument
///
/// Readers return the type of the latest `@name` write in the class.
pub struct AttrHook {
    access: AttrAccess,
}

impl AttrHook {
    pub fn new(access: AttrAccess) -> Self {
        Self { access }
    }
}

impl CallHook for AttrHook {
    fn matches(&self, _scope: &str, name: &str) -> bool {
        name == self.access.method_name()
    }

    fn apply(
        &self,
        installer: &mut AstInstaller,
        call: &CallSite,
        visit: Continuation,
    ) -> BuildResult<Option<VertexId>> {
        let Some(names) = literal_names(installer, call.arguments) else {
            visit(installer, call)?;
            return Ok(None);
        };

        for (node, name) in names {
            let ivar = format!("@{}", name);
            if self.access.writes() {
                let kind = MethodKind::AttrWriter { ivar: ivar.clone() };
                declare(installer, node, &format!("{}=", name), kind, call.line)?;
            }
            if self.access.reads() {
                let kind = MethodKind::AttrReader { ivar };
                declare(installer, node, &name, kind, call.line)?;
            }
        }
        Ok(None)
    }
}

fn declare(
    installer: &mut AstInstaller,
    node: NodeId,
    name: &str,
    kind: MethodKind,
    line: usize,
) -> BuildResult<()> {
    let singleton = installer.in_singleton;
    let visibility = installer.current_visibility();
    let receiver_name = installer.current_receiver_name(singleton);
    let receiver_id = installer.receiver_id(&receiver_name, line)?;
    installer
        .genv
        .store
        .insert_method(receiver_id, visibility, name, installer.path, line)?;

    let key = MethodKey::new(&installer.current_self_type_name(), name, singleton);
    let entry = installer
        .genv
        .methods
        .add(key.clone(), kind, visibility, installer.path);
    entry.node = Some((installer.file, node));
    entry.line = line;
    installer
        .genv
        .nodes
        .add(installer.file, node, NodeEntry::Method(key));
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::analyzer::{AstInstaller, HookTable};
    use crate::env::{GlobalEnv, MethodKey, MethodKind};
    use crate::graph::Constraints;
    use crate::parser::parse_ruby_source;
    use crate::store::Visibility;

    fn build(genv: &mut GlobalEnv, source: &str) {
        let tree = parse_ruby_source(source, "test.rb").unwrap();
        let hooks = HookTable::new();
        AstInstaller::new(genv, &hooks, &tree, "test.rb", "hash")
            .install()
            .unwrap();
    }

    #[test]
    fn test_attr_reader_reads_ivar() {
        let mut genv = GlobalEnv::new().unwrap();
        let source = r#"
class User
  attr_reader :name

  def initialize
    @name = "anon"
  end
end
"#;
        build(&mut genv, source);

        let key = MethodKey::new("User", "name", false);
        let entry = genv.methods.get(&key).unwrap();
        assert_eq!(
            entry.kind,
            MethodKind::AttrReader {
                ivar: "@name".to_string()
            }
        );
        assert_eq!(entry.visibility, Visibility::Public);
        assert_eq!(
            genv.infer_method_return(&key, &Constraints::none()).show(),
            "\"anon\""
        );
    }

    #[test]
    fn test_attr_accessor_declares_both() {
        let mut genv = GlobalEnv::new().unwrap();
        build(&mut genv, "class User\n  attr_accessor :age, \"email\"\nend\n");

        assert_eq!(
            genv.methods.all_names(),
            vec!["User#age", "User#age=", "User#email", "User#email="]
        );
        let receiver = genv.store.find_receiver("User").unwrap().unwrap();
        let rows = genv.store.methods_of_receiver(receiver.id).unwrap();
        assert_eq!(rows.len(), 4);
    }

    #[test]
    fn test_attr_under_private_is_private() {
        let mut genv = GlobalEnv::new().unwrap();
        build(&mut genv, "class User\n  private\n  attr_writer :token\nend\n");

        let entry = genv.methods.get(&MethodKey::new("User", "token=", false)).unwrap();
        assert_eq!(entry.visibility, Visibility::Private);
    }
}
