//! Variable Handlers - Processing local, instance and constant variables
//!
//! This module is responsible for:
//! - Local variable reads, writes, operator writes and multiple assignment
//! - Instance variable reads and writes tracked on their class or module
//! - Constant reads (lexical lookup), constant paths and constant assignment

use super::install::AstInstaller;
use crate::error::{BuildError, BuildResult};
use crate::graph::{VertexId, VertexKind};
use crate::store::strip_singleton;
use crate::syntax::{ConstPath, NodeId, NodeKind};

/// Install local variable read: `x`
pub(super) fn install_lvar_read(
    installer: &mut AstInstaller,
    node: NodeId,
    name: &str,
) -> BuildResult<Option<VertexId>> {
    let Some(write) = installer.lookup_lvar(name) else {
        return Err(BuildError::UndefinedLocalVariable {
            name: name.to_string(),
            line: installer.line(node),
        });
    };
    Ok(Some(installer.add_vertex(
        node,
        name,
        VertexKind::LvarRead,
        &[write],
    )))
}

/// Install local variable write: `x = value`, `x += value`, `x ||= value`
pub(super) fn install_lvar_write(
    installer: &mut AstInstaller,
    node: NodeId,
    name: &str,
    value: NodeId,
) -> BuildResult<Option<VertexId>> {
    let value = installer.install_node(value)?;
    let dependencies: Vec<VertexId> = value.into_iter().collect();
    let write = installer.add_vertex(node, name, VertexKind::LvarWrite, &dependencies);
    installer.push_lvar(name, write);
    Ok(Some(write))
}

/// Install multiple assignment: `a, b = 1, "x"`
///
/// When the right-hand side is an array literal of the same length each
/// target reads its own element; otherwise targets stay untyped.
pub(super) fn install_multi_write(
    installer: &mut AstInstaller,
    targets: &[NodeId],
    value: NodeId,
) -> BuildResult<Option<VertexId>> {
    let value_vertex = installer.install_node(value)?;

    let tree = installer.tree;
    let elements: Vec<Option<VertexId>> = match tree.kind(value) {
        Some(NodeKind::Array { elements }) if elements.len() == targets.len() => elements
            .iter()
            .map(|&element| {
                let id = installer.vertex_id(element);
                installer.genv.vertices.contains(id).then_some(id)
            })
            .collect(),
        _ => vec![None; targets.len()],
    };

    let mut writes = Vec::new();
    for (&target, element) in targets.iter().zip(elements) {
        if let Some(NodeKind::LocalVariableTarget { name }) = tree.kind(target) {
            let dependencies: Vec<VertexId> = element.into_iter().collect();
            let write = installer.add_vertex(target, name, VertexKind::LvarWrite, &dependencies);
            writes.push((name, write));
        }
    }
    for (name, write) in writes {
        installer.push_lvar(name, write);
    }

    Ok(value_vertex)
}

/// Install instance variable write: `@name = value`
pub(super) fn install_ivar_write(
    installer: &mut AstInstaller,
    node: NodeId,
    name: &str,
    value: NodeId,
) -> BuildResult<Option<VertexId>> {
    let value = installer.install_node(value)?;
    let owner = installer.self_type_at_call();
    let (class_name, singleton) = strip_singleton(&owner);
    let dependencies: Vec<VertexId> = value.into_iter().collect();
    let write = installer.add_vertex(
        node,
        name,
        VertexKind::IvarWrite {
            owner: owner.clone(),
        },
        &dependencies,
    );

    if let Some(class) = installer
        .genv
        .consts
        .find_mut(class_name)
        .and_then(|constant| constant.as_class_or_module_mut())
    {
        class.add_ivar_write(name, singleton, write);
    }
    Ok(Some(write))
}

/// Install instance variable read: `@name`
pub(super) fn install_ivar_read(
    installer: &mut AstInstaller,
    node: NodeId,
    name: &str,
) -> BuildResult<Option<VertexId>> {
    let owner = installer.self_type_at_call();
    let (class_name, singleton) = strip_singleton(&owner);
    let read = installer.add_vertex(
        node,
        name,
        VertexKind::IvarRead {
            owner: owner.clone(),
        },
        &[],
    );

    if let Some(class) = installer
        .genv
        .consts
        .find_mut(class_name)
        .and_then(|constant| constant.as_class_or_module_mut())
    {
        class.add_ivar_read(name, singleton, read);
    }
    Ok(Some(read))
}

/// Install constant read: `Foo`
///
/// The constant must already be declared somewhere in the session.
pub(super) fn install_constant_read(
    installer: &mut AstInstaller,
    node: NodeId,
    name: &str,
) -> BuildResult<Option<VertexId>> {
    let scope = installer.lexical_scope();
    if installer.genv.consts.lookup(&scope, name).is_none() {
        return Err(BuildError::UndefinedConstant {
            name: name.to_string(),
            line: installer.line(node),
        });
    }
    Ok(Some(const_read(installer, node, scope, name.to_string())))
}

/// Install constant path: `A::B`, `::A`
///
/// An unknown path is not fatal; it is looked up again at inference time.
pub(super) fn install_constant_path(
    installer: &mut AstInstaller,
    node: NodeId,
    path: &ConstPath,
) -> BuildResult<Option<VertexId>> {
    let scope = installer.lexical_scope();
    let constant = if path.absolute {
        format!("::{}", path.joined())
    } else {
        path.joined()
    };
    if installer.genv.consts.lookup(&scope, &constant).is_none() {
        tracing::debug!(
            "constant {} not declared yet (line {})",
            constant,
            installer.line(node)
        );
    }
    Ok(Some(const_read(installer, node, scope, constant)))
}

fn const_read(
    installer: &mut AstInstaller,
    node: NodeId,
    scope: String,
    constant: String,
) -> VertexId {
    installer.add_vertex(
        node,
        constant.clone(),
        VertexKind::ConstRead { scope, constant },
        &[],
    )
}

/// Install constant assignment: `LIMIT = 10`
pub(super) fn install_constant_write(
    installer: &mut AstInstaller,
    name: &str,
    value: NodeId,
) -> BuildResult<Option<VertexId>> {
    let value = installer.install_node(value)?;
    let fqname = installer.qualify(&[name.to_string()]);
    installer
        .genv
        .consts
        .create_variable(&fqname, installer.path, value, None);
    Ok(value)
}

#[cfg(test)]
mod tests {
    use crate::analyzer::{AstInstaller, HookTable};
    use crate::env::{GlobalEnv, MethodKey};
    use crate::graph::{Constraints, VertexId};
    use crate::parser::parse_ruby_source;
    use crate::syntax::{node_at, SyntaxTree};

    fn build(genv: &mut GlobalEnv, source: &str) -> SyntaxTree {
        let tree = parse_ruby_source(source, "test.rb").unwrap();
        let hooks = HookTable::new();
        AstInstaller::new(genv, &hooks, &tree, "test.rb", "hash")
            .install()
            .unwrap();
        tree
    }

    fn show_at(genv: &mut GlobalEnv, tree: &SyntaxTree, line: usize, column: usize) -> String {
        let node = node_at(tree, line, column).unwrap();
        let id = VertexId::new(genv.files.id_of("test.rb").unwrap(), node);
        genv.infer_vertex(id, &Constraints::none()).show()
    }

    #[test]
    fn test_latest_local_write_wins() {
        let mut genv = GlobalEnv::new().unwrap();
        let tree = build(&mut genv, "x = 1\nx = \"s\"\ny = x\n");
        assert_eq!(show_at(&mut genv, &tree, 3, 4), "\"s\"");
    }

    #[test]
    fn test_multi_write_reads_array_elements() {
        let mut genv = GlobalEnv::new().unwrap();
        let tree = build(&mut genv, "a, b = 1, :two\nc = a\nd = b\n");
        assert_eq!(show_at(&mut genv, &tree, 2, 0), "Integer");
        assert_eq!(show_at(&mut genv, &tree, 3, 0), ":two");
    }

    #[test]
    fn test_multi_write_from_non_literal_is_untyped() {
        let mut genv = GlobalEnv::new().unwrap();
        let tree = build(&mut genv, "pair = [1, 2]\na, b = pair\nc = a\n");
        assert_eq!(show_at(&mut genv, &tree, 3, 0), "any");
    }

    #[test]
    fn test_ivar_read_follows_latest_write() {
        let mut genv = GlobalEnv::new().unwrap();
        let source = r#"
class Counter
  def initialize
    @count = 0
  end

  def count
    @count
  end

  def label
    @label
  end
end
"#;
        build(&mut genv, source);

        let count = MethodKey::new("Counter", "count", false);
        let label = MethodKey::new("Counter", "label", false);
        assert_eq!(genv.infer_method_return(&count, &Constraints::none()).show(), "Integer");
        assert_eq!(genv.infer_method_return(&label, &Constraints::none()).show(), "nil");
    }

    #[test]
    fn test_constant_write_and_read() {
        let mut genv = GlobalEnv::new().unwrap();
        let source = "module Config\n  LIMIT = 10\n  def self.limit\n    LIMIT\n  end\nend\n";
        build(&mut genv, source);

        assert!(genv.consts.find("Config::LIMIT").is_some());
        let key = MethodKey::new("Config", "limit", true);
        assert_eq!(genv.infer_method_return(&key, &Constraints::none()).show(), "Integer");
    }

    #[test]
    fn test_constant_path_resolves_class() {
        let mut genv = GlobalEnv::new().unwrap();
        let tree = build(&mut genv, "module A\n  class B\n  end\nend\nx = A::B\n");
        assert_eq!(show_at(&mut genv, &tree, 5, 0), "singleton(A::B)");
    }
}
