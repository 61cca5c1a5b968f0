//! Control Flow Handlers - Processing branches and jumps
//!
//! This module is responsible for:
//! - Statement sequences, whose value is the last statement
//! - `if`/`unless`/`&&`/`||` as union vertices over their branches
//! - `return` (feeding the enclosing method's return vertices), `break` and `next`

use super::install::AstInstaller;
use super::literals::install_static;
use crate::error::BuildResult;
use crate::graph::{VertexId, VertexKind};
use crate::syntax::NodeId;
use crate::types::Type;

/// Install statements; the value is the last statement's
pub(super) fn install_statements(
    installer: &mut AstInstaller,
    body: &[NodeId],
) -> BuildResult<Option<VertexId>> {
    let mut last = None;
    for &statement in body {
        last = installer.install_node(statement)?;
    }
    Ok(last)
}

/// Install `if` / `elsif` / ternary
pub(super) fn install_if(
    installer: &mut AstInstaller,
    node: NodeId,
    predicate: NodeId,
    statements: Option<NodeId>,
    subsequent: Option<NodeId>,
) -> BuildResult<Option<VertexId>> {
    installer.install_node(predicate)?;
    install_branches(installer, node, statements, subsequent)
}

/// Install `unless`
pub(super) fn install_unless(
    installer: &mut AstInstaller,
    node: NodeId,
    predicate: NodeId,
    statements: Option<NodeId>,
    else_clause: Option<NodeId>,
) -> BuildResult<Option<VertexId>> {
    installer.install_node(predicate)?;
    install_branches(installer, node, statements, else_clause)
}

/// Both branches feed one `If` vertex; a missing or empty branch adds `nil`
fn install_branches(
    installer: &mut AstInstaller,
    node: NodeId,
    then_branch: Option<NodeId>,
    else_branch: Option<NodeId>,
) -> BuildResult<Option<VertexId>> {
    let then_value = installer.install_optional(then_branch)?;
    let else_value = installer.install_optional(else_branch)?;
    let missing_branch = then_value.is_none() || else_value.is_none();

    let dependencies: Vec<VertexId> = then_value.into_iter().chain(else_value).collect();
    Ok(Some(installer.add_vertex(
        node,
        "if",
        VertexKind::If { missing_branch },
        &dependencies,
    )))
}

/// Install `a && b` / `a || b` as the union of both sides
pub(super) fn install_and_or(
    installer: &mut AstInstaller,
    node: NodeId,
    left: NodeId,
    right: NodeId,
) -> BuildResult<Option<VertexId>> {
    let left = installer.install_node(left)?;
    let right = installer.install_node(right)?;
    let dependencies: Vec<VertexId> = left.into_iter().chain(right).collect();
    Ok(Some(installer.add_vertex(
        node,
        "if",
        VertexKind::If {
            missing_branch: false,
        },
        &dependencies,
    )))
}

/// Install `return`
///
/// The returned values join the enclosing method's return vertices; the
/// statement itself has no value.
pub(super) fn install_return(
    installer: &mut AstInstaller,
    node: NodeId,
    arguments: &[NodeId],
) -> BuildResult<Option<VertexId>> {
    if arguments.is_empty() {
        let nil = install_static(installer, node, "return", Type::Nil);
        installer.return_vertices.push(nil);
        return Ok(None);
    }

    let values = installer.install_each(arguments)?;
    installer.return_vertices.extend(values);
    Ok(None)
}

/// Install `break`
pub(super) fn install_break(
    installer: &mut AstInstaller,
    node: NodeId,
    arguments: &[NodeId],
) -> BuildResult<Option<VertexId>> {
    let values = installer.install_each(arguments)?;
    Ok(Some(installer.add_vertex(node, "break", VertexKind::Break, &values)))
}

/// Install `next`; its value goes to the block, which is not tracked
pub(super) fn install_next(
    installer: &mut AstInstaller,
    arguments: &[NodeId],
) -> BuildResult<Option<VertexId>> {
    installer.install_each(arguments)?;
    Ok(None)
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

    fn show_at(genv: &mut GlobalEnv, tree: &SyntaxTree, line: usize) -> String {
        let node = node_at(tree, line, 0).unwrap();
        let id = VertexId::new(genv.files.id_of("test.rb").unwrap(), node);
        genv.infer_vertex(id, &Constraints::none()).show()
    }

    #[test]
    fn test_if_with_else_is_union() {
        let mut genv = GlobalEnv::new().unwrap();
        let tree = build(&mut genv, "flag = true\nx = if flag then 1 else \"a\" end\n");
        assert_eq!(show_at(&mut genv, &tree, 2), "Integer | \"a\"");
    }

    #[test]
    fn test_if_without_else_adds_nil() {
        let mut genv = GlobalEnv::new().unwrap();
        let tree = build(&mut genv, "flag = true\nx = if flag then 1 end\n");
        assert_eq!(show_at(&mut genv, &tree, 2), "Integer | nil");
    }

    #[test]
    fn test_unless_and_or() {
        let mut genv = GlobalEnv::new().unwrap();
        let source = "flag = false\nx = unless flag then :a else :b end\ny = flag || 1\n";
        let tree = build(&mut genv, source);
        assert_eq!(show_at(&mut genv, &tree, 2), ":a | :b");
        assert_eq!(show_at(&mut genv, &tree, 3), "false | Integer");
    }

    #[test]
    fn test_bare_return_is_nil() {
        let mut genv = GlobalEnv::new().unwrap();
        let source = r#"
class Foo
  def maybe(flag)
    return unless flag
    :ok
  end
end
"#;
        build(&mut genv, source);
        let key = MethodKey::new("Foo", "maybe", false);
        assert_eq!(
            genv.infer_method_return(&key, &Constraints::none()).show(),
            "nil | :ok"
        );
    }
}
