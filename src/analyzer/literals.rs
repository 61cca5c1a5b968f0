//! Literal Handlers - Processing Ruby literal values
//!
//! This module is responsible for:
//! - Fixed-type literals (integers, floats, strings, symbols, nil, true, false, self)
//! - Array literals, whose type is the union of their elements
//! - Hash literals, keeping one key/value pair per entry
//! - String interpolation and the statements embedded in it

use super::install::AstInstaller;
use crate::error::BuildResult;
use crate::graph::{VertexId, VertexKind};
use crate::syntax::{NodeId, NodeKind};
use crate::types::Type;

/// Install a literal whose type is known up front
pub(super) fn install_static(
    installer: &mut AstInstaller,
    node: NodeId,
    name: &str,
    ty: Type,
) -> VertexId {
    installer.add_vertex(node, name, VertexKind::Static(ty), &[])
}

/// Install array literal: `[1, "a"]`
pub(super) fn install_array(
    installer: &mut AstInstaller,
    node: NodeId,
    elements: &[NodeId],
) -> BuildResult<Option<VertexId>> {
    let elements = installer.install_each(elements)?;
    Ok(Some(installer.add_vertex(node, "array", VertexKind::Array, &elements)))
}

/// Install hash literal: `{ a: 1, "b" => 2 }`
///
/// Dependencies alternate key and value; entries without a typed key or
/// value (such as `**splat`) are skipped.
pub(super) fn install_hash(
    installer: &mut AstInstaller,
    node: NodeId,
    elements: &[NodeId],
) -> BuildResult<Option<VertexId>> {
    let tree = installer.tree;
    let mut dependencies = Vec::with_capacity(elements.len() * 2);

    for &element in elements {
        match tree.kind(element) {
            Some(NodeKind::Assoc { key, value }) => {
                let key = installer.install_node(*key)?;
                let value = installer.install_node(*value)?;
                if let (Some(key), Some(value)) = (key, value) {
                    dependencies.push(key);
                    dependencies.push(value);
                }
            }
            _ => {
                installer.install_node(element)?;
            }
        }
    }

    Ok(Some(installer.add_vertex(node, "hash", VertexKind::Hash, &dependencies)))
}

/// Install interpolated string: `"hello #{name}"`
pub(super) fn install_interpolated_string(
    installer: &mut AstInstaller,
    node: NodeId,
    parts: &[NodeId],
) -> BuildResult<Option<VertexId>> {
    let parts = installer.install_each(parts)?;
    Ok(Some(installer.add_vertex(
        node,
        "dstr",
        VertexKind::InterpolatedString,
        &parts,
    )))
}

/// Install the `#{...}` part of an interpolated string
pub(super) fn install_embedded_statements(
    installer: &mut AstInstaller,
    node: NodeId,
    statements: Option<NodeId>,
) -> BuildResult<Option<VertexId>> {
    let value = installer.install_optional(statements)?;
    let dependencies: Vec<VertexId> = value.into_iter().collect();
    Ok(Some(installer.add_vertex(
        node,
        "embedded",
        VertexKind::EmbeddedStatements,
        &dependencies,
    )))
}

#[cfg(test)]
mod tests {
    use crate::analyzer::{AstInstaller, HookTable};
    use crate::env::GlobalEnv;
    use crate::graph::{Constraints, VertexId};
    use crate::parser::parse_ruby_source;
    use crate::syntax::node_at;

    /// Type of the value assigned on the first line
    fn show_assigned(source: &str) -> String {
        let tree = parse_ruby_source(source, "test.rb").unwrap();
        let mut genv = GlobalEnv::new().unwrap();
        let hooks = HookTable::new();
        AstInstaller::new(&mut genv, &hooks, &tree, "test.rb", "hash")
            .install()
            .unwrap();
        let node = node_at(&tree, 1, 0).unwrap();
        let id = VertexId::new(genv.files.id_of("test.rb").unwrap(), node);
        genv.infer_vertex(id, &Constraints::none()).show()
    }

    #[test]
    fn test_scalar_literals() {
        assert_eq!(show_assigned("x = 1"), "Integer");
        assert_eq!(show_assigned("x = 1.5"), "Float");
        assert_eq!(show_assigned("x = :sym"), ":sym");
        assert_eq!(show_assigned("x = nil"), "nil");
        assert_eq!(show_assigned("x = true"), "true");
        assert_eq!(show_assigned("x = self"), "Object");
    }

    #[test]
    fn test_array_literals() {
        assert_eq!(show_assigned("x = [1, 2]"), "[Integer]");
        assert_eq!(show_assigned("x = [1, :a]"), "[Integer | :a]");
        assert_eq!(show_assigned("x = []"), "[]");
    }

    #[test]
    fn test_hash_literals() {
        assert_eq!(show_assigned("x = { a: 1, b: \"s\" }"), "{ a: Integer, b: \"s\" }");
        assert_eq!(show_assigned("x = {}"), "{}");
    }

    #[test]
    fn test_interpolated_string() {
        assert_eq!(show_assigned("x = \"n=#{1}\""), "String");
    }
}
