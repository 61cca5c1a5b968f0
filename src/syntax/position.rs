//! Editor position to syntax node mapping

use super::tree::{NodeId, SyntaxTree};

/// Innermost node whose span contains (line, column)
///
/// `line` is 1-based and `column` is a 0-based byte column. Children win over
/// their parent, so a position on a `def` header that is outside the
/// parameters and body maps to the def itself.
pub fn node_at(tree: &SyntaxTree, line: usize, column: usize) -> Option<NodeId> {
    let root = tree.root();
    let root_node = tree.node(root)?;
    if !root_node.span.contains(line, column) {
        return None;
    }

    let mut current = root;
    'descend: loop {
        let Some(node) = tree.node(current) else {
            break;
        };
        for child in node.kind.children() {
            if tree.span(child).contains(line, column) {
                current = child;
                continue 'descend;
            }
        }
        break;
    }

    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_ruby_source;
    use crate::syntax::NodeKind;

    #[test]
    fn test_node_at_finds_innermost_node() {
        let tree = parse_ruby_source("x = 1\ny = x\n", "test.rb").unwrap();

        let id = node_at(&tree, 2, 4).unwrap();
        assert!(matches!(
            tree.kind(id),
            Some(NodeKind::LocalVariableRead { name }) if name == "x"
        ));
    }

    #[test]
    fn test_node_at_def_header() {
        let source = "def hello(a)\n  a\nend\n";
        let tree = parse_ruby_source(source, "test.rb").unwrap();

        let id = node_at(&tree, 1, 5).unwrap();
        assert!(matches!(tree.kind(id), Some(NodeKind::Def { name, .. }) if name == "hello"));
    }

    #[test]
    fn test_node_at_outside_source() {
        let tree = parse_ruby_source("x = 1\n", "test.rb").unwrap();
        assert!(node_at(&tree, 10, 0).is_none());
    }
}
