//! AST Installer - AST traversal and graph construction
//!
//! This module is responsible for:
//! - Traversing the lowered syntax tree of one file
//! - Tracking lexical state (scope, visibility, local variables, current method)
//! - Coordinating the handler modules that populate the symbol store,
//!   the registries and the vertex graph

use crate::env::{GlobalEnv, MethodKey};
use crate::error::{BuildError, BuildResult};
use crate::graph::{FileId, TypeVertex, VertexId, VertexKind};
use crate::store::{singleton_fqname, strip_singleton, DeclarationSite, ReceiverKind, Visibility};
use crate::syntax::{ConstPath, NodeId, NodeKind, SyntaxTree};
use crate::types::Type;

use super::calls::{install_block, install_call};
use super::control_flow::{
    install_and_or, install_break, install_if, install_next, install_return, install_statements,
    install_unless,
};
use super::definitions::{install_class, install_def, install_module, install_singleton_class};
use super::hooks::HookTable;
use super::literals::{
    install_array, install_embedded_statements, install_hash, install_interpolated_string,
    install_static,
};
use super::variables::{
    install_constant_path, install_constant_read, install_constant_write, install_ivar_read,
    install_ivar_write, install_lvar_read, install_lvar_write, install_multi_write,
};

/// Build graph from one syntax tree
pub struct AstInstaller<'a> {
    pub(super) genv: &'a mut GlobalEnv,
    pub(super) hooks: &'a HookTable,
    pub(super) tree: &'a SyntaxTree,
    pub(super) path: &'a str,
    pub(super) file_hash: &'a str,
    pub(super) file: FileId,

    /// Lexical scope tokens; the first one is always `Object`
    pub(super) scope: Vec<String>,
    /// Inside `class << self`
    pub(super) in_singleton: bool,
    /// Default visibility of the enclosing bodies, innermost last
    pub(super) visibilities: Vec<Visibility>,
    /// `module_function` without arguments is in effect
    pub(super) module_function: bool,
    /// Visible local variables, latest binding last
    pub(super) lvars: Vec<(String, VertexId)>,
    pub(super) current_method: Option<MethodKey>,
    pub(super) return_vertices: Vec<VertexId>,
}

impl<'a> AstInstaller<'a> {
    pub fn new(
        genv: &'a mut GlobalEnv,
        hooks: &'a HookTable,
        tree: &'a SyntaxTree,
        path: &'a str,
        file_hash: &'a str,
    ) -> Self {
        let file = genv.file_id(path);
        Self {
            genv,
            hooks,
            tree,
            path,
            file_hash,
            file,
            scope: vec!["Object".to_string()],
            in_singleton: false,
            visibilities: vec![Visibility::Private],
            module_function: false,
            lvars: Vec::new(),
            current_method: None,
            return_vertices: Vec::new(),
        }
    }

    /// Install the whole tree
    pub fn install(&mut self) -> BuildResult<()> {
        self.install_node(self.tree.root())?;
        Ok(())
    }

    /// Install node (returns the vertex holding its value, if any)
    pub fn install_node(&mut self, node: NodeId) -> BuildResult<Option<VertexId>> {
        let tree = self.tree;
        let Some(kind) = tree.kind(node) else {
            return Ok(None);
        };

        match kind {
            NodeKind::Program { statements } => self.install_node(*statements),
            NodeKind::Statements { body } => install_statements(self, body),

            // Definitions
            NodeKind::Class {
                constant_path,
                superclass,
                body,
            } => install_class(self, node, constant_path, *superclass, *body),
            NodeKind::Module {
                constant_path,
                body,
            } => install_module(self, node, constant_path, *body),
            NodeKind::SingletonClass { body } => install_singleton_class(self, *body),
            NodeKind::Def {
                name,
                singleton,
                parameters,
                body,
            } => install_def(self, node, name, *singleton, *parameters, *body),

            // Calls
            NodeKind::Call {
                receiver,
                name,
                arguments,
                block,
            } => install_call(self, node, *receiver, name, arguments, *block),
            NodeKind::Block { parameters, body } => {
                install_block(self, *parameters, *body)?;
                Ok(None)
            }

            // Variables
            NodeKind::LocalVariableRead { name } => install_lvar_read(self, node, name),
            NodeKind::LocalVariableWrite { name, value }
            | NodeKind::LocalVariableOperatorWrite { name, value } => {
                install_lvar_write(self, node, name, *value)
            }
            NodeKind::MultiWrite { targets, value } => {
                install_multi_write(self, targets, *value)
            }
            NodeKind::InstanceVariableRead { name } => install_ivar_read(self, node, name),
            NodeKind::InstanceVariableWrite { name, value } => {
                install_ivar_write(self, node, name, *value)
            }
            NodeKind::ConstantRead { name } => install_constant_read(self, node, name),
            NodeKind::ConstantPath { path } => install_constant_path(self, node, path),
            NodeKind::ConstantWrite { name, value } => {
                install_constant_write(self, name, *value)
            }

            // Control flow
            NodeKind::If {
                predicate,
                statements,
                subsequent,
            } => install_if(self, node, *predicate, *statements, *subsequent),
            NodeKind::Unless {
                predicate,
                statements,
                else_clause,
            } => install_unless(self, node, *predicate, *statements, *else_clause),
            NodeKind::Else { statements } => self.install_optional(*statements),
            NodeKind::And { left, right } | NodeKind::Or { left, right } => {
                install_and_or(self, node, *left, *right)
            }
            NodeKind::Loop {
                predicate,
                statements,
            } => {
                self.install_node(*predicate)?;
                self.install_optional(*statements)?;
                Ok(Some(install_static(self, node, "while", Type::Nil)))
            }
            NodeKind::Return { arguments } => install_return(self, node, arguments),
            NodeKind::Break { arguments } => install_break(self, node, arguments),
            NodeKind::Next { arguments } => install_next(self, arguments),
            NodeKind::Parentheses { body } => self.install_optional(*body),

            // Literals
            NodeKind::Array { elements } => install_array(self, node, elements),
            NodeKind::Hash { elements } => install_hash(self, node, elements),
            NodeKind::InterpolatedString { parts } => {
                install_interpolated_string(self, node, parts)
            }
            NodeKind::EmbeddedStatements { statements } => {
                install_embedded_statements(self, node, *statements)
            }
            NodeKind::String { value } => {
                Ok(Some(install_static(self, node, "str", Type::string_literal(value))))
            }
            NodeKind::Symbol { value } => {
                Ok(Some(install_static(self, node, "sym", Type::symbol(value))))
            }
            NodeKind::Integer => Ok(Some(install_static(self, node, "int", Type::Integer))),
            NodeKind::Float => Ok(Some(install_static(
                self,
                node,
                "float",
                Type::instance("Float"),
            ))),
            NodeKind::True => Ok(Some(install_static(self, node, "true", Type::True))),
            NodeKind::False => Ok(Some(install_static(self, node, "false", Type::False))),
            NodeKind::Nil => Ok(Some(install_static(self, node, "nil", Type::Nil))),
            NodeKind::SelfRef => {
                let self_type = self.self_type_at_call();
                let (name, singleton) = strip_singleton(&self_type);
                let ty = Type::from_receiver(name, singleton);
                Ok(Some(install_static(self, node, "self", ty)))
            }

            // Handled by their parent
            NodeKind::Parameters { .. }
            | NodeKind::RequiredParameter { .. }
            | NodeKind::OptionalParameter { .. }
            | NodeKind::RestParameter { .. }
            | NodeKind::RequiredKeywordParameter { .. }
            | NodeKind::OptionalKeywordParameter { .. }
            | NodeKind::KeywordRestParameter { .. }
            | NodeKind::BlockParameter { .. }
            | NodeKind::LocalVariableTarget { .. }
            | NodeKind::Assoc { .. } => Ok(None),

            NodeKind::Other => Ok(None),
        }
    }

    pub(super) fn install_optional(&mut self, node: Option<NodeId>) -> BuildResult<Option<VertexId>> {
        match node {
            Some(node) => self.install_node(node),
            None => Ok(None),
        }
    }

    /// Install every node, collecting the ones that produced a vertex
    pub(super) fn install_each(&mut self, nodes: &[NodeId]) -> BuildResult<Vec<VertexId>> {
        let mut vertices = Vec::with_capacity(nodes.len());
        for &node in nodes {
            if let Some(vertex) = self.install_node(node)? {
                vertices.push(vertex);
            }
        }
        Ok(vertices)
    }

    // ===== Vertices =====

    pub(super) fn vertex_id(&self, node: NodeId) -> VertexId {
        VertexId::new(self.file, node)
    }

    /// Create a vertex for `node` with the given dependencies
    pub(super) fn add_vertex(
        &mut self,
        node: NodeId,
        name: impl Into<String>,
        kind: VertexKind,
        dependencies: &[VertexId],
    ) -> VertexId {
        let id = self
            .genv
            .new_vertex(TypeVertex::new(self.vertex_id(node), name, kind));
        for &dependency in dependencies {
            self.genv.add_dependency(id, dependency);
        }
        id
    }

    // ===== Lexical State =====

    pub(super) fn line(&self, node: NodeId) -> usize {
        self.tree.span(node).start_line
    }

    pub(super) fn site(&self, line: usize) -> DeclarationSite {
        DeclarationSite::new(self.path, line, self.file_hash)
    }

    /// Fqname of the innermost class or module, `Object` at top level
    pub(super) fn current_self_type_name(&self) -> String {
        if self.scope.len() == 1 {
            "Object".to_string()
        } else {
            self.scope[1..].join("::")
        }
    }

    /// Receiver that a `def` or accessor in the current body is declared on
    pub(super) fn current_receiver_name(&self, singleton: bool) -> String {
        let owner = self.current_self_type_name();
        if singleton {
            singleton_fqname(&owner)
        } else {
            owner
        }
    }

    /// `names` qualified by the current lexical scope
    pub(super) fn qualify(&self, names: &[String]) -> String {
        self.scope[1..]
            .iter()
            .chain(names)
            .cloned()
            .collect::<Vec<_>>()
            .join("::")
    }

    /// Fqname declared by a class or module header
    pub(super) fn declared_name(&self, path: &ConstPath) -> String {
        if path.absolute {
            path.joined()
        } else {
            self.qualify(&path.names)
        }
    }

    /// Scope used for constant lookup, "" at top level
    pub(super) fn lexical_scope(&self) -> String {
        self.scope[1..].join("::")
    }

    pub(super) fn current_visibility(&self) -> Visibility {
        self.visibilities
            .last()
            .copied()
            .unwrap_or(Visibility::Public)
    }

    pub(super) fn set_current_visibility(&mut self, visibility: Visibility) {
        if let Some(current) = self.visibilities.last_mut() {
            *current = visibility;
        }
    }

    /// Fqname of `self` where a call is written
    pub(super) fn self_type_at_call(&self) -> String {
        match &self.current_method {
            Some(key) if key.singleton => singleton_fqname(&key.receiver),
            Some(key) => key.receiver.clone(),
            None if self.scope.len() == 1 => "Object".to_string(),
            None => singleton_fqname(&self.current_self_type_name()),
        }
    }

    pub(super) fn lookup_lvar(&self, name: &str) -> Option<VertexId> {
        self.lvars
            .iter()
            .rev()
            .find(|(lvar, _)| lvar == name)
            .map(|(_, id)| *id)
    }

    pub(super) fn push_lvar(&mut self, name: &str, vertex: VertexId) {
        self.lvars.push((name.to_string(), vertex));
    }

    /// Symbol store id of a receiver, registering top-level `Object` on demand
    pub(super) fn receiver_id(&mut self, fqname: &str, line: usize) -> BuildResult<i64> {
        if let Some(receiver) = self.genv.store.find_receiver(fqname)? {
            return Ok(receiver.id);
        }
        let (base, singleton) = strip_singleton(fqname);
        if base == "Object" {
            let site = self.site(line);
            return Ok(self
                .genv
                .store
                .insert_receiver(ReceiverKind::Class, fqname, singleton, &site)?);
        }
        Err(BuildError::MissingReceiver {
            fqname: fqname.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Constraints;
    use crate::parser::parse_ruby_source;

    fn build(genv: &mut GlobalEnv, source: &str) -> BuildResult<SyntaxTree> {
        let tree = parse_ruby_source(source, "test.rb").unwrap();
        let hooks = HookTable::new();
        AstInstaller::new(genv, &hooks, &tree, "test.rb", "hash").install()?;
        Ok(tree)
    }

    fn show_at(genv: &mut GlobalEnv, tree: &SyntaxTree, line: usize, column: usize) -> String {
        let node = crate::syntax::node_at(tree, line, column).unwrap();
        let id = VertexId::new(genv.files.id_of("test.rb").unwrap(), node);
        genv.infer_vertex(id, &Constraints::none()).show()
    }

    #[test]
    fn test_install_literal() {
        let mut genv = GlobalEnv::new().unwrap();
        let tree = build(&mut genv, r#"x = "hello""#).unwrap();
        assert_eq!(show_at(&mut genv, &tree, 1, 0), r#""hello""#);
    }

    #[test]
    fn test_install_multiple_vars() {
        let mut genv = GlobalEnv::new().unwrap();
        let source = "x = 42\ny = x\n";
        let tree = build(&mut genv, source).unwrap();
        assert_eq!(show_at(&mut genv, &tree, 2, 0), "Integer");
    }

    #[test]
    fn test_undefined_constant_is_fatal() {
        let mut genv = GlobalEnv::new().unwrap();
        let err = build(&mut genv, "x = 1\nMissing\n").unwrap_err();
        assert!(matches!(
            err,
            BuildError::UndefinedConstant { ref name, line: 2 } if name == "Missing"
        ));
    }

    #[test]
    fn test_install_nested_module_class() {
        let mut genv = GlobalEnv::new().unwrap();
        let source = r#"
module Api
  class User
    def greet
      "hello"
    end
  end
end
"#;
        build(&mut genv, source).unwrap();

        assert!(genv.consts.find_class_or_module("Api").is_some());
        assert!(genv.consts.find_class_or_module("Api::User").is_some());
        assert!(genv.store.find_receiver("singleton(Api::User)").unwrap().is_some());
        assert_eq!(
            genv.infer_method_return(&MethodKey::new("Api::User", "greet", false), &Constraints::none())
                .show(),
            r#""hello""#
        );
    }

    #[test]
    fn test_self_type_at_call() {
        let mut genv = GlobalEnv::new().unwrap();
        let tree = parse_ruby_source("", "test.rb").unwrap();
        let hooks = HookTable::new();
        let mut installer = AstInstaller::new(&mut genv, &hooks, &tree, "test.rb", "hash");
        assert_eq!(installer.self_type_at_call(), "Object");

        installer.scope.push("Foo".to_string());
        assert_eq!(installer.self_type_at_call(), "singleton(Foo)");
        assert_eq!(installer.qualify(&["Bar".to_string()]), "Foo::Bar");

        installer.current_method = Some(MethodKey::new("Foo", "bar", false));
        assert_eq!(installer.self_type_at_call(), "Foo");
        installer.current_method = Some(MethodKey::new("Foo", "bar", true));
        assert_eq!(installer.self_type_at_call(), "singleton(Foo)");
    }
}
