//! Ruby parsing: prism front-end lowered into an owned `SyntaxTree`

use crate::error::ParseError;
use crate::source_map::LineIndex;
use crate::syntax::{ConstPath, NodeId, NodeKind, Span, SyntaxNode, SyntaxTree};
use ruby_prism::{parse, ArgumentsNode, Location, Node, NodeList, ParametersNode, StatementsNode};

/// Parse Ruby source code string
///
/// The first syntax error reported by prism fails the whole parse.
pub fn parse_ruby_source(source: &str, file_name: &str) -> Result<SyntaxTree, ParseError> {
    let parse_result = parse(source.as_bytes());
    let index = LineIndex::new(source);

    if let Some(error) = parse_result.errors().next() {
        let (line, _) = index.line_column(error.location().start_offset());
        return Err(ParseError {
            file: file_name.to_string(),
            line,
            message: error.message().to_string(),
        });
    }

    let mut lowering = Lowering {
        index,
        nodes: Vec::new(),
    };
    lowering.lower(&parse_result.node());

    Ok(SyntaxTree::from_nodes(lowering.nodes))
}

fn name_of(id: &ruby_prism::ConstantId) -> String {
    String::from_utf8_lossy(id.as_slice()).to_string()
}

fn extract_constant_path(node: &Node) -> Option<ConstPath> {
    if let Some(constant_read) = node.as_constant_read_node() {
        return Some(ConstPath {
            names: vec![name_of(&constant_read.name())],
            absolute: false,
        });
    }

    if let Some(constant_path) = node.as_constant_path_node() {
        let name = constant_path.name().map(|id| name_of(&id))?;

        return match constant_path.parent() {
            Some(parent) => {
                let mut path = extract_constant_path(&parent)?;
                path.names.push(name);
                Some(path)
            }
            // `::Foo`
            None => Some(ConstPath {
                names: vec![name],
                absolute: true,
            }),
        };
    }

    None
}

struct Lowering {
    index: LineIndex,
    nodes: Vec<SyntaxNode>,
}

impl Lowering {
    /// Reserve the next preorder id before lowering children
    fn alloc(&mut self, location: &Location) -> NodeId {
        let start_offset = location.start_offset();
        let end_offset = location.end_offset();
        let (start_line, start_column) = self.index.line_column(start_offset);
        let (end_line, end_column) = self.index.line_column(end_offset);

        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(SyntaxNode {
            id,
            kind: NodeKind::Other,
            span: Span {
                start_offset,
                end_offset,
                start_line,
                start_column,
                end_line,
                end_column,
            },
        });
        id
    }

    fn finish(&mut self, id: NodeId, kind: NodeKind) -> NodeId {
        if let Some(node) = self.nodes.get_mut(id.0 as usize) {
            node.kind = kind;
        }
        id
    }

    fn lower_list(&mut self, list: &NodeList) -> Vec<NodeId> {
        list.iter().map(|node| self.lower(&node)).collect()
    }

    fn lower_arguments(&mut self, arguments: Option<ArgumentsNode>) -> Vec<NodeId> {
        match arguments {
            Some(args) => self.lower_list(&args.arguments()),
            None => Vec::new(),
        }
    }

    fn lower_statements(&mut self, statements: &StatementsNode) -> NodeId {
        let id = self.alloc(&statements.location());
        let body = self.lower_list(&statements.body());
        self.finish(id, NodeKind::Statements { body })
    }

    fn lower_optional_statements(&mut self, statements: Option<StatementsNode>) -> Option<NodeId> {
        statements.map(|s| self.lower_statements(&s))
    }

    fn lower_parameters(&mut self, params: &ParametersNode) -> NodeId {
        let id = self.alloc(&params.location());
        let requireds = self.lower_list(&params.requireds());
        let optionals = self.lower_list(&params.optionals());
        let rest = params.rest().map(|n| self.lower(&n));
        let keywords = self.lower_list(&params.keywords());
        let keyword_rest = params.keyword_rest().map(|n| self.lower(&n));
        let block = params.block().map(|block_param| {
            let block_id = self.alloc(&block_param.location());
            let name = block_param.name().map(|n| name_of(&n));
            self.finish(block_id, NodeKind::BlockParameter { name })
        });
        self.finish(
            id,
            NodeKind::Parameters {
                requireds,
                optionals,
                rest,
                keywords,
                keyword_rest,
                block,
            },
        )
    }

    fn lower(&mut self, node: &Node) -> NodeId {
        let id = self.alloc(&node.location());
        let kind = self.lower_kind(node);
        self.finish(id, kind)
    }

    fn lower_kind(&mut self, node: &Node) -> NodeKind {
        // Definitions
        if let Some(program) = node.as_program_node() {
            let statements = self.lower_statements(&program.statements());
            return NodeKind::Program { statements };
        }
        if let Some(statements) = node.as_statements_node() {
            let body = self.lower_list(&statements.body());
            return NodeKind::Statements { body };
        }
        if let Some(class_node) = node.as_class_node() {
            let Some(constant_path) = extract_constant_path(&class_node.constant_path()) else {
                return NodeKind::Other;
            };
            let superclass = class_node.superclass().map(|n| self.lower(&n));
            let body = class_node.body().map(|n| self.lower(&n));
            return NodeKind::Class {
                constant_path,
                superclass,
                body,
            };
        }
        if let Some(module_node) = node.as_module_node() {
            let Some(constant_path) = extract_constant_path(&module_node.constant_path()) else {
                return NodeKind::Other;
            };
            let body = module_node.body().map(|n| self.lower(&n));
            return NodeKind::Module {
                constant_path,
                body,
            };
        }
        if let Some(singleton_class) = node.as_singleton_class_node() {
            if singleton_class.expression().as_self_node().is_none() {
                return NodeKind::Other;
            }
            let body = singleton_class.body().map(|n| self.lower(&n));
            return NodeKind::SingletonClass { body };
        }
        if let Some(def_node) = node.as_def_node() {
            let singleton = def_node
                .receiver()
                .map(|r| r.as_self_node().is_some())
                .unwrap_or(false);
            let parameters = def_node.parameters().map(|p| self.lower_parameters(&p));
            let body = def_node.body().map(|n| self.lower(&n));
            return NodeKind::Def {
                name: name_of(&def_node.name()),
                singleton,
                parameters,
                body,
            };
        }
        if let Some(begin_node) = node.as_begin_node() {
            let body = self.lower_optional_statements(begin_node.statements());
            return NodeKind::Parentheses { body };
        }

        // Parameters
        if let Some(param) = node.as_required_parameter_node() {
            return NodeKind::RequiredParameter {
                name: name_of(&param.name()),
            };
        }
        if let Some(param) = node.as_optional_parameter_node() {
            let value = self.lower(&param.value());
            return NodeKind::OptionalParameter {
                name: name_of(&param.name()),
                value,
            };
        }
        if let Some(param) = node.as_rest_parameter_node() {
            return NodeKind::RestParameter {
                name: param.name().map(|n| name_of(&n)),
            };
        }
        if let Some(param) = node.as_required_keyword_parameter_node() {
            return NodeKind::RequiredKeywordParameter {
                name: name_of(&param.name()),
            };
        }
        if let Some(param) = node.as_optional_keyword_parameter_node() {
            let value = self.lower(&param.value());
            return NodeKind::OptionalKeywordParameter {
                name: name_of(&param.name()),
                value,
            };
        }
        if let Some(param) = node.as_keyword_rest_parameter_node() {
            return NodeKind::KeywordRestParameter {
                name: param.name().map(|n| name_of(&n)),
            };
        }

        // Calls and blocks
        if let Some(call_node) = node.as_call_node() {
            let receiver = call_node.receiver().map(|n| self.lower(&n));
            let arguments = self.lower_arguments(call_node.arguments());
            let block = call_node.block().and_then(|b| {
                if b.as_block_node().is_some() {
                    Some(self.lower(&b))
                } else {
                    None
                }
            });
            return NodeKind::Call {
                receiver,
                name: name_of(&call_node.name()),
                arguments,
                block,
            };
        }
        if let Some(block_node) = node.as_block_node() {
            let parameters = block_node.parameters().and_then(|p| {
                p.as_block_parameters_node()
                    .and_then(|bp| bp.parameters())
                    .map(|params| self.lower_parameters(&params))
            });
            let body = block_node.body().map(|n| self.lower(&n));
            return NodeKind::Block { parameters, body };
        }

        // Variables
        if let Some(read) = node.as_local_variable_read_node() {
            return NodeKind::LocalVariableRead {
                name: name_of(&read.name()),
            };
        }
        if let Some(write) = node.as_local_variable_write_node() {
            let value = self.lower(&write.value());
            return NodeKind::LocalVariableWrite {
                name: name_of(&write.name()),
                value,
            };
        }
        if let Some(target) = node.as_local_variable_target_node() {
            return NodeKind::LocalVariableTarget {
                name: name_of(&target.name()),
            };
        }
        if let Some(write) = node.as_local_variable_operator_write_node() {
            let value = self.lower(&write.value());
            return NodeKind::LocalVariableOperatorWrite {
                name: name_of(&write.name()),
                value,
            };
        }
        if let Some(write) = node.as_local_variable_or_write_node() {
            let value = self.lower(&write.value());
            return NodeKind::LocalVariableOperatorWrite {
                name: name_of(&write.name()),
                value,
            };
        }
        if let Some(write) = node.as_local_variable_and_write_node() {
            let value = self.lower(&write.value());
            return NodeKind::LocalVariableOperatorWrite {
                name: name_of(&write.name()),
                value,
            };
        }
        if let Some(read) = node.as_instance_variable_read_node() {
            return NodeKind::InstanceVariableRead {
                name: name_of(&read.name()),
            };
        }
        if let Some(write) = node.as_instance_variable_write_node() {
            let value = self.lower(&write.value());
            return NodeKind::InstanceVariableWrite {
                name: name_of(&write.name()),
                value,
            };
        }
        if let Some(read) = node.as_constant_read_node() {
            return NodeKind::ConstantRead {
                name: name_of(&read.name()),
            };
        }
        if node.as_constant_path_node().is_some() {
            return match extract_constant_path(node) {
                Some(path) => NodeKind::ConstantPath { path },
                None => NodeKind::Other,
            };
        }
        if let Some(write) = node.as_constant_write_node() {
            let value = self.lower(&write.value());
            return NodeKind::ConstantWrite {
                name: name_of(&write.name()),
                value,
            };
        }
        if let Some(multi_write) = node.as_multi_write_node() {
            let targets = self.lower_list(&multi_write.lefts());
            let value = self.lower(&multi_write.value());
            return NodeKind::MultiWrite { targets, value };
        }

        // Control flow
        if let Some(if_node) = node.as_if_node() {
            let predicate = self.lower(&if_node.predicate());
            let statements = self.lower_optional_statements(if_node.statements());
            let subsequent = if_node.subsequent().map(|n| self.lower(&n));
            return NodeKind::If {
                predicate,
                statements,
                subsequent,
            };
        }
        if let Some(unless_node) = node.as_unless_node() {
            let predicate = self.lower(&unless_node.predicate());
            let statements = self.lower_optional_statements(unless_node.statements());
            let else_clause = unless_node.else_clause().map(|else_node| {
                let else_id = self.alloc(&else_node.location());
                let statements = self.lower_optional_statements(else_node.statements());
                self.finish(else_id, NodeKind::Else { statements })
            });
            return NodeKind::Unless {
                predicate,
                statements,
                else_clause,
            };
        }
        if let Some(else_node) = node.as_else_node() {
            let statements = self.lower_optional_statements(else_node.statements());
            return NodeKind::Else { statements };
        }
        if let Some(while_node) = node.as_while_node() {
            let predicate = self.lower(&while_node.predicate());
            let statements = self.lower_optional_statements(while_node.statements());
            return NodeKind::Loop {
                predicate,
                statements,
            };
        }
        if let Some(until_node) = node.as_until_node() {
            let predicate = self.lower(&until_node.predicate());
            let statements = self.lower_optional_statements(until_node.statements());
            return NodeKind::Loop {
                predicate,
                statements,
            };
        }
        if let Some(return_node) = node.as_return_node() {
            let arguments = self.lower_arguments(return_node.arguments());
            return NodeKind::Return { arguments };
        }
        if let Some(break_node) = node.as_break_node() {
            let arguments = self.lower_arguments(break_node.arguments());
            return NodeKind::Break { arguments };
        }
        if let Some(next_node) = node.as_next_node() {
            let arguments = self.lower_arguments(next_node.arguments());
            return NodeKind::Next { arguments };
        }
        if let Some(parens) = node.as_parentheses_node() {
            let body = parens.body().map(|n| self.lower(&n));
            return NodeKind::Parentheses { body };
        }
        if let Some(and_node) = node.as_and_node() {
            let left = self.lower(&and_node.left());
            let right = self.lower(&and_node.right());
            return NodeKind::And { left, right };
        }
        if let Some(or_node) = node.as_or_node() {
            let left = self.lower(&or_node.left());
            let right = self.lower(&or_node.right());
            return NodeKind::Or { left, right };
        }

        // Literals
        if let Some(array) = node.as_array_node() {
            let elements = self.lower_list(&array.elements());
            return NodeKind::Array { elements };
        }
        if let Some(hash) = node.as_hash_node() {
            let elements = self.lower_list(&hash.elements());
            return NodeKind::Hash { elements };
        }
        if let Some(hash) = node.as_keyword_hash_node() {
            let elements = self.lower_list(&hash.elements());
            return NodeKind::Hash { elements };
        }
        if let Some(assoc) = node.as_assoc_node() {
            let key = self.lower(&assoc.key());
            let value = self.lower(&assoc.value());
            return NodeKind::Assoc { key, value };
        }
        if let Some(string) = node.as_string_node() {
            return NodeKind::String {
                value: String::from_utf8_lossy(string.unescaped()).to_string(),
            };
        }
        if let Some(interpolated) = node.as_interpolated_string_node() {
            let parts = self.lower_list(&interpolated.parts());
            return NodeKind::InterpolatedString { parts };
        }
        if let Some(embedded) = node.as_embedded_statements_node() {
            let statements = self.lower_optional_statements(embedded.statements());
            return NodeKind::EmbeddedStatements { statements };
        }
        if let Some(symbol) = node.as_symbol_node() {
            return NodeKind::Symbol {
                value: String::from_utf8_lossy(symbol.unescaped()).to_string(),
            };
        }
        if node.as_integer_node().is_some() {
            return NodeKind::Integer;
        }
        if node.as_float_node().is_some() {
            return NodeKind::Float;
        }
        if node.as_true_node().is_some() {
            return NodeKind::True;
        }
        if node.as_false_node().is_some() {
            return NodeKind::False;
        }
        if node.as_nil_node().is_some() {
            return NodeKind::Nil;
        }
        if node.as_self_node().is_some() {
            return NodeKind::SelfRef;
        }

        NodeKind::Other
    }
}
