//! Owned syntax tree produced from a prism parse
//!
//! Nodes are stored in preorder; a node's `NodeId` is its preorder index and is
//! stable for one parse of one text.

/// Identity of a node within one parse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

/// Source range of a node: 1-based lines, 0-based byte columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start_offset: usize,
    pub end_offset: usize,
    pub start_line: usize,
    pub start_column: usize,
    pub end_line: usize,
    pub end_column: usize,
}

impl Span {
    /// Whether (line, column) falls inside this span, end exclusive
    pub fn contains(&self, line: usize, column: usize) -> bool {
        let after_start =
            line > self.start_line || (line == self.start_line && column >= self.start_column);
        let before_end =
            line < self.end_line || (line == self.end_line && column < self.end_column);
        after_start && before_end
    }
}

/// Constant reference such as `A::B` or `::A`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstPath {
    pub names: Vec<String>,
    /// Starts with `::`
    pub absolute: bool,
}

impl ConstPath {
    pub fn joined(&self) -> String {
        self.names.join("::")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Program {
        statements: NodeId,
    },
    Statements {
        body: Vec<NodeId>,
    },
    Class {
        constant_path: ConstPath,
        superclass: Option<NodeId>,
        body: Option<NodeId>,
    },
    Module {
        constant_path: ConstPath,
        body: Option<NodeId>,
    },
    /// `class << self`
    SingletonClass {
        body: Option<NodeId>,
    },
    Def {
        name: String,
        /// Declared with a `self.` receiver
        singleton: bool,
        parameters: Option<NodeId>,
        body: Option<NodeId>,
    },
    Parameters {
        requireds: Vec<NodeId>,
        optionals: Vec<NodeId>,
        rest: Option<NodeId>,
        keywords: Vec<NodeId>,
        keyword_rest: Option<NodeId>,
        block: Option<NodeId>,
    },
    RequiredParameter {
        name: String,
    },
    OptionalParameter {
        name: String,
        value: NodeId,
    },
    RestParameter {
        name: Option<String>,
    },
    RequiredKeywordParameter {
        name: String,
    },
    OptionalKeywordParameter {
        name: String,
        value: NodeId,
    },
    KeywordRestParameter {
        name: Option<String>,
    },
    BlockParameter {
        name: Option<String>,
    },
    Call {
        receiver: Option<NodeId>,
        name: String,
        arguments: Vec<NodeId>,
        block: Option<NodeId>,
    },
    Block {
        parameters: Option<NodeId>,
        body: Option<NodeId>,
    },
    LocalVariableRead {
        name: String,
    },
    LocalVariableWrite {
        name: String,
        value: NodeId,
    },
    /// Assignment target inside a multiple assignment
    LocalVariableTarget {
        name: String,
    },
    /// `x += v`, `x ||= v`, `x &&= v`
    LocalVariableOperatorWrite {
        name: String,
        value: NodeId,
    },
    InstanceVariableRead {
        name: String,
    },
    InstanceVariableWrite {
        name: String,
        value: NodeId,
    },
    ConstantRead {
        name: String,
    },
    ConstantPath {
        path: ConstPath,
    },
    ConstantWrite {
        name: String,
        value: NodeId,
    },
    MultiWrite {
        targets: Vec<NodeId>,
        value: NodeId,
    },
    If {
        predicate: NodeId,
        statements: Option<NodeId>,
        subsequent: Option<NodeId>,
    },
    Unless {
        predicate: NodeId,
        statements: Option<NodeId>,
        else_clause: Option<NodeId>,
    },
    Else {
        statements: Option<NodeId>,
    },
    /// `while` and `until`
    Loop {
        predicate: NodeId,
        statements: Option<NodeId>,
    },
    Return {
        arguments: Vec<NodeId>,
    },
    Break {
        arguments: Vec<NodeId>,
    },
    Next {
        arguments: Vec<NodeId>,
    },
    Array {
        elements: Vec<NodeId>,
    },
    /// Hash literal or bare keyword arguments
    Hash {
        elements: Vec<NodeId>,
    },
    Assoc {
        key: NodeId,
        value: NodeId,
    },
    String {
        value: String,
    },
    InterpolatedString {
        parts: Vec<NodeId>,
    },
    EmbeddedStatements {
        statements: Option<NodeId>,
    },
    Symbol {
        value: String,
    },
    Integer,
    Float,
    True,
    False,
    Nil,
    SelfRef,
    Parentheses {
        body: Option<NodeId>,
    },
    And {
        left: NodeId,
        right: NodeId,
    },
    Or {
        left: NodeId,
        right: NodeId,
    },
    /// Node kinds the analyzer does not model
    Other,
}

impl NodeKind {
    /// Direct children in source order
    pub fn children(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        match self {
            NodeKind::Program { statements } => out.push(*statements),
            NodeKind::Statements { body } => out.extend(body),
            NodeKind::Class {
                superclass, body, ..
            } => {
                out.extend(superclass);
                out.extend(body);
            }
            NodeKind::Module { body, .. } | NodeKind::SingletonClass { body } => out.extend(body),
            NodeKind::Def {
                parameters, body, ..
            } => {
                out.extend(parameters);
                out.extend(body);
            }
            NodeKind::Parameters {
                requireds,
                optionals,
                rest,
                keywords,
                keyword_rest,
                block,
            } => {
                out.extend(requireds);
                out.extend(optionals);
                out.extend(rest);
                out.extend(keywords);
                out.extend(keyword_rest);
                out.extend(block);
            }
            NodeKind::OptionalParameter { value, .. }
            | NodeKind::OptionalKeywordParameter { value, .. }
            | NodeKind::LocalVariableWrite { value, .. }
            | NodeKind::LocalVariableOperatorWrite { value, .. }
            | NodeKind::InstanceVariableWrite { value, .. }
            | NodeKind::ConstantWrite { value, .. } => out.push(*value),
            NodeKind::Call {
                receiver,
                arguments,
                block,
                ..
            } => {
                out.extend(receiver);
                out.extend(arguments);
                out.extend(block);
            }
            NodeKind::Block { parameters, body } => {
                out.extend(parameters);
                out.extend(body);
            }
            NodeKind::MultiWrite { targets, value } => {
                out.extend(targets);
                out.push(*value);
            }
            NodeKind::If {
                predicate,
                statements,
                subsequent,
            } => {
                out.push(*predicate);
                out.extend(statements);
                out.extend(subsequent);
            }
            NodeKind::Unless {
                predicate,
                statements,
                else_clause,
            } => {
                out.push(*predicate);
                out.extend(statements);
                out.extend(else_clause);
            }
            NodeKind::Else { statements }
            | NodeKind::EmbeddedStatements { statements } => out.extend(statements),
            NodeKind::Loop {
                predicate,
                statements,
            } => {
                out.push(*predicate);
                out.extend(statements);
            }
            NodeKind::Return { arguments }
            | NodeKind::Break { arguments }
            | NodeKind::Next { arguments } => out.extend(arguments),
            NodeKind::Array { elements } | NodeKind::Hash { elements } => out.extend(elements),
            NodeKind::Assoc { key, value } => {
                out.push(*key);
                out.push(*value);
            }
            NodeKind::InterpolatedString { parts } => out.extend(parts),
            NodeKind::Parentheses { body } => out.extend(body),
            NodeKind::And { left, right } | NodeKind::Or { left, right } => {
                out.push(*left);
                out.push(*right);
            }
            NodeKind::RequiredParameter { .. }
            | NodeKind::RestParameter { .. }
            | NodeKind::RequiredKeywordParameter { .. }
            | NodeKind::KeywordRestParameter { .. }
            | NodeKind::BlockParameter { .. }
            | NodeKind::LocalVariableRead { .. }
            | NodeKind::LocalVariableTarget { .. }
            | NodeKind::InstanceVariableRead { .. }
            | NodeKind::ConstantRead { .. }
            | NodeKind::ConstantPath { .. }
            | NodeKind::String { .. }
            | NodeKind::Symbol { .. }
            | NodeKind::Integer
            | NodeKind::Float
            | NodeKind::True
            | NodeKind::False
            | NodeKind::Nil
            | NodeKind::SelfRef
            | NodeKind::Other => {}
        }
        out
    }
}

#[derive(Debug, Clone)]
pub struct SyntaxNode {
    pub id: NodeId,
    pub kind: NodeKind,
    pub span: Span,
}

/// A parsed file
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    nodes: Vec<SyntaxNode>,
}

impl SyntaxTree {
    pub(crate) fn from_nodes(nodes: Vec<SyntaxNode>) -> Self {
        Self { nodes }
    }

    /// The program node is always allocated first
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> Option<&SyntaxNode> {
        self.nodes.get(id.0 as usize)
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.node(id).map(|n| &n.kind)
    }

    pub fn span(&self, id: NodeId) -> Span {
        self.node(id).map(|n| n.span).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SyntaxNode> {
        self.nodes.iter()
    }
}
