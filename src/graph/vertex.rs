use crate::env::MethodKey;
use crate::syntax::NodeId;
use crate::types::Type;
use smallvec::SmallVec;
use std::fmt;

/// Index of an analyzed file in the session's file table
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(pub u32);

/// Vertex ID: the syntax position the vertex was built for
///
/// Node ids are only stable within one parse, so every id of a file is
/// dropped when the file is invalidated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexId {
    pub file: FileId,
    pub node: NodeId,
}

impl VertexId {
    pub fn new(file: FileId, node: NodeId) -> Self {
        Self { file, node }
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file.0, self.node.0)
    }
}

/// Hints passed down while inferring a vertex
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Constraints {
    /// Method names that will be sent to the value being inferred
    pub received_methods: SmallVec<[String; 2]>,
}

impl Constraints {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn received(method_name: &str) -> Self {
        let mut received_methods = SmallVec::new();
        received_methods.push(method_name.to_string());
        Self { received_methods }
    }

    pub fn is_empty(&self) -> bool {
        self.received_methods.is_empty()
    }
}

/// Call site payload
#[derive(Debug, Clone, PartialEq)]
pub struct CallVertex {
    /// Explicit receiver; `None` means implicit self
    pub receiver: Option<VertexId>,
    pub arguments: Vec<VertexId>,
    pub method_name: String,
    /// Lexical scope the call was written in, `::`-joined ("" at top level)
    pub scope: String,
    /// Fully-qualified name of `self` at the call site
    pub self_type: String,
    /// Receiver type guessed by the fast pass
    pub fast_receiver_type: Option<Type>,
}

/// How a vertex computes its type
#[derive(Debug, Clone, PartialEq)]
pub enum VertexKind {
    /// Positional parameter of `owner`
    Param { owner: MethodKey },
    /// Keyword parameter of `owner`
    Kwparam { owner: MethodKey },
    LvarWrite,
    LvarRead,
    /// Instance variable write inside the receiver named `owner`
    IvarWrite { owner: String },
    IvarRead { owner: String },
    /// Constant reference, resolved lexically from `scope` at inference time
    ConstRead { scope: String, constant: String },
    Array,
    /// Hash literal; dependencies alternate key, value
    Hash,
    InterpolatedString,
    EmbeddedStatements,
    /// Literal with a type fixed at construction
    Static(Type),
    Break,
    /// Conditional; dependencies are the branch results
    If { missing_branch: bool },
    Call(CallVertex),
}

impl VertexKind {
    pub fn label(&self) -> &'static str {
        match self {
            VertexKind::Param { .. } => "param",
            VertexKind::Kwparam { .. } => "kwparam",
            VertexKind::LvarWrite => "lvar_write",
            VertexKind::LvarRead => "lvar_read",
            VertexKind::IvarWrite { .. } => "ivar_write",
            VertexKind::IvarRead { .. } => "ivar_read",
            VertexKind::ConstRead { .. } => "const_read",
            VertexKind::Array => "array",
            VertexKind::Hash => "hash",
            VertexKind::InterpolatedString => "interpolated_string",
            VertexKind::EmbeddedStatements => "embedded_statements",
            VertexKind::Static(_) => "static",
            VertexKind::Break => "break",
            VertexKind::If { .. } => "if",
            VertexKind::Call(_) => "call",
        }
    }
}

/// One typed program point
#[derive(Debug, Clone)]
pub struct TypeVertex {
    pub id: VertexId,
    pub name: String,
    pub kind: VertexKind,
    /// Vertices this one reads from
    pub dependencies: SmallVec<[VertexId; 2]>,
    /// Vertices that read from this one
    pub dependents: SmallVec<[VertexId; 2]>,
    /// Result of the last inference
    pub inferred_type: Type,
    /// Inference pass in which `inferred_type` was completed without
    /// constraints, if any
    pub memo_pass: Option<u64>,
}

impl TypeVertex {
    pub fn new(id: VertexId, name: impl Into<String>, kind: VertexKind) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            dependencies: SmallVec::new(),
            dependents: SmallVec::new(),
            inferred_type: Type::Any,
            memo_pass: None,
        }
    }

    pub fn is_call(&self) -> bool {
        matches!(self.kind, VertexKind::Call(_))
    }

    pub fn as_call(&self) -> Option<&CallVertex> {
        match &self.kind {
            VertexKind::Call(call) => Some(call),
            _ => None,
        }
    }

    /// Convert inferred type to string representation
    pub fn show(&self) -> String {
        self.inferred_type.show()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(node: u32) -> VertexId {
        VertexId::new(FileId(0), NodeId(node))
    }

    #[test]
    fn test_new_vertex_defaults_to_any() {
        let vtx = TypeVertex::new(id(3), "x", VertexKind::LvarRead);
        assert_eq!(vtx.show(), "any");
        assert!(vtx.dependencies.is_empty());
        assert!(!vtx.is_call());
    }

    #[test]
    fn test_call_payload() {
        let call = CallVertex {
            receiver: Some(id(1)),
            arguments: vec![],
            method_name: "length".to_string(),
            scope: String::new(),
            self_type: "Object".to_string(),
            fast_receiver_type: None,
        };
        let vtx = TypeVertex::new(id(2), "length", VertexKind::Call(call));
        assert!(vtx.is_call());
        assert_eq!(vtx.as_call().map(|c| c.method_name.as_str()), Some("length"));
        assert_eq!(vtx.kind.label(), "call");
    }

    #[test]
    fn test_constraints() {
        assert!(Constraints::none().is_empty());
        let c = Constraints::received("each");
        assert_eq!(c.received_methods.as_slice(), ["each".to_string()]);
        assert_eq!(id(4).to_string(), "0:4");
    }
}
