mod infer;
pub mod registry;
pub mod vertex;

pub use registry::TypeVertexRegistry;
pub use vertex::{CallVertex, Constraints, FileId, TypeVertex, VertexId, VertexKind};
