pub mod const_registry;
pub mod constant;
pub mod files;
pub mod global_env;
pub mod method;
pub mod method_registry;
pub mod node_registry;

pub use const_registry::ConstRegistry;
pub use constant::{ClassOrModule, ConstKind, ConstVariable, Constant};
pub use files::FileTable;
pub use global_env::GlobalEnv;
pub use method::{MethodEntry, MethodKey, MethodKind};
pub use method_registry::MethodRegistry;
pub use node_registry::{NodeEntry, NodeRegistry};
