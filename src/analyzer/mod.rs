mod calls;
mod control_flow;
mod definitions;
pub mod hooks;
mod install;
mod literals;
mod parameters;
mod variables;

#[cfg(test)]
mod tests;

pub use hooks::HookTable;
pub use install::AstInstaller;
