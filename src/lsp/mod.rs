//! Language server front-end over the analysis service

pub mod diagnostics;
pub mod server;

pub use server::run_server;
