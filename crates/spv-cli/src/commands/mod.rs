//! Command implementations for spvc
//!
//! Every command returns the exit code the process should end with.

pub mod ast;
pub mod common;
pub mod compile;
pub mod ir;

pub use ast::ast_command;
pub use compile::compile_command;
pub use ir::ir_command;
