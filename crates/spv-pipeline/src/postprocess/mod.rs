//! Normalization of AST and IR dumps
//!
//! Extraction hands raw compiler output to one of these processors and
//! returns whatever they produce.

mod ast;
mod ir;

pub use ast::ClangAstProcessor;
pub use ir::LlvmIrProcessor;

use crate::request::CompileFilters;
use crate::result::{CompilationResult, ResultLine};
use crate::Result;

pub trait AstProcessor {
    fn process_ast(&self, output: &CompilationResult) -> Result<Vec<ResultLine>>;
}

pub trait IrProcessor {
    fn process_ir(&self, ir: &str, filters: &CompileFilters) -> Result<Vec<ResultLine>>;
}
