//! spv-pipeline: OpenCL C to SPIR-V through external LLVM tools
//!
//! A request is compiled by clang to LLVM bitcode, translated to a SPIR-V
//! binary by `llvm-spirv`, and disassembled to text by `spirv-dis`. The same
//! front-end invocation can instead be diverted to dump the clang AST or the
//! textual LLVM IR.

pub mod arguments;
pub mod artifacts;
pub mod config;
pub mod driver;
pub mod error;
pub mod exec;
pub mod extraction;
pub mod pipeline;
pub mod postprocess;
pub mod request;
pub mod result;

pub use arguments::{ArgumentBuilder, Arguments, ConfiguredLibraries, LibraryCatalog, UserOptionFilter};
pub use artifacts::ArtifactPaths;
pub use config::{PipelineKind, ToolchainConfig};
pub use driver::{run_single_stage, CompileDriver, SpirvDriver};
pub use error::{PipelineError, Result};
pub use exec::{
    ArtifactStore, ExecOptions, ExecOutput, LocalArtifactStore, ProcessRunner, TokioProcessRunner,
};
pub use extraction::{Extraction, ExtractionDiverter};
pub use pipeline::{PipelineState, SpirvPipeline};
pub use postprocess::{AstProcessor, ClangAstProcessor, IrProcessor, LlvmIrProcessor};
pub use request::{BackendOptions, CompileFilters, CompileRequest, LibrarySpec};
pub use result::{CompilationResult, ResultLine, ResultTag};
