//! AST and IR dumps diverted from the front-end compiler
//!
//! Both dumps reuse the front-end argument list but skip the SPIR-V chain:
//! one clang invocation through [`run_single_stage`], with the bitcode output
//! path swapped for a `.ll` sibling.

use crate::arguments::Arguments;
use crate::artifacts::ArtifactPaths;
use crate::driver::run_single_stage;
use crate::exec::{ArtifactStore, ExecOptions, ProcessRunner};
use crate::postprocess::{AstProcessor, IrProcessor};
use crate::request::CompileFilters;
use crate::result::{CompilationResult, ResultLine};
use crate::Result;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, error};

pub const COLOR_DIAGNOSTICS_FLAG: &str = "-fcolor-diagnostics";
pub const AST_DUMP_FLAG: &str = "-ast-dump";
pub const EMIT_LLVM_FLAG: &str = "-emit-llvm";

/// Output ceiling for dumps, which are far larger than diagnostics
pub const EXTRACTION_MAX_OUTPUT: usize = 1024 * 1024 * 1024;

/// Processed dump plus the exit code of the compiler run that produced it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Extraction {
    pub code: i32,
    pub lines: Vec<ResultLine>,
}

impl Extraction {
    pub fn success(&self) -> bool {
        self.code == 0
    }
}

pub struct ExtractionDiverter<'a, R, S> {
    runner: &'a R,
    store: &'a S,
    compiler_exe: &'a Path,
    output_filebase: &'a str,
    exec_options: ExecOptions,
    ast_processor: &'a dyn AstProcessor,
    ir_processor: &'a dyn IrProcessor,
}

impl<'a, R: ProcessRunner, S: ArtifactStore> ExtractionDiverter<'a, R, S> {
    pub fn new(
        runner: &'a R,
        store: &'a S,
        compiler_exe: &'a Path,
        output_filebase: &'a str,
        exec_options: ExecOptions,
        ast_processor: &'a dyn AstProcessor,
        ir_processor: &'a dyn IrProcessor,
    ) -> Self {
        Self {
            runner,
            store,
            compiler_exe,
            output_filebase,
            exec_options,
            ast_processor,
            ir_processor,
        }
    }

    fn artifacts(&self, input_filename: &Path) -> ArtifactPaths {
        let source_dir = input_filename.parent().unwrap_or_else(|| Path::new(""));
        ArtifactPaths::resolve(source_dir, self.output_filebase)
    }

    /// Strip color, point `-o` at the `.ll` sibling of the bitcode and run
    /// the compiler once with the dump-sized output limit
    pub async fn run_for_extraction(
        &self,
        compiler_exe: &Path,
        options: Arguments,
        input_filename: &Path,
        exec_options: ExecOptions,
    ) -> CompilationResult {
        let paths = self.artifacts(input_filename);
        let options = options.without(COLOR_DIAGNOSTICS_FLAG).replaced(
            &paths.bitcode.to_string_lossy(),
            paths.ir_text.to_string_lossy(),
        );
        let exec_options = exec_options.with_max_output(EXTRACTION_MAX_OUTPUT);
        run_single_stage(
            self.runner,
            compiler_exe,
            options.as_slice(),
            input_filename,
            exec_options,
        )
        .await
    }

    pub async fn extract_ast(
        &self,
        input_filename: &Path,
        options: Arguments,
    ) -> Result<Extraction> {
        let options = options.with_once(AST_DUMP_FLAG);
        let output = self
            .run_for_extraction(
                self.compiler_exe,
                options,
                input_filename,
                self.exec_options.clone(),
            )
            .await;
        Ok(Extraction {
            code: output.code,
            lines: self.ast_processor.process_ast(&output)?,
        })
    }

    pub async fn extract_ir(
        &self,
        input_filename: &Path,
        options: Arguments,
        filters: &CompileFilters,
    ) -> Result<Extraction> {
        let options = options.with_once(EMIT_LLVM_FLAG);
        let output = self
            .run_for_extraction(
                self.compiler_exe,
                options,
                input_filename,
                self.exec_options.clone(),
            )
            .await;
        if !output.success() {
            error!(code = output.code, "Failed to run compiler to get IR code");
            return Ok(Extraction {
                code: output.code,
                lines: output.stderr,
            });
        }

        let ir_path = self.artifacts(input_filename).ir_text;
        let ir = if self.store.exists(&ir_path).await {
            debug!("Reading IR from {}", ir_path.display());
            self.store.read_text(&ir_path).await?
        } else {
            output.stdout_text()
        };
        Ok(Extraction {
            code: output.code,
            lines: self.ir_processor.process_ir(&ir, filters)?,
        })
    }
}
