//! Compile drivers
//!
//! A [`CompileDriver`] turns a [`CompileRequest`] into arguments, names its
//! output, and runs whatever sequence of tools it needs. [`SpirvDriver`] is
//! assembled from the argument builder, the stage pipeline and the extraction
//! diverter; other backends can implement the trait without touching them.

use crate::arguments::{ArgumentBuilder, Arguments, ConfiguredLibraries, UserOptionFilter};
use crate::artifacts::{artifact_path, TEXT_EXTENSION};
use crate::config::{PipelineKind, ToolchainConfig};
use crate::exec::{ArtifactStore, ExecOptions, ExecOutput, ProcessRunner};
use crate::extraction::{Extraction, ExtractionDiverter};
use crate::pipeline::SpirvPipeline;
use crate::postprocess::{AstProcessor, ClangAstProcessor, IrProcessor, LlvmIrProcessor};
use crate::request::CompileRequest;
use crate::result::CompilationResult;
use crate::{PipelineError, Result};
use std::path::{Path, PathBuf};
use tracing::{error, info};

pub trait CompileDriver {
    fn prepare_arguments(&self, request: &CompileRequest, output_filename: &Path) -> Arguments;

    fn output_filename_for(&self, dir: &Path, output_filebase: &str) -> PathBuf;

    async fn run_compile(
        &self,
        compiler_exe: &Path,
        options: Arguments,
        input_filename: &Path,
        output_filebase: &str,
        exec_options: ExecOptions,
    ) -> CompilationResult;
}

/// Compile one source into one output with a single compiler invocation
pub async fn run_single_stage<R: ProcessRunner>(
    runner: &R,
    compiler_exe: &Path,
    options: &[String],
    input_filename: &Path,
    mut exec_options: ExecOptions,
) -> CompilationResult {
    if exec_options.custom_cwd.is_none() {
        if let Some(dir) = input_filename.parent() {
            exec_options.custom_cwd = Some(dir.to_path_buf());
        }
    }
    let output = match runner.exec(compiler_exe, options, &exec_options).await {
        Ok(output) => output,
        Err(err) => {
            error!("{}", err);
            ExecOutput::spawn_failure(&err)
        }
    };
    CompilationResult::from_exec(&output, input_filename)
}

/// clang -> llvm-spirv -> spirv-dis, plus AST and IR extraction
pub struct SpirvDriver<R, S> {
    config: ToolchainConfig,
    runner: R,
    store: S,
    libraries: ConfiguredLibraries,
    user_filter: UserOptionFilter,
    ast_processor: Box<dyn AstProcessor + Send + Sync>,
    ir_processor: Box<dyn IrProcessor + Send + Sync>,
}

impl<R: ProcessRunner, S: ArtifactStore> SpirvDriver<R, S> {
    pub fn new(config: ToolchainConfig, runner: R, store: S) -> Self {
        let libraries = ConfiguredLibraries::new(config.libraries.clone());
        let user_filter = UserOptionFilter::new(&config.user_options);
        Self {
            config,
            runner,
            store,
            libraries,
            user_filter,
            ast_processor: Box::new(ClangAstProcessor),
            ir_processor: Box::new(LlvmIrProcessor),
        }
    }

    /// Pick the driver named by the configuration
    pub fn from_config(config: ToolchainConfig, runner: R, store: S) -> Result<Self> {
        match config.pipeline {
            PipelineKind::Spirv => Ok(Self::new(config, runner, store)),
        }
    }

    pub fn with_ast_processor(mut self, processor: impl AstProcessor + Send + Sync + 'static) -> Self {
        self.ast_processor = Box::new(processor);
        self
    }

    pub fn with_ir_processor(mut self, processor: impl IrProcessor + Send + Sync + 'static) -> Self {
        self.ir_processor = Box::new(processor);
        self
    }

    pub fn config(&self) -> &ToolchainConfig {
        &self.config
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    fn exec_options(&self) -> ExecOptions {
        self.config.exec.exec_options()
    }

    fn request_arguments(&self, request: &CompileRequest) -> Arguments {
        let output = self.output_filename_for(request.source_dir(), &request.output_filebase);
        self.prepare_arguments(request, &output)
    }

    fn diverter<'a>(&'a self, request: &'a CompileRequest) -> ExtractionDiverter<'a, R, S> {
        ExtractionDiverter::new(
            &self.runner,
            &self.store,
            &self.config.compiler.exe,
            &request.output_filebase,
            self.exec_options(),
            self.ast_processor.as_ref(),
            self.ir_processor.as_ref(),
        )
    }

    /// Run the full SPIR-V pipeline for `request`
    pub async fn compile(&self, request: &CompileRequest) -> CompilationResult {
        info!("Compiling {}", request.input_filename.display());
        let options = self.request_arguments(request);
        self.run_compile(
            &self.config.compiler.exe,
            options,
            &request.input_filename,
            &request.output_filebase,
            self.exec_options(),
        )
        .await
    }

    pub async fn extract_ast(&self, request: &CompileRequest) -> Result<Extraction> {
        info!("Dumping AST of {}", request.input_filename.display());
        let options = self.request_arguments(request);
        self.diverter(request)
            .extract_ast(&request.input_filename, options)
            .await
    }

    pub async fn extract_ir(&self, request: &CompileRequest) -> Result<Extraction> {
        info!("Dumping LLVM IR of {}", request.input_filename.display());
        let options = self.request_arguments(request);
        self.diverter(request)
            .extract_ir(&request.input_filename, options, &request.filters)
            .await
    }

    /// Path of the SPIR-V text the pipeline leaves behind for `request`
    pub fn output_path(&self, request: &CompileRequest) -> PathBuf {
        self.output_filename_for(request.source_dir(), &request.output_filebase)
    }

    /// Reject base names that would place artifacts outside the source directory
    pub fn validate_request(request: &CompileRequest) -> Result<()> {
        if request.output_filebase.is_empty() || request.output_filebase.contains('/') {
            return Err(PipelineError::InvalidRequest(format!(
                "output base name {:?}",
                request.output_filebase
            )));
        }
        Ok(())
    }
}

impl<R: ProcessRunner, S: ArtifactStore> CompileDriver for SpirvDriver<R, S> {
    fn prepare_arguments(&self, request: &CompileRequest, output_filename: &Path) -> Arguments {
        ArgumentBuilder::new(
            &self.config.compiler,
            &self.libraries,
            &self.user_filter,
            &request.output_filebase,
        )
        .for_request(request, output_filename)
    }

    fn output_filename_for(&self, dir: &Path, output_filebase: &str) -> PathBuf {
        artifact_path(dir, output_filebase, TEXT_EXTENSION)
    }

    async fn run_compile(
        &self,
        compiler_exe: &Path,
        options: Arguments,
        input_filename: &Path,
        output_filebase: &str,
        exec_options: ExecOptions,
    ) -> CompilationResult {
        SpirvPipeline::new(
            &self.runner,
            &self.store,
            &self.config.compiler.translator,
            &self.config.compiler.disassembler,
            output_filebase,
        )
        .run(compiler_exe, options, input_filename, exec_options)
        .await
    }
}
