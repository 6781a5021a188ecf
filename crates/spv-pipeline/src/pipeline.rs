//! The compile -> translate -> disassemble chain

use crate::arguments::Arguments;
use crate::artifacts::ArtifactPaths;
use crate::exec::{ArtifactStore, ExecOptions, ExecOutput, ProcessRunner};
use crate::result::CompilationResult;
use std::fmt;
use std::path::Path;
use tracing::{debug, error, info};

/// Front-end flag selecting bitcode output
pub const EMIT_BITCODE_FLAG: &str = "-emit-llvm-bc";
/// Translator flag keeping debug info in the SPIR-V module
pub const TRANSLATOR_DEBUG_FLAG: &str = "-spirv-debug";

/// Exit code reported when a stage exits cleanly but leaves no artifact
pub const MISSING_ARTIFACT_CODE: i32 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Compile,
    Translate,
    Disassemble,
    Done,
}

impl PipelineState {
    pub fn name(self) -> &'static str {
        match self {
            PipelineState::Compile => "compile",
            PipelineState::Translate => "translate",
            PipelineState::Disassemble => "disassemble",
            PipelineState::Done => "done",
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Runs the three SPIR-V stages for one request, strictly one after another
pub struct SpirvPipeline<'a, R, S> {
    runner: &'a R,
    store: &'a S,
    translator: &'a Path,
    disassembler: &'a Path,
    output_filebase: &'a str,
}

impl<'a, R: ProcessRunner, S: ArtifactStore> SpirvPipeline<'a, R, S> {
    pub fn new(
        runner: &'a R,
        store: &'a S,
        translator: &'a Path,
        disassembler: &'a Path,
        output_filebase: &'a str,
    ) -> Self {
        Self {
            runner,
            store,
            translator,
            disassembler,
            output_filebase,
        }
    }

    /// Run every stage until one fails. The result keeps the output of every
    /// stage that ran, in stage order, and the exit code of the stage that
    /// stopped the chain.
    pub async fn run(
        &self,
        compiler_exe: &Path,
        options: Arguments,
        input_filename: &Path,
        exec_options: ExecOptions,
    ) -> CompilationResult {
        let source_dir = input_filename.parent().unwrap_or_else(|| Path::new(""));
        let paths = ArtifactPaths::resolve(source_dir, self.output_filebase);
        let exec_options = exec_options.with_cwd(source_dir);
        let compile_args = options.with(EMIT_BITCODE_FLAG);

        let mut result = CompilationResult::default();
        let mut state = PipelineState::Compile;
        while state != PipelineState::Done {
            info!("Running {} stage for {}", state, input_filename.display());
            state = match state {
                PipelineState::Compile => {
                    let output = self
                        .run_stage(state, compiler_exe, compile_args.as_slice(), &exec_options)
                        .await;
                    result = CompilationResult::from_exec(&output, input_filename);
                    if !output.success() {
                        error!(code = output.code, "Front-end compilation failed");
                        PipelineState::Done
                    } else if !self.store.exists(&paths.bitcode).await {
                        error!(
                            "Front-end exited cleanly but {} is missing",
                            paths.bitcode.display()
                        );
                        result.code = MISSING_ARTIFACT_CODE;
                        PipelineState::Done
                    } else {
                        PipelineState::Translate
                    }
                }
                PipelineState::Translate => {
                    let args = vec![
                        TRANSLATOR_DEBUG_FLAG.to_string(),
                        paths.bitcode.to_string_lossy().into_owned(),
                        "-o".to_string(),
                        paths.binary.to_string_lossy().into_owned(),
                    ];
                    let output = self
                        .run_stage(state, self.translator, &args, &exec_options)
                        .await;
                    result.append_stage(&output);
                    if output.success() {
                        PipelineState::Disassemble
                    } else {
                        error!(
                            code = output.code,
                            stderr = %output.stderr,
                            "LLVM to SPIR-V translation failed"
                        );
                        PipelineState::Done
                    }
                }
                PipelineState::Disassemble => {
                    let args = vec![
                        paths.binary.to_string_lossy().into_owned(),
                        "-o".to_string(),
                        paths.text.to_string_lossy().into_owned(),
                    ];
                    let output = self
                        .run_stage(state, self.disassembler, &args, &exec_options)
                        .await;
                    result.append_stage(&output);
                    if !output.success() {
                        error!(
                            code = output.code,
                            stderr = %output.stderr,
                            "SPIR-V binary to text failed"
                        );
                    }
                    PipelineState::Done
                }
                PipelineState::Done => PipelineState::Done,
            };
        }

        debug!(code = result.code, "SPIR-V pipeline finished");
        result
    }

    async fn run_stage(
        &self,
        state: PipelineState,
        exe: &Path,
        args: &[String],
        exec_options: &ExecOptions,
    ) -> ExecOutput {
        match self.runner.exec(exe, args, exec_options).await {
            Ok(output) => output,
            Err(err) => {
                error!(stage = %state, "{}", err);
                ExecOutput::spawn_failure(&err)
            }
        }
    }
}
