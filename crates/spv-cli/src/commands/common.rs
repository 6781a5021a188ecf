//! Arguments and helpers shared by every command

use crate::{cli::CliConfig, CliError, Result};
use clap::Args;
use spv_pipeline::request::DEFAULT_OUTPUT_FILEBASE;
use spv_pipeline::{
    BackendOptions, CompileRequest, LibrarySpec, LocalArtifactStore, SpirvDriver,
    TokioProcessRunner,
};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::debug;

pub type LocalDriver = SpirvDriver<TokioProcessRunner, LocalArtifactStore>;

/// Options describing one compile request
#[derive(Debug, Clone, Args)]
pub struct RequestArgs {
    /// OpenCL C source file
    pub input: PathBuf,

    /// Extra compiler option (repeatable), e.g. `--option=-O2`
    #[arg(long = "option", value_name = "OPTION", allow_hyphen_values = true)]
    pub options: Vec<String>,

    /// Library to compile against, as `id:version`
    #[arg(long = "library", value_name = "ID:VERSION")]
    pub libraries: Vec<String>,

    /// Link libraries as for a final binary
    #[arg(long)]
    pub binary: bool,

    /// Ask the compiler for an optimization report
    #[arg(long)]
    pub produce_opt_info: bool,

    /// Base name of the artifacts written next to the staged source
    #[arg(long, default_value = DEFAULT_OUTPUT_FILEBASE)]
    pub output_base: String,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

impl RequestArgs {
    pub fn parse_libraries(&self) -> Result<Vec<LibrarySpec>> {
        self.libraries
            .iter()
            .map(|spec| {
                LibrarySpec::parse(spec).ok_or_else(|| {
                    CliError::InvalidInput(format!("Library must be id:version, got {:?}", spec))
                })
            })
            .collect()
    }

    /// Build the request for a source already staged at `staged_input`
    pub fn to_request(&self, staged_input: &Path) -> Result<CompileRequest> {
        let mut request = CompileRequest::new(staged_input)
            .with_user_options(self.options.clone())
            .with_libraries(self.parse_libraries()?)
            .with_output_filebase(self.output_base.clone())
            .with_backend_options(BackendOptions {
                produce_opt_info: self.produce_opt_info,
                ..BackendOptions::default()
            });
        request.filters.binary = self.binary;
        LocalDriver::validate_request(&request)?;
        Ok(request)
    }
}

/// Copy `input` into a fresh temporary directory, keeping its file name
pub fn stage_source(input: &Path) -> Result<(TempDir, PathBuf)> {
    if !input.is_file() {
        return Err(CliError::InvalidInput(format!(
            "Input path is not a file: {}",
            input.display()
        )));
    }
    let file_name = input.file_name().ok_or_else(|| {
        CliError::InvalidInput(format!("Input path has no file name: {}", input.display()))
    })?;

    let dir = tempfile::Builder::new().prefix("spvc-").tempdir()?;
    let staged = dir.path().join(file_name);
    std::fs::copy(input, &staged)?;
    debug!("Staged {} at {}", input.display(), staged.display());
    Ok((dir, staged))
}

pub fn build_driver(config: &CliConfig) -> Result<LocalDriver> {
    Ok(SpirvDriver::from_config(
        config.toolchain.clone(),
        TokioProcessRunner,
        LocalArtifactStore,
    )?)
}
