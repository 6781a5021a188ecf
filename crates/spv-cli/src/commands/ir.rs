//! LLVM IR dump

use super::common::{build_driver, stage_source, RequestArgs};
use crate::{cli::CliConfig, diagnostics, Result};
use clap::Args;
use spv_pipeline::CompileFilters;
use tracing::warn;

#[derive(Debug, Clone, Args)]
pub struct IrArgs {
    #[command(flatten)]
    pub request: RequestArgs,

    /// Drop metadata, attribute groups and debug attachments
    #[arg(long)]
    pub directives: bool,

    /// Drop comment-only lines
    #[arg(long)]
    pub comment_only: bool,

    /// Drop llvm.dbg intrinsics
    #[arg(long)]
    pub debug_calls: bool,

    /// Collapse whitespace
    #[arg(long)]
    pub trim: bool,
}

impl IrArgs {
    pub fn filters(&self) -> CompileFilters {
        CompileFilters {
            binary: self.request.binary,
            directives: self.directives,
            comment_only: self.comment_only,
            debug_calls: self.debug_calls,
            trim: self.trim,
            ..CompileFilters::default()
        }
    }
}

pub async fn ir_command(args: IrArgs, config: &CliConfig) -> Result<i32> {
    let driver = build_driver(config)?;
    let (_stage, staged) = stage_source(&args.request.input)?;
    let request = args.request.to_request(&staged)?.with_filters(args.filters());

    let extraction = driver.extract_ir(&request).await?;
    diagnostics::print_extraction(&extraction, args.request.json)?;
    if !extraction.success() {
        warn!("Compiler exited with code {}", extraction.code);
    }
    Ok(extraction.code)
}
