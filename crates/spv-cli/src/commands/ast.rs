//! Clang AST dump

use super::common::{build_driver, stage_source, RequestArgs};
use crate::{cli::CliConfig, diagnostics, Result};
use clap::Args;
use tracing::warn;

#[derive(Debug, Clone, Args)]
pub struct AstArgs {
    #[command(flatten)]
    pub request: RequestArgs,
}

pub async fn ast_command(args: AstArgs, config: &CliConfig) -> Result<i32> {
    let driver = build_driver(config)?;
    let (_stage, staged) = stage_source(&args.request.input)?;
    let request = args.request.to_request(&staged)?;

    let extraction = driver.extract_ast(&request).await?;
    diagnostics::print_extraction(&extraction, args.request.json)?;
    if !extraction.success() {
        warn!("Compiler exited with code {}", extraction.code);
    }
    Ok(extraction.code)
}
