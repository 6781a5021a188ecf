//! Full SPIR-V compilation

use super::common::{build_driver, stage_source, RequestArgs};
use crate::{cli::CliConfig, diagnostics, Result};
use clap::Args;
use console::style;
use serde::Serialize;
use spv_pipeline::CompilationResult;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Debug, Clone, Args)]
pub struct CompileArgs {
    #[command(flatten)]
    pub request: RequestArgs,

    /// Where to copy the SPIR-V text on success
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// JSON payload of `compile --json`: the result plus the SPIR-V text
#[derive(Debug, Serialize)]
pub struct CompileReport<'a> {
    #[serde(flatten)]
    pub result: &'a CompilationResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spirv: Option<&'a str>,
}

pub async fn compile_command(args: CompileArgs, config: &CliConfig) -> Result<i32> {
    let driver = build_driver(config)?;
    let (_stage, staged) = stage_source(&args.request.input)?;
    let request = args.request.to_request(&staged)?;

    let result = driver.compile(&request).await;
    let spirv = if result.success() {
        Some(tokio::fs::read_to_string(driver.output_path(&request)).await?)
    } else {
        None
    };

    if args.request.json {
        diagnostics::print_json(&CompileReport {
            result: &result,
            spirv: spirv.as_deref(),
        })?;
    } else {
        diagnostics::print_result(&result)?;
    }

    let Some(spirv) = spirv else {
        warn!("Compilation failed with code {}", result.code);
        return Ok(result.code);
    };

    match &args.output {
        Some(output) => {
            tokio::fs::write(output, &spirv).await?;
            info!("Wrote {}", output.display());
            if !args.request.json {
                eprintln!(
                    "{} Compiled {} -> {}",
                    style("✓").green(),
                    args.request.input.display(),
                    output.display()
                );
            }
        }
        None if !args.request.json => print!("{}", spirv),
        None => {}
    }
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use spv_pipeline::ResultLine;

    #[test]
    fn test_report_carries_spirv_next_to_result() {
        let result = CompilationResult {
            stderr: vec![ResultLine::new("warning: unused variable")],
            ..CompilationResult::default()
        };
        let report = CompileReport {
            result: &result,
            spirv: Some("OpCapability Kernel\n"),
        };

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["code"], 0);
        assert_eq!(value["stderr"][0]["text"], "warning: unused variable");
        assert_eq!(value["spirv"], "OpCapability Kernel\n");
    }

    #[test]
    fn test_failed_report_omits_spirv() {
        let result = CompilationResult {
            code: 1,
            ..CompilationResult::default()
        };
        let report = CompileReport {
            result: &result,
            spirv: None,
        };

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["code"], 1);
        assert!(value.get("spirv").is_none());
    }
}
