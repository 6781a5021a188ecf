//! spvc command-line interface
//!
//! Thin front end over `spv-pipeline`: loads the toolchain configuration,
//! stages each source file in a temporary directory and prints the result.

pub mod cli;
pub mod commands;
pub mod diagnostics;

pub mod error {
    use miette::Diagnostic;
    use spv_pipeline::PipelineError;
    use thiserror::Error;

    #[derive(Error, Debug, Diagnostic)]
    pub enum CliError {
        #[error("IO error: {0}")]
        #[diagnostic(code(spvc::io))]
        Io(#[from] std::io::Error),

        #[error("Configuration error: {0}")]
        #[diagnostic(
            code(spvc::config),
            help("Check spvc.toml or the file passed with --config")
        )]
        Config(String),

        #[error(transparent)]
        #[diagnostic(code(spvc::pipeline))]
        Pipeline(#[from] PipelineError),

        #[error("Invalid input: {0}")]
        #[diagnostic(code(spvc::invalid_input))]
        InvalidInput(String),
    }

    pub type Result<T> = std::result::Result<T, CliError>;
}

pub use error::{CliError, Result};
