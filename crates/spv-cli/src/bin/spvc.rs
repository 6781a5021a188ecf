//! spvc: compile OpenCL C to SPIR-V text through clang, llvm-spirv and spirv-dis
//!
//! # Usage
//!
//! ```bash
//! # Compile to SPIR-V text
//! spvc compile kernel.cl --option=-O2 --option -cl-std=CL2.0 -o kernel.spvasm
//!
//! # Dump the top-level declarations of the clang AST
//! spvc ast kernel.cl
//!
//! # Dump LLVM IR without metadata
//! spvc ir kernel.cl --directives --trim
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use spv_cli::{
    cli::CliConfig,
    commands::{self, ast::AstArgs, compile::CompileArgs, ir::IrArgs},
    diagnostics::{render_cli_error, setup_error_reporting},
    Result,
};
use std::path::PathBuf;
use tracing::{debug, info};

#[derive(Parser)]
#[command(
    name = "spvc",
    version = env!("CARGO_PKG_VERSION"),
    about = "Compile OpenCL C to SPIR-V through external LLVM tools"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (use multiple times for increased verbosity)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Set log level (overrides --verbose/--quiet)
    #[arg(long, global = true, value_enum)]
    log: Option<LogLevel>,

    /// Set log output format
    #[arg(long, global = true, value_enum, default_value = "pretty")]
    log_format: LogFormat,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogFormat {
    Pretty,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile to SPIR-V text
    Compile(CompileArgs),

    /// Dump the clang AST
    Ast(AstArgs),

    /// Dump the LLVM IR
    Ir(IrArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            render_cli_error(e);
            1
        }
    };
    std::process::exit(code);
}

async fn run(cli: Cli) -> Result<i32> {
    setup_error_reporting()?;
    setup_logging(cli.verbose, cli.quiet, cli.log, cli.log_format);

    let config = CliConfig::load(cli.config.as_deref())?;
    match &config.source {
        Some(path) => info!("Using configuration {}", path.display()),
        None => debug!("Using default configuration"),
    }

    match cli.command {
        Commands::Compile(args) => commands::compile_command(args, &config).await,
        Commands::Ast(args) => commands::ast_command(args, &config).await,
        Commands::Ir(args) => commands::ir_command(args, &config).await,
    }
}

fn setup_logging(verbose: u8, quiet: bool, log_level: Option<LogLevel>, log_format: LogFormat) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if let Some(level) = log_level {
        EnvFilter::new(match level {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        })
    } else if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("warn"),
            1 => EnvFilter::new("info"),
            2 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    let formatter = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_timer(tracing_subscriber::fmt::time::uptime())
        .with_level(true);

    match log_format {
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(formatter)
                .with(filter)
                .init();
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(formatter.json())
                .with(filter)
                .init();
        }
    }
}
