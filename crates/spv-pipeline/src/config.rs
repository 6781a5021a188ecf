//! Toolchain configuration

use crate::exec::{ExecOptions, DEFAULT_MAX_OUTPUT, DEFAULT_TIMEOUT};
use crate::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Which compile driver handles requests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PipelineKind {
    /// clang -> llvm-spirv -> spirv-dis
    #[default]
    Spirv,
}

impl PipelineKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PipelineKind::Spirv => "spirv",
        }
    }
}

/// Toolchain configuration, usually read from `spvc.toml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolchainConfig {
    pub pipeline: PipelineKind,
    pub compiler: CompilerConfig,
    pub exec: ExecConfig,
    pub user_options: UserOptionsConfig,
    /// Library id -> version -> description
    pub libraries: BTreeMap<String, BTreeMap<String, LibraryVersion>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Front-end compiler executable
    pub exe: PathBuf,
    /// Options added to every invocation
    pub options: Vec<String>,
    /// Whether the compiler can emit an optimization report
    pub supports_opt_output: bool,
    /// Flag requesting the optimization report
    pub opt_arg: String,
    /// LLVM bitcode to SPIR-V translator
    pub translator: PathBuf,
    /// SPIR-V binary to text disassembler
    pub disassembler: PathBuf,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            exe: PathBuf::from("clang"),
            options: Vec::new(),
            supports_opt_output: false,
            opt_arg: "-fsave-optimization-record".to_string(),
            translator: PathBuf::from("llvm-spirv"),
            disassembler: PathBuf::from("spirv-dis"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecConfig {
    pub timeout_ms: u64,
    pub max_output: usize,
}

impl Default for ExecConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT.as_millis() as u64,
            max_output: DEFAULT_MAX_OUTPUT,
        }
    }
}

impl ExecConfig {
    pub fn exec_options(&self) -> ExecOptions {
        ExecOptions {
            custom_cwd: None,
            max_output: self.max_output,
            timeout: Duration::from_millis(self.timeout_ms),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserOptionsConfig {
    /// Flags stripped from user options. A trailing `=` matches by prefix.
    pub forbidden: Vec<String>,
    /// Forbidden flags whose value is the following token
    pub forbidden_with_value: Vec<String>,
}

impl Default for UserOptionsConfig {
    fn default() -> Self {
        Self {
            forbidden: vec![
                "-fplugin=".to_string(),
                "-fpass-plugin=".to_string(),
                "-load".to_string(),
            ],
            forbidden_with_value: vec!["-o".to_string(), "-Xclang".to_string()],
        }
    }
}

/// One installable version of a library
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryVersion {
    /// Header directories, passed as `-isystem`
    pub include_paths: Vec<PathBuf>,
    /// Extra compiler options the library needs
    pub options: Vec<String>,
    /// Shared library search directories
    pub lib_paths: Vec<PathBuf>,
    /// Shared libraries to link, without the `lib` prefix
    pub link: Vec<String>,
    /// Static libraries to link
    pub static_link: Vec<String>,
}

impl ToolchainConfig {
    pub fn from_toml_str(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| PipelineError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        Self::from_toml_str(&content).map_err(|e| PipelineError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    pub fn library(&self, id: &str, version: &str) -> Option<&LibraryVersion> {
        self.libraries.get(id)?.get(version)
    }
}
