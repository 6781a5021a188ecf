//! Per-invocation compile request types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Base name used for every artifact when the caller does not pick one
pub const DEFAULT_OUTPUT_FILEBASE: &str = "output";

/// Output filters requested by the caller
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileFilters {
    /// Produce a linked binary (enables library link flags)
    pub binary: bool,
    pub binary_object: bool,
    pub execute: bool,
    /// Hide assembler directives and IR metadata
    pub directives: bool,
    /// Hide comment-only lines
    pub comment_only: bool,
    pub labels: bool,
    pub library_code: bool,
    /// Collapse horizontal whitespace
    pub trim: bool,
    /// Hide `llvm.dbg.*` intrinsic calls
    pub debug_calls: bool,
    pub demangle: bool,
    pub intel: bool,
}

/// Backend options forwarded with the request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendOptions {
    /// Ask the compiler for an optimization report
    pub produce_opt_info: bool,
    /// Options not interpreted by this pipeline
    pub extra: BTreeMap<String, String>,
}

/// A library selected by id and version
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LibrarySpec {
    pub id: String,
    pub version: String,
}

impl LibrarySpec {
    pub fn new(id: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            version: version.into(),
        }
    }

    /// Parse the `id:version` shorthand used on the command line
    pub fn parse(spec: &str) -> Option<Self> {
        let (id, version) = spec.split_once(':')?;
        if id.is_empty() || version.is_empty() {
            return None;
        }
        Some(Self::new(id, version))
    }
}

/// Immutable bundle describing one compile invocation
#[derive(Debug, Clone)]
pub struct CompileRequest {
    pub user_options: Vec<String>,
    pub filters: CompileFilters,
    pub backend_options: BackendOptions,
    pub input_filename: PathBuf,
    pub output_filebase: String,
    pub libraries: Vec<LibrarySpec>,
}

impl CompileRequest {
    pub fn new(input_filename: impl Into<PathBuf>) -> Self {
        Self {
            user_options: Vec::new(),
            filters: CompileFilters::default(),
            backend_options: BackendOptions::default(),
            input_filename: input_filename.into(),
            output_filebase: DEFAULT_OUTPUT_FILEBASE.to_string(),
            libraries: Vec::new(),
        }
    }

    pub fn with_user_options(mut self, options: Vec<String>) -> Self {
        self.user_options = options;
        self
    }

    pub fn with_filters(mut self, filters: CompileFilters) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_backend_options(mut self, backend_options: BackendOptions) -> Self {
        self.backend_options = backend_options;
        self
    }

    pub fn with_output_filebase(mut self, filebase: impl Into<String>) -> Self {
        self.output_filebase = filebase.into();
        self
    }

    pub fn with_libraries(mut self, libraries: Vec<LibrarySpec>) -> Self {
        self.libraries = libraries;
        self
    }

    /// Directory holding the source file; every artifact lands here
    pub fn source_dir(&self) -> &Path {
        self.input_filename.parent().unwrap_or_else(|| Path::new(""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_spec_parse() {
        assert_eq!(
            LibrarySpec::parse("opencl-headers:2024"),
            Some(LibrarySpec::new("opencl-headers", "2024"))
        );
        assert_eq!(LibrarySpec::parse("missing-version"), None);
        assert_eq!(LibrarySpec::parse(":1.0"), None);
    }

    #[test]
    fn test_source_dir_is_parent_of_input() {
        let request = CompileRequest::new("/tmp/build/example.cl");
        assert_eq!(request.source_dir(), Path::new("/tmp/build"));
        assert_eq!(request.output_filebase, "output");
    }
}
