//! Stage artifact naming
//!
//! Every stage writes next to the source file, under the same base name. Only
//! the extension tells the artifacts apart.

use std::path::{Path, PathBuf};

pub const BITCODE_EXTENSION: &str = "bc";
pub const BINARY_EXTENSION: &str = "spv";
pub const TEXT_EXTENSION: &str = "spvasm";
pub const IR_TEXT_EXTENSION: &str = "ll";

/// Paths of the artifacts produced for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    /// LLVM bitcode from the front-end compiler
    pub bitcode: PathBuf,
    /// SPIR-V binary from the translator
    pub binary: PathBuf,
    /// SPIR-V text from the disassembler
    pub text: PathBuf,
    /// LLVM IR text from the IR extraction
    pub ir_text: PathBuf,
}

impl ArtifactPaths {
    pub fn resolve(dir: &Path, filebase: &str) -> Self {
        Self {
            bitcode: artifact_path(dir, filebase, BITCODE_EXTENSION),
            binary: artifact_path(dir, filebase, BINARY_EXTENSION),
            text: artifact_path(dir, filebase, TEXT_EXTENSION),
            ir_text: artifact_path(dir, filebase, IR_TEXT_EXTENSION),
        }
    }
}

/// `dir/filebase.extension`, appended rather than substituted so that a base
/// name containing dots keeps all of them
pub fn artifact_path(dir: &Path, filebase: &str, extension: &str) -> PathBuf {
    dir.join(format!("{}.{}", filebase, extension))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_all_extensions() {
        let paths = ArtifactPaths::resolve(Path::new("/tmp/build"), "foo");
        assert_eq!(paths.bitcode, PathBuf::from("/tmp/build/foo.bc"));
        assert_eq!(paths.binary, PathBuf::from("/tmp/build/foo.spv"));
        assert_eq!(paths.text, PathBuf::from("/tmp/build/foo.spvasm"));
        assert_eq!(paths.ir_text, PathBuf::from("/tmp/build/foo.ll"));
    }

    #[test]
    fn test_resolve_is_deterministic() {
        let dir = Path::new("/nonexistent/dir");
        let first = ArtifactPaths::resolve(dir, "test1");
        for _ in 0..3 {
            assert_eq!(ArtifactPaths::resolve(dir, "test1"), first);
        }
    }

    #[test]
    fn test_dotted_filebase_keeps_dots() {
        let paths = ArtifactPaths::resolve(Path::new("out"), "kernel.v2");
        assert_eq!(paths.bitcode, PathBuf::from("out/kernel.v2.bc"));
        assert_eq!(paths.text, PathBuf::from("out/kernel.v2.spvasm"));
    }
}
