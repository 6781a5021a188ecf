//! Scripted stand-ins for the process runner and the artifact store

#![allow(dead_code)]

use spv_pipeline::{ArtifactStore, ExecOptions, ExecOutput, PipelineError, ProcessRunner, Result};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub const CLANG: &str = "/toolchain/clang";
pub const TRANSLATOR: &str = "/toolchain/llvm-spirv";
pub const DISASSEMBLER: &str = "/toolchain/spirv-dis";

#[derive(Debug, Clone)]
pub struct Invocation {
    pub exe: PathBuf,
    pub args: Vec<String>,
    pub options: ExecOptions,
}

#[derive(Default)]
pub struct ScriptedRunner {
    responses: Mutex<HashMap<PathBuf, ExecOutput>>,
    unspawnable: Mutex<HashSet<PathBuf>>,
    invocations: Mutex<Vec<Invocation>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, exe: &str, code: i32, stdout: &str, stderr: &str) -> Self {
        self.responses.lock().unwrap().insert(
            PathBuf::from(exe),
            ExecOutput {
                code,
                stdout: stdout.to_string(),
                stderr: stderr.to_string(),
                ..ExecOutput::default()
            },
        );
        self
    }

    pub fn unspawnable(self, exe: &str) -> Self {
        self.unspawnable.lock().unwrap().insert(PathBuf::from(exe));
        self
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.lock().unwrap().clone()
    }

    pub fn count(&self, exe: &str) -> usize {
        self.invocations()
            .iter()
            .filter(|inv| inv.exe == Path::new(exe))
            .count()
    }

    pub fn args_of(&self, exe: &str) -> Vec<String> {
        self.invocations()
            .into_iter()
            .find(|inv| inv.exe == Path::new(exe))
            .map(|inv| inv.args)
            .unwrap_or_default()
    }
}

impl ProcessRunner for ScriptedRunner {
    async fn exec(&self, exe: &Path, args: &[String], options: &ExecOptions) -> Result<ExecOutput> {
        self.invocations.lock().unwrap().push(Invocation {
            exe: exe.to_path_buf(),
            args: args.to_vec(),
            options: options.clone(),
        });
        if self.unspawnable.lock().unwrap().contains(exe) {
            return Err(PipelineError::Spawn {
                exe: exe.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
            });
        }
        Ok(self
            .responses
            .lock()
            .unwrap()
            .get(exe)
            .cloned()
            .unwrap_or_default())
    }
}

#[derive(Default)]
pub struct MemoryStore {
    files: Mutex<HashMap<PathBuf, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(self, path: impl Into<PathBuf>, content: &str) -> Self {
        self.files
            .lock()
            .unwrap()
            .insert(path.into(), content.to_string());
        self
    }
}

impl ArtifactStore for MemoryStore {
    async fn exists(&self, path: &Path) -> bool {
        self.files.lock().unwrap().contains_key(path)
    }

    async fn read_text(&self, path: &Path) -> Result<String> {
        self.files
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| PipelineError::Other(format!("missing {}", path.display())))
    }
}

pub fn strings(args: &[&str]) -> Vec<String> {
    args.iter().map(|s| s.to_string()).collect()
}
