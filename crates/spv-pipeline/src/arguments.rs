//! Front-end command line assembly
//!
//! The SPIR-V tools downstream of clang are sensitive to argument order, so
//! [`ArgumentBuilder`] emits the groups in one fixed sequence.

use crate::artifacts::{artifact_path, BITCODE_EXTENSION};
use crate::config::{CompilerConfig, LibraryVersion, UserOptionsConfig};
use crate::request::{BackendOptions, CompileFilters, CompileRequest, LibrarySpec};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::warn;

/// Flags that put clang into cc1 mode with DWARF 5 debug info for GDB
pub const FRONTEND_BASE_FLAGS: [&str; 4] = [
    "-cc1",
    "-debug-info-kind=limited",
    "-dwarf-version=5",
    "-debugger-tuning=gdb",
];

/// Driver-only flag that `-cc1` rejects
pub const INCOMPATIBLE_COMPILER_OPTION: &str = "-fno-crash-diagnostics";

/// An argument list transformed by value: every operation returns a new list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Arguments(Vec<String>);

impl Arguments {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn with(mut self, arg: impl Into<String>) -> Self {
        self.0.push(arg.into());
        self
    }

    /// Append `arg` unless the list already holds it
    pub fn with_once(self, arg: &str) -> Self {
        if self.contains(arg) {
            self
        } else {
            self.with(arg)
        }
    }

    pub fn extended<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.0.extend(args.into_iter().map(Into::into));
        self
    }

    /// Drop every occurrence of `arg`
    pub fn without(mut self, arg: &str) -> Self {
        self.0.retain(|existing| existing != arg);
        self
    }

    /// Replace the first occurrence of `from`; unchanged when absent
    pub fn replaced(mut self, from: &str, to: impl Into<String>) -> Self {
        if let Some(index) = self.0.iter().position(|existing| existing == from) {
            self.0[index] = to.into();
        }
        self
    }

    pub fn contains(&self, arg: &str) -> bool {
        self.0.iter().any(|existing| existing == arg)
    }

    pub fn count(&self, arg: &str) -> usize {
        self.0.iter().filter(|existing| *existing == arg).count()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<String>> for Arguments {
    fn from(args: Vec<String>) -> Self {
        Self(args)
    }
}

impl<S: Into<String>> FromIterator<S> for Arguments {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Library metadata needed on the compiler command line
pub trait LibraryCatalog {
    fn include_args_for(&self, libraries: &[LibrarySpec]) -> Vec<String>;
    fn library_options_for(&self, libraries: &[LibrarySpec]) -> Vec<String>;
    fn shared_link_args_for(&self, libraries: &[LibrarySpec]) -> Vec<String>;
    fn shared_path_args_for(&self, libraries: &[LibrarySpec]) -> Vec<String>;
    fn static_link_args_for(&self, libraries: &[LibrarySpec]) -> Vec<String>;
}

/// Library catalog backed by the `[libraries]` section of the configuration
#[derive(Debug, Clone, Default)]
pub struct ConfiguredLibraries {
    entries: BTreeMap<String, BTreeMap<String, LibraryVersion>>,
}

impl ConfiguredLibraries {
    pub fn new(entries: BTreeMap<String, BTreeMap<String, LibraryVersion>>) -> Self {
        Self { entries }
    }

    fn resolve<'a>(
        &'a self,
        libraries: &'a [LibrarySpec],
    ) -> impl Iterator<Item = &'a LibraryVersion> + 'a {
        libraries.iter().filter_map(move |spec| {
            let found = self
                .entries
                .get(&spec.id)
                .and_then(|versions| versions.get(&spec.version));
            if found.is_none() {
                warn!("Unknown library {} version {}", spec.id, spec.version);
            }
            found
        })
    }
}

impl LibraryCatalog for ConfiguredLibraries {
    fn include_args_for(&self, libraries: &[LibrarySpec]) -> Vec<String> {
        self.resolve(libraries)
            .flat_map(|lib| &lib.include_paths)
            .map(|path| format!("-isystem{}", path.display()))
            .collect()
    }

    fn library_options_for(&self, libraries: &[LibrarySpec]) -> Vec<String> {
        self.resolve(libraries)
            .flat_map(|lib| lib.options.iter().cloned())
            .collect()
    }

    fn shared_link_args_for(&self, libraries: &[LibrarySpec]) -> Vec<String> {
        self.resolve(libraries)
            .flat_map(|lib| &lib.link)
            .map(|name| format!("-l{}", name))
            .collect()
    }

    fn shared_path_args_for(&self, libraries: &[LibrarySpec]) -> Vec<String> {
        self.resolve(libraries)
            .flat_map(|lib| &lib.lib_paths)
            .flat_map(|path| {
                [
                    format!("-L{}", path.display()),
                    format!("-Wl,-rpath,{}", path.display()),
                ]
            })
            .collect()
    }

    fn static_link_args_for(&self, libraries: &[LibrarySpec]) -> Vec<String> {
        self.resolve(libraries)
            .flat_map(|lib| &lib.static_link)
            .map(|name| format!("-l{}", name))
            .collect()
    }
}

/// Allow-list applied to caller supplied options
#[derive(Debug, Clone, Default)]
pub struct UserOptionFilter {
    forbidden: Vec<String>,
    forbidden_with_value: Vec<String>,
}

impl UserOptionFilter {
    pub fn new(config: &UserOptionsConfig) -> Self {
        Self {
            forbidden: config.forbidden.clone(),
            forbidden_with_value: config.forbidden_with_value.clone(),
        }
    }

    pub fn filter(&self, options: &[String]) -> Vec<String> {
        let mut kept = Vec::with_capacity(options.len());
        let mut iter = options.iter();
        while let Some(option) = iter.next() {
            if self.forbidden_with_value.iter().any(|flag| flag == option) {
                let value = iter.next();
                warn!("Dropping user option {} {:?}", option, value);
                continue;
            }
            if self.is_forbidden(option) {
                warn!("Dropping user option {}", option);
                continue;
            }
            kept.push(option.clone());
        }
        kept
    }

    fn is_forbidden(&self, option: &str) -> bool {
        self.forbidden.iter().any(|flag| {
            if flag.ends_with('=') {
                option.starts_with(flag.as_str())
            } else {
                option == flag
            }
        })
    }
}

/// Builds the front-end compiler invocation
pub struct ArgumentBuilder<'a, L: LibraryCatalog> {
    compiler: &'a CompilerConfig,
    catalog: &'a L,
    user_filter: &'a UserOptionFilter,
    output_filebase: &'a str,
}

impl<'a, L: LibraryCatalog> ArgumentBuilder<'a, L> {
    pub fn new(
        compiler: &'a CompilerConfig,
        catalog: &'a L,
        user_filter: &'a UserOptionFilter,
        output_filebase: &'a str,
    ) -> Self {
        Self {
            compiler,
            catalog,
            user_filter,
            output_filebase,
        }
    }

    /// cc1 flags plus `-o` naming the bitcode next to `output_filename`
    pub fn base_options(&self, output_filename: &Path) -> Arguments {
        let dir = output_filename.parent().unwrap_or_else(|| Path::new(""));
        let bitcode = artifact_path(dir, self.output_filebase, BITCODE_EXTENSION);
        FRONTEND_BASE_FLAGS
            .iter()
            .copied()
            .collect::<Arguments>()
            .with("-o")
            .with(bitcode.to_string_lossy())
    }

    pub fn build_arguments(
        &self,
        user_options: &[String],
        filters: &CompileFilters,
        backend_options: &BackendOptions,
        input_filename: &Path,
        output_filename: &Path,
        libraries: &[LibrarySpec],
    ) -> Arguments {
        let mut args = self.base_options(output_filename).extended(
            self.compiler
                .options
                .iter()
                .filter(|option| option.as_str() != INCOMPATIBLE_COMPILER_OPTION)
                .cloned(),
        );

        if self.compiler.supports_opt_output && backend_options.produce_opt_info {
            args = args.with(self.compiler.opt_arg.as_str());
        }

        args = args
            .extended(self.catalog.include_args_for(libraries))
            .extended(self.catalog.library_options_for(libraries));

        let static_links = if filters.binary {
            args = args
                .extended(self.catalog.shared_link_args_for(libraries))
                .extended(self.catalog.shared_path_args_for(libraries));
            self.catalog.static_link_args_for(libraries)
        } else {
            Vec::new()
        };

        args.extended(self.user_filter.filter(user_options))
            .with(input_filename.to_string_lossy())
            .extended(static_links)
    }

    pub fn for_request(&self, request: &CompileRequest, output_filename: &Path) -> Arguments {
        self.build_arguments(
            &request.user_options,
            &request.filters,
            &request.backend_options,
            &request.input_filename,
            output_filename,
            &request.libraries,
        )
    }
}
