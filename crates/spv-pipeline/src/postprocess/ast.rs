use super::AstProcessor;
use crate::result::{strip_ansi, CompilationResult, ResultLine, SOURCE_PLACEHOLDER};
use crate::Result;
use regex::Regex;
use std::sync::LazyLock;

static NODE_ADDRESS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" 0x[0-9a-f]+").expect("valid address regex"));

static NODE_LOCATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[| `]*(?:[|`]-)?[A-Za-z]\w* <(.*)$").expect("valid location regex")
});

#[derive(Debug, PartialEq, Eq)]
enum Location {
    Invalid,
    SameFile,
    File(String),
}

fn node_location(line: &str) -> Option<Location> {
    let rest = NODE_LOCATION.captures(line)?.get(1)?.as_str();
    if rest.starts_with("<invalid sloc>") || rest.starts_with("scratch space") {
        return Some(Location::Invalid);
    }
    if rest.starts_with("line:") || rest.starts_with("col:") {
        return Some(Location::SameFile);
    }
    if rest.starts_with(SOURCE_PLACEHOLDER) {
        return Some(Location::File(SOURCE_PLACEHOLDER.to_string()));
    }
    let file = rest.split(':').next()?;
    Some(Location::File(file.to_string()))
}

fn is_top_level(line: &str) -> bool {
    line.starts_with("|-") || line.starts_with("`-")
}

/// Keeps the declarations that come from the main source file
///
/// clang prints a full path only when the file changes, and `line:`/`col:`
/// locations refer to the last file printed, so the current file is tracked
/// across every line, children included.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClangAstProcessor;

impl ClangAstProcessor {
    pub fn filter_ast(&self, lines: &[ResultLine]) -> Vec<ResultLine> {
        let mut kept = Vec::new();
        let mut current_file: Option<String> = None;
        let mut keep_node = true;

        for line in lines {
            let text = NODE_ADDRESS.replace_all(&strip_ansi(&line.text), "").into_owned();
            let location = node_location(&text);
            let resolved = match location {
                Some(Location::File(file)) => {
                    current_file = Some(file);
                    current_file.clone()
                }
                Some(Location::SameFile) => current_file.clone(),
                Some(Location::Invalid) | None => None,
            };

            if is_top_level(&text) {
                keep_node = resolved.as_deref() == Some(SOURCE_PLACEHOLDER);
            } else if !text.starts_with(['|', '`', ' ']) {
                // the TranslationUnitDecl root
                keep_node = true;
            }

            if keep_node {
                kept.push(ResultLine::new(text));
            }
        }
        kept
    }
}

impl AstProcessor for ClangAstProcessor {
    fn process_ast(&self, output: &CompilationResult) -> Result<Vec<ResultLine>> {
        if !output.success() {
            let mut lines = vec![ResultLine::new(format!(
                "Error generating AST: {}",
                output.code
            ))];
            lines.extend(output.stderr.iter().cloned());
            return Ok(lines);
        }
        Ok(self.filter_ast(&output.stdout))
    }
}
