//! Aggregated compilation results

use crate::exec::ExecOutput;
use regex::Regex;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Placeholder substituted for the input path in diagnostics
pub const SOURCE_PLACEHOLDER: &str = "<source>";

static ANSI_ESCAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1b\[[0-9;]*[A-Za-z]").expect("valid ANSI regex"));

static SOURCE_LOCATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^<source>:(\d+)(?::(\d+))?:\s*(.*)$").expect("valid location regex")
});

/// Source position a diagnostic line points at
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultTag {
    pub line: u32,
    pub column: Option<u32>,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultLine {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<ResultTag>,
}

impl ResultLine {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tag: None,
        }
    }
}

pub fn strip_ansi(text: &str) -> String {
    ANSI_ESCAPE.replace_all(text, "").into_owned()
}

/// Split process output into non-blank lines, with the input path replaced by
/// `<source>` and `<source>:line:col:` prefixes tagged
pub fn parse_output(text: &str, input_filename: Option<&Path>) -> Vec<ResultLine> {
    let input = input_filename
        .map(|path| path.to_string_lossy().into_owned())
        .filter(|path| !path.is_empty());

    text.lines()
        .filter_map(|raw| {
            let mut line = strip_ansi(raw.trim_end_matches('\r'));
            if let Some(input) = &input {
                line = line.replace(input.as_str(), SOURCE_PLACEHOLDER);
            }
            if line.trim().is_empty() {
                return None;
            }
            let tag = parse_tag(&line);
            Some(ResultLine { text: line, tag })
        })
        .collect()
}

fn parse_tag(line: &str) -> Option<ResultTag> {
    let captures = SOURCE_LOCATION.captures(line)?;
    Some(ResultTag {
        line: captures.get(1)?.as_str().parse().ok()?,
        column: captures.get(2).and_then(|c| c.as_str().parse().ok()),
        text: captures.get(3).map_or("", |m| m.as_str()).to_string(),
    })
}

/// The externally visible result of one request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CompilationResult {
    pub code: i32,
    pub stdout: Vec<ResultLine>,
    pub stderr: Vec<ResultLine>,
    pub input_filename: Option<PathBuf>,
    pub timed_out: bool,
    pub truncated: bool,
}

impl CompilationResult {
    pub fn from_exec(output: &ExecOutput, input_filename: &Path) -> Self {
        Self {
            code: output.code,
            stdout: parse_output(&output.stdout, Some(input_filename)),
            stderr: parse_output(&output.stderr, Some(input_filename)),
            input_filename: Some(input_filename.to_path_buf()),
            timed_out: output.timed_out,
            truncated: output.truncated,
        }
    }

    /// Append a later stage's streams and adopt its exit code
    pub fn append_stage(&mut self, output: &ExecOutput) {
        let input = self.input_filename.clone();
        self.stdout
            .extend(parse_output(&output.stdout, input.as_deref()));
        self.stderr
            .extend(parse_output(&output.stderr, input.as_deref()));
        self.code = output.code;
        self.timed_out |= output.timed_out;
        self.truncated |= output.truncated;
    }

    pub fn success(&self) -> bool {
        self.code == 0
    }

    pub fn stdout_text(&self) -> String {
        join_lines(&self.stdout)
    }

    pub fn stderr_text(&self) -> String {
        join_lines(&self.stderr)
    }
}

pub fn join_lines(lines: &[ResultLine]) -> String {
    lines
        .iter()
        .map(|line| line.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_output_replaces_input_and_tags() {
        let text = "/tmp/build/example.cl:3:5: error: use of undeclared identifier 'x'\n\n  x = 1;\n";
        let lines = parse_output(text, Some(Path::new("/tmp/build/example.cl")));
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0].text,
            "<source>:3:5: error: use of undeclared identifier 'x'"
        );
        assert_eq!(
            lines[0].tag,
            Some(ResultTag {
                line: 3,
                column: Some(5),
                text: "error: use of undeclared identifier 'x'".to_string(),
            })
        );
        assert_eq!(lines[1].tag, None);
    }

    #[test]
    fn test_parse_output_strips_color() {
        let lines = parse_output("\x1b[1m\x1b[31merror:\x1b[0m bad", None);
        assert_eq!(lines, vec![ResultLine::new("error: bad")]);
    }

    #[test]
    fn test_append_stage_keeps_order() {
        let input = Path::new("/tmp/a.cl");
        let first = ExecOutput {
            code: 0,
            stdout: "one".into(),
            stderr: "warn one".into(),
            ..ExecOutput::default()
        };
        let second = ExecOutput {
            code: 2,
            stdout: "two".into(),
            stderr: "warn two".into(),
            ..ExecOutput::default()
        };
        let mut result = CompilationResult::from_exec(&first, input);
        result.append_stage(&second);
        assert_eq!(result.code, 2);
        assert_eq!(result.stdout_text(), "one\ntwo");
        assert_eq!(result.stderr_text(), "warn one\nwarn two");
    }
}
