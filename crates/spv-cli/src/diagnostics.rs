//! Error reporting and result rendering

use crate::{CliError, Result};
use console::style;
use spv_pipeline::{CompilationResult, Extraction, ResultLine};
use std::io::Write;

/// Set up enhanced error reporting with miette
pub fn setup_error_reporting() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .map_err(|e| CliError::Config(format!("Failed to setup error reporting: {}", e)))?;

    Ok(())
}

/// Print a CLI error through the installed miette handler
pub fn render_cli_error(error: CliError) {
    eprintln!("{:?}", miette::Report::new(error));
}

/// Render one output line, highlighting lines that point into the source
pub fn format_line(line: &ResultLine) -> String {
    match &line.tag {
        Some(tag) if tag.text.starts_with("error") => style(&line.text).red().to_string(),
        Some(tag) if tag.text.starts_with("warning") => style(&line.text).yellow().to_string(),
        Some(_) => style(&line.text).bold().to_string(),
        None => line.text.clone(),
    }
}

pub fn write_lines(out: &mut impl Write, lines: &[ResultLine]) -> Result<()> {
    for line in lines {
        writeln!(out, "{}", format_line(line))?;
    }
    Ok(())
}

/// Print a pipeline result: stdout lines to stdout, stderr lines to stderr
pub fn print_result(result: &CompilationResult) -> Result<()> {
    write_lines(&mut std::io::stdout().lock(), &result.stdout)?;
    write_lines(&mut std::io::stderr().lock(), &result.stderr)?;
    if result.timed_out {
        eprintln!("{} Process timed out", style("✗").red());
    }
    if result.truncated {
        eprintln!("{} Output was truncated", style("ℹ").blue());
    }
    Ok(())
}

/// Print an AST or IR dump, or the compiler's diagnostics when it failed
pub fn print_extraction(extraction: &Extraction, json: bool) -> Result<()> {
    if json {
        return print_json(extraction);
    }
    if extraction.success() {
        write_lines(&mut std::io::stdout().lock(), &extraction.lines)
    } else {
        write_lines(&mut std::io::stderr().lock(), &extraction.lines)
    }
}

pub fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| CliError::InvalidInput(format!("Failed to serialize result: {}", e)))?;
    println!("{}", text);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use spv_pipeline::result::parse_output;
    use std::path::Path;

    #[test]
    fn test_write_lines_keeps_order_without_colors() {
        console::set_colors_enabled(false);
        let lines = parse_output(
            "/tmp/in.cl:1:2: error: bad\nnote: see above\n/tmp/in.cl:4:1: warning: unused",
            Some(Path::new("/tmp/in.cl")),
        );
        let mut out = Vec::new();
        write_lines(&mut out, &lines).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "<source>:1:2: error: bad\nnote: see above\n<source>:4:1: warning: unused\n"
        );
    }

    #[test]
    fn test_result_serializes_tags() {
        let lines = parse_output("<source>:3:1: error: x", None);
        let value = serde_json::to_value(&lines).unwrap();
        assert_eq!(value[0]["tag"]["line"], 3);
        assert_eq!(value[0]["tag"]["column"], 1);
        assert_eq!(value[0]["text"], "<source>:3:1: error: x");
    }
}
