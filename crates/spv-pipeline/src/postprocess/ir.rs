use super::IrProcessor;
use crate::request::CompileFilters;
use crate::result::ResultLine;
use crate::{PipelineError, Result};
use regex::Regex;
use std::sync::LazyLock;

static METADATA_DEFINITION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*![\w.\-]+\s*=").expect("valid metadata regex"));

static ATTRIBUTE_GROUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^attributes #\d+").expect("valid attribute regex"));

static METADATA_ATTACHMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",\s*![\w.]+ !\d+").expect("valid attachment regex"));

/// Filters textual LLVM IR according to the request's output filters
#[derive(Debug, Clone, Copy, Default)]
pub struct LlvmIrProcessor;

impl LlvmIrProcessor {
    fn keep_line(line: &str, filters: &CompileFilters) -> bool {
        let trimmed = line.trim_start();
        if filters.directives
            && (METADATA_DEFINITION.is_match(line) || ATTRIBUTE_GROUP.is_match(line))
        {
            return false;
        }
        if filters.debug_calls
            && (trimmed.contains("@llvm.dbg.") || trimmed.starts_with("#dbg_"))
        {
            return false;
        }
        if filters.comment_only && trimmed.starts_with(';') {
            return false;
        }
        true
    }

    fn rewrite_line(line: &str, filters: &CompileFilters) -> String {
        let mut text = if filters.directives {
            METADATA_ATTACHMENT.replace_all(line, "").into_owned()
        } else {
            line.to_string()
        };
        if filters.trim {
            let indented = text.starts_with(char::is_whitespace);
            let squashed = text.split_whitespace().collect::<Vec<_>>().join(" ");
            text = if indented && !squashed.is_empty() {
                format!("  {}", squashed)
            } else {
                squashed
            };
        }
        text
    }
}

impl IrProcessor for LlvmIrProcessor {
    fn process_ir(&self, ir: &str, filters: &CompileFilters) -> Result<Vec<ResultLine>> {
        if ir.contains('\0') {
            return Err(PipelineError::PostProcessing(
                "IR output is binary, expected textual LLVM IR".to_string(),
            ));
        }

        let mut lines: Vec<ResultLine> = Vec::new();
        for raw in ir.lines() {
            if !Self::keep_line(raw, filters) {
                continue;
            }
            let text = Self::rewrite_line(raw, filters);
            let blank = text.trim().is_empty();
            let previous_blank = lines.last().map_or(true, |l| l.text.trim().is_empty());
            if blank && (filters.trim || previous_blank) {
                continue;
            }
            lines.push(ResultLine::new(text));
        }
        while lines.last().is_some_and(|l| l.text.trim().is_empty()) {
            lines.pop();
        }
        Ok(lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const IR: &str = r#"; ModuleID = '<source>'
source_filename = "<source>"

define spir_func i32 @add(i32 noundef %a, i32 noundef %b) #0 !dbg !10 {
entry:
  call void @llvm.dbg.declare(metadata ptr %a.addr, metadata !15, metadata !DIExpression()), !dbg !16
  %add = add nsw i32 %a, %b, !dbg !17
  ret i32 %add, !dbg !18
}

declare void @llvm.dbg.declare(metadata, metadata, metadata) #1

attributes #0 = { convergent noinline }

!llvm.dbg.cu = !{!0}
!0 = distinct !DICompileUnit(language: DW_LANG_OpenCL)
"#;

    fn texts(lines: &[ResultLine]) -> Vec<&str> {
        lines.iter().map(|l| l.text.as_str()).collect()
    }

    #[test]
    fn test_no_filters_keeps_everything_but_blank_runs() {
        let lines = LlvmIrProcessor
            .process_ir(IR, &CompileFilters::default())
            .unwrap();
        assert_eq!(lines.len(), IR.lines().count());
        assert_eq!(lines[0].text, "; ModuleID = '<source>'");
    }

    #[test]
    fn test_all_filters() {
        let filters = CompileFilters {
            directives: true,
            debug_calls: true,
            comment_only: true,
            trim: true,
            ..CompileFilters::default()
        };
        let lines = LlvmIrProcessor.process_ir(IR, &filters).unwrap();
        assert_eq!(
            texts(&lines),
            vec![
                "source_filename = \"<source>\"",
                "define spir_func i32 @add(i32 noundef %a, i32 noundef %b) #0 !dbg !10 {",
                "entry:",
                "  %add = add nsw i32 %a, %b",
                "  ret i32 %add",
                "}",
            ]
        );
    }

    #[test]
    fn test_binary_input_is_rejected() {
        let err = LlvmIrProcessor
            .process_ir("BC\u{0}\u{0}", &CompileFilters::default())
            .unwrap_err();
        assert!(matches!(err, PipelineError::PostProcessing(_)));
    }
}
