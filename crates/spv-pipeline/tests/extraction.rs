//! AST and IR extraction through the front-end compiler

mod support;

use pretty_assertions::assert_eq;
use spv_pipeline::config::CompilerConfig;
use spv_pipeline::extraction::EXTRACTION_MAX_OUTPUT;
use spv_pipeline::{
    AstProcessor, CompilationResult, CompileFilters, CompileRequest, IrProcessor, PipelineError,
    ResultLine, SpirvDriver, ToolchainConfig,
};
use std::path::PathBuf;
use support::*;

const INPUT: &str = "/tmp/build/example.cl";

fn config() -> ToolchainConfig {
    ToolchainConfig {
        compiler: CompilerConfig {
            exe: PathBuf::from(CLANG),
            translator: PathBuf::from(TRANSLATOR),
            disassembler: PathBuf::from(DISASSEMBLER),
            ..CompilerConfig::default()
        },
        ..ToolchainConfig::default()
    }
}

fn texts(lines: &[ResultLine]) -> Vec<&str> {
    lines.iter().map(|l| l.text.as_str()).collect()
}

struct FixedAst(Result<Vec<ResultLine>, String>);

impl AstProcessor for FixedAst {
    fn process_ast(&self, _output: &CompilationResult) -> spv_pipeline::Result<Vec<ResultLine>> {
        self.0.clone().map_err(PipelineError::PostProcessing)
    }
}

struct EchoIr;

impl IrProcessor for EchoIr {
    fn process_ir(
        &self,
        ir: &str,
        _filters: &CompileFilters,
    ) -> spv_pipeline::Result<Vec<ResultLine>> {
        Ok(ir.lines().map(ResultLine::new).collect())
    }
}

#[tokio::test]
async fn test_ast_extraction_strips_color_and_adds_dump_once() {
    let driver = SpirvDriver::new(config(), ScriptedRunner::new(), MemoryStore::new());
    let request =
        CompileRequest::new(INPUT).with_user_options(strings(&["-O2", "-fcolor-diagnostics"]));

    driver.extract_ast(&request).await.unwrap();

    let invocations = driver.runner().invocations();
    assert_eq!(invocations.len(), 1);
    let args = &invocations[0].args;
    assert!(!args.iter().any(|a| a == "-fcolor-diagnostics"));
    assert_eq!(args.iter().filter(|a| *a == "-ast-dump").count(), 1);
    assert!(args.iter().any(|a| a == "-O2"));
    assert!(args.iter().any(|a| a == "/tmp/build/output.ll"));
    assert!(!args.iter().any(|a| a == "/tmp/build/output.bc"));
    assert!(!args.iter().any(|a| a == "-emit-llvm-bc"));
    assert_eq!(invocations[0].options.max_output, EXTRACTION_MAX_OUTPUT);
    assert_eq!(driver.runner().count(TRANSLATOR), 0);
}

#[tokio::test]
async fn test_ast_dump_flag_is_not_duplicated() {
    let driver = SpirvDriver::new(config(), ScriptedRunner::new(), MemoryStore::new());
    let request = CompileRequest::new(INPUT).with_user_options(strings(&["-ast-dump"]));

    driver.extract_ast(&request).await.unwrap();

    let args = driver.runner().args_of(CLANG);
    assert_eq!(args.iter().filter(|a| *a == "-ast-dump").count(), 1);
}

#[tokio::test]
async fn test_ast_processor_result_is_returned_unchanged() {
    let lines = vec![ResultLine::new("TranslationUnitDecl"), ResultLine::new("`-FunctionDecl")];
    let driver = SpirvDriver::new(config(), ScriptedRunner::new(), MemoryStore::new())
        .with_ast_processor(FixedAst(Ok(lines.clone())));

    let result = driver.extract_ast(&CompileRequest::new(INPUT)).await.unwrap();

    assert!(result.success());
    assert_eq!(result.lines, lines);
}

#[tokio::test]
async fn test_ast_processor_failure_is_surfaced() {
    let driver = SpirvDriver::new(config(), ScriptedRunner::new(), MemoryStore::new())
        .with_ast_processor(FixedAst(Err("malformed dump".to_string())));

    let err = driver
        .extract_ast(&CompileRequest::new(INPUT))
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::PostProcessing(ref m) if m == "malformed dump"));
}

#[tokio::test]
async fn test_default_ast_processor_filters_dump() {
    let dump = "TranslationUnitDecl 0x1 <<invalid sloc>> <invalid sloc>\n\
                |-TypedefDecl 0x2 <<invalid sloc>> <invalid sloc> implicit __int128_t '__int128'\n\
                `-FunctionDecl 0x3 </tmp/build/example.cl:1:1, line:3:1> line:1:6 add 'int (int, int)'";
    let runner = ScriptedRunner::new().respond(CLANG, 0, dump, "");
    let driver = SpirvDriver::new(config(), runner, MemoryStore::new());

    let result = driver.extract_ast(&CompileRequest::new(INPUT)).await.unwrap();

    assert_eq!(
        texts(&result.lines),
        vec![
            "TranslationUnitDecl <<invalid sloc>> <invalid sloc>",
            "`-FunctionDecl <<source>:1:1, line:3:1> line:1:6 add 'int (int, int)'",
        ]
    );
}

#[tokio::test]
async fn test_ir_failure_returns_stderr() {
    let runner = ScriptedRunner::new().respond(
        CLANG,
        1,
        "",
        "/tmp/build/example.cl:1:1: error: unknown type name 'kernal'",
    );
    let driver = SpirvDriver::new(config(), runner, MemoryStore::new());

    let result = driver.extract_ir(&CompileRequest::new(INPUT)).await.unwrap();

    assert_eq!(result.code, 1);
    assert!(!result.success());
    assert_eq!(
        texts(&result.lines),
        vec!["<source>:1:1: error: unknown type name 'kernal'"]
    );
}

#[tokio::test]
async fn test_ir_reads_ll_artifact_and_applies_filters() {
    let ir = "; ModuleID = 'example.cl'\ndefine spir_func void @f() #0 {\n  ret void, !dbg !7\n}\n!7 = !DILocation(line: 2)\n";
    let store = MemoryStore::new().with_file("/tmp/build/output.ll", ir);
    let driver = SpirvDriver::new(config(), ScriptedRunner::new(), store);
    let filters = CompileFilters {
        directives: true,
        comment_only: true,
        ..CompileFilters::default()
    };
    let request = CompileRequest::new(INPUT).with_filters(filters);

    let result = driver.extract_ir(&request).await.unwrap();

    assert_eq!(result.code, 0);
    assert_eq!(
        texts(&result.lines),
        vec!["define spir_func void @f() #0 {", "  ret void", "}"]
    );
    let args = driver.runner().args_of(CLANG);
    assert_eq!(args.iter().filter(|a| *a == "-emit-llvm").count(), 1);
    assert!(args.iter().any(|a| a == "/tmp/build/output.ll"));
}

#[tokio::test]
async fn test_ir_falls_back_to_stdout() {
    let runner = ScriptedRunner::new().respond(CLANG, 0, "define void @g() {\n  ret void\n}", "");
    let driver =
        SpirvDriver::new(config(), runner, MemoryStore::new()).with_ir_processor(EchoIr);

    let result = driver.extract_ir(&CompileRequest::new(INPUT)).await.unwrap();

    assert_eq!(texts(&result.lines), vec!["define void @g() {", "  ret void", "}"]);
}

#[tokio::test]
async fn test_ast_failure_carries_compiler_code() {
    let runner = ScriptedRunner::new().respond(
        CLANG,
        1,
        "",
        "/tmp/build/example.cl:1:1: error: unknown type name 'kernal'",
    );
    let driver = SpirvDriver::new(config(), runner, MemoryStore::new());

    let result = driver.extract_ast(&CompileRequest::new(INPUT)).await.unwrap();

    assert_eq!(result.code, 1);
    assert!(!result.success());
    assert_eq!(
        texts(&result.lines),
        vec![
            "Error generating AST: 1",
            "<source>:1:1: error: unknown type name 'kernal'",
        ]
    );
}
