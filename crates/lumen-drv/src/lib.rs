//! The compiler driver: the minimal CLI contract `spec.md` §6 describes —
//! `lumenc <input-path> <output-path>`, exit 255 on argument error,
//! nonzero on compilation error, 0 on success — threaded through the full
//! pipeline (lex, parse, elaborate, codegen). Grounded on the shape of
//! the teacher's `faxc-drv/src/lib.rs` (read sources, run pipeline, emit
//! output, map diagnostics to an exit code) but trimmed drastically: no
//! `Config`/`OptLevel`/`EmitType`/incremental-cache surface, since
//! `spec.md` §6 is explicit there are no other flags in the core CLI.

mod text_backend;

use std::path::Path;

use anyhow::{bail, Context, Result};

use lumen_gen::Codegen;
use lumen_par::Parser;
use lumen_sem::elaborate_program;
use lumen_types::TypeContext;
use lumen_util::{DefIdGenerator, FileId, Handler};

pub use text_backend::TextBackend;

/// Exit code for "wrong number of CLI arguments" (`spec.md` §6).
pub const ARGUMENT_ERROR_EXIT_CODE: i32 = 255;
/// Exit code for any compilation error surfaced through the diagnostic handler.
pub const COMPILE_ERROR_EXIT_CODE: i32 = 1;

/// Parses `lumenc`'s two positional arguments (not counting `argv[0]`).
/// Returns `None`, rather than an `Err`, when the count itself is wrong,
/// so `main` can map that one case to exit code 255 instead of 1.
pub fn parse_args(args: &[String]) -> Option<(&Path, &Path)> {
    match args {
        [input, output] => Some((Path::new(input.as_str()), Path::new(output.as_str()))),
        _ => None,
    }
}

/// Runs the whole pipeline over one source file: lex, parse, elaborate,
/// codegen, then writes `output_path`. `Err` covers both I/O failures and
/// any compilation error the diagnostic handler recorded; the first
/// `Level::Error` diagnostic has already been printed to stderr by the
/// time this returns (`Handler::emit` prints eagerly — fail-fast, no
/// batching, per `spec.md` §7).
pub fn compile(input_path: &Path, output_path: &Path) -> Result<()> {
    let source = std::fs::read_to_string(input_path)
        .with_context(|| format!("reading {}", input_path.display()))?;

    let types = TypeContext::new();
    let mut ids = DefIdGenerator::new();
    let handler = Handler::new();

    let mut parser = match Parser::new(&source, FileId::ROOT, &types, &mut ids) {
        Ok(p) => p,
        Err(e) => {
            handler.error(e.to_string(), e.span());
            bail!("{e}");
        }
    };

    let program = match parser.parse_program() {
        Ok(p) => p,
        Err(e) => {
            handler.error(e.to_string(), e.span());
            bail!("{e}");
        }
    };

    let program = match elaborate_program(&types, &handler, program) {
        Ok(p) => p,
        Err(e) => bail!("{e}"),
    };

    let mut backend = TextBackend::new();
    let mut codegen = Codegen::new(&mut backend);
    codegen.lower_program(&program).map_err(|e| anyhow::anyhow!("{e}"))?;

    if handler.has_errors() {
        bail!("compilation failed with {} error(s)", handler.error_count());
    }

    std::fs::write(output_path, backend.into_output())
        .with_context(|| format!("writing {}", output_path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn parse_args_accepts_exactly_two_positionals() {
        let args = vec!["in.lumen".to_string(), "out.o".to_string()];
        let (input, output) = parse_args(&args).expect("two args parse");
        assert_eq!(input, PathBuf::from("in.lumen"));
        assert_eq!(output, PathBuf::from("out.o"));
    }

    #[test]
    fn parse_args_rejects_any_other_count() {
        assert!(parse_args(&[]).is_none());
        assert!(parse_args(&["only-one".to_string()]).is_none());
        assert!(parse_args(&["a".into(), "b".into(), "c".into()]).is_none());
    }

    #[test]
    fn compile_succeeds_and_writes_output_for_valid_source() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("in.lumen");
        let output = dir.path().join("out.o");
        std::fs::write(&input, "let x: float = 3;").expect("write source");

        compile(&input, &output).expect("compiles");
        assert!(output.exists());
        let contents = std::fs::read_to_string(&output).expect("read output");
        assert!(contents.contains("convert.Int.Float"));
    }

    #[test]
    fn compile_fails_on_a_type_error_and_writes_no_output() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("in.lumen");
        let output = dir.path().join("out.o");
        std::fs::write(&input, "let x = y + 1;").expect("write source");

        assert!(compile(&input, &output).is_err());
        assert!(!output.exists());
    }

    #[test]
    fn compile_fails_on_a_missing_input_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("missing.lumen");
        let output = dir.path().join("out.o");

        assert!(compile(&input, &output).is_err());
    }
}
