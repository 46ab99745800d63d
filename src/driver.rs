// This module orchestrates one compilation: read the source file, parse it into the
// session arena, lower it to LLVM IR, emit `<base>.o` and link `<base>` by running the
// system C compiler as a subprocess. `<base>` is the source path without its final
// extension. Optional dumps (syntax tree, textual IR) are written to a caller-supplied
// writer so the binary can send them to stdout and tests can capture them. DriverError
// wraps every failure and maps it to the process exit code used by the binary.

//! Compilation driver.

use crate::core::{CompilationSession, CompileError};
use crate::llvm::{emit, CodeGen, MODULE_NAME};
use crate::parser::{self, ParseError};
use bumpalo::Bump;
use inkwell::context::Context;
use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use thiserror::Error;

/// Exit code used when the source fails to parse.
pub const PARSE_FAILURE_EXIT_CODE: u8 = 1;

/// Linker used when neither `--cc` nor `CC` is given.
pub const DEFAULT_LINKER: &str = "cc";

/// Options for one compilation.
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Write the textual IR before emission.
    pub dump_ir: bool,
    /// Write the parsed tree.
    pub dump_ast: bool,
    /// C compiler used as linker.
    pub linker: String,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            dump_ir: false,
            dump_ast: false,
            linker: DEFAULT_LINKER.to_string(),
        }
    }
}

/// Files produced by a successful compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOutput {
    pub object: PathBuf,
    pub executable: PathBuf,
}

#[derive(Error, Debug)]
pub enum DriverError {
    #[error("cannot open {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("{}:{source}", path.display())]
    Parse { path: PathBuf, source: ParseError },

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error("in function {function}: {source}")]
    Lower {
        function: String,
        source: CompileError,
    },

    #[error("output {} would overwrite the source file", path.display())]
    OutputOverwritesSource { path: PathBuf },

    #[error("cannot write compiler output: {0}")]
    Output(#[source] io::Error),

    #[error("could not run linker `{linker}`: {source}")]
    LinkerSpawn { linker: String, source: io::Error },

    #[error("could not compile object file: `{linker}` exited with {status}")]
    Link { linker: String, status: ExitStatus },
}

impl DriverError {
    /// Exit code the binary reports for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            DriverError::Parse { .. } => PARSE_FAILURE_EXIT_CODE,
            DriverError::Link { status, .. } => status
                .code()
                .and_then(|code| u8::try_from(code).ok())
                .filter(|&code| code != 0)
                .unwrap_or(1),
            _ => 1,
        }
    }
}

/// Source path with its final extension removed.
pub fn output_base(source: &Path) -> Result<PathBuf, DriverError> {
    let base = source.with_extension("");
    if base == source {
        return Err(DriverError::OutputOverwritesSource { path: base });
    }
    Ok(base)
}

fn object_path(base: &Path) -> PathBuf {
    // Append rather than replace, so `prog.v2` becomes `prog.v2.o`.
    let mut object = OsString::from(base.as_os_str());
    object.push(".o");
    PathBuf::from(object)
}

/// Compile the file at `source` into an object file and an executable.
pub fn compile_file(
    source: &Path,
    options: &CompileOptions,
    out: &mut dyn Write,
) -> Result<CompileOutput, DriverError> {
    let text = fs::read_to_string(source).map_err(|e| DriverError::Io {
        path: source.to_path_buf(),
        source: e,
    })?;
    let base = output_base(source)?;
    let object = object_path(&base);

    log::info!("Compiling {}", source.display());

    let arena = Bump::new();
    let session = CompilationSession::new(&arena);
    let root = parser::parse(&session, &text).map_err(|e| DriverError::Parse {
        path: source.to_path_buf(),
        source: e,
    })?;

    if options.dump_ast {
        out.write_all(root.dump().as_bytes())
            .map_err(DriverError::Output)?;
    }

    let context = Context::create();
    let mut codegen = CodeGen::new(&context, MODULE_NAME, &session);
    codegen
        .lower_program(root)
        .map_err(|source| match session.current_function() {
            Some(function) => DriverError::Lower { function, source },
            None => DriverError::Compile(source),
        })?;

    if options.dump_ir {
        out.write_all(codegen.print_ir().as_bytes())
            .map_err(DriverError::Output)?;
        out.flush().map_err(DriverError::Output)?;
    }

    if let Err(err) = emit::emit_object(codegen.module(), &object) {
        // A partially written object must not be mistaken for a valid one.
        let _ = fs::remove_file(&object);
        return Err(err.into());
    }
    drop(codegen);

    link_object(&options.linker, &object, &base)?;
    log::debug!("{}", session.stats());

    Ok(CompileOutput {
        object,
        executable: base,
    })
}

/// Link `object` into `executable` with `linker object -o executable`.
///
/// `linker` is split on whitespace: the first word is the program and the
/// rest are passed before the object file, so `ccache cc` works.
pub fn link_object(linker: &str, object: &Path, executable: &Path) -> Result<(), DriverError> {
    log::info!("Linking {} with {}", executable.display(), linker);

    let mut words = linker.split_whitespace();
    let program = words.next().ok_or_else(|| DriverError::LinkerSpawn {
        linker: linker.to_string(),
        source: io::Error::new(io::ErrorKind::InvalidInput, "empty linker command"),
    })?;

    let status = Command::new(program)
        .args(words)
        .arg(object)
        .arg("-o")
        .arg(executable)
        .status()
        .map_err(|e| DriverError::LinkerSpawn {
            linker: linker.to_string(),
            source: e,
        })?;

    if !status.success() {
        return Err(DriverError::Link {
            linker: linker.to_string(),
            status,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_base_strips_final_extension() {
        assert_eq!(
            output_base(Path::new("demos/hello.chr")).unwrap(),
            PathBuf::from("demos/hello")
        );
        assert_eq!(
            output_base(Path::new("dir.v1/prog.v2.chr")).unwrap(),
            PathBuf::from("dir.v1/prog.v2")
        );
    }

    #[test]
    fn test_output_base_rejects_extensionless_source() {
        let err = output_base(Path::new("demos/hello")).unwrap_err();
        assert!(matches!(err, DriverError::OutputOverwritesSource { .. }));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_object_path_appends_suffix() {
        assert_eq!(object_path(Path::new("a/prog.v2")), PathBuf::from("a/prog.v2.o"));
    }

    #[test]
    fn test_parse_failures_use_named_exit_code() {
        let err = DriverError::Parse {
            path: PathBuf::from("x.chr"),
            source: ParseError::new(1, 1, "expected `fn`"),
        };
        assert_eq!(err.exit_code(), PARSE_FAILURE_EXIT_CODE);
        assert_eq!(err.to_string(), "x.chr:1:1: expected `fn`");
    }

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("chara-driver-{}-{}", std::process::id(), name));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_lowering_errors_name_the_function() {
        let dir = scratch("lower");
        let source = dir.join("prog.chr");
        fs::write(&source, "fn helper end 1\nfn main x = y end").unwrap();

        let err = compile_file(&source, &CompileOptions::default(), &mut io::sink()).unwrap_err();
        match &err {
            DriverError::Lower { function, source } => {
                assert_eq!(function, "main");
                assert!(matches!(source, CompileError::UndefinedVariable { .. }));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.to_string(), "in function main: variable y not defined");
        assert_eq!(err.exit_code(), 1);
        assert!(!dir.join("prog.o").exists());

        // Declaration-level errors belong to no function.
        fs::write(&source, "fn main end\nfn main end").unwrap();
        let err = compile_file(&source, &CompileOptions::default(), &mut io::sink()).unwrap_err();
        assert!(matches!(err, DriverError::Compile(CompileError::DuplicateFunction { .. })));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_empty_linker_command_is_rejected() {
        let err = link_object("  ", Path::new("a.o"), Path::new("a")).unwrap_err();
        assert!(matches!(err, DriverError::LinkerSpawn { .. }));
        assert!(err.to_string().contains("empty linker command"));
    }

    #[cfg(unix)]
    #[test]
    fn test_linker_command_words_become_leading_arguments() {
        use std::os::unix::fs::PermissionsExt;

        let dir = scratch("words");
        let log = dir.join("args.txt");
        let script = dir.join("record-link");
        fs::write(&script, format!("#!/bin/sh\necho \"$@\" > {}\n", log.display())).unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        let linker = format!("{} --extra", script.display());
        let result = link_object(&linker, Path::new("prog.o"), Path::new("prog"));
        assert!(result.is_ok(), "{result:?}");

        let args = fs::read_to_string(&log).unwrap();
        assert_eq!(args.trim_end(), "--extra prog.o -o prog");
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_missing_source_is_io_error() {
        let mut sink = Vec::new();
        let err = compile_file(
            Path::new("does/not/exist.chr"),
            &CompileOptions::default(),
            &mut sink,
        )
        .unwrap_err();
        assert!(matches!(err, DriverError::Io { .. }));
        assert!(err.to_string().starts_with("cannot open does/not/exist.chr"));
    }
}
