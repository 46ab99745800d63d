//! End-to-end tests of the `charac` binary.
//!
//! Tests that link an executable skip themselves when no C compiler is
//! available.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn charac() -> Command {
    Command::new(env!("CARGO_BIN_EXE_charac"))
}

fn linker() -> String {
    std::env::var("CC").unwrap_or_else(|_| "cc".to_string())
}

fn have_linker() -> bool {
    let available = Command::new(linker())
        .arg("--version")
        .output()
        .map(|out| out.status.success())
        .unwrap_or(false);
    if !available {
        eprintln!("skipping: no C compiler found");
    }
    available
}

/// Fresh scratch directory for one test.
fn scratch(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("chara-cli-{}-{}", std::process::id(), name));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn write_source(dir: &Path, source: &str) -> PathBuf {
    let path = dir.join("prog.chr");
    fs::write(&path, source).unwrap();
    path
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_missing_argument_prints_usage() {
    let output = charac().output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Usage"), "stderr: {}", stderr(&output));
}

#[test]
fn test_help_exits_successfully() {
    let output = charac().arg("--help").output().unwrap();
    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).contains("--llvm"));
}

#[test]
fn test_unreadable_source() {
    let dir = scratch("unreadable");
    let output = charac().arg(dir.join("absent.chr")).output().unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("cannot open"), "stderr: {}", stderr(&output));
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_parse_failure() {
    let dir = scratch("parse");
    let source = write_source(&dir, "fn main out(\"unterminated) end");

    let output = charac().arg(&source).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("prog.chr:1:"), "stderr: {}", stderr(&output));
    assert!(!dir.join("prog.o").exists());
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_arity_error_produces_no_object() {
    let dir = scratch("arity");
    let source = write_source(&dir, "fn main out(\"a\", \"b\") end");

    let output = charac().arg(&source).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(
        stderr(&output).contains("call to out: expected 1 arguments, got 2"),
        "stderr: {}",
        stderr(&output)
    );
    assert!(!dir.join("prog.o").exists());
    assert!(!dir.join("prog").exists());
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_dumps_ast_and_ir() {
    if !have_linker() {
        return;
    }
    let dir = scratch("dumps");
    let source = write_source(&dir, "fn main out(\"hi\") end");

    let output = charac()
        .arg("--ast")
        .arg("-llvm")
        .arg(&source)
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let text = stdout(&output);
    assert!(text.contains("[Function: main]"), "stdout: {text}");
    assert!(text.contains("[Call: out]"), "stdout: {text}");
    assert!(text.contains("define i32 @main()"), "stdout: {text}");
    assert!(text.contains("declare i32 @printf(ptr, ...)"), "stdout: {text}");
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_compiled_program_runs() {
    if !have_linker() {
        return;
    }
    let dir = scratch("hello");
    let source = write_source(
        &dir,
        r#"
fn main
  greet()
  outs("no newline")
end 3

fn greet
  out("hello\tworld")
end
"#,
    );

    let output = charac().arg(&source).output().unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let executable = dir.join("prog");
    assert_eq!(
        stdout(&output).trim_end(),
        format!("Successfully compiled: {}", executable.display())
    );
    assert!(dir.join("prog.o").exists());

    let run = Command::new(&executable).output().unwrap();
    assert_eq!(stdout(&run), "hello\tworld\nno newline");
    assert_eq!(run.status.code(), Some(3));
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_last_assignment_wins() {
    if !have_linker() {
        return;
    }
    let dir = scratch("reassign");
    let source = write_source(&dir, "fn main x = 1 x = 2 end x");

    let output = charac().arg(&source).output().unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let run = Command::new(dir.join("prog")).output().unwrap();
    assert_eq!(run.status.code(), Some(2));
    let _ = fs::remove_dir_all(&dir);
}

#[cfg(unix)]
#[test]
fn test_linker_failure_is_reported() {
    let dir = scratch("linker");
    let source = write_source(&dir, "fn main end");

    let output = charac().arg("--cc").arg("false").arg(&source).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(
        stderr(&output).contains("could not compile object file"),
        "stderr: {}",
        stderr(&output)
    );
    let _ = fs::remove_dir_all(&dir);
}

/// Write an executable shell script into `dir`.
#[cfg(unix)]
fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

#[cfg(unix)]
#[test]
fn test_linker_exit_code_is_passed_through() {
    let dir = scratch("linker-exit");
    let source = write_source(&dir, "fn main end");
    let linker = write_script(&dir, "failing-cc", "exit 7");

    let output = charac().arg("--cc").arg(&linker).arg(&source).output().unwrap();
    assert_eq!(output.status.code(), Some(7), "stderr: {}", stderr(&output));
    assert!(stderr(&output).contains("could not compile object file"));
    assert!(dir.join("prog.o").exists());
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_missing_linker_is_reported() {
    let dir = scratch("linker-missing");
    let source = write_source(&dir, "fn main end");

    let output = charac()
        .arg("--cc")
        .arg("/nonexistent/linker")
        .arg(&source)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(
        stderr(&output).contains("could not run linker `/nonexistent/linker`"),
        "stderr: {}",
        stderr(&output)
    );
    let _ = fs::remove_dir_all(&dir);
}

#[cfg(unix)]
#[test]
fn test_linker_from_environment_with_arguments() {
    let dir = scratch("linker-env");
    let source = write_source(&dir, "fn main end");
    let log = dir.join("args.txt");
    let linker = write_script(&dir, "wrapper-cc", &format!("echo \"$@\" > {}", log.display()));

    let output = charac()
        .env("CC", format!("{} -v", linker.display()))
        .arg(&source)
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let args = fs::read_to_string(&log).unwrap();
    let expected = format!(
        "-v {} -o {}",
        dir.join("prog.o").display(),
        dir.join("prog").display()
    );
    assert_eq!(args.trim_end(), expected);
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_lowering_error_names_the_function() {
    let dir = scratch("lower-error");
    let source = write_source(&dir, "fn main\n  x = y\nend x");

    let output = charac().arg(&source).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(
        stderr(&output).contains("error: in function main: variable y not defined"),
        "stderr: {}",
        stderr(&output)
    );
    let _ = fs::remove_dir_all(&dir);
}
