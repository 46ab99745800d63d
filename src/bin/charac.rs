//! Command-line driver: `charac <source-path> [-llvm] [--ast] [--cc <linker>]`.

use chara::driver::{self, CompileOptions, DEFAULT_LINKER};
use clap::error::ErrorKind;
use clap::Parser;
use std::ffi::OsString;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "charac")]
#[command(about = "Compile a Chara source file into a native executable")]
struct Args {
    /// Path to the source file to compile
    source: PathBuf,

    /// Print the generated LLVM IR before emitting the object file
    #[arg(long)]
    llvm: bool,

    /// Print the parsed syntax tree
    #[arg(long)]
    ast: bool,

    /// C compiler used to link the object file; extra words are passed to it
    /// before the object file
    #[arg(long, env = "CC", default_value = DEFAULT_LINKER)]
    cc: String,
}

/// Accept the single-dash `-llvm` spelling alongside `--llvm`.
fn normalize_args(args: impl IntoIterator<Item = OsString>) -> Vec<OsString> {
    args.into_iter()
        .map(|arg| if arg == "-llvm" { OsString::from("--llvm") } else { arg })
        .collect()
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = match Args::try_parse_from(normalize_args(std::env::args_os())) {
        Ok(args) => args,
        Err(err) => {
            let _ = err.print();
            return match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::from(1),
            };
        }
    };

    let options = CompileOptions {
        dump_ir: args.llvm,
        dump_ast: args.ast,
        linker: args.cc,
    };

    let mut stdout = io::stdout().lock();
    match driver::compile_file(&args.source, &options, &mut stdout) {
        Ok(output) => {
            let _ = writeln!(stdout, "Successfully compiled: {}", output.executable.display());
            ExitCode::SUCCESS
        }
        Err(err) => {
            let _ = stdout.flush();
            eprintln!("error: {}", err);
            ExitCode::from(err.exit_code())
        }
    }
}
