use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use echo_compiler::Compiler;

/// Command line interface for the echo compiler.
#[derive(Parser)]
struct CliOptions {
    /// Source file to compile.
    #[clap(parse(from_os_str))]
    path: PathBuf,

    /// Raise log verbosity to debug.
    #[clap(short, long, action)]
    debug: bool,
}

fn main() -> anyhow::Result<()> {
    let args = CliOptions::parse();

    let level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let file = args.path.display().to_string();
    let dest_path = args.path.with_extension("c");

    let diagnostics = Compiler::new(file.clone())
        .compile_and_save(&args.path, &dest_path)
        .with_context(|| format!("compiling {}", file))?;

    for diagnostic in diagnostics.iter() {
        eprintln!("{}", diagnostic);
    }

    if diagnostics.has_errors() {
        // §6 mandates exit code 1 specifically, not a sysexits.h category.
        std::process::exit(1);
    }

    if !diagnostics.is_empty() {
        eprintln!("{} warning(s)", diagnostics.iter().count());
    }
    println!("wrote {}", dest_path.display());
    std::process::exit(exitcode::OK);
}
