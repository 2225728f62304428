//! Plume Compiler CLI
//!
//! A command-line interface over the Plume library. Programs are read as
//! JSON interchange documents produced by a front end.

use clap::{Parser, Subcommand};
use colored::Colorize;
use env_logger::Env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use plume::host::StdoutHost;
use plume::options::output_path;
use plume::{check, compile, run, EmitOptions, PlumeError, Program, RunOptions, Target};

#[derive(Parser)]
#[command(name = "plumec")]
#[command(version)]
#[command(about = "Plume - type checker and multi-target code generator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Type-check a program without generating code
    Check {
        /// Input program (JSON)
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Print a program as indented source text
    Print {
        /// Input program (JSON)
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Generate code for one backend
    Emit {
        /// Input program (JSON)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Target: source, stack, reg, or ir
        #[arg(long, short, default_value = "ir")]
        target: String,

        /// Omit `# name` comments on memory loads
        #[arg(long)]
        no_annotate: bool,

        /// Output file path ("-" for stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Lower a program to IR and interpret it
    Run {
        /// Input program (JSON)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Instruction budget (0 = unlimited)
        #[arg(long, default_value_t = RunOptions::DEFAULT_MAX_STEPS)]
        max_steps: usize,
    },
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Check { file } => cmd_check(&file),
        Commands::Print { file } => cmd_print(&file),
        Commands::Emit {
            file,
            target,
            no_annotate,
            output,
        } => cmd_emit(&file, &target, !no_annotate, output),
        Commands::Run { file, max_steps } => cmd_run(&file, max_steps),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            print_error(&e);
            ExitCode::FAILURE
        }
    }
}

/// `PLUME_LOG` takes precedence over `RUST_LOG`
fn init_logging() {
    let env = if std::env::var_os("PLUME_LOG").is_some() {
        Env::new().filter("PLUME_LOG")
    } else {
        Env::default()
    };
    env_logger::Builder::from_env(env.default_filter_or("warn"))
        .format_timestamp(None)
        .init();
}

fn print_error(e: &PlumeError) {
    eprintln!("{}: {}", "error".red().bold(), e);
    if let PlumeError::InvalidProgram { .. } = e {
        eprintln!("{}", "note: run `plumec print FILE` to inspect the program".yellow());
    }
}

fn load(file: &Path) -> Result<Program, PlumeError> {
    let json = fs::read_to_string(file)?;
    Program::from_json(&json)
}

fn cmd_check(file: &Path) -> Result<(), PlumeError> {
    let program = load(file)?;
    check(&program)?;
    println!("{} {}", "Valid".green().bold(), file.display());
    Ok(())
}

fn cmd_print(file: &Path) -> Result<(), PlumeError> {
    let program = load(file)?;
    let options = EmitOptions::new(Target::Source);
    print!("{}", compile(&program, &options)?);
    Ok(())
}

fn cmd_emit(file: &Path, target: &str, annotate: bool, output: Option<PathBuf>) -> Result<(), PlumeError> {
    let target = Target::from_str(target)?;
    let program = load(file)?;
    let text = compile(&program, &EmitOptions { target, annotate })?;

    if output.as_deref() == Some(Path::new("-")) {
        print!("{}", text);
        return Ok(());
    }

    let path = output_path(file, output.as_deref(), target);
    fs::write(&path, text)?;
    println!(
        "{} {} -> {} ({})",
        "Emitted".green().bold(),
        file.display(),
        path.display(),
        target.description()
    );
    Ok(())
}

fn cmd_run(file: &Path, max_steps: usize) -> Result<(), PlumeError> {
    let program = load(file)?;
    let mut host = StdoutHost::new();
    run(&program, &RunOptions { max_steps }, &mut host)
}
