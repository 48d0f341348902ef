// File: src/main.rs
//
// Main entry point for the Khwarizmi command-line tool.
// Handles command-line argument parsing and dispatches to the appropriate
// subcommand (run, check, tokens, or repl).

use clap::{Parser as ClapParser, Subcommand};
use khwarizmi::config::{Config, DiagnosticFormat};
use khwarizmi::errors::Diagnostic;
use khwarizmi::interpreter::{InputSource, LineInput, WriterOutput};
use khwarizmi::lexer;
use khwarizmi::logger::LogLevel;
use khwarizmi::repl::Repl;
use std::fs;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;

#[derive(ClapParser)]
#[command(
    name = "khwarizmi",
    about = "Khwarizmi: a small imperative language with a linear equation solver",
    version = env!("CARGO_PKG_VERSION"),
    long_about = None
)]
struct Cli {
    /// Logging verbosity (written to stderr)
    #[arg(long, global = true, value_enum, env = "KHWARIZMI_LOG", default_value = "warn")]
    log_level: LogLevel,

    /// Disable colored diagnostics
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
#[command(arg_required_else_help = true)]
enum Commands {
    /// Compile and run a Khwarizmi program
    Run {
        /// Path to the source file
        file: PathBuf,

        /// Read `input` values from this file instead of stdin
        #[arg(long)]
        input: Option<PathBuf>,
    },

    /// Compile a program and report diagnostics without running it
    Check {
        /// Path to the source file
        file: PathBuf,

        /// Diagnostic output format
        #[arg(long, value_enum, default_value = "human")]
        format: DiagnosticFormat,
    },

    /// Print the token stream of a source file
    Tokens {
        /// Path to the source file
        file: PathBuf,
    },

    /// Launch the interactive REPL
    Repl,
}

const EXIT_COMPILE_ERROR: u8 = 1;
const EXIT_RUNTIME_ERROR: u8 = 2;
const EXIT_IO_ERROR: u8 = 74;

fn read_source(path: &Path) -> Result<String, ExitCode> {
    fs::read_to_string(path).map_err(|err| {
        eprintln!("error: cannot read '{}': {}", path.display(), err);
        ExitCode::from(EXIT_IO_ERROR)
    })
}

fn report(config: &Config, diagnostics: &[Diagnostic]) {
    match config.render_diagnostics(diagnostics) {
        Ok(text) => eprintln!("{}", text),
        Err(err) => eprintln!("error: cannot render diagnostics: {}", err),
    }
}

fn run_file(config: &Config, file: &Path, input: Option<&Path>) -> Result<(), ExitCode> {
    let source = read_source(file)?;
    let program = khwarizmi::compile(&source).map_err(|diagnostics| {
        report(config, &diagnostics);
        ExitCode::from(EXIT_COMPILE_ERROR)
    })?;
    info!(file = %file.display(), "running program");

    let mut input: Box<dyn InputSource> = match input {
        Some(path) => {
            let handle = fs::File::open(path).map_err(|err| {
                eprintln!("error: cannot open input '{}': {}", path.display(), err);
                ExitCode::from(EXIT_IO_ERROR)
            })?;
            Box::new(LineInput::new(BufReader::new(handle)))
        }
        None => Box::new(LineInput::new(io::stdin().lock())),
    };
    let mut output = WriterOutput::new(io::stdout().lock());

    khwarizmi::run(&program, input.as_mut(), &mut output).map_err(|err| {
        report(config, &[err.to_diagnostic().attach_source(&source)]);
        ExitCode::from(EXIT_RUNTIME_ERROR)
    })
}

fn check_file(config: &Config, file: &Path) -> Result<(), ExitCode> {
    let source = read_source(file)?;
    match khwarizmi::compile(&source) {
        Ok(_) => {
            if config.format == DiagnosticFormat::Json {
                println!("[]");
            } else {
                println!("{}: no errors", file.display());
            }
            Ok(())
        }
        Err(diagnostics) => {
            report(config, &diagnostics);
            Err(ExitCode::from(EXIT_COMPILE_ERROR))
        }
    }
}

fn dump_tokens(file: &Path) -> Result<(), ExitCode> {
    let source = read_source(file)?;
    for token in lexer::tokenize(&source) {
        println!("{:>4}:{:<3} {}", token.location.line, token.location.column, token.kind);
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = Config { log_level: cli.log_level, color: !cli.no_color, ..Config::default() };

    let result = match cli.command {
        Commands::Run { file, input } => {
            config.apply();
            run_file(&config, &file, input.as_deref())
        }

        Commands::Check { file, format } => {
            config.format = format;
            config.apply();
            check_file(&config, &file)
        }

        Commands::Tokens { file } => {
            config.apply();
            dump_tokens(&file)
        }

        Commands::Repl => {
            config.apply();
            Repl::new().and_then(|mut repl| repl.run()).map_err(|err| {
                eprintln!("error: {}", err);
                ExitCode::from(EXIT_IO_ERROR)
            })
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => code,
    }
}
