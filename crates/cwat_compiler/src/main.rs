mod cli;

use std::process::ExitCode;

use clap::Parser as _;
use cli::{Cli, Command};
use cwat_compiler::diagnostics::PrettyDiagnosticEmitter;
use cwat_compiler::session::Session;

#[derive(thiserror::Error, Debug)]
enum CompilerError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("errors while compiling")]
    HadErrors,
}

type CompilerResult<T> = Result<T, CompilerError>;

fn main() -> ExitCode {
    env_logger::init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CompilerResult<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Build {
            input,
            source,
            output,
            color,
        } => {
            let (name, source) = if source {
                ("<unnamed>".to_owned(), input)
            } else {
                let source = std::fs::read_to_string(&input)?;
                (input, source)
            };

            log::info!("building {name}");

            let mut session = Session::new(PrettyDiagnosticEmitter::new(color.into()));
            let module = session
                .compile(name, source)
                .map_err(|_| CompilerError::HadErrors)?;

            match output {
                Some(path) => std::fs::write(path, module)?,
                None => print!("{module}"),
            }

            Ok(())
        }
    }
}
