mod cli;
mod report;
mod shader;
mod validator;
mod watch;

use std::process::ExitCode;

use clap::Parser;
use report::Console;
use shader::{ShaderDirectory, WgslCompiler};
use tracing_subscriber::filter::{EnvFilter, LevelFilter};

#[macro_use]
extern crate tracing;

/// Used for failures that are not about the shaders themselves.
const INTERNAL_ERROR: u8 = 2;

fn main() -> ExitCode {
    let args = cli::Args::parse();

    if let Err(error) = init_logging() {
        eprintln!("could not initialize logging: {error:#}");
        return ExitCode::from(INTERNAL_ERROR);
    }

    match run(&args) {
        Ok(code) => ExitCode::from(code),
        Err(error) => {
            error!("{error:#}");
            ExitCode::from(INTERNAL_ERROR)
        }
    }
}

fn init_logging() -> anyhow::Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy()
        .add_directive("naga=warn".parse()?);

    tracing_subscriber::FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

fn run(args: &cli::Args) -> anyhow::Result<u8> {
    let index = ShaderDirectory::new(&args.extensions);
    let compiler = WgslCompiler::new(args.platforms()).with_rich_reports(args.rich);

    let outcome = validator::run(&index, &compiler, &args.roots, &mut Console)?;
    let mut exit_code = outcome.exit_code();

    if args.watch {
        watch::watch_changes(&args.roots, || {
            let outcome = validator::run(&index, &compiler, &args.roots, &mut Console)?;
            exit_code = outcome.exit_code();
            Ok(())
        })?;
    }

    Ok(exit_code)
}
