use std::process::ExitCode;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use dsv_tools::args::*;
use dsv_tools::command::*;

fn run(args:DsvToolsArgs) -> CmdResult<()> {
    match args.action {
        Action::Decode(args) => decode(&args),
        Action::Meta(args) => meta(&args),
        Action::Inf(args) => inf(&args),
        Action::Gr2trj(args) => gr2trj(&args),
        Action::Gr2trjDir(args) => gr2trj_dir(&args),
        Action::Normalize(args) => {
            let factor = normalize(&args)?;
            println!("{}",factor);
            Ok(())
        }
        Action::NewConfig(args) => new_config(&args),
    }
}

fn main() -> ExitCode {
    // logs go to stderr, stdout is reserved for json and text output
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = DsvToolsArgs::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}",e);
            ExitCode::FAILURE
        }
    }
}
