mod cli;
mod pipeline;

use clap::Parser;
use cli::{Cli, ResolvedCommand};
use pipeline::{build_file, check_file};
use std::process;

fn main() {
    let cli = Cli::parse();

    let Some(command) = cli.resolve_command() else {
        eprintln!("error: no input file; try `cypress build <file>`");
        process::exit(2);
    };

    let result = match command {
        ResolvedCommand::Check { file, strict } => check_file(&file, strict),
        ResolvedCommand::Build { file, out_dir } => build_file(&file, out_dir.as_deref()),
    };

    if let Err(error) = result {
        eprintln!("{}", error);
        process::exit(1);
    }
}
