use clap::Parser;

mod cli;
mod commands;
mod logger;

use cli::{Cli, Command};

fn main() {
    let cli = Cli::parse();
    logger::init_cli_logger(cli.verbose);

    let result = match cli.command {
        Command::Run { config, output } => commands::run(&config, output.as_deref()),
        Command::Check { config } => commands::check(&config),
        Command::Score {
            simulated,
            observed,
            warmup,
            metric,
            simulated_column,
            observed_column,
        } => commands::score(
            &simulated,
            simulated_column.as_deref(),
            &observed,
            observed_column.as_deref(),
            warmup,
            &metric,
        ),
    };

    match result {
        Ok(text) => println!("{text}"),
        Err(e) => {
            eprintln!("error: {e:#}");
            std::process::exit(1);
        }
    }
}
