use clap::Parser;
use elrun_rust::cli::{Cli, Commands, commands};
use elrun_rust::logging::init_logging;

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.verbose, cli.quiet) {
        eprintln!("Failed to initialize logging: {e}");
        // Continue without structured logging; stderr still works.
    }

    let result = match cli.command {
        Commands::Emacs(args) => commands::emacs::execute(args),
        Commands::Binary(args) => commands::binary::execute(args),
        Commands::Test(args) => commands::test::execute(args),
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("elrun: {err}");
            std::process::exit(err.exit_code());
        }
    }
}
