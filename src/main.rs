// nodepath - Main entry point
use clap::Parser;
use nodepath::cli::Cli;
use std::process;

fn main() {
    let cli = Cli::parse();

    let exit_code = match cli.run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}", e.user_message());
            e.exit_code()
        }
    };

    process::exit(exit_code);
}
