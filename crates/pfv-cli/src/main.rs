//! `pfv-upgrade`: upgrade a raw profile document to the current format version

mod cli;

use std::process::ExitCode;

fn main() -> ExitCode {
    let matches = cli::command().get_matches();

    let config = match cli::CliConfig::from_matches(&matches) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err:#}");
            return ExitCode::from(cli::EXIT_FAILURE);
        }
    };

    cli::init_tracing(&config);

    let mut stdout = std::io::stdout().lock();
    match cli::run(&config, &mut stdout) {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(cli::EXIT_FAILURE)
        }
    }
}
