use brrtbind::logging::{init_logging, LogConfig};
use std::process::ExitCode;

fn main() -> ExitCode {
    let _guard = match init_logging(&LogConfig::from_env()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{e:#}");
            return ExitCode::FAILURE;
        }
    };

    match brrtbind::cli::run_cli() {
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
