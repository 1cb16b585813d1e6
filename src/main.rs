use std::process::ExitCode;

use refvault::ui::output;

fn main() -> ExitCode {
    match refvault::cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            output::error(format!("{:#}", err));
            ExitCode::FAILURE
        }
    }
}
