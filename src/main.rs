use std::process::ExitCode;

fn main() -> ExitCode {
    match plotgrid::cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
