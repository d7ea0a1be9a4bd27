use std::process::ExitCode;

fn main() -> ExitCode {
    dentabill_cli::run()
}
