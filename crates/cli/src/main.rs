use std::process::ExitCode;

fn main() -> ExitCode {
    offersense_cli::run()
}
