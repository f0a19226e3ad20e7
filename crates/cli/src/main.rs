use std::process::ExitCode;

fn main() -> ExitCode {
    scout_cli::run()
}
