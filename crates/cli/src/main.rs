use std::process::ExitCode;

fn main() -> ExitCode {
    showhome_cli::run()
}
