use std::process::ExitCode;

fn main() -> ExitCode {
    flowsnap_cli::run()
}
