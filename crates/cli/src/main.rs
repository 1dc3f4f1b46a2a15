use std::process::ExitCode;

fn main() -> ExitCode {
    cpg_cli::run()
}
