use std::process::ExitCode;

fn main() -> ExitCode {
    dotenv::dotenv().ok();
    bookeo_cli::run()
}
