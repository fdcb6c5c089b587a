use std::process::ExitCode;

fn main() -> ExitCode {
    match shiftcal_core::run(std::env::args_os().collect()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("shiftcal: {err:#}");
            ExitCode::FAILURE
        }
    }
}
