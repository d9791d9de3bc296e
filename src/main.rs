use std::process::ExitCode;

fn main() -> ExitCode {
    match restaurant_pos_lib::run().map_err(anyhow::Error::from) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
