use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let Some((input, output)) = lumen_drv::parse_args(&args) else {
        eprintln!("usage: lumenc <input-path> <output-path>");
        return ExitCode::from(lumen_drv::ARGUMENT_ERROR_EXIT_CODE as u8);
    };

    match lumen_drv::compile(input, output) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(lumen_drv::COMPILE_ERROR_EXIT_CODE as u8)
        }
    }
}
